//! Outbound Mail
//!
//! [`Mailer`] sends one message. [`Notifier`] wraps a mailer and dispatches
//! in the background: callers never wait for delivery and a failed send is
//! only logged.

use std::sync::{Arc, Mutex};

use askama::Template;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("mail relay rejected the message")]
    Rejected,

    #[error("mail template failed to render: {0}")]
    Render(#[from] askama::Error),
}

/// A rendered email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl Mail {
    /// Render an HTML template into the message body. Templates with an
    /// `.html` extension escape every interpolated value.
    pub fn render(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: &impl Template,
    ) -> Result<Self, MailError> {
        Ok(Self {
            to: to.into(),
            subject: subject.into(),
            html: body.render()?,
        })
    }
}

#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn send(&self, mail: &Mail) -> Result<(), MailError>;
}

/// Bound for mailers held in shared application state
pub trait SharedMailer: Mailer + Send + Sync + 'static {}

impl<T> SharedMailer for T where T: Mailer + Send + Sync + 'static {}

// ============================================================================
// HTTP relay
// ============================================================================

/// Mail relay reachable over HTTPS
///
/// Posts `{from, to, subject, html}` as JSON with basic auth. Any
/// transactional mail provider exposing such an endpoint works.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
    from: String,
}

#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

impl HttpMailer {
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            from: from.into(),
        }
    }
}

impl Mailer for HttpMailer {
    async fn send(&self, mail: &Mail) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .json(&RelayMessage {
                from: &self.from,
                to: &mail.to,
                subject: &mail.subject,
                html: &mail.html,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Mail relay returned an error status");
            return Err(MailError::Rejected);
        }
        Ok(())
    }
}

// ============================================================================
// Log-only and in-memory mailers
// ============================================================================

/// Logs messages instead of sending them. Used when no relay is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send(&self, mail: &Mail) -> Result<(), MailError> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "Mail relay not configured, message logged only");
        Ok(())
    }
}

/// Records every message; can be switched to fail. Clones share the outbox.
#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<Mail>>>,
    failing: Arc<Mutex<bool>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Mail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut flag) = self.failing.lock() {
            *flag = failing;
        }
    }
}

impl Mailer for MemoryMailer {
    async fn send(&self, mail: &Mail) -> Result<(), MailError> {
        let failing = self.failing.lock().map(|f| *f).unwrap_or(false);
        if failing {
            return Err(MailError::Rejected);
        }
        if let Ok(mut outbox) = self.outbox.lock() {
            outbox.push(mail.clone());
        }
        Ok(())
    }
}

/// Mailer picked at startup: the relay when configured, otherwise logging
#[derive(Clone)]
pub enum ConfiguredMailer {
    Relay(HttpMailer),
    Log(LogMailer),
}

impl Mailer for ConfiguredMailer {
    async fn send(&self, mail: &Mail) -> Result<(), MailError> {
        match self {
            ConfiguredMailer::Relay(mailer) => Mailer::send(mailer, mail).await,
            ConfiguredMailer::Log(mailer) => Mailer::send(mailer, mail).await,
        }
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Fire-and-forget dispatcher
pub struct Notifier<M> {
    mailer: Arc<M>,
}

impl<M> Clone for Notifier<M> {
    fn clone(&self) -> Self {
        Self {
            mailer: self.mailer.clone(),
        }
    }
}

impl<M: SharedMailer> Notifier<M> {
    pub fn new(mailer: M) -> Self {
        Self {
            mailer: Arc::new(mailer),
        }
    }

    /// Send in a background task. The returned handle may be dropped; it is
    /// only useful to tests that want to wait for delivery.
    pub fn dispatch(&self, mail: Mail) -> JoinHandle<()> {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            match Mailer::send(&*mailer, &mail).await {
                Ok(()) => tracing::debug!(subject = %mail.subject, "Mail sent"),
                Err(e) => tracing::warn!(error = %e, subject = %mail.subject, "Mail delivery failed"),
            }
        })
    }
}
