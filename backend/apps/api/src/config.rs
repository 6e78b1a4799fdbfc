//! Server configuration from the environment
//!
//! Secrets are base64. Without `AUTH_SIGNING_KEY`, debug builds fall back to
//! a random per-process key; release builds refuse to start.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, bail};
use auth::AuthConfig;
use market::MarketConfig;
use platform::crypto;

const MIN_SIGNING_KEY_BYTES: usize = 32;
const DEFAULT_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

/// Credentials for the HTTP mail relay
#[derive(Clone)]
pub struct MailRelayConfig {
    pub url: String,
    pub username: String,
    pub password: String,
    pub from: String,
}

impl std::fmt::Debug for MailRelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailRelayConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from", &self.from)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub redis_url: String,
    pub listen_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
    /// `None` logs mail instead of sending it
    pub mail: Option<MailRelayConfig>,
    pub auth: AuthConfig,
    pub market: MarketConfig,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let redis_url = var("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".to_string());

        let listen_addr = match var("LISTEN_ADDR") {
            Some(addr) => addr.parse().context("LISTEN_ADDR is not a socket address")?,
            None => SocketAddr::from(([0, 0, 0, 0], 31113)),
        };

        let frontend_origins = var("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let mut auth = match var("AUTH_SIGNING_KEY") {
            Some(encoded) => {
                let signing_key = crypto::from_base64(encoded.trim()).context("AUTH_SIGNING_KEY is not base64")?;
                if signing_key.len() < MIN_SIGNING_KEY_BYTES {
                    bail!("AUTH_SIGNING_KEY must decode to at least {MIN_SIGNING_KEY_BYTES} bytes");
                }
                AuthConfig {
                    signing_key,
                    ..AuthConfig::default()
                }
            }
            None if cfg!(debug_assertions) => {
                tracing::warn!("AUTH_SIGNING_KEY not set, using a random development key");
                AuthConfig::development()
            }
            None => bail!("AUTH_SIGNING_KEY must be set in production"),
        };
        if let Some(encoded) = var("PASSWORD_PEPPER") {
            auth.password_pepper = Some(crypto::from_base64(encoded.trim()).context("PASSWORD_PEPPER is not base64")?);
        }

        let mut market = if cfg!(debug_assertions) {
            MarketConfig::development()
        } else {
            MarketConfig::default()
        };
        if let Some(secs) = var("FEED_INTERVAL_SECS") {
            let secs: u64 = secs.parse().context("FEED_INTERVAL_SECS is not a number")?;
            if secs == 0 {
                bail!("FEED_INTERVAL_SECS must be positive");
            }
            market.feed_interval = Duration::from_secs(secs);
        }

        if let Some(base_url) = var("BASE_URL") {
            auth.base_url = base_url.clone();
            market.base_url = base_url;
        }

        let mail = match var("MAIL_API_URL") {
            Some(url) => Some(MailRelayConfig {
                url,
                username: var("MAIL_USERNAME").unwrap_or_default(),
                password: var("MAIL_PASSWORD").unwrap_or_default(),
                from: var("MAIL_FROM").context("MAIL_FROM must be set with MAIL_API_URL")?,
            }),
            None => None,
        };

        Ok(Self {
            database_url,
            redis_url,
            listen_addr,
            frontend_origins,
            mail,
            auth,
            market,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<ApiConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("DATABASE_URL", "postgres://localhost/market")]).unwrap();

        assert_eq!(config.listen_addr.port(), 31113);
        assert_eq!(config.frontend_origins.len(), 2);
        assert!(config.mail.is_none());
    }

    #[test]
    fn test_database_url_is_required() {
        assert!(config(&[]).is_err());
    }

    #[test]
    fn test_short_signing_key_is_rejected() {
        let short = crypto::to_base64(&[7u8; 16]);
        assert!(
            config(&[("DATABASE_URL", "postgres://x"), ("AUTH_SIGNING_KEY", &short)]).is_err()
        );

        let long = crypto::to_base64(&[7u8; 32]);
        let config =
            config(&[("DATABASE_URL", "postgres://x"), ("AUTH_SIGNING_KEY", &long)]).unwrap();
        assert_eq!(config.auth.signing_key, vec![7u8; 32]);
    }

    #[test]
    fn test_base_url_and_feed_interval() {
        let config = config(&[
            ("DATABASE_URL", "postgres://x"),
            ("BASE_URL", "https://market.example.com"),
            ("FEED_INTERVAL_SECS", "30"),
            ("FRONTEND_ORIGINS", "https://a.example.com, ,https://b.example.com"),
        ])
        .unwrap();

        assert_eq!(config.auth.base_url, "https://market.example.com");
        assert_eq!(config.market.base_url, "https://market.example.com");
        assert_eq!(config.market.feed_interval, Duration::from_secs(30));
        assert_eq!(
            config.frontend_origins,
            ["https://a.example.com", "https://b.example.com"]
        );
    }

    #[test]
    fn test_mail_relay_needs_a_sender() {
        assert!(config(&[("DATABASE_URL", "postgres://x"), ("MAIL_API_URL", "https://relay")]).is_err());
    }
}
