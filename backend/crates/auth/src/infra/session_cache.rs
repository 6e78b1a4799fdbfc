//! Session Cache
//!
//! `session:{id}` hash records holding a [`SessionUser`] snapshot. Every
//! write resets the expiry; the record and its TTL go in one atomic batch.

use std::time::Duration;

use platform::kv::{KvBatch, SharedKv};

use crate::domain::entity::session::SessionUser;
use crate::domain::value_object::session_id::SessionId;
use crate::error::{AuthError, AuthResult};

/// Fixed session lifetime
pub const SESSION_TTL: Duration = Duration::from_secs(36 * 3600);

#[derive(Clone)]
pub struct SessionCache<K> {
    kv: K,
    ttl: Duration,
}

fn session_key(session_id: &SessionId) -> String {
    format!("session:{}", session_id.as_str())
}

impl<K: SharedKv> SessionCache<K> {
    pub fn new(kv: K, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Write (or overwrite) the snapshot and restart the TTL
    pub async fn put(&self, session_id: &SessionId, user: &SessionUser) -> AuthResult<()> {
        let key = session_key(session_id);
        let batch = KvBatch::new()
            .hash_set(key.clone(), user.to_fields())
            .expire(key, self.ttl);
        self.kv.apply(batch).await?;
        Ok(())
    }

    /// Rewrite the snapshot of a session that is still cached and restart
    /// its TTL. A revoked or expired session stays gone; returns whether the
    /// session was live.
    pub async fn refresh(&self, session_id: &SessionId, user: &SessionUser) -> AuthResult<bool> {
        let refreshed = self
            .kv
            .hash_update(&session_key(session_id), user.to_fields(), Some(self.ttl))
            .await?;
        Ok(refreshed)
    }

    /// Snapshot for a live session. An absent or empty record is
    /// `SessionExpired`; a store failure stays an internal error.
    pub async fn get(&self, session_id: &SessionId) -> AuthResult<SessionUser> {
        let fields = self.kv.hash_get_all(&session_key(session_id)).await?;
        if fields.is_empty() {
            return Err(AuthError::SessionExpired);
        }
        SessionUser::from_fields(&fields).ok_or_else(|| {
            tracing::warn!("Discarding malformed session record");
            AuthError::SessionExpired
        })
    }

    /// Idempotent
    pub async fn delete(&self, session_id: &SessionId) -> AuthResult<()> {
        self.kv.delete(&session_key(session_id)).await?;
        Ok(())
    }
}
