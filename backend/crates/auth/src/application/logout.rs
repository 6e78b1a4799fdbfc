//! Logout Use Case

use platform::kv::SharedKv;

use crate::domain::entity::session::AuthContext;
use crate::error::AuthResult;
use crate::infra::session_cache::SessionCache;

pub struct LogoutUseCase<K> {
    sessions: SessionCache<K>,
}

impl<K: SharedKv> LogoutUseCase<K> {
    pub fn new(sessions: SessionCache<K>) -> Self {
        Self { sessions }
    }

    /// Ends only the calling session; other sessions of the user survive.
    pub async fn execute(&self, ctx: &AuthContext) -> AuthResult<()> {
        self.sessions.delete(&ctx.session_id).await?;
        tracing::info!(user_id = %ctx.user.user_id, "User logged out");
        Ok(())
    }
}
