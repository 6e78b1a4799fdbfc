//! Email confirmation keys
//!
//! The mailed key is random; only its SHA-256 is stored, mapping to the user
//! id with a TTL. Redemption reads and deletes in one step, so a key
//! activates an account at most once.

use std::time::Duration;

use kernel::id::UserId;
use platform::crypto;
use platform::kv::SharedKv;

use crate::error::AuthResult;

const CONFIRMATION_KEY_BYTES: usize = 32;

#[derive(Clone)]
pub struct ConfirmationKeys<K> {
    kv: K,
    ttl: Duration,
}

fn confirmation_key(key: &str) -> String {
    format!("confirm:{}", crypto::sha256_hex(key.as_bytes()))
}

impl<K: SharedKv> ConfirmationKeys<K> {
    pub fn new(kv: K, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Create a key for the user and return it for mailing
    pub async fn issue(&self, user_id: &UserId) -> AuthResult<String> {
        let key = crypto::random_token(CONFIRMATION_KEY_BYTES);
        self.kv
            .set_ex(&confirmation_key(&key), &user_id.to_string(), self.ttl)
            .await?;
        Ok(key)
    }

    /// User id behind a key, consuming it. `None` for unknown, expired or
    /// already redeemed keys.
    pub async fn redeem(&self, key: &str) -> AuthResult<Option<UserId>> {
        let stored = self.kv.take(&confirmation_key(key)).await?;
        Ok(stored.and_then(|raw| raw.parse().ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::kv::MemoryKv;

    #[tokio::test]
    async fn test_key_redeems_exactly_once() {
        let keys = ConfirmationKeys::new(MemoryKv::new(), Duration::from_secs(60));
        let user_id = UserId::new();

        let key = keys.issue(&user_id).await.unwrap();
        assert_eq!(keys.redeem(&key).await.unwrap(), Some(user_id));
        assert_eq!(keys.redeem(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_and_expired_keys() {
        let kv = MemoryKv::new();
        let keys = ConfirmationKeys::new(kv.clone(), Duration::from_secs(60));
        assert_eq!(keys.redeem("nope").await.unwrap(), None);

        let key = keys.issue(&UserId::new()).await.unwrap();
        kv.advance_clock(Duration::from_secs(61));
        assert_eq!(keys.redeem(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_raw_key_is_not_stored() {
        let kv = MemoryKv::new();
        let keys = ConfirmationKeys::new(kv.clone(), Duration::from_secs(60));
        let key = keys.issue(&UserId::new()).await.unwrap();
        assert!(!kv.contains_key(&format!("confirm:{key}")));
        assert!(kv.contains_key(&confirmation_key(&key)));
    }
}
