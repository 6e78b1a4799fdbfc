//! Session Identifier
//!
//! 32 bytes from the OS CSPRNG, base64url without padding. The identifier
//! keys the cached session record and travels inside the signed token.

use platform::crypto;
use serde::Serialize;

const SESSION_ID_BYTES: usize = 32;
const SESSION_ID_LENGTH: usize = 43;

#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(crypto::random_token(SESSION_ID_BYTES))
    }

    /// Accept only identifiers of the generated shape
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == SESSION_ID_LENGTH
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SessionId({}…)", &self.0[..6.min(self.0.len())])
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
