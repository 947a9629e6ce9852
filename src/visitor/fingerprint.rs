use sha2::{Digest, Sha256};
use std::fmt;

/// Hex SHA-256 of a visitor's address and user agent.
///
/// No salt is mixed in, so the same pair maps to the same fingerprint in
/// every process. Visitors sharing both fields collide on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn derive(client_address: &str, user_agent: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(client_address.as_bytes());
        hasher.update(user_agent.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, enough to correlate log lines
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
