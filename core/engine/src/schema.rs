//! Request and response shapes for callers of the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Request to store a new secret.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CreateSecretRequest {
    /// Secret text.
    pub secret: String,
    /// Passphrase the receiver must present.
    pub passphrase: String,
    /// Time to live in seconds. Absent or non-positive means no expiry.
    #[serde(default)]
    pub ttl: Option<i64>,
}

impl fmt::Debug for CreateSecretRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateSecretRequest")
            .field("secret", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Response carrying the generated retrieval key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyResponse {
    /// Retrieval key for the stored secret.
    pub secret_key: String,
}

/// Response carrying a decrypted secret.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretResponse {
    /// Decrypted secret text.
    pub secret: String,
}

impl fmt::Debug for SecretResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretResponse")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
