//! Common types used throughout Burnbox.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Random bytes behind a retrieval key (256-bit).
pub const RETRIEVAL_KEY_BYTES: usize = 32;

/// Upper bound on accepted retrieval key length.
const MAX_RETRIEVAL_KEY_LEN: usize = 128;

/// Unique identifier for a stored secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretId(Uuid);

impl SecretId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse from the hyphenated string form.
    pub fn parse(id: &str) -> crate::Result<Self> {
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|e| crate::Error::InvalidInput(format!("Invalid secret id: {}", e)))
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public lookup handle given to the sender.
///
/// Carries no information about the passphrase or plaintext: it is pure
/// randomness encoded as URL-safe base64 without padding.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct RetrievalKey(String);

impl RetrievalKey {
    /// Generate a fresh random retrieval key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; RETRIEVAL_KEY_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Accept a key supplied by a caller.
    ///
    /// # Errors
    /// - Returns error if the key is empty, too long, or contains characters
    ///   outside the URL-safe base64 alphabet
    pub fn parse(key: impl Into<String>) -> crate::Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Retrieval key cannot be empty".to_string(),
            ));
        }
        if key.len() > MAX_RETRIEVAL_KEY_LEN {
            return Err(crate::Error::InvalidInput(
                "Retrieval key is too long".to_string(),
            ));
        }
        if !key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(crate::Error::InvalidInput(
                "Retrieval key contains invalid characters".to_string(),
            ));
        }
        Ok(Self(key))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Leading characters, safe for log lines.
    pub fn prefix(&self) -> &str {
        match self.0.char_indices().nth(6) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

impl TryFrom<String> for RetrievalKey {
    type Error = crate::Error;

    fn try_from(key: String) -> crate::Result<Self> {
        Self::parse(key)
    }
}

impl fmt::Display for RetrievalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RetrievalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetrievalKey({}…)", self.prefix())
    }
}

/// Sensitive data wrapper that zeroizes on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SensitiveBytes(Vec<u8>);

impl SensitiveBytes {
    /// Create new sensitive bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self(data)
    }

    /// Get a reference to the inner bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// View as UTF-8 text, if valid.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

}

impl fmt::Debug for SensitiveBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SensitiveBytes([REDACTED; {} bytes])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_key_is_unique() {
        let a = RetrievalKey::generate();
        let b = RetrievalKey::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_retrieval_key_encoding() {
        let key = RetrievalKey::generate();
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(key.as_str().len(), 43);
        assert!(RetrievalKey::parse(key.as_str()).is_ok());
    }

    #[test]
    fn test_retrieval_key_parse_rejects_garbage() {
        assert!(RetrievalKey::parse("").is_err());
        assert!(RetrievalKey::parse("has space").is_err());
        assert!(RetrievalKey::parse("a/b").is_err());
        assert!(RetrievalKey::parse("x".repeat(129)).is_err());
        assert!(RetrievalKey::parse("nonexistent-key").is_ok());
    }

    #[test]
    fn test_retrieval_key_debug_is_truncated() {
        let key = RetrievalKey::parse("abcdefghijklmnop").unwrap();
        let debug = format!("{:?}", key);
        assert!(debug.contains("abcdef"));
        assert!(!debug.contains("ghij"));
    }

    #[test]
    fn test_retrieval_key_deserialize_validates() {
        let key = RetrievalKey::generate();
        let json = serde_json::to_string(&key).unwrap();
        let back: RetrievalKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);

        assert!(serde_json::from_str::<RetrievalKey>(r#""aéééé""#).is_err());
        assert!(serde_json::from_str::<RetrievalKey>(r#""""#).is_err());
    }

    #[test]
    fn test_retrieval_key_prefix_on_short_key() {
        let key = RetrievalKey::parse("abc").unwrap();
        assert_eq!(key.prefix(), "abc");
        assert_eq!(format!("{:?}", key), "RetrievalKey(abc…)");
    }

    #[test]
    fn test_secret_id_roundtrip() {
        let id = SecretId::generate();
        let parsed = SecretId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(SecretId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn test_sensitive_bytes_redacted() {
        let bytes = SensitiveBytes::new(b"hunter2".to_vec());
        assert_eq!(bytes.as_str(), Some("hunter2"));
        assert_eq!(format!("{:?}", bytes), "SensitiveBytes([REDACTED; 7 bytes])");
    }
}
