//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::retry::RetryConfig;
use burnbox_common::{Error, Result};
use burnbox_crypto::VerifierParams;

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

/// Default cap on secret payload size (64 KiB).
pub const DEFAULT_MAX_PLAINTEXT_BYTES: usize = 64 * 1024;

/// Tunables for [`crate::SecretEngine`].
///
/// Loaded from JSON; every field is optional and falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Argon2id cost for new passphrase verifiers.
    pub verifier: VerifierParams,
    /// Upper bound on each store call before it counts as unavailable.
    pub store_timeout_ms: u64,
    /// Backoff for transient store failures.
    pub retry: RetryConfig,
    /// How many times `create` regenerates identifiers after a collision.
    pub max_collision_retries: u32,
    /// Largest accepted secret payload.
    pub max_plaintext_bytes: usize,
}

impl EngineConfig {
    /// Store call timeout as a [`Duration`].
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Read configuration from a JSON file.
    ///
    /// # Errors
    /// - File cannot be read
    /// - Contents are not a valid configuration
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Write configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Serialize configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verifier: VerifierParams::standard(),
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            retry: RetryConfig::default(),
            max_collision_retries: 3,
            max_plaintext_bytes: DEFAULT_MAX_PLAINTEXT_BYTES,
        }
    }
}
