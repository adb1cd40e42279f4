//! The stored secret and its lifecycle state.

use chrono::{DateTime, Utc};
use std::fmt;

use burnbox_common::{RetrievalKey, SecretId};

/// Lifecycle state of a record at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretState {
    /// Created, not yet read, not expired.
    Active,
    /// Read once. Terminal.
    Consumed,
    /// Time to live elapsed before any read. Terminal.
    Expired,
}

/// A one-time secret as persisted.
///
/// Only `consumed` ever changes after creation, and only from `false` to
/// `true` through [`crate::SecretStore::try_mark_consumed`].
#[derive(Clone, PartialEq, Eq)]
pub struct SecretRecord {
    /// Internal identifier.
    pub id: SecretId,
    /// Public lookup handle.
    pub retrieval_key: RetrievalKey,
    /// nonce || ciphertext || tag, sealed under the passphrase-derived key.
    pub ciphertext: Vec<u8>,
    /// Argon2id PHC string of the passphrase.
    pub passphrase_verifier: String,
    /// Set once the plaintext has been handed out.
    pub consumed: bool,
    /// After this instant the record can no longer be read.
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl SecretRecord {
    /// Build a fresh, unconsumed record.
    pub fn new(
        id: SecretId,
        retrieval_key: RetrievalKey,
        ciphertext: Vec<u8>,
        passphrase_verifier: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            retrieval_key,
            ciphertext,
            passphrase_verifier,
            consumed: false,
            expires_at,
            created_at,
        }
    }

    /// Whether the expiry instant has been reached.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }

    /// Lifecycle state at `now`. Consumption wins over expiry.
    pub fn state_at(&self, now: DateTime<Utc>) -> SecretState {
        if self.consumed {
            SecretState::Consumed
        } else if self.is_expired_at(now) {
            SecretState::Expired
        } else {
            SecretState::Active
        }
    }
}

impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("id", &self.id)
            .field("retrieval_key", &self.retrieval_key)
            .field("ciphertext_len", &self.ciphertext.len())
            .field("consumed", &self.consumed)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
