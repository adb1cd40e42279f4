//! Common error types for Burnbox.

use thiserror::Error;

/// Top-level error type for Burnbox operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No secret exists for the given retrieval key.
    #[error("Secret not found")]
    NotFound,

    /// The secret was already read once.
    #[error("Secret already consumed")]
    AlreadyConsumed,

    /// The secret outlived its time to live.
    #[error("Secret expired")]
    Expired,

    /// The passphrase did not match the stored verifier.
    #[error("Invalid passphrase")]
    InvalidPassphrase,

    /// Authenticated decryption failed (wrong key, tampered or corrupt blob).
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// A record with the same identifier or retrieval key already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store did not answer in time or is temporarily locked.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored verification data is malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Cryptographic primitive failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Storage backend failed in a way retrying will not fix.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Outcome shown to callers outside the engine.
///
/// Collapses the lookup failures into one signal so an outsider cannot tell
/// whether a key ever existed, and both passphrase failures into one so it
/// cannot tell which check rejected it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicOutcome {
    /// Not found, already read, or expired.
    Unavailable,
    /// Passphrase rejected.
    InvalidPassphrase,
    /// Transient failure; the same request may succeed later.
    TryAgain,
    /// Anything else.
    Internal,
}

impl PublicOutcome {
    /// Short message suitable for end users.
    pub fn message(&self) -> &'static str {
        match self {
            PublicOutcome::Unavailable => "secret is unavailable",
            PublicOutcome::InvalidPassphrase => "invalid passphrase",
            PublicOutcome::TryAgain => "service temporarily unavailable, try again",
            PublicOutcome::Internal => "internal error",
        }
    }
}

impl Error {
    /// Whether the operation may be retried as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_))
    }

    /// Whether the error reports a record in a terminal state.
    pub fn is_terminal_state(&self) -> bool {
        matches!(self, Error::AlreadyConsumed | Error::Expired)
    }

    /// Map to the outcome presented at the outer boundary.
    pub fn public_outcome(&self) -> PublicOutcome {
        match self {
            Error::NotFound | Error::AlreadyConsumed | Error::Expired => {
                PublicOutcome::Unavailable
            }
            Error::InvalidPassphrase | Error::Decryption(_) => PublicOutcome::InvalidPassphrase,
            Error::StoreUnavailable(_) => PublicOutcome::TryAgain,
            _ => PublicOutcome::Internal,
        }
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
