//! Common utilities and types shared across Burnbox modules.
//!
//! This module provides the error taxonomy used by every crate and the
//! identifier types that flow between the engine and its store.

pub mod error;
pub mod types;

pub use error::{Error, PublicOutcome, Result};
pub use types::{RetrievalKey, SecretId, SensitiveBytes, RETRIEVAL_KEY_BYTES};
