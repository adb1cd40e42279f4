//! One-time secret engine for Burnbox.
//!
//! This module provides:
//! - Secret creation: passphrase-derived encryption plus a separate
//!   passphrase verifier, persisted through a [`burnbox_storage::SecretStore`]
//! - Exactly-once retrieval with lazy expiry
//! - Bounded, retried store access
//!
//! # Architecture
//! The engine sits between a caller (CLI, HTTP layer) and the store. It is
//! stateless apart from configuration; all lifecycle state lives in the
//! store, where consumption is an atomic conditional update.

pub mod clock;
pub mod config;
pub mod engine;
pub mod retry;
pub mod schema;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::SecretEngine;
pub use retry::{RetryConfig, RetryExecutor};
pub use schema::{CreateSecretRequest, SecretKeyResponse, SecretResponse};
