//! Secret storage for Burnbox.
//!
//! This module defines the persisted [`SecretRecord`], the [`SecretStore`]
//! contract the lifecycle engine relies on, and the built-in backends.
//!
//! # Design Principles
//! - Store isolation: no cryptography happens here, records arrive sealed
//! - Async operations: all store calls are async
//! - Atomic consumption: the false-to-true flip of `consumed` is one
//!   conditional update inside the backend

pub mod memory;
pub mod record;
pub mod registry;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use record::{SecretRecord, SecretState};
pub use registry::{create_default_registry, StoreFactory, StoreRegistry};
pub use sqlite::SqliteStore;
pub use store::SecretStore;
