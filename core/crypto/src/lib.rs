//! Cryptographic primitives for Burnbox.
//!
//! This module provides:
//! - Deterministic passphrase to key derivation (BLAKE2b-256)
//! - Salted, slow passphrase verifiers (Argon2id)
//! - Authenticated encryption of secret payloads (XChaCha20-Poly1305)
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext, passphrase or key material is ever logged
//! - Verifier checks are constant-time

pub mod aead;
pub mod kdf;
pub mod keys;
pub mod verifier;

pub use aead::{decrypt, encrypt};
pub use kdf::derive_key;
pub use keys::{SecretKey, KEY_LENGTH};
pub use verifier::{hash_passphrase, verify, VerifierParams};
