//! Passphrase to encryption key derivation.
//!
//! The key must be reproducible at retrieval time from the passphrase
//! alone, so derivation is unsalted: BLAKE2b with a 256-bit output over a
//! fixed domain tag and the passphrase bytes. Brute-force resistance comes
//! from the verifier, which gates every decryption attempt.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use crate::keys::{SecretKey, KEY_LENGTH};

/// Domain separation tag mixed into every derivation.
const KDF_CONTEXT: &[u8] = b"burnbox.secret-key.v1";

/// Derive the encryption key for a passphrase.
///
/// # Postconditions
/// - The same passphrase always yields the same key
/// - Empty and whitespace-only passphrases are accepted
///
/// # Security
/// - Passphrase is not stored or logged
pub fn derive_key(passphrase: &str) -> SecretKey {
    let mut hasher = Blake2b::<U32>::new();
    hasher.update(KDF_CONTEXT);
    hasher.update((passphrase.len() as u64).to_le_bytes());
    hasher.update(passphrase.as_bytes());

    let result = hasher.finalize();
    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&result);
    SecretKey::from_bytes(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derive_key_deterministic() {
        let key1 = derive_key("correct horse battery staple");
        let key2 = derive_key("correct horse battery staple");
        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_passphrase() {
        let key1 = derive_key("passphrase1");
        let key2 = derive_key("passphrase2");
        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_accepts_empty_and_whitespace() {
        let empty = derive_key("");
        let blank = derive_key("   ");
        assert_ne!(empty.as_bytes(), blank.as_bytes());
    }

    proptest! {
        #[test]
        fn prop_derivation_is_pure(passphrase in ".*") {
            let first = derive_key(&passphrase);
            let second = derive_key(&passphrase);
            prop_assert_eq!(first.as_bytes(), second.as_bytes());
        }
    }
}
