//! Passphrase verification using Argon2id.
//!
//! The verifier is a salted, deliberately slow PHC string kept next to the
//! ciphertext. It shares neither algorithm nor salt with [`crate::kdf`], so
//! the encryption key cannot be recovered from it and guessing against it
//! never touches the ciphertext.

use argon2::password_hash::{
    rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use burnbox_common::{Error, Result};

/// Cost parameters for Argon2id verifier hashing.
///
/// Only affects newly created verifiers: verification reads the parameters
/// embedded in the stored PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Number of passes.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl VerifierParams {
    /// Default cost: 19 MiB, 2 passes, 1 lane.
    ///
    /// Roughly 50 ms per hash on a current server core, which keeps a
    /// retrieval well inside an interactive request budget.
    pub fn standard() -> Self {
        Self {
            memory_cost: 19456,
            time_cost: 2,
            parallelism: 1,
        }
    }

    /// Higher cost for deployments that can afford ~200 ms per retrieval.
    pub fn hardened() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 1,
        }
    }

    /// Minimal cost. Tests only.
    pub fn fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| Error::Crypto(format!("Invalid verifier parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for VerifierParams {
    fn default() -> Self {
        Self::standard()
    }
}

/// Hash a passphrase into a storable verifier string.
///
/// # Postconditions
/// - Returns a PHC-format Argon2id string with a fresh random salt
/// - Two calls with the same passphrase return different strings
///
/// # Errors
/// - Returns error if `params` are outside Argon2's accepted ranges
pub fn hash_passphrase(passphrase: &str, params: &VerifierParams) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .argon2()?
        .hash_password(passphrase.as_bytes(), &salt)
        .map_err(|e| Error::Crypto(format!("Passphrase hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a passphrase against a stored verifier.
///
/// # Returns
/// - `Ok(true)` if the passphrase matches
/// - `Ok(false)` on any mismatch
///
/// # Errors
/// - `Error::Validation` if the stored verifier cannot be parsed or uses an
///   unsupported algorithm
pub fn verify(passphrase: &str, verifier: &str) -> Result<bool> {
    let parsed = PasswordHash::new(verifier)
        .map_err(|e| Error::Validation(format!("Malformed passphrase verifier: {}", e)))?;

    match Argon2::default().verify_password(passphrase.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(Error::Validation(format!(
            "Unusable passphrase verifier: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let verifier = hash_passphrase("open sesame", &VerifierParams::fast()).unwrap();
        assert!(verifier.starts_with("$argon2id$"));
        assert!(verify("open sesame", &verifier).unwrap());
        assert!(!verify("open sesam", &verifier).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let params = VerifierParams::fast();
        let v1 = hash_passphrase("same", &params).unwrap();
        let v2 = hash_passphrase("same", &params).unwrap();
        assert_ne!(v1, v2);
        assert!(verify("same", &v1).unwrap());
        assert!(verify("same", &v2).unwrap());
    }

    #[test]
    fn test_verify_uses_stored_params() {
        let verifier = hash_passphrase("tuned", &VerifierParams::fast()).unwrap();
        assert!(verifier.contains("m=1024,t=1,p=1"));
        assert!(verify("tuned", &verifier).unwrap());
    }

    #[test]
    fn test_empty_passphrase_accepted() {
        let verifier = hash_passphrase("", &VerifierParams::fast()).unwrap();
        assert!(verify("", &verifier).unwrap());
        assert!(!verify(" ", &verifier).unwrap());
    }

    #[test]
    fn test_malformed_verifier_is_validation_error() {
        let result = verify("anything", "not-a-phc-string");
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = VerifierParams {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 0,
        };
        assert!(matches!(
            hash_passphrase("x", &params),
            Err(Error::Crypto(_))
        ));
    }

    #[test]
    fn test_verifier_does_not_contain_derived_key() {
        use base64::engine::general_purpose::STANDARD_NO_PAD;
        use base64::Engine;

        let passphrase = "independent";
        let verifier = hash_passphrase(passphrase, &VerifierParams::fast()).unwrap();
        let key = crate::kdf::derive_key(passphrase);
        assert!(!verifier.contains(&STANDARD_NO_PAD.encode(key.as_bytes())));
    }
}
