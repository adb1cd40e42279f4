//! The one-time secret lifecycle.
//!
//! A record is `Active` until exactly one retrieval consumes it or its time
//! to live runs out. Expiry is evaluated at read time; consumption is a
//! conditional update in the store, so the engine itself holds no lock and
//! several engine instances may share one store.

use chrono::TimeDelta;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::retry::RetryExecutor;
use crate::schema::{CreateSecretRequest, SecretKeyResponse, SecretResponse};
use burnbox_common::{Error, Result, RetrievalKey, SecretId, SensitiveBytes};
use burnbox_crypto::{decrypt, derive_key, encrypt, hash_passphrase, verify, VerifierParams};
use burnbox_storage::{SecretRecord, SecretState, SecretStore};

/// Creates and hands out one-time secrets.
pub struct SecretEngine {
    store: Arc<dyn SecretStore>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    retry: RetryExecutor,
}

impl SecretEngine {
    /// Create an engine over `store` using the system clock.
    pub fn new(store: Arc<dyn SecretStore>, config: EngineConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    /// Create an engine with an explicit time source.
    pub fn with_clock(
        store: Arc<dyn SecretStore>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let retry = RetryExecutor::new(config.retry.clone());
        Self {
            store,
            clock,
            config,
            retry,
        }
    }

    /// Get the underlying store.
    pub fn store(&self) -> Arc<dyn SecretStore> {
        self.store.clone()
    }

    /// Seal `plaintext` under `passphrase` and persist it.
    ///
    /// # Postconditions
    /// - Returns the retrieval key of a new, active record
    /// - `expires_at` is `now + ttl_seconds` when `ttl_seconds` is positive,
    ///   otherwise the record never expires
    /// - Neither plaintext nor passphrase is retained or logged
    ///
    /// # Errors
    /// - `Error::InvalidInput` if the payload exceeds the configured limit or
    ///   the TTL is out of range
    /// - `Error::Conflict` if identifier generation keeps colliding
    /// - `Error::StoreUnavailable` if the store stays unreachable
    pub async fn create(
        &self,
        plaintext: &[u8],
        passphrase: &str,
        ttl_seconds: Option<i64>,
    ) -> Result<RetrievalKey> {
        if plaintext.len() > self.config.max_plaintext_bytes {
            return Err(Error::InvalidInput(format!(
                "Secret exceeds {} bytes",
                self.config.max_plaintext_bytes
            )));
        }

        let ciphertext = {
            let key = derive_key(passphrase);
            encrypt(&key, plaintext)?
        };
        let verifier = hash_verifier(passphrase, &self.config.verifier).await?;

        let created_at = self.clock.now();
        let expires_at = match ttl_seconds {
            Some(ttl) if ttl > 0 => Some(
                TimeDelta::try_seconds(ttl)
                    .and_then(|ttl| created_at.checked_add_signed(ttl))
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("TTL out of range: {} seconds", ttl))
                    })?,
            ),
            _ => None,
        };

        let mut collisions = 0;
        loop {
            let record = SecretRecord::new(
                SecretId::generate(),
                RetrievalKey::generate(),
                ciphertext.clone(),
                verifier.clone(),
                created_at,
                expires_at,
            );

            match self.store_call("put", || self.store.put(&record)).await {
                Ok(()) => {
                    info!(
                        secret_id = %record.id,
                        expires_at = ?record.expires_at,
                        "Secret created"
                    );
                    return Ok(record.retrieval_key.clone());
                }
                Err(Error::Conflict(reason)) if collisions < self.config.max_collision_retries => {
                    collisions += 1;
                    warn!(collisions, %reason, "Identifier collision, regenerating");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Exchange a retrieval key and passphrase for the plaintext, once.
    ///
    /// Checks run in a fixed order and stop at the first failure: lookup,
    /// consumed, expired, passphrase, decryption, consume.
    ///
    /// # Errors
    /// - `Error::NotFound` if no record has this key
    /// - `Error::AlreadyConsumed` if it was read before, including by a
    ///   concurrent caller that won the consume race
    /// - `Error::Expired` if its time to live has passed
    /// - `Error::InvalidPassphrase` if the verifier rejects the passphrase
    /// - `Error::Decryption` if the ciphertext does not open despite a
    ///   passing verifier; the record stays active
    /// - `Error::Validation` if the stored verifier is malformed
    /// - `Error::StoreUnavailable` if the store stays unreachable
    pub async fn retrieve(&self, key: &RetrievalKey, passphrase: &str) -> Result<SensitiveBytes> {
        self.retrieve_checked(key, passphrase, |_| Ok(())).await
    }

    /// Shared retrieval path. `accept` inspects the opened plaintext before
    /// the consume step; rejecting it leaves the record active.
    async fn retrieve_checked<F>(
        &self,
        key: &RetrievalKey,
        passphrase: &str,
        accept: F,
    ) -> Result<SensitiveBytes>
    where
        F: FnOnce(&SensitiveBytes) -> Result<()>,
    {
        let record = self
            .store_call("get", || self.store.get_by_retrieval_key(key))
            .await?
            .ok_or(Error::NotFound)?;

        match record.state_at(self.clock.now()) {
            SecretState::Active => {}
            SecretState::Consumed => {
                debug!(secret_id = %record.id, "Retrieval of consumed secret");
                return Err(Error::AlreadyConsumed);
            }
            SecretState::Expired => {
                debug!(secret_id = %record.id, "Retrieval of expired secret");
                return Err(Error::Expired);
            }
        }

        if !verify_passphrase(passphrase, &record.passphrase_verifier).await? {
            debug!(secret_id = %record.id, "Passphrase rejected");
            return Err(Error::InvalidPassphrase);
        }

        let plaintext = {
            let secret_key = derive_key(passphrase);
            match decrypt(&secret_key, &record.ciphertext) {
                Ok(bytes) => SensitiveBytes::new(bytes),
                Err(err) => {
                    error!(
                        secret_id = %record.id,
                        error = %err,
                        "Ciphertext failed to open after passphrase verified"
                    );
                    return Err(err);
                }
            }
        };
        accept(&plaintext)?;

        let consumed = self
            .store_call("consume", || self.store.try_mark_consumed(&record.id))
            .await?;
        if !consumed {
            debug!(secret_id = %record.id, "Lost consume race");
            return Err(Error::AlreadyConsumed);
        }

        info!(
            secret_id = %record.id,
            bytes = plaintext.as_bytes().len(),
            "Secret consumed"
        );
        Ok(plaintext)
    }

    /// [`SecretEngine::create`] for a text secret.
    pub async fn create_from_request(
        &self,
        request: &CreateSecretRequest,
    ) -> Result<SecretKeyResponse> {
        let key = self
            .create(request.secret.as_bytes(), &request.passphrase, request.ttl)
            .await?;
        Ok(SecretKeyResponse {
            secret_key: key.as_str().to_string(),
        })
    }

    /// [`SecretEngine::retrieve`] for a caller-supplied key string and a
    /// text secret.
    ///
    /// A key that is not well formed cannot name any record and is reported
    /// as `Error::NotFound`. A binary secret is refused with
    /// `Error::Serialization` and stays readable through
    /// [`SecretEngine::retrieve`].
    pub async fn retrieve_text(&self, key: &str, passphrase: &str) -> Result<SecretResponse> {
        let key = RetrievalKey::parse(key).map_err(|_| Error::NotFound)?;
        let plaintext = self
            .retrieve_checked(&key, passphrase, |plaintext| {
                plaintext
                    .as_str()
                    .map(|_| ())
                    .ok_or_else(|| Error::Serialization("Secret is not valid UTF-8".to_string()))
            })
            .await?;
        let secret = plaintext.as_str().unwrap_or_default().to_string();
        Ok(SecretResponse { secret })
    }

    /// Run a store call under the configured timeout and retry policy.
    async fn store_call<T, F, Fut>(&self, op: &'static str, call: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timeout = self.config.store_timeout();
        self.retry
            .execute(|| {
                let fut = call();
                async move {
                    match tokio::time::timeout(timeout, fut).await {
                        Ok(result) => result,
                        Err(_) => Err(Error::StoreUnavailable(format!(
                            "{} timed out after {:?}",
                            op, timeout
                        ))),
                    }
                }
            })
            .await
    }
}

/// Argon2 hashing on the blocking pool.
async fn hash_verifier(passphrase: &str, params: &VerifierParams) -> Result<String> {
    let passphrase = Zeroizing::new(passphrase.to_string());
    let params = params.clone();
    tokio::task::spawn_blocking(move || hash_passphrase(&passphrase, &params))
        .await
        .map_err(|e| Error::Crypto(format!("Verifier task failed: {}", e)))?
}

/// Argon2 verification on the blocking pool.
async fn verify_passphrase(passphrase: &str, verifier: &str) -> Result<bool> {
    let passphrase = Zeroizing::new(passphrase.to_string());
    let verifier = verifier.to_string();
    tokio::task::spawn_blocking(move || verify(&passphrase, &verifier))
        .await
        .map_err(|e| Error::Crypto(format!("Verifier task failed: {}", e)))?
}
