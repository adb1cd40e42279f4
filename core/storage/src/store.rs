//! Secret store trait definition.

use async_trait::async_trait;

use crate::record::SecretRecord;
use burnbox_common::{Result, RetrievalKey, SecretId};

/// Durable store for secret records.
///
/// Implementations must make [`SecretStore::try_mark_consumed`] a single
/// atomic conditional update, so that it stays correct when several engine
/// instances share the same store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get the store name (e.g., "memory", "sqlite").
    fn name(&self) -> &str;

    /// Insert a new record.
    ///
    /// # Errors
    /// - `Error::Conflict` if the id or retrieval key already exists
    /// - `Error::StoreUnavailable` on transient backend failure
    async fn put(&self, record: &SecretRecord) -> Result<()>;

    /// Look up a record by its retrieval key.
    ///
    /// Returns `Ok(None)` when no such record exists.
    async fn get_by_retrieval_key(&self, key: &RetrievalKey) -> Result<Option<SecretRecord>>;

    /// Atomically flip `consumed` from `false` to `true`.
    ///
    /// # Returns
    /// - `Ok(true)` if this call performed the transition
    /// - `Ok(false)` if the record was already consumed or does not exist
    async fn try_mark_consumed(&self, id: &SecretId) -> Result<bool>;
}
