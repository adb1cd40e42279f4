//! In-memory secret store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::record::SecretRecord;
use crate::store::SecretStore;
use burnbox_common::{Error, Result, RetrievalKey, SecretId};

#[derive(Default)]
struct Tables {
    records: HashMap<SecretId, SecretRecord>,
    by_retrieval_key: HashMap<RetrievalKey, SecretId>,
}

/// In-memory secret store.
///
/// Useful for testing and single-process deployments. All data is stored
/// in memory and lost on drop. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, terminal ones included.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    /// Check if the store holds no records.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| Error::Storage("Memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| Error::Storage("Memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, record: &SecretRecord) -> Result<()> {
        let mut tables = self.write()?;

        if tables.records.contains_key(&record.id) {
            return Err(Error::Conflict(format!(
                "Secret id already exists: {}",
                record.id
            )));
        }
        if tables.by_retrieval_key.contains_key(&record.retrieval_key) {
            return Err(Error::Conflict("Retrieval key already exists".to_string()));
        }

        tables
            .by_retrieval_key
            .insert(record.retrieval_key.clone(), record.id);
        tables.records.insert(record.id, record.clone());

        Ok(())
    }

    async fn get_by_retrieval_key(&self, key: &RetrievalKey) -> Result<Option<SecretRecord>> {
        let tables = self.read()?;
        Ok(tables
            .by_retrieval_key
            .get(key)
            .and_then(|id| tables.records.get(id))
            .cloned())
    }

    async fn try_mark_consumed(&self, id: &SecretId) -> Result<bool> {
        let mut tables = self.write()?;
        match tables.records.get_mut(id) {
            Some(record) if !record.consumed => {
                record.consumed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
