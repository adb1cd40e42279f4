//! Store registry for resolving a backend from configuration.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::SecretStore;
use burnbox_common::{Error, Result};

/// Factory function type for creating stores.
pub type StoreFactory = Box<dyn Fn(Value) -> Result<Arc<dyn SecretStore>> + Send + Sync>;

/// Registry for secret store factories.
///
/// Allows dynamic registration and resolution of stores by name and
/// configuration.
pub struct StoreRegistry {
    factories: HashMap<String, StoreFactory>,
}

impl StoreRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a store factory.
    ///
    /// # Errors
    /// - Returns error if name is already registered
    pub fn register(&mut self, name: impl Into<String>, factory: StoreFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(Error::InvalidInput(format!(
                "Store '{}' is already registered",
                name
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Resolve a store by name and configuration.
    ///
    /// # Errors
    /// - Store not registered
    /// - Configuration invalid for the store
    pub fn resolve(&self, name: &str, config: Value) -> Result<Arc<dyn SecretStore>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::InvalidInput(format!("Store '{}' is not registered", name)))?;
        factory(config)
    }

    /// Get list of registered store names.
    pub fn stores(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Check if a store is registered.
    pub fn has_store(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with the built-in stores.
///
/// - `memory`: no configuration
/// - `sqlite`: `{"path": "/path/to/secrets.db"}`
pub fn create_default_registry() -> Result<StoreRegistry> {
    let mut registry = StoreRegistry::new();

    registry.register(
        "memory",
        Box::new(|_config: Value| {
            Ok(Arc::new(crate::memory::MemoryStore::new()) as Arc<dyn SecretStore>)
        }),
    )?;

    registry.register(
        "sqlite",
        Box::new(|config: Value| {
            let path = config
                .get("path")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    Error::InvalidInput("SQLite store requires 'path'".to_string())
                })?;
            Ok(Arc::new(crate::sqlite::SqliteStore::open(path)?) as Arc<dyn SecretStore>)
        }),
    )?;

    Ok(registry)
}
