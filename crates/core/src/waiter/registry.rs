//! Waiter registry
//!
//! Conditions are compiled once while the registry is built and are read-only
//! afterwards. Clones of a registry share the same conditions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use waitline_domain::{normalize_waiter_name, DefinitionError, WaitersDocument};

use super::condition::Condition;
use crate::error::WaiterError;

/// Immutable lookup from waiter name to condition
#[derive(Debug, Clone, Default)]
pub struct WaiterRegistry {
    conditions: Arc<BTreeMap<String, Arc<Condition>>>,
}

impl WaiterRegistry {
    pub fn builder() -> WaiterRegistryBuilder {
        WaiterRegistryBuilder::default()
    }

    /// Compile every waiter of a document
    ///
    /// # Errors
    /// Returns the first `DefinitionError` in the document.
    pub fn from_document(document: &WaitersDocument) -> Result<Self, DefinitionError> {
        Ok(Self::builder().document(document)?.build())
    }

    /// Find a condition by name
    ///
    /// Accepts `PascalCase`, `camelCase` or `snake_case` spellings.
    ///
    /// # Errors
    /// Returns `WaiterError::NoSuchWaiter` listing the registered names.
    pub fn lookup(&self, name: &str) -> Result<Arc<Condition>, WaiterError> {
        normalize_waiter_name(name)
            .ok()
            .and_then(|key| self.conditions.get(&key).cloned())
            .ok_or_else(|| WaiterError::NoSuchWaiter {
                name: name.to_string(),
                available: self.waiter_names(),
            })
    }

    /// Registered names, sorted
    pub fn waiter_names(&self) -> Vec<String> {
        self.conditions.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Collects conditions before the registry is frozen
#[derive(Debug, Default)]
pub struct WaiterRegistryBuilder {
    conditions: BTreeMap<String, Arc<Condition>>,
}

impl WaiterRegistryBuilder {
    /// Add a condition, replacing any existing one with the same name
    pub fn register(mut self, condition: Condition) -> Self {
        let name = condition.name().to_string();
        if self.conditions.insert(name.clone(), Arc::new(condition)).is_some() {
            debug!(waiter = %name, "Replaced previously registered waiter");
        }
        self
    }

    /// Validate and add every waiter of a document
    ///
    /// # Errors
    /// Returns `UnsupportedVersion` or the first invalid waiter's error.
    pub fn document(mut self, document: &WaitersDocument) -> Result<Self, DefinitionError> {
        document.validate()?;
        for (name, definition) in &document.waiters {
            self = self.register(Condition::from_definition(name, definition)?);
        }
        Ok(self)
    }

    pub fn build(self) -> WaiterRegistry {
        debug!(waiters = self.conditions.len(), "Waiter registry built");
        WaiterRegistry { conditions: Arc::new(self.conditions) }
    }
}
