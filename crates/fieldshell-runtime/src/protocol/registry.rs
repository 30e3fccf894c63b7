//! Named protocol shell lookup.

use super::{builtin, ProtocolShell, RegistryError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Holds registered protocol shells keyed by `metadata.name`.
///
/// Shells are shared as `Arc` so a running execution keeps its definition
/// even if the registry is cleared mid-run.
#[derive(Default)]
pub struct ProtocolRegistry {
    shells: RwLock<HashMap<String, Arc<ProtocolShell>>>,
}

impl ProtocolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-loaded with the built-in shells.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        {
            let mut shells = registry.shells.write();
            for shell in builtin::all() {
                shells.insert(shell.metadata.name.clone(), Arc::new(shell));
            }
        }
        registry
    }

    /// Registers a shell under its name.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Duplicate`] if the name is taken,
    /// [`RegistryError::EmptyName`] / [`RegistryError::InvalidReliability`]
    /// for malformed metadata.
    pub fn register(&self, shell: ProtocolShell) -> Result<(), RegistryError> {
        let name = shell.metadata.name.trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        let reliability = shell.metadata.reliability;
        if !(0.0..=1.0).contains(&reliability) {
            return Err(RegistryError::InvalidReliability {
                name,
                value: reliability.to_string(),
            });
        }

        let mut shells = self.shells.write();
        if shells.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        debug!(protocol = %name, steps = shell.process.len(), "Protocol registered");
        shells.insert(name, Arc::new(shell));
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ProtocolShell>> {
        self.shells.read().get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.shells.read().contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shells.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shells.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shells.read().is_empty()
    }

    pub fn clear(&self) {
        self.shells.write().clear();
    }
}
