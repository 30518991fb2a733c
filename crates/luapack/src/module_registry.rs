//! Module registry for tracking module units during bundling
//!
//! The ModuleRegistry is the single source of truth for module identity
//! throughout the bundling process. Every module id appears exactly once, in
//! the order modules were added, which is the discovery order.

use log::debug;

use crate::{error::BundleError, types::FxIndexMap};

/// A module ready to be wrapped into the bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleUnit {
    /// Registry key (e.g., "sub.helpers")
    pub module_id: String,
    /// Root-relative path the body was read from
    pub relative_path: String,
    /// Module source, already stripped when minification is enabled
    pub body: String,
}

/// Central registry for module units
#[derive(Debug, Clone, Default)]
pub struct ModuleRegistry {
    /// Map from module id to its unit, in insertion order
    modules: FxIndexMap<String, ModuleUnit>,
}

impl ModuleRegistry {
    /// Create a new empty module registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the registry
    ///
    /// Fails with `BundleError::Collision` when another unit already owns the
    /// same module id; the existing entry is left untouched.
    pub fn add_module(&mut self, unit: ModuleUnit) -> Result<(), BundleError> {
        if let Some(existing) = self.modules.get(&unit.module_id) {
            return Err(BundleError::Collision {
                module_id: unit.module_id,
                first: existing.relative_path.clone(),
                second: unit.relative_path,
            });
        }

        debug!(
            "Registered module '{}' from {} ({} bytes)",
            unit.module_id,
            unit.relative_path,
            unit.body.len()
        );
        self.modules.insert(unit.module_id.clone(), unit);
        Ok(())
    }

    /// Iterate over all units in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &ModuleUnit> {
        self.modules.values()
    }

    /// Get all module ids in insertion order
    pub fn module_ids(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Get total number of modules in the registry
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
