use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::{Getter, Handler, ModuleDefinition, RegistryError};

/// Returned by registration; identifies a module to downstream callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHandle {
    pub name: String,
    pub version: String,
}

/// Collects module definitions during boot.
#[derive(Default)]
pub struct ModuleRegistryBuilder {
    modules: BTreeMap<String, Arc<ModuleDefinition>>,
}

impl ModuleRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ModuleDefinition) -> Result<ModuleHandle, RegistryError> {
        if definition.name.is_empty() {
            return Err(RegistryError::InvalidDefinition {
                module: definition.name,
                reason: "module name is empty".into(),
            });
        }
        if self.modules.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateModule(definition.name));
        }
        for (label, state) in [
            ("initial module state", &definition.initial_module_state),
            ("initial user state", &definition.initial_user_state),
        ] {
            if !state.is_object() {
                return Err(RegistryError::InvalidDefinition {
                    module: definition.name.clone(),
                    reason: format!("{label} must be a JSON object"),
                });
            }
        }

        info!(
            module = %definition.name,
            version = %definition.version,
            handlers = definition.handlers.len(),
            getters = definition.getters.len(),
            "[sd-03] Module registered"
        );

        let handle = ModuleHandle {
            name: definition.name.clone(),
            version: definition.version.clone(),
        };
        self.modules
            .insert(definition.name.clone(), Arc::new(definition));
        Ok(handle)
    }

    /// Freeze the registry. No module can be added afterwards.
    pub fn build(self) -> Arc<ModuleRegistry> {
        Arc::new(ModuleRegistry {
            modules: self.modules,
        })
    }
}

/// Immutable registry, shared by `Arc`.
#[derive(Debug)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Arc<ModuleDefinition>>,
}

impl ModuleRegistry {
    pub fn module(&self, name: &str) -> Result<&ModuleDefinition, RegistryError> {
        self.modules
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Definitions in name order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn resolve_handler(&self, module: &str, handler: &str) -> Result<Arc<dyn Handler>, RegistryError> {
        self.module(module)?
            .handlers
            .get(handler)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownHandler {
                module: module.to_string(),
                handler: handler.to_string(),
            })
    }

    pub fn resolve_getter(&self, module: &str, getter: &str) -> Result<Arc<dyn Getter>, RegistryError> {
        self.module(module)?
            .getters
            .get(getter)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownGetter {
                module: module.to_string(),
                getter: getter.to_string(),
            })
    }
}
