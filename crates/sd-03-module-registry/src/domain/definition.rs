use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{Getter, Handler};

/// Everything a module declares at registration.
#[derive(Clone)]
pub struct ModuleDefinition {
    pub name: String,
    pub version: String,
    pub initial_module_state: Value,
    pub initial_user_state: Value,
    pub handlers: BTreeMap<String, Arc<dyn Handler>>,
    pub getters: BTreeMap<String, Arc<dyn Getter>>,
}

impl ModuleDefinition {
    /// A module with empty state, no handlers and no getters.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            initial_module_state: Value::Object(Default::default()),
            initial_user_state: Value::Object(Default::default()),
            handlers: BTreeMap::new(),
            getters: BTreeMap::new(),
        }
    }

    pub fn with_module_state(mut self, state: Value) -> Self {
        self.initial_module_state = state;
        self
    }

    pub fn with_user_state(mut self, template: Value) -> Self {
        self.initial_user_state = template;
        self
    }

    pub fn with_handler(mut self, name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    pub fn with_getter(mut self, name: impl Into<String>, getter: impl Getter + 'static) -> Self {
        self.getters.insert(name.into(), Arc::new(getter));
        self
    }

    pub fn handler_names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn getter_names(&self) -> impl Iterator<Item = &str> {
        self.getters.keys().map(String::as_str)
    }
}

impl fmt::Debug for ModuleDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDefinition")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .finish()
    }
}
