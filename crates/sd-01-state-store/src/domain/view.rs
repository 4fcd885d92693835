//! Read-only view of one module, handed to getters.

use serde_json::Value;
use shared_types::{StateVersion, UserId};
use std::borrow::Cow;
use std::sync::Arc;

use super::{ModuleData, StateError, StateSnapshot};

/// One module of a pinned snapshot. Cheap to clone; never observes later commits.
#[derive(Clone, Debug)]
pub struct ModuleView {
    snapshot: Arc<StateSnapshot>,
    module: String,
}

impl ModuleView {
    pub fn new(snapshot: Arc<StateSnapshot>, module: &str) -> Result<Self, StateError> {
        if !snapshot.has_module(module) {
            return Err(StateError::UnknownModule(module.to_string()));
        }
        Ok(Self {
            snapshot,
            module: module.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.module
    }

    pub fn version(&self) -> StateVersion {
        self.snapshot.version()
    }

    fn data(&self) -> &ModuleData {
        // Presence checked in `new`; snapshots are immutable.
        self.snapshot
            .module(&self.module)
            .unwrap_or_else(|| unreachable!("module view over missing module"))
    }

    pub fn module_state(&self) -> &Value {
        &self.data().module_state
    }

    /// Users with a materialised record, in identity order.
    pub fn users(&self) -> impl Iterator<Item = (&UserId, &Value)> {
        self.data().users.iter()
    }

    pub fn user(&self, user: &UserId) -> Cow<'_, Value> {
        self.data().user(user)
    }
}
