//! # Domain Entities for the State Store
//!
//! ## Type Decisions
//!
//! - State records are JSON objects (`serde_json::Value`): module schemas are
//!   declared at registration time, not at compile time.
//! - All maps are `BTreeMap`s, and `serde_json`'s default `Map` is ordered,
//!   so the canonical encoding (and therefore `state_root`) is identical on
//!   every node holding the same state.
//! - Modules are held behind `Arc` so a commit only clones the module it
//!   touches.

use serde_json::Value;
use sha3::{Digest, Sha3_256};
use shared_types::{
    Delta, DeltaTarget, Hash, ModuleExport, ModuleName, StateExport, StateVersion, UserId,
};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{apply_delta, StateError};

/// State held for one installed module.
#[derive(Clone, Debug, PartialEq)]
pub struct ModuleData {
    /// Module-level state blob; its keys are the module schema.
    pub module_state: Value,
    /// Defaults for a user that has no record yet; its keys are the user schema.
    pub user_template: Value,
    /// Materialised per-user records.
    pub users: BTreeMap<UserId, Value>,
}

impl ModuleData {
    pub fn new(module_state: Value, user_template: Value) -> Self {
        Self {
            module_state,
            user_template,
            users: BTreeMap::new(),
        }
    }

    /// The user's record, or the template if the user has none yet.
    /// Never persists the materialisation.
    pub fn user(&self, user: &UserId) -> Cow<'_, Value> {
        match self.users.get(user) {
            Some(record) => Cow::Borrowed(record),
            None => Cow::Borrowed(&self.user_template),
        }
    }

    fn export(&self) -> ModuleExport {
        ModuleExport {
            module_state: self.module_state.clone(),
            users: self.users.clone(),
        }
    }
}

/// An immutable, versioned view of every module's state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateSnapshot {
    version: StateVersion,
    modules: BTreeMap<ModuleName, Arc<ModuleData>>,
}

impl StateSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn version(&self) -> StateVersion {
        self.version
    }

    pub fn has_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn module(&self, module: &str) -> Option<&ModuleData> {
        self.modules.get(module).map(Arc::as_ref)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn module_state(&self, module: &str) -> Option<&Value> {
        self.module(module).map(|data| &data.module_state)
    }

    /// Per-user record for `module`, materialising the template if absent.
    pub fn user_data(&self, module: &str, user: &UserId) -> Option<Cow<'_, Value>> {
        self.module(module).map(|data| data.user(user))
    }

    /// Snapshot with `module` installed. Installing is not a commit: the
    /// version is unchanged.
    pub fn with_module(
        &self,
        module: &str,
        module_state: Value,
        user_template: Value,
    ) -> Result<Self, StateError> {
        if self.has_module(module) {
            return Err(StateError::ModuleAlreadyInstalled(module.to_string()));
        }
        for (label, template) in [("module state", &module_state), ("user state", &user_template)] {
            if !template.is_object() {
                return Err(StateError::InvalidTemplate {
                    module: module.to_string(),
                    reason: format!("{label} must be a JSON object"),
                });
            }
        }

        let mut next = self.clone();
        next.modules.insert(
            module.to_string(),
            Arc::new(ModuleData::new(module_state, user_template)),
        );
        Ok(next)
    }

    /// Compute the snapshot that results from applying `deltas`, in order,
    /// to `module`. `self` is untouched; the result has `version + 1`.
    ///
    /// Either every delta applies or an error is returned.
    pub fn apply(&self, module: &str, deltas: &[Delta]) -> Result<Self, StateError> {
        let current = self
            .modules
            .get(module)
            .ok_or_else(|| StateError::UnknownModule(module.to_string()))?;

        let mut data = ModuleData::clone(current);
        for delta in deltas {
            match &delta.target {
                DeltaTarget::Module => {
                    apply_delta(&mut data.module_state, &current.module_state, delta)?;
                }
                DeltaTarget::User(user) => {
                    let record = data
                        .users
                        .entry(user.clone())
                        .or_insert_with(|| current.user_template.clone());
                    apply_delta(record, &current.user_template, delta)?;
                }
            }
        }

        let mut next = self.clone();
        next.version = self.version + 1;
        next.modules.insert(module.to_string(), Arc::new(data));
        Ok(next)
    }

    /// Full contents for a resyncing peer.
    pub fn export(&self) -> StateExport {
        StateExport {
            version: self.version,
            modules: self
                .modules
                .iter()
                .map(|(name, data)| (name.clone(), data.export()))
                .collect(),
        }
    }

    /// Replace the contents of every locally installed module with the
    /// exported state. Templates stay local; modules the export does not
    /// mention keep their local state.
    ///
    /// The result is one version past both `self` and the export, so a
    /// transaction pinned before the restore can never commit on top of it.
    pub fn restored_from(&self, export: &StateExport) -> Result<Self, StateError> {
        let mut next = self.clone();
        for (name, module) in &export.modules {
            let local = self
                .modules
                .get(name)
                .ok_or_else(|| StateError::UnknownModule(name.clone()))?;
            if !module.module_state.is_object() {
                return Err(StateError::InvalidTemplate {
                    module: name.clone(),
                    reason: "exported module state must be a JSON object".into(),
                });
            }
            next.modules.insert(
                name.clone(),
                Arc::new(ModuleData {
                    module_state: module.module_state.clone(),
                    user_template: local.user_template.clone(),
                    users: module.users.clone(),
                }),
            );
        }
        next.version = self.version.max(export.version) + 1;
        Ok(next)
    }

    /// SHA3-256 over the canonical encoding of all module and user state.
    /// The version is not part of the root.
    pub fn state_root(&self) -> Hash {
        let mut hasher = Sha3_256::new();
        for (name, data) in &self.modules {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            // Encoding a Value into a Vec cannot fail.
            hasher.update(serde_json::to_vec(&data.module_state).unwrap_or_default());
            for (user, record) in &data.users {
                hasher.update(user.as_str().as_bytes());
                hasher.update([0u8]);
                hasher.update(serde_json::to_vec(record).unwrap_or_default());
            }
            hasher.update([0xFFu8]);
        }
        hasher.finalize().into()
    }

    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root())
    }
}
