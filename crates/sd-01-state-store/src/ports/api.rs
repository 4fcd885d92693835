use crate::domain::{StateError, StateSnapshot};
use serde_json::Value;
use shared_types::{Delta, Hash, StateExport, StateVersion};
use std::sync::Arc;

/// Primary API of the State Store.
///
/// Only the Transaction Engine writes through `commit`; everything else reads
/// via pinned snapshots.
pub trait StateStoreApi: Send + Sync {
    // === Reads ===

    /// The current committed snapshot. Never changes under the caller.
    fn snapshot(&self) -> Arc<StateSnapshot>;

    fn version(&self) -> StateVersion {
        self.snapshot().version()
    }

    fn state_root(&self) -> Hash {
        self.snapshot().state_root()
    }

    // === Writes ===

    /// Install a module's initial module state and user template.
    fn install_module(
        &self,
        module: &str,
        module_state: Value,
        user_template: Value,
    ) -> Result<(), StateError>;

    /// Atomically apply `deltas` to `module`, provided the store is still at
    /// `base_version`. Returns the new version.
    fn commit(
        &self,
        base_version: StateVersion,
        module: &str,
        deltas: &[Delta],
    ) -> Result<StateVersion, StateError>;

    // === Resync ===

    fn export(&self) -> StateExport {
        self.snapshot().export()
    }

    /// Replace all module contents with a peer's export. Returns the new
    /// version, which is past every version the store has held.
    fn restore(&self, export: &StateExport) -> Result<StateVersion, StateError>;
}
