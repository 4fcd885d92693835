use crate::domain::{StateError, StateSnapshot};
use crate::ports::StateStoreApi;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use shared_types::{Delta, StateExport, StateVersion};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// In-memory State Store.
///
/// Readers clone the current `Arc<StateSnapshot>` under a short read lock.
/// Writers serialise on `write_lock`, build the next snapshot without holding
/// the read/write lock, then swap it in.
pub struct InMemoryStateStore {
    current: RwLock<Arc<StateSnapshot>>,
    write_lock: Mutex<()>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::from_snapshot(StateSnapshot::empty())
    }

    pub fn from_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
            write_lock: Mutex::new(()),
        }
    }

    fn swap(&self, next: StateSnapshot) -> StateVersion {
        let version = next.version();
        *self.current.write() = Arc::new(next);
        version
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStoreApi for InMemoryStateStore {
    fn snapshot(&self) -> Arc<StateSnapshot> {
        self.current.read().clone()
    }

    fn install_module(
        &self,
        module: &str,
        module_state: Value,
        user_template: Value,
    ) -> Result<(), StateError> {
        let _guard = self.write_lock.lock();
        let next = self
            .snapshot()
            .with_module(module, module_state, user_template)?;
        self.swap(next);
        info!(module, "[sd-01] Module state installed");
        Ok(())
    }

    fn commit(
        &self,
        base_version: StateVersion,
        module: &str,
        deltas: &[Delta],
    ) -> Result<StateVersion, StateError> {
        let _guard = self.write_lock.lock();
        let current = self.snapshot();
        if current.version() != base_version {
            debug!(
                module,
                expected = base_version,
                actual = current.version(),
                "[sd-01] Commit rejected: version moved"
            );
            return Err(StateError::VersionConflict {
                expected: base_version,
                actual: current.version(),
            });
        }

        let next = current.apply(module, deltas)?;
        let version = self.swap(next);
        debug!(module, version, deltas = deltas.len(), "[sd-01] Committed");
        Ok(version)
    }

    fn restore(&self, export: &StateExport) -> Result<StateVersion, StateError> {
        let _guard = self.write_lock.lock();
        let current = self.snapshot();
        let next = current.restored_from(export).map_err(|e| {
            warn!(error = %e, "[sd-01] Rejected state export");
            e
        })?;
        let from = current.version();
        let to = self.swap(next);
        info!(from, to, export_version = export.version, "[sd-01] State restored from export");
        Ok(to)
    }
}
