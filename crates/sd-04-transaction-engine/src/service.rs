//! # Transaction Engine Service
//!
//! Wires the registry, the State Store and the event bus around the
//! type-state pipeline.

use async_trait::async_trait;
use parking_lot::Mutex;
use sd_01_state_store::{ModuleView, StateError, StateSnapshot, StateStoreApi};
use sd_03_module_registry::ModuleRegistry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_bus::{EventPublisher, LedgerEvent, TxOrigin};
use shared_types::{
    Args, Delta, ErrorKind, Hash, PeerId, StateExport, StateVersion, Transaction, TxReceipt,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    check_all_invariants, CommitAttempt, CommittedTx, EngineConfig, EngineError,
    InvariantCheckResult, PendingTx, RejectedTx,
};
use crate::ports::TransactionEngineApi;

/// Counters since boot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub committed: u64,
    pub rejected: u64,
    pub no_ops: u64,
    /// Optimistic executions discarded because another commit landed first.
    pub conflicts: u64,
    /// Executions performed while holding the commit lock.
    pub serialized_fallbacks: u64,
}

#[derive(Default)]
struct EngineCounters {
    committed: AtomicU64,
    rejected: AtomicU64,
    no_ops: AtomicU64,
    conflicts: AtomicU64,
    serialized_fallbacks: AtomicU64,
}

/// The Transaction Engine.
///
/// Generic over the State Store so tests and alternative backends can plug
/// in. Shared across tasks via `Arc`.
pub struct TransactionEngine<S: StateStoreApi> {
    config: EngineConfig,
    registry: Arc<ModuleRegistry>,
    store: Arc<S>,
    /// Held for every write to `store` made through the engine.
    commit_lock: Mutex<()>,
    publisher: Option<Arc<dyn EventPublisher>>,
    counters: EngineCounters,
}

impl<S: StateStoreApi> TransactionEngine<S> {
    pub fn new(config: EngineConfig, registry: Arc<ModuleRegistry>, store: Arc<S>) -> Self {
        Self {
            config,
            registry,
            store,
            commit_lock: Mutex::new(()),
            publisher: None,
            counters: EngineCounters::default(),
        }
    }

    /// Publish `LedgerEvent`s for every outcome on `publisher`.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            committed: self.counters.committed.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            no_ops: self.counters.no_ops.load(Ordering::Relaxed),
            conflicts: self.counters.conflicts.load(Ordering::Relaxed),
            serialized_fallbacks: self.counters.serialized_fallbacks.load(Ordering::Relaxed),
        }
    }

    /// Install the initial state of every registered module that the store
    /// does not hold yet. Returns how many were installed.
    pub fn install_modules(&self) -> Result<usize, EngineError> {
        let _guard = self.commit_lock.lock();
        let snapshot = self.store.snapshot();
        let mut installed = 0;
        for module in self.registry.modules() {
            if snapshot.has_module(&module.name) {
                continue;
            }
            self.store.install_module(
                &module.name,
                module.initial_module_state.clone(),
                module.initial_user_state.clone(),
            )?;
            installed += 1;
        }
        info!(installed, "[sd-04] Module state installed");
        Ok(installed)
    }

    /// Commit deltas that no handler produced, e.g. genesis allocations.
    /// They pass the same invariants as handler output.
    pub fn apply_genesis(&self, module: &str, deltas: &[Delta]) -> Result<StateVersion, EngineError> {
        let _guard = self.commit_lock.lock();
        let snapshot = self.store.snapshot();
        if let InvariantCheckResult::Invalid(violations) =
            check_all_invariants(&snapshot, module, deltas)
        {
            return Err(EngineError::Invariants(violations));
        }
        let version = self.store.commit(snapshot.version(), module, deltas)?;
        info!(module, deltas = deltas.len(), version, "[sd-04] Genesis deltas applied");
        Ok(version)
    }

    /// Run `transaction` to a terminal outcome.
    ///
    /// Optimistic attempts execute without the commit lock; a rejection is
    /// only final if the snapshot it was computed against is still current.
    pub fn execute(&self, tx_id: Uuid, transaction: Transaction) -> Result<CommittedTx, RejectedTx> {
        let mut pending = PendingTx::new(tx_id, transaction);

        for attempt in 0..self.config.max_commit_retries {
            let snapshot = self.store.snapshot();
            let pinned = snapshot.version();
            let outcome = pending
                .build(&self.registry, snapshot)
                .and_then(|built| built.execute())
                .and_then(|executed| executed.validate());

            let _guard = self.commit_lock.lock();
            match outcome {
                Ok(validated) => match validated.commit(self.store.as_ref()) {
                    CommitAttempt::Committed(done) => return Ok(done),
                    CommitAttempt::Rejected(rejected) => return Err(rejected),
                    CommitAttempt::Conflict(retry) => pending = retry,
                },
                Err(rejected)
                    if rejected.error.kind().is_routing_error()
                        || self.store.version() == pinned =>
                {
                    return Err(rejected)
                }
                Err(rejected) => pending = PendingTx::new(rejected.tx_id, rejected.transaction),
            }

            self.counters.conflicts.fetch_add(1, Ordering::Relaxed);
            debug!(%tx_id, attempt, pinned, "[sd-04] Snapshot went stale, re-executing");
        }

        // Out of optimistic attempts: nothing can commit while we hold the lock.
        let _guard = self.commit_lock.lock();
        self.counters
            .serialized_fallbacks
            .fetch_add(1, Ordering::Relaxed);
        let validated = pending
            .build(&self.registry, self.store.snapshot())
            .and_then(|built| built.execute())
            .and_then(|executed| executed.validate())?;
        let base_version = validated.base_version();
        match validated.commit(self.store.as_ref()) {
            CommitAttempt::Committed(done) => Ok(done),
            CommitAttempt::Rejected(rejected) => Err(rejected),
            CommitAttempt::Conflict(stale) => {
                warn!(%tx_id, base_version, "[sd-04] Store written outside the engine");
                let actual = self.store.version();
                Err(stale.reject(EngineError::State(StateError::VersionConflict {
                    expected: base_version,
                    actual,
                })))
            }
        }
    }

    async fn publish(&self, event: LedgerEvent) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(event).await;
        }
    }
}

#[async_trait]
impl<S: StateStoreApi + 'static> TransactionEngineApi for TransactionEngine<S> {
    #[instrument(
        skip(self, transaction),
        fields(module = %transaction.module, handler = %transaction.handler, sender = %transaction.sender, cost_tier = transaction.cost_tier)
    )]
    async fn submit(&self, tx_id: Uuid, transaction: Transaction, origin: TxOrigin) -> TxReceipt {
        match self.execute(tx_id, transaction) {
            Ok(done) => {
                self.counters.committed.fetch_add(1, Ordering::Relaxed);
                info!(
                    %tx_id,
                    state_version = done.state_version,
                    deltas = done.deltas.len(),
                    "[sd-04] Transaction committed"
                );
                let receipt = TxReceipt::committed(tx_id, done.state_version, done.deltas.len());
                self.publish(LedgerEvent::TransactionCommitted {
                    tx_id,
                    transaction: done.transaction,
                    origin,
                    state_version: done.state_version,
                    deltas_applied: done.deltas.len(),
                })
                .await;
                receipt
            }
            Err(rejected) => {
                let reason = rejected.error.kind();
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                if reason == ErrorKind::NoOp {
                    self.counters.no_ops.fetch_add(1, Ordering::Relaxed);
                    debug!(%tx_id, "[sd-04] Handler declined, nothing applied");
                } else {
                    warn!(%tx_id, ?reason, error = %rejected.error, "[sd-04] Transaction rejected");
                }
                self.publish(LedgerEvent::TransactionRejected {
                    tx_id,
                    module: rejected.transaction.module,
                    handler: rejected.transaction.handler,
                    origin,
                    reason,
                })
                .await;
                TxReceipt::rejected(tx_id, reason, self.store.version())
            }
        }
    }

    fn snapshot(&self) -> Arc<StateSnapshot> {
        self.store.snapshot()
    }

    fn query_at(
        &self,
        snapshot: Arc<StateSnapshot>,
        module: &str,
        getter: &str,
        args: &Args,
    ) -> Result<Value, EngineError> {
        let getter_fn = self.registry.resolve_getter(module, getter)?;
        let view = ModuleView::new(snapshot, module)?;
        Ok(getter_fn.query(&view, args)?)
    }

    fn state_version(&self) -> StateVersion {
        self.store.version()
    }

    fn state_root(&self) -> Hash {
        self.store.state_root()
    }

    fn export_state(&self) -> StateExport {
        self.store.export()
    }

    async fn restore_state(
        &self,
        export: &StateExport,
        source: Option<PeerId>,
    ) -> Result<StateVersion, EngineError> {
        let (from_version, to_version) = {
            let _guard = self.commit_lock.lock();
            let from_version = self.store.version();
            (from_version, self.store.restore(export)?)
        };
        info!(
            from_version,
            to_version,
            export_version = export.version,
            source = ?source,
            "[sd-04] State restored"
        );
        self.publish(LedgerEvent::StateRestored {
            from_version,
            to_version,
            source,
        })
        .await;
        Ok(to_version)
    }
}
