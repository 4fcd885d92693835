//! # Type-State Transaction Pipeline
//!
//! Each stage is a distinct type and every transition consumes `self`, so a
//! ChangeContext cannot reach the State Store without passing validation:
//!
//! ```text
//! [Received] ──build──→ [Built] ──execute──→ [Executed] ──validate──→ [Validated] ──commit──→ Committed
//!      │                   │                     │                        │
//!      └───────────────────┴─────────────────────┴────────────────────────┴──────────→ Rejected
//!      ↑                                                                  │
//!      └─────────────────────────── version conflict ─────────────────────┘
//! ```

use sd_01_state_store::{StateError, StateSnapshot, StateStoreApi};
use sd_02_execution_context::{ChangeContext, Container};
use sd_03_module_registry::{Handler, ModuleRegistry};
use shared_types::{Delta, StateVersion, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use super::{check_all_invariants, EngineError, InvariantCheckResult};

// =============================================================================
// STAGES
// =============================================================================

/// Submitted, not yet routed.
#[derive(Debug, Clone, Copy)]
pub struct Received;

/// Routed; Container pinned to a snapshot.
pub struct Built {
    container: Container,
    handler: Arc<dyn Handler>,
}

/// Handler ran; deltas not yet checked.
#[derive(Debug)]
pub struct Executed {
    snapshot: Arc<StateSnapshot>,
    deltas: Vec<Delta>,
}

/// Deltas checked against the snapshot they were computed from.
#[derive(Debug)]
pub struct Validated {
    base_version: StateVersion,
    deltas: Vec<Delta>,
}

/// A transaction at stage `S`.
pub struct PendingTx<S> {
    tx_id: Uuid,
    transaction: Transaction,
    stage: S,
}

impl<S> PendingTx<S> {
    pub fn tx_id(&self) -> Uuid {
        self.tx_id
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub(crate) fn reject(self, error: EngineError) -> RejectedTx {
        RejectedTx {
            tx_id: self.tx_id,
            transaction: self.transaction,
            error,
        }
    }

    fn advance<T>(self, stage: T) -> PendingTx<T> {
        PendingTx {
            tx_id: self.tx_id,
            transaction: self.transaction,
            stage,
        }
    }
}

// =============================================================================
// TERMINAL OUTCOMES
// =============================================================================

/// Applied to the State Store. Final.
#[derive(Debug, Clone)]
pub struct CommittedTx {
    pub tx_id: Uuid,
    pub transaction: Transaction,
    pub state_version: StateVersion,
    pub deltas: Vec<Delta>,
}

/// Discarded; the State Store was not touched.
#[derive(Debug, Clone)]
pub struct RejectedTx {
    pub tx_id: Uuid,
    pub transaction: Transaction,
    pub error: EngineError,
}

/// Result of one commit attempt.
pub enum CommitAttempt {
    Committed(CommittedTx),
    /// The store moved past the pinned snapshot; re-run from `Received`.
    Conflict(PendingTx<Received>),
    Rejected(RejectedTx),
}

// =============================================================================
// TRANSITIONS
// =============================================================================

impl PendingTx<Received> {
    pub fn new(tx_id: Uuid, transaction: Transaction) -> Self {
        Self {
            tx_id,
            transaction,
            stage: Received,
        }
    }

    /// Resolve the handler and pin the Container to `snapshot`.
    pub fn build(
        self,
        registry: &ModuleRegistry,
        snapshot: Arc<StateSnapshot>,
    ) -> Result<PendingTx<Built>, RejectedTx> {
        let handler =
            match registry.resolve_handler(&self.transaction.module, &self.transaction.handler) {
                Ok(handler) => handler,
                Err(e) => return Err(self.reject(e.into())),
            };
        let container = Container::new(snapshot, &self.transaction);
        Ok(self.advance(Built { container, handler }))
    }
}

impl PendingTx<Built> {
    /// Run the handler with a fresh ChangeContext. An empty result is the
    /// handler declining the transaction.
    pub fn execute(self) -> Result<PendingTx<Executed>, RejectedTx> {
        let ctx = self
            .stage
            .handler
            .call(&self.stage.container, ChangeContext::new());

        if ctx.is_empty() {
            let error = EngineError::NoOp {
                module: self.transaction.module.clone(),
                handler: self.transaction.handler.clone(),
            };
            return Err(self.reject(error));
        }

        let snapshot = self.stage.container.snapshot();
        Ok(self.advance(Executed {
            snapshot,
            deltas: ctx.into_deltas(),
        }))
    }
}

impl PendingTx<Executed> {
    pub fn deltas(&self) -> &[Delta] {
        &self.stage.deltas
    }

    pub fn validate(self) -> Result<PendingTx<Validated>, RejectedTx> {
        let checked = check_all_invariants(
            &self.stage.snapshot,
            &self.transaction.module,
            &self.stage.deltas,
        );
        match checked {
            InvariantCheckResult::Valid => {
                let PendingTx {
                    tx_id,
                    transaction,
                    stage,
                } = self;
                Ok(PendingTx {
                    tx_id,
                    transaction,
                    stage: Validated {
                        base_version: stage.snapshot.version(),
                        deltas: stage.deltas,
                    },
                })
            }
            InvariantCheckResult::Invalid(violations) => {
                Err(self.reject(EngineError::Invariants(violations)))
            }
        }
    }
}

impl PendingTx<Validated> {
    pub fn base_version(&self) -> StateVersion {
        self.stage.base_version
    }

    /// Apply the deltas as one unit, provided nothing committed since the
    /// Container was built.
    pub fn commit<St>(self, store: &St) -> CommitAttempt
    where
        St: StateStoreApi + ?Sized,
    {
        let result = store.commit(
            self.stage.base_version,
            &self.transaction.module,
            &self.stage.deltas,
        );
        match result {
            Ok(state_version) => CommitAttempt::Committed(CommittedTx {
                tx_id: self.tx_id,
                transaction: self.transaction,
                state_version,
                deltas: self.stage.deltas,
            }),
            Err(StateError::VersionConflict { .. }) => {
                CommitAttempt::Conflict(self.advance(Received))
            }
            Err(e) => CommitAttempt::Rejected(self.reject(e.into())),
        }
    }
}
