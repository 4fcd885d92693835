//! # Driving Ports (API - Inbound)

use async_trait::async_trait;
use sd_01_state_store::StateSnapshot;
use serde_json::Value;
use shared_bus::TxOrigin;
use shared_types::{Args, Hash, PeerId, StateExport, StateVersion, Transaction, TxReceipt};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::EngineError;

/// Primary API of the Transaction Engine.
#[async_trait]
pub trait TransactionEngineApi: Send + Sync {
    /// Run one transaction through the pipeline. Never fails: rejections are
    /// reported in the receipt.
    async fn submit(&self, tx_id: Uuid, transaction: Transaction, origin: TxOrigin) -> TxReceipt;

    /// Read-only getter query against the current snapshot.
    fn query(&self, module: &str, getter: &str, args: &Args) -> Result<Value, EngineError> {
        self.query_at(self.snapshot(), module, getter, args)
    }

    /// The current committed snapshot. Pin it to make several reads agree.
    fn snapshot(&self) -> Arc<StateSnapshot>;

    /// Getter query against a snapshot the caller pinned.
    fn query_at(
        &self,
        snapshot: Arc<StateSnapshot>,
        module: &str,
        getter: &str,
        args: &Args,
    ) -> Result<Value, EngineError>;

    fn state_version(&self) -> StateVersion;

    fn state_root(&self) -> Hash;

    fn export_state(&self) -> StateExport;

    /// Replace local state with a peer's export. Returns the new local
    /// version, which is past both the previous one and the export's.
    async fn restore_state(
        &self,
        export: &StateExport,
        source: Option<PeerId>,
    ) -> Result<StateVersion, EngineError>;
}
