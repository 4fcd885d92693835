//! # Engine Sink Adapter
//!
//! Lets the propagation layer replay peer transactions and serve or apply
//! resyncs through the local Transaction Engine.

use async_trait::async_trait;
use sd_01_state_store::StateStoreApi;
use sd_04_transaction_engine::{TransactionEngine, TransactionEngineApi};
use sd_05_propagation::{PropagationError, TransactionSink};
use shared_bus::TxOrigin;
use shared_types::{PeerId, StateExport, StateVersion, Transaction, TxReceipt};
use std::sync::Arc;
use uuid::Uuid;

pub struct EngineSink<S: StateStoreApi> {
    engine: Arc<TransactionEngine<S>>,
}

impl<S: StateStoreApi> EngineSink<S> {
    pub fn new(engine: Arc<TransactionEngine<S>>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<S: StateStoreApi + 'static> TransactionSink for EngineSink<S> {
    async fn submit_remote(
        &self,
        tx_id: Uuid,
        transaction: Transaction,
        source: PeerId,
    ) -> TxReceipt {
        self.engine
            .submit(tx_id, transaction, TxOrigin::Peer(source))
            .await
    }

    async fn export_state(&self) -> StateExport {
        self.engine.export_state()
    }

    async fn restore_state(
        &self,
        export: &StateExport,
        source: PeerId,
    ) -> Result<StateVersion, PropagationError> {
        self.engine
            .restore_state(export, Some(source))
            .await
            .map_err(|e| PropagationError::Resync(e.to_string()))
    }
}
