//! Outbound ports (SPI) for propagation.

use async_trait::async_trait;
use shared_types::{PeerId, StateExport, StateVersion, Transaction, TxReceipt};
use uuid::Uuid;

use crate::domain::PropagationError;

/// Transport to the other nodes. Payloads are already-encoded peer messages.
#[async_trait]
pub trait PeerNetwork: Send + Sync {
    /// Peers currently reachable.
    fn peers(&self) -> Vec<PeerId>;

    /// Deliver one encoded message to `peer`.
    async fn send(&self, peer: &PeerId, payload: Vec<u8>) -> Result<(), PropagationError>;
}

/// The local transaction engine, as seen from propagation.
#[async_trait]
pub trait TransactionSink: Send + Sync {
    /// Replay a transaction received from `source`.
    async fn submit_remote(&self, tx_id: Uuid, transaction: Transaction, source: PeerId)
        -> TxReceipt;

    /// Full local state, for a resyncing peer.
    async fn export_state(&self) -> StateExport;

    /// Replace local state with a peer's export.
    async fn restore_state(
        &self,
        export: &StateExport,
        source: PeerId,
    ) -> Result<StateVersion, PropagationError>;
}
