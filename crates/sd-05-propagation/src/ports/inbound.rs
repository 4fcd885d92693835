//! Inbound ports (API) for propagation.

use async_trait::async_trait;
use shared_types::{PeerId, StateVersion, Transaction, TxReceipt};
use uuid::Uuid;

use crate::domain::{PropagationError, PropagationMetrics};

/// What handling one inbound message led to.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundOutcome {
    /// Transaction replayed through the local engine.
    Replayed(TxReceipt),
    /// Transaction id already seen; dropped.
    Duplicate,
    /// Full state sent back to the requester.
    ResyncServed,
    /// Local state replaced; the new version.
    ResyncApplied(StateVersion),
}

#[async_trait]
pub trait PropagationApi: Send + Sync {
    /// Queue a locally committed transaction for broadcast. Never blocks on
    /// the network.
    fn propagate(&self, tx_id: Uuid, transaction: Transaction) -> Result<(), PropagationError>;

    /// Handle one encoded message from `from`.
    async fn handle_message(
        &self,
        from: PeerId,
        payload: &[u8],
    ) -> Result<InboundOutcome, PropagationError>;

    /// Ask `peer` for its full state. Returns the request id.
    async fn request_resync(&self, peer: &PeerId) -> Result<Uuid, PropagationError>;

    fn metrics(&self) -> PropagationMetrics;
}
