use shared_types::{CostTier, PeerId, WireError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PropagationError {
    #[error("Transaction already seen: {0}")]
    Duplicate(Uuid),

    #[error("Cost tier {cost_tier} below relay minimum {min}")]
    Throttled { cost_tier: CostTier, min: CostTier },

    #[error("Peer unreachable: {0}")]
    PeerUnreachable(PeerId),

    #[error("Send to {peer} failed: {reason}")]
    SendFailed { peer: PeerId, reason: String },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("Resync response {0} does not answer a pending request")]
    UnsolicitedResync(Uuid),

    #[error("Resync failed: {0}")]
    Resync(String),
}
