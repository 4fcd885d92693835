//! Domain operations for propagation.

use shared_types::{CostTier, PeerId};
use std::time::Duration;

use super::PropagationConfig;

/// Peers to send to: every known peer except `exclude`, in id order, at
/// most `fanout` of them.
pub fn select_peers(peers: &[PeerId], fanout: usize, exclude: Option<&PeerId>) -> Vec<PeerId> {
    let mut selected: Vec<PeerId> = peers
        .iter()
        .filter(|peer| Some(*peer) != exclude)
        .cloned()
        .collect();
    selected.sort();
    selected.dedup();
    selected.truncate(fanout);
    selected
}

/// Whether a transaction of `cost_tier` is relayed at all.
pub fn should_relay(cost_tier: CostTier, config: &PropagationConfig) -> bool {
    cost_tier >= config.min_cost_tier
}

/// Delay before retry number `attempt` (1-based).
pub fn retry_delay(attempt: u32, config: &PropagationConfig) -> Duration {
    Duration::from_millis(config.retry_backoff_ms.saturating_mul(u64::from(attempt)))
}
