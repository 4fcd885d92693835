//! Configuration, the seen-transaction cache and metrics.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use shared_types::{CostTier, PeerId};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use uuid::Uuid;

/// Propagation configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationConfig {
    /// Maximum peers a transaction is sent to.
    pub fanout: usize,
    /// Retries per peer after the first failed send.
    pub max_send_retries: u32,
    /// Linear backoff step between retries, in ms.
    pub retry_backoff_ms: u64,
    /// Outbound queue bound; the lowest-priority entry is dropped beyond it.
    pub queue_capacity: usize,
    /// Transactions below this cost tier commit locally but are not relayed.
    pub min_cost_tier: CostTier,
    /// Seen-transaction cache size.
    pub seen_cache_size: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            fanout: 8,
            max_send_retries: 3,
            retry_backoff_ms: 100,
            queue_capacity: 10_000,
            min_cost_tier: 0,
            seen_cache_size: 10_000,
        }
    }
}

/// Where a seen transaction came from.
#[derive(Clone, Debug)]
pub struct SeenTxInfo {
    pub first_seen: Instant,
    /// `None` for locally submitted transactions.
    pub first_peer: Option<PeerId>,
}

/// Bounded set of transaction ids already executed or broadcast here.
/// Oldest entries are evicted first.
pub struct SeenTxCache {
    cache: RwLock<HashMap<Uuid, SeenTxInfo>>,
    insertion_order: RwLock<VecDeque<Uuid>>,
    max_size: usize,
}

impl SeenTxCache {
    pub fn new(max_size: usize) -> Self {
        Self {
            cache: RwLock::new(HashMap::with_capacity(max_size)),
            insertion_order: RwLock::new(VecDeque::with_capacity(max_size)),
            max_size,
        }
    }

    pub fn has_seen(&self, id: &Uuid) -> bool {
        self.cache.read().contains_key(id)
    }

    /// Returns false if `id` was already present.
    pub fn mark_seen(&self, id: Uuid, peer: Option<PeerId>) -> bool {
        let mut cache = self.cache.write();
        let mut order = self.insertion_order.write();

        if cache.contains_key(&id) {
            return false;
        }
        if self.max_size > 0 && cache.len() >= self.max_size {
            if let Some(oldest) = order.pop_front() {
                cache.remove(&oldest);
            }
        }
        cache.insert(
            id,
            SeenTxInfo {
                first_seen: Instant::now(),
                first_peer: peer,
            },
        );
        order.push_back(id);
        true
    }

    pub fn first_peer(&self, id: &Uuid) -> Option<PeerId> {
        self.cache.read().get(id).and_then(|info| info.first_peer.clone())
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

/// Counters since boot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropagationMetrics {
    pub queued: u64,
    pub throttled: u64,
    pub dropped: u64,
    pub sent: u64,
    pub send_failures: u64,
    pub duplicates: u64,
    pub replayed: u64,
    pub resyncs_served: u64,
    pub resyncs_applied: u64,
    /// Transactions waiting in the outbound queue when the snapshot was taken.
    pub queue_depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = PropagationConfig::default();
        assert_eq!(config.fanout, 8);
        assert_eq!(config.min_cost_tier, 0);
    }

    #[test]
    fn test_seen_cache() {
        let cache = SeenTxCache::new(100);
        let id = Uuid::new_v4();
        let peer = PeerId::new("node-b");

        assert!(!cache.has_seen(&id));
        assert!(cache.mark_seen(id, Some(peer.clone())));
        assert!(!cache.mark_seen(id, None));
        assert_eq!(cache.first_peer(&id), Some(peer));
    }

    #[test]
    fn test_seen_cache_eviction() {
        let cache = SeenTxCache::new(3);
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        for id in &ids {
            cache.mark_seen(*id, None);
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.has_seen(&ids[0]));
        assert!(cache.has_seen(&ids[3]));
    }
}
