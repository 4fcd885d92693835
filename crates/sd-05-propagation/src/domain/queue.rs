//! Outbound priority queue.
//!
//! Higher cost tier first, FIFO within a tier. When full, the entry with the
//! lowest priority (lowest tier, newest within it) is dropped, which may be
//! the entry being pushed.

use shared_types::{CostTier, PeerId, Transaction};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use uuid::Uuid;

/// A transaction waiting to be broadcast.
#[derive(Clone, Debug, PartialEq)]
pub struct QueuedTx {
    pub id: Uuid,
    pub transaction: Transaction,
    /// Peer the transaction came from; never sent back to it.
    pub exclude: Option<PeerId>,
}

/// Sorts ascending by priority: the last key is popped first.
type Priority = (CostTier, Reverse<u64>);

pub struct OutboundQueue {
    entries: BTreeMap<Priority, QueuedTx>,
    next_seq: u64,
    capacity: usize,
}

impl OutboundQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            next_seq: 0,
            capacity: capacity.max(1),
        }
    }

    /// Enqueue `item`; returns whatever had to be dropped to stay in bounds.
    pub fn push(&mut self, item: QueuedTx) -> Option<QueuedTx> {
        let key = (item.transaction.cost_tier, Reverse(self.next_seq));
        self.next_seq += 1;

        if self.entries.len() < self.capacity {
            self.entries.insert(key, item);
            return None;
        }

        match self.entries.first_key_value() {
            Some((lowest, _)) if *lowest < key => {
                let dropped = self.entries.pop_first().map(|(_, tx)| tx);
                self.entries.insert(key, item);
                dropped
            }
            _ => Some(item),
        }
    }

    /// Highest-priority entry.
    pub fn pop(&mut self) -> Option<QueuedTx> {
        self.entries.pop_last().map(|(_, tx)| tx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Args, UserId};

    fn item(tier: CostTier, handler: &str) -> QueuedTx {
        QueuedTx {
            id: Uuid::new_v4(),
            transaction: Transaction::new("Seed", handler, Args::new(), UserId::from("alice"), tier),
            exclude: None,
        }
    }

    fn drain(queue: &mut OutboundQueue) -> Vec<String> {
        std::iter::from_fn(|| queue.pop())
            .map(|q| q.transaction.handler)
            .collect()
    }

    #[test]
    fn test_priority_then_fifo() {
        let mut queue = OutboundQueue::new(10);
        queue.push(item(3, "a"));
        queue.push(item(4, "b"));
        queue.push(item(3, "c"));
        queue.push(item(4, "d"));

        assert_eq!(drain(&mut queue), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_full_queue_drops_lowest() {
        let mut queue = OutboundQueue::new(2);
        assert!(queue.push(item(3, "a")).is_none());
        assert!(queue.push(item(3, "b")).is_none());

        // Higher tier displaces the newest low-tier entry.
        let dropped = queue.push(item(4, "c")).unwrap();
        assert_eq!(dropped.transaction.handler, "b");

        // Equal-or-lower tier than everything queued is itself dropped.
        let dropped = queue.push(item(3, "d")).unwrap();
        assert_eq!(dropped.transaction.handler, "d");

        assert_eq!(drain(&mut queue), vec!["c", "a"]);
    }
}
