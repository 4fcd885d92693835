//! # Ledger Events

use serde::{Deserialize, Serialize};
use shared_types::{ErrorKind, PeerId, StateVersion, Transaction};
use uuid::Uuid;

/// Where a transaction entered this node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOrigin {
    /// Submitted by a local collaborator.
    Local,
    /// Replayed from a peer's broadcast.
    Peer(PeerId),
}

/// All events published on the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // EXECUTION
    // =========================================================================
    /// A ChangeContext was applied to the State Store.
    TransactionCommitted {
        tx_id: Uuid,
        transaction: Transaction,
        origin: TxOrigin,
        state_version: StateVersion,
        deltas_applied: usize,
    },

    /// A transaction ended in `Rejected`, including business-rule no-ops.
    TransactionRejected {
        tx_id: Uuid,
        module: String,
        handler: String,
        origin: TxOrigin,
        reason: ErrorKind,
    },

    // =========================================================================
    // PROPAGATION
    // =========================================================================
    /// Every retry to one peer failed.
    PeerSendFailed {
        peer: PeerId,
        tx_id: Uuid,
        attempts: u32,
    },

    // =========================================================================
    // RESYNC
    // =========================================================================
    /// Local state was replaced with a peer's export.
    StateRestored {
        from_version: StateVersion,
        to_version: StateVersion,
        source: Option<PeerId>,
    },
}

impl LedgerEvent {
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TransactionCommitted { .. } | Self::TransactionRejected { .. } => {
                EventTopic::Execution
            }
            Self::PeerSendFailed { .. } => EventTopic::Propagation,
            Self::StateRestored { .. } => EventTopic::Resync,
        }
    }

    /// Module the event concerns, if it concerns a single one.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::TransactionCommitted { transaction, .. } => Some(&transaction.module),
            Self::TransactionRejected { module, .. } => Some(module),
            Self::PeerSendFailed { .. } | Self::StateRestored { .. } => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Execution,
    Propagation,
    Resync,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Modules to include. Empty means all modules; events that concern no
    /// single module always pass.
    pub modules: Vec<String>,
}

impl EventFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            modules: Vec::new(),
        }
    }

    /// Only execution events of the given modules.
    #[must_use]
    pub fn modules(modules: Vec<String>) -> Self {
        Self {
            topics: vec![EventTopic::Execution],
            modules,
        }
    }

    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let module_match = match event.module() {
            Some(module) => self.modules.is_empty() || self.modules.iter().any(|m| m == module),
            None => true,
        };

        topic_match && module_match
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Args, UserId};

    fn committed(module: &str) -> LedgerEvent {
        LedgerEvent::TransactionCommitted {
            tx_id: Uuid::nil(),
            transaction: Transaction::new(module, "transfer", Args::new(), UserId::from("alice"), 3),
            origin: TxOrigin::Local,
            state_version: 1,
            deltas_applied: 2,
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(committed("Seed").topic(), EventTopic::Execution);
        let restored = LedgerEvent::StateRestored {
            from_version: 0,
            to_version: 4,
            source: None,
        };
        assert_eq!(restored.topic(), EventTopic::Resync);
        assert_eq!(restored.module(), None);
    }

    #[test]
    fn test_filter_all() {
        assert!(EventFilter::all().matches(&committed("Seed")));
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Propagation]);
        assert!(!filter.matches(&committed("Seed")));
        assert!(filter.matches(&LedgerEvent::PeerSendFailed {
            peer: PeerId::new("node-b"),
            tx_id: Uuid::nil(),
            attempts: 3,
        }));
    }

    #[test]
    fn test_filter_by_module() {
        let filter = EventFilter::modules(vec!["CubeRunner".into()]);
        assert!(filter.matches(&committed("CubeRunner")));
        assert!(!filter.matches(&committed("Seed")));
    }
}
