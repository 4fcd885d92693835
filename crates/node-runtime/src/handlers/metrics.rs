//! # Metrics Handler
//!
//! Turns ledger events into Prometheus samples. The kernel crates only
//! publish events; this is the one place that touches the registry.

use sd_05_propagation::PropagationMetrics;
use seed_telemetry::{
    PROPAGATION_FAILURES, PROPAGATION_QUEUE_DEPTH, PROPAGATION_SENT, STATE_RESTORES,
    STATE_VERSION, TRANSACTIONS_COMMITTED, TRANSACTIONS_NO_OP, TRANSACTIONS_REJECTED,
};
use shared_bus::{LedgerEvent, Subscription};
use shared_types::{ErrorKind, StateVersion};
use tracing::{debug, info};

/// Consumes every event on its subscription until the bus closes.
pub struct MetricsHandler {
    subscription: Subscription,
}

impl MetricsHandler {
    pub fn new(subscription: Subscription) -> Self {
        Self { subscription }
    }

    pub async fn run(mut self) {
        info!("[node] Metrics handler started");
        while let Some(event) = self.subscription.recv().await {
            record_event(&event);
        }
        info!("[node] Event bus closed, metrics handler exiting");
    }
}

/// Record one event.
pub fn record_event(event: &LedgerEvent) {
    match event {
        LedgerEvent::TransactionCommitted {
            transaction,
            state_version,
            ..
        } => {
            TRANSACTIONS_COMMITTED
                .with_label_values(&[&transaction.module])
                .inc();
            set_state_version(*state_version);
        }
        LedgerEvent::TransactionRejected {
            module, reason, ..
        } => {
            if *reason == ErrorKind::NoOp {
                TRANSACTIONS_NO_OP.with_label_values(&[module]).inc();
            } else {
                TRANSACTIONS_REJECTED
                    .with_label_values(&[module, &format!("{reason:?}")])
                    .inc();
            }
        }
        LedgerEvent::PeerSendFailed { peer, .. } => {
            PROPAGATION_FAILURES
                .with_label_values(&[peer.as_str()])
                .inc();
        }
        LedgerEvent::StateRestored {
            to_version, source, ..
        } => {
            let source = if source.is_some() { "peer" } else { "local" };
            STATE_RESTORES.with_label_values(&[source]).inc();
            set_state_version(*to_version);
        }
    }
}

/// Mirror the propagation layer's counters into gauges.
pub fn record_propagation(metrics: &PropagationMetrics) {
    PROPAGATION_SENT.set(saturating_i64(metrics.sent));
    PROPAGATION_QUEUE_DEPTH.set(saturating_i64(metrics.queue_depth as u64));
}

fn set_state_version(version: StateVersion) {
    STATE_VERSION.set(saturating_i64(version));
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or_else(|_| {
        debug!(value, "Metric value exceeds i64, clamping");
        i64::MAX
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::TxOrigin;
    use shared_types::{PeerId, Transaction, UserId};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    #[test]
    fn test_committed_and_rejected_counters() {
        let module = "MetricsTestModule";
        let committed_before = TRANSACTIONS_COMMITTED.with_label_values(&[module]).get();
        let no_op_before = TRANSACTIONS_NO_OP.with_label_values(&[module]).get();

        record_event(&LedgerEvent::TransactionCommitted {
            tx_id: Uuid::new_v4(),
            transaction: Transaction::new(module, "h", BTreeMap::new(), UserId::from("a"), 0),
            origin: TxOrigin::Local,
            state_version: 7,
            deltas_applied: 1,
        });
        record_event(&LedgerEvent::TransactionRejected {
            tx_id: Uuid::new_v4(),
            module: module.into(),
            handler: "h".into(),
            origin: TxOrigin::Local,
            reason: ErrorKind::NoOp,
        });

        assert_eq!(
            TRANSACTIONS_COMMITTED.with_label_values(&[module]).get(),
            committed_before + 1
        );
        assert_eq!(
            TRANSACTIONS_NO_OP.with_label_values(&[module]).get(),
            no_op_before + 1
        );
    }

    #[test]
    fn test_send_failure_counter() {
        let peer = PeerId::new("metrics-test-peer");
        let before = PROPAGATION_FAILURES.with_label_values(&[peer.as_str()]).get();
        record_event(&LedgerEvent::PeerSendFailed {
            peer: peer.clone(),
            tx_id: Uuid::new_v4(),
            attempts: 3,
        });
        assert_eq!(
            PROPAGATION_FAILURES.with_label_values(&[peer.as_str()]).get(),
            before + 1
        );
    }

    #[test]
    fn test_saturating_conversion() {
        assert_eq!(saturating_i64(42), 42);
        assert_eq!(saturating_i64(u64::MAX), i64::MAX);
    }
}
