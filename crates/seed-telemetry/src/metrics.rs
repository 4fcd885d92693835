//! Prometheus metrics for Seed nodes.
//!
//! Naming convention: `seed_<component>_<metric>_<unit>`.

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Crate-local registry; `register_metrics` fills it.
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // TRANSACTION ENGINE
    // =========================================================================

    /// Committed transactions by module
    pub static ref TRANSACTIONS_COMMITTED: IntCounterVec = IntCounterVec::new(
        Opts::new("seed_engine_transactions_committed_total", "Transactions whose ChangeContext was applied"),
        &["module"]
    ).expect("metric creation failed");

    /// Rejected transactions by module and reason, no-ops excluded
    pub static ref TRANSACTIONS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("seed_engine_transactions_rejected_total", "Transactions rejected by the engine"),
        &["module", "reason"]
    ).expect("metric creation failed");

    /// Business-rule no-ops (empty ChangeContext) by module
    pub static ref TRANSACTIONS_NO_OP: IntCounterVec = IntCounterVec::new(
        Opts::new("seed_engine_transactions_no_op_total", "Handlers that returned an empty ChangeContext"),
        &["module"]
    ).expect("metric creation failed");

    /// Submit latency, execution through commit
    pub static ref SUBMIT_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "seed_engine_submit_duration_seconds",
            "Time from submission to commit or rejection"
        ).buckets(exponential_buckets(0.00001, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // STATE STORE
    // =========================================================================

    /// Last committed state version
    pub static ref STATE_VERSION: IntGauge = IntGauge::new(
        "seed_state_version",
        "Version of the last committed State Store snapshot"
    ).expect("metric creation failed");

    /// Resyncs applied from a peer's export
    pub static ref STATE_RESTORES: IntCounterVec = IntCounterVec::new(
        Opts::new("seed_state_restores_total", "State replaced from a peer export"),
        &["source"]
    ).expect("metric creation failed");

    // =========================================================================
    // PROPAGATION
    // =========================================================================

    /// Messages delivered to peers
    pub static ref PROPAGATION_SENT: IntGauge = IntGauge::new(
        "seed_propagation_messages_sent",
        "Peer messages delivered since boot"
    ).expect("metric creation failed");

    /// Peers given up on after all retries
    pub static ref PROPAGATION_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("seed_propagation_send_failures_total", "Sends abandoned after every retry failed"),
        &["peer"]
    ).expect("metric creation failed");

    /// Transactions waiting in the outbound queue
    pub static ref PROPAGATION_QUEUE_DEPTH: IntGauge = IntGauge::new(
        "seed_propagation_queue_depth",
        "Transactions waiting to be broadcast"
    ).expect("metric creation failed");
}

/// Handle over the registry, for exposition.
#[derive(Clone, Debug)]
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    /// Render every registered metric in the Prometheus text format.
    pub fn gather(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

/// Register all metrics with the crate registry. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Engine
        Box::new(TRANSACTIONS_COMMITTED.clone()),
        Box::new(TRANSACTIONS_REJECTED.clone()),
        Box::new(TRANSACTIONS_NO_OP.clone()),
        Box::new(SUBMIT_DURATION.clone()),
        // State
        Box::new(STATE_VERSION.clone()),
        Box::new(STATE_RESTORES.clone()),
        // Propagation
        Box::new(PROPAGATION_SENT.clone()),
        Box::new(PROPAGATION_FAILURES.clone()),
        Box::new(PROPAGATION_QUEUE_DEPTH.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
