//! # Seed Telemetry
//!
//! Structured logging and Prometheus metrics for Seed nodes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use seed_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SEED_SERVICE_NAME` | `seed-node` | Service name in logs |
//! | `SEED_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `SEED_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `SEED_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    register_metrics, HistogramTimer, MetricsHandle, PROPAGATION_FAILURES,
    PROPAGATION_QUEUE_DEPTH, PROPAGATION_SENT, STATE_RESTORES, STATE_VERSION, SUBMIT_DURATION,
    TRANSACTIONS_COMMITTED, TRANSACTIONS_NO_OP, TRANSACTIONS_REJECTED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics and install the global tracing subscriber.
///
/// Can succeed once per process; a second call returns
/// `TelemetryError::TracerInit`.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    tracing_setup::init_tracing(config)?;
    Ok(TelemetryGuard { metrics })
}

/// Keeps telemetry alive for the lifetime of the process.
pub struct TelemetryGuard {
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}
