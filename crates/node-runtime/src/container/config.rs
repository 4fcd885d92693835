//! # Node Configuration
//!
//! Unified configuration for all components and runtime parameters. Every
//! field has a default and can be overridden from a `SEED_*` environment
//! variable.

use sd_04_transaction_engine::EngineConfig;
use sd_05_propagation::PropagationConfig;
use seed_telemetry::TelemetryConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::poller::PollerConfig;

/// Complete node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Identity of this node on the peer network.
    pub node_id: String,
    pub engine: EngineConfig,
    pub propagation: PropagationConfig,
    pub poller: PollerConfig,
    pub telemetry: TelemetryConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            node_id: "node-a".to_string(),
            engine: EngineConfig::default(),
            propagation: PropagationConfig::default(),
            poller: PollerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Node id must not be empty")]
    EmptyNodeId,

    #[error("Propagation fanout must be at least 1")]
    ZeroFanout,

    #[error("Outbound queue capacity must be at least 1")]
    ZeroQueueCapacity,

    #[error("Poll interval must be at least 1 ms")]
    ZeroPollInterval,

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: String, value: String },
}

impl NodeConfig {
    /// Defaults overridden from the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `SEED_NODE_ID`
    /// - `SEED_MAX_COMMIT_RETRIES`
    /// - `SEED_FANOUT`, `SEED_MAX_SEND_RETRIES`, `SEED_RETRY_BACKOFF_MS`,
    ///   `SEED_QUEUE_CAPACITY`, `SEED_MIN_COST_TIER`
    /// - `SEED_POLL_INTERVAL_MS`
    /// - telemetry variables, see [`TelemetryConfig::from_env`]
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::from_lookup(|var| std::env::var(var).ok())?;
        config.telemetry = TelemetryConfig::from_env();
        Ok(config)
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(node_id) = lookup("SEED_NODE_ID") {
            config.node_id = node_id;
        }
        override_from(&lookup, "SEED_MAX_COMMIT_RETRIES", &mut config.engine.max_commit_retries)?;
        override_from(&lookup, "SEED_FANOUT", &mut config.propagation.fanout)?;
        override_from(&lookup, "SEED_MAX_SEND_RETRIES", &mut config.propagation.max_send_retries)?;
        override_from(&lookup, "SEED_RETRY_BACKOFF_MS", &mut config.propagation.retry_backoff_ms)?;
        override_from(&lookup, "SEED_QUEUE_CAPACITY", &mut config.propagation.queue_capacity)?;
        override_from(&lookup, "SEED_MIN_COST_TIER", &mut config.propagation.min_cost_tier)?;
        override_from(&lookup, "SEED_POLL_INTERVAL_MS", &mut config.poller.interval_ms)?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node_id.trim().is_empty() {
            return Err(ConfigError::EmptyNodeId);
        }
        if self.propagation.fanout == 0 {
            return Err(ConfigError::ZeroFanout);
        }
        if self.propagation.queue_capacity == 0 {
            return Err(ConfigError::ZeroQueueCapacity);
        }
        if self.poller.interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }

    /// Same settings under another node id.
    pub fn for_node(&self, node_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            telemetry: self.telemetry.for_node(node_id),
            ..self.clone()
        }
    }
}

fn override_from<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
    slot: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(var) {
        *slot = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value,
        })?;
    }
    Ok(())
}
