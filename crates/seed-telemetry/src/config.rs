//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Logging configuration for a Seed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to every log line.
    pub service_name: String,

    /// Log level filter, any `EnvFilter` directive (e.g. `info,sd_04=debug`).
    pub log_level: String,

    /// Whether to write logs to stdout at all.
    pub console_output: bool,

    /// JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "seed-node".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SEED_SERVICE_NAME`: Service name (default: seed-node)
    /// - `SEED_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `SEED_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `SEED_JSON_LOGS`: JSON logs (default: false, true inside containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("SEED_SERVICE_NAME")
                .unwrap_or_else(|_| "seed-node".to_string()),

            log_level: env::var("SEED_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("SEED_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            json_logs: env::var("SEED_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),
        }
    }

    /// Same config under a per-node service name, e.g. `seed-node-a`.
    pub fn for_node(&self, node_id: &str) -> Self {
        Self {
            service_name: format!("{}-{}", self.service_name, node_id),
            ..self.clone()
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "seed-node");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_for_node() {
        let config = TelemetryConfig::default().for_node("a");
        assert_eq!(config.service_name, "seed-node-a");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("off"));
    }
}
