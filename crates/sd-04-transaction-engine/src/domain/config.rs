use serde::{Deserialize, Serialize};

/// Transaction Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Optimistic executions that may lose the commit race before the engine
    /// re-executes under the commit lock.
    pub max_commit_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: 3,
        }
    }
}
