//! # Resync Poller
//!
//! Re-runs a fixed list of getters on an interval and publishes the results
//! on a `tokio::sync::watch` channel, for collaborators (a UI canvas, a
//! dashboard) that repaint from full state. The poller only reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sd_04_transaction_engine::TransactionEngineApi;
use seed_modules::CUBE_RUNNER_MODULE;
use shared_types::{Args, StateVersion};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// One getter call made on every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetterQuery {
    pub module: String,
    pub getter: String,
    #[serde(default)]
    pub args: Args,
}

impl GetterQuery {
    pub fn new(module: &str, getter: &str) -> Self {
        Self {
            module: module.to_string(),
            getter: getter.to_string(),
            args: Args::new(),
        }
    }

    /// Key of this query's result, `module.getter`.
    pub fn key(&self) -> String {
        format!("{}.{}", self.module, self.getter)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollerConfig {
    pub interval_ms: u64,
    pub queries: Vec<GetterQuery>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 150,
            queries: vec![
                GetterQuery::new(CUBE_RUNNER_MODULE, "getAllPositions"),
                GetterQuery::new(CUBE_RUNNER_MODULE, "getAllWalls"),
            ],
        }
    }
}

/// Results of one polling round. A failed getter is kept as its error text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSnapshot {
    pub state_version: StateVersion,
    pub results: BTreeMap<String, Result<Value, String>>,
}

impl PollSnapshot {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.results.get(key).and_then(|result| result.as_ref().ok())
    }
}

/// Background polling task; stops when dropped.
pub struct ResyncPoller {
    receiver: watch::Receiver<PollSnapshot>,
    task: JoinHandle<()>,
}

impl ResyncPoller {
    /// Start polling `engine`. Must be called inside a Tokio runtime.
    pub fn spawn<E>(engine: Arc<E>, config: PollerConfig) -> Self
    where
        E: TransactionEngineApi + 'static,
    {
        let (sender, receiver) = watch::channel(PollSnapshot::default());
        let interval = Duration::from_millis(config.interval_ms.max(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let snapshot = poll_once(engine.as_ref(), &config.queries);
                let version = snapshot.state_version;
                let changed = sender.send_if_modified(|current| {
                    if *current == snapshot {
                        return false;
                    }
                    *current = snapshot;
                    true
                });
                if changed {
                    debug!(state_version = version, "Poller published new snapshot");
                }
            }
        });

        Self { receiver, task }
    }

    /// A receiver that wakes whenever the polled results change.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.receiver.clone()
    }

    pub fn latest(&self) -> PollSnapshot {
        self.receiver.borrow().clone()
    }
}

impl Drop for ResyncPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run every query once against a single pinned snapshot, so all results
/// and the reported version come from the same commit.
pub fn poll_once<E: TransactionEngineApi + ?Sized>(engine: &E, queries: &[GetterQuery]) -> PollSnapshot {
    let pinned = engine.snapshot();
    let results = queries
        .iter()
        .map(|query| {
            let result = engine
                .query_at(pinned.clone(), &query.module, &query.getter, &query.args)
                .map_err(|e| e.to_string());
            (query.key(), result)
        })
        .collect();
    PollSnapshot {
        state_version: pinned.version(),
        results,
    }
}
