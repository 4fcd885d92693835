//! Cross-crate scenarios, driven through `SeedNode` and the public crate
//! APIs only.

pub mod determinism;
pub mod ledger;
pub mod network;

#[cfg(test)]
pub(crate) mod support {
    use node_runtime::{GenesisConfig, NodeConfig, SeedNode};
    use seed_modules::{builtin_modules, SEED_MODULE};
    use serde_json::{json, Value};
    use std::time::Duration;

    /// Poll `condition` for up to two seconds.
    pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        condition()
    }

    /// Short retry backoff so partition tests settle quickly.
    pub fn test_config(node_id: &str) -> NodeConfig {
        let mut config = NodeConfig::default().for_node(node_id);
        config.propagation.retry_backoff_ms = 1;
        config
    }

    pub async fn standalone(genesis: &GenesisConfig) -> SeedNode {
        SeedNode::boot(test_config("solo"), builtin_modules(), genesis)
            .await
            .unwrap()
    }

    pub fn balance(node: &SeedNode, user: &str) -> i64 {
        node.query_json(SEED_MODULE, "getBalance", json!({"user": user}))
            .unwrap()
            .as_i64()
            .unwrap()
    }

    pub fn sum_of_balances(node: &SeedNode) -> i64 {
        match node.query_json(SEED_MODULE, "getAllBalances", Value::Null).unwrap() {
            Value::Object(balances) => balances.values().filter_map(Value::as_i64).sum(),
            other => panic!("unexpected balances: {other}"),
        }
    }
}
