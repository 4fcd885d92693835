//! # Determinism Scenarios
//!
//! Nodes that start from the same genesis and commit the same transactions
//! in the same order hold identical state roots, and restoring an export is
//! idempotent.

#[cfg(test)]
mod tests {
    use crate::integration::support::standalone;
    use node_runtime::{GenesisConfig, SeedNode};
    use sd_04_transaction_engine::TransactionEngineApi;
    use seed_modules::{CUBE_RUNNER_MODULE, SEED_MODULE};
    use serde_json::{json, Value};
    use shared_bus::{EventFilter, EventTopic, LedgerEvent};

    fn script() -> Vec<(&'static str, &'static str, Value, &'static str)> {
        vec![
            (SEED_MODULE, "transfer", json!({"to": "B", "value": 40}), "A"),
            (SEED_MODULE, "approve", json!({"spender": "C", "value": 25}), "B"),
            (SEED_MODULE, "transferFrom", json!({"from": "B", "to": "D", "value": 15}), "C"),
            (SEED_MODULE, "transfer", json!({"to": "B", "value": 1000}), "A"),
            (CUBE_RUNNER_MODULE, "move", json!({"xOffset": 1, "yOffset": 1}), "p1"),
            (CUBE_RUNNER_MODULE, "placeWall", json!({"x": 3, "y": 3}), "p1"),
            (CUBE_RUNNER_MODULE, "teleport", json!({"x": 2, "y": 2}), "p1"),
            (CUBE_RUNNER_MODULE, "move", json!({"xOffset": 1, "yOffset": 0}), "p2"),
        ]
    }

    async fn run_script(node: &SeedNode) -> Vec<bool> {
        let mut outcomes = Vec::new();
        for (module, handler, args, sender) in script() {
            let receipt = node.submit(module, handler, args, sender, 0).await.unwrap();
            outcomes.push(receipt.committed);
        }
        outcomes
    }

    #[tokio::test]
    async fn test_same_history_same_state_root() {
        let genesis = GenesisConfig::devnet();
        let first = standalone(&genesis).await;
        let second = standalone(&genesis).await;
        assert_eq!(first.state_root_hex(), second.state_root_hex());

        let first_outcomes = run_script(&first).await;
        let second_outcomes = run_script(&second).await;

        assert_eq!(first_outcomes, second_outcomes);
        // The oversized transfer and the teleport onto the new wall decline.
        assert_eq!(
            first_outcomes,
            vec![true, true, true, false, true, true, false, true]
        );
        assert_eq!(first.state_version(), second.state_version());
        assert_eq!(first.state_root_hex(), second.state_root_hex());
        assert_eq!(first.export_state(), second.export_state());

        first.shutdown();
        second.shutdown();
    }

    #[tokio::test]
    async fn test_different_history_different_state_root() {
        let genesis = GenesisConfig::devnet();
        let first = standalone(&genesis).await;
        let second = standalone(&genesis).await;

        first
            .submit(SEED_MODULE, "transfer", json!({"to": "B", "value": 1}), "A", 0)
            .await
            .unwrap();
        second
            .submit(SEED_MODULE, "transfer", json!({"to": "C", "value": 1}), "A", 0)
            .await
            .unwrap();

        assert_eq!(first.state_version(), second.state_version());
        assert_ne!(first.state_root_hex(), second.state_root_hex());
        first.shutdown();
        second.shutdown();
    }

    #[tokio::test]
    async fn test_restore_is_idempotent() {
        let genesis = GenesisConfig::devnet();
        let source = standalone(&genesis).await;
        run_script(&source).await;
        let export = source.export_state();

        let target = standalone(&genesis).await;
        let mut events = target.subscribe(EventFilter::topics(vec![EventTopic::Resync]));

        let first = target.engine().restore_state(&export, None).await.unwrap();
        let root_after_first = target.state_root_hex();
        let second = target.engine().restore_state(&export, None).await.unwrap();

        // Every restore moves the local version forward, even onto equal content.
        assert_eq!(first, export.version + 1);
        assert_eq!(second, first + 1);
        assert_eq!(target.state_root_hex(), root_after_first);
        assert_eq!(target.state_root_hex(), source.state_root_hex());

        // Bulk getters with no commit in between answer identically.
        for getter in ["getAllPositions", "getAllWalls"] {
            let first = target.query_json(CUBE_RUNNER_MODULE, getter, Value::Null).unwrap();
            let again = target.query_json(CUBE_RUNNER_MODULE, getter, Value::Null).unwrap();
            assert_eq!(first, again);
            assert_eq!(
                first,
                source.query_json(CUBE_RUNNER_MODULE, getter, Value::Null).unwrap()
            );
        }

        match events.recv().await {
            Some(LedgerEvent::StateRestored { to_version, source, .. }) => {
                assert_eq!(to_version, first);
                assert!(source.is_none());
            }
            other => panic!("expected StateRestored, got {other:?}"),
        }

        // Restored state keeps executing like the source would.
        let receipt = target
            .submit(SEED_MODULE, "transfer", json!({"to": "E", "value": 60}), "A", 0)
            .await
            .unwrap();
        assert!(receipt.committed);
        assert_eq!(receipt.state_version, second + 1);

        source.shutdown();
        target.shutdown();
    }
}
