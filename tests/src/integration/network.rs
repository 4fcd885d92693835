//! # Network Scenarios
//!
//! Several nodes on one in-memory network: committed transactions reach
//! every peer exactly once, low cost tiers stay local, a partitioned node
//! catches up through resync, and raw wire traffic from a bare peer is
//! replayed or refused.

#[cfg(test)]
mod tests {
    use crate::integration::support::{balance, eventually, standalone, test_config};
    use node_runtime::{GenesisConfig, InMemoryNetwork, NodeConfig, SeedNode};
    use sd_05_propagation::PeerNetwork;
    use seed_modules::{builtin_modules, CUBE_RUNNER_MODULE, SEED_MODULE};
    use serde_json::json;
    use shared_bus::{EventFilter, EventTopic, LedgerEvent};
    use shared_types::{args_from_json, encode_peer_message, PeerId, PeerMessage, Transaction, UserId};
    use std::time::Duration;
    use uuid::Uuid;

    async fn cluster(network: &InMemoryNetwork, configs: Vec<NodeConfig>) -> Vec<SeedNode> {
        let genesis = GenesisConfig::devnet();
        let mut nodes = Vec::new();
        for config in configs {
            nodes.push(
                SeedNode::boot_on(network, config, builtin_modules(), &genesis)
                    .await
                    .unwrap(),
            );
        }
        nodes
    }

    fn converged(nodes: &[SeedNode]) -> bool {
        nodes
            .windows(2)
            .all(|pair| pair[0].state_root_hex() == pair[1].state_root_hex())
    }

    #[tokio::test]
    async fn test_transactions_reach_every_peer_once() {
        let network = InMemoryNetwork::new();
        let nodes = cluster(
            &network,
            vec![test_config("a"), test_config("b"), test_config("c")],
        )
        .await;
        let genesis_version = nodes[0].state_version();

        nodes[0]
            .submit(SEED_MODULE, "transfer", json!({"to": "B", "value": 40}), "A", 0)
            .await
            .unwrap();
        nodes[1]
            .submit(CUBE_RUNNER_MODULE, "move", json!({"xOffset": 1, "yOffset": 0}), "p1", 2)
            .await
            .unwrap();

        assert!(eventually(|| nodes.iter().all(|n| n.state_version() == genesis_version + 2)).await);
        assert!(converged(&nodes));

        // Relays from the other peer arrive too; none may apply twice.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(nodes.iter().all(|n| n.state_version() == genesis_version + 2));
        assert_eq!(balance(&nodes[2], "B"), 40);
        assert!(nodes.iter().any(|n| n.propagation_metrics().duplicates > 0));

        nodes.iter().for_each(SeedNode::shutdown);
    }

    #[tokio::test]
    async fn test_low_cost_tier_stays_local() {
        let network = InMemoryNetwork::new();
        let configs = ["a", "b"]
            .iter()
            .map(|id| {
                let mut config = test_config(id);
                config.propagation.min_cost_tier = 2;
                config
            })
            .collect();
        let nodes = cluster(&network, configs).await;
        let genesis_version = nodes[1].state_version();

        let receipt = nodes[0]
            .submit(CUBE_RUNNER_MODULE, "move", json!({"xOffset": 0, "yOffset": 1}), "p1", 1)
            .await
            .unwrap();
        assert!(receipt.committed);
        nodes[0]
            .submit(CUBE_RUNNER_MODULE, "move", json!({"xOffset": 1, "yOffset": 0}), "p2", 2)
            .await
            .unwrap();

        assert!(eventually(|| nodes[1].state_version() == genesis_version + 1).await);
        assert_eq!(
            nodes[1]
                .query_json(CUBE_RUNNER_MODULE, "getPosition", json!({"user": "p1"}))
                .unwrap(),
            json!({"x": 0, "y": 0})
        );
        assert_eq!(nodes[0].propagation_metrics().throttled, 1);
        assert!(!converged(&nodes));

        nodes.iter().for_each(SeedNode::shutdown);
    }

    #[tokio::test]
    async fn test_partitioned_peer_catches_up_through_resync() {
        let network = InMemoryNetwork::new();
        let nodes = cluster(&network, vec![test_config("a"), test_config("b")]).await;
        let (a, b) = (&nodes[0], &nodes[1]);
        let mut failures = a.subscribe(EventFilter::topics(vec![EventTopic::Propagation]));

        network.partition(b.peer_id());
        let receipt = a
            .submit(SEED_MODULE, "transfer", json!({"to": "B", "value": 25}), "A", 0)
            .await
            .unwrap();
        assert!(receipt.committed);

        match tokio::time::timeout(Duration::from_secs(2), failures.recv()).await {
            Ok(Some(LedgerEvent::PeerSendFailed { peer, attempts, .. })) => {
                assert_eq!(&peer, b.peer_id());
                assert_eq!(attempts, a.config().propagation.max_send_retries + 1);
            }
            other => panic!("expected PeerSendFailed, got {other:?}"),
        }
        assert_eq!(balance(b, "B"), 0);
        assert!(!converged(&nodes));

        // Resync is refused while still partitioned.
        assert!(b.request_resync(a.peer_id()).await.is_err());

        network.heal(b.peer_id());
        b.request_resync(a.peer_id()).await.unwrap();
        assert!(eventually(|| converged(&nodes)).await);
        assert!(b.state_version() > a.state_version());
        assert_eq!(balance(b, "B"), 25);

        // A second resync changes nothing.
        let root = b.state_root_hex();
        b.request_resync(a.peer_id()).await.unwrap();
        assert!(eventually(|| b.propagation_metrics().resyncs_applied == 2).await);
        assert_eq!(b.state_root_hex(), root);

        // And live propagation resumes.
        a.submit(SEED_MODULE, "transfer", json!({"to": "B", "value": 5}), "A", 0)
            .await
            .unwrap();
        assert!(eventually(|| balance(b, "B") == 30).await);

        nodes.iter().for_each(SeedNode::shutdown);
    }

    fn wire_transfer(id: Uuid, value: i64) -> Vec<u8> {
        let transaction = Transaction::new(
            SEED_MODULE,
            "transfer",
            args_from_json(json!({"to": "B", "value": value})),
            UserId::from("A"),
            0,
        );
        encode_peer_message(&PeerMessage::Transaction { id, transaction }).unwrap()
    }

    #[tokio::test]
    async fn test_bare_peer_wire_traffic() {
        let network = InMemoryNetwork::new();
        let nodes = cluster(&network, vec![test_config("a"), test_config("b")]).await;
        let (a, b) = (&nodes[0], &nodes[1]);
        let (raw, _raw_inbox) = network.join(PeerId::new("raw"));

        // A transaction arriving on the wire is replayed and relayed on.
        let id = Uuid::new_v4();
        raw.send(a.peer_id(), wire_transfer(id, 10)).await.unwrap();
        assert!(eventually(|| balance(a, "B") == 10 && balance(b, "B") == 10).await);

        // The same id again is recognised, not re-applied.
        raw.send(a.peer_id(), wire_transfer(id, 10)).await.unwrap();

        // A resync response nobody asked for must not replace state.
        let other = standalone(&GenesisConfig::devnet()).await;
        other
            .submit(SEED_MODULE, "transfer", json!({"to": "Z", "value": 90}), "A", 0)
            .await
            .unwrap();
        let forged = PeerMessage::ResyncResponse {
            request_id: Uuid::new_v4(),
            state: other.export_state(),
        };
        raw.send(a.peer_id(), encode_peer_message(&forged).unwrap())
            .await
            .unwrap();

        // Inbound messages are handled in order, so once this lands the
        // earlier ones have been dealt with.
        raw.send(a.peer_id(), wire_transfer(Uuid::new_v4(), 5)).await.unwrap();
        assert!(eventually(|| balance(a, "B") == 15 && balance(b, "B") == 15).await);

        let metrics = a.propagation_metrics();
        assert_eq!(metrics.replayed, 2);
        assert!(metrics.duplicates >= 1);
        assert_eq!(metrics.resyncs_applied, 0);
        assert_eq!(balance(a, "Z"), 0);
        assert!(converged(&nodes));

        other.shutdown();
        nodes.iter().for_each(SeedNode::shutdown);
    }
}
