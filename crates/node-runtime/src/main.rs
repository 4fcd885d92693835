//! # Seed Devnet
//!
//! Boots two nodes on an in-process network, runs a SEED transfer and a
//! CubeRunner walk, then reports both state roots until Ctrl+C.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `SEED_*` environment variables
//! 2. Initialize telemetry (logs and metrics)
//! 3. Boot `<node_id>` and `<node_id>-peer` with the devnet genesis
//! 4. Run the scenario
//! 5. Report until Ctrl+C, then shut down

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;
use tracing::{info, warn};

use node_runtime::{GenesisConfig, InMemoryNetwork, NodeConfig, SeedNode};
use seed_modules::{builtin_modules, CUBE_RUNNER_MODULE, SEED_MODULE};
use seed_telemetry::init_telemetry;

const REPORT_INTERVAL: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let config = NodeConfig::from_env().context("Failed to load node configuration")?;
    let telemetry = init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Seed devnet v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let network = InMemoryNetwork::new();
    let genesis = GenesisConfig::devnet();
    let peer_id = format!("{}-peer", config.node_id);
    let local = SeedNode::boot_on(&network, config.clone(), builtin_modules(), &genesis)
        .await
        .context("Failed to boot local node")?;
    let peer = SeedNode::boot_on(&network, config.for_node(&peer_id), builtin_modules(), &genesis)
        .await
        .context("Failed to boot peer node")?;

    let poller = local.spawn_poller();
    let mut updates = poller.subscribe();
    tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let snapshot = updates.borrow_and_update().clone();
            let results: serde_json::Map<String, serde_json::Value> = snapshot
                .results
                .into_iter()
                .filter_map(|(key, result)| Some((key, result.ok()?)))
                .collect();
            info!(
                state_version = snapshot.state_version,
                results = %serde_json::Value::Object(results),
                "[devnet] Poll"
            );
        }
    });

    run_transfer_scenario(&local).await?;
    run_cube_runner_scenario(&peer).await?;

    info!("Devnet running. Press Ctrl+C to stop.");
    let mut ticker = tokio::time::interval(REPORT_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let converged = local.state_root_hex() == peer.state_root_hex();
                info!(
                    local_version = local.state_version(),
                    peer_version = peer.state_version(),
                    state_root = %local.state_root_hex(),
                    converged,
                    "[devnet] State"
                );
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl+C")?;
                break;
            }
        }
    }

    drop(poller);
    local.shutdown();
    peer.shutdown();
    if let Ok(text) = telemetry.metrics().gather() {
        info!(bytes = text.len(), "[devnet] Final metrics gathered");
    }
    info!("Shutdown complete");
    Ok(())
}

/// A sends 40 of its 100 SEED to B, then tries to send 1000.
async fn run_transfer_scenario(node: &SeedNode) -> Result<()> {
    for value in [40, 1000] {
        let receipt = node
            .submit(SEED_MODULE, "transfer", json!({"to": "B", "value": value}), "A", 0)
            .await?;
        if receipt.committed {
            info!(value, state_version = receipt.state_version, "[devnet] Transfer committed");
        } else {
            warn!(value, reason = ?receipt.reason, "[devnet] Transfer rejected");
        }
    }

    let balances = node.query_json(SEED_MODULE, "getAllBalances", json!({}))?;
    info!(%balances, "[devnet] Balances");
    Ok(())
}

/// Walk a unit square at a high cost tier.
async fn run_cube_runner_scenario(node: &SeedNode) -> Result<()> {
    for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
        let receipt = node
            .submit(
                CUBE_RUNNER_MODULE,
                "move",
                json!({"xOffset": dx, "yOffset": dy}),
                "runner",
                3,
            )
            .await?;
        info!(dx, dy, committed = receipt.committed, "[devnet] Move");
    }

    let position = node.query_json(CUBE_RUNNER_MODULE, "getPosition", json!({"user": "runner"}))?;
    info!(%position, "[devnet] Runner position");
    Ok(())
}
