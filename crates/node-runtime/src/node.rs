//! # Seed Node
//!
//! One running node: the kernel components wired together, joined to a
//! peer network, with its background tasks.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Register modules (the registry is frozen afterwards)
//! 3. Install module state and apply genesis
//! 4. Join the peer network
//! 5. Spawn the broadcaster, the inbound loop and the metrics handlers
//!
//! Collaborators only ever hold a `SeedNode`; they never reach the State
//! Store directly.

use sd_01_state_store::InMemoryStateStore;
use sd_03_module_registry::{ModuleDefinition, ModuleRegistryBuilder, RegistryError};
use sd_04_transaction_engine::{EngineError, TransactionEngine, TransactionEngineApi};
use sd_05_propagation::{
    InboundOutcome, PropagationApi, PropagationError, PropagationMetrics, PropagationService,
};
use seed_telemetry::{HistogramTimer, SUBMIT_DURATION};
use serde_json::Value;
use shared_bus::{EventFilter, InMemoryEventBus, Subscription, TxOrigin};
use shared_types::{
    args_from_json, Args, CostTier, PeerId, StateExport, StateVersion, Transaction, TxReceipt,
    UserId,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::adapters::{EngineSink, Inbox, InMemoryNetwork, InMemoryPeerNetwork};
use crate::container::config::{ConfigError, NodeConfig};
use crate::genesis::{GenesisBuilder, GenesisConfig, GenesisError};
use crate::handlers::{record_propagation, MetricsHandler};
use crate::poller::ResyncPoller;

pub type NodeEngine = TransactionEngine<InMemoryStateStore>;
pub type NodePropagation = PropagationService<InMemoryPeerNetwork, EngineSink<InMemoryStateStore>>;

/// How often propagation counters are copied into gauges.
const GAUGE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Module registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Genesis failed: {0}")]
    Genesis(#[from] GenesisError),

    #[error(transparent)]
    Propagation(#[from] PropagationError),

    #[error("Arguments must be a JSON object, got {0}")]
    InvalidArguments(Value),
}

pub struct SeedNode {
    config: NodeConfig,
    peer_id: PeerId,
    engine: Arc<NodeEngine>,
    propagation: Arc<NodePropagation>,
    bus: Arc<InMemoryEventBus>,
    network: InMemoryNetwork,
    shutdown: watch::Sender<bool>,
}

impl SeedNode {
    /// Boot a standalone node on a network of its own.
    pub async fn boot(
        config: NodeConfig,
        modules: Vec<ModuleDefinition>,
        genesis: &GenesisConfig,
    ) -> Result<Self, NodeError> {
        Self::boot_on(&InMemoryNetwork::new(), config, modules, genesis).await
    }

    /// Boot a node and join it to `network`. Must run inside a Tokio
    /// runtime.
    pub async fn boot_on(
        network: &InMemoryNetwork,
        config: NodeConfig,
        modules: Vec<ModuleDefinition>,
        genesis: &GenesisConfig,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let peer_id = PeerId::new(config.node_id.clone());
        info!(peer_id = %peer_id, modules = modules.len(), "[node] Booting");

        let mut builder = ModuleRegistryBuilder::new();
        for module in modules {
            builder.register(module)?;
        }
        let registry = builder.build();

        let bus = Arc::new(InMemoryEventBus::new());
        let engine = Arc::new(
            TransactionEngine::new(
                config.engine.clone(),
                Arc::clone(&registry),
                Arc::new(InMemoryStateStore::new()),
            )
            .with_publisher(bus.clone()),
        );
        engine.install_modules()?;

        let allocation = GenesisBuilder::new(genesis.clone()).build()?;
        for (module, deltas) in &allocation.modules {
            if !registry.contains(module) {
                return Err(GenesisError::UnknownModule(module.clone()).into());
            }
            engine
                .apply_genesis(module, deltas)
                .map_err(|e| GenesisError::ApplyFailed {
                    module: module.clone(),
                    reason: e.to_string(),
                })?;
        }
        info!(
            total_supply = allocation.total_supply,
            state_version = engine.state_version(),
            state_root = %hex_root(&engine),
            "[node] Genesis applied"
        );

        let (transport, inbox) = network.join(peer_id.clone());
        let propagation = Arc::new(
            PropagationService::new(
                config.propagation.clone(),
                Arc::new(transport),
                Arc::new(EngineSink::new(Arc::clone(&engine))),
            )
            .with_publisher(bus.clone()),
        );

        let (shutdown, _) = watch::channel(false);
        let node = Self {
            config,
            peer_id,
            engine,
            propagation,
            bus,
            network: network.clone(),
            shutdown,
        };
        node.spawn_tasks(inbox);
        info!(peer_id = %node.peer_id, "[node] Ready");
        Ok(node)
    }

    fn spawn_tasks(&self, inbox: Inbox) {
        let propagation = Arc::clone(&self.propagation);
        let mut stop = self.shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = propagation.run() => {}
                _ = stop.changed() => debug!("[node] Broadcaster stopped"),
            }
        });

        let propagation = Arc::clone(&self.propagation);
        let mut stop = self.shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = inbound_loop(propagation, inbox) => {}
                _ = stop.changed() => debug!("[node] Inbound loop stopped"),
            }
        });

        let handler = MetricsHandler::new(self.bus.subscribe(EventFilter::all()));
        let mut stop = self.shutdown.subscribe();
        tokio::spawn(async move {
            tokio::select! {
                _ = handler.run() => {}
                _ = stop.changed() => debug!("[node] Metrics handler stopped"),
            }
        });

        let propagation = Arc::clone(&self.propagation);
        let mut stop = self.shutdown.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(GAUGE_INTERVAL);
            loop {
                tokio::select! {
                    _ = ticker.tick() => record_propagation(&propagation.metrics()),
                    _ = stop.changed() => break,
                }
            }
        });
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Execute `transaction` locally and, if it committed, queue it for
    /// broadcast. Returns once the local outcome is known.
    pub async fn submit_transaction(&self, transaction: Transaction) -> TxReceipt {
        let _timer = HistogramTimer::new(&SUBMIT_DURATION);
        let tx_id = Uuid::new_v4();
        let receipt = self
            .engine
            .submit(tx_id, transaction.clone(), TxOrigin::Local)
            .await;

        if receipt.committed {
            match self.propagation.propagate(tx_id, transaction) {
                Ok(()) => {}
                Err(e @ PropagationError::Throttled { .. }) => {
                    debug!(tx_id = %tx_id, "[node] {e}");
                }
                Err(e) => warn!(tx_id = %tx_id, error = %e, "[node] Not propagated"),
            }
        }
        receipt
    }

    /// Build and submit a transaction from JSON arguments.
    pub async fn submit(
        &self,
        module: &str,
        handler: &str,
        args: Value,
        sender: &str,
        cost_tier: CostTier,
    ) -> Result<TxReceipt, NodeError> {
        let args = object_args(args)?;
        let transaction = Transaction::new(module, handler, args, UserId::from(sender), cost_tier);
        Ok(self.submit_transaction(transaction).await)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn query(&self, module: &str, getter: &str, args: &Args) -> Result<Value, NodeError> {
        Ok(self.engine.query(module, getter, args)?)
    }

    pub fn query_json(&self, module: &str, getter: &str, args: Value) -> Result<Value, NodeError> {
        self.query(module, getter, &object_args(args)?)
    }

    pub fn state_version(&self) -> StateVersion {
        self.engine.state_version()
    }

    pub fn state_root_hex(&self) -> String {
        hex_root(&self.engine)
    }

    pub fn export_state(&self) -> StateExport {
        self.engine.export_state()
    }

    // =========================================================================
    // NETWORK
    // =========================================================================

    /// Ask `peer` for its full state; applied when the answer arrives.
    pub async fn request_resync(&self, peer: &PeerId) -> Result<Uuid, NodeError> {
        Ok(self.propagation.request_resync(peer).await?)
    }

    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    pub fn propagation_metrics(&self) -> PropagationMetrics {
        self.propagation.metrics()
    }

    // =========================================================================
    // COLLABORATORS
    // =========================================================================

    /// Receive ledger events published after this call.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }

    pub fn engine(&self) -> &Arc<NodeEngine> {
        &self.engine
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Start polling the configured getters.
    pub fn spawn_poller(&self) -> ResyncPoller {
        ResyncPoller::spawn(Arc::clone(&self.engine), self.config.poller.clone())
    }

    /// Stop background tasks and leave the network.
    pub fn shutdown(&self) {
        info!(peer_id = %self.peer_id, "[node] Shutting down");
        self.shutdown.send_replace(true);
        self.network.leave(&self.peer_id);
    }
}

async fn inbound_loop(propagation: Arc<NodePropagation>, mut inbox: Inbox) {
    while let Some((from, payload)) = inbox.recv().await {
        match propagation.handle_message(from.clone(), &payload).await {
            Ok(InboundOutcome::Replayed(receipt)) => {
                trace!(peer_id = %from, tx_id = %receipt.tx_id, committed = receipt.committed, "[node] Replayed");
            }
            Ok(outcome) => trace!(peer_id = %from, ?outcome, "[node] Inbound handled"),
            Err(e) => warn!(peer_id = %from, error = %e, "[node] Inbound message failed"),
        }
    }
}

fn object_args(args: Value) -> Result<Args, NodeError> {
    match args {
        Value::Object(_) => Ok(args_from_json(args)),
        Value::Null => Ok(Args::new()),
        other => Err(NodeError::InvalidArguments(other)),
    }
}

fn hex_root(engine: &NodeEngine) -> String {
    hex::encode(engine.state_root())
}
