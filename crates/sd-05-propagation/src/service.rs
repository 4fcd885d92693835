//! # Propagation Service
//!
//! Implements [`PropagationApi`] on top of two outbound ports:
//! - [`PeerNetwork`]: delivers encoded peer messages
//! - [`TransactionSink`]: the local engine, for replay and resync
//!
//! Outbound work is split in two: `propagate` only enqueues, and a
//! broadcaster task (`run`) drains the queue to the network. Inbound
//! messages are handled in the caller's task.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_bus::{EventPublisher, LedgerEvent};
use shared_types::{
    decode_peer_message, encode_peer_message, PeerId, PeerMessage, Transaction,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

use crate::domain::{
    retry_delay, select_peers, should_relay, OutboundQueue, PropagationConfig, PropagationError,
    PropagationMetrics, QueuedTx, SeenTxCache,
};
use crate::ports::{InboundOutcome, PeerNetwork, PropagationApi, TransactionSink};

/// Propagation service.
///
/// Thread-safe; share it via `Arc` between the broadcaster task, the
/// inbound message loop and the local submit path.
pub struct PropagationService<N, T>
where
    N: PeerNetwork,
    T: TransactionSink,
{
    config: PropagationConfig,
    /// Ids already executed or queued here.
    seen_cache: SeenTxCache,
    queue: Mutex<OutboundQueue>,
    /// Wakes the broadcaster after an enqueue.
    wake: Notify,
    /// Resync requests we sent and have not had an answer to.
    pending_resyncs: Mutex<HashSet<Uuid>>,
    network: Arc<N>,
    sink: Arc<T>,
    publisher: Option<Arc<dyn EventPublisher>>,
    metrics: RwLock<PropagationMetrics>,
}

impl<N, T> PropagationService<N, T>
where
    N: PeerNetwork,
    T: TransactionSink,
{
    pub fn new(config: PropagationConfig, network: Arc<N>, sink: Arc<T>) -> Self {
        Self {
            seen_cache: SeenTxCache::new(config.seen_cache_size),
            queue: Mutex::new(OutboundQueue::new(config.queue_capacity)),
            config,
            wake: Notify::new(),
            pending_resyncs: Mutex::new(HashSet::new()),
            network,
            sink,
            publisher: None,
            metrics: RwLock::new(PropagationMetrics::default()),
        }
    }

    /// Publish `PeerSendFailed` events on `publisher`.
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Broadcaster loop: drain, then sleep until the next enqueue.
    pub async fn run(&self) {
        info!(
            fanout = self.config.fanout,
            min_cost_tier = self.config.min_cost_tier,
            "[sd-05] Outbound broadcaster started"
        );
        loop {
            self.flush().await;
            self.wake.notified().await;
        }
    }

    /// Broadcast everything currently queued. Returns the number of
    /// transactions taken off the queue.
    pub async fn flush(&self) -> usize {
        let mut drained = 0;
        while let Some(item) = self.next_queued() {
            self.broadcast(item).await;
            drained += 1;
        }
        drained
    }

    fn next_queued(&self) -> Option<QueuedTx> {
        self.queue.lock().pop()
    }

    fn enqueue(&self, item: QueuedTx) {
        let dropped = self.queue.lock().push(item);
        {
            let mut metrics = self.metrics.write();
            metrics.queued += 1;
            if dropped.is_some() {
                metrics.dropped += 1;
            }
        }
        if let Some(dropped) = dropped {
            warn!(
                tx_id = %dropped.id,
                cost_tier = dropped.transaction.cost_tier,
                capacity = self.config.queue_capacity,
                "[sd-05] Outbound queue full, dropped lowest-priority transaction"
            );
        }
        self.wake.notify_one();
    }

    async fn broadcast(&self, item: QueuedTx) {
        let tx_id = item.id;
        let message = PeerMessage::Transaction {
            id: item.id,
            transaction: item.transaction,
        };
        let payload = match encode_peer_message(&message) {
            Ok(payload) => payload,
            Err(e) => {
                error!(tx_id = %tx_id, error = %e, "[sd-05] Cannot encode transaction");
                return;
            }
        };

        let peers = select_peers(&self.network.peers(), self.config.fanout, item.exclude.as_ref());
        debug!(tx_id = %tx_id, peers = peers.len(), "[sd-05] Broadcasting transaction");
        for peer in peers {
            // Failures are counted and published inside; nothing to surface.
            let _ = self.send_with_retry(&peer, payload.clone(), tx_id).await;
        }
    }

    async fn send_with_retry(
        &self,
        peer: &PeerId,
        payload: Vec<u8>,
        message_id: Uuid,
    ) -> Result<(), PropagationError> {
        let attempts = self.config.max_send_retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.network.send(peer, payload.clone()).await {
                Ok(()) => {
                    self.metrics.write().sent += 1;
                    trace!(peer_id = %peer, message_id = %message_id, attempt, "[sd-05] Sent");
                    return Ok(());
                }
                Err(e) => {
                    debug!(
                        peer_id = %peer,
                        message_id = %message_id,
                        attempt,
                        error = %e,
                        "[sd-05] Send failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(retry_delay(attempt, &self.config)).await;
                    }
                }
            }
        }

        self.metrics.write().send_failures += 1;
        warn!(
            peer_id = %peer,
            message_id = %message_id,
            attempts,
            "[sd-05] Giving up on peer"
        );
        if let Some(publisher) = &self.publisher {
            publisher
                .publish(LedgerEvent::PeerSendFailed {
                    peer: peer.clone(),
                    tx_id: message_id,
                    attempts,
                })
                .await;
        }
        Err(last_error.unwrap_or_else(|| PropagationError::PeerUnreachable(peer.clone())))
    }

    async fn handle_transaction(
        &self,
        from: PeerId,
        tx_id: Uuid,
        transaction: Transaction,
    ) -> Result<InboundOutcome, PropagationError> {
        if !self.seen_cache.mark_seen(tx_id, Some(from.clone())) {
            self.metrics.write().duplicates += 1;
            trace!(tx_id = %tx_id, peer_id = %from, "[sd-05] Duplicate transaction dropped");
            return Ok(InboundOutcome::Duplicate);
        }

        let receipt = self
            .sink
            .submit_remote(tx_id, transaction.clone(), from.clone())
            .await;
        self.metrics.write().replayed += 1;

        if receipt.committed {
            if should_relay(transaction.cost_tier, &self.config) {
                self.enqueue(QueuedTx {
                    id: tx_id,
                    transaction,
                    exclude: Some(from),
                });
            } else {
                self.metrics.write().throttled += 1;
            }
        } else {
            debug!(
                tx_id = %tx_id,
                peer_id = %from,
                reason = ?receipt.reason,
                "[sd-05] Replayed transaction rejected locally, not relaying"
            );
        }
        Ok(InboundOutcome::Replayed(receipt))
    }
}

#[async_trait]
impl<N, T> PropagationApi for PropagationService<N, T>
where
    N: PeerNetwork,
    T: TransactionSink,
{
    fn propagate(&self, tx_id: Uuid, transaction: Transaction) -> Result<(), PropagationError> {
        if !should_relay(transaction.cost_tier, &self.config) {
            self.metrics.write().throttled += 1;
            debug!(
                tx_id = %tx_id,
                cost_tier = transaction.cost_tier,
                "[sd-05] Below relay cost tier, kept local"
            );
            return Err(PropagationError::Throttled {
                cost_tier: transaction.cost_tier,
                min: self.config.min_cost_tier,
            });
        }
        if !self.seen_cache.mark_seen(tx_id, None) {
            self.metrics.write().duplicates += 1;
            return Err(PropagationError::Duplicate(tx_id));
        }

        self.enqueue(QueuedTx {
            id: tx_id,
            transaction,
            exclude: None,
        });
        Ok(())
    }

    async fn handle_message(
        &self,
        from: PeerId,
        payload: &[u8],
    ) -> Result<InboundOutcome, PropagationError> {
        let message = decode_peer_message(payload)?;
        trace!(peer_id = %from, kind = message.kind(), "[sd-05] Inbound message");

        match message {
            PeerMessage::Transaction { id, transaction } => {
                self.handle_transaction(from, id, transaction).await
            }
            PeerMessage::ResyncRequest { request_id } => {
                let state = self.sink.export_state().await;
                let version = state.version;
                let payload = encode_peer_message(&PeerMessage::ResyncResponse { request_id, state })?;
                self.send_with_retry(&from, payload, request_id).await?;
                self.metrics.write().resyncs_served += 1;
                info!(peer_id = %from, state_version = version, "[sd-05] Served resync");
                Ok(InboundOutcome::ResyncServed)
            }
            PeerMessage::ResyncResponse { request_id, state } => {
                let was_pending = self.pending_resyncs.lock().remove(&request_id);
                if !was_pending {
                    warn!(peer_id = %from, request_id = %request_id, "[sd-05] Unsolicited resync response");
                    return Err(PropagationError::UnsolicitedResync(request_id));
                }
                let version = self.sink.restore_state(&state, from.clone()).await?;
                self.metrics.write().resyncs_applied += 1;
                info!(peer_id = %from, state_version = version, "[sd-05] Resync applied");
                Ok(InboundOutcome::ResyncApplied(version))
            }
        }
    }

    async fn request_resync(&self, peer: &PeerId) -> Result<Uuid, PropagationError> {
        let request_id = Uuid::new_v4();
        let payload = encode_peer_message(&PeerMessage::ResyncRequest { request_id })?;
        self.pending_resyncs.lock().insert(request_id);

        if let Err(e) = self.send_with_retry(peer, payload, request_id).await {
            self.pending_resyncs.lock().remove(&request_id);
            return Err(e);
        }
        info!(peer_id = %peer, request_id = %request_id, "[sd-05] Resync requested");
        Ok(request_id)
    }

    fn metrics(&self) -> PropagationMetrics {
        let mut metrics = self.metrics.read().clone();
        metrics.queue_depth = self.queue_len();
        metrics
    }
}
