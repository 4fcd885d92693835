//! # In-Memory Peer Network
//!
//! Connects several nodes in one process. Every member gets an inbox of
//! `(sender, payload)` pairs; a member can be partitioned off to simulate a
//! network split.

use async_trait::async_trait;
use parking_lot::RwLock;
use sd_05_propagation::{PeerNetwork, PropagationError};
use shared_types::PeerId;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Receiving side of a member's link.
pub type Inbox = mpsc::UnboundedReceiver<(PeerId, Vec<u8>)>;

#[derive(Default)]
struct Members {
    links: BTreeMap<PeerId, mpsc::UnboundedSender<(PeerId, Vec<u8>)>>,
    partitioned: HashSet<PeerId>,
}

/// Shared hub. Cheap to clone.
#[derive(Clone, Default)]
pub struct InMemoryNetwork {
    members: Arc<RwLock<Members>>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `peer` and return its transport endpoint and inbox.
    /// Joining again replaces the previous link.
    pub fn join(&self, peer: PeerId) -> (InMemoryPeerNetwork, Inbox) {
        let (sender, inbox) = mpsc::unbounded_channel();
        self.members.write().links.insert(peer.clone(), sender);
        info!(peer_id = %peer, "Joined in-memory network");
        (
            InMemoryPeerNetwork {
                local: peer,
                network: self.clone(),
            },
            inbox,
        )
    }

    pub fn leave(&self, peer: &PeerId) {
        let mut members = self.members.write();
        members.links.remove(peer);
        members.partitioned.remove(peer);
    }

    /// Cut `peer` off: nothing reaches it and nothing it sends arrives.
    pub fn partition(&self, peer: &PeerId) {
        self.members.write().partitioned.insert(peer.clone());
        info!(peer_id = %peer, "Peer partitioned");
    }

    pub fn heal(&self, peer: &PeerId) {
        self.members.write().partitioned.remove(peer);
        info!(peer_id = %peer, "Partition healed");
    }

    pub fn members(&self) -> Vec<PeerId> {
        self.members.read().links.keys().cloned().collect()
    }

    fn deliver(&self, from: &PeerId, to: &PeerId, payload: Vec<u8>) -> Result<(), PropagationError> {
        let members = self.members.read();
        if members.partitioned.contains(from) || members.partitioned.contains(to) {
            return Err(PropagationError::PeerUnreachable(to.clone()));
        }
        let link = members
            .links
            .get(to)
            .ok_or_else(|| PropagationError::PeerUnreachable(to.clone()))?;
        link.send((from.clone(), payload))
            .map_err(|_| PropagationError::PeerUnreachable(to.clone()))?;
        debug!(from = %from, to = %to, "Delivered");
        Ok(())
    }
}

/// One member's view of the hub.
pub struct InMemoryPeerNetwork {
    local: PeerId,
    network: InMemoryNetwork,
}

impl InMemoryPeerNetwork {
    pub fn local_peer(&self) -> &PeerId {
        &self.local
    }
}

#[async_trait]
impl PeerNetwork for InMemoryPeerNetwork {
    fn peers(&self) -> Vec<PeerId> {
        self.network
            .members()
            .into_iter()
            .filter(|peer| *peer != self.local)
            .collect()
    }

    async fn send(&self, peer: &PeerId, payload: Vec<u8>) -> Result<(), PropagationError> {
        self.network.deliver(&self.local, peer, payload)
    }
}
