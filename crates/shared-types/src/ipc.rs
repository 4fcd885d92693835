//! # IPC Message Payloads
//!
//! Messages that cross a process or node boundary.
//!
//! ## Design Rules
//!
//! - `PeerMessage::Transaction` carries the five replayable transaction
//!   fields plus an id used only for deduplication.
//! - Encoding is JSON: argument and state values are dynamically typed.

use crate::entities::*;
use crate::errors::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result of `submitTransaction`, as reported to the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Local identifier of the submission (also the propagation dedup key).
    pub tx_id: Uuid,
    /// Whether the ChangeContext was applied.
    pub committed: bool,
    /// Present whenever `committed` is false.
    pub reason: Option<ErrorKind>,
    /// Store version after this transaction (unchanged when rejected).
    pub state_version: StateVersion,
    /// Number of deltas applied.
    pub deltas_applied: usize,
}

impl TxReceipt {
    pub fn committed(tx_id: Uuid, state_version: StateVersion, deltas_applied: usize) -> Self {
        Self {
            tx_id,
            committed: true,
            reason: None,
            state_version,
            deltas_applied,
        }
    }

    pub fn rejected(tx_id: Uuid, reason: ErrorKind, state_version: StateVersion) -> Self {
        Self {
            tx_id,
            committed: false,
            reason: Some(reason),
            state_version,
            deltas_applied: 0,
        }
    }
}

/// Node-to-node message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerMessage {
    /// A transaction committed by the sending node, to be replayed.
    Transaction { id: Uuid, transaction: Transaction },
    /// "Give me everything."
    ResyncRequest { request_id: Uuid },
    /// Full state in answer to a `ResyncRequest`.
    ResyncResponse { request_id: Uuid, state: StateExport },
}

impl PeerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transaction { .. } => "transaction",
            Self::ResyncRequest { .. } => "resync_request",
            Self::ResyncResponse { .. } => "resync_response",
        }
    }
}

/// Wire encoding failures.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Failed to encode peer message: {0}")]
    Encode(String),

    #[error("Failed to decode peer message: {0}")]
    Decode(String),
}

/// Encode a peer message for the transport.
pub fn encode_peer_message(message: &PeerMessage) -> Result<Vec<u8>, WireError> {
    serde_json::to_vec(message).map_err(|e| WireError::Encode(e.to_string()))
}

/// Decode a peer message received from the transport.
pub fn decode_peer_message(bytes: &[u8]) -> Result<PeerMessage, WireError> {
    serde_json::from_slice(bytes).map_err(|e| WireError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_message_keeps_all_replay_fields() {
        let tx = Transaction::new(
            "CubeRunner",
            "move",
            args_from_json(json!({"xOffset": 1, "yOffset": 0})),
            UserId::from("alice"),
            3,
        );
        let message = PeerMessage::Transaction {
            id: Uuid::new_v4(),
            transaction: tx.clone(),
        };

        let bytes = encode_peer_message(&message).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"type\":\"transaction\""));
        assert!(text.contains("\"cost_tier\":3"));

        match decode_peer_message(&bytes).unwrap() {
            PeerMessage::Transaction { transaction, .. } => assert_eq!(transaction, tx),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_peer_message(b"not json");
        assert!(matches!(result, Err(WireError::Decode(_))));
    }

    #[test]
    fn test_rejected_receipt_has_reason() {
        let receipt = TxReceipt::rejected(Uuid::nil(), ErrorKind::NoOp, 7);
        assert!(!receipt.committed);
        assert_eq!(receipt.reason, Some(ErrorKind::NoOp));
        assert_eq!(receipt.state_version, 7);
        assert_eq!(receipt.deltas_applied, 0);
    }
}
