//! # sd-05-propagation
//!
//! Broadcasts committed transactions to peers and answers resync requests.
//!
//! ## Role in System
//!
//! ```text
//! [Transaction Engine] ──commit──→ propagate(tx) ──→ OutboundQueue
//!                                                       │ highest cost tier first
//!                                                       ↓
//!                                       PeerNetwork::send (fanout, retries)
//!                                                       │
//!                     [Peer] handle_message ←───────────┘
//!                        │ seen-cache dedup
//!                        ↓
//!                 TransactionSink::submit_remote ──committed──→ relay (minus source)
//! ```
//!
//! - Local commit never waits on the network: `propagate` only enqueues.
//! - Cost tier orders the queue and gates relaying (`min_cost_tier`); it
//!   never changes how a transaction executes.
//! - Send failures are retried with linear backoff, then logged, counted and
//!   published as `LedgerEvent::PeerSendFailed`.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::*;
pub use service::PropagationService;
