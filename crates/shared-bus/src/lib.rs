//! # Shared Bus - In-Process Ledger Events
//!
//! The Transaction Engine, the Propagation Layer and external collaborators
//! (UI renderers, metrics, the devnet binary) observe each other through
//! this bus instead of holding references to one another.
//!
//! ```text
//! ┌────────────────────┐  publish()  ┌──────────────┐  subscribe()  ┌──────────────┐
//! │ Transaction Engine │ ──────────→ │  Event Bus   │ ────────────→ │ Collaborator │
//! └────────────────────┘             └──────────────┘               └──────────────┘
//! ```
//!
//! Publishing never blocks and never fails: events with no subscriber are
//! dropped, slow subscribers skip what they lagged behind on.

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent, TxOrigin};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
