//! # sd-04-transaction-engine
//!
//! Runs transactions through a type-state pipeline and commits the
//! resulting ChangeContext to the State Store as one atomic unit.
//!
//! ## Pipeline
//!
//! ```text
//! Received → Built(Container) → Executed(handler ran) → Validated → Committed | Rejected
//! ```
//!
//! ## Concurrency
//!
//! Handlers run against a pinned snapshot without holding any lock, so
//! several transactions may execute at once. Commits are serialised on the
//! engine's commit lock and checked against the pinned version: a
//! transaction whose snapshot went stale is re-executed, and after
//! `max_commit_retries` such conflicts it is executed while holding the
//! lock. Every committed transaction therefore observed exactly the state
//! left by the commit before it.
//!
//! ## Rejections
//!
//! | Reason | Cause |
//! |--------|-------|
//! | `UnknownModule` / `UnknownHandler` | routing failed, handler never ran |
//! | `NoOp` | handler recorded no deltas (business rule declined) |
//! | `InvalidDelta` | negative magnitude, unknown key, wrong shape, overflow |
//! | `InsufficientFunds` | a subtract would drive a field below zero |
//!
//! A rejected transaction leaves the State Store untouched.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::*;
pub use service::*;
