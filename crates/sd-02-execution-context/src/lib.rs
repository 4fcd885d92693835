//! # sd-02-execution-context
//!
//! The read/write split a handler executes inside.
//!
//! - [`Container`]: transaction arguments plus a pinned, read-only snapshot of
//!   the State Store. Reads never see the deltas the handler is recording.
//! - [`ChangeContext`]: an ordered, append-only list of deltas. Recording a
//!   delta never touches the State Store; the Transaction Engine applies or
//!   discards the whole list.
//!
//! ```text
//!   Arc<StateSnapshot> + Transaction ──→ Container ──→ handler ──→ ChangeContext
//!                                         (read)                    (write)
//! ```

pub mod domain;

pub use domain::*;
