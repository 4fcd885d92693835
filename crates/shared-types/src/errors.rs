//! # Error Types
//!
//! The wire-level rejection taxonomy. Each crate keeps its own rich error
//! enum and maps it onto `ErrorKind` when reporting to a submitter or peer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a transaction or query did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No module registered under the requested name.
    #[error("unknown module")]
    UnknownModule,

    /// Module exists but has no such handler.
    #[error("unknown handler")]
    UnknownHandler,

    /// Module exists but has no such getter.
    #[error("unknown getter")]
    UnknownGetter,

    /// Handler produced a malformed ChangeContext (module bug).
    #[error("invalid delta")]
    InvalidDelta,

    /// A subtract delta would drive a tracked field below zero.
    #[error("insufficient funds")]
    InsufficientFunds,

    /// Handler recorded no deltas; business rules declined the transaction.
    #[error("no changes recorded")]
    NoOp,

    /// Arguments could not be interpreted (getter queries only).
    #[error("invalid arguments")]
    InvalidArguments,
}

impl ErrorKind {
    /// Caller errors are surfaced immediately and never execute a handler.
    pub fn is_routing_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownModule | Self::UnknownHandler | Self::UnknownGetter
        )
    }
}
