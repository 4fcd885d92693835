use sd_01_state_store::StateError;
use sd_03_module_registry::{GetterError, RegistryError};
use shared_types::ErrorKind;
use thiserror::Error;

use super::InvariantViolation;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Routing(#[from] RegistryError),

    #[error("Handler {module}.{handler} recorded no changes")]
    NoOp { module: String, handler: String },

    #[error("ChangeContext rejected: {}", format_violations(.0))]
    Invariants(Vec<InvariantViolation>),

    #[error("State store error: {0}")]
    State(#[from] StateError),

    #[error("Invalid query arguments: {0}")]
    InvalidArguments(#[from] GetterError),
}

fn format_violations(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl EngineError {
    /// The wire-level reason reported to the submitter.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Routing(RegistryError::UnknownHandler { .. }) => ErrorKind::UnknownHandler,
            Self::Routing(RegistryError::UnknownGetter { .. }) => ErrorKind::UnknownGetter,
            Self::Routing(_) => ErrorKind::UnknownModule,
            Self::NoOp { .. } => ErrorKind::NoOp,
            Self::Invariants(violations) => {
                if violations.iter().any(InvariantViolation::is_malformed) {
                    ErrorKind::InvalidDelta
                } else {
                    ErrorKind::InsufficientFunds
                }
            }
            Self::State(StateError::UnknownModule(_)) => ErrorKind::UnknownModule,
            Self::State(StateError::Underflow { .. }) => ErrorKind::InsufficientFunds,
            Self::State(_) => ErrorKind::InvalidDelta,
            Self::InvalidArguments(_) => ErrorKind::InvalidArguments,
        }
    }
}
