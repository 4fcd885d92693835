use shared_types::{Amount, StateVersion};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("Module not installed: {0}")]
    UnknownModule(String),

    #[error("Module already installed: {0}")]
    ModuleAlreadyInstalled(String),

    #[error("Invalid state template for module {module}: {reason}")]
    InvalidTemplate { module: String, reason: String },

    #[error("Version conflict: deltas computed against {expected}, store is at {actual}")]
    VersionConflict {
        expected: StateVersion,
        actual: StateVersion,
    },

    #[error("Unknown state key: {path}")]
    UnknownKey { path: String },

    #[error("State key is not numeric: {path}")]
    NotNumeric { path: String },

    #[error("State key is not a map: {path}")]
    NotAMap { path: String },

    #[error("Negative delta amount {amount} at {path}")]
    NegativeAmount { path: String, amount: Amount },

    #[error("Underflow at {path}: required {required}, available {available}")]
    Underflow {
        path: String,
        required: Amount,
        available: Amount,
    },

    #[error("Overflow at {path}")]
    Overflow { path: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl StateError {
    /// Errors caused by a malformed ChangeContext rather than by state.
    pub fn is_malformed_delta(&self) -> bool {
        matches!(
            self,
            Self::UnknownKey { .. }
                | Self::NotNumeric { .. }
                | Self::NotAMap { .. }
                | Self::NegativeAmount { .. }
                | Self::Overflow { .. }
        )
    }
}
