//! # ChangeContext Invariants
//!
//! Checked between `Executed` and `Validated`, against the snapshot the
//! handler read from. Any violation discards the whole ChangeContext.
//!
//! - Magnitudes are non-negative; sign lives in the operation.
//! - Every delta names a key of the module's schema, with the right shape.
//! - Applying the deltas in order never drives a tracked field below zero
//!   and never overflows.

use sd_01_state_store::{ModuleData, StateError, StateSnapshot};
use shared_types::{Amount, Delta, DeltaTarget};
use std::fmt;

// =============================================================================
// INVARIANT CHECKS
// =============================================================================

/// Sign is expressed by `add` vs `subtract`, never by the magnitude.
#[must_use]
pub fn check_non_negative_amounts(deltas: &[Delta]) -> Vec<InvariantViolation> {
    deltas
        .iter()
        .filter(|d| d.amount < 0)
        .map(|d| InvariantViolation::NegativeAmount {
            path: d.path(),
            amount: d.amount,
        })
        .collect()
}

/// Every key exists in the module or user schema. Plain deltas need an
/// integer field, nested deltas a map field.
#[must_use]
pub fn check_schema(module: &ModuleData, deltas: &[Delta]) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    for delta in deltas {
        let schema = match &delta.target {
            DeltaTarget::Module => &module.module_state,
            DeltaTarget::User(_) => &module.user_template,
        };
        let Some(field) = schema.get(&delta.key) else {
            violations.push(InvariantViolation::UnknownKey { path: delta.path() });
            continue;
        };
        let expected = match delta.subkey {
            None if !field.is_i64() => Some(FieldShape::Integer),
            Some(_) if !field.is_object() => Some(FieldShape::Map),
            _ => None,
        };
        if let Some(expected) = expected {
            violations.push(InvariantViolation::ShapeMismatch {
                path: delta.path(),
                expected,
            });
        }
    }
    violations
}

/// Dry-run the deltas in order on a private copy of `snapshot`.
pub fn check_balances(
    snapshot: &StateSnapshot,
    module: &str,
    deltas: &[Delta],
) -> Result<(), InvariantViolation> {
    snapshot
        .apply(module, deltas)
        .map(|_| ())
        .map_err(InvariantViolation::from)
}

/// Check all invariants at once. Balances are only checked once the
/// context is structurally sound.
#[must_use]
pub fn check_all_invariants(
    snapshot: &StateSnapshot,
    module: &str,
    deltas: &[Delta],
) -> InvariantCheckResult {
    let Some(data) = snapshot.module(module) else {
        return InvariantCheckResult::Invalid(vec![InvariantViolation::ModuleNotInstalled(
            module.to_string(),
        )]);
    };

    let mut violations = check_non_negative_amounts(deltas);
    violations.extend(check_schema(data, deltas));

    if violations.is_empty() {
        if let Err(violation) = check_balances(snapshot, module, deltas) {
            violations.push(violation);
        }
    }

    if violations.is_empty() {
        InvariantCheckResult::Valid
    } else {
        InvariantCheckResult::Invalid(violations)
    }
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    Valid,
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldShape {
    Integer,
    Map,
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    ModuleNotInstalled(String),
    NegativeAmount { path: String, amount: Amount },
    UnknownKey { path: String },
    ShapeMismatch { path: String, expected: FieldShape },
    Underflow {
        path: String,
        required: Amount,
        available: Amount,
    },
    Overflow { path: String },
}

impl InvariantViolation {
    /// A module bug, as opposed to state that cannot cover the change.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::Underflow { .. })
    }
}

impl From<StateError> for InvariantViolation {
    fn from(err: StateError) -> Self {
        match err {
            StateError::Underflow {
                path,
                required,
                available,
            } => Self::Underflow {
                path,
                required,
                available,
            },
            StateError::Overflow { path } => Self::Overflow { path },
            StateError::NegativeAmount { path, amount } => Self::NegativeAmount { path, amount },
            StateError::UnknownKey { path } => Self::UnknownKey { path },
            StateError::NotNumeric { path } => Self::ShapeMismatch {
                path,
                expected: FieldShape::Integer,
            },
            StateError::NotAMap { path } => Self::ShapeMismatch {
                path,
                expected: FieldShape::Map,
            },
            other => Self::ModuleNotInstalled(other.to_string()),
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleNotInstalled(module) => write!(f, "module not installed: {module}"),
            Self::NegativeAmount { path, amount } => {
                write!(f, "negative amount {amount} at {path}")
            }
            Self::UnknownKey { path } => write!(f, "unknown key {path}"),
            Self::ShapeMismatch { path, expected } => {
                let shape = match expected {
                    FieldShape::Integer => "an integer",
                    FieldShape::Map => "a map",
                };
                write!(f, "{path} is not {shape}")
            }
            Self::Underflow {
                path,
                required,
                available,
            } => write!(f, "{path} would go below zero: {required} > {available}"),
            Self::Overflow { path } => write!(f, "overflow at {path}"),
        }
    }
}
