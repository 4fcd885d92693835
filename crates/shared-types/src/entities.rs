//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `UserId`, `PeerId`
//! - **Transactions**: `Transaction`, `Args`, `CostTier`
//! - **State Changes**: `Delta`, `DeltaTarget`, `DeltaOp`, `Amount`
//! - **Resync**: `StateExport`, `ModuleExport`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Dynamically typed argument / state value.
pub type Value = serde_json::Value;

/// Transaction arguments, exactly as submitted.
pub type Args = BTreeMap<String, Value>;

/// Signed delta magnitude. Negative magnitudes exist only so they can be rejected.
pub type Amount = i64;

/// Opaque cost tier ("difficulty") threaded through to the propagation layer.
pub type CostTier = u32;

/// Monotonic counter of commits applied to a State Store.
pub type StateVersion = u64;

/// A 32-byte digest.
pub type Hash = [u8; 32];

/// Name of a registered module (e.g. "Seed", "CubeRunner").
pub type ModuleName = String;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Identity of a user of the platform.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identity of a peer node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER B: TRANSACTIONS
// =============================================================================

/// A user-submitted request to run a module handler.
///
/// Immutable once submitted. The same `Transaction` replayed against the same
/// state on any node yields the same result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Module the transaction is routed to.
    pub module: ModuleName,
    /// Handler within that module.
    pub handler: String,
    /// Handler arguments.
    pub args: Args,
    /// Submitting identity.
    pub sender: UserId,
    /// Opaque cost tier, never alters execution.
    pub cost_tier: CostTier,
}

impl Transaction {
    pub fn new(
        module: impl Into<String>,
        handler: impl Into<String>,
        args: Args,
        sender: UserId,
        cost_tier: CostTier,
    ) -> Self {
        Self {
            module: module.into(),
            handler: handler.into(),
            args,
            sender,
            cost_tier,
        }
    }
}

/// Build an `Args` map from a JSON object. Anything other than an object
/// yields empty arguments.
pub fn args_from_json(value: Value) -> Args {
    match value {
        Value::Object(map) => map.into_iter().collect(),
        _ => Args::new(),
    }
}

// =============================================================================
// CLUSTER C: STATE CHANGES
// =============================================================================

/// Direction of a delta. Sign lives here, never in the magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaOp {
    Add,
    Subtract,
}

/// Which record of the transaction's module a delta touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaTarget {
    /// The module-level state blob.
    Module,
    /// One user's per-module state blob.
    User(UserId),
}

/// A single recorded change: `op(target.key[.subkey], amount)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub target: DeltaTarget,
    pub key: String,
    pub subkey: Option<String>,
    pub op: DeltaOp,
    pub amount: Amount,
}

impl Delta {
    /// Dotted path used in logs and error messages, e.g. `alice.allowance.bob`.
    pub fn path(&self) -> String {
        let owner = match &self.target {
            DeltaTarget::Module => "<module>",
            DeltaTarget::User(user) => user.as_str(),
        };
        match &self.subkey {
            Some(subkey) => format!("{owner}.{}.{subkey}", self.key),
            None => format!("{owner}.{}", self.key),
        }
    }
}

// =============================================================================
// CLUSTER D: RESYNC
// =============================================================================

/// Full state of one module, as shipped to a resyncing node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModuleExport {
    pub module_state: Value,
    pub users: BTreeMap<UserId, Value>,
}

/// Full State Store contents at a given version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StateExport {
    pub version: StateVersion,
    pub modules: BTreeMap<ModuleName, ModuleExport>,
}
