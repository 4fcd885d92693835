//! # Container
//!
//! Read-only view handed to a handler for the duration of one transaction.

use sd_01_state_store::{ModuleData, StateSnapshot};
use serde_json::Value;
use shared_types::{Amount, Args, CostTier, StateVersion, Transaction, UserId};
use std::borrow::Cow;
use std::sync::Arc;

static NO_STATE: Value = Value::Null;

/// Arguments and state as of the transaction's start.
///
/// Built by the Transaction Engine. The snapshot is pinned: commits that
/// land while the handler runs are not visible through it.
#[derive(Clone, Debug)]
pub struct Container {
    snapshot: Arc<StateSnapshot>,
    module: String,
    args: Args,
    sender: UserId,
    cost_tier: CostTier,
}

impl Container {
    pub fn new(snapshot: Arc<StateSnapshot>, transaction: &Transaction) -> Self {
        Self {
            snapshot,
            module: transaction.module.clone(),
            args: transaction.args.clone(),
            sender: transaction.sender.clone(),
            cost_tier: transaction.cost_tier,
        }
    }

    // === Transaction ===

    /// Module the transaction was routed to.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn sender(&self) -> &UserId {
        &self.sender
    }

    pub fn cost_tier(&self) -> CostTier {
        self.cost_tier
    }

    /// The pinned snapshot itself.
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Version of the pinned snapshot.
    pub fn version(&self) -> StateVersion {
        self.snapshot.version()
    }

    // === Arguments ===

    /// Arguments exactly as submitted.
    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }

    /// Integer argument. No coercion: `"5"` is not `5`.
    pub fn arg_i64(&self, key: &str) -> Option<i64> {
        self.arg(key).and_then(Value::as_i64)
    }

    pub fn arg_str(&self, key: &str) -> Option<&str> {
        self.arg(key).and_then(Value::as_str)
    }

    /// String argument interpreted as a user identity.
    pub fn arg_user(&self, key: &str) -> Option<UserId> {
        self.arg_str(key).map(UserId::from)
    }

    // === State ===

    /// Per-user record of any installed module. Users without a record get
    /// the module's template; the materialisation is not stored.
    pub fn get_user_data(&self, module: &str, user: &UserId) -> Option<Cow<'_, Value>> {
        self.snapshot.user_data(module, user)
    }

    /// Module-level state of this transaction's module.
    pub fn module_state(&self) -> &Value {
        self.snapshot
            .module_state(&self.module)
            .unwrap_or(&NO_STATE)
    }

    /// Integer field of this module's state; absent or non-integer reads as 0.
    pub fn module_i64(&self, key: &str) -> Amount {
        self.module_state()
            .get(key)
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    /// Entry `key.subkey` of this module's state; missing entries read as 0.
    pub fn module_nested_i64(&self, key: &str, subkey: &str) -> Amount {
        self.module_state()
            .get(key)
            .and_then(|map| map.get(subkey))
            .and_then(Value::as_i64)
            .unwrap_or(0)
    }

    /// Integer field of `user`'s record in this module.
    pub fn user_i64(&self, user: &UserId, key: &str) -> Amount {
        self.get_user_data(&self.module, user)
            .and_then(|record| record.get(key).and_then(Value::as_i64))
            .unwrap_or(0)
    }

    /// Entry `key.subkey` of `user`'s record in this module, e.g. an allowance.
    pub fn user_nested_i64(&self, user: &UserId, key: &str, subkey: &str) -> Amount {
        self.get_user_data(&self.module, user)
            .and_then(|record| {
                record
                    .get(key)
                    .and_then(|map| map.get(subkey))
                    .and_then(Value::as_i64)
            })
            .unwrap_or(0)
    }

    /// Users of this module with a materialised record.
    pub fn users(&self) -> impl Iterator<Item = (&UserId, &Value)> {
        self.snapshot
            .module(&self.module)
            .map(|data: &ModuleData| data.users.iter())
            .into_iter()
            .flatten()
    }
}
