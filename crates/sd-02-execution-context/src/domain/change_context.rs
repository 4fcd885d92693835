//! # ChangeContext
//!
//! Write-only accumulator of deltas. Recording never validates: negative
//! magnitudes and unknown keys are caught by the Transaction Engine, which
//! rejects the whole context.

use serde::{Deserialize, Serialize};
use shared_types::{Amount, Delta, DeltaOp, DeltaTarget, UserId};

/// Ordered deltas recorded by one handler invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeContext {
    deltas: Vec<Delta>,
}

impl ChangeContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(
        &mut self,
        target: DeltaTarget,
        key: &str,
        subkey: Option<&str>,
        op: DeltaOp,
        amount: Amount,
    ) -> &mut Self {
        self.deltas.push(Delta {
            target,
            key: key.to_string(),
            subkey: subkey.map(str::to_string),
            op,
            amount,
        });
        self
    }

    // === User state ===

    pub fn add(&mut self, user: &UserId, key: &str, amount: Amount) -> &mut Self {
        self.record(DeltaTarget::User(user.clone()), key, None, DeltaOp::Add, amount)
    }

    pub fn subtract(&mut self, user: &UserId, key: &str, amount: Amount) -> &mut Self {
        self.record(DeltaTarget::User(user.clone()), key, None, DeltaOp::Subtract, amount)
    }

    /// `user.key[subkey] += amount`, e.g. an allowance granted to `subkey`.
    pub fn add_nested(&mut self, user: &UserId, key: &str, subkey: &str, amount: Amount) -> &mut Self {
        self.record(
            DeltaTarget::User(user.clone()),
            key,
            Some(subkey),
            DeltaOp::Add,
            amount,
        )
    }

    pub fn subtract_nested(
        &mut self,
        user: &UserId,
        key: &str,
        subkey: &str,
        amount: Amount,
    ) -> &mut Self {
        self.record(
            DeltaTarget::User(user.clone()),
            key,
            Some(subkey),
            DeltaOp::Subtract,
            amount,
        )
    }

    // === Module state ===

    pub fn add_module(&mut self, key: &str, amount: Amount) -> &mut Self {
        self.record(DeltaTarget::Module, key, None, DeltaOp::Add, amount)
    }

    pub fn subtract_module(&mut self, key: &str, amount: Amount) -> &mut Self {
        self.record(DeltaTarget::Module, key, None, DeltaOp::Subtract, amount)
    }

    pub fn add_module_nested(&mut self, key: &str, subkey: &str, amount: Amount) -> &mut Self {
        self.record(DeltaTarget::Module, key, Some(subkey), DeltaOp::Add, amount)
    }

    pub fn subtract_module_nested(&mut self, key: &str, subkey: &str, amount: Amount) -> &mut Self {
        self.record(DeltaTarget::Module, key, Some(subkey), DeltaOp::Subtract, amount)
    }

    // === Inspection ===

    pub fn deltas(&self) -> &[Delta] {
        &self.deltas
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// An empty context is a legal no-op.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn into_deltas(self) -> Vec<Delta> {
        self.deltas
    }
}
