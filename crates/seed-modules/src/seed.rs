//! # Seed
//!
//! The SEED currency. Module state holds `totalSupply`, `symbol` and
//! `decimals`; each user has a `balance` and an `allowance` map from spender
//! to the amount that spender may move out of the user's balance.
//!
//! | Handler | Arguments | Commits when |
//! |---------|-----------|--------------|
//! | `transfer` | `to`, `value` | `0 < value <= balance(sender)` |
//! | `transferFrom` | `from`, `to`, `value` | `0 < value <= balance(from)` and `value <= allowance(from, sender)` |
//! | `approve` | `spender`, `value` | `value >= 0` and differs from the current allowance |
//! | `increaseAllowance` | `spender`, `value` | `value > 0` |
//! | `decreaseAllowance` | `spender`, `value` | `0 < value <= allowance(sender, spender)` |
//!
//! The acting user is always `container.sender()`; an argument named
//! `sender` is ignored.

use sd_01_state_store::ModuleView;
use sd_02_execution_context::{ChangeContext, Container};
use sd_03_module_registry::{required_str, GetterError, ModuleDefinition};
use serde_json::{json, Map, Value};
use shared_types::{Amount, Args, UserId};

pub const SEED_MODULE: &str = "Seed";
pub const SEED_VERSION: &str = "1";

const BALANCE: &str = "balance";
const ALLOWANCE: &str = "allowance";

pub fn seed_module() -> ModuleDefinition {
    ModuleDefinition::new(SEED_MODULE, SEED_VERSION)
        .with_module_state(json!({
            "totalSupply": 0,
            "symbol": "SEED",
            "decimals": 4,
        }))
        .with_user_state(json!({
            "balance": 0,
            "allowance": {},
        }))
        .with_handler("transfer", transfer)
        .with_handler("transferFrom", transfer_from)
        .with_handler("approve", approve)
        .with_handler("increaseAllowance", increase_allowance)
        .with_handler("decreaseAllowance", decrease_allowance)
        .with_getter("getBalance", get_balance)
        .with_getter("getAllowance", get_allowance)
        .with_getter("getTotalSupply", get_total_supply)
        .with_getter("getSymbol", get_symbol)
        .with_getter("getDecimals", get_decimals)
        .with_getter("getAllBalances", get_all_balances)
}

/// `value` argument, if present and strictly positive.
fn positive_value(container: &Container) -> Option<Amount> {
    container.arg_i64("value").filter(|value| *value > 0)
}

// =============================================================================
// HANDLERS
// =============================================================================

fn transfer(container: &Container, mut ctx: ChangeContext) -> ChangeContext {
    let (Some(to), Some(value)) = (container.arg_user("to"), positive_value(container)) else {
        return ctx;
    };
    let sender = container.sender();

    if container.user_i64(sender, BALANCE) >= value {
        ctx.subtract(sender, BALANCE, value).add(&to, BALANCE, value);
    }
    ctx
}

fn transfer_from(container: &Container, mut ctx: ChangeContext) -> ChangeContext {
    let (Some(from), Some(to), Some(value)) = (
        container.arg_user("from"),
        container.arg_user("to"),
        positive_value(container),
    ) else {
        return ctx;
    };
    let sender = container.sender();
    let balance = container.user_i64(&from, BALANCE);
    let allowance = container.user_nested_i64(&from, ALLOWANCE, sender.as_str());

    if balance >= value && allowance >= value {
        ctx.subtract(&from, BALANCE, value)
            .subtract_nested(&from, ALLOWANCE, sender.as_str(), value)
            .add(&to, BALANCE, value);
    }
    ctx
}

/// Sets the allowance to exactly `value`, expressed as the difference from
/// the current allowance.
fn approve(container: &Container, mut ctx: ChangeContext) -> ChangeContext {
    let (Some(spender), Some(value)) = (container.arg_str("spender"), container.arg_i64("value"))
    else {
        return ctx;
    };
    if value < 0 {
        return ctx;
    }
    let owner = container.sender();
    let current = container.user_nested_i64(owner, ALLOWANCE, spender);

    if value > current {
        ctx.add_nested(owner, ALLOWANCE, spender, value - current);
    } else if value < current {
        ctx.subtract_nested(owner, ALLOWANCE, spender, current - value);
    }
    ctx
}

fn increase_allowance(container: &Container, mut ctx: ChangeContext) -> ChangeContext {
    if let (Some(spender), Some(value)) = (container.arg_str("spender"), positive_value(container)) {
        ctx.add_nested(container.sender(), ALLOWANCE, spender, value);
    }
    ctx
}

fn decrease_allowance(container: &Container, mut ctx: ChangeContext) -> ChangeContext {
    let (Some(spender), Some(value)) = (container.arg_str("spender"), positive_value(container))
    else {
        return ctx;
    };
    let owner = container.sender();
    if container.user_nested_i64(owner, ALLOWANCE, spender) >= value {
        ctx.subtract_nested(owner, ALLOWANCE, spender, value);
    }
    ctx
}

// =============================================================================
// GETTERS
// =============================================================================

fn balance_of(view: &ModuleView, user: &UserId) -> Value {
    view.user(user).get(BALANCE).cloned().unwrap_or(json!(0))
}

fn get_balance(view: &ModuleView, args: &Args) -> Result<Value, GetterError> {
    let user = UserId::from(required_str(args, "user")?);
    Ok(balance_of(view, &user))
}

fn get_allowance(view: &ModuleView, args: &Args) -> Result<Value, GetterError> {
    let owner = UserId::from(required_str(args, "owner")?);
    let spender = required_str(args, "spender")?;
    Ok(view
        .user(&owner)
        .get(ALLOWANCE)
        .and_then(|allowances| allowances.get(spender))
        .cloned()
        .unwrap_or(json!(0)))
}

fn module_field(view: &ModuleView, key: &str) -> Value {
    view.module_state().get(key).cloned().unwrap_or(Value::Null)
}

fn get_total_supply(view: &ModuleView, _args: &Args) -> Result<Value, GetterError> {
    Ok(module_field(view, "totalSupply"))
}

fn get_symbol(view: &ModuleView, _args: &Args) -> Result<Value, GetterError> {
    Ok(module_field(view, "symbol"))
}

fn get_decimals(view: &ModuleView, _args: &Args) -> Result<Value, GetterError> {
    Ok(module_field(view, "decimals"))
}

/// `{user: balance}` for every user with a record.
fn get_all_balances(view: &ModuleView, _args: &Args) -> Result<Value, GetterError> {
    let balances: Map<String, Value> = view
        .users()
        .map(|(user, _)| (user.to_string(), balance_of(view, user)))
        .collect();
    Ok(Value::Object(balances))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{run, snapshot};
    use sd_01_state_store::StateSnapshot;
    use shared_types::{Delta, DeltaOp, DeltaTarget};
    use std::sync::Arc;

    fn funded(balances: &[(&str, Amount)]) -> (ModuleDefinition, Arc<StateSnapshot>) {
        let module = seed_module();
        let mut setup = ChangeContext::new();
        for (user, amount) in balances {
            setup.add(&UserId::from(*user), BALANCE, *amount);
        }
        let snapshot = snapshot(&module, setup.deltas());
        (module, snapshot)
    }

    fn user_delta(user: &str, key: &str, subkey: Option<&str>, op: DeltaOp, amount: Amount) -> Delta {
        Delta {
            target: DeltaTarget::User(UserId::from(user)),
            key: key.into(),
            subkey: subkey.map(str::to_string),
            op,
            amount,
        }
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (module, snapshot) = funded(&[("A", 100)]);
        let ctx = run(&module, &snapshot, "transfer", "A", json!({"to": "B", "value": 40}));

        assert_eq!(
            ctx.deltas(),
            &[
                user_delta("A", BALANCE, None, DeltaOp::Subtract, 40),
                user_delta("B", BALANCE, None, DeltaOp::Add, 40),
            ]
        );
    }

    #[test]
    fn test_transfer_insufficient_balance_is_no_op() {
        let (module, snapshot) = funded(&[("A", 60)]);
        let ctx = run(&module, &snapshot, "transfer", "A", json!({"to": "B", "value": 1000}));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_transfer_rejects_non_positive_and_missing_args() {
        let (module, snapshot) = funded(&[("A", 60)]);
        for args in [
            json!({"to": "B", "value": 0}),
            json!({"to": "B", "value": -5}),
            json!({"to": "B", "value": "5"}),
            json!({"value": 5}),
        ] {
            assert!(run(&module, &snapshot, "transfer", "A", args).is_empty());
        }
    }

    #[test]
    fn test_transfer_ignores_sender_argument() {
        let (module, snapshot) = funded(&[("A", 100)]);
        // B tries to spend A's balance by naming A as sender.
        let ctx = run(
            &module,
            &snapshot,
            "transfer",
            "B",
            json!({"sender": "A", "to": "B", "value": 10}),
        );
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let module = seed_module();
        let mut setup = ChangeContext::new();
        setup
            .add(&UserId::from("A"), BALANCE, 100)
            .add_nested(&UserId::from("A"), ALLOWANCE, "S", 30);
        let snapshot = snapshot(&module, setup.deltas());

        let over = run(
            &module,
            &snapshot,
            "transferFrom",
            "S",
            json!({"from": "A", "to": "C", "value": 31}),
        );
        assert!(over.is_empty());

        let ok = run(
            &module,
            &snapshot,
            "transferFrom",
            "S",
            json!({"from": "A", "to": "C", "value": 30}),
        );
        assert_eq!(
            ok.deltas(),
            &[
                user_delta("A", BALANCE, None, DeltaOp::Subtract, 30),
                user_delta("A", ALLOWANCE, Some("S"), DeltaOp::Subtract, 30),
                user_delta("C", BALANCE, None, DeltaOp::Add, 30),
            ]
        );

        // Someone without an allowance gets nothing.
        let stranger = run(
            &module,
            &snapshot,
            "transferFrom",
            "T",
            json!({"from": "A", "to": "T", "value": 1}),
        );
        assert!(stranger.is_empty());
    }

    #[test]
    fn test_approve_sets_exact_allowance() {
        let module = seed_module();
        let mut setup = ChangeContext::new();
        setup.add_nested(&UserId::from("A"), ALLOWANCE, "S", 50);
        let snapshot = snapshot(&module, setup.deltas());

        let lower = run(&module, &snapshot, "approve", "A", json!({"spender": "S", "value": 20}));
        assert_eq!(
            lower.deltas(),
            &[user_delta("A", ALLOWANCE, Some("S"), DeltaOp::Subtract, 30)]
        );

        let higher = run(&module, &snapshot, "approve", "A", json!({"spender": "S", "value": 80}));
        assert_eq!(
            higher.deltas(),
            &[user_delta("A", ALLOWANCE, Some("S"), DeltaOp::Add, 30)]
        );

        let same = run(&module, &snapshot, "approve", "A", json!({"spender": "S", "value": 50}));
        assert!(same.is_empty());
    }

    #[test]
    fn test_decrease_allowance_below_zero_is_no_op() {
        let module = seed_module();
        let mut setup = ChangeContext::new();
        setup.add_nested(&UserId::from("A"), ALLOWANCE, "S", 5);
        let snapshot = snapshot(&module, setup.deltas());

        let too_much = run(
            &module,
            &snapshot,
            "decreaseAllowance",
            "A",
            json!({"spender": "S", "value": 6}),
        );
        assert!(too_much.is_empty());

        let increase = run(
            &module,
            &snapshot,
            "increaseAllowance",
            "A",
            json!({"spender": "S", "value": 6}),
        );
        assert_eq!(increase.len(), 1);
    }

    #[test]
    fn test_getters() {
        let module = seed_module();
        let mut setup = ChangeContext::new();
        setup
            .add(&UserId::from("A"), BALANCE, 60)
            .add(&UserId::from("B"), BALANCE, 40)
            .add_nested(&UserId::from("A"), ALLOWANCE, "B", 7)
            .add_module("totalSupply", 100);
        let snapshot = snapshot(&module, setup.deltas());
        let view = ModuleView::new(snapshot, SEED_MODULE).unwrap();
        let query = |getter: &str, args: Value| {
            module.getters[getter].query(&view, &shared_types::args_from_json(args))
        };

        assert_eq!(query("getBalance", json!({"user": "A"})).unwrap(), json!(60));
        assert_eq!(query("getBalance", json!({"user": "nobody"})).unwrap(), json!(0));
        assert_eq!(
            query("getAllowance", json!({"owner": "A", "spender": "B"})).unwrap(),
            json!(7)
        );
        assert_eq!(query("getTotalSupply", json!({})).unwrap(), json!(100));
        assert_eq!(query("getSymbol", json!({})).unwrap(), json!("SEED"));
        assert_eq!(query("getDecimals", json!({})).unwrap(), json!(4));
        assert_eq!(
            query("getAllBalances", json!({})).unwrap(),
            json!({"A": 60, "B": 40})
        );
        assert!(matches!(
            query("getBalance", json!({})),
            Err(GetterError::MissingArgument(_))
        ));
    }
}
