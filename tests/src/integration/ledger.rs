//! # Ledger Scenarios
//!
//! Commit semantics seen from a submitter: whole ChangeContexts or nothing,
//! SEED conservation under concurrent submitters, business-rule no-ops and
//! allowance enforcement.

#[cfg(test)]
mod tests {
    use crate::integration::support::{balance, standalone, sum_of_balances};
    use node_runtime::{GenesisConfig, SeedNode};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use sd_01_state_store::ModuleView;
    use sd_02_execution_context::{ChangeContext, Container};
    use sd_03_module_registry::{required_str, GetterError, ModuleDefinition};
    use seed_modules::{builtin_modules, SEED_MODULE};
    use serde_json::{json, Value};
    use shared_types::{Args, ErrorKind, UserId};
    use std::sync::Arc;

    // =========================================================================
    // FIXTURES
    // =========================================================================

    /// Credits `to` before debiting the sender, without checking funds.
    fn careless_pay(container: &Container, mut ctx: ChangeContext) -> ChangeContext {
        if let Some(to) = container.arg_user("to") {
            ctx.add(&to, "balance", 5)
                .subtract(container.sender(), "balance", 5);
        }
        ctx
    }

    fn mint(container: &Container, mut ctx: ChangeContext) -> ChangeContext {
        ctx.add(container.sender(), "balance", 10);
        ctx
    }

    fn balance_of(view: &ModuleView, args: &Args) -> Result<Value, GetterError> {
        let user = UserId::from(required_str(args, "user")?);
        Ok(view.user(&user).get("balance").cloned().unwrap_or(json!(0)))
    }

    fn careless_module() -> ModuleDefinition {
        ModuleDefinition::new("Careless", "1")
            .with_module_state(json!({}))
            .with_user_state(json!({"balance": 0}))
            .with_handler("pay", careless_pay)
            .with_handler("mint", mint)
            .with_getter("balanceOf", balance_of)
    }

    fn devnet_genesis() -> GenesisConfig {
        GenesisConfig::empty().with_balance("A", 100).with_balance("B", 0)
    }

    // =========================================================================
    // TESTS
    // =========================================================================

    #[tokio::test]
    async fn test_partially_invalid_change_context_leaves_state_untouched() {
        let mut modules = builtin_modules();
        modules.push(careless_module());
        let node = SeedNode::boot(Default::default(), modules, &GenesisConfig::empty())
            .await
            .unwrap();

        let version = node.state_version();
        let root = node.state_root_hex();
        let receipt = node
            .submit("Careless", "pay", json!({"to": "B"}), "A", 0)
            .await
            .unwrap();

        assert!(!receipt.committed);
        assert_eq!(receipt.reason, Some(ErrorKind::InsufficientFunds));
        assert_eq!(node.state_version(), version);
        assert_eq!(node.state_root_hex(), root);
        assert_eq!(
            node.query_json("Careless", "balanceOf", json!({"user": "B"})).unwrap(),
            json!(0)
        );

        // Once A can cover it, the same handler commits both deltas.
        assert!(node.submit("Careless", "mint", Value::Null, "A", 0).await.unwrap().committed);
        assert!(node.submit("Careless", "pay", json!({"to": "B"}), "A", 0).await.unwrap().committed);
        assert_eq!(
            node.query_json("Careless", "balanceOf", json!({"user": "B"})).unwrap(),
            json!(5)
        );
        node.shutdown();
    }

    #[tokio::test]
    async fn test_transfer_scenario_then_no_op() {
        let node = standalone(&devnet_genesis()).await;

        let receipt = node
            .submit(SEED_MODULE, "transfer", json!({"to": "B", "value": 40}), "A", 0)
            .await
            .unwrap();
        assert!(receipt.committed);
        assert_eq!(receipt.deltas_applied, 2);
        assert_eq!((balance(&node, "A"), balance(&node, "B")), (60, 40));

        let version = node.state_version();
        let receipt = node
            .submit(SEED_MODULE, "transfer", json!({"to": "B", "value": 1000}), "A", 0)
            .await
            .unwrap();
        assert_eq!(receipt.reason, Some(ErrorKind::NoOp));
        assert_eq!(receipt.state_version, version);
        assert_eq!((balance(&node, "A"), balance(&node, "B")), (60, 40));
        node.shutdown();
    }

    #[tokio::test]
    async fn test_routing_errors_reported() {
        let node = standalone(&devnet_genesis()).await;

        let unknown_module = node.submit("Gold", "transfer", json!({}), "A", 0).await.unwrap();
        assert_eq!(unknown_module.reason, Some(ErrorKind::UnknownModule));

        let unknown_handler = node.submit(SEED_MODULE, "mint", json!({}), "A", 0).await.unwrap();
        assert_eq!(unknown_handler.reason, Some(ErrorKind::UnknownHandler));

        assert!(node.query_json(SEED_MODULE, "getBalance", json!({})).is_err());
        assert!(node.query_json(SEED_MODULE, "getKarma", Value::Null).is_err());
        node.shutdown();
    }

    #[tokio::test]
    async fn test_allowance_enforced() {
        let node = standalone(&devnet_genesis()).await;
        let spend = |value: i64| {
            json!({"from": "A", "to": "C", "value": value})
        };

        // No allowance yet.
        let receipt = node.submit(SEED_MODULE, "transferFrom", spend(10), "B", 0).await.unwrap();
        assert_eq!(receipt.reason, Some(ErrorKind::NoOp));

        let receipt = node
            .submit(SEED_MODULE, "approve", json!({"spender": "B", "value": 30}), "A", 0)
            .await
            .unwrap();
        assert!(receipt.committed);

        assert!(node.submit(SEED_MODULE, "transferFrom", spend(20), "B", 0).await.unwrap().committed);
        assert_eq!(
            node.query_json(SEED_MODULE, "getAllowance", json!({"owner": "A", "spender": "B"}))
                .unwrap(),
            json!(10)
        );

        // Over the remaining allowance; the balance alone would cover it.
        let receipt = node.submit(SEED_MODULE, "transferFrom", spend(11), "B", 0).await.unwrap();
        assert_eq!(receipt.reason, Some(ErrorKind::NoOp));

        // Only B was approved.
        let receipt = node.submit(SEED_MODULE, "transferFrom", spend(1), "C", 0).await.unwrap();
        assert_eq!(receipt.reason, Some(ErrorKind::NoOp));

        assert_eq!(
            (balance(&node, "A"), balance(&node, "B"), balance(&node, "C")),
            (80, 0, 20)
        );
        node.shutdown();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transfers_conserve_supply() {
        let users = ["A", "B", "C", "D", "E"];
        let genesis = users
            .iter()
            .fold(GenesisConfig::empty(), |config, user| config.with_balance(user, 100));
        let node = Arc::new(standalone(&genesis).await);
        let start_version = node.state_version();

        let mut tasks = Vec::new();
        for seed in 0..8u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let transfers: Vec<(usize, usize, i64)> = (0..50)
                .map(|_| (rng.gen_range(0..5), rng.gen_range(0..5), rng.gen_range(1..=60)))
                .collect();
            let node = Arc::clone(&node);
            tasks.push(tokio::spawn(async move {
                let mut committed = 0u64;
                for (from, to, value) in transfers {
                    let receipt = node
                        .submit(
                            SEED_MODULE,
                            "transfer",
                            json!({"to": users[to], "value": value}),
                            users[from],
                            0,
                        )
                        .await
                        .unwrap();
                    committed += u64::from(receipt.committed);
                }
                committed
            }));
        }

        let mut committed = 0;
        for task in tasks {
            committed += task.await.unwrap();
        }

        assert_eq!(sum_of_balances(&node), 500);
        assert_eq!(
            node.query_json(SEED_MODULE, "getTotalSupply", Value::Null).unwrap(),
            json!(500)
        );
        assert_eq!(node.state_version(), start_version + committed);
        assert!(users.iter().all(|user| balance(&node, user) >= 0));
        node.shutdown();
    }
}
