//! # Seed Kernel Benchmarks
//!
//! | Component | Operation |
//! |-----------|-----------|
//! | sd-01 State Store | apply a transfer, compute the state root |
//! | sd-04 Transaction Engine | execute and commit a transfer |
//! | shared-types | encode / decode a peer message |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sd_01_state_store::{InMemoryStateStore, StateSnapshot};
use sd_02_execution_context::ChangeContext;
use sd_03_module_registry::ModuleRegistryBuilder;
use sd_04_transaction_engine::{EngineConfig, TransactionEngine};
use seed_modules::{seed_module, SEED_MODULE};
use serde_json::json;
use shared_types::{
    args_from_json, decode_peer_message, encode_peer_message, PeerMessage, Transaction, UserId,
};
use std::sync::Arc;
use uuid::Uuid;

fn funded_snapshot(users: usize) -> StateSnapshot {
    let module = seed_module();
    let mut setup = ChangeContext::new();
    for i in 0..users {
        setup.add(&UserId::from(format!("user-{i}").as_str()), "balance", 1_000_000);
    }
    StateSnapshot::empty()
        .with_module(
            &module.name,
            module.initial_module_state.clone(),
            module.initial_user_state.clone(),
        )
        .and_then(|snapshot| snapshot.apply(SEED_MODULE, setup.deltas()))
        .unwrap()
}

fn transfer(from: &str, to: &str, value: i64) -> Transaction {
    Transaction::new(
        SEED_MODULE,
        "transfer",
        args_from_json(json!({"to": to, "value": value})),
        UserId::from(from),
        0,
    )
}

// ============================================================================
// SD-01: State Store
// ============================================================================

fn bench_state_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("sd-01-state-store");

    for users in [10, 1_000, 10_000] {
        let snapshot = funded_snapshot(users);
        let mut ctx = ChangeContext::new();
        ctx.subtract(&UserId::from("user-0"), "balance", 1)
            .add(&UserId::from("user-1"), "balance", 1);

        group.bench_with_input(BenchmarkId::new("apply_transfer", users), &snapshot, |b, s| {
            b.iter(|| black_box(s.apply(SEED_MODULE, ctx.deltas()).is_ok()))
        });

        group.throughput(Throughput::Elements(users as u64));
        group.bench_with_input(BenchmarkId::new("state_root", users), &snapshot, |b, s| {
            b.iter(|| black_box(s.state_root()))
        });
    }

    group.finish();
}

// ============================================================================
// SD-04: Transaction Engine
// ============================================================================

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("sd-04-transaction-engine");

    let mut builder = ModuleRegistryBuilder::new();
    builder.register(seed_module()).unwrap();
    let engine = TransactionEngine::new(
        EngineConfig::default(),
        builder.build(),
        Arc::new(InMemoryStateStore::new()),
    );
    engine.install_modules().unwrap();
    let mut genesis = ChangeContext::new();
    genesis.add(&UserId::from("A"), "balance", i64::MAX / 2);
    engine.apply_genesis(SEED_MODULE, genesis.deltas()).unwrap();

    group.bench_function("execute_transfer", |b| {
        b.iter(|| black_box(engine.execute(Uuid::new_v4(), transfer("A", "B", 1)).is_ok()))
    });
    group.bench_function("execute_no_op", |b| {
        b.iter(|| black_box(engine.execute(Uuid::new_v4(), transfer("C", "B", 1)).is_err()))
    });

    group.finish();
}

// ============================================================================
// Wire format
// ============================================================================

fn bench_wire(c: &mut Criterion) {
    let mut group = c.benchmark_group("wire");
    let message = PeerMessage::Transaction {
        id: Uuid::new_v4(),
        transaction: transfer("A", "B", 40),
    };
    let encoded = encode_peer_message(&message).unwrap();

    group.bench_function("encode_transaction", |b| {
        b.iter(|| black_box(encode_peer_message(&message).unwrap()))
    });
    group.bench_function("decode_transaction", |b| {
        b.iter(|| black_box(decode_peer_message(&encoded).unwrap()))
    });

    group.finish();
}

criterion_group!(benches, bench_state_store, bench_engine, bench_wire);
criterion_main!(benches);
