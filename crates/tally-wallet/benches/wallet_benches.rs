//! Criterion benchmarks for tally-wallet hot paths.
//!
//! Covers: coin selection over large candidate pools, UTXO view
//! synchronization, and full transaction build + sign.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tally_core::address::Address;
use tally_core::crypto::KeyPair;
use tally_core::index::MemoryIndex;
use tally_core::script::Script;
use tally_core::types::{Hash256, OutPoint, Transaction, TxInput, TxOutput};
use tally_wallet::{Candidate, CoinSelector, Wallet, WalletConfig};

/// `n` candidates with distinct pseudo-random values.
fn make_candidates(n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| {
            let h = blake3::hash(&(i as u64).to_le_bytes());
            let bytes = *h.as_bytes();
            let value = u64::from_le_bytes(bytes[..8].try_into().unwrap()) % 10_000_000 + 1;
            Candidate {
                coin: OutPoint {
                    txid: Hash256(bytes),
                    index: 0,
                },
                value,
                address: Address([0x11; 20]),
            }
        })
        .collect()
}

/// Wallet holding one key funded with `n` coins of 1_000_000 units each.
fn funded_wallet(n: u64) -> Wallet {
    let index = Arc::new(MemoryIndex::new());
    let wallet = Wallet::new(index.clone(), WalletConfig::default());
    let addr = wallet.add_key(KeyPair::from_secret_bytes([7; 32]));
    for nonce in 0..n {
        let tx = Transaction {
            version: 1,
            inputs: vec![TxInput::unsigned(OutPoint::null())],
            outputs: vec![TxOutput {
                value: 1_000_000,
                script_pubkey: Script::pay_to_address(&addr),
            }],
            lock_time: nonce,
        };
        index.add_transaction(tx).expect("index add failed");
    }
    wallet.synchronize().expect("sync failed");
    wallet
}

fn bench_coin_selection(c: &mut Criterion) {
    let small = make_candidates(100);
    let large = make_candidates(10_000);
    let selector = CoinSelector::default();

    c.bench_function("select_100_candidates", |b| {
        b.iter(|| selector.select(black_box(&small), 50_000_000))
    });

    c.bench_function("select_10000_candidates", |b| {
        b.iter(|| selector.select(black_box(&large), 5_000_000_000))
    });
}

fn bench_synchronize(c: &mut Criterion) {
    let wallet = funded_wallet(1_000);

    c.bench_function("synchronize_1000_coins", |b| {
        b.iter(|| wallet.synchronize().expect("sync failed"))
    });
}

fn bench_build_transaction(c: &mut Criterion) {
    let wallet = funded_wallet(200);
    let payee = Address([0x99; 20]);

    c.bench_function("build_payment_10_inputs", |b| {
        b.iter(|| {
            wallet
                .build_payment(black_box(payee), 9_000_000, None)
                .expect("build failed")
        })
    });
}

criterion_group!(
    benches,
    bench_coin_selection,
    bench_synchronize,
    bench_build_transaction,
);
criterion_main!(benches);
