//! Shared test helpers for integration and property tests.

use std::sync::Arc;

use tally_core::address::Address;
use tally_core::crypto::KeyPair;
use tally_core::index::MemoryIndex;
use tally_core::script::Script;
use tally_core::types::*;
use tally_wallet::{Wallet, WalletConfig};

/// Deterministic keypair from a seed byte.
pub fn keypair(seed: u8) -> KeyPair {
    KeyPair::from_secret_bytes([seed; 32])
}

/// Address not controlled by any test key.
pub fn foreign_address(seed: u8) -> Address {
    Address([seed; 20])
}

/// Create a coinbase transaction paying `value` to `to`.
///
/// `nonce` goes into `lock_time` so otherwise identical funding
/// transactions get distinct txids.
pub fn make_funding(to: &Address, value: u64, nonce: u64) -> Transaction {
    make_funding_multi(to, &[value], nonce)
}

/// Coinbase transaction with one output to `to` per value.
pub fn make_funding_multi(to: &Address, values: &[u64], nonce: u64) -> Transaction {
    Transaction {
        version: 1,
        inputs: vec![TxInput::unsigned(OutPoint::null())],
        outputs: values
            .iter()
            .map(|&value| TxOutput {
                value,
                script_pubkey: Script::pay_to_address(to),
            })
            .collect(),
        lock_time: nonce,
    }
}

/// Unsigned transaction spending `inputs` into the given `(value, address)` outputs.
pub fn make_spend(inputs: &[OutPoint], outputs: &[(u64, Address)]) -> Transaction {
    Transaction {
        version: 1,
        inputs: inputs.iter().copied().map(TxInput::unsigned).collect(),
        outputs: outputs
            .iter()
            .map(|(value, to)| TxOutput {
                value: *value,
                script_pubkey: Script::pay_to_address(to),
            })
            .collect(),
        lock_time: 0,
    }
}

/// A wallet over a fresh shared index.
pub fn test_wallet(config: WalletConfig) -> (Wallet, Arc<MemoryIndex>) {
    let index = Arc::new(MemoryIndex::new());
    let wallet = Wallet::new(index.clone(), config);
    (wallet, index)
}

/// Wallet with a single signing key and one funding coin per value, synchronized.
pub fn funded_wallet(values: &[u64]) -> (Wallet, Arc<MemoryIndex>, Address) {
    let (wallet, index) = test_wallet(WalletConfig::default());
    let addr = wallet.add_key(keypair(1));
    for (nonce, &value) in values.iter().enumerate() {
        index
            .add_transaction(make_funding(&addr, value, nonce as u64))
            .expect("funding transaction indexes");
    }
    wallet.synchronize().expect("synchronize succeeds");
    (wallet, index, addr)
}
