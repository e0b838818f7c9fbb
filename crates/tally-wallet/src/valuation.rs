//! Coin values, spendability and balances over a UTXO view.
//!
//! [`Valuation`] borrows the registry, view, cache and collaborators for the
//! duration of one query, so every answer is computed against a single
//! consistent snapshot of the wallet.

use serde::Serialize;
use tally_core::address::Address;
use tally_core::traits::{IndexStore, ScriptClassifier};
use tally_core::types::TxOutput;
use tracing::trace;

use crate::cache::TransactionCache;
use crate::coin_selection::Candidate;
use crate::error::WalletError;
use crate::keys::KeyRegistry;
use crate::utxo::UtxoView;
use crate::Coin;

/// One row of the list-unspent query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UnspentCoin {
    pub coin: Coin,
    pub value: u64,
    /// Owner per the locking script; `None` if the script is not standard.
    pub address: Option<Address>,
    pub spendable: bool,
}

/// Wallet balance summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WalletBalance {
    /// Sum over the whole view, watch-only coins included.
    pub total: u64,
    /// Sum over coins the wallet can sign for.
    pub spendable: u64,
    /// Number of coins in the view.
    pub coin_count: usize,
}

/// Read-only valuation queries against one wallet snapshot.
pub struct Valuation<'a> {
    pub registry: &'a KeyRegistry,
    pub view: &'a UtxoView,
    pub cache: &'a TransactionCache,
    pub index: &'a dyn IndexStore,
    pub classifier: &'a dyn ScriptClassifier,
}

impl<'a> Valuation<'a> {
    /// The output a coin refers to, fetching its transaction on a cache miss.
    fn output(&self, coin: &Coin) -> Result<TxOutput, WalletError> {
        let tx = self.cache.resolve(&coin.txid, self.index)?;
        tx.output(coin.index)
            .cloned()
            .ok_or(WalletError::OutputIndexOutOfRange {
                txid: coin.txid,
                index: coin.index,
                len: tx.outputs.len(),
            })
    }

    /// Value of the output `coin` refers to.
    pub fn coin_value(&self, coin: &Coin) -> Result<u64, WalletError> {
        Ok(self.output(coin)?.value)
    }

    /// Whether the wallet can sign for `coin`.
    ///
    /// False for non-standard scripts, addresses with no registered key and
    /// watch-only keys. Lookup failures also answer false.
    pub fn is_spendable(&self, coin: &Coin) -> bool {
        match self.output(coin) {
            Ok(output) => self.owner_if_signable(&output).is_some(),
            Err(err) => {
                trace!(%coin, %err, "spendability lookup failed");
                false
            }
        }
    }

    fn owner_if_signable(&self, output: &TxOutput) -> Option<Address> {
        let address = self.classifier.classify(&output.script_pubkey).ok()?;
        let key = self.registry.get_key(&address).ok()?;
        (!key.is_watch_only()).then_some(address)
    }

    /// Sum of all coin values in the view.
    pub fn balance(&self) -> Result<u64, WalletError> {
        self.view.iter().try_fold(0u64, |acc, coin| {
            add_value(acc, self.coin_value(coin)?)
        })
    }

    /// Sum of the values of spendable coins in the view.
    pub fn spendable_balance(&self) -> Result<u64, WalletError> {
        self.candidates()
            .iter()
            .try_fold(0u64, |acc, c| add_value(acc, c.value))
    }

    /// Every spendable coin with its value and owning address.
    ///
    /// Coins whose output cannot be looked up are not spendable and are
    /// skipped, matching [`Valuation::is_spendable`].
    pub fn candidates(&self) -> Vec<Candidate> {
        self.view
            .iter()
            .filter_map(|coin| {
                let output = self.output(coin).ok()?;
                let address = self.owner_if_signable(&output)?;
                Some(Candidate {
                    coin: *coin,
                    value: output.value,
                    address,
                })
            })
            .collect()
    }

    /// The view's coins sorted by identity.
    pub fn unspent(&self) -> Result<Vec<UnspentCoin>, WalletError> {
        self.view
            .sorted()
            .into_iter()
            .map(|coin| {
                let output = self.output(&coin)?;
                Ok(UnspentCoin {
                    coin,
                    value: output.value,
                    address: self.classifier.classify(&output.script_pubkey).ok(),
                    spendable: self.owner_if_signable(&output).is_some(),
                })
            })
            .collect()
    }

    pub fn summary(&self) -> Result<WalletBalance, WalletError> {
        let rows = self.unspent()?;
        let mut balance = WalletBalance {
            coin_count: rows.len(),
            ..WalletBalance::default()
        };
        for row in &rows {
            balance.total = add_value(balance.total, row.value)?;
            if row.spendable {
                balance.spendable = add_value(balance.spendable, row.value)?;
            }
        }
        Ok(balance)
    }
}

fn add_value(acc: u64, value: u64) -> Result<u64, WalletError> {
    acc.checked_add(value)
        .ok_or_else(|| WalletError::InvalidAmount("balance overflows".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tally_core::crypto::KeyPair;
    use tally_core::index::MemoryIndex;
    use tally_core::script::{Script, StandardClassifier};
    use tally_core::types::{Hash256, OutPoint, Transaction, TxInput};

    struct Fixture {
        registry: KeyRegistry,
        view: UtxoView,
        cache: TransactionCache,
        index: MemoryIndex,
        funding: Hash256,
    }

    impl Fixture {
        /// Outputs: 0 → signing key (300), 1 → watch-only key (200),
        /// 2 → unregistered address (100), 3 → non-standard script (50).
        fn new() -> Self {
            let signing = KeyPair::from_secret_bytes([1; 32]);
            let watch = KeyPair::from_secret_bytes([2; 32]).public_key();
            let stranger = KeyPair::from_secret_bytes([3; 32]).public_key();

            let mut registry = KeyRegistry::new();
            let a = registry.add_key(signing);
            let b = registry.add_key(watch);

            let tx = Transaction {
                version: 1,
                inputs: vec![TxInput::unsigned(OutPoint::null())],
                outputs: vec![
                    TxOutput { value: 300, script_pubkey: Script::pay_to_address(&a) },
                    TxOutput { value: 200, script_pubkey: Script::pay_to_address(&b) },
                    TxOutput { value: 100, script_pubkey: Script::pay_to_pubkey(&stranger) },
                    TxOutput { value: 50, script_pubkey: Script(vec![0x6a, 0x01]) },
                ],
                lock_time: 0,
            };
            let index = MemoryIndex::new();
            let funding = index.add_transaction(tx).unwrap().txid;

            let cache = TransactionCache::new();
            let mut view = UtxoView::new();
            let addresses: BTreeSet<_> = registry.addresses();
            view.synchronize(&addresses, &index, &cache).unwrap();

            Self { registry, view, cache, index, funding }
        }

        fn valuation(&self) -> Valuation<'_> {
            Valuation {
                registry: &self.registry,
                view: &self.view,
                cache: &self.cache,
                index: &self.index,
                classifier: &StandardClassifier,
            }
        }

        fn coin(&self, index: u64) -> Coin {
            OutPoint { txid: self.funding, index }
        }
    }

    #[test]
    fn balance_includes_watch_only() {
        let f = Fixture::new();
        let v = f.valuation();
        assert_eq!(f.view.len(), 2);
        assert_eq!(v.balance().unwrap(), 500);
        assert_eq!(v.spendable_balance().unwrap(), 300);
    }

    #[test]
    fn spendability_rules() {
        let f = Fixture::new();
        let v = f.valuation();
        assert!(v.is_spendable(&f.coin(0)));
        assert!(!v.is_spendable(&f.coin(1)));
        assert!(!v.is_spendable(&f.coin(2)));
        assert!(!v.is_spendable(&f.coin(3)));
        // Out of range and unknown transactions answer false, never error.
        assert!(!v.is_spendable(&f.coin(9)));
        assert!(!v.is_spendable(&OutPoint { txid: Hash256([0xaa; 32]), index: 0 }));
    }

    #[test]
    fn coin_value_errors() {
        let f = Fixture::new();
        let v = f.valuation();
        assert_eq!(v.coin_value(&f.coin(2)).unwrap(), 100);
        assert_eq!(
            v.coin_value(&f.coin(4)).unwrap_err(),
            WalletError::OutputIndexOutOfRange { txid: f.funding, index: 4, len: 4 }
        );
        let ghost = Hash256([0xbb; 32]);
        assert_eq!(
            v.coin_value(&OutPoint { txid: ghost, index: 0 }).unwrap_err(),
            WalletError::TransactionNotFound(ghost)
        );
    }

    #[test]
    fn unspent_rows_sorted_and_flagged() {
        let f = Fixture::new();
        let rows = f.valuation().unspent().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].coin, f.coin(0));
        assert!(rows[0].spendable);
        assert_eq!(rows[1].value, 200);
        assert!(!rows[1].spendable);
        assert!(rows[1].address.is_some());
    }

    #[test]
    fn summary_matches_queries() {
        let f = Fixture::new();
        let v = f.valuation();
        let s = v.summary().unwrap();
        assert_eq!(s.total, v.balance().unwrap());
        assert_eq!(s.spendable, v.spendable_balance().unwrap());
        assert_eq!(s.coin_count, 2);
    }

    #[test]
    fn overflowing_balance_is_an_error() {
        let mut registry = KeyRegistry::new();
        let a = registry.add_key(KeyPair::from_secret_bytes([1; 32]));
        let tx = Transaction {
            version: 1,
            inputs: vec![TxInput::unsigned(OutPoint::null())],
            outputs: vec![
                TxOutput { value: u64::MAX, script_pubkey: Script::pay_to_address(&a) },
                TxOutput { value: 1, script_pubkey: Script::pay_to_address(&a) },
            ],
            lock_time: 0,
        };
        let index = MemoryIndex::new();
        index.add_transaction(tx).unwrap();
        let cache = TransactionCache::new();
        let mut view = UtxoView::new();
        view.synchronize(&registry.addresses(), &index, &cache).unwrap();

        let v = Valuation {
            registry: &registry,
            view: &view,
            cache: &cache,
            index: &index,
            classifier: &StandardClassifier,
        };
        assert!(matches!(v.balance(), Err(WalletError::InvalidAmount(_))));
        assert!(matches!(v.spendable_balance(), Err(WalletError::InvalidAmount(_))));
        assert!(matches!(v.summary(), Err(WalletError::InvalidAmount(_))));
    }

    #[test]
    fn candidates_carry_owner() {
        let f = Fixture::new();
        let candidates = f.valuation().candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].coin, f.coin(0));
        assert_eq!(candidates[0].value, 300);
        assert!(f.registry.has_key(&candidates[0].address));
    }
}
