//! High-level wallet composition.
//!
//! The [`Wallet`] struct ties together the key registry, the UTXO view, the
//! transaction cache and the collaborators it reads from (index store,
//! script classifier, signer). Hosts create one per wallet and share it by
//! reference; there is no process-global state.
//!
//! Locks are always taken in the order registry → view → cache. Queries and
//! builds hold read locks for their whole duration so they see one snapshot;
//! `synchronize` holds the view write lock across the rebuild and swap.

use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use tally_core::address::Address;
use tally_core::crypto::Ed25519Signer;
use tally_core::script::StandardClassifier;
use tally_core::traits::{IndexStore, ScriptClassifier, TransactionSigner};
use tally_core::types::Transaction;
use tracing::info;

use crate::builder::{Payment, TransactionBuilder};
use crate::cache::TransactionCache;
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::keys::{Key, KeyRegistry};
use crate::utxo::{SyncReport, UtxoView};
use crate::valuation::{UnspentCoin, Valuation, WalletBalance};
use crate::Coin;

/// A wallet over an external transaction index.
pub struct Wallet {
    registry: RwLock<KeyRegistry>,
    view: RwLock<UtxoView>,
    cache: TransactionCache,
    index: Arc<dyn IndexStore>,
    classifier: Box<dyn ScriptClassifier>,
    signer: Box<dyn TransactionSigner>,
    config: WalletConfig,
}

impl Wallet {
    /// Create a wallet with the standard classifier and Ed25519 signer.
    pub fn new(index: Arc<dyn IndexStore>, config: WalletConfig) -> Self {
        Self::with_collaborators(
            index,
            Box::new(StandardClassifier),
            Box::new(Ed25519Signer),
            config,
        )
    }

    pub fn with_collaborators(
        index: Arc<dyn IndexStore>,
        classifier: Box<dyn ScriptClassifier>,
        signer: Box<dyn TransactionSigner>,
        config: WalletConfig,
    ) -> Self {
        Self {
            registry: RwLock::new(KeyRegistry::new()),
            view: RwLock::new(UtxoView::new()),
            cache: TransactionCache::new(),
            index,
            classifier,
            signer,
            config,
        }
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn cache(&self) -> &TransactionCache {
        &self.cache
    }

    // --- Keys ---

    /// Register a key; replaces any key already held for the same address.
    pub fn add_key(&self, key: impl Into<Key>) -> Address {
        let address = self.registry.write().add_key(key);
        info!(%address, "key registered");
        address
    }

    pub fn has_key(&self, address: &Address) -> bool {
        self.registry.read().has_key(address)
    }

    pub fn get_key(&self, address: &Address) -> Result<Key, WalletError> {
        self.registry.read().get_key(address).cloned()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.registry.read().addresses().into_iter().collect()
    }

    // --- View ---

    /// Rebuild the UTXO view from the index.
    ///
    /// Keys added while this runs are picked up by the next call.
    pub fn synchronize(&self) -> Result<SyncReport, WalletError> {
        let addresses = self.registry.read().addresses();
        self.view
            .write()
            .synchronize(&addresses, self.index.as_ref(), &self.cache)
    }

    /// Coins currently in the view, sorted by identity.
    pub fn coins(&self) -> Vec<Coin> {
        self.view.read().sorted()
    }

    fn with_valuation<T>(&self, f: impl FnOnce(&Valuation<'_>) -> T) -> T {
        let registry = self.registry.read();
        let view = self.view.read();
        f(&Valuation {
            registry: &registry,
            view: &view,
            cache: &self.cache,
            index: self.index.as_ref(),
            classifier: self.classifier.as_ref(),
        })
    }

    // --- Valuation ---

    pub fn coin_value(&self, coin: &Coin) -> Result<u64, WalletError> {
        self.with_valuation(|v| v.coin_value(coin))
    }

    pub fn is_spendable(&self, coin: &Coin) -> bool {
        self.with_valuation(|v| v.is_spendable(coin))
    }

    pub fn balance(&self) -> Result<u64, WalletError> {
        self.with_valuation(|v| v.balance())
    }

    pub fn spendable_balance(&self) -> Result<u64, WalletError> {
        self.with_valuation(|v| v.spendable_balance())
    }

    pub fn unspent(&self) -> Result<Vec<UnspentCoin>, WalletError> {
        self.with_valuation(|v| v.unspent())
    }

    pub fn summary(&self) -> Result<WalletBalance, WalletError> {
        self.with_valuation(|v| v.summary())
    }

    // --- Building ---

    /// Build and sign a transaction paying every entry of `payments`.
    ///
    /// The view is not modified; call [`Wallet::synchronize`] once the
    /// transaction has reached the index.
    pub fn build_transaction(
        &self,
        payments: &[Payment],
        change_address: Option<Address>,
    ) -> Result<Transaction, WalletError> {
        self.build_transaction_with_rng(payments, change_address, &mut rand::thread_rng())
    }

    pub fn build_transaction_with_rng<R: Rng + ?Sized>(
        &self,
        payments: &[Payment],
        change_address: Option<Address>,
        rng: &mut R,
    ) -> Result<Transaction, WalletError> {
        let builder = TransactionBuilder::from_config(&self.config);
        self.with_valuation(|v| {
            builder.build_with_rng(payments, change_address, v, self.signer.as_ref(), rng)
        })
    }

    /// Single-payment form of [`Wallet::build_transaction`].
    pub fn build_payment(
        &self,
        destination: Address,
        amount: u64,
        change_address: Option<Address>,
    ) -> Result<Transaction, WalletError> {
        self.build_transaction(&[Payment::new(destination, amount)], change_address)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("keys", &self.registry.read().len())
            .field("coins", &self.view.read().len())
            .field("cached_transactions", &self.cache.len())
            .field("config", &self.config)
            .finish()
    }
}
