//! Memoization of transactions fetched from the index.
//!
//! The cache is a performance aid only: every lookup can be satisfied by the
//! index store, and a miss followed by a fetch leaves the cache holding the
//! same transaction the store returned. Entries are never evicted, so memory
//! grows with the number of distinct transactions the wallet has touched.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tally_core::traits::IndexStore;
use tally_core::types::{Hash256, Transaction};
use tracing::trace;

use crate::error::WalletError;

/// Unbounded `txid → transaction` map shared by sync, valuation and building.
///
/// Writes are permitted from shared callers; concurrent inserts of the same
/// txid store identical data, so last writer wins.
#[derive(Default)]
pub struct TransactionCache {
    entries: RwLock<HashMap<Hash256, Arc<Transaction>>>,
}

impl TransactionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached transaction, if present. Never touches the index.
    pub fn get(&self, txid: &Hash256) -> Option<Arc<Transaction>> {
        self.entries.read().get(txid).cloned()
    }

    /// Store a transaction under `txid`, returning the shared handle.
    pub fn insert(&self, txid: Hash256, tx: Transaction) -> Arc<Transaction> {
        let tx = Arc::new(tx);
        self.entries.write().insert(txid, Arc::clone(&tx));
        tx
    }

    /// Return the cached transaction or fetch it from `index` and cache it.
    pub fn resolve(
        &self,
        txid: &Hash256,
        index: &dyn IndexStore,
    ) -> Result<Arc<Transaction>, WalletError> {
        if let Some(tx) = self.get(txid) {
            return Ok(tx);
        }

        trace!(%txid, "transaction cache miss");
        let tx = index
            .fetch_transaction(txid)?
            .ok_or(WalletError::TransactionNotFound(*txid))?;
        Ok(self.insert(*txid, tx))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for TransactionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCache")
            .field("entries", &self.len())
            .finish()
    }
}
