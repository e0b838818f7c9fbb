//! In-memory address index.
//!
//! [`MemoryIndex`] implements [`IndexStore`] by deriving the per-address
//! receive and spend entries as transactions are appended. It is the
//! reference store for tests and the command-line host; a node backs the
//! same trait with its on-disk transaction database.
//!
//! Outputs whose locking script is not a standard pattern are stored but not
//! indexed under any address. Inputs are attributed to the address of the
//! output they consume, which must already be in the index; inputs spending
//! unknown outputs are stored but not indexed.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::address::Address;
use crate::error::TallyError;
use crate::traits::IndexStore;
use crate::types::{Hash256, InputRef, OutPoint, Transaction};

/// Result of appending one transaction to the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedTransaction {
    /// ID of the appended transaction.
    pub txid: Hash256,
    /// Number of outputs recorded as received by some address.
    pub outputs_indexed: usize,
    /// Number of inputs recorded as spending from some address.
    pub inputs_indexed: usize,
}

#[derive(Default)]
struct IndexInner {
    /// Full transactions by ID.
    transactions: HashMap<Hash256, Transaction>,
    /// Address → outputs paying it.
    received: HashMap<Address, HashSet<OutPoint>>,
    /// Address → inputs consuming one of its outputs.
    spent_by: HashMap<Address, HashSet<InputRef>>,
}

/// Append-only in-memory transaction store with an address index.
///
/// Interior locking lets a shared handle keep growing while wallets read it.
#[derive(Default)]
pub struct MemoryIndex {
    inner: RwLock<IndexInner>,
}

impl MemoryIndex {
    /// Create a new empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored transactions.
    pub fn transaction_count(&self) -> usize {
        self.inner.read().transactions.len()
    }

    /// Append a transaction, indexing its outputs and inputs.
    ///
    /// Re-appending an already stored transaction is a no-op for the index sets.
    pub fn add_transaction(&self, tx: Transaction) -> Result<IndexedTransaction, TallyError> {
        let txid = tx.txid()?;
        let mut inner = self.inner.write();

        let mut outputs_indexed = 0;
        for (index, output) in tx.outputs.iter().enumerate() {
            let Ok(address) = output.script_pubkey.address() else {
                continue;
            };
            inner.received.entry(address).or_default().insert(OutPoint {
                txid,
                index: index as u64,
            });
            outputs_indexed += 1;
        }

        let mut inputs_indexed = 0;
        if !tx.is_coinbase() {
            for (index, input) in tx.inputs.iter().enumerate() {
                let prev = input.previous_output;
                let owner = inner
                    .transactions
                    .get(&prev.txid)
                    .and_then(|p| p.output(prev.index))
                    .and_then(|out| out.script_pubkey.address().ok());
                if let Some(address) = owner {
                    inner.spent_by.entry(address).or_default().insert(InputRef {
                        txid,
                        index: index as u64,
                    });
                    inputs_indexed += 1;
                }
            }
        }

        inner.transactions.insert(txid, tx);

        Ok(IndexedTransaction {
            txid,
            outputs_indexed,
            inputs_indexed,
        })
    }
}

impl IndexStore for MemoryIndex {
    fn received_coins(&self, address: &Address) -> Result<HashSet<OutPoint>, TallyError> {
        Ok(self.inner.read().received.get(address).cloned().unwrap_or_default())
    }

    fn spending_references(&self, address: &Address) -> Result<HashSet<InputRef>, TallyError> {
        Ok(self.inner.read().spent_by.get(address).cloned().unwrap_or_default())
    }

    fn fetch_transaction(&self, txid: &Hash256) -> Result<Option<Transaction>, TallyError> {
        Ok(self.inner.read().transactions.get(txid).cloned())
    }
}
