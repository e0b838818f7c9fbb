//! The wallet's view of unspent coins, rebuilt from the address index.
//!
//! The index only records, per address, which outputs paid it and which
//! inputs later consumed one of them. The unspent set for an address is the
//! set difference of the two; the view is the union over all registered
//! addresses. A rebuild is computed aside and swapped in only when every
//! lookup succeeded, so a failed synchronize leaves the previous view intact.

use std::collections::{BTreeSet, HashSet};

use serde::Serialize;
use tally_core::address::Address;
use tally_core::traits::IndexStore;
use tracing::{debug, info};

use crate::cache::TransactionCache;
use crate::error::WalletError;
use crate::Coin;

/// Counters describing one synchronize pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Registered addresses scanned.
    pub addresses: usize,
    /// Receive entries seen across all addresses.
    pub received: usize,
    /// Spend entries seen across all addresses.
    pub spent: usize,
    /// Coins in the view after the pass.
    pub unspent: usize,
}

/// Set of coins believed unspent and controlled by a registered address.
#[derive(Clone, Debug, Default)]
pub struct UtxoView {
    coins: HashSet<Coin>,
}

impl UtxoView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the view with one reconstructed from `index`.
    ///
    /// Idempotent for an unchanged index. On error the current contents are
    /// kept as they were.
    pub fn synchronize(
        &mut self,
        addresses: &BTreeSet<Address>,
        index: &dyn IndexStore,
        cache: &TransactionCache,
    ) -> Result<SyncReport, WalletError> {
        let (coins, report) = rebuild(addresses, index, cache)?;
        self.coins = coins;
        info!(
            addresses = report.addresses,
            received = report.received,
            spent = report.spent,
            unspent = report.unspent,
            "utxo view synchronized"
        );
        Ok(report)
    }

    pub fn contains(&self, coin: &Coin) -> bool {
        self.coins.contains(coin)
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter()
    }

    /// Coins sorted by identity.
    pub fn sorted(&self) -> Vec<Coin> {
        let mut coins: Vec<Coin> = self.coins.iter().copied().collect();
        coins.sort();
        coins
    }
}

/// Compute the unspent set for `addresses` without touching any view.
///
/// Each address contributes independently, so visiting order does not
/// affect the result.
fn rebuild<'a>(
    addresses: impl IntoIterator<Item = &'a Address>,
    index: &dyn IndexStore,
    cache: &TransactionCache,
) -> Result<(HashSet<Coin>, SyncReport), WalletError> {
    let mut report = SyncReport::default();
    let mut all = HashSet::new();

    for address in addresses {
        report.addresses += 1;
        let received = index.received_coins(address)?;
        let spent_by = index.spending_references(address)?;
        report.received += received.len();
        report.spent += spent_by.len();

        let mut unspent = HashSet::with_capacity(received.len());
        for coin in received {
            cache.resolve(&coin.txid, index)?;
            unspent.insert(coin);
        }

        for reference in spent_by {
            let spender = cache.resolve(&reference.txid, index)?;
            let input = spender
                .input(reference.index)
                .ok_or(WalletError::InputIndexOutOfRange {
                    txid: reference.txid,
                    index: reference.index,
                    len: spender.inputs.len(),
                })?;
            unspent.remove(&input.previous_output);
        }

        debug!(%address, unspent = unspent.len(), "address scanned");
        all.extend(unspent);
    }

    report.unspent = all.len();
    Ok((all, report))
}
