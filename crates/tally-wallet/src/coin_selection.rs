//! Deterministic coin selection.
//!
//! Candidates are ordered by value (largest first by default) with ties
//! broken by coin identity, and the shortest prefix whose total strictly
//! exceeds `payments + fee` is taken. The fee is a flat per-mille of the
//! payment total with a floor, so it never depends on which coins are
//! chosen. Given the same candidates and target the result is always the
//! same set in the same order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tally_core::address::Address;
use tally_core::constants::{DEFAULT_MIN_FEE, FEE_DIVISOR};

use crate::error::WalletError;
use crate::Coin;

/// Direction in which candidates are ranked by value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionOrder {
    /// Largest coins first: fewest inputs.
    #[default]
    Descending,
    /// Smallest coins first: consolidates dust.
    Ascending,
}

/// A spendable coin offered to the selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub coin: Coin,
    /// Output value in base units.
    pub value: u64,
    /// Address controlling the coin.
    pub address: Address,
}

/// Result of coin selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinSelection {
    /// Chosen coins, in selection order.
    pub selected: Vec<Candidate>,
    /// Total value of `selected`.
    pub total: u64,
    /// Fee charged for the transaction.
    pub fee: u64,
    /// Payments plus fee; `total` strictly exceeds this.
    pub funding_requirement: u64,
    /// `total - funding_requirement`.
    pub change: u64,
}

/// The fee for a payment total: `max(target / 1000, min_fee)`.
pub fn fee_for(target: u64, min_fee: u64) -> u64 {
    (target / FEE_DIVISOR).max(min_fee)
}

/// Coin selector with a configurable fee floor and ranking direction.
#[derive(Clone, Copy, Debug)]
pub struct CoinSelector {
    pub min_fee: u64,
    pub order: SelectionOrder,
}

impl Default for CoinSelector {
    fn default() -> Self {
        Self {
            min_fee: DEFAULT_MIN_FEE,
            order: SelectionOrder::Descending,
        }
    }
}

impl CoinSelector {
    fn rank(&self, a: &Candidate, b: &Candidate) -> Ordering {
        let by_value = match self.order {
            SelectionOrder::Descending => b.value.cmp(&a.value),
            SelectionOrder::Ascending => a.value.cmp(&b.value),
        };
        by_value.then(a.coin.cmp(&b.coin))
    }

    /// Select coins paying `target` plus fee.
    ///
    /// Returns [`WalletError::InsufficientFunds`] when even the full
    /// candidate set does not strictly exceed the requirement.
    pub fn select(
        &self,
        candidates: &[Candidate],
        target: u64,
    ) -> Result<CoinSelection, WalletError> {
        let fee = fee_for(target, self.min_fee);
        let need = target
            .checked_add(fee)
            .ok_or_else(|| WalletError::InvalidAmount("payment total plus fee overflows".into()))?;

        let mut ranked = candidates.to_vec();
        ranked.sort_by(|a, b| self.rank(a, b));

        let mut selected = Vec::new();
        let mut total: u64 = 0;
        for candidate in ranked {
            total = total.saturating_add(candidate.value);
            selected.push(candidate);
            if total > need {
                return Ok(CoinSelection {
                    selected,
                    total,
                    fee,
                    funding_requirement: need,
                    change: total - need,
                });
            }
        }

        Err(WalletError::InsufficientFunds { have: total, need })
    }
}
