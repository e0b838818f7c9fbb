//! Transaction assembly: coin selection, outputs, change and signing.
//!
//! Building runs in four stages:
//! 1. Total the payments and select coins against the spendable candidates
//! 2. Freeze the selection, then shuffle only the order inputs appear in
//! 3. Emit payment outputs and, above the dust threshold, one change output
//! 4. Compute every input signature, then write them all in one step
//!
//! Nothing is returned unless every input was signed.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tally_core::address::Address;
use tally_core::constants::{DEFAULT_DUST_THRESHOLD, DEFAULT_MIN_FEE, TX_VERSION};
use tally_core::crypto::InputSignature;
use tally_core::script::Script;
use tally_core::traits::TransactionSigner;
use tally_core::types::{Transaction, TxInput, TxOutput};
use tracing::debug;

use crate::coin_selection::{Candidate, CoinSelection, CoinSelector, SelectionOrder};
use crate::config::WalletConfig;
use crate::error::WalletError;
use crate::valuation::Valuation;

/// A payment: destination address and amount in base units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub address: Address,
    pub amount: u64,
}

impl Payment {
    pub fn new(address: Address, amount: u64) -> Self {
        Self { address, amount }
    }
}

/// Builder for payment transactions.
///
/// # Example
/// ```ignore
/// let tx = TransactionBuilder::new()
///     .set_min_fee(500_000)
///     .build(&payments, None, &valuation, &Ed25519Signer)?;
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    min_fee: u64,
    dust_threshold: u64,
    order: SelectionOrder,
}

impl TransactionBuilder {
    /// Create a builder with the default fee floor and dust threshold.
    pub fn new() -> Self {
        Self {
            min_fee: DEFAULT_MIN_FEE,
            dust_threshold: DEFAULT_DUST_THRESHOLD,
            order: SelectionOrder::Descending,
        }
    }

    pub fn from_config(config: &WalletConfig) -> Self {
        Self {
            min_fee: config.min_fee,
            dust_threshold: config.dust_threshold,
            order: config.selection_order,
        }
    }

    /// Override the fee floor (default: [`DEFAULT_MIN_FEE`]).
    pub fn set_min_fee(&mut self, fee: u64) -> &mut Self {
        self.min_fee = fee;
        self
    }

    /// Override the dust threshold (default: [`DEFAULT_DUST_THRESHOLD`]).
    pub fn set_dust_threshold(&mut self, threshold: u64) -> &mut Self {
        self.dust_threshold = threshold;
        self
    }

    pub fn set_selection_order(&mut self, order: SelectionOrder) -> &mut Self {
        self.order = order;
        self
    }

    /// Build and sign a transaction, shuffling inputs with the thread RNG.
    pub fn build(
        &self,
        payments: &[Payment],
        change_address: Option<Address>,
        valuation: &Valuation<'_>,
        signer: &dyn TransactionSigner,
    ) -> Result<Transaction, WalletError> {
        self.build_with_rng(
            payments,
            change_address,
            valuation,
            signer,
            &mut rand::thread_rng(),
        )
    }

    /// Build and sign a transaction using `rng` for input order.
    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        payments: &[Payment],
        change_address: Option<Address>,
        valuation: &Valuation<'_>,
        signer: &dyn TransactionSigner,
        rng: &mut R,
    ) -> Result<Transaction, WalletError> {
        let target = payment_total(payments)?;

        let selector = CoinSelector {
            min_fee: self.min_fee,
            order: self.order,
        };
        let selection = selector.select(&valuation.candidates(), target)?;

        // The selection is final from here on; only its presentation order changes.
        let change_to = resolve_change_address(change_address, &selection);
        let mut spend_order: Vec<Candidate> = selection.selected.clone();
        spend_order.shuffle(rng);

        let mut outputs: Vec<TxOutput> = payments
            .iter()
            .map(|p| TxOutput {
                value: p.amount,
                script_pubkey: Script::pay_to_address(&p.address),
            })
            .collect();

        let folded = selection.change <= self.dust_threshold;
        if !folded {
            // A successful selection is never empty, so an owner always exists.
            if let Some(to) = change_to {
                outputs.push(TxOutput {
                    value: selection.change,
                    script_pubkey: Script::pay_to_address(&to),
                });
            }
        }

        let mut tx = Transaction {
            version: TX_VERSION,
            inputs: spend_order
                .iter()
                .map(|c| TxInput::unsigned(c.coin))
                .collect(),
            outputs,
            lock_time: 0,
        };

        let signatures = sign_all(&tx, &spend_order, valuation, signer)?;
        for (input, sig) in tx.inputs.iter_mut().zip(signatures) {
            input.signature = sig.signature.to_vec();
            input.public_key = sig.public_key.to_vec();
        }

        debug!(
            inputs = tx.inputs.len(),
            outputs = tx.outputs.len(),
            fee = selection.fee,
            change = selection.change,
            folded,
            "transaction built"
        );
        Ok(tx)
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum of payment amounts. An empty list totals zero.
fn payment_total(payments: &[Payment]) -> Result<u64, WalletError> {
    payments.iter().try_fold(0u64, |acc, p| {
        acc.checked_add(p.amount)
            .ok_or_else(|| WalletError::InvalidAmount("payment total overflows".into()))
    })
}

/// Where change goes: the explicit address if given, otherwise the owner of
/// the first coin in selection order.
pub fn resolve_change_address(
    explicit: Option<Address>,
    selection: &CoinSelection,
) -> Option<Address> {
    explicit.or_else(|| selection.selected.first().map(|c| c.address))
}

/// Signatures for every input of `tx`, or the first failure.
fn sign_all(
    tx: &Transaction,
    spend_order: &[Candidate],
    valuation: &Valuation<'_>,
    signer: &dyn TransactionSigner,
) -> Result<Vec<InputSignature>, WalletError> {
    spend_order
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            let failed = |reason: String| WalletError::SigningFailed { index, reason };

            let key = valuation
                .registry
                .get_key(&candidate.address)
                .map_err(|e| failed(e.to_string()))?;
            let keypair = key
                .keypair()
                .ok_or_else(|| failed(format!("watch-only key for {}", candidate.address)))?;
            let previous = valuation
                .cache
                .resolve(&candidate.coin.txid, valuation.index)
                .map_err(|e| failed(e.to_string()))?;

            signer
                .sign(tx, index, &previous, keypair)
                .map_err(|e| failed(e.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::types::{Hash256, OutPoint};

    fn cand(seed: u8) -> Candidate {
        Candidate {
            coin: OutPoint { txid: Hash256([seed; 32]), index: 0 },
            value: 1,
            address: Address([seed; 20]),
        }
    }

    fn selection(selected: Vec<Candidate>) -> CoinSelection {
        CoinSelection {
            selected,
            total: 0,
            fee: 0,
            funding_requirement: 0,
            change: 0,
        }
    }

    #[test]
    fn change_defaults_to_first_selected_owner() {
        let sel = selection(vec![cand(4), cand(2)]);
        assert_eq!(resolve_change_address(None, &sel), Some(Address([4; 20])));
    }

    #[test]
    fn explicit_change_address_wins() {
        let sel = selection(vec![cand(4)]);
        let explicit = Address([9; 20]);
        assert_eq!(resolve_change_address(Some(explicit), &sel), Some(explicit));
    }

    #[test]
    fn payment_total_validation() {
        assert_eq!(payment_total(&[]).unwrap(), 0);

        let zero = [Payment::new(Address([1; 20]), 0)];
        assert_eq!(payment_total(&zero).unwrap(), 0);

        let overflow = [
            Payment::new(Address([1; 20]), u64::MAX),
            Payment::new(Address([2; 20]), 1),
        ];
        assert!(matches!(payment_total(&overflow), Err(WalletError::InvalidAmount(_))));

        let ok = [
            Payment::new(Address([1; 20]), 10),
            Payment::new(Address([2; 20]), 32),
        ];
        assert_eq!(payment_total(&ok).unwrap(), 42);
    }

    #[test]
    fn builder_setters_chain() {
        let mut b = TransactionBuilder::new();
        b.set_min_fee(1).set_dust_threshold(2).set_selection_order(SelectionOrder::Ascending);
        assert_eq!(b.min_fee, 1);
        assert_eq!(b.dust_threshold, 2);
        assert_eq!(b.order, SelectionOrder::Ascending);
    }

    #[test]
    fn from_config_copies_policy() {
        let cfg = WalletConfig {
            min_fee: 11,
            dust_threshold: 22,
            selection_order: SelectionOrder::Ascending,
            ..WalletConfig::default()
        };
        let b = TransactionBuilder::from_config(&cfg);
        assert_eq!((b.min_fee, b.dust_threshold, b.order), (11, 22, SelectionOrder::Ascending));
    }
}
