//! Trait interfaces for the collaborators the ledger engine consumes.
//!
//! These traits define the contracts between the wallet engine and the
//! systems it does not own:
//! - [`IndexStore`] — address-indexed transaction store (node storage implements)
//! - [`ScriptClassifier`] — locking-script recognizer
//! - [`TransactionSigner`] — per-input signer

use std::collections::HashSet;

use crate::address::Address;
use crate::crypto::{InputSignature, KeyPair};
use crate::error::{CryptoError, ScriptError, TallyError};
use crate::script::Script;
use crate::types::{Hash256, InputRef, OutPoint, Transaction};

/// Read-only access to an append-only, address-indexed transaction store.
///
/// The index records facts about each address independently: which outputs
/// paid it, and which later inputs consumed one of those outputs. It never
/// answers "is this output unspent" directly.
pub trait IndexStore: Send + Sync {
    /// Outputs paying `address`.
    fn received_coins(&self, address: &Address) -> Result<HashSet<OutPoint>, TallyError>;

    /// Inputs that consume an output previously paying `address`.
    fn spending_references(&self, address: &Address) -> Result<HashSet<InputRef>, TallyError>;

    /// Look up a transaction by ID. Returns `None` if the store has no such transaction.
    fn fetch_transaction(&self, txid: &Hash256) -> Result<Option<Transaction>, TallyError>;
}

/// Maps a locking script to the address that controls it.
pub trait ScriptClassifier: Send + Sync {
    /// Resolve `script` to an address, or [`ScriptError::Unrecognized`] if it is
    /// not a single-key pattern.
    fn classify(&self, script: &Script) -> Result<Address, ScriptError>;
}

/// Produces the signature for one input of a transaction.
pub trait TransactionSigner: Send + Sync {
    /// Sign input `input_index` of `tx`, which spends an output of `previous`.
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        previous: &Transaction,
        keypair: &KeyPair,
    ) -> Result<InputSignature, CryptoError>;
}
