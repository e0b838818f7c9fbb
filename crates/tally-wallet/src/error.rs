//! Wallet error types.

use tally_core::address::Address;
use tally_core::error::{CryptoError, TallyError};
use tally_core::types::Hash256;
use thiserror::Error;

/// Errors that can occur in wallet operations.
///
/// Unrecognized locking scripts never appear here: the engine downgrades
/// them to "not spendable".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// No key is registered for the address.
    #[error("key not found: {0}")]
    KeyNotFound(Address),

    /// The index has no transaction with this ID.
    #[error("transaction not found: {0}")]
    TransactionNotFound(Hash256),

    /// A coin references an output the transaction does not have.
    #[error("output index {index} out of range for {txid} ({len} outputs)")]
    OutputIndexOutOfRange {
        txid: Hash256,
        index: u64,
        len: usize,
    },

    /// A spending reference points at an input the transaction does not have.
    #[error("input index {index} out of range for {txid} ({len} inputs)")]
    InputIndexOutOfRange {
        txid: Hash256,
        index: u64,
        len: usize,
    },

    /// Spendable value cannot cover the payments plus fee.
    #[error("insufficient funds: have {have}, need more than {need}")]
    InsufficientFunds {
        /// Total spendable value in base units.
        have: u64,
        /// Funding requirement (payments + fee) in base units.
        need: u64,
    },

    /// An input could not be signed; no transaction was produced.
    #[error("signing failed on input {index}: {reason}")]
    SigningFailed { index: usize, reason: String },

    /// Invalid monetary amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The index store failed.
    #[error("storage: {0}")]
    Storage(String),

    /// Configuration could not be loaded.
    #[error("config: {0}")]
    Config(String),

    /// Cryptographic error from tally-core.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl From<TallyError> for WalletError {
    fn from(err: TallyError) -> Self {
        match err {
            TallyError::Crypto(e) => WalletError::Crypto(e),
            other => WalletError::Storage(other.to_string()),
        }
    }
}
