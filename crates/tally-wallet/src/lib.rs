//! # tally-wallet — wallet-side UTXO ledger engine.
//!
//! Maintains, for a set of locally held keys, a view of unspent outputs
//! reconstructed from an address-indexed transaction store, and builds
//! signed, fee-paying payment transactions against that view.
//!
//! # Modules
//!
//! - [`error`] — `WalletError` enum
//! - [`keys`] — address → key registry, watch-only keys
//! - [`cache`] — memoized transaction lookups
//! - [`utxo`] — UTXO view reconstruction (received minus spent)
//! - [`valuation`] — coin values, spendability, balances
//! - [`coin_selection`] — deterministic largest-first selection
//! - [`builder`] — transaction assembly and atomic signing
//! - [`config`] — `WalletConfig` loading
//! - [`wallet`] — the composed, lock-protected wallet

pub mod builder;
pub mod cache;
pub mod coin_selection;
pub mod config;
pub mod error;
pub mod keys;
pub mod utxo;
pub mod valuation;
pub mod wallet;

/// A reference to one output of one transaction.
pub type Coin = tally_core::types::OutPoint;

// Re-exports for convenient access
pub use builder::{Payment, TransactionBuilder};
pub use cache::TransactionCache;
pub use coin_selection::{Candidate, CoinSelection, CoinSelector, SelectionOrder};
pub use config::WalletConfig;
pub use error::WalletError;
pub use keys::{Key, KeyRegistry};
pub use utxo::{SyncReport, UtxoView};
pub use valuation::{UnspentCoin, Valuation, WalletBalance};
pub use wallet::Wallet;
