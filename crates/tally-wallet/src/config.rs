//! Wallet configuration.
//!
//! Provides [`WalletConfig`] with the fee floor, dust threshold and selection
//! policy used by the transaction builder. Values come from defaults, an
//! optional TOML or JSON file, and `TALLY_*` environment overrides, in that
//! order of precedence (later wins).

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tally_core::address::Network;
use tally_core::constants::{DEFAULT_DUST_THRESHOLD, DEFAULT_MIN_FEE};

use crate::coin_selection::SelectionOrder;
use crate::error::WalletError;

/// Prefix for environment overrides, e.g. `TALLY_MIN_FEE=600000`.
pub const ENV_PREFIX: &str = "TALLY";

/// Configuration for a wallet instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Fee floor in base units.
    pub min_fee: u64,
    /// Change at or below this is folded into the fee.
    pub dust_threshold: u64,
    /// Candidate ranking for coin selection.
    pub selection_order: SelectionOrder,
    /// Network used when rendering Base58 addresses.
    pub network: Network,
    /// Log level filter string (e.g. "info", "tally_wallet=debug").
    pub log_level: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            min_fee: DEFAULT_MIN_FEE,
            dust_threshold: DEFAULT_DUST_THRESHOLD,
            selection_order: SelectionOrder::Descending,
            network: Network::Mainnet,
            log_level: "info".to_string(),
        }
    }
}

impl WalletConfig {
    /// Load from an optional file plus `TALLY_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, WalletError> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    fn load_with_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, WalletError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| WalletError::Config(e.to_string()))
    }
}
