//! tally-cli — Command-line host for the Tally wallet engine.
//!
//! Runs the engine against a JSON transaction ledger and a JSON key file:
//! key generation, address listing, balance and unspent queries, payment
//! building, and local funding for test ledgers.

mod files;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tally_core::address::Address;
use tally_core::constants::COIN;
use tally_core::crypto::KeyPair;
use tally_core::script::Script;
use tally_core::types::{OutPoint, Transaction, TxInput, TxOutput};
use tally_wallet::{Payment, Wallet, WalletConfig};
use tracing::{debug, info};

use crate::files::{index_ledger, load_ledger, parse_public, save_ledger, KeyFile};

/// Tally command-line wallet.
#[derive(Parser)]
#[command(name = "tally-cli")]
#[command(version, about = "Wallet-side UTXO ledger engine over a JSON ledger.")]
struct Cli {
    /// Wallet config file (TOML or JSON). `TALLY_*` variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ledger file: JSON array of transactions in append order.
    #[arg(long, global = true, default_value = "ledger.json")]
    ledger: PathBuf,

    /// Key file with signing secrets and watch-only public keys.
    #[arg(long, global = true, default_value = "keys.json")]
    keys: PathBuf,

    /// Log output format: text or json.
    #[arg(long, global = true, default_value = "text")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a signing key, or import a watch-only public key.
    Keygen(KeygenArgs),
    /// List registered addresses.
    Addresses,
    /// Show total and spendable balance.
    Balance(OutputArgs),
    /// List coins in the UTXO view.
    Unspent(OutputArgs),
    /// Build and sign a payment transaction.
    Send(SendArgs),
    /// Append a coinbase output paying an address (test ledgers only).
    Fund(FundArgs),
}

#[derive(Args)]
struct KeygenArgs {
    /// Hex public key to import as watch-only instead of generating.
    #[arg(long)]
    watch: Option<String>,
}

#[derive(Args)]
struct OutputArgs {
    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SendArgs {
    /// Payment as ADDRESS=AMOUNT (base units). Repeat for several payments.
    #[arg(long = "pay", required = true, value_parser = parse_payment)]
    payments: Vec<Payment>,

    /// Change address (default: owner of the first selected coin).
    #[arg(long)]
    change: Option<Address>,

    /// Append the signed transaction to the ledger.
    #[arg(long)]
    commit: bool,
}

#[derive(Args)]
struct FundArgs {
    /// Recipient address (hex or Base58Check).
    #[arg(long)]
    to: Address,

    /// Amount in base units.
    #[arg(long)]
    amount: u64,
}

/// A loaded wallet plus the ledger it was synchronized from.
struct Session {
    wallet: Wallet,
    ledger: Vec<Transaction>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = WalletConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    init_logging(&config.log_level, &cli.log_format);

    match &cli.command {
        Commands::Keygen(args) => keygen(&cli, &config, args),
        Commands::Addresses => addresses(&cli, config),
        Commands::Balance(args) => balance(&cli, config, args),
        Commands::Unspent(args) => unspent(&cli, config, args),
        Commands::Send(args) => send(&cli, config, args),
        Commands::Fund(args) => fund(&cli, args),
    }
}

fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    // Logs go to stderr so command output stays machine-readable.
    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

/// Load keys and ledger, then synchronize a wallet over them.
fn open(cli: &Cli, config: WalletConfig) -> Result<Session> {
    let ledger = load_ledger(&cli.ledger)?;
    let index = Arc::new(index_ledger(&ledger)?);
    let wallet = Wallet::new(index, config);

    for key in KeyFile::load(&cli.keys)?.keys()? {
        wallet.add_key(key);
    }
    let report = wallet.synchronize().context("Failed to synchronize")?;
    debug!(?report, transactions = ledger.len(), "session opened");

    Ok(Session { wallet, ledger })
}

fn keygen(cli: &Cli, config: &WalletConfig, args: &KeygenArgs) -> Result<()> {
    let mut file = KeyFile::load(&cli.keys)?;

    let address = match &args.watch {
        Some(public) => {
            let pk = parse_public(public)?;
            file.watch_only.push(hex::encode(pk.to_bytes()));
            pk.address()
        }
        None => {
            let kp = KeyPair::generate();
            file.push_signing(&kp);
            kp.public_key().address()
        }
    };

    file.save(&cli.keys)?;
    info!(%address, "key added");
    println!("{}", address);
    println!("{}", address.to_base58(config.network));
    Ok(())
}

fn addresses(cli: &Cli, config: WalletConfig) -> Result<()> {
    let network = config.network;
    let session = open(cli, config)?;
    for address in session.wallet.addresses() {
        let kind = if session.wallet.get_key(&address)?.is_watch_only() {
            "watch-only"
        } else {
            "signing"
        };
        println!("{}  {}  {}", address, address.to_base58(network), kind);
    }
    Ok(())
}

fn balance(cli: &Cli, config: WalletConfig, args: &OutputArgs) -> Result<()> {
    let session = open(cli, config)?;
    let summary = session.wallet.summary()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Total:     {}", format_amount(summary.total));
        println!("Spendable: {}", format_amount(summary.spendable));
        println!("Coins:     {}", summary.coin_count);
    }
    Ok(())
}

fn unspent(cli: &Cli, config: WalletConfig, args: &OutputArgs) -> Result<()> {
    let session = open(cli, config)?;
    let rows = session.wallet.unspent()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in rows {
        let owner = row
            .address
            .map(|a| a.to_string())
            .unwrap_or_else(|| "non-standard".to_string());
        let flag = if row.spendable { "" } else { "  (not spendable)" };
        println!("{}  {}  {}{}", row.coin, format_amount(row.value), owner, flag);
    }
    Ok(())
}

fn send(cli: &Cli, config: WalletConfig, args: &SendArgs) -> Result<()> {
    let mut session = open(cli, config)?;
    let tx = session
        .wallet
        .build_transaction(&args.payments, args.change)
        .context("Failed to build transaction")?;
    let txid = tx.txid()?;

    println!("{}", serde_json::to_string_pretty(&tx)?);
    println!("txid: {}", txid);

    if args.commit {
        session.ledger.push(tx);
        save_ledger(&cli.ledger, &session.ledger)?;
        info!(%txid, "transaction appended to ledger");
    }
    Ok(())
}

fn fund(cli: &Cli, args: &FundArgs) -> Result<()> {
    if args.amount == 0 {
        bail!("Amount must be non-zero");
    }
    let mut ledger = load_ledger(&cli.ledger)?;
    let tx = Transaction {
        version: 1,
        inputs: vec![TxInput::unsigned(OutPoint::null())],
        outputs: vec![TxOutput {
            value: args.amount,
            script_pubkey: Script::pay_to_address(&args.to),
        }],
        // Position in the ledger keeps identical funding requests distinct.
        lock_time: ledger.len() as u64,
    };
    let txid = tx.txid()?;
    ledger.push(tx);
    save_ledger(&cli.ledger, &ledger)?;
    println!("txid: {}", txid);
    Ok(())
}

/// Parse `ADDRESS=AMOUNT` into a payment.
fn parse_payment(s: &str) -> Result<Payment> {
    let (address, amount) = s
        .split_once('=')
        .context("expected ADDRESS=AMOUNT")?;
    let address: Address = address.parse().context("invalid address")?;
    let amount: u64 = amount.parse().context("invalid amount")?;
    Ok(Payment::new(address, amount))
}

/// Render base units as a decimal coin amount.
fn format_amount(units: u64) -> String {
    format!("{}.{:08}", units / COIN, units % COIN)
}
