//! JSON ledger and key files backing the command-line host.
//!
//! The ledger is a JSON array of transactions in the order they were
//! appended; replaying it into a [`MemoryIndex`] rebuilds the address index.
//! The key file lists hex-encoded Ed25519 secrets and watch-only public keys.
//! Missing files read as empty.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tally_core::crypto::{KeyPair, PublicKey};
use tally_core::index::MemoryIndex;
use tally_core::types::Transaction;
use tally_wallet::Key;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// On-disk key material. Secret strings are wiped when dropped.
#[derive(Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct KeyFile {
    /// Hex-encoded 32-byte signing secrets.
    #[serde(default)]
    pub signing: Vec<String>,
    /// Hex-encoded 32-byte public keys.
    #[serde(default)]
    pub watch_only: Vec<String>,
}

impl KeyFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = Zeroizing::new(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read key file: {}", path.display()))?,
        );
        serde_json::from_str(&raw)
            .with_context(|| format!("Malformed key file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = Zeroizing::new(serde_json::to_string_pretty(self)?);
        std::fs::write(path, json.as_bytes())
            .with_context(|| format!("Failed to write key file: {}", path.display()))
    }

    /// Record the secret half of `keypair`.
    pub fn push_signing(&mut self, keypair: &KeyPair) {
        let mut secret = keypair.secret_bytes();
        self.signing.push(hex::encode(secret));
        secret.zeroize();
    }

    /// Decode every entry into a registry key.
    pub fn keys(&self) -> Result<Vec<Key>> {
        let mut keys = Vec::with_capacity(self.signing.len() + self.watch_only.len());
        for (i, secret) in self.signing.iter().enumerate() {
            let kp = parse_secret(secret).with_context(|| format!("signing key #{i}"))?;
            keys.push(Key::Signing(kp));
        }
        for (i, public) in self.watch_only.iter().enumerate() {
            let pk = parse_public(public).with_context(|| format!("watch-only key #{i}"))?;
            keys.push(Key::WatchOnly(pk));
        }
        Ok(keys)
    }
}

fn parse_secret(s: &str) -> Result<KeyPair> {
    let mut bytes = Zeroizing::new([0u8; 32]);
    hex::decode_to_slice(s.trim(), &mut *bytes).context("expected 64 hex characters")?;
    Ok(KeyPair::from_secret_bytes(*bytes))
}

pub fn parse_public(s: &str) -> Result<PublicKey> {
    let bytes = hex::decode(s.trim()).context("public key is not hex")?;
    Ok(PublicKey::from_slice(&bytes)?)
}

pub fn load_ledger(path: &Path) -> Result<Vec<Transaction>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read ledger: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Malformed ledger: {}", path.display()))
}

pub fn save_ledger(path: &Path, ledger: &[Transaction]) -> Result<()> {
    let json = serde_json::to_string_pretty(ledger)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write ledger: {}", path.display()))
}

/// Replay a ledger into a fresh index, in order.
pub fn index_ledger(ledger: &[Transaction]) -> Result<MemoryIndex> {
    let index = MemoryIndex::new();
    for (i, tx) in ledger.iter().enumerate() {
        index
            .add_transaction(tx.clone())
            .with_context(|| format!("ledger entry #{i}"))?;
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::address::Address;
    use tally_core::script::Script;
    use tally_core::types::{OutPoint, TxInput, TxOutput};

    #[test]
    fn missing_files_read_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_ledger(&dir.path().join("ledger.json")).unwrap().is_empty());
        let keys = KeyFile::load(&dir.path().join("keys.json")).unwrap();
        assert!(keys.keys().unwrap().is_empty());
    }

    #[test]
    fn key_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.json");

        let signing = KeyPair::from_secret_bytes([4; 32]);
        let watched = KeyPair::from_secret_bytes([5; 32]).public_key();
        let mut file = KeyFile::default();
        file.push_signing(&signing);
        file.watch_only.push(hex::encode(watched.to_bytes()));
        file.save(&path).unwrap();

        let keys = KeyFile::load(&path).unwrap().keys().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].address(), signing.public_key().address());
        assert!(keys[1].is_watch_only());
        assert_eq!(keys[1].address(), watched.address());
    }

    #[test]
    fn bad_secret_is_rejected() {
        let file = KeyFile {
            signing: vec!["abcd".into()],
            watch_only: vec![],
        };
        assert!(file.keys().is_err());
    }

    #[test]
    fn ledger_replays_into_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let tx = Transaction {
            version: 1,
            inputs: vec![TxInput::unsigned(OutPoint::null())],
            outputs: vec![TxOutput {
                value: 42,
                script_pubkey: Script::pay_to_address(&Address([3; 20])),
            }],
            lock_time: 0,
        };
        save_ledger(&path, std::slice::from_ref(&tx)).unwrap();

        let ledger = load_ledger(&path).unwrap();
        assert_eq!(ledger, vec![tx]);
        assert_eq!(index_ledger(&ledger).unwrap().transaction_count(), 1);
    }
}
