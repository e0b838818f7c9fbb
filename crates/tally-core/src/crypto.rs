//! Ed25519 cryptographic operations for Tally.
//!
//! Provides key generation, transaction signing, and signature verification.
//! Uses ed25519-dalek for the underlying Ed25519 implementation and BLAKE3
//! for signing hashes.
//!
//! # Signing scheme
//!
//! Transaction inputs are signed using a **sighash** that commits to:
//! - Transaction version and lock_time
//! - All input outpoints (txid + index)
//! - All outputs (value + locking script)
//! - The index of the input being signed
//! - The value and locking script of the output being spent, read from the
//!   full previous transaction
//!
//! Signatures and public keys are excluded from the sighash to avoid
//! circularity and allow inputs to be signed independently in any order.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::address::Address;
use crate::constants::{PUBLIC_KEY_LEN, SIGNATURE_LEN};
use crate::error::CryptoError;
use crate::traits::TransactionSigner;
use crate::types::{Hash256, Transaction, TxOutput};

/// Ed25519 keypair for signing transactions.
///
/// Wraps [`ed25519_dalek::SigningKey`]. The secret key is zeroized on drop
/// by the underlying library.
pub struct KeyPair {
    signing_key: ed25519_dalek::SigningKey,
}

impl KeyPair {
    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            signing_key: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a keypair from 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Self {
        Self {
            signing_key: ed25519_dalek::SigningKey::from_bytes(&bytes),
        }
    }

    /// Derive the public key from this keypair.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    /// Get the raw secret key bytes (32 bytes). Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Sign a message, returning the raw 64-byte Ed25519 signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl Clone for KeyPair {
    fn clone(&self) -> Self {
        Self::from_secret_bytes(self.secret_bytes())
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key for verifying signatures and deriving addresses.
#[derive(Clone)]
pub struct PublicKey {
    verifying_key: ed25519_dalek::VerifyingKey,
}

impl PublicKey {
    /// Create a public key from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let vk = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self { verifying_key: vk })
    }

    /// Parse a public key from a byte slice of exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; PUBLIC_KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_bytes(&arr)
    }

    /// Get the raw public key bytes (32 bytes).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// The address controlled by this key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    /// Verify an Ed25519 signature on a message.
    pub fn verify(&self, message: &[u8], signature: &[u8; 64]) -> Result<(), CryptoError> {
        let sig = ed25519_dalek::Signature::from_bytes(signature);
        self.verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.to_bytes()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.to_bytes()))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for PublicKey {}

impl std::hash::Hash for PublicKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state);
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_bytes().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = <[u8; 32]>::deserialize(deserializer)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Signature material for one input, ready to be written into it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputSignature {
    pub signature: [u8; SIGNATURE_LEN],
    pub public_key: [u8; PUBLIC_KEY_LEN],
}

/// Resolve the output an input spends from the full previous transaction.
///
/// Fails if `previous` is not the transaction the input references or if
/// the referenced output index does not exist on it.
pub fn spent_output<'a>(
    tx: &Transaction,
    input_index: usize,
    previous: &'a Transaction,
) -> Result<&'a TxOutput, CryptoError> {
    let input = tx.inputs.get(input_index).ok_or(CryptoError::InputIndexOutOfBounds {
        index: input_index,
        len: tx.inputs.len(),
    })?;
    let outpoint = input.previous_output;

    let previous_txid = previous
        .txid()
        .map_err(|e| CryptoError::Encoding(e.to_string()))?;
    if previous_txid != outpoint.txid {
        return Err(CryptoError::PreviousTransactionMismatch(outpoint.to_string()));
    }

    previous
        .output(outpoint.index)
        .ok_or_else(|| CryptoError::PreviousOutputMissing(outpoint.to_string()))
}

/// Compute the signing hash (sighash) for a transaction input.
///
/// Commits to all inputs (outpoints only), all outputs, version, lock_time,
/// the index of the input being signed, and the output it spends.
pub fn signing_hash(
    tx: &Transaction,
    input_index: usize,
    previous: &Transaction,
) -> Result<Hash256, CryptoError> {
    let spent = spent_output(tx, input_index, previous)?;

    let mut data = Vec::new();

    data.extend_from_slice(&tx.version.to_le_bytes());

    data.extend_from_slice(&(tx.inputs.len() as u64).to_le_bytes());
    for input in &tx.inputs {
        data.extend_from_slice(input.previous_output.txid.as_bytes());
        data.extend_from_slice(&input.previous_output.index.to_le_bytes());
    }

    data.extend_from_slice(&(tx.outputs.len() as u64).to_le_bytes());
    for output in &tx.outputs {
        data.extend_from_slice(&output.value.to_le_bytes());
        data.extend_from_slice(&(output.script_pubkey.len() as u64).to_le_bytes());
        data.extend_from_slice(output.script_pubkey.as_bytes());
    }

    data.extend_from_slice(&tx.lock_time.to_le_bytes());
    data.extend_from_slice(&(input_index as u64).to_le_bytes());

    // Script context of the output being spent
    data.extend_from_slice(&spent.value.to_le_bytes());
    data.extend_from_slice(&(spent.script_pubkey.len() as u64).to_le_bytes());
    data.extend_from_slice(spent.script_pubkey.as_bytes());

    Ok(Hash256(blake3::hash(&data).into()))
}

/// Sign a transaction input in place.
///
/// Computes the signing hash for the given input, signs it with the keypair,
/// and writes the signature and public key bytes into the input.
pub fn sign_transaction_input(
    tx: &mut Transaction,
    input_index: usize,
    previous: &Transaction,
    keypair: &KeyPair,
) -> Result<(), CryptoError> {
    let sig = Ed25519Signer.sign(tx, input_index, previous, keypair)?;
    tx.inputs[input_index].signature = sig.signature.to_vec();
    tx.inputs[input_index].public_key = sig.public_key.to_vec();
    Ok(())
}

/// Verify a transaction input's signature against the output it spends.
///
/// Checks that:
/// 1. The input contains a valid 64-byte signature and 32-byte public key
/// 2. The spent output's locking script is a standard pattern whose address
///    matches the public key
/// 3. The Ed25519 signature verifies against the sighash
pub fn verify_transaction_input(
    tx: &Transaction,
    input_index: usize,
    previous: &Transaction,
) -> Result<(), CryptoError> {
    let spent = spent_output(tx, input_index, previous)?;
    let input = &tx.inputs[input_index];

    let pk = PublicKey::from_slice(&input.public_key)?;

    let owner = spent
        .script_pubkey
        .address()
        .map_err(|_| CryptoError::UnrecognizedScript(input.previous_output.to_string()))?;
    if pk.address() != owner {
        return Err(CryptoError::AddressMismatch);
    }

    let sig_bytes: [u8; SIGNATURE_LEN] = input
        .signature
        .as_slice()
        .try_into()
        .map_err(|_| CryptoError::InvalidSignature)?;

    let sighash = signing_hash(tx, input_index, previous)?;
    pk.verify(sighash.as_bytes(), &sig_bytes)
}

/// Default signer: Ed25519 over [`signing_hash`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Signer;

impl TransactionSigner for Ed25519Signer {
    fn sign(
        &self,
        tx: &Transaction,
        input_index: usize,
        previous: &Transaction,
        keypair: &KeyPair,
    ) -> Result<InputSignature, CryptoError> {
        let sighash = signing_hash(tx, input_index, previous)?;
        Ok(InputSignature {
            signature: keypair.sign(sighash.as_bytes()),
            public_key: keypair.public_key().to_bytes(),
        })
    }
}
