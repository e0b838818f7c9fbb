//! Error types for the Tally core.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("serialization: {0}")] Serialization(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature bytes")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error("public key does not match the spent output's address")] AddressMismatch,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
    #[error("previous transaction does not match outpoint {0}")] PreviousTransactionMismatch(String),
    #[error("previous output missing: {0}")] PreviousOutputMissing(String),
    #[error("unrecognized locking script on {0}")] UnrecognizedScript(String),
    #[error("transaction encoding: {0}")] Encoding(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid length: {0}")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid checksum")] InvalidChecksum,
    #[error("unknown version byte: {0:#04x}")] UnknownVersion(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unrecognized script pattern")] Unrecognized,
}

#[derive(Error, Debug)]
pub enum TallyError {
    #[error(transparent)] Transaction(#[from] TransactionError),
    #[error(transparent)] Crypto(#[from] CryptoError),
    #[error(transparent)] Address(#[from] AddressError),
    #[error(transparent)] Script(#[from] ScriptError),
    #[error("storage: {0}")] Storage(String),
}
