//! Locking scripts and the standard script classifier.
//!
//! Only two locking patterns are recognized:
//!
//! ```text
//! pay-to-pubkey:       <push 32> <pubkey> OP_CHECKSIG
//! pay-to-pubkey-hash:  OP_DUP OP_HASH160 <push 20> <address> OP_EQUALVERIFY OP_CHECKSIG
//! ```
//!
//! Both resolve to an [`Address`]: the pubkey form hashes the embedded key,
//! the pubkey-hash form carries the address directly. Anything else is
//! [`ScriptError::Unrecognized`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::address::{hash160, Address};
use crate::constants::{ADDRESS_LEN, PUBLIC_KEY_LEN};
use crate::crypto::PublicKey;
use crate::error::ScriptError;
use crate::traits::ScriptClassifier;

pub const OP_DUP: u8 = 0x76;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_CHECKSIG: u8 = 0xac;

/// Length of a pay-to-pubkey-hash script.
const P2PKH_LEN: usize = 5 + ADDRESS_LEN;

/// Length of a pay-to-pubkey script.
const P2PK_LEN: usize = 2 + PUBLIC_KEY_LEN;

/// Raw locking script bytes.
#[derive(Clone, PartialEq, Eq, Hash, Default, bincode::Encode, bincode::Decode)]
pub struct Script(pub Vec<u8>);

/// The recognized standard patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScriptKind {
    PayToPubkey,
    PayToPubkeyHash,
}

impl Script {
    /// Standard pay-to-pubkey-hash script locking to `address`.
    pub fn pay_to_address(address: &Address) -> Self {
        let mut bytes = Vec::with_capacity(P2PKH_LEN);
        bytes.push(OP_DUP);
        bytes.push(OP_HASH160);
        bytes.push(ADDRESS_LEN as u8);
        bytes.extend_from_slice(address.as_bytes());
        bytes.push(OP_EQUALVERIFY);
        bytes.push(OP_CHECKSIG);
        Self(bytes)
    }

    /// Pay-to-pubkey script locking directly to `public_key`.
    pub fn pay_to_pubkey(public_key: &PublicKey) -> Self {
        let mut bytes = Vec::with_capacity(P2PK_LEN);
        bytes.push(PUBLIC_KEY_LEN as u8);
        bytes.extend_from_slice(&public_key.to_bytes());
        bytes.push(OP_CHECKSIG);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Which standard pattern this script matches, if any.
    pub fn kind(&self) -> Option<ScriptKind> {
        let b = self.as_bytes();
        if b.len() == P2PKH_LEN
            && b[0] == OP_DUP
            && b[1] == OP_HASH160
            && b[2] == ADDRESS_LEN as u8
            && b[P2PKH_LEN - 2] == OP_EQUALVERIFY
            && b[P2PKH_LEN - 1] == OP_CHECKSIG
        {
            return Some(ScriptKind::PayToPubkeyHash);
        }
        if b.len() == P2PK_LEN && b[0] == PUBLIC_KEY_LEN as u8 && b[P2PK_LEN - 1] == OP_CHECKSIG {
            return Some(ScriptKind::PayToPubkey);
        }
        None
    }

    /// Resolve the address this script pays, if it is a standard pattern.
    pub fn address(&self) -> Result<Address, ScriptError> {
        let b = self.as_bytes();
        match self.kind() {
            Some(ScriptKind::PayToPubkeyHash) => {
                Address::from_slice(&b[3..3 + ADDRESS_LEN]).map_err(|_| ScriptError::Unrecognized)
            }
            Some(ScriptKind::PayToPubkey) => Ok(Address(hash160(&b[1..1 + PUBLIC_KEY_LEN]))),
            None => Err(ScriptError::Unrecognized),
        }
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", hex::encode(&self.0))
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Script).map_err(serde::de::Error::custom)
    }
}

/// Classifier recognizing the two standard patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardClassifier;

impl ScriptClassifier for StandardClassifier {
    fn classify(&self, script: &Script) -> Result<Address, ScriptError> {
        script.address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn p2pkh_classifies_to_embedded_address() {
        let addr = Address([0x5A; 20]);
        let script = Script::pay_to_address(&addr);
        assert_eq!(script.len(), 25);
        assert_eq!(script.kind(), Some(ScriptKind::PayToPubkeyHash));
        assert_eq!(StandardClassifier.classify(&script).unwrap(), addr);
    }

    #[test]
    fn p2pk_classifies_to_hashed_key() {
        let pk = KeyPair::from_secret_bytes([3u8; 32]).public_key();
        let script = Script::pay_to_pubkey(&pk);
        assert_eq!(script.kind(), Some(ScriptKind::PayToPubkey));
        assert_eq!(
            StandardClassifier.classify(&script).unwrap(),
            Address::from_public_key(&pk)
        );
    }

    #[test]
    fn both_forms_of_same_key_agree() {
        let pk = KeyPair::from_secret_bytes([4u8; 32]).public_key();
        let addr = Address::from_public_key(&pk);
        assert_eq!(
            Script::pay_to_pubkey(&pk).address().unwrap(),
            Script::pay_to_address(&addr).address().unwrap()
        );
    }

    #[test]
    fn empty_script_unrecognized() {
        assert_eq!(
            StandardClassifier.classify(&Script::default()).unwrap_err(),
            ScriptError::Unrecognized
        );
    }

    #[test]
    fn truncated_p2pkh_unrecognized() {
        let mut script = Script::pay_to_address(&Address([1; 20]));
        script.0.pop();
        assert_eq!(script.kind(), None);
        assert!(script.address().is_err());
    }

    #[test]
    fn wrong_opcode_unrecognized() {
        let mut script = Script::pay_to_address(&Address([1; 20]));
        script.0[1] = 0xa8; // OP_SHA256 instead of OP_HASH160
        assert_eq!(script.kind(), None);
    }

    #[test]
    fn serde_hex_roundtrip() {
        let script = Script::pay_to_address(&Address([0x10; 20]));
        let json = serde_json::to_string(&script).unwrap();
        assert!(json.starts_with("\"76a914"));
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
