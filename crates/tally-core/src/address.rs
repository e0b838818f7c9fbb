//! 160-bit addresses identifying a key by the hash of its public key.
//!
//! An [`Address`] is the first 20 bytes of `BLAKE3(SHA-256(public_key))`.
//! It is network-agnostic and is the sole key used by the wallet's key
//! registry and the address index. For display to users an address can be
//! wrapped in Base58Check with a per-network version byte:
//! - Mainnet: version `0x00`
//! - Testnet: version `0x6f`
//!
//! The checksum is the first 4 bytes of double SHA-256 over `version || hash`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::constants::ADDRESS_LEN;
use crate::crypto::PublicKey;
use crate::error::AddressError;

/// Network identifier determining the Base58Check version byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
}

impl Network {
    /// Base58Check version byte for this network.
    pub fn version_byte(&self) -> u8 {
        match self {
            Network::Mainnet => 0x00,
            Network::Testnet => 0x6f,
        }
    }

    /// Look up the network from a Base58Check version byte.
    pub fn from_version_byte(version: u8) -> Result<Self, AddressError> {
        match version {
            0x00 => Ok(Network::Mainnet),
            0x6f => Ok(Network::Testnet),
            other => Err(AddressError::UnknownVersion(other)),
        }
    }
}

/// A 160-bit public key hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// Derive the address controlled by a public key.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(hash160(&public_key.to_bytes()))
    }

    /// Create an address from a raw 20-byte hash.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let arr: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Parse the 40-character hex form produced by `Display`.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let bytes = hex::decode(s).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// Encode as Base58Check for the given network.
    pub fn to_base58(&self, network: Network) -> String {
        let mut payload = Vec::with_capacity(1 + ADDRESS_LEN + 4);
        payload.push(network.version_byte());
        payload.extend_from_slice(&self.0);
        let checksum = base58_checksum(&payload);
        payload.extend_from_slice(&checksum);
        bs58::encode(payload).into_string()
    }

    /// Decode a Base58Check string, returning the address and its network.
    pub fn from_base58(s: &str) -> Result<(Self, Network), AddressError> {
        let data = bs58::decode(s)
            .into_vec()
            .map_err(|e| AddressError::InvalidBase58(e.to_string()))?;
        if data.len() != 1 + ADDRESS_LEN + 4 {
            return Err(AddressError::InvalidLength(data.len()));
        }

        let (payload, checksum) = data.split_at(1 + ADDRESS_LEN);
        if base58_checksum(payload).as_slice() != checksum {
            return Err(AddressError::InvalidChecksum);
        }

        let network = Network::from_version_byte(payload[0])?;
        Ok((Self::from_slice(&payload[1..])?, network))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", hex::encode(self.0))
    }
}

/// Accepts either the hex form or a Base58Check string of any known network.
impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == ADDRESS_LEN * 2 && s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Self::from_hex(s);
        }
        Self::from_base58(s).map(|(addr, _)| addr)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Compute the 160-bit hash of raw public key bytes.
pub fn hash160(data: &[u8]) -> [u8; ADDRESS_LEN] {
    let sha = Sha256::digest(data);
    let digest = blake3::hash(&sha);
    let mut out = [0u8; ADDRESS_LEN];
    out.copy_from_slice(&digest.as_bytes()[..ADDRESS_LEN]);
    out
}

fn base58_checksum(payload: &[u8]) -> [u8; 4] {
    let first = Sha256::digest(payload);
    let second = Sha256::digest(first);
    let mut out = [0u8; 4];
    out.copy_from_slice(&second[..4]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    // --- Network ---

    #[test]
    fn network_version_bytes_roundtrip() {
        for net in [Network::Mainnet, Network::Testnet] {
            assert_eq!(Network::from_version_byte(net.version_byte()).unwrap(), net);
        }
        assert_eq!(
            Network::from_version_byte(0x05).unwrap_err(),
            AddressError::UnknownVersion(0x05)
        );
    }

    // --- Derivation ---

    #[test]
    fn from_public_key_deterministic() {
        let pk = KeyPair::from_secret_bytes([7u8; 32]).public_key();
        assert_eq!(Address::from_public_key(&pk), Address::from_public_key(&pk));
    }

    #[test]
    fn different_keys_different_addresses() {
        let a = Address::from_public_key(&KeyPair::from_secret_bytes([1u8; 32]).public_key());
        let b = Address::from_public_key(&KeyPair::from_secret_bytes([2u8; 32]).public_key());
        assert_ne!(a, b);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert_eq!(
            Address::from_slice(&[0u8; 19]).unwrap_err(),
            AddressError::InvalidLength(19)
        );
    }

    // --- Encodings ---

    #[test]
    fn display_is_hex() {
        let addr = Address([0xAB; 20]);
        let s = addr.to_string();
        assert_eq!(s.len(), 40);
        assert_eq!(s.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn base58_roundtrip_preserves_network() {
        let addr = Address([0x42; 20]);
        let encoded = addr.to_base58(Network::Testnet);
        let (decoded, net) = Address::from_base58(&encoded).unwrap();
        assert_eq!(decoded, addr);
        assert_eq!(net, Network::Testnet);
        assert_eq!(encoded.parse::<Address>().unwrap(), addr);
    }

    #[test]
    fn mainnet_base58_starts_with_one() {
        // Leading zero version byte encodes as '1' in Base58.
        let encoded = Address([0x42; 20]).to_base58(Network::Mainnet);
        assert!(encoded.starts_with('1'));
    }

    #[test]
    fn base58_bad_checksum_rejected() {
        let mut data = vec![0x00];
        data.extend_from_slice(&[0x42; 20]);
        data.extend_from_slice(&[0, 0, 0, 0]);
        let encoded = bs58::encode(data).into_string();
        assert_eq!(
            Address::from_base58(&encoded).unwrap_err(),
            AddressError::InvalidChecksum
        );
    }

    #[test]
    fn base58_invalid_characters_rejected() {
        assert!(matches!(
            Address::from_base58("0OIl"),
            Err(AddressError::InvalidBase58(_))
        ));
    }

    #[test]
    fn serde_uses_hex_string() {
        let addr = Address([0x01; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
