//! Key registry: the mapping from address to signing key.
//!
//! Keys are added explicitly and never removed. A key may be watch-only
//! (public half only), in which case coins paying its address are tracked
//! and counted in the balance but cannot be spent.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use tally_core::address::Address;
use tally_core::crypto::{KeyPair, PublicKey};

use crate::error::WalletError;

/// A registered key: full keypair or public-only.
#[derive(Clone)]
pub enum Key {
    /// Key with an extractable private half.
    Signing(KeyPair),
    /// Public key only; coins are visible but not spendable.
    WatchOnly(PublicKey),
}

impl Key {
    /// The public half of this key.
    pub fn public_key(&self) -> PublicKey {
        match self {
            Key::Signing(kp) => kp.public_key(),
            Key::WatchOnly(pk) => pk.clone(),
        }
    }

    /// The address this key controls.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// The signing keypair, if the private half is available.
    pub fn keypair(&self) -> Option<&KeyPair> {
        match self {
            Key::Signing(kp) => Some(kp),
            Key::WatchOnly(_) => None,
        }
    }

    pub fn is_watch_only(&self) -> bool {
        matches!(self, Key::WatchOnly(_))
    }
}

impl From<KeyPair> for Key {
    fn from(kp: KeyPair) -> Self {
        Key::Signing(kp)
    }
}

impl From<PublicKey> for Key {
    fn from(pk: PublicKey) -> Self {
        Key::WatchOnly(pk)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Signing(kp) => f.debug_tuple("Signing").field(&kp.public_key()).finish(),
            Key::WatchOnly(pk) => f.debug_tuple("WatchOnly").field(pk).finish(),
        }
    }
}

/// Address → key mapping with O(1) lookups.
#[derive(Default)]
pub struct KeyRegistry {
    keys: HashMap<Address, Key>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key under the address of its public key.
    ///
    /// Silently replaces any key already registered for that address.
    pub fn add_key(&mut self, key: impl Into<Key>) -> Address {
        let key = key.into();
        let address = key.address();
        self.keys.insert(address, key);
        address
    }

    pub fn has_key(&self, address: &Address) -> bool {
        self.keys.contains_key(address)
    }

    /// Look up the key registered for `address`.
    pub fn get_key(&self, address: &Address) -> Result<&Key, WalletError> {
        self.keys
            .get(address)
            .ok_or(WalletError::KeyNotFound(*address))
    }

    /// Snapshot of all registered addresses, in a stable order.
    pub fn addresses(&self) -> BTreeSet<Address> {
        self.keys.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let watch_only = self.keys.values().filter(|k| k.is_watch_only()).count();
        f.debug_struct("KeyRegistry")
            .field("keys", &self.keys.len())
            .field("watch_only", &watch_only)
            .finish()
    }
}
