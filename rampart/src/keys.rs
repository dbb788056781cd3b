//! The pair of session keys shared by the cookie maker and checker

use std::fmt;

use parking_lot::{RwLock, RwLockReadGuard};
use zeroize::{Zeroize, ZeroizeOnDrop};

use rampart_ciphers::KEY_LEN;
use rampart_constant_time::memcmp;

use crate::constants::SHARED_SECRET_LEN;
use crate::hash_domains;

/// Opaque value derived from long-term identity key material by the surrounding handshake
pub type SharedSecret = [u8; SHARED_SECRET_LEN];

/// Keys derived from a [SharedSecret]; an all-zero set means there is no session
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct PrecomputedKeySet {
    pub mac1_key: [u8; KEY_LEN],
    pub cookie_key: [u8; KEY_LEN],
}

impl PrecomputedKeySet {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn derive(input: &SharedSecret) -> Self {
        Self {
            mac1_key: hash_domains::mac1_key(input),
            cookie_key: hash_domains::cookie_key(input),
        }
    }

    pub fn is_zero(&self) -> bool {
        let zero = [0u8; KEY_LEN];
        memcmp(&self.mac1_key, &zero) & memcmp(&self.cookie_key, &zero)
    }
}

impl fmt::Debug for PrecomputedKeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrecomputedKeySet")
            .field("is_zero", &self.is_zero())
            .finish_non_exhaustive()
    }
}

/// A [PrecomputedKeySet] behind a reader/writer lock
///
/// Read on every packet, written only on rekey. Both keys are swapped under one exclusive lock,
/// so readers never observe a mix of old and new keys.
#[derive(Debug, Default)]
pub struct KeyStore {
    keys: RwLock<PrecomputedKeySet>,
}

impl KeyStore {
    pub fn new(input: Option<&SharedSecret>) -> Self {
        let store = Self::default();
        store.update(input);
        store
    }

    /// Replaces both keys; `None` zeroes them on session teardown
    pub fn update(&self, input: Option<&SharedSecret>) {
        let fresh = match input {
            Some(input) => PrecomputedKeySet::derive(input),
            None => PrecomputedKeySet::zero(),
        };
        let mut keys = self.keys.write();
        *keys = fresh;
    }

    pub fn read(&self) -> RwLockReadGuard<'_, PrecomputedKeySet> {
        self.keys.read()
    }
}
