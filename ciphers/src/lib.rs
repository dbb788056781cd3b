use static_assertions::const_assert;

pub mod providers;
pub mod subtle;

/// All keyed primitives in this crate use 32 byte keys
pub const KEY_LEN: usize = 32;
const_assert!(KEY_LEN == xaead::KEY_LEN);
const_assert!(KEY_LEN == keyed_hash::KEY_LEN);
const_assert!(KEY_LEN == hash::HASH_LEN);

pub use rampart_cipher_traits::CipherError;

/// Keyed hashing with BLAKE2s and a 16 byte output
///
/// Used for MACs, cookies and to derive rate limiter table slots.
pub mod keyed_hash {
    pub use crate::subtle::rust_crypto::blake2s::{mac, mac_short_key, KEY_LEN, MAC_LEN, SHORT_KEY_LEN};
}

/// Unkeyed BLAKE2s with a 32 byte output, used for key derivation
pub mod hash {
    pub use crate::subtle::rust_crypto::blake2s::{hash, HASH_LEN};
}

/// Authenticated encryption with associated data with a random nonce
/// XChacha20poly1305 is used.
pub mod xaead {
    pub use crate::subtle::rust_crypto::xchacha20poly1305_ietf::{
        decrypt, encrypt, KEY_LEN, NONCE_LEN, TAG_LEN,
    };
}

/// The keyed hash of the active [Provider]
pub type KeyedHash = <Provider as rampart_cipher_traits::Provider>::KeyedBlake2s;
/// The AEAD of the active [Provider]
pub type XAead = <Provider as rampart_cipher_traits::Provider>::XChaCha20Poly1305;

pub type Provider = providers::basic::BasicProvider;
