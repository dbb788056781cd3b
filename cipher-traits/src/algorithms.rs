//! Marker traits binding a primitive trait to the sizes of one concrete algorithm.

pub mod keyed_hash_blake2s {
    use crate::primitives::keyed_hash::*;

    pub const KEY_LEN: usize = 32;
    pub const OUT_LEN: usize = 16;

    pub trait KeyedHashBlake2s: KeyedHash<KEY_LEN, OUT_LEN> {}
}

pub mod hash_blake2s {
    use crate::primitives::keyed_hash::*;

    pub const OUT_LEN: usize = 32;

    pub trait HashBlake2s: Hash<OUT_LEN> {}
}

pub mod aead_xchacha20poly1305 {
    use crate::primitives::aead::*;

    pub const KEY_LEN: usize = 32;
    pub const NONCE_LEN: usize = 24;
    pub const TAG_LEN: usize = 16;

    pub trait AeadXChaCha20Poly1305: Aead<KEY_LEN, NONCE_LEN, TAG_LEN> {}
}

pub use aead_xchacha20poly1305::AeadXChaCha20Poly1305;
pub use hash_blake2s::HashBlake2s;
pub use keyed_hash_blake2s::KeyedHashBlake2s;
