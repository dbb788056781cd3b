//! Traits for cryptographic primitives used in Rampart, specifically AEAD, keyed hashing and
//! plain hashing.

pub(crate) mod aead;
pub(crate) mod keyed_hash;

pub use aead::{Aead, Error as CipherError};
pub use keyed_hash::*;
