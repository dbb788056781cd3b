//! Implementations backed by RustCrypto

pub mod blake2s;
pub mod xchacha20poly1305_ietf;
