use rampart_cipher_traits::Provider;

use crate::subtle::rust_crypto::{blake2s::Blake2s, xchacha20poly1305_ietf::XChaCha20Poly1305};

/// Provider backed by the RustCrypto implementations
#[derive(Debug)]
pub struct BasicProvider;

impl Provider for BasicProvider {
    type KeyedBlake2s = Blake2s;

    type Blake2s = Blake2s;

    type XChaCha20Poly1305 = XChaCha20Poly1305;
}
