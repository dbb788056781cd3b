mod algorithms;
mod primitives;

pub use algorithms::*;
pub use primitives::*;

/// Bundles the concrete algorithms a crate uses behind one type, so the
/// choice of implementation can be swapped in a single place.
pub trait Provider {
    type KeyedBlake2s: KeyedHashBlake2s;
    type Blake2s: HashBlake2s;

    type XChaCha20Poly1305: AeadXChaCha20Poly1305;
}
