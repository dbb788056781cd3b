//! This module provides functionality for generating random numbers using the [rand] crate.

/// We use the [ThreadRng](::rand::rngs::ThreadRng) for randomness in this crate.
pub type Rng = ::rand::rngs::ThreadRng;

/// Get the default [Rng].
pub fn rng() -> Rng {
    ::rand::thread_rng()
}

/// Returns an array filled with fresh random bytes
///
/// # Examples
///
/// ```rust
/// use rampart_util::rand::random_bytes;
///
/// let a: [u8; 32] = random_bytes();
/// let b: [u8; 32] = random_bytes();
/// assert_ne!(a, b);
/// ```
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    ::rand::RngCore::fill_bytes(&mut rng(), &mut buf);
    buf
}
