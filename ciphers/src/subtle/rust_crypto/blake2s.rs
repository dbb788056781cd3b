//! BLAKE2s as implemented in [RustCrypto](https://github.com/RustCrypto/hashes/tree/master/blake2)
//!
//! Keyed mode produces 16 byte tags (MACs, cookies, table slots); unkeyed mode produces 32 byte
//! digests used for key derivation. Inputs are passed as chunks and hashed as if concatenated.

use core::convert::Infallible;

use blake2::digest::generic_array::GenericArray;
use blake2::digest::typenum::U16;
use blake2::digest::{Digest, FixedOutput, Mac};
use blake2::{Blake2s256, Blake2sMac};

use rampart_cipher_traits::{CipherError, Hash, HashBlake2s, KeyedHash, KeyedHashBlake2s};

/// BLAKE2s in keyed mode with a 16 byte output.
type MacImpl = Blake2sMac<U16>;

/// Length of a full size key.
pub const KEY_LEN: usize = 32;
/// Length of the short keys used when a previously issued tag serves as a key
pub const SHORT_KEY_LEN: usize = 16;
/// Length of a keyed hash output.
pub const MAC_LEN: usize = 16;
/// Length of an unkeyed hash output.
pub const HASH_LEN: usize = 32;

/// Marker type implementing the keyed hash and hash traits with BLAKE2s.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Blake2s;

impl KeyedHash<KEY_LEN, MAC_LEN> for Blake2s {
    type Error = Infallible;

    fn keyed_hash(
        key: &[u8; KEY_LEN],
        data: &[&[u8]],
        out: &mut [u8; MAC_LEN],
    ) -> Result<(), Self::Error> {
        let mut h = <MacImpl as Mac>::new(GenericArray::from_slice(key));
        for chunk in data {
            Mac::update(&mut h, chunk);
        }
        FixedOutput::finalize_into(h, GenericArray::from_mut_slice(out));
        Ok(())
    }
}

impl KeyedHash<SHORT_KEY_LEN, MAC_LEN> for Blake2s {
    type Error = CipherError;

    fn keyed_hash(
        key: &[u8; SHORT_KEY_LEN],
        data: &[&[u8]],
        out: &mut [u8; MAC_LEN],
    ) -> Result<(), Self::Error> {
        // BLAKE2s accepts any key of up to 32 bytes, so this cannot fail for a 16 byte key
        let mut h =
            <MacImpl as Mac>::new_from_slice(key).map_err(|_| CipherError::InvalidLengths)?;
        for chunk in data {
            Mac::update(&mut h, chunk);
        }
        FixedOutput::finalize_into(h, GenericArray::from_mut_slice(out));
        Ok(())
    }
}

impl Hash<HASH_LEN> for Blake2s {
    fn hash(data: &[&[u8]], out: &mut [u8; HASH_LEN]) {
        let mut h = Blake2s256::new();
        for chunk in data {
            Digest::update(&mut h, chunk);
        }
        Digest::finalize_into(h, GenericArray::from_mut_slice(out));
    }
}

impl KeyedHashBlake2s for Blake2s {}
impl HashBlake2s for Blake2s {}

/// Computes the keyed BLAKE2s tag of the concatenation of `data` under a 32 byte `key`.
///
/// # Examples
///
/// ```rust
/// use rampart_ciphers::keyed_hash::mac;
///
/// let key = [7u8; 32];
/// assert_eq!(mac(&key, &[b"hello ", b"world"]), mac(&key, &[b"hello world"]));
/// assert_ne!(mac(&key, &[b"hello world"]), mac(&[8u8; 32], &[b"hello world"]));
/// ```
#[inline]
pub fn mac(key: &[u8; KEY_LEN], data: &[&[u8]]) -> [u8; MAC_LEN] {
    let mut out = [0u8; MAC_LEN];
    match <Blake2s as KeyedHash<KEY_LEN, MAC_LEN>>::keyed_hash(key, data, &mut out) {
        Ok(()) => out,
        Err(never) => match never {},
    }
}

/// Computes the keyed BLAKE2s tag of the concatenation of `data` under a 16 byte `key`.
#[inline]
pub fn mac_short_key(
    key: &[u8; SHORT_KEY_LEN],
    data: &[&[u8]],
) -> Result<[u8; MAC_LEN], CipherError> {
    let mut out = [0u8; MAC_LEN];
    <Blake2s as KeyedHash<SHORT_KEY_LEN, MAC_LEN>>::keyed_hash(key, data, &mut out)?;
    Ok(out)
}

/// Computes the unkeyed BLAKE2s-256 digest of the concatenation of `data`.
#[inline]
pub fn hash(data: &[&[u8]]) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    <Blake2s as Hash<HASH_LEN>>::hash(data, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn blake2s_256_known_answer() {
        // RFC 7693, Appendix B
        assert_eq!(
            hash(&[b"abc"]),
            hex!("508c5e8c327c14e2e1a72ba34eeb452f37458b209ed63a294d999b4c86675982")
        );
    }

    #[test]
    fn chunks_hash_like_their_concatenation() {
        assert_eq!(hash(&[b"a", b"", b"bc"]), hash(&[b"abc"]));

        let key = [0x42; SHORT_KEY_LEN];
        assert_eq!(
            mac_short_key(&key, &[b"message", b"mac1"]).unwrap(),
            mac_short_key(&key, &[b"messagemac1"]).unwrap()
        );
    }

    #[test]
    fn key_length_is_part_of_the_function() {
        // A short key is not the same as that key padded with zeroes
        let short = [0x11; SHORT_KEY_LEN];
        let mut padded = [0u8; KEY_LEN];
        padded[..SHORT_KEY_LEN].copy_from_slice(&short);

        assert_ne!(mac_short_key(&short, &[b"x"]).unwrap(), mac(&padded, &[b"x"]));
    }

    #[test]
    fn keyed_differs_from_unkeyed() {
        let key = [0u8; KEY_LEN];
        assert_ne!(mac(&key, &[b"abc"])[..], hash(&[b"abc"])[..MAC_LEN]);
    }
}
