use rampart_cipher_traits::{Aead, AeadXChaCha20Poly1305, CipherError};

use chacha20poly1305::aead::generic_array::GenericArray;
use chacha20poly1305::XChaCha20Poly1305 as AeadImpl;
use chacha20poly1305::{AeadInPlace, KeyInit};

/// The key length is 32 bytes or 256 bits.
pub const KEY_LEN: usize = 32;
/// The MAC tag length is 16 bytes or 128 bits.
pub const TAG_LEN: usize = 16;
/// The nonce length is 24 bytes or 192 bits.
pub const NONCE_LEN: usize = 24;

/// XChaCha20Poly1305 as implemented in [RustCrypto](https://github.com/RustCrypto/AEADs/tree/master/chacha20poly1305).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct XChaCha20Poly1305;

impl Aead<KEY_LEN, NONCE_LEN, TAG_LEN> for XChaCha20Poly1305 {
    fn encrypt(
        &self,
        ciphertext: &mut [u8],
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        ad: &[u8],
        plaintext: &[u8],
    ) -> Result<(), CipherError> {
        if ciphertext.len() != plaintext.len() + TAG_LEN {
            return Err(CipherError::InvalidLengths);
        }

        let (ct, tag) = ciphertext.split_at_mut(plaintext.len());
        ct.copy_from_slice(plaintext);

        let encrypter = AeadImpl::new(GenericArray::from_slice(key));
        let tag_value = encrypter
            .encrypt_in_place_detached(GenericArray::from_slice(nonce), ad, ct)
            .map_err(|_| CipherError::InternalError)?;
        tag.copy_from_slice(&tag_value);
        Ok(())
    }

    fn decrypt(
        &self,
        plaintext: &mut [u8],
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        ad: &[u8],
        ciphertext: &[u8],
    ) -> Result<(), CipherError> {
        if ciphertext.len() != plaintext.len() + TAG_LEN {
            return Err(CipherError::InvalidLengths);
        }

        let (ct, tag) = ciphertext.split_at(plaintext.len());
        plaintext.copy_from_slice(ct);

        let decrypter = AeadImpl::new(GenericArray::from_slice(key));
        let res = decrypter.decrypt_in_place_detached(
            GenericArray::from_slice(nonce),
            ad,
            plaintext,
            GenericArray::from_slice(tag),
        );

        if res.is_err() {
            // Never hand out unauthenticated plaintext
            plaintext.fill(0);
            return Err(CipherError::DecryptError);
        }
        Ok(())
    }
}

impl AeadXChaCha20Poly1305 for XChaCha20Poly1305 {}

/// Encrypts `plaintext` into `ciphertext` (ciphertext followed by a [TAG_LEN] byte tag) using
/// XChaCha20Poly1305. The `nonce` MUST be chosen randomly for every call.
///
/// # Examples
///```rust
/// # use rampart_ciphers::xaead::{encrypt, decrypt, TAG_LEN, KEY_LEN, NONCE_LEN};
/// let key = [0u8; KEY_LEN]; // THIS IS NOT A SECURE KEY
/// let nonce = [0u8; NONCE_LEN]; // THIS IS NOT A SECURE NONCE
/// let cookie = [0x2a; 16];
///
/// let mut sealed = [0u8; 16 + TAG_LEN];
/// encrypt(&mut sealed, &key, &nonce, b"mac1", &cookie)?;
///
/// let mut opened = [0u8; 16];
/// decrypt(&mut opened, &key, &nonce, b"mac1", &sealed)?;
/// assert_eq!(opened, cookie);
///
/// // Different additional data fails authentication
/// assert!(decrypt(&mut opened, &key, &nonce, b"mac2", &sealed).is_err());
/// # Ok::<(), rampart_ciphers::CipherError>(())
///```
#[inline]
pub fn encrypt(
    ciphertext: &mut [u8],
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ad: &[u8],
    plaintext: &[u8],
) -> Result<(), CipherError> {
    XChaCha20Poly1305.encrypt(ciphertext, key, nonce, ad, plaintext)
}

/// Decrypts and authenticates `ciphertext` produced by [encrypt] into `plaintext`.
///
/// Returns [CipherError::DecryptError] if the tag does not verify under `key`, `nonce` and `ad`.
#[inline]
pub fn decrypt(
    plaintext: &mut [u8],
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ad: &[u8],
    ciphertext: &[u8],
) -> Result<(), CipherError> {
    XChaCha20Poly1305.decrypt(plaintext, key, nonce, ad, ciphertext)
}
