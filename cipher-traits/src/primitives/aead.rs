use thiserror::Error;

/// Models authenticated encryption with associated data (AEAD) functionality.
///
/// The methods take a `&self` receiver so implementations can be used through an instance,
/// which keeps type inference smooth at the call site. Implementors should also implement
/// [`Default`] where possible.
///
/// ```
/// use rampart_cipher_traits::Aead;
///
/// const KEY_LEN: usize = 32;
/// const NONCE_LEN: usize = 24;
/// const TAG_LEN: usize = 16;
///
/// fn seal_cookie<AeadImpl>(
///     aead: &AeadImpl,
///     key: &[u8; KEY_LEN],
///     nonce: &[u8; NONCE_LEN],
///     cookie: &[u8; 16],
/// ) -> [u8; 16 + TAG_LEN]
/// where
///     AeadImpl: Aead<KEY_LEN, NONCE_LEN, TAG_LEN>,
/// {
///     let mut sealed = [0u8; 16 + TAG_LEN];
///     aead.encrypt(&mut sealed, key, nonce, b"", cookie).unwrap();
///     sealed
/// }
/// ```
pub trait Aead<const KEY_LEN: usize, const NONCE_LEN: usize, const TAG_LEN: usize> {
    const KEY_LEN: usize = KEY_LEN;
    const NONCE_LEN: usize = NONCE_LEN;
    const TAG_LEN: usize = TAG_LEN;

    /// Encrypts `plaintext` using the given `key` and `nonce`, authenticating the additional
    /// data `ad` and writes ciphertext followed by the tag into `ciphertext`.
    ///
    /// `ciphertext` must be exactly `TAG_LEN` longer than `plaintext`.
    fn encrypt(
        &self,
        ciphertext: &mut [u8],
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        ad: &[u8],
        plaintext: &[u8],
    ) -> Result<(), Error>;

    /// Decrypts and authenticates `ciphertext` (ciphertext followed by the tag) using the
    /// given `key`, `nonce` and additional data `ad` and writes the result into `plaintext`.
    ///
    /// `ciphertext` must be exactly `TAG_LEN` longer than `plaintext`. On failure the contents
    /// of `plaintext` are unspecified and must not be used.
    fn decrypt(
        &self,
        plaintext: &mut [u8],
        key: &[u8; KEY_LEN],
        nonce: &[u8; NONCE_LEN],
        ad: &[u8],
        ciphertext: &[u8],
    ) -> Result<(), Error>;
}

/// The error returned by the primitives in this crate
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An internal error occurred. This should never happen and indicates an error in the
    /// primitive's implementation.
    #[error("internal error")]
    InternalError,

    /// Could not decrypt a message because the message is not a valid ciphertext for the given
    /// key, nonce and additional data.
    #[error("decryption error")]
    DecryptError,

    /// The provided buffers or keys have the wrong lengths.
    #[error("buffers have invalid length")]
    InvalidLengths,
}
