//! Byte layouts owned by this crate
//!
//! Only two formats are visible on the wire: the MAC trailer appended to every handshake
//! message and the cookie reply payload. Everything else about the handshake messages belongs to
//! the surrounding protocol.

use static_assertions::const_assert_eq;
use zerocopy::{AsBytes, FromBytes, FromZeroes, Ref};

use rampart_ciphers::xaead;

use crate::constants::{COOKIE_LEN, MAC_LEN};
use crate::RampartError;

/// Length of the MAC trailer
pub const MAC_TRAILER_LEN: usize = 2 * MAC_LEN;
/// Length of the nonce of a cookie reply
pub const COOKIE_NONCE_LEN: usize = xaead::NONCE_LEN;
/// Length of an encrypted cookie: cookie followed by the authentication tag
pub const COOKIE_CIPHERTEXT_LEN: usize = COOKIE_LEN + xaead::TAG_LEN;
/// Length of a cookie reply payload
pub const COOKIE_REPLY_PAYLOAD_LEN: usize = COOKIE_NONCE_LEN + COOKIE_CIPHERTEXT_LEN;

/// `mac1 || mac2`, placed at the very end of a handshake message
///
/// `mac2` is all zeroes when the initiator holds no usable cookie.
#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MacTrailer {
    pub mac1: [u8; MAC_LEN],
    pub mac2: [u8; MAC_LEN],
}

/// `nonce || ciphertext`, sent by the responder in answer to a message it did not process
#[repr(C)]
#[derive(AsBytes, FromBytes, FromZeroes, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CookieReplyPayload {
    pub nonce: [u8; COOKIE_NONCE_LEN],
    pub ciphertext: [u8; COOKIE_CIPHERTEXT_LEN],
}

const_assert_eq!(std::mem::size_of::<MacTrailer>(), MAC_TRAILER_LEN);
const_assert_eq!(std::mem::size_of::<CookieReplyPayload>(), COOKIE_REPLY_PAYLOAD_LEN);
const_assert_eq!(COOKIE_REPLY_PAYLOAD_LEN, 56);

impl CookieReplyPayload {
    /// Parses a payload; the buffer must be exactly [COOKIE_REPLY_PAYLOAD_LEN] bytes long
    ///
    /// ```
    /// use rampart::msgs::{CookieReplyPayload, COOKIE_REPLY_PAYLOAD_LEN};
    /// use rampart::RampartError;
    ///
    /// let mut wire = [0u8; COOKIE_REPLY_PAYLOAD_LEN];
    /// wire[0] = 0xaa;
    /// wire[24] = 0xbb;
    /// let payload = CookieReplyPayload::parse(&wire)?;
    /// assert_eq!(payload.nonce[0], 0xaa);
    /// assert_eq!(payload.ciphertext[0], 0xbb);
    ///
    /// assert_eq!(
    ///     CookieReplyPayload::parse(&wire[1..]),
    ///     Err(RampartError::BufferSizeMismatch { required_size: 56, actual_size: 55 })
    /// );
    /// # Ok::<(), RampartError>(())
    /// ```
    pub fn parse(buf: &[u8]) -> Result<Self, RampartError> {
        RampartError::check_buffer_size(COOKIE_REPLY_PAYLOAD_LEN, buf.len())?;
        Self::read_from(buf).ok_or(RampartError::BufferSizeMismatch {
            required_size: COOKIE_REPLY_PAYLOAD_LEN,
            actual_size: buf.len(),
        })
    }

    pub fn to_bytes(&self) -> [u8; COOKIE_REPLY_PAYLOAD_LEN] {
        let mut out = [0u8; COOKIE_REPLY_PAYLOAD_LEN];
        out.copy_from_slice(self.as_bytes());
        out
    }
}

/// Splits a handshake message into its body and its MAC trailer
pub fn split_trailer(buf: &[u8]) -> Result<(&[u8], MacTrailer), RampartError> {
    RampartError::check_min_size(MAC_TRAILER_LEN, buf.len())?;
    let (body, trailer) = Ref::<&[u8], MacTrailer>::new_from_suffix(buf).ok_or(
        RampartError::MessageTooShort {
            min_size: MAC_TRAILER_LEN,
            actual_size: buf.len(),
        },
    )?;
    Ok((body, *trailer))
}

/// Splits a handshake message buffer into its body and the space reserved for the trailer
pub fn split_trailer_mut(
    buf: &mut [u8],
) -> Result<(&mut [u8], Ref<&mut [u8], MacTrailer>), RampartError> {
    let actual_size = buf.len();
    RampartError::check_min_size(MAC_TRAILER_LEN, actual_size)?;
    Ref::<&mut [u8], MacTrailer>::new_from_suffix(buf).ok_or(RampartError::MessageTooShort {
        min_size: MAC_TRAILER_LEN,
        actual_size,
    })
}
