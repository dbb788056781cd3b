//! Rampart protects a secure-channel responder from resource exhaustion before the handshake
//! has authenticated anyone.
//!
//! - [cookie::CookieMaker] lives with the initiator's peer session. It computes MAC1 and MAC2
//!   for every outgoing handshake message and consumes cookie replies.
//! - [cookie::CookieChecker] lives with the responder's local identity. It verifies incoming
//!   MACs, issues cookie replies while under load and owns a [ratelimiter::RateLimiter].
//!
//! ```
//! use std::net::SocketAddr;
//! use rampart::cookie::{CookieChecker, CookieMaker, MacVerdict};
//!
//! let shared_secret = [7u8; 32];
//! let initiator: SocketAddr = "192.0.2.1:51820".parse()?;
//!
//! let maker = CookieMaker::new(&shared_secret);
//! let checker = CookieChecker::new();
//! checker.update_keys(Some(&shared_secret));
//!
//! let message = b"handshake initiation";
//! let macs = maker.compute_macs(message);
//!
//! // Under load, the first attempt is answered with a cookie reply
//! let verdict = checker.validate_macs(message, &macs.mac1, &macs.mac2, true, &initiator.into());
//! assert_eq!(verdict, MacVerdict::NeedsCookie);
//!
//! let reply = checker.create_cookie_reply_payload(&macs.mac1, &initiator.into())?;
//! maker.consume_cookie_reply(&reply.nonce, &reply.ciphertext)?;
//!
//! // The retry proves return-routability
//! let macs = maker.compute_macs(message);
//! let verdict = checker.validate_macs(message, &macs.mac1, &macs.mac2, true, &initiator.into());
//! assert_eq!(verdict, MacVerdict::Ok);
//! # Ok::<(), anyhow::Error>(())
//! ```

use rampart_cipher_traits::CipherError;

pub mod address;
pub mod cli;
pub mod config;
pub mod constants;
pub mod cookie;
pub mod hash_domains;
pub mod keys;
pub mod msgs;
pub mod ratelimiter;
pub mod simulate;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RampartError {
    #[error("no outstanding mac1 to authenticate a cookie reply against")]
    Expired,
    #[error("cookie reply failed authentication")]
    InvalidReply,
    #[error("buffer size mismatch, required {required_size} but found {actual_size}")]
    BufferSizeMismatch {
        required_size: usize,
        actual_size: usize,
    },
    #[error("message too short, required at least {min_size} but found {actual_size}")]
    MessageTooShort { min_size: usize, actual_size: usize },
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
}

impl RampartError {
    /// Helper function to check a buffer size
    fn check_buffer_size(required_size: usize, actual_size: usize) -> Result<(), Self> {
        if required_size != actual_size {
            Err(Self::BufferSizeMismatch {
                required_size,
                actual_size,
            })
        } else {
            Ok(())
        }
    }

    /// Helper function to check that a buffer holds at least `min_size` bytes
    fn check_min_size(min_size: usize, actual_size: usize) -> Result<(), Self> {
        if actual_size < min_size {
            Err(Self::MessageTooShort {
                min_size,
                actual_size,
            })
        } else {
            Ok(())
        }
    }
}
