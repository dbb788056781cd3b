//! WireGuard style cookie mechanism
//!
//! Every handshake message carries two MACs in its [MacTrailer](crate::msgs::MacTrailer):
//!
//! - MAC1 is keyed with a key derived from the shared secret input; it is always present and
//!   lets the responder discard garbage before doing any real work.
//! - MAC2 is keyed with a cookie; it is only present once the initiator has received a cookie
//!   from the responder.
//!
//! While the responder is under load it only processes messages with a valid MAC2. Anything
//! else is answered with a cookie reply carrying a cookie bound to the claimed source address,
//! so only an initiator that can receive traffic at that address can ever produce a valid MAC2.
//! The responder stores no per-initiator state for this: cookies are derived from a rotating
//! secret and expire implicitly when it rotates.

mod checker;
mod maker;


pub use checker::{CookieChecker, MacVerdict};
pub use maker::CookieMaker;
