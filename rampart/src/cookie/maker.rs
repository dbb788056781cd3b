//! The initiator's half of the cookie mechanism

use std::fmt;

use log::debug;
use parking_lot::Mutex;
use zeroize::{Zeroize, ZeroizeOnDrop};

use rampart_cipher_traits::CipherError;
use rampart_ciphers::keyed_hash::{mac, mac_short_key};
use rampart_ciphers::xaead;
use rampart_util::time::{Clock, Timebase, Timestamp};

use crate::config::CookieConfig;
use crate::constants::{COOKIE_LEN, MAC_LEN};
use crate::keys::{KeyStore, SharedSecret};
use crate::msgs::{
    split_trailer_mut, CookieReplyPayload, MacTrailer, COOKIE_CIPHERTEXT_LEN, COOKIE_NONCE_LEN,
};
use crate::RampartError;

#[derive(Default, Zeroize, ZeroizeOnDrop)]
struct MakerState {
    last_mac1: [u8; MAC_LEN],
    /// Set when a MAC1 is sent; cleared once a cookie reply for it has been consumed
    #[zeroize(skip)]
    last_mac1_valid: bool,
    cookie: [u8; COOKIE_LEN],
    #[zeroize(skip)]
    cookie_birthdate: Option<Timestamp>,
}

impl MakerState {
    fn usable_cookie(&self, now: Timestamp, lifetime: u64) -> Option<&[u8; COOKIE_LEN]> {
        let birthdate = self.cookie_birthdate?;
        (now.saturating_nanos_since(birthdate) < lifetime).then_some(&self.cookie)
    }
}

/// Computes the MACs of outgoing handshake messages and consumes cookie replies
///
/// Owned by the initiator's peer session. One exclusive lock covers each call, so a cookie reply
/// can be consumed at most once per computed MAC1.
pub struct CookieMaker<C: Clock = Timebase> {
    keys: KeyStore,
    state: Mutex<MakerState>,
    /// How long a received cookie is used for MAC2
    cookie_lifetime: u64,
    clock: C,
}

impl CookieMaker<Timebase> {
    /// Creates a maker with default timing on the system clock
    pub fn new(input: &SharedSecret) -> Self {
        Self::build(input, &CookieConfig::default(), Timebase::default())
    }
}

impl<C: Clock> CookieMaker<C> {
    pub fn with_config(input: &SharedSecret, cfg: &CookieConfig, clock: C) -> anyhow::Result<Self> {
        cfg.validate()?;
        Ok(Self::build(input, cfg, clock))
    }

    fn build(input: &SharedSecret, cfg: &CookieConfig, clock: C) -> Self {
        Self {
            keys: KeyStore::new(Some(input)),
            state: Mutex::new(MakerState::default()),
            cookie_lifetime: cfg.cookie_lifetime_ns(),
            clock,
        }
    }

    /// Rekeys the session and forgets any cookie and outstanding MAC1
    ///
    /// `None` zeroes the keys on session teardown.
    pub fn update_keys(&self, input: Option<&SharedSecret>) {
        self.keys.update(input);
        *self.state.lock() = MakerState::default();
    }

    /// Computes MAC1 and MAC2 of an outgoing message
    ///
    /// MAC2 is all zeroes unless a cookie received less than the cookie lifetime ago is held.
    pub fn compute_macs(&self, message: &[u8]) -> MacTrailer {
        let keys = self.keys.read();
        let mut state = self.state.lock();
        let now = self.clock.now();

        let mac1 = mac(&keys.mac1_key, &[message]);
        state.last_mac1 = mac1;
        state.last_mac1_valid = true;

        let mac2 = match state.usable_cookie(now, self.cookie_lifetime) {
            Some(cookie) => mac_short_key(cookie, &[message, &mac1]).unwrap_or_else(|e| {
                debug!("could not compute mac2, sending none: {e}");
                [0u8; MAC_LEN]
            }),
            None => [0u8; MAC_LEN],
        };

        MacTrailer { mac1, mac2 }
    }

    /// Writes the MACs over the last [MAC_TRAILER_LEN](crate::msgs::MAC_TRAILER_LEN) bytes of
    /// `buf`, authenticating everything before them
    pub fn seal(&self, buf: &mut [u8]) -> Result<(), RampartError> {
        let (body, mut trailer) = split_trailer_mut(buf)?;
        *trailer = self.compute_macs(body);
        Ok(())
    }

    /// Consumes a cookie reply to the last computed MAC1
    ///
    /// Fails with [RampartError::Expired] if there is no outstanding MAC1, either because none was
    /// computed since the last consumed reply or because of a rekey. A reply that fails
    /// authentication leaves the maker untouched, so a forged reply cannot use up the chance to
    /// consume the genuine one.
    pub fn consume_cookie_reply(
        &self,
        nonce: &[u8; COOKIE_NONCE_LEN],
        ciphertext: &[u8; COOKIE_CIPHERTEXT_LEN],
    ) -> Result<(), RampartError> {
        let keys = self.keys.read();
        let mut state = self.state.lock();

        if !state.last_mac1_valid {
            return Err(RampartError::Expired);
        }

        let mut cookie = [0u8; COOKIE_LEN];
        match xaead::decrypt(
            &mut cookie,
            &keys.cookie_key,
            nonce,
            &state.last_mac1,
            ciphertext,
        ) {
            Ok(()) => {}
            Err(CipherError::DecryptError) => {
                debug!("discarding cookie reply that failed authentication");
                return Err(RampartError::InvalidReply);
            }
            Err(e) => return Err(e.into()),
        }

        state.cookie = cookie;
        state.cookie_birthdate = Some(self.clock.now());
        state.last_mac1_valid = false;
        cookie.zeroize();
        Ok(())
    }

    /// Parses a cookie reply payload from the wire and consumes it
    pub fn consume_cookie_reply_payload(&self, payload: &[u8]) -> Result<(), RampartError> {
        let payload = CookieReplyPayload::parse(payload)?;
        self.consume_cookie_reply(&payload.nonce, &payload.ciphertext)
    }

    /// The last cookie received, whether or not it is still used for MAC2
    pub fn cookie(&self) -> Option<[u8; COOKIE_LEN]> {
        let state = self.state.lock();
        state.cookie_birthdate.map(|_| state.cookie)
    }

    /// Whether the next message will carry a MAC2
    pub fn has_usable_cookie(&self) -> bool {
        let state = self.state.lock();
        state
            .usable_cookie(self.clock.now(), self.cookie_lifetime)
            .is_some()
    }
}

impl<C: Clock> fmt::Debug for CookieMaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self.keys.read();
        let state = self.state.lock();
        f.debug_struct("CookieMaker")
            .field("keys", &*keys)
            .field("last_mac1_valid", &state.last_mac1_valid)
            .field("cookie_birthdate", &state.cookie_birthdate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac2_is_zero_without_cookie() {
        let maker = CookieMaker::new(&[1u8; 32]);
        let macs = maker.compute_macs(b"hello");
        assert_ne!(macs.mac1, [0u8; MAC_LEN]);
        assert_eq!(macs.mac2, [0u8; MAC_LEN]);
        assert!(maker.cookie().is_none());
        assert!(!maker.has_usable_cookie());
    }

    #[test]
    fn mac1_depends_on_message_and_key() {
        let maker = CookieMaker::new(&[1u8; 32]);
        let other = CookieMaker::new(&[2u8; 32]);
        assert_eq!(maker.compute_macs(b"a").mac1, maker.compute_macs(b"a").mac1);
        assert_ne!(maker.compute_macs(b"a").mac1, maker.compute_macs(b"b").mac1);
        assert_ne!(maker.compute_macs(b"a").mac1, other.compute_macs(b"a").mac1);
    }

    #[test]
    fn reply_without_outstanding_mac1_is_expired() {
        let maker = CookieMaker::new(&[1u8; 32]);
        assert_eq!(
            maker.consume_cookie_reply(&[0u8; 24], &[0u8; 32]),
            Err(RampartError::Expired)
        );
    }

    #[test]
    fn garbage_reply_is_invalid_and_keeps_mac1_outstanding() {
        let maker = CookieMaker::new(&[1u8; 32]);
        maker.compute_macs(b"hello");
        for _ in 0..3 {
            assert_eq!(
                maker.consume_cookie_reply(&[0u8; 24], &[0u8; 32]),
                Err(RampartError::InvalidReply)
            );
        }
        assert!(maker.state.lock().last_mac1_valid);
        assert!(maker.cookie().is_none());
    }

    #[test]
    fn seal_writes_the_trailer() {
        let maker = CookieMaker::new(&[1u8; 32]);
        let mut buf = [0x55u8; 64];
        maker.seal(&mut buf).unwrap();

        let expected = maker.compute_macs(&[0x55u8; 32]);
        assert_eq!(&buf[..32], &[0x55u8; 32]);
        assert_eq!(&buf[32..48], &expected.mac1);
        assert_eq!(&buf[48..], &[0u8; 16]);

        assert!(matches!(
            maker.seal(&mut [0u8; 31]),
            Err(RampartError::MessageTooShort { .. })
        ));
    }

    #[test]
    fn short_payloads_are_rejected() {
        let maker = CookieMaker::new(&[1u8; 32]);
        maker.compute_macs(b"hello");
        assert_eq!(
            maker.consume_cookie_reply_payload(&[0u8; 55]),
            Err(RampartError::BufferSizeMismatch {
                required_size: 56,
                actual_size: 55
            })
        );
    }
}
