//! The responder's half of the cookie mechanism

use std::fmt;

use log::{debug, trace};
use parking_lot::RwLock;
use zeroize::{Zeroize, ZeroizeOnDrop};

use rampart_ciphers::keyed_hash::{mac, mac_short_key};
use rampart_ciphers::xaead;
use rampart_constant_time::memcmp;
use rampart_util::rand::random_bytes;
use rampart_util::time::{Clock, Timebase, Timestamp};

use crate::address::SourceAddr;
use crate::config::Rampart;
use crate::constants::{COOKIE_LEN, COOKIE_SECRET_LEN, MAC_LEN};
use crate::keys::{KeyStore, SharedSecret};
use crate::msgs::{split_trailer, CookieReplyPayload, COOKIE_CIPHERTEXT_LEN};
use crate::ratelimiter::{RateLimitVerdict, RateLimiter};
use crate::RampartError;

/// Outcome of checking the MACs of an incoming handshake message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacVerdict {
    /// Process the message
    Ok,
    /// MAC1 does not match; drop the message
    Invalid,
    /// MAC1 matches, but under load MAC2 is missing or wrong; answer with a cookie reply and
    /// create no state
    NeedsCookie,
    /// Both MACs match, but the source address exhausted its budget; drop the message
    RateLimited,
}

/// The rotating secret cookies are derived from
#[derive(Default, Zeroize, ZeroizeOnDrop)]
struct CookieSecret {
    value: [u8; COOKIE_SECRET_LEN],
    /// `None` until the first cookie is made
    #[zeroize(skip)]
    birthdate: Option<Timestamp>,
}

impl CookieSecret {
    fn is_stale(&self, now: Timestamp, max_age: u64) -> bool {
        match self.birthdate {
            None => true,
            Some(birthdate) => now.saturating_nanos_since(birthdate) >= max_age,
        }
    }

    fn rotate(&mut self, now: Timestamp) {
        self.value.zeroize();
        self.value = random_bytes();
        self.birthdate = Some(now);
    }
}

/// Verifies the MACs of incoming handshake messages and issues cookies
///
/// Owned by the responder's local identity and shared by every packet processed for it, across
/// threads. Keys, cookie secret and rate limiter each have their own lock.
pub struct CookieChecker<C: Clock = Timebase> {
    keys: KeyStore,
    secret: RwLock<CookieSecret>,
    secret_max_age: u64,
    rate_limiter: RateLimiter<C>,
    clock: C,
}

impl CookieChecker<Timebase> {
    /// Creates a checker without keys, with the default configuration on the system clock
    pub fn new() -> Self {
        let cfg = Rampart::default();
        let clock = Timebase::default();
        Self {
            keys: KeyStore::new(None),
            secret: RwLock::new(CookieSecret::default()),
            secret_max_age: cfg.cookie.secret_max_age_ns(),
            rate_limiter: RateLimiter::new(),
            clock,
        }
    }
}

impl Default for CookieChecker<Timebase> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock + Clone> CookieChecker<C> {
    /// Creates a checker without keys; the rate limiter shares `clock`
    pub fn with_config(cfg: &Rampart, clock: C) -> anyhow::Result<Self> {
        cfg.validate()?;
        Ok(Self {
            keys: KeyStore::new(None),
            secret: RwLock::new(CookieSecret::default()),
            secret_max_age: cfg.cookie.secret_max_age_ns(),
            rate_limiter: RateLimiter::with_config(&cfg.rate_limiter, clock.clone())?,
            clock,
        })
    }
}

impl<C: Clock> CookieChecker<C> {
    /// Installs the keys derived from `input`; `None` zeroes them
    ///
    /// The cookie secret is independent of the keys and is left alone.
    pub fn update_keys(&self, input: Option<&SharedSecret>) {
        self.keys.update(input);
    }

    /// Derives the cookie for `addr` from the current secret, rotating the secret first if it
    /// is older than its maximum age
    ///
    /// Addresses of unsupported families get random bytes, which will never validate.
    pub fn make_cookie(&self, addr: &SourceAddr) -> [u8; COOKIE_LEN] {
        let Some(input) = addr.cookie_input() else {
            return random_bytes();
        };

        // Always exclusive, so concurrent callers never both rotate
        let mut secret = self.secret.write();
        let now = self.clock.now();
        if secret.is_stale(now, self.secret_max_age) {
            secret.rotate(now);
            debug!("rotated cookie secret");
        }
        mac(&secret.value, &[input.as_slice()])
    }

    /// Builds the cookie reply for a message whose MAC1 was `their_mac1`
    pub fn create_cookie_reply_payload(
        &self,
        their_mac1: &[u8; MAC_LEN],
        addr: &SourceAddr,
    ) -> Result<CookieReplyPayload, RampartError> {
        let mut cookie = self.make_cookie(addr);
        let nonce = random_bytes();
        let mut ciphertext = [0u8; COOKIE_CIPHERTEXT_LEN];
        let res = {
            let keys = self.keys.read();
            xaead::encrypt(&mut ciphertext, &keys.cookie_key, &nonce, their_mac1, &cookie)
        };
        cookie.zeroize();
        res?;

        debug!("issuing cookie reply to {addr}");
        Ok(CookieReplyPayload { nonce, ciphertext })
    }

    /// Checks the MACs of an incoming message
    ///
    /// MAC1 is always checked first. MAC2 and the rate limiter are only consulted when
    /// `under_load` is set.
    pub fn validate_macs(
        &self,
        message: &[u8],
        their_mac1: &[u8; MAC_LEN],
        their_mac2: &[u8; MAC_LEN],
        under_load: bool,
        addr: &SourceAddr,
    ) -> MacVerdict {
        let expected_mac1 = {
            let keys = self.keys.read();
            mac(&keys.mac1_key, &[message])
        };
        if !memcmp(&expected_mac1, their_mac1) {
            trace!("invalid mac1 from {addr}");
            return MacVerdict::Invalid;
        }

        if !under_load {
            return MacVerdict::Ok;
        }

        let mut cookie = self.make_cookie(addr);
        let expected_mac2 = mac_short_key(&cookie, &[message, their_mac1]);
        cookie.zeroize();
        let mac2_valid = match expected_mac2 {
            Ok(expected) => memcmp(&expected, their_mac2),
            Err(e) => {
                debug!("could not compute mac2 for {addr}: {e}");
                false
            }
        };
        if !mac2_valid {
            trace!("mac2 from {addr} missing or invalid under load");
            return MacVerdict::NeedsCookie;
        }

        match self.rate_limiter.allow(addr) {
            RateLimitVerdict::Allowed => MacVerdict::Ok,
            RateLimitVerdict::Denied => MacVerdict::RateLimited,
        }
    }

    /// Splits the MAC trailer off a received handshake message and checks it
    pub fn check_seal(
        &self,
        buf: &[u8],
        under_load: bool,
        addr: &SourceAddr,
    ) -> Result<MacVerdict, RampartError> {
        let (body, trailer) = split_trailer(buf)?;
        Ok(self.validate_macs(body, &trailer.mac1, &trailer.mac2, under_load, addr))
    }

    pub fn rate_limiter(&self) -> &RateLimiter<C> {
        &self.rate_limiter
    }
}

impl<C: Clock> Drop for CookieChecker<C> {
    fn drop(&mut self) {
        self.rate_limiter.flush();
    }
}

impl<C: Clock> fmt::Debug for CookieChecker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieChecker")
            .field("keys", &*self.keys.read())
            .field("secret_birthdate", &self.secret.read().birthdate)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}
