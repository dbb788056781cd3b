//! Constants and default configuration values used by the cookie mechanism and the rate limiter
//!
//! All durations are expressed in nanoseconds. The rate limiter counts one token per nanosecond
//! of accrued budget, which keeps the token arithmetic exact.

use static_assertions::const_assert;

/// Length of MAC1 and MAC2
pub const MAC_LEN: usize = rampart_ciphers::keyed_hash::MAC_LEN;
/// Length of a cookie value
pub const COOKIE_LEN: usize = 16;
/// Length of the responder's rotating cookie secret
pub const COOKIE_SECRET_LEN: usize = rampart_ciphers::KEY_LEN;
/// Length of the input the key set is derived from
pub const SHARED_SECRET_LEN: usize = 32;

const_assert!(COOKIE_LEN == MAC_LEN);
const_assert!(COOKIE_LEN == rampart_ciphers::keyed_hash::SHORT_KEY_LEN);

/// One second in nanoseconds
pub const NS_PER_SEC: u64 = 1_000_000_000;
/// One millisecond in nanoseconds
pub const NS_PER_MS: u64 = 1_000_000;

/// Time after which the responder's cookie secret is replaced
///
/// Cookies are never stored by the responder. A cookie stops validating once the secret it was
/// derived from has been rotated.
pub const SECRET_MAX_AGE: u64 = 120 * NS_PER_SEC;

/// Safety margin subtracted from [SECRET_MAX_AGE] by the initiator
///
/// The initiator stops using a cookie slightly before the responder could have rotated its
/// secret, so a cookie in flight does not arrive just after rotation.
pub const SECRET_LATENCY: u64 = 5 * NS_PER_SEC;

/// Idle time after which a rate limiter entry is garbage collected
pub const ELEMENT_TIMEOUT: u64 = NS_PER_SEC;

/// Token cost of a single admitted handshake initiation (20 per second)
pub const INITIATION_COST: u64 = NS_PER_SEC / 20;

/// Maximum number of tokens an address can accrue (a burst of five initiations)
pub const TOKEN_MAX: u64 = INITIATION_COST * 5;

/// Number of buckets in the rate limiter table
pub const TABLE_SIZE: usize = 8192;

/// The rate limiter never holds more than `TABLE_SIZE * MAX_ENTRIES_MULTIPLIER` entries
pub const MAX_ENTRIES_MULTIPLIER: usize = 8;

/// Number of leading IPv6 address bytes that identify an address to the rate limiter
///
/// Eight bytes rate limit a whole /64, the smallest prefix usually handed to a single host.
pub const IPV6_PREFIX_BYTES: usize = 8;

const_assert!(SECRET_LATENCY < SECRET_MAX_AGE);
const_assert!(INITIATION_COST <= TOKEN_MAX);
const_assert!(TOKEN_MAX <= ELEMENT_TIMEOUT);
const_assert!(IPV6_PREFIX_BYTES <= 16);
