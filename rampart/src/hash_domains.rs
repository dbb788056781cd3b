//! Domain separated key derivation
//!
//! Both keys of a [crate::keys::PrecomputedKeySet] are derived from the same shared secret
//! input. Each derivation hashes a distinct, fixed length label in front of the input so the
//! keys can never be substituted for one another.
//!
//! ```
//! use rampart::hash_domains::{cookie_key, mac1_key};
//!
//! let input = [1u8; 32];
//! assert_ne!(mac1_key(&input), cookie_key(&input));
//! assert_eq!(mac1_key(&input), mac1_key(&input));
//! ```

use rampart_ciphers::hash::hash;

use crate::constants::SHARED_SECRET_LEN;

/// Declare a key derived under a fixed label
macro_rules! hash_domain {
    ($(#[$($attrss:tt)*])* $name:ident, $label_name:ident, $lbl:expr) => {
        $(#[$($attrss)*])*
        pub const $label_name: &[u8; 8] = $lbl;

        #[doc = concat!("Derives a key as `hash(", stringify!($label_name), " || input)`")]
        pub fn $name(input: &[u8; SHARED_SECRET_LEN]) -> [u8; 32] {
            hash(&[$label_name, input])
        }
    };
}

hash_domain!(
    /// Label for the key under which MAC1 is computed
    mac1_key,
    LABEL_MAC1,
    b"mac1----"
);

hash_domain!(
    /// Label for the key that encrypts cookie replies
    cookie_key,
    LABEL_COOKIE,
    b"cookie--"
);
