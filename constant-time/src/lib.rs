#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
//! constant-time implementations of some primitives
//!
//! Rampart internal library providing constant-time comparisons for every check that decides
//! whether a message is accepted: MAC1, MAC2 and the addresses in the rate limiter table.
//!
//! # Examples
//!
//! ```rust
//! use rampart_constant_time::memcmp;
//!
//! let mac = [1, 2, 3, 4];
//! let received = [1, 2, 3, 4];
//! let forged = [1, 2, 3, 5];
//!
//! assert!(memcmp(&mac, &received));
//! assert!(!memcmp(&mac, &forged));
//! ```
//!
//! # Security Notes
//!
//! While these functions aim to be constant-time, they may leak timing information in some cases:
//!
//! - Length mismatches between inputs are immediately detectable
//! - Execution time scales linearly with input size

mod memcmp;

pub use memcmp::memcmp;
