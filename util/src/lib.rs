//! Utilities shared by the Rampart crates
//!
//! - [time]: monotonic nanosecond timestamps and the [time::Clock] abstraction
//! - [rand]: access to the random number generator used for keys and nonces

pub mod rand;
pub mod time;
