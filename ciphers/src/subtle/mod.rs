//! Concrete implementations of the primitives; prefer the re-exports at the crate root.

pub mod rust_crypto;
