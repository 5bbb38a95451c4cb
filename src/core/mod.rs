//! Core primitives: decimal helpers, digit fingerprints, fingerprint cache.

pub mod cache;
pub mod digits;
pub mod fingerprint;

pub use cache::FingerprintCache;
pub use fingerprint::{DigitPack, Narrow, Wide};
