//! # Helsing
//!
//! Parallel vampire number search engine.
//!
//! A vampire number is a composite integer with an even number of decimal
//! digits `2n` that can be written as the product of two `n`-digit *fangs*
//! whose combined digits are a permutation of the product's digits, with at
//! most one fang ending in zero. `1260 = 60 x 21` is the smallest.
//!
//! ## Quick Start
//! ```rust,ignore
//! use helsing::{run, Options};
//!
//! let mut options = Options::new(1000, 9999);
//! options.threads = 4;
//! let summary = run(&options, Box::new(std::io::stdout()))?;
//! assert_eq!(summary.count, 7);
//! ```
//!
//! ## Architecture
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         HELSING                              │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  Driver    → even-length subranges of [min, max]             │
//! │  Matrix    → tiles, assigned in order behind the R mutex     │
//! │  Kernel    → fang pairs via packed digit fingerprints        │
//! │  Tree      → AVL dedup of products, drained once sealed      │
//! │  Commit    → ordered, deterministic output behind the W mutex│
//! │                                                              │
//! │  Cache: one fingerprint per integer below 10^(L - 2⌊L/3⌋),   │
//! │         shared read-only by every worker                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The output stream is byte-identical for any worker count: tiles are
//! assigned in index order, may finish in any order, and are committed in
//! index order.

// === Core modules ===
pub mod checkpoint;
pub mod checksum;
pub mod core;
pub mod engine;
pub mod options;
pub mod search;

// === Re-exports for convenience ===

pub use crate::core::{DigitPack, FingerprintCache, Narrow, Wide};
pub use crate::engine::{run, Summary};
pub use crate::options::{Encoding, Options, Verbosity};

// === Error types ===

/// Crate-level error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not a decimal number fitting 64 bits: {0:?}")]
    InputParse(String),

    #[error("invalid interval: min {min} is greater than max {max}")]
    InputRange { min: Vamp, max: Vamp },

    #[error("{max} has {got} digits; the {encoding} encoding is exact only up to {limit}")]
    CapacityExceeded {
        max: Vamp,
        got: u32,
        limit: u32,
        encoding: &'static str,
    },

    #[error("checkpoint: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

// === Constants ===

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Product-width integer.
pub type Vamp = u64;

/// Fang-width integer. Fangs of a 20-digit product run to 10^10, so this is
/// a full machine word rather than half of one.
pub type Fang = u64;

/// Upper bound on the numbers covered by a single tile. Bounds the peak size
/// of a worker's product tree.
pub const MAX_TILE_SIZE: u64 = 99_999_999_999;
