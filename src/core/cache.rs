//! Precomputed fingerprint table.
//!
//! Splitting an L-digit value into thirds keeps the table at
//! `10^(L - 2⌊L/3⌋)` entries while still fingerprinting any multiplicand
//! (two lookups) or product (three lookups) by additive composition. The
//! table is built once per run and shared read-only by every worker.

use crate::core::digits;
use crate::core::fingerprint::DigitPack;
use crate::{Fang, Vamp};

pub struct FingerprintCache<P: DigitPack> {
    dig: Vec<P>,
    size: Fang,
    power_a: Fang,
}

impl<P: DigitPack> FingerprintCache<P> {
    /// Build the table sized for products up to `max`.
    pub fn new(max: Vamp) -> Self {
        let length_a = digits::length(max) / 3;
        let length_b = digits::length(max) - 2 * length_a;
        let size = digits::pow10(length_b);

        // Below 10^3 the split degenerates; index whole values instead.
        let power_a = if length_a < 3 {
            size
        } else {
            digits::pow10(length_a)
        };

        #[cfg(feature = "parallel")]
        let dig: Vec<P> = {
            use rayon::prelude::*;
            (0..size as usize).into_par_iter().map(|d| P::pack(d as u64)).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let dig: Vec<P> = (0..size).map(P::pack).collect();

        Self { dig, size, power_a }
    }

    /// Fingerprint of `n`. `n` must be below [`size`](Self::size).
    #[inline]
    pub fn lookup(&self, n: Fang) -> P {
        self.dig[n as usize]
    }

    /// Number of cached entries; also the split modulus for values the
    /// cache cannot index directly.
    #[inline]
    pub fn size(&self) -> Fang {
        self.size
    }

    /// The sub-indexing power: thirds of an L-digit value are taken
    /// mod/div this.
    #[inline]
    pub fn power_a(&self) -> Fang {
        self.power_a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fingerprint::{Narrow, Wide};

    #[test]
    fn test_sizing() {
        // 4-digit max: thirds of length 1, remainder 2 -> 10^2 entries,
        // degenerate split
        let cache = FingerprintCache::<Wide>::new(9_999);
        assert_eq!(cache.size(), 100);
        assert_eq!(cache.power_a(), 100);

        // 8-digit max: length_a = 2 (< 3, degenerate), remainder 4
        let cache = FingerprintCache::<Wide>::new(99_999_999);
        assert_eq!(cache.size(), 10_000);
        assert_eq!(cache.power_a(), 10_000);

        // 12-digit max: length_a = 4, remainder 4
        let cache = FingerprintCache::<Wide>::new(999_999_999_999);
        assert_eq!(cache.size(), 10_000);
        assert_eq!(cache.power_a(), 10_000);
    }

    #[test]
    fn test_lookup_matches_pack() {
        let cache = FingerprintCache::<Narrow>::new(99_999_999);
        for n in [0u64, 1, 9, 10, 99, 1_234, 9_999] {
            assert_eq!(cache.lookup(n), Narrow::pack(n));
        }
    }

    #[test]
    fn test_split_composition() {
        // Any 12-digit product fingerprint equals the sum of its three
        // 4-digit third fingerprints.
        let cache = FingerprintCache::<Wide>::new(999_999_999_999);
        let p_a = cache.power_a();
        for p in [123_456_789_012u64, 999_999_999_999, 100_000_000_001] {
            let lo = p % p_a;
            let mid = (p / p_a) % p_a;
            let hi = p / p_a / p_a;
            assert_eq!(
                cache.lookup(lo) + cache.lookup(mid) + cache.lookup(hi),
                Wide::pack(p)
            );
        }
    }
}
