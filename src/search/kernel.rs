//! Fang-enumeration kernel.
//!
//! Walks every candidate fang pair whose product falls in one tile and
//! feeds the valid ones to a [`FangSink`]. The outer loop runs the
//! multiplier *down* from the largest fang; the inner loop runs the
//! multiplicand *up* in steps of nine. Three filters cut the work:
//!
//! - multipliers with `m % 3 == 1` admit no digit-permuting multiplicand at
//!   all (`k·(m−1) ≡ m (mod 9)` is unsolvable when `3 | m−1` but `3 ∤ m`);
//! - the multiplicand starts at the first value agreeing with the
//!   digit-sum congruence `m + k ≡ m·k (mod 9)` and keeps agreeing under
//!   `k += 9`, so the congruence is never rechecked;
//! - a pair where both fangs end in zero can only echo a shorter pair.
//!
//! The digit test itself is three fingerprint lookups and additions per
//! side: the multiplicand splits in two and the product in three pieces,
//! all maintained incrementally, so the steady state has no division at
//! all. Because the multiplier only descends, any product above the
//! current one is *sealed* once the inner loop ends; [`FangSink::seal`]
//! lets the collecting side flush such products early.

use crate::core::cache::FingerprintCache;
use crate::core::digits;
use crate::core::fingerprint::DigitPack;
use crate::search::results::ResultList;
use crate::search::tree::ProductTree;
use crate::{Fang, Vamp};

/// Consumer of enumerated fang pairs.
pub trait FangSink {
    /// One valid pair: `product == multiplier * multiplicand`.
    fn record(&mut self, product: Vamp, multiplier: Fang, multiplicand: Fang);

    /// No product `>= threshold` will be recorded again in this scan. The
    /// kernel always ends with `seal(0)`.
    fn seal(&mut self, _threshold: Vamp) {}
}

/// Counts valid fang pairs.
#[derive(Default)]
pub struct PairCount {
    pub pairs: u64,
}

impl FangSink for PairCount {
    #[inline]
    fn record(&mut self, _product: Vamp, _multiplier: Fang, _multiplicand: Fang) {
        self.pairs += 1;
    }
}

/// Collects every valid fang pair.
#[derive(Default)]
pub struct PairDump {
    pub pairs: Vec<(Vamp, Fang, Fang)>,
}

impl FangSink for PairDump {
    #[inline]
    fn record(&mut self, product: Vamp, multiplier: Fang, multiplicand: Fang) {
        self.pairs.push((product, multiplier, multiplicand));
    }
}

/// Deduplicates products into distinct vampire numbers. Sealed ranges move
/// from the tree to the pending list as soon as their pair counts are
/// final, so the tree only tracks products that can still gain pairs.
pub struct VampireSink {
    tree: ProductTree,
    list: ResultList,
    min_fang_pairs: u8,
}

impl VampireSink {
    pub fn new(min_fang_pairs: u8) -> Self {
        Self {
            tree: ProductTree::new(),
            list: ResultList::new(),
            min_fang_pairs,
        }
    }

    /// The drained results, ascending when iterated. Valid after the kernel
    /// has finished (its final `seal(0)` empties the tree).
    pub fn into_list(self) -> ResultList {
        debug_assert!(self.tree.is_empty());
        self.list
    }
}

impl FangSink for VampireSink {
    #[inline]
    fn record(&mut self, product: Vamp, _multiplier: Fang, _multiplicand: Fang) {
        self.tree.insert(product);
    }

    fn seal(&mut self, threshold: Vamp) {
        self.tree
            .drain_at_least(threshold, self.min_fang_pairs, &mut self.list);
    }
}

/// Enumerate all valid fang pairs with product in `[lmin, lmax]` using the
/// fingerprint cache. `fmax` is one past the largest fang of the range's
/// digit length.
pub fn enumerate_fangs<P: DigitPack, S: FangSink>(
    lmin: Vamp,
    lmax: Vamp,
    fmax: Fang,
    cache: &FingerprintCache<P>,
    sink: &mut S,
) {
    let lmin = lmin.max(1);
    let min_sqrt = digits::sqrt_roof(lmin);
    let max_sqrt = digits::sqrt_floor(lmax);
    let power_a = cache.power_a();

    let mut multiplier = fmax;
    while multiplier >= min_sqrt {
        // Powers of ten are ≡ 1 (mod 3), so fmax itself always exits here
        // and the cache is only ever indexed by in-range fangs.
        if multiplier % 3 == 1 {
            multiplier -= 1;
            continue;
        }

        let mult_no_zero = digits::no_trailing_zero(multiplier);
        let mut multiplicand = digits::div_roof(lmin, multiplier);
        let multiplicand_max = if multiplier >= max_sqrt {
            lmax / multiplier
        } else {
            // The multiplicand may equal the multiplier: 5267275776 = 72576 * 72576.
            multiplier
        };

        while multiplicand <= multiplicand_max && digits::mod9_mismatch(multiplier, multiplicand)
        {
            multiplicand += 1;
        }

        if multiplicand <= multiplicand_max {
            let product_step = 9 * multiplier;
            let mut product = multiplier * multiplicand;

            let step0 = product_step % power_a;
            let step1 = product_step / power_a;

            let mut e0 = multiplicand % power_a;
            let mut e1 = multiplicand / power_a;

            // Each multiplier fingerprint is read exactly once, so values
            // beyond the cache are packed on the spot rather than widening
            // the table tenfold.
            let dig_mult = if min_sqrt >= cache.size() {
                P::pack(multiplier)
            } else {
                cache.lookup(multiplier)
            };

            let mut de0 = product % power_a;
            let mut de1 = (product / power_a) % power_a;
            let mut de2 = product / power_a / power_a;

            while multiplicand <= multiplicand_max {
                if dig_mult + cache.lookup(e0) + cache.lookup(e1)
                    == cache.lookup(de0) + cache.lookup(de1) + cache.lookup(de2)
                    && (mult_no_zero || digits::no_trailing_zero(multiplicand))
                {
                    sink.record(product, multiplier, multiplicand);
                }

                multiplicand += 9;
                e0 += 9;
                if e0 >= power_a {
                    e0 -= power_a;
                    e1 += 1;
                }
                de0 += step0;
                if de0 >= power_a {
                    de0 -= power_a;
                    de1 += 1;
                }
                de1 += step1;
                if de1 >= power_a {
                    de1 -= power_a;
                    de2 += 1;
                }
                // Only the post-loop value can exceed the range; it feeds
                // the seal threshold, where saturation errs conservative.
                product = product.saturating_add(product_step);
            }

            if multiplier < max_sqrt && mult_no_zero {
                sink.seal(product);
            }
        }

        multiplier -= 1;
    }

    sink.seal(0);
}

/// Cache-free variant: same enumeration, digit counting by division. Slower
/// by an order of magnitude, but needs no table; it doubles as the oracle
/// the fingerprint path is tested against.
pub fn enumerate_fangs_uncached<S: FangSink>(lmin: Vamp, lmax: Vamp, fmax: Fang, sink: &mut S) {
    let lmin = lmin.max(1);
    let min_sqrt = digits::sqrt_roof(lmin);
    let max_sqrt = digits::sqrt_floor(lmax);

    let mut multiplier = fmax;
    while multiplier >= min_sqrt {
        if multiplier % 3 == 1 {
            multiplier -= 1;
            continue;
        }

        let mult_no_zero = digits::no_trailing_zero(multiplier);
        let mut multiplicand = digits::div_roof(lmin, multiplier);
        let multiplicand_max = if multiplier >= max_sqrt {
            lmax / multiplier
        } else {
            multiplier
        };

        while multiplicand <= multiplicand_max && digits::mod9_mismatch(multiplier, multiplicand)
        {
            multiplicand += 1;
        }

        if multiplicand <= multiplicand_max {
            let product_step = 9 * multiplier;
            let mut product = multiplier * multiplicand;

            let mut mult_counts = [0u8; 10];
            let mut i = multiplier;
            while i > 0 {
                mult_counts[(i % 10) as usize] += 1;
                i /= 10;
            }

            while multiplicand <= multiplicand_max {
                if digit_multiset_matches(&mult_counts, multiplicand, product)
                    && (mult_no_zero || digits::no_trailing_zero(multiplicand))
                {
                    sink.record(product, multiplier, multiplicand);
                }
                multiplicand += 9;
                product = product.saturating_add(product_step);
            }

            if multiplier < max_sqrt && mult_no_zero {
                sink.seal(product);
            }
        }

        multiplier -= 1;
    }

    sink.seal(0);
}

/// Does the digit multiset of `product` equal the multiplier's counts plus
/// the multiplicand's digits?
fn digit_multiset_matches(mult_counts: &[u8; 10], multiplicand: Fang, product: Vamp) -> bool {
    let mut product_counts = [0u16; 10];
    let mut p = product;
    while p > 0 {
        product_counts[(p % 10) as usize] += 1;
        p /= 10;
    }

    for digit in 0..10 {
        if product_counts[digit] < mult_counts[digit] as u16 {
            return false;
        }
    }

    let mut k = multiplicand;
    while k > 0 {
        let digit = (k % 10) as usize;
        if product_counts[digit] == 0 {
            return false;
        }
        product_counts[digit] -= 1;
        k /= 10;
    }

    // Counts 0..=8 pin the multiset; equal totals imply the nines agree.
    (0..9).all(|digit| product_counts[digit] == mult_counts[digit] as u16)
}
