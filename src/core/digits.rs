//! Decimal helpers shared by the kernel, the tiling matrix and the driver.

use crate::{Fang, Vamp};

/// Number of decimal digits of `x`. `length(0) == 1`.
#[inline]
pub fn length(x: Vamp) -> u32 {
    let mut len = 1;
    let mut x = x;
    while x > 9 {
        x /= 10;
        len += 1;
    }
    len
}

#[inline]
pub fn length_is_odd(x: Vamp) -> bool {
    length(x) % 2 == 1
}

/// 10^exponent. The caller keeps `exponent` below 20.
#[inline]
pub fn pow10(exponent: u32) -> Vamp {
    debug_assert!(exponent < 20);
    let mut base = 1;
    for _ in 0..exponent {
        base *= 10;
    }
    base
}

/// ⌊√x⌋ by Newton iteration.
pub fn sqrt_floor(x: Vamp) -> Vamp {
    let mut root = x / 2;
    if root == 0 {
        return x;
    }
    let mut tmp = (root + x / root) / 2;
    while tmp < root {
        root = tmp;
        tmp = (root + x / root) / 2;
    }
    root
}

/// ⌈√x⌉
pub fn sqrt_roof(x: Vamp) -> Vamp {
    let root = sqrt_floor(x);
    if root * root < x {
        root + 1
    } else {
        root
    }
}

/// ⌈x / y⌉
#[inline]
pub fn div_roof(x: Vamp, y: Vamp) -> Vamp {
    x / y + (x % y != 0) as Vamp
}

#[inline]
pub fn no_trailing_zero(x: Fang) -> bool {
    x % 10 != 0
}

/// True when `x + y` and `x * y` disagree mod 9. A fang pair whose digits
/// permute the product's digits always agrees, so mismatching pairs are
/// skipped. Computed on residues, so it is overflow-free for any inputs.
#[inline]
pub fn mod9_mismatch(x: Vamp, y: Vamp) -> bool {
    let (x, y) = (x % 9, y % 9);
    (x + y) % 9 != (x * y) % 9
}
