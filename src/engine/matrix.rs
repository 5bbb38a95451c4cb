//! Tiling of one even-length subrange.
//!
//! A matrix chops `[lmin, lmax]` into contiguous tiles and hands them out
//! in index order. Because tiles are ordered and committed in order, output
//! is deterministic however the scans interleave; because tile size is
//! bounded, so is each worker's peak tree size.

use parking_lot::Mutex;

use crate::core::digits;
use crate::{Fang, Vamp, MAX_TILE_SIZE};

/// A contiguous inclusive product subrange; one unit of work.
pub struct Tile {
    pub lmin: Vamp,
    pub lmax: Vamp,
}

pub struct Matrix {
    tiles: Vec<Tile>,
    fmax: Fang,
    next_assign: Mutex<usize>,
}

impl Matrix {
    /// Tile `[lmin, lmax]`, both of the same even digit length.
    ///
    /// Without an explicit `tile_size`, the range is cut into roughly
    /// `4 * threads + 2` tiles so that stragglers even out, capped at
    /// [`MAX_TILE_SIZE`] numbers per tile.
    pub fn build(lmin: Vamp, lmax: Vamp, threads: usize, tile_size: Option<u64>) -> Self {
        debug_assert!(lmin <= lmax);

        let fang_length = digits::length(lmin) / 2;
        let fmax = digits::pow10(fang_length);

        let mut lmax = lmax;
        if let Some(fmax_square) = fmax.checked_mul(fmax) {
            if lmax > fmax_square && lmin <= fmax_square {
                lmax = fmax_square;
            }
        }

        let size = match tile_size {
            Some(explicit) => explicit.min(MAX_TILE_SIZE),
            None => ((lmax - lmin) / (4 * threads as u64 + 2)).min(MAX_TILE_SIZE),
        };

        let mut tiles = Vec::new();
        let mut start = lmin;
        loop {
            // A tile spans size + 1 numbers; the final one truncates.
            let end = if lmax - start < size {
                lmax
            } else {
                start + size
            };
            tiles.push(Tile {
                lmin: start,
                lmax: end,
            });
            if end >= lmax {
                break;
            }
            start = end + 1;
        }

        Self {
            tiles,
            fmax,
            next_assign: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// One past the largest fang for this range's digit length.
    pub fn fmax(&self) -> Fang {
        self.fmax
    }

    pub fn tile(&self, index: usize) -> &Tile {
        &self.tiles[index]
    }

    /// Claim the next unassigned tile. Tiles come out in index order; `None`
    /// once the matrix is exhausted.
    pub fn next_tile(&self) -> Option<usize> {
        let mut next = self.next_assign.lock();
        if *next < self.tiles.len() {
            let index = *next;
            *next += 1;
            Some(index)
        } else {
            None
        }
    }
}
