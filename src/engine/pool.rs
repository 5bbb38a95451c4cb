//! Worker-pool protocol: tile acquisition, scanning, ordered commit.
//!
//! Exactly two locks, and the kernel holds neither:
//!
//! ```text
//! worker loop:
//!   [R] claim tiles[next_assign], next_assign += 1      (matrix)
//!       scan the tile into a TileResult                 (lock-free)
//!   [W] slot the result; while the next slot in tile
//!       order is filled: emit, checkpoint, free, advance (committer)
//! ```
//!
//! Tiles may *finish* in any order but are *committed* in index order, so
//! the stream a run produces does not depend on the worker count. A slot
//! distinguishes "not finished" (`None`) from "finished, empty result"
//! (`Some` of an empty payload); the commit cursor only waits on the
//! former.

use std::io::Write;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::checkpoint::Checkpoint;
use crate::checksum::ResultChecksum;
use crate::core::cache::FingerprintCache;
use crate::core::fingerprint::DigitPack;
use crate::engine::matrix::Matrix;
use crate::options::{Options, Verbosity};
use crate::search::kernel::{
    self, FangSink, PairCount, PairDump, VampireSink,
};
use crate::search::results::ResultList;
use crate::{Fang, Result, Vamp};

/// One tile's scan output, parked until its turn to commit.
pub enum TileResult {
    /// Fang pairs counted, nothing retained.
    PairTally(u64),
    /// Every fang pair, in kernel order.
    PairList(Vec<(Vamp, Fang, Fang)>),
    /// Distinct vampire numbers, ascending when iterated.
    Vampires(ResultList),
}

impl TileResult {
    /// Number of results this tile contributes.
    pub fn len(&self) -> u64 {
        match self {
            TileResult::PairTally(pairs) => *pairs,
            TileResult::PairList(pairs) => pairs.len() as u64,
            TileResult::Vampires(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The commit side of the protocol: result slots, the commit cursor, the
/// running count, and every output device. Lives behind the single W mutex
/// for the whole run; the counter carries across matrices.
pub struct Committer {
    verbosity: Verbosity,
    slots: Vec<Option<TileResult>>,
    next_commit: usize,
    count: u64,
    writer: Box<dyn Write + Send>,
    checkpoint: Option<Checkpoint>,
    checksum: Option<ResultChecksum>,
    progress: bool,
}

impl Committer {
    pub fn new(
        options: &Options,
        writer: Box<dyn Write + Send>,
        checkpoint: Option<Checkpoint>,
        initial_count: u64,
    ) -> Self {
        Self {
            verbosity: options.verbosity,
            slots: Vec::new(),
            next_commit: 0,
            count: initial_count,
            writer,
            checkpoint,
            checksum: options.checksum.then(ResultChecksum::new),
            progress: options.progress,
        }
    }

    /// Reset the per-matrix state. Called between matrices, never while
    /// workers are running.
    pub fn begin_matrix(&mut self, tiles: usize) {
        debug_assert_eq!(self.next_commit, self.slots.len());
        self.slots = (0..tiles).map(|_| None).collect();
        self.next_commit = 0;
    }

    /// Park one finished tile, then commit every consecutively finished
    /// tile at the cursor.
    pub fn submit(&mut self, matrix: &Matrix, index: usize, result: TileResult) -> Result<()> {
        debug_assert!(self.slots[index].is_none());
        self.slots[index] = Some(result);

        while self.next_commit < self.slots.len() && self.slots[self.next_commit].is_some() {
            let result = self.slots[self.next_commit].take().expect("slot checked");
            self.emit(result)?;

            let tile = matrix.tile(self.next_commit);
            if self.progress {
                eprintln!(
                    "{}, {}  {}/{}",
                    tile.lmin,
                    tile.lmax,
                    self.next_commit + 1,
                    self.slots.len()
                );
            }
            if let Some(checkpoint) = &mut self.checkpoint {
                checkpoint.record(tile.lmax, self.count)?;
            }
            self.next_commit += 1;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn emit(&mut self, result: TileResult) -> Result<()> {
        match result {
            TileResult::PairTally(pairs) => self.count += pairs,
            TileResult::PairList(pairs) => {
                for (product, multiplier, multiplicand) in pairs {
                    let line = format!("{product} = {multiplier} x {multiplicand}\n");
                    self.write_line(line.as_bytes())?;
                    self.count += 1;
                }
            }
            TileResult::Vampires(list) => {
                if self.verbosity == Verbosity::PrintVampires {
                    for value in list.iter() {
                        self.count += 1;
                        let line = format!("{} {}\n", self.count, value);
                        self.write_line(line.as_bytes())?;
                    }
                } else {
                    self.count += list.len();
                }
            }
        }
        Ok(())
    }

    fn write_line(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.writer.write_all(bytes)?;
        if let Some(checksum) = &mut self.checksum {
            checksum.update(bytes);
        }
        Ok(())
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Final count and, when enabled, the stream digest.
    pub fn finish(self) -> (u64, Option<String>) {
        (self.count, self.checksum.map(ResultChecksum::finish))
    }
}

/// Per-worker tallies for the optional runtime report.
pub struct WorkerStats {
    pub runtime: Duration,
    pub found: u64,
}

/// Worker loop. Returns once the matrix has no tiles left.
pub fn run_worker<P: DigitPack>(
    matrix: &Matrix,
    cache: &FingerprintCache<P>,
    committer: &Mutex<Committer>,
    options: &Options,
) -> Result<WorkerStats> {
    let started = Instant::now();
    let mut found = 0;

    while let Some(index) = matrix.next_tile() {
        let tile = matrix.tile(index);
        let result = scan_tile(tile.lmin, tile.lmax, matrix.fmax(), cache, options);
        found += result.len();
        committer.lock().submit(matrix, index, result)?;
    }

    Ok(WorkerStats {
        runtime: started.elapsed(),
        found,
    })
}

fn scan_tile<P: DigitPack>(
    lmin: Vamp,
    lmax: Vamp,
    fmax: Fang,
    cache: &FingerprintCache<P>,
    options: &Options,
) -> TileResult {
    match options.verbosity {
        Verbosity::CountPairs => {
            let mut sink = PairCount::default();
            scan(lmin, lmax, fmax, cache, options.cache, &mut sink);
            TileResult::PairTally(sink.pairs)
        }
        Verbosity::DumpPairs => {
            let mut sink = PairDump::default();
            scan(lmin, lmax, fmax, cache, options.cache, &mut sink);
            TileResult::PairList(sink.pairs)
        }
        Verbosity::CountVampires | Verbosity::PrintVampires => {
            let mut sink = VampireSink::new(options.min_fang_pairs);
            scan(lmin, lmax, fmax, cache, options.cache, &mut sink);
            TileResult::Vampires(sink.into_list())
        }
    }
}

fn scan<P: DigitPack, S: FangSink>(
    lmin: Vamp,
    lmax: Vamp,
    fmax: Fang,
    cache: &FingerprintCache<P>,
    cached: bool,
    sink: &mut S,
) {
    if cached {
        kernel::enumerate_fangs(lmin, lmax, fmax, cache, sink);
    } else {
        kernel::enumerate_fangs_uncached(lmin, lmax, fmax, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_TILE_SIZE;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn print_committer(buf: &SharedBuf) -> Committer {
        let mut options = Options::new(1_000, 9_999);
        options.verbosity = Verbosity::PrintVampires;
        Committer::new(&options, Box::new(buf.clone()), None, 0)
    }

    fn vampires(values: &[Vamp]) -> TileResult {
        let mut list = ResultList::new();
        for &value in values.iter().rev() {
            list.push(value);
        }
        TileResult::Vampires(list)
    }

    #[test]
    fn test_out_of_order_submission_commits_in_order() {
        let buf = SharedBuf::default();
        let mut committer = print_committer(&buf);
        let matrix = Matrix::build(1_000, 9_999, 1, Some(2_999));
        assert_eq!(matrix.len(), 3);
        committer.begin_matrix(matrix.len());

        // Tiles 1 and 2 finish before tile 0; nothing may be emitted yet.
        committer.submit(&matrix, 1, vampires(&[5_000])).unwrap();
        committer.submit(&matrix, 2, vampires(&[8_000, 9_000])).unwrap();
        assert_eq!(buf.contents(), "");
        assert_eq!(committer.count(), 0);

        // Tile 0 lands and unblocks the whole chain.
        committer.submit(&matrix, 0, vampires(&[1_260])).unwrap();
        assert_eq!(buf.contents(), "1 1260\n2 5000\n3 8000\n4 9000\n");
        assert_eq!(committer.count(), 4);
    }

    #[test]
    fn test_empty_tiles_do_not_block() {
        let buf = SharedBuf::default();
        let mut committer = print_committer(&buf);
        let matrix = Matrix::build(1_000, 9_999, 1, Some(2_999));
        committer.begin_matrix(matrix.len());

        committer.submit(&matrix, 0, vampires(&[])).unwrap();
        committer.submit(&matrix, 2, vampires(&[9_000])).unwrap();
        committer.submit(&matrix, 1, vampires(&[])).unwrap();
        assert_eq!(buf.contents(), "1 9000\n");
        assert_eq!(committer.count(), 1);
    }

    #[test]
    fn test_counter_carries_across_matrices() {
        let buf = SharedBuf::default();
        let mut committer = print_committer(&buf);

        let first = Matrix::build(1_000, 9_999, 1, Some(MAX_TILE_SIZE));
        committer.begin_matrix(first.len());
        committer.submit(&first, 0, vampires(&[1_260])).unwrap();

        let second = Matrix::build(100_000, 999_999, 1, Some(MAX_TILE_SIZE));
        committer.begin_matrix(second.len());
        committer.submit(&second, 0, vampires(&[102_510])).unwrap();

        assert_eq!(buf.contents(), "1 1260\n2 102510\n");
    }
}
