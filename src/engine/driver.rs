//! Run driver.
//!
//! Normalizes `[min, max]` to even digit lengths, walks one subrange per
//! length, and runs a fresh matrix with a pool of scoped threads for each.
//! Odd-length stretches of the interval vanish in normalization; vampire
//! numbers only have even lengths.

use std::io::Write;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::checkpoint::Checkpoint;
use crate::core::cache::FingerprintCache;
use crate::core::digits;
use crate::core::fingerprint::{DigitPack, Narrow, Wide};
use crate::engine::matrix::Matrix;
use crate::engine::pool::{self, Committer};
use crate::options::{Encoding, Options, Verbosity};
use crate::{Result, Vamp};

/// What a run produced.
pub struct Summary {
    /// Results found (pairs or distinct vampires, per the verbosity mode).
    pub count: u64,
    /// Hex digest of the output stream, when checksumming was on.
    pub checksum: Option<String>,
}

/// Interval start, lifted to the next even-length boundary when its length
/// is odd.
fn get_min(min: Vamp, max: Vamp) -> Vamp {
    if digits::length_is_odd(min) {
        let min_length = digits::length(min);
        if min_length < digits::length(max) {
            digits::pow10(min_length)
        } else {
            max
        }
    } else {
        min
    }
}

/// Interval end, dropped to the previous even-length boundary when its
/// length is odd.
fn get_max(min: Vamp, max: Vamp) -> Vamp {
    if digits::length_is_odd(max) {
        let max_length = digits::length(max);
        if max_length > digits::length(min) {
            digits::pow10(max_length - 1) - 1
        } else {
            min
        }
    } else {
        max
    }
}

/// Largest number with `lmin`'s digit length, capped at `max`.
fn get_lmax(lmin: Vamp, max: Vamp) -> Vamp {
    if digits::length(lmin) < digits::length(Vamp::MAX) {
        let lmax = digits::pow10(digits::length(lmin)) - 1;
        if lmax < max {
            return lmax;
        }
    }
    max
}

/// Search `[options.min, options.max]`, writing result lines to `writer`
/// and status lines to stderr.
pub fn run(options: &Options, writer: Box<dyn Write + Send>) -> Result<Summary> {
    options.validate()?;
    match options.encoding {
        Encoding::Wide => run_with::<Wide>(options, writer),
        Encoding::Narrow => run_with::<Narrow>(options, writer),
    }
}

fn run_with<P: DigitPack>(options: &Options, writer: Box<dyn Write + Send>) -> Result<Summary> {
    let threads = options.threads.max(1);
    let min = get_min(options.min, options.max);
    let max = get_max(min, options.max);

    let checkpoint = match &options.checkpoint {
        Some(path) => Some(Checkpoint::open(path, options.min, options.max)?),
        None => None,
    };

    let mut start = min;
    let mut initial_count = 0;
    let mut complete = false;
    if let Some((done, count)) = checkpoint.as_ref().and_then(|c| c.resume()) {
        initial_count = count;
        if done >= max {
            complete = true;
        } else {
            start = get_min(done + 1, max);
        }
    }

    let committer = Mutex::new(Committer::new(options, writer, checkpoint, initial_count));
    let mut worker_runtime = vec![Duration::ZERO; threads];
    let mut worker_found = vec![0u64; threads];

    if !complete {
        let cache = FingerprintCache::<P>::new(max);
        let mut lmin = start;
        loop {
            let lmax = get_lmax(lmin, max);
            eprintln!("Checking interval: [{lmin}, {lmax}]");

            let matrix = Matrix::build(lmin, lmax, threads, options.tile_size);
            committer.lock().begin_matrix(matrix.len());

            thread::scope(|scope| -> Result<()> {
                let mut handles = Vec::with_capacity(threads);
                for _ in 0..threads {
                    handles.push(
                        scope.spawn(|| pool::run_worker(&matrix, &cache, &committer, options)),
                    );
                }
                for (worker, handle) in handles.into_iter().enumerate() {
                    match handle.join() {
                        Ok(stats) => {
                            let stats = stats?;
                            worker_runtime[worker] += stats.runtime;
                            worker_found[worker] += stats.found;
                        }
                        Err(panic) => std::panic::resume_unwind(panic),
                    }
                }
                Ok(())
            })?;

            if lmax >= max {
                break;
            }
            lmin = get_min(lmax + 1, max);
        }
    }

    let (count, checksum) = committer.into_inner().finish();

    if options.measure_runtime {
        let total: Duration = worker_runtime.iter().sum();
        eprintln!("Thread  Runtime Count");
        for (worker, runtime) in worker_runtime.iter().enumerate() {
            eprintln!(
                "{}\t{:.2}s\t{}",
                worker,
                runtime.as_secs_f64(),
                worker_found[worker]
            );
        }
        eprintln!(
            "\nFang search took: {:.2} s, average: {:.2} s",
            total.as_secs_f64(),
            total.as_secs_f64() / threads as f64
        );
    }

    match options.verbosity {
        Verbosity::CountPairs | Verbosity::DumpPairs => {
            eprintln!("Found: {count} valid fang pairs.");
        }
        Verbosity::CountVampires | Verbosity::PrintVampires => {
            eprintln!("Found: {count} vampire numbers.");
        }
    }
    if let Some(digest) = &checksum {
        eprintln!("Digest sha256 is: {digest}");
    }

    Ok(Summary { count, checksum })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
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

    fn run_captured(options: &Options) -> (Summary, String) {
        let buf = SharedBuf::default();
        let summary = run(options, Box::new(buf.clone())).unwrap();
        (summary, buf.contents())
    }

    fn base_options(min: Vamp, max: Vamp) -> Options {
        let mut options = Options::new(min, max);
        options.threads = 1;
        options
    }

    const FOUR_DIGIT_PRINTOUT: &str = "1 1260\n2 1395\n3 1435\n4 1530\n5 1827\n6 2187\n7 6880\n";

    #[test]
    fn test_normalization() {
        assert_eq!(get_min(0, 1_999), 10);
        assert_eq!(get_min(100, 1_999), 1_000);
        assert_eq!(get_min(1_000, 9_999), 1_000);
        assert_eq!(get_min(5, 9), 9);
        assert_eq!(get_max(10, 99_999), 9_999);
        assert_eq!(get_max(10, 9_999), 9_999);
        assert_eq!(get_lmax(10, 1_999), 99);
        assert_eq!(get_lmax(1_000, 1_999), 1_999);
        assert_eq!(get_lmax(1_000, 99_999_999), 9_999);
    }

    #[test]
    fn test_no_vampires_below_four_digits() {
        let (summary, output) = run_captured(&base_options(0, 1_999));
        assert_eq!(summary.count, 0);
        assert_eq!(output, "");

        let (summary, _) = run_captured(&base_options(1_000, 1_999));
        assert_eq!(summary.count, 0);
    }

    #[test]
    fn test_four_digit_counts() {
        let (summary, _) = run_captured(&base_options(1_000, 9_999));
        assert_eq!(summary.count, 7);
    }

    #[test]
    fn test_four_digit_printout() {
        let mut options = base_options(1_000, 9_999);
        options.verbosity = Verbosity::PrintVampires;
        let (summary, output) = run_captured(&options);
        assert_eq!(summary.count, 7);
        assert_eq!(output, FOUR_DIGIT_PRINTOUT);
    }

    #[test]
    fn test_six_digit_count() {
        let mut options = base_options(100_000, 999_999);
        options.threads = 4;
        let (summary, _) = run_captured(&options);
        assert_eq!(summary.count, 148);
    }

    #[test]
    fn test_spanning_run_skips_odd_lengths() {
        // 4-digit and 6-digit vampires, nothing from the 5-digit stretch
        let mut options = base_options(0, 999_999);
        options.threads = 2;
        let (summary, _) = run_captured(&options);
        assert_eq!(summary.count, 7 + 148);
    }

    #[test]
    fn test_single_number_interval() {
        let (summary, _) = run_captured(&base_options(6_880, 6_880));
        assert_eq!(summary.count, 1);

        let (summary, _) = run_captured(&base_options(6_879, 6_879));
        assert_eq!(summary.count, 0);
    }

    #[test]
    fn test_thread_count_invariance() {
        let mut reference = None;
        for threads in [1, 2, 4, 8] {
            let mut options = base_options(1_000, 9_999);
            options.verbosity = Verbosity::PrintVampires;
            options.threads = threads;
            options.tile_size = Some(300);
            options.checksum = true;
            let (summary, output) = run_captured(&options);
            assert_eq!(summary.count, 7, "threads={threads}");
            assert_eq!(output, FOUR_DIGIT_PRINTOUT, "threads={threads}");

            let digest = summary.checksum.expect("checksum enabled");
            match &reference {
                None => reference = Some(digest),
                Some(expected) => assert_eq!(&digest, expected, "threads={threads}"),
            }
        }
    }

    #[test]
    fn test_pair_modes() {
        let mut options = base_options(1_000, 9_999);
        options.verbosity = Verbosity::CountPairs;
        let (summary, output) = run_captured(&options);
        assert_eq!(summary.count, 7);
        assert_eq!(output, "");

        // A single tile dumps pairs in kernel order: multiplier descending.
        options.verbosity = Verbosity::DumpPairs;
        options.tile_size = Some(crate::MAX_TILE_SIZE);
        let (summary, output) = run_captured(&options);
        assert_eq!(summary.count, 7);
        assert_eq!(
            output,
            "1395 = 93 x 15\n1827 = 87 x 21\n6880 = 86 x 80\n2187 = 81 x 27\n\
             1260 = 60 x 21\n1530 = 51 x 30\n1435 = 41 x 35\n"
        );
    }

    #[test]
    fn test_no_cache_and_narrow_agree() {
        let mut options = base_options(1_000, 9_999);
        options.cache = false;
        let (summary, _) = run_captured(&options);
        assert_eq!(summary.count, 7);

        let mut options = base_options(1_000, 9_999);
        options.encoding = Encoding::Narrow;
        let (summary, _) = run_captured(&options);
        assert_eq!(summary.count, 7);
    }

    fn scratch_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("helsing-driver-{}-{}", std::process::id(), name));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn test_checkpoint_resume_completes_the_stream() {
        let path = scratch_path("resume");
        // A previous run committed everything below 5000 (six vampires).
        std::fs::write(&path, "1000 9999\n4999 6\n").unwrap();

        let mut options = base_options(1_000, 9_999);
        options.verbosity = Verbosity::PrintVampires;
        options.checkpoint = Some(path.clone());
        let (summary, output) = run_captured(&options);

        // Only the remainder is emitted, numbered as a continuation; the
        // resumed stream concatenates to the uninterrupted one.
        assert_eq!(summary.count, 7);
        assert_eq!(output, "7 6880\n");
        assert!(FOUR_DIGIT_PRINTOUT.ends_with(&output));

        let recorded = std::fs::read_to_string(&path).unwrap();
        assert!(recorded.lines().last().unwrap().ends_with(" 7"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_checkpoint_full_run_then_noop_resume() {
        let path = scratch_path("noop");

        let mut options = base_options(1_000, 9_999);
        options.verbosity = Verbosity::PrintVampires;
        options.checkpoint = Some(path.clone());
        let (summary, output) = run_captured(&options);
        assert_eq!(summary.count, 7);
        assert_eq!(output, FOUR_DIGIT_PRINTOUT);

        // Resuming a finished run emits nothing and keeps the count.
        let (summary, output) = run_captured(&options);
        assert_eq!(summary.count, 7);
        assert_eq!(output, "");

        std::fs::remove_file(&path).unwrap();
    }
}
