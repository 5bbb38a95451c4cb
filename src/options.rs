//! Runtime configuration and command-line parsing.

use std::path::PathBuf;

use crate::core::digits;
use crate::core::fingerprint::{DigitPack, Narrow, Wide};
use crate::{Error, Result, Vamp};

/// What the run reports.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Verbosity {
    /// Count valid fang pairs; no per-result output.
    CountPairs,
    /// Print one line per fang pair.
    DumpPairs,
    /// Count distinct vampire numbers.
    CountVampires,
    /// Print each distinct vampire number with its 1-based index.
    PrintVampires,
}

/// Fingerprint encoding.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Encoding {
    /// 64-bit, 7-bit fields; exact to 20-digit products.
    Wide,
    /// 32-bit, base-11; half the cache, exact to 10-digit products.
    Narrow,
}

#[derive(Clone, Debug)]
pub struct Options {
    pub min: Vamp,
    pub max: Vamp,
    pub threads: usize,
    pub verbosity: Verbosity,
    /// Products need at least this many fang pairs to count.
    pub min_fang_pairs: u8,
    /// Numbers per tile; `None` sizes tiles from the range and thread count.
    pub tile_size: Option<u64>,
    /// Use the fingerprint cache (the division-free hot loop).
    pub cache: bool,
    pub encoding: Encoding,
    pub checkpoint: Option<PathBuf>,
    pub checksum: bool,
    pub progress: bool,
    pub measure_runtime: bool,
}

impl Options {
    pub fn new(min: Vamp, max: Vamp) -> Self {
        Self {
            min,
            max,
            threads: num_cpus::get(),
            verbosity: Verbosity::CountVampires,
            min_fang_pairs: 1,
            tile_size: None,
            cache: true,
            encoding: Encoding::Wide,
            checkpoint: None,
            checksum: false,
            progress: false,
            measure_runtime: false,
        }
    }

    /// Parse `MIN MAX [flags...]` (the arguments after the program name).
    pub fn parse<I>(args: I) -> Result<Options>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let min = parse_number(args.next())?;
        let max = parse_number(args.next())?;
        let mut options = Options::new(min, max);

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--threads" => {
                    options.threads = parse_flag_value(&flag, args.next())?;
                }
                "--mode" => {
                    let mode = args
                        .next()
                        .ok_or_else(|| Error::InputParse(flag.clone()))?;
                    options.verbosity = match mode.as_str() {
                        "count-pairs" => Verbosity::CountPairs,
                        "dump-pairs" => Verbosity::DumpPairs,
                        "count-vampires" => Verbosity::CountVampires,
                        "print-vampires" => Verbosity::PrintVampires,
                        _ => return Err(Error::InputParse(mode)),
                    };
                }
                "--min-fang-pairs" => {
                    options.min_fang_pairs = parse_flag_value(&flag, args.next())?;
                }
                "--tile-size" => {
                    options.tile_size = Some(parse_flag_value(&flag, args.next())?);
                }
                "--no-cache" => options.cache = false,
                "--narrow" => options.encoding = Encoding::Narrow,
                "--checkpoint" => {
                    let path = args
                        .next()
                        .ok_or_else(|| Error::InputParse(flag.clone()))?;
                    options.checkpoint = Some(PathBuf::from(path));
                }
                "--checksum" => options.checksum = true,
                "--progress" => options.progress = true,
                "--time" => options.measure_runtime = true,
                _ => return Err(Error::InputParse(flag)),
            }
        }

        Ok(options)
    }

    /// Reject impossible intervals and ranges the chosen encoding cannot
    /// represent exactly.
    pub fn validate(&self) -> Result<()> {
        if self.min > self.max {
            return Err(Error::InputRange {
                min: self.min,
                max: self.max,
            });
        }
        let limit = match self.encoding {
            Encoding::Wide => Wide::MAX_PRODUCT_LENGTH,
            Encoding::Narrow => Narrow::MAX_PRODUCT_LENGTH,
        };
        let got = digits::length(self.max);
        if got > limit {
            return Err(Error::CapacityExceeded {
                max: self.max,
                got,
                limit,
                encoding: match self.encoding {
                    Encoding::Wide => Wide::NAME,
                    Encoding::Narrow => Narrow::NAME,
                },
            });
        }
        Ok(())
    }
}

fn parse_number(arg: Option<String>) -> Result<Vamp> {
    let arg = arg.ok_or_else(|| Error::InputParse(String::from("missing argument")))?;
    arg.parse().map_err(|_| Error::InputParse(arg))
}

fn parse_flag_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let value = value.ok_or_else(|| Error::InputParse(flag.to_string()))?;
    value.parse().map_err(|_| Error::InputParse(value))
}
