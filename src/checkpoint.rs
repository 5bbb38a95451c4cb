//! Resumable progress file.
//!
//! Line-oriented text: the first line is `MIN MAX` of the requested
//! interval, each following line is `lmax count` for a committed tile. The
//! last line therefore names the highest fully-committed product and the
//! running result count, which is all a restart needs.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::{Error, Result, Vamp};

#[derive(Debug)]
pub struct Checkpoint {
    writer: BufWriter<File>,
    resume: Option<(Vamp, u64)>,
}

impl Checkpoint {
    /// Open `path`, creating it with a `MIN MAX` header if absent. An
    /// existing file must carry the same interval; its last entry becomes
    /// the resume point.
    pub fn open(path: &Path, min: Vamp, max: Vamp) -> Result<Self> {
        if path.exists() {
            let mut contents = String::new();
            File::open(path)?.read_to_string(&mut contents)?;
            let resume = parse_contents(&contents, min, max)?;
            let file = OpenOptions::new().append(true).open(path)?;
            Ok(Self {
                writer: BufWriter::new(file),
                resume,
            })
        } else {
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            writeln!(writer, "{} {}", min, max)?;
            writer.flush()?;
            Ok(Self {
                writer,
                resume: None,
            })
        }
    }

    /// Highest committed `lmax` and the count at that point, if any work
    /// was recorded.
    pub fn resume(&self) -> Option<(Vamp, u64)> {
        self.resume
    }

    /// Record one committed tile.
    pub fn record(&mut self, lmax: Vamp, count: u64) -> std::io::Result<()> {
        writeln!(self.writer, "{} {}", lmax, count)?;
        self.writer.flush()
    }
}

fn parse_contents(contents: &str, min: Vamp, max: Vamp) -> Result<Option<(Vamp, u64)>> {
    let mut lines = contents.lines();
    let header = lines
        .next()
        .ok_or_else(|| Error::Checkpoint(String::from("empty file")))?;
    let (file_min, file_max) = parse_pair(header)?;
    if (file_min, file_max) != (min, max) {
        return Err(Error::Checkpoint(format!(
            "interval mismatch: file covers [{file_min}, {file_max}], requested [{min}, {max}]"
        )));
    }

    let mut resume = None;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        let (lmax, count) = parse_pair(line)?;
        if let Some((prev, _)) = resume {
            if lmax <= prev {
                return Err(Error::Checkpoint(format!(
                    "entries out of order: {lmax} after {prev}"
                )));
            }
        }
        resume = Some((lmax, count));
    }
    Ok(resume)
}

fn parse_pair(line: &str) -> Result<(u64, u64)> {
    let bad = || Error::Checkpoint(format!("malformed line: {line:?}"));
    let mut fields = line.split_whitespace();
    let a = fields.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let b = fields.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    if fields.next().is_some() {
        return Err(bad());
    }
    Ok((a, b))
}
