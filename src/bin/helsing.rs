//! Command-line front end for the search engine.
//!
//! Usage:
//!   helsing MIN MAX
//!   helsing 1000 9999 --mode print-vampires
//!   helsing 0 99999999 --threads 8 --checkpoint run.ckpt --checksum

use std::env;
use std::process::ExitCode;

use helsing::{run, Options};

fn print_usage() {
    println!("Usage: helsing MIN MAX [OPTIONS]");
    println!();
    println!("Searches [MIN, MAX] for vampire numbers.");
    println!();
    println!("Options:");
    println!("  --threads N          Worker threads (default: all cores)");
    println!("  --mode MODE          count-pairs | dump-pairs | count-vampires | print-vampires");
    println!("                       (default: count-vampires)");
    println!("  --min-fang-pairs N   Only report numbers with at least N fang pairs");
    println!("  --tile-size N        Numbers per work tile (default: sized from the range)");
    println!("  --no-cache           Skip the fingerprint cache; compute digits directly");
    println!("  --narrow             32-bit fingerprints; halves cache memory, MAX < 10^10");
    println!("  --checkpoint FILE    Record committed progress; resume from FILE if present");
    println!("  --checksum           Print a SHA-256 digest of the result stream");
    println!("  --progress           Report each committed tile on stderr");
    println!("  --time               Report per-thread runtimes on stderr");
    println!("  --help               Show this help");
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_usage();
        return ExitCode::SUCCESS;
    }
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    let options = match Options::parse(args) {
        Ok(options) => options,
        Err(error) => {
            eprintln!("helsing: {error}");
            return ExitCode::FAILURE;
        }
    };

    match run(&options, Box::new(std::io::stdout())) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("helsing: {error}");
            ExitCode::FAILURE
        }
    }
}
