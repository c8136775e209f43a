use anyhow::{bail, Result};
use argh::FromArgs;
use either::{Either, Left, Right};
use std::fs::{self, File};
use std::io::{stdin, stdout, BufRead, BufWriter, Write};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use muontools::extract::PulseExtractor;
use muontools::{de, line, ser};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[derive(Debug, FromArgs, Clone)]
/// Convert raw DAQ card output to the pulse file format, one line per
/// trigger window. Inputs ending in .zst are decompressed on the fly.
/// Each input is treated as its own session.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// file to write output to (writes to standard output by default)
    #[argh(option, short = 'o')]
    pub out: Option<String>,
    /// with no input or when input is '-', read from standard input
    #[argh(positional)]
    pub input: Vec<String>,
}

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        let stdout = stdout();
        let mut stdout = stdout.lock();
        writeln!(
            stdout,
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        )?;
        return Ok(())
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Collect inputs
    let mut inputs: Vec<Either<(), String>> = Vec::new();
    if args.input.is_empty() {
        inputs.push(Left(()));
    } else {
        let mut contains_stdin = false;
        for i in args.input {
            if i == "-" {
                if contains_stdin {
                    bail!("cannot specify '-' for stdin twice");
                }
                contains_stdin = true;
                inputs.push(Left(()));
            } else {
                let m = fs::metadata(&i)?;
                if !m.is_file() {
                    bail!("{} is not a file", &i);
                }
                inputs.push(Right(i));
            }
        }
    }

    let stdout = stdout();
    let out: Box<dyn Write> = match args.out {
        None => Box::new(stdout.lock()),
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
    };
    let mut wtr = ser::writer(out);

    for i in inputs {
        match i {
            Left(()) => {
                let stdin = stdin();
                let rdr = stdin.lock();
                convert("stdin", rdr, &mut wtr)?;
            }
            Right(path) => {
                let rdr = de::daq_file(&path)?;
                convert(&path, rdr, &mut wtr)?;
            }
        }
    }
    wtr.flush()?;
    Ok(())
}

fn convert(name: &str, mut rdr: impl BufRead, wtr: &mut csv::Writer<impl Write>) -> Result<()> {
    let mut x = PulseExtractor::new();
    let mut buf = Vec::new();
    let mut skipped = 0u64;
    loop {
        buf.clear();
        if rdr.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        // invalid UTF-8 turns into replacement characters, which the
        // line validator rejects as garbage
        let raw = String::from_utf8_lossy(&buf);
        if !line::is_pulse_message(&raw) {
            debug!("skipping DAQ message: {}", raw.trim_end());
            skipped += 1;
            continue;
        }
        if let Some(p) = x.extract(&raw) {
            ser::record(wtr, &p)?;
        }
    }
    x.finish();
    let s = x.stats();
    info!(
        input = name,
        lines = s.lines,
        skipped,
        garbage = s.garbage,
        malformed = s.malformed,
        records = s.records,
        "conversion done"
    );
    Ok(())
}
