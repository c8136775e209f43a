//! `checkdir [--upper ch] [--lower ch] [pulses.tsv]`
//!
//! Count upward and downward going muons in a pulse file.

use anyhow::Result;
use argh::FromArgs;
use std::io::{stdin, stdout, Write};

use muontools::analysis::{direction, DirectionCounts};
use muontools::{de, Channel};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[derive(Debug, FromArgs, Clone)]
/// Direction statistics of a pulse file, from the first rising edge in the
/// upper and lower detector channel of each trigger window
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// channel of the upper detector (default ch0)
    #[argh(option, default = "Channel::Ch0")]
    pub upper: Channel,
    /// channel of the lower detector (default ch1)
    #[argh(option, default = "Channel::Ch1")]
    pub lower: Channel,
    /// pulse file (reads standard input by default)
    #[argh(positional)]
    pub input: Option<String>,
}

fn main() -> Result<()> {
    let args: CliArgs = argh::from_env();
    if args.version {
        println!(
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        );
        return Ok(())
    }

    let records = match args.input.as_deref() {
        None | Some("-") => {
            let stdin = stdin();
            let mut rdr = de::reader(stdin.lock());
            de::pulses(&mut rdr)?
        }
        Some(path) => {
            let mut rdr = de::reader(std::fs::File::open(path)?);
            de::pulses(&mut rdr)?
        }
    };

    let mut counts = DirectionCounts::default();
    counts.extend(records.iter().filter_map(|p| direction(p, args.upper, args.lower)));

    let stdout = stdout();
    let mut stdout = stdout.lock();
    writeln!(stdout, "up\t{}", counts.up)?;
    writeln!(stdout, "down\t{}", counts.down)?;
    match counts.up_fraction() {
        Some(f) => writeln!(stdout, "up fraction\t{:.4}", f)?,
        None => writeln!(stdout, "up fraction\t-")?,
    }
    Ok(())
}
