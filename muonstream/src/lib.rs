pub mod processor;
pub mod reader;
pub mod save;

use argh::FromArgs;
#[derive(Debug, FromArgs, Clone)]
/// Decode a stream of DAQ card lines and run the muon triggers on every
/// trigger window. Trigger results are written to standard output as
/// tab-separated values: kind, trigger time, flight or decay time in ns.
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// analysis config file path (both triggers with defaults if missing)
    #[argh(option)]
    pub config: Option<String>,
    /// write extracted pulses to this file, overriding the config
    #[argh(option)]
    pub pulses: Option<String>,
    /// file to write trigger results to (writes to standard output by default)
    #[argh(option, short = 'o')]
    pub out: Option<String>,
    /// number of lines buffered between reader and processor
    #[argh(option, default = "1024")]
    pub queue: usize,
    /// recording to read; with no input or when input is '-', read from standard input
    #[argh(positional)]
    pub input: Option<String>,
}

pub enum Event {
    Line(String),
    Eof,
}

/// Counters shared between the pipeline threads
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub lines: u64,
    pub skipped: u64,
    pub garbage: u64,
    pub malformed: u64,
    pub records: u64,
    pub velocities: u64,
    pub decays: u64,
}
