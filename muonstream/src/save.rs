use anyhow::{Context, Result};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path;
use std::thread::{self, JoinHandle};
use tracing::{info, span, Level};

use crate::processor::Outcome;

pub struct SaveHandle {
    pub join_handle: JoinHandle<Result<u64>>,
}

impl SaveHandle {
    /// Write every outcome received to `out`. The thread ends once all
    /// senders are gone and returns the number of outcomes written.
    pub fn new(out: Box<dyn Write + Send>, receiver: flume::Receiver<Outcome>) -> Self {
        let join_handle = thread::spawn(move || -> Result<u64> {
            let span = span!(Level::INFO, "save");
            let _enter = span.enter();
            let mut wtr = writer(out);
            let mut n = 0u64;
            while let Ok(o) = receiver.recv() {
                outcome(&mut wtr, &o).context("cannot write trigger result")?;
                n += 1;
            }
            wtr.flush()?;
            info!("saved {} trigger results", n);
            Ok(n)
        });
        SaveHandle { join_handle }
    }
}

/// Destination for trigger results: a new file at `path`, or standard
/// output. An existing file is never overwritten.
pub fn output(path: Option<&path::Path>) -> Result<Box<dyn Write + Send>> {
    match path {
        Some(p) => {
            let f = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(p)
                .with_context(|| format!("cannot create results file {}", p.display()))?;
            Ok(Box::new(BufWriter::new(f)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// Tab delimited, headerless writer for trigger results
pub fn writer<W: Write>(wtr: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_writer(wtr)
}

/// Serialize one outcome as `kind, time, value`
pub fn outcome(wtr: &mut csv::Writer<impl Write>, o: &Outcome) -> Result<()> {
    let mut buf = ryu::Buffer::new();
    match *o {
        Outcome::Velocity { time, flight_time } => {
            wtr.write_field("velocity")?;
            wtr.write_field(buf.format(time))?;
            wtr.write_field(buf.format(flight_time))?;
        }
        Outcome::Decay { time, decay_time } => {
            wtr.write_field("decay")?;
            wtr.write_field(buf.format(time))?;
            wtr.write_field(decay_time.to_string())?;
        }
    }
    wtr.write_record(None::<&[u8]>)?;
    Ok(())
}
