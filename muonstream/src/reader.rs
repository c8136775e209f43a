use anyhow::Result;
use either::{Either, Left, Right};
use std::io::{stdin, BufRead};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, span, Level};

use muontools::de;

use crate::Event;

/// Read DAQ lines from standard input (`Left`) or a recording (`Right`) and
/// pass them on, one event per line, finishing with `Event::Eof`.
pub fn main(input: Either<(), String>, sender: flume::Sender<Event>) -> JoinHandle<Result<()>> {
    thread::spawn(move || -> Result<()> {
        let span = span!(Level::INFO, "reader");
        let _enter = span.enter();
        match input {
            Left(()) => {
                let stdin = stdin();
                let rdr = stdin.lock();
                forward(rdr, &sender)
            }
            Right(path) => {
                info!("reading DAQ lines from {}", path);
                let rdr = de::daq_file(&path)?;
                forward(rdr, &sender)
            }
        }
    })
}

/// Send every line of `rdr`, then `Event::Eof`. Stops early without error
/// when the receiving side has gone away.
pub fn forward(mut rdr: impl BufRead, sender: &flume::Sender<Event>) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if rdr.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf).into_owned();
        if sender.send(Event::Line(line)).is_err() {
            debug!("processor gone, stop reading");
            return Ok(());
        }
    }
    let _ = sender.send(Event::Eof);
    Ok(())
}
