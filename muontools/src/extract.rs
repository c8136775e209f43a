//! Line by line reconstruction of trigger windows
//!
//! A trigger window is only known to be complete when the next trigger flag
//! arrives, so the extractor runs one window behind the input: the line that
//! opens window `n + 1` is the one that emits window `n`.

use crate::accum::PulseAccumulator;
use crate::daq::DaqLine;
use crate::edge::decode_edges;
use crate::line;
use crate::sink::{self, PulseWriter};
use crate::timebase::TimeBase;
use crate::ExtractedPulses;
use anyhow::Result;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// The open trigger window
#[derive(Clone, Copy, Debug, PartialEq)]
struct Window {
    /// Unwrapped trigger counter of the line that opened the window
    opened_at: u64,
    /// Absolute time of the opening line
    time: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum State {
    AwaitingFirstTrigger,
    Accumulating(Window),
}

/// Line counters of an extraction session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractorStats {
    pub lines: u64,
    pub garbage: u64,
    pub malformed: u64,
    pub records: u64,
}

/// Turns DAQ lines into [`ExtractedPulses`], one record per trigger window.
///
/// Holds all cross-line state of a DAQ session; use one extractor per
/// connection and feed it from a single thread.
pub struct PulseExtractor {
    timebase: TimeBase,
    accum: PulseAccumulator,
    state: State,
    writer: Option<PulseWriter>,
    stats: ExtractorStats,
}

impl Default for PulseExtractor {
    fn default() -> Self {
        PulseExtractor {
            timebase: TimeBase::new(),
            accum: PulseAccumulator::new(),
            state: State::AwaitingFirstTrigger,
            writer: None,
            stats: ExtractorStats::default(),
        }
    }
}

impl PulseExtractor {
    pub fn new() -> Self {
        PulseExtractor::default()
    }

    /// Extractor that can write its records through `writer`. Writing
    /// starts disabled; see [`PulseExtractor::write_pulses`].
    pub fn with_writer(writer: PulseWriter) -> Self {
        PulseExtractor {
            writer: Some(writer),
            ..PulseExtractor::default()
        }
    }

    /// Enable or disable writing emitted records. Without a writer this
    /// logs a warning and writing stays off.
    pub fn write_pulses(&mut self, enable: bool) -> Result<()> {
        match self.writer.as_mut() {
            Some(w) => {
                if enable && !w.is_enabled() {
                    debug!("starting to write pulses");
                }
                w.set_enabled(enable)
            }
            None => {
                if enable {
                    warn!("no pulse file configured, not writing pulses");
                }
                Ok(())
            }
        }
    }

    pub fn is_writing(&self) -> bool {
        self.writer.as_ref().map_or(false, PulseWriter::is_enabled)
    }

    pub fn stats(&self) -> ExtractorStats {
        self.stats
    }

    /// Feed one raw line. Returns the pulses of the previous trigger window
    /// when this line carries a trigger flag, `None` otherwise. Garbage and
    /// malformed lines are logged and leave the state untouched.
    pub fn extract(&mut self, raw: &str) -> Option<ExtractedPulses> {
        self.stats.lines += 1;
        let raw = match line::validate(raw) {
            Some(l) => l,
            None => {
                self.stats.garbage += 1;
                return None;
            }
        };
        match DaqLine::parse(raw) {
            Ok(l) => self.extract_line(&l),
            Err(e) => {
                self.stats.malformed += 1;
                warn!(error = %e, "skipping malformed DAQ line: {}", raw.trim_end());
                None
            }
        }
    }

    /// Feed one already parsed line; see [`PulseExtractor::extract`].
    pub fn extract_line(&mut self, line: &DaqLine) -> Option<ExtractedPulses> {
        diagnose(line);
        let timing = self.timebase.update(line);

        if !line.is_trigger() {
            match self.state {
                State::AwaitingFirstTrigger => {
                    debug!("no trigger seen yet, dropping edges");
                }
                State::Accumulating(w) => {
                    let offset = self.timebase.elapsed_ns(w.opened_at, timing.trigger_count);
                    self.accum.push(&decode_edges(&line.edges, offset));
                }
            }
            return None;
        }

        let window = Window {
            opened_at: timing.trigger_count,
            time: timing.time,
        };
        let emitted = match std::mem::replace(&mut self.state, State::Accumulating(window)) {
            State::AwaitingFirstTrigger => {
                self.accum.discard();
                None
            }
            State::Accumulating(prev) => {
                let p = ExtractedPulses::new(prev.time, self.accum.close());
                self.stats.records += 1;
                self.write(&p);
                Some(p)
            }
        };
        self.accum.push(&decode_edges(&line.edges, 0.0));
        return emitted;
    }

    /// End the session: the open window is discarded since its end never
    /// arrived, writing is switched off and its total duration returned.
    pub fn finish(&mut self) -> Duration {
        self.accum.discard();
        self.state = State::AwaitingFirstTrigger;
        match self.writer.as_mut() {
            Some(w) => {
                if let Err(e) = w.set_enabled(false) {
                    error!(error = %e, "cannot flush pulse file");
                }
                let d = w.active_duration();
                info!(
                    write_errors = w.errors(),
                    "the pulse extraction measurement was active for {} hours",
                    sink::hours(d)
                );
                d
            }
            None => Duration::ZERO,
        }
    }

    fn write(&mut self, p: &ExtractedPulses) {
        if let Some(w) = self.writer.as_mut() {
            if let Err(e) = w.write(p) {
                error!(error = %e, "cannot write pulses, pulse writing switched off");
            }
        }
    }
}

/// Log what the card reports about its own health. Timing is not affected.
fn diagnose(line: &DaqLine) {
    if !line.gps_valid {
        debug!("GPS data not valid");
    }
    if let Some(status) = line.status {
        if status.gps_corrupted() {
            warn!(status = status.0, "GPS data possibly corrupted");
        }
        if status.one_pps_rate_off() {
            warn!(status = status.0, "1-PPS rate out of range");
        }
    }
}
