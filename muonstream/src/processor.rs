use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, span, Level};

use muontools::cfg::Analysis;
use muontools::extract::PulseExtractor;
use muontools::line;
use muontools::trigger::{DecayTriggerThorough, VelocityTrigger};
use muontools::ExtractedPulses;

use crate::{Event, Stats};

/// Result of a trigger that fired on a trigger window
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// Flight time in ns between the upper and lower detector
    Velocity { time: f64, flight_time: f64 },
    /// Decay time in ns
    Decay { time: f64, decay_time: i64 },
}

/// The configured triggers, run on every emitted trigger window
#[derive(Clone, Copy, Debug, Default)]
pub struct Analyzer {
    velocity: Option<VelocityTrigger>,
    decay: Option<DecayTriggerThorough>,
}

impl Analyzer {
    pub fn new(velocity: Option<VelocityTrigger>, decay: Option<DecayTriggerThorough>) -> Self {
        Analyzer { velocity, decay }
    }

    pub fn from_config(cfg: &Analysis) -> Self {
        Analyzer::new(cfg.velocity_trigger(), cfg.decay_trigger())
    }

    pub fn analyze(&self, p: &ExtractedPulses) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        if let Some(flight_time) = self.velocity.as_ref().and_then(|t| t.trigger(p)) {
            outcomes.push(Outcome::Velocity { time: p.time(), flight_time });
        }
        if let Some(decay_time) = self.decay.as_ref().and_then(|t| t.trigger(p)) {
            outcomes.push(Outcome::Decay { time: p.time(), decay_time });
        }
        return outcomes;
    }
}

/// Single consumer of the DAQ line stream. Owns the extractor for the whole
/// session and forwards trigger outcomes until `Event::Eof` or until the
/// reader hangs up; the outcome channel closes when this thread exits.
pub fn main(
    mut extractor: PulseExtractor,
    analyzer: Analyzer,
    stats: Arc<Mutex<Stats>>,
    receiver: flume::Receiver<Event>,
    sender: flume::Sender<Outcome>,
) -> JoinHandle<Result<()>> {
    thread::spawn(move || -> Result<()> {
        let span = span!(Level::INFO, "processor");
        let _enter = span.enter();
        while let Ok(Event::Line(raw)) = receiver.recv() {
            if !line::is_pulse_message(&raw) {
                debug!("skipping DAQ message: {}", raw.trim_end());
                let mut s = stats.lock();
                s.lines += 1;
                s.skipped += 1;
                continue;
            }
            let emitted = extractor.extract(&raw);
            let outcomes = emitted.as_ref().map(|p| analyzer.analyze(p)).unwrap_or_default();
            {
                let x = extractor.stats();
                let mut s = stats.lock();
                s.lines += 1;
                s.garbage = x.garbage;
                s.malformed = x.malformed;
                s.records = x.records;
                for o in outcomes.iter() {
                    match o {
                        Outcome::Velocity { .. } => s.velocities += 1,
                        Outcome::Decay { .. } => s.decays += 1,
                    }
                }
            }
            if outcomes.into_iter().any(|o| sender.send(o).is_err()) {
                error!("save thread gone, stopping");
                extractor.finish();
                bail!("trigger results can no longer be saved");
            }
        }
        extractor.finish();
        Ok(())
    })
}
