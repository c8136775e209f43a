//! Absolute and relative timing from the DAQ card counters
//!
//! The card latches a free running 32-bit counter on every trigger and on
//! every GPS 1-PPS edge. Trigger times are reconstructed by projecting from
//! the last 1-PPS edge, whose wall clock time is known from the GPS string,
//! using an oscillator frequency estimated from the 1-PPS counter itself.

use crate::daq::{DaqLine, GpsTime};
use crate::DEFAULT_FREQUENCY;
use tracing::{debug, warn};

/// Span of the 32-bit hardware counters
pub const ROLLOVER: u64 = 1 << 32;

/// Number of 1-PPS transitions between frequency estimates
pub const RECALIBRATION_PERIOD: u32 = 5;

/// Unwraps a free running 32-bit counter into a monotonic 64-bit count.
#[derive(Clone, Copy, Debug, Default)]
pub struct Counter {
    last: Option<u32>,
    epoch: u64,
}

impl Counter {
    pub fn new() -> Self {
        Counter::default()
    }

    /// Feed the next raw reading and get the unwrapped value. A reading
    /// smaller than the previous one is taken as a rollover.
    pub fn update(&mut self, raw: u32) -> u64 {
        if let Some(last) = self.last {
            if raw < last {
                self.epoch += 1;
            }
        }
        self.last = Some(raw);
        return raw as u64 + self.epoch * ROLLOVER;
    }
}

/// Difference of two unwrapped counter values, folding back a spurious
/// extra rollover.
pub fn counter_diff(now: u64, then: u64) -> u64 {
    let mut diff = now.saturating_sub(then);
    if diff >= ROLLOVER {
        diff -= ROLLOVER;
    }
    return diff;
}

/// Ticks from `earlier` to `later`, two raw latches of the same counter
/// with `later` taken after `earlier`, at most one rollover apart.
pub fn ticks_between(later: u32, earlier: u32) -> u64 {
    later.wrapping_sub(earlier) as u64
}

/// Timing of one decoded line
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LineTiming {
    /// Unwrapped trigger counter
    pub trigger_count: u64,
    /// Absolute time in seconds since day start
    pub time: f64,
}

/// Per session timing state. Updated exactly once per decoded line.
#[derive(Clone, Debug)]
pub struct TimeBase {
    trigger: Counter,
    one_pps: Counter,
    last_one_pps: Option<u32>,
    last_gps_time: Option<GpsTime>,
    recalibrated_at: u64,
    passed_one_pps: u32,
    frequency: f64,
}

impl Default for TimeBase {
    fn default() -> Self {
        TimeBase {
            trigger: Counter::new(),
            one_pps: Counter::new(),
            last_one_pps: None,
            last_gps_time: None,
            recalibrated_at: 0,
            passed_one_pps: 0,
            frequency: DEFAULT_FREQUENCY,
        }
    }
}

impl TimeBase {
    pub fn new() -> Self {
        TimeBase::default()
    }

    /// Current oscillator frequency estimate in Hz
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn update(&mut self, line: &DaqLine) -> LineTiming {
        let trigger_count = self.trigger.update(line.trigger_count);

        // 1-PPS latch the trigger is projected from
        let mut one_pps = line.one_pps;
        match self.last_one_pps {
            None => {
                self.recalibrated_at = self.one_pps.update(line.one_pps);
            }
            Some(last) if last != line.one_pps => {
                let unwrapped = self.one_pps.update(line.one_pps);
                self.passed_one_pps += 1;
                if self.passed_one_pps == RECALIBRATION_PERIOD {
                    self.recalibrate(unwrapped);
                }
                // The 1-PPS switch can be logged one line after the GPS
                // string changed; keep the old latch until the string moves.
                if self.last_gps_time == Some(line.gps_time) {
                    one_pps = last;
                }
            }
            Some(_) => {}
        }
        self.last_one_pps = Some(line.one_pps);
        self.last_gps_time = Some(line.gps_time);

        let since_one_pps = ticks_between(line.trigger_count, one_pps) as f64 / self.frequency;
        LineTiming {
            trigger_count,
            time: line.gps_seconds() + since_one_pps,
        }
    }

    /// Nanoseconds elapsed between two unwrapped trigger counter values
    pub fn elapsed_ns(&self, then: u64, now: u64) -> f64 {
        counter_diff(now, then) as f64 / self.frequency * 1e9
    }

    fn recalibrate(&mut self, one_pps: u64) {
        let ticks = one_pps.saturating_sub(self.recalibrated_at);
        let estimate = ticks as f64 / self.passed_one_pps as f64;
        self.recalibrated_at = one_pps;
        self.passed_one_pps = 0;

        if (0.5 * DEFAULT_FREQUENCY..=1.5 * DEFAULT_FREQUENCY).contains(&estimate) {
            debug!(frequency = estimate, "recalculated DAQ frequency");
            self.frequency = estimate;
        } else {
            warn!(
                frequency = estimate,
                "implausible DAQ frequency, falling back to {} Hz", DEFAULT_FREQUENCY
            );
            self.frequency = DEFAULT_FREQUENCY;
        }
    }
}
