pub mod accum;
pub mod analysis;
pub mod cfg;
pub mod daq;
pub mod de;
pub mod edge;
pub mod extract;
pub mod line;
pub mod ser;
pub mod sink;
pub mod timebase;
pub mod trigger;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of detector channels on the DAQ card
pub const CHANNELS: usize = 4;

/// Tick size of the TMC in ns (documentation says 0.75, measurement says 1.25)
pub const TMC_TICK: f64 = 1.25;

/// Falling edge substituted for pulses whose real falling edge is missing, in ns
pub const MAX_TRIGGER_WINDOW: f64 = 9960.0;

/// Nominal frequency of the DAQ card oscillator in Hz
pub const DEFAULT_FREQUENCY: f64 = 25.0e6;

/// One of the four detector inputs of the DAQ card.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub enum Channel {
    Ch0,
    Ch1,
    Ch2,
    Ch3,
}

impl Channel {
    pub const ALL: [Channel; CHANNELS] = [Channel::Ch0, Channel::Ch1, Channel::Ch2, Channel::Ch3];

    /// Position of the channel in a `[_; CHANNELS]` array
    #[inline]
    pub fn index(self) -> usize {
        return self as usize;
    }

    pub fn from_index(i: usize) -> Option<Channel> {
        Channel::ALL.get(i).copied()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.index())
    }
}

/// Accepts `0`..`3` as well as `ch0`..`ch3` (case insensitive).
impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower.strip_prefix("ch").unwrap_or(&lower);
        digits
            .parse::<usize>()
            .ok()
            .and_then(Channel::from_index)
            .ok_or_else(|| format!("invalid channel '{}', expected 0-3 or ch0-ch3", s))
    }
}

/// A detector pulse, with edge times in ns relative to the start of its
/// trigger window.
///
/// The rising edge is always measured. The falling edge is either measured
/// or the virtual edge [`MAX_TRIGGER_WINDOW`].
#[derive(Clone, Copy, PartialEq, PartialOrd, Debug, Serialize, Deserialize)]
pub struct Pulse {
    pub rising: f64,
    pub falling: f64,
}

impl Pulse {
    pub fn new(rising: f64, falling: f64) -> Self {
        Pulse { rising, falling }
    }

    /// Pulse with a virtual falling edge
    pub fn open(rising: f64) -> Self {
        Pulse { rising, falling: MAX_TRIGGER_WINDOW }
    }

    pub fn width(&self) -> f64 {
        return self.falling - self.rising;
    }

    pub fn is_virtual(&self) -> bool {
        self.falling == MAX_TRIGGER_WINDOW
    }
}

/// All pulses of one closed trigger window.
///
/// `time` is the absolute trigger time in seconds since the start of the
/// (GPS) day. Each channel's pulses are sorted by rising edge.
#[derive(Clone, PartialEq, Debug)]
pub struct ExtractedPulses {
    time: f64,
    channels: [Vec<Pulse>; CHANNELS],
}

impl ExtractedPulses {
    pub fn new(time: f64, channels: [Vec<Pulse>; CHANNELS]) -> Self {
        ExtractedPulses { time, channels }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn channel(&self, ch: Channel) -> &[Pulse] {
        &self.channels[ch.index()]
    }

    pub fn channels(&self) -> &[Vec<Pulse>; CHANNELS] {
        &self.channels
    }

    /// Total number of pulses over all channels
    pub fn len(&self) -> usize {
        self.channels.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.iter().all(Vec::is_empty)
    }

    /// Widths of every pulse in every channel, channel by channel.
    pub fn widths(&self) -> Vec<f64> {
        self.channels
            .iter()
            .flat_map(|ch| ch.iter().map(Pulse::width))
            .collect()
    }
}
