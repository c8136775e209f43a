//! Offline analysis of extracted trigger windows

use crate::{Channel, ExtractedPulses};
use std::fmt;

/// Direction of flight through two stacked detector layers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Direction of the muon in a window, from the first rising edge in each of
/// the two layers. A positive flight time from `upper` to `lower` means the
/// muon came from above. `None` unless both layers saw a pulse.
pub fn direction(pulses: &ExtractedPulses, upper: Channel, lower: Channel) -> Option<Direction> {
    let up = pulses.channel(upper).first()?;
    let low = pulses.channel(lower).first()?;
    if low.rising - up.rising > 0.0 {
        Some(Direction::Down)
    } else {
        Some(Direction::Up)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectionCounts {
    pub up: u64,
    pub down: u64,
}

impl DirectionCounts {
    pub fn add(&mut self, d: Direction) {
        match d {
            Direction::Up => self.up += 1,
            Direction::Down => self.down += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.up + self.down
    }

    /// Share of upward going muons, `None` before the first count
    pub fn up_fraction(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            n => Some(self.up as f64 / n as f64),
        }
    }
}

impl Extend<Direction> for DirectionCounts {
    fn extend<I: IntoIterator<Item = Direction>>(&mut self, iter: I) {
        for d in iter {
            self.add(d);
        }
    }
}
