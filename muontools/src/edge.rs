//! Decoding of the per-channel TMC edge codes
//!
//! Each edge is one byte: bits 0-4 count TMC ticks, bit 5 flags the edge as
//! valid. Bit 7 of the channel 0 rising edge is the trigger flag, marking the
//! line that opens a new trigger window.

use crate::{CHANNELS, TMC_TICK};

const TICKS: u8 = 0x1F;
const VALID: u8 = 1 << 5;
const TRIGGER: u8 = 1 << 7;

/// Raw 8-bit edge code as sent by the card
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct EdgeCode(pub u8);

impl EdgeCode {
    #[inline]
    pub fn ticks(self) -> u8 {
        self.0 & TICKS
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.0 & VALID != 0
    }

    #[inline]
    pub fn is_trigger(self) -> bool {
        self.0 & TRIGGER != 0
    }

    /// Edge time in ns, shifted by `offset_ns`, if the edge is valid
    #[inline]
    pub fn time(self, offset_ns: f64) -> Option<f64> {
        if self.is_valid() {
            Some(offset_ns + self.ticks() as f64 * TMC_TICK)
        } else {
            None
        }
    }
}

/// Edge times decoded from one line for one channel
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct LineEdges {
    pub rising: Option<f64>,
    pub falling: Option<f64>,
}

/// Convert the raw edge codes of one line into edge times in ns.
///
/// `counter_offset_ns` is the time elapsed since the line that opened the
/// trigger window (zero for that line itself). Edges without the valid bit
/// are dropped.
pub fn decode_edges(
    codes: &[(EdgeCode, EdgeCode); CHANNELS],
    counter_offset_ns: f64,
) -> [LineEdges; CHANNELS] {
    let mut edges = [LineEdges::default(); CHANNELS];
    for (e, &(re, fe)) in edges.iter_mut().zip(codes.iter()) {
        e.rising = re.time(counter_offset_ns);
        e.falling = fe.time(counter_offset_ns);
    }
    return edges;
}
