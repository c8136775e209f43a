//! Buffering of edges across the lines of one trigger window

use crate::edge::LineEdges;
use crate::{Pulse, CHANNELS, MAX_TRIGGER_WINDOW};

#[derive(Clone, Debug, Default)]
struct ChannelEdges {
    rising: Vec<f64>,
    falling: Vec<f64>,
}

impl ChannelEdges {
    fn clear(&mut self) {
        self.rising.clear();
        self.falling.clear();
    }

    fn is_empty(&self) -> bool {
        self.rising.is_empty() && self.falling.is_empty()
    }
}

/// Double buffered per channel edge lists.
///
/// Edges of the open window go into the working buffers. Closing the window
/// swaps them with the buffers of the previous window, which are then turned
/// into pulses while the (cleared) other half collects the next window.
#[derive(Clone, Debug, Default)]
pub struct PulseAccumulator {
    current: [ChannelEdges; CHANNELS],
    last: [ChannelEdges; CHANNELS],
}

impl PulseAccumulator {
    pub fn new() -> Self {
        PulseAccumulator::default()
    }

    /// Add the edges decoded from one line to the open window
    pub fn push(&mut self, edges: &[LineEdges; CHANNELS]) {
        for (buf, e) in self.current.iter_mut().zip(edges.iter()) {
            if let Some(t) = e.rising {
                buf.rising.push(t);
            }
            if let Some(t) = e.falling {
                buf.falling.push(t);
            }
        }
    }

    /// Close the open window and return its pulses, per channel. The
    /// working buffers are empty afterwards.
    pub fn close(&mut self) -> [Vec<Pulse>; CHANNELS] {
        std::mem::swap(&mut self.current, &mut self.last);
        for buf in self.current.iter_mut() {
            buf.clear();
        }
        let mut pulses: [Vec<Pulse>; CHANNELS] = Default::default();
        for (p, buf) in pulses.iter_mut().zip(self.last.iter()) {
            *p = pair_edges(&buf.rising, &buf.falling);
        }
        return pulses;
    }

    /// Drop the edges of the open window
    pub fn discard(&mut self) {
        for buf in self.current.iter_mut() {
            buf.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.current.iter().all(ChannelEdges::is_empty)
    }
}

/// Pair rising edge `i` with falling edge `i`, substituting the virtual
/// falling edge when there is none or when it lies before the rising edge.
/// The result is sorted by rising edge; unpaired falling edges are dropped.
pub fn pair_edges(rising: &[f64], falling: &[f64]) -> Vec<Pulse> {
    let mut pulses: Vec<Pulse> = rising
        .iter()
        .enumerate()
        .map(|(i, &re)| match falling.get(i) {
            Some(&fe) if fe >= re => Pulse::new(re, fe),
            _ => Pulse::new(re, MAX_TRIGGER_WINDOW),
        })
        .collect();
    pulses.sort_by(|a, b| a.rising.total_cmp(&b.rising));
    return pulses;
}
