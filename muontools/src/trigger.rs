//! Software triggers evaluated on complete trigger windows
//!
//! Both triggers are stateless apart from their configuration. A rejected
//! window yields `None`; the reason is only visible in the debug log.

use crate::cfg::{DecayConfig, VelocityConfig};
use crate::{Channel, ExtractedPulses};
use tracing::{debug, info};

/// Accepted range of `width(upper) - width(lower)` in ns
pub const WIDTH_DIFFERENCE: (f64, f64) = (-15.0, 45.0);

/// Trigger window set at the DAQ for decay measurements, in ns
pub const DECAY_TRIGGER_WINDOW: f64 = 10000.0;

/// Margin before the end of the trigger window where decays are not trusted
pub const DECAY_WINDOW_ARTIFACT: f64 = 1000.0;

/// Flight time of a muon between two detector layers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityTrigger {
    upper: Channel,
    lower: Channel,
}

impl VelocityTrigger {
    pub fn new(upper: Channel, lower: Channel) -> Self {
        info!(%upper, %lower, "velocity trigger initialized");
        VelocityTrigger { upper, lower }
    }

    pub fn from_config(cfg: &VelocityConfig) -> Self {
        VelocityTrigger::new(cfg.upper, cfg.lower)
    }

    /// Flight time `rising(lower) - rising(upper)` of the first pulse in each
    /// channel, in ns. Negative when the lower channel fired first.
    pub fn trigger(&self, pulses: &ExtractedPulses) -> Option<f64> {
        let upper = pulses.channel(self.upper).first()?;
        let lower = pulses.channel(self.lower).first()?;

        let width_diff = upper.width() - lower.width();
        if width_diff < WIDTH_DIFFERENCE.0 || width_diff > WIDTH_DIFFERENCE.1 {
            debug!(width_diff, "rejecting velocity event with mismatched pulse widths");
            return None;
        }
        // rising edges only, falling edges might be virtual
        return Some(lower.rising - upper.rising);
    }
}

/// Muon decay inside the detector: a second, delayed pulse after the muon
/// stopped. The muon's own pulse is looked for in the single channel, the
/// decay electron in the double channel; both may be the same channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecayTriggerThorough {
    single: Channel,
    double: Channel,
    veto: Option<Channel>,
    min_decay_time: f64,
    single_width: (f64, f64),
    double_width: (f64, f64),
}

impl DecayTriggerThorough {
    pub fn new(cfg: &DecayConfig) -> Self {
        info!(
            "initializing decay trigger, setting trigger window to {}",
            DECAY_TRIGGER_WINDOW
        );
        DecayTriggerThorough {
            single: cfg.single,
            double: cfg.double,
            veto: cfg.veto,
            min_decay_time: cfg.min_decay_time,
            single_width: (cfg.min_single_pulse_width, cfg.max_single_pulse_width),
            double_width: (cfg.min_double_pulse_width, cfg.max_double_pulse_width),
        }
    }

    /// Decay time in ns, if the window holds a decay candidate
    pub fn trigger(&self, pulses: &ExtractedPulses) -> Option<i64> {
        let single = pulses.channel(self.single);
        let double = pulses.channel(self.double);
        let vetoed = self.veto.map_or(0, |ch| pulses.channel(ch).len());

        if single.len() + double.len() < 2 || vetoed > 0 {
            debug!(
                single = single.len(),
                double = double.len(),
                veto = vetoed,
                "rejecting decay candidate"
            );
            return None;
        }

        let enough = if self.single == self.double {
            double.len() >= 2
        } else {
            single.len() == 1 && double.len() >= 2
        };
        if !enough {
            debug!(single = single.len(), double = double.len(), "rejected event");
            return None;
        }

        // both channels hold pulses here
        let first_double = &double[0];
        let last_double = &double[double.len() - 1];
        let single_width = single[0].width();
        let double_width = last_double.width();
        if !within(single_width, self.single_width) || !within(double_width, self.double_width) {
            debug!(single_width, double_width, "rejected event on pulse widths");
            return None;
        }

        // rising edges only, falling edges might be virtual
        let decay_time = last_double.rising - first_double.rising;
        if decay_time > self.min_decay_time
            && decay_time < DECAY_TRIGGER_WINDOW - DECAY_WINDOW_ARTIFACT
        {
            debug!("decay with decay time {} found", decay_time);
            return Some(decay_time as i64);
        }

        debug!(decay_time, "rejecting decay outside of the accepted decay times");
        None
    }
}

fn within(x: f64, (min, max): (f64, f64)) -> bool {
    min < x && x < max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pulse;

    fn pulses(channels: [Vec<Pulse>; 4]) -> ExtractedPulses {
        ExtractedPulses::new(0.0, channels)
    }

    #[test]
    fn width_bounds_are_exclusive() {
        assert!(within(1.0, (0.0, 2.0)));
        assert!(!within(0.0, (0.0, 2.0)));
        assert!(!within(2.0, (0.0, 2.0)));
    }

    #[test]
    fn velocity_needs_both_channels() {
        let t = VelocityTrigger::new(Channel::Ch0, Channel::Ch1);
        let p = pulses([vec![Pulse::new(0.0, 5.0)], vec![], vec![], vec![]]);
        assert_eq!(None, t.trigger(&p));
    }

    #[test]
    fn velocity_width_difference_limits_are_inclusive() {
        let t = VelocityTrigger::new(Channel::Ch0, Channel::Ch1);
        let p = pulses([vec![Pulse::new(0.0, 45.0)], vec![Pulse::new(10.0, 10.0)], vec![], vec![]]);
        assert_eq!(Some(10.0), t.trigger(&p));
        let p = pulses([vec![Pulse::new(0.0, 5.0)], vec![Pulse::new(10.0, 30.0)], vec![], vec![]]);
        assert_eq!(Some(10.0), t.trigger(&p));
        let p = pulses([vec![Pulse::new(0.0, 5.0)], vec![Pulse::new(10.0, 30.5)], vec![], vec![]]);
        assert_eq!(None, t.trigger(&p));
    }

    #[test]
    fn decay_same_channel() {
        let cfg = DecayConfig {
            single: Channel::Ch1,
            double: Channel::Ch1,
            veto: None,
            ..DecayConfig::default()
        };
        let t = DecayTriggerThorough::new(&cfg);
        let p = pulses([
            vec![],
            vec![Pulse::new(10.0, 60.0), Pulse::new(2500.0, 2530.0)],
            vec![],
            vec![],
        ]);
        assert_eq!(Some(2490), t.trigger(&p));

        let p = pulses([vec![], vec![Pulse::new(10.0, 60.0)], vec![], vec![]]);
        assert_eq!(None, t.trigger(&p));
    }
}
