//! Configuration of an analysis run
//!
//! An [`Analysis`] is read from a JSON file. Every field is optional: leave
//! out a trigger to switch it off, or give it as `{}` to run it with the
//! usual detector setup.
//!
//! ```json
//! {
//!     "name": "rooftop, two panels",
//!     "velocity": { "upper": "Ch0", "lower": "Ch1" },
//!     "decay": { "veto": null, "min_decay_time": 400.0 },
//!     "pulse_file": "pulses.tsv",
//!     "write_pulses": true
//! }
//! ```

use crate::trigger::{DecayTriggerThorough, VelocityTrigger};
use crate::Channel;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(default)]
pub struct Analysis {
    pub name:           String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity:       Option<VelocityConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decay:          Option<DecayConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulse_file:     Option<PathBuf>,
    pub write_pulses:   bool,
}

/// Channels of the upper and lower detector layer
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct VelocityConfig {
    pub upper:  Channel,
    pub lower:  Channel,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        VelocityConfig {
            upper:  Channel::Ch0,
            lower:  Channel::Ch1,
        }
    }
}

/// Decay trigger channels and acceptance limits, all times in ns
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(default)]
pub struct DecayConfig {
    pub single:                 Channel,
    pub double:                 Channel,
    pub veto:                   Option<Channel>,
    pub min_decay_time:         f64,
    pub min_single_pulse_width: f64,
    pub max_single_pulse_width: f64,
    pub min_double_pulse_width: f64,
    pub max_double_pulse_width: f64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        DecayConfig {
            single:                 Channel::Ch1,
            double:                 Channel::Ch2,
            veto:                   Some(Channel::Ch3),
            min_decay_time:         0.0,
            min_single_pulse_width: 0.0,
            max_single_pulse_width: 12000.0,
            min_double_pulse_width: 0.0,
            max_double_pulse_width: 12000.0,
        }
    }
}

impl Analysis {
    /// Read an analysis configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let cfg = serde_json::from_str(&s)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn velocity_trigger(&self) -> Option<VelocityTrigger> {
        self.velocity.as_ref().map(VelocityTrigger::from_config)
    }

    pub fn decay_trigger(&self) -> Option<DecayTriggerThorough> {
        self.decay.as_ref().map(DecayTriggerThorough::new)
    }
}
