//! Typed view of one DAQ pulse message.
//!
//! A pulse message is a whitespace separated line of 16 positional fields:
//!
//! ```text
//! 80EE0049 80 01 00 01 00 00 00 00 38D9A05D 163455.037 130313 A 08 0 +0045
//! |        |  |  |  |  |  |  |  |  |        |          |      | |  | |
//! |        re0   re1   re2   re3   1-PPS    GPS time   date   | |  | correction (ms)
//! trigger     fe0   fe1   fe2   fe3 counter HHMMSS.mmm DDMMYY | |  status (hex)
//! counter                                                     | satellites
//!                                                             GPS valid (A/V)
//! ```
//!
//! Parsing is all-or-nothing: a line either yields a complete [`DaqLine`] or
//! a [`LineError`], so callers never act on half-decoded fields.

use crate::edge::EdgeCode;
use crate::CHANNELS;
use std::str::FromStr;
use thiserror::Error;

/// Number of whitespace separated fields in a pulse message
pub const FIELDS: usize = 16;

const TRIGGER_COUNT: usize = 0;
const FIRST_EDGE: usize = 1;
const ONE_PPS: usize = 9;
const GPS_TIME: usize = 10;
const GPS_DATE: usize = 11;
const GPS_VALID: usize = 12;
const SATELLITES: usize = 13;
const STATUS: usize = 14;
const CORRECTION: usize = 15;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineError {
    #[error("expected {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("field {index} is not a hexadecimal {kind}: {value:?}")]
    BadHex {
        index: usize,
        kind: &'static str,
        value: String,
    },
    #[error("bad GPS time {0:?}, expected HHMMSS.mmm")]
    BadGpsTime(String),
    #[error("bad time correction {0:?}")]
    BadCorrection(String),
}

/// GPS wall clock time of a line, as reported by the card
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct GpsTime {
    pub seconds_of_day: u32,
    pub millis: u32,
}

impl GpsTime {
    /// Seconds since the start of the day
    pub fn as_seconds(&self) -> f64 {
        self.seconds_of_day as f64 + self.millis as f64 / 1000.0
    }
}

impl FromStr for GpsTime {
    type Err = LineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || LineError::BadGpsTime(s.to_string());
        let (hms, frac) = s.split_once('.').ok_or_else(bad)?;
        if hms.len() < 6 || !hms.is_ascii() || frac.is_empty() {
            return Err(bad());
        }
        let field = |r: std::ops::Range<usize>| hms[r].parse::<u32>().map_err(|_| bad());
        let (h, m, sec) = (field(0..2)?, field(2..4)?, field(4..6)?);
        let millis = frac.parse::<u32>().map_err(|_| bad())?;
        Ok(GpsTime {
            seconds_of_day: h * 3600 + m * 60 + sec,
            millis,
        })
    }
}

/// Status byte of a pulse message
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct DaqStatus(pub u8);

impl DaqStatus {
    pub fn one_pps_pending(self) -> bool {
        self.0 & 1 != 0
    }

    pub fn trigger_pending(self) -> bool {
        self.0 & 1 << 1 != 0
    }

    pub fn gps_corrupted(self) -> bool {
        self.0 & 1 << 2 != 0
    }

    /// Current or last 1-PPS rate not within range
    pub fn one_pps_rate_off(self) -> bool {
        self.0 & 1 << 3 != 0
    }
}

/// A fully parsed pulse message
#[derive(Clone, Debug, PartialEq)]
pub struct DaqLine {
    pub trigger_count: u32,
    /// (rising, falling) edge code per channel
    pub edges: [(EdgeCode, EdgeCode); CHANNELS],
    pub one_pps: u32,
    pub gps_time: GpsTime,
    pub gps_date: String,
    pub gps_valid: bool,
    pub satellites: Option<u8>,
    pub status: Option<DaqStatus>,
    /// Time correction in ms
    pub correction: i64,
}

impl DaqLine {
    pub fn parse(line: &str) -> Result<DaqLine, LineError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < FIELDS {
            return Err(LineError::TooFewFields {
                expected: FIELDS,
                found: fields.len(),
            });
        }

        let mut edges = [(EdgeCode(0), EdgeCode(0)); CHANNELS];
        for (ch, e) in edges.iter_mut().enumerate() {
            let i = FIRST_EDGE + 2 * ch;
            *e = (edge_code(&fields, i)?, edge_code(&fields, i + 1)?);
        }

        let correction = fields[CORRECTION]
            .parse::<i64>()
            .map_err(|_| LineError::BadCorrection(fields[CORRECTION].to_string()))?;

        Ok(DaqLine {
            trigger_count: counter(&fields, TRIGGER_COUNT)?,
            edges,
            one_pps: counter(&fields, ONE_PPS)?,
            gps_time: fields[GPS_TIME].parse()?,
            gps_date: fields[GPS_DATE].to_string(),
            gps_valid: fields[GPS_VALID] == "A",
            satellites: fields[SATELLITES].parse().ok(),
            status: u8::from_str_radix(fields[STATUS], 16).ok().map(DaqStatus),
            correction,
        })
    }

    /// Whether this line opens a new trigger window
    pub fn is_trigger(&self) -> bool {
        self.edges[0].0.is_trigger()
    }

    /// GPS time including the card's time correction, in seconds since day start
    pub fn gps_seconds(&self) -> f64 {
        self.gps_time.as_seconds() + self.correction as f64 / 1000.0
    }
}

impl FromStr for DaqLine {
    type Err = LineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DaqLine::parse(s)
    }
}

fn counter(fields: &[&str], index: usize) -> Result<u32, LineError> {
    u32::from_str_radix(fields[index], 16).map_err(|_| LineError::BadHex {
        index,
        kind: "counter",
        value: fields[index].to_string(),
    })
}

fn edge_code(fields: &[&str], index: usize) -> Result<EdgeCode, LineError> {
    u8::from_str_radix(fields[index], 16)
        .map(EdgeCode)
        .map_err(|_| LineError::BadHex {
            index,
            kind: "edge code",
            value: fields[index].to_string(),
        })
}
