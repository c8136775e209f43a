//! Serialization of extracted pulses to the pulse file format
//!
//! One trigger window per line, tab separated: the trigger time in seconds
//! since day start, then one field per channel. A channel field lists the
//! channel's pulses as `rising,falling` pairs in ns, separated by `;`, and
//! is empty when the channel saw no pulse:
//!
//! ```text
//! 59695.58208072\t2.5,40.0\t\t10.0,9960.0;5012.5,5030.0\t
//! ```
//!
//! Floats are written in their shortest round-trip form, so reading a file
//! back with [`crate::de::pulses`] reproduces every value exactly.

use crate::{ExtractedPulses, Pulse};
use anyhow::Result;
use std::io::Write;

/// Tab delimited, headerless writer as used for pulse files
pub fn writer<W: Write>(wtr: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_writer(wtr)
}

/// Serialize records to the pulse file format.
pub fn pulses(wtr: &mut csv::Writer<impl Write>, records: &[ExtractedPulses]) -> Result<()> {
    for p in records.iter() {
        record(wtr, p)?;
    }
    Ok(())
}

/// Serialize a single record.
pub fn record(wtr: &mut csv::Writer<impl Write>, p: &ExtractedPulses) -> Result<()> {
    let mut buf = ryu::Buffer::new();
    wtr.write_field(buf.format(p.time()))?;
    for ch in p.channels().iter() {
        wtr.write_field(channel(ch))?;
    }
    wtr.write_record(None::<&[u8]>)?;
    Ok(())
}

/// Format one channel's pulses as `re,fe;re,fe;...`
pub fn channel(pulses: &[Pulse]) -> String {
    let mut buf = ryu::Buffer::new();
    let mut s = String::new();
    for (i, p) in pulses.iter().enumerate() {
        if i > 0 {
            s.push(';');
        }
        s.push_str(buf.format(p.rising));
        s.push(',');
        s.push_str(buf.format(p.falling));
    }
    return s;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_field() {
        assert_eq!("", channel(&[]));
        assert_eq!("2.5,40.0", channel(&[Pulse::new(2.5, 40.0)]));
        assert_eq!(
            "10.0,9960.0;5012.5,5030.0",
            channel(&[Pulse::open(10.0), Pulse::new(5012.5, 5030.0)])
        );
    }

    #[test]
    fn record_line() {
        let p = ExtractedPulses::new(
            59695.5,
            [vec![Pulse::new(2.5, 40.0)], vec![], vec![Pulse::open(10.0)], vec![]],
        );
        let mut wtr = writer(Vec::new());
        record(&mut wtr, &p).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!("59695.5\t2.5,40.0\t\t10.0,9960.0\t\n", out);
    }
}
