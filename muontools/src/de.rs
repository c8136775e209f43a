//! Deserialization of pulse files and raw DAQ recordings

use crate::{ExtractedPulses, Pulse, CHANNELS};
use anyhow::{anyhow, bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use zstd::stream;

/// Tab delimited, headerless reader as used for pulse files
pub fn reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_reader(rdr)
}

/// Deserialize records from the pulse file format.
pub fn pulses(rdr: &mut csv::Reader<impl Read>) -> Result<Vec<ExtractedPulses>> {
    let mut records = Vec::new();
    for (n, result) in rdr.records().enumerate() {
        let record = result?;
        if record.len() != CHANNELS + 1 {
            bail!(
                "record {}: expected {} fields, found {}",
                n + 1,
                CHANNELS + 1,
                record.len()
            );
        }
        let time = record[0]
            .parse::<f64>()
            .with_context(|| format!("record {}: bad trigger time {:?}", n + 1, &record[0]))?;
        let mut channels: [Vec<Pulse>; CHANNELS] = Default::default();
        for (ch, pulses) in channels.iter_mut().enumerate() {
            *pulses = channel(&record[ch + 1])
                .with_context(|| format!("record {}, channel {}", n + 1, ch))?;
        }
        records.push(ExtractedPulses::new(time, channels));
    }
    Ok(records)
}

/// Parse one channel field of `re,fe` pairs separated by `;`
pub fn channel(field: &str) -> Result<Vec<Pulse>> {
    if field.is_empty() {
        return Ok(Vec::new());
    }
    field
        .split(';')
        .map(|pair| -> Result<Pulse> {
            let (re, fe) = pair
                .split_once(',')
                .ok_or_else(|| anyhow!("bad pulse {:?}", pair))?;
            Ok(Pulse::new(re.parse()?, fe.parse()?))
        })
        .collect()
}

/// Open a raw DAQ recording for line by line reading, transparently
/// decompressing files ending in `.zst`.
pub fn daq_file(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    match path.extension() {
        Some(ext) if ext == "zst" => Ok(Box::new(BufReader::new(stream::read::Decoder::new(f)?))),
        _ => Ok(Box::new(BufReader::new(f))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_TRIGGER_WINDOW;

    #[test]
    fn channel_fields() {
        assert!(channel("").unwrap().is_empty());
        assert_eq!(
            vec![Pulse::new(2.5, 40.0), Pulse::new(5012.5, MAX_TRIGGER_WINDOW)],
            channel("2.5,40.0;5012.5,9960").unwrap()
        );
        assert!(channel("2.5").is_err());
        assert!(channel("2.5,x").is_err());
        assert!(channel("2.5,40.0;").is_err());
    }

    #[test]
    fn rejects_short_records() {
        let mut rdr = reader("1.0\t\t\n".as_bytes());
        assert!(pulses(&mut rdr).is_err());
    }
}
