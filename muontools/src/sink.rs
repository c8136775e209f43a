//! Optional pulse file output of a [`PulseExtractor`](crate::extract::PulseExtractor)
//!
//! Writing can be switched on and off during a session. Records emitted
//! while writing is on are appended in the [`ser`](crate::ser) format; the
//! time spent writing is accumulated so the measurement duration can be
//! reported when the session ends.

use crate::{ser, ExtractedPulses};
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::{Duration, Instant};

pub struct PulseWriter {
    out: Box<dyn Write + Send>,
    enabled: bool,
    since: Option<Instant>,
    active: Duration,
    errors: u64,
}

impl PulseWriter {
    /// Writer on an arbitrary sink, initially disabled
    pub fn new(out: impl Write + Send + 'static) -> Self {
        PulseWriter {
            out: Box::new(out),
            enabled: false,
            since: None,
            active: Duration::ZERO,
            errors: 0,
        }
    }

    /// Writer appending to the file at `path`, created if missing
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open pulse file {}", path.display()))?;
        Ok(PulseWriter::new(BufWriter::new(f)))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Switch writing on or off. Switching to the current state is a no-op;
    /// switching off flushes everything written so far.
    pub fn set_enabled(&mut self, enable: bool) -> Result<()> {
        if enable == self.enabled {
            return Ok(());
        }
        self.enabled = enable;
        if enable {
            self.since = Some(Instant::now());
            Ok(())
        } else {
            self.stop_clock();
            self.out.flush()?;
            Ok(())
        }
    }

    /// Append a record if writing is on. On failure, writing is switched
    /// off and the error counted; the caller decides whether to re-enable.
    ///
    /// Each record is formatted on its own and handed to the sink in one
    /// piece, so nothing of a failed record is held back and written again
    /// after re-enabling.
    pub fn write(&mut self, p: &ExtractedPulses) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let mut wtr = ser::writer(Vec::with_capacity(128));
        ser::record(&mut wtr, p)?;
        let line = wtr.into_inner()?;
        if let Err(e) = self.out.write_all(&line) {
            self.errors += 1;
            self.enabled = false;
            self.stop_clock();
            return Err(e.into());
        }
        Ok(())
    }

    /// Total time writing was switched on, including a running stretch
    pub fn active_duration(&self) -> Duration {
        match self.since {
            Some(start) => self.active + start.elapsed(),
            None => self.active,
        }
    }

    /// Number of failed writes
    pub fn errors(&self) -> u64 {
        self.errors
    }

    fn stop_clock(&mut self) {
        if let Some(start) = self.since.take() {
            self.active += start.elapsed();
        }
    }
}

/// Duration in hours, rounded to two decimals
pub fn hours(d: Duration) -> f64 {
    (d.as_secs_f64() / 36.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Pulse;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    fn record(time: f64) -> ExtractedPulses {
        ExtractedPulses::new(time, [vec![Pulse::open(1.25)], vec![], vec![], vec![]])
    }

    #[test]
    fn writes_only_while_enabled() {
        let buf = Shared::default();
        let mut w = PulseWriter::new(buf.clone());
        w.write(&record(1.0)).unwrap();
        w.set_enabled(true).unwrap();
        w.write(&record(2.0)).unwrap();
        w.set_enabled(true).unwrap();
        w.write(&record(3.0)).unwrap();
        w.set_enabled(false).unwrap();
        w.write(&record(4.0)).unwrap();
        w.set_enabled(false).unwrap();

        let out = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!("2.0\t1.25,9960.0\t\t\t\n3.0\t1.25,9960.0\t\t\t\n", out);
    }

    #[test]
    fn failure_disables_writing() {
        let mut w = PulseWriter::new(Broken);
        w.set_enabled(true).unwrap();
        assert!(w.write(&record(1.0)).is_err());
        assert!(!w.is_enabled());
        assert_eq!(1, w.errors());
        assert!(w.write(&record(0.0)).is_ok());
        assert_eq!(1, w.errors());
    }

    /// Sink that takes `limit` bytes, fails once, then takes everything
    struct Flaky {
        data: Shared,
        limit: usize,
        failed: bool,
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let len = self.data.0.lock().len();
            if !self.failed && len >= self.limit {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            let n = if self.failed { buf.len() } else { buf.len().min(self.limit - len) };
            self.data.write(&buf[..n])
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn retry_after_failure_does_not_duplicate() {
        let buf = Shared::default();
        let mut w = PulseWriter::new(Flaky { data: buf.clone(), limit: 30, failed: false });
        w.set_enabled(true).unwrap();
        w.write(&record(1.0)).unwrap();
        assert!(w.write(&record(2.0)).is_err());
        assert!(!w.is_enabled());

        w.set_enabled(true).unwrap();
        w.write(&record(3.0)).unwrap();
        w.write(&record(4.0)).unwrap();
        w.set_enabled(false).unwrap();

        let out = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert_eq!(
            concat!(
                "1.0\t1.25,9960.0\t\t\t\n",
                "2.0\t1.25,99",
                "3.0\t1.25,9960.0\t\t\t\n",
                "4.0\t1.25,9960.0\t\t\t\n",
            ),
            out
        );
        assert_eq!(1, w.errors());
    }

    #[test]
    fn buffered_file_sink_keeps_records_once() {
        let buf = Shared::default();
        let flaky = Flaky { data: buf.clone(), limit: 50, failed: false };
        let mut w = PulseWriter::new(BufWriter::with_capacity(40, flaky));
        w.set_enabled(true).unwrap();
        let mut failed = Vec::new();
        for i in 1..=6 {
            if w.write(&record(i as f64)).is_err() {
                failed.push(i);
                w.set_enabled(true).unwrap();
            }
        }
        w.set_enabled(false).unwrap();

        let out = String::from_utf8(buf.0.lock().clone()).unwrap();
        for i in 1..=6 {
            let line = format!("{}.0\t1.25,9960.0\t\t\t\n", i);
            let expected = if failed.contains(&i) { 0 } else { 1 };
            assert_eq!(expected, out.matches(&line).count(), "record {}", i);
        }
        assert_eq!(failed.len() as u64, w.errors());
    }

    #[test]
    fn duration_accumulates() {
        let mut w = PulseWriter::new(io::sink());
        assert_eq!(Duration::ZERO, w.active_duration());
        w.set_enabled(true).unwrap();
        std::thread::sleep(Duration::from_millis(5));
        w.set_enabled(false).unwrap();
        let first = w.active_duration();
        assert!(first >= Duration::from_millis(5));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(first, w.active_duration());
    }

    #[test]
    fn hours_rounding() {
        assert_eq!(0.0, hours(Duration::ZERO));
        assert_eq!(1.5, hours(Duration::from_secs(5400)));
        assert_eq!(0.01, hours(Duration::from_secs(36)));
        assert_eq!(26.0, hours(Duration::from_secs(26 * 3600 + 10)));
    }
}
