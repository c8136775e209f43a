//! Screening of raw lines coming from the DAQ card

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Printable subset the DAQ protocol is written in, followed by line endings.
static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9+\-.,:()=$/#?!%_@*|~' ]*[\r\n]*$").expect("static pattern")
});

/// Shortest message that can carry a full set of pulse fields
pub const MIN_PULSE_MESSAGE_LEN: usize = 50;

/// Returns the line if it consists only of protocol characters, otherwise
/// logs it as garbage and returns `None`.
pub fn validate(line: &str) -> Option<&str> {
    if LINE_PATTERN.is_match(line) {
        Some(line)
    } else {
        warn!("got garbage from the DAQ: {:?}", line.trim_end_matches(&['\r', '\n'][..]));
        None
    }
}

/// Whether a validated message is a pulse line, as opposed to the status
/// (`ST`), scaler (`DS`), threshold and other command echoes the card
/// interleaves with its pulse data.
pub fn is_pulse_message(line: &str) -> bool {
    let line = line.trim_end_matches(&['\r', '\n'][..]);
    line.len() >= MIN_PULSE_MESSAGE_LEN && !line.starts_with("ST")
}
