#[allow(dead_code)]

use std::env;
use std::fs;
use std::path;

pub fn load_session() -> Vec<String> {
    let project_root = env::var("CARGO_MANIFEST_DIR").unwrap();
    let data_file = path::PathBuf::from(project_root)
        .join("tests/resources/session.txt");
    let s = fs::read_to_string(data_file).unwrap();
    return s.split_inclusive('\n').map(String::from).collect();
}

/// A long session of continuous trigger windows, each with a continuation
/// line, driven by a 25 MHz clock and a 1-PPS latch every second.
pub fn synthetic_session(windows: u32) -> Vec<String> {
    let mut lines = Vec::with_capacity(2 * windows as usize);
    for i in 0..windows {
        let trigger = i.wrapping_mul(5000).wrapping_add(1000);
        let second = (i as u64 * 5000 / 25_000_000) as u32;
        let one_pps = second.wrapping_mul(25_000_000);
        let gps = format!("{:02}{:02}{:02}.000", 12 + second / 3600, second / 60 % 60, second % 60);
        lines.push(format!(
            "{:08X} A4 2C 28 32 00 00 00 00 {:08X} {} 130313 A 08 0 +0000\r\n",
            trigger, one_pps, gps
        ));
        lines.push(format!(
            "{:08X} 00 00 00 00 24 30 00 00 {:08X} {} 130313 A 08 0 +0000\r\n",
            trigger.wrapping_add(25), one_pps, gps
        ));
    }
    return lines;
}
