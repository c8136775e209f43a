#![allow(dead_code)]

use std::env;
use std::fs;
use std::path;

use muontools::extract::PulseExtractor;
use muontools::ExtractedPulses;

pub fn resource(name: &str) -> path::PathBuf {
    let project_root = env::var("CARGO_MANIFEST_DIR").unwrap();
    path::PathBuf::from(project_root).join("tests/resources").join(name)
}

/// Lines of a short recorded-style DAQ session, line endings included
pub fn load_session() -> Vec<String> {
    let s = fs::read_to_string(resource("session.txt")).unwrap();
    return s.split_inclusive('\n').map(String::from).collect();
}

/// Run every line through a fresh extractor
pub fn extract_all(x: &mut PulseExtractor, lines: &[String]) -> Vec<ExtractedPulses> {
    lines.iter().filter_map(|l| x.extract(l)).collect()
}
