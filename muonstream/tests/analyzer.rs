use muontools::cfg::{Analysis, DecayConfig, VelocityConfig};
use muontools::extract::PulseExtractor;
use muontools::{Channel, ExtractedPulses, Pulse};
use muonstream::processor::{self, Analyzer, Outcome};
use muonstream::{reader, Event, Stats};
use parking_lot::Mutex;
use std::env;
use std::fs;
use std::path;
use std::sync::Arc;

fn load_session() -> String {
    let project_root = env::var("CARGO_MANIFEST_DIR").unwrap();
    let data_file = path::PathBuf::from(project_root)
        .join("../muontools/tests/resources/session.txt");
    fs::read_to_string(data_file).unwrap()
}

fn both() -> Analysis {
    Analysis {
        velocity: Some(VelocityConfig::default()),
        decay: Some(DecayConfig::default()),
        ..Analysis::default()
    }
}

#[test]
fn analyzer_runs_configured_triggers() {
    let p = ExtractedPulses::new(
        12.5,
        [
            vec![Pulse::new(0.0, 5.0)],
            vec![Pulse::new(12.0, 18.0)],
            vec![Pulse::new(20.0, 60.0), Pulse::new(3020.0, 3060.0)],
            vec![],
        ],
    );
    let outcomes = Analyzer::from_config(&both()).analyze(&p);
    assert_eq!(
        vec![
            Outcome::Velocity { time: 12.5, flight_time: 12.0 },
            Outcome::Decay { time: 12.5, decay_time: 3000 },
        ],
        outcomes
    );

    let only_decay = Analysis { decay: Some(DecayConfig::default()), ..Analysis::default() };
    assert_eq!(
        vec![Outcome::Decay { time: 12.5, decay_time: 3000 }],
        Analyzer::from_config(&only_decay).analyze(&p)
    );
    assert!(Analyzer::default().analyze(&p).is_empty());
}

#[test]
fn analyzer_swapped_layers() {
    let cfg = Analysis {
        velocity: Some(VelocityConfig { upper: Channel::Ch1, lower: Channel::Ch0 }),
        ..Analysis::default()
    };
    let p = ExtractedPulses::new(
        1.0,
        [vec![Pulse::new(0.0, 5.0)], vec![Pulse::new(12.0, 18.0)], vec![], vec![]],
    );
    assert_eq!(
        vec![Outcome::Velocity { time: 1.0, flight_time: -12.0 }],
        Analyzer::from_config(&cfg).analyze(&p)
    );
}

#[test]
fn pipeline_session() {
    let session = load_session();
    let stats = Arc::new(Mutex::new(Stats::default()));
    let (line_tx, line_rx) = flume::bounded(2);
    let (outcome_tx, outcome_rx) = flume::unbounded();

    let processor = processor::main(
        PulseExtractor::new(),
        Analyzer::from_config(&both()),
        stats.clone(),
        line_rx,
        outcome_tx,
    );
    reader::forward(session.as_bytes(), &line_tx).unwrap();
    processor.join().unwrap().unwrap();

    let outcomes: Vec<Outcome> = outcome_rx.drain().collect();
    assert_eq!(3, outcomes.len());
    assert!(matches!(outcomes[0], Outcome::Velocity { flight_time, .. } if flight_time == 5.0));
    assert!(matches!(outcomes[1], Outcome::Decay { decay_time: 5005, .. }));
    assert!(matches!(outcomes[2], Outcome::Velocity { flight_time, .. } if flight_time == 0.0));

    let s = *stats.lock();
    assert_eq!(11, s.lines);
    assert_eq!(2, s.skipped);
    assert_eq!(1, s.garbage);
    assert_eq!(1, s.malformed);
    assert_eq!(4, s.records);
    assert_eq!(2, s.velocities);
    assert_eq!(1, s.decays);
}

#[test]
fn processor_stops_on_eof() {
    let stats = Arc::new(Mutex::new(Stats::default()));
    let (line_tx, line_rx) = flume::unbounded();
    let (outcome_tx, outcome_rx) = flume::unbounded();
    let processor = processor::main(
        PulseExtractor::new(),
        Analyzer::default(),
        stats.clone(),
        line_rx,
        outcome_tx,
    );
    line_tx.send(Event::Eof).unwrap();
    processor.join().unwrap().unwrap();
    // the outcome channel is closed once the processor is gone
    assert!(outcome_rx.recv().is_err());
    // the sender is still alive, but nothing reads anymore
    assert!(line_tx.send(Event::Eof).is_err());
}

#[test]
fn processor_stops_when_results_are_not_saved() {
    let session = load_session();
    let stats = Arc::new(Mutex::new(Stats::default()));
    let (line_tx, line_rx) = flume::unbounded();
    let (outcome_tx, outcome_rx) = flume::unbounded();
    drop(outcome_rx);
    let processor = processor::main(
        PulseExtractor::new(),
        Analyzer::from_config(&both()),
        stats.clone(),
        line_rx,
        outcome_tx,
    );
    reader::forward(session.as_bytes(), &line_tx).unwrap();
    let err = processor.join().unwrap().unwrap_err();
    assert!(err.to_string().contains("can no longer be saved"));

    // stopped at the first window with a trigger result
    let s = *stats.lock();
    assert!(s.records < 4);
    assert_eq!(1, s.velocities);
    assert!(line_tx.send(Event::Eof).is_err());
}
