use anyhow::{anyhow, Result};
use either::{Left, Right};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use muontools::cfg::{Analysis, DecayConfig, VelocityConfig};
use muontools::extract::PulseExtractor;
use muontools::sink::PulseWriter;
use muonstream::processor::{self, Analyzer};
use muonstream::save::{self, SaveHandle};
use muonstream::{reader, CliArgs, Stats};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

fn main() -> Result<()> {
    // Parse command line arguments
    let args: CliArgs = argh::from_env();

    if args.version {
        println!(
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        );
        return Ok(())
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Load the analysis file
    let mut config = match args.config {
        Some(c) => Analysis::load(c)?,
        None => Analysis {
            velocity: Some(VelocityConfig::default()),
            decay: Some(DecayConfig::default()),
            ..Analysis::default()
        },
    };
    if let Some(p) = args.pulses {
        config.pulse_file = Some(PathBuf::from(p));
        config.write_pulses = true;
    }
    if !config.name.is_empty() {
        info!("starting analysis {}", config.name);
    }

    // Refuse an existing results file before anything runs
    let out_path = args.out.map(PathBuf::from);
    let out = save::output(out_path.as_deref())?;

    let mut extractor = match config.pulse_file.as_ref() {
        Some(p) => PulseExtractor::with_writer(PulseWriter::append(p)?),
        None => PulseExtractor::new(),
    };
    extractor.write_pulses(config.write_pulses)?;
    let analyzer = Analyzer::from_config(&config);

    let input = match args.input {
        None => Left(()),
        Some(i) if i == "-" => Left(()),
        Some(i) => Right(i),
    };

    // Start threads, last consumer first
    let stats = Arc::new(Mutex::new(Stats::default()));
    let (line_tx, line_rx) = flume::bounded(args.queue);
    let (outcome_tx, outcome_rx) = flume::unbounded();
    let save = SaveHandle::new(out, outcome_rx);
    let processor = processor::main(extractor, analyzer, stats.clone(), line_rx, outcome_tx);
    let reader = reader::main(input, line_tx);

    // Each thread exits once its input side closes
    let read = reader.join().map_err(|_| anyhow!("reader thread panicked"));
    let processed = processor.join().map_err(|_| anyhow!("processor thread panicked"));
    let saved = save.join_handle.join().map_err(|_| anyhow!("save thread panicked"));

    let s = *stats.lock();
    info!(
        lines = s.lines,
        skipped = s.skipped,
        garbage = s.garbage,
        malformed = s.malformed,
        records = s.records,
        velocities = s.velocities,
        decays = s.decays,
        "run finished"
    );
    // a failed save also stops the processor, report the cause first
    read??;
    saved??;
    processed??;
    Ok(())
}
