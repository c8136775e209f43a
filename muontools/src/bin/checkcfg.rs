//! `checkcfg myanalysis.json`
//!
//! Parse `myanalysis.json`. No output and an exit code of 0 indicates success.

use anyhow::{bail, Result};
use std::env;
use muontools::cfg::Analysis;

fn main() -> Result<()> {
    let args = env::args().collect::<Vec<_>>();
    let path = match args.get(1) {
        Some(p) => p,
        None => bail!("usage: checkcfg myanalysis.json"),
    };
    let _analysis = Analysis::load(path)?;

    Ok(())
}
