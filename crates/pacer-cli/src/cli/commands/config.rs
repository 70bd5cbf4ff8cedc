//! `pacer config` – show where config lives and what is in effect.

use anyhow::Result;
use pacer_core::config::{self, PacerConfig};
use std::path::Path;

pub fn run_config(path: &Path, cfg: &PacerConfig) -> Result<()> {
    println!("# {}", path.display());
    print!("{}", config::to_toml_string(cfg)?);
    Ok(())
}
