//! `pacer man` – render the man page.

use anyhow::Result;
use clap::CommandFactory;

use crate::cli::Cli;

pub fn run_man() -> Result<()> {
    let man = clap_mangen::Man::new(Cli::command());
    man.render(&mut std::io::stdout())?;
    Ok(())
}
