mod burrow;
mod leneda;
mod period;
mod report;

use clap::{Parser, Subcommand};

use crate::{
    cli::{burrow::BurrowArgs, report::ReportArgs},
    prelude::*,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn run(self) -> Result {
        match self.command {
            Command::Report(args) => args.run(),
            Command::Burrow(args) => args.run(),
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the readings, write the monthly summaries and, optionally, invoices.
    #[clap(name = "report")]
    Report(Box<ReportArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}
