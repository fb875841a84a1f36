use clap::{Parser, Subcommand};

use crate::{
    billing::reading::{Reading, ReadingSource},
    cli::{leneda::LenedaApiArgs, period::PeriodArgs},
    prelude::*,
    quantity::energy::KilowattHours,
    tables::build_readings_table,
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[command(subcommand)]
    command: BurrowCommand,
}

impl BurrowArgs {
    pub fn run(self) -> Result {
        match self.command {
            BurrowCommand::Readings(args) => args.run(),
        }
    }
}

#[derive(Subcommand)]
pub enum BurrowCommand {
    /// Print the raw readings of a metering point.
    Readings(BurrowReadingsArgs),
}

#[derive(Parser)]
pub struct BurrowReadingsArgs {
    #[clap(flatten)]
    leneda: LenedaApiArgs,

    #[clap(flatten)]
    period: PeriodArgs,

    /// Metering point.
    #[clap(long)]
    pod: String,

    #[clap(long = "obis-code", default_value = "1-1:2.29.0")]
    code: String,
}

impl BurrowReadingsArgs {
    #[instrument(skip_all, fields(pod = %self.pod, code = %self.code))]
    fn run(self) -> Result {
        let interval = self.period.interval()?;
        let series = self.leneda.new_client()?.fetch(&self.pod, &self.code, interval)?;
        let total: KilowattHours = series.readings.iter().map(Reading::energy).sum();
        info!(
            pod = %series.pod,
            code = %series.code,
            n_readings = series.readings.len(),
            %total,
            "gotcha"
        );
        println!("{}", build_readings_table(&series, self.period.timezone));
        Ok(())
    }
}
