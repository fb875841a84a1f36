use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;

use crate::{
    cli::{leneda::LenedaApiArgs, period::PeriodArgs},
    config::SitesFile,
    pipeline::{Invoicing, Pipeline},
    prelude::*,
    sink::{
        ReportSink,
        delimited::CsvReportWriter,
        invoice::TextInvoiceWriter,
        spreadsheet::XlsxReportWriter,
    },
    tables::{build_outcomes_table, build_report_table},
};

#[derive(Copy, Clone, Debug, clap::ValueEnum)]
pub enum SummaryFormat {
    /// Excel workbook with the shaded totals.
    Xlsx,

    /// Plain values, without any styling.
    Csv,
}

#[derive(Parser)]
pub struct ReportArgs {
    #[clap(flatten)]
    leneda: LenedaApiArgs,

    #[clap(flatten)]
    period: PeriodArgs,

    /// Sites file with the issuer, the OBIS codes, and the sites.
    #[clap(long = "sites", env = "SITES_PATH", default_value = "sites.toml")]
    sites_path: PathBuf,

    #[clap(long, env = "OUTPUT_DIR", default_value = "summaries")]
    output_dir: PathBuf,

    #[clap(long, env = "SUMMARY_FORMAT", value_enum, default_value_t = SummaryFormat::Xlsx)]
    summary_format: SummaryFormat,

    #[clap(long, env = "INVOICE_DIR", default_value = "invoices")]
    invoice_dir: PathBuf,

    /// Also generate the invoices.
    #[clap(long)]
    invoices: bool,

    /// Do not print the summaries.
    #[clap(long)]
    quiet: bool,
}

impl ReportArgs {
    #[instrument(skip_all)]
    pub fn run(self) -> Result {
        let sites_file = SitesFile::read_from(&self.sites_path)?;
        let interval = self.period.interval()?;
        let source = self.leneda.new_client()?;
        let report_sink: Box<dyn ReportSink> = match self.summary_format {
            SummaryFormat::Xlsx => Box::new(XlsxReportWriter::new(&self.output_dir)),
            SummaryFormat::Csv => Box::new(CsvReportWriter::new(&self.output_dir)),
        };
        let invoice_sink = TextInvoiceWriter::new(&self.invoice_dir);

        let invoicing = if self.invoices {
            let issuer = sites_file
                .issuer
                .clone()
                .context("the sites file must have an `[issuer]` section to generate invoices")?;
            Some(Invoicing {
                sink: &invoice_sink,
                issuer,
                issue_date: Utc::now().with_timezone(&self.period.timezone).date_naive(),
            })
        } else {
            None
        };

        let run_report = Pipeline::builder()
            .source(&source)
            .codes(sites_file.codes.clone())
            .interval(interval)
            .timezone(self.period.timezone)
            .report_sink(report_sink.as_ref())
            .maybe_invoicing(invoicing)
            .build()
            .run(&sites_file.sites);

        if !self.quiet {
            for (site, outcome) in sites_file.sites.iter().zip(&run_report.outcomes) {
                if let Ok(site_report) = &outcome.result {
                    println!("{}", build_report_table(&site_report.table, site.mode.rendering()));
                }
            }
        }
        println!("{}", build_outcomes_table(&run_report));

        let n_failed = run_report.n_failed();
        ensure!(n_failed == 0, "{n_failed} of {} sites failed", run_report.outcomes.len());
        Ok(())
    }
}
