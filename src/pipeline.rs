use std::path::PathBuf;

use bon::Builder;
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::{
    billing::{
        interval::Interval,
        invoice::{Invoice, InvoiceTotals},
        reading::ReadingSource,
        report::{self, ReportTable},
        summary::{Measurements, summarize},
    },
    config::{Issuer, ObisCodes, SiteConfig},
    error::{SiteError, SourceUnavailable},
    prelude::*,
    sink::{InvoiceSink, ReportSink},
};

/// Invoice generation settings.
pub struct Invoicing<'a> {
    pub sink: &'a dyn InvoiceSink,
    pub issuer: Issuer,
    pub issue_date: NaiveDate,
}

/// Processes the sites one by one: fetch, summarize, roll up, assemble, and write.
#[derive(Builder)]
pub struct Pipeline<'a> {
    source: &'a dyn ReadingSource,
    codes: ObisCodes,
    interval: Interval,

    /// Time zone of the calendar months.
    timezone: Tz,

    report_sink: &'a dyn ReportSink,
    invoicing: Option<Invoicing<'a>>,
}

impl Pipeline<'_> {
    /// Process every site. A failing site never stops the others.
    #[instrument(skip_all, fields(n_sites = sites.len()))]
    pub fn run(&self, sites: &[SiteConfig]) -> RunReport {
        let outcomes = sites
            .iter()
            .zip(1..)
            .map(|(site, position)| {
                let mut warnings = Vec::new();
                let result = self.process(site, position, &mut warnings);
                match &result {
                    Ok(report) => info!(
                        site = %site.name,
                        pod = %site.pod,
                        n_months = report.table.monthly_rows().count(),
                        n_warnings = warnings.len(),
                        "succeeded"
                    ),
                    Err(error) => error!(
                        site = %site.name,
                        pod = %site.pod,
                        kind = error.kind(),
                        "failed: {error:#}"
                    ),
                }
                SiteOutcome { site: site.name.clone(), pod: site.pod.clone(), warnings, result }
            })
            .collect();
        RunReport { outcomes }
    }

    #[instrument(skip_all, fields(site = %site.name, pod = %site.pod))]
    fn process(
        &self,
        site: &SiteConfig,
        position: u32,
        warnings: &mut Vec<SourceUnavailable>,
    ) -> Result<SiteReport, SiteError> {
        let measurements = self.fetch(site, warnings)?;
        let records = summarize(site, &measurements, self.timezone)?;
        let table = report::build(site.mode, &records)?;
        let summary_path = self.report_sink.write_report(site, &table, site.mode.rendering())?;

        let invoice_path = match &self.invoicing {
            Some(invoicing) => {
                let totals = InvoiceTotals::extract(&records)
                    .map_err(|_| SiteError::NoReadings { pod: site.pod.clone() })?;
                let invoice = Invoice::builder()
                    .issuer(invoicing.issuer.clone())
                    .site(site)
                    .sequence(site.invoice_sequence.unwrap_or(position))
                    .totals(totals)
                    .issue_date(invoicing.issue_date)
                    .build();
                Some(invoicing.sink.write_invoice(&invoice)?)
            }
            None => None,
        };

        Ok(SiteReport { table, summary_path, invoice_path })
    }

    /// Fetch the measurements of the site's billing mode.
    ///
    /// A failed measurement is recorded as a warning and stays absent,
    /// the site fails only when every measurement failed.
    fn fetch(
        &self,
        site: &SiteConfig,
        warnings: &mut Vec<SourceUnavailable>,
    ) -> Result<Measurements, SiteError> {
        let mut measurements = Measurements::new();
        for measurement in site.mode.measurements() {
            let code = measurement.code(&self.codes);
            match self.source.fetch(&site.pod, code, self.interval) {
                Ok(mut series) => {
                    series.readings.retain(|reading| self.interval.contains(reading.timestamp));
                    debug!(?measurement, n_readings = series.readings.len(), "fetched");
                    measurements.insert(*measurement, series.readings);
                }
                Err(error) => {
                    warn!(?measurement, "{error:#}");
                    warnings.push(error);
                }
            }
        }
        if measurements.is_empty()
            && let Some(error) = warnings.last()
        {
            return Err(error.clone().into());
        }
        Ok(measurements)
    }
}

/// Artifacts of a successfully processed site.
pub struct SiteReport {
    pub table: ReportTable,
    pub summary_path: PathBuf,
    pub invoice_path: Option<PathBuf>,
}

pub struct SiteOutcome {
    pub site: String,
    pub pod: String,

    /// Measurements that failed without failing the site.
    pub warnings: Vec<SourceUnavailable>,

    pub result: Result<SiteReport, SiteError>,
}

pub struct RunReport {
    pub outcomes: Vec<SiteOutcome>,
}

impl RunReport {
    #[must_use]
    pub fn n_failed(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err()).count()
    }
}
