pub mod delimited;
pub mod invoice;
pub mod spreadsheet;

use std::path::PathBuf;

use crate::{
    billing::{
        invoice::Invoice,
        report::{ReportTable, Rendering},
    },
    config::SiteConfig,
    error::SiteError,
};

/// Persists an assembled site report.
pub trait ReportSink {
    /// Write the report and return where it went.
    fn write_report(
        &self,
        site: &SiteConfig,
        report: &ReportTable,
        rendering: Rendering,
    ) -> Result<PathBuf, SiteError>;
}

/// Persists a finalized invoice.
pub trait InvoiceSink {
    fn write_invoice(&self, invoice: &Invoice) -> Result<PathBuf, SiteError>;
}

#[must_use]
pub fn summary_file_name(site: &SiteConfig, extension: &str) -> String {
    format!("Monthly_summary_{}_{}.{extension}", site.name, site.pod)
}
