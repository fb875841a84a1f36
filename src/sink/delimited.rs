use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use csv::WriterBuilder;

use crate::{
    billing::report::{ReportTable, Rendering},
    config::SiteConfig,
    error::SiteError,
    prelude::*,
    sink::{ReportSink, spreadsheet::title, summary_file_name},
};

/// Writes the monthly summaries as CSV files, one per site.
pub struct CsvReportWriter {
    output_dir: PathBuf,
}

impl CsvReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, site: &SiteConfig) -> PathBuf {
        self.output_dir.join(summary_file_name(site, "csv"))
    }

    fn write_to(
        path: &Path,
        site: &SiteConfig,
        report: &ReportTable,
        rendering: Rendering,
        now: DateTime<Local>,
    ) -> Result {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;
        writer.write_record([title(site, now)])?;
        writer.write_record([""])?;
        writer.write_record(report.schema.iter().map(|column| column.header()))?;
        writer.write_record(report.unit_row())?;
        for row in &report.rows {
            writer.write_record(
                report
                    .schema
                    .iter()
                    .map(|column| rendering.format(*column).render(row.cells.cell(*column))),
            )?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl ReportSink for CsvReportWriter {
    #[instrument(skip_all, fields(site = %site.name))]
    fn write_report(
        &self,
        site: &SiteConfig,
        report: &ReportTable,
        rendering: Rendering,
    ) -> Result<PathBuf, SiteError> {
        let path = self.path_for(site);
        Self::write_to(&path, site, report, rendering, Local::now())
            .map_err(|error| SiteError::output_write_failure(&path, error))?;
        info!(path = %path.display(), n_rows = report.rows.len(), "written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{
        mode::BillingMode,
        period::{Period, YearMonth},
        report::ReportRow,
        table::{Cell, Column, Row},
    };

    fn site() -> Result<SiteConfig> {
        // language=TOML
        let site = toml::from_str(
            r#"
                name = "School"
                pod = "LU0001"
                capacity_kwp = 29.5
                mode = "injection"
                tariff = 0.0
                vat_rate = 0.0
            "#,
        )?;
        Ok(site)
    }

    fn report() -> ReportTable {
        let month = YearMonth::new(2024, 1);
        let cells = Row::from_iter([
            (Column::Year, Cell::number(2024.0)),
            (Column::Quarter, Cell::from("Q1")),
            (Column::Month, Cell::from(month.to_string())),
            (Column::Production, Cell::number(50.0)),
            (Column::GridInjection, Cell::number(50.0)),
        ]);
        let total = Row::from_iter([
            (Column::Year, Cell::from("Grand Total")),
            (Column::Production, Cell::number(50.0)),
        ]);
        ReportTable::assemble(
            BillingMode::Injection.schema(),
            [
                ReportRow { period: Period::GrandTotal, cells: total },
                ReportRow { period: Period::Month(month), cells },
            ],
        )
    }

    #[test]
    fn test_write_report_ok() -> Result {
        let output_dir = std::env::temp_dir().join("meterbill-test-write-csv-report");
        let site = site()?;
        let path = CsvReportWriter::new(&output_dir).write_report(
            &site,
            &report(),
            Rendering::InjectionOnly,
        )?;
        assert_eq!(path, output_dir.join("Monthly_summary_School_LU0001.csv"));
        let contents = fs::read_to_string(&path)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert!(lines[0].starts_with("\"Anlage School, POD LU0001, Kapazität 29.5 kWp"));
        assert_eq!(lines[2], "Jahr,Quartal,Monat,Produktion,Einspeisung");
        assert_eq!(lines[3], ",,,kWh,kWh");
        assert_eq!(lines[4], "2024,Q1,2024 - January,50.00,50");
        assert_eq!(lines[5], "Grand Total,,,50.00,");
        Ok(())
    }

    #[test]
    fn test_write_report_failure() -> Result {
        // A regular file cannot be a parent directory.
        let blocker = std::env::temp_dir().join("meterbill-test-csv-not-a-directory");
        fs::write(&blocker, "")?;
        let result =
            CsvReportWriter::new(&blocker).write_report(&site()?, &report(), Rendering::Full);
        assert!(matches!(result, Err(SiteError::OutputWriteFailure { .. })));
        Ok(())
    }
}
