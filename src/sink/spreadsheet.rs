use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

use crate::{
    billing::{
        report::{ReportTable, Rendering, Shade},
        table::{Cell, NumberFormat},
    },
    config::SiteConfig,
    error::SiteError,
    prelude::*,
    sink::{ReportSink, summary_file_name},
};

/// Width of every summary column.
const COLUMN_WIDTH: f64 = 21.0;

/// Below the title line and an empty line.
const HEADER_ROW: u32 = 2;

const MAX_SHEET_NAME_LEN: usize = 31;

/// Writes the monthly summaries as Excel workbooks, one per site.
pub struct XlsxReportWriter {
    output_dir: PathBuf,
}

impl XlsxReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, site: &SiteConfig) -> PathBuf {
        self.output_dir.join(summary_file_name(site, "xlsx"))
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
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(&site.name))?;
        write_sheet(worksheet, site, report, rendering, now)?;
        workbook.save(path)?;
        Ok(())
    }
}

impl ReportSink for XlsxReportWriter {
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

fn write_sheet(
    worksheet: &mut Worksheet,
    site: &SiteConfig,
    report: &ReportTable,
    rendering: Rendering,
    now: DateTime<Local>,
) -> Result {
    worksheet.write_string(0, 0, &title(site, now))?;

    let header_format = Format::new().set_bold();
    for (col, column) in (0_u16..).zip(&report.schema) {
        worksheet.write_string_with_format(HEADER_ROW, col, column.header(), &header_format)?;
        if !column.unit().is_empty() {
            worksheet.write_string(HEADER_ROW + 1, col, column.unit())?;
        }
        worksheet.set_column_width(col, COLUMN_WIDTH)?;
    }

    let rows = report.rows.iter().zip(cell_formats(report, rendering));
    for (row_number, (row, formats)) in (HEADER_ROW + 2..).zip(rows) {
        for ((col, column), format) in (0_u16..).zip(&report.schema).zip(&formats) {
            match row.cells.cell(*column) {
                Cell::Blank => worksheet.write_blank(row_number, col, format)?,
                Cell::Number(number) => {
                    let value = rendering.format(*column).value(number.0);
                    worksheet.write_number_with_format(row_number, col, value, format)?
                }
                Cell::Text(text) => {
                    worksheet.write_string_with_format(row_number, col, text, format)?
                }
            };
        }
    }
    Ok(())
}

/// Format of every data cell: the fill of its row and the number format of its column.
fn cell_formats(report: &ReportTable, rendering: Rendering) -> Vec<Vec<Format>> {
    report
        .shades()
        .into_iter()
        .map(|shade| {
            report
                .schema
                .iter()
                .map(|column| cell_format(shade, rendering.format(*column)))
                .collect()
        })
        .collect()
}

fn cell_format(shade: Shade, number_format: NumberFormat) -> Format {
    let mut format = Format::new();
    if let Some((r, g, b)) = shade.rgb() {
        let rgb = (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
        format = format.set_background_color(Color::RGB(rgb));
    }
    if let Some(code) = number_format_code(number_format) {
        format = format.set_num_format(code);
    }
    format
}

const fn number_format_code(number_format: NumberFormat) -> Option<&'static str> {
    match number_format {
        NumberFormat::General => None,
        NumberFormat::Percent => Some("0.0%"),
        NumberFormat::Fixed2 | NumberFormat::Whole => Some("0.00"),
        NumberFormat::Fixed3 => Some("0.000"),
    }
}

/// Site name with the characters Excel rejects in sheet names replaced.
fn sheet_name(site_name: &str) -> String {
    let name: String = site_name
        .chars()
        .map(|c| if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') { '_' } else { c })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let name = name.trim_matches('\'');
    if name.is_empty() { "Summary".to_owned() } else { name.to_owned() }
}

/// Title line with the site details and the generation time.
pub fn title(site: &SiteConfig, now: DateTime<Local>) -> String {
    format!(
        "Anlage {}, POD {}, Kapazität {} kWp   -     Stand: {}",
        site.name,
        site.pod,
        site.capacity_kwp,
        now.format("%Y-%m-%d %H:%M:%S"),
    )
}

#[cfg(test)]
mod tests {
    use calamine::{Data, Reader, Xlsx, open_workbook};
    use chrono::TimeZone;

    use super::*;
    use crate::billing::{
        mode::BillingMode,
        period::{Period, YearMonth},
        report::ReportRow,
        table::{Column, Row},
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

    /// One month with its quarter, year, and grand totals.
    fn report() -> ReportTable {
        let month = YearMonth::new(2024, 1);
        let rows = [
            (
                Period::Month(month),
                Row::from_iter([
                    (Column::Year, Cell::number(2024.0)),
                    (Column::Quarter, Cell::from("Q1")),
                    (Column::Month, Cell::from(month.to_string())),
                    (Column::Production, Cell::number(50.4)),
                    (Column::GridInjection, Cell::number(50.4)),
                ]),
            ),
            (
                Period::Quarter { year: 2024, quarter: 1 },
                Row::from_iter([
                    (Column::Year, Cell::number(2024.0)),
                    (Column::Quarter, Cell::from("Q1 Total")),
                    (Column::Production, Cell::number(50.4)),
                ]),
            ),
            (
                Period::Year(2024),
                Row::from_iter([
                    (Column::Year, Cell::number(2024.0)),
                    (Column::Production, Cell::number(50.4)),
                ]),
            ),
            (
                Period::GrandTotal,
                Row::from_iter([
                    (Column::Year, Cell::from("Grand Total")),
                    (Column::Production, Cell::number(50.4)),
                ]),
            ),
        ];
        ReportTable::assemble(
            BillingMode::Injection.schema(),
            rows.map(|(period, cells)| ReportRow { period, cells }),
        )
    }

    #[test]
    fn test_title() -> Result {
        let now = Local.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(
            title(&site()?, now),
            "Anlage School, POD LU0001, Kapazität 29.5 kWp   -     Stand: 2025-02-03 04:05:06",
        );
        Ok(())
    }

    #[test]
    fn test_sheet_name() {
        assert_eq!(sheet_name("School"), "School");
        assert_eq!(sheet_name("Hall [A/B]"), "Hall _A_B_");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sheet_name("''"), "Summary");
    }

    #[test]
    fn test_cell_formats() {
        let quarter = Color::RGB(0x00D9_D9D9);
        let year = Color::RGB(0x00AD_D8E6);
        let grand_total = Color::RGB(0x00C6_EFCE);

        let formats = cell_formats(&report(), Rendering::InjectionOnly);
        assert_eq!(formats.len(), 4);
        assert_eq!(formats[0][0], Format::new());
        assert_eq!(formats[0][3], Format::new().set_num_format("0.00"));
        assert_eq!(formats[1][0], Format::new().set_background_color(quarter));
        assert_eq!(
            formats[1][3],
            Format::new().set_background_color(quarter).set_num_format("0.00"),
        );
        assert_eq!(formats[2][4], Format::new().set_background_color(year));
        assert_eq!(formats[3][2], Format::new().set_background_color(grand_total));
    }

    #[test]
    fn test_number_formats() {
        let format = |number_format| cell_format(Shade::None, number_format);
        assert_eq!(format(NumberFormat::Percent), Format::new().set_num_format("0.0%"));
        assert_eq!(format(NumberFormat::Fixed2), Format::new().set_num_format("0.00"));
        assert_eq!(format(NumberFormat::Fixed3), Format::new().set_num_format("0.000"));
        assert_eq!(format(NumberFormat::General), Format::new());
    }

    #[test]
    fn test_write_report_ok() -> Result {
        let output_dir = std::env::temp_dir().join("meterbill-test-write-xlsx-report");
        let site = site()?;
        let path = XlsxReportWriter::new(&output_dir).write_report(
            &site,
            &report(),
            Rendering::InjectionOnly,
        )?;
        assert_eq!(path, output_dir.join("Monthly_summary_School_LU0001.xlsx"));

        let mut workbook: Xlsx<_> = open_workbook(&path)?;
        assert_eq!(workbook.sheet_names(), ["School"]);
        let range = workbook.worksheet_range("School")?;
        let Some(Data::String(title)) = range.get_value((0, 0)) else {
            bail!("no title");
        };
        assert!(title.starts_with("Anlage School, POD LU0001, Kapazität 29.5 kWp"));
        assert_eq!(range.get_value((2, 0)), Some(&Data::String("Jahr".to_owned())));
        assert_eq!(range.get_value((3, 3)), Some(&Data::String("kWh".to_owned())));
        assert_eq!(range.get_value((4, 0)), Some(&Data::Float(2024.0)));

        // Production is rounded to whole kilowatt-hours, the injection is left as is.
        assert_eq!(range.get_value((4, 3)), Some(&Data::Float(50.0)));
        assert_eq!(range.get_value((4, 4)), Some(&Data::Float(50.4)));

        assert_eq!(range.get_value((5, 1)), Some(&Data::String("Q1 Total".to_owned())));
        assert_eq!(range.get_value((7, 0)), Some(&Data::String("Grand Total".to_owned())));
        assert_eq!(range.get_value((7, 3)), Some(&Data::Float(50.0)));
        Ok(())
    }

    #[test]
    fn test_write_report_failure() -> Result {
        // A regular file cannot be a parent directory.
        let blocker = std::env::temp_dir().join("meterbill-test-xlsx-not-a-directory");
        fs::write(&blocker, "")?;
        let result =
            XlsxReportWriter::new(&blocker).write_report(&site()?, &report(), Rendering::Full);
        assert!(matches!(result, Err(SiteError::OutputWriteFailure { .. })));
        Ok(())
    }
}
