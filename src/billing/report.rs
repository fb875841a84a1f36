use itertools::Itertools;

use crate::{
    billing::{
        mode::BillingMode,
        period::{Granularity, Period},
        rollup::roll_up,
        summary::MonthlyRecord,
        table::{Column, NumberFormat, Row},
    },
    error::SiteError,
    prelude::*,
};

/// Row of a report with the period it covers.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct ReportRow {
    pub period: Period,
    pub cells: Row,
}

/// Monthly and rollup rows of one site, in display order.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct ReportTable {
    pub schema: Vec<Column>,
    pub rows: Vec<ReportRow>,
}

impl ReportTable {
    /// Sort the rows so that each total follows the rows it covers, and project them.
    pub fn assemble(schema: &[Column], rows: impl IntoIterator<Item = ReportRow>) -> Self {
        let rows = rows
            .into_iter()
            .sorted_by_key(|row| row.period.sort_key())
            .map(|row| ReportRow { period: row.period, cells: row.cells.project(schema) })
            .collect();
        Self { schema: schema.to_vec(), rows }
    }

    /// Unit of each schema column.
    pub fn unit_row(&self) -> Vec<&'static str> {
        self.schema.iter().map(|column| column.unit()).collect()
    }

    /// Shading of each row, derived from the label cells.
    pub fn shades(&self) -> Vec<Shade> {
        let last = self.rows.len().saturating_sub(1);
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if !row.cells.cell(Column::Month).is_blank() {
                    Shade::None
                } else if i == last {
                    Shade::GrandTotal
                } else if row.cells.cell(Column::Quarter).is_blank() {
                    Shade::YearTotal
                } else {
                    Shade::QuarterTotal
                }
            })
            .collect()
    }

    /// Rows without the totals.
    pub fn monthly_rows(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|row| !row.period.is_total())
    }

    pub fn grand_total(&self) -> Option<&ReportRow> {
        self.rows.iter().find(|row| row.period == Period::GrandTotal)
    }
}

/// Row highlighting in the rendered summaries.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Shade {
    None,
    QuarterTotal,
    YearTotal,
    GrandTotal,
}

impl Shade {
    /// Fill colour as an RGB triplet.
    #[must_use]
    pub const fn rgb(self) -> Option<(u8, u8, u8)> {
        match self {
            Self::None => None,
            Self::QuarterTotal => Some((0xD9, 0xD9, 0xD9)),
            Self::YearTotal => Some((0xAD, 0xD8, 0xE6)),
            Self::GrandTotal => Some((0xC6, 0xEF, 0xCE)),
        }
    }
}

/// How the sinks render the numbers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Rendering {
    /// Every column in its own number format.
    Full,

    /// Only the production is formatted, the rest is shown as is.
    InjectionOnly,
}

impl Rendering {
    pub const fn format(self, column: Column) -> NumberFormat {
        match (self, column) {
            (Self::Full, _) | (Self::InjectionOnly, Column::Production) => column.format(),
            (Self::InjectionOnly, _) => NumberFormat::General,
        }
    }
}

/// Build the site's report from its monthly records.
#[instrument(skip_all, fields(mode = ?mode, n_months = records.len()))]
pub fn build(mode: BillingMode, records: &[MonthlyRecord]) -> Result<ReportTable, SiteError> {
    let months = records.iter().map(|record| (record.month, record.to_row())).collect_vec();
    let mut rows = months
        .iter()
        .map(|(month, cells)| ReportRow { period: Period::Month(*month), cells: cells.clone() })
        .collect_vec();
    for granularity in Granularity::ALL {
        let rolled = roll_up(&months, granularity, &mode.rules(granularity))?;
        rows.extend(rolled.into_iter().map(|(period, cells)| ReportRow { period, cells }));
    }
    let table = ReportTable::assemble(mode.schema(), rows);
    debug!(n_rows = table.rows.len(), "assembled");
    Ok(table)
}
