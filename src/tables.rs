use chrono_tz::Tz;
use comfy_table::{
    Attribute,
    Cell,
    CellAlignment,
    Color,
    ColumnConstraint,
    Table,
    Width,
    modifiers,
    presets,
};

use crate::{
    billing::{
        reading::Series,
        report::{ReportTable, Rendering},
        table::Column,
    },
    pipeline::RunReport,
    quantity::energy::KilowattHours,
};

/// Width of every summary column.
const COLUMN_WIDTH: u16 = 21;

pub fn build_report_table(report: &ReportTable, rendering: Rendering) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(report.schema.iter().map(|column| column.header()));
    table.add_row(
        report.unit_row().into_iter().map(|unit| Cell::new(unit).add_attribute(Attribute::Dim)),
    );
    for (row, shade) in report.rows.iter().zip(report.shades()) {
        table.add_row(report.schema.iter().map(|column| {
            let mut cell = Cell::new(rendering.format(*column).render(row.cells.cell(*column)));
            if row.cells.cell(*column).as_number().is_some() {
                cell = cell.set_alignment(CellAlignment::Right);
            }
            if let Some((r, g, b)) = shade.rgb() {
                cell = cell.bg(Color::Rgb { r, g, b }).fg(Color::Black);
            }
            cell
        }));
    }
    for column in table.column_iter_mut() {
        column.set_constraint(ColumnConstraint::Absolute(Width::Fixed(COLUMN_WIDTH)));
    }
    table
}

pub fn build_outcomes_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(vec![
        "Site",
        "POD",
        "Outcome",
        "Warnings",
        "Production",
        "Summary",
        "Invoice",
    ]);
    for outcome in &report.outcomes {
        let warnings = Cell::new(outcome.warnings.len())
            .set_alignment(CellAlignment::Right)
            .fg(if outcome.warnings.is_empty() { Color::Green } else { Color::DarkYellow });
        match &outcome.result {
            Ok(site_report) => table.add_row(vec![
                Cell::new(&outcome.site),
                Cell::new(&outcome.pod).add_attribute(Attribute::Dim),
                Cell::new("success").fg(Color::Green),
                warnings,
                Cell::new(
                    site_report
                        .table
                        .grand_total()
                        .and_then(|row| row.cells.cell(Column::Production).as_number())
                        .map_or_else(String::new, |production| {
                            KilowattHours::from(production).to_string()
                        }),
                )
                .set_alignment(CellAlignment::Right),
                Cell::new(site_report.summary_path.display()),
                Cell::new(
                    site_report
                        .invoice_path
                        .as_ref()
                        .map_or_else(String::new, |path| path.display().to_string()),
                ),
            ]),
            Err(error) => table.add_row(vec![
                Cell::new(&outcome.site),
                Cell::new(&outcome.pod).add_attribute(Attribute::Dim),
                Cell::new(error.kind()).fg(Color::Red),
                warnings,
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
            ]),
        };
    }
    table
}

pub fn build_readings_table(series: &Series, timezone: Tz) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .enforce_styling();
    table.set_header(vec!["Date", "Start", "Length", "Value", "Unit", "Energy"]);
    for reading in &series.readings {
        let timestamp = reading.timestamp.with_timezone(&timezone);
        table.add_row(vec![
            Cell::new(timestamp.format("%Y-%m-%d")).add_attribute(Attribute::Dim),
            Cell::new(timestamp.format("%H:%M")),
            Cell::new(format!("{}min", reading.interval_length.num_minutes()))
                .add_attribute(Attribute::Dim),
            Cell::new(reading.value).set_alignment(CellAlignment::Right),
            Cell::new(reading.unit),
            Cell::new(reading.energy()).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
