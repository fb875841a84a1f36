use std::collections::BTreeMap;

use itertools::Itertools;

use crate::{
    billing::{
        period::{Granularity, Period, YearMonth},
        table::{Cell, Column, Row},
    },
    error::SiteError,
};

/// How a rollup cell is computed from the cells of the rows it covers.
#[derive(Clone)]
pub enum Rule {
    /// Sum of the defined cells.
    Sum,

    /// Arithmetic mean of the defined cells.
    Mean,

    /// Cell of the first row.
    First,

    Blank,

    /// Constant cell independent of the input.
    Fixed(Cell),

    /// Label computed from the group.
    Label(fn(&[&Row]) -> Result<Cell, SiteError>),
}

impl Rule {
    fn evaluate(&self, column: Column, rows: &[&Row]) -> Result<Cell, SiteError> {
        match self {
            Self::Sum => {
                let numbers = defined_numbers(column, rows)?;
                Ok(if numbers.is_empty() {
                    Cell::Blank
                } else {
                    Cell::number(numbers.into_iter().sum())
                })
            }
            Self::Mean => {
                let numbers = defined_numbers(column, rows)?;
                Ok(if numbers.is_empty() {
                    Cell::Blank
                } else {
                    #[allow(clippy::cast_precision_loss)]
                    let len = numbers.len() as f64;
                    Cell::number(numbers.into_iter().sum::<f64>() / len)
                })
            }
            Self::First => match rows.first() {
                Some(row) => Ok(row.get(column)?.clone()),
                None => Ok(Cell::Blank),
            },
            Self::Blank => Ok(Cell::Blank),
            Self::Fixed(cell) => Ok(cell.clone()),
            Self::Label(label) => label(rows),
        }
    }
}

fn defined_numbers(column: Column, rows: &[&Row]) -> Result<Vec<f64>, SiteError> {
    rows.iter()
        .map(|row| row.get(column).map(Cell::as_number))
        .filter_map_ok(|number| number)
        .collect()
}

/// Derived column recomputed from two rolled-up columns.
#[derive(Copy, Clone)]
pub struct Ratio {
    pub target: Column,
    pub numerator: Column,
    pub denominator: Column,
}

impl Ratio {
    fn apply(self, row: &mut Row) {
        let numerator = row.cell(self.numerator).as_number();
        let denominator = row.cell(self.denominator).as_number().filter(|value| *value != 0.0);
        let cell = Cell::from(numerator.zip(denominator).map(|(lhs, rhs)| lhs / rhs));
        row.insert(self.target, cell);
    }
}

/// Aggregation rules of one rollup granularity.
#[derive(Clone)]
pub struct RuleSet {
    pub rules: Vec<(Column, Rule)>,

    /// Applied after the rules, in order.
    pub ratios: Vec<Ratio>,
}

impl RuleSet {
    const SELF_CONSUMPTION_RATIO: Ratio = Ratio {
        target: Column::SelfConsumptionRatio,
        numerator: Column::SelfConsumption,
        denominator: Column::Production,
    };

    pub fn autoconsumption(granularity: Granularity) -> Self {
        let mut rules = Self::labels(granularity);
        rules.extend(
            [
                Column::Production,
                Column::GridInjection,
                Column::SelfConsumption,
                Column::PreVatBill,
                Column::VatAmount,
                Column::TotalBill,
            ]
            .map(|column| (column, Rule::Sum)),
        );
        rules.push((Column::SelfConsumptionRatio, Rule::Mean));
        rules.push((Column::Tariff, Rule::Mean));
        rules.push((
            Column::VatRate,
            // The rate may change between the years.
            if granularity == Granularity::GrandTotal { Rule::Blank } else { Rule::Mean },
        ));
        Self { rules, ratios: vec![Self::SELF_CONSUMPTION_RATIO] }
    }

    /// Only the production is summed, self-consumption is zero by definition.
    pub fn injection(granularity: Granularity) -> Self {
        let zero = Cell::number(0.0);
        let mut rules = Self::labels(granularity);
        rules.extend([
            (Column::Production, Rule::Sum),
            (Column::GridInjection, Rule::Blank),
            (Column::SelfConsumption, Rule::Fixed(zero.clone())),
            (Column::SelfConsumptionRatio, Rule::Fixed(zero)),
            (Column::Tariff, Rule::Blank),
            (Column::PreVatBill, Rule::Blank),
            (Column::VatRate, Rule::Blank),
            (Column::VatAmount, Rule::Blank),
            (Column::TotalBill, Rule::Blank),
        ]);
        Self { rules, ratios: Vec::new() }
    }

    fn labels(granularity: Granularity) -> Vec<(Column, Rule)> {
        match granularity {
            Granularity::Quarter => vec![
                (Column::Year, Rule::First),
                (Column::Quarter, Rule::Label(quarter_total_label)),
                (Column::Month, Rule::Blank),
            ],
            Granularity::Year => vec![
                (Column::Year, Rule::First),
                (Column::Quarter, Rule::Blank),
                (Column::Month, Rule::Blank),
            ],
            Granularity::GrandTotal => vec![
                (Column::Year, Rule::Fixed(Cell::from("Grand Total"))),
                (Column::Quarter, Rule::Blank),
                (Column::Month, Rule::Blank),
            ],
        }
    }

    /// Compute the rollup row of a group.
    pub fn evaluate(&self, group: &[&Row]) -> Result<Row, SiteError> {
        let mut row = self
            .rules
            .iter()
            .map(|(column, rule)| Ok((*column, rule.evaluate(*column, group)?)))
            .collect::<Result<Row, SiteError>>()?;
        let has = |column: Column| self.rules.iter().any(|(ruled, _)| *ruled == column);
        for ratio in &self.ratios {
            if has(ratio.numerator) && has(ratio.denominator) {
                ratio.apply(&mut row);
            }
        }
        Ok(row)
    }
}

/// `Qn Total` from the first row's quarter label.
fn quarter_total_label(rows: &[&Row]) -> Result<Cell, SiteError> {
    let Some(row) = rows.first() else {
        return Ok(Cell::Blank);
    };
    Ok(row
        .get(Column::Quarter)?
        .as_text()
        .map_or(Cell::Blank, |quarter| Cell::from(format!("{quarter} Total"))))
}

/// Roll the monthly rows up into one row per period of the granularity, in period order.
pub fn roll_up(
    months: &[(YearMonth, Row)],
    granularity: Granularity,
    rules: &RuleSet,
) -> Result<Vec<(Period, Row)>, SiteError> {
    months
        .iter()
        .map(|(month, row)| (granularity.period_of(*month), row))
        .into_group_map_by(|(period, _)| *period)
        .into_iter()
        .map(|(period, group)| (period, group.into_iter().map(|(_, row)| row).collect_vec()))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(period, group)| Ok((period, rules.evaluate(&group)?)))
        .collect()
}
