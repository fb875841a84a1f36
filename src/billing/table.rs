use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

use ordered_float::OrderedFloat;

use crate::error::SiteError;

/// Report column. Display names follow the summaries the cooperative has always received.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Column {
    Year,
    Quarter,
    Month,
    Production,
    GridInjection,
    SelfConsumption,
    SelfConsumptionRatio,
    Tariff,
    PreVatBill,
    VatRate,
    VatAmount,
    TotalBill,
}

impl Column {
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::Year => "Jahr",
            Self::Quarter => "Quartal",
            Self::Month => "Monat",
            Self::Production => "Produktion",
            Self::GridInjection => "Einspeisung",
            Self::SelfConsumption => "Eigenverbrauch absolut",
            Self::SelfConsumptionRatio => "Eigenverbrauch relativ",
            Self::Tariff => "Tarif HTVA",
            Self::PreVatBill => "Eigenverbrauch HTVA",
            Self::VatRate => "TVA-Satz",
            Self::VatAmount => "TVA",
            Self::TotalBill => "Eigenverbrauch TTC",
        }
    }

    /// Physical unit, empty for labels.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Year | Self::Quarter | Self::Month => "",
            Self::Production | Self::GridInjection | Self::SelfConsumption => "kWh",
            Self::SelfConsumptionRatio | Self::VatRate => "%",
            Self::Tariff => "€/kWh",
            Self::PreVatBill | Self::VatAmount | Self::TotalBill => "€",
        }
    }

    pub const fn format(self) -> NumberFormat {
        match self {
            Self::Year | Self::Quarter | Self::Month => NumberFormat::General,
            Self::SelfConsumptionRatio | Self::VatRate => NumberFormat::Percent,
            Self::Tariff => NumberFormat::Fixed3,
            Self::PreVatBill | Self::VatAmount => NumberFormat::Fixed2,
            Self::Production | Self::GridInjection | Self::SelfConsumption | Self::TotalBill => {
                NumberFormat::Whole
            }
        }
    }
}

impl Display for Column {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.header())
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NumberFormat {
    General,

    /// Proportion shown as a percentage with one decimal.
    Percent,

    Fixed2,
    Fixed3,

    /// Rounded to a whole number, still shown with two decimals.
    Whole,
}

impl NumberFormat {
    /// Value as stored in the rendered summaries.
    #[must_use]
    pub fn value(self, number: f64) -> f64 {
        match self {
            Self::Whole => number.round(),
            Self::General | Self::Percent | Self::Fixed2 | Self::Fixed3 => number,
        }
    }

    #[must_use]
    pub fn render(self, cell: &Cell) -> String {
        let Cell::Number(number) = cell else {
            return cell.as_text().map_or_else(String::new, str::to_owned);
        };
        let value = self.value(number.0);
        match self {
            Self::General => value.to_string(),
            Self::Percent => format!("{:.1}%", value * 100.0),
            Self::Fixed2 | Self::Whole => format!("{value:.2}"),
            Self::Fixed3 => format!("{value:.3}"),
        }
    }
}

/// Report cell. [`Cell::Blank`] is the undefined value: missing input or a zero denominator.
#[must_use]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum Cell {
    #[default]
    Blank,

    Number(OrderedFloat<f64>),
    Text(String),
}

impl Cell {
    /// Non-finite values collapse into [`Cell::Blank`].
    pub fn number(value: f64) -> Self {
        if value.is_finite() { Self::Number(OrderedFloat(value)) } else { Self::Blank }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(number.0),
            Self::Blank | Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Blank | Self::Number(_) => None,
        }
    }

    #[must_use]
    pub const fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Blank, Self::number)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// Cells of a row keyed by column.
#[must_use]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Row(BTreeMap<Column, Cell>);

impl Row {
    /// Get the cell, failing when the row has no such column at all.
    pub fn get(&self, column: Column) -> Result<&Cell, SiteError> {
        self.0.get(&column).ok_or(SiteError::MissingColumn(column))
    }

    /// Get the cell for rendering, an absent column renders as blank.
    pub fn cell(&self, column: Column) -> &Cell {
        const BLANK: &Cell = &Cell::Blank;
        self.0.get(&column).unwrap_or(BLANK)
    }

    pub fn insert(&mut self, column: Column, cell: Cell) {
        self.0.insert(column, cell);
    }

    /// Keep only the columns of the schema.
    pub fn project(mut self, schema: &[Column]) -> Self {
        self.0.retain(|column, _| schema.contains(column));
        self
    }
}

impl FromIterator<(Column, Cell)> for Row {
    fn from_iter<T: IntoIterator<Item = (Column, Cell)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
