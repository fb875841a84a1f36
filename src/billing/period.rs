use std::fmt::{Display, Formatter};

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone};

/// Calendar month.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct YearMonth {
    pub year: i32,

    /// `1..=12`.
    pub month: u32,
}

impl YearMonth {
    pub const fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> Self {
        Self::new(timestamp.year(), timestamp.month())
    }

    #[must_use]
    pub const fn quarter(self) -> u32 {
        (self.month - 1) / 3 + 1
    }

    #[must_use]
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    #[must_use]
    pub fn last_day(self) -> Option<NaiveDate> {
        self.first_day()?.checked_add_months(Months::new(1))?.pred_opt()
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|month| chrono::Month::try_from(month).ok())
            .map_or("?", |month| month.name())
    }
}

impl Display for YearMonth {
    /// Month label as shown in the summaries, for example `2024 - January`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.year, self.name())
    }
}

/// Rollup granularity.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Granularity {
    Quarter,
    Year,
    GrandTotal,
}

impl Granularity {
    pub const ALL: [Self; 3] = [Self::Quarter, Self::Year, Self::GrandTotal];

    pub const fn period_of(self, month: YearMonth) -> Period {
        match self {
            Self::Quarter => Period::Quarter { year: month.year, quarter: month.quarter() },
            Self::Year => Period::Year(month.year),
            Self::GrandTotal => Period::GrandTotal,
        }
    }
}

/// Time span covered by a report row.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Period {
    Month(YearMonth),
    Quarter { year: i32, quarter: u32 },
    Year(i32),
    GrandTotal,
}

impl Period {
    /// Key that puts each total right after the rows it covers.
    pub const fn sort_key(self) -> SortKey {
        match self {
            Self::Month(month) => SortKey(
                Key::Defined(month.year),
                Key::Defined(month.quarter()),
                Key::Defined(month.month),
            ),
            Self::Quarter { year, quarter } => {
                SortKey(Key::Defined(year), Key::Defined(quarter), Key::Max)
            }
            Self::Year(year) => SortKey(Key::Defined(year), Key::Max, Key::Max),
            Self::GrandTotal => SortKey(Key::Max, Key::Max, Key::Max),
        }
    }

    #[must_use]
    pub const fn is_total(self) -> bool {
        !matches!(self, Self::Month(_))
    }
}

/// Sort key component. An absent label sorts after every defined value.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Key<T> {
    Defined(T),
    Max,
}

/// Year, quarter, month.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub struct SortKey(pub Key<i32>, pub Key<u32>, pub Key<u32>);

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn test_quarter() {
        assert_eq!(YearMonth::new(2024, 1).quarter(), 1);
        assert_eq!(YearMonth::new(2024, 3).quarter(), 1);
        assert_eq!(YearMonth::new(2024, 4).quarter(), 2);
        assert_eq!(YearMonth::new(2024, 12).quarter(), 4);
    }

    #[test]
    fn test_last_day() {
        assert_eq!(YearMonth::new(2024, 2).last_day(), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(YearMonth::new(2024, 12).last_day(), NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn test_display() {
        assert_eq!(YearMonth::new(2025, 3).to_string(), "2025 - March");
    }

    #[test]
    fn test_totals_follow_their_rows() {
        let periods = [
            Period::GrandTotal,
            Period::Year(2024),
            Period::Quarter { year: 2024, quarter: 1 },
            Period::Month(YearMonth::new(2025, 1)),
            Period::Month(YearMonth::new(2024, 4)),
            Period::Quarter { year: 2024, quarter: 2 },
            Period::Month(YearMonth::new(2024, 1)),
            Period::Year(2025),
        ];
        let sorted = periods.into_iter().sorted_by_key(|period| period.sort_key()).collect_vec();
        assert_eq!(
            sorted,
            [
                Period::Month(YearMonth::new(2024, 1)),
                Period::Quarter { year: 2024, quarter: 1 },
                Period::Month(YearMonth::new(2024, 4)),
                Period::Quarter { year: 2024, quarter: 2 },
                Period::Year(2024),
                Period::Month(YearMonth::new(2025, 1)),
                Period::Year(2025),
                Period::GrandTotal,
            ]
        );
    }
}
