use std::fmt::{Debug, Formatter};

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::prelude::*;

#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Interval {
    /// Inclusive.
    pub start: DateTime<Utc>,

    /// Exclusive.
    pub end: DateTime<Utc>,
}

impl Debug for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}..{:?}", self.start, self.end)
    }
}

impl Interval {
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Midnight to midnight in the billing time zone.
    pub fn try_from_dates(since: NaiveDate, until: NaiveDate, timezone: Tz) -> Result<Self> {
        ensure!(since < until, "`{since}` must be before `{until}`");
        Ok(Self::new(midnight(since, timezone)?, midnight(until, timezone)?))
    }

    pub fn contains(self, other: DateTime<Utc>) -> bool {
        (self.start <= other) && (other < self.end)
    }
}

fn midnight(date: NaiveDate, timezone: Tz) -> Result<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .context("invalid midnight")?
        .and_local_timezone(timezone)
        .earliest()
        .with_context(|| format!("no midnight on `{date}` in `{timezone}`"))?;
    Ok(midnight.with_timezone(&Utc))
}
