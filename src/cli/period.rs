use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::Parser;

use crate::{billing::interval::Interval, prelude::*};

#[derive(Parser)]
pub struct PeriodArgs {
    /// First day of the period.
    #[clap(long, env = "SINCE")]
    since: NaiveDate,

    /// Day after the period, exclusive.
    #[clap(long, env = "UNTIL")]
    until: NaiveDate,

    /// Time zone of the period boundaries and of the calendar months.
    #[clap(long, env = "TIMEZONE", default_value = "UTC", value_parser = parse_timezone)]
    pub timezone: Tz,
}

impl PeriodArgs {
    pub fn interval(&self) -> Result<Interval> {
        Interval::try_from_dates(self.since, self.until, self.timezone)
    }
}

fn parse_timezone(name: &str) -> Result<Tz, String> {
    name.parse().map_err(|error| format!("`{name}`: {error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("Europe/Luxembourg"), Ok(Tz::Europe__Luxembourg));
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
