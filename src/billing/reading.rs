use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    billing::interval::Interval,
    config::ObisCodes,
    error::SourceUnavailable,
    prelude::*,
    quantity::{energy::KilowattHours, power::Kilowatts},
};

/// Retrieves periodic energy readings of a metering point.
pub trait ReadingSource {
    /// Fetch all readings of the OBIS code in the interval.
    fn fetch(&self, pod: &str, code: &str, interval: Interval) -> Result<Series, SourceUnavailable>;
}

/// Measurement the billing needs, mapped onto an OBIS code by the configuration.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Measurement {
    /// Measured active production.
    Production,

    /// Production remaining after sharing, that is injected into the grid.
    RemainingAfterSharing,
}

impl Measurement {
    #[must_use]
    pub fn code(self, codes: &ObisCodes) -> &str {
        match self {
            Self::Production => &codes.production,
            Self::RemainingAfterSharing => &codes.remaining_after_sharing,
        }
    }
}

/// Readings of one OBIS code of one metering point.
#[must_use]
#[derive(Clone, Debug)]
pub struct Series {
    pub pod: String,
    pub code: String,
    pub readings: Vec<Reading>,
}

/// Single meter interval.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Reading {
    /// Interval start.
    pub timestamp: DateTime<Utc>,

    pub value: f64,
    pub unit: Unit,
    pub interval_length: TimeDelta,
}

impl Reading {
    /// Energy delivered during the interval.
    pub fn energy(&self) -> KilowattHours {
        match self.unit {
            Unit::Kilowatts => Kilowatts::from(self.value) * self.interval_length,
            Unit::KilowattHours => KilowattHours::from(self.value),
        }
    }
}

/// Reading unit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Unit {
    /// Average power over the interval.
    Kilowatts,

    /// Energy over the interval.
    KilowattHours,
}

impl FromStr for Unit {
    type Err = Error;

    fn from_str(unit: &str) -> Result<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "kw" => Ok(Self::Kilowatts),
            "kwh" => Ok(Self::KilowattHours),
            _ => bail!("unsupported unit `{unit}`"),
        }
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kilowatts => f.write_str("kW"),
            Self::KilowattHours => f.write_str("kWh"),
        }
    }
}

/// ISO 8601 duration of a metering interval, for example `PT15M`.
///
/// Only the day and time designators are supported, metering intervals never span months.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct IntervalLength(pub TimeDelta);

impl FromStr for IntervalLength {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let rest = text.strip_prefix('P').with_context(|| format!("`{text}` is not a duration"))?;
        let (date_part, time_part) = rest.split_once('T').unwrap_or((rest, ""));

        let mut total = TimeDelta::zero();
        for (part, is_time) in [(date_part, false), (time_part, true)] {
            let mut number = String::new();
            for symbol in part.chars() {
                if symbol.is_ascii_digit() {
                    number.push(symbol);
                    continue;
                }
                let amount: i64 = number
                    .parse()
                    .with_context(|| format!("missing amount before `{symbol}` in `{text}`"))?;
                number.clear();
                total += match (symbol, is_time) {
                    ('D', false) => TimeDelta::days(amount),
                    ('H', true) => TimeDelta::hours(amount),
                    ('M', true) => TimeDelta::minutes(amount),
                    ('S', true) => TimeDelta::seconds(amount),
                    _ => bail!("unsupported designator `{symbol}` in `{text}`"),
                };
            }
            ensure!(number.is_empty(), "dangling number in `{text}`");
        }
        ensure!(total > TimeDelta::zero(), "`{text}` is not a positive duration");
        Ok(Self(total))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_parse_interval_length_ok() -> Result {
        assert_eq!("PT15M".parse::<IntervalLength>()?.0, TimeDelta::minutes(15));
        assert_eq!("PT1H".parse::<IntervalLength>()?.0, TimeDelta::hours(1));
        assert_eq!("PT1H30M".parse::<IntervalLength>()?.0, TimeDelta::minutes(90));
        assert_eq!("P1D".parse::<IntervalLength>()?.0, TimeDelta::days(1));
        Ok(())
    }

    #[test]
    fn test_parse_interval_length_invalid() {
        assert!("15M".parse::<IntervalLength>().is_err());
        assert!("PT".parse::<IntervalLength>().is_err());
        assert!("PT15".parse::<IntervalLength>().is_err());
        assert!("P1M".parse::<IntervalLength>().is_err());
        assert!("PTM".parse::<IntervalLength>().is_err());
    }

    #[test]
    fn test_parse_unit() -> Result {
        assert_eq!("KW".parse::<Unit>()?, Unit::Kilowatts);
        assert_eq!("kWh".parse::<Unit>()?, Unit::KilowattHours);
        assert!("m3".parse::<Unit>().is_err());
        Ok(())
    }

    #[test]
    fn test_energy() {
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let power = Reading {
            timestamp,
            value: 2.0,
            unit: Unit::Kilowatts,
            interval_length: TimeDelta::minutes(15),
        };
        assert_abs_diff_eq!(power.energy().0, 0.5);

        let energy = Reading { unit: Unit::KilowattHours, ..power };
        assert_abs_diff_eq!(energy.energy().0, 2.0);
    }
}
