use std::collections::{BTreeMap, BTreeSet};

use chrono_tz::Tz;
use itertools::Itertools;

use crate::{
    billing::{
        mode::{Billing, EnergyFlows},
        period::YearMonth,
        reading::{Measurement, Reading},
        table::{Cell, Column, Row},
    },
    config::SiteConfig,
    error::SiteError,
    prelude::*,
    quantity::{energy::KilowattHours, money::KilowattHourRate},
};

/// Readings per measurement. A measurement that failed to fetch is absent.
pub type Measurements = BTreeMap<Measurement, Vec<Reading>>;

/// Billing summary of one calendar month of one site. [`None`] fields are undefined.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MonthlyRecord {
    pub month: YearMonth,
    pub flows: EnergyFlows,
    pub self_consumption_ratio: Option<f64>,
    pub tariff: KilowattHourRate,
    pub vat_rate: Option<f64>,
    pub billing: Billing,
}

impl MonthlyRecord {
    /// Row with the month labels: numeric year, `Qn` and `YYYY - Month`.
    pub fn to_row(&self) -> Row {
        [
            (Column::Year, Cell::number(f64::from(self.month.year))),
            (Column::Quarter, Cell::from(format!("Q{}", self.month.quarter()))),
            (Column::Month, Cell::from(self.month.to_string())),
            (Column::Production, Cell::from(self.flows.production.map(|energy| energy.0))),
            (Column::GridInjection, Cell::from(self.flows.grid_injection.map(|energy| energy.0))),
            (
                Column::SelfConsumption,
                Cell::from(self.flows.self_consumption.map(|energy| energy.0)),
            ),
            (Column::SelfConsumptionRatio, Cell::from(self.self_consumption_ratio)),
            (Column::Tariff, Cell::number(self.tariff.0)),
            (Column::PreVatBill, Cell::from(self.billing.pre_vat.map(|cost| cost.0))),
            (Column::VatRate, Cell::from(self.vat_rate)),
            (Column::VatAmount, Cell::from(self.billing.vat_amount.map(|cost| cost.0))),
            (Column::TotalBill, Cell::from(self.billing.total.map(|cost| cost.0))),
        ]
        .into_iter()
        .collect()
    }
}

/// Aggregate the site's readings into one record per calendar month present in the data.
///
/// The months are those of the billing time zone.
#[instrument(skip_all, fields(site = %site.name, pod = %site.pod, %timezone))]
pub fn summarize(
    site: &SiteConfig,
    measurements: &Measurements,
    timezone: Tz,
) -> Result<Vec<MonthlyRecord>, SiteError> {
    let month_of = |reading: &Reading| YearMonth::of(&reading.timestamp.with_timezone(&timezone));
    let energies: BTreeMap<Measurement, BTreeMap<YearMonth, KilowattHours>> = measurements
        .iter()
        .map(|(measurement, readings)| {
            let monthly = readings
                .iter()
                .into_grouping_map_by(|&reading| month_of(reading))
                .fold(KilowattHours::ZERO, |total, _, reading| total + reading.energy());
            (*measurement, monthly.into_iter().collect())
        })
        .collect();

    // Distinct timestamps of every measurement, they drive the VAT rate average.
    let timestamps: BTreeMap<YearMonth, BTreeSet<_>> = measurements
        .values()
        .flatten()
        .map(|reading| (month_of(reading), reading.timestamp))
        .into_group_map()
        .into_iter()
        .map(|(month, timestamps)| (month, timestamps.into_iter().collect()))
        .collect();

    if timestamps.is_empty() {
        return Err(SiteError::NoReadings { pod: site.pod.clone() });
    }

    let energy_of = |measurement: Measurement, month: YearMonth| {
        energies.get(&measurement).and_then(|monthly| monthly.get(&month)).copied()
    };
    let records = timestamps
        .into_iter()
        .map(|(month, timestamps)| {
            let flows = site.mode.flows(
                energy_of(Measurement::Production, month),
                energy_of(Measurement::RemainingAfterSharing, month),
            );
            let vat_rate = mean(timestamps.iter().map(|timestamp| {
                site.vat_rate_at(timestamp.with_timezone(&timezone).date_naive())
            }));
            MonthlyRecord {
                month,
                flows,
                self_consumption_ratio: site.mode.self_consumption_ratio(&flows),
                tariff: site.tariff,
                vat_rate,
                billing: Billing::derive(flows.self_consumption, site.tariff, vat_rate),
            }
        })
        .collect_vec();
    info!(n_months = records.len(), "summarized");
    Ok(records)
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_u32), |(sum, count), value| (sum + value, count + 1));
    (count != 0).then(|| sum / f64::from(count))
}
