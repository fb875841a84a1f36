use std::time::Duration;

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::Deserialize;
use serde_with::{DisplayFromStr, serde_as};
use ureq::Agent;

use crate::{
    billing::{
        interval::Interval,
        reading::{IntervalLength, Reading, ReadingSource, Series, Unit},
    },
    error::SourceUnavailable,
    prelude::*,
};

/// Leneda metering data platform client.
pub struct Api {
    client: Agent,
    base_url: String,
    api_key: String,
    energy_id: String,

    /// Used when a response does not state its interval length.
    default_interval_length: TimeDelta,
}

#[bon::bon]
impl Api {
    #[builder]
    pub fn new(
        #[builder(into)] base_url: String,
        #[builder(into)] api_key: String,
        #[builder(into)] energy_id: String,
        timeout: Duration,
        default_interval_length: TimeDelta,
    ) -> Self {
        let client = Agent::config_builder().timeout_global(Some(timeout)).build().into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            energy_id,
            default_interval_length,
        }
    }
}

impl Api {
    #[instrument(skip_all, fields(pod = pod, code = code))]
    pub fn get_time_series(&self, pod: &str, code: &str, interval: Interval) -> Result<Series> {
        info!("fetching…");
        let response = self
            .client
            .get(format!("{}/metering-points/{pod}/time-series", self.base_url))
            .header("X-API-KEY", &self.api_key)
            .header("X-ENERGY-ID", &self.energy_id)
            .query("startDateTime", format_timestamp(interval.start))
            .query("endDateTime", format_timestamp(interval.end))
            .query("obisCode", code)
            .call()?
            .body_mut()
            .read_json::<TimeSeriesResponse>()?;
        let series = response.into_series(self.default_interval_length);
        info!(n_readings = series.readings.len(), "fetched");
        Ok(series)
    }
}

impl ReadingSource for Api {
    fn fetch(
        &self,
        pod: &str,
        code: &str,
        interval: Interval,
    ) -> Result<Series, SourceUnavailable> {
        self.get_time_series(pod, code, interval).map_err(|error| SourceUnavailable {
            pod: pod.to_owned(),
            code: code.to_owned(),
            reason: format!("{error:#}"),
        })
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[serde_as]
#[derive(Deserialize)]
struct TimeSeriesResponse {
    #[serde(rename = "meteringPointCode")]
    metering_point_code: String,

    #[serde(rename = "obisCode")]
    obis_code: String,

    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(rename = "intervalLength", default)]
    interval_length: Option<IntervalLength>,

    #[serde_as(as = "DisplayFromStr")]
    unit: Unit,

    #[serde(default)]
    items: Vec<Item>,
}

impl TimeSeriesResponse {
    fn into_series(self, default_interval_length: TimeDelta) -> Series {
        let interval_length =
            self.interval_length.map_or(default_interval_length, |length| length.0);
        let readings = self
            .items
            .into_iter()
            .map(|item| Reading {
                timestamp: item.started_at,
                value: item.value,
                unit: self.unit,
                interval_length,
            })
            .collect();
        Series { pod: self.metering_point_code, code: self.obis_code, readings }
    }
}

#[derive(Deserialize)]
struct Item {
    value: f64,

    #[serde(rename = "startedAt")]
    started_at: DateTime<Utc>,
}
