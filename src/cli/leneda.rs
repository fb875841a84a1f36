use chrono::TimeDelta;
use clap::Parser;

use crate::{api::leneda::Api, prelude::*};

#[derive(Parser)]
pub struct LenedaApiArgs {
    #[clap(
        long = "api-base-url",
        env = "LENEDA_API_BASE_URL",
        default_value = "https://api.leneda.eu/api"
    )]
    base_url: String,

    #[clap(long = "api-key", env = "LENEDA_API_KEY")]
    api_key: String,

    #[clap(long = "energy-id", env = "LENEDA_ENERGY_ID")]
    energy_id: String,

    /// Global timeout of a single API request.
    #[clap(long = "api-timeout", env = "LENEDA_API_TIMEOUT", default_value = "30s")]
    timeout: humantime::Duration,

    /// Interval length assumed when a response does not state it.
    #[clap(long, env = "DEFAULT_INTERVAL_LENGTH", default_value = "15min")]
    default_interval_length: humantime::Duration,
}

impl LenedaApiArgs {
    pub fn new_client(&self) -> Result<Api> {
        let default_interval_length = TimeDelta::from_std(self.default_interval_length.into())
            .context("the default interval length is out of range")?;
        Ok(Api::builder()
            .base_url(&self.base_url)
            .api_key(&self.api_key)
            .energy_id(&self.energy_id)
            .timeout(self.timeout.into())
            .default_interval_length(default_interval_length)
            .build())
    }
}
