use std::{fmt::Debug, fs, path::Path};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{billing::mode::BillingMode, prelude::*, quantity::money::KilowattHourRate};

/// Contents of the sites file.
#[derive(Deserialize)]
pub struct SitesFile {
    /// Invoice sender, required only when generating invoices.
    #[serde(default)]
    pub issuer: Option<Issuer>,

    #[serde(default)]
    pub codes: ObisCodes,

    #[serde(default, rename = "site")]
    pub sites: Vec<SiteConfig>,
}

impl SitesFile {
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn read_from<P: AsRef<Path> + Debug>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let sites_file: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse `{}`", path.display()))?;
        info!(n_sites = sites_file.sites.len(), "loaded");
        Ok(sites_file)
    }
}

/// OBIS codes of the measurements the billing needs.
#[derive(Clone, Debug, Deserialize)]
pub struct ObisCodes {
    /// Measured active production.
    #[serde(default = "ObisCodes::default_production")]
    pub production: String,

    /// Production remaining after sharing, that is injected into the grid.
    #[serde(default = "ObisCodes::default_remaining_after_sharing")]
    pub remaining_after_sharing: String,
}

impl ObisCodes {
    fn default_production() -> String {
        "1-1:2.29.0".to_owned()
    }

    fn default_remaining_after_sharing() -> String {
        "1-65:2.29.9".to_owned()
    }
}

impl Default for ObisCodes {
    fn default() -> Self {
        Self {
            production: Self::default_production(),
            remaining_after_sharing: Self::default_remaining_after_sharing(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SiteConfig {
    pub name: String,

    /// Metering point identifier.
    pub pod: String,

    /// Installed peak capacity in kWp.
    pub capacity_kwp: f64,

    pub mode: BillingMode,

    /// Self-consumption price before VAT.
    pub tariff: KilowattHourRate,

    /// VAT rate as a fraction, for example `0.08`.
    pub vat_rate: f64,

    /// Later VAT rates, each effective from its date on.
    #[serde(default)]
    pub vat_changes: Vec<VatChange>,

    /// Invoice recipient, one address line per item.
    #[serde(default)]
    pub recipient: Vec<String>,

    /// Invoice sequence number, the site's 1-based position by default.
    #[serde(default)]
    pub invoice_sequence: Option<u32>,
}

impl SiteConfig {
    /// VAT rate applicable on the billing date.
    #[must_use]
    pub fn vat_rate_at(&self, date: NaiveDate) -> f64 {
        self.vat_changes
            .iter()
            .filter(|change| change.since <= date)
            .max_by_key(|change| change.since)
            .map_or(self.vat_rate, |change| change.rate)
    }
}

#[derive(Copy, Clone, Debug, Deserialize)]
pub struct VatChange {
    pub since: NaiveDate,
    pub rate: f64,
}

/// Invoice sender.
#[derive(Clone, Debug, Deserialize)]
pub struct Issuer {
    pub name: String,

    /// Address lines.
    #[serde(default)]
    pub address: Vec<String>,

    #[serde(default)]
    pub contact: Option<String>,

    pub vat_number: String,
    pub bank_account: String,

    /// VAT rate as printed on the invoices.
    #[serde(default = "Issuer::default_vat_display")]
    pub vat_display: String,
}

impl Issuer {
    fn default_vat_display() -> String {
        "8 %".to_owned()
    }
}
