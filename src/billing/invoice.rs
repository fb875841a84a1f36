use bon::bon;
use chrono::{Months, NaiveDate};
use itertools::Itertools;

use crate::{
    billing::summary::MonthlyRecord,
    config::{Issuer, SiteConfig},
    prelude::*,
    quantity::money::Cost,
};

/// Amounts due for a billing period.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct InvoiceTotals {
    pub pre_vat: Cost,
    pub vat: Cost,
    pub total: Cost,

    /// First day of the earliest month.
    pub since: NaiveDate,

    /// Last day of the latest month.
    pub until: NaiveDate,
}

impl InvoiceTotals {
    /// Sum the monthly bills. Months with undefined amounts are skipped.
    #[instrument(skip_all, fields(n_months = records.len()))]
    pub fn extract(records: &[MonthlyRecord]) -> Result<Self> {
        let (earliest, latest) = records
            .iter()
            .map(|record| record.month)
            .minmax()
            .into_option()
            .context("no monthly records")?;

        let mut totals = Self {
            pre_vat: Cost::ZERO,
            vat: Cost::ZERO,
            total: Cost::ZERO,
            since: earliest.first_day().context("invalid earliest month")?,
            until: latest.last_day().context("invalid latest month")?,
        };
        for record in records {
            let billing = record.billing;
            let (Some(pre_vat), Some(vat), Some(total)) =
                (billing.pre_vat, billing.vat_amount, billing.total)
            else {
                warn!(month = %record.month, "undefined amounts, skipping");
                continue;
            };
            totals.pre_vat += pre_vat;
            totals.vat += vat;
            totals.total += total;
        }
        Ok(totals)
    }
}

/// Finalized invoice of one site.
#[must_use]
#[derive(Clone, Debug)]
pub struct Invoice {
    pub issuer: Issuer,
    pub recipient: Vec<String>,

    /// Metering point the invoice refers to.
    pub pod: String,

    pub number: String,
    pub issue_date: NaiveDate,
    pub totals: InvoiceTotals,
    pub payment_deadline: NaiveDate,
}

#[bon]
impl Invoice {
    /// Assemble the invoice.
    ///
    /// The number is `YYYY-MM-<sequence>` after the issue date,
    /// and the payment is due a calendar month after the issue.
    #[builder]
    pub fn new(
        issuer: Issuer,
        site: &SiteConfig,
        sequence: u32,
        totals: InvoiceTotals,
        issue_date: NaiveDate,
    ) -> Self {
        Self {
            issuer,
            recipient: site.recipient.clone(),
            pod: site.pod.clone(),
            number: format!("{}-{sequence}", issue_date.format("%Y-%m")),
            issue_date,
            totals,
            payment_deadline: issue_date
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{
        billing::{
            mode::{Billing, BillingMode},
            period::YearMonth,
        },
        quantity::{energy::KilowattHours, money::KilowattHourRate},
    };

    fn record(year: i32, month: u32, self_consumption: Option<f64>) -> MonthlyRecord {
        let mode = BillingMode::Autoconsumption;
        let tariff = KilowattHourRate::from(0.10);
        let flows = mode.flows(
            self_consumption.map(|_| KilowattHours::from(100.0)),
            self_consumption.map(|energy| KilowattHours::from(100.0 - energy)),
        );
        MonthlyRecord {
            month: YearMonth::new(year, month),
            flows,
            self_consumption_ratio: mode.self_consumption_ratio(&flows),
            tariff,
            vat_rate: Some(0.08),
            billing: Billing::derive(flows.self_consumption, tariff, Some(0.08)),
        }
    }

    fn issuer() -> Issuer {
        Issuer {
            name: "Energy Cooperative".to_owned(),
            address: vec!["1 Main Street".to_owned()],
            contact: None,
            vat_number: "LU00000000".to_owned(),
            bank_account: "IBAN: LU00".to_owned(),
            vat_display: "8 %".to_owned(),
        }
    }

    #[test]
    fn test_extract_totals() -> Result {
        let records =
            [record(2024, 3, Some(20.0)), record(2024, 1, Some(20.0)), record(2024, 2, None)];
        let totals = InvoiceTotals::extract(&records)?;
        assert_abs_diff_eq!(totals.pre_vat.0, 4.0);
        assert_abs_diff_eq!(totals.vat.0, 0.32);
        assert_abs_diff_eq!(totals.total.0, 4.32, epsilon = 1e-12);
        assert_eq!(totals.since, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(totals.until, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        Ok(())
    }

    #[test]
    fn test_extract_empty() {
        assert!(InvoiceTotals::extract(&[]).is_err());
    }

    #[test]
    fn test_invoice_number_and_deadline() -> Result {
        let site: SiteConfig = toml::from_str(
            r#"
                name = "School"
                pod = "LU0001"
                capacity_kwp = 30.0
                mode = "autoconsumption"
                tariff = 0.1
                vat_rate = 0.08
            "#,
        )?;
        let invoice = Invoice::builder()
            .issuer(issuer())
            .site(&site)
            .sequence(3)
            .totals(InvoiceTotals::extract(&[record(2024, 12, Some(20.0))])?)
            .issue_date(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap())
            .build();
        assert_eq!(invoice.number, "2025-01-3");
        assert_eq!(invoice.payment_deadline, NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(invoice.pod, "LU0001");
        Ok(())
    }
}
