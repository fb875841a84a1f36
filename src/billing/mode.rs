use serde::Deserialize;

use crate::{
    billing::{
        period::Granularity,
        reading::Measurement,
        report::Rendering,
        rollup::RuleSet,
        table::Column,
    },
    quantity::{
        energy::KilowattHours,
        money::{Cost, KilowattHourRate},
    },
};

/// How a site's production is billed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingMode {
    /// Self-consumed energy is billed: production minus what remains for the grid.
    Autoconsumption,

    /// All production is injected into the grid, nothing is self-consumed.
    Injection,
}

impl BillingMode {
    /// Measurements to fetch.
    #[must_use]
    pub const fn measurements(self) -> &'static [Measurement] {
        match self {
            Self::Autoconsumption => &[Measurement::Production, Measurement::RemainingAfterSharing],
            Self::Injection => &[Measurement::Production],
        }
    }

    /// Derive the monthly energy flows from the measured totals.
    pub fn flows(
        self,
        production: Option<KilowattHours>,
        remaining_after_sharing: Option<KilowattHours>,
    ) -> EnergyFlows {
        match self {
            Self::Autoconsumption => EnergyFlows {
                production,
                grid_injection: remaining_after_sharing,
                self_consumption: production
                    .zip(remaining_after_sharing)
                    .map(|(production, remaining)| production - remaining),
            },
            Self::Injection => EnergyFlows {
                production,
                grid_injection: production,
                self_consumption: Some(KilowattHours::ZERO),
            },
        }
    }

    /// Self-consumed share of the production, [`None`] when undefined.
    #[must_use]
    pub fn self_consumption_ratio(self, flows: &EnergyFlows) -> Option<f64> {
        match self {
            Self::Autoconsumption => {
                let (self_consumption, production) = flows.self_consumption.zip(flows.production)?;
                (!production.is_zero()).then(|| self_consumption / production)
            }
            Self::Injection => Some(0.0),
        }
    }

    #[must_use]
    pub const fn schema(self) -> &'static [Column] {
        const INJECTION: [Column; 5] = [
            Column::Year,
            Column::Quarter,
            Column::Month,
            Column::Production,
            Column::GridInjection,
        ];
        const FULL: [Column; 12] = [
            Column::Year,
            Column::Quarter,
            Column::Month,
            Column::Production,
            Column::GridInjection,
            Column::SelfConsumption,
            Column::SelfConsumptionRatio,
            Column::Tariff,
            Column::PreVatBill,
            Column::VatRate,
            Column::VatAmount,
            Column::TotalBill,
        ];
        match self {
            Self::Autoconsumption => &FULL,
            Self::Injection => &INJECTION,
        }
    }

    pub fn rules(self, granularity: Granularity) -> RuleSet {
        match self {
            Self::Autoconsumption => RuleSet::autoconsumption(granularity),
            Self::Injection => RuleSet::injection(granularity),
        }
    }

    pub const fn rendering(self) -> Rendering {
        match self {
            Self::Autoconsumption => Rendering::Full,
            Self::Injection => Rendering::InjectionOnly,
        }
    }
}

/// Monthly energy flows of a site. [`None`] is undefined: the measurement is unavailable.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EnergyFlows {
    pub production: Option<KilowattHours>,
    pub grid_injection: Option<KilowattHours>,
    pub self_consumption: Option<KilowattHours>,
}

/// Monetary part of a monthly record, the same for both billing modes.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Billing {
    pub pre_vat: Option<Cost>,
    pub vat_amount: Option<Cost>,
    pub total: Option<Cost>,
}

impl Billing {
    pub fn derive(
        self_consumption: Option<KilowattHours>,
        tariff: KilowattHourRate,
        vat_rate: Option<f64>,
    ) -> Self {
        let pre_vat = self_consumption.map(|self_consumption| self_consumption * tariff);
        let vat_amount = pre_vat.zip(vat_rate).map(|(pre_vat, vat_rate)| pre_vat.vat(vat_rate));
        let total = pre_vat.zip(vat_amount).map(|(pre_vat, vat_amount)| pre_vat + vat_amount);
        Self { pre_vat, vat_amount, total }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_autoconsumption_flows() {
        let mode = BillingMode::Autoconsumption;
        let flows =
            mode.flows(Some(KilowattHours::from(100.0)), Some(KilowattHours::from(80.0)));
        assert_eq!(flows.self_consumption, Some(KilowattHours::from(20.0)));
        assert_eq!(mode.self_consumption_ratio(&flows), Some(0.2));
    }

    #[test]
    fn test_autoconsumption_missing_remaining() {
        let mode = BillingMode::Autoconsumption;
        let flows = mode.flows(Some(KilowattHours::from(100.0)), None);
        assert_eq!(flows.production, Some(KilowattHours::from(100.0)));
        assert_eq!(flows.self_consumption, None);
        assert_eq!(mode.self_consumption_ratio(&flows), None);
    }

    #[test]
    fn test_zero_production_ratio_is_undefined() {
        let mode = BillingMode::Autoconsumption;
        let flows = mode.flows(Some(KilowattHours::ZERO), Some(KilowattHours::ZERO));
        assert_eq!(mode.self_consumption_ratio(&flows), None);
    }

    #[test]
    fn test_injection_flows() {
        let mode = BillingMode::Injection;
        let flows = mode.flows(Some(KilowattHours::from(50.0)), None);
        assert_eq!(flows.grid_injection, Some(KilowattHours::from(50.0)));
        assert_eq!(flows.self_consumption, Some(KilowattHours::ZERO));
        assert_eq!(mode.self_consumption_ratio(&flows), Some(0.0));
    }

    #[test]
    fn test_billing() {
        let billing = Billing::derive(
            Some(KilowattHours::from(20.0)),
            KilowattHourRate::from(0.10),
            Some(0.08),
        );
        assert_abs_diff_eq!(billing.pre_vat.unwrap().0, 2.0);
        assert_abs_diff_eq!(billing.vat_amount.unwrap().0, 0.16);
        assert_abs_diff_eq!(billing.total.unwrap().0, 2.16);
    }

    #[test]
    fn test_billing_undefined_self_consumption() {
        let billing = Billing::derive(None, KilowattHourRate::from(0.10), Some(0.08));
        assert_eq!(billing.total, None);
    }
}
