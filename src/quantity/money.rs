use std::fmt::{Debug, Display, Formatter};

use crate::quantity::Quantity;

/// Amount in euro.
pub type Cost = Quantity<0, 0, 1>;

impl Cost {
    /// VAT on top of the amount.
    pub fn vat(self, vat_rate: f64) -> Self {
        self * vat_rate
    }
}

impl Display for Cost {
    /// Invoice notation, for example `25.92 EUR`.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} EUR", self.0)
    }
}

impl Debug for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "€{:.4}", self.0)
    }
}

/// Euro per kilowatt-hour, tariffs are quoted to a tenth of a cent.
pub type KilowattHourRate = Quantity<-1, -1, 1>;

impl Display for KilowattHourRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3} €/kWh", self.0)
    }
}

impl Debug for KilowattHourRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "€{:.4}/kWh", self.0)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Cost::from(25.92).to_string(), "25.92 EUR");
        assert_eq!(KilowattHourRate::from(0.1).to_string(), "0.100 €/kWh");
    }

    #[test]
    fn test_vat() {
        assert_abs_diff_eq!(Cost::from(2.0).vat(0.08).0, 0.16);
    }
}
