pub mod energy;
pub mod money;
pub mod power;

use std::ops::{Div, Mul};

use serde::{Deserialize, Serialize};

/// Physical quantity tagged with its dimensions: power (kW), time (h) and cost (€).
#[derive(
    Clone,
    Copy,
    Deserialize,
    PartialEq,
    PartialOrd,
    Serialize,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::From,
    derive_more::FromStr,
    derive_more::Neg,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Sum,
)]
#[must_use]
pub struct Quantity<const POWER: isize, const TIME: isize, const COST: isize>(pub f64);

impl<const POWER: isize, const TIME: isize, const COST: isize> Quantity<POWER, TIME, COST> {
    pub const ZERO: Self = Self(0.0);

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }
}

impl<const POWER: isize, const TIME: isize, const COST: isize> Mul<f64>
    for Quantity<POWER, TIME, COST>
{
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl<const POWER: isize, const TIME: isize, const COST: isize> Div<f64>
    for Quantity<POWER, TIME, COST>
{
    type Output = Self;

    fn div(self, rhs: f64) -> Self::Output {
        Self(self.0 / rhs)
    }
}

impl<const POWER: isize, const TIME: isize, const COST: isize> Div<Self>
    for Quantity<POWER, TIME, COST>
{
    type Output = f64;

    fn div(self, rhs: Self) -> Self::Output {
        self.0 / rhs.0
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::{Debug, Formatter};

    use approx::assert_abs_diff_eq;

    use super::*;

    pub type Bare = Quantity<0, 0, 0>;

    impl Debug for Bare {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self.0)
        }
    }

    #[test]
    fn test_sum() {
        let total: Bare = [Bare::from(1.0), Bare::from(2.5)].into_iter().sum();
        assert_eq!(total, Bare::from(3.5));
    }

    #[test]
    fn test_ratio() {
        assert_abs_diff_eq!(Bare::from(20.0) / Bare::from(100.0), 0.2);
    }
}
