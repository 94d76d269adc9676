//! Integer money amounts
//!
//! Every balance, limit, threshold and tax amount in the engine is carried as
//! whole cents so that decades of compounding never accumulate floating-point drift.
//! Rates stay `f64`; multiplying by a rate goes through [`Cents::scale`], which
//! rounds once, half away from zero.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// An amount of money in minor currency units (cents)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Cents(pub i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    /// Build an amount from whole dollars
    #[must_use]
    pub const fn from_dollars(dollars: i64) -> Self {
        Cents(dollars * 100)
    }

    #[must_use]
    pub fn to_dollars(self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[must_use]
    pub fn as_f64(self) -> f64 {
        self.0 as f64
    }

    /// Multiply by a rate, rounding half away from zero
    #[must_use]
    pub fn scale(self, rate: f64) -> Self {
        Cents((self.0 as f64 * rate).round() as i64)
    }

    /// Multiply by `numerator / denominator` using integer-widened math.
    ///
    /// Returns zero when the denominator is not positive.
    #[must_use]
    pub fn pro_rata(self, numerator: Cents, denominator: Cents) -> Self {
        if denominator.0 <= 0 {
            return Cents::ZERO;
        }
        let wide = self.0 as i128 * numerator.0 as i128;
        let den = denominator.0 as i128;
        // round half away from zero
        let q = (2 * wide + den * wide.signum()) / (2 * den);
        Cents(q as i64)
    }

    #[must_use]
    pub fn max(self, other: Cents) -> Self {
        if self >= other { self } else { other }
    }

    #[must_use]
    pub fn min(self, other: Cents) -> Self {
        if self <= other { self } else { other }
    }

    /// Clamp negative amounts to zero
    #[must_use]
    pub fn non_negative(self) -> Self {
        self.max(Cents::ZERO)
    }

    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Ratio of two amounts, 0 when the denominator is not positive
    #[must_use]
    pub fn ratio(self, denominator: Cents) -> f64 {
        if denominator.0 <= 0 {
            0.0
        } else {
            self.0 as f64 / denominator.0 as f64
        }
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        *self = *self + rhs;
    }
}

impl Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Cents) {
        *self = *self - rhs;
    }
}

impl Neg for Cents {
    type Output = Cents;

    fn neg(self) -> Cents {
        Cents(self.0.saturating_neg())
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, |acc, c| acc + c)
    }
}

impl<'a> Sum<&'a Cents> for Cents {
    fn sum<I: Iterator<Item = &'a Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, |acc, c| acc + *c)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_rounds_half_away_from_zero() {
        assert_eq!(Cents(100_000).scale(0.07), Cents(7_000));
        assert_eq!(Cents(5).scale(0.5), Cents(3));
        assert_eq!(Cents(-5).scale(0.5), Cents(-3));
    }

    #[test]
    fn test_pro_rata() {
        // 10,000 * 3/4
        assert_eq!(Cents(10_000).pro_rata(Cents(3), Cents(4)), Cents(7_500));
        // 1/3 of 100 rounds to 33
        assert_eq!(Cents(100).pro_rata(Cents(1), Cents(3)), Cents(33));
        assert_eq!(Cents(100).pro_rata(Cents(1), Cents::ZERO), Cents::ZERO);
    }

    #[test]
    fn test_display() {
        assert_eq!(Cents(123_456).to_string(), "$1234.56");
        assert_eq!(Cents(-5).to_string(), "-$0.05");
    }
}
