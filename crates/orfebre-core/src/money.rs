//! # Money Module
//!
//! Whole-unit currency amounts for FINAL outputs only.
//!
//! ## When Do We Round?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Intermediate math (f64, never rounded)                                 │
//! │    material = 10 g × 3 858.08 COP/g = 38 580.8…                         │
//! │    overhead = 10 g × 2 000            = 20 000                           │
//! │    total    = 208 580.8…                                                │
//! │                                                                         │
//! │  Final step (Money, whole COP)                                          │
//! │    suggested price, profit split  →  Money::round_from(x)              │
//! │                                                                         │
//! │  Rounding early and then summing drifts by up to 0.5 per component.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The local currency (COP) has no minor unit in practice, so one `Money`
//! unit is one peso.
//!
//! ## Usage
//! ```rust
//! use orfebre_core::money::Money;
//!
//! let price = Money::round_from(288_020.4).unwrap();
//! assert_eq!(price.units(), 288_020);
//! assert_eq!(price.to_string(), "$ 288.020");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{validate_finite, ValidationResult};

/// Smallest and (exclusive) largest amounts that fit the `i64` backing.
const MIN_UNITS: f64 = i64::MIN as f64;
const MAX_UNITS: f64 = -(i64::MIN as f64);

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in whole local-currency units.
///
/// ## Design Decisions
/// - **i64 (signed)**: gross profit can be negative when selling below cost
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Only built by rounding at the end**: see [`Money::round_from`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole units.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Rounds a computed amount to the nearest whole unit.
    ///
    /// Halves round away from zero (`0.5 → 1`, `-0.5 → -1`). NaN,
    /// infinities and amounts beyond the `i64` range are rejected.
    ///
    /// ## Example
    /// ```rust
    /// use orfebre_core::money::Money;
    ///
    /// assert_eq!(Money::round_from(10.5).unwrap().units(), 11);
    /// assert_eq!(Money::round_from(-10.5).unwrap().units(), -11);
    /// assert!(Money::round_from(f64::NAN).is_err());
    /// assert!(Money::round_from(1e19).is_err());
    /// ```
    pub fn round_from(amount: f64) -> ValidationResult<Self> {
        validate_finite("amount", amount)?;

        let rounded = amount.round();
        if !(MIN_UNITS..MAX_UNITS).contains(&rounded) {
            return Err(ValidationError::OutOfRange {
                field: "amount".to_string(),
                min: MIN_UNITS,
                max: MAX_UNITS,
                value: amount,
            });
        }

        Ok(Money(rounded as i64))
    }

    /// Returns the value in whole units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns the value as a float for further arithmetic.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Formats like the admin UI: `$ 1.500.000`, dot as thousands separator,
/// no decimals.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}$ {}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_from() {
        assert_eq!(Money::round_from(0.0).unwrap(), Money::zero());
        assert_eq!(Money::round_from(99.49).unwrap().units(), 99);
        assert_eq!(Money::round_from(99.5).unwrap().units(), 100);
        assert_eq!(Money::round_from(-3.2).unwrap().units(), -3);
        assert!(Money::round_from(f64::INFINITY).is_err());
    }

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Money::from_units(1000).to_string(), "$ 1.000");
        assert_eq!(Money::from_units(1_500_000).to_string(), "$ 1.500.000");
        assert_eq!(Money::from_units(0).to_string(), "$ 0");
        assert_eq!(Money::from_units(999).to_string(), "$ 999");
        assert_eq!(Money::from_units(-25_000).to_string(), "-$ 25.000");
    }

    #[test]
    fn test_subtraction() {
        let a = Money::from_units(1200);
        let b = Money::from_units(200);
        assert_eq!((a - b).units(), 1000);
        assert_eq!((b - a).units(), -1000);
    }

    #[test]
    fn test_round_from_rejects_amounts_beyond_i64() {
        assert!(matches!(
            Money::round_from(1e19),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(Money::round_from(-1e19).is_err());
        assert!(Money::round_from(9.3e18).is_err());
        assert_eq!(Money::round_from(9.2e18).unwrap().units(), 9_200_000_000_000_000_000);
    }
}
