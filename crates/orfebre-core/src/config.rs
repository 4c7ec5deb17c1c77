//! # Configuration Values
//!
//! Everything the costing math needs from "settings" is passed in explicitly
//! as one of these values. There is no ambient singleton: a test can build a
//! `GlobalConfig` inline and get a fully deterministic result.
//!
//! ## What Lives Where
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GlobalConfig    (stored record, edited by the owner)                   │
//! │  ├── exchange_rate              COP per USD                             │
//! │  ├── tax_rate                   0.19                                    │
//! │  ├── profit_margin              0.15                                    │
//! │  └── grams_produced_per_month   509                                     │
//! │                                                                         │
//! │  FallbackPolicy  (deployment defaults for degraded mode)                │
//! │  ├── gold_usd_per_ounce         2000                                    │
//! │  ├── silver_usd_per_ounce       30                                      │
//! │  ├── exchange_rate              4000                                    │
//! │  └── grams_produced_per_month   509                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::MetalType;
use crate::validation::{validate_fraction, validate_positive, ValidationResult};

// =============================================================================
// Rate
// =============================================================================

/// A fraction in `[0, 1)` such as a tax rate or a profit margin.
///
/// ## Why a Newtype?
/// 0.19 and 19.0 are both plausible "tax" inputs. Construction goes through
/// [`Rate::new`], which rejects anything outside `[0, 1)`, so a percentage
/// can never be mistaken for a fraction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, TS)]
#[serde(try_from = "f64", into = "f64")]
#[ts(export)]
pub struct Rate(f64);

impl Rate {
    /// Creates a rate from a fraction (0.19 = 19%).
    pub fn new(fraction: f64) -> ValidationResult<Self> {
        validate_fraction("rate", fraction)?;
        Ok(Rate(fraction))
    }

    /// Creates a rate from basis points (1900 = 19%).
    pub fn from_bps(bps: u32) -> ValidationResult<Self> {
        Rate::new(f64::from(bps) / 10_000.0)
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0.0)
    }

    /// Returns the rate as a fraction.
    #[inline]
    pub const fn fraction(&self) -> f64 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 * 100.0
    }
}

impl TryFrom<f64> for Rate {
    type Error = crate::error::ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rate::new(value)
    }
}

impl From<Rate> for f64 {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Global Config
// =============================================================================

/// Default tax rate applied when no configuration record exists.
pub const DEFAULT_TAX_RATE: f64 = 0.19;

/// Default profit margin applied when no configuration record exists.
pub const DEFAULT_PROFIT_MARGIN: f64 = 0.15;

/// Workshop-wide settings record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GlobalConfig {
    /// Local-currency units per USD.
    pub exchange_rate: f64,
    pub tax_rate: Rate,
    pub profit_margin: Rate,
    /// Denominator of the overhead allocation.
    pub grams_produced_per_month: f64,
}

impl GlobalConfig {
    /// Checks that the record can drive a computation.
    ///
    /// ## Rules
    /// - `exchange_rate > 0`
    /// - `grams_produced_per_month > 0` (it divides the overhead)
    pub fn validate(&self) -> CoreResult<()> {
        validate_positive("exchange_rate", self.exchange_rate)
            .map_err(|e| CoreError::configuration("exchange_rate", e.to_string()))?;
        validate_positive("grams_produced_per_month", self.grams_produced_per_month)
            .map_err(|e| CoreError::configuration("grams_produced_per_month", e.to_string()))?;
        Ok(())
    }
}

impl Default for GlobalConfig {
    /// The workshop's reference settings.
    fn default() -> Self {
        GlobalConfig {
            exchange_rate: 4000.0,
            tax_rate: Rate(DEFAULT_TAX_RATE),
            profit_margin: Rate(DEFAULT_PROFIT_MARGIN),
            grams_produced_per_month: 509.0,
        }
    }
}

// =============================================================================
// Fallback Policy
// =============================================================================

/// Substitute values used when live data or configuration is missing.
///
/// These numbers have no documented provenance: they are "never compute a
/// zero-cost piece" guards. Every substitution is tagged in the result and
/// logged, and deployments can override them (see `orfebre-db` `AppConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FallbackPolicy {
    pub gold_usd_per_ounce: f64,
    pub silver_usd_per_ounce: f64,
    /// Used when neither a live quote nor a configured rate exists.
    pub exchange_rate: f64,
    /// Used when the global configuration record is absent.
    pub grams_produced_per_month: f64,
}

impl FallbackPolicy {
    /// Fallback USD per troy ounce for a metal.
    pub const fn metal_price(&self, metal: MetalType) -> f64 {
        match metal {
            MetalType::Gold => self.gold_usd_per_ounce,
            MetalType::Silver => self.silver_usd_per_ounce,
        }
    }

    /// Rejects non-positive substitutes, which would defeat their purpose.
    pub fn validate(&self) -> CoreResult<()> {
        for (field, value) in [
            ("fallback.gold_usd_per_ounce", self.gold_usd_per_ounce),
            ("fallback.silver_usd_per_ounce", self.silver_usd_per_ounce),
            ("fallback.exchange_rate", self.exchange_rate),
            ("fallback.grams_produced_per_month", self.grams_produced_per_month),
        ] {
            validate_positive(field, value)
                .map_err(|e| CoreError::configuration(field, e.to_string()))?;
        }
        Ok(())
    }
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        FallbackPolicy {
            gold_usd_per_ounce: 2000.0,
            silver_usd_per_ounce: 30.0,
            exchange_rate: 4000.0,
            grams_produced_per_month: 509.0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
