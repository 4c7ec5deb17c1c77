//! # Derived Pricing
//!
//! Sale price, discount ceiling and profit attribution, all derived from a
//! piece's total cost. None of these feed back into the cost itself.
//!
//! ```text
//!   total ──► ÷ (1 − margin) ──► × (1 + tax) ──► suggested price
//!                                    │
//!   breakeven = total × (1 + tax) ◄──┘  (price at which margin is zero)
//!
//!   max discount % = (suggested − breakeven) / suggested × 100
//! ```
//!
//! Results are rounded to whole currency units here, at the very end, and
//! nowhere earlier.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::config::{GlobalConfig, Rate, DEFAULT_PROFIT_MARGIN, DEFAULT_TAX_RATE};
use crate::error::CoreResult;
use crate::money::Money;
use crate::validation::{validate_finite, validate_non_negative};

/// Share of gross profit owed to whoever supplied the metal, when the maker
/// did not own it.
pub const SUPPLIER_PROFIT_SHARE: f64 = 0.5;

// =============================================================================
// Suggested Price
// =============================================================================

/// Recommended sale price and how far it can be marked down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceSuggestion {
    pub suggested_price: Money,
    /// Largest markdown (percent, one decimal) that still covers cost and tax.
    pub max_discount_percent: f64,
    /// `total × (1 + tax)`, rounded.
    pub breakeven_price: Money,
}

/// Computes the suggested price and discount ceiling for a total cost.
///
/// The discount ceiling is computed from the unrounded price so that the
/// whole-unit rounding of the displayed price does not leak into it.
///
/// ## Example
/// ```rust
/// use orfebre_core::pricing::suggested_pricing;
/// use orfebre_core::Rate;
///
/// let s = suggested_pricing(100_000.0, Rate::new(0.15).unwrap(), Rate::new(0.19).unwrap()).unwrap();
/// assert_eq!(s.suggested_price.units(), 140_000);
/// assert_eq!(s.max_discount_percent, 15.0);
/// ```
pub fn suggested_pricing(total_cost: f64, margin: Rate, tax: Rate) -> CoreResult<PriceSuggestion> {
    validate_non_negative("total_cost", total_cost)?;

    let tax_factor = 1.0 + tax.fraction();
    let suggested = (total_cost / (1.0 - margin.fraction())) * tax_factor;
    let breakeven = total_cost * tax_factor;

    let max_discount_percent = if suggested > 0.0 {
        round_to_tenth(((suggested - breakeven) / suggested) * 100.0)
    } else {
        0.0
    };

    debug!(total_cost, suggested, max_discount_percent, "Derived sale price");

    Ok(PriceSuggestion {
        suggested_price: Money::round_from(suggested)?,
        max_discount_percent,
        breakeven_price: Money::round_from(breakeven)?,
    })
}

/// [`suggested_pricing`] with margin and tax taken from the configuration,
/// or 15% / 19% when there is none.
pub fn suggested_pricing_with(
    total_cost: f64,
    config: Option<&GlobalConfig>,
) -> CoreResult<PriceSuggestion> {
    let (margin, tax) = match config {
        Some(config) => (config.profit_margin, config.tax_rate),
        None => (Rate::new(DEFAULT_PROFIT_MARGIN)?, Rate::new(DEFAULT_TAX_RATE)?),
    };
    suggested_pricing(total_cost, margin, tax)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// =============================================================================
// Profit Split
// =============================================================================

/// Attribution of a sale's gross profit.
///
/// `supplier_share + maker_share == gross_profit` always holds exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProfitSplit {
    pub gross_profit: Money,
    pub supplier_share: Money,
    pub maker_share: Money,
}

/// Splits the gross profit of a sale.
///
/// When `owns_metal` is false the metal supplier takes half of the gross
/// profit; otherwise the maker keeps all of it. A sale below cost yields a
/// negative profit, split the same way.
///
/// ## Example
/// ```rust
/// use orfebre_core::pricing::profit_split;
///
/// let split = profit_split(300_000.0, 200_001.0, false).unwrap();
/// assert_eq!(split.gross_profit.units(), 99_999);
/// assert_eq!(split.supplier_share.units(), 50_000);
/// assert_eq!(split.maker_share.units(), 49_999);
/// ```
pub fn profit_split(sale_price: f64, total_cost: f64, owns_metal: bool) -> CoreResult<ProfitSplit> {
    validate_non_negative("sale_price", sale_price)?;
    validate_finite("total_cost", total_cost)?;

    let gross = sale_price - total_cost;
    let supplier = if owns_metal {
        0.0
    } else {
        gross * SUPPLIER_PROFIT_SHARE
    };

    let gross_profit = Money::round_from(gross)?;
    let supplier_share = Money::round_from(supplier)?;

    Ok(ProfitSplit {
        gross_profit,
        supplier_share,
        maker_share: gross_profit - supplier_share,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
