//! # Unit Conversions
//!
//! Physical constants and the purchase-unit table shared by the FIFO and
//! costing modules.
//!
//! ## Two Different Ounces
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Troy ounce        31.1034768 g   precious-metal market quotes (XAU)   │
//! │  Avoirdupois oz    28.3495 g      enamel / consumables packaging        │
//! │                                                                         │
//! │  Market quote (USD / troy oz) ──► ÷ 31.1034768 ──► × COP/USD ──► COP/g │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use crate::error::CoreResult;
use crate::validation::{validate_non_negative, validate_positive};

/// Grams in one troy ounce. Exact by definition; never round it.
pub const GRAMS_PER_TROY_OUNCE: f64 = 31.1034768;

/// Grams in one avoirdupois ounce, as used on consumable packaging.
pub const GRAMS_PER_OUNCE: f64 = 28.3495;

/// Purchase units and their size in grams.
///
/// Includes the literal package sizes enamel is sold in.
const UNIT_TO_GRAMS: &[(&str, f64)] = &[
    ("kg", 1000.0),
    ("g", 1.0),
    ("20g", 20.0),
    ("30g", 30.0),
    ("1oz", GRAMS_PER_OUNCE),
    ("oz", GRAMS_PER_OUNCE),
];

/// Returns the grams-per-unit factor for a purchase unit.
///
/// Lookup is case-insensitive. An unknown unit returns `1.0`: the quantity
/// is taken to already be in grams. This is a permissive fallback so that a
/// typo in a supplier form does not block data entry; it is logged at debug
/// level rather than reported as an error.
pub fn unit_factor(unit: &str) -> f64 {
    let key = unit.trim().to_lowercase();

    match UNIT_TO_GRAMS.iter().find(|(name, _)| *name == key) {
        Some((_, factor)) => *factor,
        None => {
            debug!(unit = %unit, "Unknown purchase unit, treating quantity as grams");
            1.0
        }
    }
}

/// Converts a quantity in a purchase unit to grams.
///
/// ## Example
/// ```rust
/// use orfebre_core::units::grams_for;
///
/// assert_eq!(grams_for(2.0, "kg"), 2000.0);
/// assert_eq!(grams_for(3.0, "20g"), 60.0);
/// assert_eq!(grams_for(5.0, "bolsa"), 5.0); // unknown unit passes through
/// ```
pub fn grams_for(quantity: f64, unit: &str) -> f64 {
    quantity * unit_factor(unit)
}

/// Unit cost per gram of a consumable bought in some unit.
///
/// `purchase_price / grams_for(quantity, unit)`; a purchase that resolves to
/// zero grams is rejected instead of producing `Infinity`.
///
/// ## Example
/// ```rust
/// use orfebre_core::units::price_per_gram;
///
/// // A 30 g jar of enamel bought for 45 000
/// assert_eq!(price_per_gram(45_000.0, 1.0, "30g").unwrap(), 1_500.0);
/// ```
pub fn price_per_gram(purchase_price: f64, quantity: f64, unit: &str) -> CoreResult<f64> {
    validate_non_negative("purchase_price", purchase_price)?;
    validate_non_negative("quantity", quantity)?;

    let grams = grams_for(quantity, unit);
    validate_positive("grams", grams)?;

    Ok(purchase_price / grams)
}

/// Converts a USD-per-troy-ounce quote into local currency per gram.
///
/// `(usd_per_troy_ounce / 31.1034768) × exchange_rate`
#[inline]
pub fn local_price_per_gram(usd_per_troy_ounce: f64, exchange_rate: f64) -> f64 {
    (usd_per_troy_ounce / GRAMS_PER_TROY_OUNCE) * exchange_rate
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_table() {
        assert_eq!(unit_factor("kg"), 1000.0);
        assert_eq!(unit_factor("KG"), 1000.0);
        assert_eq!(unit_factor(" g "), 1.0);
        assert_eq!(unit_factor("oz"), 28.3495);
        assert_eq!(unit_factor("1oz"), 28.3495);
        assert_eq!(unit_factor("30g"), 30.0);
    }

    #[test]
    fn test_unknown_unit_passes_through() {
        assert_eq!(unit_factor("frasco"), 1.0);
        assert_eq!(grams_for(7.5, ""), 7.5);
    }

    #[test]
    fn test_price_per_gram() {
        assert_eq!(price_per_gram(100_000.0, 1.0, "kg").unwrap(), 100.0);
        let per_gram = price_per_gram(28_349.5, 1.0, "oz").unwrap();
        assert!((per_gram - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_per_gram_rejects_zero_grams() {
        assert!(price_per_gram(1000.0, 0.0, "g").is_err());
        assert!(price_per_gram(1000.0, -1.0, "g").is_err());
        assert!(price_per_gram(f64::NAN, 1.0, "g").is_err());
    }

    #[test]
    fn test_local_price_per_gram() {
        let cop = local_price_per_gram(GRAMS_PER_TROY_OUNCE, 4000.0);
        assert!((cop - 4000.0).abs() < 1e-9);

        // 30 USD/oz silver at 4000 COP/USD ≈ 3858 COP/g
        let silver = local_price_per_gram(30.0, 4000.0);
        assert!((silver - 3858.0).abs() < 1.0);
    }
}
