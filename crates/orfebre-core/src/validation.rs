//! # Validation Module
//!
//! Input checks that run before any costing arithmetic.
//!
//! ## Why Validate Here?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NaN is contagious:                                                     │
//! │    weight = NaN  →  material = NaN  →  total = NaN  →  price = NaN     │
//! │                                                                         │
//! │  A negative weight silently produces a negative (cheaper!) piece.      │
//! │  A zero production volume turns the PCG into Infinity.                 │
//! │                                                                         │
//! │  Every public entry point rejects these inputs up front.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use orfebre_core::validation::{validate_non_negative, validate_fraction};
//!
//! assert!(validate_non_negative("weight_grams", 12.5).is_ok());
//! assert!(validate_non_negative("weight_grams", -1.0).is_err());
//! assert!(validate_fraction("tax_rate", 0.19).is_ok());
//! assert!(validate_fraction("tax_rate", 1.0).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::MetalLot;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates that a value is a finite number (not NaN, not ±∞).
pub fn validate_finite(field: &str, value: f64) -> ValidationResult<()> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

/// Validates a finite value that is zero or greater.
///
/// Used for weights, costs and prices where zero is meaningful
/// (a piece without enamel, a lot that is depleted).
pub fn validate_non_negative(field: &str, value: f64) -> ValidationResult<()> {
    validate_finite(field, value)?;

    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

/// Validates a finite value strictly greater than zero.
pub fn validate_positive(field: &str, value: f64) -> ValidationResult<()> {
    validate_finite(field, value)?;

    if value <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
            value,
        });
    }

    Ok(())
}

/// Validates a fraction in `[0, 1)`.
///
/// ## Rules
/// - Tax rate and profit margin are fractions (0.19 = 19%)
/// - A margin of 1.0 would divide by zero in the suggested price formula
pub fn validate_fraction(field: &str, value: f64) -> ValidationResult<()> {
    validate_finite(field, value)?;

    if !(0.0..1.0).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max: 1.0,
            value,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a metal lot snapshot.
///
/// ## Rules
/// - `id` must not be empty (it is the FIFO tie-break key)
/// - grams and price are finite and non-negative
/// - `grams_remaining <= grams_purchased`
pub fn validate_lot(lot: &MetalLot) -> ValidationResult<()> {
    if lot.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "lot.id".to_string(),
        });
    }

    validate_non_negative("lot.grams_purchased", lot.grams_purchased)?;
    validate_non_negative("lot.grams_remaining", lot.grams_remaining)?;
    validate_non_negative("lot.price_per_gram", lot.price_per_gram)?;

    if lot.grams_remaining > lot.grams_purchased {
        return Err(ValidationError::RemainingExceedsPurchased {
            lot_id: lot.id.clone(),
            remaining: lot.grams_remaining,
            purchased: lot.grams_purchased,
        });
    }

    Ok(())
}

/// Validates every lot in a snapshot, stopping at the first failure.
pub fn validate_lots(lots: &[MetalLot]) -> ValidationResult<()> {
    lots.iter().try_for_each(validate_lot)
}

// =============================================================================
// Unit Tests
// =============================================================================
