//! # Error Types
//!
//! Domain-specific error types for orfebre-core.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Taxonomy                                  │
//! │                                                                         │
//! │  Informational shortfall  → ConsumptionResult.remaining_shortage (data) │
//! │  Fallback substitution    → CostBreakdown sources (data + warn! log)    │
//! │  Caller-input errors      → THIS FILE                                  │
//! │  ├── ValidationError      - negative / NaN / out-of-range input        │
//! │  └── CoreError            - wraps validation, adds configuration errors │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError (orfebre-db)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Insufficient stock is never an error here: the engine reports it and the
//! caller decides.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core costing errors.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// Configuration values that make a computation meaningless.
    ///
    /// ## When This Occurs
    /// - `grams_produced_per_month` is zero or negative (PCG would be infinite)
    /// - A fallback price in [`crate::FallbackPolicy`] is not positive
    #[error("Invalid configuration for {field}: {reason}")]
    Configuration { field: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a Configuration error.
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any arithmetic runs so that NaN or negative weights never
/// leak into a cost figure.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value is NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NotFinite { field: String, value: f64 },

    /// Value must not be negative.
    #[error("{field} must not be negative, got {value}")]
    Negative { field: String, value: f64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive, got {value}")]
    MustBePositive { field: String, value: f64 },

    /// Numeric value is out of range.
    #[error("{field} must be in [{min}, {max}), got {value}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    /// A lot claims more grams remaining than were purchased.
    #[error("lot {lot_id} has {remaining} g remaining but only {purchased} g purchased")]
    RemainingExceedsPurchased {
        lot_id: String,
        remaining: f64,
        purchased: f64,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::configuration("grams_produced_per_month", "must be greater than zero");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for grams_produced_per_month: must be greater than zero"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Negative {
            field: "weight_grams".to_string(),
            value: -2.0,
        };
        assert_eq!(err.to_string(), "weight_grams must not be negative, got -2");

        let err = ValidationError::RemainingExceedsPurchased {
            lot_id: "lot-1".to_string(),
            remaining: 12.0,
            purchased: 10.0,
        };
        assert_eq!(
            err.to_string(),
            "lot lot-1 has 12 g remaining but only 10 g purchased"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
