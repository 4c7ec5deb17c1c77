//! # orfebre-core: Pure Costing Logic for Orfebre
//!
//! This crate is the costing heart of the workshop tooling. It values metal
//! stock with FIFO depletion and computes the fully loaded cost of a piece.
//! Every function is pure: the caller supplies snapshots, the crate returns
//! numbers, nothing is written back.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orfebre Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Admin UI (inventory, costing)                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              orfebre-db (snapshots + CostingService)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ orfebre-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────┐ ┌────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐   │   │
//! │  │   │ units  │ │  fifo  │ │ overhead │ │ costing │ │  codes  │   │   │
//! │  │   │ oz → g │ │  lots  │ │   PCG    │ │ pricing │ │ LDIA001 │   │   │
//! │  │   └────────┘ └────────┘ └──────────┘ └─────────┘ └─────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Troy ounce and unit-to-gram conversions
//! - [`fifo`] - FIFO valuation and simulated consumption of metal lots
//! - [`overhead`] - Per-gram overhead allocation (PCG)
//! - [`costing`] - Total manufacturing cost of a piece
//! - [`pricing`] - Suggested price, discount ceiling, profit split
//! - [`codes`] - Display codes for pieces and stones
//! - [`config`] - Explicit configuration values passed into every call
//! - [`money`] - Whole-unit currency amounts for final outputs
//! - [`types`] - Domain records (lots, stones, fixed costs, quotes)
//! - [`validation`] - Caller-input checks
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, no hidden state
//! 2. **No I/O**: storage and market data live behind the caller
//! 3. **No Early Rounding**: grams and currency stay `f64` until the final step
//! 4. **Explicit Fallbacks**: substituted prices are tagged, never silent
//!
//! ## Example Usage
//!
//! ```rust
//! use orfebre_core::fifo;
//! use orfebre_core::types::{MetalLot, MetalType};
//! use chrono::{TimeZone, Utc};
//!
//! let lots = vec![
//!     MetalLot::new("a", MetalType::Silver, 10.0, 100.0, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
//!     MetalLot::new("b", MetalType::Silver, 5.0, 110.0, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
//! ];
//!
//! assert_eq!(fifo::book_value(&lots), 1550.0);
//! assert_eq!(fifo::replacement_value(&lots, 120.0), 1800.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codes;
pub mod config;
pub mod costing;
pub mod error;
pub mod fifo;
pub mod money;
pub mod overhead;
pub mod pricing;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::{FallbackPolicy, GlobalConfig, Rate};
pub use costing::{
    CostBreakdown, MarketSnapshot, PieceCostInput, PriceSource, RateSource, SETTING_RISK_FACTOR,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use fifo::{ConsumptionResult, LotConsumption};
pub use money::Money;
pub use overhead::Overhead;
pub use pricing::{PriceSuggestion, ProfitSplit};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tolerance for comparing gram quantities produced by float arithmetic.
///
/// Drift at the 1e-9 scale is expected after a few subtractions and must not
/// be read as a genuine shortage.
pub const GRAMS_EPSILON: f64 = 1e-9;
