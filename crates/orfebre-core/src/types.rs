//! # Domain Types
//!
//! Snapshot records the engine reads. They are owned by the persistent store;
//! the engine only receives copies and never writes them back.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    MetalLot     │   │   StoneType     │   │  MarketQuote    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  symbol (XAU)   │       │
//! │  │  metal_type     │   │  name           │   │  price          │       │
//! │  │  grams_remaining│   │  unit_price     │   │  currency       │       │
//! │  │  price_per_gram │   │  tracking       │   │  recorded_at    │       │
//! │  │  purchase_date  │   └─────────────────┘   └─────────────────┘       │
//! │  │  version        │                                                    │
//! │  └─────────────────┘   ┌─────────────────┐   ┌─────────────────┐       │
//! │                        │   FixedCost     │   │  Depreciation   │       │
//! │                        │  monthly_value  │   │  initial_value  │       │
//! │                        │  active         │   │  useful_life    │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{validate_non_negative, validate_positive, ValidationResult};

// =============================================================================
// Metal Type
// =============================================================================

/// Precious metal held in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum MetalType {
    Gold,
    Silver,
}

impl MetalType {
    /// Market symbol of the metal's USD per troy ounce quote.
    pub const fn symbol(&self) -> &'static str {
        match self {
            MetalType::Gold => "XAU",
            MetalType::Silver => "XAG",
        }
    }

    /// Uppercase name as stored.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetalType::Gold => "GOLD",
            MetalType::Silver => "SILVER",
        }
    }
}

impl Default for MetalType {
    fn default() -> Self {
        MetalType::Silver
    }
}

// =============================================================================
// Metal Lot
// =============================================================================

/// One purchased batch of a single metal.
///
/// ## Invariants
/// - `grams_remaining <= grams_purchased`
/// - `grams_remaining` only goes down after creation
/// - `price_per_gram` is the historical purchase cost and never changes
///
/// A lot at zero grams is depleted but kept for audit history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MetalLot {
    /// Opaque unique identifier. Also the FIFO tie-break key.
    pub id: String,

    pub metal_type: MetalType,

    /// Weight bought in this purchase.
    pub grams_purchased: f64,

    /// Weight still available for consumption.
    pub grams_remaining: f64,

    /// Historical unit cost in local currency (COP per gram).
    pub price_per_gram: f64,

    /// Defines FIFO order (oldest first).
    #[ts(as = "String")]
    pub purchase_date: DateTime<Utc>,

    /// Optimistic-concurrency counter, bumped on every depletion write.
    pub version: i64,
}

impl MetalLot {
    /// Creates a freshly purchased, untouched lot.
    pub fn new(
        id: impl Into<String>,
        metal_type: MetalType,
        grams: f64,
        price_per_gram: f64,
        purchase_date: DateTime<Utc>,
    ) -> Self {
        MetalLot {
            id: id.into(),
            metal_type,
            grams_purchased: grams,
            grams_remaining: grams,
            price_per_gram,
            purchase_date,
            version: 0,
        }
    }

    /// Checks if nothing is left in the lot.
    #[inline]
    pub fn is_depleted(&self) -> bool {
        self.grams_remaining <= 0.0
    }

    /// Remaining weight valued at the historical purchase price.
    #[inline]
    pub fn book_value(&self) -> f64 {
        self.grams_remaining * self.price_per_gram
    }
}

// =============================================================================
// Stones
// =============================================================================

/// How a stone type is tracked in inventory.
///
/// Only affects the display code and the inventory UI; costing ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum TrackingType {
    /// Aggregate stock (e.g. a bag of 1mm zirconia).
    Lot,
    /// Individually referenced stone (e.g. a single emerald).
    Unique,
}

impl TrackingType {
    /// Single-letter prefix used in stone display codes.
    pub const fn prefix(&self) -> char {
        match self {
            TrackingType::Lot => 'L',
            TrackingType::Unique => 'U',
        }
    }
}

/// Stone catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StoneType {
    pub id: String,
    pub name: String,
    /// Unit price in local currency.
    pub unit_price: f64,
    pub tracking: TrackingType,
    /// "preciosa", "semipreciosa", "sintética", ...
    pub category: Option<String>,
}

/// Itemized stone usage on a piece.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoneLine {
    pub stone_type_id: String,
    pub quantity: u32,
}

impl StoneLine {
    pub fn new(stone_type_id: impl Into<String>, quantity: u32) -> Self {
        StoneLine {
            stone_type_id: stone_type_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Overhead Records
// =============================================================================

/// Recurring monthly charge (rent, electricity, packaging, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct FixedCost {
    pub id: String,
    pub name: String,
    pub category: String,
    /// Amount per month in local currency.
    pub monthly_value: f64,
    /// Inactive costs are kept for history but not allocated.
    pub active: bool,
}

/// Straight-line depreciation of a workshop asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Depreciation {
    pub id: String,
    pub name: String,
    pub initial_value: f64,
    pub useful_life_years: f64,
    pub active: bool,
}

impl Depreciation {
    /// Monthly charge: `initial_value / (useful_life_years × 12)`.
    ///
    /// ## Example
    /// ```rust
    /// use orfebre_core::types::Depreciation;
    ///
    /// let tools = Depreciation {
    ///     id: "dep-tools".into(),
    ///     name: "Herramientas".into(),
    ///     initial_value: 60_000_000.0,
    ///     useful_life_years: 5.0,
    ///     active: true,
    /// };
    /// assert_eq!(tools.monthly_value().unwrap(), 1_000_000.0);
    /// ```
    pub fn monthly_value(&self) -> ValidationResult<f64> {
        validate_non_negative("depreciation.initial_value", self.initial_value)?;
        validate_positive("depreciation.useful_life_years", self.useful_life_years)?;

        Ok(self.initial_value / (self.useful_life_years * 12.0))
    }
}

// =============================================================================
// Market Quote
// =============================================================================

/// Latest known market price for a symbol.
///
/// `XAU` / `XAG` are quoted in USD per troy ounce, `USD` in local currency
/// per dollar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct MarketQuote {
    pub symbol: String,
    pub price: f64,
    pub currency: String,
    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

/// Market symbol carrying the local-currency-per-USD exchange rate.
pub const EXCHANGE_RATE_SYMBOL: &str = "USD";

// =============================================================================
// Production Stages
// =============================================================================

/// A fixed workshop stage a piece passes through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProductionStage {
    pub number: u8,
    pub name: &'static str,
    pub description: &'static str,
    /// Cost charged when the stage is used without an explicit amount.
    pub default_cost: Option<f64>,
}

/// The eight workshop stages, in production order.
pub const PRODUCTION_STAGES: [ProductionStage; 8] = [
    ProductionStage {
        number: 1,
        name: "Diseño",
        description: "Electricidad, computación, tiempo dedicado",
        default_cost: None,
    },
    ProductionStage {
        number: 2,
        name: "Impresión 3D",
        description: "Costo de resina utilizada",
        default_cost: None,
    },
    ProductionStage {
        number: 3,
        name: "Fundición",
        description: "Servicio externo",
        default_cost: Some(66_700.0),
    },
    ProductionStage {
        number: 4,
        name: "Preparación Esmaltado",
        description: "Tiempo y materiales de preparación",
        default_cost: None,
    },
    ProductionStage {
        number: 5,
        name: "Esmaltado",
        description: "Aplicación de esmaltes (3-4g por pieza)",
        default_cost: Some(50_000.0),
    },
    ProductionStage {
        number: 6,
        name: "Acabado",
        description: "Brocas, seguetas, ácido",
        default_cost: None,
    },
    ProductionStage {
        number: 7,
        name: "Engaste de Piedras",
        description: "Colocación de piedras preciosas",
        default_cost: None,
    },
    ProductionStage {
        number: 8,
        name: "Pulido",
        description: "Materiales de pulido final",
        default_cost: None,
    },
];

/// Looks up a stage by its number (1-8).
pub fn production_stage(number: u8) -> Option<&'static ProductionStage> {
    PRODUCTION_STAGES.iter().find(|s| s.number == number)
}

/// One stage used on a piece, with an optional explicit amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StageCost {
    pub stage_number: u8,
    /// `None` charges the stage's default cost (or zero if it has none).
    pub amount: Option<f64>,
}

/// Sums the processing-stage cost of a piece.
///
/// Explicit amounts win; stages listed without one fall back to their
/// default. Unknown stage numbers are rejected.
///
/// ## Example
/// ```rust
/// use orfebre_core::types::{total_stage_cost, StageCost};
///
/// let stages = vec![
///     StageCost { stage_number: 3, amount: None },           // casting default 66 700
///     StageCost { stage_number: 8, amount: Some(12_000.0) }, // polishing
/// ];
/// assert_eq!(total_stage_cost(&stages).unwrap(), 78_700.0);
/// ```
pub fn total_stage_cost(stages: &[StageCost]) -> ValidationResult<f64> {
    stages.iter().try_fold(0.0, |total, stage| {
        let known = production_stage(stage.stage_number).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "stage_number".to_string(),
                min: 1.0,
                max: 9.0,
                value: f64::from(stage.stage_number),
            }
        })?;

        let amount = match stage.amount {
            Some(amount) => {
                validate_non_negative("stage.amount", amount)?;
                amount
            }
            None => known.default_cost.unwrap_or(0.0),
        };

        Ok(total + amount)
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metal_symbols() {
        assert_eq!(MetalType::Gold.symbol(), "XAU");
        assert_eq!(MetalType::Silver.symbol(), "XAG");
        assert_eq!(MetalType::default(), MetalType::Silver);
    }

    #[test]
    fn test_metal_type_serializes_uppercase() {
        let json = serde_json::to_string(&MetalType::Gold).unwrap();
        assert_eq!(json, "\"GOLD\"");
        let back: MetalType = serde_json::from_str("\"SILVER\"").unwrap();
        assert_eq!(back, MetalType::Silver);
    }

    #[test]
    fn test_new_lot_is_untouched() {
        let lot = MetalLot::new("lot-1", MetalType::Silver, 100.0, 3800.0, Utc::now());
        assert_eq!(lot.grams_purchased, lot.grams_remaining);
        assert_eq!(lot.version, 0);
        assert!(!lot.is_depleted());
        assert_eq!(lot.book_value(), 380_000.0);
    }

    #[test]
    fn test_depreciation_monthly_value() {
        let office = Depreciation {
            id: "dep-office".to_string(),
            name: "Oficina".to_string(),
            initial_value: 60_000_000.0,
            useful_life_years: 10.0,
            active: true,
        };
        assert_eq!(office.monthly_value().unwrap(), 500_000.0);

        let broken = Depreciation {
            useful_life_years: 0.0,
            ..office
        };
        assert!(broken.monthly_value().is_err());
    }

    #[test]
    fn test_stage_cost_defaults_and_overrides() {
        let stages = vec![
            StageCost { stage_number: 3, amount: None },
            StageCost { stage_number: 5, amount: None },
            StageCost { stage_number: 1, amount: None },
        ];
        assert_eq!(total_stage_cost(&stages).unwrap(), 116_700.0);

        let overridden = vec![StageCost { stage_number: 5, amount: Some(20_000.0) }];
        assert_eq!(total_stage_cost(&overridden).unwrap(), 20_000.0);

        assert_eq!(total_stage_cost(&[]).unwrap(), 0.0);
    }

    #[test]
    fn test_stage_cost_rejects_unknown_stage() {
        let stages = vec![StageCost { stage_number: 9, amount: Some(1.0) }];
        assert!(total_stage_cost(&stages).is_err());

        let negative = vec![StageCost { stage_number: 2, amount: Some(-5.0) }];
        assert!(total_stage_cost(&negative).is_err());
    }

    #[test]
    fn test_stage_table_is_ordered() {
        let numbers: Vec<u8> = PRODUCTION_STAGES.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(production_stage(7).unwrap().name, "Engaste de Piedras");
    }
}
