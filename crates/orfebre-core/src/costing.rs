//! # Piece Costing Engine
//!
//! Fully loaded manufacturing cost of one finished piece.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  total = material + overhead + stones × 2.0 + enamel + stages          │
//! │                                                                         │
//! │  material  = weight × (USD/troy oz ÷ 31.1034768) × COP/USD             │
//! │  overhead  = weight × PCG                                               │
//! │  stones    = Σ unit_price × qty   (itemized list wins over aggregate)  │
//! │                                                                         │
//! │  Missing market data is substituted, never fatal:                      │
//! │    metal price   live quote ─► fallback (2000 Au / 30 Ag)              │
//! │    exchange rate live quote ─► configured rate ─► fallback (4000)      │
//! │  and every substitution is tagged in the breakdown.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::config::{FallbackPolicy, GlobalConfig};
use crate::error::CoreResult;
use crate::types::{MetalType, StoneLine, StoneType};
use crate::units::local_price_per_gram;
use crate::validation::validate_non_negative;

/// Multiplier on stone cost for breakage and labor risk while setting.
///
/// Fixed for now; a candidate for a per-workshop setting.
pub const SETTING_RISK_FACTOR: f64 = 2.0;

// =============================================================================
// Inputs
// =============================================================================

/// Everything about the piece itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PieceCostInput {
    pub weight_grams: f64,
    /// Overhead per gram, usually from [`crate::overhead::calculate_pcg`].
    pub pcg: f64,
    /// Pre-aggregated stone cost. Ignored when `stones` is not empty.
    pub stone_cost: Option<f64>,
    /// Itemized stones, priced fresh from the catalog.
    #[serde(default)]
    pub stones: Vec<StoneLine>,
    pub enamel_cost: f64,
    pub stage_cost: f64,
    #[serde(default)]
    pub metal: MetalType,
}

/// Live market figures, each possibly missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MarketSnapshot {
    /// USD per troy ounce of the piece's metal.
    pub metal_usd_per_ounce: Option<f64>,
    /// Local currency per USD.
    pub exchange_rate: Option<f64>,
}

// =============================================================================
// Sources
// =============================================================================

/// Where the metal price used in a computation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Live,
    Fallback,
}

/// Where the exchange rate used in a computation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Live,
    Configured,
    Fallback,
}

// =============================================================================
// Output
// =============================================================================

/// Itemized stone cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoneCost {
    pub total: f64,
    /// Stone type ids missing from the catalog (priced at zero).
    pub unknown_stone_ids: Vec<String>,
}

/// Every component of a piece's cost plus the figures that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CostBreakdown {
    pub material_cost: f64,
    pub overhead_cost: f64,
    /// Stone cost before the setting risk factor.
    pub stone_cost: f64,
    pub stone_cost_with_risk: f64,
    pub enamel_cost: f64,
    pub stage_cost: f64,
    pub total_cost: f64,

    pub metal: MetalType,
    pub metal_usd_per_ounce: f64,
    pub metal_price_source: PriceSource,
    pub exchange_rate: f64,
    pub exchange_rate_source: RateSource,
    /// Local currency per gram of metal.
    pub price_per_gram_local: f64,
    pub unknown_stone_ids: Vec<String>,
}

impl CostBreakdown {
    /// True when any market figure was substituted.
    pub fn used_fallback(&self) -> bool {
        self.metal_price_source == PriceSource::Fallback
            || self.exchange_rate_source == RateSource::Fallback
    }
}

// =============================================================================
// Stone Cost
// =============================================================================

/// Prices an itemized stone list against the catalog.
///
/// Unknown stone types contribute zero and are reported back; the piece
/// can still be costed, but the caller sees which lines were not priced.
pub fn stone_cost(lines: &[StoneLine], catalog: &[StoneType]) -> CoreResult<StoneCost> {
    let prices: HashMap<&str, f64> = catalog
        .iter()
        .map(|stone| (stone.id.as_str(), stone.unit_price))
        .collect();

    let mut total = 0.0;
    let mut unknown_stone_ids = Vec::new();

    for line in lines {
        match prices.get(line.stone_type_id.as_str()) {
            Some(&unit_price) => {
                validate_non_negative("stone.unit_price", unit_price)?;
                total += unit_price * f64::from(line.quantity);
            }
            None => {
                warn!(stone_type_id = %line.stone_type_id, "Stone type not in catalog, priced at zero");
                unknown_stone_ids.push(line.stone_type_id.clone());
            }
        }
    }

    Ok(StoneCost {
        total,
        unknown_stone_ids,
    })
}

// =============================================================================
// Market Resolution
// =============================================================================

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Picks the metal price, substituting the fallback when the quote is
/// missing, zero or non-finite.
pub fn resolve_metal_price(
    metal: MetalType,
    quote: Option<f64>,
    fallback: &FallbackPolicy,
) -> (f64, PriceSource) {
    match usable(quote) {
        Some(price) => (price, PriceSource::Live),
        None => {
            let price = fallback.metal_price(metal);
            warn!(
                metal = metal.as_str(),
                quote = ?quote,
                fallback_usd_per_ounce = price,
                "No usable market price, using fallback"
            );
            (price, PriceSource::Fallback)
        }
    }
}

/// Picks the exchange rate: live quote, then configured rate, then fallback.
pub fn resolve_exchange_rate(
    quote: Option<f64>,
    config: Option<&GlobalConfig>,
    fallback: &FallbackPolicy,
) -> (f64, RateSource) {
    if let Some(rate) = usable(quote) {
        return (rate, RateSource::Live);
    }

    if let Some(rate) = usable(config.map(|c| c.exchange_rate)) {
        debug!(exchange_rate = rate, "No live exchange rate, using configured rate");
        return (rate, RateSource::Configured);
    }

    warn!(
        fallback_rate = fallback.exchange_rate,
        "No live or configured exchange rate, using fallback"
    );
    (fallback.exchange_rate, RateSource::Fallback)
}

// =============================================================================
// Total Cost
// =============================================================================

/// Computes the full cost breakdown of a piece.
///
/// ## Steps
/// 1. Validate the piece input (no negative or NaN amounts)
/// 2. Stone cost: itemized list if present, else the aggregate figure
/// 3. Resolve metal price and exchange rate (with tagged fallbacks)
/// 4. Sum material, overhead, risk-adjusted stones, enamel and stages
///
/// ## Example
/// ```rust
/// use orfebre_core::costing::{calculate_piece_cost, MarketSnapshot, PieceCostInput, PriceSource};
/// use orfebre_core::types::MetalType;
/// use orfebre_core::{FallbackPolicy, GlobalConfig};
///
/// let input = PieceCostInput {
///     weight_grams: 10.0,
///     pcg: 2000.0,
///     stone_cost: Some(75_000.0),
///     stones: vec![],
///     enamel_cost: 0.0,
///     stage_cost: 0.0,
///     metal: MetalType::Silver,
/// };
/// let market = MarketSnapshot { metal_usd_per_ounce: Some(30.0), exchange_rate: Some(4000.0) };
///
/// let cost = calculate_piece_cost(&input, &market, Some(&GlobalConfig::default()), &[], &FallbackPolicy::default()).unwrap();
/// assert!((cost.total_cost - 208_580.9).abs() < 0.1);
/// assert_eq!(cost.metal_price_source, PriceSource::Live);
/// ```
pub fn calculate_piece_cost(
    input: &PieceCostInput,
    market: &MarketSnapshot,
    config: Option<&GlobalConfig>,
    catalog: &[StoneType],
    fallback: &FallbackPolicy,
) -> CoreResult<CostBreakdown> {
    validate_non_negative("weight_grams", input.weight_grams)?;
    validate_non_negative("pcg", input.pcg)?;
    validate_non_negative("enamel_cost", input.enamel_cost)?;
    validate_non_negative("stage_cost", input.stage_cost)?;

    let (stone_cost, unknown_stone_ids) = if input.stones.is_empty() {
        let aggregate = input.stone_cost.unwrap_or(0.0);
        validate_non_negative("stone_cost", aggregate)?;
        (aggregate, Vec::new())
    } else {
        let itemized = stone_cost(&input.stones, catalog)?;
        (itemized.total, itemized.unknown_stone_ids)
    };

    let (metal_usd_per_ounce, metal_price_source) =
        resolve_metal_price(input.metal, market.metal_usd_per_ounce, fallback);
    let (exchange_rate, exchange_rate_source) =
        resolve_exchange_rate(market.exchange_rate, config, fallback);

    let price_per_gram_local = local_price_per_gram(metal_usd_per_ounce, exchange_rate);

    let material_cost = input.weight_grams * price_per_gram_local;
    let overhead_cost = input.weight_grams * input.pcg;
    let stone_cost_with_risk = stone_cost * SETTING_RISK_FACTOR;

    let total_cost =
        material_cost + overhead_cost + stone_cost_with_risk + input.enamel_cost + input.stage_cost;

    debug!(
        metal = input.metal.as_str(),
        weight_grams = input.weight_grams,
        material_cost,
        overhead_cost,
        stone_cost_with_risk,
        total_cost,
        "Calculated piece cost"
    );

    Ok(CostBreakdown {
        material_cost,
        overhead_cost,
        stone_cost,
        stone_cost_with_risk,
        enamel_cost: input.enamel_cost,
        stage_cost: input.stage_cost,
        total_cost,
        metal: input.metal,
        metal_usd_per_ounce,
        metal_price_source,
        exchange_rate,
        exchange_rate_source,
        price_per_gram_local,
        unknown_stone_ids,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::types::TrackingType;

    fn reference_input() -> PieceCostInput {
        PieceCostInput {
            weight_grams: 10.0,
            pcg: 2000.0,
            stone_cost: Some(75_000.0),
            stones: vec![],
            enamel_cost: 0.0,
            stage_cost: 0.0,
            metal: MetalType::Silver,
        }
    }

    fn live_market() -> MarketSnapshot {
        MarketSnapshot {
            metal_usd_per_ounce: Some(30.0),
            exchange_rate: Some(4000.0),
        }
    }

    fn stone(id: &str, price: f64) -> StoneType {
        StoneType {
            id: id.to_string(),
            name: id.to_string(),
            unit_price: price,
            tracking: TrackingType::Unique,
            category: None,
        }
    }

    fn cost(input: &PieceCostInput, market: &MarketSnapshot) -> CostBreakdown {
        calculate_piece_cost(
            input,
            market,
            Some(&GlobalConfig::default()),
            &[stone("dia", 75_000.0), stone("esm", 38_000.0)],
            &FallbackPolicy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_reference_piece() {
        let breakdown = cost(&reference_input(), &live_market());

        assert!((breakdown.material_cost - 38_580.9).abs() < 0.1);
        assert_eq!(breakdown.overhead_cost, 20_000.0);
        assert_eq!(breakdown.stone_cost_with_risk, 150_000.0);
        assert!((breakdown.total_cost - 208_580.9).abs() < 0.1);
        assert!(!breakdown.used_fallback());
    }

    #[test]
    fn test_components_sum_to_total() {
        let input = PieceCostInput {
            enamel_cost: 12_000.0,
            stage_cost: 66_700.0,
            ..reference_input()
        };
        let b = cost(&input, &live_market());

        let sum = b.material_cost + b.overhead_cost + b.stone_cost_with_risk + b.enamel_cost + b.stage_cost;
        assert_eq!(b.total_cost, sum);
    }

    #[test]
    fn test_itemized_stones_override_aggregate() {
        let input = PieceCostInput {
            stone_cost: Some(1.0),
            stones: vec![StoneLine::new("dia", 1), StoneLine::new("esm", 2)],
            ..reference_input()
        };
        let b = cost(&input, &live_market());

        assert_eq!(b.stone_cost, 75_000.0 + 2.0 * 38_000.0);
        assert_eq!(b.stone_cost_with_risk, 2.0 * 151_000.0);
    }

    #[test]
    fn test_unknown_stones_are_reported() {
        let input = PieceCostInput {
            stones: vec![StoneLine::new("dia", 1), StoneLine::new("ghost", 4)],
            ..reference_input()
        };
        let b = cost(&input, &live_market());

        assert_eq!(b.stone_cost, 75_000.0);
        assert_eq!(b.unknown_stone_ids, vec!["ghost".to_string()]);
    }

    #[test]
    fn test_missing_metal_price_uses_tagged_fallback() {
        let market = MarketSnapshot {
            metal_usd_per_ounce: None,
            exchange_rate: Some(4000.0),
        };
        let b = cost(&reference_input(), &market);
        assert_eq!(b.metal_usd_per_ounce, 30.0);
        assert_eq!(b.metal_price_source, PriceSource::Fallback);
        assert!(b.used_fallback());

        let gold = PieceCostInput {
            metal: MetalType::Gold,
            ..reference_input()
        };
        let zero_quote = MarketSnapshot {
            metal_usd_per_ounce: Some(0.0),
            exchange_rate: Some(4000.0),
        };
        let b = cost(&gold, &zero_quote);
        assert_eq!(b.metal_usd_per_ounce, 2000.0);
        assert_eq!(b.metal_price_source, PriceSource::Fallback);
    }

    #[test]
    fn test_exchange_rate_resolution_order() {
        let fallback = FallbackPolicy::default();
        let config = GlobalConfig {
            exchange_rate: 3900.0,
            ..GlobalConfig::default()
        };

        assert_eq!(
            resolve_exchange_rate(Some(4100.0), Some(&config), &fallback),
            (4100.0, RateSource::Live)
        );
        assert_eq!(
            resolve_exchange_rate(None, Some(&config), &fallback),
            (3900.0, RateSource::Configured)
        );
        assert_eq!(
            resolve_exchange_rate(Some(f64::NAN), None, &fallback),
            (4000.0, RateSource::Fallback)
        );
    }

    #[test]
    fn test_rejects_invalid_piece_input() {
        let negative = PieceCostInput {
            weight_grams: -1.0,
            ..reference_input()
        };
        let result = calculate_piece_cost(
            &negative,
            &live_market(),
            None,
            &[],
            &FallbackPolicy::default(),
        );
        assert!(matches!(result, Err(CoreError::Validation(_))));

        let nan_enamel = PieceCostInput {
            enamel_cost: f64::NAN,
            ..reference_input()
        };
        assert!(calculate_piece_cost(&nan_enamel, &live_market(), None, &[], &FallbackPolicy::default()).is_err());
    }

    #[test]
    fn test_costing_is_deterministic() {
        let a = cost(&reference_input(), &live_market());
        let b = cost(&reference_input(), &live_market());
        assert_eq!(a, b);
    }

    #[test]
    fn test_breakdown_serializes_sources_snake_case() {
        let b = cost(&reference_input(), &MarketSnapshot::default());
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["metal_price_source"], "fallback");
        assert_eq!(json["exchange_rate_source"], "configured");
        assert_eq!(json["metal"], "SILVER");
    }
}
