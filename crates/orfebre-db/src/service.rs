//! # Costing Service
//!
//! Reads the snapshots the pure engine needs, calls it, and (for metal
//! consumption) persists the decision.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CostingService                                                         │
//! │  ├── pcg()                settings ──► overhead::calculate_pcg          │
//! │  ├── piece_cost(req)      pcg + stones + market + stages               │
//! │  │                          ──► costing::calculate_piece_cost           │
//! │  │                          ──► pricing::suggested_pricing_with         │
//! │  ├── valuation(metal)     lots + market ──► fifo book / replacement    │
//! │  └── consume_metal(..)    lots ──► fifo::consume ──► apply (versioned) │
//! │                           retried on Conflict with a fresh snapshot    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use orfebre_core::costing::{
    calculate_piece_cost, resolve_exchange_rate, resolve_metal_price, PieceCostInput, PriceSource,
    RateSource,
};
use orfebre_core::fifo;
use orfebre_core::overhead::calculate_pcg;
use orfebre_core::pricing::{suggested_pricing_with, PriceSuggestion};
use orfebre_core::types::total_stage_cost;
use orfebre_core::units::local_price_per_gram;
use orfebre_core::{
    ConsumptionResult, CostBreakdown, FallbackPolicy, GlobalConfig, MetalType, Overhead, StageCost,
    StoneLine, GRAMS_EPSILON,
};

/// How many fresh snapshots `consume_metal` tries before giving up.
pub const MAX_CONSUME_ATTEMPTS: usize = 3;

// =============================================================================
// Request / Response Types
// =============================================================================

/// A piece to be costed, as entered on the costing form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PieceCostRequest {
    pub metal: MetalType,
    pub weight_grams: f64,
    /// Itemized stones, priced from the catalog.
    #[serde(default)]
    pub stones: Vec<StoneLine>,
    /// Aggregate stone cost, used only when `stones` is empty.
    pub stone_cost: Option<f64>,
    pub enamel_cost: f64,
    /// Workshop stages used; listed without an amount they charge their default.
    #[serde(default)]
    pub stages: Vec<StageCost>,
}

/// Cost and pricing of one piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceQuote {
    pub overhead: Overhead,
    pub cost: CostBreakdown,
    pub pricing: PriceSuggestion,
}

/// Value of the stock of one metal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventoryValuation {
    pub metal: MetalType,
    pub total_grams: f64,
    /// At historical purchase prices.
    pub book_value: f64,
    /// At today's market price.
    pub replacement_value: f64,
    /// Local currency per gram used for `replacement_value`.
    pub market_price_per_gram: f64,
    pub metal_price_source: PriceSource,
    pub exchange_rate_source: RateSource,
}

impl InventoryValuation {
    /// True when the replacement value rests on a substituted market figure.
    pub fn used_fallback(&self) -> bool {
        self.metal_price_source == PriceSource::Fallback
            || self.exchange_rate_source == RateSource::Fallback
    }
}

/// Outcome of a metal withdrawal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalConsumption {
    pub result: ConsumptionResult,
    /// False when a shortage was found and partial consumption was not
    /// allowed; nothing was written in that case.
    pub applied: bool,
}

// =============================================================================
// Service
// =============================================================================

/// Storage-backed entry point to the costing engine.
#[derive(Debug, Clone)]
pub struct CostingService {
    db: Database,
    fallback: FallbackPolicy,
}

impl CostingService {
    pub fn new(db: Database, fallback: FallbackPolicy) -> Self {
        CostingService { db, fallback }
    }

    /// Current overhead per gram.
    pub async fn pcg(&self) -> DbResult<Overhead> {
        let config = self.db.settings().get_config().await?;
        self.pcg_with(config.as_ref()).await
    }

    /// Overhead per gram against an already loaded config row.
    async fn pcg_with(&self, config: Option<&GlobalConfig>) -> DbResult<Overhead> {
        let settings = self.db.settings();
        let fixed = settings.active_fixed_costs().await?;
        let deps = settings.active_depreciations().await?;

        Ok(calculate_pcg(config, &fixed, &deps, &self.fallback)?)
    }

    /// Costs a piece with today's settings, catalog and market quotes.
    pub async fn piece_cost(&self, request: &PieceCostRequest) -> DbResult<PieceQuote> {
        // one read: overhead, exchange rate and pricing see the same row
        let config = self.db.settings().get_config().await?;
        let overhead = self.pcg_with(config.as_ref()).await?;

        let ids: Vec<String> = request
            .stones
            .iter()
            .map(|line| line.stone_type_id.clone())
            .collect();
        let catalog = self.db.stones().list_by_ids(&ids).await?;
        let market = self.db.market().snapshot(request.metal).await?;

        let input = PieceCostInput {
            weight_grams: request.weight_grams,
            pcg: overhead.pcg,
            stone_cost: request.stone_cost,
            stones: request.stones.clone(),
            enamel_cost: request.enamel_cost,
            stage_cost: total_stage_cost(&request.stages)?,
            metal: request.metal,
        };

        let cost = calculate_piece_cost(&input, &market, config.as_ref(), &catalog, &self.fallback)?;
        let pricing = suggested_pricing_with(cost.total_cost, config.as_ref())?;

        if cost.used_fallback() || !cost.unknown_stone_ids.is_empty() {
            warn!(
                metal_source = ?cost.metal_price_source,
                rate_source = ?cost.exchange_rate_source,
                unknown_stones = cost.unknown_stone_ids.len(),
                "Piece costed with degraded inputs"
            );
        }

        Ok(PieceQuote {
            overhead,
            cost,
            pricing,
        })
    }

    /// Book and replacement value of the remaining stock of a metal.
    pub async fn valuation(&self, metal: MetalType) -> DbResult<InventoryValuation> {
        let lots = self.db.metal_lots().list_available(metal).await?;
        let config = self.db.settings().get_config().await?;
        let market = self.db.market().snapshot(metal).await?;

        let (usd_per_ounce, price_source) =
            resolve_metal_price(metal, market.metal_usd_per_ounce, &self.fallback);
        let (rate, rate_source) =
            resolve_exchange_rate(market.exchange_rate, config.as_ref(), &self.fallback);
        let market_price_per_gram = local_price_per_gram(usd_per_ounce, rate);

        Ok(InventoryValuation {
            metal,
            total_grams: fifo::total_weight(&lots),
            book_value: fifo::book_value(&lots),
            replacement_value: fifo::replacement_value(&lots, market_price_per_gram),
            market_price_per_gram,
            metal_price_source: price_source,
            exchange_rate_source: rate_source,
        })
    }

    /// Withdraws metal from stock, oldest lots first.
    ///
    /// On a version conflict the lots are re-read and the consumption is
    /// recomputed, up to [`MAX_CONSUME_ATTEMPTS`] times.
    pub async fn consume_metal(
        &self,
        metal: MetalType,
        grams: f64,
        allow_partial: bool,
    ) -> DbResult<MetalConsumption> {
        let repo = self.db.metal_lots();
        let mut attempt = 1;

        loop {
            let lots = repo.list_available(metal).await?;
            let result = fifo::consume(grams, &lots)?;

            if !result.is_fully_satisfied(GRAMS_EPSILON) && !allow_partial {
                warn!(
                    metal = metal.as_str(),
                    required = grams,
                    shortage = result.remaining_shortage,
                    "Not enough metal in stock, nothing consumed"
                );
                return Ok(MetalConsumption {
                    result,
                    applied: false,
                });
            }

            match repo.apply_consumption(&lots, &result).await {
                Ok(_) => {
                    info!(
                        metal = metal.as_str(),
                        grams = result.grams_consumed(),
                        value = result.consumed_value,
                        attempt,
                        "Metal consumed"
                    );
                    return Ok(MetalConsumption {
                        result,
                        applied: true,
                    });
                }
                Err(DbError::Conflict { id, .. }) if attempt < MAX_CONSUME_ATTEMPTS => {
                    warn!(lot_id = %id, attempt, "Lot changed concurrently, retrying consumption");
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
