//! # FIFO Valuation Engine
//!
//! Values and depletes a pool of metal lots first-in-first-out.
//!
//! ## Two Values for the Same Grams
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Lots (oldest first)        grams   price/g                             │
//! │  ├── A  2024-01-05          10      100                                 │
//! │  └── B  2024-02-11           5      110                                 │
//! │                                                                         │
//! │  book_value         = 10×100 + 5×110     = 1 550   (what we paid)      │
//! │  replacement_value  = 15 × market(120)   = 1 800   (what it costs now) │
//! │                                                                         │
//! │  consume(12 g)                                                          │
//! │  ├── A: 10 → 0   (10 g × 100)                                          │
//! │  └── B:  5 → 3   ( 2 g × 110)            consumed_value = 1 220         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is a read over a snapshot. Applying a consumption to
//! storage is the caller's job (see `orfebre-db`), which is where concurrent
//! consumers are serialized.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::CoreResult;
use crate::types::MetalLot;
use crate::validation::{validate_lots, validate_non_negative};
use crate::GRAMS_EPSILON;

// =============================================================================
// Ordering
// =============================================================================

/// Returns the lots in FIFO order: oldest `purchase_date` first, ties broken
/// by `id`.
///
/// The sort is stable, so the result does not depend on how the caller
/// happened to order the slice.
pub fn fifo_order(lots: &[MetalLot]) -> Vec<&MetalLot> {
    let mut ordered: Vec<&MetalLot> = lots.iter().collect();
    ordered.sort_by(|a, b| {
        a.purchase_date
            .cmp(&b.purchase_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    ordered
}

// =============================================================================
// Valuation
// =============================================================================

/// Sum of `grams_remaining` across all lots.
pub fn total_weight(lots: &[MetalLot]) -> f64 {
    lots.iter().map(|lot| lot.grams_remaining).sum()
}

/// Accounting value: every remaining gram at its own historical price.
///
/// Independent of the current market price.
pub fn book_value(lots: &[MetalLot]) -> f64 {
    lots.iter().map(MetalLot::book_value).sum()
}

/// Mark-to-market value: all remaining grams at one current price.
///
/// Moves with the market even though the lots are unchanged. The gap to
/// [`book_value`] is the unrealized gain or loss on stock.
pub fn replacement_value(lots: &[MetalLot], current_price_per_gram: f64) -> f64 {
    total_weight(lots) * current_price_per_gram
}

// =============================================================================
// Consumption
// =============================================================================

/// One lot touched by a simulated consumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LotConsumption {
    pub lot_id: String,
    pub grams_before: f64,
    pub grams_after: f64,
    pub grams_consumed: f64,
}

/// Outcome of a simulated withdrawal.
///
/// ## Invariant
/// `Σ grams_consumed + remaining_shortage == required_grams`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ConsumptionResult {
    pub required_grams: f64,
    /// Σ grams taken × that lot's own purchase price.
    pub consumed_value: f64,
    /// Grams still needed after exhausting every lot (0 when satisfied).
    pub remaining_shortage: f64,
    /// Affected lots in the order they were drained.
    pub lots_affected: Vec<LotConsumption>,
}

impl ConsumptionResult {
    /// Total grams taken from all lots.
    pub fn grams_consumed(&self) -> f64 {
        self.lots_affected.iter().map(|l| l.grams_consumed).sum()
    }

    /// Whether the stock covered the requirement, ignoring float drift
    /// smaller than `epsilon`.
    pub fn is_fully_satisfied(&self, epsilon: f64) -> bool {
        self.remaining_shortage <= epsilon
    }

    /// Blended cost per gram of what was consumed, `None` if nothing was.
    pub fn average_unit_cost(&self) -> Option<f64> {
        let grams = self.grams_consumed();
        if grams > GRAMS_EPSILON {
            Some(self.consumed_value / grams)
        } else {
            None
        }
    }
}

/// Simulates withdrawing `required_grams` from the lots, oldest first.
///
/// ## Algorithm
/// 1. Order lots with [`fifo_order`]
/// 2. Skip lots with nothing left
/// 3. Take `min(grams_remaining, still_needed)` from each lot, valued at the
///    lot's own price (no blended average)
/// 4. Stop as soon as the need reaches zero
/// 5. Whatever is still needed becomes `remaining_shortage`
///
/// Running out of stock is NOT an error: the shortage is reported and the
/// caller decides whether a partial consumption is acceptable. Negative or
/// non-finite input, or an inconsistent lot, is an error.
///
/// ## Example
/// ```rust
/// use orfebre_core::fifo::consume;
/// use orfebre_core::types::{MetalLot, MetalType};
/// use chrono::{TimeZone, Utc};
///
/// let lots = vec![
///     MetalLot::new("A", MetalType::Silver, 10.0, 100.0, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
///     MetalLot::new("B", MetalType::Silver, 20.0, 120.0, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
/// ];
///
/// let result = consume(15.0, &lots).unwrap();
/// assert_eq!(result.lots_affected[0].grams_consumed, 10.0);
/// assert_eq!(result.lots_affected[1].grams_consumed, 5.0);
/// assert_eq!(result.consumed_value, 10.0 * 100.0 + 5.0 * 120.0);
/// assert_eq!(result.remaining_shortage, 0.0);
/// ```
pub fn consume(required_grams: f64, lots: &[MetalLot]) -> CoreResult<ConsumptionResult> {
    validate_non_negative("required_grams", required_grams)?;
    validate_lots(lots)?;

    let mut still_needed = required_grams;
    let mut consumed_value = 0.0;
    let mut lots_affected = Vec::new();

    for lot in fifo_order(lots) {
        if still_needed <= 0.0 {
            break;
        }
        if lot.grams_remaining <= 0.0 {
            continue;
        }

        let take = lot.grams_remaining.min(still_needed);

        lots_affected.push(LotConsumption {
            lot_id: lot.id.clone(),
            grams_before: lot.grams_remaining,
            grams_after: lot.grams_remaining - take,
            grams_consumed: take,
        });

        consumed_value += take * lot.price_per_gram;
        still_needed -= take;
    }

    debug!(
        required_grams,
        consumed_value,
        shortage = still_needed,
        lots = lots_affected.len(),
        "Simulated FIFO consumption"
    );

    Ok(ConsumptionResult {
        required_grams,
        consumed_value,
        remaining_shortage: still_needed,
        lots_affected,
    })
}

/// Returns new lot snapshots with a consumption applied.
///
/// Pure: the input slice is untouched, affected lots get their new
/// `grams_remaining` and a bumped `version`, the rest are cloned as-is.
/// Persisting the change atomically is the storage layer's job.
pub fn apply_consumption(lots: &[MetalLot], result: &ConsumptionResult) -> Vec<MetalLot> {
    lots.iter()
        .map(|lot| {
            let mut next = lot.clone();
            if let Some(hit) = result.lots_affected.iter().find(|l| l.lot_id == lot.id) {
                next.grams_remaining = hit.grams_after;
                next.version += 1;
            }
            next
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
