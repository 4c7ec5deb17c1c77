//! # Metal Lot Repository
//!
//! Purchases in, depletions out.
//!
//! ## Depletion Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. lots = list_by_metal(SILVER)          snapshot, each with version  │
//! │  2. result = fifo::consume(15.0, &lots)   pure, no writes              │
//! │  3. apply_consumption(&lots, &result)                                  │
//! │       BEGIN                                                             │
//! │         UPDATE metal_lots SET grams_remaining = ?, version = version+1 │
//! │         WHERE id = ? AND version = <snapshot version>                  │
//! │         ... one per affected lot, 0 rows ⇒ ROLLBACK + Conflict         │
//! │       COMMIT                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two callers racing on the same lots both compute from the same snapshot;
//! the second commit finds a bumped version and fails instead of overdrawing.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use orfebre_core::units::{grams_for, price_per_gram};
use orfebre_core::validation::validate_lot;
use orfebre_core::{ConsumptionResult, MetalLot, MetalType};

const LOT_COLUMNS: &str = r#"
    id,
    metal_type,
    grams_purchased,
    grams_remaining,
    price_per_gram,
    purchase_date,
    version
"#;

/// Repository for metal lot operations.
#[derive(Debug, Clone)]
pub struct MetalLotRepository {
    pool: SqlitePool,
}

impl MetalLotRepository {
    /// Creates a new MetalLotRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MetalLotRepository { pool }
    }

    /// Inserts a lot as given (seeding, imports).
    pub async fn insert(&self, lot: &MetalLot) -> DbResult<()> {
        validate_lot(lot)?;

        debug!(id = %lot.id, metal = lot.metal_type.as_str(), grams = lot.grams_purchased, "Inserting metal lot");

        sqlx::query(
            r#"
            INSERT INTO metal_lots (
                id, metal_type, grams_purchased, grams_remaining,
                price_per_gram, purchase_date, version, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&lot.id)
        .bind(lot.metal_type)
        .bind(lot.grams_purchased)
        .bind(lot.grams_remaining)
        .bind(lot.price_per_gram)
        .bind(lot.purchase_date)
        .bind(lot.version)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a new purchase priced per gram.
    pub async fn record_purchase(
        &self,
        metal: MetalType,
        grams: f64,
        price_per_gram: f64,
        purchase_date: DateTime<Utc>,
    ) -> DbResult<MetalLot> {
        let lot = MetalLot::new(
            Uuid::new_v4().to_string(),
            metal,
            grams,
            price_per_gram,
            purchase_date,
        );
        self.insert(&lot).await?;

        info!(id = %lot.id, metal = metal.as_str(), grams, price_per_gram, "Metal purchase recorded");
        Ok(lot)
    }

    /// Records a purchase invoiced in some unit (`"kg"`, `"oz"`, ...) for a
    /// total price.
    pub async fn record_purchase_in_unit(
        &self,
        metal: MetalType,
        quantity: f64,
        unit: &str,
        total_price: f64,
        purchase_date: DateTime<Utc>,
    ) -> DbResult<MetalLot> {
        let per_gram = price_per_gram(total_price, quantity, unit)?;
        self.record_purchase(metal, grams_for(quantity, unit), per_gram, purchase_date)
            .await
    }

    /// Gets a lot by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<MetalLot>> {
        let lot = sqlx::query_as::<_, MetalLot>(&format!(
            "SELECT {LOT_COLUMNS} FROM metal_lots WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lot)
    }

    /// All lots of a metal, oldest first (depleted ones included).
    pub async fn list_by_metal(&self, metal: MetalType) -> DbResult<Vec<MetalLot>> {
        let lots = sqlx::query_as::<_, MetalLot>(&format!(
            "SELECT {LOT_COLUMNS} FROM metal_lots WHERE metal_type = ?1 ORDER BY purchase_date, id"
        ))
        .bind(metal)
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Lots of a metal that still have stock, oldest first.
    pub async fn list_available(&self, metal: MetalType) -> DbResult<Vec<MetalLot>> {
        let lots = sqlx::query_as::<_, MetalLot>(&format!(
            "SELECT {LOT_COLUMNS} FROM metal_lots \
             WHERE metal_type = ?1 AND grams_remaining > 0 \
             ORDER BY purchase_date, id"
        ))
        .bind(metal)
        .fetch_all(&self.pool)
        .await?;

        Ok(lots)
    }

    /// Persists a consumption computed from `snapshot`.
    ///
    /// ## Guarantees
    /// - All affected lots are updated in one transaction, or none are
    /// - Each update only applies if the lot's version still matches the
    ///   snapshot; otherwise [`DbError::Conflict`] is returned
    ///
    /// ## Returns
    /// The lots as now stored (affected ones with bumped versions).
    pub async fn apply_consumption(
        &self,
        snapshot: &[MetalLot],
        result: &ConsumptionResult,
    ) -> DbResult<Vec<MetalLot>> {
        let mut tx = self.pool.begin().await?;
        let mut updated = Vec::with_capacity(result.lots_affected.len());

        for hit in &result.lots_affected {
            let lot = snapshot
                .iter()
                .find(|lot| lot.id == hit.lot_id)
                .ok_or_else(|| DbError::not_found("MetalLot (snapshot)", hit.lot_id.as_str()))?;

            let outcome = sqlx::query(
                r#"
                UPDATE metal_lots SET
                    grams_remaining = ?2,
                    version = version + 1
                WHERE id = ?1 AND version = ?3
                "#,
            )
            .bind(&hit.lot_id)
            .bind(hit.grams_after)
            .bind(lot.version)
            .execute(&mut *tx)
            .await?;

            if outcome.rows_affected() == 0 {
                warn!(
                    lot_id = %hit.lot_id,
                    expected_version = lot.version,
                    "Lot changed since it was read, rolling back consumption"
                );
                // Dropping `tx` rolls back the updates already made
                return Err(DbError::conflict("MetalLot", hit.lot_id.as_str()));
            }

            updated.push(MetalLot {
                grams_remaining: hit.grams_after,
                version: lot.version + 1,
                ..lot.clone()
            });
        }

        tx.commit().await?;

        info!(
            lots = updated.len(),
            grams = result.grams_consumed(),
            value = result.consumed_value,
            shortage = result.remaining_shortage,
            "Metal consumption applied"
        );

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::TimeZone;
    use orfebre_core::fifo;

    fn date(month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, month, 1, 0, 0, 0).unwrap()
    }

    async fn seeded() -> (Database, MetalLotRepository) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.metal_lots();

        repo.insert(&MetalLot::new("B", MetalType::Silver, 20.0, 110.0, date(2)))
            .await
            .unwrap();
        repo.insert(&MetalLot::new("A", MetalType::Silver, 10.0, 100.0, date(1)))
            .await
            .unwrap();
        repo.insert(&MetalLot::new("G", MetalType::Gold, 5.0, 250_000.0, date(1)))
            .await
            .unwrap();

        (db, repo)
    }

    #[tokio::test]
    async fn test_list_by_metal_is_fifo_ordered() {
        let (_db, repo) = seeded().await;

        let lots = repo.list_by_metal(MetalType::Silver).await.unwrap();
        let ids: Vec<&str> = lots.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(lots[0].purchase_date, date(1));
    }

    #[tokio::test]
    async fn test_apply_consumption() {
        let (_db, repo) = seeded().await;

        let lots = repo.list_by_metal(MetalType::Silver).await.unwrap();
        let result = fifo::consume(15.0, &lots).unwrap();
        repo.apply_consumption(&lots, &result).await.unwrap();

        let a = repo.get_by_id("A").await.unwrap().unwrap();
        let b = repo.get_by_id("B").await.unwrap().unwrap();
        assert_eq!(a.grams_remaining, 0.0);
        assert_eq!(a.version, 1);
        assert_eq!(b.grams_remaining, 15.0);
        assert_eq!(b.version, 1);

        let available = repo.list_available(MetalType::Silver).await.unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, "B");
    }

    #[tokio::test]
    async fn test_stale_snapshot_conflicts_and_rolls_back() {
        let (_db, repo) = seeded().await;

        let snapshot = repo.list_by_metal(MetalType::Silver).await.unwrap();
        let result = fifo::consume(15.0, &snapshot).unwrap();

        repo.apply_consumption(&snapshot, &result).await.unwrap();
        let err = repo.apply_consumption(&snapshot, &result).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
        assert!(err.is_retryable());

        // still the state after the first application only
        let lots = repo.list_by_metal(MetalType::Silver).await.unwrap();
        assert_eq!(lots[0].grams_remaining, 0.0);
        assert_eq!(lots[1].grams_remaining, 15.0);
        assert!(lots.iter().all(|l| l.version == 1));
    }

    #[tokio::test]
    async fn test_partial_conflict_leaves_every_lot_untouched() {
        let (_db, repo) = seeded().await;

        let snapshot = repo.list_by_metal(MetalType::Silver).await.unwrap();

        // someone else consumes from B only
        let b_only = fifo::consume(1.0, &snapshot[1..]).unwrap();
        repo.apply_consumption(&snapshot[1..], &b_only).await.unwrap();

        // our consumption touches A (still fresh) then B (stale)
        let ours = fifo::consume(15.0, &snapshot).unwrap();
        let err = repo.apply_consumption(&snapshot, &ours).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { ref id, .. } if id == "B"));

        let a = repo.get_by_id("A").await.unwrap().unwrap();
        assert_eq!(a.grams_remaining, 10.0);
        assert_eq!(a.version, 0);
    }

    #[tokio::test]
    async fn test_record_purchase_in_unit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.metal_lots();

        let lot = repo
            .record_purchase_in_unit(MetalType::Silver, 1.0, "kg", 3_990_000.0, date(3))
            .await
            .unwrap();
        assert_eq!(lot.grams_purchased, 1000.0);
        assert_eq!(lot.price_per_gram, 3_990.0);

        let stored = repo.get_by_id(&lot.id).await.unwrap().unwrap();
        assert_eq!(stored, lot);
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_lot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut lot = MetalLot::new("bad", MetalType::Gold, 5.0, 1.0, date(1));
        lot.grams_remaining = 6.0;

        let err = db.metal_lots().insert(&lot).await.unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }
}
