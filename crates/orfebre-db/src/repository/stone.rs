//! # Stone Catalog Repository
//!
//! Stone types with their unit prices, the lookup the costing engine uses to
//! price itemized stone lines.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use orfebre_core::codes::{stone_catalog_code, stone_catalog_prefix};
use orfebre_core::validation::validate_non_negative;
use orfebre_core::StoneType;

/// Repository for the stone catalog.
#[derive(Debug, Clone)]
pub struct StoneRepository {
    pool: SqlitePool,
}

impl StoneRepository {
    /// Creates a new StoneRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StoneRepository { pool }
    }

    /// Adds a stone type to the catalog.
    ///
    /// ## Returns
    /// The catalog code assigned to it (`RUB001`, `CZLOT`, ...). Unique stones
    /// are numbered after those already sharing the same prefix.
    pub async fn insert(&self, stone: &StoneType) -> DbResult<String> {
        validate_non_negative("stone.unit_price", stone.unit_price)?;

        let prefix = stone_catalog_prefix(&stone.name);
        let existing: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM stone_types WHERE code LIKE ?1 || '%' AND tracking = 'UNIQUE'",
        )
        .bind(&prefix)
        .fetch_one(&self.pool)
        .await?;

        let code = stone_catalog_code(&stone.name, stone.tracking, existing as u32);

        debug!(id = %stone.id, code = %code, price = stone.unit_price, "Inserting stone type");

        sqlx::query(
            r#"
            INSERT INTO stone_types (id, code, name, unit_price, tracking, category, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&stone.id)
        .bind(&code)
        .bind(&stone.name)
        .bind(stone.unit_price)
        .bind(stone.tracking)
        .bind(&stone.category)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(code)
    }

    /// Gets a stone type by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<StoneType>> {
        let stone = sqlx::query_as::<_, StoneType>(
            "SELECT id, name, unit_price, tracking, category FROM stone_types WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stone)
    }

    /// Catalog code of a stone type.
    pub async fn code_of(&self, id: &str) -> DbResult<Option<String>> {
        let code = sqlx::query_scalar("SELECT code FROM stone_types WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(code)
    }

    /// Whole catalog, by name.
    pub async fn list(&self) -> DbResult<Vec<StoneType>> {
        let stones = sqlx::query_as::<_, StoneType>(
            "SELECT id, name, unit_price, tracking, category FROM stone_types ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stones)
    }

    /// Stone types among `ids`. Ids not in the catalog are simply absent.
    pub async fn list_by_ids(&self, ids: &[String]) -> DbResult<Vec<StoneType>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, name, unit_price, tracking, category FROM stone_types WHERE id IN ({placeholders})"
        );

        let mut query = sqlx::query_as::<_, StoneType>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use orfebre_core::TrackingType;

    fn stone(id: &str, name: &str, price: f64, tracking: TrackingType) -> StoneType {
        StoneType {
            id: id.to_string(),
            name: name.to_string(),
            unit_price: price,
            tracking,
            category: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_catalog_codes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stones = db.stones();

        let verde = stone("gv", "Granate Verde", 30_000.0, TrackingType::Unique);
        let rojo = stone("gr", "Granate Rojo", 25_000.0, TrackingType::Unique);
        let cz = stone("cz", "CZ", 2_000.0, TrackingType::Lot);

        assert_eq!(stones.insert(&verde).await.unwrap(), "GRA001");
        assert_eq!(stones.insert(&rojo).await.unwrap(), "GRA002");
        assert_eq!(stones.insert(&cz).await.unwrap(), "CZLOT");
        assert_eq!(stones.code_of("gr").await.unwrap().as_deref(), Some("GRA002"));

        assert_eq!(stones.get_by_id("gv").await.unwrap(), Some(verde));
    }

    #[tokio::test]
    async fn test_duplicate_lot_code_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stones = db.stones();

        stones
            .insert(&stone("a", "Zirconia", 300.0, TrackingType::Lot))
            .await
            .unwrap();
        let err = stones
            .insert(&stone("b", "Zirconia roja", 300.0, TrackingType::Lot))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_by_ids_skips_unknown() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stones = db.stones();
        stones
            .insert(&stone("dia", "Diamante", 75_000.0, TrackingType::Unique))
            .await
            .unwrap();

        let found = stones
            .list_by_ids(&["dia".to_string(), "ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].unit_price, 75_000.0);

        assert!(stones.list_by_ids(&[]).await.unwrap().is_empty());
    }
}
