//! # Settings Repository
//!
//! The global configuration row and the overhead records (fixed costs and
//! depreciation schedules) that feed the PCG figure.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use orfebre_core::validation::validate_non_negative;
use orfebre_core::{Depreciation, FixedCost, GlobalConfig, Rate};

/// Repository for configuration and overhead records.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    // =========================================================================
    // Global Config
    // =========================================================================

    /// Reads the configuration row. `None` until one is saved.
    pub async fn get_config(&self) -> DbResult<Option<GlobalConfig>> {
        let row: Option<(f64, f64, f64, f64)> = sqlx::query_as(
            r#"
            SELECT exchange_rate, tax_rate, profit_margin, grams_produced_per_month
            FROM global_config
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some((exchange_rate, tax, margin, grams)) = row else {
            return Ok(None);
        };

        Ok(Some(GlobalConfig {
            exchange_rate,
            tax_rate: Rate::new(tax)?,
            profit_margin: Rate::new(margin)?,
            grams_produced_per_month: grams,
        }))
    }

    /// Creates or replaces the configuration row.
    pub async fn save_config(&self, config: &GlobalConfig) -> DbResult<()> {
        config.validate()?;

        sqlx::query(
            r#"
            INSERT INTO global_config (
                id, exchange_rate, tax_rate, profit_margin,
                grams_produced_per_month, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                exchange_rate = excluded.exchange_rate,
                tax_rate = excluded.tax_rate,
                profit_margin = excluded.profit_margin,
                grams_produced_per_month = excluded.grams_produced_per_month,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(config.exchange_rate)
        .bind(config.tax_rate.fraction())
        .bind(config.profit_margin.fraction())
        .bind(config.grams_produced_per_month)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(
            exchange_rate = config.exchange_rate,
            grams_per_month = config.grams_produced_per_month,
            "Global configuration saved"
        );
        Ok(())
    }

    // =========================================================================
    // Fixed Costs
    // =========================================================================

    /// Inserts or replaces a fixed cost.
    pub async fn upsert_fixed_cost(&self, cost: &FixedCost) -> DbResult<()> {
        validate_non_negative("fixed_cost.monthly_value", cost.monthly_value)?;

        debug!(id = %cost.id, value = cost.monthly_value, "Saving fixed cost");

        sqlx::query(
            r#"
            INSERT INTO fixed_costs (id, name, category, monthly_value, active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                monthly_value = excluded.monthly_value,
                active = excluded.active
            "#,
        )
        .bind(&cost.id)
        .bind(&cost.name)
        .bind(&cost.category)
        .bind(cost.monthly_value)
        .bind(cost.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fixed costs currently allocated.
    pub async fn active_fixed_costs(&self) -> DbResult<Vec<FixedCost>> {
        let costs = sqlx::query_as::<_, FixedCost>(
            r#"
            SELECT id, name, category, monthly_value, active
            FROM fixed_costs
            WHERE active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(costs)
    }

    /// Enables or disables a fixed cost without deleting its history.
    pub async fn set_fixed_cost_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query("UPDATE fixed_costs SET active = ?2 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("FixedCost", id));
        }

        Ok(())
    }

    // =========================================================================
    // Depreciation
    // =========================================================================

    /// Inserts or replaces a depreciation schedule.
    pub async fn upsert_depreciation(&self, dep: &Depreciation) -> DbResult<()> {
        // rejects a zero useful life before it reaches the CHECK constraint
        dep.monthly_value()?;

        debug!(id = %dep.id, initial = dep.initial_value, years = dep.useful_life_years, "Saving depreciation");

        sqlx::query(
            r#"
            INSERT INTO depreciations (id, name, initial_value, useful_life_years, active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                initial_value = excluded.initial_value,
                useful_life_years = excluded.useful_life_years,
                active = excluded.active
            "#,
        )
        .bind(&dep.id)
        .bind(&dep.name)
        .bind(dep.initial_value)
        .bind(dep.useful_life_years)
        .bind(dep.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Depreciation schedules currently allocated.
    pub async fn active_depreciations(&self) -> DbResult<Vec<Depreciation>> {
        let deps = sqlx::query_as::<_, Depreciation>(
            r#"
            SELECT id, name, initial_value, useful_life_years, active
            FROM depreciations
            WHERE active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(deps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn cost(id: &str, value: f64, active: bool) -> FixedCost {
        FixedCost {
            id: id.to_string(),
            name: id.to_string(),
            category: "servicio".to_string(),
            monthly_value: value,
            active,
        }
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings();

        assert_eq!(settings.get_config().await.unwrap(), None);

        settings.save_config(&GlobalConfig::default()).await.unwrap();
        let updated = GlobalConfig {
            exchange_rate: 4_100.0,
            ..GlobalConfig::default()
        };
        settings.save_config(&updated).await.unwrap();

        assert_eq!(settings.get_config().await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_save_config_rejects_zero_volume() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let broken = GlobalConfig {
            grams_produced_per_month: 0.0,
            ..GlobalConfig::default()
        };
        let err = db.settings().save_config(&broken).await.unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_only_active_fixed_costs_are_listed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings();

        settings.upsert_fixed_cost(&cost("luz", 470_000.0, true)).await.unwrap();
        settings.upsert_fixed_cost(&cost("agua", 70_000.0, true)).await.unwrap();
        settings.set_fixed_cost_active("agua", false).await.unwrap();

        let active = settings.active_fixed_costs().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "luz");

        assert!(matches!(
            settings.set_fixed_cost_active("missing", true).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_depreciation_validation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let dep = Depreciation {
            id: "dep-herramientas".to_string(),
            name: "Herramientas".to_string(),
            initial_value: 60_000_000.0,
            useful_life_years: 0.0,
            active: true,
        };
        assert!(db.settings().upsert_depreciation(&dep).await.is_err());

        let dep = Depreciation {
            useful_life_years: 5.0,
            ..dep
        };
        db.settings().upsert_depreciation(&dep).await.unwrap();
        assert_eq!(db.settings().active_depreciations().await.unwrap(), vec![dep]);
    }
}
