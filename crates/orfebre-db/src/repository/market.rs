//! # Market Quote Repository
//!
//! Append-only quote history; the latest row per symbol is the live price.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use orfebre_core::costing::MarketSnapshot;
use orfebre_core::validation::validate_finite;
use orfebre_core::{MarketQuote, MetalType, EXCHANGE_RATE_SYMBOL};

/// Repository for market quotes.
#[derive(Debug, Clone)]
pub struct MarketRepository {
    pool: SqlitePool,
}

impl MarketRepository {
    /// Creates a new MarketRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MarketRepository { pool }
    }

    /// Stores a quote observed at `recorded_at`.
    pub async fn record(
        &self,
        symbol: &str,
        price: f64,
        currency: &str,
        recorded_at: DateTime<Utc>,
    ) -> DbResult<MarketQuote> {
        validate_finite("quote.price", price)?;

        debug!(symbol, price, currency, "Recording market quote");

        sqlx::query(
            r#"
            INSERT INTO market_quotes (id, symbol, price, currency, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(symbol)
        .bind(price)
        .bind(currency)
        .bind(recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(MarketQuote {
            symbol: symbol.to_string(),
            price,
            currency: currency.to_string(),
            recorded_at,
        })
    }

    /// Latest quote for a symbol, if any was ever recorded.
    pub async fn latest(&self, symbol: &str) -> DbResult<Option<MarketQuote>> {
        let quote = sqlx::query_as::<_, MarketQuote>(
            r#"
            SELECT symbol, price, currency, recorded_at
            FROM market_quotes
            WHERE symbol = ?1
            ORDER BY recorded_at DESC
            LIMIT 1
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        Ok(quote)
    }

    /// Most recent quotes for a symbol, newest first.
    pub async fn history(&self, symbol: &str, limit: u32) -> DbResult<Vec<MarketQuote>> {
        let quotes = sqlx::query_as::<_, MarketQuote>(
            r#"
            SELECT symbol, price, currency, recorded_at
            FROM market_quotes
            WHERE symbol = ?1
            ORDER BY recorded_at DESC
            LIMIT ?2
            "#,
        )
        .bind(symbol)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(quotes)
    }

    /// Live figures for costing a piece in `metal`.
    ///
    /// Missing quotes are left as `None`; the engine decides the fallback.
    pub async fn snapshot(&self, metal: MetalType) -> DbResult<MarketSnapshot> {
        let metal_quote = self.latest(metal.symbol()).await?;
        let rate_quote = self.latest(EXCHANGE_RATE_SYMBOL).await?;

        Ok(MarketSnapshot {
            metal_usd_per_ounce: metal_quote.map(|q| q.price),
            exchange_rate: rate_quote.map(|q| q.price),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;

    #[tokio::test]
    async fn test_latest_quote_wins() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let market = db.market();
        let now = Utc::now();

        market.record("XAG", 29.0, "USD", now - Duration::days(1)).await.unwrap();
        market.record("XAG", 31.5, "USD", now).await.unwrap();

        let latest = market.latest("XAG").await.unwrap().unwrap();
        assert_eq!(latest.price, 31.5);

        let history = market.history("XAG", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].price, 29.0);
    }

    #[tokio::test]
    async fn test_snapshot_leaves_missing_quotes_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let market = db.market();

        let empty = market.snapshot(MetalType::Gold).await.unwrap();
        assert_eq!(empty, MarketSnapshot::default());

        market.record("USD", 3_950.0, "COP", Utc::now()).await.unwrap();
        let snapshot = market.snapshot(MetalType::Gold).await.unwrap();
        assert_eq!(snapshot.metal_usd_per_ounce, None);
        assert_eq!(snapshot.exchange_rate, Some(3_950.0));
    }
}
