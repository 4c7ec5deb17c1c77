//! # Database Handle
//!
//! Opens the workshop ledger (a single SQLite file) and hands out
//! repositories bound to its pool.
//!
//! ```text
//!   AppConfig::load() ─► DbConfig ─► Database::new(config).await
//!                                          │
//!                              SqlitePool (WAL, foreign keys on)
//!                                          │
//!        ┌──────────────┬──────────────┬───┴──────────┬──────────────┐
//!        ▼              ▼              ▼              ▼              ▼
//!   metal_lots()     market()     settings()      stones()    costing(fallback)
//! ```
//!
//! WAL lets valuation reads proceed while a lot depletion is being written.

use orfebre_core::FallbackPolicy;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::market::MarketRepository;
use crate::repository::metal::MetalLotRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::stone::StoneRepository;
use crate::service::CostingService;

// =============================================================================
// Configuration
// =============================================================================

/// Where the ledger lives and how many connections may be open on it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    pub max_connections: u32,
    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,
    /// Apply pending migrations while opening.
    pub migrate: bool,
}

impl DbConfig {
    /// Ledger at `path`; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            migrate: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Throwaway ledger for tests.
    ///
    /// Every connection to `:memory:` opens its own empty database, so the
    /// pool is held to one.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            migrate: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Open ledger. Clones share one pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens (or creates) the ledger and brings its schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening workshop ledger");

        let url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database { pool };
        if config.migrate {
            migrations::run_migrations(&db.pool).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Purchased metal lots and their FIFO depletion.
    pub fn metal_lots(&self) -> MetalLotRepository {
        MetalLotRepository::new(self.pool.clone())
    }

    /// Spot prices and exchange rates.
    pub fn market(&self) -> MarketRepository {
        MarketRepository::new(self.pool.clone())
    }

    /// Global config, fixed costs, depreciation.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    pub fn stones(&self) -> StoneRepository {
        StoneRepository::new(self.pool.clone())
    }

    /// Costing operations over this ledger, using `fallback` when market
    /// data is missing.
    pub fn costing(&self, fallback: FallbackPolicy) -> CostingService {
        CostingService::new(self.clone(), fallback)
    }

    pub async fn close(&self) {
        info!("Closing workshop ledger");
        self.pool.close().await;
    }

    /// True while the pool can still run a query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
