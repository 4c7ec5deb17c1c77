//! # orfebre-db: Storage Layer for Orfebre
//!
//! SQLite persistence for the records the costing engine reads, plus the
//! atomic write it cannot make on its own: depleting metal lots.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orfebre Data Flow                                │
//! │                                                                         │
//! │  Admin UI command (cost a piece, register a sale)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   orfebre-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  metal        │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │  market       │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    │  settings     │    └──────────────┘  │   │
//! │  │           ▲            │  stone        │                       │   │
//! │  │           │            └───────────────┘                       │   │
//! │  │   ┌───────────────┐                                             │   │
//! │  │   │CostingService │ ──► orfebre-core (pure math)                │   │
//! │  │   └───────────────┘                                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (WAL mode)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{AppConfig, ConfigError};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use service::{CostingService, InventoryValuation, MetalConsumption, PieceCostRequest, PieceQuote};

// Repository re-exports for convenience
pub use repository::market::MarketRepository;
pub use repository::metal::MetalLotRepository;
pub use repository::settings::SettingsRepository;
pub use repository::stone::StoneRepository;

// =============================================================================
// Tracing
// =============================================================================

/// Installs the global tracing subscriber for binaries.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,orfebre_core=debug,orfebre_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
