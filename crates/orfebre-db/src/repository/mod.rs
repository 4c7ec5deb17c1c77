//! # Repository Module
//!
//! One repository per aggregate, each a thin owner of its SQL.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.metal_lots()   MetalLotRepository   purchases, FIFO reads,          │
//! │                                         versioned depletion             │
//! │  db.market()       MarketRepository     quote history, latest quote     │
//! │  db.settings()     SettingsRepository   global config, fixed costs,     │
//! │                                         depreciation schedules          │
//! │  db.stones()       StoneRepository      stone catalog and prices        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod market;
pub mod metal;
pub mod settings;
pub mod stone;
