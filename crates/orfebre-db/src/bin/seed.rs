//! # Seed Data Generator
//!
//! Populates a development database with the workshop's reference data.
//!
//! ## Usage
//! ```bash
//! # Seed the database at ORFEBRE_DB_PATH (default ./orfebre_dev.db)
//! cargo run -p orfebre-db --bin seed
//!
//! # Specify database path
//! cargo run -p orfebre-db --bin seed -- --db ./data/orfebre.db
//! ```
//!
//! ## Seeded Records
//! - Global configuration (4000 COP/USD, 19% tax, 15% margin, 509 g/month)
//! - 15 stone types
//! - 14 monthly fixed costs and 2 depreciation schedules
//! - Two silver lots, one gold lot
//! - Sample market quotes (XAG, XAU, USD)

use chrono::{Duration, Utc};
use std::env;
use tracing::{info, warn};

use orfebre_core::{Depreciation, FixedCost, GlobalConfig, MetalType, StoneType, TrackingType};
use orfebre_db::{init_tracing, AppConfig, Database};

/// Stone catalog: name, unit price (COP).
const STONES: &[(&str, f64)] = &[
    ("Diamante", 75_000.0),
    ("Esmeralda", 38_000.0),
    ("Rubí", 50_000.0),
    ("Zafiro", 50_000.0),
    ("Granate Verde", 30_000.0),
    ("Acuamarina", 45_000.0),
    ("Zafiro Paparadga", 100_000.0),
    ("Granate Rojo", 25_000.0),
    ("Amatista", 25_000.0),
    ("Citrino", 25_000.0),
    ("Peridoto", 25_000.0),
    ("Tanzanita", 35_000.0),
    ("CZ 1mm", 300.0),
    ("CZ", 2_000.0),
    ("Corindón Laboratorio", 2_500.0),
];

/// Monthly fixed costs: name, value (COP), category.
const FIXED_COSTS: &[(&str, f64, &str)] = &[
    ("Luz", 470_000.0, "servicio"),
    ("Agua", 70_000.0, "servicio"),
    ("Fotografías y videos", 3_000_000.0, "servicio"),
    ("Arriendo", 600_000.0, "servicio"),
    ("Transporte", 600_000.0, "servicio"),
    ("Empaque", 380_000.0, "material"),
    ("Tarjetas", 380_000.0, "material"),
    ("Ayudante", 800_000.0, "servicio"),
    ("Alquiler de vitrinas", 253_000.0, "servicio"),
    ("Ácidos, Alcohol, Etc", 600_000.0, "consumible"),
    ("Resinas para moldes", 2_100_000.0, "material"),
    ("Precio de Plata Total", 3_990_000.0, "material"),
    ("Fundición", 3_345_000.0, "servicio"),
    ("Etiquetas e imprimador", 560_000.0, "material"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let app_config = AppConfig::load()?;
    let mut db_path = app_config.database_path.clone();

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Orfebre Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $ORFEBRE_DB_PATH or ./orfebre_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = AppConfig {
        database_path: db_path,
        ..app_config
    };
    let db = Database::new(config.db_config()).await?;

    if db.settings().get_config().await?.is_some() {
        warn!("Database already seeded, skipping. Delete the file to regenerate.");
        return Ok(());
    }

    db.settings().save_config(&GlobalConfig::default()).await?;

    for (name, price) in STONES {
        let code = db.stones().insert(&stone_type(name, *price)).await?;
        info!(name, code = %code, "Stone type seeded");
    }

    for (name, value, category) in FIXED_COSTS {
        db.settings()
            .upsert_fixed_cost(&FixedCost {
                id: format!("costo-{}", name.to_lowercase().replace(' ', "-")),
                name: name.to_string(),
                category: category.to_string(),
                monthly_value: *value,
                active: true,
            })
            .await?;
    }

    for (id, name, years) in [("dep-herramientas", "Herramientas", 5.0), ("dep-oficina", "Oficina", 10.0)] {
        db.settings()
            .upsert_depreciation(&Depreciation {
                id: id.to_string(),
                name: name.to_string(),
                initial_value: 60_000_000.0,
                useful_life_years: years,
                active: true,
            })
            .await?;
    }

    let now = Utc::now();
    let lots = db.metal_lots();
    lots.record_purchase(MetalType::Silver, 500.0, 3_800.0, now - Duration::days(60))
        .await?;
    lots.record_purchase_in_unit(MetalType::Silver, 1.0, "kg", 3_990_000.0, now - Duration::days(15))
        .await?;
    lots.record_purchase(MetalType::Gold, 20.0, 280_000.0, now - Duration::days(30))
        .await?;

    let market = db.market();
    market.record("XAG", 30.0, "USD", now).await?;
    market.record("XAU", 2_000.0, "USD", now).await?;
    market.record("USD", 4_000.0, "COP", now).await?;

    let overhead = db.costing(config.fallback).pcg().await?;
    info!(
        monthly_total = overhead.monthly_total(),
        pcg = overhead.pcg,
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

/// Catalog entry for a seeded stone.
///
/// Synthetic stones are lot tracked; natural ones are unique, "preciosa"
/// from 50 000 up and "semipreciosa" below.
fn stone_type(name: &str, unit_price: f64) -> StoneType {
    let synthetic = ["CZ", "Laboratorio", "Sintética"]
        .iter()
        .any(|marker| name.contains(marker));

    let (tracking, category) = if synthetic {
        (TrackingType::Lot, "sintética")
    } else if unit_price >= 50_000.0 {
        (TrackingType::Unique, "preciosa")
    } else {
        (TrackingType::Unique, "semipreciosa")
    };

    StoneType {
        id: format!("piedra-{}", name.to_lowercase().replace(' ', "-")),
        name: name.to_string(),
        unit_price,
        tracking,
        category: Some(category.to_string()),
    }
}
