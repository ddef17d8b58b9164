//! # Workshop Seed
//!
//! Prepares a fresh database: default pricing plus the starter stock list.
//!
//! ## Usage
//! ```bash
//! # Seed ./lanyard.db (or $LANYARD_DB_PATH)
//! cargo run -p lanyard-db --bin seed
//!
//! # Specify database path
//! cargo run -p lanyard-db --bin seed -- --db ./data/lanyard.db
//! ```
//!
//! ## Starter Stock
//! Every row the order deduction looks for, at zero quantity: both paper
//! rolls, 20mm and 25mm tape, and the three stocked finishings. The operator
//! enters the received quantities from the inventory screen.
//!
//! Re-running is safe: pricing is written only when none is stored, and the
//! stock list only into an empty table.

use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lanyard_core::config::PricingConfiguration;
use lanyard_core::inventory::{InventoryItem, StockCategory};
use lanyard_db::repository::inventory::generate_inventory_id;
use lanyard_db::{Database, DbConfig};

/// (name, category, unit, alert threshold)
const STARTER_STOCK: &[(&str, StockCategory, &str, f64)] = &[
    ("Papel Sublimático Bobina 15cm", StockCategory::Paper, "m", 100.0),
    ("Papel Sublimático Bobina 22cm", StockCategory::Paper, "m", 100.0),
    ("Fita Poliéster 20mm Branca", StockCategory::Tape, "m", 1000.0),
    ("Fita Poliéster 25mm Branca", StockCategory::Tape, "m", 500.0),
    ("Mosquetão Padrão Niquel", StockCategory::Accessory, "un", 1000.0),
    ("Trava de Segurança", StockCategory::Accessory, "un", 500.0),
    ("Jacaré Niquelado", StockCategory::Accessory, "un", 800.0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config = DbConfig::from_env();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Lanyard Workshop Seed");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $LANYARD_DB_PATH or ./lanyard.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => warn!(argument = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding database");
    let db = Database::new(config).await?;

    if db.settings().has_pricing().await? {
        info!("Pricing already configured, leaving it alone");
    } else {
        db.settings()
            .save_pricing(&PricingConfiguration::workshop_default())
            .await?;
        info!("Default pricing saved");
    }

    let existing = db.inventory().count().await?;
    if existing > 0 {
        info!(rows = existing, "Inventory already populated, skipping starter stock");
    } else {
        for (name, category, unit, min_stock) in STARTER_STOCK {
            let item = InventoryItem {
                id: generate_inventory_id(),
                name: name.to_string(),
                category: *category,
                quantity: 0.0,
                unit: unit.to_string(),
                min_stock: *min_stock,
                location: None,
            };
            db.inventory().insert(&item).await?;
        }
        info!(rows = STARTER_STOCK.len(), "Starter stock inserted");
    }

    db.close().await;
    info!("Seed complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise info, with debug for the lanyard crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lanyard=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();
}
