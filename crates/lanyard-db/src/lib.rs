//! # lanyard-db: Database Layer for the Lanyard Workshop
//!
//! SQLite storage for stock, orders, and the pricing configuration, using
//! sqlx for async access. Business rules come from `lanyard-core`; this
//! crate makes them durable and atomic.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Lanyard Workshop Data Flow                          │
//! │                                                                         │
//! │  Order form / Inventory screen / Settings screen                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   lanyard-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ InventoryRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo      │    │ 001_init.sql │  │   │
//! │  │   │               │    │ SettingsRepo   │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file ($LANYARD_DB_PATH, default ./lanyard.db)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Inventory, order, and settings repositories
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lanyard_core::order::Order;
//! use lanyard_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()).await?;
//! let pricing = db.settings().load_pricing().await?;
//!
//! let op = db.orders().next_op_number().await?;
//! let order = Order::from_draft(draft, op, &pricing)?;
//! db.orders().create(&order, true).await?; // DbError::Stock lists every shortage
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::inventory::{InventoryRepository, StockMovement};
pub use repository::order::OrderRepository;
pub use repository::settings::SettingsRepository;
