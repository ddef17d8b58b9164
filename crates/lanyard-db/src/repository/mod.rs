//! # Repository Module
//!
//! Database repositories for the workshop dashboard.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Dashboard handler                                                      │
//! │       │  db.orders().create(&order, true)                               │
//! │       ▼                                                                 │
//! │  OrderRepository ──► lanyard-core stock policy (check, plan)            │
//! │       │                                                                 │
//! │       │  SQL, one transaction                                           │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`InventoryRepository`](inventory::InventoryRepository) - Stock rows, adjustments, movement log
//! - [`OrderRepository`](order::OrderRepository) - Orders and their stock deduction
//! - [`SettingsRepository`](settings::SettingsRepository) - Persisted pricing configuration

pub mod inventory;
pub mod order;
pub mod settings;
