//! # lanyard-core: Pure Business Logic for the Lanyard Workshop
//!
//! This crate holds the production calculator and the price resolver used by
//! the workshop dashboard, together with the stock policy that consumes their
//! output. Everything here is a pure function of its inputs.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Lanyard Workshop Data Flow                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Dashboard (order form, calculator)              │   │
//! │  │      product type, tape width, quantity, finishings            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ lanyard-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │ production │  │  pricing  │  │ inventory │  │   order   │  │   │
//! │  │   │  estimate  │  │   quote   │  │ check +   │  │ snapshot  │  │   │
//! │  │   │            │  │           │  │ deduction │  │           │  │   │
//! │  │   └────────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO GLOBAL CONFIG • PURE FUNCTIONS     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  lanyard-db (Database Layer)                    │   │
//! │  │        inventory rows, orders, persisted pricing settings       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product types, tape/roll widths, order status, tax rate
//! - [`config`] - The versioned pricing configuration and its validation
//! - [`production`] - Material consumption and machine time estimates
//! - [`pricing`] - Unit price resolution from the tiered price table
//! - [`inventory`] - Stock lookup, sufficiency check, deduction planning
//! - [`order`] - Order records and the frozen calculation snapshot
//! - [`validation`] - Field validators for operator input
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use lanyard_core::config::PricingConfiguration;
//! use lanyard_core::pricing::quote;
//! use lanyard_core::production::estimate;
//! use lanyard_core::types::{ProductType, TapeWidth};
//! use rust_decimal_macros::dec;
//!
//! let config = PricingConfiguration::workshop_default();
//!
//! let est = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 500, None, 5);
//! assert_eq!(est.total_linear_meters, 450);
//! assert_eq!(est.paper_consumption_meters, 189.0);
//!
//! let q = quote(ProductType::LanyardStandard, TapeWidth::Mm20, 500, &[], &config).unwrap();
//! assert_eq!(q.unit_price, dec!(3.095));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod inventory;
pub mod order;
pub mod pricing;
pub mod production;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use config::PricingConfiguration;
pub use error::{ConfigurationError, CoreError, StockShortfall, ValidationError};
pub use pricing::{quote, PriceQuote};
pub use production::{estimate, ProductionEstimate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Artwork columns that fit across one paper roll pass.
///
/// ## Business Reason
/// Both roll stocks (15cm and 22cm) are laid out with 5 pieces per row.
pub const DEFAULT_ITEMS_PER_ROW: i32 = 5;

/// Largest quantity accepted on a single order line.
///
/// Guards against a mistyped quantity turning into a multi-kilometer
/// stock deduction.
pub const MAX_ORDER_QUANTITY: u32 = 1_000_000;
