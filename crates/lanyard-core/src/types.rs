//! # Domain Types
//!
//! Core domain types used throughout the workshop.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   ProductType   │   │    TapeWidth    │   │    RollWidth    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  lanyard  0.90m │   │  15mm           │   │  150mm (15cm)   │       │
//! │  │  cup      1.40m │   │  20mm           │   │  220mm (22cm)   │       │
//! │  │  keychain 0.29m │   │  25mm           │   │                 │       │
//! │  │  bracelet 0.35m │   │                 │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │     TaxRate     │   │   OrderStatus   │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  percent (dec)  │   │  Quote ...      │                             │
//! │  │  12.345 exact   │   │  Delivered      │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The workshop's data predates this crate and uses Portuguese identifiers
//! (`tirante`, `orcamento`, ...). Those are accepted as serde aliases so old
//! records still load; everything is written back with the English names.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Product Type
// =============================================================================

/// The finished pieces the workshop produces.
///
/// Each variant has a fixed strap length that is used as the per-unit tape
/// consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// Standard neck lanyard, 90cm.
    #[serde(alias = "tirante")]
    LanyardStandard,
    /// Cup-holder lanyard, 140cm.
    #[serde(alias = "tirante_copo")]
    LanyardCup,
    /// Keychain strap, 29cm.
    #[serde(alias = "chaveiro")]
    Keychain,
    /// Wrist bracelet, 35cm.
    #[serde(alias = "pulseira")]
    Bracelet,
}

impl ProductType {
    /// Every product in display order.
    pub const ALL: [ProductType; 4] = [
        ProductType::LanyardStandard,
        ProductType::LanyardCup,
        ProductType::Keychain,
        ProductType::Bracelet,
    ];

    /// Strap length in whole millimeters.
    ///
    /// Consumption math starts from this integer so that
    /// `quantity × length` is exact before it becomes meters.
    #[inline]
    pub const fn length_mm(&self) -> u64 {
        match self {
            ProductType::LanyardStandard => 900,
            ProductType::LanyardCup => 1400,
            ProductType::Keychain => 290,
            ProductType::Bracelet => 350,
        }
    }

    /// Strap length in meters (0.90 / 1.40 / 0.29 / 0.35).
    #[inline]
    pub fn length_meters(&self) -> f64 {
        self.length_mm() as f64 / 1000.0
    }

    /// Both lanyard variants share the wide roll when printed on 25mm tape.
    #[inline]
    pub const fn is_lanyard(&self) -> bool {
        matches!(self, ProductType::LanyardStandard | ProductType::LanyardCup)
    }

    /// Wire name (`lanyard_standard`, ...).
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductType::LanyardStandard => "lanyard_standard",
            ProductType::LanyardCup => "lanyard_cup",
            ProductType::Keychain => "keychain",
            ProductType::Bracelet => "bracelet",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lanyard_standard" | "tirante" => Ok(ProductType::LanyardStandard),
            "lanyard_cup" | "tirante_copo" => Ok(ProductType::LanyardCup),
            "keychain" | "chaveiro" => Ok(ProductType::Keychain),
            "bracelet" | "pulseira" => Ok(ProductType::Bracelet),
            other => Err(ValidationError::InvalidFormat {
                field: "product_type".to_string(),
                reason: format!("unknown product type '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Tape Width
// =============================================================================

/// Width of the polyester tape the piece is cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TapeWidth {
    #[serde(rename = "15mm")]
    Mm15,
    #[serde(rename = "20mm")]
    Mm20,
    #[serde(rename = "25mm")]
    Mm25,
}

impl TapeWidth {
    /// Every width in display order.
    pub const ALL: [TapeWidth; 3] = [TapeWidth::Mm15, TapeWidth::Mm20, TapeWidth::Mm25];

    #[inline]
    pub const fn millimeters(&self) -> u32 {
        match self {
            TapeWidth::Mm15 => 15,
            TapeWidth::Mm20 => 20,
            TapeWidth::Mm25 => 25,
        }
    }

    /// Label as printed on stock names and order forms (`"20mm"`).
    pub const fn label(&self) -> &'static str {
        match self {
            TapeWidth::Mm15 => "15mm",
            TapeWidth::Mm20 => "20mm",
            TapeWidth::Mm25 => "25mm",
        }
    }
}

impl fmt::Display for TapeWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TapeWidth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "15mm" => Ok(TapeWidth::Mm15),
            "20mm" => Ok(TapeWidth::Mm20),
            "25mm" => Ok(TapeWidth::Mm25),
            other => Err(ValidationError::InvalidFormat {
                field: "width".to_string(),
                reason: format!("unknown tape width '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Roll Width
// =============================================================================

/// The two sublimation paper roll stocks kept in the workshop.
///
/// ## Selection Rule
/// ```text
/// lanyard_standard / lanyard_cup  +  25mm  ──►  220mm roll
/// anything else                           ──►  150mm roll
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RollWidth {
    #[serde(rename = "150mm")]
    Mm150,
    #[serde(rename = "220mm")]
    Mm220,
}

impl RollWidth {
    /// Picks the roll stock for a product printed on a given tape.
    pub fn for_product(product: ProductType, width: TapeWidth) -> Self {
        if product.is_lanyard() && width == TapeWidth::Mm25 {
            RollWidth::Mm220
        } else {
            RollWidth::Mm150
        }
    }

    #[inline]
    pub const fn millimeters(&self) -> u32 {
        match self {
            RollWidth::Mm150 => 150,
            RollWidth::Mm220 => 220,
        }
    }

    /// Material cost of one meter of this paper.
    pub fn paper_rate_per_meter(&self) -> f64 {
        match self {
            RollWidth::Mm150 => 1.10,
            RollWidth::Mm220 => 1.50,
        }
    }

    /// Stock label used in the inventory names (`"15cm"`, `"22cm"`).
    pub const fn label(&self) -> &'static str {
        match self {
            RollWidth::Mm150 => "15cm",
            RollWidth::Mm220 => "22cm",
        }
    }
}

impl fmt::Display for RollWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate held as an exact decimal percentage.
///
/// On the wire the rate is a plain number (`"taxRate": 15`), which is what
/// the settings screen edits. Any precision the owner types is kept, so
/// 12.345% taxes at exactly 1.12345.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a tax rate from basis points (1500 bps = 15%).
    #[inline]
    pub fn from_bps(bps: u32) -> Self {
        TaxRate(Decimal::new(bps as i64, 2).normalize())
    }

    /// Creates a tax rate from a decimal percentage. Negative input clamps
    /// to zero.
    pub fn from_percent(pct: Decimal) -> Self {
        TaxRate(pct.max(Decimal::ZERO).normalize())
    }

    /// Creates a tax rate from a typed percentage.
    ///
    /// The shortest decimal that prints as `pct` is used, so `12.345`
    /// stays `12.345`. Non-finite input reads as zero.
    pub fn from_percentage(pct: f64) -> Self {
        let exact = pct.to_string().parse::<Decimal>().unwrap_or_default();
        TaxRate::from_percent(exact)
    }

    /// Returns the rate as an exact percentage.
    #[inline]
    pub fn percent(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    pub fn percentage(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    /// Exact `1 + rate/100` factor applied to a pre-tax price.
    pub fn multiplier(&self) -> Decimal {
        Decimal::ONE + self.0 / Decimal::ONE_HUNDRED
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl From<f64> for TaxRate {
    fn from(pct: f64) -> Self {
        TaxRate::from_percentage(pct)
    }
}

impl From<TaxRate> for f64 {
    fn from(rate: TaxRate) -> Self {
        rate.percentage()
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Where an order sits in the workshop pipeline.
///
/// ```text
/// Quote ──► Approved ──► Printing ──► Calendering ──► Finishing ──► Completed ──► Delivered
///   │
///   └──► Cancelled
/// ```
///
/// Everything from `Approved` onwards consumes material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Price quote, nothing reserved.
    #[serde(alias = "orcamento")]
    Quote,
    #[serde(alias = "aprovado")]
    Approved,
    /// On the plotter.
    #[serde(alias = "impressao")]
    Printing,
    /// On the calendering press.
    #[serde(alias = "calandra")]
    Calendering,
    /// Hardware being attached.
    #[serde(alias = "finalizacao")]
    Finishing,
    #[serde(alias = "concluido")]
    Completed,
    #[serde(alias = "entregue")]
    Delivered,
    #[serde(alias = "cancelado")]
    Cancelled,
}

impl OrderStatus {
    /// Whether the order has been released to the shop floor.
    #[inline]
    pub const fn is_production(&self) -> bool {
        !matches!(self, OrderStatus::Quote | OrderStatus::Cancelled)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Quote => "quote",
            OrderStatus::Approved => "approved",
            OrderStatus::Printing => "printing",
            OrderStatus::Calendering => "calendering",
            OrderStatus::Finishing => "finishing",
            OrderStatus::Completed => "completed",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Quote
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_product_lengths() {
        assert_eq!(ProductType::LanyardStandard.length_meters(), 0.90);
        assert_eq!(ProductType::LanyardCup.length_meters(), 1.40);
        assert_eq!(ProductType::Keychain.length_meters(), 0.29);
        assert_eq!(ProductType::Bracelet.length_meters(), 0.35);
    }

    #[test]
    fn test_product_type_legacy_names() {
        let p: ProductType = serde_json::from_str("\"tirante_copo\"").unwrap();
        assert_eq!(p, ProductType::LanyardCup);
        assert_eq!("chaveiro".parse::<ProductType>().unwrap(), ProductType::Keychain);
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"lanyard_cup\"");
        assert!("mug".parse::<ProductType>().is_err());
    }

    #[test]
    fn test_tape_width_wire_format() {
        let w: TapeWidth = serde_json::from_str("\"25mm\"").unwrap();
        assert_eq!(w, TapeWidth::Mm25);
        assert_eq!(serde_json::to_string(&TapeWidth::Mm15).unwrap(), "\"15mm\"");
        assert_eq!("20mm".parse::<TapeWidth>().unwrap(), TapeWidth::Mm20);
    }

    #[test]
    fn test_roll_width_selection() {
        assert_eq!(
            RollWidth::for_product(ProductType::LanyardStandard, TapeWidth::Mm25),
            RollWidth::Mm220
        );
        assert_eq!(
            RollWidth::for_product(ProductType::LanyardCup, TapeWidth::Mm25),
            RollWidth::Mm220
        );
        assert_eq!(
            RollWidth::for_product(ProductType::LanyardStandard, TapeWidth::Mm20),
            RollWidth::Mm150
        );
        assert_eq!(
            RollWidth::for_product(ProductType::Keychain, TapeWidth::Mm25),
            RollWidth::Mm150
        );
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        let rate = TaxRate::from_percentage(15.0);
        assert_eq!(rate, TaxRate::from_bps(1500));
        assert_eq!(rate.multiplier(), dec!(1.15));
        assert_eq!(TaxRate::from_percentage(-3.0), TaxRate::zero());
        assert_eq!(TaxRate::from_percentage(f64::NAN), TaxRate::zero());
    }

    #[test]
    fn test_tax_rate_keeps_every_typed_digit() {
        let rate: TaxRate = serde_json::from_str("12.345").unwrap();
        assert_eq!(rate.percent(), dec!(12.345));
        assert_eq!(rate.multiplier(), dec!(1.12345));
        assert_eq!(serde_json::to_string(&rate).unwrap(), "12.345");
    }

    #[test]
    fn test_tax_rate_serializes_as_percentage() {
        let rate: TaxRate = serde_json::from_str("8.25").unwrap();
        assert_eq!(rate, TaxRate::from_bps(825));
        assert_eq!(serde_json::to_string(&rate).unwrap(), "8.25");
    }

    #[test]
    fn test_order_status_production_groups() {
        assert!(!OrderStatus::Quote.is_production());
        assert!(!OrderStatus::Cancelled.is_production());
        assert!(OrderStatus::Approved.is_production());
        assert!(OrderStatus::Delivered.is_production());
        assert_eq!(OrderStatus::default(), OrderStatus::Quote);

        let s: OrderStatus = serde_json::from_str("\"impressao\"").unwrap();
        assert_eq!(s, OrderStatus::Printing);
    }
}
