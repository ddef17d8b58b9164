//! # Price Resolver
//!
//! Resolves the unit sale price of an order line from the pricing
//! configuration.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tape       = base_price[product][width] × tier_factor(quantity)        │
//! │  finishings = Σ (finishing.unit_price × order_total_qty) ÷ quantity     │
//! │  unit_price = round3( (tape + finishings) × (1 + tax%) )                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Finishing Quantities
//! A selected finishing carries the quantity for the WHOLE order (500
//! carabiners on a 500-piece order, 1000 on a 500-piece order with two per
//! piece). The cost is averaged back to a per-unit figure before it is added
//! to the tape price.
//!
//! All money math is exact decimal arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::config::{PricingConfiguration, QuantityTier};
use crate::error::ConfigurationError;
use crate::types::{ProductType, TapeWidth};

/// Decimal places of a resolved unit price.
pub const UNIT_PRICE_DECIMALS: u32 = 3;

// =============================================================================
// Inputs & Outputs
// =============================================================================

/// A finishing chosen for an order, with its total quantity for the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SelectedFinishing {
    #[serde(alias = "type")]
    pub name: String,
    pub quantity: u32,
}

impl SelectedFinishing {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        SelectedFinishing {
            name: name.into(),
            quantity,
        }
    }
}

/// Pre-tax unit price components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceBreakdown {
    /// Base price after the tier factor.
    #[ts(type = "string")]
    pub tape: Decimal,
    /// Finishing cost averaged per unit.
    #[ts(type = "string")]
    pub finishings: Decimal,
}

/// The resolved unit price of an order line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// Tax-inclusive unit price, 3 decimal places.
    #[ts(type = "string")]
    pub unit_price: Decimal,
    pub breakdown: PriceBreakdown,
    #[ts(type = "string")]
    pub applied_factor: Decimal,
}

impl PriceQuote {
    /// Order value for `quantity` pieces, rounded to cents.
    pub fn order_total(&self, quantity: u32) -> Decimal {
        (self.unit_price * Decimal::from(quantity))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Resolves the unit price for an order line.
///
/// ## Errors
/// - `MissingBasePrice` when the product/width pair has no price
/// - `UnknownFinishing` when a selected finishing isn't configured
///
/// ## Example
/// ```rust
/// use lanyard_core::config::PricingConfiguration;
/// use lanyard_core::pricing::{quote, SelectedFinishing};
/// use lanyard_core::types::{ProductType, TapeWidth};
/// use rust_decimal_macros::dec;
///
/// let config = PricingConfiguration::workshop_default();
/// let carabiners = [SelectedFinishing::new("mosquetão", 1000)];
///
/// let q = quote(ProductType::LanyardStandard, TapeWidth::Mm20, 1000, &carabiners, &config).unwrap();
/// assert_eq!(q.breakdown.finishings, dec!(1.06));
/// assert_eq!(q.applied_factor, dec!(1));
/// ```
pub fn quote(
    product: ProductType,
    width: TapeWidth,
    quantity: u32,
    selected: &[SelectedFinishing],
    config: &PricingConfiguration,
) -> Result<PriceQuote, ConfigurationError> {
    let base_price = config.prices.base_price(product, width)?;
    let factor = resolve_tier_factor(quantity, &config.quantity_tiers);
    let tape = base_price * factor;

    let mut finishing_total = Decimal::ZERO;
    for selection in selected {
        let option = config
            .finishing(&selection.name)
            .ok_or_else(|| ConfigurationError::UnknownFinishing(selection.name.clone()))?;
        finishing_total += option.unit_price * Decimal::from(selection.quantity);
    }
    let finishings = if quantity == 0 {
        Decimal::ZERO
    } else {
        finishing_total / Decimal::from(quantity)
    };

    let raw_unit_price = tape + finishings;
    let unit_price = (raw_unit_price * config.tax_rate.multiplier())
        .round_dp_with_strategy(UNIT_PRICE_DECIMALS, RoundingStrategy::MidpointAwayFromZero);

    debug!(
        product = %product,
        width = %width,
        quantity,
        factor = %factor,
        unit_price = %unit_price,
        "Price resolved"
    );

    Ok(PriceQuote {
        unit_price,
        breakdown: PriceBreakdown { tape, finishings },
        applied_factor: factor,
    })
}

/// Multiplier of the first tier containing `quantity`, or 1 when none does.
///
/// ```rust
/// use lanyard_core::config::QuantityTier;
/// use lanyard_core::pricing::resolve_tier_factor;
/// use rust_decimal_macros::dec;
///
/// let tiers = [QuantityTier::new(1, 10, dec!(2)), QuantityTier::new(5, 20, dec!(3))];
/// assert_eq!(resolve_tier_factor(7, &tiers), dec!(2));
/// assert_eq!(resolve_tier_factor(15, &tiers), dec!(3));
/// assert_eq!(resolve_tier_factor(21, &tiers), dec!(1));
/// ```
pub fn resolve_tier_factor(quantity: u32, tiers: &[QuantityTier]) -> Decimal {
    match tiers.iter().find(|tier| tier.contains(quantity)) {
        Some(tier) => tier.factor,
        None => {
            if !tiers.is_empty() {
                warn!(quantity, "Quantity matches no tier, pricing at factor 1");
            }
            Decimal::ONE
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PriceTable;
    use crate::types::TaxRate;
    use rust_decimal_macros::dec;

    fn config() -> PricingConfiguration {
        PricingConfiguration::workshop_default()
    }

    #[test]
    fn test_500_standard_lanyards_at_15_percent_tax() {
        let q = quote(ProductType::LanyardStandard, TapeWidth::Mm20, 500, &[], &config()).unwrap();

        assert_eq!(q.applied_factor, dec!(1.17));
        assert_eq!(q.breakdown.tape, dec!(2.691));
        assert_eq!(q.breakdown.finishings, Decimal::ZERO);
        // 2.691 × 1.15 = 3.09465
        assert_eq!(q.unit_price, dec!(3.095));
        assert_eq!(q.order_total(500), dec!(1547.50));
    }

    #[test]
    fn test_finishing_total_is_averaged_per_unit() {
        let selected = [SelectedFinishing::new("mosquetão", 1000)];
        let q = quote(ProductType::LanyardStandard, TapeWidth::Mm20, 1000, &selected, &config())
            .unwrap();

        assert_eq!(q.applied_factor, Decimal::ONE);
        assert_eq!(q.breakdown.tape, dec!(2.30));
        assert_eq!(q.breakdown.finishings, dec!(1.06));
        // (2.30 + 1.06) × 1.15 = 3.864
        assert_eq!(q.unit_price, dec!(3.864));
    }

    #[test]
    fn test_two_finishings_per_piece() {
        let selected = [
            SelectedFinishing::new("trava", 250),
            SelectedFinishing::new("jacare", 500),
        ];
        let mut cfg = config();
        cfg.tax_rate = TaxRate::zero();

        let q = quote(ProductType::LanyardStandard, TapeWidth::Mm15, 250, &selected, &cfg).unwrap();

        // (0.11 × 250 + 0.31 × 500) / 250 = 0.73
        assert_eq!(q.breakdown.finishings, dec!(0.73));
        // 1.20 × 1.17 + 0.73
        assert_eq!(q.unit_price, dec!(2.134));
    }

    #[test]
    fn test_fractional_tax_rate_is_applied_exactly() {
        let mut cfg = config();
        cfg.prices = PriceTable::new().with(ProductType::Keychain, TapeWidth::Mm15, dec!(1.00));
        cfg.tax_rate = TaxRate::from_percentage(12.345);

        let q = quote(ProductType::Keychain, TapeWidth::Mm15, 10, &[], &cfg).unwrap();

        assert_eq!(q.applied_factor, Decimal::ONE);
        // 1.00 × 1.12345, not 1.1235
        assert_eq!(q.unit_price, dec!(1.123));
    }

    #[test]
    fn test_quantity_outside_tiers_uses_factor_one() {
        let q = quote(ProductType::Keychain, TapeWidth::Mm25, 10, &[], &config()).unwrap();
        assert_eq!(q.applied_factor, Decimal::ONE);

        let q = quote(ProductType::Keychain, TapeWidth::Mm25, 5000, &[], &config()).unwrap();
        assert_eq!(q.applied_factor, Decimal::ONE);
        assert_eq!(q.breakdown.tape, dec!(2.80));
    }

    #[test]
    fn test_overlapping_tiers_first_match_wins() {
        let mut cfg = config();
        cfg.quantity_tiers = vec![
            QuantityTier::new(100, 300, dec!(1.5)),
            QuantityTier::new(200, 500, dec!(1.1)),
        ];
        let q = quote(ProductType::Bracelet, TapeWidth::Mm15, 250, &[], &cfg).unwrap();
        assert_eq!(q.applied_factor, dec!(1.5));
    }

    #[test]
    fn test_tier_bounds_are_inclusive() {
        let tiers = config().quantity_tiers;
        assert_eq!(resolve_tier_factor(19, &tiers), Decimal::ONE);
        assert_eq!(resolve_tier_factor(20, &tiers), dec!(3.64));
        assert_eq!(resolve_tier_factor(49, &tiers), dec!(3.64));
        assert_eq!(resolve_tier_factor(50, &tiers), dec!(2.03));
        assert_eq!(resolve_tier_factor(500, &tiers), dec!(1.17));
        assert_eq!(resolve_tier_factor(501, &tiers), Decimal::ONE);
        assert_eq!(resolve_tier_factor(42, &[]), Decimal::ONE);
    }

    #[test]
    fn test_missing_base_price_fails_fast() {
        let mut cfg = config();
        cfg.prices = PriceTable::new().with(ProductType::LanyardStandard, TapeWidth::Mm20, dec!(2.30));

        let err = quote(ProductType::LanyardCup, TapeWidth::Mm20, 100, &[], &cfg).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::MissingBasePrice {
                product: ProductType::LanyardCup,
                width: TapeWidth::Mm20,
            }
        );
    }

    #[test]
    fn test_unknown_finishing_fails_fast() {
        let selected = [SelectedFinishing::new("fivela", 100)];
        let err = quote(ProductType::LanyardStandard, TapeWidth::Mm20, 100, &selected, &config())
            .unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownFinishing("fivela".to_string()));
    }

    #[test]
    fn test_zero_quantity_does_not_divide_by_zero() {
        let selected = [SelectedFinishing::new("argola", 10)];
        let q = quote(ProductType::LanyardStandard, TapeWidth::Mm20, 0, &selected, &config()).unwrap();
        assert_eq!(q.breakdown.finishings, Decimal::ZERO);
        assert_eq!(q.order_total(0), Decimal::ZERO);
    }

    #[test]
    fn test_quote_is_deterministic() {
        let selected = [SelectedFinishing::new("fecho", 333)];
        let a = quote(ProductType::LanyardCup, TapeWidth::Mm25, 333, &selected, &config()).unwrap();
        let b = quote(ProductType::LanyardCup, TapeWidth::Mm25, 333, &selected, &config()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.unit_price.to_string(), b.unit_price.to_string());
    }

    #[test]
    fn test_legacy_finishing_field_name() {
        let s: SelectedFinishing =
            serde_json::from_str(r#"{ "type": "mosquetao", "quantity": 500 }"#).unwrap();
        assert_eq!(s, SelectedFinishing::new("mosquetao", 500));
    }
}
