//! # Pricing Configuration
//!
//! The single, versioned configuration document that drives both the
//! production calculator (machine speeds) and the price resolver (price
//! table, finishings, quantity tiers, tax).
//!
//! ## Document Shape (schema v2)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PricingConfiguration                                                   │
//! │  ├── schemaVersion: 2                                                   │
//! │  ├── prices:        { lanyard_standard: { "15mm": 1.20, ... }, ... }    │
//! │  ├── finishings:    [ { name: "mosquetao", unitPrice: 1.06 }, ... ]     │
//! │  ├── quantityTiers: [ { min: 200, max: 500, factor: 1.17 }, ... ]       │
//! │  ├── taxRate:       15                                                  │
//! │  └── machines:      { plotter: {...}, calendering: {...} }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The configuration is a plain value. Callers load it (from the settings
//! table, a file, or the defaults) and pass it into every calculation.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use ts_rs::TS;

use crate::error::{ConfigurationError, ValidationError};
use crate::inventory::fold_name;
use crate::types::{ProductType, TapeWidth, TaxRate};
use crate::validation::{validate_finishing_name, validate_tax_percentage};

/// Schema version written by this build.
///
/// v1 was a flat width-keyed price table with per-piece finishing
/// quantities. It is not readable anymore.
pub const CURRENT_SCHEMA_VERSION: u32 = 2;

// =============================================================================
// Price Table
// =============================================================================

/// Base unit prices keyed by product type, then tape width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(transparent)]
pub struct PriceTable(
    #[ts(type = "Partial<Record<ProductType, Partial<Record<TapeWidth, string>>>>")]
    BTreeMap<ProductType, BTreeMap<TapeWidth, Decimal>>,
);

impl PriceTable {
    pub fn new() -> Self {
        PriceTable(BTreeMap::new())
    }

    /// Sets (or replaces) the base price of one product/width pair.
    pub fn set(&mut self, product: ProductType, width: TapeWidth, price: Decimal) {
        self.0.entry(product).or_default().insert(width, price);
    }

    /// Builder form of [`PriceTable::set`].
    pub fn with(mut self, product: ProductType, width: TapeWidth, price: Decimal) -> Self {
        self.set(product, width, price);
        self
    }

    /// Looks up a base price, failing when the pair was never priced.
    pub fn base_price(
        &self,
        product: ProductType,
        width: TapeWidth,
    ) -> Result<Decimal, ConfigurationError> {
        self.0
            .get(&product)
            .and_then(|by_width| by_width.get(&width))
            .copied()
            .ok_or(ConfigurationError::MissingBasePrice { product, width })
    }

    /// Iterates every configured `(product, width, price)` triple.
    pub fn entries(&self) -> impl Iterator<Item = (ProductType, TapeWidth, Decimal)> + '_ {
        self.0.iter().flat_map(|(product, by_width)| {
            by_width
                .iter()
                .map(move |(width, price)| (*product, *width, *price))
        })
    }
}

// =============================================================================
// Finishings & Tiers
// =============================================================================

/// Hardware accessory that can be attached to a piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FinishingOption {
    pub name: String,
    #[serde(alias = "price")]
    #[ts(type = "string")]
    pub unit_price: Decimal,
}

impl FinishingOption {
    pub fn new(name: impl Into<String>, unit_price: Decimal) -> Self {
        FinishingOption {
            name: name.into(),
            unit_price,
        }
    }
}

/// Price multiplier for an inclusive quantity range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuantityTier {
    pub min: u32,
    pub max: u32,
    #[ts(type = "string")]
    pub factor: Decimal,
}

impl QuantityTier {
    pub fn new(min: u32, max: u32, factor: Decimal) -> Self {
        QuantityTier { min, max, factor }
    }

    /// Whether `quantity` falls inside `[min, max]`.
    #[inline]
    pub fn contains(&self, quantity: u32) -> bool {
        self.min <= quantity && quantity <= self.max
    }
}

// =============================================================================
// Machine Speeds
// =============================================================================

/// Machine speed measured as "this many meters in this much time".
///
/// Older documents stored the calendering press as a single `timeSeconds`
/// value (often above 59). Deserialization folds any overflow into minutes,
/// so `{ timeSeconds: 75 }` reads as 1 min 15 s. Fractional values are
/// kept: fast presses are timed in tenths of a second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", from = "RawMachineSpeed")]
pub struct MachineSpeed {
    pub reference_distance_meters: f64,
    pub time_minutes: f64,
    pub time_seconds: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMachineSpeed {
    reference_distance_meters: f64,
    #[serde(default)]
    time_minutes: f64,
    #[serde(default)]
    time_seconds: f64,
}

impl From<RawMachineSpeed> for MachineSpeed {
    fn from(raw: RawMachineSpeed) -> Self {
        MachineSpeed::new(raw.reference_distance_meters, raw.time_minutes, raw.time_seconds)
    }
}

impl MachineSpeed {
    /// Creates a normalized speed (whole minutes, seconds below 60).
    ///
    /// A negative or non-finite reference time is stored as zero, which
    /// leaves the machine without an estimate.
    pub fn new(reference_distance_meters: f64, minutes: f64, seconds: f64) -> Self {
        let total = minutes * 60.0 + seconds;
        let total = if total.is_finite() && total > 0.0 { total } else { 0.0 };
        let whole_minutes = (total / 60.0).floor();
        MachineSpeed {
            reference_distance_meters,
            time_minutes: whole_minutes,
            time_seconds: total - whole_minutes * 60.0,
        }
    }

    /// Reference time in seconds.
    #[inline]
    pub fn reference_total_seconds(&self) -> f64 {
        self.time_minutes * 60.0 + self.time_seconds
    }

    /// Meters per second, or `None` when the speed can't be derived.
    pub fn meters_per_second(&self) -> Option<f64> {
        let seconds = self.reference_total_seconds();
        if seconds <= 0.0 {
            return None;
        }
        let speed = self.reference_distance_meters / seconds;
        (speed.is_finite() && speed > 0.0).then_some(speed)
    }
}

/// Reference speeds for the two production machines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MachineSpeedConfig {
    pub plotter: MachineSpeed,
    #[serde(alias = "calandra")]
    pub calendering: MachineSpeed,
}

// =============================================================================
// Pricing Configuration
// =============================================================================

/// Everything the calculators need besides the order inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfiguration {
    pub schema_version: u32,
    pub prices: PriceTable,
    #[serde(default)]
    pub finishings: Vec<FinishingOption>,
    /// Evaluated in order; the first matching tier wins.
    #[serde(default, alias = "quantityRules")]
    pub quantity_tiers: Vec<QuantityTier>,
    #[serde(default)]
    #[ts(type = "number")]
    pub tax_rate: TaxRate,
    #[serde(alias = "productionSettings")]
    pub machines: MachineSpeedConfig,
}

impl PricingConfiguration {
    /// The workshop's factory settings.
    ///
    /// Every product shares the same per-width base price until the owner
    /// edits the table.
    pub fn workshop_default() -> Self {
        let mut prices = PriceTable::new();
        for product in ProductType::ALL {
            prices.set(product, TapeWidth::Mm15, dec!(1.20));
            prices.set(product, TapeWidth::Mm20, dec!(2.30));
            prices.set(product, TapeWidth::Mm25, dec!(2.80));
        }

        PricingConfiguration {
            schema_version: CURRENT_SCHEMA_VERSION,
            prices,
            finishings: vec![
                FinishingOption::new("argola", dec!(0.03)),
                FinishingOption::new("jacare", dec!(0.31)),
                FinishingOption::new("fecho", dec!(0.29)),
                FinishingOption::new("trava", dec!(0.11)),
                FinishingOption::new("mosquetao", dec!(1.06)),
            ],
            quantity_tiers: vec![
                QuantityTier::new(20, 49, dec!(3.64)),
                QuantityTier::new(50, 99, dec!(2.03)),
                QuantityTier::new(100, 199, dec!(1.23)),
                QuantityTier::new(200, 500, dec!(1.17)),
            ],
            tax_rate: TaxRate::from_bps(1500),
            machines: MachineSpeedConfig {
                plotter: MachineSpeed::new(0.90, 4.0, 11.0),
                calendering: MachineSpeed::new(0.90, 0.0, 3.0),
            },
        }
    }

    /// Parses a stored configuration document.
    ///
    /// ## Errors
    /// - `Parse` for malformed JSON or missing fields
    /// - `UnsupportedSchema` for any version other than the current one
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let document: serde_json::Value = serde_json::from_str(json)?;

        // Version first: an old document is reported as such, not as a
        // list of missing fields.
        let found = document
            .get("schemaVersion")
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as u32;
        if found != CURRENT_SCHEMA_VERSION {
            return Err(ConfigurationError::UnsupportedSchema {
                found,
                expected: CURRENT_SCHEMA_VERSION,
            });
        }

        Ok(serde_json::from_value(document)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigurationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Finds a configured finishing, ignoring case and accents.
    pub fn finishing(&self, name: &str) -> Option<&FinishingOption> {
        let wanted = fold_name(name);
        self.finishings.iter().find(|f| fold_name(&f.name) == wanted)
    }

    /// Reviews the configuration for entries the settings screen should flag.
    ///
    /// Advisory only: nothing found here stops a quote.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        for (product, width, price) in self.prices.entries() {
            if price.is_sign_negative() {
                issues.push(ConfigIssue::NegativeBasePrice { product, width });
            }
        }
        for product in ProductType::ALL {
            for width in TapeWidth::ALL {
                if self.prices.base_price(product, width).is_err() {
                    issues.push(ConfigIssue::UnpricedCombination { product, width });
                }
            }
        }

        let mut seen = HashSet::new();
        for finishing in &self.finishings {
            if let Err(error) = validate_finishing_name(&finishing.name) {
                issues.push(ConfigIssue::InvalidFinishingName {
                    name: finishing.name.clone(),
                    error,
                });
            }
            if finishing.unit_price.is_sign_negative() {
                issues.push(ConfigIssue::NegativeFinishingPrice(finishing.name.clone()));
            }
            if !seen.insert(fold_name(&finishing.name)) {
                issues.push(ConfigIssue::DuplicateFinishing(finishing.name.clone()));
            }
        }

        for (index, tier) in self.quantity_tiers.iter().enumerate() {
            if tier.min > tier.max {
                issues.push(ConfigIssue::InvertedTier { index });
            }
            if tier.factor <= Decimal::ZERO {
                issues.push(ConfigIssue::NonPositiveFactor { index });
            }
        }

        let mut ordered: Vec<(usize, &QuantityTier)> = self
            .quantity_tiers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.min <= t.max)
            .collect();
        ordered.sort_by_key(|(_, t)| (t.min, t.max));
        for pair in ordered.windows(2) {
            let (first_idx, first) = pair[0];
            let (second_idx, second) = pair[1];
            if second.min <= first.max {
                issues.push(ConfigIssue::OverlappingTiers {
                    first: first_idx,
                    second: second_idx,
                });
            } else if second.min > first.max.saturating_add(1) {
                issues.push(ConfigIssue::TierGap {
                    from: first.max.saturating_add(1),
                    to: second.min - 1,
                });
            }
        }

        if self.machines.plotter.meters_per_second().is_none() {
            issues.push(ConfigIssue::MachineSpeedUnset("plotter"));
        }
        if self.machines.calendering.meters_per_second().is_none() {
            issues.push(ConfigIssue::MachineSpeedUnset("calendering"));
        }

        if let Err(error) = validate_tax_percentage(self.tax_rate.percentage()) {
            issues.push(ConfigIssue::InvalidTaxRate(error));
        }

        issues
    }
}

impl Default for PricingConfiguration {
    fn default() -> Self {
        PricingConfiguration::workshop_default()
    }
}

// =============================================================================
// Configuration Issues
// =============================================================================

/// A non-fatal finding about a pricing configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    NegativeBasePrice { product: ProductType, width: TapeWidth },
    UnpricedCombination { product: ProductType, width: TapeWidth },
    InvalidFinishingName { name: String, error: ValidationError },
    NegativeFinishingPrice(String),
    DuplicateFinishing(String),
    InvertedTier { index: usize },
    NonPositiveFactor { index: usize },
    OverlappingTiers { first: usize, second: usize },
    TierGap { from: u32, to: u32 },
    MachineSpeedUnset(&'static str),
    InvalidTaxRate(ValidationError),
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigIssue::NegativeBasePrice { product, width } => {
                write!(f, "base price for {} {} is negative", product, width)
            }
            ConfigIssue::UnpricedCombination { product, width } => {
                write!(f, "{} {} has no base price and can't be quoted", product, width)
            }
            ConfigIssue::InvalidFinishingName { name, error } => {
                write!(f, "finishing '{}': {}", name, error)
            }
            ConfigIssue::NegativeFinishingPrice(name) => {
                write!(f, "finishing '{}' has a negative price", name)
            }
            ConfigIssue::DuplicateFinishing(name) => {
                write!(f, "finishing '{}' is listed more than once", name)
            }
            ConfigIssue::InvertedTier { index } => {
                write!(f, "tier #{} has min greater than max", index + 1)
            }
            ConfigIssue::NonPositiveFactor { index } => {
                write!(f, "tier #{} has a factor of zero or less", index + 1)
            }
            ConfigIssue::OverlappingTiers { first, second } => write!(
                f,
                "tiers #{} and #{} overlap; the one listed first wins",
                first + 1,
                second + 1
            ),
            ConfigIssue::TierGap { from, to } => {
                write!(f, "quantities {}..={} match no tier and price at factor 1", from, to)
            }
            ConfigIssue::MachineSpeedUnset(machine) => {
                write!(f, "{} has no reference time; estimates will show --:--", machine)
            }
            ConfigIssue::InvalidTaxRate(error) => write!(f, "{}", error),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
