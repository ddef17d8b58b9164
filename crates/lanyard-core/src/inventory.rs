//! # Inventory Policy
//!
//! Decides whether an order can go into production and what it consumes.
//! Storage is someone else's job: this module only reads a stock view
//! through [`StockLookup`] and returns a plan of relative adjustments.
//!
//! ## Order Release Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order saved with status S (previously P)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  needs_deduction(P, S)? ── no ──► save, nothing reserved               │
//! │       │ yes                                                             │
//! │       ▼                                                                 │
//! │  requirements_for(item, calculation)                                   │
//! │       │   tape:      total linear meters                               │
//! │       │   paper:     paper consumption meters                          │
//! │       │   finishing: order-level quantity                              │
//! │       ▼                                                                 │
//! │  check_stock(requirements, stock)                                      │
//! │       ├── Err(StockShortfall) ──► block save, show EVERY line          │
//! │       └── Ok(plan) ──► storage applies "quantity - N" per row          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use ts_rs::TS;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::StockShortfall;
use crate::order::{CalculationSnapshot, OrderItem};
use crate::types::{OrderStatus, RollWidth, TapeWidth};

// =============================================================================
// Stock Items
// =============================================================================

/// Inventory categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StockCategory {
    /// Sublimation paper rolls (meters).
    #[serde(alias = "papel")]
    Paper,
    /// Tracked for purchasing only, never deducted by orders.
    #[serde(alias = "tinta")]
    Ink,
    /// Polyester tape (meters).
    #[serde(alias = "fita")]
    Tape,
    /// Finishing hardware (units).
    #[serde(alias = "acessorio")]
    Accessory,
    #[serde(alias = "embalagem")]
    Packaging,
}

/// A stock row as the inventory screen shows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub category: StockCategory,
    pub quantity: f64,
    /// `"m"` or `"un"`.
    pub unit: String,
    /// Alert threshold.
    pub min_stock: f64,
    pub location: Option<String>,
}

impl InventoryItem {
    /// Whether the row is at or below its alert threshold.
    #[inline]
    pub fn is_low(&self) -> bool {
        self.quantity <= self.min_stock
    }
}

/// A stock row matched for a material.
#[derive(Debug, Clone, PartialEq)]
pub struct StockMatch {
    pub item_id: String,
    pub name: String,
    pub available: f64,
}

impl From<&InventoryItem> for StockMatch {
    fn from(item: &InventoryItem) -> Self {
        StockMatch {
            item_id: item.id.clone(),
            name: item.name.clone(),
            available: item.quantity,
        }
    }
}

// =============================================================================
// Stock Lookup
// =============================================================================

/// Read access to current stock, by material.
///
/// Implemented by [`InventorySnapshot`] for in-memory lists; the database
/// layer builds a snapshot inside its transaction.
pub trait StockLookup {
    fn find_tape_stock(&self, width: TapeWidth) -> Option<StockMatch>;

    fn find_paper_stock(&self, roll: RollWidth) -> Option<StockMatch>;

    fn find_finishing_stock(&self, name: &str) -> Option<StockMatch>;

    fn find(&self, material: &Material) -> Option<StockMatch> {
        match material {
            Material::Tape(width) => self.find_tape_stock(*width),
            Material::Paper(roll) => self.find_paper_stock(*roll),
            Material::Finishing(name) => self.find_finishing_stock(name),
        }
    }
}

/// A point-in-time list of stock rows.
///
/// Rows are matched by category and name, first match in list order:
/// - tape: name contains the width label (`"20mm"`)
/// - paper: name contains the roll label (`"15cm"` / `"22cm"`)
/// - finishing: accent/case-folded name contains the folded finishing name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InventorySnapshot {
    items: Vec<InventoryItem>,
}

impl InventorySnapshot {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        InventorySnapshot { items }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    fn find_in(&self, category: StockCategory, needle: &str) -> Option<StockMatch> {
        let needle = fold_name(needle);
        if needle.is_empty() {
            return None;
        }
        self.items
            .iter()
            .find(|item| item.category == category && fold_name(&item.name).contains(&needle))
            .map(StockMatch::from)
    }
}

impl StockLookup for InventorySnapshot {
    fn find_tape_stock(&self, width: TapeWidth) -> Option<StockMatch> {
        self.find_in(StockCategory::Tape, width.label())
    }

    fn find_paper_stock(&self, roll: RollWidth) -> Option<StockMatch> {
        self.find_in(StockCategory::Paper, roll.label())
    }

    fn find_finishing_stock(&self, name: &str) -> Option<StockMatch> {
        self.find_in(StockCategory::Accessory, name)
    }
}

/// Lowercases and strips diacritics: `"Mosquetão"` → `"mosquetao"`.
pub fn fold_name(name: &str) -> String {
    name.trim()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

// =============================================================================
// Requirements
// =============================================================================

/// Something an order consumes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Material {
    Tape(TapeWidth),
    Paper(RollWidth),
    Finishing(String),
}

impl Material {
    /// Counting unit for messages.
    pub fn unit(&self) -> &'static str {
        match self {
            Material::Tape(_) | Material::Paper(_) => "m",
            Material::Finishing(_) => "un",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Material::Tape(width) => write!(f, "Tape {}", width),
            Material::Paper(roll) => write!(f, "Paper roll {}", roll),
            Material::Finishing(name) => write!(f, "Finishing {}", name),
        }
    }
}

/// How much of a material an order needs.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRequirement {
    pub material: Material,
    pub quantity: f64,
}

/// Materials needed by an order line, from its frozen calculation.
///
/// Finishing quantities are order totals and are used as-is. Selections
/// that fold to the same name are merged.
pub fn requirements_for(
    item: &OrderItem,
    calculation: &CalculationSnapshot,
) -> Vec<MaterialRequirement> {
    let roll = RollWidth::for_product(item.product_type, item.width);

    let mut requirements = vec![
        MaterialRequirement {
            material: Material::Tape(item.width),
            quantity: calculation.total_linear_meters as f64,
        },
        MaterialRequirement {
            material: Material::Paper(roll),
            quantity: calculation.paper_consumption_meters,
        },
    ];

    let mut by_name: HashMap<String, usize> = HashMap::new();
    for finishing in &item.finishings {
        let key = fold_name(&finishing.name);
        match by_name.get(&key) {
            Some(&index) => requirements[index].quantity += finishing.quantity as f64,
            None => {
                by_name.insert(key, requirements.len());
                requirements.push(MaterialRequirement {
                    material: Material::Finishing(finishing.name.clone()),
                    quantity: finishing.quantity as f64,
                });
            }
        }
    }

    requirements
}

// =============================================================================
// Check & Plan
// =============================================================================

/// One missing material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Shortage {
    pub material: Material,
    pub needed: f64,
    pub available: f64,
}

impl fmt::Display for Shortage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.material.unit();
        match self.material {
            Material::Finishing(_) => write!(
                f,
                "{}: need {:.0} {}, available {:.0} {}",
                self.material, self.needed, unit, self.available, unit
            ),
            _ => write!(
                f,
                "{}: need {:.2} {}, available {:.2} {}",
                self.material, self.needed, unit, self.available, unit
            ),
        }
    }
}

/// A relative stock change: subtract `amount` from row `item_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct StockAdjustment {
    pub item_id: String,
    pub material: Material,
    pub amount: f64,
}

/// Checks every requirement against stock and plans the deduction.
///
/// A material with no stock row counts as zero available. Requirements that
/// land on the same row draw from it cumulatively. All shortages are
/// collected; nothing short-circuits on the first one.
pub fn check_stock(
    requirements: &[MaterialRequirement],
    stock: &impl StockLookup,
) -> Result<Vec<StockAdjustment>, StockShortfall> {
    let mut shortages = Vec::new();
    let mut plan = Vec::new();
    let mut committed: HashMap<String, f64> = HashMap::new();

    for requirement in requirements.iter().filter(|r| r.quantity > 0.0) {
        match stock.find(&requirement.material) {
            Some(found) => {
                let already = committed.get(&found.item_id).copied().unwrap_or(0.0);
                let available = (found.available - already).max(0.0);
                if available < requirement.quantity {
                    shortages.push(Shortage {
                        material: requirement.material.clone(),
                        needed: requirement.quantity,
                        available,
                    });
                } else {
                    *committed.entry(found.item_id.clone()).or_insert(0.0) += requirement.quantity;
                    plan.push(StockAdjustment {
                        item_id: found.item_id,
                        material: requirement.material.clone(),
                        amount: requirement.quantity,
                    });
                }
            }
            None => shortages.push(Shortage {
                material: requirement.material.clone(),
                needed: requirement.quantity,
                available: 0.0,
            }),
        }
    }

    if shortages.is_empty() {
        Ok(plan)
    } else {
        Err(StockShortfall { shortages })
    }
}

/// Plans a deduction without enforcing sufficiency.
///
/// Materials with no stock row are skipped; rows that run short are floored
/// at zero when applied.
pub fn deduction_plan(
    requirements: &[MaterialRequirement],
    stock: &impl StockLookup,
) -> Vec<StockAdjustment> {
    requirements
        .iter()
        .filter(|r| r.quantity > 0.0)
        .filter_map(|r| {
            stock.find(&r.material).map(|found| StockAdjustment {
                item_id: found.item_id,
                material: r.material.clone(),
                amount: r.quantity,
            })
        })
        .collect()
}

/// Whether saving an order with `next` status must consume stock.
///
/// `previous` is `None` for a new order. Stock is consumed exactly once,
/// on the move from a non-production status into a production one.
pub fn needs_deduction(previous: Option<OrderStatus>, next: OrderStatus) -> bool {
    next.is_production() && previous.map_or(true, |p| !p.is_production())
}

/// Stock level after subtracting `amount`, never below zero.
#[inline]
pub fn apply_adjustment(current: f64, amount: f64) -> f64 {
    (current - amount).max(0.0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::SelectedFinishing;
    use crate::types::ProductType;
    use rust_decimal::Decimal;

    fn item(id: &str, name: &str, category: StockCategory, quantity: f64) -> InventoryItem {
        InventoryItem {
            id: id.to_string(),
            name: name.to_string(),
            category,
            quantity,
            unit: if category == StockCategory::Accessory { "un" } else { "m" }.to_string(),
            min_stock: 0.0,
            location: None,
        }
    }

    fn workshop_stock() -> InventorySnapshot {
        InventorySnapshot::new(vec![
            item("p15", "Papel Sublimático Bobina 15cm", StockCategory::Paper, 500.0),
            item("p22", "Papel Sublimático Bobina 22cm", StockCategory::Paper, 100.0),
            item("t20", "Fita Poliéster 20mm Branca", StockCategory::Tape, 2000.0),
            item("t25", "Fita Poliéster 25mm Branca", StockCategory::Tape, 300.0),
            item("mq", "Mosquetão Padrão Niquel", StockCategory::Accessory, 1000.0),
            item("tv", "Trava de Segurança", StockCategory::Accessory, 10.0),
        ])
    }

    fn order_item(width: TapeWidth, finishings: Vec<SelectedFinishing>) -> OrderItem {
        OrderItem {
            product_type: ProductType::LanyardStandard,
            width,
            quantity: 500,
            unit_price: Decimal::ZERO,
            color_base: "Branco".to_string(),
            finishings,
            art_url: None,
        }
    }

    fn calculation(linear: u64, paper: f64) -> CalculationSnapshot {
        CalculationSnapshot {
            total_linear_meters: linear,
            paper_rows: 5,
            paper_meters_per_side: 0.0,
            paper_consumption_meters: paper,
            estimated_cost: 0.0,
            estimated_time_plotter: "--:--".to_string(),
            estimated_time_calendering: "--:--".to_string(),
        }
    }

    #[test]
    fn test_lookup_matches_by_category_and_label() {
        let stock = workshop_stock();
        assert_eq!(stock.find_tape_stock(TapeWidth::Mm20).unwrap().item_id, "t20");
        assert!(stock.find_tape_stock(TapeWidth::Mm15).is_none());
        assert_eq!(stock.find_paper_stock(RollWidth::Mm220).unwrap().item_id, "p22");
        assert_eq!(stock.find_paper_stock(RollWidth::Mm150).unwrap().item_id, "p15");
        assert_eq!(stock.find_finishing_stock("mosquetao").unwrap().item_id, "mq");
        assert_eq!(stock.find_finishing_stock("TRAVA").unwrap().item_id, "tv");
        assert!(stock.find_finishing_stock("").is_none());
    }

    #[test]
    fn test_fold_name() {
        assert_eq!(fold_name("  Jacaré Niquelado "), "jacare niquelado");
        assert_eq!(fold_name("MOSQUETÃO"), "mosquetao");
    }

    #[test]
    fn test_requirements_from_calculation() {
        let line = order_item(
            TapeWidth::Mm25,
            vec![
                SelectedFinishing::new("mosquetão", 500),
                SelectedFinishing::new("Mosquetao", 100),
            ],
        );
        let reqs = requirements_for(&line, &calculation(450, 189.0));

        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[0].material, Material::Tape(TapeWidth::Mm25));
        assert_eq!(reqs[0].quantity, 450.0);
        assert_eq!(reqs[1].material, Material::Paper(RollWidth::Mm220));
        assert_eq!(reqs[1].quantity, 189.0);
        assert_eq!(reqs[2].quantity, 600.0);
    }

    #[test]
    fn test_check_stock_reports_every_shortage() {
        let line = order_item(
            TapeWidth::Mm25,
            vec![
                SelectedFinishing::new("mosquetao", 500),
                SelectedFinishing::new("trava", 500),
                SelectedFinishing::new("jacare", 500),
            ],
        );
        let reqs = requirements_for(&line, &calculation(450, 189.0));

        let err = check_stock(&reqs, &workshop_stock()).unwrap_err();
        let short: Vec<&Material> = err.shortages.iter().map(|s| &s.material).collect();

        // tape 300 < 450, paper 100 < 189, trava 10 < 500, jacare has no row
        assert_eq!(
            short,
            vec![
                &Material::Tape(TapeWidth::Mm25),
                &Material::Paper(RollWidth::Mm220),
                &Material::Finishing("trava".to_string()),
                &Material::Finishing("jacare".to_string()),
            ]
        );
        assert_eq!(err.shortages[3].available, 0.0);
        assert_eq!(err.messages().len(), 4);
    }

    #[test]
    fn test_check_stock_plans_relative_deductions() {
        let line = order_item(TapeWidth::Mm20, vec![SelectedFinishing::new("mosquetão", 500)]);
        let reqs = requirements_for(&line, &calculation(450, 189.0));

        let plan = check_stock(&reqs, &workshop_stock()).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].item_id, "t20");
        assert_eq!(plan[0].amount, 450.0);
        assert_eq!(plan[1].item_id, "p15");
        assert_eq!(plan[1].amount, 189.0);
        assert_eq!(plan[2].item_id, "mq");
        assert_eq!(plan[2].amount, 500.0);
    }

    #[test]
    fn test_exact_stock_is_enough() {
        let reqs = vec![MaterialRequirement {
            material: Material::Paper(RollWidth::Mm220),
            quantity: 100.0,
        }];
        assert!(check_stock(&reqs, &workshop_stock()).is_ok());
    }

    #[test]
    fn test_requirements_sharing_a_row_are_cumulative() {
        // "trava" and "Trava de" both land on row tv (10 units)
        let reqs = vec![
            MaterialRequirement {
                material: Material::Finishing("trava".to_string()),
                quantity: 6.0,
            },
            MaterialRequirement {
                material: Material::Finishing("trava de".to_string()),
                quantity: 6.0,
            },
        ];
        let err = check_stock(&reqs, &workshop_stock()).unwrap_err();
        assert_eq!(err.shortages.len(), 1);
        assert_eq!(err.shortages[0].available, 4.0);
    }

    #[test]
    fn test_deduction_plan_skips_missing_rows() {
        let line = order_item(TapeWidth::Mm15, vec![SelectedFinishing::new("jacare", 50)]);
        let reqs = requirements_for(&line, &calculation(450, 189.0));

        let plan = deduction_plan(&reqs, &workshop_stock());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].item_id, "p15");
    }

    #[test]
    fn test_needs_deduction_transitions() {
        use OrderStatus::*;

        assert!(needs_deduction(None, Approved));
        assert!(!needs_deduction(None, Quote));
        assert!(!needs_deduction(None, Cancelled));
        assert!(needs_deduction(Some(Quote), Printing));
        assert!(needs_deduction(Some(Cancelled), Approved));
        assert!(!needs_deduction(Some(Approved), Printing));
        assert!(!needs_deduction(Some(Printing), Cancelled));
        assert!(!needs_deduction(Some(Quote), Quote));
    }

    #[test]
    fn test_apply_adjustment_floors_at_zero() {
        assert_eq!(apply_adjustment(100.0, 40.0), 60.0);
        assert_eq!(apply_adjustment(10.0, 40.0), 0.0);
    }

    #[test]
    fn test_low_stock_flag() {
        let mut row = item("x", "Argola", StockCategory::Accessory, 50.0);
        row.min_stock = 50.0;
        assert!(row.is_low());
        row.quantity = 51.0;
        assert!(!row.is_low());
    }
}
