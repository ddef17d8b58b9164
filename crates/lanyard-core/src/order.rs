//! # Orders
//!
//! Production orders ("OP") and the calculation frozen into them.
//!
//! ## Snapshot Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderDraft ──► price_order() ──┬── estimate()  ─► CalculationSnapshot  │
//! │                                 └── quote()     ─► unit price, total    │
//! │                                                                         │
//! │  The snapshot is written once and NEVER recomputed on read. Changing    │
//! │  prices or machine speeds later does not touch existing orders; only    │
//! │  an explicit edit (Order::reprice) refreshes it.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::config::PricingConfiguration;
use crate::error::{CoreResult, ValidationError};
use crate::inventory::{requirements_for, MaterialRequirement};
use crate::pricing::{quote, PriceQuote, SelectedFinishing};
use crate::production::{estimate, ProductionEstimate};
use crate::types::{OrderStatus, ProductType, TapeWidth};
use crate::validation::{validate_client_name, validate_quantity};
use crate::DEFAULT_ITEMS_PER_ROW;

// =============================================================================
// Order Item
// =============================================================================

/// One product line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_type: ProductType,
    pub width: TapeWidth,
    pub quantity: u32,
    /// Tax-inclusive unit price at the time of pricing.
    #[ts(type = "string")]
    pub unit_price: Decimal,
    pub color_base: String,
    #[serde(default)]
    pub finishings: Vec<SelectedFinishing>,
    pub art_url: Option<String>,
}

// =============================================================================
// Calculation Snapshot
// =============================================================================

/// The production figures persisted with an order.
///
/// Field names on the wire are shared with existing stored orders and must
/// not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CalculationSnapshot {
    pub total_linear_meters: u64,
    pub paper_rows: u32,
    pub paper_meters_per_side: f64,
    pub paper_consumption_meters: f64,
    pub estimated_cost: f64,
    pub estimated_time_plotter: String,
    #[serde(rename = "estimatedTimeCalandra")]
    pub estimated_time_calendering: String,
}

impl From<&ProductionEstimate> for CalculationSnapshot {
    fn from(est: &ProductionEstimate) -> Self {
        CalculationSnapshot {
            total_linear_meters: est.total_linear_meters,
            paper_rows: est.paper_rows,
            paper_meters_per_side: est.paper_meters_per_side,
            paper_consumption_meters: est.paper_consumption_meters,
            estimated_cost: est.estimated_cost,
            estimated_time_plotter: est.estimated_time_plotter.clone(),
            estimated_time_calendering: est.estimated_time_calendering.clone(),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A production order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub client_id: Option<String>,
    pub client_name: String,
    /// Human-facing OP number printed on the job sheet.
    pub op_number: String,
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub deadline: Option<NaiveDate>,
    pub status: OrderStatus,
    /// The first line drives the calculation.
    pub items: Vec<OrderItem>,
    pub calculation: CalculationSnapshot,
    #[ts(type = "string")]
    pub total_value: Decimal,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// What the operator fills in on the order form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub client_id: Option<String>,
    pub client_name: String,
    #[ts(as = "Option<String>")]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub status: OrderStatus,
    pub product_type: ProductType,
    pub width: TapeWidth,
    pub quantity: u32,
    pub color_base: String,
    #[serde(default)]
    pub finishings: Vec<SelectedFinishing>,
    pub art_url: Option<String>,
}

/// Result of pricing a draft: the line, its figures, and the margin.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedOrder {
    pub item: OrderItem,
    pub estimate: ProductionEstimate,
    pub quote: PriceQuote,
    pub calculation: CalculationSnapshot,
    pub total_value: Decimal,
    /// Gross margin in percent, 1 decimal place.
    pub margin_percent: Decimal,
}

/// Estimates and prices a draft in one pass.
///
/// Both calculations run on the same inputs so the snapshot and the unit
/// price always describe the same job.
///
/// ## Errors
/// - `Validation` for an empty client name or a quantity outside 1..=1 000 000
/// - `Configuration` for a missing base price or unknown finishing
pub fn price_order(draft: &OrderDraft, config: &PricingConfiguration) -> CoreResult<PricedOrder> {
    validate_client_name(&draft.client_name)?;
    validate_quantity(draft.quantity)?;

    let est = estimate(
        draft.product_type,
        draft.width,
        draft.quantity,
        Some(&config.machines),
        DEFAULT_ITEMS_PER_ROW,
    );
    let price = quote(
        draft.product_type,
        draft.width,
        draft.quantity,
        &draft.finishings,
        config,
    )?;

    let total_value = price.order_total(draft.quantity);
    let margin_percent = gross_margin(total_value, est.estimated_cost);

    let item = OrderItem {
        product_type: draft.product_type,
        width: draft.width,
        quantity: draft.quantity,
        unit_price: price.unit_price,
        color_base: draft.color_base.clone(),
        finishings: draft.finishings.clone(),
        art_url: draft.art_url.clone(),
    };

    Ok(PricedOrder {
        item,
        calculation: CalculationSnapshot::from(&est),
        estimate: est,
        quote: price,
        total_value,
        margin_percent,
    })
}

/// `(total - cost) / total × 100`, 1 decimal place; 0 when total is 0.
pub fn gross_margin(total_value: Decimal, estimated_cost: f64) -> Decimal {
    if total_value.is_zero() {
        return Decimal::ZERO;
    }
    let cost = Decimal::try_from(estimated_cost)
        .unwrap_or_default()
        .round_dp(2);
    ((total_value - cost) / total_value * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

impl Order {
    /// Prices a draft and stamps a new order.
    pub fn from_draft(
        draft: OrderDraft,
        op_number: impl Into<String>,
        config: &PricingConfiguration,
    ) -> CoreResult<Self> {
        let priced = price_order(&draft, config)?;
        let now = Utc::now();

        Ok(Order {
            id: Uuid::new_v4().to_string(),
            client_id: draft.client_id,
            client_name: draft.client_name.trim().to_string(),
            op_number: op_number.into(),
            date: now.date_naive(),
            deadline: draft.deadline,
            status: draft.status,
            items: vec![priced.item],
            calculation: priced.calculation,
            total_value: priced.total_value,
            created_at: now,
            updated_at: now,
        })
    }

    /// The line that drives the calculation.
    pub fn primary_item(&self) -> Option<&OrderItem> {
        self.items.first()
    }

    /// Recomputes unit price, snapshot, and total from the current
    /// configuration. Used when an order is edited.
    pub fn reprice(&mut self, config: &PricingConfiguration) -> CoreResult<()> {
        let item = self.primary_item().ok_or_else(|| ValidationError::Required {
            field: "items".to_string(),
        })?;

        let draft = OrderDraft {
            client_id: self.client_id.clone(),
            client_name: self.client_name.clone(),
            deadline: self.deadline,
            status: self.status,
            product_type: item.product_type,
            width: item.width,
            quantity: item.quantity,
            color_base: item.color_base.clone(),
            finishings: item.finishings.clone(),
            art_url: item.art_url.clone(),
        };
        let priced = price_order(&draft, config)?;

        self.items[0] = priced.item;
        self.calculation = priced.calculation;
        self.total_value = priced.total_value;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Gross margin from the frozen snapshot.
    pub fn margin_percent(&self) -> Decimal {
        gross_margin(self.total_value, self.calculation.estimated_cost)
    }

    /// Materials this order consumes when it enters production.
    pub fn material_requirements(&self) -> Vec<MaterialRequirement> {
        match self.primary_item() {
            Some(item) => requirements_for(item, &self.calculation),
            None => Vec::new(),
        }
    }
}

// =============================================================================
// Order Summary
// =============================================================================

/// Dashboard counters over the order book.
///
/// Cancelled orders are counted nowhere and earn no revenue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// Quotes plus everything not yet completed.
    pub active: u32,
    pub quotes: u32,
    /// Printing, calendering or finishing.
    pub on_the_floor: u32,
    /// Completed or delivered.
    pub finished: u32,
    /// Sum of order totals, cancelled orders excluded.
    #[ts(type = "string")]
    pub revenue: Decimal,
}

impl OrderSummary {
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Self {
        let mut summary = OrderSummary::default();
        for order in orders {
            summary.record(order.status, order.total_value);
        }
        summary
    }

    /// Counts one order.
    pub fn record(&mut self, status: OrderStatus, total_value: Decimal) {
        match status {
            OrderStatus::Cancelled => return,
            OrderStatus::Quote => self.quotes += 1,
            OrderStatus::Printing | OrderStatus::Calendering | OrderStatus::Finishing => {
                self.on_the_floor += 1
            }
            OrderStatus::Completed | OrderStatus::Delivered => self.finished += 1,
            OrderStatus::Approved => {}
        }
        if !matches!(status, OrderStatus::Completed | OrderStatus::Delivered) {
            self.active += 1;
        }
        self.revenue += total_value;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, CoreError};
    use crate::inventory::Material;
    use crate::types::RollWidth;
    use rust_decimal_macros::dec;

    fn draft(quantity: u32) -> OrderDraft {
        OrderDraft {
            client_id: None,
            client_name: "Escola Municipal Aurora".to_string(),
            deadline: NaiveDate::from_ymd_opt(2026, 11, 20),
            status: OrderStatus::Quote,
            product_type: ProductType::LanyardStandard,
            width: TapeWidth::Mm20,
            quantity,
            color_base: "Azul Royal".to_string(),
            finishings: vec![],
            art_url: None,
        }
    }

    #[test]
    fn test_price_order_freezes_both_calculations() {
        let config = PricingConfiguration::workshop_default();
        let priced = price_order(&draft(500), &config).unwrap();

        assert_eq!(priced.item.unit_price, dec!(3.095));
        assert_eq!(priced.total_value, dec!(1547.50));
        assert_eq!(priced.calculation.total_linear_meters, 450);
        assert_eq!(priced.calculation.paper_consumption_meters, 189.0);
        assert_eq!(priced.calculation.estimated_cost, 387.9);
        assert_eq!(priced.calculation.estimated_time_plotter, "14h 38m");
        // (1547.50 - 387.90) / 1547.50 × 100 = 74.93
        assert_eq!(priced.margin_percent, dec!(74.9));
    }

    #[test]
    fn test_price_order_validates_input() {
        let config = PricingConfiguration::workshop_default();

        let err = price_order(&draft(0), &config).unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::MustBePositive { .. })));

        let mut blank = draft(10);
        blank.client_name = "  ".to_string();
        assert!(matches!(
            price_order(&blank, &config),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));

        let mut odd = draft(100);
        odd.finishings = vec![SelectedFinishing::new("fivela", 100)];
        assert!(matches!(
            price_order(&odd, &config),
            Err(CoreError::Configuration(ConfigurationError::UnknownFinishing(_)))
        ));
    }

    #[test]
    fn test_gross_margin_edges() {
        assert_eq!(gross_margin(Decimal::ZERO, 100.0), Decimal::ZERO);
        assert_eq!(gross_margin(dec!(100), 25.0), dec!(75.0));
        assert_eq!(gross_margin(dec!(100), 150.0), dec!(-50.0));
    }

    #[test]
    fn test_snapshot_has_exactly_the_persisted_fields() {
        let config = PricingConfiguration::workshop_default();
        let priced = price_order(&draft(500), &config).unwrap();
        let json = serde_json::to_value(&priced.calculation).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 7);
        for key in [
            "totalLinearMeters",
            "paperRows",
            "paperMetersPerSide",
            "paperConsumptionMeters",
            "estimatedCost",
            "estimatedTimePlotter",
            "estimatedTimeCalandra",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_snapshot_is_not_touched_by_config_changes() {
        let mut config = PricingConfiguration::workshop_default();
        let mut order = Order::from_draft(draft(500), "1001", &config).unwrap();
        let frozen = order.clone();

        config.tax_rate = crate::types::TaxRate::zero();
        assert_eq!(order, frozen);

        order.reprice(&config).unwrap();
        assert_eq!(order.items[0].unit_price, dec!(2.691));
        assert_eq!(order.total_value, dec!(1345.50));
        assert_eq!(order.calculation, frozen.calculation);
        assert_eq!(order.id, frozen.id);
    }

    #[test]
    fn test_from_draft_stamps_identity() {
        let config = PricingConfiguration::workshop_default();
        let order = Order::from_draft(draft(100), "1002", &config).unwrap();

        assert!(crate::validation::validate_uuid(&order.id).is_ok());
        assert_eq!(order.op_number, "1002");
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.date, order.created_at.date_naive());
    }

    #[test]
    fn test_material_requirements_follow_snapshot() {
        let config = PricingConfiguration::workshop_default();
        let mut d = draft(500);
        d.width = TapeWidth::Mm25;
        d.finishings = vec![SelectedFinishing::new("mosquetão", 500)];
        let order = Order::from_draft(d, "1003", &config).unwrap();

        let reqs = order.material_requirements();
        assert_eq!(reqs.len(), 3);
        assert_eq!(reqs[1].material, Material::Paper(RollWidth::Mm220));
        assert_eq!(reqs[1].quantity, order.calculation.paper_consumption_meters);
    }

    #[test]
    fn test_reprice_without_items_is_rejected() {
        let config = PricingConfiguration::workshop_default();
        let mut order = Order::from_draft(draft(100), "1004", &config).unwrap();
        order.items.clear();

        assert!(order.reprice(&config).is_err());
        assert!(order.material_requirements().is_empty());
    }

    #[test]
    fn test_legacy_order_json_reads() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "clientId": null,
            "clientName": "Clube Atlético",
            "opNumber": "1023",
            "date": "2026-10-01",
            "deadline": "2026-10-20",
            "status": "impressao",
            "items": [{
                "productType": "tirante",
                "width": "20mm",
                "quantity": 500,
                "unitPrice": 3.095,
                "colorBase": "Preto",
                "finishings": [{ "type": "mosquetao", "quantity": 500 }],
                "artUrl": null
            }],
            "calculation": {
                "totalLinearMeters": 450,
                "paperRows": 5,
                "paperMetersPerSide": 90.0,
                "paperConsumptionMeters": 189.0,
                "estimatedCost": 387.9,
                "estimatedTimePlotter": "14h 38m",
                "estimatedTimeCalandra": "0h 10m"
            },
            "totalValue": 1547.5,
            "createdAt": "2026-10-01T12:00:00Z",
            "updatedAt": "2026-10-01T12:00:00Z"
        }"#;

        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.status, OrderStatus::Printing);
        assert_eq!(order.items[0].product_type, ProductType::LanyardStandard);
        assert_eq!(order.items[0].unit_price, dec!(3.095));
        assert_eq!(order.calculation.estimated_time_calendering, "0h 10m");
    }

    #[test]
    fn test_summary_skips_cancelled_orders() {
        let mut summary = OrderSummary::default();
        summary.record(OrderStatus::Quote, dec!(100.00));
        summary.record(OrderStatus::Approved, dec!(250.00));
        summary.record(OrderStatus::Printing, dec!(300.00));
        summary.record(OrderStatus::Finishing, dec!(50.00));
        summary.record(OrderStatus::Delivered, dec!(1000.00));
        summary.record(OrderStatus::Cancelled, dec!(9999.00));

        assert_eq!(summary.active, 4);
        assert_eq!(summary.quotes, 1);
        assert_eq!(summary.on_the_floor, 2);
        assert_eq!(summary.finished, 1);
        assert_eq!(summary.revenue, dec!(1700.00));
    }

    #[test]
    fn test_summary_from_priced_orders() {
        let config = PricingConfiguration::workshop_default();
        let mut quote = Order::from_draft(draft(500), "1001", &config).unwrap();
        quote.status = OrderStatus::Quote;
        let mut cancelled = quote.clone();
        cancelled.status = OrderStatus::Cancelled;

        let summary = OrderSummary::from_orders([&quote, &cancelled]);
        assert_eq!(summary.active, 1);
        assert_eq!(summary.revenue, quote.total_value);
    }
}
