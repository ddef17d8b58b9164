//! # Production Calculator
//!
//! Turns an order line (product, tape width, quantity) into material
//! consumption, material cost and machine time.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  quantity × strap length ──► tape meters ──────────────► ceil ► tape   │
//! │                                   │                                     │
//! │                                   ├─ ÷ items per row ──► paper / side   │
//! │                                   │                                     │
//! │                                   └─ × 2 sides ÷ items per row × 1.05   │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                   paper consumption ──► plotter time    │
//! │                                            │        └─► calendering     │
//! │                                            ▼                            │
//! │                            paper × roll rate + tape × 0.40 ► cost       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Intermediate values stay at full precision. Rounding to 2 decimal places
//! happens once, when the estimate is built.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::config::{MachineSpeed, MachineSpeedConfig};
use crate::types::{ProductType, RollWidth, TapeWidth};
use crate::DEFAULT_ITEMS_PER_ROW;

/// Shown instead of a duration when no machine speed is known.
pub const TIME_SENTINEL: &str = "--:--";

/// Extra paper bought and deducted for misprints and waste.
pub const PAPER_SAFETY_MARGIN: f64 = 1.05;

/// Material cost of one meter of raw tape.
pub const TAPE_COST_PER_METER: f64 = 0.40;

/// Every piece is printed front and back.
const PRINTED_SIDES: f64 = 2.0;

// =============================================================================
// Production Estimate
// =============================================================================

/// Material and time estimate for one order line.
///
/// The first seven fields are the ones frozen into an order
/// (see [`crate::order::CalculationSnapshot`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEstimate {
    /// Raw tape consumption rounded up to whole meters.
    pub total_linear_meters: u64,
    /// Items per row actually used for the paper layout.
    pub paper_rows: u32,
    /// Length of one printed side, no margin (2 dp).
    pub paper_meters_per_side: f64,
    /// Both sides plus the 5% margin (2 dp). Procurement and deduction figure.
    pub paper_consumption_meters: f64,
    /// Paper plus tape cost (2 dp).
    pub estimated_cost: f64,
    /// `"Nh Mm"` or `"--:--"`.
    pub estimated_time_plotter: String,
    #[serde(rename = "estimatedTimeCalandra")]
    pub estimated_time_calendering: String,
    /// Roll stock the job prints on.
    pub roll_width: RollWidth,
    /// Unrounded tape meters.
    pub total_tape_meters: f64,
}

// =============================================================================
// Estimate
// =============================================================================

/// Estimates material and machine time for an order line.
///
/// ## Arguments
/// * `product` - What is being made; fixes the strap length
/// * `width` - Tape width; with `product` selects the paper roll
/// * `quantity` - Finished pieces (0 is allowed and yields all zeros)
/// * `machines` - Reference speeds; `None` leaves both times at `"--:--"`
/// * `items_per_row` - Artwork columns per pass; `<= 0` is read as 5
///
/// ## Example
/// ```rust
/// use lanyard_core::production::estimate;
/// use lanyard_core::types::{ProductType, RollWidth, TapeWidth};
///
/// let est = estimate(ProductType::LanyardStandard, TapeWidth::Mm25, 100, None, 5);
/// assert_eq!(est.total_linear_meters, 90);
/// assert_eq!(est.roll_width, RollWidth::Mm220);
/// assert_eq!(est.estimated_time_plotter, "--:--");
/// ```
pub fn estimate(
    product: ProductType,
    width: TapeWidth,
    quantity: u32,
    machines: Option<&MachineSpeedConfig>,
    items_per_row: i32,
) -> ProductionEstimate {
    let items_per_row = if items_per_row <= 0 {
        DEFAULT_ITEMS_PER_ROW
    } else {
        items_per_row
    };
    let rows = items_per_row as f64;

    // Exact in millimeters, so the ceiling never sees float noise.
    let total_tape_mm = quantity as u64 * product.length_mm();
    let total_linear_meters = total_tape_mm.div_ceil(1000);
    let total_tape_meters = total_tape_mm as f64 / 1000.0;

    let roll_width = RollWidth::for_product(product, width);

    let paper_meters_per_side = total_tape_meters / rows;
    let total_print_meters = total_tape_meters * PRINTED_SIDES;
    let paper_consumption_meters = (total_print_meters / rows) * PAPER_SAFETY_MARGIN;

    let paper_cost = paper_consumption_meters * roll_width.paper_rate_per_meter();
    let tape_cost = total_tape_meters * TAPE_COST_PER_METER;
    let estimated_cost = paper_cost + tape_cost;

    let (estimated_time_plotter, estimated_time_calendering) = match machines {
        Some(m) => (
            machine_time(paper_consumption_meters, &m.plotter),
            machine_time(paper_consumption_meters, &m.calendering),
        ),
        None => (TIME_SENTINEL.to_string(), TIME_SENTINEL.to_string()),
    };

    debug!(
        product = %product,
        width = %width,
        quantity,
        roll = %roll_width,
        paper_meters = paper_consumption_meters,
        "Production estimate computed"
    );

    ProductionEstimate {
        total_linear_meters,
        paper_rows: items_per_row as u32,
        paper_meters_per_side: round_to(paper_meters_per_side, 2),
        paper_consumption_meters: round_to(paper_consumption_meters, 2),
        estimated_cost: round_to(estimated_cost, 2),
        estimated_time_plotter,
        estimated_time_calendering,
        roll_width,
        total_tape_meters,
    }
}

/// [`estimate`] with the standard 5 items per row.
pub fn estimate_default(
    product: ProductType,
    width: TapeWidth,
    quantity: u32,
    machines: Option<&MachineSpeedConfig>,
) -> ProductionEstimate {
    estimate(product, width, quantity, machines, DEFAULT_ITEMS_PER_ROW)
}

/// Time for `paper_meters` at the machine's reference speed.
fn machine_time(paper_meters: f64, speed: &MachineSpeed) -> String {
    match speed.meters_per_second() {
        Some(meters_per_second) => format_duration(paper_meters / meters_per_second),
        None => TIME_SENTINEL.to_string(),
    }
}

/// Formats seconds as `"{hours}h {minutes}m"`, truncating both.
///
/// ```rust
/// use lanyard_core::production::format_duration;
///
/// assert_eq!(format_duration(52_710.0), "14h 38m");
/// assert_eq!(format_duration(59.9), "0h 0m");
/// ```
pub fn format_duration(total_seconds: f64) -> String {
    if !total_seconds.is_finite() || total_seconds < 0.0 {
        return TIME_SENTINEL.to_string();
    }
    let hours = (total_seconds / 3600.0).floor();
    let minutes = ((total_seconds % 3600.0) / 60.0).floor();
    format!("{}h {}m", hours as u64, minutes as u64)
}

/// Rounds half away from zero to `places` decimals.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PricingConfiguration;

    fn machines() -> MachineSpeedConfig {
        PricingConfiguration::workshop_default().machines
    }

    #[test]
    fn test_standard_lanyard_500() {
        let est = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 500, None, 5);

        assert_eq!(est.total_linear_meters, 450);
        assert_eq!(est.paper_rows, 5);
        assert_eq!(est.paper_meters_per_side, 90.0);
        assert_eq!(est.paper_consumption_meters, 189.0);
        // 189 m × 1.10 + 450 m × 0.40
        assert_eq!(est.estimated_cost, 387.9);
        assert_eq!(est.roll_width, RollWidth::Mm150);
    }

    #[test]
    fn test_wide_roll_rate_only_for_25mm_lanyards() {
        let wide = estimate(ProductType::LanyardStandard, TapeWidth::Mm25, 100, None, 5);
        let narrow = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 100, None, 5);
        let keychain = estimate(ProductType::Keychain, TapeWidth::Mm25, 100, None, 5);

        assert_eq!(wide.roll_width, RollWidth::Mm220);
        assert_eq!(narrow.roll_width, RollWidth::Mm150);
        assert_eq!(keychain.roll_width, RollWidth::Mm150);

        // 90 m tape → 37.8 m paper
        assert_eq!(wide.estimated_cost, round_to(37.8 * 1.50 + 90.0 * 0.40, 2));
        assert_eq!(narrow.estimated_cost, round_to(37.8 * 1.10 + 90.0 * 0.40, 2));
        // 29 m tape → 12.18 m paper, 150mm rate
        assert_eq!(keychain.estimated_cost, round_to(12.18 * 1.10 + 29.0 * 0.40, 2));
    }

    #[test]
    fn test_linear_meters_is_ceiling_of_exact_length() {
        for product in ProductType::ALL {
            for quantity in [0u32, 1, 3, 7, 10, 33, 100, 999, 1234, 50_000] {
                let est = estimate(product, TapeWidth::Mm15, quantity, None, 5);
                let exact_mm = quantity as u64 * product.length_mm();
                let expected = (exact_mm + 999) / 1000;
                assert_eq!(est.total_linear_meters, expected, "{} x {}", product, quantity);
            }
        }
    }

    #[test]
    fn test_bracelet_ceiling_does_not_overshoot() {
        // 20 × 0.35 is exactly 7 m
        let est = estimate(ProductType::Bracelet, TapeWidth::Mm15, 20, None, 5);
        assert_eq!(est.total_linear_meters, 7);
        let est = estimate(ProductType::Keychain, TapeWidth::Mm15, 1, None, 5);
        assert_eq!(est.total_linear_meters, 1);
    }

    #[test]
    fn test_paper_consumption_rounds_once() {
        for quantity in [1u32, 7, 13, 101, 777] {
            let est = estimate(ProductType::LanyardCup, TapeWidth::Mm25, quantity, None, 3);
            let tape = quantity as f64 * 1400.0 / 1000.0;
            let expected = round_to((tape * 2.0 / 3.0) * 1.05, 2);
            assert_eq!(est.paper_consumption_meters, expected);
        }
    }

    #[test]
    fn test_items_per_row_coerced() {
        let zero = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 500, None, 0);
        let negative = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 500, None, -4);
        let default = estimate_default(ProductType::LanyardStandard, TapeWidth::Mm20, 500, None);

        assert_eq!(zero.paper_rows, 5);
        assert_eq!(zero, default);
        assert_eq!(negative, default);
    }

    #[test]
    fn test_items_per_row_changes_paper_only() {
        let est = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 500, None, 10);
        assert_eq!(est.paper_rows, 10);
        assert_eq!(est.total_linear_meters, 450);
        assert_eq!(est.paper_meters_per_side, 45.0);
        assert_eq!(est.paper_consumption_meters, 94.5);
    }

    #[test]
    fn test_sentinel_without_machine_config() {
        for quantity in [0u32, 1, 500, 10_000] {
            let est = estimate(ProductType::Keychain, TapeWidth::Mm15, quantity, None, 5);
            assert_eq!(est.estimated_time_plotter, TIME_SENTINEL);
            assert_eq!(est.estimated_time_calendering, TIME_SENTINEL);
        }
    }

    #[test]
    fn test_machine_times() {
        let m = machines();
        let est = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 500, Some(&m), 5);

        // plotter: 0.9 m per 251 s → 189 m ≈ 52 710 s
        assert_eq!(est.estimated_time_plotter, "14h 38m");
        // calendering: 0.9 m per 3 s → 189 m = 630 s
        assert_eq!(est.estimated_time_calendering, "0h 10m");
    }

    #[test]
    fn test_zero_reference_time_falls_back_to_sentinel() {
        let mut m = machines();
        m.calendering = MachineSpeed::new(0.9, 0.0, 0.0);

        let est = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 500, Some(&m), 5);
        assert_eq!(est.estimated_time_plotter, "14h 38m");
        assert_eq!(est.estimated_time_calendering, TIME_SENTINEL);
    }

    #[test]
    fn test_fractional_reference_time() {
        let mut m = machines();
        m.calendering = MachineSpeed::new(0.9, 0.0, 2.5);

        // 0.36 m/s → 189 m = 525 s
        let est = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 500, Some(&m), 5);
        assert_eq!(est.estimated_time_calendering, "0h 8m");
    }

    #[test]
    fn test_zero_quantity() {
        let m = machines();
        let est = estimate(ProductType::LanyardCup, TapeWidth::Mm25, 0, Some(&m), 5);

        assert_eq!(est.total_linear_meters, 0);
        assert_eq!(est.paper_meters_per_side, 0.0);
        assert_eq!(est.paper_consumption_meters, 0.0);
        assert_eq!(est.estimated_cost, 0.0);
        assert_eq!(est.estimated_time_plotter, "0h 0m");
        assert_eq!(est.estimated_time_calendering, "0h 0m");
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let m = machines();
        let a = estimate(ProductType::Bracelet, TapeWidth::Mm25, 4321, Some(&m), 5);
        let b = estimate(ProductType::Bracelet, TapeWidth::Mm25, 4321, Some(&m), 5);
        assert_eq!(a, b);
        assert_eq!(a.paper_consumption_meters.to_bits(), b.paper_consumption_meters.to_bits());
    }

    #[test]
    fn test_snapshot_field_names_on_the_wire() {
        let est = estimate(ProductType::LanyardStandard, TapeWidth::Mm20, 500, None, 5);
        let json = serde_json::to_value(&est).unwrap();

        assert_eq!(json["totalLinearMeters"], 450);
        assert_eq!(json["paperRows"], 5);
        assert_eq!(json["estimatedTimeCalandra"], "--:--");
    }
}
