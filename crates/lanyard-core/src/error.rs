//! # Error Types
//!
//! Domain-specific error types for lanyard-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  lanyard-core errors (this file)                                       │
//! │  ├── CoreError           - Configuration or validation failure         │
//! │  ├── ConfigurationError  - Pricing table can't price the request       │
//! │  ├── ValidationError     - Operator input failures                     │
//! │  └── StockShortfall      - Materials missing, wrapped by DbError::Stock │
//! │                                                                         │
//! │  lanyard-db errors (separate crate)                                    │
//! │  └── DbError             - Database operation failures                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → Dashboard               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Not every odd input is an error. A quantity outside every tier prices at
//! factor 1, a zero `items_per_row` is corrected to 5, and a machine with no
//! reference time shows `"--:--"`. Only states that would silently under-price
//! or over-commit material are errors.

use thiserror::Error;

use crate::inventory::Shortage;
use crate::types::{ProductType, TapeWidth};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The pricing configuration can't price this request.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Operator input failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Configuration Error
// =============================================================================

/// Pricing configuration errors.
///
/// These block the quote. Defaulting a missing price to zero would sell the
/// order below cost, so the resolver fails fast instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    /// The price table has no base price for this product/width pair.
    ///
    /// ## When This Occurs
    /// - A product type was added to the catalog but never priced
    /// - A stored configuration was edited by hand and lost an entry
    #[error("No base price configured for {product} {width}")]
    MissingBasePrice {
        product: ProductType,
        width: TapeWidth,
    },

    /// A selected finishing does not exist in the configuration.
    #[error("Finishing '{0}' is not configured")]
    UnknownFinishing(String),

    /// The stored document uses a schema this build can't read.
    #[error("Unsupported pricing schema version {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },

    /// The configuration document could not be parsed.
    #[error("Invalid pricing configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigurationError {
    fn from(err: serde_json::Error) -> Self {
        ConfigurationError::Parse(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Stock Shortfall
// =============================================================================

/// Every material that is short for an order, collected in one pass.
///
/// ## User Workflow
/// ```text
/// Operator clicks "Aprovar" (approve)
///      │
///      ▼
/// check_stock(requirements, inventory)
///      │
///      ▼
/// StockShortfall { shortages: [paper 22cm, mosquetao] }
///      │
///      ▼
/// Dashboard lists BOTH lines, order stays a quote
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
#[error("Insufficient stock for {}", describe_shortages(.shortages))]
pub struct StockShortfall {
    pub shortages: Vec<Shortage>,
}

impl StockShortfall {
    /// One human-readable line per missing material.
    pub fn messages(&self) -> Vec<String> {
        self.shortages.iter().map(|s| s.to_string()).collect()
    }
}

fn describe_shortages(shortages: &[Shortage]) -> String {
    let lines: Vec<String> = shortages.iter().map(|s| s.to_string()).collect();
    format!("{} material(s): {}", shortages.len(), lines.join("; "))
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Material;
    use crate::types::RollWidth;

    #[test]
    fn test_missing_base_price_message() {
        let err = ConfigurationError::MissingBasePrice {
            product: ProductType::Keychain,
            width: TapeWidth::Mm25,
        };
        assert_eq!(err.to_string(), "No base price configured for keychain 25mm");
    }

    #[test]
    fn test_shortfall_lists_every_shortage() {
        let err = StockShortfall {
            shortages: vec![
                Shortage {
                    material: Material::Paper(RollWidth::Mm220),
                    needed: 189.0,
                    available: 20.0,
                },
                Shortage {
                    material: Material::Finishing("mosquetao".to_string()),
                    needed: 500.0,
                    available: 0.0,
                },
            ],
        };

        let messages = err.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], "Paper roll 22cm: need 189.00 m, available 20.00 m");
        assert_eq!(messages[1], "Finishing mosquetao: need 500 un, available 0 un");
        assert!(err.to_string().starts_with("Insufficient stock for 2 material(s)"));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "client_name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
