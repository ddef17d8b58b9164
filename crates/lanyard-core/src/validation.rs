//! # Validation Module
//!
//! Field validators for operator input on the order form and the settings
//! screen.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order form / Settings screen                                           │
//! │       │  basic checks in the browser (empty, length)                    │
//! │       ▼                                                                 │
//! │  price_order / save_pricing                                             │
//! │       │  THIS MODULE: business rules                                    │
//! │       ▼                                                                 │
//! │  SQLite: NOT NULL, CHECK, UNIQUE constraints                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator itself accepts quantity 0; only orders need at least one
//! piece.

use crate::error::ValidationError;
use crate::MAX_ORDER_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest accepted finishing or client name.
pub const MAX_NAME_LENGTH: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates the client name on an order.
///
/// ```rust
/// use lanyard_core::validation::validate_client_name;
///
/// assert!(validate_client_name("Escola Estadual Rui Barbosa").is_ok());
/// assert!(validate_client_name("   ").is_err());
/// ```
pub fn validate_client_name(name: &str) -> ValidationResult<()> {
    validate_name("client_name", name)
}

/// Validates a finishing option name in the settings screen.
pub fn validate_finishing_name(name: &str) -> ValidationResult<()> {
    validate_name("finishing", name)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an order quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_ORDER_QUANTITY`]
pub fn validate_quantity(quantity: u32) -> ValidationResult<()> {
    if quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ORDER_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ORDER_QUANTITY as i64,
        });
    }

    Ok(())
}

/// Validates a tax percentage typed in the settings screen (0 to 100).
pub fn validate_tax_percentage(percentage: f64) -> ValidationResult<()> {
    if !percentage.is_finite() || !(0.0..=100.0).contains(&percentage) {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string (order and inventory ids).
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(500).is_ok());
        assert!(validate_quantity(MAX_ORDER_QUANTITY).is_ok());

        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_quantity(MAX_ORDER_QUANTITY + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_client_name("Colégio São José").is_ok());
        assert!(validate_client_name("").is_err());
        assert!(validate_finishing_name("mosquetão").is_ok());
        assert!(validate_finishing_name(&"x".repeat(101)).is_err());
        // counted in characters, not bytes
        assert!(validate_finishing_name(&"ã".repeat(100)).is_ok());
    }

    #[test]
    fn test_validate_tax_percentage() {
        assert!(validate_tax_percentage(0.0).is_ok());
        assert!(validate_tax_percentage(15.0).is_ok());
        assert!(validate_tax_percentage(100.0).is_ok());
        assert!(validate_tax_percentage(-1.0).is_err());
        assert!(validate_tax_percentage(100.5).is_err());
        assert!(validate_tax_percentage(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("OP-0001").is_err());
    }
}
