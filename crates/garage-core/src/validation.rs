//! # Validation Module
//!
//! Input validation for garage billing.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (form handling, out of scope here)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - field-level rules before any write              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL constraints                                               │
//! │  ├── UNIQUE constraints (plate, invoice number, billing guard pair)     │
//! │  └── Foreign key constraints                                            │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum quantity of a single billed unit.
///
/// ## Business Reason
/// Prevents accidental over-billing (e.g., typing 1000 instead of 10).
pub const MAX_QUANTITY: i64 = 999;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a vehicle plate number.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 12 characters
/// - Only alphanumerics, spaces, and hyphens
///
/// ## Example
/// ```rust
/// use garage_core::validation::validate_plate_number;
///
/// assert!(validate_plate_number("KBZ 412A").is_ok());
/// assert!(validate_plate_number("").is_err());
/// assert!(validate_plate_number("KBZ_412A!").is_err());
/// ```
pub fn validate_plate_number(plate: &str) -> ValidationResult<()> {
    let plate = plate.trim();

    if plate.is_empty() {
        return Err(ValidationError::Required {
            field: "plate_number".to_string(),
        });
    }

    if plate.len() > 12 {
        return Err(ValidationError::TooLong {
            field: "plate_number".to_string(),
            max: 12,
        });
    }

    if !plate
        .chars()
        .all(|c| c.is_alphanumeric() || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "plate_number".to_string(),
            reason: "must contain only letters, numbers, spaces, and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a free-text description (job, labor, part, subcontract).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 500 characters
pub fn validate_description(description: &str) -> ValidationResult<()> {
    let description = description.trim();

    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }

    if description.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: 500,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary amount in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (goodwill lines)
pub fn validate_amount_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount or VAT rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
///
/// Markup rates are NOT run through this check; a markup above 100% is a
/// legitimate (if optimistic) business decision.
pub fn validate_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates labor hours.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed 500 hours for one charge
pub fn validate_hours(hours: f64) -> ValidationResult<()> {
    if hours <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "hours".to_string(),
        });
    }

    if hours > 500.0 {
        return Err(ValidationError::OutOfRange {
            field: "hours".to_string(),
            min: 0,
            max: 500,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
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
    fn test_validate_plate_number() {
        assert!(validate_plate_number("KBZ 412A").is_ok());
        assert!(validate_plate_number("KCA-220B").is_ok());

        assert!(validate_plate_number("").is_err());
        assert!(validate_plate_number("   ").is_err());
        assert!(validate_plate_number("PLATE#1").is_err());
        assert!(validate_plate_number("TOOLONGPLATE123").is_err());
    }

    #[test]
    fn test_validate_description() {
        assert!(validate_description("Replace front brake pads").is_ok());
        assert!(validate_description("").is_err());
        assert!(validate_description(&"A".repeat(600)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amount_cents() {
        assert!(validate_amount_cents(0).is_ok());
        assert!(validate_amount_cents(300_000).is_ok());
        assert!(validate_amount_cents(-1).is_err());
    }

    #[test]
    fn test_validate_rate_bps() {
        assert!(validate_rate_bps(0).is_ok());
        assert!(validate_rate_bps(1_600).is_ok());
        assert!(validate_rate_bps(10_000).is_ok());
        assert!(validate_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_hours() {
        assert!(validate_hours(2.5).is_ok());
        assert!(validate_hours(0.0).is_err());
        assert!(validate_hours(-1.0).is_err());
        assert!(validate_hours(501.0).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
