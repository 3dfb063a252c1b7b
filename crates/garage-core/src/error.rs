//! # Error Types
//!
//! Domain-specific error types for garage-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  garage-core errors (this file)                                         │
//! │  ├── CoreError        - Business-rule violations                        │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  garage-db errors (separate crate)                                      │
//! │  ├── DbError          - Database operation failures                     │
//! │  └── BillingError     - Billing services (wraps both layers)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → BillingError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (job number, item type, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::status::JobStatus;
use crate::types::BillingItemType;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Vehicle cannot be found.
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),

    /// Job cannot be found.
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// A status change not present in the lifecycle transition table.
    ///
    /// ## When This Occurs
    /// - Reopening a completed or invoiced job
    /// - Skipping the quotation approval step
    /// - Invoicing a job that was never completed
    #[error("Job status cannot change from {from} to {to}")]
    InvalidStatusTransition { from: JobStatus, to: JobStatus },

    /// The source row is already referenced by a customer invoice item.
    ///
    /// ## When This Occurs
    /// - Two invoice-generation requests raced over the same item and the
    ///   UNIQUE (item_type, reference_id) constraint fired on the loser
    /// - A stale form resubmission after the item was billed
    #[error("{item_type:?} item {reference_id} is already invoiced")]
    AlreadyInvoiced {
        item_type: BillingItemType,
        reference_id: String,
    },

    /// The job still has uninvoiced billable items.
    ///
    /// `outstanding` carries one human-readable description per item so the
    /// caller can show the user exactly what blocks completion.
    #[error("Job cannot be completed: {} item(s) not yet invoiced", outstanding.len())]
    JobNotCompletable { outstanding: Vec<String> },

    /// An invoice must bill at least one line.
    #[error("No billable lines were supplied for the invoice")]
    EmptyInvoice,

    /// Eligibility resolution found nothing to bill.
    #[error("No eligible items to invoice for {scope}")]
    NothingEligible { scope: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
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

    /// Invalid format (e.g., invalid UUID, invalid plate number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate plate number).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
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

    #[test]
    fn test_error_messages() {
        let err = CoreError::AlreadyInvoiced {
            item_type: BillingItemType::Labor,
            reference_id: "lc-42".to_string(),
        };
        assert_eq!(err.to_string(), "Labor item lc-42 is already invoiced");

        let err = CoreError::InvalidStatusTransition {
            from: JobStatus::Completed,
            to: JobStatus::Open,
        };
        assert_eq!(
            err.to_string(),
            "Job status cannot change from completed to open"
        );
    }

    #[test]
    fn test_not_completable_counts_items() {
        let err = CoreError::JobNotCompletable {
            outstanding: vec![
                "Labor: Engine overhaul (3,000.00)".to_string(),
                "Part 8-94156-245-0: Oil filter x2".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Job cannot be completed: 2 item(s) not yet invoiced"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "plate_number".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
