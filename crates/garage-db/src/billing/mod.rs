//! # Billing Services
//!
//! The invoice workflow across repositories, in one place.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing Pipeline                                 │
//! │                                                                         │
//! │  eligible_lines(scope)          ← Eligibility Resolver (eligibility.rs) │
//! │       │  Vec<BillableLine>                                              │
//! │       ▼                                                                 │
//! │  price_invoice(...)             ← garage-core pricing (pure)            │
//! │       │  PricedInvoice                                                  │
//! │       ▼                                                                 │
//! │  generate_invoice(...)          ← Invoice Writer (writer.rs)            │
//! │       │  one transaction: header + items + job status + audit entry     │
//! │       ▼                                                                 │
//! │  check_completion / complete_job ← Completion Checker (completion.rs)   │
//! │                                                                         │
//! │  The UNIQUE (item_type, reference_id) constraint fires inside the       │
//! │  writer's transaction and is the AUTHORITATIVE double-billing signal;   │
//! │  the resolver's SELECT is only a courtesy pre-filter.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use thiserror::Error;

use crate::error::DbError;
use garage_core::CoreError;

mod completion;
mod eligibility;
mod writer;

pub use completion::CompletionReport;
pub use writer::InvoiceRequest;

// =============================================================================
// Error
// =============================================================================

/// Errors from billing workflows: either a business-rule violation from
/// garage-core or a database failure.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for billing operations.
pub type BillingResult<T> = Result<T, BillingError>;

// =============================================================================
// Scope
// =============================================================================

/// What an invoice covers: one job, or every job of a vehicle.
///
/// The vehicle scope is the "full invoice" flow - it aggregates eligible
/// items across all of the vehicle's jobs into a single invoice with
/// job_id = NULL on the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceScope {
    Job(String),
    Vehicle(String),
}

impl InvoiceScope {
    /// Human-readable scope description for error messages.
    pub fn describe(&self) -> String {
        match self {
            InvoiceScope::Job(id) => format!("job {id}"),
            InvoiceScope::Vehicle(id) => format!("vehicle {id}"),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// The billing service: eligibility resolver, invoice writer, and job
/// completion checker.
///
/// Methods are implemented across the submodules:
/// - `eligibility.rs` - [`BillingService::eligible_lines`]
/// - `writer.rs` - [`BillingService::generate_invoice`],
///   [`BillingService::invoice_all_eligible`]
/// - `completion.rs` - [`BillingService::check_completion`],
///   [`BillingService::complete_job`]
#[derive(Debug, Clone)]
pub struct BillingService {
    pub(crate) pool: SqlitePool,
}

impl BillingService {
    /// Creates a new BillingService.
    pub fn new(pool: SqlitePool) -> Self {
        BillingService { pool }
    }
}
