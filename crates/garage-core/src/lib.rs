//! # garage-core: Pure Business Logic for Garage Billing
//!
//! This crate is the **heart** of the repair-shop billing system. It contains
//! all business logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Garage Billing Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ garage-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐     │   │
//! │  │   │  types   │  │  money   │  │ pricing  │  │   status   │     │   │
//! │  │   │ Vehicle  │  │  Money   │  │ markup   │  │ JobStatus  │     │   │
//! │  │   │ Job      │  │  Rate    │  │ discount │  │ transition │     │   │
//! │  │   │ Invoice  │  │          │  │ VAT      │  │   table    │     │   │
//! │  │   └──────────┘  └──────────┘  └──────────┘  └────────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    garage-db (Database Layer)                   │   │
//! │  │    SQLite repositories, eligibility, invoice writer, checker    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Vehicle, Job, CustomerInvoice, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The invoice pricing calculator (markup, discount, VAT)
//! - [`status`] - Job status state machine with enforced transitions
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use garage_core::money::Money;
//! use garage_core::pricing::{price_invoice, BillableLine};
//! use garage_core::types::{BillingItemType, BillingSettings, Rate};
//!
//! let lines = vec![BillableLine::new(
//!     "job-1",
//!     BillingItemType::IsuzuPart,
//!     "item-1",
//!     "Brake caliper",
//!     Money::from_cents(100_000), // cost 1,000.00
//!     2,
//! )];
//!
//! // 20% default parts markup, 10% overall discount, 16% VAT
//! let invoice = price_invoice(
//!     &lines,
//!     Rate::from_bps(1_000),
//!     &BillingSettings::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(invoice.total_amount.cents(), 250_560); // 2,505.60
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod status;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use garage_core::Money` instead of
// `use garage_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{price_invoice, BillableLine, PricedInvoice, PricedLine};
pub use status::{validate_transition, JobStatus};
pub use types::*;
