//! # garage-db: Database Layer for the Garage Billing System
//!
//! This crate provides database access for the garage billing system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Garage Billing Data Flow                            │
//! │                                                                         │
//! │  Caller (UI command, seed tool, tests)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    garage-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────────┐  ┌────────────────┐  ┌─────────────────────┐  │   │
//! │  │  │  Database   │  │  Repositories  │  │   BillingService    │  │   │
//! │  │  │  (pool.rs)  │  │ vehicle, job,  │  │ eligibility, writer,│  │   │
//! │  │  │             │  │ labor, procure-│  │ completion - cross- │  │   │
//! │  │  │ SqlitePool  │◄─│ ment, subcon-  │  │ aggregate trans-    │  │   │
//! │  │  │ Migrations  │  │ tract, invoice,│  │ actions             │  │   │
//! │  │  │             │  │ settings, log  │  │                     │  │   │
//! │  │  └─────────────┘  └────────────────┘  └─────────────────────┘  │   │
//! │  │         │                  │                     │              │   │
//! │  │         └─────── garage-core (pure domain logic) ┘              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL, foreign keys on)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Per-aggregate repositories
//! - [`billing`] - Eligibility resolver, invoice writer, completion checker
//!
//! ## Usage
//!
//! ```rust,ignore
//! use garage_db::{Database, DbConfig, InvoiceRequest, InvoiceScope};
//! use garage_core::{InvoiceType, Rate};
//!
//! let db = Database::new(DbConfig::new("garage.db")).await?;
//!
//! let invoice = db
//!     .billing()
//!     .invoice_all_eligible(InvoiceRequest {
//!         scope: InvoiceScope::Job(job_id),
//!         invoice_type: InvoiceType::Final,
//!         overall_discount: Rate::zero(),
//!         actor: "clerk".to_string(),
//!     })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use billing::{BillingError, BillingService, CompletionReport, InvoiceRequest, InvoiceScope};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::activity::ActivityLogRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::job::JobRepository;
pub use repository::labor::LaborRepository;
pub use repository::procurement::ProcurementRepository;
pub use repository::settings::SettingsRepository;
pub use repository::subcontract::SubcontractRepository;
pub use repository::vehicle::VehicleRepository;
