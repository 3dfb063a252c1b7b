//! # Domain Types
//!
//! Core domain types for the garage billing system.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                                   │
//! │                                                                         │
//! │  Vehicle ──1:N──► Job ──1:N──► LaborCharge                              │
//! │                    │                                                    │
//! │                    ├──1:N──► Quotation ──1:N──► QuotationItem           │
//! │                    │              │                    ▲                │
//! │                    │              ▼                    │ FK             │
//! │                    │         SupplierInvoice ──1:N──► SupplierInvoiceItem│
//! │                    │                                                    │
//! │                    ├──1:N──► SubcontractWork                            │
//! │                    │                                                    │
//! │                    └──1:N──► CustomerInvoice ──1:N──► CustomerInvoiceItem│
//! │                                                                         │
//! │  CustomerInvoiceItem (item_type, reference_id) is the ONLY              │
//! │  double-billing guard: a source row is "already invoiced" iff an        │
//! │  item row references it. The pair is UNIQUE at the database level.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (plate_number, job_number, invoice_number) - human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::JobStatus;

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1600 bps = 16% (the VAT rate), 2000 bps = 20% (parts markup)
///
/// One representation serves VAT, markup, and discount percentages so the
/// pricing calculator never mixes units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Vehicle
// =============================================================================

/// A customer vehicle on record.
///
/// Identity is the plate number (unique). A vehicle can only be deleted
/// while it has zero jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Vehicle {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Number plate - business identifier, unique.
    pub plate_number: String,

    pub make: String,
    pub model: String,
    pub year: i64,

    /// Vehicle Identification Number, when known.
    pub vin: Option<String>,

    /// Owner contact fields.
    pub owner_name: String,
    pub owner_phone: Option<String>,
    pub owner_email: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Job
// =============================================================================

/// The kind of work a job covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    General,
    Part,
    Service,
}

/// A unit of repair work against one vehicle, tracked through the
/// [`JobStatus`] lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Job {
    pub id: String,
    pub vehicle_id: String,

    /// Generated sequential business identifier (`JOB-0001`), unique.
    pub job_number: String,

    pub description: String,
    pub job_type: JobType,
    pub status: JobStatus,

    pub started_on: NaiveDate,
    pub completed_on: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Labor Charge
// =============================================================================

/// A labor charge against a job: either hours × rate or a fixed amount.
///
/// The billable amount is resolved once at creation time and stored in
/// `amount_cents`; hours/rate are retained for display. A charge becomes
/// "invoiced" the moment a [`CustomerInvoiceItem`] references it - there is
/// no flag on this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LaborCharge {
    pub id: String,
    pub job_id: String,
    pub description: String,

    /// Hours worked, when charged as hours × rate.
    pub hours: Option<f64>,
    /// Hourly rate in cents, when charged as hours × rate.
    pub rate_cents: Option<i64>,

    /// The resolved billable amount in cents.
    pub amount_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl LaborCharge {
    /// Returns the billable amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    /// Resolves hours × rate to a cent amount, rounding half-up.
    ///
    /// Hours are carried at two decimal places; the money multiplication
    /// itself stays in integer arithmetic.
    pub fn resolve_amount(hours: f64, rate_cents: i64) -> i64 {
        let hours_hundredths = (hours * 100.0).round() as i128;
        ((hours_hundredths * rate_cents as i128 + 50) / 100) as i64
    }
}

// =============================================================================
// Parts Procurement Chain
// =============================================================================

/// Lifecycle of a supplier quotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum QuotationStatus {
    Draft,
    PendingApproval,
    Approved,
    Rejected,
    Ordered,
}

/// A supplier price quote for parts, subject to approval before ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Quotation {
    pub id: String,
    pub job_id: String,
    pub supplier_name: String,
    pub status: QuotationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A quoted part line on a quotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct QuotationItem {
    pub id: String,
    pub quotation_id: String,
    pub part_number: String,
    pub description: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

impl QuotationItem {
    /// Returns the quoted unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }
}

/// The actual billed/received record following an approved quotation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplierInvoice {
    pub id: String,
    pub quotation_id: String,
    pub job_id: String,
    pub supplier_invoice_number: String,
    pub received_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Installation progress of received parts.
///
/// Eligibility gate: a supplier invoice item only becomes billable once
/// FULLY installed. Partially installed items are excluded entirely until
/// installation completes, at which point the full received quantity is
/// billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum InstallationStatus {
    Pending,
    PartiallyInstalled,
    FullyInstalled,
}

impl InstallationStatus {
    /// Derives the status from installed vs received quantities.
    pub fn from_quantities(installed: i64, received: i64) -> Self {
        if installed <= 0 {
            InstallationStatus::Pending
        } else if installed < received {
            InstallationStatus::PartiallyInstalled
        } else {
            InstallationStatus::FullyInstalled
        }
    }
}

/// A received part line on a supplier invoice.
///
/// Linked to its quotation item by foreign key. The original system matched
/// on part_number strings, which silently dropped items when part numbers
/// collided or were blank; the FK makes the linkage unambiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SupplierInvoiceItem {
    pub id: String,
    pub supplier_invoice_id: String,
    pub quotation_item_id: String,
    pub part_number: String,
    pub description: String,

    /// Units actually received. This is the quantity billed to the customer
    /// once the item is fully installed.
    pub quantity_received: i64,
    /// Units installed so far.
    pub quantity_installed: i64,

    /// Actual unit cost in cents from the supplier invoice.
    pub unit_cost_cents: i64,

    pub installation_status: InstallationStatus,
}

impl SupplierInvoiceItem {
    /// Returns the actual unit cost as Money.
    #[inline]
    pub fn unit_cost(&self) -> Money {
        Money::from_cents(self.unit_cost_cents)
    }
}

// =============================================================================
// Subcontract Work
// =============================================================================

/// Whether subcontracted work supplies parts or a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    Parts,
    Service,
}

/// Lifecycle of subcontracted work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SubcontractStatus {
    Draft,
    PendingApproval,
    Approved,
    InProgress,
    Completed,
    Billed,
}

/// Externally performed labor or parts supply billed back through the shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SubcontractWork {
    pub id: String,
    pub job_id: String,
    pub subcontractor_name: String,
    pub description: String,
    pub work_type: WorkType,
    pub status: SubcontractStatus,

    /// Installation progress. Only meaningful for parts-type work;
    /// service-type rows stay FullyInstalled.
    pub installation_status: InstallationStatus,

    /// Subcontractor cost in cents.
    pub cost_cents: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubcontractWork {
    /// Returns the subcontractor cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// The invoice item type this work bills under.
    pub fn billing_item_type(&self) -> BillingItemType {
        match self.work_type {
            WorkType::Parts => BillingItemType::SubcontractPart,
            WorkType::Service => BillingItemType::SubcontractService,
        }
    }
}

// =============================================================================
// Customer Invoice
// =============================================================================

/// Progress vs final invoice.
///
/// A progress invoice bills partial work without closing the job; a final
/// invoice marks the job invoiced and closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    Progress,
    Final,
}

/// The category of a billed line, half of the double-billing guard pair.
///
/// String forms match the historical item_type values so existing invoice
/// data stays readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BillingItemType {
    Labor,
    IsuzuPart,
    SubcontractPart,
    SubcontractService,
}

impl BillingItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingItemType::Labor => "labor",
            BillingItemType::IsuzuPart => "isuzu_part",
            BillingItemType::SubcontractPart => "subcontract_part",
            BillingItemType::SubcontractService => "subcontract_service",
        }
    }
}

/// The bill issued to the vehicle owner.
///
/// All pricing fields are computed once at generation time and never
/// recomputed. Reprints only touch `reprint_count` and `last_printed_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerInvoice {
    pub id: String,

    /// The job billed, for single-job invoices. None for vehicle-wide
    /// "full" invoices that span several jobs.
    pub job_id: Option<String>,
    pub vehicle_id: String,

    /// Sequential business identifier (`INV-2026-0001`), unique.
    pub invoice_number: String,
    pub invoice_type: InvoiceType,

    // Aggregates, frozen at generation time.
    pub subtotal_before_discount_cents: i64,
    pub overall_discount_bps: i64,
    pub overall_discount_cents: i64,
    pub subtotal_after_discount_cents: i64,
    pub vat_bps: i64,
    pub vat_cents: i64,
    pub total_cents: i64,

    // Cost/profit breakdown.
    pub total_cost_cents: i64,
    pub profit_cents: i64,

    pub reprint_count: i64,
    pub last_printed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CustomerInvoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }
}

/// One row per billed unit, referencing the source record by
/// (item_type, reference_id). That pair is UNIQUE in the database and is
/// the sole mechanism preventing double-billing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CustomerInvoiceItem {
    pub id: String,
    pub invoice_id: String,

    pub item_type: BillingItemType,
    /// Id of the source row (labor charge, supplier invoice item, or
    /// subcontract work).
    pub reference_id: String,

    pub description: String,
    pub quantity: i64,

    pub unit_cost_cents: i64,
    pub markup_bps: i64,
    pub unit_price_cents: i64,
    pub item_discount_bps: i64,

    /// Line subtotal after the per-item discount, before the overall
    /// discount share.
    pub line_subtotal_cents: i64,
    /// This line's share of the overall invoice discount.
    pub discount_share_cents: i64,
    pub vat_cents: i64,
    pub total_cents: i64,
}

impl CustomerInvoiceItem {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Billing Settings
// =============================================================================

/// Company-wide billing configuration.
///
/// Loaded explicitly from the system_settings table and passed into the
/// pricing calculator at invocation time - never read ad hoc from a shared
/// table mid-calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingSettings {
    /// VAT rate applied to every invoice.
    pub vat: Rate,
    /// Default markup for supplier parts.
    pub parts_markup: Rate,
    /// Default markup for subcontracted work.
    pub subcontract_markup: Rate,
    /// Default markup for labor. Business convention keeps this at 0%.
    pub labor_markup: Rate,
    /// Prefix for generated invoice numbers.
    pub invoice_prefix: String,
}

impl BillingSettings {
    /// The default markup for an item type when the caller supplies none.
    pub fn default_markup_for(&self, item_type: BillingItemType) -> Rate {
        match item_type {
            BillingItemType::Labor => self.labor_markup,
            BillingItemType::IsuzuPart => self.parts_markup,
            BillingItemType::SubcontractPart | BillingItemType::SubcontractService => {
                self.subcontract_markup
            }
        }
    }
}

impl Default for BillingSettings {
    fn default() -> Self {
        BillingSettings {
            vat: Rate::from_bps(1_600),               // 16%
            parts_markup: Rate::from_bps(2_000),      // 20%
            subcontract_markup: Rate::from_bps(1_500), // 15%
            labor_markup: Rate::zero(),
            invoice_prefix: "INV".to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_from_bps() {
        let rate = Rate::from_bps(1600);
        assert_eq!(rate.bps(), 1600);
        assert!((rate.percentage() - 16.0).abs() < 0.001);
    }

    #[test]
    fn test_rate_from_percentage() {
        let rate = Rate::from_percentage(16.0);
        assert_eq!(rate.bps(), 1600);
    }

    #[test]
    fn test_installation_status_from_quantities() {
        assert_eq!(
            InstallationStatus::from_quantities(0, 4),
            InstallationStatus::Pending
        );
        assert_eq!(
            InstallationStatus::from_quantities(2, 4),
            InstallationStatus::PartiallyInstalled
        );
        assert_eq!(
            InstallationStatus::from_quantities(4, 4),
            InstallationStatus::FullyInstalled
        );
    }

    #[test]
    fn test_labor_resolve_amount() {
        // 2.5h at 1,200.00/h = 3,000.00
        assert_eq!(LaborCharge::resolve_amount(2.5, 120_000), 300_000);
        // Quarter hour at 0.90/h = 0.225 → rounds half-up to 0.23
        assert_eq!(LaborCharge::resolve_amount(0.25, 90), 23);
        // 0.33h at 1.01/h = 0.3333 → 0.33
        assert_eq!(LaborCharge::resolve_amount(0.33, 101), 33);
        // Large job stays exact
        assert_eq!(LaborCharge::resolve_amount(120.75, 150_000), 18_112_500);
    }

    #[test]
    fn test_billing_item_type_strings() {
        assert_eq!(BillingItemType::Labor.as_str(), "labor");
        assert_eq!(BillingItemType::IsuzuPart.as_str(), "isuzu_part");
        assert_eq!(
            BillingItemType::SubcontractPart.as_str(),
            "subcontract_part"
        );
        assert_eq!(
            BillingItemType::SubcontractService.as_str(),
            "subcontract_service"
        );
    }

    #[test]
    fn test_subcontract_billing_item_type() {
        let mut work = SubcontractWork {
            id: "w1".to_string(),
            job_id: "j1".to_string(),
            subcontractor_name: "Machining Ltd".to_string(),
            description: "Crankshaft grinding".to_string(),
            work_type: WorkType::Service,
            status: SubcontractStatus::Completed,
            installation_status: InstallationStatus::FullyInstalled,
            cost_cents: 50_000,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(
            work.billing_item_type(),
            BillingItemType::SubcontractService
        );

        work.work_type = WorkType::Parts;
        assert_eq!(work.billing_item_type(), BillingItemType::SubcontractPart);
    }

    #[test]
    fn test_default_markups() {
        let settings = BillingSettings::default();
        assert_eq!(settings.default_markup_for(BillingItemType::Labor).bps(), 0);
        assert_eq!(
            settings.default_markup_for(BillingItemType::IsuzuPart).bps(),
            2_000
        );
        assert_eq!(
            settings
                .default_markup_for(BillingItemType::SubcontractService)
                .bps(),
            1_500
        );
    }
}
