//! # Procurement Repository
//!
//! Database operations for the parts procurement chain.
//!
//! ## Procurement Chain
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Parts Procurement Chain                             │
//! │                                                                         │
//! │  Quotation (draft)                                                      │
//! │     │ submit()           job: open → awaiting_quotation_approval        │
//! │     ▼                                                                   │
//! │  Quotation (pending_approval)                                           │
//! │     │ approve()          job: → awaiting_parts                          │
//! │     │ reject()           job: → open                                    │
//! │     ▼                                                                   │
//! │  Quotation (approved) ──► mark_ordered() ──► (ordered)                  │
//! │     │                                                                   │
//! │     │ record_supplier_invoice()                                         │
//! │     ▼                                                                   │
//! │  SupplierInvoice + items (installation_status = pending)                │
//! │     │ record_installation()                                             │
//! │     ▼                                                                   │
//! │  fully_installed ──► eligible for customer billing                      │
//! │                                                                         │
//! │  Received lines link to quotation lines BY FOREIGN KEY                  │
//! │  (quotation_item_id), never by part_number string matching.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::billing::BillingError;
use crate::error::{DbError, DbResult};
use garage_core::validation::{validate_amount_cents, validate_description, validate_quantity};
use garage_core::{
    validate_transition, InstallationStatus, JobStatus, Quotation, QuotationItem,
    QuotationStatus, SupplierInvoice, SupplierInvoiceItem,
};

/// Input line for a new quotation.
#[derive(Debug, Clone)]
pub struct NewQuotationItem {
    pub part_number: String,
    pub description: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

/// Input for creating a quotation.
#[derive(Debug, Clone)]
pub struct NewQuotation {
    pub job_id: String,
    pub supplier_name: String,
    pub items: Vec<NewQuotationItem>,
}

/// Input line for recording received parts against a quotation line.
#[derive(Debug, Clone)]
pub struct ReceivedLine {
    pub quotation_item_id: String,
    pub quantity_received: i64,
    /// Actual unit cost from the supplier invoice, which may differ from
    /// the quoted cost.
    pub unit_cost_cents: i64,
}

/// Input for recording a supplier invoice.
#[derive(Debug, Clone)]
pub struct NewSupplierInvoice {
    pub quotation_id: String,
    pub supplier_invoice_number: String,
    pub received_on: NaiveDate,
    pub lines: Vec<ReceivedLine>,
}

/// Repository for quotations and supplier invoices.
#[derive(Debug, Clone)]
pub struct ProcurementRepository {
    pool: SqlitePool,
}

impl ProcurementRepository {
    /// Creates a new ProcurementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProcurementRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Quotations
    // -------------------------------------------------------------------------

    /// Creates a draft quotation with its items, in one transaction.
    pub async fn create_quotation(&self, input: NewQuotation) -> DbResult<Quotation> {
        if input.items.is_empty() {
            return Err(DbError::QueryFailed(
                "quotation needs at least one item".to_string(),
            ));
        }
        for item in &input.items {
            validate_description(&item.description)
                .map_err(|e| DbError::QueryFailed(e.to_string()))?;
            validate_quantity(item.quantity).map_err(|e| DbError::QueryFailed(e.to_string()))?;
            validate_amount_cents(item.unit_cost_cents)
                .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        }

        let quotation = Quotation {
            id: Uuid::new_v4().to_string(),
            job_id: input.job_id,
            supplier_name: input.supplier_name,
            status: QuotationStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        debug!(id = %quotation.id, job_id = %quotation.job_id, "Creating quotation");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO quotations (id, job_id, supplier_name, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&quotation.id)
        .bind(&quotation.job_id)
        .bind(&quotation.supplier_name)
        .bind(quotation.status)
        .bind(quotation.created_at)
        .bind(quotation.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &input.items {
            sqlx::query(
                r#"
                INSERT INTO quotation_items (
                    id, quotation_id, part_number, description, quantity, unit_cost_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&quotation.id)
            .bind(&item.part_number)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_cost_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(quotation)
    }

    /// Gets a quotation by ID.
    pub async fn get_quotation(&self, id: &str) -> DbResult<Option<Quotation>> {
        let quotation = sqlx::query_as::<_, Quotation>("SELECT * FROM quotations WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(quotation)
    }

    /// Lists the items of a quotation.
    pub async fn quotation_items(&self, quotation_id: &str) -> DbResult<Vec<QuotationItem>> {
        let items = sqlx::query_as::<_, QuotationItem>(
            "SELECT * FROM quotation_items WHERE quotation_id = ?1 ORDER BY rowid",
        )
        .bind(quotation_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists quotations for a job, newest first.
    pub async fn list_quotations_for_job(&self, job_id: &str) -> DbResult<Vec<Quotation>> {
        let quotations = sqlx::query_as::<_, Quotation>(
            "SELECT * FROM quotations WHERE job_id = ?1 ORDER BY created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(quotations)
    }

    /// Submits a draft quotation for approval.
    ///
    /// Moves the job to awaiting_quotation_approval when it is still open.
    pub async fn submit(&self, id: &str) -> Result<(), BillingError> {
        self.step_quotation(
            id,
            &[QuotationStatus::Draft, QuotationStatus::Rejected],
            QuotationStatus::PendingApproval,
            Some(JobStatus::AwaitingQuotationApproval),
        )
        .await
    }

    /// Approves a pending quotation; the job moves to awaiting_parts.
    pub async fn approve(&self, id: &str) -> Result<(), BillingError> {
        self.step_quotation(
            id,
            &[QuotationStatus::PendingApproval],
            QuotationStatus::Approved,
            Some(JobStatus::AwaitingParts),
        )
        .await
    }

    /// Rejects a pending quotation; the job reopens.
    pub async fn reject(&self, id: &str) -> Result<(), BillingError> {
        self.step_quotation(
            id,
            &[QuotationStatus::PendingApproval],
            QuotationStatus::Rejected,
            Some(JobStatus::Open),
        )
        .await
    }

    /// Marks an approved quotation as ordered with the supplier.
    pub async fn mark_ordered(&self, id: &str) -> Result<(), BillingError> {
        self.step_quotation(
            id,
            &[QuotationStatus::Approved],
            QuotationStatus::Ordered,
            None,
        )
        .await
    }

    /// Shared quotation workflow step: guard the quotation status, apply
    /// the new status, and walk the owning job when the edge applies.
    ///
    /// The job edge is best-effort in one direction only: when the job is
    /// not in the matching source state (e.g. several quotations on one
    /// job), the quotation still moves and the job is left alone.
    async fn step_quotation(
        &self,
        id: &str,
        allowed_from: &[QuotationStatus],
        to: QuotationStatus,
        job_to: Option<JobStatus>,
    ) -> Result<(), BillingError> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let quotation =
            sqlx::query_as::<_, Quotation>("SELECT * FROM quotations WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(DbError::from)?
                .ok_or_else(|| DbError::not_found("Quotation", id))?;

        if !allowed_from.contains(&quotation.status) {
            return Err(DbError::QueryFailed(format!(
                "quotation {id} cannot move from {:?} to {to:?}",
                quotation.status
            ))
            .into());
        }

        sqlx::query("UPDATE quotations SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(to)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        if let Some(job_to) = job_to {
            let job_status: JobStatus =
                sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?1")
                    .bind(&quotation.job_id)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(DbError::from)?;

            if validate_transition(job_status, job_to).is_ok() {
                sqlx::query("UPDATE jobs SET status = ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(&quotation.job_id)
                    .bind(job_to)
                    .bind(Utc::now())
                    .execute(&mut *tx)
                    .await
                    .map_err(DbError::from)?;
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        debug!(id, ?to, "Quotation status updated");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Supplier invoices
    // -------------------------------------------------------------------------

    /// Records a supplier invoice against an approved/ordered quotation.
    ///
    /// Each received line references its quotation line by foreign key and
    /// starts with installation_status = pending. Part number and
    /// description are copied from the quotation line so the received row
    /// stays readable if the quotation is later edited.
    pub async fn record_supplier_invoice(
        &self,
        input: NewSupplierInvoice,
    ) -> DbResult<SupplierInvoice> {
        if input.lines.is_empty() {
            return Err(DbError::QueryFailed(
                "supplier invoice needs at least one line".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let quotation =
            sqlx::query_as::<_, Quotation>("SELECT * FROM quotations WHERE id = ?1")
                .bind(&input.quotation_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Quotation", &input.quotation_id))?;

        if !matches!(
            quotation.status,
            QuotationStatus::Approved | QuotationStatus::Ordered
        ) {
            return Err(DbError::QueryFailed(format!(
                "quotation {} is {:?}, not approved",
                quotation.id, quotation.status
            )));
        }

        let invoice = SupplierInvoice {
            id: Uuid::new_v4().to_string(),
            quotation_id: quotation.id.clone(),
            job_id: quotation.job_id.clone(),
            supplier_invoice_number: input.supplier_invoice_number,
            received_on: input.received_on,
            created_at: Utc::now(),
        };

        debug!(id = %invoice.id, quotation_id = %quotation.id, "Recording supplier invoice");

        sqlx::query(
            r#"
            INSERT INTO supplier_invoices (
                id, quotation_id, job_id, supplier_invoice_number, received_on, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.quotation_id)
        .bind(&invoice.job_id)
        .bind(&invoice.supplier_invoice_number)
        .bind(invoice.received_on)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await?;

        for line in &input.lines {
            validate_quantity(line.quantity_received)
                .map_err(|e| DbError::QueryFailed(e.to_string()))?;
            validate_amount_cents(line.unit_cost_cents)
                .map_err(|e| DbError::QueryFailed(e.to_string()))?;

            let quoted = sqlx::query_as::<_, QuotationItem>(
                "SELECT * FROM quotation_items WHERE id = ?1 AND quotation_id = ?2",
            )
            .bind(&line.quotation_item_id)
            .bind(&quotation.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("QuotationItem", &line.quotation_item_id))?;

            sqlx::query(
                r#"
                INSERT INTO supplier_invoice_items (
                    id, supplier_invoice_id, quotation_item_id, part_number, description,
                    quantity_received, quantity_installed, unit_cost_cents, installation_status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&invoice.id)
            .bind(&quoted.id)
            .bind(&quoted.part_number)
            .bind(&quoted.description)
            .bind(line.quantity_received)
            .bind(line.unit_cost_cents)
            .bind(InstallationStatus::Pending)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(invoice)
    }

    /// Lists supplier invoices for a job, newest first.
    pub async fn supplier_invoices_for_job(&self, job_id: &str) -> DbResult<Vec<SupplierInvoice>> {
        let invoices = sqlx::query_as::<_, SupplierInvoice>(
            "SELECT * FROM supplier_invoices WHERE job_id = ?1 ORDER BY created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Lists the received lines of a supplier invoice.
    pub async fn supplier_invoice_items(
        &self,
        supplier_invoice_id: &str,
    ) -> DbResult<Vec<SupplierInvoiceItem>> {
        let items = sqlx::query_as::<_, SupplierInvoiceItem>(
            "SELECT * FROM supplier_invoice_items WHERE supplier_invoice_id = ?1 ORDER BY rowid",
        )
        .bind(supplier_invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Records installation progress on a received line.
    ///
    /// `quantity_installed` is the new cumulative installed count. The
    /// installation status is derived from installed vs received; billing
    /// eligibility opens only at fully_installed.
    pub async fn record_installation(
        &self,
        item_id: &str,
        quantity_installed: i64,
    ) -> DbResult<SupplierInvoiceItem> {
        let item = sqlx::query_as::<_, SupplierInvoiceItem>(
            "SELECT * FROM supplier_invoice_items WHERE id = ?1",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("SupplierInvoiceItem", item_id))?;

        if quantity_installed < 0 || quantity_installed > item.quantity_received {
            return Err(DbError::QueryFailed(format!(
                "installed quantity {quantity_installed} out of range 0..={}",
                item.quantity_received
            )));
        }

        let status =
            InstallationStatus::from_quantities(quantity_installed, item.quantity_received);

        sqlx::query(
            r#"
            UPDATE supplier_invoice_items
            SET quantity_installed = ?2, installation_status = ?3
            WHERE id = ?1
            "#,
        )
        .bind(item_id)
        .bind(quantity_installed)
        .bind(status)
        .execute(&self.pool)
        .await?;

        debug!(item_id, quantity_installed, ?status, "Installation recorded");

        Ok(SupplierInvoiceItem {
            quantity_installed,
            installation_status: status,
            ..item
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
