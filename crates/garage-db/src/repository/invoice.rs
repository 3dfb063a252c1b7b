//! # Customer Invoice Repository
//!
//! Read access and reprint tracking for customer invoices.
//!
//! Invoices are CREATED by the invoice writer in the billing module (one
//! transaction for header + items + job status). This repository only
//! reads what the writer persisted and tracks reprints - pricing fields
//! are frozen at generation time and never touched here.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use garage_core::{BillingItemType, CustomerInvoice, CustomerInvoiceItem};

/// Aggregated revenue figures over a date span.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RevenueSummary {
    pub invoice_count: i64,
    pub revenue_cents: i64,
    pub cost_cents: i64,
    pub profit_cents: i64,
}

/// Repository for customer invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CustomerInvoice>> {
        let invoice =
            sqlx::query_as::<_, CustomerInvoice>("SELECT * FROM customer_invoices WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(invoice)
    }

    /// Gets an invoice header by its business number.
    pub async fn get_by_number(&self, invoice_number: &str) -> DbResult<Option<CustomerInvoice>> {
        let invoice = sqlx::query_as::<_, CustomerInvoice>(
            "SELECT * FROM customer_invoices WHERE invoice_number = ?1",
        )
        .bind(invoice_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(invoice)
    }

    /// Lists the line items of an invoice in insertion order.
    pub async fn items(&self, invoice_id: &str) -> DbResult<Vec<CustomerInvoiceItem>> {
        let items = sqlx::query_as::<_, CustomerInvoiceItem>(
            "SELECT * FROM customer_invoice_items WHERE invoice_id = ?1 ORDER BY rowid",
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists invoices for a vehicle, newest first.
    pub async fn list_for_vehicle(&self, vehicle_id: &str) -> DbResult<Vec<CustomerInvoice>> {
        let invoices = sqlx::query_as::<_, CustomerInvoice>(
            "SELECT * FROM customer_invoices WHERE vehicle_id = ?1 ORDER BY created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Lists invoices for a job, newest first.
    pub async fn list_for_job(&self, job_id: &str) -> DbResult<Vec<CustomerInvoice>> {
        let invoices = sqlx::query_as::<_, CustomerInvoice>(
            "SELECT * FROM customer_invoices WHERE job_id = ?1 ORDER BY created_at DESC",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(invoices)
    }

    /// Records a print/reprint of an invoice.
    ///
    /// Increments reprint_count and stamps last_printed_at; every pricing
    /// field stays untouched.
    pub async fn record_print(&self, id: &str) -> DbResult<CustomerInvoice> {
        let result = sqlx::query(
            r#"
            UPDATE customer_invoices
            SET reprint_count = reprint_count + 1, last_printed_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("CustomerInvoice", id));
        }

        debug!(id, "Invoice print recorded");

        let invoice = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("CustomerInvoice", id))?;

        Ok(invoice)
    }

    /// Sums revenue, cost, and profit over invoices issued in the span
    /// (both dates inclusive).
    pub async fn summary_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<RevenueSummary> {
        let summary = sqlx::query_as::<_, RevenueSummary>(
            r#"
            SELECT
                COUNT(*) AS invoice_count,
                COALESCE(SUM(total_cents), 0) AS revenue_cents,
                COALESCE(SUM(total_cost_cents), 0) AS cost_cents,
                COALESCE(SUM(profit_cents), 0) AS profit_cents
            FROM customer_invoices
            WHERE date(created_at) BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Whether a source row is already referenced by an invoice item.
    pub async fn is_reference_invoiced(
        &self,
        item_type: BillingItemType,
        reference_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM customer_invoice_items
            WHERE item_type = ?1 AND reference_id = ?2
            "#,
        )
        .bind(item_type)
        .bind(reference_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::{InvoiceRequest, InvoiceScope};
    use crate::pool::{Database, DbConfig};
    use crate::repository::job::NewJob;
    use crate::repository::labor::NewLaborCharge;
    use crate::repository::vehicle::NewVehicle;
    use garage_core::{InvoiceType, JobType, Rate};

    #[tokio::test]
    async fn test_summary_between_sums_issued_invoices() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let vehicle = db
            .vehicles()
            .create(NewVehicle {
                plate_number: "KBZ 412A".to_string(),
                make: "Isuzu".to_string(),
                model: "FRR90".to_string(),
                year: 2019,
                vin: None,
                owner_name: "Mwangi Transporters".to_string(),
                owner_phone: None,
                owner_email: None,
            })
            .await
            .unwrap();
        let job = db
            .jobs()
            .create(NewJob {
                vehicle_id: vehicle.id,
                description: "Engine overhaul".to_string(),
                job_type: JobType::General,
                started_on: Utc::now().date_naive(),
            })
            .await
            .unwrap();
        db.labor()
            .create(NewLaborCharge {
                job_id: job.id.clone(),
                description: "Overhaul labor".to_string(),
                hours: None,
                rate_cents: None,
                fixed_amount_cents: Some(300_000),
            })
            .await
            .unwrap();

        let (invoice, _items) = db
            .billing()
            .invoice_all_eligible(InvoiceRequest {
                scope: InvoiceScope::Job(job.id),
                invoice_type: InvoiceType::Progress,
                overall_discount: Rate::zero(),
                actor: "clerk".to_string(),
            })
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let summary = db.invoices().summary_between(today, today).await.unwrap();
        assert_eq!(summary.invoice_count, 1);
        assert_eq!(summary.revenue_cents, invoice.total_cents);
        assert_eq!(summary.cost_cents, invoice.total_cost_cents);
        assert_eq!(summary.profit_cents, invoice.profit_cents);

        // Span before the invoice existed
        let earlier = today.pred_opt().unwrap();
        let empty = db.invoices().summary_between(earlier, earlier).await.unwrap();
        assert_eq!(empty.invoice_count, 0);
        assert_eq!(empty.revenue_cents, 0);
    }
}
