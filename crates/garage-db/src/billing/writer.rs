//! # Invoice Writer
//!
//! Persists a priced invoice atomically.
//!
//! ## One Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. resolve scope (job/vehicle row must exist)                        │
//! │    2. next invoice number from invoice_sequences (per calendar year)    │
//! │    3. INSERT customer_invoices header (aggregates frozen)               │
//! │    4. INSERT customer_invoice_items, one per line                       │
//! │         └── UNIQUE (item_type, reference_id) fires here on a            │
//! │             double-bill → AlreadyInvoiced, whole invoice rolls back     │
//! │    5. subcontract lines → subcontract_works.status = 'billed'           │
//! │    6. final invoice → contributing jobs status = 'invoiced',            │
//! │       completed_on stamped                                              │
//! │    7. activity_log entry                                                │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No partial invoice can exist: any failure rolls the whole transaction
//! back and the caller must resubmit.

use chrono::{Datelike, Utc};
use sqlx::Sqlite;
use tracing::{debug, info};
use uuid::Uuid;

use super::{BillingError, BillingResult, BillingService, InvoiceScope};
use crate::error::DbError;
use garage_core::validation::validate_rate_bps;
use garage_core::{
    price_invoice, BillableLine, CoreError, CustomerInvoice, CustomerInvoiceItem, InvoiceType,
    PricedInvoice, Rate,
};

/// Parameters for one invoice generation.
#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    pub scope: InvoiceScope,
    pub invoice_type: InvoiceType,
    /// Invoice-wide discount applied after line subtotals.
    pub overall_discount: Rate,
    /// Who is generating the invoice, for the audit trail.
    pub actor: String,
}

impl BillingService {
    /// Convenience flow: resolve eligibility, price with default markups
    /// and no per-item discounts, and persist.
    ///
    /// ## Errors
    /// `CoreError::NothingEligible` when the resolver comes back empty.
    pub async fn invoice_all_eligible(
        &self,
        request: InvoiceRequest,
    ) -> BillingResult<(CustomerInvoice, Vec<CustomerInvoiceItem>)> {
        let lines = self.eligible_lines(&request.scope).await?;
        if lines.is_empty() {
            return Err(BillingError::Core(CoreError::NothingEligible {
                scope: request.scope.describe(),
            }));
        }
        self.generate_invoice(request, lines).await
    }

    /// Prices the given lines and persists the invoice in one transaction.
    ///
    /// The caller controls the lines (markup overrides, per-item
    /// discounts, dropping items the customer isn't being billed for
    /// yet); eligibility filtering has already happened upstream. If any
    /// line was billed concurrently since then, the UNIQUE constraint
    /// rejects it here and nothing is persisted.
    pub async fn generate_invoice(
        &self,
        request: InvoiceRequest,
        lines: Vec<BillableLine>,
    ) -> BillingResult<(CustomerInvoice, Vec<CustomerInvoiceItem>)> {
        validate_rate_bps(request.overall_discount.bps()).map_err(CoreError::from)?;

        let settings = crate::repository::settings::SettingsRepository::new(self.pool.clone())
            .load_billing()
            .await?;

        let priced = price_invoice(&lines, request.overall_discount, &settings)?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // Resolve the header's vehicle/job columns from the scope.
        let (job_id, vehicle_id) = match &request.scope {
            InvoiceScope::Job(id) => {
                let vehicle_id: String =
                    sqlx::query_scalar("SELECT vehicle_id FROM jobs WHERE id = ?1")
                        .bind(id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(DbError::from)?
                        .ok_or_else(|| CoreError::JobNotFound(id.clone()))?;
                (Some(id.clone()), vehicle_id)
            }
            InvoiceScope::Vehicle(id) => {
                let found: Option<String> =
                    sqlx::query_scalar("SELECT id FROM vehicles WHERE id = ?1")
                        .bind(id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(DbError::from)?;
                let vehicle_id = found.ok_or_else(|| CoreError::VehicleNotFound(id.clone()))?;
                (None, vehicle_id)
            }
        };

        let invoice_number = next_invoice_number(&mut tx, &settings.invoice_prefix).await?;

        let invoice = build_header(&priced, &request, job_id, vehicle_id, invoice_number);

        debug!(
            invoice_number = %invoice.invoice_number,
            total_cents = invoice.total_cents,
            "Writing invoice header"
        );

        sqlx::query(
            r#"
            INSERT INTO customer_invoices (
                id, job_id, vehicle_id, invoice_number, invoice_type,
                subtotal_before_discount_cents, overall_discount_bps, overall_discount_cents,
                subtotal_after_discount_cents, vat_bps, vat_cents, total_cents,
                total_cost_cents, profit_cents, reprint_count, last_printed_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0, NULL, ?15)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.job_id)
        .bind(&invoice.vehicle_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.invoice_type)
        .bind(invoice.subtotal_before_discount_cents)
        .bind(invoice.overall_discount_bps)
        .bind(invoice.overall_discount_cents)
        .bind(invoice.subtotal_after_discount_cents)
        .bind(invoice.vat_bps)
        .bind(invoice.vat_cents)
        .bind(invoice.total_cents)
        .bind(invoice.total_cost_cents)
        .bind(invoice.profit_cents)
        .bind(invoice.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            let item = CustomerInvoiceItem {
                id: Uuid::new_v4().to_string(),
                invoice_id: invoice.id.clone(),
                item_type: line.item_type,
                reference_id: line.reference_id.clone(),
                description: line.description.clone(),
                quantity: line.quantity,
                unit_cost_cents: line.unit_cost.cents(),
                markup_bps: line.markup.bps() as i64,
                unit_price_cents: line.unit_price.cents(),
                item_discount_bps: line.item_discount.bps() as i64,
                line_subtotal_cents: line.line_subtotal.cents(),
                discount_share_cents: line.discount_share.cents(),
                vat_cents: line.vat.cents(),
                total_cents: line.total.cents(),
            };

            let result = sqlx::query(
                r#"
                INSERT INTO customer_invoice_items (
                    id, invoice_id, item_type, reference_id, description, quantity,
                    unit_cost_cents, markup_bps, unit_price_cents, item_discount_bps,
                    line_subtotal_cents, discount_share_cents, vat_cents, total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
            )
            .bind(&item.id)
            .bind(&item.invoice_id)
            .bind(item.item_type)
            .bind(&item.reference_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_cost_cents)
            .bind(item.markup_bps)
            .bind(item.unit_price_cents)
            .bind(item.item_discount_bps)
            .bind(item.line_subtotal_cents)
            .bind(item.discount_share_cents)
            .bind(item.vat_cents)
            .bind(item.total_cents)
            .execute(&mut *tx)
            .await;

            if let Err(e) = result {
                let db_err = DbError::from(e);
                if db_err.is_billing_guard_violation() {
                    // The authoritative double-billing signal. The whole
                    // transaction rolls back on drop.
                    return Err(BillingError::Core(CoreError::AlreadyInvoiced {
                        item_type: line.item_type,
                        reference_id: line.reference_id.clone(),
                    }));
                }
                return Err(db_err.into());
            }

            items.push(item);
        }

        // Billed subcontract work is closed out.
        for line in &priced.lines {
            if matches!(
                line.item_type,
                garage_core::BillingItemType::SubcontractPart
                    | garage_core::BillingItemType::SubcontractService
            ) {
                sqlx::query(
                    "UPDATE subcontract_works SET status = 'billed', updated_at = ?2 WHERE id = ?1",
                )
                .bind(&line.reference_id)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;
            }
        }

        // A final invoice closes every job that contributed a line.
        if request.invoice_type == InvoiceType::Final {
            let mut job_ids: Vec<&str> = priced.lines.iter().map(|l| l.job_id.as_str()).collect();
            job_ids.sort_unstable();
            job_ids.dedup();

            let today = Utc::now().date_naive();
            for job_id in job_ids {
                sqlx::query(
                    r#"
                    UPDATE jobs
                    SET status = 'invoiced',
                        completed_on = COALESCE(completed_on, ?2),
                        updated_at = ?3
                    WHERE id = ?1
                    "#,
                )
                .bind(job_id)
                .bind(today)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;
            }
        }

        sqlx::query(
            r#"
            INSERT INTO activity_log (actor, action, entity_type, entity_id, detail, created_at)
            VALUES (?1, 'invoice_generated', 'invoice', ?2, ?3, ?4)
            "#,
        )
        .bind(&request.actor)
        .bind(&invoice.id)
        .bind(
            serde_json::json!({
                "invoice_number": invoice.invoice_number,
                "invoice_type": invoice.invoice_type,
                "total_cents": invoice.total_cents,
                "lines": items.len(),
            })
            .to_string(),
        )
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            invoice_number = %invoice.invoice_number,
            total_cents = invoice.total_cents,
            lines = items.len(),
            "Invoice generated"
        );

        Ok((invoice, items))
    }
}

/// Draws the next sequential invoice number for the current year.
///
/// The per-year counter row is upserted and bumped inside the caller's
/// transaction, so two concurrent generations serialize on this write
/// and can never share a number.
async fn next_invoice_number(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    prefix: &str,
) -> BillingResult<String> {
    let year = Utc::now().year();

    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO invoice_sequences (year, next_seq) VALUES (?1, 2)
        ON CONFLICT(year) DO UPDATE SET next_seq = next_seq + 1
        RETURNING next_seq - 1
        "#,
    )
    .bind(year)
    .fetch_one(&mut **tx)
    .await
    .map_err(DbError::from)?;

    Ok(format!("{prefix}-{year}-{seq:04}"))
}

fn build_header(
    priced: &PricedInvoice,
    request: &InvoiceRequest,
    job_id: Option<String>,
    vehicle_id: String,
    invoice_number: String,
) -> CustomerInvoice {
    CustomerInvoice {
        id: Uuid::new_v4().to_string(),
        job_id,
        vehicle_id,
        invoice_number,
        invoice_type: request.invoice_type,
        subtotal_before_discount_cents: priced.subtotal_before_discount.cents(),
        overall_discount_bps: priced.overall_discount.bps() as i64,
        overall_discount_cents: priced.overall_discount_amount.cents(),
        subtotal_after_discount_cents: priced.subtotal_after_discount.cents(),
        vat_bps: priced.vat_rate.bps() as i64,
        vat_cents: priced.vat_amount.cents(),
        total_cents: priced.total_amount.cents(),
        total_cost_cents: priced.total_cost.cents(),
        profit_cents: priced.profit.cents(),
        reprint_count: 0,
        last_printed_at: None,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::job::NewJob;
    use crate::repository::labor::NewLaborCharge;
    use crate::repository::procurement::{
        NewQuotation, NewQuotationItem, NewSupplierInvoice, ReceivedLine,
    };
    use crate::repository::vehicle::NewVehicle;
    use chrono::NaiveDate;
    use garage_core::{JobStatus, JobType};

    async fn db_with_job(config: DbConfig) -> (Database, String, String) {
        let db = Database::new(config).await.unwrap();
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
                vehicle_id: vehicle.id.clone(),
                description: "Engine overhaul".to_string(),
                job_type: JobType::General,
                started_on: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            })
            .await
            .unwrap();
        (db, vehicle.id, job.id)
    }

    async fn add_labor(db: &Database, job_id: &str, amount: i64) -> String {
        db.labor()
            .create(NewLaborCharge {
                job_id: job_id.to_string(),
                description: "Engine overhaul labor".to_string(),
                hours: None,
                rate_cents: None,
                fixed_amount_cents: Some(amount),
            })
            .await
            .unwrap()
            .id
    }

    async fn add_installed_part(db: &Database, job_id: &str) -> String {
        let quotation = db
            .procurement()
            .create_quotation(NewQuotation {
                job_id: job_id.to_string(),
                supplier_name: "Isuzu EA Parts".to_string(),
                items: vec![NewQuotationItem {
                    part_number: "8-94156-245-0".to_string(),
                    description: "Oil filter".to_string(),
                    quantity: 2,
                    unit_cost_cents: 100_000,
                }],
            })
            .await
            .unwrap();
        db.procurement().submit(&quotation.id).await.unwrap();
        db.procurement().approve(&quotation.id).await.unwrap();

        let quoted = db.procurement().quotation_items(&quotation.id).await.unwrap();
        let supplier_invoice = db
            .procurement()
            .record_supplier_invoice(NewSupplierInvoice {
                quotation_id: quotation.id,
                supplier_invoice_number: "SI-1001".to_string(),
                received_on: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
                lines: vec![ReceivedLine {
                    quotation_item_id: quoted[0].id.clone(),
                    quantity_received: 2,
                    unit_cost_cents: 100_000,
                }],
            })
            .await
            .unwrap();
        let items = db
            .procurement()
            .supplier_invoice_items(&supplier_invoice.id)
            .await
            .unwrap();
        db.procurement()
            .record_installation(&items[0].id, 2)
            .await
            .unwrap();
        items[0].id.clone()
    }

    fn final_request(job_id: &str) -> InvoiceRequest {
        InvoiceRequest {
            scope: InvoiceScope::Job(job_id.to_string()),
            invoice_type: InvoiceType::Final,
            overall_discount: Rate::zero(),
            actor: "clerk".to_string(),
        }
    }

    #[tokio::test]
    async fn test_labor_only_final_invoice() {
        let (db, _vehicle_id, job_id) = db_with_job(DbConfig::in_memory()).await;
        // Labor 3,000.00, markup 0%, discount 0%, VAT 16%
        add_labor(&db, &job_id, 300_000).await;

        let (invoice, items) = db
            .billing()
            .invoice_all_eligible(final_request(&job_id))
            .await
            .unwrap();

        assert_eq!(invoice.subtotal_before_discount_cents, 300_000);
        assert_eq!(invoice.vat_cents, 48_000);
        assert_eq!(invoice.total_cents, 348_000);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price_cents, 300_000);
        assert!(invoice.invoice_number.starts_with("INV-"));

        // Final invoice closes the job and stamps the completion date
        let job = db.jobs().get_by_id(&job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Invoiced);
        assert!(job.completed_on.is_some());

        // The labor charge is no longer eligible anywhere
        let remaining = db
            .billing()
            .eligible_lines(&InvoiceScope::Job(job_id))
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_part_with_markup_and_discount() {
        let (db, _vehicle_id, job_id) = db_with_job(DbConfig::in_memory()).await;
        add_installed_part(&db, &job_id).await;

        // Part 1,000.00 x 2, 20% default markup, 10% overall discount,
        // 16% VAT -> 2,505.60
        let (invoice, items) = db
            .billing()
            .invoice_all_eligible(InvoiceRequest {
                scope: InvoiceScope::Job(job_id),
                invoice_type: InvoiceType::Progress,
                overall_discount: Rate::from_bps(1_000),
                actor: "clerk".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(items[0].unit_price_cents, 120_000);
        assert_eq!(items[0].line_subtotal_cents, 240_000);
        assert_eq!(invoice.overall_discount_cents, 24_000);
        assert_eq!(invoice.subtotal_after_discount_cents, 216_000);
        assert_eq!(invoice.vat_cents, 34_560);
        assert_eq!(invoice.total_cents, 250_560);
    }

    #[tokio::test]
    async fn test_progress_invoice_leaves_job_open() {
        let (db, _vehicle_id, job_id) = db_with_job(DbConfig::in_memory()).await;
        add_labor(&db, &job_id, 100_000).await;

        db.billing()
            .invoice_all_eligible(InvoiceRequest {
                scope: InvoiceScope::Job(job_id.clone()),
                invoice_type: InvoiceType::Progress,
                overall_discount: Rate::zero(),
                actor: "clerk".to_string(),
            })
            .await
            .unwrap();

        let job = db.jobs().get_by_id(&job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Open);
    }

    #[tokio::test]
    async fn test_items_reconcile_to_header() {
        let (db, _vehicle_id, job_id) = db_with_job(DbConfig::in_memory()).await;
        add_labor(&db, &job_id, 300_000).await;
        add_installed_part(&db, &job_id).await;
        // Odd amount to force rounding residue in the allocation
        add_labor(&db, &job_id, 33_333).await;

        let (invoice, _items) = db
            .billing()
            .invoice_all_eligible(InvoiceRequest {
                scope: InvoiceScope::Job(job_id),
                invoice_type: InvoiceType::Progress,
                overall_discount: Rate::from_bps(750),
                actor: "clerk".to_string(),
            })
            .await
            .unwrap();

        let item_sum: i64 = sqlx::query_scalar(
            "SELECT SUM(total_cents) FROM customer_invoice_items WHERE invoice_id = ?1",
        )
        .bind(&invoice.id)
        .fetch_one(db.pool())
        .await
        .unwrap();

        assert_eq!(item_sum, invoice.total_cents);
        assert_eq!(
            invoice.total_cents,
            invoice.subtotal_after_discount_cents + invoice.vat_cents
        );
        assert_eq!(
            invoice.subtotal_after_discount_cents,
            invoice.subtotal_before_discount_cents - invoice.overall_discount_cents
        );
    }

    #[tokio::test]
    async fn test_stale_lines_rejected_and_rolled_back() {
        let (db, _vehicle_id, job_id) = db_with_job(DbConfig::in_memory()).await;
        add_labor(&db, &job_id, 100_000).await;

        let scope = InvoiceScope::Job(job_id.clone());
        let stale_lines = db.billing().eligible_lines(&scope).await.unwrap();

        db.billing()
            .generate_invoice(final_request(&job_id), stale_lines.clone())
            .await
            .unwrap();

        // Resubmitting the same stale form hits the UNIQUE guard
        let err = db
            .billing()
            .generate_invoice(final_request(&job_id), stale_lines)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::Core(CoreError::AlreadyInvoiced { .. })
        ));

        // The failed attempt left no partial invoice behind
        let headers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customer_invoices")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(headers, 1);
    }

    #[tokio::test]
    async fn test_concurrent_generation_bills_once() {
        let (db, _vehicle_id, job_id) = db_with_job(DbConfig::shared_in_memory("writer_race")).await;
        let charge_id = add_labor(&db, &job_id, 100_000).await;

        let scope = InvoiceScope::Job(job_id.clone());
        let lines = db.billing().eligible_lines(&scope).await.unwrap();

        let billing_a = db.billing();
        let billing_b = db.billing();
        let (req_a, req_b) = (final_request(&job_id), final_request(&job_id));
        let (lines_a, lines_b) = (lines.clone(), lines);

        let (a, b) = tokio::join!(
            tokio::spawn(async move { billing_a.generate_invoice(req_a, lines_a).await }),
            tokio::spawn(async move { billing_b.generate_invoice(req_b, lines_b).await }),
        );

        let results = [a.unwrap(), b.unwrap()];
        let ok_count = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(ok_count, 1, "exactly one generation must win");

        // The invariant the constraint exists for: cardinality <= 1
        let references: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM customer_invoice_items
            WHERE item_type = 'labor' AND reference_id = ?1
            "#,
        )
        .bind(&charge_id)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(references, 1);
    }

    #[tokio::test]
    async fn test_vehicle_wide_final_invoice_closes_all_jobs() {
        let (db, vehicle_id, first_job) = db_with_job(DbConfig::in_memory()).await;
        add_labor(&db, &first_job, 100_000).await;

        let second_job = db
            .jobs()
            .create(NewJob {
                vehicle_id: vehicle_id.clone(),
                description: "Gearbox service".to_string(),
                job_type: JobType::Service,
                started_on: NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
            })
            .await
            .unwrap();
        add_labor(&db, &second_job.id, 200_000).await;

        let (invoice, items) = db
            .billing()
            .invoice_all_eligible(InvoiceRequest {
                scope: InvoiceScope::Vehicle(vehicle_id),
                invoice_type: InvoiceType::Final,
                overall_discount: Rate::zero(),
                actor: "clerk".to_string(),
            })
            .await
            .unwrap();

        assert!(invoice.job_id.is_none());
        assert_eq!(items.len(), 2);

        for job_id in [&first_job, &second_job.id] {
            let job = db.jobs().get_by_id(job_id).await.unwrap().unwrap();
            assert_eq!(job.status, JobStatus::Invoiced);
        }
    }

    #[tokio::test]
    async fn test_invoice_numbers_are_sequential() {
        let (db, _vehicle_id, job_id) = db_with_job(DbConfig::in_memory()).await;
        add_labor(&db, &job_id, 100_000).await;
        add_labor(&db, &job_id, 200_000).await;

        let scope = InvoiceScope::Job(job_id.clone());
        let lines = db.billing().eligible_lines(&scope).await.unwrap();

        let request = InvoiceRequest {
            scope,
            invoice_type: InvoiceType::Progress,
            overall_discount: Rate::zero(),
            actor: "clerk".to_string(),
        };

        let (first, _) = db
            .billing()
            .generate_invoice(request.clone(), vec![lines[0].clone()])
            .await
            .unwrap();
        let (second, _) = db
            .billing()
            .generate_invoice(request, vec![lines[1].clone()])
            .await
            .unwrap();

        let year = Utc::now().year();
        assert_eq!(first.invoice_number, format!("INV-{year}-0001"));
        assert_eq!(second.invoice_number, format!("INV-{year}-0002"));
    }

    #[tokio::test]
    async fn test_nothing_eligible() {
        let (db, _vehicle_id, job_id) = db_with_job(DbConfig::in_memory()).await;

        let err = db
            .billing()
            .invoice_all_eligible(final_request(&job_id))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::Core(CoreError::NothingEligible { .. })
        ));
    }

    #[tokio::test]
    async fn test_reprint_leaves_pricing_untouched() {
        let (db, _vehicle_id, job_id) = db_with_job(DbConfig::in_memory()).await;
        add_labor(&db, &job_id, 300_000).await;

        let (invoice, _) = db
            .billing()
            .invoice_all_eligible(final_request(&job_id))
            .await
            .unwrap();

        let printed = db.invoices().record_print(&invoice.id).await.unwrap();
        let printed = db.invoices().record_print(&printed.id).await.unwrap();

        assert_eq!(printed.reprint_count, 2);
        assert!(printed.last_printed_at.is_some());
        assert_eq!(printed.total_cents, invoice.total_cents);
        assert_eq!(printed.vat_cents, invoice.vat_cents);
        assert_eq!(
            printed.subtotal_before_discount_cents,
            invoice.subtotal_before_discount_cents
        );
    }
}
