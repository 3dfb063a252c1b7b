//! # Eligibility Resolver
//!
//! Determines which source rows have not yet appeared on any customer
//! invoice line.
//!
//! ## Eligibility Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Labor charges:     every charge for the job without an invoice item    │
//! │                     (item_type = 'labor')                               │
//! │                                                                         │
//! │  Supplier parts:    installation_status = 'fully_installed' AND no      │
//! │                     invoice item (item_type = 'isuzu_part');            │
//! │                     quantity billed = quantity_received                 │
//! │                                                                         │
//! │  Subcontracts:      status IN ('completed', 'billed') AND no invoice    │
//! │                     item (item_type = 'subcontract_part' or             │
//! │                     'subcontract_service' per work_type)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Partially installed parts are excluded ENTIRELY until installation
//! completes; the full received quantity is then billed in one line.
//!
//! The "no invoice item" filter here is a courtesy pre-filter - the
//! UNIQUE constraint in the writer's transaction is what actually
//! prevents double-billing under concurrency.

use sqlx::SqlitePool;
use tracing::debug;

use super::{BillingError, BillingResult, BillingService, InvoiceScope};
use crate::error::DbError;
use garage_core::{BillableLine, BillingItemType, CoreError, Money};

#[derive(Debug, sqlx::FromRow)]
struct LaborRow {
    id: String,
    job_id: String,
    description: String,
    amount_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct PartRow {
    id: String,
    job_id: String,
    part_number: String,
    description: String,
    quantity_received: i64,
    unit_cost_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct SubcontractRow {
    id: String,
    job_id: String,
    subcontractor_name: String,
    description: String,
    work_type: garage_core::WorkType,
    cost_cents: i64,
}

impl BillingService {
    /// Resolves the billable lines for a scope, in a stable order:
    /// labor first, then parts, then subcontracted work.
    ///
    /// Lines come back with default markups and zero discounts; the
    /// caller may adjust both before pricing.
    ///
    /// ## Errors
    /// `CoreError::JobNotFound` / `CoreError::VehicleNotFound` when the
    /// scope target doesn't exist.
    pub async fn eligible_lines(&self, scope: &InvoiceScope) -> BillingResult<Vec<BillableLine>> {
        self.verify_scope(scope).await?;

        let mut lines = Vec::new();
        lines.extend(eligible_labor(&self.pool, scope).await?);
        lines.extend(eligible_parts(&self.pool, scope).await?);
        lines.extend(eligible_subcontracts(&self.pool, scope).await?);

        debug!(scope = %scope.describe(), count = lines.len(), "Eligibility resolved");
        Ok(lines)
    }

    async fn verify_scope(&self, scope: &InvoiceScope) -> BillingResult<()> {
        match scope {
            InvoiceScope::Job(id) => {
                let found: Option<String> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = ?1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(DbError::from)?;
                if found.is_none() {
                    return Err(BillingError::Core(CoreError::JobNotFound(id.clone())));
                }
            }
            InvoiceScope::Vehicle(id) => {
                let found: Option<String> =
                    sqlx::query_scalar("SELECT id FROM vehicles WHERE id = ?1")
                        .bind(id)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(DbError::from)?;
                if found.is_none() {
                    return Err(BillingError::Core(CoreError::VehicleNotFound(id.clone())));
                }
            }
        }
        Ok(())
    }
}

/// SQL fragment selecting the job ids a scope covers.
///
/// Bound as ?1 in every eligibility query: a job id directly, or a
/// vehicle id expanded through the jobs table.
fn scope_filter(scope: &InvoiceScope) -> (&'static str, &str) {
    match scope {
        InvoiceScope::Job(id) => ("job_id = ?1", id),
        InvoiceScope::Vehicle(id) => {
            ("job_id IN (SELECT id FROM jobs WHERE vehicle_id = ?1)", id)
        }
    }
}

async fn eligible_labor(
    pool: &SqlitePool,
    scope: &InvoiceScope,
) -> BillingResult<Vec<BillableLine>> {
    let (filter, bind) = scope_filter(scope);

    let sql = format!(
        r#"
        SELECT id, job_id, description, amount_cents
        FROM labor_charges
        WHERE {filter}
          AND NOT EXISTS (
              SELECT 1 FROM customer_invoice_items
              WHERE item_type = 'labor' AND reference_id = labor_charges.id
          )
        ORDER BY created_at
        "#
    );

    let rows = sqlx::query_as::<_, LaborRow>(&sql)
        .bind(bind)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            BillableLine::new(
                row.job_id,
                BillingItemType::Labor,
                row.id,
                row.description,
                Money::from_cents(row.amount_cents),
                1,
            )
        })
        .collect())
}

async fn eligible_parts(
    pool: &SqlitePool,
    scope: &InvoiceScope,
) -> BillingResult<Vec<BillableLine>> {
    let (filter, bind) = scope_filter(scope);

    // supplier_invoice_items carries no job_id; the join pulls it from
    // the owning supplier invoice.
    let sql = format!(
        r#"
        SELECT sii.id, si.job_id, sii.part_number, sii.description,
               sii.quantity_received, sii.unit_cost_cents
        FROM supplier_invoice_items sii
        JOIN supplier_invoices si ON si.id = sii.supplier_invoice_id
        WHERE si.{filter}
          AND sii.installation_status = 'fully_installed'
          AND NOT EXISTS (
              SELECT 1 FROM customer_invoice_items
              WHERE item_type = 'isuzu_part' AND reference_id = sii.id
          )
        ORDER BY sii.rowid
        "#
    );

    let rows = sqlx::query_as::<_, PartRow>(&sql)
        .bind(bind)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            BillableLine::new(
                row.job_id,
                BillingItemType::IsuzuPart,
                row.id,
                format!("{} - {}", row.part_number, row.description),
                Money::from_cents(row.unit_cost_cents),
                row.quantity_received,
            )
        })
        .collect())
}

async fn eligible_subcontracts(
    pool: &SqlitePool,
    scope: &InvoiceScope,
) -> BillingResult<Vec<BillableLine>> {
    let (filter, bind) = scope_filter(scope);

    let sql = format!(
        r#"
        SELECT id, job_id, subcontractor_name, description, work_type, cost_cents
        FROM subcontract_works
        WHERE {filter}
          AND status IN ('completed', 'billed')
          AND NOT EXISTS (
              SELECT 1 FROM customer_invoice_items
              WHERE item_type IN ('subcontract_part', 'subcontract_service')
                AND reference_id = subcontract_works.id
          )
        ORDER BY created_at
        "#
    );

    let rows = sqlx::query_as::<_, SubcontractRow>(&sql)
        .bind(bind)
        .fetch_all(pool)
        .await
        .map_err(DbError::from)?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let item_type = match row.work_type {
                garage_core::WorkType::Parts => BillingItemType::SubcontractPart,
                garage_core::WorkType::Service => BillingItemType::SubcontractService,
            };
            BillableLine::new(
                row.job_id,
                item_type,
                row.id,
                format!("{}: {}", row.subcontractor_name, row.description),
                Money::from_cents(row.cost_cents),
                1,
            )
        })
        .collect())
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
    use crate::repository::subcontract::NewSubcontractWork;
    use crate::repository::vehicle::NewVehicle;
    use chrono::NaiveDate;
    use garage_core::{JobStatus, JobType, WorkType};

    async fn db_with_job() -> (Database, String, String) {
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

    /// Quotation → approval → supplier invoice, returning the received
    /// item's id, still uninstalled.
    async fn add_received_part(db: &Database, job_id: &str) -> String {
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
        let invoice = db
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
            .supplier_invoice_items(&invoice.id)
            .await
            .unwrap();
        items[0].id.clone()
    }

    #[tokio::test]
    async fn test_labor_is_eligible_until_invoiced() {
        let (db, _vehicle_id, job_id) = db_with_job().await;
        add_labor(&db, &job_id, 300_000).await;

        let scope = InvoiceScope::Job(job_id.clone());
        let lines = db.billing().eligible_lines(&scope).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_type, BillingItemType::Labor);
        assert_eq!(lines[0].unit_cost.cents(), 300_000);
        assert_eq!(lines[0].quantity, 1);
        assert_eq!(lines[0].job_id, job_id);
    }

    #[tokio::test]
    async fn test_parts_gated_on_full_installation() {
        let (db, _vehicle_id, job_id) = db_with_job().await;
        let item_id = add_received_part(&db, &job_id).await;
        let scope = InvoiceScope::Job(job_id.clone());

        // Pending: not eligible
        assert!(db.billing().eligible_lines(&scope).await.unwrap().is_empty());

        // Partially installed: still excluded entirely
        db.procurement().record_installation(&item_id, 1).await.unwrap();
        assert!(db.billing().eligible_lines(&scope).await.unwrap().is_empty());

        // Fully installed: billed at the FULL received quantity
        db.procurement().record_installation(&item_id, 2).await.unwrap();
        let lines = db.billing().eligible_lines(&scope).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_type, BillingItemType::IsuzuPart);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].description, "8-94156-245-0 - Oil filter");
    }

    #[tokio::test]
    async fn test_subcontract_eligible_when_completed() {
        let (db, _vehicle_id, job_id) = db_with_job().await;
        db.jobs()
            .update_status(&job_id, JobStatus::InProgress)
            .await
            .unwrap();

        let work = db
            .subcontracts()
            .create(NewSubcontractWork {
                job_id: job_id.clone(),
                subcontractor_name: "Precision Machining Ltd".to_string(),
                description: "Crankshaft grinding".to_string(),
                work_type: WorkType::Service,
                cost_cents: 80_000,
            })
            .await
            .unwrap();
        db.subcontracts().submit(&work.id).await.unwrap();
        db.subcontracts().approve(&work.id).await.unwrap();
        db.subcontracts().dispatch(&work.id).await.unwrap();

        let scope = InvoiceScope::Job(job_id.clone());
        // In progress: not billable yet
        assert!(db.billing().eligible_lines(&scope).await.unwrap().is_empty());

        db.subcontracts().complete(&work.id, None).await.unwrap();
        let lines = db.billing().eligible_lines(&scope).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].item_type, BillingItemType::SubcontractService);
        assert_eq!(
            lines[0].description,
            "Precision Machining Ltd: Crankshaft grinding"
        );
    }

    #[tokio::test]
    async fn test_vehicle_scope_aggregates_jobs() {
        let (db, vehicle_id, job_id) = db_with_job().await;
        add_labor(&db, &job_id, 100_000).await;

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

        let lines = db
            .billing()
            .eligible_lines(&InvoiceScope::Vehicle(vehicle_id))
            .await
            .unwrap();
        assert_eq!(lines.len(), 2);

        let job_ids: Vec<&str> = lines.iter().map(|l| l.job_id.as_str()).collect();
        assert!(job_ids.contains(&job_id.as_str()));
        assert!(job_ids.contains(&second_job.id.as_str()));
    }

    #[tokio::test]
    async fn test_unknown_scope_targets() {
        let (db, _vehicle_id, _job_id) = db_with_job().await;

        let err = db
            .billing()
            .eligible_lines(&InvoiceScope::Job("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::Core(CoreError::JobNotFound(_))));

        let err = db
            .billing()
            .eligible_lines(&InvoiceScope::Vehicle("missing".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::Core(CoreError::VehicleNotFound(_))
        ));
    }
}
