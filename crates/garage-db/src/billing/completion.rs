//! # Job Completion Checker
//!
//! Audits whether every billable item of a job has been invoiced before
//! allowing the job into the completed state.
//!
//! ## The Audit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  A job may complete only when ALL of:                                   │
//! │                                                                         │
//! │  (a) every labor charge has an invoice item                             │
//! │  (b) every fully_installed supplier invoice item has an invoice item    │
//! │  (c) every completed subcontract work has an invoice item               │
//! │  (d) no parts-type subcontract work is still awaiting installation      │
//! │                                                                         │
//! │  Anything outstanding is reported as a human-readable description so    │
//! │  the caller can show the user exactly what blocks completion.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On a refusal the job status is left untouched.

use chrono::Utc;
use tracing::{debug, info};

use super::{BillingError, BillingResult, BillingService};
use crate::error::DbError;
use garage_core::{validate_transition, CoreError, Job, JobStatus, Money};

/// Result of the completion audit.
#[derive(Debug, Clone)]
pub struct CompletionReport {
    /// Human-readable descriptions of everything blocking completion.
    /// Empty means the job is completable.
    pub outstanding: Vec<String>,
}

impl CompletionReport {
    pub fn is_completable(&self) -> bool {
        self.outstanding.is_empty()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OutstandingLabor {
    description: String,
    amount_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct OutstandingPart {
    part_number: String,
    description: String,
    quantity_received: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct OutstandingSubcontract {
    subcontractor_name: String,
    description: String,
}

impl BillingService {
    /// Runs the completion audit for a job without changing anything.
    pub async fn check_completion(&self, job_id: &str) -> BillingResult<CompletionReport> {
        let found: Option<String> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = ?1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?;
        if found.is_none() {
            return Err(BillingError::Core(CoreError::JobNotFound(
                job_id.to_string(),
            )));
        }

        let mut outstanding = Vec::new();

        let labor = sqlx::query_as::<_, OutstandingLabor>(
            r#"
            SELECT description, amount_cents FROM labor_charges
            WHERE job_id = ?1
              AND NOT EXISTS (
                  SELECT 1 FROM customer_invoice_items
                  WHERE item_type = 'labor' AND reference_id = labor_charges.id
              )
            ORDER BY created_at
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        for row in labor {
            outstanding.push(format!(
                "Labor: {} ({})",
                row.description,
                Money::from_cents(row.amount_cents)
            ));
        }

        let parts = sqlx::query_as::<_, OutstandingPart>(
            r#"
            SELECT sii.part_number, sii.description, sii.quantity_received
            FROM supplier_invoice_items sii
            JOIN supplier_invoices si ON si.id = sii.supplier_invoice_id
            WHERE si.job_id = ?1
              AND sii.installation_status = 'fully_installed'
              AND NOT EXISTS (
                  SELECT 1 FROM customer_invoice_items
                  WHERE item_type = 'isuzu_part' AND reference_id = sii.id
              )
            ORDER BY sii.rowid
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        for row in parts {
            outstanding.push(format!(
                "Part {}: {} x{}",
                row.part_number, row.description, row.quantity_received
            ));
        }

        let uninvoiced_subs = sqlx::query_as::<_, OutstandingSubcontract>(
            r#"
            SELECT subcontractor_name, description FROM subcontract_works
            WHERE job_id = ?1
              AND status IN ('completed', 'billed')
              AND NOT EXISTS (
                  SELECT 1 FROM customer_invoice_items
                  WHERE item_type IN ('subcontract_part', 'subcontract_service')
                    AND reference_id = subcontract_works.id
              )
            ORDER BY created_at
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        for row in uninvoiced_subs {
            outstanding.push(format!(
                "Subcontract not invoiced: {}: {}",
                row.subcontractor_name, row.description
            ));
        }

        // Parts supplied by a subcontractor must be on the vehicle before
        // the job can close, invoiced or not.
        let awaiting_install = sqlx::query_as::<_, OutstandingSubcontract>(
            r#"
            SELECT subcontractor_name, description FROM subcontract_works
            WHERE job_id = ?1
              AND work_type = 'parts'
              AND status IN ('completed', 'billed')
              AND installation_status != 'fully_installed'
            ORDER BY created_at
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        for row in awaiting_install {
            outstanding.push(format!(
                "Subcontract parts awaiting installation: {}: {}",
                row.subcontractor_name, row.description
            ));
        }

        debug!(job_id, outstanding = outstanding.len(), "Completion audit");
        Ok(CompletionReport { outstanding })
    }

    /// Completes a job if the audit passes.
    ///
    /// ## Errors
    /// - `CoreError::JobNotCompletable` with the outstanding descriptions
    ///   when anything is still unbilled; the job status is untouched
    /// - `CoreError::InvalidStatusTransition` when the job is already
    ///   completed or invoiced
    pub async fn complete_job(&self, job_id: &str, actor: &str) -> BillingResult<Job> {
        let report = self.check_completion(job_id).await?;
        if !report.is_completable() {
            return Err(BillingError::Core(CoreError::JobNotCompletable {
                outstanding: report.outstanding,
            }));
        }

        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| CoreError::JobNotFound(job_id.to_string()))?;

        validate_transition(job.status, JobStatus::Completed)?;

        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = 'completed', completed_on = ?3, updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(job_id)
        .bind(job.status)
        .bind(today)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::TransactionFailed(format!(
                "job {job_id} status changed concurrently"
            ))
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO activity_log (actor, action, entity_type, entity_id, detail, created_at)
            VALUES (?1, 'job_completed', 'job', ?2, NULL, ?3)
            "#,
        )
        .bind(actor)
        .bind(job_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(job_id, job_number = %job.job_number, "Job completed");

        Ok(Job {
            status: JobStatus::Completed,
            completed_on: Some(today),
            updated_at: Utc::now(),
            ..job
        })
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
    use crate::repository::subcontract::NewSubcontractWork;
    use crate::repository::vehicle::NewVehicle;
    use chrono::NaiveDate;
    use garage_core::{InvoiceType, JobType, Rate, WorkType};

    async fn db_with_job() -> (Database, String) {
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
                started_on: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            })
            .await
            .unwrap();
        (db, job.id)
    }

    async fn add_labor(db: &Database, job_id: &str, amount: i64) {
        db.labor()
            .create(NewLaborCharge {
                job_id: job_id.to_string(),
                description: "Engine overhaul labor".to_string(),
                hours: None,
                rate_cents: None,
                fixed_amount_cents: Some(amount),
            })
            .await
            .unwrap();
    }

    async fn invoice_everything(db: &Database, job_id: &str) {
        db.billing()
            .invoice_all_eligible(InvoiceRequest {
                scope: InvoiceScope::Job(job_id.to_string()),
                invoice_type: InvoiceType::Progress,
                overall_discount: Rate::zero(),
                actor: "clerk".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_refused_while_labor_unbilled() {
        let (db, job_id) = db_with_job().await;
        add_labor(&db, &job_id, 300_000).await;

        let err = db.billing().complete_job(&job_id, "foreman").await.unwrap_err();
        match err {
            BillingError::Core(CoreError::JobNotCompletable { outstanding }) => {
                assert_eq!(outstanding.len(), 1);
                assert!(outstanding[0].starts_with("Labor: Engine overhaul labor"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // Refusal leaves the status untouched
        let job = db.jobs().get_by_id(&job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Open);
    }

    #[tokio::test]
    async fn test_completes_once_everything_invoiced() {
        let (db, job_id) = db_with_job().await;
        add_labor(&db, &job_id, 300_000).await;
        invoice_everything(&db, &job_id).await;

        let report = db.billing().check_completion(&job_id).await.unwrap();
        assert!(report.is_completable());

        let job = db.billing().complete_job(&job_id, "foreman").await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_on.is_some());

        let stored = db.jobs().get_by_id(&job_id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_completed_job_cannot_complete_again() {
        let (db, job_id) = db_with_job().await;
        add_labor(&db, &job_id, 100_000).await;
        invoice_everything(&db, &job_id).await;
        db.billing().complete_job(&job_id, "foreman").await.unwrap();

        let err = db.billing().complete_job(&job_id, "foreman").await.unwrap_err();
        assert!(matches!(
            err,
            BillingError::Core(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_subcontract_parts_awaiting_installation_block() {
        let (db, job_id) = db_with_job().await;
        db.jobs()
            .update_status(&job_id, JobStatus::InProgress)
            .await
            .unwrap();

        let work = db
            .subcontracts()
            .create(NewSubcontractWork {
                job_id: job_id.clone(),
                subcontractor_name: "Bodyworks Ltd".to_string(),
                description: "Fabricated exhaust bracket".to_string(),
                work_type: WorkType::Parts,
                cost_cents: 40_000,
            })
            .await
            .unwrap();
        db.subcontracts().submit(&work.id).await.unwrap();
        db.subcontracts().approve(&work.id).await.unwrap();
        db.subcontracts().dispatch(&work.id).await.unwrap();
        db.subcontracts().complete(&work.id, None).await.unwrap();

        // Bill the subcontract line; the bracket is still not on the truck
        invoice_everything(&db, &job_id).await;

        let report = db.billing().check_completion(&job_id).await.unwrap();
        assert_eq!(report.outstanding.len(), 1);
        assert!(report.outstanding[0].contains("awaiting installation"));
        assert!(report.outstanding[0].contains("Fabricated exhaust bracket"));

        // Install it and the job becomes completable
        db.subcontracts()
            .record_installation(&work.id, garage_core::InstallationStatus::FullyInstalled)
            .await
            .unwrap();
        let report = db.billing().check_completion(&job_id).await.unwrap();
        assert!(report.is_completable());
    }

    #[tokio::test]
    async fn test_outstanding_lists_every_category() {
        let (db, job_id) = db_with_job().await;
        db.jobs()
            .update_status(&job_id, JobStatus::InProgress)
            .await
            .unwrap();
        add_labor(&db, &job_id, 100_000).await;

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
        db.subcontracts().complete(&work.id, None).await.unwrap();

        let report = db.billing().check_completion(&job_id).await.unwrap();
        assert_eq!(report.outstanding.len(), 2);
        assert!(report.outstanding[0].starts_with("Labor:"));
        assert!(report.outstanding[1].starts_with("Subcontract not invoiced:"));
    }
}
