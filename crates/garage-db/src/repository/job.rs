//! # Job Repository
//!
//! Database operations for repair jobs.
//!
//! ## Status Changes
//! Every status change goes through the transition table in garage-core.
//! The update is optimistic: `UPDATE ... WHERE status = <expected>` so a
//! concurrent change makes the write affect zero rows instead of silently
//! clobbering the other writer.
//!
//! Two edges are reserved for the billing services:
//! - `* → completed` is driven by the completion checker after its audit
//! - `completed → invoiced` is driven by the invoice writer

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::billing::BillingError;
use crate::error::{DbError, DbResult};
use garage_core::validation::validate_description;
use garage_core::{validate_transition, Job, JobStatus, JobType};

/// Input for creating a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub vehicle_id: String,
    pub description: String,
    pub job_type: JobType,
    pub started_on: NaiveDate,
}

/// Repository for job database operations.
#[derive(Debug, Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    /// Creates a new JobRepository.
    pub fn new(pool: SqlitePool) -> Self {
        JobRepository { pool }
    }

    /// Creates a job with a generated sequential job number (`JOB-0001`).
    ///
    /// The number comes from the single-row job_sequences counter, bumped
    /// inside the same transaction as the insert so concurrent creations
    /// never collide.
    pub async fn create(&self, input: NewJob) -> DbResult<Job> {
        validate_description(&input.description)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        let vehicle_exists: Option<String> =
            sqlx::query_scalar("SELECT id FROM vehicles WHERE id = ?1")
                .bind(&input.vehicle_id)
                .fetch_optional(&mut *tx)
                .await?;
        if vehicle_exists.is_none() {
            return Err(DbError::not_found("Vehicle", &input.vehicle_id));
        }

        let seq: i64 = sqlx::query_scalar(
            "UPDATE job_sequences SET next_seq = next_seq + 1 WHERE id = 1 RETURNING next_seq - 1",
        )
        .fetch_one(&mut *tx)
        .await?;

        let job = Job {
            id: Uuid::new_v4().to_string(),
            vehicle_id: input.vehicle_id,
            job_number: format!("JOB-{seq:04}"),
            description: input.description,
            job_type: input.job_type,
            status: JobStatus::Open,
            started_on: input.started_on,
            completed_on: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        debug!(id = %job.id, job_number = %job.job_number, "Creating job");

        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, vehicle_id, job_number, description, job_type,
                status, started_on, completed_on, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&job.id)
        .bind(&job.vehicle_id)
        .bind(&job.job_number)
        .bind(&job.description)
        .bind(job.job_type)
        .bind(job.status)
        .bind(job.started_on)
        .bind(job.completed_on)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(job)
    }

    /// Gets a job by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    /// Gets a job by its business number.
    pub async fn get_by_number(&self, job_number: &str) -> DbResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE job_number = ?1")
            .bind(job_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    /// Lists all jobs for a vehicle, newest first.
    pub async fn list_for_vehicle(&self, vehicle_id: &str) -> DbResult<Vec<Job>> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE vehicle_id = ?1 ORDER BY created_at DESC",
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(jobs)
    }

    /// Lists jobs in a given status, oldest first.
    pub async fn list_by_status(&self, status: JobStatus) -> DbResult<Vec<Job>> {
        let jobs =
            sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE status = ?1 ORDER BY created_at")
                .bind(status)
                .fetch_all(&self.pool)
                .await?;

        Ok(jobs)
    }

    /// Changes a job's status through the transition table.
    ///
    /// ## Errors
    /// - `CoreError::InvalidStatusTransition` for an edge not in the table
    /// - `DbError::NotFound` when the job doesn't exist
    /// - `DbError::TransactionFailed` when a concurrent writer changed the
    ///   status between the read and the write
    pub async fn update_status(&self, id: &str, to: JobStatus) -> Result<Job, BillingError> {
        let job = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Job", id))?;

        validate_transition(job.status, to)?;

        // Terminal states stamp the completion date if not already set
        let completed_on = if to.is_terminal() {
            Some(Utc::now().date_naive())
        } else {
            None
        };

        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = ?3, completed_on = COALESCE(completed_on, ?5), updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(job.status)
        .bind(to)
        .bind(Utc::now())
        .bind(completed_on)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DbError::TransactionFailed(format!(
                "job {id} status changed concurrently"
            ))
            .into());
        }

        debug!(id, from = %job.status, to = %to, "Job status updated");

        Ok(Job {
            status: to,
            completed_on: job.completed_on.or(completed_on),
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
    use crate::pool::{Database, DbConfig};
    use crate::repository::vehicle::NewVehicle;
    use garage_core::CoreError;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_vehicle(db: &Database) -> String {
        db.vehicles()
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
            .unwrap()
            .id
    }

    fn new_job(vehicle_id: &str) -> NewJob {
        NewJob {
            vehicle_id: vehicle_id.to_string(),
            description: "Engine overhaul".to_string(),
            job_type: JobType::General,
            started_on: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_numbers() {
        let db = test_db().await;
        let vehicle_id = seed_vehicle(&db).await;

        let first = db.jobs().create(new_job(&vehicle_id)).await.unwrap();
        let second = db.jobs().create(new_job(&vehicle_id)).await.unwrap();

        assert_eq!(first.job_number, "JOB-0001");
        assert_eq!(second.job_number, "JOB-0002");
        assert_eq!(first.status, JobStatus::Open);
    }

    #[tokio::test]
    async fn test_create_for_missing_vehicle() {
        let db = test_db().await;
        let err = db.jobs().create(new_job("no-such-vehicle")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_status_walk_through_lifecycle() {
        let db = test_db().await;
        let vehicle_id = seed_vehicle(&db).await;
        let job = db.jobs().create(new_job(&vehicle_id)).await.unwrap();

        let job = db
            .jobs()
            .update_status(&job.id, JobStatus::AwaitingQuotationApproval)
            .await
            .unwrap();
        let job = db
            .jobs()
            .update_status(&job.id, JobStatus::AwaitingParts)
            .await
            .unwrap();
        let job = db
            .jobs()
            .update_status(&job.id, JobStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::InProgress);

        let stored = db.jobs().get_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::InProgress);
    }

    #[tokio::test]
    async fn test_illegal_transition_rejected() {
        let db = test_db().await;
        let vehicle_id = seed_vehicle(&db).await;
        let job = db.jobs().create(new_job(&vehicle_id)).await.unwrap();

        // Cannot skip quotation approval
        let err = db
            .jobs()
            .update_status(&job.id, JobStatus::AwaitingParts)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BillingError::Core(CoreError::InvalidStatusTransition { .. })
        ));

        // Status unchanged on refusal
        let stored = db.jobs().get_by_id(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Open);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let db = test_db().await;
        let vehicle_id = seed_vehicle(&db).await;
        let job = db.jobs().create(new_job(&vehicle_id)).await.unwrap();
        db.jobs().create(new_job(&vehicle_id)).await.unwrap();

        db.jobs()
            .update_status(&job.id, JobStatus::InProgress)
            .await
            .unwrap();

        let open = db.jobs().list_by_status(JobStatus::Open).await.unwrap();
        assert_eq!(open.len(), 1);

        let in_progress = db
            .jobs()
            .list_by_status(JobStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, job.id);
    }
}
