//! # Subcontract Repository
//!
//! Database operations for subcontracted work.
//!
//! ## Lifecycle
//! ```text
//! draft → pending_approval → approved → in_progress → completed → billed
//!                                │                        ▲
//!   dispatch(): job → with_subcontractor                  │
//!   complete(): job ← in_progress (vehicle returned)──────┘
//!   billed is set by the invoice writer, never here
//! ```
//!
//! Parts-type work additionally tracks installation_status; service-type
//! rows are created fully_installed so the completion checker never holds
//! them against the job.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::billing::BillingError;
use crate::error::{DbError, DbResult};
use garage_core::validation::{validate_amount_cents, validate_description};
use garage_core::{
    validate_transition, InstallationStatus, JobStatus, SubcontractStatus, SubcontractWork,
    WorkType,
};

/// Input for creating subcontracted work.
#[derive(Debug, Clone)]
pub struct NewSubcontractWork {
    pub job_id: String,
    pub subcontractor_name: String,
    pub description: String,
    pub work_type: WorkType,
    pub cost_cents: i64,
}

/// Repository for subcontract work database operations.
#[derive(Debug, Clone)]
pub struct SubcontractRepository {
    pool: SqlitePool,
}

impl SubcontractRepository {
    /// Creates a new SubcontractRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SubcontractRepository { pool }
    }

    /// Creates subcontracted work in draft status.
    pub async fn create(&self, input: NewSubcontractWork) -> DbResult<SubcontractWork> {
        validate_description(&input.description)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        validate_amount_cents(input.cost_cents)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;

        let installation_status = match input.work_type {
            WorkType::Parts => InstallationStatus::Pending,
            WorkType::Service => InstallationStatus::FullyInstalled,
        };

        let work = SubcontractWork {
            id: Uuid::new_v4().to_string(),
            job_id: input.job_id,
            subcontractor_name: input.subcontractor_name,
            description: input.description,
            work_type: input.work_type,
            status: SubcontractStatus::Draft,
            installation_status,
            cost_cents: input.cost_cents,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        debug!(id = %work.id, job_id = %work.job_id, "Creating subcontract work");

        sqlx::query(
            r#"
            INSERT INTO subcontract_works (
                id, job_id, subcontractor_name, description, work_type,
                status, installation_status, cost_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&work.id)
        .bind(&work.job_id)
        .bind(&work.subcontractor_name)
        .bind(&work.description)
        .bind(work.work_type)
        .bind(work.status)
        .bind(work.installation_status)
        .bind(work.cost_cents)
        .bind(work.created_at)
        .bind(work.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(work)
    }

    /// Gets subcontract work by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SubcontractWork>> {
        let work =
            sqlx::query_as::<_, SubcontractWork>("SELECT * FROM subcontract_works WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(work)
    }

    /// Lists all subcontract work for a job, oldest first.
    pub async fn list_for_job(&self, job_id: &str) -> DbResult<Vec<SubcontractWork>> {
        let works = sqlx::query_as::<_, SubcontractWork>(
            "SELECT * FROM subcontract_works WHERE job_id = ?1 ORDER BY created_at",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(works)
    }

    /// Submits draft work for approval.
    pub async fn submit(&self, id: &str) -> DbResult<()> {
        self.step(
            id,
            &[SubcontractStatus::Draft],
            SubcontractStatus::PendingApproval,
        )
        .await
    }

    /// Approves pending work.
    pub async fn approve(&self, id: &str) -> DbResult<()> {
        self.step(
            id,
            &[SubcontractStatus::PendingApproval],
            SubcontractStatus::Approved,
        )
        .await
    }

    /// Dispatches approved work to the subcontractor.
    ///
    /// The owning job moves to with_subcontractor when its current state
    /// has that edge.
    pub async fn dispatch(&self, id: &str) -> Result<SubcontractWork, BillingError> {
        let work = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("SubcontractWork", id))?;

        if work.status != SubcontractStatus::Approved {
            return Err(DbError::QueryFailed(format!(
                "subcontract work {id} is {:?}, not approved",
                work.status
            ))
            .into());
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        sqlx::query("UPDATE subcontract_works SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(SubcontractStatus::InProgress)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        let job_status: JobStatus = sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?1")
            .bind(&work.job_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;

        if validate_transition(job_status, JobStatus::WithSubcontractor).is_ok() {
            sqlx::query("UPDATE jobs SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&work.job_id)
                .bind(JobStatus::WithSubcontractor)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;
        }

        tx.commit().await.map_err(DbError::from)?;

        debug!(id, "Subcontract work dispatched");

        Ok(SubcontractWork {
            status: SubcontractStatus::InProgress,
            updated_at: Utc::now(),
            ..work
        })
    }

    /// Marks dispatched work as completed, optionally correcting the cost
    /// to what the subcontractor actually charged.
    ///
    /// When the job sits in with_subcontractor, it returns to in_progress.
    pub async fn complete(
        &self,
        id: &str,
        final_cost_cents: Option<i64>,
    ) -> Result<SubcontractWork, BillingError> {
        let work = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("SubcontractWork", id))?;

        if work.status != SubcontractStatus::InProgress {
            return Err(DbError::QueryFailed(format!(
                "subcontract work {id} is {:?}, not in progress",
                work.status
            ))
            .into());
        }

        let cost_cents = final_cost_cents.unwrap_or(work.cost_cents);
        validate_amount_cents(cost_cents).map_err(|e| DbError::QueryFailed(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        sqlx::query(
            r#"
            UPDATE subcontract_works
            SET status = ?2, cost_cents = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(SubcontractStatus::Completed)
        .bind(cost_cents)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        let job_status: JobStatus = sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?1")
            .bind(&work.job_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;

        if job_status == JobStatus::WithSubcontractor {
            validate_transition(job_status, JobStatus::InProgress)?;
            sqlx::query("UPDATE jobs SET status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&work.job_id)
                .bind(JobStatus::InProgress)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;
        }

        tx.commit().await.map_err(DbError::from)?;

        debug!(id, cost_cents, "Subcontract work completed");

        Ok(SubcontractWork {
            status: SubcontractStatus::Completed,
            cost_cents,
            updated_at: Utc::now(),
            ..work
        })
    }

    /// Records installation progress for parts-type work.
    pub async fn record_installation(
        &self,
        id: &str,
        status: InstallationStatus,
    ) -> DbResult<()> {
        let work = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("SubcontractWork", id))?;

        if work.work_type != WorkType::Parts {
            return Err(DbError::QueryFailed(format!(
                "subcontract work {id} is service-type; installation does not apply"
            )));
        }

        sqlx::query(
            "UPDATE subcontract_works SET installation_status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Shared status step with an allowed-from guard.
    async fn step(
        &self,
        id: &str,
        allowed_from: &[SubcontractStatus],
        to: SubcontractStatus,
    ) -> DbResult<()> {
        let work = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("SubcontractWork", id))?;

        if !allowed_from.contains(&work.status) {
            return Err(DbError::QueryFailed(format!(
                "subcontract work {id} cannot move from {:?} to {to:?}",
                work.status
            )));
        }

        sqlx::query("UPDATE subcontract_works SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(to)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        debug!(id, ?to, "Subcontract status updated");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
