//! # Labor Repository
//!
//! Database operations for labor charges.
//!
//! A charge is either hours × rate or a fixed amount; the billable amount
//! is resolved ONCE at creation and stored in amount_cents. There is no
//! "invoiced" flag on the row - a charge counts as invoiced iff a customer
//! invoice item references it.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use garage_core::validation::{validate_amount_cents, validate_description, validate_hours};
use garage_core::LaborCharge;

/// Input for creating a labor charge.
///
/// Supply either `hours` + `rate_cents`, or `fixed_amount_cents`.
#[derive(Debug, Clone)]
pub struct NewLaborCharge {
    pub job_id: String,
    pub description: String,
    pub hours: Option<f64>,
    pub rate_cents: Option<i64>,
    pub fixed_amount_cents: Option<i64>,
}

/// Repository for labor charge database operations.
#[derive(Debug, Clone)]
pub struct LaborRepository {
    pool: SqlitePool,
}

impl LaborRepository {
    /// Creates a new LaborRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LaborRepository { pool }
    }

    /// Creates a labor charge, resolving the billable amount.
    ///
    /// ## Errors
    /// `DbError::QueryFailed` when neither hours × rate nor a fixed amount
    /// is supplied, or a field fails validation.
    pub async fn create(&self, input: NewLaborCharge) -> DbResult<LaborCharge> {
        validate_description(&input.description)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;

        let amount_cents = match (input.hours, input.rate_cents, input.fixed_amount_cents) {
            (Some(hours), Some(rate), None) => {
                validate_hours(hours).map_err(|e| DbError::QueryFailed(e.to_string()))?;
                validate_amount_cents(rate).map_err(|e| DbError::QueryFailed(e.to_string()))?;
                LaborCharge::resolve_amount(hours, rate)
            }
            (None, None, Some(fixed)) => {
                validate_amount_cents(fixed).map_err(|e| DbError::QueryFailed(e.to_string()))?;
                fixed
            }
            _ => {
                return Err(DbError::QueryFailed(
                    "labor charge needs either hours and rate, or a fixed amount".to_string(),
                ))
            }
        };

        let charge = LaborCharge {
            id: Uuid::new_v4().to_string(),
            job_id: input.job_id,
            description: input.description,
            hours: input.hours,
            rate_cents: input.rate_cents,
            amount_cents,
            created_at: Utc::now(),
        };

        debug!(id = %charge.id, job_id = %charge.job_id, amount_cents, "Creating labor charge");

        sqlx::query(
            r#"
            INSERT INTO labor_charges (
                id, job_id, description, hours, rate_cents, amount_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&charge.id)
        .bind(&charge.job_id)
        .bind(&charge.description)
        .bind(charge.hours)
        .bind(charge.rate_cents)
        .bind(charge.amount_cents)
        .bind(charge.created_at)
        .execute(&self.pool)
        .await?;

        Ok(charge)
    }

    /// Gets a labor charge by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<LaborCharge>> {
        let charge =
            sqlx::query_as::<_, LaborCharge>("SELECT * FROM labor_charges WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(charge)
    }

    /// Lists all labor charges for a job, oldest first.
    pub async fn list_for_job(&self, job_id: &str) -> DbResult<Vec<LaborCharge>> {
        let charges = sqlx::query_as::<_, LaborCharge>(
            "SELECT * FROM labor_charges WHERE job_id = ?1 ORDER BY created_at",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(charges)
    }

    /// Deletes a labor charge.
    ///
    /// Refused when a customer invoice item already references the charge;
    /// invoiced history is immutable.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let invoiced: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM customer_invoice_items
            WHERE item_type = 'labor' AND reference_id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if invoiced > 0 {
            return Err(DbError::ForeignKeyViolation {
                message: format!("labor charge {id} is referenced by an invoice"),
            });
        }

        let result = sqlx::query("DELETE FROM labor_charges WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LaborCharge", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
