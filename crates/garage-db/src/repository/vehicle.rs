//! # Vehicle Repository
//!
//! Database operations for customer vehicles.
//!
//! ## Deletion Guard
//! A vehicle can only be deleted while it has zero jobs. The repository
//! checks the job count before deleting; the foreign key constraint on
//! jobs.vehicle_id backs the check up at the database level.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use garage_core::validation::{validate_description, validate_plate_number};
use garage_core::Vehicle;

/// Input for creating or updating a vehicle.
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub plate_number: String,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub vin: Option<String>,
    pub owner_name: String,
    pub owner_phone: Option<String>,
    pub owner_email: Option<String>,
}

/// Repository for vehicle database operations.
#[derive(Debug, Clone)]
pub struct VehicleRepository {
    pool: SqlitePool,
}

impl VehicleRepository {
    /// Creates a new VehicleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VehicleRepository { pool }
    }

    /// Creates a vehicle.
    ///
    /// ## Errors
    /// - `DbError::QueryFailed` when the plate number fails validation
    /// - `DbError::UniqueViolation` when the plate number already exists
    pub async fn create(&self, input: NewVehicle) -> DbResult<Vehicle> {
        validate_plate_number(&input.plate_number)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;
        validate_description(&input.owner_name)
            .map_err(|e| DbError::QueryFailed(e.to_string()))?;

        let vehicle = Vehicle {
            id: Uuid::new_v4().to_string(),
            plate_number: input.plate_number.trim().to_uppercase(),
            make: input.make,
            model: input.model,
            year: input.year,
            vin: input.vin,
            owner_name: input.owner_name,
            owner_phone: input.owner_phone,
            owner_email: input.owner_email,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        debug!(id = %vehicle.id, plate = %vehicle.plate_number, "Creating vehicle");

        sqlx::query(
            r#"
            INSERT INTO vehicles (
                id, plate_number, make, model, year, vin,
                owner_name, owner_phone, owner_email,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&vehicle.id)
        .bind(&vehicle.plate_number)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(&vehicle.vin)
        .bind(&vehicle.owner_name)
        .bind(&vehicle.owner_phone)
        .bind(&vehicle.owner_email)
        .bind(vehicle.created_at)
        .bind(vehicle.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(vehicle)
    }

    /// Gets a vehicle by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(vehicle)
    }

    /// Gets a vehicle by plate number (case-insensitive on stored form).
    pub async fn get_by_plate(&self, plate: &str) -> DbResult<Option<Vehicle>> {
        let vehicle =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE plate_number = ?1")
                .bind(plate.trim().to_uppercase())
                .fetch_optional(&self.pool)
                .await?;

        Ok(vehicle)
    }

    /// Searches vehicles by plate number or owner name prefix.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Vehicle>> {
        let pattern = format!("{}%", query.trim().to_uppercase());

        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE plate_number LIKE ?1 OR UPPER(owner_name) LIKE ?1
            ORDER BY plate_number
            LIMIT ?2
            "#,
        )
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(vehicles)
    }

    /// Lists all vehicles ordered by plate number.
    pub async fn list(&self) -> DbResult<Vec<Vehicle>> {
        let vehicles =
            sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles ORDER BY plate_number")
                .fetch_all(&self.pool)
                .await?;

        Ok(vehicles)
    }

    /// Updates the owner contact fields of a vehicle.
    pub async fn update_owner(
        &self,
        id: &str,
        owner_name: &str,
        owner_phone: Option<&str>,
        owner_email: Option<&str>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET owner_name = ?2, owner_phone = ?3, owner_email = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(owner_name)
        .bind(owner_phone)
        .bind(owner_email)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vehicle", id));
        }

        Ok(())
    }

    /// Counts jobs on record for a vehicle.
    pub async fn job_count(&self, id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE vehicle_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Deletes a vehicle.
    ///
    /// ## Errors
    /// `DbError::ForeignKeyViolation` when the vehicle has any jobs on
    /// record - history is never orphaned by a vehicle deletion.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let count = self.job_count(id).await?;
        if count > 0 {
            return Err(DbError::ForeignKeyViolation {
                message: format!("Vehicle has {count} job(s) and cannot be deleted"),
            });
        }

        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vehicle", id));
        }

        debug!(id, "Vehicle deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
