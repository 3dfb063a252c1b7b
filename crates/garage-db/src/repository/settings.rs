//! # Settings Repository
//!
//! Key-value system settings with a typed view over the billing keys.
//!
//! ## Explicit Configuration
//! The pricing calculator takes a [`BillingSettings`] struct, loaded HERE,
//! once, at invocation time. Nothing reads the settings table mid-
//! calculation, so one invoice is always priced against one consistent
//! snapshot of the configuration.
//!
//! ## Keys
//! ```text
//! billing.vat_bps                  "1600"   (16% VAT)
//! billing.parts_markup_bps         "2000"   (20%)
//! billing.subcontract_markup_bps   "1500"   (15%)
//! billing.labor_markup_bps         "0"
//! billing.invoice_prefix           "INV"
//! ```
//! Missing keys fall back to [`BillingSettings::default`].

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use garage_core::validation::validate_rate_bps;
use garage_core::{BillingSettings, Rate};
use crate::error::DbError;

const KEY_VAT: &str = "billing.vat_bps";
const KEY_PARTS_MARKUP: &str = "billing.parts_markup_bps";
const KEY_SUBCONTRACT_MARKUP: &str = "billing.subcontract_markup_bps";
const KEY_LABOR_MARKUP: &str = "billing.labor_markup_bps";
const KEY_INVOICE_PREFIX: &str = "billing.invoice_prefix";

/// Repository for system settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Gets a raw setting value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM system_settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value)
    }

    /// Upserts a raw setting value.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO system_settings (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        debug!(key, value, "Setting updated");
        Ok(())
    }

    /// Loads the billing settings snapshot.
    ///
    /// Any missing or unparseable key falls back to its default, so a
    /// fresh database prices invoices with the stock 16% VAT / 20% parts
    /// markup configuration.
    pub async fn load_billing(&self) -> DbResult<BillingSettings> {
        let defaults = BillingSettings::default();

        Ok(BillingSettings {
            vat: self.rate_or(KEY_VAT, defaults.vat).await?,
            parts_markup: self.rate_or(KEY_PARTS_MARKUP, defaults.parts_markup).await?,
            subcontract_markup: self
                .rate_or(KEY_SUBCONTRACT_MARKUP, defaults.subcontract_markup)
                .await?,
            labor_markup: self.rate_or(KEY_LABOR_MARKUP, defaults.labor_markup).await?,
            invoice_prefix: self
                .get(KEY_INVOICE_PREFIX)
                .await?
                .unwrap_or(defaults.invoice_prefix),
        })
    }

    /// Persists the billing settings snapshot.
    ///
    /// The VAT rate must be a valid percentage; markups are uncapped.
    pub async fn save_billing(&self, settings: &BillingSettings) -> DbResult<()> {
        validate_rate_bps(settings.vat.bps()).map_err(|e| DbError::QueryFailed(e.to_string()))?;

        self.set(KEY_VAT, &settings.vat.bps().to_string()).await?;
        self.set(KEY_PARTS_MARKUP, &settings.parts_markup.bps().to_string())
            .await?;
        self.set(
            KEY_SUBCONTRACT_MARKUP,
            &settings.subcontract_markup.bps().to_string(),
        )
        .await?;
        self.set(KEY_LABOR_MARKUP, &settings.labor_markup.bps().to_string())
            .await?;
        self.set(KEY_INVOICE_PREFIX, &settings.invoice_prefix)
            .await?;

        Ok(())
    }

    async fn rate_or(&self, key: &str, default: Rate) -> DbResult<Rate> {
        let rate = self
            .get(key)
            .await?
            .and_then(|v| v.parse::<u32>().ok())
            .map(Rate::from_bps)
            .unwrap_or(default);

        Ok(rate)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_defaults_on_fresh_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let settings = db.settings().load_billing().await.unwrap();

        assert_eq!(settings.vat.bps(), 1_600);
        assert_eq!(settings.parts_markup.bps(), 2_000);
        assert_eq!(settings.invoice_prefix, "INV");
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut settings = BillingSettings::default();
        settings.vat = Rate::from_bps(1_800);
        settings.parts_markup = Rate::from_bps(2_500);
        settings.invoice_prefix = "GAR".to_string();

        db.settings().save_billing(&settings).await.unwrap();

        let loaded = db.settings().load_billing().await.unwrap();
        assert_eq!(loaded.vat.bps(), 1_800);
        assert_eq!(loaded.parts_markup.bps(), 2_500);
        assert_eq!(loaded.invoice_prefix, "GAR");
        // Untouched key keeps its default
        assert_eq!(loaded.labor_markup.bps(), 0);
    }

    #[tokio::test]
    async fn test_vat_must_be_a_percentage() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut settings = BillingSettings::default();
        settings.vat = Rate::from_bps(10_001);

        assert!(db.settings().save_billing(&settings).await.is_err());
    }
}
