//! # Settings Repository
//!
//! Persists the pricing configuration as a versioned JSON document.
//!
//! A database that has never been configured reads back the workshop
//! defaults, so the calculator works on first launch.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

use crate::error::DbResult;
use lanyard_core::config::{PricingConfiguration, CURRENT_SCHEMA_VERSION};

/// Settings key of the pricing document.
pub const PRICING_KEY: &str = "pricing";

/// Repository for settings documents.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads the stored pricing configuration, or the workshop defaults.
    ///
    /// ## Errors
    /// A stored document with another schema version or broken JSON is a
    /// `DbError::Core(Configuration(..))`; it is never silently replaced.
    pub async fn load_pricing(&self) -> DbResult<PricingConfiguration> {
        let stored: Option<String> =
            sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
                .bind(PRICING_KEY)
                .fetch_optional(&self.pool)
                .await?;

        match stored {
            Some(json) => Ok(PricingConfiguration::from_json(&json)?),
            None => {
                debug!("No stored pricing, using workshop defaults");
                Ok(PricingConfiguration::workshop_default())
            }
        }
    }

    /// Whether a pricing document has been saved.
    pub async fn has_pricing(&self) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings WHERE key = ?1")
            .bind(PRICING_KEY)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Stores the pricing configuration, replacing any previous one.
    ///
    /// Validation issues are logged, not enforced: the settings screen shows
    /// them and the operator decides.
    pub async fn save_pricing(&self, config: &PricingConfiguration) -> DbResult<()> {
        for issue in config.validate() {
            warn!(issue = %issue, "Saving pricing configuration with issue");
        }

        let json = config.to_json_pretty()?;
        debug!(schema_version = config.schema_version, "Saving pricing configuration");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, schema_version, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                schema_version = excluded.schema_version,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(PRICING_KEY)
        .bind(json)
        .bind(CURRENT_SCHEMA_VERSION as i64)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
