//! Persisted record of every migration name that has ever been executed.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::constants::LEDGER_TABLE;
use crate::error::MigrateError;

/// One row of the ledger table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LedgerRecord {
    pub name: String,
    /// True iff the most recent apply/rollback execution of this name
    /// succeeded.
    pub is_success: bool,
    /// Set at first insertion, never mutated afterwards.
    pub applied_at: DateTime<Utc>,
    /// Refreshed on every status change.
    pub updated_at: DateTime<Utc>,
}

/// Narrow persistence interface over the `migration_schema` table.
///
/// Absence of a row means "never attempted". The ledger is the durable
/// source of truth for what has run; the filesystem only supplies
/// candidates.
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: PgPool,
}

impl Ledger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the ledger table if it does not exist yet. Idempotent.
    pub async fn ensure_schema(&self) -> Result<(), MigrateError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                name VARCHAR PRIMARY KEY,
                is_success BOOLEAN,
                applied_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            LEDGER_TABLE
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Every record, keyed by migration name.
    pub async fn list_all(&self) -> Result<HashMap<String, LedgerRecord>, MigrateError> {
        let rows: Vec<LedgerRecord> = sqlx::query_as(&format!(
            "SELECT name, is_success, applied_at, updated_at FROM {}",
            LEDGER_TABLE
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.name.clone(), r)).collect())
    }

    /// Insert a new record with applied_at = updated_at = now.
    pub async fn record_apply(&self, name: &str, success: bool) -> Result<(), MigrateError> {
        sqlx::query(&format!(
            "INSERT INTO {} (name, is_success, applied_at, updated_at) VALUES ($1, $2, NOW(), NOW())",
            LEDGER_TABLE
        ))
        .bind(name)
        .bind(success)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                MigrateError::DuplicateRecord(name.to_string())
            } else {
                MigrateError::Storage(e)
            }
        })?;

        Ok(())
    }

    /// Update the success flag of an existing record, refreshing
    /// updated_at and leaving applied_at untouched.
    pub async fn record_outcome(&self, name: &str, success: bool) -> Result<(), MigrateError> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET is_success = $1, updated_at = NOW() WHERE name = $2",
            LEDGER_TABLE
        ))
        .bind(success)
        .bind(name)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(MigrateError::RecordNotFound(name.to_string()));
        }
        Ok(())
    }

    /// Delete the record. Deleting an absent name is not an error.
    pub async fn remove(&self, name: &str) -> Result<(), MigrateError> {
        sqlx::query(&format!("DELETE FROM {} WHERE name = $1", LEDGER_TABLE))
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Name of the record with the latest applied_at timestamp, whether or
    /// not its most recent execution succeeded.
    pub async fn last_applied(&self) -> Result<String, MigrateError> {
        let row: Option<(String,)> = sqlx::query_as(&format!(
            "SELECT name FROM {} ORDER BY applied_at DESC LIMIT 1",
            LEDGER_TABLE
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(name,)| name)
            .ok_or(MigrateError::NoMigrationsApplied)
    }
}
