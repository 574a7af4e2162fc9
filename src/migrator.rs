//! The migration state machine: compares on-disk migration files against
//! the ledger and drives them forward or backward.

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::constants::MIGRATION_FILE_EXTENSION;
use crate::db::executor::execute_batch;
use crate::db::lock::AdvisoryLock;
use crate::error::MigrateError;
use crate::ledger::{Ledger, LedgerRecord};
use crate::migration::{
    MigrationFile, Section, blank_template, discover_migrations, extract_section,
    migration_filename,
};

/// Derived state of one migration name. Never stored; recomputed from the
/// ledger and the directory listing on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// File exists, no ledger record.
    Pending,
    /// Ledger record whose most recent execution succeeded.
    Applied,
    /// Ledger record whose most recent execution failed.
    Error,
}

impl MigrationState {
    pub fn of(record: Option<&LedgerRecord>) -> Self {
        match record {
            None => Self::Pending,
            Some(r) if r.is_success => Self::Applied,
            Some(_) => Self::Error,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Applied => "APPLIED",
            Self::Error => "ERROR",
        }
    }
}

const STATUS_HEADER: (&str, &str, &str, &str) = ("Migration name", "Status", "Updated at", "Applied at");

/// Orchestrates the migration operations against one database and one
/// migration directory.
pub struct Migrator {
    pool: PgPool,
    ledger: Ledger,
    dir: PathBuf,
}

impl Migrator {
    pub fn new(pool: PgPool, dir: impl Into<PathBuf>) -> Self {
        let ledger = Ledger::new(pool.clone());
        Self {
            pool,
            ledger,
            dir: dir.into(),
        }
    }

    /// Write a fresh migration file with empty up and down sections.
    ///
    /// Touches only the filesystem: no lock is taken and the database is
    /// never contacted.
    pub fn create(&self, name: &str) -> Result<PathBuf, MigrateError> {
        use std::io::Write;

        let path = self.dir.join(migration_filename(name));

        let mut file = std::fs::File::create(&path).map_err(|e| {
            error!("create: failed to create migration file {}: {e}", path.display());
            MigrateError::FileCreation {
                path: path.clone(),
                source: e,
            }
        })?;

        file.write_all(blank_template().as_bytes()).map_err(|e| {
            error!("create: failed to write migration file {}: {e}", path.display());
            MigrateError::FileWrite {
                path: path.clone(),
                source: e,
            }
        })?;

        info!("created new migration: {}", path.display());
        Ok(path)
    }

    /// Apply every pending migration in name order, stopping at the first
    /// failure. Migrations applied earlier in the same run stay applied.
    pub async fn up(&self) -> Result<()> {
        let lock = AdvisoryLock::acquire(&self.pool)
            .await
            .inspect_err(|e| error!("up: {e}"))?;
        let result = self.apply_pending().await;
        lock.release().await;
        result
    }

    /// Roll back the most recently applied migration.
    pub async fn down(&self) -> Result<()> {
        let lock = AdvisoryLock::acquire(&self.pool)
            .await
            .inspect_err(|e| error!("down: {e}"))?;
        let result = self.rollback_latest().await;
        lock.release().await;
        result
    }

    /// Down immediately followed by up. There is no compensating action if
    /// the rollback succeeds and the re-apply then fails: the migration is
    /// left rolled back and reported by `status` accordingly.
    pub async fn redo(&self) -> Result<()> {
        self.down().await?;
        self.up().await
    }

    /// Print the derived state of every migration file.
    ///
    /// Read-only: takes no lock, so output racing a concurrent writer may
    /// observe an in-flight state.
    pub async fn status(&self) -> Result<()> {
        let applied = self
            .ledger
            .list_all()
            .await
            .inspect_err(|e| error!("status: failed to load ledger: {e}"))?;
        let migrations = discover_migrations(&self.dir).inspect_err(|e| error!("status: {e:#}"))?;

        let (name_h, status_h, updated_h, applied_h) = STATUS_HEADER;
        println!("{name_h:<40} {status_h:<10} {updated_h:<25} {applied_h:<25}");

        for migration in migrations {
            let record = applied.get(&migration.name);
            let state = MigrationState::of(record);
            let (updated_at, applied_at) = match record {
                Some(r) => (r.updated_at.to_rfc3339(), r.applied_at.to_rfc3339()),
                None => ("-".to_string(), "-".to_string()),
            };
            println!(
                "{:<40} {:<10} {:<25} {:<25}",
                migration.name,
                state.label(),
                updated_at,
                applied_at
            );
        }

        Ok(())
    }

    /// Print the name of the most recently applied migration.
    pub async fn db_version(&self) -> Result<()> {
        let name = self
            .ledger
            .last_applied()
            .await
            .inspect_err(|e| error!("dbversion: failed to find last applied migration: {e}"))?;

        println!("Latest migration: {name}");
        Ok(())
    }

    async fn apply_pending(&self) -> Result<()> {
        self.ledger
            .ensure_schema()
            .await
            .inspect_err(|e| error!("up: failed to ensure ledger schema: {e}"))?;

        let applied = self
            .ledger
            .list_all()
            .await
            .inspect_err(|e| error!("up: failed to load ledger: {e}"))?;

        let migrations = discover_migrations(&self.dir).inspect_err(|e| error!("up: {e:#}"))?;

        for migration in migrations {
            // Already-recorded names are skipped, including failed ones:
            // re-attempting a failed migration requires manual ledger or
            // file intervention.
            if applied.contains_key(&migration.name) {
                continue;
            }
            self.apply_one(&migration).await?;
        }

        Ok(())
    }

    async fn apply_one(&self, migration: &MigrationFile) -> Result<()> {
        let up_sql = self.read_section(&migration.path, Section::Up, "up")?;

        if let Err(exec_err) = execute_batch(&self.pool, &up_sql, &migration.name).await {
            // Persist the failure so it surfaces in `status` instead of
            // vanishing with the process. The migration itself is not
            // retried automatically.
            if let Err(ledger_err) = self.ledger.record_apply(&migration.name, false).await {
                error!(
                    "up: migration {} failed and the failure could not be recorded: {exec_err:#} | {ledger_err}",
                    migration.name
                );
                return Err(exec_err.context(format!(
                    "additionally failed to record the failure in the ledger: {ledger_err}"
                )));
            }

            error!("up: failed to apply migration {}: {exec_err:#}", migration.name);
            return Err(exec_err);
        }

        self.ledger
            .record_apply(&migration.name, true)
            .await
            .inspect_err(|e| {
                error!("up: failed to record applied migration {}: {e}", migration.name)
            })?;

        info!("migration applied: {}", migration.name);
        Ok(())
    }

    async fn rollback_latest(&self) -> Result<()> {
        // The latest record is targeted regardless of its success flag: a
        // failed apply still gets its down section run.
        let name = self
            .ledger
            .last_applied()
            .await
            .inspect_err(|e| error!("down: failed to find last applied migration: {e}"))?;

        let path = self
            .dir
            .join(format!("{name}.{MIGRATION_FILE_EXTENSION}"));
        let down_sql = self.read_section(&path, Section::Down, "down")?;

        if let Err(exec_err) = execute_batch(&self.pool, &down_sql, &name).await {
            if let Err(ledger_err) = self.ledger.record_outcome(&name, false).await {
                error!(
                    "down: rollback of {name} failed and the failure could not be recorded: {exec_err:#} | {ledger_err}"
                );
                return Err(exec_err.context(format!(
                    "additionally failed to record the failure in the ledger: {ledger_err}"
                )));
            }

            error!("down: failed to roll back migration {name}: {exec_err:#}");
            return Err(exec_err);
        }

        // A successful rollback removes the row entirely; only a failed
        // rollback leaves history behind.
        self.ledger
            .remove(&name)
            .await
            .inspect_err(|e| error!("down: failed to delete ledger record {name}: {e}"))?;

        info!("migration rolled back: {name}");
        Ok(())
    }

    fn read_section(&self, path: &Path, section: Section, op: &str) -> Result<String> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read migration file {}", path.display()))
            .inspect_err(|e| error!("{op}: {e:#}"))?;

        let sql = extract_section(&content, section)
            .with_context(|| format!("failed to parse migration template {}", path.display()))
            .inspect_err(|e| error!("{op}: {e:#}"))?;

        Ok(sql.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_migrator(dir: &Path) -> Migrator {
        // connect_lazy never opens a connection; fine for operations that
        // stay on the filesystem.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pgshift_test")
            .unwrap();
        Migrator::new(pool, dir)
    }

    fn record(success: bool) -> LedgerRecord {
        LedgerRecord {
            name: "20240101000000_a".to_string(),
            is_success: success,
            applied_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn state_derivation() {
        assert_eq!(MigrationState::of(None), MigrationState::Pending);
        assert_eq!(
            MigrationState::of(Some(&record(true))),
            MigrationState::Applied
        );
        assert_eq!(
            MigrationState::of(Some(&record(false))),
            MigrationState::Error
        );

        assert_eq!(MigrationState::Pending.label(), "PENDING");
        assert_eq!(MigrationState::Applied.label(), "APPLIED");
        assert_eq!(MigrationState::Error.label(), "ERROR");
    }

    #[tokio::test]
    async fn create_writes_blank_template() {
        let dir = tempfile::tempdir().unwrap();
        let migrator = lazy_migrator(dir.path());

        let path = migrator.create("add_users").unwrap();

        let filename = path.file_name().unwrap().to_str().unwrap();
        assert!(filename.ends_with("_add_users.sql"));
        assert!(filename[..14].chars().all(|c| c.is_ascii_digit()));

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, blank_template());
    }

    #[tokio::test]
    async fn create_fails_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let migrator = lazy_migrator(&dir.path().join("no_such_dir"));

        let err = migrator.create("add_users").unwrap_err();
        assert!(matches!(err, MigrateError::FileCreation { .. }));
    }
}
