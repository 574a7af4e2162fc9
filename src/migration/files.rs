//! Discovery and naming of on-disk migration files.

use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::constants::{MIGRATION_FILE_EXTENSION, TIMESTAMP_FORMAT};

/// One candidate migration file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// File name without the extension; the ledger key.
    pub name: String,
    pub path: PathBuf,
}

/// List the migration files in `dir`, sorted ascending by name.
///
/// The timestamp prefix makes lexical order chronological order. The
/// listing is taken fresh on every call - the ledger, not the filesystem,
/// is the source of truth for what has run.
pub fn discover_migrations(dir: &Path) -> Result<Vec<MigrationFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read migration directory {}", dir.display()))?;

    let mut migrations = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == MIGRATION_FILE_EXTENSION)
            && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
        {
            migrations.push(MigrationFile {
                name: stem.to_string(),
                path,
            });
        }
    }

    migrations.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(migrations)
}

/// Build a migration file name from the current UTC time and a slug,
/// e.g. `20240101000000_create_users.sql`.
pub fn migration_filename(name: &str) -> String {
    format!(
        "{}_{}.{}",
        Utc::now().format(TIMESTAMP_FORMAT),
        name,
        MIGRATION_FILE_EXTENSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_sorts_by_name_and_skips_noise() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20240101000001_b.sql"), "-- +up\n-- +down\n").unwrap();
        std::fs::write(dir.path().join("20240101000000_a.sql"), "-- +up\n-- +down\n").unwrap();
        std::fs::write(dir.path().join("20240101000002_c.sql"), "-- +up\n-- +down\n").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "not a migration").unwrap();
        std::fs::create_dir(dir.path().join("nested.sql")).unwrap();

        let migrations = discover_migrations(dir.path()).unwrap();

        let names: Vec<&str> = migrations.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "20240101000000_a",
                "20240101000001_b",
                "20240101000002_c"
            ]
        );
    }

    #[test]
    fn discovery_fails_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no_such_dir");
        assert!(discover_migrations(&missing).is_err());
    }

    #[test]
    fn filename_has_sortable_timestamp_prefix() {
        let filename = migration_filename("create_users");

        assert!(filename.ends_with("_create_users.sql"));
        let prefix = &filename[..14];
        assert_eq!(prefix.len(), 14);
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(filename.as_bytes()[14], b'_');
    }
}
