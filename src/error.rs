use std::path::PathBuf;
use thiserror::Error;

/// Error kinds surfaced by the migration engine.
///
/// Storage and lock failures carry the underlying database error; the
/// orchestrator adds operation and migration-name context on the way up.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// A migration file is missing a section marker, or has the down marker
    /// before the up marker.
    #[error("malformed migration template: expected `-- +up` before `-- +down`")]
    MalformedTemplate,

    #[error("no migrations have been applied")]
    NoMigrationsApplied,

    /// The ledger already holds a record for this name. Correct callers
    /// only insert names they have just verified to be absent, so this
    /// indicates a concurrent writer or operator intervention.
    #[error("ledger already has a record for migration {0}")]
    DuplicateRecord(String),

    #[error("ledger has no record for migration {0}")]
    RecordNotFound(String),

    #[error("ledger storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("failed to acquire migration advisory lock: {0}")]
    Lock(#[source] sqlx::Error),

    #[error("failed to create migration file {path}")]
    FileCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write migration file {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
