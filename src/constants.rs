/// Literal markers separating the up and down sections of a migration file.
/// The up marker must appear before the down marker.
pub const UP_MARKER: &str = "-- +up";
pub const DOWN_MARKER: &str = "-- +down";

/// Extension migration files must carry; anything else in the directory is ignored.
pub const MIGRATION_FILE_EXTENSION: &str = "sql";

/// Format of the sortable 14-digit UTC prefix on generated file names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Table holding one row per migration name that has ever been executed.
pub const LEDGER_TABLE: &str = "migration_schema";

/// Advisory lock key shared by every pgshift process targeting the same
/// database, regardless of which migration set it manages.
pub const MIGRATION_LOCK_KEY: i64 = 0x7067_7368_6966; // "pgshif"

// Configuration file name
pub const CONFIG_FILENAME: &str = "pgshift.yaml";
