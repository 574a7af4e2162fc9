//! Extracts structured context from PostgreSQL errors so a failing
//! migration reports the offending line instead of a bare driver message.

use sqlx::postgres::{PgDatabaseError, PgErrorPosition};

/// Error context pulled out of a PostgreSQL error response.
#[derive(Debug, Clone)]
pub struct SqlErrorContext {
    pub message: String,
    /// Line in the executed SQL, converted from the character position.
    pub line: Option<usize>,
    pub detail: Option<String>,
    pub hint: Option<String>,
}

impl SqlErrorContext {
    /// Uses structured data from `PgDatabaseError` - no string parsing.
    pub fn from_sqlx_error(error: &sqlx::Error, sql: &str) -> Self {
        if let Some(db_error) = error.as_database_error()
            && let Some(pg_error) = db_error.try_downcast_ref::<PgDatabaseError>()
        {
            let position = pg_error.position().map(|pos| match pos {
                PgErrorPosition::Original(p) => p,
                PgErrorPosition::Internal { position, .. } => position,
            });

            return Self {
                message: pg_error.message().to_string(),
                line: position.map(|p| line_of_position(sql, p)),
                detail: pg_error.detail().map(str::to_string),
                hint: pg_error.hint().map(str::to_string),
            };
        }

        // Non-PostgreSQL failure (connection drop, pool timeout, ...)
        Self {
            message: error.to_string(),
            line: None,
            detail: None,
            hint: None,
        }
    }

    /// Format the error for display, naming the migration it came from.
    pub fn format(&self, source: &str) -> String {
        let mut msg = match self.line {
            Some(line) => format!("SQL error in {} at line {}: {}", source, line, self.message),
            None => format!("SQL error in {}: {}", source, self.message),
        };

        if let Some(detail) = &self.detail {
            msg.push_str(&format!("\n  detail: {detail}"));
        }
        if let Some(hint) = &self.hint {
            msg.push_str(&format!("\n  hint: {hint}"));
        }

        msg
    }
}

/// Convert a 1-indexed character position into a 1-indexed line number.
fn line_of_position(sql: &str, position: usize) -> usize {
    let end = position.saturating_sub(1).min(sql.len());
    let prefix = sql.get(..end).unwrap_or(sql);
    prefix.chars().filter(|c| *c == '\n').count() + 1
}
