use anyhow::Result;
use sqlx::PgPool;
use tracing::debug;

use super::error_context::SqlErrorContext;

/// Execute one migration section as a single multi-statement batch.
///
/// The SQL is handed to PostgreSQL verbatim with no transaction wrapper,
/// so a failure partway through a batch can leave its earlier statements
/// applied. Recovering from that is an operator responsibility.
pub async fn execute_batch(pool: &PgPool, sql: &str, source: &str) -> Result<()> {
    if sql.trim().is_empty() {
        // An empty section is legal and executes as a no-op.
        debug!("skipping empty SQL batch from {source}");
        return Ok(());
    }

    match sqlx::raw_sql(sql).execute(pool).await {
        Ok(result) => {
            debug!(
                "executed {} ({} rows affected)",
                source,
                result.rows_affected()
            );
            Ok(())
        }
        Err(e) => {
            let ctx = SqlErrorContext::from_sqlx_error(&e, sql);
            Err(anyhow::anyhow!("{}", ctx.format(source)))
        }
    }
}
