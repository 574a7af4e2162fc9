use sqlx::pool::PoolConnection;
use sqlx::{PgPool, Postgres};
use tracing::warn;

use crate::constants::MIGRATION_LOCK_KEY;
use crate::error::MigrateError;

/// Database-held mutual exclusion around mutating operations.
///
/// `pg_advisory_lock` is session-scoped, so the lock is taken on a
/// dedicated connection that stays checked out of the pool until
/// `release`. If the process dies mid-operation the server clears the lock
/// when that connection is torn down.
pub struct AdvisoryLock {
    conn: PoolConnection<Postgres>,
}

impl AdvisoryLock {
    /// Block until the shared migration lock is granted.
    ///
    /// Contention is not an error: a second invocation simply waits for
    /// the first to finish. Only a failure of the underlying call aborts.
    pub async fn acquire(pool: &PgPool) -> Result<Self, MigrateError> {
        let mut conn = pool.acquire().await.map_err(MigrateError::Lock)?;
        sqlx::query("SELECT pg_advisory_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *conn)
            .await
            .map_err(MigrateError::Lock)?;
        Ok(Self { conn })
    }

    /// Release the lock. Best-effort: a failure is logged rather than
    /// propagated, since returning the connection to the pool and its
    /// eventual teardown clear session locks anyway.
    pub async fn release(mut self) {
        if let Err(e) = sqlx::query("SELECT pg_advisory_unlock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *self.conn)
            .await
        {
            warn!("failed to release migration advisory lock: {e}");
        }
    }
}
