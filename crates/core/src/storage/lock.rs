use anyhow::Context;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;

// Advisory locks are scoped to the Postgres session, so the connection that
// took the lock is held until release.
const NOTIFY_RUN_LOCK_KEY: i64 = 0x5354_4F43_4B57; // "STOCKW"

pub struct NotifyRunLock {
    conn: PoolConnection<Postgres>,
}

/// Returns `None` when another notification run holds the lock.
pub async fn try_acquire_notify_lock(pool: &sqlx::PgPool) -> anyhow::Result<Option<NotifyRunLock>> {
    let mut conn = pool
        .acquire()
        .await
        .context("failed to acquire connection for advisory lock")?;

    let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
        .persistent(false)
        .bind(NOTIFY_RUN_LOCK_KEY)
        .fetch_one(&mut *conn)
        .await
        .with_context(|| format!("failed to acquire advisory lock (key={NOTIFY_RUN_LOCK_KEY})"))?;

    Ok(acquired.0.then_some(NotifyRunLock { conn }))
}

impl NotifyRunLock {
    pub async fn release(mut self) -> anyhow::Result<()> {
        sqlx::query("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(NOTIFY_RUN_LOCK_KEY)
            .execute(&mut *self.conn)
            .await
            .with_context(|| format!("failed to release advisory lock (key={NOTIFY_RUN_LOCK_KEY})"))?;
        Ok(())
    }
}
