use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::models::session::Session;

/// Deletes sessions whose expiry has passed
pub async fn purge_expired_sessions(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let deleted = Session::delete_expired(pool).await?;

    if deleted > 0 {
        tracing::info!(deleted, "Expired sessions purged");
    } else {
        tracing::debug!("No expired sessions to purge");
    }

    Ok(deleted)
}

/// Starts a scheduler running the purge on `cron` (six-field, seconds first).
/// The returned scheduler must be kept alive.
pub async fn start(pool: PgPool, cron: &str) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_id, _scheduler| {
        let pool = pool.clone();
        Box::pin(async move {
            if let Err(e) = purge_expired_sessions(&pool).await {
                tracing::error!(error = %e, "Session cleanup failed");
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!(cron = %cron, "Session cleanup job scheduled");

    Ok(scheduler)
}
