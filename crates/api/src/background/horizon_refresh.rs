//! Periodic horizon refresh for recurring appointments.
//!
//! The generation horizon only advances when something triggers a pass:
//! pattern creation, a schedule-affecting edit, or a manual generate call.
//! Without this job, an untouched pattern stops producing appointments
//! once the window originally generated at creation time runs out. The job
//! closes that gap by re-running a generation pass for every active
//! pattern on a fixed interval; generation is idempotent, so overlap with
//! request-driven passes is harmless.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use dentora_db::repositories::RecurringRepo;

use crate::engine::recurrence;

/// Run the horizon refresh loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    horizon_months: u32,
    interval_secs: u64,
    cancel: CancellationToken,
) {
    tracing::info!(
        horizon_months,
        interval_secs,
        "Horizon refresh job started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Horizon refresh job stopping");
                break;
            }
            _ = interval.tick() => {
                refresh_all(&pool, horizon_months).await;
            }
        }
    }
}

/// One full refresh pass: regenerate the horizon for every active pattern.
///
/// Failures are logged per pattern and never abort the sweep; the next tick
/// (or any request-driven pass) picks up where a failed pattern left off.
async fn refresh_all(pool: &PgPool, horizon_months: u32) {
    let patterns = match RecurringRepo::list_active(pool).await {
        Ok(patterns) => patterns,
        Err(e) => {
            tracing::error!(error = %e, "Horizon refresh: failed to list active patterns");
            return;
        }
    };

    let mut total_created = 0u64;
    for pattern in &patterns {
        match recurrence::generate_occurrences(pool, pattern, horizon_months).await {
            Ok(created) => total_created += created,
            Err(e) => {
                tracing::error!(
                    pattern_id = pattern.id,
                    error = %e,
                    "Horizon refresh: generation failed"
                );
            }
        }
    }

    if total_created > 0 {
        tracing::info!(
            patterns = patterns.len(),
            created = total_created,
            "Horizon refresh: new appointments materialized"
        );
    } else {
        tracing::debug!(patterns = patterns.len(), "Horizon refresh: nothing to add");
    }
}
