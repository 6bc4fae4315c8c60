//! Periodic permission-expiry sweep.
//!
//! `check_active` already treats elapsed grants as inactive on read; this
//! task persists the ACTIVE->EXPIRED transition (and re-locks the
//! corresponding areas) so the stored state catches up. Minute
//! granularity is enough -- expiry is a soft timeout, not a hard
//! cancellation.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use atrium_db::repositories::PermissionRepo;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Run the permission-expiry sweep loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let interval_secs: u64 = std::env::var("PERMISSION_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(SWEEP_INTERVAL.as_secs());

    tracing::info!(interval_secs, "Permission expiry sweep started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Permission expiry sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match PermissionRepo::expire_elapsed(&pool, Utc::now()).await {
                    Ok(expired) => {
                        if expired > 0 {
                            tracing::info!(expired, "Permission expiry sweep: grants expired");
                        } else {
                            tracing::debug!("Permission expiry sweep: nothing to expire");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Permission expiry sweep failed");
                    }
                }
            }
        }
    }
}
