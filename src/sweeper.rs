use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, error, info, instrument};

use crate::error::AppError;
use crate::league::LeagueService;

/// Deletes expired pending reports on a fixed interval. Expiry is already
/// enforced when a report is read, so this only keeps the table small.
pub async fn start_sweeping(league: LeagueService, interval_secs: u64) {
    let mut interval = interval(Duration::from_secs(interval_secs));

    info!(interval_secs, "🧹 Pending match sweeper started");

    loop {
        interval.tick().await;

        if let Err(e) = sweep(&league).await {
            error!(error = ?e, "🧹 ❌ Sweep cycle failed");
        }
    }
}

#[instrument(skip_all, fields(removed))]
async fn sweep(league: &LeagueService) -> Result<(), AppError> {
    let removed = league.sweep_expired().await?;
    tracing::Span::current().record("removed", removed);

    if removed == 0 {
        debug!("🧹 No expired pending matches");
    }
    Ok(())
}
