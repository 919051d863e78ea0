use cabana_booking::ExpirySweeper;
use tokio::time::{interval, Duration};
use tracing::{error, info};

/// Periodically reclaims reservations abandoned in `pendiente`, handing their
/// dates back to the calendar.
pub async fn start_expiry_worker(sweeper: ExpirySweeper, sweep_interval_seconds: u64) {
    if !sweeper.is_enabled() {
        info!("Expiry worker disabled (pending_ttl_minutes = 0)");
        return;
    }

    let mut ticker = interval(Duration::from_secs(sweep_interval_seconds.max(1)));
    info!("Expiry worker started");

    loop {
        ticker.tick().await;
        match sweeper.sweep().await {
            Ok(0) => {}
            Ok(reclaimed) => info!("Reclaimed {} abandoned reservations", reclaimed),
            Err(e) => error!("Expiry sweep failed: {}", e),
        }
    }
}
