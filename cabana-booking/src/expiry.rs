use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::error::BookingError;
use crate::lifecycle::ReservationManager;

/// Reclaims reservations stuck in `pendiente` after an abandoned checkout.
///
/// A guest who closes the processor's page leaves the reservation holding the
/// calendar with no payment coming. After `ttl_minutes` the sweeper hands the
/// dates back by cancelling it. A TTL of 0 disables reclamation entirely.
pub struct ExpirySweeper {
    manager: Arc<ReservationManager>,
    ttl_minutes: u64,
}

impl ExpirySweeper {
    pub fn new(manager: Arc<ReservationManager>, ttl_minutes: u64) -> Self {
        Self {
            manager,
            ttl_minutes,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl_minutes > 0
    }

    /// One pass: cancel every pendiente reservation older than the TTL.
    /// Returns how many were reclaimed.
    pub async fn sweep(&self) -> Result<usize, BookingError> {
        if !self.is_enabled() {
            return Ok(0);
        }

        let cutoff = Utc::now() - Duration::minutes(self.ttl_minutes as i64);
        self.manager.reclaim_abandoned(cutoff).await
    }
}
