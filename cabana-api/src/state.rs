use std::sync::Arc;

use cabana_booking::{AvailabilityChecker, PaymentHandoff, ReservationManager};
use cabana_core::{CabinRepository, ReservationRepository};
use cabana_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct AppState {
    pub cabins: Arc<dyn CabinRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub checker: Arc<AvailabilityChecker>,
    pub manager: Arc<ReservationManager>,
    pub payments: Arc<PaymentHandoff>,
    /// Present only when a Redis URL is configured; rate limiting is skipped
    /// without it.
    pub redis: Option<Arc<RedisClient>>,
    pub auth: AuthConfig,
}
