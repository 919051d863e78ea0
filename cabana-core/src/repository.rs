use async_trait::async_trait;
use cabana_catalog::Cabin;
use cabana_shared::DateRange;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::reservation::{Reservation, ReservationStatus};

/// Storage-layer failures surfaced to the booking engine.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// An overlapping pending/confirmed reservation already holds the range.
    #[error("reservation conflicts with an existing one")]
    Conflict,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Repository trait for cabin registry access. The booking engine only reads.
#[async_trait]
pub trait CabinRepository: Send + Sync {
    async fn get_cabin(&self, id: Uuid) -> Result<Option<Cabin>, StoreError>;
}

/// Repository trait for reservation data access.
///
/// `insert_pending` carries the one systems-level guarantee in this codebase:
/// the overlap re-check and the insert must be serialized against concurrent
/// callers, so that of two racing creates for overlapping ranges exactly one
/// succeeds and the other gets `StoreError::Conflict`.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Atomically re-check calendar overlap and persist a new reservation in
    /// `pendiente`. Returns `StoreError::Conflict` if a pending or confirmed
    /// reservation overlaps the same cabin's range.
    async fn insert_pending(&self, reservation: &Reservation) -> Result<(), StoreError>;

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>, StoreError>;

    /// Reservations on a cabin whose status blocks the calendar and whose
    /// interval overlaps `range` under half-open semantics.
    async fn find_blocking_overlaps(
        &self,
        cabin_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Guarded status update: writes `to` only while the current status is in
    /// `allowed_from`. Returns whether a row was updated, so a raced
    /// transition is observable instead of silently overwriting a terminal
    /// state.
    async fn transition_status(
        &self,
        id: Uuid,
        allowed_from: &[ReservationStatus],
        to: ReservationStatus,
    ) -> Result<bool, StoreError>;

    /// Pending-payment reservations created before `cutoff`, for the expiry
    /// sweeper.
    async fn list_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError>;
}
