use std::sync::Arc;

use cabana_catalog::CabinStatus;
use cabana_core::{CabinRepository, ReservationRepository};
use cabana_shared::DateRange;
use serde::Serialize;
use uuid::Uuid;

use crate::error::BookingError;

/// Point-in-time answer: the requested range was free of conflicts when we
/// looked. This is not a hold; `ReservationManager::create` re-checks under
/// the store's atomicity guarantee.
#[derive(Debug, Clone, Serialize)]
pub struct Availability {
    pub available: bool,
    pub reason: Option<String>,
}

impl Availability {
    fn free() -> Self {
        Self {
            available: true,
            reason: None,
        }
    }

    fn blocked(reason: impl Into<String>) -> Self {
        Self {
            available: false,
            reason: Some(reason.into()),
        }
    }
}

pub struct AvailabilityChecker {
    cabins: Arc<dyn CabinRepository>,
    reservations: Arc<dyn ReservationRepository>,
}

impl AvailabilityChecker {
    pub fn new(
        cabins: Arc<dyn CabinRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        Self {
            cabins,
            reservations,
        }
    }

    /// Decide whether `range` is free on the cabin's calendar.
    ///
    /// A cabin that is occupied or under maintenance is unavailable no matter
    /// what the calendar says. Storage failures propagate as errors; every
    /// caller treats that as "not available" (fail closed).
    pub async fn check(
        &self,
        cabin_id: Uuid,
        range: DateRange,
    ) -> Result<Availability, BookingError> {
        let cabin = self
            .cabins
            .get_cabin(cabin_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("cabin {}", cabin_id)))?;

        match cabin.status {
            CabinStatus::Maintenance => {
                return Ok(Availability::blocked("the cabin is under maintenance"));
            }
            CabinStatus::Occupied => {
                return Ok(Availability::blocked("the cabin is currently occupied"));
            }
            CabinStatus::Available => {}
        }

        let conflicts = self
            .reservations
            .find_blocking_overlaps(cabin_id, range)
            .await?;

        if conflicts.is_empty() {
            Ok(Availability::free())
        } else {
            Ok(Availability::blocked(
                "the requested dates are already reserved",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabana_catalog::{Cabin, CabinStatus};
    use cabana_core::{Reservation, ReservationStatus};
    use cabana_shared::pii::Masked;
    use cabana_store::memory::{InMemoryCabinStore, InMemoryReservationStore};
    use chrono::{NaiveDate, Utc};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cabin(status: CabinStatus) -> Cabin {
        Cabin {
            id: Uuid::new_v4(),
            slug: "el-mirador".to_string(),
            name: "El Mirador".to_string(),
            team_id: Uuid::new_v4(),
            nightly_rate_centavos: 100_000,
            capacity: 4,
            min_stay_nights: 1,
            status,
        }
    }

    fn reservation(cabin_id: Uuid, start: NaiveDate, end: NaiveDate, status: ReservationStatus) -> Reservation {
        let now = Utc::now();
        Reservation {
            id: Uuid::new_v4(),
            cabin_id,
            customer_id: Uuid::new_v4(),
            check_in: start,
            check_out: end,
            guests: 2,
            notes: Masked(String::new()),
            total_centavos: 200_000,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn checker(
        cabins: &Arc<InMemoryCabinStore>,
        reservations: &Arc<InMemoryReservationStore>,
    ) -> AvailabilityChecker {
        AvailabilityChecker::new(cabins.clone(), reservations.clone())
    }

    #[tokio::test]
    async fn test_free_calendar_is_available() {
        let cabins = Arc::new(InMemoryCabinStore::new());
        let reservations = Arc::new(InMemoryReservationStore::new());
        let unit = cabin(CabinStatus::Available);
        cabins.insert(unit.clone());

        let range = DateRange::new(d(2025, 8, 1), d(2025, 8, 3)).unwrap();
        let result = checker(&cabins, &reservations)
            .check(unit.id, range)
            .await
            .unwrap();
        assert!(result.available);
        assert!(result.reason.is_none());
    }

    #[tokio::test]
    async fn test_overlapping_reservation_blocks() {
        let cabins = Arc::new(InMemoryCabinStore::new());
        let reservations = Arc::new(InMemoryReservationStore::new());
        let unit = cabin(CabinStatus::Available);
        cabins.insert(unit.clone());

        // Confirmed stay Aug 2 -> Aug 4; request Aug 1 -> Aug 3 overlaps on Aug 2.
        reservations.seed(reservation(
            unit.id,
            d(2025, 8, 2),
            d(2025, 8, 4),
            ReservationStatus::Confirmed,
        ));

        let range = DateRange::new(d(2025, 8, 1), d(2025, 8, 3)).unwrap();
        let result = checker(&cabins, &reservations)
            .check(unit.id, range)
            .await
            .unwrap();
        assert!(!result.available);
        assert!(result.reason.is_some());
    }

    #[tokio::test]
    async fn test_pending_payment_blocks_like_confirmed() {
        let cabins = Arc::new(InMemoryCabinStore::new());
        let reservations = Arc::new(InMemoryReservationStore::new());
        let unit = cabin(CabinStatus::Available);
        cabins.insert(unit.clone());

        reservations.seed(reservation(
            unit.id,
            d(2025, 8, 2),
            d(2025, 8, 4),
            ReservationStatus::PendingPayment,
        ));

        let range = DateRange::new(d(2025, 8, 3), d(2025, 8, 5)).unwrap();
        let result = checker(&cabins, &reservations)
            .check(unit.id, range)
            .await
            .unwrap();
        assert!(!result.available);
    }

    #[tokio::test]
    async fn test_cancelled_reservation_does_not_block() {
        let cabins = Arc::new(InMemoryCabinStore::new());
        let reservations = Arc::new(InMemoryReservationStore::new());
        let unit = cabin(CabinStatus::Available);
        cabins.insert(unit.clone());

        reservations.seed(reservation(
            unit.id,
            d(2025, 8, 1),
            d(2025, 8, 5),
            ReservationStatus::Cancelled,
        ));

        let range = DateRange::new(d(2025, 8, 2), d(2025, 8, 4)).unwrap();
        let result = checker(&cabins, &reservations)
            .check(unit.id, range)
            .await
            .unwrap();
        assert!(result.available);
    }

    #[tokio::test]
    async fn test_back_to_back_stays_do_not_conflict() {
        let cabins = Arc::new(InMemoryCabinStore::new());
        let reservations = Arc::new(InMemoryReservationStore::new());
        let unit = cabin(CabinStatus::Available);
        cabins.insert(unit.clone());

        reservations.seed(reservation(
            unit.id,
            d(2025, 8, 1),
            d(2025, 8, 3),
            ReservationStatus::Confirmed,
        ));

        // Checking in on the previous guest's checkout day.
        let range = DateRange::new(d(2025, 8, 3), d(2025, 8, 6)).unwrap();
        let result = checker(&cabins, &reservations)
            .check(unit.id, range)
            .await
            .unwrap();
        assert!(result.available);
    }

    #[tokio::test]
    async fn test_maintenance_and_occupied_block_regardless_of_calendar() {
        for status in [CabinStatus::Maintenance, CabinStatus::Occupied] {
            let cabins = Arc::new(InMemoryCabinStore::new());
            let reservations = Arc::new(InMemoryReservationStore::new());
            let unit = cabin(status);
            cabins.insert(unit.clone());

            let range = DateRange::new(d(2025, 8, 1), d(2025, 8, 3)).unwrap();
            let result = checker(&cabins, &reservations)
                .check(unit.id, range)
                .await
                .unwrap();
            assert!(!result.available, "status {:?} should block", status);
        }
    }

    #[tokio::test]
    async fn test_unknown_cabin_is_not_found() {
        let cabins = Arc::new(InMemoryCabinStore::new());
        let reservations = Arc::new(InMemoryReservationStore::new());

        let range = DateRange::new(d(2025, 8, 1), d(2025, 8, 3)).unwrap();
        let err = checker(&cabins, &reservations)
            .check(Uuid::new_v4(), range)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }
}
