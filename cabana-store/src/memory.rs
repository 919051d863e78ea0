use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cabana_catalog::Cabin;
use cabana_core::{
    CabinRepository, Reservation, ReservationRepository, ReservationStatus, StoreError,
};
use cabana_shared::DateRange;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// In-memory cabin registry, for tests and local runs.
pub struct InMemoryCabinStore {
    cabins: Mutex<HashMap<Uuid, Cabin>>,
}

impl InMemoryCabinStore {
    pub fn new() -> Self {
        Self {
            cabins: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert(&self, cabin: Cabin) {
        self.cabins
            .lock()
            .expect("cabin store lock")
            .insert(cabin.id, cabin);
    }
}

impl Default for InMemoryCabinStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CabinRepository for InMemoryCabinStore {
    async fn get_cabin(&self, id: Uuid) -> Result<Option<Cabin>, StoreError> {
        Ok(self.cabins.lock().expect("cabin store lock").get(&id).cloned())
    }
}

/// In-memory reservation store. The single mutex makes the overlap re-check
/// and the insert one critical section, which is exactly the serializability
/// the Postgres store gets from its exclusion constraint.
pub struct InMemoryReservationStore {
    reservations: Mutex<HashMap<Uuid, Reservation>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self {
            reservations: Mutex::new(HashMap::new()),
        }
    }

    /// Direct insert with no overlap check. Test seeding only.
    pub fn seed(&self, reservation: Reservation) {
        self.reservations
            .lock()
            .expect("reservation store lock")
            .insert(reservation.id, reservation);
    }

    pub fn get(&self, id: Uuid) -> Option<Reservation> {
        self.reservations
            .lock()
            .expect("reservation store lock")
            .get(&id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.reservations
            .lock()
            .expect("reservation store lock")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryReservationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReservationRepository for InMemoryReservationStore {
    async fn insert_pending(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let mut reservations = self.reservations.lock().expect("reservation store lock");

        let range = reservation.range();
        let conflict = reservations.values().any(|existing| {
            existing.cabin_id == reservation.cabin_id
                && existing.status.blocks_calendar()
                && existing.range().overlaps(&range)
        });
        if conflict {
            return Err(StoreError::Conflict);
        }

        reservations.insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        Ok(self.get(id))
    }

    async fn find_blocking_overlaps(
        &self,
        cabin_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.lock().expect("reservation store lock");
        Ok(reservations
            .values()
            .filter(|r| {
                r.cabin_id == cabin_id && r.status.blocks_calendar() && r.range().overlaps(&range)
            })
            .cloned()
            .collect())
    }

    async fn transition_status(
        &self,
        id: Uuid,
        allowed_from: &[ReservationStatus],
        to: ReservationStatus,
    ) -> Result<bool, StoreError> {
        let mut reservations = self.reservations.lock().expect("reservation store lock");
        match reservations.get_mut(&id) {
            Some(reservation) if allowed_from.contains(&reservation.status) => {
                reservation.status = to;
                reservation.updated_at = Utc::now();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound(format!("reservation {}", id))),
        }
    }

    async fn list_pending_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.lock().expect("reservation store lock");
        Ok(reservations
            .values()
            .filter(|r| r.status == ReservationStatus::PendingPayment && r.created_at < cutoff)
            .cloned()
            .collect())
    }
}
