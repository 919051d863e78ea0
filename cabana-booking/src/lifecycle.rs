use std::sync::Arc;

use cabana_catalog::Cabin;
use cabana_core::{
    CabinRepository, Reservation, ReservationRepository, ReservationRequest, ReservationStatus,
    StoreError,
};
use cabana_shared::pii::Masked;
use cabana_shared::{compute_stay, DateRange};
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::AvailabilityChecker;
use crate::error::BookingError;

/// Request-shape validation shared by the form controller (client side) and
/// the lifecycle manager (server side, authoritative). Returns the validated
/// stay interval.
pub fn validate_request(
    cabin: &Cabin,
    request: &ReservationRequest,
) -> Result<DateRange, BookingError> {
    let range = request.range().ok_or_else(|| {
        BookingError::Validation("check-out must be after check-in".to_string())
    })?;

    if request.guests < 1 {
        return Err(BookingError::Validation(
            "at least one guest is required".to_string(),
        ));
    }
    if request.guests > cabin.capacity {
        return Err(BookingError::Validation(format!(
            "guest count exceeds the cabin capacity of {}",
            cabin.capacity
        )));
    }
    if range.nights() < cabin.min_stay_nights {
        return Err(BookingError::Validation(format!(
            "minimum stay for this cabin is {} nights",
            cabin.min_stay_nights
        )));
    }

    Ok(range)
}

/// Owns every `Reservation.status` write. No other component mutates a
/// reservation.
pub struct ReservationManager {
    cabins: Arc<dyn CabinRepository>,
    reservations: Arc<dyn ReservationRepository>,
    checker: AvailabilityChecker,
}

impl ReservationManager {
    pub fn new(
        cabins: Arc<dyn CabinRepository>,
        reservations: Arc<dyn ReservationRepository>,
    ) -> Self {
        let checker = AvailabilityChecker::new(cabins.clone(), reservations.clone());
        Self {
            cabins,
            reservations,
            checker,
        }
    }

    /// Validate, re-check availability server-side, price with the server's
    /// rate, and persist in `pendiente`.
    ///
    /// The availability re-check here is advisory (it produces the friendly
    /// error); the actual race between two concurrent creates is decided
    /// inside `insert_pending`, which re-checks overlap and writes under a
    /// single guard. Whichever call loses gets `Conflict` and no row.
    pub async fn create(&self, request: &ReservationRequest) -> Result<Reservation, BookingError> {
        let cabin = self
            .cabins
            .get_cabin(request.cabin_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("cabin {}", request.cabin_id)))?;

        let range = validate_request(&cabin, request)?;

        let availability = self.checker.check(cabin.id, range).await?;
        if !availability.available {
            return Err(BookingError::Conflict(availability.reason.unwrap_or_else(
                || "the cabin is not available for these dates".to_string(),
            )));
        }

        // Price with the server's nightly rate. The client estimate travels
        // along only so a mismatch can be spotted in the logs.
        let quote = compute_stay(request.check_in, request.check_out, cabin.nightly_rate_centavos)
            .ok_or_else(|| {
                BookingError::Validation("check-out must be after check-in".to_string())
            })?;

        if let Some(client_total) = request.quoted_total_centavos {
            if client_total != quote.total_centavos {
                warn!(
                    cabin_id = %cabin.id,
                    client_total,
                    server_total = quote.total_centavos,
                    "client-quoted total disagrees with server price; using server price"
                );
            }
        }

        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            cabin_id: cabin.id,
            customer_id: request.customer_id,
            check_in: request.check_in,
            check_out: request.check_out,
            guests: request.guests,
            notes: Masked(request.notes.clone()),
            total_centavos: quote.total_centavos,
            status: ReservationStatus::PendingPayment,
            created_at: now,
            updated_at: now,
        };

        match self.reservations.insert_pending(&reservation).await {
            Ok(()) => {
                info!(
                    reservation_id = %reservation.id,
                    cabin_id = %cabin.id,
                    nights = quote.nights,
                    total_centavos = quote.total_centavos,
                    "reservation created"
                );
                Ok(reservation)
            }
            Err(StoreError::Conflict) => Err(BookingError::Conflict(
                "the requested dates are already reserved".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// `pendiente -> confirmada`. Only the payment callback path reaches this,
    /// after provider-side verification. Confirming an already-confirmed
    /// reservation is a no-op.
    pub async fn confirm(&self, id: Uuid) -> Result<Reservation, BookingError> {
        let reservation = self.get(id).await?;

        match reservation.status {
            ReservationStatus::Confirmed => Ok(reservation),
            ReservationStatus::Cancelled => Err(BookingError::InvalidState(format!(
                "reservation {} is cancelled and cannot be confirmed",
                id
            ))),
            ReservationStatus::PendingPayment => {
                let updated = self
                    .reservations
                    .transition_status(
                        id,
                        &[ReservationStatus::PendingPayment],
                        ReservationStatus::Confirmed,
                    )
                    .await?;

                let current = self.get(id).await?;
                if updated || current.status == ReservationStatus::Confirmed {
                    info!(reservation_id = %id, "reservation confirmed");
                    Ok(current)
                } else {
                    // Lost a race against cancel/expiry.
                    Err(BookingError::InvalidState(format!(
                        "reservation {} is {} and cannot be confirmed",
                        id, current.status
                    )))
                }
            }
        }
    }

    /// `pendiente -> cancelada` (abandoned payment) or
    /// `confirmada -> cancelada` (explicit cancellation). Terminal.
    pub async fn cancel(&self, id: Uuid) -> Result<Reservation, BookingError> {
        let reservation = self.get(id).await?;

        if reservation.status == ReservationStatus::Cancelled {
            return Err(BookingError::InvalidState(format!(
                "reservation {} is already cancelled",
                id
            )));
        }

        let updated = self
            .reservations
            .transition_status(
                id,
                &[
                    ReservationStatus::PendingPayment,
                    ReservationStatus::Confirmed,
                ],
                ReservationStatus::Cancelled,
            )
            .await?;

        if !updated {
            let current = self.get(id).await?;
            return Err(BookingError::InvalidState(format!(
                "reservation {} is {} and cannot be cancelled",
                id, current.status
            )));
        }

        info!(reservation_id = %id, "reservation cancelled");
        self.get(id).await
    }

    /// Cancel `pendiente` reservations created before `cutoff` (abandoned
    /// checkouts). The guarded transition skips anything that got confirmed
    /// between the listing and the write. Returns how many were reclaimed.
    pub async fn reclaim_abandoned(&self, cutoff: DateTime<Utc>) -> Result<usize, BookingError> {
        let stale = self.reservations.list_pending_created_before(cutoff).await?;

        let mut reclaimed = 0;
        for reservation in stale {
            let updated = self
                .reservations
                .transition_status(
                    reservation.id,
                    &[ReservationStatus::PendingPayment],
                    ReservationStatus::Cancelled,
                )
                .await?;
            if updated {
                info!(reservation_id = %reservation.id, "abandoned reservation reclaimed");
                reclaimed += 1;
            }
        }

        Ok(reclaimed)
    }

    async fn get(&self, id: Uuid) -> Result<Reservation, BookingError> {
        self.reservations
            .get_reservation(id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("reservation {}", id)))
    }
}
