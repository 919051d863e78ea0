use cabana_catalog::Cabin;
use cabana_core::payment::CheckoutSession;
use cabana_core::{Reservation, ReservationRequest};
use cabana_shared::{compute_stay, StayQuote};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::availability::AvailabilityChecker;
use crate::error::BookingError;
use crate::lifecycle::{validate_request, ReservationManager};
use crate::payment::PaymentHandoff;

/// What the form needs to know about the signed-in guest. Comes from the
/// auth subsystem (external); the form only checks it is present and has a
/// billing profile.
#[derive(Debug, Clone)]
pub struct CustomerSession {
    pub customer_id: Uuid,
    pub has_billing_profile: bool,
}

/// Client-side orchestration of the booking flow: field state, local shape
/// validation, the optimistic price estimate, and the availability → create →
/// payment sequence. Holds no authoritative data — everything it sends is
/// re-validated server-side.
///
/// This is also the single point that turns typed engine errors into the
/// user-visible message (`error()`); callers render it verbatim.
#[derive(Debug, Default)]
pub struct ReservationForm {
    check_in: Option<NaiveDate>,
    check_out: Option<NaiveDate>,
    guests: u32,
    notes: String,
    error: Option<String>,
}

impl ReservationForm {
    pub fn new() -> Self {
        Self {
            guests: 1,
            ..Self::default()
        }
    }

    pub fn set_check_in(&mut self, date: Option<NaiveDate>) {
        self.check_in = date;
        self.error = None;
    }

    pub fn set_check_out(&mut self, date: Option<NaiveDate>) {
        self.check_out = date;
        self.error = None;
    }

    pub fn set_guests(&mut self, guests: u32) {
        self.guests = guests;
        self.error = None;
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
        self.error = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Optimistic estimate shown while the guest picks dates. Same pure
    /// function the server prices with, so the preview cannot disagree with
    /// the final charge.
    pub fn quote(&self, cabin: &Cabin) -> Option<StayQuote> {
        let check_in = self.check_in?;
        let check_out = self.check_out?;
        compute_stay(check_in, check_out, cabin.nightly_rate_centavos)
    }

    /// Local reset. Pure state change, no network effect.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Shape-check the form and build the request the engine will see.
    /// Nothing leaves the client when this fails.
    fn validate(
        &self,
        cabin: &Cabin,
        session: Option<&CustomerSession>,
    ) -> Result<ReservationRequest, BookingError> {
        let session = session.ok_or_else(|| {
            BookingError::Validation("sign in to make a reservation".to_string())
        })?;
        if !session.has_billing_profile {
            return Err(BookingError::Validation(
                "a billing profile is required before booking".to_string(),
            ));
        }

        let (check_in, check_out) = match (self.check_in, self.check_out) {
            (Some(check_in), Some(check_out)) => (check_in, check_out),
            _ => {
                return Err(BookingError::Validation(
                    "check-in and check-out dates are required".to_string(),
                ))
            }
        };

        let request = ReservationRequest {
            cabin_id: cabin.id,
            customer_id: session.customer_id,
            check_in,
            check_out,
            guests: self.guests,
            notes: self.notes.clone(),
            quoted_total_centavos: self.quote(cabin).map(|q| q.total_centavos),
        };

        validate_request(cabin, &request)?;
        Ok(request)
    }

    /// Drive the full flow: validate → availability round-trip → create →
    /// payment handoff. On success the form resets and the caller redirects
    /// the guest to the returned session's URL; on failure the form stays
    /// open with the error message set.
    pub async fn submit(
        &mut self,
        cabin: &Cabin,
        session: Option<&CustomerSession>,
        checker: &AvailabilityChecker,
        manager: &ReservationManager,
        payments: &PaymentHandoff,
        origin: &str,
    ) -> Result<(Reservation, CheckoutSession), BookingError> {
        let outcome = self
            .run_submit(cabin, session, checker, manager, payments, origin)
            .await;

        match &outcome {
            Ok(_) => self.reset(),
            Err(e) => self.error = Some(e.to_string()),
        }

        outcome
    }

    async fn run_submit(
        &self,
        cabin: &Cabin,
        session: Option<&CustomerSession>,
        checker: &AvailabilityChecker,
        manager: &ReservationManager,
        payments: &PaymentHandoff,
        origin: &str,
    ) -> Result<(Reservation, CheckoutSession), BookingError> {
        let request = self.validate(cabin, session)?;
        let range = request.range().ok_or_else(|| {
            BookingError::Validation("check-out must be after check-in".to_string())
        })?;

        let availability = checker.check(cabin.id, range).await?;
        if !availability.available {
            return Err(BookingError::Conflict(availability.reason.unwrap_or_else(
                || "the cabin is not available for these dates".to_string(),
            )));
        }

        let reservation = manager.create(&request).await?;

        let success_url = format!("{}/app/reserva/{}", origin, reservation.id);
        let cancel_url = format!("{}/cabanas/{}", origin, cabin.slug);
        let checkout = payments
            .initiate(reservation.id, success_url, cancel_url)
            .await?;

        Ok((reservation, checkout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabana_catalog::CabinStatus;
    use cabana_core::ReservationStatus;
    use cabana_store::memory::{InMemoryCabinStore, InMemoryReservationStore};
    use crate::payment::MockCheckoutProvider;
    use std::sync::Arc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn cabin() -> Cabin {
        Cabin {
            id: Uuid::new_v4(),
            slug: "pino-alto".to_string(),
            name: "Pino Alto".to_string(),
            team_id: Uuid::new_v4(),
            nightly_rate_centavos: 100_000,
            capacity: 4,
            min_stay_nights: 1,
            status: CabinStatus::Available,
        }
    }

    struct Harness {
        reservations: Arc<InMemoryReservationStore>,
        checker: AvailabilityChecker,
        manager: ReservationManager,
        payments: PaymentHandoff,
    }

    fn harness(unit: &Cabin) -> Harness {
        let cabins = Arc::new(InMemoryCabinStore::new());
        cabins.insert(unit.clone());
        let reservations = Arc::new(InMemoryReservationStore::new());
        let checker = AvailabilityChecker::new(cabins.clone(), reservations.clone());
        let manager = ReservationManager::new(cabins, reservations.clone());
        let payments = PaymentHandoff::new(
            Arc::new(MockCheckoutProvider::new()),
            reservations.clone(),
            "mxn",
        );
        Harness {
            reservations,
            checker,
            manager,
            payments,
        }
    }

    fn signed_in() -> CustomerSession {
        CustomerSession {
            customer_id: Uuid::new_v4(),
            has_billing_profile: true,
        }
    }

    #[test]
    fn test_quote_tracks_dates() {
        let unit = cabin();
        let mut form = ReservationForm::new();
        assert!(form.quote(&unit).is_none());

        form.set_check_in(Some(d(2025, 8, 1)));
        form.set_check_out(Some(d(2025, 8, 3)));
        let quote = form.quote(&unit).unwrap();
        assert_eq!(quote.nights, 2);
        assert_eq!(quote.total_centavos, 200_000);

        // Same-day checkout: no quote to offer.
        form.set_check_out(Some(d(2025, 8, 1)));
        assert!(form.quote(&unit).is_none());
    }

    #[tokio::test]
    async fn test_excess_guests_fail_before_any_server_call() {
        let unit = cabin();
        let h = harness(&unit);

        let mut form = ReservationForm::new();
        form.set_check_in(Some(d(2025, 8, 1)));
        form.set_check_out(Some(d(2025, 8, 3)));
        form.set_guests(5);

        let err = form
            .submit(
                &unit,
                Some(&signed_in()),
                &h.checker,
                &h.manager,
                &h.payments,
                "https://cabanas.test",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, BookingError::Validation(_)));
        assert_eq!(form.error(), Some(err.to_string().as_str()));
        // Nothing was written anywhere.
        assert_eq!(h.reservations.len(), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_customer_is_rejected_locally() {
        let unit = cabin();
        let h = harness(&unit);

        let mut form = ReservationForm::new();
        form.set_check_in(Some(d(2025, 8, 1)));
        form.set_check_out(Some(d(2025, 8, 3)));

        let err = form
            .submit(
                &unit,
                None,
                &h.checker,
                &h.manager,
                &h.payments,
                "https://cabanas.test",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
        assert_eq!(h.reservations.len(), 0);
    }

    #[tokio::test]
    async fn test_successful_submit_resets_form() {
        let unit = cabin();
        let h = harness(&unit);

        let mut form = ReservationForm::new();
        form.set_check_in(Some(d(2025, 8, 1)));
        form.set_check_out(Some(d(2025, 8, 3)));
        form.set_guests(2);
        form.set_notes("llegamos tarde");

        let (reservation, checkout) = form
            .submit(
                &unit,
                Some(&signed_in()),
                &h.checker,
                &h.manager,
                &h.payments,
                "https://cabanas.test",
            )
            .await
            .unwrap();

        assert_eq!(reservation.status, ReservationStatus::PendingPayment);
        assert_eq!(reservation.total_centavos, 200_000);
        let url = checkout.url.unwrap();
        assert!(url.starts_with("https://checkout.mock/pay/"));

        // Form went back to its initial state.
        assert!(form.error().is_none());
        assert!(form.quote(&unit).is_none());
    }

    #[tokio::test]
    async fn test_conflict_keeps_form_open_with_message() {
        let unit = cabin();
        let h = harness(&unit);

        let mut form = ReservationForm::new();
        form.set_check_in(Some(d(2025, 8, 1)));
        form.set_check_out(Some(d(2025, 8, 3)));
        form.set_guests(2);
        form.submit(
            &unit,
            Some(&signed_in()),
            &h.checker,
            &h.manager,
            &h.payments,
            "https://cabanas.test",
        )
        .await
        .unwrap();

        // Second guest asks for an overlapping stay.
        let mut other = ReservationForm::new();
        other.set_check_in(Some(d(2025, 8, 2)));
        other.set_check_out(Some(d(2025, 8, 4)));

        let err = other
            .submit(
                &unit,
                Some(&signed_in()),
                &h.checker,
                &h.manager,
                &h.payments,
                "https://cabanas.test",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict(_)));

        // The form keeps its dates so the guest can adjust them.
        assert_eq!(other.error(), Some(err.to_string().as_str()));
        assert_eq!(other.quote(&unit).map(|q| q.nights), Some(2));
    }
}
