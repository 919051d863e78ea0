use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cabana_core::payment::{
    CheckoutProvider, CheckoutSession, CreateSessionRequest, PaymentSessionStatus,
};
use cabana_core::{ReservationRepository, ReservationStatus};
use tracing::{error, info};
use uuid::Uuid;

use crate::error::BookingError;

/// Hands a pending reservation off to the external payment processor and,
/// on the way back, answers whether a session was really paid.
///
/// The caller performs the actual redirect; this component only builds the
/// session. Initiation failures leave the reservation in `pendiente` so the
/// guest can retry with a fresh session.
pub struct PaymentHandoff {
    provider: Arc<dyn CheckoutProvider>,
    reservations: Arc<dyn ReservationRepository>,
    currency: String,
}

impl PaymentHandoff {
    pub fn new(
        provider: Arc<dyn CheckoutProvider>,
        reservations: Arc<dyn ReservationRepository>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            reservations,
            currency: currency.into(),
        }
    }

    pub async fn initiate(
        &self,
        reservation_id: Uuid,
        success_url: String,
        cancel_url: String,
    ) -> Result<CheckoutSession, BookingError> {
        let reservation = self
            .reservations
            .get_reservation(reservation_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("reservation {}", reservation_id)))?;

        if reservation.status != ReservationStatus::PendingPayment {
            return Err(BookingError::InvalidState(format!(
                "reservation {} is {}, payment can only start while pendiente",
                reservation_id, reservation.status
            )));
        }

        let request = CreateSessionRequest {
            reservation_id,
            amount_centavos: reservation.total_centavos,
            currency: self.currency.clone(),
            description: format!("Reserva #{}", reservation_id),
            success_url,
            cancel_url,
        };

        match self.provider.create_session(&request).await {
            Ok(session) => {
                info!(
                    reservation_id = %reservation_id,
                    session_id = %session.id,
                    "checkout session created"
                );
                Ok(session)
            }
            Err(e) => {
                error!(reservation_id = %reservation_id, "checkout session creation failed: {}", e);
                Err(BookingError::PaymentInit(e.to_string()))
            }
        }
    }

    /// Re-fetch `session_id` from the provider and return the reservation it
    /// belongs to only if the provider reports it paid. Callback parameters
    /// never reach `confirm` without passing through here.
    pub async fn verify_paid(&self, session_id: &str) -> Result<Option<Uuid>, BookingError> {
        let session = self
            .provider
            .get_session(session_id)
            .await
            .map_err(|e| BookingError::PaymentInit(e.to_string()))?;

        if session.payment_status == PaymentSessionStatus::Paid {
            Ok(Some(session.reservation_id))
        } else {
            info!(
                session_id = %session_id,
                status = ?session.payment_status,
                "checkout session not paid; ignoring callback"
            );
            Ok(None)
        }
    }
}

/// In-process provider for tests and local runs. Sessions start unpaid and
/// flip to paid through `mark_paid`, standing in for the guest completing the
/// processor's hosted page.
pub struct MockCheckoutProvider {
    sessions: Mutex<HashMap<String, CheckoutSession>>,
    fail_create: bool,
}

impl MockCheckoutProvider {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            fail_create: false,
        }
    }

    /// A provider whose session creation always fails, for exercising the
    /// retry path.
    pub fn failing() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            fail_create: true,
        }
    }

    /// Test hook: simulate the processor completing payment for a session.
    pub fn mark_paid(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.lock().expect("mock session lock");
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.payment_status = PaymentSessionStatus::Paid;
                true
            }
            None => false,
        }
    }
}

impl Default for MockCheckoutProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CheckoutProvider for MockCheckoutProvider {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CheckoutSession, Box<dyn std::error::Error + Send + Sync>> {
        if self.fail_create {
            return Err("simulated checkout provider outage".into());
        }

        let session_id = format!("cs_test_{}", Uuid::new_v4().simple());
        let session = CheckoutSession {
            id: session_id.clone(),
            reservation_id: request.reservation_id,
            amount_centavos: request.amount_centavos,
            currency: request.currency.clone(),
            url: Some(format!("https://checkout.mock/pay/{}", session_id)),
            payment_status: PaymentSessionStatus::Unpaid,
            created_at: chrono::Utc::now(),
        };

        self.sessions
            .lock()
            .expect("mock session lock")
            .insert(session.id.clone(), session.clone());

        Ok(session)
    }

    async fn get_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, Box<dyn std::error::Error + Send + Sync>> {
        self.sessions
            .lock()
            .expect("mock session lock")
            .get(session_id)
            .cloned()
            .ok_or_else(|| format!("unknown checkout session {}", session_id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cabana_core::Reservation;
    use cabana_shared::pii::Masked;
    use cabana_store::memory::InMemoryReservationStore;
    use chrono::{NaiveDate, Utc};

    fn pending_reservation() -> Reservation {
        let now = Utc::now();
        Reservation {
            id: Uuid::new_v4(),
            cabin_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            check_in: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2025, 8, 3).unwrap(),
            guests: 2,
            notes: Masked(String::new()),
            total_centavos: 200_000,
            status: ReservationStatus::PendingPayment,
            created_at: now,
            updated_at: now,
        }
    }

    fn urls() -> (String, String) {
        (
            "https://example.test/app/reserva/1".to_string(),
            "https://example.test/cabanas/la-ribera".to_string(),
        )
    }

    #[tokio::test]
    async fn test_initiate_returns_checkout_url() {
        let store = Arc::new(InMemoryReservationStore::new());
        let reservation = pending_reservation();
        store.seed(reservation.clone());

        let provider = Arc::new(MockCheckoutProvider::new());
        let handoff = PaymentHandoff::new(provider, store, "mxn");

        let (success, cancel) = urls();
        let session = handoff
            .initiate(reservation.id, success, cancel)
            .await
            .unwrap();
        assert!(session.url.is_some());
        assert_eq!(session.amount_centavos, 200_000);
        assert_eq!(session.reservation_id, reservation.id);
    }

    #[tokio::test]
    async fn test_initiate_requires_pending_status() {
        let store = Arc::new(InMemoryReservationStore::new());
        let mut reservation = pending_reservation();
        reservation.status = ReservationStatus::Confirmed;
        store.seed(reservation.clone());

        let provider = Arc::new(MockCheckoutProvider::new());
        let handoff = PaymentHandoff::new(provider, store, "mxn");

        let (success, cancel) = urls();
        let err = handoff
            .initiate(reservation.id, success, cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_provider_outage_is_payment_init_error_and_retryable() {
        let store = Arc::new(InMemoryReservationStore::new());
        let reservation = pending_reservation();
        store.seed(reservation.clone());

        let failing = Arc::new(MockCheckoutProvider::failing());
        let handoff = PaymentHandoff::new(failing, store.clone(), "mxn");

        let (success, cancel) = urls();
        let err = handoff
            .initiate(reservation.id, success.clone(), cancel.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::PaymentInit(_)));

        // Reservation is still pendiente; a retry against a healthy provider
        // creates a fresh session.
        assert_eq!(
            store.get(reservation.id).unwrap().status,
            ReservationStatus::PendingPayment
        );
        let healthy = PaymentHandoff::new(Arc::new(MockCheckoutProvider::new()), store, "mxn");
        healthy
            .initiate(reservation.id, success, cancel)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_verify_paid_only_after_provider_says_paid() {
        let store = Arc::new(InMemoryReservationStore::new());
        let reservation = pending_reservation();
        store.seed(reservation.clone());

        let provider = Arc::new(MockCheckoutProvider::new());
        let handoff = PaymentHandoff::new(provider.clone(), store, "mxn");

        let (success, cancel) = urls();
        let session = handoff
            .initiate(reservation.id, success, cancel)
            .await
            .unwrap();

        // Unpaid session: a forged "success" callback gets nothing.
        assert_eq!(handoff.verify_paid(&session.id).await.unwrap(), None);

        provider.mark_paid(&session.id);
        assert_eq!(
            handoff.verify_paid(&session.id).await.unwrap(),
            Some(reservation.id)
        );
    }
}
