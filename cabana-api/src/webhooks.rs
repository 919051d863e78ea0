use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use cabana_booking::BookingError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/reservas/webhooks/stripe/", post(handle_stripe_webhook))
}

#[derive(Debug, Deserialize)]
pub struct StripeWebhook {
    pub id: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: CheckoutSessionObject,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
}

/// POST /reservas/webhooks/stripe/
///
/// The payload is untrusted: the only thing taken from it is the session id,
/// which is re-fetched from the provider. A reservation is confirmed solely
/// on the provider reporting the session paid.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    Json(payload): Json<StripeWebhook>,
) -> Result<StatusCode, StatusCode> {
    tracing::info!(
        "Received webhook: {} for session {}",
        payload.type_,
        payload.data.object.id
    );

    if payload.type_ != "checkout.session.completed" {
        return Ok(StatusCode::OK);
    }

    let session_id = &payload.data.object.id;

    // 1. Re-verify with the provider; the callback alone proves nothing.
    let verified = state
        .payments
        .verify_paid(session_id)
        .await
        .map_err(|e| {
            tracing::error!("payment verification failed for {}: {}", session_id, e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let Some(reservation_id) = verified else {
        tracing::info!("session {} is not paid, nothing to confirm", session_id);
        return Ok(StatusCode::OK);
    };

    // 2. Confirm. Idempotent for repeat deliveries of the same event.
    match state.manager.confirm(reservation_id).await {
        Ok(_) => {
            tracing::info!("Reservation {} confirmed via webhook", reservation_id);
            Ok(StatusCode::OK)
        }
        Err(BookingError::NotFound(msg)) => {
            tracing::warn!("webhook for unknown reservation: {}", msg);
            Ok(StatusCode::OK)
        }
        Err(BookingError::InvalidState(msg)) => {
            // Paid after cancellation; needs a human, not a retry.
            tracing::warn!("webhook hit an illegal transition: {}", msg);
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::error!("webhook confirmation failed: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
