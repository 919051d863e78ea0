use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use cabana_core::{Reservation, ReservationRequest, ReservationStatus};
use cabana_shared::DateRange;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::{authorize_customer, CustomerClaims};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/reservas/reservas/",
            post(create_reservation),
        )
        .route(
            "/reservas/reservas/check-availability/",
            get(check_availability),
        )
        .route("/reservas/reservas/{id}/", get(get_reservation))
        .route("/reservas/reservas/{id}/pagar/", post(initiate_payment))
        .route("/reservas/{id}/", patch(update_reservation))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    cabana_id: Uuid,
    fecha_inicio: NaiveDate,
    fecha_fin: NaiveDate,
}

#[derive(Debug, Serialize)]
struct AvailabilityResponse {
    available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateReservaBody {
    cabanas: Vec<Uuid>,
    cliente: Uuid,
    fecha_inicio: NaiveDate,
    fecha_fin: NaiveDate,
    huespedes: u32,
    #[serde(default)]
    comentarios: String,
    /// Client-side estimate in centavos. The server reprices; this is only
    /// compared for logging.
    precio_final: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PagarBody {
    success_url: String,
    cancel_url: String,
}

#[derive(Debug, Serialize)]
struct PagarResponse {
    checkout_url: String,
}

#[derive(Debug, Deserialize)]
struct UpdateReservaBody {
    estado: ReservationStatus,
}

#[derive(Debug, Serialize)]
pub struct ReservaResponse {
    pub id: Uuid,
    pub cabana_id: Uuid,
    pub cliente: Uuid,
    pub fecha_inicio: NaiveDate,
    pub fecha_fin: NaiveDate,
    pub huespedes: u32,
    pub comentarios: String,
    pub precio_final: i64,
    pub estado: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reservation> for ReservaResponse {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            cabana_id: r.cabin_id,
            cliente: r.customer_id,
            fecha_inicio: r.check_in,
            fecha_fin: r.check_out,
            huespedes: r.guests,
            comentarios: r.notes.into_inner(),
            precio_final: r.total_centavos,
            estado: r.status,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /reservas/reservas/check-availability/
///
/// Fails closed: when the store cannot be reached the answer is
/// `available: false` with a generic message, never an optimistic yes.
async fn check_availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let range = DateRange::new(query.fecha_inicio, query.fecha_fin).ok_or_else(|| {
        AppError::ValidationError("fecha_fin must be after fecha_inicio".to_string())
    })?;

    match state.checker.check(query.cabana_id, range).await {
        Ok(availability) => Ok(Json(AvailabilityResponse {
            available: availability.available,
            message: availability.reason,
        })),
        Err(cabana_booking::BookingError::NotFound(msg)) => Err(AppError::NotFoundError(msg)),
        Err(e) => {
            tracing::error!("availability check failed: {}", e);
            Ok(Json(AvailabilityResponse {
                available: false,
                message: Some("availability could not be verified, try again".to_string()),
            }))
        }
    }
}

/// POST /reservas/reservas/
async fn create_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(body): Json<CreateReservaBody>,
) -> Result<(StatusCode, Json<ReservaResponse>), AppError> {
    let &[cabin_id] = body.cabanas.as_slice() else {
        return Err(AppError::ValidationError(
            "a reservation covers exactly one cabin".to_string(),
        ));
    };

    // Customers book for themselves.
    authorize_customer(&claims, body.cliente)?;

    let request = ReservationRequest {
        cabin_id,
        customer_id: body.cliente,
        check_in: body.fecha_inicio,
        check_out: body.fecha_fin,
        guests: body.huespedes,
        notes: body.comentarios,
        quoted_total_centavos: body.precio_final,
    };

    let reservation = state.manager.create(&request).await?;
    info!(reservation_id = %reservation.id, "reservation accepted");

    Ok((StatusCode::CREATED, Json(reservation.into())))
}

/// GET /reservas/reservas/{id}/
async fn get_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReservaResponse>, AppError> {
    let reservation = state
        .reservations
        .get_reservation(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("reservation {}", id)))?;

    authorize_customer(&claims, reservation.customer_id)?;

    Ok(Json(reservation.into()))
}

/// POST /reservas/reservas/{id}/pagar/
async fn initiate_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
    Json(body): Json<PagarBody>,
) -> Result<Json<PagarResponse>, AppError> {
    let reservation = state
        .reservations
        .get_reservation(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("reservation {}", id)))?;

    authorize_customer(&claims, reservation.customer_id)?;

    let session = state
        .payments
        .initiate(id, body.success_url, body.cancel_url)
        .await?;

    let checkout_url = session.url.ok_or_else(|| {
        AppError::InternalServerError("provider returned a session without a URL".to_string())
    })?;

    Ok(Json(PagarResponse { checkout_url }))
}

/// PATCH /reservas/{id}/
///
/// The only status write accepted from the wire is a cancellation; every
/// other transition belongs to the lifecycle manager.
async fn update_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateReservaBody>,
) -> Result<Json<ReservaResponse>, AppError> {
    if body.estado != ReservationStatus::Cancelled {
        return Err(AppError::ValidationError(
            "only 'cancelada' can be requested".to_string(),
        ));
    }

    let reservation = state
        .reservations
        .get_reservation(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("reservation {}", id)))?;

    authorize_customer(&claims, reservation.customer_id)?;

    let cancelled = state.manager.cancel(id).await?;
    Ok(Json(cancelled.into()))
}
