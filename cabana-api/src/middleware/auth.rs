use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Claims issued by the auth subsystem (external to this service; we only
/// validate).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    /// Customer id as a UUID string.
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

/// Validates the bearer token and injects the claims into request extensions.
/// Reservation routes sit behind this; the payment webhook does not.
pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract token from Authorization header
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Decode and validate JWT
    let token_data = decode::<CustomerClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| StatusCode::UNAUTHORIZED)?;

    // 3. Check role
    if token_data.claims.role != "CUSTOMER" && token_data.claims.role != "ADMIN" {
        return Err(StatusCode::FORBIDDEN);
    }

    // 4. Inject claims into request extensions
    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}

/// A customer may only touch their own reservations; admins see everything.
pub fn authorize_customer(claims: &CustomerClaims, owner: Uuid) -> Result<(), AppError> {
    if claims.role == "ADMIN" {
        return Ok(());
    }

    let subject = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::AuthenticationError("invalid subject claim".to_string()))?;

    if subject == owner {
        Ok(())
    } else {
        Err(AppError::AuthorizationError(
            "reservation does not belong to you".to_string(),
        ))
    }
}
