use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Provider-reported payment state of a checkout session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSessionStatus {
    Unpaid,
    Paid,
    NoPaymentRequired,
}

/// A processor-side checkout session scoped to one reservation's total.
/// Consumed exactly once by redirecting the guest to `url`; its outcome comes
/// back out of band through the webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's ID (e.g., cs_123)
    pub id: String,
    pub reservation_id: Uuid,
    pub amount_centavos: i64,
    pub currency: String,
    /// Redirect target. Present on freshly created sessions.
    pub url: Option<String>,
    pub payment_status: PaymentSessionStatus,
    pub created_at: DateTime<Utc>,
}

/// Inputs for creating a checkout session.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub reservation_id: Uuid,
    pub amount_centavos: i64,
    pub currency: String,
    pub description: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    /// Create a checkout session with the provider
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CheckoutSession, Box<dyn std::error::Error + Send + Sync>>;

    /// Retrieve session state from the provider. This is the authoritative
    /// answer to "was this session paid"; callback parameters are not.
    async fn get_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, Box<dyn std::error::Error + Send + Sync>>;
}
