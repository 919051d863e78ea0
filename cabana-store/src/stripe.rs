use async_trait::async_trait;
use cabana_core::payment::{
    CheckoutProvider, CheckoutSession, CreateSessionRequest, PaymentSessionStatus,
};
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::app_config::StripeConfig;

type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Stripe Checkout Sessions client. Creates one hosted payment page per
/// reservation and reads the session back for provider-side verification;
/// the reservation id rides along in session metadata.
pub struct StripeCheckout {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl StripeCheckout {
    pub fn new(cfg: &StripeConfig) -> Result<Self, ProviderError> {
        let timeout = Duration::from_millis(if cfg.timeout_ms > 0 {
            cfg.timeout_ms
        } else {
            15_000
        });
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            secret_key: cfg.secret_key.clone(),
        })
    }

    fn session_from_json(payload: &Value) -> Result<CheckoutSession, ProviderError> {
        let id = payload["id"]
            .as_str()
            .ok_or("checkout session response is missing 'id'")?
            .to_string();

        let reservation_id = payload["metadata"]["reserva_id"]
            .as_str()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or("checkout session metadata is missing 'reserva_id'")?;

        let payment_status = match payload["payment_status"].as_str() {
            Some("paid") => PaymentSessionStatus::Paid,
            Some("no_payment_required") => PaymentSessionStatus::NoPaymentRequired,
            _ => PaymentSessionStatus::Unpaid,
        };

        Ok(CheckoutSession {
            id,
            reservation_id,
            amount_centavos: payload["amount_total"].as_i64().unwrap_or(0),
            currency: payload["currency"].as_str().unwrap_or("").to_string(),
            url: payload["url"].as_str().map(str::to_string),
            payment_status,
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl CheckoutProvider for StripeCheckout {
    async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<CheckoutSession, ProviderError> {
        let amount = request.amount_centavos.to_string();
        let reservation_id = request.reservation_id.to_string();
        let params: Vec<(&str, &str)> = vec![
            ("mode", "payment"),
            ("success_url", &request.success_url),
            ("cancel_url", &request.cancel_url),
            ("line_items[0][quantity]", "1"),
            ("line_items[0][price_data][currency]", &request.currency),
            ("line_items[0][price_data][unit_amount]", &amount),
            (
                "line_items[0][price_data][product_data][name]",
                &request.description,
            ),
            ("metadata[reserva_id]", &reservation_id),
        ];

        let response = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .basic_auth(&self.secret_key, None::<&str>)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;
        if !status.is_success() {
            let detail = payload["error"]["message"].as_str().unwrap_or("unknown");
            return Err(format!("stripe session creation failed ({}): {}", status, detail).into());
        }

        Self::session_from_json(&payload)
    }

    async fn get_session(&self, session_id: &str) -> Result<CheckoutSession, ProviderError> {
        let response = self
            .http
            .get(format!(
                "{}/v1/checkout/sessions/{}",
                self.api_base, session_id
            ))
            .basic_auth(&self.secret_key, None::<&str>)
            .send()
            .await?;

        let status = response.status();
        let payload: Value = response.json().await?;
        if !status.is_success() {
            let detail = payload["error"]["message"].as_str().unwrap_or("unknown");
            return Err(format!("stripe session lookup failed ({}): {}", status, detail).into());
        }

        Self::session_from_json(&payload)
    }
}
