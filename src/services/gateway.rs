use crate::errors::ServiceError;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// A checkout session opened at the card-payment provider. The
/// customer finishes payment at `url`; the provider then redirects to
/// our success or cancel callback.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Everything needed to open a hosted payment page for one cart.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub product_name: String,
    pub unit_amount_cents: i64,
    pub quantity: i64,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// Thin client for the Stripe Checkout Sessions API. Only the
/// session-creation call is used; everything else (payment capture,
/// receipts) happens on the provider's side.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    secret_key: String,
}

impl StripeGateway {
    pub fn new(
        api_base: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InternalError(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            secret_key: secret_key.into(),
        })
    }

    /// Opens a checkout session. The request goes out as the
    /// form-encoded nested-bracket shape the provider expects.
    #[instrument(skip(self, request), fields(amount = request.unit_amount_cents))]
    pub async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<CheckoutSession, ServiceError> {
        let url = format!("{}/v1/checkout/sessions", self.api_base);

        let params: Vec<(&str, String)> = vec![
            ("mode", "payment".to_string()),
            ("line_items[0][quantity]", request.quantity.to_string()),
            (
                "line_items[0][price_data][currency]",
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.unit_amount_cents.to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.product_name.clone(),
            ),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::GatewayError(format!(
                "session creation returned {}: {}",
                status, body
            )));
        }

        let session: CheckoutSession = response
            .json()
            .await
            .map_err(|e| ServiceError::GatewayError(format!("malformed session response: {}", e)))?;

        debug!(session_id = %session.id, "checkout session opened");
        Ok(session)
    }
}
