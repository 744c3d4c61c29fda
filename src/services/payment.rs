use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PaymentConfig;

/// Invoices are always issued in rupiah.
pub const CURRENCY: &str = "IDR";
/// The provider expires an unpaid invoice after this long.
pub const INVOICE_DURATION_SECONDS: u64 = 86_400;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PaymentError {
    #[error("network error: {0}")]
    Network(String),

    #[error("provider rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Correlation id echoed back as `external_id` in webhook events.
    pub booking_id: String,
    pub amount: f64,
    pub description: String,
    pub payer_email: String,
    pub success_url: String,
    pub failure_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentLink {
    pub payment_url: String,
    pub payment_reference: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Makes one outbound call to the provider. Failures are returned as-is,
    /// never retried here.
    async fn create_payment_request(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentLink, PaymentError>;

    /// Compares the `x-callback-token` header against the configured secret.
    ///
    /// This is a shared-secret check only: it says nothing about the
    /// integrity of the payload.
    fn verify_webhook_authenticity(&self, presented_token: &str) -> bool;
}

#[derive(Serialize)]
struct InvoiceRequest<'a> {
    external_id: &'a str,
    amount: f64,
    description: &'a str,
    payer_email: &'a str,
    success_redirect_url: &'a str,
    failure_redirect_url: &'a str,
    currency: &'static str,
    invoice_duration: u64,
}

#[derive(Deserialize)]
struct InvoiceResponse {
    id: String,
    invoice_url: String,
}

/// Xendit invoice API client.
#[derive(Clone)]
pub struct XenditClient {
    http: Client,
    base_url: String,
    secret_key: String,
    webhook_token: String,
}

impl XenditClient {
    pub fn new(cfg: &PaymentConfig) -> Result<Self, PaymentError> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            secret_key: cfg.secret_key.clone(),
            webhook_token: cfg.webhook_token.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for XenditClient {
    async fn create_payment_request(
        &self,
        request: PaymentRequest,
    ) -> Result<PaymentLink, PaymentError> {
        let body = InvoiceRequest {
            external_id: &request.booking_id,
            amount: request.amount,
            description: &request.description,
            payer_email: &request.payer_email,
            success_redirect_url: &request.success_url,
            failure_redirect_url: &request.failure_url,
            currency: CURRENCY,
            invoice_duration: INVOICE_DURATION_SECONDS,
        };

        let response = self
            .http
            .post(format!("{}/v2/invoices", self.base_url))
            .basic_auth(&self.secret_key, None::<&str>)
            .json(&body)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let invoice: InvoiceResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        log::info!(
            "Created invoice {} for booking {}",
            invoice.id,
            request.booking_id
        );

        Ok(PaymentLink {
            payment_url: invoice.invoice_url,
            payment_reference: invoice.id,
        })
    }

    fn verify_webhook_authenticity(&self, presented_token: &str) -> bool {
        !presented_token.is_empty() && presented_token == self.webhook_token
    }
}
