use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway rejected request: {0}")]
    Rejected(String),

    #[error("Payment status is {0}")]
    NotSuccessful(String),

    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),

    #[error("Invalid gateway base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

/// Body sent to `POST /transaction/initialize`
#[derive(Debug, Clone, Serialize)]
pub struct InitializeRequest {
    pub email: String,
    /// Minor currency units
    pub amount: i64,
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitializeData {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

/// Gateway envelope shared by every endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    status: String,
    reference: String,
    amount: i64,
    currency: Option<String>,
    paid_at: Option<String>,
    channel: Option<String>,
    gateway_response: Option<String>,
    customer: Option<Customer>,
}

#[derive(Debug, Deserialize)]
struct Customer {
    email: Option<String>,
}

/// Normalized view of a verified transaction
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VerifiedPayment {
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub paid_at: Option<String>,
    pub channel: Option<String>,
    pub customer_email: Option<String>,
    pub gateway_response: Option<String>,
}

impl From<TransactionData> for VerifiedPayment {
    fn from(data: TransactionData) -> Self {
        Self {
            reference: data.reference,
            amount: data.amount,
            currency: data.currency.unwrap_or_else(|| "NGN".to_string()),
            status: data.status,
            paid_at: data.paid_at,
            channel: data.channel,
            customer_email: data.customer.and_then(|c| c.email),
            gateway_response: data.gateway_response,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InitializeOutcome {
    pub message: String,
    pub data: InitializeData,
}

/// Client for the payment gateway's transaction API, keyed by a bearer secret
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: Url,
    secret_key: Secret<String>,
}

impl std::fmt::Debug for PaystackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaystackClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl PaystackClient {
    pub fn new(
        base_url: &str,
        secret_key: Secret<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = Url::parse(base_url)?;

        Ok(Self {
            client,
            base_url,
            secret_key,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::InvalidResponse(format!(
                    "Base URL cannot carry a path: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Starts a transaction and returns the hosted checkout details.
    #[tracing::instrument(skip(self, request), fields(reference = %request.reference))]
    pub async fn initialize(
        &self,
        request: &InitializeRequest,
    ) -> Result<InitializeOutcome, GatewayError> {
        let url = self.endpoint(&["transaction", "initialize"])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.secret_key.expose_secret())
            .json(request)
            .send()
            .await?;

        let envelope: Envelope<InitializeData> = read_envelope(response).await?;

        if !envelope.status {
            return Err(GatewayError::Rejected(envelope.message));
        }

        let data = envelope.data.ok_or_else(|| {
            GatewayError::InvalidResponse("Initialize response has no data".to_string())
        })?;

        tracing::info!(
            reference = %data.reference,
            amount = request.amount,
            "Payment initialized"
        );

        Ok(InitializeOutcome {
            message: envelope.message,
            data,
        })
    }

    /// Verifies a transaction; only a gateway-reported `success` is accepted.
    #[tracing::instrument(skip(self))]
    pub async fn verify(&self, reference: &str) -> Result<VerifiedPayment, GatewayError> {
        let url = self.endpoint(&["transaction", "verify", reference])?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        let envelope: Envelope<TransactionData> = read_envelope(response).await?;

        if !envelope.status {
            return Err(GatewayError::Rejected(envelope.message));
        }

        let data = envelope.data.ok_or_else(|| {
            GatewayError::InvalidResponse("Verify response has no data".to_string())
        })?;

        if data.status != "success" {
            tracing::warn!(
                reference = %data.reference,
                status = %data.status,
                "Payment verification did not succeed"
            );
            return Err(GatewayError::NotSuccessful(data.status));
        }

        let payment = VerifiedPayment::from(data);

        tracing::info!(
            reference = %payment.reference,
            amount = payment.amount,
            "Payment verified"
        );

        Ok(payment)
    }
}

async fn read_envelope<T>(response: reqwest::Response) -> Result<Envelope<T>, GatewayError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        // Gateway errors still carry a {status, message} body
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .map(|e| e.message)
            .unwrap_or_else(|_| format!("HTTP {}", status));

        tracing::error!(status = %status, message = %message, "Gateway request failed");

        if status.is_server_error() {
            return Err(GatewayError::InvalidResponse(message));
        }
        return Err(GatewayError::Rejected(message));
    }

    serde_json::from_str(&body)
        .map_err(|e| GatewayError::InvalidResponse(format!("Failed to parse response: {}", e)))
}
