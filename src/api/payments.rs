use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::session::AppState;
use crate::api::validation::{
    max_length, optional, required, validate_email, ApiJson, ApiPath,
};
use crate::error::{AppError, Result};
use crate::models::booking::Booking;
use crate::services::paystack::{InitializeData, InitializeRequest, VerifiedPayment};

const MAX_REFERENCE_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct InitializePaymentRequest {
    pub email: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub reference: Option<String>,
    pub callback_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct InitializePaymentResponse {
    pub status: bool,
    pub message: String,
    pub data: InitializeData,
}

#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub status: bool,
    pub message: String,
    pub data: VerifiedPayment,
    /// Booking settled by this payment; null when none matched or the
    /// amount fell short
    pub booking_reference: Option<String>,
}

/// Accepts a positive integer, as a JSON number or a digit string
pub fn parse_amount(value: Option<&serde_json::Value>) -> Result<i64> {
    let invalid = || {
        AppError::Validation("amount must be a positive integer in minor units".to_string())
    };

    let amount = match value {
        None | Some(serde_json::Value::Null) => {
            return Err(AppError::Validation("amount is required".to_string()))
        }
        Some(serde_json::Value::Number(n)) => n.as_i64().ok_or_else(invalid)?,
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };

    if amount <= 0 {
        return Err(invalid());
    }
    Ok(amount)
}

/// Validates and converts the body into a gateway request
pub fn validate_initialize(body: InitializePaymentRequest) -> Result<InitializeRequest> {
    let email = required("email", body.email)?;
    validate_email("email", &email)?;
    let amount = parse_amount(body.amount.as_ref())?;
    let reference = required("reference", body.reference)?;
    max_length("reference", &reference, MAX_REFERENCE_LEN)?;

    let callback_url = optional(body.callback_url);
    if let Some(url) = &callback_url {
        url::Url::parse(url)
            .map_err(|_| AppError::Validation("callback_url must be an absolute URL".to_string()))?;
    }

    Ok(InitializeRequest {
        email,
        amount,
        reference,
        callback_url,
        metadata: body.metadata,
    })
}

async fn initialize_payment(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<InitializePaymentRequest>,
) -> Result<Json<InitializePaymentResponse>> {
    let request = validate_initialize(body)?;

    let outcome = state.gateway.initialize(&request).await?;

    Ok(Json(InitializePaymentResponse {
        status: true,
        message: outcome.message,
        data: outcome.data,
    }))
}

async fn verify_payment(
    State(state): State<AppState>,
    ApiPath(reference): ApiPath<String>,
) -> Result<Json<VerifyPaymentResponse>> {
    let reference = required("reference", Some(reference))?;
    max_length("reference", &reference, MAX_REFERENCE_LEN)?;

    let payment = state.gateway.verify(&reference).await?;

    let booking_reference = reconcile_booking(&state, &payment).await?;

    Ok(Json(VerifyPaymentResponse {
        status: true,
        message: "Payment verified".to_string(),
        data: payment,
        booking_reference,
    }))
}

/// Settles the booking matching a verified payment. A pending booking is
/// marked paid only when the verified amount covers it. Returns the booking
/// reference once the booking is paid, `None` otherwise.
async fn reconcile_booking(state: &AppState, payment: &VerifiedPayment) -> Result<Option<String>> {
    let Some(booking) = Booking::find_by_any_reference(
        &state.pool,
        Some(payment.reference.as_str()),
        Some(payment.reference.as_str()),
    )
    .await?
    else {
        tracing::info!(reference = %payment.reference, "Verified payment has no matching booking");
        return Ok(None);
    };

    if payment.amount < booking.amount {
        tracing::warn!(
            reference = %booking.reference,
            booking_amount = booking.amount,
            paid_amount = payment.amount,
            "Verified amount does not cover booking, leaving it unpaid"
        );
        return Ok(None);
    }

    if booking.is_pending() {
        if let Some(updated) = Booking::mark_paid(&state.pool, booking.id, &payment.reference).await?
        {
            tracing::info!(
                reference = %updated.reference,
                payment_reference = %payment.reference,
                "Booking marked paid"
            );
            return Ok(Some(updated.reference));
        }

        // Changed since it was read, usually a concurrent verification
        let current = Booking::find_by_reference(&state.pool, &booking.reference).await?;
        return Ok(current.filter(Booking::is_paid).map(|b| b.reference));
    }

    Ok(booking.is_paid().then_some(booking.reference))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/payments/initialize", post(initialize_payment))
        .route("/api/payments/verify/:reference", get(verify_payment))
}
