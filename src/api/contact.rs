use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;

use crate::api::bookings::SentResponse;
use crate::api::middleware::session::AppState;
use crate::api::validation::{max_length, optional, required, validate_email, ApiJson};
use crate::error::Result;
use crate::services::emails::{self, ContactMessage};

const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

pub fn validate_contact(body: ContactRequest) -> Result<ContactMessage> {
    let name = required("name", body.name)?;
    max_length("name", &name, 200)?;
    let email = required("email", body.email)?;
    validate_email("email", &email)?;
    let subject = optional(body.subject);
    if let Some(subject) = &subject {
        max_length("subject", subject, 200)?;
    }
    let message = required("message", body.message)?;
    max_length("message", &message, MAX_MESSAGE_LEN)?;

    Ok(ContactMessage {
        name,
        email,
        subject,
        message,
    })
}

/// Forwards a contact form submission to the support inbox
async fn send_contact_email(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ContactRequest>,
) -> Result<Json<SentResponse>> {
    let message = validate_contact(body)?;

    let email = emails::contact_message(&message, &state.config.contact_inbox);
    state.mailer.send(email).await?;

    tracing::info!(from = %message.email, "Contact message forwarded");

    Ok(Json(SentResponse { sent: true }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/contact", post(send_contact_email))
}
