use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{mailer::MailError, password::PasswordError, paystack::GatewayError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Payment gateway rejected the request: {0}")]
    GatewayRejected(String),

    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::Unauthorized => "unauthorized",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::GatewayRejected(_) => "payment_rejected",
            AppError::GatewayUnavailable(_) => "gateway_unavailable",
            AppError::Database(_) => "database_error",
            AppError::Mail(_) => "mail_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::GatewayRejected(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::GatewayUnavailable(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Mail(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::GatewayRejected(msg) => msg.clone(),
            AppError::InvalidCredentials => "Invalid email or password".to_string(),
            AppError::Unauthorized => "Authentication required".to_string(),
            AppError::GatewayUnavailable(_) => {
                "Payment gateway is unavailable, please try again later".to_string()
            }
            AppError::Database(_) | AppError::Mail(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::warn!(error = %self, status = %status, "Request rejected");
        }

        let body = Json(json!({
            "error": self.kind(),
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected(msg) => AppError::GatewayRejected(msg),
            GatewayError::NotSuccessful(status) => {
                AppError::GatewayRejected(format!("Payment not successful (status: {})", status))
            }
            GatewayError::Http(e) => AppError::GatewayUnavailable(e.to_string()),
            GatewayError::InvalidResponse(msg) => AppError::GatewayUnavailable(msg),
            GatewayError::InvalidBaseUrl(e) => AppError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
