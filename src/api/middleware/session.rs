use axum::{extract::FromRef, http::HeaderMap};
use sqlx::PgPool;

use crate::config::Config;
use crate::services::{mailer::Mailer, paystack::PaystackClient};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub gateway: PaystackClient,
    pub mailer: Mailer,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> PgPool {
        state.pool.clone()
    }
}

/// Extracts the token from `Authorization: Bearer <token>`.
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .trim();

    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
