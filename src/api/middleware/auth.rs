use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;

use super::session::{bearer_token, AppState};
use crate::error::AppError;
use crate::models::{session::Session, user::User};

/// The user behind a valid, unexpired bearer token
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
    pub session: Session,
}

/// Resolves a session token to its active owner
pub async fn authenticate_token(pool: &PgPool, token: &str) -> Result<AuthenticatedUser, AppError> {
    let session = Session::find_by_token(pool, token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if session.is_expired() {
        tracing::debug!(session_id = %session.id, "Rejecting expired session");
        Session::delete_by_token(pool, token).await?;
        return Err(AppError::Unauthorized);
    }

    let user = User::find_by_id(pool, session.user_id)
        .await?
        .filter(|user| user.is_active)
        .ok_or(AppError::Unauthorized)?;

    Ok(AuthenticatedUser { user, session })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        authenticate_token(&state.pool, token).await
    }
}
