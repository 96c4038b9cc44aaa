use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{
    auth::AuthenticatedUser,
    session::{bearer_token, AppState},
};
use crate::api::validation::{max_length, optional, required, validate_email, ApiJson};
use crate::error::{AppError, Result};
use crate::models::{
    session::Session,
    user::{CreateUserData, PublicUser, User},
};
use crate::services::{password, tokens};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: PublicUser,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// Exchanges email and password for a session token
async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let email = required("email", body.email)?;
    // Passwords are not trimmed
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("password is required".to_string()))?;

    let user = match User::find_by_email(&state.pool, &email).await? {
        Some(user) if user.is_active => user,
        Some(user) => {
            tracing::warn!(user_id = %user.id, "Login attempt for inactive user");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            tracing::warn!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    if !password::verify_password(&password, &user.password_hash).await? {
        tracing::warn!(user_id = %user.id, "Login attempt with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = tokens::generate_session_token().map_err(anyhow::Error::new)?;
    let session = Session::create(
        &state.pool,
        user.id,
        &token,
        Duration::hours(state.config.session_ttl_hours),
    )
    .await?;

    tracing::info!(user_id = %user.id, expires_at = %session.expires_at, "User logged in");

    Ok(Json(LoginResponse {
        token,
        expires_at: session.expires_at,
        user: user.into(),
    }))
}

/// Returns the user owning the bearer token
async fn current_user(auth: AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse {
        user: auth.user.into(),
    })
}

/// Deletes the session; unknown tokens are not an error
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;

    if Session::delete_by_token(&state.pool, token).await? {
        tracing::info!("Session logged out");
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let email = required("email", body.email)?;
    validate_email("email", &email)?;
    let full_name = required("full_name", body.full_name)?;
    max_length("full_name", &full_name, 200)?;
    let phone = optional(body.phone);
    let password = body
        .password
        .ok_or_else(|| AppError::Validation("password is required".to_string()))?;
    password::validate_password_strength(&password).map_err(AppError::Validation)?;

    if User::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = password::hash_password(&password).await?;

    let user = User::create(
        &state.pool,
        CreateUserData {
            email,
            full_name,
            phone,
            password_hash,
        },
    )
    .await
    .map_err(|e| match e {
        // Lost a race with a concurrent registration
        sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict(
            "An account with this email already exists".to_string(),
        ),
        other => AppError::Database(other),
    })?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(UserResponse { user: user.into() })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(current_user))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/register", post(register))
}
