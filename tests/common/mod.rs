//! Shared helpers for the database-backed API tests.
//!
//! Every test gets a fresh, migrated database from `#[sqlx::test]`; the
//! router is the one `main` serves, with a console mailer and a gateway
//! pointed at whatever URL the test supplies.

#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use coachline::api::{self, middleware::session::AppState};
use coachline::config::Config;
use coachline::models::booking::{Booking, CreateBookingData, Passenger};
use coachline::models::user::{CreateUserData, User};
use coachline::services::mailer::{ConsoleMailer, Mailer};
use coachline::services::password::hash_password;
use coachline::services::paystack::PaystackClient;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Router over `pool`, plus a handle on the mail it "sends"
pub fn build_test_app(pool: PgPool, gateway_url: &str) -> (Router, ConsoleMailer) {
    let config = Config::for_tests(gateway_url);
    let gateway = PaystackClient::new(
        gateway_url,
        config.paystack_secret_key.clone(),
        Duration::from_secs(5),
    )
    .expect("gateway client should build");
    let console = ConsoleMailer::new();

    let state = AppState {
        pool,
        config,
        gateway,
        mailer: Mailer::Console(console.clone()),
    };

    (api::app(state), console)
}

/// Sends a request and returns the status with the JSON body (`Null` when
/// the body is empty).
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .oneshot(builder.body(body).expect("request should build"))
        .await
        .expect("router is infallible");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");

    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Inserts an active user whose password is `TEST_PASSWORD`
pub async fn create_test_user(pool: &PgPool, email: &str) -> User {
    let password_hash = hash_password(TEST_PASSWORD)
        .await
        .expect("hashing should succeed");

    User::create(
        pool,
        CreateUserData {
            email: email.to_string(),
            full_name: "Ada Obi".to_string(),
            phone: None,
            password_hash,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Inserts a pending Lagos to Abuja booking for two passengers
pub async fn create_test_booking(pool: &PgPool, reference: &str, amount: i64) -> Booking {
    Booking::create(
        pool,
        CreateBookingData {
            reference: reference.to_string(),
            contact_name: "Ada Obi".to_string(),
            contact_email: "ada.obi@example.com".to_string(),
            contact_phone: "+2348012345678".to_string(),
            bus_type_id: Some(2),
            origin: "Lagos".to_string(),
            destination: "Abuja".to_string(),
            travel_date: NaiveDate::from_ymd_opt(2026, 12, 20).expect("valid date"),
            departure_time: Some("07:30".to_string()),
            amount,
            passengers: vec![
                Passenger {
                    name: "Ada Obi".to_string(),
                    seat_number: Some("3A".to_string()),
                    age: Some(31),
                },
                Passenger {
                    name: "Chidi Obi".to_string(),
                    seat_number: Some("3B".to_string()),
                    age: None,
                },
            ],
        },
    )
    .await
    .expect("booking creation should succeed")
}
