//! Booking creation, lookup and confirmation mail against a real database.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use sqlx::PgPool;

use coachline::models::booking::Booking;
use common::{build_test_app, create_test_booking, send};

const NO_GATEWAY: &str = "http://127.0.0.1:9";

fn booking_request(bus_type_id: i32, passengers: usize) -> Value {
    let passengers: Vec<Value> = (0..passengers)
        .map(|i| json!({ "name": format!("Rider {}", i + 1) }))
        .collect();

    json!({
        "contact_name": "Ada Obi",
        "contact_email": "Ada.Obi@Example.com",
        "contact_phone": "+2348012345678",
        "origin": "Lagos",
        "destination": "Abuja",
        "travel_date": "2026-12-20",
        "bus_type_id": bus_type_id,
        "amount": 2500000,
        "passengers": passengers
    })
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_booking_is_pending_with_generated_reference(pool: PgPool) {
    let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/bookings",
        None,
        Some(booking_request(2, 2)),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let reference = body["booking"]["reference"].as_str().unwrap();
    assert!(reference.starts_with("CL-"));
    assert_eq!(body["booking"]["status"], "pending");
    assert_eq!(body["booking"]["passenger_count"], 2);
    assert_eq!(body["booking"]["contact_email"], "a***@example.com");

    let stored = Booking::find_by_reference(&pool, reference)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.contact_email, "ada.obi@example.com");
    assert_eq!(stored.amount, 2_500_000);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_booking_respects_bus_capacity(pool: PgPool) {
    // Mini Bus seats 18
    let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);
    let (status, body) = send(
        app,
        Method::POST,
        "/api/bookings",
        None,
        Some(booking_request(4, 19)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (app, _) = build_test_app(pool, NO_GATEWAY);
    let (status, _) = send(
        app,
        Method::POST,
        "/api/bookings",
        None,
        Some(booking_request(99, 1)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_check_payment_matches_booking_reference(pool: PgPool) {
    create_test_booking(&pool, "CL-7K3QX9PD", 2_500_000).await;
    let (app, _) = build_test_app(pool, NO_GATEWAY);

    let (status, body) = send(
        app,
        Method::GET,
        "/api/bookings/check-payment?reference=CL-7K3QX9PD",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);
    assert_eq!(body["booking"]["reference"], "CL-7K3QX9PD");
    assert_eq!(body["booking"]["status"], "pending");
    assert_eq!(body["booking"]["contact_email"], "a***@example.com");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_check_payment_matches_payment_reference(pool: PgPool) {
    let booking = create_test_booking(&pool, "CL-7K3QX9PD", 2_500_000).await;
    Booking::mark_paid(&pool, booking.id, "PSK-778899")
        .await
        .unwrap()
        .unwrap();

    // Either parameter is checked against either column
    for query in [
        "paymentReference=PSK-778899",
        "reference=PSK-778899",
        "reference=CL-NOPE2345&paymentReference=CL-7K3QX9PD",
    ] {
        let (app, _) = build_test_app(pool.clone(), NO_GATEWAY);
        let uri = format!("/api/bookings/check-payment?{}", query);
        let (status, body) = send(app, Method::GET, &uri, None, None).await;

        assert_eq!(status, StatusCode::OK, "{}", query);
        assert_eq!(body["exists"], true, "{}", query);
        assert_eq!(body["booking"]["reference"], "CL-7K3QX9PD");
        assert_eq!(body["booking"]["payment_reference"], "PSK-778899");
        assert_eq!(body["booking"]["status"], "paid");
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_check_payment_unknown_reference(pool: PgPool) {
    let (app, _) = build_test_app(pool, NO_GATEWAY);

    let (status, body) = send(
        app,
        Method::GET,
        "/api/bookings/check-payment?reference=CL-NOPE2345",
        None,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], false);
    assert!(body["booking"].is_null());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_confirmation_email_goes_to_contact(pool: PgPool) {
    create_test_booking(&pool, "CL-7K3QX9PD", 2_500_000).await;
    let (app, console) = build_test_app(pool.clone(), NO_GATEWAY);

    let (status, body) = send(
        app,
        Method::POST,
        "/api/bookings/confirmation-email",
        None,
        Some(json!({ "reference": "CL-7K3QX9PD" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], true);
    let sent = console.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "ada.obi@example.com");
    assert!(sent[0].html_body.contains("CL-7K3QX9PD"));

    let (app, console) = build_test_app(pool, NO_GATEWAY);
    let (status, _) = send(
        app,
        Method::POST,
        "/api/bookings/confirmation-email",
        None,
        Some(json!({ "reference": "CL-NOPE2345" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(console.sent().is_empty());
}
