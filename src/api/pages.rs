use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::api::middleware::session::AppState;
use crate::error::Result;
use crate::models::booking::{mask_email, Booking, Passenger};
use crate::models::bus_type::BusType;
use crate::services::emails::format_amount;

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    bus_types: Vec<BusType>,
}

#[derive(Template)]
#[template(path = "receipt.html")]
struct ReceiptTemplate {
    reference: String,
    status: String,
    origin: String,
    destination: String,
    travel_date: String,
    departure_time: String,
    amount: String,
    contact_email: String,
    passengers: Vec<Passenger>,
}

impl From<Booking> for ReceiptTemplate {
    fn from(booking: Booking) -> Self {
        Self {
            contact_email: mask_email(&booking.contact_email),
            amount: format_amount(booking.amount),
            travel_date: booking.travel_date.format("%A, %d %B %Y").to_string(),
            departure_time: booking
                .departure_time
                .unwrap_or_else(|| "See terminal schedule".to_string()),
            reference: booking.reference,
            status: booking.status,
            origin: booking.origin,
            destination: booking.destination,
            passengers: booking.passengers.0,
        }
    }
}

#[derive(Template)]
#[template(path = "not_found.html")]
struct NotFoundTemplate {
    message: String,
}

async fn home_page(State(state): State<AppState>) -> Result<HomeTemplate> {
    let bus_types = BusType::list_all(&state.pool).await?;
    Ok(HomeTemplate { bus_types })
}

async fn receipt_page(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Response> {
    let response = match Booking::find_by_reference(&state.pool, reference.trim()).await? {
        Some(booking) => ReceiptTemplate::from(booking).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            NotFoundTemplate {
                message: format!("No booking with reference {}", reference),
            },
        )
            .into_response(),
    };

    Ok(response)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home_page))
        .route("/bookings/:reference/receipt", get(receipt_page))
}
