use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::middleware::session::AppState;
use crate::api::validation::{
    max_length, optional, required, validate_email, ApiJson, ApiPath, ApiQuery,
};
use crate::error::{AppError, Result};
use crate::models::{
    booking::{Booking, BookingSummary, CreateBookingData, Passenger},
    bus_type::BusType,
};
use crate::services::{emails, tokens};

const MAX_REFERENCE_LEN: usize = 100;
const MAX_PASSENGERS: usize = 60;
const REFERENCE_ATTEMPTS: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPaymentParams {
    pub reference: Option<String>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckPaymentResponse {
    pub exists: bool,
    pub booking: Option<BookingSummary>,
}

#[derive(Debug, Deserialize)]
pub struct PassengerInput {
    pub name: Option<String>,
    pub seat_number: Option<String>,
    pub age: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub travel_date: Option<String>,
    pub departure_time: Option<String>,
    pub bus_type_id: Option<i32>,
    pub amount: Option<i64>,
    #[serde(default)]
    pub passengers: Vec<PassengerInput>,
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking: BookingSummary,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationEmailRequest {
    pub reference: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentResponse {
    pub sent: bool,
}

/// Validated booking fields, minus the generated reference
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub origin: String,
    pub destination: String,
    pub travel_date: NaiveDate,
    pub departure_time: Option<String>,
    pub bus_type_id: Option<i32>,
    pub amount: i64,
    pub passengers: Vec<Passenger>,
}

impl NewBooking {
    fn into_create_data(self, reference: String) -> CreateBookingData {
        CreateBookingData {
            reference,
            contact_name: self.contact_name,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            bus_type_id: self.bus_type_id,
            origin: self.origin,
            destination: self.destination,
            travel_date: self.travel_date,
            departure_time: self.departure_time,
            amount: self.amount,
            passengers: self.passengers,
        }
    }
}

/// Shape validation that needs no database access
pub fn validate_new_booking(body: CreateBookingRequest) -> Result<NewBooking> {
    let contact_name = required("contact_name", body.contact_name)?;
    max_length("contact_name", &contact_name, 200)?;
    let contact_email = required("contact_email", body.contact_email)?;
    validate_email("contact_email", &contact_email)?;
    let contact_phone = required("contact_phone", body.contact_phone)?;
    max_length("contact_phone", &contact_phone, 30)?;

    let origin = required("origin", body.origin)?;
    let destination = required("destination", body.destination)?;
    if origin.eq_ignore_ascii_case(&destination) {
        return Err(AppError::Validation(
            "origin and destination must differ".to_string(),
        ));
    }

    let travel_date = required("travel_date", body.travel_date)?;
    let travel_date = NaiveDate::parse_from_str(&travel_date, "%Y-%m-%d").map_err(|_| {
        AppError::Validation("travel_date must be formatted as YYYY-MM-DD".to_string())
    })?;

    let amount = body
        .amount
        .ok_or_else(|| AppError::Validation("amount is required".to_string()))?;
    if amount <= 0 {
        return Err(AppError::Validation(
            "amount must be a positive integer in minor units".to_string(),
        ));
    }

    if body.passengers.is_empty() {
        return Err(AppError::Validation(
            "at least one passenger is required".to_string(),
        ));
    }
    if body.passengers.len() > MAX_PASSENGERS {
        return Err(AppError::Validation(format!(
            "at most {} passengers per booking",
            MAX_PASSENGERS
        )));
    }

    let passengers = body
        .passengers
        .into_iter()
        .enumerate()
        .map(|(i, p)| -> Result<Passenger> {
            Ok(Passenger {
                name: required(&format!("passengers[{}].name", i), p.name)?,
                seat_number: optional(p.seat_number),
                age: p.age,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(NewBooking {
        contact_name,
        contact_email: contact_email.to_lowercase(),
        contact_phone,
        origin,
        destination,
        travel_date,
        departure_time: optional(body.departure_time),
        bus_type_id: body.bus_type_id,
        amount,
        passengers,
    })
}

async fn create_booking(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>)> {
    let new_booking = validate_new_booking(body)?;

    if let Some(bus_type_id) = new_booking.bus_type_id {
        let bus_type = BusType::find_by_id(&state.pool, bus_type_id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Unknown bus type {}", bus_type_id)))?;

        if new_booking.passengers.len() > bus_type.seat_capacity as usize {
            return Err(AppError::Validation(format!(
                "{} seats at most on a {} bus",
                bus_type.seat_capacity, bus_type.name
            )));
        }
    }

    // References are random; retry the rare collision
    let mut attempts = 0;
    let booking = loop {
        attempts += 1;
        let reference = tokens::generate_booking_reference().map_err(anyhow::Error::new)?;

        match Booking::create(&state.pool, new_booking.clone().into_create_data(reference)).await
        {
            Ok(booking) => break booking,
            Err(sqlx::Error::Database(db))
                if db.is_unique_violation() && attempts < REFERENCE_ATTEMPTS =>
            {
                tracing::warn!(attempts, "Booking reference collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    };

    tracing::info!(
        reference = %booking.reference,
        passengers = booking.passengers.0.len(),
        amount = booking.amount,
        "Booking created"
    );

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            booking: BookingSummary::from(&booking),
        }),
    ))
}

/// Looks up a booking by either reference against either column
async fn check_booking_payment(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<CheckPaymentParams>,
) -> Result<Json<CheckPaymentResponse>> {
    let reference = optional(params.reference);
    let payment_reference = optional(params.payment_reference);

    if reference.is_none() && payment_reference.is_none() {
        return Err(AppError::Validation(
            "reference or paymentReference is required".to_string(),
        ));
    }
    for value in [&reference, &payment_reference].into_iter().flatten() {
        max_length("reference", value, MAX_REFERENCE_LEN)?;
    }

    let booking = Booking::find_by_any_reference(
        &state.pool,
        reference.as_deref(),
        payment_reference.as_deref(),
    )
    .await?;

    tracing::debug!(
        reference = ?reference,
        payment_reference = ?payment_reference,
        found = booking.is_some(),
        "Checked booking payment"
    );

    Ok(Json(CheckPaymentResponse {
        exists: booking.is_some(),
        booking: booking.as_ref().map(BookingSummary::from),
    }))
}

async fn get_booking(
    State(state): State<AppState>,
    ApiPath(reference): ApiPath<String>,
) -> Result<Json<BookingResponse>> {
    let booking = Booking::find_by_reference(&state.pool, reference.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    Ok(Json(BookingResponse {
        booking: BookingSummary::from(&booking),
    }))
}

async fn send_confirmation_email(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ConfirmationEmailRequest>,
) -> Result<Json<SentResponse>> {
    let reference = required("reference", body.reference)?;
    max_length("reference", &reference, MAX_REFERENCE_LEN)?;

    let booking = Booking::find_by_reference(&state.pool, &reference)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    let email = emails::booking_confirmation(&booking, &state.config.base_url);
    state.mailer.send(email).await?;

    tracing::info!(reference = %booking.reference, "Booking confirmation sent");

    Ok(Json(SentResponse { sent: true }))
}

async fn list_bus_types(State(state): State<AppState>) -> Result<Json<Vec<BusType>>> {
    Ok(Json(BusType::list_all(&state.pool).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/bookings", post(create_booking))
        .route("/api/bookings/check-payment", get(check_booking_payment))
        .route("/api/bookings/confirmation-email", post(send_confirmation_email))
        .route("/api/bookings/:reference", get(get_booking))
        .route("/api/bus-types", get(list_bus_types))
}
