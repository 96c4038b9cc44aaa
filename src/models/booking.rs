use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Paid,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Paid => "paid",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub reference: String,
    pub payment_reference: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub status: String, // "pending", "paid" or "cancelled"
    pub bus_type_id: Option<i32>,
    pub origin: String,
    pub destination: String,
    pub travel_date: NaiveDate,
    pub departure_time: Option<String>,
    pub amount: i64, // minor units
    pub passengers: Json<Vec<Passenger>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBookingData {
    pub reference: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub bus_type_id: Option<i32>,
    pub origin: String,
    pub destination: String,
    pub travel_date: NaiveDate,
    pub departure_time: Option<String>,
    pub amount: i64,
    pub passengers: Vec<Passenger>,
}

/// Redacted projection returned by public lookups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSummary {
    pub reference: String,
    pub payment_reference: Option<String>,
    pub status: String,
    pub origin: String,
    pub destination: String,
    pub travel_date: NaiveDate,
    pub departure_time: Option<String>,
    pub amount: i64,
    pub passenger_count: usize,
    pub contact_email: String,
}

impl From<&Booking> for BookingSummary {
    fn from(booking: &Booking) -> Self {
        Self {
            reference: booking.reference.clone(),
            payment_reference: booking.payment_reference.clone(),
            status: booking.status.clone(),
            origin: booking.origin.clone(),
            destination: booking.destination.clone(),
            travel_date: booking.travel_date,
            departure_time: booking.departure_time.clone(),
            amount: booking.amount,
            passenger_count: booking.passengers.0.len(),
            contact_email: mask_email(&booking.contact_email),
        }
    }
}

/// `ada.obi@example.com` -> `a***@example.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

impl Booking {
    pub async fn create(pool: &PgPool, data: CreateBookingData) -> Result<Self, sqlx::Error> {
        let booking = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO bookings (
                reference, contact_name, contact_email, contact_phone, bus_type_id,
                origin, destination, travel_date, departure_time, amount, passengers
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&data.reference)
        .bind(&data.contact_name)
        .bind(&data.contact_email)
        .bind(&data.contact_phone)
        .bind(data.bus_type_id)
        .bind(&data.origin)
        .bind(&data.destination)
        .bind(data.travel_date)
        .bind(&data.departure_time)
        .bind(data.amount)
        .bind(Json(&data.passengers))
        .fetch_one(pool)
        .await?;

        Ok(booking)
    }

    pub async fn find_by_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let booking = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM bookings WHERE reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(pool)
        .await?;

        Ok(booking)
    }

    /// Matches either supplied value against either reference column.
    /// `None` values never match.
    pub async fn find_by_any_reference(
        pool: &PgPool,
        reference: Option<&str>,
        payment_reference: Option<&str>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let booking = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM bookings
            WHERE reference = $1
               OR payment_reference = $1
               OR reference = $2
               OR payment_reference = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(reference)
        .bind(payment_reference)
        .fetch_optional(pool)
        .await?;

        Ok(booking)
    }

    /// Marks a pending booking paid. Returns the updated row, or `None`
    /// if the booking was not pending.
    pub async fn mark_paid(
        pool: &PgPool,
        id: Uuid,
        payment_reference: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let booking = sqlx::query_as::<_, Self>(
            r#"
            UPDATE bookings
            SET status = $2, payment_reference = $3, updated_at = NOW()
            WHERE id = $1 AND status = $4
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(BookingStatus::Paid.as_str())
        .bind(payment_reference)
        .bind(BookingStatus::Pending.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(booking)
    }

    pub fn is_pending(&self) -> bool {
        self.status == BookingStatus::Pending.as_str()
    }

    pub fn is_paid(&self) -> bool {
        self.status == BookingStatus::Paid.as_str()
    }
}
