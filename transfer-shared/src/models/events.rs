use chrono::NaiveDate;
use uuid::Uuid;

use crate::pii::Masked;

/// Published once a booking has been persisted and its capacity committed.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub record_id: String,
    pub idempotency_key: Uuid,
    pub vehicle_class: String,
    pub route: String,
    pub pickup_date: NaiveDate,
    pub pickup_hour: u32,
    pub round_trip: bool,
    pub total_cents: i64,
    pub customer_email: Masked<String>,
    pub user_id: Option<String>,
    pub timestamp: i64,
}

/// Published when a submission is turned away because its hour is full.
/// Operations uses these to spot where the fleet is short.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct CapacityExhaustedEvent {
    pub vehicle_class: String,
    pub date: NaiveDate,
    pub hour: u32,
    pub capacity: u32,
    pub timestamp: i64,
}
