use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use transfer_booking::{SlotStatus, SubmissionError};
use transfer_catalog::{PricingError, TripType};
use transfer_shared::Money;

use crate::error::AppError;
use crate::locale::RequestLocale;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/quotes", post(create_quote))
        .route("/v1/availability", get(check_availability))
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub origin: String,
    pub destination: String,
    pub vehicle_class: String,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub extras: BTreeSet<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub fare: Money,
    pub legs: i64,
    pub extras_total: Money,
    pub total: Money,
    pub total_display: String,
}

async fn create_quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, AppError> {
    let breakdown = state
        .catalog
        .pricing()
        .quote_breakdown(&req.origin, &req.destination, &req.vehicle_class, req.trip_type, &req.extras)
        .map_err(|e| match e {
            PricingError::UnknownRoute { .. } => AppError::Unprocessable(e.to_string()),
            PricingError::UnknownExtra(_) => AppError::Validation(e.to_string()),
        })?;

    Ok(Json(QuoteResponse {
        fare: breakdown.fare,
        legs: breakdown.legs,
        extras_total: breakdown.extras_total,
        total: breakdown.total,
        total_display: breakdown.total.to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
    pub time: String,
    pub vehicle_class: String,
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

async fn check_availability(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<SlotStatus>, AppError> {
    let time = parse_time(&query.time)
        .ok_or_else(|| AppError::Validation(format!("Invalid time: {}", query.time)))?;

    state
        .orchestrator
        .availability(query.date, time, &query.vehicle_class)
        .await
        .map(Json)
        .map_err(|e: SubmissionError| AppError::submission(e, locale))
}
