use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde::Serialize;
use transfer_booking::{BookingMessages, MessageKey};
use transfer_core::{BookingDraft, TripLeg};
use transfer_shared::Money;
use uuid::Uuid;

use crate::auth::resolve_identity;
use crate::error::AppError;
use crate::locale::RequestLocale;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings", post(create_booking))
}

#[derive(Debug, Serialize)]
pub struct BookingResponse {
    pub booking_id: Uuid,
    pub record_id: Option<String>,
    pub reference: String,
    pub price: Money,
    pub price_display: String,
    pub legs: Vec<TripLeg>,
    pub message: String,
}

async fn create_booking(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Json(draft): Json<BookingDraft>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let identity = resolve_identity(&state, bearer).await?;

    let booking = state
        .orchestrator
        .submit(&draft, &identity)
        .await
        .map_err(|e| AppError::submission(e, locale))?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            booking_id: booking.id,
            record_id: booking.record_id.as_ref().map(|r| r.0.clone()),
            reference: booking.reference(),
            price: booking.price,
            price_display: booking.price.to_string(),
            message: BookingMessages::text(MessageKey::BookingRequested, locale),
            legs: booking.legs,
        }),
    ))
}
