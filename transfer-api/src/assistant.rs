use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use transfer_booking::assistant::{acknowledgement, classify};
use transfer_booking::{AssistantRoute, BookingWizard};
use transfer_core::{BookingDraft, BookingIntent};

use crate::error::AppError;
use crate::locale::RequestLocale;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/assistant/route", post(route_message))
}

/// The chat client calls the language model itself and forwards either the
/// raw completion or the object it parsed.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub message: String,
    #[serde(default)]
    pub completion: Option<String>,
    #[serde(default)]
    pub intent: Option<BookingIntent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteKind {
    Prefill,
    Conversational,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub route: RouteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<BookingDraft>,
    pub applied: Vec<&'static str>,
}

async fn route_message(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Json(req): Json<RouteRequest>,
) -> Result<Json<RouteResponse>, AppError> {
    let intent = req
        .intent
        .or_else(|| req.completion.as_deref().and_then(BookingIntent::from_completion));

    let AssistantRoute::Prefill(intent) = classify(&req.message, intent) else {
        return Ok(Json(RouteResponse {
            route: RouteKind::Conversational,
            reply: None,
            draft: None,
            applied: Vec::new(),
        }));
    };

    let mut wizard = BookingWizard::new(state.catalog.clone()).with_locale(locale);
    let applied = wizard.prefill(&intent).map_err(|e| AppError::step(e, locale))?;
    tracing::info!(fields = ?applied, "Chat message routed to booking form");

    Ok(Json(RouteResponse {
        route: RouteKind::Prefill,
        reply: Some(acknowledgement(&intent, locale)),
        draft: Some(wizard.draft().clone()),
        applied,
    }))
}
