use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use transfer_booking::projection::{available_vehicles, VehicleOption};
use transfer_booking::StepError;
use transfer_catalog::{Extra, TripType};
use transfer_core::BookingDraft;

use crate::error::AppError;
use crate::locale::RequestLocale;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/catalog/origins", get(list_origins))
        .route("/v1/catalog/destinations", get(list_destinations))
        .route("/v1/catalog/vehicles", get(list_vehicles))
        .route("/v1/catalog/extras", get(list_extras))
}

async fn list_origins(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.routes.list_origins())
}

#[derive(Debug, Deserialize)]
pub struct DestinationsQuery {
    #[serde(default)]
    pub origin: String,
}

async fn list_destinations(
    State(state): State<AppState>,
    Query(query): Query<DestinationsQuery>,
) -> Json<Vec<String>> {
    Json(state.catalog.routes.list_destinations(&query.origin))
}

#[derive(Debug, Deserialize)]
pub struct VehiclesQuery {
    pub origin: String,
    pub destination: String,
    #[serde(default = "one")]
    pub passengers: u32,
    #[serde(default)]
    pub trip_type: TripType,
}

fn one() -> u32 {
    1
}

async fn list_vehicles(
    State(state): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Query(query): Query<VehiclesQuery>,
) -> Result<Json<Vec<VehicleOption>>, AppError> {
    let max = state.catalog.routes.max_passengers();
    if query.passengers == 0 || query.passengers > max {
        let err = StepError::InvalidPassengers {
            passengers: query.passengers,
            max,
        };
        return Err(AppError::step(err, locale));
    }

    let mut draft = BookingDraft::new();
    draft.origin = Some(query.origin);
    draft.destination = Some(query.destination);
    draft.passengers = query.passengers;
    draft.trip_type = query.trip_type;

    Ok(Json(available_vehicles(&state.catalog, &draft)))
}

async fn list_extras(State(state): State<AppState>) -> Json<Vec<Extra>> {
    Json(state.catalog.extras.list_extras().to_vec())
}
