//! Read-only views over a draft for the booking screens. Nothing here is
//! cached: every call recomputes from the catalog and the draft.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use transfer_catalog::{Catalog, QuoteBreakdown, TripType, VehicleCategory};
use transfer_core::BookingDraft;
use transfer_shared::Money;

/// A vehicle class as the vehicle step shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleOption {
    pub id: String,
    pub label: String,
    pub category: VehicleCategory,
    pub icon: &'static str,
    pub max_passengers: u32,
    /// Fare for one leg.
    pub fare: Money,
    /// Fare for the whole trip type, extras excluded.
    pub display_price: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripSummary {
    pub trip_type: TripType,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub return_date: Option<NaiveDate>,
    pub return_time: Option<NaiveTime>,
    pub passengers: u32,
    pub vehicle: Option<String>,
    pub extras: Vec<String>,
    pub breakdown: Option<QuoteBreakdown>,
}

/// Classes serving the draft's route that seat its party. Empty until both
/// ends are chosen, and empty for an unserved pair.
pub fn available_vehicles(catalog: &Catalog, draft: &BookingDraft) -> Vec<VehicleOption> {
    let Some((origin, destination)) = draft.route() else {
        return Vec::new();
    };

    catalog
        .routes
        .vehicle_classes_for(origin, destination)
        .into_iter()
        .filter(|served| served.class.seats(draft.passengers))
        .map(|served| VehicleOption {
            icon: served.class.category.icon(),
            display_price: served.fare.times(draft.trip_type.legs()),
            id: served.class.id,
            label: served.class.label,
            category: served.class.category,
            max_passengers: served.class.max_passengers,
            fare: served.fare,
        })
        .collect()
}

pub fn quote_breakdown(catalog: &Catalog, draft: &BookingDraft) -> Option<QuoteBreakdown> {
    let (origin, destination) = draft.route()?;
    let vehicle_class = draft.vehicle_class.as_deref()?;
    catalog
        .pricing()
        .quote_breakdown(origin, destination, vehicle_class, draft.trip_type, &draft.selected_extras)
        .ok()
}

/// Running estimate. `None` until origin, destination and vehicle are known.
pub fn quote_preview(catalog: &Catalog, draft: &BookingDraft) -> Option<Money> {
    quote_breakdown(catalog, draft).map(|b| b.total)
}

pub fn summary(catalog: &Catalog, draft: &BookingDraft) -> TripSummary {
    let round_trip = draft.is_round_trip();
    TripSummary {
        trip_type: draft.trip_type,
        origin: draft.origin.clone(),
        destination: draft.destination.clone(),
        date: draft.date,
        time: draft.time,
        return_date: draft.return_date.filter(|_| round_trip),
        return_time: draft.return_time.filter(|_| round_trip),
        passengers: draft.passengers,
        vehicle: draft
            .vehicle_class
            .as_deref()
            .and_then(|id| catalog.routes.vehicle(id))
            .map(|v| v.label.clone()),
        extras: catalog.extras.names_of(&draft.selected_extras),
        breakdown: quote_breakdown(catalog, draft),
    }
}
