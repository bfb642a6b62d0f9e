use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use transfer_shared::Money;

use crate::extras::ExtrasCatalog;
use crate::route::RouteCatalog;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripType {
    #[default]
    OneWay,
    RoundTrip,
}

impl TripType {
    /// Number of legs priced at the route fare.
    pub fn legs(self) -> i64 {
        match self {
            TripType::OneWay => 1,
            TripType::RoundTrip => 2,
        }
    }
}

/// How a quote was put together, for the trip summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuoteBreakdown {
    pub fare: Money,
    pub legs: i64,
    pub extras_total: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("No fare for {vehicle_class} on {origin} -> {destination}")]
    UnknownRoute {
        origin: String,
        destination: String,
        vehicle_class: String,
    },

    #[error("Unknown extra: {0}")]
    UnknownExtra(String),
}

/// Deterministic fare calculation.
///
/// `total = fare(route, class) * legs(trip type) + sum(extras)`. No state is
/// touched, so the screens may call it on every keystroke.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    routes: Arc<RouteCatalog>,
    extras: Arc<ExtrasCatalog>,
}

impl PricingEngine {
    pub fn new(routes: Arc<RouteCatalog>, extras: Arc<ExtrasCatalog>) -> Self {
        Self { routes, extras }
    }

    pub fn quote(
        &self,
        origin: &str,
        destination: &str,
        vehicle_class: &str,
        trip_type: TripType,
        extras: &BTreeSet<String>,
    ) -> Result<Money, PricingError> {
        self.quote_breakdown(origin, destination, vehicle_class, trip_type, extras)
            .map(|b| b.total)
    }

    pub fn quote_breakdown(
        &self,
        origin: &str,
        destination: &str,
        vehicle_class: &str,
        trip_type: TripType,
        extras: &BTreeSet<String>,
    ) -> Result<QuoteBreakdown, PricingError> {
        let fare = self
            .routes
            .fare_for(origin, destination, vehicle_class)
            .ok_or_else(|| {
                // Callers pick classes from vehicle_classes_for, so this is a bug upstream.
                tracing::error!(
                    origin,
                    destination,
                    vehicle_class,
                    "Quote requested for a vehicle class the route does not carry"
                );
                PricingError::UnknownRoute {
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                    vehicle_class: vehicle_class.to_string(),
                }
            })?;

        let extras_total = self.extras_total(extras)?;
        let legs = trip_type.legs();

        Ok(QuoteBreakdown {
            fare,
            legs,
            extras_total,
            total: fare.times(legs) + extras_total,
        })
    }

    pub fn extras_total(&self, ids: &BTreeSet<String>) -> Result<Money, PricingError> {
        ids.iter()
            .map(|id| {
                self.extras
                    .extra(id)
                    .map(|e| e.price)
                    .ok_or_else(|| PricingError::UnknownExtra(id.clone()))
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_catalog, AIRPORT};

    fn no_extras() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn test_one_way_standard() {
        let pricing = sample_catalog().pricing();
        let price = pricing.quote(AIRPORT, "Benidorm", "Standard", TripType::OneWay, &no_extras()).unwrap();
        assert_eq!(price, Money::from_euros(60));
        assert_eq!(price.to_string(), "60.00€");
    }

    #[test]
    fn test_round_trip_doubles_fare() {
        let pricing = sample_catalog().pricing();
        let price = pricing.quote(AIRPORT, "Benidorm", "Standard", TripType::RoundTrip, &no_extras()).unwrap();
        assert_eq!(price, Money::from_euros(120));
    }

    #[test]
    fn test_extras_are_added() {
        let pricing = sample_catalog().pricing();
        let extras: BTreeSet<String> = ["baby-seat".to_string()].into();
        let price = pricing.quote(AIRPORT, "Benidorm", "Standard", TripType::OneWay, &extras).unwrap();
        assert_eq!(price, Money::from_euros(75));
    }

    #[test]
    fn test_round_trip_relation_holds_for_every_route() {
        let catalog = sample_catalog();
        let pricing = catalog.pricing();
        let extras: BTreeSet<String> = ["baby-seat".to_string(), "extra-luggage".to_string()].into();
        let extras_total = pricing.extras_total(&extras).unwrap();

        for origin in catalog.routes.list_origins() {
            for destination in catalog.routes.list_destinations(&origin) {
                for served in catalog.routes.vehicle_classes_for(&origin, &destination) {
                    let one_way = pricing
                        .quote(&origin, &destination, &served.class.id, TripType::OneWay, &no_extras())
                        .unwrap();
                    let round = pricing
                        .quote(&origin, &destination, &served.class.id, TripType::RoundTrip, &extras)
                        .unwrap();
                    assert_eq!(round, one_way.times(2) + extras_total);
                }
            }
        }
    }

    #[test]
    fn test_quote_is_deterministic() {
        let pricing = sample_catalog().pricing();
        let extras: BTreeSet<String> = ["meet-greet".to_string()].into();
        let first = pricing.quote(AIRPORT, "Altea", "Van", TripType::RoundTrip, &extras).unwrap();
        let second = pricing.quote(AIRPORT, "Altea", "Van", TripType::RoundTrip, &extras).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_route() {
        let pricing = sample_catalog().pricing();
        let result = pricing.quote(AIRPORT, "Calp", "Van", TripType::OneWay, &no_extras());
        assert!(matches!(result, Err(PricingError::UnknownRoute { .. })));
    }

    #[test]
    fn test_unknown_extra() {
        let pricing = sample_catalog().pricing();
        let extras: BTreeSet<String> = ["helicopter".to_string()].into();
        let result = pricing.quote(AIRPORT, "Benidorm", "Standard", TripType::OneWay, &extras);
        assert_eq!(result, Err(PricingError::UnknownExtra("helicopter".into())));
    }
}
