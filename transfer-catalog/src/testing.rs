//! Costa Blanca sample catalog used by tests across the workspace.

use transfer_shared::Money;

use crate::catalog::{Catalog, CatalogData};
use crate::extras::Extra;
use crate::location::{Location, LocationKind};
use crate::route::{RouteFare, RouteOffer};
use crate::vehicle::{VehicleCategory, VehicleClass};

pub const AIRPORT: &str = "Alicante Aeropuerto (ALC)";

fn fare(vehicle_class: &str, euros: i64) -> RouteFare {
    RouteFare {
        vehicle_class: vehicle_class.to_string(),
        price: Some(Money::from_euros(euros)),
    }
}

fn route(origin: &str, destination: &str, fares: Vec<RouteFare>) -> RouteOffer {
    RouteOffer {
        origin: origin.to_string(),
        destination: destination.to_string(),
        fares,
    }
}

pub fn sample_data() -> CatalogData {
    CatalogData {
        locations: vec![
            Location::new(AIRPORT, LocationKind::Airport),
            Location::new("Benidorm", LocationKind::City),
            Location::new("Hotel Palmeras", LocationKind::Hotel),
        ],
        vehicle_classes: vec![
            VehicleClass::new("Standard", "Standard", VehicleCategory::Standard, Money::from_euros(60), 4, 3),
            VehicleClass::new("Premium", "Premium", VehicleCategory::Premium, Money::from_euros(85), 4, 2),
            VehicleClass::new("Van", "Van", VehicleCategory::Van, Money::from_euros(95), 8, 1),
        ],
        routes: vec![
            route(AIRPORT, "Benidorm", vec![fare("Standard", 60), fare("Premium", 85), fare("Van", 95)]),
            route(AIRPORT, "Altea", vec![fare("Standard", 70), fare("Van", 110)]),
            route(AIRPORT, "Calp", vec![fare("Standard", 80)]),
            route("Benidorm", "Altea", vec![fare("Standard", 25)]),
            route("Hotel Palmeras", "Benidorm", vec![fare("Standard", 20)]),
        ],
        extras: vec![
            Extra { id: "baby-seat".into(), name: "Baby seat".into(), price: Money::from_euros(15), icon: Some("child_care".into()) },
            Extra { id: "extra-luggage".into(), name: "Extra luggage".into(), price: Money::from_euros(10), icon: Some("luggage".into()) },
            Extra { id: "meet-greet".into(), name: "Meet & greet".into(), price: Money::from_cents(2050), icon: None },
        ],
    }
}

pub fn sample_catalog() -> Catalog {
    match sample_data().build() {
        Ok(catalog) => catalog,
        Err(e) => panic!("sample catalog is invalid: {}", e),
    }
}
