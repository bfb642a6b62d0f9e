use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use transfer_shared::Money;

use crate::location::{Location, LocationKind};
use crate::vehicle::VehicleClass;

/// The fare of one vehicle class on a route. Without a price the class's
/// own base price applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFare {
    pub vehicle_class: String,
    #[serde(default)]
    pub price: Option<Money>,
}

/// A served pair of locations. Routes are symmetric: an entry for
/// A -> B also serves B -> A at the same fares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOffer {
    pub origin: String,
    pub destination: String,
    pub fares: Vec<RouteFare>,
}

impl RouteOffer {
    fn connects(&self, a: &str, b: &str) -> bool {
        (self.origin == a && self.destination == b) || (self.origin == b && self.destination == a)
    }
}

/// A vehicle class as offered on a specific route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServedVehicle {
    pub class: VehicleClass,
    pub fare: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("Invalid route {origin} -> {destination}: {reason}")]
    InvalidRoute {
        origin: String,
        destination: String,
        reason: String,
    },

    #[error("Route {route} references unknown vehicle class {vehicle_class}")]
    UnknownVehicleClass {
        route: String,
        vehicle_class: String,
    },

    #[error("Invalid vehicle class {id}: {reason}")]
    InvalidVehicleClass {
        id: String,
        reason: String,
    },

    #[error("Invalid extra {id}: {reason}")]
    InvalidExtra {
        id: String,
        reason: String,
    },

    #[error("Duplicate id in catalog: {0}")]
    DuplicateId(String),
}

/// Read-only lookup of locations, vehicle classes and the routes between
/// them. Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    locations: BTreeMap<String, Location>,
    vehicles: Vec<VehicleClass>,
    routes: Vec<RouteOffer>,
}

impl RouteCatalog {
    pub fn new(
        locations: Vec<Location>,
        vehicles: Vec<VehicleClass>,
        routes: Vec<RouteOffer>,
    ) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for vehicle in &vehicles {
            if let Some(reason) = vehicle.problems().into_iter().next() {
                return Err(CatalogError::InvalidVehicleClass {
                    id: vehicle.id.clone(),
                    reason,
                });
            }
            if !seen.insert(vehicle.id.clone()) {
                return Err(CatalogError::DuplicateId(vehicle.id.clone()));
            }
        }

        let mut by_name = BTreeMap::new();
        for location in locations {
            if by_name.contains_key(&location.name) {
                return Err(CatalogError::DuplicateId(location.name));
            }
            by_name.insert(location.name.clone(), location);
        }

        for route in &routes {
            let invalid = |reason: &str| CatalogError::InvalidRoute {
                origin: route.origin.clone(),
                destination: route.destination.clone(),
                reason: reason.to_string(),
            };

            if route.origin.trim().is_empty() || route.destination.trim().is_empty() {
                return Err(invalid("origin and destination are required"));
            }
            if route.origin == route.destination {
                return Err(invalid("origin and destination must differ"));
            }
            if route.fares.is_empty() {
                return Err(invalid("at least one vehicle class is required"));
            }
            for fare in &route.fares {
                if !seen.contains(&fare.vehicle_class) {
                    return Err(CatalogError::UnknownVehicleClass {
                        route: format!("{} -> {}", route.origin, route.destination),
                        vehicle_class: fare.vehicle_class.clone(),
                    });
                }
                if fare.price.is_some_and(|p| p < Money::ZERO) {
                    return Err(invalid("fares must not be negative"));
                }
            }

            // Locations only mentioned by a route are plain towns.
            for name in [&route.origin, &route.destination] {
                by_name
                    .entry(name.clone())
                    .or_insert_with(|| Location::new(name.clone(), LocationKind::City));
            }
        }

        Ok(Self {
            locations: by_name,
            vehicles,
            routes,
        })
    }

    /// Every location that appears on a route, sorted and de-duplicated.
    pub fn list_origins(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .routes
            .iter()
            .flat_map(|r| [r.origin.as_str(), r.destination.as_str()])
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Locations reachable from `origin` in either direction. Empty until an
    /// origin is chosen.
    pub fn list_destinations(&self, origin: &str) -> Vec<String> {
        if origin.is_empty() {
            return Vec::new();
        }

        let names: BTreeSet<&str> = self
            .routes
            .iter()
            .filter_map(|r| {
                if r.origin == origin {
                    Some(r.destination.as_str())
                } else if r.destination == origin {
                    Some(r.origin.as_str())
                } else {
                    None
                }
            })
            .filter(|d| *d != origin)
            .collect();
        names.into_iter().map(str::to_string).collect()
    }

    /// Vehicle classes serving the pair, cheapest fare per class, in the
    /// order the catalog lists them on its routes. An unserved pair yields
    /// an empty list.
    pub fn vehicle_classes_for(&self, origin: &str, destination: &str) -> Vec<ServedVehicle> {
        let mut order: Vec<&str> = Vec::new();
        let mut cheapest: HashMap<&str, Money> = HashMap::new();

        for route in self.routes.iter().filter(|r| r.connects(origin, destination)) {
            for fare in &route.fares {
                let Some(class) = self.vehicle(&fare.vehicle_class) else {
                    continue;
                };
                let price = fare.price.unwrap_or(class.base_price);
                match cheapest.get_mut(class.id.as_str()) {
                    Some(existing) if *existing <= price => {}
                    Some(existing) => *existing = price,
                    None => {
                        order.push(class.id.as_str());
                        cheapest.insert(class.id.as_str(), price);
                    }
                }
            }
        }

        order
            .into_iter()
            .filter_map(|id| {
                let class = self.vehicle(id)?.clone();
                let fare = *cheapest.get(id)?;
                Some(ServedVehicle { class, fare })
            })
            .collect()
    }

    /// Fare of a class on a route, if the route carries that class.
    pub fn fare_for(&self, origin: &str, destination: &str, vehicle_class: &str) -> Option<Money> {
        self.vehicle_classes_for(origin, destination)
            .into_iter()
            .find(|v| v.class.id == vehicle_class)
            .map(|v| v.fare)
    }

    pub fn vehicle(&self, id: &str) -> Option<&VehicleClass> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn vehicles(&self) -> &[VehicleClass] {
        &self.vehicles
    }

    pub fn location(&self, name: &str) -> Option<&Location> {
        self.locations.get(name)
    }

    /// Find a location by name ignoring case and surrounding whitespace.
    pub fn resolve_location(&self, name: &str) -> Option<&Location> {
        let wanted = name.trim().to_lowercase();
        self.locations.values().find(|l| l.name.to_lowercase() == wanted)
    }

    /// The largest party any vehicle class can carry.
    pub fn max_passengers(&self) -> u32 {
        self.vehicles.iter().map(|v| v.max_passengers).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_catalog, AIRPORT};
    use crate::vehicle::VehicleCategory;

    #[test]
    fn test_list_origins_sorted_and_unique() {
        let catalog = sample_catalog();
        let origins = catalog.routes.list_origins();

        let mut sorted = origins.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(origins, sorted);
        assert!(origins.contains(&AIRPORT.to_string()));
        assert!(origins.contains(&"Benidorm".to_string()));
    }

    #[test]
    fn test_destinations_are_bidirectional() {
        let catalog = sample_catalog();

        let from_airport = catalog.routes.list_destinations(AIRPORT);
        assert!(from_airport.contains(&"Benidorm".to_string()));
        assert!(!from_airport.contains(&AIRPORT.to_string()));

        // Benidorm -> Airport is served by the Airport -> Benidorm entry
        let from_benidorm = catalog.routes.list_destinations("Benidorm");
        assert!(from_benidorm.contains(&AIRPORT.to_string()));

        assert!(catalog.routes.list_destinations("").is_empty());
    }

    #[test]
    fn test_vehicle_classes_for_route() {
        let catalog = sample_catalog();
        let served = catalog.routes.vehicle_classes_for(AIRPORT, "Benidorm");
        let ids: Vec<&str> = served.iter().map(|v| v.class.id.as_str()).collect();
        assert_eq!(ids, vec!["Standard", "Premium", "Van"]);
        assert_eq!(served[0].fare, Money::from_euros(60));

        let reverse = catalog.routes.vehicle_classes_for("Benidorm", AIRPORT);
        assert_eq!(reverse.len(), 3);
    }

    #[test]
    fn test_unserved_pair_is_empty_not_error() {
        let catalog = sample_catalog();
        assert!(catalog.routes.vehicle_classes_for("Calp", "Altea").is_empty());
        assert!(catalog.routes.vehicle_classes_for("Nowhere", "Benidorm").is_empty());
    }

    #[test]
    fn test_cheapest_fare_wins_on_duplicate_routes() {
        let standard = VehicleClass::new("Standard", "Standard", VehicleCategory::Standard, Money::from_euros(50), 4, 3);
        let routes = vec![
            RouteOffer {
                origin: "A".into(),
                destination: "B".into(),
                fares: vec![RouteFare { vehicle_class: "Standard".into(), price: Some(Money::from_euros(70)) }],
            },
            RouteOffer {
                origin: "B".into(),
                destination: "A".into(),
                fares: vec![RouteFare { vehicle_class: "Standard".into(), price: None }],
            },
        ];
        let catalog = RouteCatalog::new(vec![], vec![standard], routes).unwrap();
        assert_eq!(catalog.fare_for("A", "B", "Standard"), Some(Money::from_euros(50)));
    }

    #[test]
    fn test_rejects_self_route() {
        let standard = VehicleClass::new("Standard", "Standard", VehicleCategory::Standard, Money::from_euros(50), 4, 3);
        let routes = vec![RouteOffer {
            origin: "A".into(),
            destination: "A".into(),
            fares: vec![RouteFare { vehicle_class: "Standard".into(), price: None }],
        }];
        let result = RouteCatalog::new(vec![], vec![standard], routes);
        assert!(matches!(result, Err(CatalogError::InvalidRoute { .. })));
    }

    #[test]
    fn test_rejects_unknown_vehicle_class() {
        let routes = vec![RouteOffer {
            origin: "A".into(),
            destination: "B".into(),
            fares: vec![RouteFare { vehicle_class: "Limo".into(), price: None }],
        }];
        let result = RouteCatalog::new(vec![], vec![], routes);
        assert!(matches!(result, Err(CatalogError::UnknownVehicleClass { .. })));
    }

    #[test]
    fn test_route_only_locations_default_to_city() {
        let catalog = sample_catalog();
        assert_eq!(catalog.routes.location("Altea").map(|l| l.kind), Some(LocationKind::City));
        assert_eq!(catalog.routes.location(AIRPORT).map(|l| l.kind), Some(LocationKind::Airport));
        assert_eq!(
            catalog.routes.resolve_location("  alicante aeropuerto (alc) ").map(|l| l.name.as_str()),
            Some(AIRPORT)
        );
    }
}
