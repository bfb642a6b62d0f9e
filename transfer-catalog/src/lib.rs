pub mod location;
pub mod vehicle;
pub mod route;
pub mod extras;
pub mod catalog;
pub mod pricing;
pub mod availability;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use location::{Location, LocationKind};
pub use vehicle::{VehicleCategory, VehicleClass};
pub use route::{CatalogError, RouteCatalog, RouteFare, RouteOffer, ServedVehicle};
pub use extras::{Extra, ExtrasCatalog};
pub use catalog::{Catalog, CatalogData};
pub use pricing::{PricingEngine, PricingError, QuoteBreakdown, TripType};
pub use availability::{AvailabilityLedger, InMemoryLedger, LedgerError, ReservationToken, SlotKey};
