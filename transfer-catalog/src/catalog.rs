use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::extras::{Extra, ExtrasCatalog};
use crate::location::Location;
use crate::pricing::PricingEngine;
use crate::route::{CatalogError, RouteCatalog, RouteOffer};
use crate::vehicle::VehicleClass;

/// Catalog contents as they appear in configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub vehicle_classes: Vec<VehicleClass>,
    #[serde(default)]
    pub routes: Vec<RouteOffer>,
    #[serde(default)]
    pub extras: Vec<Extra>,
}

impl CatalogData {
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let routes = RouteCatalog::new(self.locations, self.vehicle_classes, self.routes)?;
        let extras = ExtrasCatalog::new(self.extras)?;
        Ok(Catalog::new(routes, extras))
    }
}

/// Both lookup tables, shareable across request handlers.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub routes: Arc<RouteCatalog>,
    pub extras: Arc<ExtrasCatalog>,
}

impl Catalog {
    pub fn new(routes: RouteCatalog, extras: ExtrasCatalog) -> Self {
        Self {
            routes: Arc::new(routes),
            extras: Arc::new(extras),
        }
    }

    pub fn pricing(&self) -> PricingEngine {
        PricingEngine::new(self.routes.clone(), self.extras.clone())
    }
}
