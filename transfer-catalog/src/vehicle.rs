use serde::{Deserialize, Serialize};
use transfer_shared::Money;

/// Vehicle categories offered by the fleet.
///
/// Screens and business rules branch on this tag, never on the spelling of
/// a vehicle class id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleCategory {
    #[default]
    Standard,
    Premium,
    Luxury,
    Van,
    Bus,
}

impl VehicleCategory {
    /// Icon name used by the booking screens.
    pub fn icon(self) -> &'static str {
        match self {
            VehicleCategory::Standard => "local_taxi",
            VehicleCategory::Premium => "directions_car",
            VehicleCategory::Luxury => "star",
            VehicleCategory::Van => "airport_shuttle",
            VehicleCategory::Bus => "directions_bus",
        }
    }
}

/// A bookable class of vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleClass {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub category: VehicleCategory,
    /// Default fare when a route does not set its own.
    pub base_price: Money,
    pub max_passengers: u32,
    pub max_capacity_per_hour: u32,
}

impl VehicleClass {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        category: VehicleCategory,
        base_price: Money,
        max_passengers: u32,
        max_capacity_per_hour: u32,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            category,
            base_price,
            max_passengers,
            max_capacity_per_hour,
        }
    }

    pub fn seats(&self, passengers: u32) -> bool {
        passengers >= 1 && passengers <= self.max_passengers
    }

    /// Reasons this class cannot be loaded into a catalog, if any.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.id.trim().is_empty() {
            problems.push("id is empty".to_string());
        }
        if self.max_passengers < 1 {
            problems.push("max_passengers must be at least 1".to_string());
        }
        if self.max_capacity_per_hour < 1 {
            problems.push("max_capacity_per_hour must be at least 1".to_string());
        }
        if self.base_price < Money::ZERO {
            problems.push("base_price must not be negative".to_string());
        }
        problems
    }
}
