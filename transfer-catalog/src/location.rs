use serde::{Deserialize, Serialize};

/// What sort of place a catalog location is. Hubs are fixed meeting points,
/// everything else is a town where the customer gives a street address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LocationKind {
    Airport,
    Train,
    Port,
    Hotel,
    #[default]
    City,
}

impl LocationKind {
    pub fn is_hub(self) -> bool {
        !matches!(self, LocationKind::City)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    #[serde(default)]
    pub kind: LocationKind,
}

impl Location {
    pub fn new(name: impl Into<String>, kind: LocationKind) -> Self {
        Self { name: name.into(), kind }
    }

    pub fn is_hub(&self) -> bool {
        self.kind.is_hub()
    }
}
