use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use transfer_shared::Money;

use crate::route::CatalogError;

/// An optional add-on with a flat price (child seat, extra luggage...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extra {
    pub id: String,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtrasCatalog {
    extras: Vec<Extra>,
}

impl ExtrasCatalog {
    pub fn new(extras: Vec<Extra>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for extra in &extras {
            if extra.price < Money::ZERO {
                return Err(CatalogError::InvalidExtra {
                    id: extra.id.clone(),
                    reason: format!("negative price {}", extra.price),
                });
            }
            if !seen.insert(extra.id.as_str()) {
                return Err(CatalogError::DuplicateId(extra.id.clone()));
            }
        }
        Ok(Self { extras })
    }

    pub fn list_extras(&self) -> &[Extra] {
        &self.extras
    }

    pub fn extra(&self, id: &str) -> Option<&Extra> {
        self.extras.iter().find(|e| e.id == id)
    }

    /// Names of the selected extras in catalog order; unknown ids are skipped.
    pub fn names_of<'a, I>(&self, ids: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let selected: BTreeSet<&str> = ids.into_iter().map(String::as_str).collect();
        self.extras
            .iter()
            .filter(|e| selected.contains(e.id.as_str()))
            .map(|e| e.name.clone())
            .collect()
    }
}
