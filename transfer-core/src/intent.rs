use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Booking details a language model pulled out of a chat message. Every
/// field is optional and none of them is trusted: they only prefill the
/// wizard, the customer still confirms each step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingIntent {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub pickup_date: Option<String>,
    #[serde(default)]
    pub pickup_time: Option<String>,
    #[serde(default)]
    pub passenger: Option<String>,
    #[serde(default)]
    pub pax_count: Option<u32>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl BookingIntent {
    /// Pull the first JSON object out of a completion. Models like to wrap
    /// their answer in prose or markdown fences.
    pub fn from_completion(text: &str) -> Option<Self> {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        if end < start {
            return None;
        }
        match serde_json::from_str(&text[start..=end]) {
            Ok(intent) => Some(intent),
            Err(e) => {
                tracing::debug!("Completion did not contain a booking object: {}", e);
                None
            }
        }
    }

    /// Whether anything here describes a trip: origin, destination or a
    /// readable pickup date. Contact details alone do not.
    pub fn has_trip_fields(&self) -> bool {
        present(&self.origin).is_some() || present(&self.destination).is_some() || self.date().is_some()
    }

    pub fn origin(&self) -> Option<&str> {
        present(&self.origin)
    }

    pub fn destination(&self) -> Option<&str> {
        present(&self.destination)
    }

    pub fn passenger(&self) -> Option<&str> {
        present(&self.passenger)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        present(&self.pickup_date).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    pub fn time(&self) -> Option<NaiveTime> {
        let raw = present(&self.pickup_time)?;
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .ok()
    }
}

/// Best-effort structured extraction from free text, backed by an external
/// text-completion service. Implementations may return an all-empty intent.
#[async_trait]
pub trait IntentExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<BookingIntent, CoreError>;
}
