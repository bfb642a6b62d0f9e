use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use transfer_catalog::TripType;
use transfer_shared::{Masked, Money};
use uuid::Uuid;

use crate::repository::RecordId;

/// Who to contact about the transfer and where to pick them up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub email: Masked<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Masked<String>,
    #[serde(default)]
    pub flight_number: Option<String>,
    #[serde(default)]
    pub pickup_address: Option<String>,
}

impl Contact {
    /// Required fields that are blank, in form order.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.email.expose().trim().is_empty() {
            missing.push("email");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        missing
    }

    pub fn pickup_address(&self) -> Option<&str> {
        self.pickup_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

/// The booking being assembled by one customer session. Mutated field by
/// field as the wizard progresses; discarded after submission or reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDraft {
    /// Fresh per draft; doubles as the idempotency key of the booking.
    pub id: Uuid,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_time: Option<NaiveTime>,
    #[serde(default = "one")]
    pub passengers: u32,
    #[serde(default)]
    pub vehicle_class: Option<String>,
    #[serde(default)]
    pub selected_extras: BTreeSet<String>,
    #[serde(default)]
    pub contact: Contact,
    #[serde(default)]
    pub notes: String,
}

fn one() -> u32 {
    1
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingDraft {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_type: TripType::OneWay,
            origin: None,
            destination: None,
            date: None,
            time: None,
            return_date: None,
            return_time: None,
            passengers: 1,
            vehicle_class: None,
            selected_extras: BTreeSet::new(),
            contact: Contact::default(),
            notes: String::new(),
        }
    }

    pub fn is_round_trip(&self) -> bool {
        self.trip_type == TripType::RoundTrip
    }

    pub fn route(&self) -> Option<(&str, &str)> {
        match (self.origin.as_deref(), self.destination.as_deref()) {
            (Some(o), Some(d)) if !o.is_empty() && !d.is_empty() => Some((o, d)),
            _ => None,
        }
    }

    /// Trip fields still needed before a vehicle can be chosen.
    pub fn missing_trip_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.origin.as_deref().map_or(true, str::is_empty) {
            missing.push("origin");
        }
        if self.destination.as_deref().map_or(true, str::is_empty) {
            missing.push("destination");
        }
        if self.date.is_none() {
            missing.push("date");
        }
        if self.time.is_none() {
            missing.push("time");
        }
        if self.is_round_trip() {
            if self.return_date.is_none() {
                missing.push("return_date");
            }
            if self.return_time.is_none() {
                missing.push("return_time");
            }
        }
        missing
    }

    pub fn route_label(&self) -> String {
        format!(
            "{} - {}",
            self.origin.as_deref().unwrap_or("?"),
            self.destination.as_deref().unwrap_or("?")
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegDirection {
    Outbound,
    Return,
}

/// One drive of a booking. A round trip is two legs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripLeg {
    pub direction: LegDirection,
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub pickup_address: String,
    pub dropoff_address: String,
    pub flight_number: Option<String>,
    pub price: Money,
}

/// Immutable record of a committed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedBooking {
    pub id: Uuid,
    pub idempotency_key: Uuid,
    #[serde(default)]
    pub record_id: Option<RecordId>,
    pub draft: BookingDraft,
    pub legs: Vec<TripLeg>,
    pub price: Money,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ConfirmedBooking {
    pub fn new(draft: BookingDraft, legs: Vec<TripLeg>, price: Money, user_id: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            idempotency_key: draft.id,
            record_id: None,
            draft,
            legs,
            price,
            user_id,
            created_at: Utc::now(),
        }
    }

    pub fn with_record_id(mut self, record_id: RecordId) -> Self {
        self.record_id = Some(record_id);
        self
    }

    /// Short customer-facing reference, e.g. `3F2A9C1B`.
    pub fn reference(&self) -> String {
        self.id.simple().to_string()[..8].to_uppercase()
    }

    pub fn outbound(&self) -> Option<&TripLeg> {
        self.legs.iter().find(|l| l.direction == LegDirection::Outbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_draft_is_empty() {
        let draft = BookingDraft::new();
        assert_eq!(draft.passengers, 1);
        assert_eq!(draft.trip_type, TripType::OneWay);
        assert_eq!(draft.missing_trip_fields(), vec!["origin", "destination", "date", "time"]);
        assert!(draft.route().is_none());
    }

    #[test]
    fn test_round_trip_needs_return_fields() {
        let mut draft = BookingDraft::new();
        draft.trip_type = TripType::RoundTrip;
        draft.origin = Some("Benidorm".into());
        draft.destination = Some("Altea".into());
        draft.date = NaiveDate::from_ymd_opt(2024, 6, 1);
        draft.time = NaiveTime::from_hms_opt(14, 0, 0);
        assert_eq!(draft.missing_trip_fields(), vec!["return_date", "return_time"]);
    }

    #[test]
    fn test_contact_required_fields() {
        let mut contact = Contact::default();
        assert_eq!(contact.missing_required(), vec!["email", "name"]);

        contact.email = Masked("guest@example.com".into());
        contact.name = "   ".into();
        assert_eq!(contact.missing_required(), vec!["name"]);
    }

    #[test]
    fn test_draft_deserializes_with_defaults() {
        let json = r#"{
            "id": "7b0b3c2e-4a7e-4a53-9c52-0d1c0f6d2a11",
            "origin": "Benidorm",
            "destination": "Altea",
            "date": "2024-06-01",
            "time": "14:05:00"
        }"#;
        let draft: BookingDraft = serde_json::from_str(json).expect("Failed to deserialize");
        assert_eq!(draft.passengers, 1);
        assert!(draft.selected_extras.is_empty());
        assert_eq!(draft.route(), Some(("Benidorm", "Altea")));
    }

    #[test]
    fn test_confirmed_booking_uses_draft_id_as_key() {
        let draft = BookingDraft::new();
        let key = draft.id;
        let booking = ConfirmedBooking::new(draft, vec![], Money::from_euros(60), None);
        assert_eq!(booking.idempotency_key, key);
        assert_eq!(booking.reference().len(), 8);
    }
}
