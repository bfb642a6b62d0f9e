use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::booking::ConfirmedBooking;

/// Identifier the persistence store assigned to a booking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store rejected booking: {0}")]
    Rejected(String),

    #[error("Store query failed: {0}")]
    Query(String),
}

/// What a `save` did with the booking it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(RecordId),
    /// The idempotency key was already stored; nothing new was written.
    Existing(RecordId),
}

impl SaveOutcome {
    pub fn record_id(&self) -> &RecordId {
        match self {
            SaveOutcome::Created(id) | SaveOutcome::Existing(id) => id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, SaveOutcome::Created(_))
    }
}

/// Durable home of confirmed bookings.
///
/// `save` must be idempotent on `ConfirmedBooking::idempotency_key`: saving
/// a second booking with a known key returns `Existing` with the id of the
/// first one and stores nothing new. Callers retry after an unacknowledged
/// save.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn save(&self, booking: &ConfirmedBooking) -> Result<SaveOutcome, StoreError>;

    async fn find_by_key(&self, idempotency_key: Uuid) -> Result<Option<ConfirmedBooking>, StoreError>;

    async fn get(&self, record_id: &RecordId) -> Result<Option<ConfirmedBooking>, StoreError>;

    /// Bookings whose outbound pickup falls on the given date.
    async fn list_for_date(&self, date: chrono::NaiveDate) -> Result<Vec<ConfirmedBooking>, StoreError>;
}
