use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Timelike};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::vehicle::VehicleClass;

/// One hour of one vehicle class on one day. Capacity is counted per slot,
/// so pickups at 14:05 and 14:50 compete for the same vehicles.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub hour: u32,
    pub vehicle_class: String,
}

impl SlotKey {
    pub fn new(date: NaiveDate, hour: u32, vehicle_class: impl Into<String>) -> Result<Self, LedgerError> {
        if hour > 23 {
            return Err(LedgerError::InvalidHour(hour));
        }
        Ok(Self {
            date,
            hour,
            vehicle_class: vehicle_class.into(),
        })
    }

    pub fn for_pickup(date: NaiveDate, time: NaiveTime, vehicle_class: impl Into<String>) -> Self {
        Self {
            date,
            hour: time.hour(),
            vehicle_class: vehicle_class.into(),
        }
    }

    /// `HH:00`, the form shown to customers.
    pub fn hour_label(&self) -> String {
        format!("{:02}:00", self.hour)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{}", self.date, self.hour, self.vehicle_class)
    }
}

/// Proof of a held unit of capacity. Hand it back through `release` if the
/// booking falls through, or `commit` once it is durable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReservationToken {
    pub id: Uuid,
    pub slot: SlotKey,
}

impl ReservationToken {
    pub fn new(slot: SlotKey) -> Self {
        Self { id: Uuid::new_v4(), slot }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("No {vehicle_class} left for {date} {hour:02}:00 (capacity {capacity})")]
    CapacityExhausted {
        date: NaiveDate,
        hour: u32,
        vehicle_class: String,
        capacity: u32,
    },

    #[error("Invalid hour: {0}")]
    InvalidHour(u32),

    #[error("Reservation {0} was already released or committed")]
    AlreadySettled(Uuid),

    #[error("Ledger backend failure: {0}")]
    Backend(String),
}

/// Admission control over vehicles per (date, hour, class).
///
/// `reserve` is the only operation that consumes capacity and must be a
/// single atomic check-and-increment per slot. `check_available` is an
/// advisory read for the screens and may be stale by the time of commit.
#[async_trait]
pub trait AvailabilityLedger: Send + Sync {
    async fn check_available(&self, date: NaiveDate, hour: u32, vehicle: &VehicleClass) -> Result<bool, LedgerError>;

    /// Hold one unit of `token.slot` for `vehicle`. The caller mints the
    /// token, so a reserve whose outcome never arrived can still be released.
    async fn reserve(&self, token: &ReservationToken, vehicle: &VehicleClass) -> Result<(), LedgerError>;

    /// Give back a pending reservation. Unknown, already released and
    /// committed tokens are ignored.
    async fn release(&self, token: &ReservationToken) -> Result<(), LedgerError>;

    /// Mark a reservation as belonging to a persisted booking. After this a
    /// `release` of the same token does nothing.
    async fn commit(&self, token: &ReservationToken) -> Result<(), LedgerError>;

    /// Reservations currently counted against the slot.
    async fn used(&self, date: NaiveDate, hour: u32, vehicle_class: &str) -> Result<u32, LedgerError>;
}

/// Process-local ledger. Each slot is an atomic counter updated with a
/// compare-and-swap loop, so concurrent reservations on one slot never
/// overshoot and readers never take a lock a writer waits on for long.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    slots: DashMap<SlotKey, Arc<AtomicU32>>,
    pending: DashMap<Uuid, SlotKey>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, key: &SlotKey) -> Arc<AtomicU32> {
        // Clone out of the map so the shard lock is dropped before the CAS loop.
        self.slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(AtomicU32::new(0)))
            .value()
            .clone()
    }

    /// Pending (reserved but neither committed nor released) reservations.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[async_trait]
impl AvailabilityLedger for InMemoryLedger {
    async fn check_available(&self, date: NaiveDate, hour: u32, vehicle: &VehicleClass) -> Result<bool, LedgerError> {
        let key = SlotKey::new(date, hour, vehicle.id.as_str())?;
        let used = self
            .slots
            .get(&key)
            .map(|c| c.load(Ordering::Acquire))
            .unwrap_or(0);
        Ok(used < vehicle.max_capacity_per_hour)
    }

    async fn reserve(&self, token: &ReservationToken, vehicle: &VehicleClass) -> Result<(), LedgerError> {
        let key = SlotKey::new(token.slot.date, token.slot.hour, vehicle.id.as_str())?;
        if self.pending.contains_key(&token.id) {
            return Ok(());
        }
        let capacity = vehicle.max_capacity_per_hour;
        let counter = self.counter(&key);

        let previous = counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < capacity).then_some(used + 1)
            })
            .map_err(|_| LedgerError::CapacityExhausted {
                date: key.date,
                hour: key.hour,
                vehicle_class: vehicle.id.clone(),
                capacity,
            })?;

        self.pending.insert(token.id, key);
        tracing::debug!(slot = %token.slot, used = previous + 1, capacity, "Reserved capacity");
        Ok(())
    }

    async fn release(&self, token: &ReservationToken) -> Result<(), LedgerError> {
        // Removing the pending entry is what makes a second release a no-op.
        let Some((_, key)) = self.pending.remove(&token.id) else {
            return Ok(());
        };

        if let Some(counter) = self.slots.get(&key).map(|c| Arc::clone(c.value())) {
            let _ = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| used.checked_sub(1));
        }
        tracing::debug!(slot = %key, token = %token.id, "Released capacity");
        Ok(())
    }

    async fn commit(&self, token: &ReservationToken) -> Result<(), LedgerError> {
        self.pending.remove(&token.id);
        Ok(())
    }

    async fn used(&self, date: NaiveDate, hour: u32, vehicle_class: &str) -> Result<u32, LedgerError> {
        let key = SlotKey::new(date, hour, vehicle_class)?;
        Ok(self.slots.get(&key).map(|c| c.load(Ordering::Acquire)).unwrap_or(0))
    }
}
