use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use transfer_core::{BookingStore, ConfirmedBooking, RecordId, SaveOutcome, StoreError};
use uuid::Uuid;

/// Bookings held in process memory. Used when no database is configured
/// and in tests, where failures and slow acknowledgements can be injected.
#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    bookings: DashMap<RecordId, ConfirmedBooking>,
    by_key: DashMap<Uuid, RecordId>,
    failures: AtomicU32,
    delay_ms: AtomicU64,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` saves fail as if the store were down.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Hold every save for `delay` before it lands.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn save(&self, booking: &ConfirmedBooking) -> Result<SaveOutcome, StoreError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Unavailable("injected failure".into()));
        }

        match self.by_key.entry(booking.idempotency_key) {
            Entry::Occupied(existing) => {
                tracing::info!(key = %booking.idempotency_key, record_id = %existing.get(), "Duplicate save, returning existing record");
                Ok(SaveOutcome::Existing(existing.get().clone()))
            }
            Entry::Vacant(slot) => {
                let record_id = RecordId(format!("bk_{}", booking.id.simple()));
                self.bookings
                    .insert(record_id.clone(), booking.clone().with_record_id(record_id.clone()));
                slot.insert(record_id.clone());
                Ok(SaveOutcome::Created(record_id))
            }
        }
    }

    async fn find_by_key(&self, idempotency_key: Uuid) -> Result<Option<ConfirmedBooking>, StoreError> {
        let Some(record_id) = self.by_key.get(&idempotency_key).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        Ok(self.bookings.get(&record_id).map(|b| b.value().clone()))
    }

    async fn get(&self, record_id: &RecordId) -> Result<Option<ConfirmedBooking>, StoreError> {
        Ok(self.bookings.get(record_id).map(|b| b.value().clone()))
    }

    async fn list_for_date(&self, date: NaiveDate) -> Result<Vec<ConfirmedBooking>, StoreError> {
        let mut bookings: Vec<ConfirmedBooking> = self
            .bookings
            .iter()
            .filter(|b| b.outbound().is_some_and(|leg| leg.date == date))
            .map(|b| b.value().clone())
            .collect();
        bookings.sort_by_key(|b| b.outbound().map(|leg| leg.time));
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use transfer_core::{BookingDraft, LegDirection, TripLeg};
    use transfer_shared::Money;

    fn booking(hour: u32) -> ConfirmedBooking {
        let leg = TripLeg {
            direction: LegDirection::Outbound,
            origin: "Benidorm".into(),
            destination: "Altea".into(),
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            pickup_address: "Benidorm".into(),
            dropoff_address: "Altea".into(),
            flight_number: None,
            price: Money::from_euros(25),
        };
        ConfirmedBooking::new(BookingDraft::new(), vec![leg], Money::from_euros(25), None)
    }

    #[tokio::test]
    async fn test_save_is_idempotent_on_key() {
        let store = InMemoryBookingStore::new();
        let first = booking(10);
        // A retry builds a new booking from the same draft
        let mut retry = booking(10);
        retry.idempotency_key = first.idempotency_key;

        let a = store.save(&first).await.unwrap();
        let b = store.save(&retry).await.unwrap();
        assert!(a.is_created());
        assert_eq!(b, SaveOutcome::Existing(a.record_id().clone()));
        assert_eq!(store.len(), 1);

        let stored = store.get(a.record_id()).await.unwrap().unwrap();
        assert_eq!(stored.record_id.as_ref(), Some(a.record_id()));

        let by_key = store.find_by_key(first.idempotency_key).await.unwrap().unwrap();
        assert_eq!(by_key.id, first.id);
        assert!(store.find_by_key(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = InMemoryBookingStore::new();
        store.fail_next(1);
        assert!(matches!(store.save(&booking(9)).await, Err(StoreError::Unavailable(_))));
        assert!(store.save(&booking(9)).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_for_date_sorted_by_pickup() {
        let store = InMemoryBookingStore::new();
        store.save(&booking(15)).await.unwrap();
        store.save(&booking(8)).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let hours: Vec<_> = store
            .list_for_date(day)
            .await
            .unwrap()
            .iter()
            .filter_map(|b| b.outbound().map(|l| l.time))
            .collect();
        assert_eq!(hours, vec![NaiveTime::from_hms_opt(8, 0, 0).unwrap(), NaiveTime::from_hms_opt(15, 0, 0).unwrap()]);
        assert!(store.list_for_date(day.succ_opt().unwrap()).await.unwrap().is_empty());
    }
}
