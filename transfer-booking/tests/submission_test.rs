use chrono::{NaiveDate, NaiveTime};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use transfer_booking::{BookingOrchestrator, BookingWizard, SubmissionConfig, SubmissionError, WizardStep};
use transfer_catalog::testing::{sample_catalog, AIRPORT};
use transfer_catalog::{
    AvailabilityLedger, Catalog, InMemoryLedger, LedgerError, ReservationToken, TripType, VehicleClass,
};
use transfer_core::{BookingDraft, BookingEventPublisher, Contact, CoreError, Identity, LegDirection, NoopPublisher};
use transfer_shared::models::events::{BookingConfirmedEvent, CapacityExhaustedEvent};
use transfer_shared::{Locale, Masked, Money};
use transfer_store::InMemoryBookingStore;

#[derive(Default)]
struct RecordingPublisher {
    confirmed: Mutex<Vec<BookingConfirmedEvent>>,
    exhausted: Mutex<Vec<CapacityExhaustedEvent>>,
}

#[async_trait]
impl BookingEventPublisher for RecordingPublisher {
    async fn publish_confirmed(&self, event: &BookingConfirmedEvent) -> Result<(), CoreError> {
        self.confirmed.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn publish_capacity_exhausted(&self, event: &CapacityExhaustedEvent) -> Result<(), CoreError> {
        self.exhausted.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct Harness {
    catalog: Catalog,
    ledger: Arc<InMemoryLedger>,
    store: Arc<InMemoryBookingStore>,
    events: Arc<RecordingPublisher>,
    orchestrator: BookingOrchestrator,
}

fn harness(config: SubmissionConfig) -> Harness {
    let catalog = sample_catalog();
    let ledger = Arc::new(InMemoryLedger::new());
    let store = Arc::new(InMemoryBookingStore::new());
    let events = Arc::new(RecordingPublisher::default());
    let orchestrator = BookingOrchestrator::new(
        catalog.clone(),
        ledger.clone(),
        store.clone(),
        events.clone(),
        config,
    );
    Harness { catalog, ledger, store, events, orchestrator }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn at(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn contact() -> Contact {
    Contact {
        email: Masked("ana@example.com".into()),
        name: "Ana".into(),
        ..Default::default()
    }
}

fn draft(time: NaiveTime) -> BookingDraft {
    let mut draft = BookingDraft::new();
    draft.origin = Some(AIRPORT.into());
    draft.destination = Some("Benidorm".into());
    draft.date = Some(day());
    draft.time = Some(time);
    draft.vehicle_class = Some("Standard".into());
    draft.contact = contact();
    draft
}

async fn used(h: &Harness, hour: u32, class: &str) -> u32 {
    h.ledger.used(day(), hour, class).await.unwrap()
}

#[tokio::test]
async fn test_one_way_booking_is_priced_and_persisted() {
    let h = harness(SubmissionConfig::default());
    let mut d = draft(at(14, 0));
    d.selected_extras.insert("baby-seat".into());

    let booking = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap();
    assert_eq!(booking.price, Money::from_euros(75));
    assert_eq!(booking.idempotency_key, d.id);
    assert_eq!(booking.legs.len(), 1);
    assert!(booking.record_id.is_some());

    assert_eq!(used(&h, 14, "Standard").await, 1);
    assert_eq!(h.ledger.pending_count(), 0);
    assert_eq!(h.store.len(), 1);

    let events = h.events.confirmed.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].total_cents, 7500);
    assert_eq!(events[0].pickup_hour, 14);
}

#[tokio::test]
async fn test_round_trip_reserves_both_slots() {
    let h = harness(SubmissionConfig::default());
    let mut d = draft(at(14, 0));
    d.trip_type = TripType::RoundTrip;
    d.return_date = day().succ_opt();
    d.return_time = Some(at(18, 30));

    let booking = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap();
    assert_eq!(booking.price, Money::from_euros(120));
    assert_eq!(booking.legs[1].direction, LegDirection::Return);
    assert_eq!(booking.legs[1].price, Money::from_euros(60));

    assert_eq!(used(&h, 14, "Standard").await, 1);
    let return_used = h.ledger.used(day().succ_opt().unwrap(), 18, "Standard").await.unwrap();
    assert_eq!(return_used, 1);
}

#[tokio::test]
async fn test_full_return_slot_releases_outbound() {
    let h = harness(SubmissionConfig::default());
    let mut van = draft(at(9, 0));
    van.vehicle_class = Some("Van".into());
    van.time = Some(at(20, 0));
    h.orchestrator.submit(&van, &Identity::Guest).await.unwrap();

    // Van has one vehicle per hour and 20:00 is now taken
    let mut d = draft(at(9, 0));
    d.vehicle_class = Some("Van".into());
    d.trip_type = TripType::RoundTrip;
    d.return_date = Some(day());
    d.return_time = Some(at(20, 15));

    let err = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Availability { hour: 20, .. }));
    assert_eq!(used(&h, 9, "Van").await, 0);
    assert_eq!(h.ledger.pending_count(), 0);
}

#[tokio::test]
async fn test_fourth_booking_in_full_hour_is_refused() {
    let h = harness(SubmissionConfig::default());

    for minute in [0, 10, 20] {
        h.orchestrator.submit(&draft(at(14, minute)), &Identity::Guest).await.unwrap();
    }

    let err = h.orchestrator.submit(&draft(at(14, 45)), &Identity::Guest).await.unwrap_err();
    match &err {
        SubmissionError::Availability { hour, vehicle_class, .. } => {
            assert_eq!(*hour, 14);
            assert_eq!(vehicle_class, "Standard");
        }
        other => panic!("expected availability error, got {:?}", other),
    }
    assert!(err.user_message(Locale::Es).contains("14:00"));
    assert_eq!(used(&h, 14, "Standard").await, 3);
    assert_eq!(h.store.len(), 3);
    assert_eq!(h.events.exhausted.lock().unwrap().len(), 1);

    // The next hour is untouched
    h.orchestrator.submit(&draft(at(15, 0)), &Identity::Guest).await.unwrap();
}

#[tokio::test]
async fn test_store_timeout_releases_capacity_and_retry_succeeds() {
    let h = harness(SubmissionConfig {
        persistence_timeout: Duration::from_millis(50),
        ledger_timeout: Duration::from_secs(1),
    });
    let d = draft(at(14, 0));

    h.store.set_delay(Duration::from_millis(500));
    let err = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Persistence(_)));
    assert!(err.is_retryable());
    assert_eq!(used(&h, 14, "Standard").await, 0);
    assert!(h.store.is_empty());

    h.store.set_delay(Duration::ZERO);
    let booking = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap();
    assert_eq!(booking.idempotency_key, d.id);
    assert_eq!(used(&h, 14, "Standard").await, 1);
}

#[tokio::test]
async fn test_store_failure_releases_capacity() {
    let h = harness(SubmissionConfig::default());
    h.store.fail_next(1);

    let err = h.orchestrator.submit(&draft(at(10, 0)), &Identity::Guest).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Persistence(_)));
    assert_eq!(used(&h, 10, "Standard").await, 0);
    assert!(h.events.confirmed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancelled_submission_gives_capacity_back() {
    let h = Arc::new(harness(SubmissionConfig::default()));
    h.store.set_delay(Duration::from_millis(500));

    let task = {
        let h = h.clone();
        tokio::spawn(async move { h.orchestrator.submit(&draft(at(11, 0)), &Identity::Guest).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(used(&h, 11, "Standard").await, 1);

    task.abort();
    let _ = task.await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(used(&h, 11, "Standard").await, 0);
}

#[tokio::test]
async fn test_missing_contact_has_no_side_effects() {
    let h = harness(SubmissionConfig::default());
    let mut d = draft(at(14, 0));
    d.contact.email = Masked(String::new());

    let err = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Validation { ref missing } if missing == &vec!["email"]));
    assert_eq!(used(&h, 14, "Standard").await, 0);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn test_class_not_on_route_is_refused_before_reserving() {
    let h = harness(SubmissionConfig::default());
    let mut d = draft(at(14, 0));
    d.destination = Some("Calp".into());
    d.vehicle_class = Some("Van".into());

    let err = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap_err();
    assert!(matches!(err, SubmissionError::UnknownRoute(_)));
    assert_eq!(used(&h, 14, "Van").await, 0);
}

#[tokio::test]
async fn test_user_identity_is_recorded() {
    let h = harness(SubmissionConfig::default());
    let identity = Identity::User {
        user_id: "user-42".into(),
        email: None,
    };
    let booking = h.orchestrator.submit(&draft(at(7, 0)), &identity).await.unwrap();
    assert_eq!(booking.user_id.as_deref(), Some("user-42"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_never_oversell() {
    let h = Arc::new(harness(SubmissionConfig::default()));

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let h = h.clone();
            tokio::spawn(async move {
                let mut d = draft(at(16, 0));
                d.vehicle_class = Some("Premium".into());
                h.orchestrator.submit(&d, &Identity::Guest).await
            })
        })
        .collect();

    let mut confirmed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(SubmissionError::Availability { .. }) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
    assert_eq!(confirmed, 2);
    assert_eq!(used(&h, 16, "Premium").await, 2);
}

#[tokio::test]
async fn test_availability_snapshot() {
    let h = harness(SubmissionConfig::default());
    h.orchestrator.submit(&draft(at(12, 0)), &Identity::Guest).await.unwrap();

    let status = h.orchestrator.availability(day(), at(12, 30), "Standard").await.unwrap();
    assert_eq!((status.used, status.capacity, status.available), (1, 3, true));
    assert_eq!(status.slot.hour_label(), "12:00");

    assert!(matches!(
        h.orchestrator.availability(day(), at(12, 0), "Limo").await,
        Err(SubmissionError::UnknownVehicleClass(_))
    ));
}

fn wizard_at_details(catalog: Catalog, time: NaiveTime) -> BookingWizard {
    let mut wizard = BookingWizard::new(catalog);
    wizard.set_origin(AIRPORT).unwrap();
    wizard.set_destination("Benidorm").unwrap();
    wizard.set_pickup(day(), time).unwrap();
    wizard.advance(WizardStep::SelectTrip).unwrap();
    wizard.choose_vehicle("Standard").unwrap();
    wizard.advance(WizardStep::SelectVehicle).unwrap();
    wizard.set_contact(contact()).unwrap();
    wizard
}

#[tokio::test]
async fn test_wizard_stale_double_click_reserves_once() {
    let h = harness(SubmissionConfig::default());
    let mut wizard = wizard_at_details(h.catalog.clone(), at(14, 0));

    // Second click on the vehicle step's button arrives late
    assert_eq!(wizard.advance(WizardStep::SelectVehicle), Ok(WizardStep::EnterDetails));

    let reference = wizard.submit(&h.orchestrator, &Identity::Guest).await.unwrap().reference();
    assert_eq!(wizard.step(), WizardStep::Confirmed);

    // Double-clicked submit
    let again = wizard.submit(&h.orchestrator, &Identity::Guest).await;
    assert!(matches!(again, Err(SubmissionError::NotReady(WizardStep::Confirmed))));

    assert_eq!(used(&h, 14, "Standard").await, 1);
    assert_eq!(h.store.len(), 1);
    assert_eq!(wizard.confirmed().map(|b| b.reference()), Some(reference));
    assert_eq!(wizard.summary().origin.as_deref(), Some(AIRPORT));

    wizard.reset();
    assert_eq!(wizard.step(), WizardStep::SelectTrip);
    assert!(wizard.confirmed().is_none());
}

#[tokio::test]
async fn test_wizard_failure_keeps_draft() {
    let h = harness(SubmissionConfig::default());
    h.store.fail_next(1);
    let mut wizard = wizard_at_details(h.catalog.clone(), at(14, 0));
    let draft_id = wizard.draft().id;

    assert!(wizard.submit(&h.orchestrator, &Identity::Guest).await.is_err());
    assert_eq!(wizard.step(), WizardStep::EnterDetails);
    assert_eq!(wizard.draft().id, draft_id);
    assert_eq!(wizard.draft().vehicle_class.as_deref(), Some("Standard"));

    let booking = wizard.submit(&h.orchestrator, &Identity::Guest).await.unwrap();
    assert_eq!(booking.idempotency_key, draft_id);
}

#[tokio::test]
async fn test_resubmitted_draft_returns_stored_booking() {
    let h = harness(SubmissionConfig::default());
    let d = draft(at(14, 0));

    let first = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap();
    for _ in 0..3 {
        let replay = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap();
        assert_eq!(replay.id, first.id);
        assert_eq!(replay.record_id, first.record_id);
    }
    assert_eq!(used(&h, 14, "Standard").await, 1);
    assert_eq!(h.store.len(), 1);
    assert_eq!(h.events.confirmed.lock().unwrap().len(), 1);

    // The hour still has room for two other customers
    h.orchestrator.submit(&draft(at(14, 20)), &Identity::Guest).await.unwrap();
    h.orchestrator.submit(&draft(at(14, 40)), &Identity::Guest).await.unwrap();

    // Replaying into a full hour still answers with the booking
    let replay = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap();
    assert_eq!(replay.id, first.id);
    assert_eq!(used(&h, 14, "Standard").await, 3);
}

#[tokio::test]
async fn test_racing_duplicates_hold_one_slot() {
    let h = harness(SubmissionConfig::default());
    // Both submissions reserve before either save lands
    h.store.set_delay(Duration::from_millis(100));
    let d = draft(at(9, 0));

    let (a, b) = tokio::join!(
        h.orchestrator.submit(&d, &Identity::Guest),
        h.orchestrator.submit(&d, &Identity::Guest)
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id, b.id);

    assert_eq!(used(&h, 9, "Standard").await, 1);
    assert_eq!(h.ledger.pending_count(), 0);
    assert_eq!(h.store.len(), 1);
}

/// Applies every reservation, then sits on the answer.
struct LaggingLedger {
    inner: InMemoryLedger,
    lag: Duration,
}

#[async_trait]
impl AvailabilityLedger for LaggingLedger {
    async fn check_available(&self, date: NaiveDate, hour: u32, vehicle: &VehicleClass) -> Result<bool, LedgerError> {
        self.inner.check_available(date, hour, vehicle).await
    }

    async fn reserve(&self, token: &ReservationToken, vehicle: &VehicleClass) -> Result<(), LedgerError> {
        self.inner.reserve(token, vehicle).await?;
        tokio::time::sleep(self.lag).await;
        Ok(())
    }

    async fn release(&self, token: &ReservationToken) -> Result<(), LedgerError> {
        self.inner.release(token).await
    }

    async fn commit(&self, token: &ReservationToken) -> Result<(), LedgerError> {
        self.inner.commit(token).await
    }

    async fn used(&self, date: NaiveDate, hour: u32, vehicle_class: &str) -> Result<u32, LedgerError> {
        self.inner.used(date, hour, vehicle_class).await
    }
}

#[tokio::test]
async fn test_reserve_timeout_gives_capacity_back() {
    let ledger = Arc::new(LaggingLedger {
        inner: InMemoryLedger::new(),
        lag: Duration::from_millis(500),
    });
    let store = Arc::new(InMemoryBookingStore::new());
    let orchestrator = BookingOrchestrator::new(
        sample_catalog(),
        ledger.clone(),
        store.clone(),
        Arc::new(NoopPublisher),
        SubmissionConfig {
            persistence_timeout: Duration::from_secs(1),
            ledger_timeout: Duration::from_millis(50),
        },
    );

    let err = orchestrator.submit(&draft(at(13, 0)), &Identity::Guest).await.unwrap_err();
    assert!(matches!(err, SubmissionError::LedgerUnavailable(_)));
    assert!(err.is_retryable());

    assert_eq!(ledger.inner.used(day(), 13, "Standard").await.unwrap(), 0);
    assert_eq!(ledger.inner.pending_count(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_return_before_outbound_is_refused_before_reserving() {
    let h = harness(SubmissionConfig::default());
    let mut d = draft(at(14, 0));
    d.trip_type = TripType::RoundTrip;
    d.return_date = Some(day());
    d.return_time = Some(at(9, 0));

    let err = h.orchestrator.submit(&d, &Identity::Guest).await.unwrap_err();
    assert!(matches!(err, SubmissionError::ReturnBeforeOutbound));
    assert_eq!(err.user_message(Locale::En), "The return must be after the outbound journey.");
    assert_eq!(used(&h, 14, "Standard").await, 0);
    assert_eq!(used(&h, 9, "Standard").await, 0);

    // Same instant as the outbound is not a return either
    d.return_time = Some(at(14, 0));
    assert!(matches!(
        h.orchestrator.submit(&d, &Identity::Guest).await,
        Err(SubmissionError::ReturnBeforeOutbound)
    ));
}
