use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use transfer_catalog::{
    AvailabilityLedger, Catalog, LedgerError, PricingEngine, PricingError, ReservationToken, SlotKey, VehicleClass,
};
use transfer_core::{BookingDraft, BookingEventPublisher, BookingStore, ConfirmedBooking, Identity, RecordId, SaveOutcome};
use transfer_shared::models::events::{BookingConfirmedEvent, CapacityExhaustedEvent};
use transfer_shared::Locale;

use crate::legs::build_legs;
use crate::messages::{BookingMessages, MessageKey};
use crate::wizard::WizardStep;

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Missing required fields: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error("No {vehicle_class} left for {date} {hour:02}:00")]
    Availability {
        date: NaiveDate,
        hour: u32,
        vehicle_class: String,
    },

    #[error("Return pickup is not after the outbound pickup")]
    ReturnBeforeOutbound,

    #[error("Pricing failed: {0}")]
    UnknownRoute(#[from] PricingError),

    #[error("Unknown vehicle class: {0}")]
    UnknownVehicleClass(String),

    #[error("Booking could not be saved: {0}")]
    Persistence(String),

    #[error("Availability ledger unavailable: {0}")]
    LedgerUnavailable(String),

    #[error("Nothing to submit from step {0:?}")]
    NotReady(WizardStep),
}

impl SubmissionError {
    /// Message for the customer. Only capacity and form problems are
    /// specific; everything else reads as a generic failure.
    pub fn user_message(&self, locale: Locale) -> String {
        match self {
            SubmissionError::Validation { missing } => {
                let key = if missing.iter().all(|f| matches!(*f, "email" | "name")) {
                    MessageKey::ContactRequired
                } else if missing.contains(&"vehicle_class") {
                    MessageKey::VehicleRequired
                } else if missing.contains(&"passengers") {
                    MessageKey::InvalidPassengers
                } else {
                    MessageKey::IncompleteTrip
                };
                BookingMessages::text(key, locale)
            }
            SubmissionError::ReturnBeforeOutbound => BookingMessages::text(MessageKey::ReturnBeforeOutbound, locale),
            SubmissionError::Availability { hour, .. } => {
                BookingMessages::availability_exhausted(&format!("{:02}:00", hour), locale)
            }
            _ => BookingMessages::text(MessageKey::GenericFailure, locale),
        }
    }

    /// Whether resubmitting the same draft later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubmissionError::Persistence(_) | SubmissionError::LedgerUnavailable(_)
        )
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SubmissionConfig {
    pub persistence_timeout: Duration,
    pub ledger_timeout: Duration,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            persistence_timeout: Duration::from_secs(5),
            ledger_timeout: Duration::from_secs(2),
        }
    }
}

/// Occupancy of one slot as the availability screen shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotStatus {
    pub slot: SlotKey,
    pub used: u32,
    pub capacity: u32,
    pub available: bool,
}

/// Capacity held for a submission in flight. Dropping it without `commit`
/// hands the tokens back, so a cancelled submission cannot strand capacity.
struct HeldReservations {
    ledger: Arc<dyn AvailabilityLedger>,
    tokens: Vec<ReservationToken>,
    ledger_timeout: Duration,
}

impl HeldReservations {
    fn new(ledger: Arc<dyn AvailabilityLedger>, ledger_timeout: Duration) -> Self {
        Self {
            ledger,
            tokens: Vec::new(),
            ledger_timeout,
        }
    }

    fn push(&mut self, token: ReservationToken) {
        self.tokens.push(token);
    }

    /// Stop tracking a token the ledger refused.
    fn forget(&mut self, token: &ReservationToken) {
        self.tokens.retain(|t| t.id != token.id);
    }

    async fn release(mut self) {
        let tokens = std::mem::take(&mut self.tokens);
        release_tokens(self.ledger.clone(), tokens, self.ledger_timeout).await;
    }

    async fn commit(mut self) {
        for token in std::mem::take(&mut self.tokens) {
            match timeout(self.ledger_timeout, self.ledger.commit(&token)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(slot = %token.slot, "Failed to commit reservation: {}", e),
                Err(_) => tracing::warn!(slot = %token.slot, "Timed out committing reservation"),
            }
        }
    }
}

impl Drop for HeldReservations {
    fn drop(&mut self) {
        if self.tokens.is_empty() {
            return;
        }
        let tokens = std::mem::take(&mut self.tokens);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let ledger = self.ledger.clone();
                let ledger_timeout = self.ledger_timeout;
                handle.spawn(release_tokens(ledger, tokens, ledger_timeout));
            }
            Err(_) => {
                for token in tokens {
                    tracing::error!(slot = %token.slot, token = %token.id, "Reservation dropped outside a runtime, capacity not released");
                }
            }
        }
    }
}

async fn release_tokens(ledger: Arc<dyn AvailabilityLedger>, tokens: Vec<ReservationToken>, ledger_timeout: Duration) {
    for token in tokens {
        match timeout(ledger_timeout, ledger.release(&token)).await {
            Ok(Ok(())) => tracing::debug!(slot = %token.slot, "Released reservation"),
            Ok(Err(e)) => tracing::error!(slot = %token.slot, token = %token.id, "Failed to release reservation: {}", e),
            Err(_) => tracing::error!(slot = %token.slot, token = %token.id, "Timed out releasing reservation"),
        }
    }
}

/// Turns a finished draft into a confirmed booking.
///
/// Capacity is reserved before anything is written and handed back on every
/// path that does not end in a persisted booking.
pub struct BookingOrchestrator {
    catalog: Catalog,
    pricing: PricingEngine,
    ledger: Arc<dyn AvailabilityLedger>,
    store: Arc<dyn BookingStore>,
    events: Arc<dyn BookingEventPublisher>,
    config: SubmissionConfig,
}

impl BookingOrchestrator {
    pub fn new(
        catalog: Catalog,
        ledger: Arc<dyn AvailabilityLedger>,
        store: Arc<dyn BookingStore>,
        events: Arc<dyn BookingEventPublisher>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            pricing: catalog.pricing(),
            catalog,
            ledger,
            store,
            events,
            config,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Advisory occupancy for the given pickup. Never reserves.
    pub async fn availability(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        vehicle_class: &str,
    ) -> Result<SlotStatus, SubmissionError> {
        let vehicle = self
            .catalog
            .routes
            .vehicle(vehicle_class)
            .ok_or_else(|| SubmissionError::UnknownVehicleClass(vehicle_class.to_string()))?;
        let slot = SlotKey::for_pickup(date, time, vehicle.id.as_str());

        let used = timeout(self.config.ledger_timeout, self.ledger.used(date, slot.hour, &vehicle.id))
            .await
            .map_err(|_| SubmissionError::LedgerUnavailable("timed out".into()))?
            .map_err(|e| SubmissionError::LedgerUnavailable(e.to_string()))?;
        let available = timeout(self.config.ledger_timeout, self.ledger.check_available(date, slot.hour, vehicle))
            .await
            .map_err(|_| SubmissionError::LedgerUnavailable("timed out".into()))?
            .map_err(|e| SubmissionError::LedgerUnavailable(e.to_string()))?;

        Ok(SlotStatus {
            slot,
            used,
            capacity: vehicle.max_capacity_per_hour,
            available,
        })
    }

    pub async fn submit(&self, draft: &BookingDraft, identity: &Identity) -> Result<ConfirmedBooking, SubmissionError> {
        // 1. Validate. Nothing has been touched yet.
        let missing = draft.contact.missing_required();
        if !missing.is_empty() {
            return Err(SubmissionError::Validation { missing });
        }
        let missing = draft.missing_trip_fields();
        if !missing.is_empty() {
            return Err(SubmissionError::Validation { missing });
        }
        let (Some((origin, destination)), Some(date), Some(time)) = (draft.route(), draft.date, draft.time) else {
            return Err(SubmissionError::Validation { missing: vec!["origin", "destination", "date", "time"] });
        };
        let vehicle_id = draft
            .vehicle_class
            .as_deref()
            .ok_or_else(|| SubmissionError::Validation { missing: vec!["vehicle_class"] })?;
        let vehicle = self
            .catalog
            .routes
            .vehicle(vehicle_id)
            .ok_or_else(|| SubmissionError::UnknownVehicleClass(vehicle_id.to_string()))?;
        if !vehicle.seats(draft.passengers) {
            return Err(SubmissionError::Validation { missing: vec!["passengers"] });
        }
        if self.catalog.routes.fare_for(origin, destination, vehicle_id).is_none() {
            tracing::error!(origin, destination, vehicle_class = vehicle_id, "Draft names a class the route does not carry");
            return Err(PricingError::UnknownRoute {
                origin: origin.to_string(),
                destination: destination.to_string(),
                vehicle_class: vehicle_id.to_string(),
            }
            .into());
        }

        let return_pickup = match (draft.is_round_trip(), draft.return_date, draft.return_time) {
            (true, Some(return_date), Some(return_time)) => Some((return_date, return_time)),
            _ => None,
        };
        if let Some((return_date, return_time)) = return_pickup {
            if return_date.and_time(return_time) <= date.and_time(time) {
                return Err(SubmissionError::ReturnBeforeOutbound);
            }
        }

        // A draft that already became a booking is answered from the store.
        if let Some(existing) = self.find_existing(draft).await? {
            tracing::info!(key = %draft.id, reference = %existing.reference(), "Draft already booked, returning stored booking");
            return Ok(existing);
        }

        // 2. Reserve every slot the trip drives in.
        let mut held = HeldReservations::new(self.ledger.clone(), self.config.ledger_timeout);
        let pickups = std::iter::once((date, time)).chain(return_pickup);
        for (pickup_date, pickup_time) in pickups {
            let reserved = self.reserve(&mut held, pickup_date, pickup_time, vehicle).await;
            if let Err(e) = reserved {
                held.release().await;
                return Err(e);
            }
        }

        // 3. Price.
        let price = match self
            .pricing
            .quote(origin, destination, vehicle_id, draft.trip_type, &draft.selected_extras)
        {
            Ok(price) => price,
            Err(e) => {
                held.release().await;
                return Err(e.into());
            }
        };
        let Some(legs) = build_legs(&self.catalog.routes, draft, price) else {
            held.release().await;
            return Err(SubmissionError::Validation { missing: draft.missing_trip_fields() });
        };

        // 4. Persist.
        let booking = ConfirmedBooking::new(draft.clone(), legs, price, identity.user_id().map(str::to_string));
        let outcome = match timeout(self.config.persistence_timeout, self.store.save(&booking)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::error!(key = %booking.idempotency_key, "Failed to persist booking: {}", e);
                held.release().await;
                return Err(SubmissionError::Persistence(e.to_string()));
            }
            Err(_) => {
                tracing::error!(
                    key = %booking.idempotency_key,
                    timeout_ms = self.config.persistence_timeout.as_millis() as u64,
                    "Timed out persisting booking"
                );
                held.release().await;
                return Err(SubmissionError::Persistence(format!(
                    "no acknowledgement within {}ms",
                    self.config.persistence_timeout.as_millis()
                )));
            }
        };

        let record_id = match outcome {
            SaveOutcome::Created(record_id) => record_id,
            SaveOutcome::Existing(record_id) => {
                // An earlier submission of this draft holds the capacity.
                held.release().await;
                tracing::info!(key = %booking.idempotency_key, record_id = %record_id, "Draft saved earlier, released duplicate reservations");
                return self.stored_booking(&record_id).await;
            }
        };

        // 5. Commit and announce.
        held.commit().await;
        let booking = booking.with_record_id(record_id.clone());
        tracing::info!(
            booking_id = %booking.id,
            record_id = %record_id,
            route = %draft.route_label(),
            vehicle_class = vehicle_id,
            total = %price,
            "Booking confirmed"
        );

        let event = BookingConfirmedEvent {
            booking_id: booking.id,
            record_id: record_id.0.clone(),
            idempotency_key: booking.idempotency_key,
            vehicle_class: vehicle_id.to_string(),
            route: draft.route_label(),
            pickup_date: date,
            pickup_hour: time.hour(),
            round_trip: draft.is_round_trip(),
            total_cents: price.cents(),
            customer_email: draft.contact.email.clone(),
            user_id: booking.user_id.clone(),
            timestamp: Utc::now().timestamp(),
        };
        match timeout(self.config.ledger_timeout, self.events.publish_confirmed(&event)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(booking_id = %booking.id, "Failed to publish confirmation: {}", e),
            Err(_) => tracing::warn!(booking_id = %booking.id, "Timed out publishing confirmation"),
        }

        Ok(booking)
    }

    async fn find_existing(&self, draft: &BookingDraft) -> Result<Option<ConfirmedBooking>, SubmissionError> {
        match timeout(self.config.persistence_timeout, self.store.find_by_key(draft.id)).await {
            Ok(Ok(found)) => Ok(found),
            Ok(Err(e)) => {
                tracing::error!(key = %draft.id, "Failed to look up booking by key: {}", e);
                Err(SubmissionError::Persistence(e.to_string()))
            }
            Err(_) => {
                tracing::error!(key = %draft.id, "Timed out looking up booking by key");
                Err(SubmissionError::Persistence("no answer from the store".into()))
            }
        }
    }

    async fn stored_booking(&self, record_id: &RecordId) -> Result<ConfirmedBooking, SubmissionError> {
        match timeout(self.config.persistence_timeout, self.store.get(record_id)).await {
            Ok(Ok(Some(booking))) => Ok(booking),
            Ok(Ok(None)) => {
                tracing::error!(record_id = %record_id, "Store reported a record it cannot return");
                Err(SubmissionError::Persistence(format!("record {} not found", record_id)))
            }
            Ok(Err(e)) => Err(SubmissionError::Persistence(e.to_string())),
            Err(_) => Err(SubmissionError::Persistence("no answer from the store".into())),
        }
    }

    /// Reserve one slot into `held`. The token is tracked before the ledger
    /// is asked, so a call that times out or is cancelled is still released.
    async fn reserve(
        &self,
        held: &mut HeldReservations,
        date: NaiveDate,
        time: NaiveTime,
        vehicle: &VehicleClass,
    ) -> Result<(), SubmissionError> {
        let token = ReservationToken::new(SlotKey::for_pickup(date, time, vehicle.id.as_str()));
        let hour = token.slot.hour;
        held.push(token.clone());

        match timeout(self.config.ledger_timeout, self.ledger.reserve(&token, vehicle)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(LedgerError::CapacityExhausted { capacity, .. })) => {
                held.forget(&token);
                tracing::warn!(date = %date, hour, vehicle_class = %vehicle.id, capacity, "Slot is full");
                let event = CapacityExhaustedEvent {
                    vehicle_class: vehicle.id.clone(),
                    date,
                    hour,
                    capacity,
                    timestamp: Utc::now().timestamp(),
                };
                if let Ok(Err(e)) = timeout(self.config.ledger_timeout, self.events.publish_capacity_exhausted(&event)).await {
                    tracing::warn!("Failed to publish capacity event: {}", e);
                }
                Err(SubmissionError::Availability {
                    date,
                    hour,
                    vehicle_class: vehicle.id.clone(),
                })
            }
            Ok(Err(e)) => {
                tracing::error!(date = %date, hour, vehicle_class = %vehicle.id, "Ledger refused reservation: {}", e);
                Err(SubmissionError::LedgerUnavailable(e.to_string()))
            }
            Err(_) => {
                tracing::error!(date = %date, hour, vehicle_class = %vehicle.id, token = %token.id, "Timed out reserving capacity");
                Err(SubmissionError::LedgerUnavailable("timed out".into()))
            }
        }
    }
}
