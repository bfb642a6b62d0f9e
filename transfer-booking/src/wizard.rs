use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use transfer_catalog::{Catalog, TripType};
use transfer_core::{BookingDraft, BookingIntent, ConfirmedBooking, Contact, Identity};
use transfer_shared::{Locale, Masked, Money};

use crate::messages::{BookingMessages, MessageKey};
use crate::orchestrator::{BookingOrchestrator, SubmissionError};
use crate::projection::{self, TripSummary, VehicleOption};

/// Booking wizard screens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardStep {
    SelectTrip,
    SelectVehicle,
    EnterDetails,
    Confirmed,
}

impl WizardStep {
    /// Forward transition reachable with `advance`. `EnterDetails` moves on
    /// only through a submission.
    pub fn next(self) -> Option<WizardStep> {
        match self {
            WizardStep::SelectTrip => Some(WizardStep::SelectVehicle),
            WizardStep::SelectVehicle => Some(WizardStep::EnterDetails),
            WizardStep::EnterDetails | WizardStep::Confirmed => None,
        }
    }

    pub fn previous(self) -> Option<WizardStep> {
        match self {
            WizardStep::SelectVehicle => Some(WizardStep::SelectTrip),
            WizardStep::EnterDetails => Some(WizardStep::SelectVehicle),
            WizardStep::SelectTrip | WizardStep::Confirmed => None,
        }
    }

    /// 1-based position for the progress indicator.
    pub fn number(self) -> u8 {
        match self {
            WizardStep::SelectTrip => 1,
            WizardStep::SelectVehicle => 2,
            WizardStep::EnterDetails => 3,
            WizardStep::Confirmed => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("Trip is missing: {}", .missing.join(", "))]
    IncompleteTrip { missing: Vec<&'static str> },

    #[error("Party of {passengers} is outside 1..={max}")]
    InvalidPassengers { passengers: u32, max: u32 },

    #[error("Unknown location: {0}")]
    UnknownLocation(String),

    #[error("Return must be after the outbound pickup")]
    ReturnBeforeOutbound,

    #[error("No vehicle chosen")]
    VehicleRequired,

    #[error("No vehicle classes serve {0}")]
    NoVehiclesForRoute(String),

    #[error("{vehicle_class} does not serve this route")]
    VehicleNotServed { vehicle_class: String },

    #[error("{vehicle_class} seats at most {max_passengers}")]
    VehicleTooSmall { vehicle_class: String, max_passengers: u32 },

    #[error("Unknown extra: {0}")]
    UnknownExtra(String),

    #[error("Details are confirmed by submitting the booking")]
    SubmitRequired,

    #[error("Booking already confirmed, start a new one")]
    AlreadyConfirmed,
}

impl StepError {
    pub fn user_message(&self, locale: Locale) -> String {
        let key = match self {
            StepError::IncompleteTrip { .. } => MessageKey::IncompleteTrip,
            StepError::InvalidPassengers { .. } => MessageKey::InvalidPassengers,
            StepError::UnknownLocation(_) => MessageKey::UnknownLocation,
            StepError::ReturnBeforeOutbound => MessageKey::ReturnBeforeOutbound,
            StepError::VehicleRequired | StepError::VehicleNotServed { .. } => MessageKey::VehicleRequired,
            StepError::NoVehiclesForRoute(_) => MessageKey::NoVehiclesForRoute,
            StepError::VehicleTooSmall { .. } => MessageKey::VehicleTooSmall,
            StepError::UnknownExtra(_) | StepError::SubmitRequired | StepError::AlreadyConfirmed => {
                MessageKey::GenericFailure
            }
        };
        BookingMessages::text(key, locale)
    }
}

/// One customer's pass through the booking screens.
///
/// Owned by a single session; every operation takes `&mut self`. The draft
/// lives until a successful submission or `reset`, and going back never
/// clears anything the customer typed.
#[derive(Debug, Clone)]
pub struct BookingWizard {
    catalog: Catalog,
    step: WizardStep,
    draft: BookingDraft,
    confirmed: Option<ConfirmedBooking>,
    locale: Locale,
}

impl BookingWizard {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            step: WizardStep::SelectTrip,
            draft: BookingDraft::new(),
            confirmed: None,
            locale: Locale::default(),
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn confirmed(&self) -> Option<&ConfirmedBooking> {
        self.confirmed.as_ref()
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Move forward from `from`. A `from` that is not the current step is a
    /// repeated click on a screen already left behind and changes nothing.
    pub fn advance(&mut self, from: WizardStep) -> Result<WizardStep, StepError> {
        if from != self.step {
            tracing::debug!(from = ?from, current = ?self.step, "Ignoring stale advance");
            return Ok(self.step);
        }

        match from {
            WizardStep::SelectTrip => self.check_trip()?,
            WizardStep::SelectVehicle => self.check_vehicle()?,
            WizardStep::EnterDetails => return Err(StepError::SubmitRequired),
            WizardStep::Confirmed => return Err(StepError::AlreadyConfirmed),
        }

        if let Some(next) = from.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Start over with an empty draft.
    pub fn reset(&mut self) {
        self.step = WizardStep::SelectTrip;
        self.draft = BookingDraft::new();
        self.confirmed = None;
    }

    pub fn set_trip_type(&mut self, trip_type: TripType) -> Result<(), StepError> {
        self.editable()?;
        self.draft.trip_type = trip_type;
        Ok(())
    }

    /// Choosing another origin drops a destination it cannot reach.
    pub fn set_origin(&mut self, origin: &str) -> Result<(), StepError> {
        self.editable()?;
        let origin = self.known_location(origin)?;

        let reachable = self.catalog.routes.list_destinations(&origin);
        if let Some(destination) = &self.draft.destination {
            if !reachable.contains(destination) {
                self.draft.destination = None;
            }
        }
        self.draft.origin = Some(origin);
        self.drop_unserved_vehicle();
        Ok(())
    }

    pub fn set_destination(&mut self, destination: &str) -> Result<(), StepError> {
        self.editable()?;
        let destination = self.known_location(destination)?;
        if let Some(origin) = &self.draft.origin {
            if !self.catalog.routes.list_destinations(origin).contains(&destination) {
                return Err(StepError::UnknownLocation(destination));
            }
        }
        self.draft.destination = Some(destination);
        self.drop_unserved_vehicle();
        Ok(())
    }

    pub fn set_pickup(&mut self, date: NaiveDate, time: NaiveTime) -> Result<(), StepError> {
        self.editable()?;
        self.draft.date = Some(date);
        self.draft.time = Some(time);
        Ok(())
    }

    pub fn set_return(&mut self, date: NaiveDate, time: NaiveTime) -> Result<(), StepError> {
        self.editable()?;
        self.draft.return_date = Some(date);
        self.draft.return_time = Some(time);
        Ok(())
    }

    pub fn set_passengers(&mut self, passengers: u32) -> Result<(), StepError> {
        self.editable()?;
        let max = self.catalog.routes.max_passengers();
        if passengers == 0 || passengers > max {
            return Err(StepError::InvalidPassengers { passengers, max });
        }
        self.draft.passengers = passengers;
        Ok(())
    }

    pub fn choose_vehicle(&mut self, vehicle_class: &str) -> Result<(), StepError> {
        self.editable()?;
        self.check_vehicle_choice(vehicle_class)?;
        self.draft.vehicle_class = Some(vehicle_class.to_string());
        Ok(())
    }

    /// Flip an extra on or off. Returns whether it is now selected.
    pub fn toggle_extra(&mut self, extra_id: &str) -> Result<bool, StepError> {
        self.editable()?;
        if self.catalog.extras.extra(extra_id).is_none() {
            return Err(StepError::UnknownExtra(extra_id.to_string()));
        }
        if self.draft.selected_extras.remove(extra_id) {
            return Ok(false);
        }
        self.draft.selected_extras.insert(extra_id.to_string());
        Ok(true)
    }

    pub fn set_contact(&mut self, contact: Contact) -> Result<(), StepError> {
        self.editable()?;
        self.draft.contact = contact;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) -> Result<(), StepError> {
        self.editable()?;
        self.draft.notes = notes.into();
        Ok(())
    }

    /// Copy whatever the chat assistant understood onto the draft. Names
    /// that do not match a catalog location are left out, so the customer
    /// picks them on the first screen. Returns the fields that were applied.
    pub fn prefill(&mut self, intent: &BookingIntent) -> Result<Vec<&'static str>, StepError> {
        self.editable()?;
        let mut applied = Vec::new();

        if let Some(origin) = intent.origin() {
            if self.set_origin(origin).is_ok() {
                applied.push("origin");
            }
        }
        if let Some(destination) = intent.destination() {
            if self.set_destination(destination).is_ok() {
                applied.push("destination");
            }
        }
        if let Some(date) = intent.date() {
            self.draft.date = Some(date);
            applied.push("date");
        }
        if let Some(time) = intent.time() {
            self.draft.time = Some(time);
            applied.push("time");
        }
        if let Some(passengers) = intent.pax_count {
            if self.set_passengers(passengers).is_ok() {
                applied.push("passengers");
            }
        }
        if let Some(name) = intent.passenger() {
            self.draft.contact.name = name.to_string();
            applied.push("name");
        }
        if let Some(email) = intent.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            self.draft.contact.email = Masked(email.to_string());
            applied.push("email");
        }
        if let Some(phone) = intent.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            self.draft.contact.phone = Masked(phone.to_string());
            applied.push("phone");
        }
        if let Some(notes) = intent.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            self.draft.notes = notes.to_string();
            applied.push("notes");
        }

        tracing::debug!(fields = ?applied, "Prefilled draft from assistant");
        Ok(applied)
    }

    pub fn quote_preview(&self) -> Option<Money> {
        projection::quote_preview(&self.catalog, &self.draft)
    }

    pub fn available_vehicles(&self) -> Vec<VehicleOption> {
        projection::available_vehicles(&self.catalog, &self.draft)
    }

    /// Summary of the draft, or of the confirmed booking once submitted.
    pub fn summary(&self) -> TripSummary {
        match &self.confirmed {
            Some(booking) => projection::summary(&self.catalog, &booking.draft),
            None => projection::summary(&self.catalog, &self.draft),
        }
    }

    /// Submit the draft. On success the wizard shows the confirmation and
    /// the draft is gone; on failure it stays on the details screen with
    /// everything intact so the customer can fix it and retry.
    pub async fn submit(
        &mut self,
        orchestrator: &BookingOrchestrator,
        identity: &Identity,
    ) -> Result<&ConfirmedBooking, SubmissionError> {
        if self.step != WizardStep::EnterDetails {
            return Err(SubmissionError::NotReady(self.step));
        }

        let booking = orchestrator.submit(&self.draft, identity).await?;
        self.draft = BookingDraft::new();
        self.step = WizardStep::Confirmed;
        let booking = &*self.confirmed.insert(booking);
        Ok(booking)
    }

    fn editable(&self) -> Result<(), StepError> {
        if self.step == WizardStep::Confirmed {
            return Err(StepError::AlreadyConfirmed);
        }
        Ok(())
    }

    fn known_location(&self, name: &str) -> Result<String, StepError> {
        let routes = &self.catalog.routes;
        routes
            .resolve_location(name)
            .map(|l| l.name.clone())
            .filter(|n| routes.list_origins().contains(n))
            .ok_or_else(|| StepError::UnknownLocation(name.trim().to_string()))
    }

    fn drop_unserved_vehicle(&mut self) {
        let Some(vehicle_class) = self.draft.vehicle_class.as_deref() else {
            return;
        };
        let served = match self.draft.route() {
            Some((origin, destination)) => self
                .catalog
                .routes
                .fare_for(origin, destination, vehicle_class)
                .is_some(),
            None => false,
        };
        if !served {
            self.draft.vehicle_class = None;
        }
    }

    fn check_trip(&self) -> Result<(), StepError> {
        let missing = self.draft.missing_trip_fields();
        if !missing.is_empty() {
            return Err(StepError::IncompleteTrip { missing });
        }

        let routes = &self.catalog.routes;
        if let Some((origin, destination)) = self.draft.route() {
            if !routes.list_destinations(origin).iter().any(|d| d == destination) {
                return Err(StepError::UnknownLocation(destination.to_string()));
            }
        }

        let max = routes.max_passengers();
        if self.draft.passengers == 0 || self.draft.passengers > max {
            return Err(StepError::InvalidPassengers {
                passengers: self.draft.passengers,
                max,
            });
        }

        if self.draft.is_round_trip() {
            let outbound = self.draft.date.zip(self.draft.time).map(|(d, t)| d.and_time(t));
            let inbound = self.draft.return_date.zip(self.draft.return_time).map(|(d, t)| d.and_time(t));
            if let (Some(outbound), Some(inbound)) = (outbound, inbound) {
                if inbound <= outbound {
                    return Err(StepError::ReturnBeforeOutbound);
                }
            }
        }
        Ok(())
    }

    fn check_vehicle(&self) -> Result<(), StepError> {
        let Some(vehicle_class) = self.draft.vehicle_class.as_deref() else {
            if self.available_vehicles().is_empty() {
                return Err(StepError::NoVehiclesForRoute(self.draft.route_label()));
            }
            return Err(StepError::VehicleRequired);
        };
        self.check_vehicle_choice(vehicle_class)
    }

    fn check_vehicle_choice(&self, vehicle_class: &str) -> Result<(), StepError> {
        let served = self
            .draft
            .route()
            .map(|(o, d)| self.catalog.routes.vehicle_classes_for(o, d))
            .unwrap_or_default();
        let Some(choice) = served.iter().find(|v| v.class.id == vehicle_class) else {
            return Err(StepError::VehicleNotServed {
                vehicle_class: vehicle_class.to_string(),
            });
        };
        if !choice.class.seats(self.draft.passengers) {
            return Err(StepError::VehicleTooSmall {
                vehicle_class: vehicle_class.to_string(),
                max_passengers: choice.class.max_passengers,
            });
        }
        Ok(())
    }
}
