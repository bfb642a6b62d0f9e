pub mod booking;
pub mod repository;
pub mod identity;
pub mod intent;
pub mod events;

pub use booking::{BookingDraft, ConfirmedBooking, Contact, LegDirection, TripLeg};
pub use identity::{GuestOnlyIdentity, Identity, IdentityProvider};
pub use intent::{BookingIntent, IntentExtractor};
pub use repository::{BookingStore, RecordId, SaveOutcome, StoreError};
pub use events::{BookingEventPublisher, NoopPublisher};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
    #[error("Identity verification failed: {0}")]
    IdentityError(String),
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
