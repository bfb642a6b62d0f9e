pub mod messages;
pub mod legs;
pub mod projection;
pub mod wizard;
pub mod orchestrator;
pub mod assistant;

pub use messages::{BookingMessages, MessageKey};
pub use projection::{TripSummary, VehicleOption};
pub use wizard::{BookingWizard, StepError, WizardStep};
pub use orchestrator::{BookingOrchestrator, SlotStatus, SubmissionConfig, SubmissionError};
pub use assistant::{AssistantRoute, AssistantRouter};
