use async_trait::async_trait;
use transfer_shared::models::events::{BookingConfirmedEvent, CapacityExhaustedEvent};

use crate::CoreError;

/// Outbound notifications about bookings (confirmation mail, dispatch
/// board). Delivery is best effort: a failed publish never undoes a booking.
#[async_trait]
pub trait BookingEventPublisher: Send + Sync {
    async fn publish_confirmed(&self, event: &BookingConfirmedEvent) -> Result<(), CoreError>;

    async fn publish_capacity_exhausted(&self, event: &CapacityExhaustedEvent) -> Result<(), CoreError>;
}

/// Logs events instead of sending them anywhere.
pub struct NoopPublisher;

#[async_trait]
impl BookingEventPublisher for NoopPublisher {
    async fn publish_confirmed(&self, event: &BookingConfirmedEvent) -> Result<(), CoreError> {
        tracing::info!(booking_id = %event.booking_id, route = %event.route, "Booking confirmed (not published)");
        Ok(())
    }

    async fn publish_capacity_exhausted(&self, event: &CapacityExhaustedEvent) -> Result<(), CoreError> {
        tracing::info!(
            vehicle_class = %event.vehicle_class,
            date = %event.date,
            hour = event.hour,
            "Capacity exhausted (not published)"
        );
        Ok(())
    }
}
