use std::sync::Arc;
use transfer_core::{BookingIntent, IntentExtractor};
use transfer_shared::Locale;

use crate::messages::{BookingMessages, MessageKey};

const BOOKING_KEYWORDS: [&str; 5] = ["reserva", "booking", "taxi", "traslado", "transfer"];

/// Cheap first pass before paying for an extraction.
pub fn looks_like_booking(text: &str) -> bool {
    let text = text.to_lowercase();
    BOOKING_KEYWORDS.iter().any(|k| text.contains(k))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssistantRoute {
    /// Open the booking wizard with these details filled in.
    Prefill(BookingIntent),
    /// Carry on chatting.
    Conversational,
}

/// Decide what to do with an extraction that has already been made.
pub fn classify(text: &str, intent: Option<BookingIntent>) -> AssistantRoute {
    match intent {
        Some(intent) if looks_like_booking(text) && intent.has_trip_fields() => AssistantRoute::Prefill(intent),
        _ => AssistantRoute::Conversational,
    }
}

/// Short reply shown when a chat message was turned into a prefilled form.
pub fn acknowledgement(intent: &BookingIntent, locale: Locale) -> String {
    let unknown = "?";
    BookingMessages::render(
        MessageKey::BookingDetected,
        locale,
        &[
            ("origin", intent.origin().unwrap_or(unknown)),
            ("destination", intent.destination().unwrap_or(unknown)),
            ("date", intent.pickup_date.as_deref().unwrap_or(unknown)),
        ],
    )
}

/// Routes chat messages either into the booking wizard or back to the
/// conversation.
pub struct AssistantRouter {
    extractor: Arc<dyn IntentExtractor>,
}

impl AssistantRouter {
    pub fn new(extractor: Arc<dyn IntentExtractor>) -> Self {
        Self { extractor }
    }

    pub async fn route_message(&self, text: &str) -> AssistantRoute {
        if !looks_like_booking(text) {
            return AssistantRoute::Conversational;
        }

        match self.extractor.extract(text).await {
            Ok(intent) => classify(text, Some(intent)),
            Err(e) => {
                tracing::warn!("Intent extraction failed, answering conversationally: {}", e);
                AssistantRoute::Conversational
            }
        }
    }
}
