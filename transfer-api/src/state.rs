use std::sync::Arc;
use transfer_booking::BookingOrchestrator;
use transfer_catalog::Catalog;
use transfer_core::IdentityProvider;
use transfer_shared::Locale;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub orchestrator: Arc<BookingOrchestrator>,
    pub identity: Arc<dyn IdentityProvider>,
    pub auth: AuthConfig,
    pub default_locale: Locale,
}
