use axum::extract::{FromRequestParts, Query};
use axum::http::header::ACCEPT_LANGUAGE;
use axum::http::request::Parts;
use serde::Deserialize;
use std::convert::Infallible;
use transfer_shared::Locale;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct LocaleQuery {
    locale: Option<Locale>,
}

/// Language for customer-facing messages: `?locale=` wins over
/// `Accept-Language`, which wins over the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLocale(pub Locale);

impl FromRequestParts<AppState> for RequestLocale {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let explicit = Query::<LocaleQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|q| q.0.locale);
        let header = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|h| h.to_str().ok())
            .and_then(Locale::from_accept_language);

        Ok(RequestLocale(explicit.or(header).unwrap_or(state.default_locale)))
    }
}
