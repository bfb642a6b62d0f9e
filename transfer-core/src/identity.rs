use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Who is booking. Guests book with an e-mail address only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Identity {
    #[default]
    Guest,
    User {
        user_id: String,
        email: Option<String>,
    },
}

impl Identity {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Identity::Guest => None,
            Identity::User { user_id, .. } => Some(user_id.as_str()),
        }
    }
}

/// Resolves the bearer credential of a request into an identity. Sign-in
/// itself happens at the external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `None` means an anonymous request and must resolve to `Guest`.
    async fn resolve(&self, bearer: Option<&str>) -> Result<Identity, CoreError>;
}

/// Treats every caller as a guest. Used when no identity provider is wired in.
pub struct GuestOnlyIdentity;

#[async_trait]
impl IdentityProvider for GuestOnlyIdentity {
    async fn resolve(&self, bearer: Option<&str>) -> Result<Identity, CoreError> {
        if bearer.is_some() {
            tracing::debug!("Ignoring bearer credential, guest-only identity configured");
        }
        Ok(Identity::Guest)
    }
}
