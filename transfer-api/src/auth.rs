use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use transfer_core::{CoreError, Identity, IdentityProvider};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

pub const ROLE_GUEST: &str = "GUEST";
pub const ROLE_CUSTOMER: &str = "CUSTOMER";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerClaims {
    pub sub: String,
    pub email: Option<String>,
    pub role: String,
    pub exp: usize,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/guest", post(login_guest))
}

pub fn issue_token(auth: &AuthConfig, sub: String, email: Option<String>, role: &str) -> Result<String, AppError> {
    let claims = CustomerClaims {
        sub,
        email,
        role: role.to_owned(),
        exp: (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::Anyhow(anyhow::anyhow!("Token encoding failed: {}", e)))
}

async fn login_guest(State(state): State<AppState>) -> Result<Json<AuthResponse>, AppError> {
    let token = issue_token(&state.auth, format!("guest-{}", Uuid::new_v4()), None, ROLE_GUEST)?;
    Ok(Json(AuthResponse { token }))
}

/// Resolve the optional bearer token of a request.
pub async fn resolve_identity(
    state: &AppState,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<Identity, AppError> {
    let token = bearer.as_ref().map(|TypedHeader(auth)| auth.token());
    state
        .identity
        .resolve(token)
        .await
        .map_err(|e| AppError::Authentication(e.to_string()))
}

/// Identity from tokens signed with the service's own secret. Customer
/// tokens carry the account id; guest tokens and anonymous requests book
/// as guests.
pub struct JwtIdentityProvider {
    secret: String,
}

impl JwtIdentityProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, bearer: Option<&str>) -> Result<Identity, CoreError> {
        let Some(token) = bearer else {
            return Ok(Identity::Guest);
        };

        let data = decode::<CustomerClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| CoreError::IdentityError(e.to_string()))?;

        match data.claims.role.as_str() {
            ROLE_GUEST => Ok(Identity::Guest),
            ROLE_CUSTOMER => Ok(Identity::User {
                user_id: data.claims.sub,
                email: data.claims.email,
            }),
            other => Err(CoreError::IdentityError(format!("Unsupported role: {}", other))),
        }
    }
}
