//! Bearer token verification for the watchlist routes
//!
//! Tokens are issued elsewhere; this side only checks the HS256 signature and
//! expiry and reads the numeric user id from `sub`.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::AppError;

/// Verification secret; `None` when the server runs without one, in which
/// case every authenticated route answers 401.
#[derive(Clone, Default)]
pub struct AuthSecret(pub Option<Arc<str>>);

impl AuthSecret {
    pub fn new(secret: Option<String>) -> Self {
        Self(secret.map(Arc::from))
    }
}

/// Token issuers disagree on whether `sub` is a number or a string
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subject {
    Id(i64),
    Text(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Subject,
    pub exp: usize,
}

impl Claims {
    fn user_id(&self) -> Option<i32> {
        match &self.sub {
            Subject::Id(id) => i32::try_from(*id).ok(),
            Subject::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub i32);

fn unauthorized(msg: &str) -> AppError {
    AppError::Unauthorized(msg.to_string())
}

pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        unauthorized("Invalid or expired token")
    })?;

    data.claims
        .user_id()
        .map(AuthUser)
        .ok_or_else(|| unauthorized("Token subject is not a user id"))
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthSecret: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| unauthorized("Expected a Bearer token"))?;

        let AuthSecret(secret) = AuthSecret::from_ref(state);
        let secret = secret.ok_or_else(|| {
            tracing::warn!("JWT_SECRET is not configured, rejecting authenticated request");
            unauthorized("Authentication is not configured")
        })?;

        verify_token(token, &secret)
    }
}
