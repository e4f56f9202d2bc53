//! # Identity Resolution
//!
//! Works out which shop (owner) a request acts for.
//!
//! ## Owner Resolution Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Authorization: Bearer <jwt>   (only when an IdentityStrategy is set)  │
//! │       │ claims → uid/email/name → users row (link or create)            │
//! │       │ verified mode + bad token → 401                                 │
//! │       ▼ none / anonymous                                                │
//! │  x-user-id: <id>                                                        │
//! │       ▼ none                                                            │
//! │  ?user_id=<id>                                                          │
//! │       ▼ none                                                            │
//! │  config.default_owner_id                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The result travels in request extensions as [`Owner`]. Nothing about the
//! previous request is remembered.
//!
//! ## Strategies
//! - [`Hs256Verifier`] checks the signature, expiry and (optionally) the
//!   audience and issuer.
//! - [`UnverifiedDecoder`] reads claims without any check. It logs a warning
//!   on every use and marks the identity as unverified.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::{AuthConfig, AuthMode};
use crate::error::ApiError;
use crate::state::AppState;
use medbill_core::OwnerId;
use medbill_db::repository::ExternalIdentity;

// =============================================================================
// Token Identity
// =============================================================================

/// Identity read from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub external: ExternalIdentity,
    /// `false` when the claims were read without a signature check.
    pub verified: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Turns a raw bearer token into an identity.
///
/// `Ok(None)` means the token was readable but named no subject; the
/// request then continues anonymously.
pub trait IdentityStrategy: Send + Sync {
    fn identify(&self, token: &str) -> Result<Option<TokenIdentity>, AuthError>;

    /// Whether a token this strategy rejects must fail the request.
    fn rejects_invalid_tokens(&self) -> bool;
}

/// Pulls uid, email and display name out of decoded claims.
///
/// uid comes from `uid`, then `user_id`, then `sub`.
fn identity_from_claims(claims: &Map<String, Value>, verified: bool) -> Option<TokenIdentity> {
    let text = |key: &str| -> Option<String> {
        match claims.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    };

    let uid = text("uid").or_else(|| text("user_id")).or_else(|| text("sub"))?;
    Some(TokenIdentity {
        external: ExternalIdentity {
            uid,
            email: text("email").map(|e| e.to_lowercase()),
            display_name: text("name").or_else(|| text("displayName")),
        },
        verified,
    })
}

// =============================================================================
// Verified (HS256)
// =============================================================================

pub struct Hs256Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256Verifier {
    pub fn new(secret: &str, audience: Option<&str>, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        match audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }

        Hs256Verifier {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl IdentityStrategy for Hs256Verifier {
    fn identify(&self, token: &str) -> Result<Option<TokenIdentity>, AuthError> {
        let data = decode::<Map<String, Value>>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(identity_from_claims(&data.claims, true))
    }

    fn rejects_invalid_tokens(&self) -> bool {
        true
    }
}

// =============================================================================
// Unverified
// =============================================================================

/// Reads claims with no signature, expiry or audience checks.
pub struct UnverifiedDecoder {
    validation: Validation,
}

impl UnverifiedDecoder {
    pub fn new() -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        UnverifiedDecoder { validation }
    }
}

impl Default for UnverifiedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityStrategy for UnverifiedDecoder {
    fn identify(&self, token: &str) -> Result<Option<TokenIdentity>, AuthError> {
        warn!("Reading bearer token WITHOUT signature verification");
        let data = decode::<Map<String, Value>>(token, &DecodingKey::from_secret(&[]), &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(identity_from_claims(&data.claims, false))
    }

    fn rejects_invalid_tokens(&self) -> bool {
        false
    }
}

/// Builds the strategy for the configured mode. `None` when disabled.
pub fn strategy_from_config(auth: &AuthConfig) -> Option<Arc<dyn IdentityStrategy>> {
    match auth.mode {
        AuthMode::Verified => Some(Arc::new(Hs256Verifier::new(
            auth.jwt_secret.as_deref().unwrap_or_default(),
            auth.audience.as_deref(),
            auth.issuer.as_deref(),
        ))),
        AuthMode::Unverified => Some(Arc::new(UnverifiedDecoder::new())),
        AuthMode::Disabled => None,
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Owner
// =============================================================================

/// Where the request's owner came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerSource {
    Token { verified: bool },
    Header,
    Query,
    Default,
}

/// The shop a request acts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub id: OwnerId,
    pub source: OwnerSource,
}

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Owner>()
            .copied()
            .ok_or_else(|| ApiError::internal("Request owner was not resolved"))
    }
}

fn owner_from_header(headers: &HeaderMap) -> Option<OwnerId> {
    headers
        .get("x-user-id")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn owner_from_query(query: Option<&str>) -> Option<OwnerId> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "user_id")
        .and_then(|(_, value)| value.trim().parse().ok())
}

/// Maps a bearer token to a local user id.
///
/// `Err` only for a token the strategy insists on rejecting. Everything else
/// that goes wrong falls back to an anonymous request.
async fn owner_from_token(
    state: &AppState,
    strategy: &dyn IdentityStrategy,
    token: &str,
) -> Result<Option<Owner>, ApiError> {
    let identity = match strategy.identify(token) {
        Ok(Some(identity)) => identity,
        Ok(None) => return Ok(None),
        Err(e) if strategy.rejects_invalid_tokens() => {
            debug!(error = %e, "Rejecting bearer token");
            return Err(ApiError::unauthorized(e.to_string()));
        }
        Err(e) => {
            warn!(error = %e, "Unreadable bearer token; continuing anonymously");
            return Ok(None);
        }
    };

    match state.db.users().resolve_external(&identity.external).await {
        Ok(user) => Ok(Some(Owner {
            id: user.id,
            source: OwnerSource::Token {
                verified: identity.verified,
            },
        })),
        Err(e) => {
            warn!(error = %e, "Mapping token identity to a user failed; continuing anonymously");
            Ok(None)
        }
    }
}

/// Middleware that resolves the [`Owner`] for every request.
pub async fn resolve_owner(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let mut owner = None;

    if let Some(strategy) = state.identity.clone() {
        let token = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(extract_bearer_token)
            .map(str::to_owned);

        if let Some(token) = token {
            match owner_from_token(&state, strategy.as_ref(), &token).await {
                Ok(found) => owner = found,
                Err(e) => return e.into_response(),
            }
        }
    }

    let owner = owner
        .or_else(|| {
            owner_from_header(request.headers()).map(|id| Owner {
                id,
                source: OwnerSource::Header,
            })
        })
        .or_else(|| {
            owner_from_query(request.uri().query()).map(|id| Owner {
                id,
                source: OwnerSource::Query,
            })
        })
        .unwrap_or(Owner {
            id: state.config.default_owner_id,
            source: OwnerSource::Default,
        });

    debug!(owner = owner.id, source = ?owner.source, "Resolved request owner");
    request.extensions_mut().insert(owner);
    next.run(request).await
}
