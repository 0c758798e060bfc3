//! Bearer-token authentication and role gates.
//!
//! [`JwtKeys`] signs tokens at login (as the directory's [`TokenIssuer`]) and
//! verifies them on every request. [`Authenticated`] extracts the caller's
//! [`Identity`]; [`Authorized<G>`] additionally requires the caller's role to
//! pass gate `G`. A missing or bad token is 401, a wrong role is 403.

use std::marker::PhantomData;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use furlough_core::{
  account::{Identity, Role},
  credentials::TokenIssuer,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, Backend, error::ApiError};

// ─── Tokens ──────────────────────────────────────────────────────────────────

/// JWT claims: the caller's identity plus issue and expiry times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  /// Account id.
  pub sub:   Uuid,
  pub email: String,
  pub role:  Role,
  pub name:  String,
  pub iat:   i64,
  pub exp:   i64,
}

impl From<Claims> for Identity {
  fn from(c: Claims) -> Self {
    Identity { account_id: c.sub, email: c.email, role: c.role, name: c.name }
  }
}

/// HS256 signing and verification keys.
#[derive(Clone)]
pub struct JwtKeys {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl_secs:   i64,
}

impl JwtKeys {
  pub fn new(secret: &str, ttl_secs: i64) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation: Validation::default(),
      ttl_secs,
    }
  }

  /// Decode `token`, rejecting bad signatures and expired tokens.
  pub fn verify(&self, token: &str) -> Result<Identity, jsonwebtoken::errors::Error> {
    jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
      .map(|data| data.claims.into())
  }
}

impl TokenIssuer for JwtKeys {
  fn issue(&self, identity: &Identity) -> furlough_core::Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
      sub:   identity.account_id,
      email: identity.email.clone(),
      role:  identity.role,
      name:  identity.name.clone(),
      iat:   now,
      exp:   now + self.ttl_secs,
    };
    jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
      .map_err(|e| furlough_core::Error::Token(e.to_string()))
  }
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The verified identity of the caller.
pub struct Authenticated(pub Identity);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

impl<S: Backend> FromRequestParts<AppState<S>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthenticated)?;
    let identity = state.jwt.verify(token).map_err(|e| {
      tracing::debug!(error = %e, "rejected bearer token");
      ApiError::Unauthenticated
    })?;
    Ok(Self(identity))
  }
}

/// A role requirement on a route group.
pub trait Gate: Send + Sync + 'static {
  /// Role name used in the 403 message.
  const NAME: &'static str;

  fn admits(role: Role) -> bool;
}

pub struct AdminGate;
pub struct VerifierGate;
pub struct UserGate;

impl Gate for AdminGate {
  const NAME: &'static str = "admin";

  fn admits(role: Role) -> bool {
    match role {
      Role::Admin => true,
      Role::Verifier | Role::User => false,
    }
  }
}

impl Gate for VerifierGate {
  const NAME: &'static str = "verifier";

  fn admits(role: Role) -> bool {
    match role {
      Role::Verifier => true,
      Role::Admin | Role::User => false,
    }
  }
}

impl Gate for UserGate {
  const NAME: &'static str = "user";

  fn admits(role: Role) -> bool {
    match role {
      Role::User => true,
      Role::Admin | Role::Verifier => false,
    }
  }
}

/// An authenticated caller whose role passed gate `G`.
pub struct Authorized<G> {
  pub identity: Identity,
  _gate:        PhantomData<fn() -> G>,
}

impl<S: Backend, G: Gate> FromRequestParts<AppState<S>> for Authorized<G> {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let Authenticated(identity) =
      Authenticated::from_request_parts(parts, state).await?;
    if !G::admits(identity.role) {
      tracing::warn!(
        account_id = %identity.account_id,
        role = %identity.role,
        required = G::NAME,
        "role gate refused caller"
      );
      return Err(ApiError::WrongRole(G::NAME));
    }
    Ok(Self { identity, _gate: PhantomData })
  }
}
