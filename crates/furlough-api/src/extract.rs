//! Body, path and query helpers that report failures through [`ApiError`].

use axum::{
  Json,
  extract::{FromRequest, Request},
};
use serde::{Deserialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::error::ApiError;

/// Like [`Json`], but a malformed body becomes a 400 in the API envelope.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
  S: Send + Sync,
  T: DeserializeOwned,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    match Json::<T>::from_request(req, state).await {
      Ok(Json(value)) => Ok(Self(value)),
      Err(rejection) => {
        tracing::warn!(error = %rejection, "rejected request body");
        Err(ApiError::BadRequest(rejection.body_text()))
      }
    }
  }
}

/// Parse a path id. Anything that is not a UUID cannot name a record.
pub fn parse_id(raw: &str, resource: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{resource} {raw}")))
}

/// Query parameters shared by the listing endpoints. Values are kept as raw
/// strings so that junk falls back to defaults instead of failing extraction.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page:     Option<String>,
  pub size:     Option<String>,
  pub order:    Option<String>,
  pub search:   Option<String>,
  pub verified: Option<String>,
  pub status:   Option<String>,
}

impl ListParams {
  /// Only exactly `true` or `false` filter; anything else is ignored.
  pub fn verified(&self) -> Option<bool> {
    match self.verified.as_deref() {
      Some("true") => Some(true),
      Some("false") => Some(false),
      _ => None,
    }
  }
}
