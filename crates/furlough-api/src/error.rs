//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use furlough_core::Error;
use thiserror::Error;

use crate::response::WebResponse;

/// An error returned by an API handler or extractor.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized request, please login")]
  Unauthenticated,

  #[error("{0} access required")]
  WrongRole(&'static str),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A duplicate email on a route that reports it as a conflict.
  #[error("email already in use: {0}")]
  EmailTaken(String),

  #[error(transparent)]
  Core(#[from] Error),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
      ApiError::WrongRole(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::EmailTaken(_) => StatusCode::CONFLICT,
      ApiError::Core(e) => match e {
        Error::Validation(_) | Error::WrongOldPassword => StatusCode::BAD_REQUEST,
        Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
        Error::NotOwner { .. } | Error::InvalidTransition { .. } => {
          StatusCode::FORBIDDEN
        }
        Error::AccountNotFound(_) | Error::PermissionNotFound(_) => {
          StatusCode::NOT_FOUND
        }
        Error::DuplicateEmail(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::AlreadyFinal { .. } => StatusCode::CONFLICT,
        Error::Credential(_) | Error::Token(_) | Error::Store(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();

    let body = match self {
      ApiError::Core(Error::Validation(fields)) => {
        WebResponse::failure("validation failed", fields)
      }
      ApiError::Core(e) if e.is_internal() => {
        tracing::error!(error = %e, "request failed");
        WebResponse::failure("internal server error", Vec::new())
      }
      ApiError::Core(Error::InvalidCredentials) => {
        WebResponse::failure("Incorrect email or password", Vec::new())
      }
      other => WebResponse::failure(other.to_string(), Vec::new()),
    };

    let mut res = (status, Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer realm=\"furlough\""),
      );
    }
    res
  }
}
