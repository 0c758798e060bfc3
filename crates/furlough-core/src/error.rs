//! Error types for `furlough-core`.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{lifecycle::OwnerAction, permission::PermissionStatus};

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field:   &'static str,
  pub message: String,
}

impl FieldError {
  pub fn new(field: &'static str, message: impl Into<String>) -> Self {
    Self { field, message: message.into() }
  }
}

impl fmt::Display for FieldError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.field, self.message)
  }
}

/// Join field errors into the single-line message used by [`Error::Validation`].
fn join_fields(fields: &[FieldError]) -> String {
  fields
    .iter()
    .map(ToString::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {}", join_fields(.0))]
  Validation(Vec<FieldError>),

  /// Unknown email and wrong password are deliberately indistinguishable.
  #[error("incorrect email or password")]
  InvalidCredentials,

  #[error("old password is incorrect")]
  WrongOldPassword,

  #[error("email already in use: {0}")]
  DuplicateEmail(String),

  #[error("account not found: {0}")]
  AccountNotFound(Uuid),

  #[error("permission not found: {0}")]
  PermissionNotFound(Uuid),

  #[error("permission {permission_id} belongs to another account")]
  NotOwner { permission_id: Uuid, action: OwnerAction },

  #[error("permission {permission_id} cannot be {action} while {status}")]
  InvalidTransition {
    permission_id: Uuid,
    status:        PermissionStatus,
    action:        OwnerAction,
  },

  #[error("permission {permission_id} is already {status}")]
  AlreadyFinal {
    permission_id: Uuid,
    status:        PermissionStatus,
  },

  #[error("credential error: {0}")]
  Credential(String),

  #[error("token error: {0}")]
  Token(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error from an [`AccountStore`](crate::store::AccountStore)
  /// or [`PermissionStore`](crate::store::PermissionStore).
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Shorthand for a validation failure on a single field.
  pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation(vec![FieldError::new(field, message)])
  }

  /// `true` for failures that are the server's fault rather than the caller's.
  pub fn is_internal(&self) -> bool {
    matches!(self, Self::Credential(_) | Self::Token(_) | Self::Store(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
