//! Accounts — login-capable identities with a role.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  error::{FieldError, Result},
  permission::OwnedPermission,
};

// ─── Role ────────────────────────────────────────────────────────────────────

/// The closed set of roles an account can hold. Every gate and scoping rule
/// matches on this exhaustively.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Verifier,
  #[default]
  User,
}

// ─── Account ─────────────────────────────────────────────────────────────────

/// A stored account. The credential is never serialised.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
  #[serde(rename = "id")]
  pub account_id:    Uuid,
  pub name:          String,
  pub email:         String,
  /// Argon2 PHC string.
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role:          Role,
  pub verified:      bool,
  pub created_at:    DateTime<Utc>,
}

impl Account {
  pub fn identity(&self) -> Identity {
    Identity {
      account_id: self.account_id,
      email:      self.email.clone(),
      role:       self.role,
      name:       self.name.clone(),
    }
  }
}

/// An account as returned by listings, with the requests it owns.
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
  #[serde(flatten)]
  pub account:     Account,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub permissions: Vec<OwnedPermission>,
}

/// The public projection of an account, embedded in permission records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
  #[serde(rename = "id")]
  pub account_id: Uuid,
  pub name:       String,
  pub email:      String,
  pub role:       Role,
  pub verified:   bool,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::AccountStore::insert_account`].
/// `account_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
  pub verified:      bool,
}

/// Who is making a request, as carried by an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub account_id: Uuid,
  pub email:      String,
  pub role:       Role,
  pub name:       String,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 32;
pub const PASSWORD_MIN_CHARS: usize = 6;

/// Body of a registration, before validation. Fields are optional so that a
/// missing field is reported as a validation failure rather than a parse
/// failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
  pub name:     Option<String>,
  pub email:    Option<String>,
  pub password: Option<String>,
}

/// A registration that passed validation.
#[derive(Debug, Clone)]
pub struct ValidRegistration {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

impl Registration {
  pub fn validate(self) -> Result<ValidRegistration> {
    let mut errors = Vec::new();

    let name = required(&mut errors, "name", self.name);
    if let Some(name) = &name {
      let len = name.chars().count();
      if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        errors.push(FieldError::new(
          "name",
          format!("must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters"),
        ));
      }
    }
    let email = required(&mut errors, "email", self.email);
    let password = required(&mut errors, "password", self.password);

    match (name, email, password) {
      (Some(name), Some(email), Some(password)) if errors.is_empty() => {
        Ok(ValidRegistration { name, email, password })
      }
      _ => Err(crate::Error::Validation(errors)),
    }
  }
}

/// Body of a login request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Login {
  pub email:    Option<String>,
  pub password: Option<String>,
}

impl Login {
  /// Returns `(email, password)`.
  pub fn validate(self) -> Result<(String, String)> {
    let mut errors = Vec::new();
    let email = required(&mut errors, "email", self.email);
    let password = required(&mut errors, "password", self.password);
    match (email, password) {
      (Some(email), Some(password)) => Ok((email, password)),
      _ => Err(crate::Error::Validation(errors)),
    }
  }
}

/// Body of a self-service password change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChange {
  pub old_password: Option<String>,
  pub new_password: Option<String>,
}

impl PasswordChange {
  /// Returns `(old, new)`.
  pub fn validate(self) -> Result<(String, String)> {
    let mut errors = Vec::new();
    let old = required(&mut errors, "old_password", self.old_password);
    let new = required(&mut errors, "new_password", self.new_password);
    for (field, value) in [("old_password", &old), ("new_password", &new)] {
      if let Some(v) = value
        && v.chars().count() < PASSWORD_MIN_CHARS
      {
        errors.push(FieldError::new(
          field,
          format!("must be at least {PASSWORD_MIN_CHARS} characters"),
        ));
      }
    }
    match (old, new) {
      (Some(old), Some(new)) if errors.is_empty() => Ok((old, new)),
      _ => Err(crate::Error::Validation(errors)),
    }
  }
}

/// Record a "required" failure for a missing or blank value.
pub(crate) fn required(
  errors: &mut Vec<FieldError>,
  field: &'static str,
  value: Option<String>,
) -> Option<String> {
  match value {
    Some(v) if !v.trim().is_empty() => Some(v),
    _ => {
      errors.push(FieldError::new(field, "is required"));
      None
    }
  }
}
