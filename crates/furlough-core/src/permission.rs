//! Permission requests — time-off requests owned by one account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{
  account::{AccountSummary, required},
  error::Result,
};

// ─── Status ──────────────────────────────────────────────────────────────────

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
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PermissionStatus {
  #[default]
  Pending,
  Approved,
  Rejected,
  Revised,
  Cancelled,
}

impl PermissionStatus {
  /// No further transition is possible from a terminal status.
  pub fn is_terminal(self) -> bool {
    match self {
      Self::Approved | Self::Rejected | Self::Cancelled => true,
      Self::Pending | Self::Revised => false,
    }
  }
}

/// A verifier's decision on a request. Only these three statuses can be set
/// through a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Approve,
  Reject,
  Revise,
}

impl Decision {
  pub fn status(self) -> PermissionStatus {
    match self {
      Self::Approve => PermissionStatus::Approved,
      Self::Reject => PermissionStatus::Rejected,
      Self::Revise => PermissionStatus::Revised,
    }
  }
}

// ─── Permission ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Permission {
  #[serde(rename = "id")]
  pub permission_id: Uuid,
  /// Foreign key to the owning account.
  pub account_id:    Uuid,
  pub title:         String,
  pub reason:        String,
  pub start_date:    DateTime<Utc>,
  pub end_date:      DateTime<Utc>,
  /// Verifier feedback, or the fixed note left by a cancellation.
  pub comment:       Option<String>,
  pub status:        PermissionStatus,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
  pub account:       AccountSummary,
}

/// A request listed under its owner's account, so the owner summary is left
/// out.
#[derive(Debug, Clone, Serialize)]
pub struct OwnedPermission {
  #[serde(rename = "id")]
  pub permission_id: Uuid,
  pub title:         String,
  pub reason:        String,
  pub start_date:    DateTime<Utc>,
  pub end_date:      DateTime<Utc>,
  pub comment:       Option<String>,
  pub status:        PermissionStatus,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

impl From<Permission> for OwnedPermission {
  fn from(p: Permission) -> Self {
    Self {
      permission_id: p.permission_id,
      title:         p.title,
      reason:        p.reason,
      start_date:    p.start_date,
      end_date:      p.end_date,
      comment:       p.comment,
      status:        p.status,
      created_at:    p.created_at,
      updated_at:    p.updated_at,
    }
  }
}

/// The editable fields of a request, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDetails {
  pub title:      String,
  pub reason:     String,
  pub start_date: DateTime<Utc>,
  pub end_date:   DateTime<Utc>,
}

/// Body accepted for create and update, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionDraft {
  pub title:      Option<String>,
  pub reason:     Option<String>,
  pub start_date: Option<DateTime<Utc>>,
  pub end_date:   Option<DateTime<Utc>>,
}

impl PermissionDraft {
  pub fn validate(self) -> Result<PermissionDetails> {
    let mut errors = Vec::new();
    let title = required(&mut errors, "title", self.title);
    let reason = required(&mut errors, "reason", self.reason);
    if self.start_date.is_none() {
      errors.push(crate::FieldError::new("start_date", "is required"));
    }
    if self.end_date.is_none() {
      errors.push(crate::FieldError::new("end_date", "is required"));
    }

    match (title, reason, self.start_date, self.end_date) {
      (Some(title), Some(reason), Some(start_date), Some(end_date)) => {
        Ok(PermissionDetails { title, reason, start_date, end_date })
      }
      _ => Err(crate::Error::Validation(errors)),
    }
  }
}

/// Input to [`crate::store::PermissionStore::insert_permission`].
#[derive(Debug, Clone)]
pub struct NewPermission {
  pub account_id: Uuid,
  pub details:    PermissionDetails,
}
