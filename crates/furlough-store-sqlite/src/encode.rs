//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! UUIDs are stored as hyphenated lowercase strings; enums as their lowercase
//! names.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use furlough_core::{
  account::{Account, AccountSummary, Role},
  permission::{Permission, PermissionStatus},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_role(role: Role) -> &'static str { role.into() }

pub fn decode_role(s: &str) -> Result<Role> {
  Role::from_str(s).map_err(|_| Error::UnknownValue {
    column: "role",
    value:  s.to_owned(),
  })
}

pub fn encode_status(status: PermissionStatus) -> &'static str { status.into() }

pub fn decode_status(s: &str) -> Result<PermissionStatus> {
  PermissionStatus::from_str(s).map_err(|_| Error::UnknownValue {
    column: "status",
    value:  s.to_owned(),
  })
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Column list matching [`RawAccount::from_row`].
pub const ACCOUNT_COLUMNS: &str =
  "account_id, name, email, password_hash, role, verified, created_at";

/// An `accounts` row as read from SQLite, before decoding.
pub struct RawAccount {
  pub account_id:    String,
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          String,
  pub verified:      bool,
  pub created_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      role:          row.get(4)?,
      verified:      row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:    decode_uuid(&self.account_id)?,
      name:          self.name,
      email:         self.email,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      verified:      self.verified,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Select list for a permission joined with its owner, matching
/// [`RawPermission::from_row`]. Expects `permissions p JOIN accounts a`.
pub const PERMISSION_COLUMNS: &str = "
  p.permission_id, p.account_id, p.title, p.reason, p.start_date, p.end_date,
  p.comment, p.status, p.created_at, p.updated_at,
  a.name, a.email, a.role, a.verified, a.created_at";

/// A `permissions` row joined with its owning account, before decoding.
pub struct RawPermission {
  pub permission_id:      String,
  pub account_id:         String,
  pub title:              String,
  pub reason:             String,
  pub start_date:         String,
  pub end_date:           String,
  pub comment:            Option<String>,
  pub status:             String,
  pub created_at:         String,
  pub updated_at:         String,
  pub account_name:       String,
  pub account_email:      String,
  pub account_role:       String,
  pub account_verified:   bool,
  pub account_created_at: String,
}

impl RawPermission {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      permission_id:      row.get(0)?,
      account_id:         row.get(1)?,
      title:              row.get(2)?,
      reason:             row.get(3)?,
      start_date:         row.get(4)?,
      end_date:           row.get(5)?,
      comment:            row.get(6)?,
      status:             row.get(7)?,
      created_at:         row.get(8)?,
      updated_at:         row.get(9)?,
      account_name:       row.get(10)?,
      account_email:      row.get(11)?,
      account_role:       row.get(12)?,
      account_verified:   row.get(13)?,
      account_created_at: row.get(14)?,
    })
  }

  pub fn into_permission(self) -> Result<Permission> {
    let account_id = decode_uuid(&self.account_id)?;
    Ok(Permission {
      permission_id: decode_uuid(&self.permission_id)?,
      account_id,
      title: self.title,
      reason: self.reason,
      start_date: decode_dt(&self.start_date)?,
      end_date: decode_dt(&self.end_date)?,
      comment: self.comment,
      status: decode_status(&self.status)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      account: AccountSummary {
        account_id,
        name: self.account_name,
        email: self.account_email,
        role: decode_role(&self.account_role)?,
        verified: self.account_verified,
        created_at: decode_dt(&self.account_created_at)?,
      },
    })
  }
}
