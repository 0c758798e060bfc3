//! The store traits and supporting query types.
//!
//! Implemented by storage backends (e.g. `furlough-store-sqlite`). The
//! services in [`crate::directory`] and [`crate::lifecycle`] depend on these
//! abstractions, not on any concrete backend.
//!
//! Stores apply no business rules: ownership and status preconditions are
//! checked by the services before a write is issued. Email uniqueness is
//! also enforced by the store, so a concurrent registration cannot slip past
//! the directory's lookup.

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::{Account, NewAccount, Role},
  page::SortOrder,
  permission::{NewPermission, Permission, PermissionDetails, PermissionStatus},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`AccountStore::list_accounts`].
#[derive(Debug, Clone, Default)]
pub struct AccountQuery {
  /// Only accounts whose role is one of these. Empty matches nothing.
  pub roles:    Vec<Role>,
  /// Case-insensitive substring filter on the account name.
  pub search:   Option<String>,
  pub verified: Option<bool>,
  pub order:    SortOrder,
  pub limit:    u64,
  pub offset:   u64,
}

/// Parameters for [`PermissionStore::list_permissions`].
#[derive(Debug, Clone, Default)]
pub struct PermissionQuery {
  pub status: Option<PermissionStatus>,
  pub order:  SortOrder,
  pub limit:  u64,
  pub offset: u64,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Persistence for account records.
///
/// Update methods return `false` when no row matched the id.
pub trait AccountStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new account; the store assigns its id and creation time.
  /// Returns `None` if another account already holds the email.
  fn insert_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn find_account_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Return one page of matching accounts and the total match count.
  fn list_accounts(
    &self,
    query: AccountQuery,
  ) -> impl Future<Output = Result<(Vec<Account>, u64), Self::Error>> + Send + '_;

  fn set_password_hash(
    &self,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Set role and verified flag in a single statement.
  fn set_role(
    &self,
    id: Uuid,
    role: Role,
    verified: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn set_verified(
    &self,
    id: Uuid,
    verified: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Persistence for permission requests. Every returned [`Permission`] carries
/// its owner's account summary.
pub trait PermissionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new request with status `pending`.
  fn insert_permission(
    &self,
    input: NewPermission,
  ) -> impl Future<Output = Result<Permission, Self::Error>> + Send + '_;

  fn get_permission(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Permission>, Self::Error>> + Send + '_;

  /// All requests owned by `account_id`, newest first.
  fn list_permissions_for_account(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Permission>, Self::Error>> + Send + '_;

  /// All requests owned by any of `account_ids`, newest first.
  fn list_permissions_for_accounts(
    &self,
    account_ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Permission>, Self::Error>> + Send + '_;

  /// Return one page of matching requests and the total match count.
  fn list_permissions(
    &self,
    query: PermissionQuery,
  ) -> impl Future<Output = Result<(Vec<Permission>, u64), Self::Error>> + Send + '_;

  /// Overwrite the editable fields. The status is left as it is.
  fn update_permission_details(
    &self,
    id: Uuid,
    details: PermissionDetails,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn set_permission_status(
    &self,
    id: Uuid,
    status: PermissionStatus,
    comment: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_permission(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}
