//! The permission lifecycle: creation, verifier decisions and owner actions.
//!
//! ```text
//! pending ──approve──▶ approved
//!    │    ──reject───▶ rejected
//!    │    ──revise───▶ revised ──approve | reject | revise──▶ …
//!    └── owner cancel (pending | revised) ──▶ cancelled
//!    └── owner delete (pending) ──▶ removed
//! ```
//!
//! Owner edits leave the status as it is. Approved, rejected and cancelled
//! are terminal. Verifiers may act on any request regardless of owner;
//! owners act only on their own requests.

use std::sync::Arc;

use strum::Display;
use uuid::Uuid;

use crate::{
  Error, Result,
  page::{Page, PageMetadata, PageRequest, SortOrder},
  permission::{
    Decision, NewPermission, Permission, PermissionDraft, PermissionStatus,
  },
  store::{PermissionQuery, PermissionStore},
};

/// Comment recorded when an owner cancels a request.
pub const CANCELLED_COMMENT: &str = "Cancelled by user";

// ─── Owner guard ─────────────────────────────────────────────────────────────

/// An action only the owner of a request may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum OwnerAction {
  #[strum(serialize = "edited")]
  Edit,
  #[strum(serialize = "cancelled")]
  Cancel,
  #[strum(serialize = "deleted")]
  Delete,
}

impl OwnerAction {
  pub fn permits(self, status: PermissionStatus) -> bool {
    use PermissionStatus::*;
    match self {
      Self::Edit | Self::Cancel => matches!(status, Pending | Revised),
      Self::Delete => status == Pending,
    }
  }
}

/// Check that `caller` owns `permission` and that its current status allows
/// `action`. Ownership is checked first.
pub fn authorize_owner_action(
  permission: &Permission,
  caller: Uuid,
  action: OwnerAction,
) -> Result<()> {
  if permission.account_id != caller {
    tracing::warn!(
      permission_id = %permission.permission_id,
      %caller,
      %action,
      "owner action attempted by another account"
    );
    return Err(Error::NotOwner {
      permission_id: permission.permission_id,
      action,
    });
  }
  if !action.permits(permission.status) {
    tracing::warn!(
      permission_id = %permission.permission_id,
      status = %permission.status,
      %action,
      "owner action not allowed in current status"
    );
    return Err(Error::InvalidTransition {
      permission_id: permission.permission_id,
      status: permission.status,
      action,
    });
  }
  Ok(())
}

// ─── Manager ─────────────────────────────────────────────────────────────────

/// Parameters for [`PermissionLifecycle::list_all`].
#[derive(Debug, Clone, Default)]
pub struct PermissionListing {
  pub page:   PageRequest,
  pub status: Option<PermissionStatus>,
  pub order:  SortOrder,
}

pub struct PermissionLifecycle<S> {
  store: Arc<S>,
}

impl<S: PermissionStore> PermissionLifecycle<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Submit a new request on behalf of `owner`. Status starts at `pending`.
  pub async fn create(
    &self,
    owner: Uuid,
    draft: PermissionDraft,
  ) -> Result<Permission> {
    let details = draft.validate()?;
    self
      .store
      .insert_permission(NewPermission { account_id: owner, details })
      .await
      .map_err(Error::store)
  }

  pub async fn list_mine(&self, owner: Uuid) -> Result<Vec<Permission>> {
    self
      .store
      .list_permissions_for_account(owner)
      .await
      .map_err(Error::store)
  }

  pub async fn list_all(
    &self,
    listing: PermissionListing,
  ) -> Result<Page<Permission>> {
    let query = PermissionQuery {
      status: listing.status,
      order:  listing.order,
      limit:  listing.page.limit(),
      offset: listing.page.offset(),
    };
    let (items, total) = self
      .store
      .list_permissions(query)
      .await
      .map_err(Error::store)?;
    Ok(Page { items, meta: PageMetadata::new(listing.page, total) })
  }

  pub async fn get_by_id(&self, id: Uuid) -> Result<Permission> {
    self
      .store
      .get_permission(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::PermissionNotFound(id))
  }

  /// Record a verifier decision. The comment is mandatory and a terminal
  /// request cannot be decided again.
  pub async fn change_status(
    &self,
    id: Uuid,
    decision: Decision,
    comment: Option<String>,
  ) -> Result<Permission> {
    let comment = match comment {
      Some(c) if !c.trim().is_empty() => c,
      _ => return Err(Error::invalid("comment", "is required")),
    };

    let permission = self.get_by_id(id).await?;
    if permission.status.is_terminal() {
      tracing::warn!(
        permission_id = %id,
        status = %permission.status,
        "decision on a terminal permission"
      );
      return Err(Error::AlreadyFinal {
        permission_id: id,
        status:        permission.status,
      });
    }

    self.write_status(id, decision.status(), comment).await?;
    self.get_by_id(id).await
  }

  /// Edit a request's details. The status is unchanged, so a revised request
  /// stays revised until a verifier decides it again.
  pub async fn update(
    &self,
    owner: Uuid,
    id: Uuid,
    draft: PermissionDraft,
  ) -> Result<Permission> {
    let details = draft.validate()?;
    let permission = self.get_by_id(id).await?;
    authorize_owner_action(&permission, owner, OwnerAction::Edit)?;

    let updated = self
      .store
      .update_permission_details(id, details)
      .await
      .map_err(Error::store)?;
    if !updated {
      return Err(Error::PermissionNotFound(id));
    }
    self.get_by_id(id).await
  }

  pub async fn cancel(&self, owner: Uuid, id: Uuid) -> Result<Permission> {
    let permission = self.get_by_id(id).await?;
    authorize_owner_action(&permission, owner, OwnerAction::Cancel)?;

    self
      .write_status(id, PermissionStatus::Cancelled, CANCELLED_COMMENT.to_owned())
      .await?;
    self.get_by_id(id).await
  }

  pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<()> {
    let permission = self.get_by_id(id).await?;
    authorize_owner_action(&permission, owner, OwnerAction::Delete)?;

    let deleted =
      self.store.delete_permission(id).await.map_err(Error::store)?;
    if !deleted {
      return Err(Error::PermissionNotFound(id));
    }
    Ok(())
  }

  async fn write_status(
    &self,
    id: Uuid,
    status: PermissionStatus,
    comment: String,
  ) -> Result<()> {
    let updated = self
      .store
      .set_permission_status(id, status, comment)
      .await
      .map_err(Error::store)?;
    if !updated {
      return Err(Error::PermissionNotFound(id));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::account::{AccountSummary, Role};

  fn permission(owner: Uuid, status: PermissionStatus) -> Permission {
    let now = Utc::now();
    Permission {
      permission_id: Uuid::new_v4(),
      account_id: owner,
      title: "Family trip".into(),
      reason: "Visiting relatives".into(),
      start_date: now,
      end_date: now,
      comment: None,
      status,
      created_at: now,
      updated_at: now,
      account: AccountSummary {
        account_id: owner,
        name:       "Ana".into(),
        email:      "ana@example.com".into(),
        role:       Role::User,
        verified:   false,
        created_at: now,
      },
    }
  }

  const ALL: [PermissionStatus; 5] = [
    PermissionStatus::Pending,
    PermissionStatus::Approved,
    PermissionStatus::Rejected,
    PermissionStatus::Revised,
    PermissionStatus::Cancelled,
  ];

  #[test]
  fn edit_and_cancel_allowed_from_pending_or_revised() {
    let owner = Uuid::new_v4();
    for action in [OwnerAction::Edit, OwnerAction::Cancel] {
      for status in ALL {
        let result = authorize_owner_action(&permission(owner, status), owner, action);
        let expected = matches!(
          status,
          PermissionStatus::Pending | PermissionStatus::Revised
        );
        assert_eq!(result.is_ok(), expected, "{action} from {status}");
        if !expected {
          assert!(matches!(result, Err(Error::InvalidTransition { .. })));
        }
      }
    }
  }

  #[test]
  fn delete_allowed_only_from_pending() {
    let owner = Uuid::new_v4();
    for status in ALL {
      let result =
        authorize_owner_action(&permission(owner, status), owner, OwnerAction::Delete);
      assert_eq!(result.is_ok(), status == PermissionStatus::Pending);
    }
  }

  #[test]
  fn other_accounts_are_rejected_before_status_is_checked() {
    let p = permission(Uuid::new_v4(), PermissionStatus::Approved);
    let err = authorize_owner_action(&p, Uuid::new_v4(), OwnerAction::Edit)
      .unwrap_err();
    assert!(matches!(err, Error::NotOwner { action: OwnerAction::Edit, .. }));
  }

  #[test]
  fn owner_action_display() {
    assert_eq!(OwnerAction::Edit.to_string(), "edited");
    assert_eq!(OwnerAction::Cancel.to_string(), "cancelled");
    assert_eq!(OwnerAction::Delete.to_string(), "deleted");
  }
}
