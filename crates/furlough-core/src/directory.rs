//! The account directory: registration, credentials, roles and verification.

use std::{collections::HashMap, sync::Arc};

use serde::Deserialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  account::{
    Account, AccountView, Login, NewAccount, PasswordChange, Registration,
    Role, ValidRegistration,
  },
  credentials::{CredentialHasher, TokenIssuer},
  page::{Page, PageMetadata, PageRequest, SortOrder},
  permission::OwnedPermission,
  store::{AccountQuery, AccountStore, PermissionStore},
};

/// Settings the directory needs at construction time.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
  /// The password an account is reset to by an administrator.
  pub default_password: String,
}

// ─── Scoping ─────────────────────────────────────────────────────────────────

/// Which accounts a caller is allowed to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountScope {
  pub roles:    Vec<Role>,
  pub verified: Option<bool>,
}

impl AccountScope {
  /// Scope for a caller of `role`. Admins see users and verifiers; verifiers
  /// see users only and may filter on the verified flag; users see nothing.
  pub fn for_caller(role: Role, verified: Option<bool>) -> Option<Self> {
    match role {
      Role::Admin => Some(Self {
        roles:    vec![Role::User, Role::Verifier],
        verified: None,
      }),
      Role::Verifier => Some(Self { roles: vec![Role::User], verified }),
      Role::User => None,
    }
  }
}

/// Parameters for [`AccountDirectory::list_accounts`].
#[derive(Debug, Clone)]
pub struct AccountListing {
  pub page:   PageRequest,
  pub search: Option<String>,
  pub order:  SortOrder,
  pub scope:  AccountScope,
}

// ─── Directory ───────────────────────────────────────────────────────────────

pub struct AccountDirectory<S> {
  store:            Arc<S>,
  hasher:           Arc<dyn CredentialHasher>,
  tokens:           Arc<dyn TokenIssuer>,
  default_password: String,
}

impl<S: AccountStore> AccountDirectory<S> {
  pub fn new(
    store: Arc<S>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenIssuer>,
    config: &DirectoryConfig,
  ) -> Self {
    Self {
      store,
      hasher,
      tokens,
      default_password: config.default_password.clone(),
    }
  }

  /// Register a plain user account (role `user`, unverified).
  pub async fn register(&self, input: Registration) -> Result<Account> {
    let input = input.validate()?;
    self.create(input, Role::User, false).await
  }

  /// Register a verifier account, verified from the start. Callers must
  /// already be authorised as an administrator.
  pub async fn register_verificator(
    &self,
    input: Registration,
  ) -> Result<Account> {
    let input = input.validate()?;
    self.create(input, Role::Verifier, true).await
  }

  /// Create an administrator unless the email is already taken. Returns
  /// `None` if an account with that email exists.
  pub async fn bootstrap_admin(
    &self,
    input: Registration,
  ) -> Result<Option<Account>> {
    let input = input.validate()?;
    match self.create(input, Role::Admin, true).await {
      Ok(account) => Ok(Some(account)),
      Err(Error::DuplicateEmail(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn create(
    &self,
    input: ValidRegistration,
    role: Role,
    verified: bool,
  ) -> Result<Account> {
    let existing = self
      .store
      .find_account_by_email(input.email.clone())
      .await
      .map_err(Error::store)?;
    if existing.is_some() {
      tracing::warn!(email = %input.email, "email already in use");
      return Err(Error::DuplicateEmail(input.email));
    }

    let password_hash = self.hasher.hash(&input.password)?;
    let email = input.email.clone();
    let Some(account) = self
      .store
      .insert_account(NewAccount {
        name: input.name,
        email: input.email,
        password_hash,
        role,
        verified,
      })
      .await
      .map_err(Error::store)?
    else {
      tracing::warn!(%email, "email taken by a concurrent registration");
      return Err(Error::DuplicateEmail(email));
    };

    tracing::info!(account_id = %account.account_id, %role, "account created");
    Ok(account)
  }

  /// Check credentials and issue an access token.
  pub async fn login(&self, input: Login) -> Result<String> {
    let (email, password) = input.validate()?;

    let Some(account) = self
      .store
      .find_account_by_email(email)
      .await
      .map_err(Error::store)?
    else {
      tracing::warn!("login for unknown email");
      return Err(Error::InvalidCredentials);
    };

    if !self.hasher.verify(&password, &account.password_hash)? {
      tracing::warn!(account_id = %account.account_id, "login with wrong password");
      return Err(Error::InvalidCredentials);
    }

    self.tokens.issue(&account.identity())
  }

  /// Reset an account's password to the configured default.
  pub async fn reset_password(&self, id: Uuid) -> Result<()> {
    let hash = self.hasher.hash(&self.default_password)?;
    let updated = self
      .store
      .set_password_hash(id, hash)
      .await
      .map_err(Error::store)?;
    if !updated {
      return Err(Error::AccountNotFound(id));
    }
    tracing::info!(account_id = %id, "password reset to default");
    Ok(())
  }

  /// Replace the caller's own password after checking the old one.
  pub async fn change_own_password(
    &self,
    id: Uuid,
    input: PasswordChange,
  ) -> Result<()> {
    let (old, new) = input.validate()?;
    let account = self.find_by_id(id).await?;

    if !self.hasher.verify(&old, &account.password_hash)? {
      tracing::warn!(account_id = %id, "password change with wrong old password");
      return Err(Error::WrongOldPassword);
    }

    let hash = self.hasher.hash(&new)?;
    let updated = self
      .store
      .set_password_hash(id, hash)
      .await
      .map_err(Error::store)?;
    if !updated {
      return Err(Error::AccountNotFound(id));
    }
    Ok(())
  }

  /// Make an account a verifier and mark it verified.
  pub async fn promote_to_verificator(&self, id: Uuid) -> Result<()> {
    let updated = self
      .store
      .set_role(id, Role::Verifier, true)
      .await
      .map_err(Error::store)?;
    if !updated {
      return Err(Error::AccountNotFound(id));
    }
    tracing::info!(account_id = %id, "account promoted to verifier");
    Ok(())
  }

  /// Flip the verified flag and return its new value.
  pub async fn toggle_verified(&self, id: Uuid) -> Result<bool> {
    let account = self.find_by_id(id).await?;
    let verified = !account.verified;
    let updated = self
      .store
      .set_verified(id, verified)
      .await
      .map_err(Error::store)?;
    if !updated {
      return Err(Error::AccountNotFound(id));
    }
    Ok(verified)
  }

  pub async fn find_by_id(&self, id: Uuid) -> Result<Account> {
    self
      .store
      .get_account(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AccountNotFound(id))
  }
}

impl<S: AccountStore + PermissionStore> AccountDirectory<S> {
  /// One page of accounts in scope, each with the requests it owns.
  pub async fn list_accounts(
    &self,
    listing: AccountListing,
  ) -> Result<Page<AccountView>> {
    let query = AccountQuery {
      roles:    listing.scope.roles,
      search:   listing.search.filter(|s| !s.is_empty()),
      verified: listing.scope.verified,
      order:    listing.order,
      limit:    listing.page.limit(),
      offset:   listing.page.offset(),
    };
    let (accounts, total) =
      self.store.list_accounts(query).await.map_err(Error::store)?;

    let ids = accounts.iter().map(|a| a.account_id).collect();
    let mut owned: HashMap<Uuid, Vec<OwnedPermission>> = HashMap::new();
    for permission in self
      .store
      .list_permissions_for_accounts(ids)
      .await
      .map_err(Error::store)?
    {
      owned
        .entry(permission.account_id)
        .or_default()
        .push(permission.into());
    }

    let items = accounts
      .into_iter()
      .map(|account| AccountView {
        permissions: owned.remove(&account.account_id).unwrap_or_default(),
        account,
      })
      .collect();
    Ok(Page { items, meta: PageMetadata::new(listing.page, total) })
  }
}
