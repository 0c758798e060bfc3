//! HTTP layer for Furlough.
//!
//! Exposes an axum [`Router`] serving the `/api/v1` JSON API on top of any
//! backend implementing both [`AccountStore`] and [`PermissionStore`].
//! Business rules live in `furlough-core`; this crate authenticates the
//! caller, checks the role gate, and shapes responses.

pub mod accounts;
pub mod auth;
pub mod error;
pub mod extract;
pub mod permissions;
pub mod response;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use furlough_core::{
  account::Registration,
  credentials::CredentialHasher,
  directory::{AccountDirectory, DirectoryConfig},
  lifecycle::PermissionLifecycle,
  store::{AccountStore, PermissionStore},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AdminGate, JwtKeys, UserGate, VerifierGate};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FURLOUGH_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  pub jwt_secret:       String,
  #[serde(default = "default_token_ttl")]
  pub token_ttl_secs:   i64,
  /// Password an administrator resets accounts to.
  pub default_password: String,
  pub admin_name:       Option<String>,
  pub admin_email:      Option<String>,
  pub admin_password:   Option<String>,
}

fn default_token_ttl() -> i64 { 24 * 60 * 60 }

impl ServerConfig {
  pub fn directory(&self) -> DirectoryConfig {
    DirectoryConfig { default_password: self.default_password.clone() }
  }

  /// The administrator to create at startup, if all three fields are set.
  pub fn bootstrap_admin(&self) -> Option<Registration> {
    match (&self.admin_name, &self.admin_email, &self.admin_password) {
      (Some(name), Some(email), Some(password)) => Some(Registration {
        name:     Some(name.clone()),
        email:    Some(email.clone()),
        password: Some(password.clone()),
      }),
      _ => None,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Any store that can back the whole API.
pub trait Backend: AccountStore + PermissionStore + Clone + 'static {}

impl<T> Backend for T where T: AccountStore + PermissionStore + Clone + 'static {}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Backend> {
  pub directory: Arc<AccountDirectory<S>>,
  pub lifecycle: Arc<PermissionLifecycle<S>>,
  pub jwt:       Arc<JwtKeys>,
}

impl<S: Backend> AppState<S> {
  pub fn new(
    store: Arc<S>,
    hasher: Arc<dyn CredentialHasher>,
    jwt: JwtKeys,
    config: &DirectoryConfig,
  ) -> Self {
    let jwt = Arc::new(jwt);
    Self {
      directory: Arc::new(AccountDirectory::new(
        store.clone(),
        hasher,
        jwt.clone(),
        config,
      )),
      lifecycle: Arc::new(PermissionLifecycle::new(store)),
      jwt,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full router, with every route nested under `/api/v1`.
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  let admin = Router::new()
    .route("/users",                     get(accounts::list_users::<S, AdminGate>))
    .route("/user/{id}",                 get(accounts::get_user::<S, AdminGate>))
    .route("/verificator",               post(accounts::register_verificator::<S>))
    .route("/users/{id}/verify",         patch(accounts::promote::<S>))
    .route("/users/{id}/reset-password", patch(accounts::reset_password::<S>))
    .route("/permissions",               get(permissions::list_all::<S, AdminGate>))
    .route("/permission/{id}",           get(permissions::get_one::<S, AdminGate>));

  let verificator = Router::new()
    .route("/users",                     get(accounts::list_users::<S, VerifierGate>))
    .route("/user/{id}",                 get(accounts::get_user::<S, VerifierGate>))
    .route("/users/{id}/verify",         patch(accounts::toggle_verified::<S>))
    .route("/permissions",               get(permissions::list_all::<S, VerifierGate>))
    .route("/permissions/{id}",          get(permissions::get_one::<S, VerifierGate>))
    .route("/permissions/{id}/approve",  patch(permissions::approve::<S>))
    .route("/permissions/{id}/reject",   patch(permissions::reject::<S>))
    .route("/permissions/{id}/revision", patch(permissions::revise::<S>));

  let user = Router::new()
    .route("/password", patch(accounts::change_password::<S>))
    .route(
      "/permissions",
      get(permissions::list_mine::<S>).post(permissions::create::<S>),
    )
    .route(
      "/permissions/{id}",
      get(permissions::get_one::<S, UserGate>)
        .put(permissions::update::<S>)
        .delete(permissions::delete::<S>),
    )
    .route("/permissions/{id}/cancel", patch(permissions::cancel::<S>));

  let api = Router::new()
    .route("/register", post(accounts::register::<S>))
    .route("/login",    post(accounts::login::<S>))
    .nest("/admin", admin)
    .nest("/verificator", verificator)
    .nest("/user", user);

  Router::new()
    .nest("/api/v1", api)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests;
