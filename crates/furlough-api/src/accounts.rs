//! Handlers for account endpoints.
//!
//! | Method  | Path | Gate |
//! |---------|------|------|
//! | `POST`  | `/register` | public |
//! | `POST`  | `/login` | public |
//! | `GET`   | `/{admin,verificator}/users` | admin or verifier, scoped by role |
//! | `GET`   | `/{admin,verificator}/user/{id}` | admin or verifier |
//! | `POST`  | `/admin/verificator` | admin |
//! | `PATCH` | `/admin/users/{id}/verify` | admin (promote) |
//! | `PATCH` | `/admin/users/{id}/reset-password` | admin |
//! | `PATCH` | `/verificator/users/{id}/verify` | verifier (toggle) |
//! | `PATCH` | `/user/password` | user |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use furlough_core::{
  Error,
  account::{Account, AccountView, Login, PasswordChange, Registration},
  directory::{AccountListing, AccountScope},
  page::{PageRequest, SortOrder},
};
use serde::Serialize;

use crate::{
  AppState, Backend,
  auth::{AdminGate, Authorized, Gate, UserGate, VerifierGate},
  error::ApiError,
  extract::{JsonBody, ListParams, parse_id},
  response::WebResponse,
};

type ApiResult<T> = Result<Json<WebResponse<T>>, ApiError>;

// ─── Public ──────────────────────────────────────────────────────────────────

/// `POST /register`
pub async fn register<S: Backend>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<Registration>,
) -> Result<(StatusCode, Json<WebResponse<Account>>), ApiError> {
  let account = state.directory.register(body).await?;
  Ok((StatusCode::CREATED, Json(WebResponse::ok("Register successfully", account))))
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token: String,
}

/// `POST /login`
pub async fn login<S: Backend>(
  State(state): State<AppState<S>>,
  JsonBody(body): JsonBody<Login>,
) -> ApiResult<LoginResponse> {
  let token = state.directory.login(body).await?;
  Ok(Json(WebResponse::ok("Login successfully", LoginResponse { token })))
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// `GET /admin/users` and `GET /verificator/users`
///
/// Admins see users and verifiers; verifiers see users and may filter on
/// `verified`. Each account carries the requests it owns. An unrecognised
/// `order` sorts ascending.
pub async fn list_users<S: Backend, G: Gate>(
  State(state): State<AppState<S>>,
  caller: Authorized<G>,
  Query(params): Query<ListParams>,
) -> ApiResult<Vec<AccountView>> {
  let scope = AccountScope::for_caller(caller.identity.role, params.verified())
    .ok_or(ApiError::WrongRole(G::NAME))?;

  let listing = AccountListing {
    page: PageRequest::from_query(params.page.as_deref(), params.size.as_deref()),
    search: params.search.clone(),
    order: SortOrder::from_query(params.order.as_deref(), SortOrder::Asc),
    scope,
  };
  let page = state.directory.list_accounts(listing).await?;
  Ok(Json(WebResponse::paged("Success get all users", page)))
}

/// `GET /admin/user/{id}` and `GET /verificator/user/{id}`
pub async fn get_user<S: Backend, G: Gate>(
  State(state): State<AppState<S>>,
  _: Authorized<G>,
  Path(id): Path<String>,
) -> ApiResult<Account> {
  let id = parse_id(&id, "account")?;
  let account = state.directory.find_by_id(id).await?;
  Ok(Json(WebResponse::ok("User detail fetched successfully", account)))
}

// ─── Admin ───────────────────────────────────────────────────────────────────

/// `POST /admin/verificator` — a taken email is a 409 here.
pub async fn register_verificator<S: Backend>(
  State(state): State<AppState<S>>,
  _: Authorized<AdminGate>,
  JsonBody(body): JsonBody<Registration>,
) -> Result<(StatusCode, Json<WebResponse<Account>>), ApiError> {
  let account = state
    .directory
    .register_verificator(body)
    .await
    .map_err(|e| match e {
      Error::DuplicateEmail(email) => ApiError::EmailTaken(email),
      other => other.into(),
    })?;
  Ok((
    StatusCode::CREATED,
    Json(WebResponse::ok("Verificator registered successfully", account)),
  ))
}

/// `PATCH /admin/users/{id}/verify`
pub async fn promote<S: Backend>(
  State(state): State<AppState<S>>,
  _: Authorized<AdminGate>,
  Path(id): Path<String>,
) -> ApiResult<()> {
  let id = parse_id(&id, "account")?;
  state.directory.promote_to_verificator(id).await?;
  Ok(Json(WebResponse::done("Updated role successfully")))
}

/// `PATCH /admin/users/{id}/reset-password`
pub async fn reset_password<S: Backend>(
  State(state): State<AppState<S>>,
  _: Authorized<AdminGate>,
  Path(id): Path<String>,
) -> ApiResult<()> {
  let id = parse_id(&id, "account")?;
  state.directory.reset_password(id).await?;
  Ok(Json(WebResponse::done("Password reset successfully")))
}

// ─── Verifier ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct VerifiedFlag {
  pub verified: bool,
}

/// `PATCH /verificator/users/{id}/verify`
pub async fn toggle_verified<S: Backend>(
  State(state): State<AppState<S>>,
  _: Authorized<VerifierGate>,
  Path(id): Path<String>,
) -> ApiResult<VerifiedFlag> {
  let id = parse_id(&id, "account")?;
  let verified = state.directory.toggle_verified(id).await?;
  Ok(Json(WebResponse::ok(
    "User verify updated successfully",
    VerifiedFlag { verified },
  )))
}

// ─── User ────────────────────────────────────────────────────────────────────

/// `PATCH /user/password`
pub async fn change_password<S: Backend>(
  State(state): State<AppState<S>>,
  caller: Authorized<UserGate>,
  JsonBody(body): JsonBody<PasswordChange>,
) -> ApiResult<()> {
  state
    .directory
    .change_own_password(caller.identity.account_id, body)
    .await?;
  Ok(Json(WebResponse::done("Password updated successfully")))
}
