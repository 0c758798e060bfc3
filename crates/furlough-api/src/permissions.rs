//! Handlers for permission-request endpoints.
//!
//! | Method   | Path | Gate |
//! |----------|------|------|
//! | `GET`    | `/admin/permissions`, `/verificator/permissions` | admin or verifier |
//! | `GET`    | `/admin/permission/{id}`, `/{verificator,user}/permissions/{id}` | any gate |
//! | `PATCH`  | `/verificator/permissions/{id}/{approve,reject,revision}` | verifier |
//! | `POST`   | `/user/permissions` | user |
//! | `GET`    | `/user/permissions` | user, own requests only |
//! | `PUT`    | `/user/permissions/{id}` | user, owner |
//! | `PATCH`  | `/user/permissions/{id}/cancel` | user, owner |
//! | `DELETE` | `/user/permissions/{id}` | user, owner |

use std::str::FromStr;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use furlough_core::{
  Error,
  account::Role,
  lifecycle::PermissionListing,
  page::{PageRequest, SortOrder},
  permission::{Decision, Permission, PermissionDraft, PermissionStatus},
};
use serde::Deserialize;

use crate::{
  AppState, Backend,
  auth::{Authorized, Gate, UserGate, VerifierGate},
  error::ApiError,
  extract::{JsonBody, ListParams, parse_id},
  response::WebResponse,
};

type ApiResult<T> = Result<Json<WebResponse<T>>, ApiError>;

// ─── Reading ─────────────────────────────────────────────────────────────────

/// `GET /admin/permissions` and `GET /verificator/permissions`
///
/// Admins always see every status. Verifiers may narrow with `status`.
pub async fn list_all<S: Backend, G: Gate>(
  State(state): State<AppState<S>>,
  caller: Authorized<G>,
  Query(params): Query<ListParams>,
) -> ApiResult<Vec<Permission>> {
  let status = match caller.identity.role {
    Role::Admin => None,
    Role::Verifier => parse_status(params.status.as_deref())?,
    Role::User => return Err(ApiError::WrongRole(G::NAME)),
  };

  let listing = PermissionListing {
    page: PageRequest::from_query(params.page.as_deref(), params.size.as_deref()),
    status,
    order: SortOrder::from_query(params.order.as_deref(), SortOrder::Desc),
  };
  let page = state.lifecycle.list_all(listing).await?;
  Ok(Json(WebResponse::paged("Success retrieve permission requests", page)))
}

fn parse_status(raw: Option<&str>) -> Result<Option<PermissionStatus>, Error> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) => PermissionStatus::from_str(s).map(Some).map_err(|_| {
      Error::invalid(
        "status",
        "must be one of pending, approved, rejected, revised, cancelled",
      )
    }),
  }
}

/// `GET .../permission(s)/{id}`
pub async fn get_one<S: Backend, G: Gate>(
  State(state): State<AppState<S>>,
  _: Authorized<G>,
  Path(id): Path<String>,
) -> ApiResult<Permission> {
  let id = parse_id(&id, "permission")?;
  let permission = state.lifecycle.get_by_id(id).await?;
  Ok(Json(WebResponse::ok("Permission retrieved", permission)))
}

/// `GET /user/permissions` — newest first, unpaginated.
pub async fn list_mine<S: Backend>(
  State(state): State<AppState<S>>,
  caller: Authorized<UserGate>,
) -> ApiResult<Vec<Permission>> {
  let permissions = state.lifecycle.list_mine(caller.identity.account_id).await?;
  Ok(Json(WebResponse::ok("User permissions retrieved", permissions)))
}

// ─── Verifier decisions ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DecisionBody {
  pub comment: Option<String>,
}

async fn decide<S: Backend>(
  state: AppState<S>,
  id: String,
  body: DecisionBody,
  decision: Decision,
) -> ApiResult<Permission> {
  let id = parse_id(&id, "permission")?;
  let permission = state
    .lifecycle
    .change_status(id, decision, body.comment)
    .await?;
  tracing::info!(permission_id = %id, status = %permission.status, "permission decided");
  let message = format!("Permission {} successfully", permission.status);
  Ok(Json(WebResponse::ok(message, permission)))
}

/// `PATCH /verificator/permissions/{id}/approve`
pub async fn approve<S: Backend>(
  State(state): State<AppState<S>>,
  _: Authorized<VerifierGate>,
  Path(id): Path<String>,
  JsonBody(body): JsonBody<DecisionBody>,
) -> ApiResult<Permission> {
  decide(state, id, body, Decision::Approve).await
}

/// `PATCH /verificator/permissions/{id}/reject`
pub async fn reject<S: Backend>(
  State(state): State<AppState<S>>,
  _: Authorized<VerifierGate>,
  Path(id): Path<String>,
  JsonBody(body): JsonBody<DecisionBody>,
) -> ApiResult<Permission> {
  decide(state, id, body, Decision::Reject).await
}

/// `PATCH /verificator/permissions/{id}/revision`
pub async fn revise<S: Backend>(
  State(state): State<AppState<S>>,
  _: Authorized<VerifierGate>,
  Path(id): Path<String>,
  JsonBody(body): JsonBody<DecisionBody>,
) -> ApiResult<Permission> {
  decide(state, id, body, Decision::Revise).await
}

// ─── Owner actions ───────────────────────────────────────────────────────────

/// `POST /user/permissions`
pub async fn create<S: Backend>(
  State(state): State<AppState<S>>,
  caller: Authorized<UserGate>,
  JsonBody(body): JsonBody<PermissionDraft>,
) -> Result<(StatusCode, Json<WebResponse<Permission>>), ApiError> {
  let permission = state.lifecycle.create(caller.identity.account_id, body).await?;
  Ok((
    StatusCode::CREATED,
    Json(WebResponse::ok("Permission created successfully", permission)),
  ))
}

/// `PUT /user/permissions/{id}`
pub async fn update<S: Backend>(
  State(state): State<AppState<S>>,
  caller: Authorized<UserGate>,
  Path(id): Path<String>,
  JsonBody(body): JsonBody<PermissionDraft>,
) -> ApiResult<Permission> {
  let id = parse_id(&id, "permission")?;
  let permission = state
    .lifecycle
    .update(caller.identity.account_id, id, body)
    .await?;
  Ok(Json(WebResponse::ok("Permission updated successfully", permission)))
}

/// `PATCH /user/permissions/{id}/cancel`
pub async fn cancel<S: Backend>(
  State(state): State<AppState<S>>,
  caller: Authorized<UserGate>,
  Path(id): Path<String>,
) -> ApiResult<Permission> {
  let id = parse_id(&id, "permission")?;
  let permission = state.lifecycle.cancel(caller.identity.account_id, id).await?;
  Ok(Json(WebResponse::ok("Permission cancelled successfully", permission)))
}

/// `DELETE /user/permissions/{id}`
pub async fn delete<S: Backend>(
  State(state): State<AppState<S>>,
  caller: Authorized<UserGate>,
  Path(id): Path<String>,
) -> ApiResult<()> {
  let id = parse_id(&id, "permission")?;
  state.lifecycle.delete(caller.identity.account_id, id).await?;
  Ok(Json(WebResponse::done("Permission deleted successfully")))
}
