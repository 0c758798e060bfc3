//! Router tests: the full `/api/v1` surface over an in-memory store.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use furlough_core::{
  account::Registration, credentials::CredentialHasher,
  directory::DirectoryConfig,
};
use furlough_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use super::*;

/// Stores passwords as-is so tests don't pay for Argon2.
struct PlainHasher;

impl CredentialHasher for PlainHasher {
  fn hash(&self, password: &str) -> furlough_core::Result<String> {
    Ok(format!("plain:{password}"))
  }

  fn verify(&self, password: &str, hash: &str) -> furlough_core::Result<bool> {
    Ok(hash.strip_prefix("plain:") == Some(password))
  }
}

const PASSWORD: &str = "hunter22";
const DEFAULT_PASSWORD: &str = "changeme";

async fn make_state() -> AppState<SqliteStore> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  AppState::new(
    Arc::new(store),
    Arc::new(PlainHasher),
    JwtKeys::new("test-secret", 3600),
    &DirectoryConfig { default_password: DEFAULT_PASSWORD.into() },
  )
}

fn registration(name: &str, email: &str) -> Registration {
  Registration {
    name:     Some(name.into()),
    email:    Some(email.into()),
    password: Some(PASSWORD.into()),
  }
}

async fn send(
  state:  &AppState<SqliteStore>,
  method: &str,
  uri:    &str,
  token:  Option<&str>,
  body:   Option<String>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(token) = token {
    builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
  }
  let body = match body {
    Some(b) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(b)
    }
    None => Body::empty(),
  };

  let resp = router(state.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let json = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, json)
}

async fn login(state: &AppState<SqliteStore>, email: &str, password: &str) -> String {
  let (status, body) = send(
    state,
    "POST",
    "/api/v1/login",
    None,
    Some(json!({ "email": email, "password": password }).to_string()),
  )
  .await;
  assert_eq!(status, StatusCode::OK, "login {email}: {body}");
  body["data"]["token"].as_str().unwrap().to_string()
}

/// Tokens for one account of each role.
struct Tokens {
  admin:    String,
  verifier: String,
  user:     String,
}

async fn seeded() -> (AppState<SqliteStore>, Tokens) {
  let state = make_state().await;
  state
    .directory
    .bootstrap_admin(registration("Root", "root@example.com"))
    .await
    .unwrap();
  state
    .directory
    .register_verificator(registration("Vera", "vera@example.com"))
    .await
    .unwrap();
  state
    .directory
    .register(registration("Ana", "ana@example.com"))
    .await
    .unwrap();

  let tokens = Tokens {
    admin:    login(&state, "root@example.com", PASSWORD).await,
    verifier: login(&state, "vera@example.com", PASSWORD).await,
    user:     login(&state, "ana@example.com", PASSWORD).await,
  };
  (state, tokens)
}

fn draft(title: &str) -> String {
  json!({
    "title": title,
    "reason": "Family matters",
    "start_date": "2024-07-01T00:00:00Z",
    "end_date": "2024-07-04T00:00:00Z",
  })
  .to_string()
}

// ── Registration & login ─────────────────────────────────────────────────────

#[tokio::test]
async fn register_creates_unverified_user() {
  let state = make_state().await;
  let (status, body) = send(
    &state,
    "POST",
    "/api/v1/register",
    None,
    Some(json!({ "name": "Ana", "email": "ana@example.com", "password": PASSWORD }).to_string()),
  )
  .await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["role"], "user");
  assert_eq!(body["data"]["verified"], false);
  assert!(body["data"].get("password_hash").is_none());
  assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn register_validation_lists_fields() {
  let state = make_state().await;
  let (status, body) = send(
    &state,
    "POST",
    "/api/v1/register",
    None,
    Some(json!({ "name": "Al" }).to_string()),
  )
  .await;

  assert_eq!(status, StatusCode::BAD_REQUEST);
  let fields: Vec<_> = body["errors"]["fields"]
    .as_array()
    .unwrap()
    .iter()
    .map(|f| f["field"].as_str().unwrap())
    .collect();
  assert_eq!(fields, ["name", "email", "password"]);
}

#[tokio::test]
async fn duplicate_email_is_422_on_register_and_409_for_verificators() {
  let (state, tokens) = seeded().await;

  let (status, _) = send(
    &state,
    "POST",
    "/api/v1/register",
    None,
    Some(json!({ "name": "Ana Two", "email": "ana@example.com", "password": PASSWORD }).to_string()),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) = send(
    &state,
    "POST",
    "/api/v1/admin/verificator",
    Some(tokens.admin.as_str()),
    Some(json!({ "name": "Vera Two", "email": "vera@example.com", "password": PASSWORD }).to_string()),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
  let (state, _) = seeded().await;

  let wrong_password = send(
    &state,
    "POST",
    "/api/v1/login",
    None,
    Some(json!({ "email": "ana@example.com", "password": "nope-nope" }).to_string()),
  )
  .await;
  let unknown_email = send(
    &state,
    "POST",
    "/api/v1/login",
    None,
    Some(json!({ "email": "ghost@example.com", "password": PASSWORD }).to_string()),
  )
  .await;

  assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
  assert_eq!(wrong_password, unknown_email);
  assert_eq!(wrong_password.1["errors"]["message"], "Incorrect email or password");
}

// ── Gates ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_or_invalid_token_is_401() {
  let state = make_state().await;

  let (status, body) = send(&state, "GET", "/api/v1/user/permissions", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(body["errors"]["message"].is_string());

  let (status, _) = send(
    &state,
    "GET",
    "/api/v1/admin/users",
    Some("not.a.token"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_role_is_403() {
  let (state, tokens) = seeded().await;

  for (uri, token) in [
    ("/api/v1/admin/users", &tokens.user),
    ("/api/v1/admin/users", &tokens.verifier),
    ("/api/v1/verificator/users", &tokens.admin),
    ("/api/v1/user/permissions", &tokens.admin),
    ("/api/v1/user/permissions", &tokens.verifier),
  ] {
    let (status, _) = send(&state, "GET", uri, Some(token.as_str()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
  }

  let (status, _) = send(
    &state,
    "POST",
    "/api/v1/admin/verificator",
    Some(tokens.verifier.as_str()),
    Some(json!({ "name": "Eve", "email": "eve@example.com", "password": PASSWORD }).to_string()),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ── Accounts ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn admin_registers_verified_verificator() {
  let (state, tokens) = seeded().await;
  let (status, body) = send(
    &state,
    "POST",
    "/api/v1/admin/verificator",
    Some(tokens.admin.as_str()),
    Some(json!({ "name": "Otto", "email": "otto@example.com", "password": PASSWORD }).to_string()),
  )
  .await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["role"], "verifier");
  assert_eq!(body["data"]["verified"], true);
}

#[tokio::test]
async fn admin_listing_is_scoped_searched_and_paged() {
  let (state, tokens) = seeded().await;
  for (name, email) in [("Daniel", "dani@example.com"), ("Joanna", "jo@example.com")] {
    state.directory.register(registration(name, email)).await.unwrap();
  }

  let (status, body) = send(
    &state,
    "GET",
    "/api/v1/admin/users?search=an&order=asc&size=2",
    Some(tokens.admin.as_str()),
    None,
  )
  .await;

  assert_eq!(status, StatusCode::OK);
  let names: Vec<_> = body["data"]
    .as_array()
    .unwrap()
    .iter()
    .map(|a| a["name"].as_str().unwrap())
    .collect();
  assert_eq!(names, ["Ana", "Daniel"]);
  assert_eq!(body["paging"]["page"], 1);
  assert_eq!(body["paging"]["totalItem"], 3);
  assert_eq!(body["paging"]["totalPage"], 2);
  assert_eq!(body["paging"]["hasNext"], true);
  assert_eq!(body["paging"]["hasPrevious"], false);
}

#[tokio::test]
async fn verifier_listing_sees_users_and_filters_verified() {
  let (state, tokens) = seeded().await;

  let (_, body) = send(
    &state,
    "GET",
    "/api/v1/verificator/users",
    Some(tokens.verifier.as_str()),
    None,
  )
  .await;
  let roles: Vec<_> = body["data"]
    .as_array()
    .unwrap()
    .iter()
    .map(|a| a["role"].as_str().unwrap())
    .collect();
  assert_eq!(roles, ["user"]);

  let (_, body) = send(
    &state,
    "GET",
    "/api/v1/verificator/users?verified=true",
    Some(tokens.verifier.as_str()),
    None,
  )
  .await;
  assert_eq!(body["paging"]["totalItem"], 0);
}

#[tokio::test]
async fn toggle_verify_twice_restores_flag() {
  let (state, tokens) = seeded().await;
  let ana = state
    .directory
    .list_accounts(furlough_core::directory::AccountListing {
      page:   Default::default(),
      search: Some("Ana".into()),
      order:  Default::default(),
      scope:  furlough_core::directory::AccountScope::for_caller(
        furlough_core::account::Role::Verifier,
        None,
      )
      .unwrap(),
    })
    .await
    .unwrap()
    .items
    .remove(0)
    .account;
  let uri = format!("/api/v1/verificator/users/{}/verify", ana.account_id);

  let (status, body) = send(&state, "PATCH", &uri, Some(tokens.verifier.as_str()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["verified"], true);

  let (_, body) = send(&state, "PATCH", &uri, Some(tokens.verifier.as_str()), None).await;
  assert_eq!(body["data"]["verified"], false);
}

#[tokio::test]
async fn admin_promotes_and_resets_password() {
  let (state, tokens) = seeded().await;
  let ana = state
    .directory
    .register(registration("Bob", "bob@example.com"))
    .await
    .unwrap();

  let (status, _) = send(
    &state,
    "PATCH",
    &format!("/api/v1/admin/users/{}/verify", ana.account_id),
    Some(tokens.admin.as_str()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, body) = send(
    &state,
    "GET",
    &format!("/api/v1/admin/user/{}", ana.account_id),
    Some(tokens.admin.as_str()),
    None,
  )
  .await;
  assert_eq!(body["data"]["role"], "verifier");
  assert_eq!(body["data"]["verified"], true);

  let (status, _) = send(
    &state,
    "PATCH",
    &format!("/api/v1/admin/users/{}/reset-password", ana.account_id),
    Some(tokens.admin.as_str()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  login(&state, "bob@example.com", DEFAULT_PASSWORD).await;
}

#[tokio::test]
async fn change_password_checks_old_password() {
  let (state, tokens) = seeded().await;

  let (status, _) = send(
    &state,
    "PATCH",
    "/api/v1/user/password",
    Some(tokens.user.as_str()),
    Some(json!({ "old_password": "wrong-one", "new_password": "brand-new" }).to_string()),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = send(
    &state,
    "PATCH",
    "/api/v1/user/password",
    Some(tokens.user.as_str()),
    Some(json!({ "old_password": PASSWORD, "new_password": "brand-new" }).to_string()),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  login(&state, "ana@example.com", "brand-new").await;
}

#[tokio::test]
async fn unknown_or_malformed_account_id_is_404() {
  let (state, tokens) = seeded().await;
  for id in [uuid::Uuid::new_v4().to_string(), "42".to_string()] {
    let (status, _) = send(
      &state,
      "GET",
      &format!("/api/v1/admin/user/{id}"),
      Some(tokens.admin.as_str()),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{id}");
  }
}

// ── Permissions ──────────────────────────────────────────────────────────────

async fn create(state: &AppState<SqliteStore>, token: &str, title: &str) -> String {
  let (status, body) = send(
    state,
    "POST",
    "/api/v1/user/permissions",
    Some(token),
    Some(draft(title)),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn approved_request_cannot_be_edited_or_decided_again() {
  let (state, tokens) = seeded().await;

  let (status, body) = send(
    &state,
    "POST",
    "/api/v1/user/permissions",
    Some(tokens.user.as_str()),
    Some(draft("Trip")),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["status"], "pending");
  assert_eq!(body["data"]["account"]["email"], "ana@example.com");
  let id = body["data"]["id"].as_str().unwrap().to_string();

  let approve = format!("/api/v1/verificator/permissions/{id}/approve");
  let (status, body) = send(
    &state,
    "PATCH",
    &approve,
    Some(tokens.verifier.as_str()),
    Some(json!({ "comment": "ok" }).to_string()),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Permission approved successfully");
  assert_eq!(body["data"]["status"], "approved");
  assert_eq!(body["data"]["comment"], "ok");

  let (status, _) = send(
    &state,
    "PUT",
    &format!("/api/v1/user/permissions/{id}"),
    Some(tokens.user.as_str()),
    Some(draft("Longer trip")),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, _) = send(
    &state,
    "PATCH",
    &format!("/api/v1/verificator/permissions/{id}/reject"),
    Some(tokens.verifier.as_str()),
    Some(json!({ "comment": "too late" }).to_string()),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn decision_without_comment_is_400() {
  let (state, tokens) = seeded().await;
  let id = create(&state, &tokens.user, "Trip").await;

  for action in ["approve", "reject", "revision"] {
    let (status, body) = send(
      &state,
      "PATCH",
      &format!("/api/v1/verificator/permissions/{id}/{action}"),
      Some(tokens.verifier.as_str()),
      Some(json!({ "comment": " " }).to_string()),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{action}");
    assert_eq!(body["errors"]["fields"][0]["field"], "comment");
  }
}

#[tokio::test]
async fn revised_request_stays_revised_when_edited() {
  let (state, tokens) = seeded().await;
  let id = create(&state, &tokens.user, "Trip").await;

  let (status, _) = send(
    &state,
    "PATCH",
    &format!("/api/v1/verificator/permissions/{id}/revision"),
    Some(tokens.verifier.as_str()),
    Some(json!({ "comment": "fewer days" }).to_string()),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = send(
    &state,
    "PUT",
    &format!("/api/v1/user/permissions/{id}"),
    Some(tokens.user.as_str()),
    Some(draft("Short trip")),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["status"], "revised");
  assert_eq!(body["data"]["title"], "Short trip");
  assert_eq!(body["data"]["comment"], "fewer days");
}

#[tokio::test]
async fn only_the_owner_may_cancel() {
  let (state, tokens) = seeded().await;
  state
    .directory
    .register(registration("Bob", "bob@example.com"))
    .await
    .unwrap();
  let bob = login(&state, "bob@example.com", PASSWORD).await;
  let id = create(&state, &tokens.user, "Trip").await;
  let uri = format!("/api/v1/user/permissions/{id}/cancel");

  let (status, _) = send(&state, "PATCH", &uri, Some(bob.as_str()), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = send(&state, "PATCH", &uri, Some(tokens.user.as_str()), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["status"], "cancelled");
  assert_eq!(body["data"]["comment"], "Cancelled by user");
}

#[tokio::test]
async fn delete_removes_pending_request() {
  let (state, tokens) = seeded().await;
  let id = create(&state, &tokens.user, "Trip").await;
  let uri = format!("/api/v1/user/permissions/{id}");

  let (status, _) = send(&state, "DELETE", &uri, Some(tokens.user.as_str()), None).await;
  assert_eq!(status, StatusCode::OK);

  let (status, _) = send(&state, "GET", &uri, Some(tokens.user.as_str()), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_mine_returns_only_own_requests() {
  let (state, tokens) = seeded().await;
  state
    .directory
    .register(registration("Bob", "bob@example.com"))
    .await
    .unwrap();
  let bob = login(&state, "bob@example.com", PASSWORD).await;
  create(&state, &tokens.user, "First").await;
  create(&state, &tokens.user, "Second").await;
  create(&state, &bob, "Bob's").await;

  let (status, body) = send(
    &state,
    "GET",
    "/api/v1/user/permissions",
    Some(tokens.user.as_str()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  let titles: Vec<_> = body["data"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| p["title"].as_str().unwrap())
    .collect();
  assert_eq!(titles, ["Second", "First"]);
  assert!(body.get("paging").is_none());
}

#[tokio::test]
async fn status_filter_applies_to_verifiers_only() {
  let (state, tokens) = seeded().await;
  let approved = create(&state, &tokens.user, "Approved").await;
  create(&state, &tokens.user, "Pending").await;
  send(
    &state,
    "PATCH",
    &format!("/api/v1/verificator/permissions/{approved}/approve"),
    Some(tokens.verifier.as_str()),
    Some(json!({ "comment": "ok" }).to_string()),
  )
  .await;

  let (status, body) = send(
    &state,
    "GET",
    "/api/v1/verificator/permissions?status=approved",
    Some(tokens.verifier.as_str()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["paging"]["totalItem"], 1);
  assert_eq!(body["data"][0]["id"], approved.as_str());

  let (_, body) = send(
    &state,
    "GET",
    "/api/v1/admin/permissions?status=approved",
    Some(tokens.admin.as_str()),
    None,
  )
  .await;
  assert_eq!(body["paging"]["totalItem"], 2);

  let (status, _) = send(
    &state,
    "GET",
    "/api/v1/verificator/permissions?status=archived",
    Some(tokens.verifier.as_str()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_body_is_400_and_malformed_id_is_404() {
  let (state, tokens) = seeded().await;

  let (status, body) = send(
    &state,
    "POST",
    "/api/v1/user/permissions",
    Some(tokens.user.as_str()),
    Some("{".into()),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["errors"]["message"].is_string());

  let (status, _) = send(
    &state,
    "GET",
    "/api/v1/user/permissions/not-a-uuid",
    Some(tokens.user.as_str()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn account_listing_embeds_owned_requests() {
  let (state, tokens) = seeded().await;
  let id = create(&state, &tokens.user, "Trip").await;

  let (status, body) = send(
    &state,
    "GET",
    "/api/v1/admin/users?order=asc",
    Some(tokens.admin.as_str()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let accounts = body["data"].as_array().unwrap();
  let vera = accounts.iter().find(|a| a["name"] == "Vera").unwrap();
  assert!(vera.get("permissions").is_none());

  let ana = accounts.iter().find(|a| a["name"] == "Ana").unwrap();
  let permissions = ana["permissions"].as_array().unwrap();
  assert_eq!(permissions.len(), 1);
  assert_eq!(permissions[0]["id"], id);
  assert_eq!(permissions[0]["status"], "pending");
  assert!(permissions[0].get("account").is_none());
  assert!(ana.get("password_hash").is_none());
}
