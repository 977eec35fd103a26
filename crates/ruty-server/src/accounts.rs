//! Unauthenticated endpoints: health check, registration and login.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/health` | `{"ok":true}` once the store answers a ping |
//! | `POST` | `/auth/register` | `{email, password, display_name?}`; 409 on duplicate email |
//! | `POST` | `/auth/login` | `{email, password}`; 401 on bad credentials |

use axum::{Json, extract::State};
use ruty_core::{
  store::HabitStore,
  user::{NewUser, User, normalize_email},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
  AppState,
  auth::{hash_password, issue_token, verify_password},
  error::{Error, Result},
};

/// `GET /health`
pub async fn health<S: HabitStore + Clone>(State(state): State<AppState<S>>) -> Result<Json<Value>> {
  state.store.ping().await.map_err(Error::store)?;
  Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub user:  User,
  pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:        String,
  pub password:     String,
  pub display_name: Option<String>,
}

/// `POST /auth/register`
pub async fn register<S: HabitStore + Clone>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<Json<AuthResponse>> {
  let email = normalize_email(&body.email);
  if !email.contains('@') || body.password.is_empty() {
    return Err(Error::BadRequest("email and password required".into()));
  }

  let input = NewUser {
    email,
    password_hash: hash_password(&body.password)?,
    display_name: body.display_name.filter(|n| !n.trim().is_empty()),
  };
  let user = state
    .store
    .create_user(input)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::Conflict("email already exists".into()))?;

  tracing::info!(user_id = %user.id, "user registered");
  let token = issue_token(&state.auth, &user)?;
  Ok(Json(AuthResponse { user, token }))
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login`
pub async fn login<S: HabitStore + Clone>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>> {
  if body.email.trim().is_empty() || body.password.is_empty() {
    return Err(Error::BadRequest("email and password required".into()));
  }

  let user = state
    .store
    .find_user_by_email(&body.email)
    .await
    .map_err(Error::store)?
    .filter(|u| verify_password(&body.password, &u.password_hash))
    .ok_or_else(|| {
      tracing::warn!("failed login attempt");
      Error::Unauthorized
    })?;

  let token = issue_token(&state.auth, &user)?;
  Ok(Json(AuthResponse { user, token }))
}
