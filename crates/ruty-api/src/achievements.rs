//! Handlers for `/achievements`.

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use ruty_core::{
  achievement::{Achievement, UnlockOutcome},
  session::Session,
  store::HabitStore,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;

/// `GET /achievements`
pub async fn list<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
) -> Result<Json<Vec<Achievement>>, ApiError> {
  let achievements = store.list_achievements(session.user_id).await.map_err(ApiError::store)?;
  Ok(Json(achievements))
}

#[derive(Debug, Deserialize)]
pub struct UnlockBody {
  #[serde(rename = "type")]
  pub kind: String,
}

/// `POST /achievements/unlock`; body: `{"type":"first_week"}`
///
/// 201 when the achievement is new, 200 otherwise.
pub async fn unlock<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Json(body): Json<UnlockBody>,
) -> Result<Response, ApiError> {
  let kind = body.kind.trim().to_owned();
  if kind.is_empty() {
    return Err(ApiError::BadRequest("achievement type is required".into()));
  }

  let outcome = store
    .unlock_achievement(session.user_id, kind)
    .await
    .map_err(ApiError::store)?;

  Ok(match outcome {
    UnlockOutcome::Created(a) => {
      tracing::info!(user_id = %session.user_id, kind = %a.kind, "achievement unlocked");
      (StatusCode::CREATED, Json(a)).into_response()
    }
    UnlockOutcome::Unlocked(a) => Json(a).into_response(),
    UnlockOutcome::AlreadyUnlocked(a) => {
      Json(json!({ "message": "achievement already unlocked", "achievement": a })).into_response()
    }
  })
}
