//! Offline sync endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/sync/down` | Optional `?since=<RFC 3339>`; defaults to the epoch. Send `Z` or URL-encode a `+hh:mm` offset |
//! | `POST` | `/sync/up`   | Body: [`SyncPayload`]; last write wins per row |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Query, State, rejection::QueryRejection},
};
use chrono::{DateTime, Utc};
use ruty_core::{
  session::Session,
  store::HabitStore,
  sync::{SyncPayload, SyncReport},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct DownParams {
  pub since: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DownResponse {
  #[serde(flatten)]
  pub changes:     SyncPayload,
  /// Pass back as `since` on the next pull.
  pub server_time: DateTime<Utc>,
}

/// `GET /sync/down[?since=<timestamp>]`
pub async fn down<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  params: Result<Query<DownParams>, QueryRejection>,
) -> Result<Json<DownResponse>, ApiError> {
  let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let server_time = Utc::now();
  let since = params.since.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
  let changes = store
    .changes_since(session.user_id, since)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(DownResponse { changes, server_time }))
}

/// `POST /sync/up`
pub async fn up<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Json(batch): Json<SyncPayload>,
) -> Result<Json<SyncReport>, ApiError> {
  for habit in &batch.habits {
    habit.validate()?;
  }

  let report = store.apply_sync(session.user_id, batch).await.map_err(ApiError::store)?;
  tracing::info!(
    user_id = %session.user_id,
    habits = report.habits_applied,
    instances = report.instances_applied,
    skipped = report.skipped,
    "sync upload applied"
  );
  Ok(Json(report))
}
