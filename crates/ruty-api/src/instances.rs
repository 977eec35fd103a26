//! Handlers for habit check-ins and the instance log.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/habits/{id}/check` | Body: `{"date"?, "completed"?}`; defaults to today, `true` |
//! | `GET`  | `/habits/{id}/instances` | Optional `?from=&to=`; 400 when `from > to` |
//! | `GET`  | `/instances/{id}` | 404 if missing or foreign |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use ruty_core::{
  habit::{CheckIn, CheckOutcome, DateRange, HabitInstance},
  session::Session,
  store::HabitStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, habits::not_found};

// ─── Check ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CheckBody {
  pub date:      Option<NaiveDate>,
  pub completed: Option<bool>,
}

/// `POST /habits/{id}/check`
pub async fn check<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Path(id): Path<Uuid>,
  Json(body): Json<CheckBody>,
) -> Result<Json<CheckOutcome>, ApiError> {
  let check = CheckIn {
    date:      body.date.unwrap_or_else(|| Utc::now().date_naive()),
    completed: body.completed.unwrap_or(true),
  };
  let outcome = store
    .check_habit(session.user_id, id, check)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  tracing::debug!(
    habit_id = %id,
    date = %check.date,
    completed = check.completed,
    "habit checked"
  );
  Ok(Json(outcome))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub from: Option<NaiveDate>,
  pub to:   Option<NaiveDate>,
}

/// `GET /habits/{id}/instances[?from=<date>][&to=<date>]`
pub async fn list<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Path(id): Path<Uuid>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<HabitInstance>>, ApiError> {
  let range = DateRange::new(params.from, params.to)?;
  store
    .get_habit(session.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  let instances = store.list_instances(id, range).await.map_err(ApiError::store)?;
  Ok(Json(instances))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /instances/{id}`
pub async fn get_one<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Path(id): Path<Uuid>,
) -> Result<Json<HabitInstance>, ApiError> {
  let instance = store
    .get_instance(session.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("instance {id} not found")))?;
  Ok(Json(instance))
}
