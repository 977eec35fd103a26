//! Handlers for `/habits` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/habits` | Optional `?date=YYYY-MM-DD` keeps habits due that day |
//! | `POST`  | `/habits` | Body: [`NewHabit`]; 201 |
//! | `GET`   | `/habits/{id}` | 404 if missing, deleted or foreign |
//! | `PATCH` | `/habits/{id}` | Body: [`HabitPatch`]; `{"is_deleted":true}` soft-deletes |

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use ruty_core::{
  habit::{Habit, HabitPatch, NewHabit},
  session::Session,
  store::HabitStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

pub(crate) fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("habit {id} not found")) }

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub date: Option<NaiveDate>,
}

/// `GET /habits[?date=<date>]`
pub async fn list<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Habit>>, ApiError> {
  let mut habits = store.list_habits(session.user_id).await.map_err(ApiError::store)?;
  if let Some(date) = params.date {
    habits.retain(|h| h.schedule.is_due(date));
  }
  Ok(Json(habits))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /habits`
pub async fn create<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Json(body): Json<NewHabit>,
) -> Result<impl IntoResponse, ApiError> {
  body.validate()?;
  let habit = store.create_habit(session.user_id, body).await.map_err(ApiError::store)?;
  tracing::debug!(habit_id = %habit.id, user_id = %session.user_id, "habit created");
  Ok((StatusCode::CREATED, Json(habit)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /habits/{id}`
pub async fn get_one<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ApiError> {
  let habit = store
    .get_habit(session.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(habit))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PATCH /habits/{id}`
///
/// A deleted habit can still be patched, which is how it is restored.
pub async fn update<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Path(id): Path<Uuid>,
  Json(patch): Json<HabitPatch>,
) -> Result<Json<Habit>, ApiError> {
  patch.validate()?;
  let habit = store
    .update_habit(session.user_id, id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  if habit.is_deleted {
    tracing::info!(habit_id = %id, "habit soft-deleted");
  }
  Ok(Json(habit))
}
