//! Statistics endpoints. The reports themselves are computed by
//! [`ruty_core::stats`]; these handlers only fetch the data and pick "today".

use std::sync::Arc;

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
};
use chrono::{NaiveDate, Utc};
use ruty_core::{
  habit::DateRange,
  session::Session,
  stats::{self, AllHabitsStatistics, HabitStatistics},
  store::HabitStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{error::ApiError, habits::not_found};

#[derive(Debug, Deserialize)]
pub struct StatsParams {
  /// Overrides "today"; defaults to the current UTC date.
  pub date: Option<NaiveDate>,
}

impl StatsParams {
  fn today(&self) -> NaiveDate { self.date.unwrap_or_else(|| Utc::now().date_naive()) }
}

/// `GET /habits/{id}/stats[?date=<date>]`
pub async fn habit<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Path(id): Path<Uuid>,
  Query(params): Query<StatsParams>,
) -> Result<Json<HabitStatistics>, ApiError> {
  let habit = store
    .get_habit(session.user_id, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  let instances = store
    .list_instances(habit.id, DateRange::default())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(stats::habit_statistics(habit.id, &instances, params.today())))
}

/// `GET /stats[?date=<date>]`
pub async fn all<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Query(params): Query<StatsParams>,
) -> Result<Json<AllHabitsStatistics>, ApiError> {
  let ids = store.list_active_habit_ids(session.user_id).await.map_err(ApiError::store)?;

  let mut habits = Vec::with_capacity(ids.len());
  for id in ids {
    let dates = store.list_completed_dates(id).await.map_err(ApiError::store)?;
    habits.push((id, dates));
  }

  Ok(Json(stats::all_habits_statistics(&habits, params.today())))
}
