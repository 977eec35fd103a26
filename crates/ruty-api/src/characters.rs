//! Handlers for `/characters`. Each user has at most one character, so the
//! collection path addresses it directly.

use std::{str::FromStr as _, sync::Arc};

use axum::{
  Extension, Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use ruty_core::{
  character::{Character, CharacterKind, CharacterPatch, NewCharacter},
  session::Session,
  store::HabitStore,
};
use serde::Deserialize;

use crate::error::ApiError;

fn parse_kind(value: &str) -> Result<CharacterKind, ApiError> {
  CharacterKind::from_str(value)
    .map_err(|_| ApiError::BadRequest(format!("invalid character type {value:?}")))
}

fn missing() -> ApiError { ApiError::NotFound("character not found".into()) }

/// `GET /characters`
pub async fn get<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
) -> Result<Json<Character>, ApiError> {
  let character = store
    .get_character(session.user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(missing)?;
  Ok(Json(character))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(rename = "type")]
  pub kind:        String,
  pub custom_name: Option<String>,
}

/// `POST /characters`; body: `{"type":"cat","custom_name":"Miso"}`
pub async fn create<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewCharacter { kind: parse_kind(&body.kind)?, custom_name: body.custom_name };
  let character = store
    .create_character(session.user_id, input)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::Conflict("character already exists, use PATCH to update".into()))?;
  Ok((StatusCode::CREATED, Json(character)))
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBody {
  #[serde(rename = "type")]
  pub kind:        Option<String>,
  pub custom_name: Option<String>,
  pub level:       Option<u32>,
  pub energy:      Option<i64>,
  pub happiness:   Option<i64>,
}

/// `PATCH /characters`
pub async fn update<S: HabitStore>(
  State(store): State<Arc<S>>,
  Extension(session): Extension<Session>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<Character>, ApiError> {
  let patch = CharacterPatch {
    kind:        body.kind.as_deref().map(parse_kind).transpose()?,
    custom_name: body.custom_name,
    level:       body.level,
    energy:      body.energy,
    happiness:   body.happiness,
  };
  if patch.is_empty() {
    return Err(ApiError::BadRequest("no fields to update".into()));
  }
  let character = store
    .update_character(session.user_id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(missing)?;
  Ok(Json(character))
}
