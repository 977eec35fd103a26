//! HTTP service assembly for Ruty.
//!
//! Combines the unauthenticated account endpoints with the bearer-protected
//! [`ruty_api`] router, backed by any [`HabitStore`].

pub mod accounts;
pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router, middleware,
  routing::{get, post},
};
use chrono::TimeDelta;
use ruty_core::store::HabitStore;
use serde::Deserialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use auth::{AuthConfig, require_session};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `RUTY_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  pub store_path:      PathBuf,
  pub jwt_secret:      String,
  #[serde(default = "default_token_ttl_hours")]
  pub token_ttl_hours: i64,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_token_ttl_hours() -> i64 { 24 * 7 }

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through the account handlers and the auth layer.
#[derive(Clone)]
pub struct AppState<S: HabitStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AuthConfig>,
}

impl<S: HabitStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let auth = AuthConfig {
      jwt_secret: config.jwt_secret.clone(),
      token_ttl:  TimeDelta::hours(config.token_ttl_hours),
    };
    Self { store: Arc::new(store), config: Arc::new(config), auth: Arc::new(auth) }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the complete axum [`Router`]: public account routes plus the API
/// behind [`require_session`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: HabitStore + Clone + 'static,
{
  let api = ruty_api::api_router(state.store.clone())
    .layer(middleware::from_fn_with_state(state.clone(), require_session::<S>));

  Router::new()
    .route("/health", get(accounts::health::<S>))
    .route("/auth/register", post(accounts::register::<S>))
    .route("/auth/login", post(accounts::login::<S>))
    .with_state(state)
    .merge(api)
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
}

// ─── Integration tests ───────────────────────────────────────────────────────
