//! Password hashing, bearer tokens and the session middleware.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use ruty_core::{session::Session, store::HabitStore, user::User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::{Error, Result},
};

/// Token signing settings for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub jwt_secret: String,
  pub token_ttl:  TimeDelta,
}

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Hash(e.to_string()))
}

/// Whether `password` matches the PHC string `hash`. A malformed hash never
/// matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub:   Uuid,
  email: String,
  iat:   i64,
  exp:   i64,
}

/// Sign an HS256 token for `user`, valid for `config.token_ttl`.
pub fn issue_token(config: &AuthConfig, user: &User) -> Result<String> {
  let now = Utc::now();
  let claims = Claims {
    sub:   user.id,
    email: user.email.clone(),
    iat:   now.timestamp(),
    exp:   (now + config.token_ttl).timestamp(),
  };
  let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
  Ok(jsonwebtoken::encode(&Header::default(), &claims, &key)?)
}

/// Check the signature and expiry of `token` and recover the session.
pub fn verify_token(config: &AuthConfig, token: &str) -> Result<Session> {
  let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
  let data = jsonwebtoken::decode::<Claims>(token, &key, &Validation::default()).map_err(|e| {
    tracing::warn!(error = %e, "rejected bearer token");
    Error::Unauthorized
  })?;
  Ok(Session { user_id: data.claims.sub, email: data.claims.email })
}

/// Resolve the session from an `Authorization: Bearer <token>` header.
pub fn session_from_headers(headers: &HeaderMap, config: &AuthConfig) -> Result<Session> {
  let token = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .ok_or(Error::Unauthorized)?;
  verify_token(config, token.trim())
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Reject unauthenticated requests with 401; otherwise attach the
/// [`Session`] as a request extension for the API handlers.
pub async fn require_session<S: HabitStore + Clone>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response> {
  let session = session_from_headers(req.headers(), &state.auth)?;
  tracing::debug!(user_id = %session.user_id, "authenticated request");
  req.extensions_mut().insert(session);
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn config(secret: &str) -> AuthConfig {
    AuthConfig { jwt_secret: secret.into(), token_ttl: TimeDelta::days(7) }
  }

  fn user() -> User {
    User {
      id:            Uuid::new_v4(),
      email:         "ada@example.com".into(),
      display_name:  None,
      created_at:    Utc::now(),
      password_hash: String::new(),
    }
  }

  fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();
    headers.insert(header::AUTHORIZATION, value);
    headers
  }

  #[test]
  fn password_round_trip() {
    let hash = hash_password("hunter2").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
    assert!(!verify_password("hunter2", "not a phc string"));
  }

  #[test]
  fn token_round_trip() {
    let cfg = config("secret");
    let user = user();
    let token = issue_token(&cfg, &user).unwrap();
    let session = session_from_headers(&bearer(&token), &cfg).unwrap();
    assert_eq!(session, Session { user_id: user.id, email: user.email });
  }

  #[test]
  fn forged_token_is_rejected() {
    let token = issue_token(&config("attacker"), &user()).unwrap();
    let result = session_from_headers(&bearer(&token), &config("secret"));
    assert!(matches!(result, Err(Error::Unauthorized)));
  }

  #[test]
  fn expired_token_is_rejected() {
    let cfg = AuthConfig { jwt_secret: "secret".into(), token_ttl: TimeDelta::hours(-1) };
    let token = issue_token(&cfg, &user()).unwrap();
    assert!(matches!(verify_token(&cfg, &token), Err(Error::Unauthorized)));
  }

  #[test]
  fn missing_or_malformed_header() {
    let cfg = config("secret");
    assert!(matches!(session_from_headers(&HeaderMap::new(), &cfg), Err(Error::Unauthorized)));

    let mut basic = HeaderMap::new();
    basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
    assert!(matches!(session_from_headers(&basic, &cfg), Err(Error::Unauthorized)));
  }
}
