//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:            Uuid,
  pub email:         String,
  pub display_name:  Option<String>,
  pub created_at:    DateTime<Utc>,
  /// argon2 PHC string, e.g. `$argon2id$v=19$…`
  #[serde(skip)]
  pub password_hash: String,
}

/// Input to [`crate::store::HabitStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:         String,
  pub password_hash: String,
  pub display_name:  Option<String>,
}

/// Lower-case and trim an email so lookups are case-insensitive.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
