//! Achievements unlocked by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One achievement per `(user, kind)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
  pub id:          Uuid,
  pub user_id:     Uuid,
  /// Free-form identifier chosen by the client, e.g. `"first_week"`.
  #[serde(rename = "type")]
  pub kind:        String,
  pub unlocked:    bool,
  pub unlocked_at: Option<DateTime<Utc>>,
}

/// Result of [`crate::store::HabitStore::unlock_achievement`].
#[derive(Debug, Clone)]
pub enum UnlockOutcome {
  /// No row existed; a new unlocked one was inserted.
  Created(Achievement),
  /// A locked row existed and has been unlocked.
  Unlocked(Achievement),
  /// Nothing changed.
  AlreadyUnlocked(Achievement),
}

impl UnlockOutcome {
  pub fn achievement(&self) -> &Achievement {
    match self {
      Self::Created(a) | Self::Unlocked(a) | Self::AlreadyUnlocked(a) => a,
    }
  }
}
