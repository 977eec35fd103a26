//! Offline sync payloads.
//!
//! Clients pull every row changed since their last sync and push their local
//! changes back. Conflicts are settled by `updated_at`: a pushed row replaces
//! the stored one only if it is strictly newer, so late-arriving stale
//! uploads never clobber fresher data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::habit::{Habit, HabitInstance};

/// Rows travelling in either direction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncPayload {
  #[serde(default)]
  pub habits:          Vec<Habit>,
  #[serde(default)]
  pub habit_instances: Vec<HabitInstance>,
}

/// Outcome of [`crate::store::HabitStore::apply_sync`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
  pub habits_applied:    u32,
  pub instances_applied: u32,
  /// Rows that lost the timestamp comparison or belong to someone else.
  pub skipped:           u32,
}

/// Whether an incoming row stamped `incoming` replaces one stamped `stored`.
pub fn last_write_wins(stored: Option<DateTime<Utc>>, incoming: DateTime<Utc>) -> bool {
  stored.is_none_or(|stored| incoming > stored)
}
