//! The gamified companion that levels up as habits are completed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Progression rules ───────────────────────────────────────────────────────

/// XP granted per difficulty point for a completed check.
pub const XP_PER_DIFFICULTY: u32 = 10;
/// XP needed to advance one level.
pub const XP_PER_LEVEL: u32 = 100;

pub const STAT_MIN: u8 = 0;
pub const STAT_MAX: u8 = 100;
pub const STARTING_STAT: u8 = 50;

const HAPPINESS_STEP: i64 = 5;
const ENERGY_STEP: i64 = 2;

/// Level reached with `total_xp` experience. Level 1 starts at zero XP.
pub fn level_for_xp(total_xp: u32) -> u32 { total_xp / XP_PER_LEVEL + 1 }

/// Clamp a raw value into the `0..=100` range used by energy and happiness.
pub fn clamp_stat(value: i64) -> u8 {
  value.clamp(STAT_MIN as i64, STAT_MAX as i64) as u8
}

// ─── Character ───────────────────────────────────────────────────────────────

/// The species a user picked for their companion.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CharacterKind {
  Cat,
  Dog,
  Rabbit,
  Fox,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
  pub user_id:     Uuid,
  #[serde(rename = "type")]
  pub kind:        CharacterKind,
  pub custom_name: Option<String>,
  pub level:       u32,
  pub energy:      u8,
  pub happiness:   u8,
  pub total_xp:    u32,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::HabitStore::create_character`].
#[derive(Debug, Clone)]
pub struct NewCharacter {
  pub kind:        CharacterKind,
  pub custom_name: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct CharacterPatch {
  pub kind:        Option<CharacterKind>,
  /// `Some("")` clears the name.
  pub custom_name: Option<String>,
  pub level:       Option<u32>,
  pub energy:      Option<i64>,
  pub happiness:   Option<i64>,
}

impl CharacterPatch {
  pub fn is_empty(&self) -> bool {
    self.kind.is_none()
      && self.custom_name.is_none()
      && self.level.is_none()
      && self.energy.is_none()
      && self.happiness.is_none()
  }
}

impl Character {
  /// A fresh level-1 companion.
  pub fn new(user_id: Uuid, input: NewCharacter, now: DateTime<Utc>) -> Self {
    Self {
      user_id,
      kind: input.kind,
      custom_name: normalize_name(input.custom_name),
      level: 1,
      energy: STARTING_STAT,
      happiness: STARTING_STAT,
      total_xp: 0,
      updated_at: now,
    }
  }

  pub fn apply(&mut self, patch: CharacterPatch, now: DateTime<Utc>) {
    if let Some(kind) = patch.kind {
      self.kind = kind;
    }
    if let Some(name) = patch.custom_name {
      self.custom_name = normalize_name(Some(name));
    }
    if let Some(level) = patch.level {
      self.level = level;
    }
    if let Some(energy) = patch.energy {
      self.energy = clamp_stat(energy);
    }
    if let Some(happiness) = patch.happiness {
      self.happiness = clamp_stat(happiness);
    }
    self.updated_at = now;
  }

  /// Apply an XP change from a habit check.
  ///
  /// `delta` is the difference between the XP now awarded for an instance
  /// and what it carried before, so repeating the same check is a no-op.
  pub fn apply_xp(&mut self, delta: i64, now: DateTime<Utc>) {
    if delta == 0 {
      return;
    }
    let total = (self.total_xp as i64 + delta).max(0);
    self.total_xp = u32::try_from(total).unwrap_or(u32::MAX);
    self.level = level_for_xp(self.total_xp);

    let sign = delta.signum();
    self.happiness = clamp_stat(self.happiness as i64 + sign * HAPPINESS_STEP);
    self.energy = clamp_stat(self.energy as i64 + sign * ENERGY_STEP);
    self.updated_at = now;
  }
}

fn normalize_name(name: Option<String>) -> Option<String> {
  name
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty())
}
