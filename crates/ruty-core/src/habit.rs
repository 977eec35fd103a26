//! Habits, their recurrence schedules and per-date completion instances.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike as _, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, character::XP_PER_DIFFICULTY};

// ─── Difficulty ──────────────────────────────────────────────────────────────

/// How hard a habit is, from 1 to 5. Drives the XP reward.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn get(self) -> u8 { self.0 }

  /// XP granted when an instance of a habit with this difficulty is completed.
  pub fn xp_reward(self) -> u32 { self.0 as u32 * XP_PER_DIFFICULTY }
}

impl Default for Difficulty {
  fn default() -> Self { Self(Self::MIN) }
}

impl TryFrom<i64> for Difficulty {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self> {
    if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
      Ok(Self(value as u8))
    } else {
      Err(Error::InvalidDifficulty(value))
    }
  }
}

impl From<Difficulty> for u8 {
  fn from(d: Difficulty) -> Self { d.0 }
}

// ─── Schedule ────────────────────────────────────────────────────────────────

/// The discriminant stored in the `recurrence` column.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum RecurrenceKind {
  Daily,
  Monthly,
  Once,
}

/// When a habit is due. Exactly one of the day-sets or the one-time date
/// exists, selected by the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "recurrence", rename_all = "snake_case")]
pub enum Schedule {
  /// Days of the week, `0` = Sunday. Empty means every day.
  Daily {
    #[serde(default)]
    days_of_week: BTreeSet<u8>,
  },
  /// Days of the month, `1..=31`. Days missing from a short month are
  /// simply never due that month.
  Monthly { days_of_month: BTreeSet<u8> },
  /// A single calendar date.
  Once { date: NaiveDate },
}

impl Default for Schedule {
  fn default() -> Self { Self::Daily { days_of_week: BTreeSet::new() } }
}

impl Schedule {
  pub fn kind(&self) -> RecurrenceKind {
    match self {
      Self::Daily { .. } => RecurrenceKind::Daily,
      Self::Monthly { .. } => RecurrenceKind::Monthly,
      Self::Once { .. } => RecurrenceKind::Once,
    }
  }

  pub fn validate(&self) -> Result<()> {
    match self {
      Self::Daily { days_of_week } => {
        if let Some(bad) = days_of_week.iter().find(|d| **d > 6) {
          return Err(Error::InvalidSchedule(format!(
            "day of week {bad} is out of range 0..=6"
          )));
        }
      }
      Self::Monthly { days_of_month } => {
        if days_of_month.is_empty() {
          return Err(Error::InvalidSchedule(
            "monthly schedule needs at least one day".into(),
          ));
        }
        if let Some(bad) = days_of_month.iter().find(|d| !(1u8..=31).contains(*d)) {
          return Err(Error::InvalidSchedule(format!(
            "day of month {bad} is out of range 1..=31"
          )));
        }
      }
      Self::Once { .. } => {}
    }
    Ok(())
  }

  /// Whether the habit should be performed on `date`.
  pub fn is_due(&self, date: NaiveDate) -> bool {
    match self {
      Self::Daily { days_of_week } => {
        days_of_week.is_empty()
          || days_of_week.contains(&(date.weekday().num_days_from_sunday() as u8))
      }
      Self::Monthly { days_of_month } => days_of_month.contains(&(date.day() as u8)),
      Self::Once { date: on } => *on == date,
    }
  }
}

// ─── Habit ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
  pub id:            Uuid,
  pub user_id:       Uuid,
  pub title:         String,
  pub description:   Option<String>,
  pub schedule:      Schedule,
  pub difficulty:    Difficulty,
  pub reminder_time: Option<NaiveTime>,
  pub color:         Option<String>,
  #[serde(default)]
  pub is_deleted:    bool,
  pub updated_at:    DateTime<Utc>,
}

/// Input to [`crate::store::HabitStore::create_habit`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewHabit {
  pub title:         String,
  pub description:   Option<String>,
  #[serde(default)]
  pub schedule:      Schedule,
  #[serde(default)]
  pub difficulty:    Difficulty,
  pub reminder_time: Option<NaiveTime>,
  pub color:         Option<String>,
}

impl NewHabit {
  pub fn validate(&self) -> Result<()> {
    validate_title(&self.title)?;
    self.schedule.validate()
  }

  pub fn into_habit(self, user_id: Uuid, now: DateTime<Utc>) -> Habit {
    Habit {
      id: Uuid::new_v4(),
      user_id,
      title: self.title.trim().to_owned(),
      description: self.description,
      schedule: self.schedule,
      difficulty: self.difficulty,
      reminder_time: self.reminder_time,
      color: self.color,
      is_deleted: false,
      updated_at: now,
    }
  }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HabitPatch {
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub schedule:      Option<Schedule>,
  pub difficulty:    Option<Difficulty>,
  pub reminder_time: Option<NaiveTime>,
  pub color:         Option<String>,
  pub is_deleted:    Option<bool>,
}

impl HabitPatch {
  pub fn validate(&self) -> Result<()> {
    if let Some(title) = &self.title {
      validate_title(title)?;
    }
    if let Some(schedule) = &self.schedule {
      schedule.validate()?;
    }
    Ok(())
  }
}

impl Habit {
  /// Checks a habit received whole, as in a sync upload.
  pub fn validate(&self) -> Result<()> {
    validate_title(&self.title)?;
    self.schedule.validate()
  }

  pub fn apply(&mut self, patch: HabitPatch, now: DateTime<Utc>) {
    if let Some(title) = patch.title {
      self.title = title.trim().to_owned();
    }
    if let Some(description) = patch.description {
      self.description = Some(description);
    }
    if let Some(schedule) = patch.schedule {
      self.schedule = schedule;
    }
    if let Some(difficulty) = patch.difficulty {
      self.difficulty = difficulty;
    }
    if let Some(reminder_time) = patch.reminder_time {
      self.reminder_time = Some(reminder_time);
    }
    if let Some(color) = patch.color {
      self.color = Some(color);
    }
    if let Some(is_deleted) = patch.is_deleted {
      self.is_deleted = is_deleted;
    }
    self.updated_at = now;
  }
}

fn validate_title(title: &str) -> Result<()> {
  if title.trim().is_empty() {
    return Err(Error::InvalidInput("title must not be empty".into()));
  }
  Ok(())
}

// ─── Instances ───────────────────────────────────────────────────────────────

/// The completion record of a habit for one calendar date.
///
/// `(habit_id, date)` is the natural key: checking the same date twice
/// overwrites the existing instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitInstance {
  pub id:         Uuid,
  pub habit_id:   Uuid,
  pub date:       NaiveDate,
  pub completed:  bool,
  #[serde(default)]
  pub xp_awarded: u32,
  #[serde(default)]
  pub is_deleted: bool,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::HabitStore::check_habit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckIn {
  pub date:      NaiveDate,
  pub completed: bool,
}

impl CheckIn {
  /// XP this check should carry for a habit of `difficulty`.
  pub fn xp_awarded(&self, difficulty: Difficulty) -> u32 {
    if self.completed { difficulty.xp_reward() } else { 0 }
  }
}

/// Result of a check: the upserted instance and the character after its XP
/// update (absent when the user has not created a character yet).
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
  pub instance:  HabitInstance,
  pub character: Option<crate::character::Character>,
}

/// An inclusive, optionally open-ended date filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
  pub from: Option<NaiveDate>,
  pub to:   Option<NaiveDate>,
}

impl DateRange {
  pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
    if let (Some(from), Some(to)) = (from, to)
      && from > to
    {
      return Err(Error::InvalidRange { from, to });
    }
    Ok(Self { from, to })
  }

  pub fn contains(&self, date: NaiveDate) -> bool {
    self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
  }
}
