//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that string comparison in SQL orders them
//! chronologically. Calendar dates are `YYYY-MM-DD`, times `HH:MM:SS`, UUIDs
//! hyphenated lowercase strings.

use std::{collections::BTreeSet, str::FromStr as _};

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use ruty_core::{
  achievement::Achievement,
  character::{Character, CharacterKind},
  habit::{Difficulty, Habit, HabitInstance, RecurrenceKind, Schedule},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── NaiveDate / NaiveTime ───────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format("%H:%M:%S").to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, "%H:%M:%S")
    .map_err(|e| Error::Decode(format!("time {s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_character_kind(s: &str) -> Result<CharacterKind> {
  CharacterKind::from_str(s).map_err(|_| {
    Error::Core(ruty_core::Error::UnknownVariant { kind: "character kind", value: s.to_owned() })
  })
}

pub fn decode_recurrence(s: &str) -> Result<RecurrenceKind> {
  RecurrenceKind::from_str(s).map_err(|_| {
    Error::Core(ruty_core::Error::UnknownVariant { kind: "recurrence", value: s.to_owned() })
  })
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub password_hash: String,
  pub display_name:  Option<String>,
  pub created_at:    String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:            decode_uuid(&self.user_id)?,
      email:         self.email,
      display_name:  self.display_name,
      created_at:    decode_dt(&self.created_at)?,
      password_hash: self.password_hash,
    })
  }
}

/// Raw values of a `characters` row, in both directions.
pub struct RawCharacter {
  pub user_id:     String,
  pub kind:        String,
  pub custom_name: Option<String>,
  pub level:       i64,
  pub energy:      i64,
  pub happiness:   i64,
  pub total_xp:    i64,
  pub updated_at:  String,
}

impl RawCharacter {
  pub fn from_character(c: &Character) -> Self {
    Self {
      user_id:     encode_uuid(c.user_id),
      kind:        c.kind.as_ref().to_owned(),
      custom_name: c.custom_name.clone(),
      level:       c.level as i64,
      energy:      c.energy as i64,
      happiness:   c.happiness as i64,
      total_xp:    c.total_xp as i64,
      updated_at:  encode_dt(c.updated_at),
    }
  }

  pub fn into_character(self) -> Result<Character> {
    Ok(Character {
      user_id:     decode_uuid(&self.user_id)?,
      kind:        decode_character_kind(&self.kind)?,
      custom_name: self.custom_name,
      level:       decode_count(self.level, "level")?,
      energy:      decode_stat(self.energy, "energy")?,
      happiness:   decode_stat(self.happiness, "happiness")?,
      total_xp:    decode_count(self.total_xp, "total_xp")?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values read directly from an `achievements` row.
pub struct RawAchievement {
  pub achievement_id: String,
  pub user_id:        String,
  pub kind:           String,
  pub unlocked:       bool,
  pub unlocked_at:    Option<String>,
}

impl RawAchievement {
  pub fn into_achievement(self) -> Result<Achievement> {
    Ok(Achievement {
      id:          decode_uuid(&self.achievement_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      kind:        self.kind,
      unlocked:    self.unlocked,
      unlocked_at: self.unlocked_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// The schedule detail rows of one habit.
#[derive(Default)]
pub struct RawSchedule {
  pub weekdays:   Vec<i64>,
  pub month_days: Vec<i64>,
  pub once_date:  Option<String>,
}

impl RawSchedule {
  pub fn from_schedule(s: &Schedule) -> Self {
    match s {
      Schedule::Daily { days_of_week } => Self {
        weekdays: days_of_week.iter().map(|d| *d as i64).collect(),
        ..Self::default()
      },
      Schedule::Monthly { days_of_month } => Self {
        month_days: days_of_month.iter().map(|d| *d as i64).collect(),
        ..Self::default()
      },
      Schedule::Once { date } => Self { once_date: Some(encode_date(*date)), ..Self::default() },
    }
  }

  pub fn into_schedule(self, kind: RecurrenceKind) -> Result<Schedule> {
    let schedule = match kind {
      RecurrenceKind::Daily => Schedule::Daily { days_of_week: small_set(self.weekdays)? },
      RecurrenceKind::Monthly => Schedule::Monthly { days_of_month: small_set(self.month_days)? },
      RecurrenceKind::Once => {
        let date = self
          .once_date
          .ok_or_else(|| Error::Decode("one-time habit without a date".into()))?;
        Schedule::Once { date: decode_date(&date)? }
      }
    };
    Ok(schedule)
  }
}

/// Raw values of a `habits` row plus its schedule rows, in both directions.
pub struct RawHabit {
  pub habit_id:      String,
  pub user_id:       String,
  pub title:         String,
  pub description:   Option<String>,
  pub recurrence:    String,
  pub difficulty:    i64,
  pub reminder_time: Option<String>,
  pub color:         Option<String>,
  pub is_deleted:    bool,
  pub updated_at:    String,
  pub schedule:      RawSchedule,
}

impl RawHabit {
  pub fn from_habit(h: &Habit) -> Self {
    Self {
      habit_id:      encode_uuid(h.id),
      user_id:       encode_uuid(h.user_id),
      title:         h.title.clone(),
      description:   h.description.clone(),
      recurrence:    h.schedule.kind().as_ref().to_owned(),
      difficulty:    h.difficulty.get() as i64,
      reminder_time: h.reminder_time.map(encode_time),
      color:         h.color.clone(),
      is_deleted:    h.is_deleted,
      updated_at:    encode_dt(h.updated_at),
      schedule:      RawSchedule::from_schedule(&h.schedule),
    }
  }

  pub fn into_habit(self) -> Result<Habit> {
    let kind = decode_recurrence(&self.recurrence)?;
    Ok(Habit {
      id:            decode_uuid(&self.habit_id)?,
      user_id:       decode_uuid(&self.user_id)?,
      title:         self.title,
      description:   self.description,
      schedule:      self.schedule.into_schedule(kind)?,
      difficulty:    Difficulty::try_from(self.difficulty)?,
      reminder_time: self.reminder_time.as_deref().map(decode_time).transpose()?,
      color:         self.color,
      is_deleted:    self.is_deleted,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw values of a `habit_instances` row, in both directions.
pub struct RawInstance {
  pub instance_id: String,
  pub habit_id:    String,
  pub date:        String,
  pub completed:   bool,
  pub xp_awarded:  i64,
  pub is_deleted:  bool,
  pub updated_at:  String,
}

impl RawInstance {
  pub fn from_instance(i: &HabitInstance) -> Self {
    Self {
      instance_id: encode_uuid(i.id),
      habit_id:    encode_uuid(i.habit_id),
      date:        encode_date(i.date),
      completed:   i.completed,
      xp_awarded:  i.xp_awarded as i64,
      is_deleted:  i.is_deleted,
      updated_at:  encode_dt(i.updated_at),
    }
  }

  pub fn into_instance(self) -> Result<HabitInstance> {
    Ok(HabitInstance {
      id:         decode_uuid(&self.instance_id)?,
      habit_id:   decode_uuid(&self.habit_id)?,
      date:       decode_date(&self.date)?,
      completed:  self.completed,
      xp_awarded: decode_count(self.xp_awarded, "xp_awarded")?,
      is_deleted: self.is_deleted,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Integer columns ─────────────────────────────────────────────────────────

fn decode_count(v: i64, column: &str) -> Result<u32> {
  u32::try_from(v).map_err(|_| Error::Decode(format!("{column} out of range: {v}")))
}

fn decode_stat(v: i64, column: &str) -> Result<u8> {
  u8::try_from(v).map_err(|_| Error::Decode(format!("{column} out of range: {v}")))
}

fn small_set(values: Vec<i64>) -> Result<BTreeSet<u8>> {
  values
    .into_iter()
    .map(|v| u8::try_from(v).map_err(|_| Error::Decode(format!("schedule day out of range: {v}"))))
    .collect()
}
