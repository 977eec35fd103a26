//! [`SqliteStore`], the SQLite implementation of [`HabitStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use uuid::Uuid;

use ruty_core::{
  achievement::{Achievement, UnlockOutcome},
  character::{Character, CharacterPatch, NewCharacter},
  habit::{CheckIn, CheckOutcome, DateRange, Habit, HabitInstance, HabitPatch, NewHabit},
  stats::CompletedDates,
  store::HabitStore,
  sync::{SyncPayload, SyncReport, last_write_wins},
  user::{NewUser, User, normalize_email},
};

use crate::{
  Error, Result,
  encode::{
    RawAchievement, RawCharacter, RawHabit, RawInstance, RawSchedule, RawUser, decode_date,
    decode_dt, decode_uuid, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Ruty store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// Wrap a decode failure that happens on the connection thread.
fn other(e: Error) -> tokio_rusqlite::Error { tokio_rusqlite::Error::Other(Box::new(e)) }

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// These run on the connection thread, against either a plain connection or
// an open transaction.

const USER_COLUMNS: &str = "user_id, email, password_hash, display_name, created_at";

fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:       row.get(0)?,
    email:         row.get(1)?,
    password_hash: row.get(2)?,
    display_name:  row.get(3)?,
    created_at:    row.get(4)?,
  })
}

const CHARACTER_COLUMNS: &str =
  "user_id, kind, custom_name, level, energy, happiness, total_xp, updated_at";

fn read_character(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCharacter> {
  Ok(RawCharacter {
    user_id:     row.get(0)?,
    kind:        row.get(1)?,
    custom_name: row.get(2)?,
    level:       row.get(3)?,
    energy:      row.get(4)?,
    happiness:   row.get(5)?,
    total_xp:    row.get(6)?,
    updated_at:  row.get(7)?,
  })
}

fn load_character(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<RawCharacter>> {
  conn
    .query_row(
      &format!("SELECT {CHARACTER_COLUMNS} FROM characters WHERE user_id = ?1"),
      rusqlite::params![user_id],
      read_character,
    )
    .optional()
}

fn save_character(conn: &Connection, c: &RawCharacter) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE characters
        SET kind = ?2, custom_name = ?3, level = ?4, energy = ?5,
            happiness = ?6, total_xp = ?7, updated_at = ?8
      WHERE user_id = ?1",
    rusqlite::params![
      c.user_id,
      c.kind,
      c.custom_name,
      c.level,
      c.energy,
      c.happiness,
      c.total_xp,
      c.updated_at,
    ],
  )?;
  Ok(())
}

const ACHIEVEMENT_COLUMNS: &str = "achievement_id, user_id, kind, unlocked, unlocked_at";

fn read_achievement(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAchievement> {
  Ok(RawAchievement {
    achievement_id: row.get(0)?,
    user_id:        row.get(1)?,
    kind:           row.get(2)?,
    unlocked:       row.get(3)?,
    unlocked_at:    row.get(4)?,
  })
}

const HABIT_COLUMNS: &str = "habit_id, user_id, title, description, recurrence, difficulty, \
                             reminder_time, color, is_deleted, updated_at";

fn read_habit(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawHabit> {
  Ok(RawHabit {
    habit_id:      row.get(0)?,
    user_id:       row.get(1)?,
    title:         row.get(2)?,
    description:   row.get(3)?,
    recurrence:    row.get(4)?,
    difficulty:    row.get(5)?,
    reminder_time: row.get(6)?,
    color:         row.get(7)?,
    is_deleted:    row.get(8)?,
    updated_at:    row.get(9)?,
    schedule:      RawSchedule::default(),
  })
}

fn load_schedule(conn: &Connection, habit_id: &str) -> rusqlite::Result<RawSchedule> {
  let weekdays = conn
    .prepare("SELECT weekday FROM habit_weekdays WHERE habit_id = ?1 ORDER BY weekday")?
    .query_map(rusqlite::params![habit_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<i64>>>()?;
  let month_days = conn
    .prepare("SELECT month_day FROM habit_month_days WHERE habit_id = ?1 ORDER BY month_day")?
    .query_map(rusqlite::params![habit_id], |r| r.get(0))?
    .collect::<rusqlite::Result<Vec<i64>>>()?;
  let once_date = conn
    .query_row(
      "SELECT date FROM habit_one_time WHERE habit_id = ?1",
      rusqlite::params![habit_id],
      |r| r.get(0),
    )
    .optional()?;
  Ok(RawSchedule { weekdays, month_days, once_date })
}

/// Select habits matching `filter` (a `WHERE` clause body, optionally
/// followed by `ORDER BY`) together with their schedule rows.
fn query_habits(
  conn: &Connection,
  filter: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<RawHabit>> {
  let mut habits = conn
    .prepare(&format!("SELECT {HABIT_COLUMNS} FROM habits WHERE {filter}"))?
    .query_map(params, read_habit)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  for habit in &mut habits {
    habit.schedule = load_schedule(conn, &habit.habit_id)?;
  }
  Ok(habits)
}

/// Upsert a habit row and replace its schedule rows.
fn write_habit(conn: &Connection, h: &RawHabit) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO habits
       (habit_id, user_id, title, description, recurrence, difficulty,
        reminder_time, color, is_deleted, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
     ON CONFLICT(habit_id) DO UPDATE SET
       title         = excluded.title,
       description   = excluded.description,
       recurrence    = excluded.recurrence,
       difficulty    = excluded.difficulty,
       reminder_time = excluded.reminder_time,
       color         = excluded.color,
       is_deleted    = excluded.is_deleted,
       updated_at    = excluded.updated_at",
    rusqlite::params![
      h.habit_id,
      h.user_id,
      h.title,
      h.description,
      h.recurrence,
      h.difficulty,
      h.reminder_time,
      h.color,
      h.is_deleted,
      h.updated_at,
    ],
  )?;

  for table in ["habit_weekdays", "habit_month_days", "habit_one_time"] {
    conn.execute(
      &format!("DELETE FROM {table} WHERE habit_id = ?1"),
      rusqlite::params![h.habit_id],
    )?;
  }
  for day in &h.schedule.weekdays {
    conn.execute(
      "INSERT INTO habit_weekdays (habit_id, weekday) VALUES (?1, ?2)",
      rusqlite::params![h.habit_id, day],
    )?;
  }
  for day in &h.schedule.month_days {
    conn.execute(
      "INSERT INTO habit_month_days (habit_id, month_day) VALUES (?1, ?2)",
      rusqlite::params![h.habit_id, day],
    )?;
  }
  if let Some(date) = &h.schedule.once_date {
    conn.execute(
      "INSERT INTO habit_one_time (habit_id, date) VALUES (?1, ?2)",
      rusqlite::params![h.habit_id, date],
    )?;
  }
  Ok(())
}

const INSTANCE_COLUMNS: &str =
  "i.instance_id, i.habit_id, i.date, i.completed, i.xp_awarded, i.is_deleted, i.updated_at";

fn read_instance(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawInstance> {
  Ok(RawInstance {
    instance_id: row.get(0)?,
    habit_id:    row.get(1)?,
    date:        row.get(2)?,
    completed:   row.get(3)?,
    xp_awarded:  row.get(4)?,
    is_deleted:  row.get(5)?,
    updated_at:  row.get(6)?,
  })
}

fn habit_owner(conn: &Connection, habit_id: &str) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT user_id FROM habits WHERE habit_id = ?1",
      rusqlite::params![habit_id],
      |r| r.get(0),
    )
    .optional()
}

#[derive(Clone, Copy)]
enum Unlock {
  Created,
  Unlocked,
  AlreadyUnlocked,
}

// ─── HabitStore impl ─────────────────────────────────────────────────────────

impl HabitStore for SqliteStore {
  type Error = Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<Option<User>> {
    let user = User {
      id:            Uuid::new_v4(),
      email:         normalize_email(&input.email),
      display_name:  input.display_name,
      created_at:    Utc::now(),
      password_hash: input.password_hash,
    };

    let id_str = encode_uuid(user.id);
    let email = user.email.clone();
    let hash = user.password_hash.clone();
    let name = user.display_name.clone();
    let at_str = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO users (user_id, email, password_hash, display_name, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(email) DO NOTHING",
          rusqlite::params![id_str, email, hash, name, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    Ok(inserted.then_some(user))
  }

  async fn find_user_by_email<'a>(&'a self, email: &'a str) -> Result<Option<User>> {
    let email = normalize_email(email);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
              rusqlite::params![email],
              read_user,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
              rusqlite::params![id_str],
              read_user,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  // ── Characters ────────────────────────────────────────────────────────────

  async fn get_character(&self, user_id: Uuid) -> Result<Option<Character>> {
    let user = encode_uuid(user_id);
    let raw = self.conn.call(move |conn| Ok(load_character(conn, &user)?)).await?;
    raw.map(RawCharacter::into_character).transpose()
  }

  async fn create_character(
    &self,
    user_id: Uuid,
    input: NewCharacter,
  ) -> Result<Option<Character>> {
    let character = Character::new(user_id, input, Utc::now());
    let c = RawCharacter::from_character(&character);

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT INTO characters
             (user_id, kind, custom_name, level, energy, happiness, total_xp, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT(user_id) DO NOTHING",
          rusqlite::params![
            c.user_id,
            c.kind,
            c.custom_name,
            c.level,
            c.energy,
            c.happiness,
            c.total_xp,
            c.updated_at,
          ],
        )?;
        Ok(n == 1)
      })
      .await?;

    Ok(inserted.then_some(character))
  }

  async fn update_character(
    &self,
    user_id: Uuid,
    patch: CharacterPatch,
  ) -> Result<Option<Character>> {
    let user = encode_uuid(user_id);
    let now = Utc::now();

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(raw) = load_character(&tx, &user)? else {
          return Ok(None);
        };
        let mut character = raw.into_character().map_err(other)?;
        character.apply(patch, now);
        save_character(&tx, &RawCharacter::from_character(&character))?;
        tx.commit()?;
        Ok(Some(character))
      })
      .await?;

    Ok(updated)
  }

  // ── Achievements ──────────────────────────────────────────────────────────

  async fn list_achievements(&self, user_id: Uuid) -> Result<Vec<Achievement>> {
    let user = encode_uuid(user_id);
    let raws: Vec<RawAchievement> = self
      .conn
      .call(move |conn| {
        let rows = conn
          .prepare(&format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements
              WHERE user_id = ?1
              ORDER BY unlocked_at DESC, kind"
          ))?
          .query_map(rusqlite::params![user], read_achievement)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAchievement::into_achievement).collect()
  }

  async fn unlock_achievement(&self, user_id: Uuid, kind: String) -> Result<UnlockOutcome> {
    let user = encode_uuid(user_id);
    let now = encode_dt(Utc::now());

    let (outcome, raw) = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let select = format!(
          "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements WHERE user_id = ?1 AND kind = ?2"
        );
        let existing = tx
          .query_row(&select, rusqlite::params![user, kind], read_achievement)
          .optional()?;

        let outcome = match existing {
          Some(a) if a.unlocked => Unlock::AlreadyUnlocked,
          Some(a) => {
            tx.execute(
              "UPDATE achievements SET unlocked = 1, unlocked_at = ?2 WHERE achievement_id = ?1",
              rusqlite::params![a.achievement_id, now],
            )?;
            Unlock::Unlocked
          }
          None => {
            tx.execute(
              "INSERT INTO achievements (achievement_id, user_id, kind, unlocked, unlocked_at)
               VALUES (?1, ?2, ?3, 1, ?4)",
              rusqlite::params![encode_uuid(Uuid::new_v4()), user, kind, now],
            )?;
            Unlock::Created
          }
        };

        let raw = tx.query_row(&select, rusqlite::params![user, kind], read_achievement)?;
        tx.commit()?;
        Ok((outcome, raw))
      })
      .await?;

    let achievement = raw.into_achievement()?;
    Ok(match outcome {
      Unlock::Created => UnlockOutcome::Created(achievement),
      Unlock::Unlocked => UnlockOutcome::Unlocked(achievement),
      Unlock::AlreadyUnlocked => UnlockOutcome::AlreadyUnlocked(achievement),
    })
  }

  // ── Habits ────────────────────────────────────────────────────────────────

  async fn create_habit(&self, user_id: Uuid, input: NewHabit) -> Result<Habit> {
    input.validate()?;
    let habit = input.into_habit(user_id, Utc::now());
    let raw = RawHabit::from_habit(&habit);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        write_habit(&tx, &raw)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(habit)
  }

  async fn get_habit(&self, user_id: Uuid, habit_id: Uuid) -> Result<Option<Habit>> {
    let user = encode_uuid(user_id);
    let id = encode_uuid(habit_id);

    let raws = self
      .conn
      .call(move |conn| {
        Ok(query_habits(
          conn,
          "habit_id = ?1 AND user_id = ?2 AND is_deleted = 0",
          rusqlite::params![id, user],
        )?)
      })
      .await?;

    raws.into_iter().next().map(RawHabit::into_habit).transpose()
  }

  async fn list_habits(&self, user_id: Uuid) -> Result<Vec<Habit>> {
    let user = encode_uuid(user_id);
    let raws = self
      .conn
      .call(move |conn| {
        Ok(query_habits(
          conn,
          "user_id = ?1 AND is_deleted = 0 ORDER BY updated_at DESC",
          rusqlite::params![user],
        )?)
      })
      .await?;
    raws.into_iter().map(RawHabit::into_habit).collect()
  }

  async fn update_habit(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    patch: HabitPatch,
  ) -> Result<Option<Habit>> {
    patch.validate()?;
    let user = encode_uuid(user_id);
    let id = encode_uuid(habit_id);
    let now = Utc::now();

    let updated = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let raws =
          query_habits(&tx, "habit_id = ?1 AND user_id = ?2", rusqlite::params![id, user])?;
        let Some(raw) = raws.into_iter().next() else {
          return Ok(None);
        };
        let mut habit = raw.into_habit().map_err(other)?;
        habit.apply(patch, now);
        write_habit(&tx, &RawHabit::from_habit(&habit))?;
        tx.commit()?;
        Ok(Some(habit))
      })
      .await?;

    Ok(updated)
  }

  async fn list_active_habit_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
    let user = encode_uuid(user_id);
    let ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let rows = conn
          .prepare(
            "SELECT habit_id FROM habits WHERE user_id = ?1 AND is_deleted = 0 ORDER BY rowid",
          )?
          .query_map(rusqlite::params![user], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    ids.iter().map(|s| decode_uuid(s)).collect()
  }

  // ── Instances ─────────────────────────────────────────────────────────────

  async fn check_habit(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    check: CheckIn,
  ) -> Result<Option<CheckOutcome>> {
    let user = encode_uuid(user_id);
    let habit = encode_uuid(habit_id);
    let date = encode_date(check.date);
    let now = Utc::now();
    let now_str = encode_dt(now);
    let fresh_id = encode_uuid(Uuid::new_v4());

    let checked = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let raws = query_habits(
          &tx,
          "habit_id = ?1 AND user_id = ?2 AND is_deleted = 0",
          rusqlite::params![habit, user],
        )?;
        let Some(raw) = raws.into_iter().next() else {
          return Ok(None);
        };
        let difficulty = raw.into_habit().map_err(other)?.difficulty;
        let xp = check.xp_awarded(difficulty) as i64;

        let previous: i64 = tx
          .query_row(
            "SELECT xp_awarded FROM habit_instances WHERE habit_id = ?1 AND date = ?2",
            rusqlite::params![habit, date],
            |r| r.get(0),
          )
          .optional()?
          .unwrap_or(0);

        tx.execute(
          "INSERT INTO habit_instances
             (instance_id, habit_id, date, completed, xp_awarded, is_deleted, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
           ON CONFLICT(habit_id, date) DO UPDATE SET
             completed  = excluded.completed,
             xp_awarded = excluded.xp_awarded,
             is_deleted = 0,
             updated_at = excluded.updated_at",
          rusqlite::params![fresh_id, habit, date, check.completed, xp, now_str],
        )?;

        let instance = tx.query_row(
          &format!(
            "SELECT {INSTANCE_COLUMNS} FROM habit_instances i
              WHERE i.habit_id = ?1 AND i.date = ?2"
          ),
          rusqlite::params![habit, date],
          read_instance,
        )?;

        let character = match load_character(&tx, &user)? {
          Some(raw) => {
            let mut character = raw.into_character().map_err(other)?;
            if xp != previous {
              character.apply_xp(xp - previous, now);
              save_character(&tx, &RawCharacter::from_character(&character))?;
            }
            Some(character)
          }
          None => None,
        };

        tx.commit()?;
        Ok(Some((instance, character)))
      })
      .await?;

    checked
      .map(|(raw, character)| Ok(CheckOutcome { instance: raw.into_instance()?, character }))
      .transpose()
  }

  async fn get_instance(&self, user_id: Uuid, instance_id: Uuid) -> Result<Option<HabitInstance>> {
    let user = encode_uuid(user_id);
    let id = encode_uuid(instance_id);

    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {INSTANCE_COLUMNS} FROM habit_instances i
                   JOIN habits h ON h.habit_id = i.habit_id
                  WHERE i.instance_id = ?1 AND h.user_id = ?2"
              ),
              rusqlite::params![id, user],
              read_instance,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawInstance::into_instance).transpose()
  }

  async fn list_instances(&self, habit_id: Uuid, range: DateRange) -> Result<Vec<HabitInstance>> {
    let habit = encode_uuid(habit_id);
    let from = range.from.map(encode_date);
    let to = range.to.map(encode_date);

    let raws: Vec<RawInstance> = self
      .conn
      .call(move |conn| {
        let rows = conn
          .prepare(&format!(
            "SELECT {INSTANCE_COLUMNS} FROM habit_instances i
              WHERE i.habit_id = ?1 AND i.is_deleted = 0
                AND (?2 IS NULL OR i.date >= ?2)
                AND (?3 IS NULL OR i.date <= ?3)
              ORDER BY i.date"
          ))?
          .query_map(rusqlite::params![habit, from, to], read_instance)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInstance::into_instance).collect()
  }

  async fn list_completed_dates(&self, habit_id: Uuid) -> Result<CompletedDates> {
    let habit = encode_uuid(habit_id);
    let dates: Vec<String> = self
      .conn
      .call(move |conn| {
        let rows = conn
          .prepare(
            "SELECT date FROM habit_instances
              WHERE habit_id = ?1 AND completed = 1 AND is_deleted = 0",
          )?
          .query_map(rusqlite::params![habit], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    dates.iter().map(|s| decode_date(s)).collect()
  }

  // ── Sync ──────────────────────────────────────────────────────────────────

  async fn changes_since(&self, user_id: Uuid, since: DateTime<Utc>) -> Result<SyncPayload> {
    let user = encode_uuid(user_id);
    let since = encode_dt(since);

    let (habits, instances) = self
      .conn
      .call(move |conn| {
        let habits = query_habits(
          conn,
          "user_id = ?1 AND updated_at > ?2 ORDER BY updated_at",
          rusqlite::params![user, since],
        )?;
        let instances = conn
          .prepare(&format!(
            "SELECT {INSTANCE_COLUMNS} FROM habit_instances i
               JOIN habits h ON h.habit_id = i.habit_id
              WHERE h.user_id = ?1 AND i.updated_at > ?2
              ORDER BY i.updated_at"
          ))?
          .query_map(rusqlite::params![user, since], read_instance)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((habits, instances))
      })
      .await?;

    Ok(SyncPayload {
      habits:          habits.into_iter().map(RawHabit::into_habit).collect::<Result<_>>()?,
      habit_instances: instances
        .into_iter()
        .map(RawInstance::into_instance)
        .collect::<Result<_>>()?,
    })
  }

  async fn apply_sync(&self, user_id: Uuid, batch: SyncPayload) -> Result<SyncReport> {
    for habit in &batch.habits {
      habit.validate()?;
    }

    let user = encode_uuid(user_id);
    let mut report = SyncReport::default();

    let habits: Vec<(RawHabit, DateTime<Utc>)> = batch
      .habits
      .iter()
      .filter(|h| {
        let own = h.user_id == user_id;
        report.skipped += (!own) as u32;
        own
      })
      .map(|h| (RawHabit::from_habit(h), h.updated_at))
      .collect();
    let instances: Vec<(RawInstance, DateTime<Utc>)> = batch
      .habit_instances
      .iter()
      .map(|i| (RawInstance::from_instance(i), i.updated_at))
      .collect();

    let report = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        for (habit, incoming) in &habits {
          let stored: Option<(String, String)> = tx
            .query_row(
              "SELECT user_id, updated_at FROM habits WHERE habit_id = ?1",
              rusqlite::params![habit.habit_id],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;
          let wins = match &stored {
            Some((owner, _)) if *owner != user => false,
            Some((_, at)) => last_write_wins(decode_dt(at).ok(), *incoming),
            None => true,
          };
          if wins {
            write_habit(&tx, habit)?;
            report.habits_applied += 1;
          } else {
            report.skipped += 1;
          }
        }

        for (instance, incoming) in &instances {
          if habit_owner(&tx, &instance.habit_id)?.as_deref() != Some(user.as_str()) {
            report.skipped += 1;
            continue;
          }
          // The same id already names a different (habit, date) slot.
          let moved: bool = tx
            .query_row(
              "SELECT 1 FROM habit_instances
                WHERE instance_id = ?1 AND NOT (habit_id = ?2 AND date = ?3)",
              rusqlite::params![instance.instance_id, instance.habit_id, instance.date],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          let stored: Option<String> = tx
            .query_row(
              "SELECT updated_at FROM habit_instances WHERE habit_id = ?1 AND date = ?2",
              rusqlite::params![instance.habit_id, instance.date],
              |r| r.get(0),
            )
            .optional()?;
          let wins = match &stored {
            Some(at) => last_write_wins(decode_dt(at).ok(), *incoming),
            None => true,
          };
          if moved || !wins {
            report.skipped += 1;
            continue;
          }

          // xp_awarded is server-credited XP: new rows start at zero and
          // existing rows keep theirs.
          tx.execute(
            "INSERT INTO habit_instances
               (instance_id, habit_id, date, completed, xp_awarded, is_deleted, updated_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)
             ON CONFLICT(habit_id, date) DO UPDATE SET
               completed  = excluded.completed,
               is_deleted = excluded.is_deleted,
               updated_at = excluded.updated_at",
            rusqlite::params![
              instance.instance_id,
              instance.habit_id,
              instance.date,
              instance.completed,
              instance.is_deleted,
              instance.updated_at,
            ],
          )?;
          report.instances_applied += 1;
        }

        tx.commit()?;
        Ok(report)
      })
      .await?;

    Ok(report)
  }
}
