//! The `HabitStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `ruty-store-sqlite`).
//! Higher layers (`ruty-api`, `ruty-server`) depend on this abstraction, not
//! on any concrete backend.
//!
//! Methods taking a `user_id` only ever see that user's rows; ownership is
//! part of every query rather than a separate check.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  achievement::{Achievement, UnlockOutcome},
  character::{Character, CharacterPatch, NewCharacter},
  habit::{CheckIn, CheckOutcome, DateRange, Habit, HabitInstance, HabitPatch, NewHabit},
  stats::CompletedDates,
  sync::{SyncPayload, SyncReport},
  user::{NewUser, User},
};

/// Abstraction over a Ruty store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait HabitStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Cheap round-trip used by health checks.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Returns `None` if the email is already registered.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn find_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  // ── Characters ────────────────────────────────────────────────────────

  fn get_character(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Character>, Self::Error>> + Send + '_;

  /// Returns `None` if the user already has a character.
  fn create_character(
    &self,
    user_id: Uuid,
    input: NewCharacter,
  ) -> impl Future<Output = Result<Option<Character>, Self::Error>> + Send + '_;

  /// Returns `None` if the user has no character.
  fn update_character(
    &self,
    user_id: Uuid,
    patch: CharacterPatch,
  ) -> impl Future<Output = Result<Option<Character>, Self::Error>> + Send + '_;

  // ── Achievements ──────────────────────────────────────────────────────

  /// Most recently unlocked first.
  fn list_achievements(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Achievement>, Self::Error>> + Send + '_;

  fn unlock_achievement(
    &self,
    user_id: Uuid,
    kind: String,
  ) -> impl Future<Output = Result<UnlockOutcome, Self::Error>> + Send + '_;

  // ── Habits ────────────────────────────────────────────────────────────

  /// Insert the habit and its schedule rows in one transaction.
  fn create_habit(
    &self,
    user_id: Uuid,
    input: NewHabit,
  ) -> impl Future<Output = Result<Habit, Self::Error>> + Send + '_;

  /// A live habit owned by `user_id`. Soft-deleted habits are `None`.
  fn get_habit(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<Option<Habit>, Self::Error>> + Send + '_;

  /// Live habits of a user, most recently updated first.
  fn list_habits(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Habit>, Self::Error>> + Send + '_;

  /// Apply `patch` to a habit the user owns (deleted or not), rewriting its
  /// schedule rows in the same transaction. Returns `None` if not found.
  fn update_habit(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    patch: HabitPatch,
  ) -> impl Future<Output = Result<Option<Habit>, Self::Error>> + Send + '_;

  fn list_active_habit_ids(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  // ── Instances ─────────────────────────────────────────────────────────

  /// Upsert the `(habit, date)` instance and move the character's XP by the
  /// change in `xp_awarded`, atomically. Returns `None` if the habit is not a
  /// live habit of `user_id`.
  fn check_habit(
    &self,
    user_id: Uuid,
    habit_id: Uuid,
    check: CheckIn,
  ) -> impl Future<Output = Result<Option<CheckOutcome>, Self::Error>> + Send + '_;

  /// An instance whose habit `user_id` owns, even if that habit has been
  /// soft-deleted.
  fn get_instance(
    &self,
    user_id: Uuid,
    instance_id: Uuid,
  ) -> impl Future<Output = Result<Option<HabitInstance>, Self::Error>> + Send + '_;

  /// Non-deleted instances of a habit within `range`, ordered by date.
  fn list_instances(
    &self,
    habit_id: Uuid,
    range: DateRange,
  ) -> impl Future<Output = Result<Vec<HabitInstance>, Self::Error>> + Send + '_;

  fn list_completed_dates(
    &self,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<CompletedDates, Self::Error>> + Send + '_;

  // ── Sync ──────────────────────────────────────────────────────────────

  /// Every habit and instance of the user with `updated_at > since`,
  /// including soft-deleted rows.
  fn changes_since(
    &self,
    user_id: Uuid,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<SyncPayload, Self::Error>> + Send + '_;

  /// Apply a client batch with last-write-wins semantics in a single
  /// transaction; any error rolls back the whole batch.
  fn apply_sync(
    &self,
    user_id: Uuid,
    batch: SyncPayload,
  ) -> impl Future<Output = Result<SyncReport, Self::Error>> + Send + '_;
}
