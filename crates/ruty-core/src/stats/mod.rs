//! The habit statistics engine.
//!
//! Everything here is a pure function of a [`CompletedDates`] set and an
//! explicit `today`. Nothing performs I/O and nothing fails: empty input
//! produces zero-valued reports.
//!
//! - [`streak`]: current streak (two variants, see [`StreakMode`]), longest
//!   streak, and the tri-state [`StreakStatus`].
//! - [`period`]: daily, weekly (Sunday-based) and monthly windows.
//! - [`report`]: the single-habit and all-habits reports served over HTTP.

mod dates;
pub mod period;
pub mod report;
pub mod streak;

pub use dates::CompletedDates;
pub use period::PeriodReport;
pub use report::{
  AllHabitsStatistics, HabitStatistics, HabitSummary, InstanceEntry,
  all_habits_statistics, habit_statistics,
};
pub use streak::{CurrentStreak, StreakMode, StreakStatus};
