//! Current and longest streaks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::CompletedDates;

/// Qualitative state of the current streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakStatus {
  /// Today is completed.
  Ongoing,
  /// Today is not completed yet but yesterday was; the streak can still be
  /// extended.
  MissedYesterday,
  /// Neither today nor yesterday is completed.
  Broken,
}

/// Which current-streak formula to apply.
///
/// The single-habit report uses [`StreakMode::Graceful`]; the all-habits
/// aggregate uses [`StreakMode::Strict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakMode {
  /// A streak stays alive while today or yesterday is completed.
  Graceful,
  /// Count back from today only; a missing today means no streak.
  Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentStreak {
  pub length: u32,
  pub status: StreakStatus,
}

/// Length and status of the chain of completed days ending today (or, in
/// graceful mode, yesterday).
pub fn current_streak(
  dates: &CompletedDates,
  today: NaiveDate,
  mode: StreakMode,
) -> CurrentStreak {
  let anchor = if dates.contains(today) {
    Some((today, StreakStatus::Ongoing))
  } else if mode == StreakMode::Graceful {
    today
      .pred_opt()
      .filter(|yesterday| dates.contains(*yesterday))
      .map(|yesterday| (yesterday, StreakStatus::MissedYesterday))
  } else {
    None
  };

  match anchor {
    Some((end, status)) => CurrentStreak { length: run_ending_at(dates, end), status },
    None => CurrentStreak { length: 0, status: StreakStatus::Broken },
  }
}

/// Count consecutive completed days walking backwards from `end`.
fn run_ending_at(dates: &CompletedDates, end: NaiveDate) -> u32 {
  let mut length = 0;
  let mut day = Some(end);
  // A run can never be longer than the set it is drawn from.
  for _ in 0..dates.len() {
    match day {
      Some(d) if dates.contains(d) => {
        length += 1;
        day = d.pred_opt();
      }
      _ => break,
    }
  }
  length
}

/// Longest run of consecutive days anywhere in `dates`, independent of today.
pub fn longest_streak(dates: &CompletedDates) -> u32 {
  let mut longest = 0;
  let mut run = 0;
  let mut previous: Option<NaiveDate> = None;

  for date in dates.iter() {
    run = match previous {
      Some(p) if p.succ_opt() == Some(date) => run + 1,
      _ => 1,
    };
    longest = longest.max(run);
    previous = Some(date);
  }
  longest
}

#[cfg(test)]
mod tests {
  use chrono::Days;

  use super::*;

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 14).unwrap() }

  fn days_ago(n: u64) -> NaiveDate { today() - Days::new(n) }

  fn set(dates: &[NaiveDate]) -> CompletedDates { dates.iter().copied().collect() }

  fn graceful(dates: &CompletedDates) -> CurrentStreak {
    current_streak(dates, today(), StreakMode::Graceful)
  }

  #[test]
  fn empty_set_is_broken() {
    let dates = CompletedDates::new();
    assert_eq!(graceful(&dates), CurrentStreak { length: 0, status: StreakStatus::Broken });
    assert_eq!(longest_streak(&dates), 0);
  }

  #[test]
  fn today_only_is_ongoing() {
    let dates = set(&[today()]);
    assert_eq!(graceful(&dates), CurrentStreak { length: 1, status: StreakStatus::Ongoing });
  }

  #[test]
  fn yesterday_only_is_salvageable() {
    let dates = set(&[days_ago(1)]);
    assert_eq!(
      graceful(&dates),
      CurrentStreak { length: 1, status: StreakStatus::MissedYesterday }
    );
  }

  #[test]
  fn two_days_ago_is_broken() {
    let dates = set(&[days_ago(2)]);
    assert_eq!(graceful(&dates), CurrentStreak { length: 0, status: StreakStatus::Broken });
  }

  #[test]
  fn chain_ending_today_counts_every_day() {
    let dates = set(&[today(), days_ago(1), days_ago(2), days_ago(4)]);
    assert_eq!(graceful(&dates), CurrentStreak { length: 3, status: StreakStatus::Ongoing });
  }

  #[test]
  fn chain_ending_yesterday_keeps_its_length() {
    let dates = set(&[days_ago(1), days_ago(2), days_ago(3)]);
    assert_eq!(
      graceful(&dates),
      CurrentStreak { length: 3, status: StreakStatus::MissedYesterday }
    );
  }

  #[test]
  fn strict_mode_has_no_yesterday_grace() {
    let dates = set(&[days_ago(1), days_ago(2)]);
    assert_eq!(
      current_streak(&dates, today(), StreakMode::Strict),
      CurrentStreak { length: 0, status: StreakStatus::Broken }
    );

    let with_today = set(&[today(), days_ago(1)]);
    assert_eq!(current_streak(&with_today, today(), StreakMode::Strict).length, 2);
  }

  #[test]
  fn future_dates_do_not_extend_the_chain() {
    let dates = set(&[today() + Days::new(1), today()]);
    assert_eq!(graceful(&dates).length, 1);
  }

  #[test]
  fn longest_streak_over_gaps() {
    let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    let dates = set(&[d(1), d(2), d(3), d(10)]);
    assert_eq!(longest_streak(&dates), 3);
  }

  #[test]
  fn longest_streak_single_date() {
    assert_eq!(longest_streak(&set(&[today()])), 1);
  }

  #[test]
  fn longest_streak_ignores_today() {
    let d = |m, day| NaiveDate::from_ymd_opt(2023, m, day).unwrap();
    // Run across a month boundary, long before `today()`.
    let dates = set(&[d(1, 30), d(1, 31), d(2, 1), d(2, 2), d(6, 1)]);
    assert_eq!(longest_streak(&dates), 4);
    assert_eq!(graceful(&dates).status, StreakStatus::Broken);
  }
}
