//! The two statistics reports exposed to clients.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
  CompletedDates, PeriodReport,
  period::{self, DAYS_PER_WEEK, percentage, round2},
  streak::{self, StreakMode, StreakStatus},
};
use crate::habit::HabitInstance;

// ─── Single habit ────────────────────────────────────────────────────────────

/// One row of the audit trail in [`HabitStatistics::instances`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceEntry {
  pub date:      NaiveDate,
  pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStatistics {
  pub habit_id:        Uuid,
  pub current_streak:  u32,
  pub longest_streak:  u32,
  pub streak_status:   StreakStatus,
  pub daily:           PeriodReport,
  pub weekly:          PeriodReport,
  pub monthly:         PeriodReport,
  pub total_completed: u32,
  /// Every live instance, completed or not, oldest first.
  pub instances:       Vec<InstanceEntry>,
}

/// Build the single-habit report from its instance log.
pub fn habit_statistics(
  habit_id: Uuid,
  instances: &[HabitInstance],
  today: NaiveDate,
) -> HabitStatistics {
  let dates = CompletedDates::from_instances(instances);
  let current = streak::current_streak(&dates, today, StreakMode::Graceful);

  let mut entries: Vec<InstanceEntry> = instances
    .iter()
    .filter(|i| !i.is_deleted)
    .map(|i| InstanceEntry { date: i.date, completed: i.completed })
    .collect();
  entries.sort_by_key(|e| e.date);

  HabitStatistics {
    habit_id,
    current_streak: current.length,
    longest_streak: streak::longest_streak(&dates),
    streak_status: current.status,
    daily: period::daily(&dates, today),
    weekly: period::weekly(&dates, today),
    monthly: period::monthly(&dates, today),
    total_completed: dates.len() as u32,
    instances: entries,
  }
}

// ─── All habits ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSummary {
  pub habit_id:        Uuid,
  /// Strict streak: no grace for a missing today.
  pub current_streak:  u32,
  /// `1` if today is completed, `0` otherwise.
  pub daily_completed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllHabitsStatistics {
  pub total_habits:         u32,
  pub overall_daily_rate:   f64,
  pub overall_weekly_rate:  f64,
  pub overall_monthly_rate: f64,
  pub average_streak:       f64,
  pub habits:               Vec<HabitSummary>,
}

/// Aggregate over every active habit of a user, given as
/// `(habit_id, completed dates)` pairs.
pub fn all_habits_statistics(
  habits: &[(Uuid, CompletedDates)],
  today: NaiveDate,
) -> AllHabitsStatistics {
  let count = habits.len() as u64;
  let month_days = period::days_in_month(today) as u64;

  let mut daily_done = 0u64;
  let mut weekly_done = 0u64;
  let mut monthly_done = 0u64;
  let mut streak_sum = 0u64;
  let mut summaries = Vec::with_capacity(habits.len());

  for (habit_id, dates) in habits {
    let daily_completed = dates.contains(today) as u32;
    let current = streak::current_streak(dates, today, StreakMode::Strict).length;

    daily_done += daily_completed as u64;
    weekly_done += period::weekly_completed(dates, today) as u64;
    monthly_done += period::monthly_completed(dates, today) as u64;
    streak_sum += current as u64;

    summaries.push(HabitSummary { habit_id: *habit_id, current_streak: current, daily_completed });
  }

  let average_streak = if count == 0 { 0.0 } else { round2(streak_sum as f64 / count as f64) };

  AllHabitsStatistics {
    total_habits: count as u32,
    overall_daily_rate: percentage(daily_done, count),
    overall_weekly_rate: percentage(weekly_done, count * DAYS_PER_WEEK as u64),
    overall_monthly_rate: percentage(monthly_done, count * month_days),
    average_streak,
    habits: summaries,
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Days, Utc};

  use super::*;

  // Thursday; the week runs 2024-03-10..=2024-03-16.
  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 3, 14).unwrap() }

  fn days_ago(n: u64) -> NaiveDate { today() - Days::new(n) }

  fn instance(date: NaiveDate, completed: bool) -> HabitInstance {
    HabitInstance {
      id: Uuid::new_v4(),
      habit_id: Uuid::nil(),
      date,
      completed,
      xp_awarded: 0,
      is_deleted: false,
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn empty_log_yields_zero_report() {
    let report = habit_statistics(Uuid::nil(), &[], today());
    assert_eq!(report.current_streak, 0);
    assert_eq!(report.longest_streak, 0);
    assert_eq!(report.streak_status, StreakStatus::Broken);
    assert_eq!(report.total_completed, 0);
    assert_eq!(report.weekly, PeriodReport::new(0, 7));
    assert_eq!(report.monthly.total, 31);
    assert!(report.instances.is_empty());
  }

  #[test]
  fn single_habit_report() {
    let log = vec![
      instance(days_ago(1), true),
      instance(days_ago(3), true),
      instance(days_ago(2), false),
      instance(days_ago(4), true),
    ];
    let report = habit_statistics(Uuid::nil(), &log, today());

    assert_eq!(report.current_streak, 1);
    assert_eq!(report.streak_status, StreakStatus::MissedYesterday);
    assert_eq!(report.longest_streak, 2);
    assert_eq!(report.total_completed, 3);
    assert_eq!(report.daily.completed, 0);
    // 11th, 10th and 13th fall in this week; the 12th was not completed.
    assert_eq!(report.weekly.completed, 3);
    assert_eq!(report.weekly.rate, 42.86);
    assert_eq!(report.instances.len(), 4);
    assert!(report.instances.windows(2).all(|w| w[0].date < w[1].date));
    assert!(!report.instances[2].completed);
  }

  #[test]
  fn deleted_instances_are_hidden() {
    let mut gone = instance(today(), true);
    gone.is_deleted = true;
    let report = habit_statistics(Uuid::nil(), &[gone], today());
    assert_eq!(report.total_completed, 0);
    assert!(report.instances.is_empty());
  }

  #[test]
  fn report_serialises_in_camel_case() {
    let report = habit_statistics(Uuid::nil(), &[instance(today(), true)], today());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["currentStreak"], 1);
    assert_eq!(json["streakStatus"], "ongoing");
    assert_eq!(json["daily"]["rate"], 100.0);
    assert_eq!(json["totalCompleted"], 1);
    assert_eq!(json["instances"][0]["date"], "2024-03-14");
  }

  #[test]
  fn zero_habits_never_divides_by_zero() {
    let report = all_habits_statistics(&[], today());
    assert_eq!(report.total_habits, 0);
    assert_eq!(report.overall_daily_rate, 0.0);
    assert_eq!(report.overall_weekly_rate, 0.0);
    assert_eq!(report.overall_monthly_rate, 0.0);
    assert_eq!(report.average_streak, 0.0);
    assert!(report.habits.is_empty());
  }

  #[test]
  fn aggregate_over_two_habits() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let habits: Vec<(Uuid, CompletedDates)> = vec![
      (a, [today(), days_ago(1), days_ago(2)].into_iter().collect()),
      // Only yesterday: graceful mode would report 1, strict reports 0.
      (b, [days_ago(1)].into_iter().collect()),
    ];
    let report = all_habits_statistics(&habits, today());

    assert_eq!(report.total_habits, 2);
    assert_eq!(report.overall_daily_rate, 50.0);
    // 4 of 14 habit-days this week.
    assert_eq!(report.overall_weekly_rate, 28.57);
    // 4 of 62 habit-days this month.
    assert_eq!(report.overall_monthly_rate, 6.45);
    assert_eq!(report.average_streak, 1.5);
    assert_eq!(report.habits[0], HabitSummary { habit_id: a, current_streak: 3, daily_completed: 1 });
    assert_eq!(report.habits[1], HabitSummary { habit_id: b, current_streak: 0, daily_completed: 0 });

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["totalHabits"], 2);
    assert_eq!(json["habits"][1]["dailyCompleted"], 0);
  }
}
