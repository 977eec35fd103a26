//! Completion counts and rates over calendar windows anchored to today.
//!
//! Windows include days that are still in the future: a weekly rate on a
//! Monday reads as "rate so far this week", out of 7.

use chrono::{Datelike as _, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::CompletedDates;

pub const DAYS_PER_WEEK: u32 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
  pub completed: u32,
  pub total:     u32,
  /// Percentage, rounded to two decimals.
  pub rate:      f64,
}

impl PeriodReport {
  pub fn new(completed: u32, total: u32) -> Self {
    Self { completed, total, rate: percentage(completed as u64, total as u64) }
  }
}

/// `part / whole × 100` rounded to two decimals; zero when `whole` is zero.
pub fn percentage(part: u64, whole: u64) -> f64 {
  if whole == 0 {
    return 0.0;
  }
  round2(part as f64 / whole as f64 * 100.0)
}

pub fn round2(value: f64) -> f64 { (value * 100.0).round() / 100.0 }

// ─── Windows ─────────────────────────────────────────────────────────────────

/// The most recent Sunday on or before `today`.
pub fn week_start(today: NaiveDate) -> NaiveDate {
  today - Days::new(today.weekday().num_days_from_sunday() as u64)
}

/// First and last day of the month containing `today`.
pub fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
  let first = today - Days::new(today.day0() as u64);
  let last = first
    .checked_add_months(Months::new(1))
    .and_then(|next| next.pred_opt())
    .unwrap_or(NaiveDate::MAX);
  (first, last)
}

pub fn days_in_month(today: NaiveDate) -> u32 { month_bounds(today).1.day() }

// ─── Reports ─────────────────────────────────────────────────────────────────

pub fn daily(dates: &CompletedDates, today: NaiveDate) -> PeriodReport {
  PeriodReport::new(dates.contains(today) as u32, 1)
}

pub fn weekly(dates: &CompletedDates, today: NaiveDate) -> PeriodReport {
  PeriodReport::new(weekly_completed(dates, today), DAYS_PER_WEEK)
}

pub fn monthly(dates: &CompletedDates, today: NaiveDate) -> PeriodReport {
  PeriodReport::new(monthly_completed(dates, today), days_in_month(today))
}

/// Completed days in the Sunday-to-Saturday week containing `today`.
pub fn weekly_completed(dates: &CompletedDates, today: NaiveDate) -> u32 {
  let start = week_start(today);
  let end = start
    .checked_add_days(Days::new(DAYS_PER_WEEK as u64 - 1))
    .unwrap_or(NaiveDate::MAX);
  dates.count_between(start, end)
}

/// Completed days in the calendar month containing `today`.
pub fn monthly_completed(dates: &CompletedDates, today: NaiveDate) -> u32 {
  let (first, last) = month_bounds(today);
  dates.count_between(first, last)
}
