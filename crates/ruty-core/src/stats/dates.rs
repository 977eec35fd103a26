//! [`CompletedDates`], the set every statistic is computed from.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::habit::HabitInstance;

/// The calendar dates on which a habit was completed.
///
/// Derived from instances with `completed = true` and `is_deleted = false`;
/// never stored. Iteration is in ascending date order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletedDates(BTreeSet<NaiveDate>);

impl CompletedDates {
  pub fn new() -> Self { Self::default() }

  /// Collect the completed, non-deleted dates of `instances`.
  pub fn from_instances<'a>(
    instances: impl IntoIterator<Item = &'a HabitInstance>,
  ) -> Self {
    instances
      .into_iter()
      .filter(|i| i.completed && !i.is_deleted)
      .map(|i| i.date)
      .collect()
  }

  pub fn insert(&mut self, date: NaiveDate) -> bool { self.0.insert(date) }

  pub fn contains(&self, date: NaiveDate) -> bool { self.0.contains(&date) }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ { self.0.iter().copied() }

  /// Number of dates in `first..=last`. An inverted window counts zero.
  pub fn count_between(&self, first: NaiveDate, last: NaiveDate) -> u32 {
    if first > last {
      return 0;
    }
    self.0.range(first..=last).count() as u32
  }
}

impl FromIterator<NaiveDate> for CompletedDates {
  fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}
