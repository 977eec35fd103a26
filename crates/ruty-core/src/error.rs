//! Error types for `ruty-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("difficulty must be between 1 and 5, got {0}")]
  InvalidDifficulty(i64),

  #[error("invalid schedule: {0}")]
  InvalidSchedule(String),

  #[error("invalid date range: {from} is after {to}")]
  InvalidRange { from: NaiveDate, to: NaiveDate },

  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error("unknown {kind}: {value:?}")]
  UnknownVariant { kind: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
