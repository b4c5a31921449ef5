//! Error types for `mandir-core`.

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("slot date {date} is in the past (today is {today})")]
  SlotDateInPast { date: NaiveDate, today: NaiveDate },

  #[error("unknown slot time: {0:?}")]
  UnknownSlot(String),

  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("unknown booking status: {0:?}")]
  UnknownStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
