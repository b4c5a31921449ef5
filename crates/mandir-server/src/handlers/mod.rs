pub mod checkin;
pub mod register;
pub mod status;

use chrono::NaiveDate;

use crate::error::Error;

/// Parse the `YYYY-MM-DD` value of an HTML date input.
pub(super) fn parse_form_date(raw: &str) -> Result<NaiveDate, Error> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
    .map_err(|_| Error::BadRequest(format!("invalid date: {raw:?}")))
}
