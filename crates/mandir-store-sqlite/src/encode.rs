//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that `ORDER BY timestamp` is chronological.
//! Calendar dates are `YYYY-MM-DD`. Recipient lists are compact JSON.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use mandir_core::{
  alert::Alert,
  booking::{Booking, BookingStatus},
  density::CrowdDensity,
  pilgrim::Pilgrim,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Recipients ──────────────────────────────────────────────────────────────

pub fn encode_recipients(recipients: &[String]) -> Result<String> {
  Ok(serde_json::to_string(recipients)?)
}

pub fn decode_recipients(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawBooking::from_row`].
pub const BOOKING_COLUMNS: &str = "booking_id, name, family_members, slot_date, \
                                   slot_time, status, checkin_time, qr_file, created_at";

/// Raw values read directly from a `bookings` row.
pub struct RawBooking {
  pub booking_id:     i64,
  pub name:           String,
  pub family_members: String,
  pub slot_date:      String,
  pub slot_time:      String,
  pub status:         String,
  pub checkin_time:   Option<String>,
  pub qr_file:        Option<String>,
  pub created_at:     String,
}

impl RawBooking {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      booking_id:     row.get(0)?,
      name:           row.get(1)?,
      family_members: row.get(2)?,
      slot_date:      row.get(3)?,
      slot_time:      row.get(4)?,
      status:         row.get(5)?,
      checkin_time:   row.get(6)?,
      qr_file:        row.get(7)?,
      created_at:     row.get(8)?,
    })
  }

  pub fn into_booking(self) -> Result<Booking> {
    Ok(Booking {
      booking_id:     self.booking_id,
      name:           self.name,
      family_members: self.family_members,
      slot_date:      decode_date(&self.slot_date)?,
      slot_time:      self.slot_time,
      status:         BookingStatus::parse(&self.status)?,
      checkin_time:   self.checkin_time.as_deref().map(decode_dt).transpose()?,
      qr_file:        self.qr_file,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Pilgrim rows need no decoding beyond what rusqlite does.
pub fn pilgrim_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Pilgrim> {
  Ok(Pilgrim {
    pilgrim_id:        row.get(0)?,
    name:              row.get(1)?,
    phone:             row.get(2)?,
    email:             row.get(3)?,
    registered:        row.get(4)?,
    zone:              row.get(5)?,
    disability_status: row.get(6)?,
  })
}

/// Raw values read directly from an `alerts` row.
pub struct RawAlert {
  pub alert_id:   i64,
  pub zone:       String,
  pub severity:   String,
  pub alert_type: String,
  pub message:    String,
  pub recipients: String,
  pub timestamp:  String,
  pub status:     String,
}

impl RawAlert {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      alert_id:   row.get(0)?,
      zone:       row.get(1)?,
      severity:   row.get(2)?,
      alert_type: row.get(3)?,
      message:    row.get(4)?,
      recipients: row.get(5)?,
      timestamp:  row.get(6)?,
      status:     row.get(7)?,
    })
  }

  pub fn into_alert(self) -> Result<Alert> {
    Ok(Alert {
      alert_id:   self.alert_id,
      zone:       self.zone,
      severity:   self.severity,
      alert_type: self.alert_type,
      message:    self.message,
      recipients: decode_recipients(&self.recipients)?,
      timestamp:  decode_dt(&self.timestamp)?,
      status:     self.status,
    })
  }
}

/// Raw values read directly from a `crowd_density` row.
pub struct RawDensity {
  pub id:              i64,
  pub zone:            String,
  pub estimated_count: u32,
  pub timestamp:       String,
}

impl RawDensity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      zone:            row.get(1)?,
      estimated_count: row.get(2)?,
      timestamp:       row.get(3)?,
    })
  }

  pub fn into_density(self) -> Result<CrowdDensity> {
    Ok(CrowdDensity {
      id:              self.id,
      zone:            self.zone,
      estimated_count: self.estimated_count,
      timestamp:       decode_dt(&self.timestamp)?,
    })
  }
}
