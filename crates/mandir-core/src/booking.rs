//! Bookings: a pilgrim party's reservation of a darshan slot.
//!
//! A booking is created `Pending` and moves to `Present` exactly once, when
//! its QR code is scanned at the gate. Apart from the reference to its QR
//! image, nothing else about a booking ever changes and bookings are never
//! deleted.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Store-assigned surrogate key of a booking. This is the only value a QR
/// code needs to carry.
pub type BookingId = i64;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where a booking is in its lifecycle. The only transition is
/// `Pending → Present`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
  Pending,
  Present,
}

impl BookingStatus {
  /// The string stored in the `status` column and returned by status polls.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "Pending",
      Self::Present => "Present",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "Pending" => Ok(Self::Pending),
      "Present" => Ok(Self::Present),
      other => Err(Error::UnknownStatus(other.to_owned())),
    }
  }
}

impl fmt::Display for BookingStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── Booking ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
  pub booking_id:     BookingId,
  pub name:           String,
  /// Free text, e.g. a head count or a list of names.
  pub family_members: String,
  pub slot_date:      NaiveDate,
  pub slot_time:      String,
  pub status:         BookingStatus,
  /// Set once, at check-in.
  pub checkin_time:   Option<DateTime<Utc>>,
  /// Path of the QR image relative to the static directory. Kept after
  /// check-in even though the file itself is removed.
  pub qr_file:        Option<String>,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`crate::store::TempleStore::reserve`].
/// `status` and `created_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewBooking {
  pub name:           String,
  pub family_members: String,
  pub slot_date:      NaiveDate,
  pub slot_time:      String,
}

impl NewBooking {
  /// Check everything that can be checked without touching the store:
  /// a non-empty name, a slot date no earlier than `today`, and a slot time
  /// offered by `schedule`.
  pub fn validate(&self, schedule: &SlotSchedule, today: NaiveDate) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::MissingField("name"));
    }
    validate_slot_date(self.slot_date, today)?;
    schedule.validate_time(&self.slot_time)
  }
}

/// Outcome of a reservation attempt. A full slot is an expected answer, not a
/// failure of the store.
#[derive(Debug, Clone)]
pub enum Reservation {
  Booked(Booking),
  SlotFull {
    slot_date: NaiveDate,
    slot_time: String,
  },
}

/// Outcome of a check-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckIn {
  /// The booking was `Pending` and is now `Present`.
  Admitted {
    booking_id:   BookingId,
    checkin_time: DateTime<Utc>,
    /// QR image to discard, if one was ever issued.
    qr_file:      Option<String>,
  },
  /// Unknown booking, or a booking that was already checked in.
  Rejected,
}

// ─── Slots ───────────────────────────────────────────────────────────────────

/// The fixed set of daily slots and how many bookings each one takes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSchedule {
  pub times:    Vec<String>,
  pub capacity: u32,
}

impl Default for SlotSchedule {
  fn default() -> Self {
    Self {
      times:    vec!["8-9 AM".to_owned(), "9-10 AM".to_owned()],
      capacity: 10,
    }
  }
}

impl SlotSchedule {
  pub fn validate_time(&self, time: &str) -> Result<()> {
    if self.times.iter().any(|t| t == time) {
      Ok(())
    } else {
      Err(Error::UnknownSlot(time.to_owned()))
    }
  }

  /// Pair every scheduled slot with its current booking count. Slots missing
  /// from `counts` have no bookings yet; counts for unscheduled times are
  /// ignored.
  pub fn availability(&self, counts: &[(String, u32)]) -> Vec<SlotAvailability> {
    self
      .times
      .iter()
      .map(|time| {
        let booked = counts
          .iter()
          .find(|(t, _)| t == time)
          .map(|(_, n)| *n)
          .unwrap_or(0);
        SlotAvailability {
          slot_time: time.clone(),
          booked,
          capacity: self.capacity,
        }
      })
      .collect()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
  pub slot_time: String,
  pub booked:    u32,
  pub capacity:  u32,
}

impl SlotAvailability {
  pub fn is_open(&self) -> bool { self.booked < self.capacity }
}

/// A slot may be booked for today or any later date.
pub fn validate_slot_date(date: NaiveDate, today: NaiveDate) -> Result<()> {
  if date < today {
    Err(Error::SlotDateInPast { date, today })
  } else {
    Ok(())
  }
}

// ─── Check-in codes ──────────────────────────────────────────────────────────

/// Extract the booking id from whatever a scanner read off a QR code.
///
/// Accepted forms, all surrounded by optional whitespace:
/// - a bare id: `42`
/// - a pipe-delimited payload whose first field is the id:
///   `42|Asha|2025-01-01|8-9 AM|2`
/// - a check-in URL whose `code` parameter holds either of the above:
///   `http://host:5000/checkin?code=42`
pub fn parse_checkin_code(raw: &str) -> Option<BookingId> {
  // Only the leading field names the booking; later free-text fields may
  // hold anything, `?` included.
  let head = raw.trim().split('|').next().unwrap_or_default();
  let code = if head.contains('?') { code_param(head)? } else { head };

  // A pipe that survived inside a URL arrives percent-encoded.
  let first = code.split("%7C").next().unwrap_or(code);
  let first = first.split("%7c").next().unwrap_or(first);

  first.trim().parse::<BookingId>().ok().filter(|id| *id > 0)
}

fn code_param(url: &str) -> Option<&str> {
  let (_, query) = url.split_once('?')?;
  let query = query.split('#').next().unwrap_or(query);
  query.split('&').find_map(|pair| pair.strip_prefix("code="))
}
