//! [`SqliteStore`]: the SQLite implementation of [`TempleStore`].

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, TransactionBehavior};

use mandir_core::{
  alert::{ALERT_STATUS_SENT, Alert, NewAlert},
  booking::{Booking, BookingId, BookingStatus, CheckIn, NewBooking, Reservation},
  density::{CrowdDensity, NewCrowdDensity},
  pilgrim::{NewPilgrim, Pilgrim},
  store::TempleStore,
};

use crate::{
  Result,
  encode::{
    BOOKING_COLUMNS, RawAlert, RawBooking, RawDensity, encode_date, encode_dt,
    encode_recipients, pilgrim_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Mandir store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted. Every call
/// runs on the connection's own thread, one at a time.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── TempleStore impl ────────────────────────────────────────────────────────

impl TempleStore for SqliteStore {
  type Error = crate::Error;

  // ── Bookings ──────────────────────────────────────────────────────────────

  async fn slot_counts(&self, date: NaiveDate) -> Result<Vec<(String, u32)>> {
    let date_str = encode_date(date);

    let counts = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT slot_time, COUNT(*) FROM bookings
           WHERE slot_date = ?1
           GROUP BY slot_time",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![date_str], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(counts)
  }

  async fn reserve(&self, input: NewBooking, capacity: u32) -> Result<Reservation> {
    let created_at = Utc::now();

    let name_str   = input.name.clone();
    let family_str = input.family_members.clone();
    let date_str   = encode_date(input.slot_date);
    let time_str   = input.slot_time.clone();
    let at_str     = encode_dt(created_at);

    // The count and the insert share one IMMEDIATE transaction, so the write
    // lock is held from the first read and no other writer can slip in.
    let inserted: Option<BookingId> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let booked: u32 = tx.query_row(
          "SELECT COUNT(*) FROM bookings WHERE slot_date = ?1 AND slot_time = ?2",
          rusqlite::params![date_str, time_str],
          |r| r.get(0),
        )?;
        if booked >= capacity {
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO bookings (name, family_members, slot_date, slot_time, status, created_at)
           VALUES (?1, ?2, ?3, ?4, 'Pending', ?5)",
          rusqlite::params![name_str, family_str, date_str, time_str, at_str],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(Some(id))
      })
      .await?;

    let Some(booking_id) = inserted else {
      tracing::debug!(
        slot_date = %input.slot_date,
        slot_time = %input.slot_time,
        capacity,
        "slot is full"
      );
      return Ok(Reservation::SlotFull {
        slot_date: input.slot_date,
        slot_time: input.slot_time,
      });
    };

    Ok(Reservation::Booked(Booking {
      booking_id,
      name: input.name,
      family_members: input.family_members,
      slot_date: input.slot_date,
      slot_time: input.slot_time,
      status: BookingStatus::Pending,
      checkin_time: None,
      qr_file: None,
      created_at,
    }))
  }

  async fn attach_qr_file(&self, id: BookingId, qr_file: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE bookings SET qr_file = ?1 WHERE booking_id = ?2",
          rusqlite::params![qr_file, id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn cancel_reservation(&self, id: BookingId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM bookings
           WHERE booking_id = ?1 AND status = 'Pending' AND qr_file IS NULL",
          rusqlite::params![id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
    let raw: Option<RawBooking> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = ?1"),
            rusqlite::params![id],
            RawBooking::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawBooking::into_booking).transpose()
  }

  async fn check_in(&self, id: BookingId, at: DateTime<Utc>) -> Result<CheckIn> {
    let at_str = encode_dt(at);

    // Guarded by the prior status: a second attempt matches no row.
    let updated: Option<Option<String>> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "UPDATE bookings
             SET status = 'Present', checkin_time = ?1
             WHERE booking_id = ?2 AND status = 'Pending'
             RETURNING qr_file",
            rusqlite::params![at_str, id],
            |r| r.get(0),
          )
          .optional()?)
      })
      .await?;

    Ok(match updated {
      Some(qr_file) => CheckIn::Admitted {
        booking_id: id,
        checkin_time: at,
        qr_file,
      },
      None => CheckIn::Rejected,
    })
  }

  // ── Pilgrims ──────────────────────────────────────────────────────────────

  async fn add_pilgrim(&self, input: NewPilgrim) -> Result<Pilgrim> {
    let row = input.clone();

    let pilgrim_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO pilgrims (name, phone, email, registered, zone, disability_status)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            row.name,
            row.phone,
            row.email,
            row.registered,
            row.zone,
            row.disability_status,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Pilgrim {
      pilgrim_id,
      name: input.name,
      phone: input.phone,
      email: input.email,
      registered: input.registered,
      zone: input.zone,
      disability_status: input.disability_status,
    })
  }

  async fn list_pilgrims(&self) -> Result<Vec<Pilgrim>> {
    let pilgrims = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT pilgrim_id, name, phone, email, registered, zone, disability_status
           FROM pilgrims
           ORDER BY name, pilgrim_id",
        )?;
        let rows = stmt
          .query_map([], pilgrim_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(pilgrims)
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  async fn record_alert(&self, input: NewAlert) -> Result<Alert> {
    let timestamp      = Utc::now();
    let recipients_str = encode_recipients(&input.recipients)?;
    let at_str         = encode_dt(timestamp);
    let row            = input.clone();

    let alert_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO alerts (zone, severity, type, message, recipients, timestamp, status)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            row.zone,
            row.severity,
            row.alert_type,
            row.message,
            recipients_str,
            at_str,
            ALERT_STATUS_SENT,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Alert {
      alert_id,
      zone: input.zone,
      severity: input.severity,
      alert_type: input.alert_type,
      message: input.message,
      recipients: input.recipients,
      timestamp,
      status: ALERT_STATUS_SENT.to_owned(),
    })
  }

  async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT alert_id, zone, severity, type, message, recipients, timestamp, status
           FROM alerts
           ORDER BY timestamp DESC, alert_id DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawAlert::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAlert::into_alert).collect()
  }

  // ── Crowd density ─────────────────────────────────────────────────────────

  async fn record_density(&self, input: NewCrowdDensity) -> Result<CrowdDensity> {
    let timestamp = Utc::now();
    let at_str    = encode_dt(timestamp);
    let zone_str  = input.zone.clone();
    let count     = input.estimated_count;

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO crowd_density (zone, estimated_count, timestamp) VALUES (?1, ?2, ?3)",
          rusqlite::params![zone_str, count, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(CrowdDensity {
      id,
      zone: input.zone,
      estimated_count: input.estimated_count,
      timestamp,
    })
  }

  async fn recent_density(&self, limit: usize) -> Result<Vec<CrowdDensity>> {
    let limit_val = i64::try_from(limit).unwrap_or(i64::MAX);

    let raws: Vec<RawDensity> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, zone, estimated_count, timestamp
           FROM crowd_density
           ORDER BY timestamp DESC, id DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], RawDensity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDensity::into_density).collect()
  }
}
