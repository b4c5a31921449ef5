//! The `TempleStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `mandir-store-sqlite`).
//! Higher layers (`mandir-api`, `mandir-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};

use crate::{
  alert::{Alert, NewAlert},
  booking::{Booking, BookingId, CheckIn, NewBooking, Reservation},
  density::{CrowdDensity, NewCrowdDensity},
  pilgrim::{NewPilgrim, Pilgrim},
};

/// Abstraction over a Mandir store backend.
///
/// Every method is a single atomic unit against the backend: no caller ever
/// needs to wrap two calls in a transaction to keep the invariants of the
/// booking lifecycle.
///
/// Futures are `Send` so handlers can be spawned on a multi-threaded runtime.
pub trait TempleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Bookings ──────────────────────────────────────────────────────────

  /// Number of bookings per slot time on `date`. Slots with no bookings may
  /// be absent.
  fn slot_counts(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<(String, u32)>, Self::Error>> + Send + '_;

  /// Insert a `Pending` booking unless its slot already holds `capacity`
  /// bookings. Counting and inserting are one atomic step.
  fn reserve(
    &self,
    input: NewBooking,
    capacity: u32,
  ) -> impl Future<Output = Result<Reservation, Self::Error>> + Send + '_;

  /// Record where the booking's QR image was written.
  fn attach_qr_file(
    &self,
    id: BookingId,
    qr_file: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a reservation whose QR code was never issued, freeing its place
  /// in the slot. Only a `Pending` booking without a `qr_file` is removed;
  /// returns whether a row was deleted.
  fn cancel_reservation(
    &self,
    id: BookingId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Retrieve a booking by id. Returns `None` if not found.
  fn get_booking(
    &self,
    id: BookingId,
  ) -> impl Future<Output = Result<Option<Booking>, Self::Error>> + Send + '_;

  /// Move a booking from `Pending` to `Present`, stamping `at` as its
  /// check-in time.
  ///
  /// The transition is guarded by the expected prior status, so of any number
  /// of concurrent calls for the same id at most one is `Admitted`.
  fn check_in(
    &self,
    id: BookingId,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<CheckIn, Self::Error>> + Send + '_;

  // ── Pilgrims ──────────────────────────────────────────────────────────

  fn add_pilgrim(
    &self,
    input: NewPilgrim,
  ) -> impl Future<Output = Result<Pilgrim, Self::Error>> + Send + '_;

  /// All pilgrims, ordered by name.
  fn list_pilgrims(
    &self,
  ) -> impl Future<Output = Result<Vec<Pilgrim>, Self::Error>> + Send + '_;

  // ── Alerts: append-only ──────────────────────────────────────────────

  /// Persist an alert. `timestamp` and `status` are set by the store.
  fn record_alert(
    &self,
    input: NewAlert,
  ) -> impl Future<Output = Result<Alert, Self::Error>> + Send + '_;

  /// At most `limit` alerts, newest first.
  fn recent_alerts(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Alert>, Self::Error>> + Send + '_;

  // ── Crowd density: append-only ───────────────────────────────────────

  /// Persist a reading. `timestamp` is set by the store.
  fn record_density(
    &self,
    input: NewCrowdDensity,
  ) -> impl Future<Output = Result<CrowdDensity, Self::Error>> + Send + '_;

  /// At most `limit` readings, newest first.
  fn recent_density(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<CrowdDensity>, Self::Error>> + Send + '_;
}
