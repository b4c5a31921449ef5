//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, NaiveDate, Utc};
use mandir_core::{
  alert::NewAlert,
  booking::{BookingStatus, CheckIn, NewBooking, Reservation},
  density::NewCrowdDensity,
  pilgrim::NewPilgrim,
  store::TempleStore,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn tomorrow() -> NaiveDate { (Utc::now() + Duration::days(1)).date_naive() }

fn booking(name: &str, slot_time: &str) -> NewBooking {
  NewBooking {
    name:           name.into(),
    family_members: "2".into(),
    slot_date:      tomorrow(),
    slot_time:      slot_time.into(),
  }
}

async fn book(s: &SqliteStore, name: &str) -> i64 {
  match s.reserve(booking(name, "8-9 AM"), 10).await.unwrap() {
    Reservation::Booked(b) => b.booking_id,
    other => panic!("expected a booking, got {other:?}"),
  }
}

// ─── Reservations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn reserve_creates_pending_booking() {
  let s = store().await;

  let Reservation::Booked(b) = s.reserve(booking("Asha", "8-9 AM"), 10).await.unwrap()
  else {
    panic!("slot should be open");
  };
  assert_eq!(b.status, BookingStatus::Pending);
  assert!(b.checkin_time.is_none());

  let fetched = s.get_booking(b.booking_id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Asha");
  assert_eq!(fetched.family_members, "2");
  assert_eq!(fetched.slot_date, tomorrow());
  assert_eq!(fetched.slot_time, "8-9 AM");
  assert_eq!(fetched.status, BookingStatus::Pending);
  assert!(fetched.qr_file.is_none());
}

#[tokio::test]
async fn get_booking_missing_returns_none() {
  let s = store().await;
  assert!(s.get_booking(999).await.unwrap().is_none());
}

#[tokio::test]
async fn reserve_stops_at_capacity() {
  let s = store().await;

  for i in 0..3 {
    let r = s.reserve(booking(&format!("p{i}"), "8-9 AM"), 3).await.unwrap();
    assert!(matches!(r, Reservation::Booked(_)), "booking {i} should fit");
  }

  let r = s.reserve(booking("late", "8-9 AM"), 3).await.unwrap();
  assert!(matches!(
    r,
    Reservation::SlotFull { ref slot_time, .. } if slot_time == "8-9 AM"
  ));

  // The other slot on the same day is unaffected.
  let r = s.reserve(booking("late", "9-10 AM"), 3).await.unwrap();
  assert!(matches!(r, Reservation::Booked(_)));
}

#[tokio::test]
async fn concurrent_reservations_never_overbook() {
  let s = store().await;

  let handles: Vec<_> = (0..25)
    .map(|i| {
      let s = s.clone();
      tokio::spawn(async move { s.reserve(booking(&format!("p{i}"), "9-10 AM"), 10).await })
    })
    .collect();

  let mut booked = 0;
  for h in handles {
    if let Reservation::Booked(_) = h.await.unwrap().unwrap() {
      booked += 1;
    }
  }
  assert_eq!(booked, 10);

  let counts = s.slot_counts(tomorrow()).await.unwrap();
  assert_eq!(counts, vec![("9-10 AM".to_string(), 10)]);
}

#[tokio::test]
async fn slot_counts_groups_by_time_for_one_day() {
  let s = store().await;
  book(&s, "a").await;
  book(&s, "b").await;
  s.reserve(booking("c", "9-10 AM"), 10).await.unwrap();

  let mut other_day = booking("d", "8-9 AM");
  other_day.slot_date = tomorrow() + Duration::days(1);
  s.reserve(other_day, 10).await.unwrap();

  let mut counts = s.slot_counts(tomorrow()).await.unwrap();
  counts.sort();
  assert_eq!(
    counts,
    vec![("8-9 AM".to_string(), 2), ("9-10 AM".to_string(), 1)]
  );
}

#[tokio::test]
async fn cancel_reservation_frees_the_place() {
  let s = store().await;
  let Reservation::Booked(b) = s.reserve(booking("Asha", "8-9 AM"), 1).await.unwrap() else {
    panic!("slot should be open");
  };

  assert!(s.cancel_reservation(b.booking_id).await.unwrap());
  assert!(s.get_booking(b.booking_id).await.unwrap().is_none());
  assert!(!s.cancel_reservation(b.booking_id).await.unwrap());

  let r = s.reserve(booking("Ravi", "8-9 AM"), 1).await.unwrap();
  assert!(matches!(r, Reservation::Booked(_)));
}

#[tokio::test]
async fn cancel_reservation_keeps_issued_and_checked_in_bookings() {
  let s = store().await;

  let issued = book(&s, "Asha").await;
  s.attach_qr_file(issued, format!("qrcodes/booking_{issued}_Asha.png"))
    .await
    .unwrap();
  assert!(!s.cancel_reservation(issued).await.unwrap());

  let present = book(&s, "Ravi").await;
  s.check_in(present, Utc::now()).await.unwrap();
  assert!(!s.cancel_reservation(present).await.unwrap());

  assert!(s.get_booking(issued).await.unwrap().is_some());
  assert!(s.get_booking(present).await.unwrap().is_some());
}

// ─── Check-in ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn check_in_moves_pending_to_present_once() {
  let s = store().await;
  let id = book(&s, "Asha").await;
  s.attach_qr_file(id, format!("qrcodes/booking_{id}_Asha.png"))
    .await
    .unwrap();

  let now = Utc::now();
  let first = s.check_in(id, now).await.unwrap();
  assert_eq!(
    first,
    CheckIn::Admitted {
      booking_id:   id,
      checkin_time: now,
      qr_file:      Some(format!("qrcodes/booking_{id}_Asha.png")),
    }
  );

  let b = s.get_booking(id).await.unwrap().unwrap();
  assert_eq!(b.status, BookingStatus::Present);
  assert!(b.checkin_time.is_some());
  // The reference survives; only the file is discarded.
  assert!(b.qr_file.is_some());

  let second = s.check_in(id, Utc::now()).await.unwrap();
  assert_eq!(second, CheckIn::Rejected);

  let after = s.get_booking(id).await.unwrap().unwrap();
  assert_eq!(after.checkin_time, b.checkin_time);
}

#[tokio::test]
async fn check_in_unknown_booking_is_rejected() {
  let s = store().await;
  assert_eq!(s.check_in(404, Utc::now()).await.unwrap(), CheckIn::Rejected);
}

#[tokio::test]
async fn check_in_without_qr_file() {
  let s = store().await;
  let id = book(&s, "Ravi").await;
  let result = s.check_in(id, Utc::now()).await.unwrap();
  assert!(matches!(result, CheckIn::Admitted { qr_file: None, .. }));
}

#[tokio::test]
async fn concurrent_check_ins_admit_exactly_one() {
  let s = store().await;
  let id = book(&s, "Asha").await;

  let handles: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.check_in(id, Utc::now()).await })
    })
    .collect();

  let mut admitted = 0;
  for h in handles {
    if let CheckIn::Admitted { .. } = h.await.unwrap().unwrap() {
      admitted += 1;
    }
  }
  assert_eq!(admitted, 1);
}

// ─── Pilgrims ────────────────────────────────────────────────────────────────

fn pilgrim(name: &str) -> NewPilgrim {
  NewPilgrim {
    name:              name.into(),
    phone:             "9876543210".into(),
    email:             format!("{}@example.com", name.to_lowercase()),
    registered:        false,
    zone:              "North".into(),
    disability_status: true,
  }
}

#[tokio::test]
async fn add_pilgrim_assigns_id() {
  let s = store().await;
  let p = s.add_pilgrim(pilgrim("Meera")).await.unwrap();
  assert!(p.pilgrim_id > 0);
  assert_eq!(p.name, "Meera");
  assert!(p.disability_status);
  assert!(!p.registered);
}

#[tokio::test]
async fn list_pilgrims_is_ordered_by_name() {
  let s = store().await;
  s.add_pilgrim(pilgrim("Zara")).await.unwrap();
  s.add_pilgrim(pilgrim("Arjun")).await.unwrap();
  s.add_pilgrim(NewPilgrim::qr_scan("gate@example.com")).await.unwrap();

  let names: Vec<_> = s
    .list_pilgrims()
    .await
    .unwrap()
    .into_iter()
    .map(|p| p.name)
    .collect();
  assert_eq!(names, ["Arjun", "QR_Scan", "Zara"]);
}

// ─── Alerts ──────────────────────────────────────────────────────────────────

fn alert(zone: &str, severity: &str) -> NewAlert {
  NewAlert {
    zone:       zone.into(),
    severity:   severity.into(),
    alert_type: "crowd".into(),
    message:    format!("{zone} is filling up"),
    recipients: vec!["security".into(), "medical".into()],
  }
}

#[tokio::test]
async fn record_alert_stamps_status_and_keeps_recipients() {
  let s = store().await;
  let a = s.record_alert(alert("Z1", "PURPLE")).await.unwrap();
  assert_eq!(a.status, "sent");
  assert_eq!(a.severity, "PURPLE");

  let stored = s.recent_alerts(10).await.unwrap();
  assert_eq!(stored.len(), 1);
  assert_eq!(stored[0].alert_id, a.alert_id);
  assert_eq!(stored[0].recipients, ["security", "medical"]);
}

#[tokio::test]
async fn recent_alerts_limits_and_orders_newest_first() {
  let s = store().await;
  for zone in ["Z1", "Z2", "Z3", "Z4"] {
    s.record_alert(alert(zone, "RED")).await.unwrap();
  }

  let recent = s.recent_alerts(3).await.unwrap();
  assert_eq!(recent.len(), 3);
  let zones: Vec<_> = recent.iter().map(|a| a.zone.as_str()).collect();
  assert_eq!(zones, ["Z4", "Z3", "Z2"]);
  assert!(recent.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));

  assert!(s.recent_alerts(0).await.unwrap().is_empty());
}

// ─── Crowd density ───────────────────────────────────────────────────────────

#[tokio::test]
async fn recent_density_keeps_the_newest() {
  let s = store().await;
  for n in 0..25u32 {
    s.record_density(NewCrowdDensity {
      zone:            "Main Hall".into(),
      estimated_count: n * 10,
    })
    .await
    .unwrap();
  }

  let recent = s.recent_density(20).await.unwrap();
  assert_eq!(recent.len(), 20);
  assert_eq!(recent[0].estimated_count, 240);
  assert_eq!(recent[19].estimated_count, 50);
  assert!(recent.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
}
