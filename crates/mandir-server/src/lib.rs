//! Visitor-facing web app for Mandir: darshan registration, QR issue, and
//! gate check-in.
//!
//! [`router`] serves the HTML booking flow and the check-in endpoints, and
//! merges in the JSON API from [`mandir_api`] so a single process answers
//! both.

pub mod error;
pub mod handlers;
pub mod pages;
pub mod qr;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use chrono::{Local, NaiveDate};
use mandir_core::{
  booking::{BookingId, SlotSchedule},
  store::TempleStore,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use handlers::{checkin, register, status};
use qr::QrArchive;

/// Largest accepted QR photo upload.
const SCAN_BODY_LIMIT: usize = 8 * 1024 * 1024;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `MANDIR_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  pub store_path:      PathBuf,
  pub static_dir:      PathBuf,
  /// Prefix for the URL encoded in each QR code.
  pub public_base_url: String,
  pub slot_times:      Vec<String>,
  pub slot_capacity:   u32,
}

impl ServerConfig {
  /// Layer defaults, the optional file at `path`, then the environment.
  pub fn load(path: impl Into<PathBuf>) -> Result<Self, config::ConfigError> {
    let defaults = SlotSchedule::default();

    config::Config::builder()
      .set_default("host", "0.0.0.0")?
      .set_default("port", 5000_i64)?
      .set_default("store_path", "mandir.db")?
      .set_default("static_dir", "static")?
      .set_default("public_base_url", "http://localhost:5000")?
      .set_default("slot_times", defaults.times)?
      .set_default("slot_capacity", i64::from(defaults.capacity))?
      .add_source(config::File::from(path.into()).required(false))
      .add_source(
        config::Environment::with_prefix("MANDIR")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("slot_times"),
      )
      .build()?
      .try_deserialize()
  }

  pub fn schedule(&self) -> SlotSchedule {
    SlotSchedule {
      times:    self.slot_times.clone(),
      capacity: self.slot_capacity,
    }
  }

  /// The payload encoded in a booking's QR code.
  pub fn checkin_url(&self, id: BookingId) -> String {
    format!("{}/checkin?code={id}", self.public_base_url.trim_end_matches('/'))
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the booking and check-in handlers.
#[derive(Clone)]
pub struct AppState<S: TempleStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub qr:     Arc<QrArchive>,
}

impl<S: TempleStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let qr = QrArchive::new(&config.static_dir);
    Self {
      store:  Arc::new(store),
      config: Arc::new(config),
      qr:     Arc::new(qr),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TempleStore + Clone + 'static,
{
  let static_dir = state.config.static_dir.clone();
  let store = state.store.clone();

  Router::new()
    .route("/",                  get(register::form))
    .route("/choose_slot",       post(register::choose_slot::<S>))
    .route("/register",          post(register::register::<S>))
    .route("/checkin",           get(checkin::by_code::<S>))
    .route(
      "/checkin/scan",
      post(checkin::scan::<S>).layer(DefaultBodyLimit::max(SCAN_BODY_LIMIT)),
    )
    .route("/status_check/{id}", get(status::handler::<S>))
    .nest_service("/static", ServeDir::new(static_dir))
    .with_state(state)
    .merge(mandir_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}

/// The server's local calendar date; slots are booked in temple time.
pub fn today() -> NaiveDate { Local::now().date_naive() }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use chrono::Duration;
  use mandir_store_sqlite::SqliteStore;
  use tempfile::TempDir;
  use tower::ServiceExt as _;

  struct TestApp {
    router: Router,
    dir:    TempDir,
  }

  fn config(static_dir: PathBuf, capacity: u32) -> ServerConfig {
    ServerConfig {
      host:            "127.0.0.1".into(),
      port:            0,
      store_path:      ":memory:".into(),
      static_dir,
      public_base_url: "http://temple.test".into(),
      slot_times:      vec!["8-9 AM".into(), "9-10 AM".into()],
      slot_capacity:   capacity,
    }
  }

  async fn app_with_capacity(capacity: u32) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(store, config(dir.path().to_path_buf(), capacity));
    TestApp { router: router(state), dir }
  }

  async fn app() -> TestApp { app_with_capacity(10).await }

  fn tomorrow() -> String { (today() + Duration::days(1)).format("%Y-%m-%d").to_string() }

  async fn get(app: &TestApp, uri: &str) -> Response {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.router.clone().oneshot(req).await.unwrap()
  }

  async fn post_form(app: &TestApp, uri: &str, body: &str) -> Response {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
      .body(Body::from(body.to_owned()))
      .unwrap();
    app.router.clone().oneshot(req).await.unwrap()
  }

  async fn post_bytes(app: &TestApp, uri: &str, body: Vec<u8>) -> Response {
    let req = Request::builder()
      .method("POST")
      .uri(uri)
      .header(header::CONTENT_TYPE, "image/png")
      .body(Body::from(body))
      .unwrap();
    app.router.clone().oneshot(req).await.unwrap()
  }

  async fn text(resp: Response) -> String {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  async fn register(app: &TestApp, name: &str, date: &str, slot: &str) -> Response {
    let body = format!(
      "name={name}&family=2&slot_date={date}&slot_time={}",
      slot.replace(' ', "+")
    );
    post_form(app, "/register", &body).await
  }

  async fn status_of(app: &TestApp, id: i64) -> String {
    let body = text(get(app, &format!("/status_check/{id}")).await).await;
    let v: serde_json::Value = serde_json::from_str(&body).unwrap();
    v["status"].as_str().unwrap().to_owned()
  }

  // ── Configuration ───────────────────────────────────────────────────────────

  #[test]
  fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
      &path,
      "port = 8080\nslot_capacity = 3\nslot_times = [\"6-7 AM\"]\n",
    )
    .unwrap();

    let cfg = ServerConfig::load(&path).unwrap();
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "0.0.0.0");
    assert_eq!(cfg.static_dir, PathBuf::from("static"));
    assert_eq!(cfg.schedule().times, ["6-7 AM"]);
    assert_eq!(cfg.schedule().capacity, 3);
  }

  #[test]
  fn missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = ServerConfig::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.public_base_url, "http://localhost:5000");
    assert_eq!(cfg.slot_times, ["8-9 AM", "9-10 AM"]);
    assert_eq!(cfg.slot_capacity, 10);
  }

  #[test]
  fn checkin_url_strips_trailing_slash() {
    let mut cfg = config(PathBuf::from("static"), 10);
    cfg.public_base_url = "https://mandir.example/".into();
    assert_eq!(cfg.checkin_url(7), "https://mandir.example/checkin?code=7");
  }

  // ── Registration ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn form_offers_dates_from_today() {
    let app = app().await;
    let resp = get(&app, "/").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = text(resp).await;
    assert!(page.contains(&format!("min=\"{}\"", today().format("%Y-%m-%d"))));
    assert!(page.contains("action=\"/choose_slot\""));
  }

  #[tokio::test]
  async fn choose_slot_lists_remaining_capacity() {
    let app = app_with_capacity(2).await;
    let date = tomorrow();
    register(&app, "Asha", &date, "8-9 AM").await;
    register(&app, "Ravi", &date, "8-9 AM").await;
    register(&app, "Meera", &date, "9-10 AM").await;

    let resp = post_form(&app, "/choose_slot", &format!("name=Gopal&slot_date={date}")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = text(resp).await;
    assert!(page.contains("8-9 AM (Full)"));
    assert!(page.contains("9-10 AM (1 left)"));
    assert!(page.contains("name=\"name\" value=\"Gopal\""));
  }

  #[tokio::test]
  async fn past_dates_are_rejected_with_an_alert() {
    let app = app().await;
    let yesterday = (today() - Duration::days(1)).format("%Y-%m-%d").to_string();

    let resp = post_form(&app, "/choose_slot", &format!("name=Asha&slot_date={yesterday}")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(text(resp).await.contains("alert("));

    let resp = register(&app, "Asha", &yesterday, "8-9 AM").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(status_of(&app, 1).await, "Not Found");
  }

  #[tokio::test]
  async fn today_is_bookable() {
    let app = app().await;
    let date = today().format("%Y-%m-%d").to_string();
    let resp = register(&app, "Asha", &date, "9-10 AM").await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn malformed_input_is_rejected() {
    let app = app().await;

    let resp = register(&app, "Asha", "not-a-date", "8-9 AM").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = register(&app, "Asha", &tomorrow(), "3-4 PM").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = register(&app, "", &tomorrow(), "8-9 AM").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn full_slot_refuses_registration() {
    let app = app_with_capacity(1).await;
    let date = tomorrow();

    assert_eq!(register(&app, "Asha", &date, "8-9 AM").await.status(), StatusCode::OK);

    let resp = register(&app, "Ravi", &date, "8-9 AM").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(text(resp).await.contains("is full"));
    assert_eq!(status_of(&app, 2).await, "Not Found");
  }

  #[tokio::test]
  async fn failed_qr_issue_releases_the_slot() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the static directory should be.
    let not_a_dir = dir.path().join("static");
    std::fs::write(&not_a_dir, b"").unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    let app = TestApp {
      router: router(AppState::new(store, config(not_a_dir, 1))),
      dir,
    };
    let date = tomorrow();

    let resp = register(&app, "Asha", &date, "8-9 AM").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(status_of(&app, 1).await, status::NOT_FOUND);

    let resp = post_form(&app, "/choose_slot", &format!("name=Ravi&slot_date={date}")).await;
    assert!(text(resp).await.contains("8-9 AM (1 left)"));

    // The place is still free, so the next attempt fails the same way
    // rather than being refused as full.
    let resp = register(&app, "Ravi", &date, "8-9 AM").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  // ── Check-in ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn register_then_check_in_once() {
    let app = app().await;

    let resp = register(&app, "Asha", &tomorrow(), "8-9 AM").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = text(resp).await;
    assert!(page.contains("Booking ID: <strong>1</strong>"));
    assert!(page.contains("/static/qrcodes/booking_1_Asha.png"));

    let qr_path = app.dir.path().join("qrcodes/booking_1_Asha.png");
    assert!(qr_path.exists());
    let png = std::fs::read(&qr_path).unwrap();
    assert_eq!(
      qr::decode(&png).unwrap().as_deref(),
      Some("http://temple.test/checkin?code=1")
    );
    assert_eq!(status_of(&app, 1).await, "Pending");

    let resp = get(&app, "/checkin?code=1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, "Booking 1 marked Present!");
    assert!(!qr_path.exists());
    assert_eq!(status_of(&app, 1).await, "Present");

    let resp = get(&app, "/checkin?code=1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, checkin::REJECTED);
    assert_eq!(status_of(&app, 1).await, "Present");
  }

  #[tokio::test]
  async fn check_in_accepts_url_and_pipe_payloads() {
    let app = app().await;
    let date = tomorrow();
    register(&app, "Asha", &date, "8-9 AM").await;
    register(&app, "Ravi", &date, "8-9 AM").await;

    let resp = get(&app, "/checkin?code=http%3A%2F%2Ftemple.test%2Fcheckin%3Fcode%3D1").await;
    assert_eq!(text(resp).await, "Booking 1 marked Present!");

    let resp = get(&app, &format!("/checkin?code=2%7CRavi%7C{date}%7C8-9%20AM")).await;
    assert_eq!(text(resp).await, "Booking 2 marked Present!");
  }

  #[tokio::test]
  async fn unknown_or_missing_codes_are_rejected() {
    let app = app().await;
    for uri in ["/checkin", "/checkin?code=", "/checkin?code=abc", "/checkin?code=99"] {
      let resp = get(&app, uri).await;
      assert_eq!(resp.status(), StatusCode::OK, "{uri}");
      assert_eq!(text(resp).await, checkin::REJECTED, "{uri}");
    }
  }

  #[tokio::test]
  async fn scanned_image_checks_in() {
    let app = app().await;
    register(&app, "Asha", &tomorrow(), "9-10 AM").await;

    let png = qr::render_png("http://temple.test/checkin?code=1").unwrap();
    let resp = post_bytes(&app, "/checkin/scan", png.clone()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, "Booking 1 marked Present!");

    let resp = post_bytes(&app, "/checkin/scan", png).await;
    assert_eq!(text(resp).await, checkin::REJECTED);
  }

  #[tokio::test]
  async fn scan_without_a_code_is_a_bad_request() {
    let app = app().await;

    let resp = post_bytes(&app, "/checkin/scan", b"definitely not a png".to_vec()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(text(resp).await, "Could not decode QR code.");

    let blank = image::GrayImage::from_pixel(50, 50, image::Luma([255]));
    let mut png = std::io::Cursor::new(Vec::new());
    blank.write_to(&mut png, image::ImageFormat::Png).unwrap();
    let resp = post_bytes(&app, "/checkin/scan", png.into_inner()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(text(resp).await, "Could not decode QR code.");
  }

  // ── Status, static files, API ───────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_booking_status_is_not_found() {
    let app = app().await;
    let resp = get(&app, "/status_check/42").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(status_of(&app, 42).await, status::NOT_FOUND);
  }

  #[tokio::test]
  async fn issued_qr_image_is_served() {
    let app = app().await;
    register(&app, "Asha", &tomorrow(), "8-9 AM").await;

    let resp = get(&app, "/static/qrcodes/booking_1_Asha.png").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
  }

  #[tokio::test]
  async fn json_api_is_mounted() {
    let app = app().await;
    let resp = get(&app, "/health").await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get(&app, "/alerts").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(text(resp).await, "[]");
  }
}
