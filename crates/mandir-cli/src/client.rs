//! Async HTTP client wrapping the mandir server.

use anyhow::{Context, Result, anyhow};
use mandir_core::{
  alert::{Alert, NewAlert},
  booking::BookingId,
  density::{CrowdDensity, NewCrowdDensity},
  pilgrim::{NewPilgrim, Pilgrim},
};
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

/// Connection settings for the mandir server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the mandir JSON API and check-in endpoints.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

#[derive(Deserialize)]
struct StatusBody {
  status: String,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Alerts ────────────────────────────────────────────────────────────────

  /// `GET /alerts?limit=<n>`
  pub async fn alerts(&self, limit: usize) -> Result<Vec<Alert>> {
    let resp = self
      .client
      .get(self.url("/alerts"))
      .query(&[("limit", limit)])
      .send()
      .await
      .context("GET /alerts failed")?;
    ensure_success("GET /alerts", resp)
      .await?
      .json()
      .await
      .context("deserialising alerts")
  }

  /// `POST /alerts`
  pub async fn send_alert(&self, alert: &NewAlert) -> Result<Alert> {
    let resp = self
      .client
      .post(self.url("/alerts"))
      .json(alert)
      .send()
      .await
      .context("POST /alerts failed")?;
    ensure_success("POST /alerts", resp)
      .await?
      .json()
      .await
      .context("deserialising alert")
  }

  // ── Crowd density ─────────────────────────────────────────────────────────

  /// `GET /crowd_density`
  pub async fn density(&self) -> Result<Vec<CrowdDensity>> {
    let resp = self
      .client
      .get(self.url("/crowd_density"))
      .send()
      .await
      .context("GET /crowd_density failed")?;
    ensure_success("GET /crowd_density", resp)
      .await?
      .json()
      .await
      .context("deserialising crowd density")
  }

  /// `POST /crowd_density`
  pub async fn record_density(&self, reading: &NewCrowdDensity) -> Result<CrowdDensity> {
    let resp = self
      .client
      .post(self.url("/crowd_density"))
      .json(reading)
      .send()
      .await
      .context("POST /crowd_density failed")?;
    ensure_success("POST /crowd_density", resp)
      .await?
      .json()
      .await
      .context("deserialising crowd density reading")
  }

  // ── Pilgrims ──────────────────────────────────────────────────────────────

  /// `GET /pilgrims`
  pub async fn pilgrims(&self) -> Result<Vec<Pilgrim>> {
    let resp = self
      .client
      .get(self.url("/pilgrims"))
      .send()
      .await
      .context("GET /pilgrims failed")?;
    ensure_success("GET /pilgrims", resp)
      .await?
      .json()
      .await
      .context("deserialising pilgrims")
  }

  /// `POST /pilgrims`
  pub async fn register_pilgrim(&self, pilgrim: &NewPilgrim) -> Result<Pilgrim> {
    let resp = self
      .client
      .post(self.url("/pilgrims"))
      .json(pilgrim)
      .send()
      .await
      .context("POST /pilgrims failed")?;
    ensure_success("POST /pilgrims", resp)
      .await?
      .json()
      .await
      .context("deserialising pilgrim")
  }

  // ── Bookings ──────────────────────────────────────────────────────────────

  /// `GET /status_check/<id>`
  pub async fn booking_status(&self, id: BookingId) -> Result<String> {
    let path = format!("/status_check/{id}");
    let resp = self
      .client
      .get(self.url(&path))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    let body: StatusBody = ensure_success("GET /status_check", resp)
      .await?
      .json()
      .await
      .context("deserialising booking status")?;
    Ok(body.status)
  }

  /// `GET /checkin?code=<code>`: returns the gate's reply verbatim.
  pub async fn check_in(&self, code: &str) -> Result<String> {
    let resp = self
      .client
      .get(self.url("/checkin"))
      .query(&[("code", code)])
      .send()
      .await
      .context("GET /checkin failed")?;
    ensure_success("GET /checkin", resp)
      .await?
      .text()
      .await
      .context("reading check-in reply")
  }
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn ensure_success(what: &str, resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  Err(anyhow!("{what} → {status}: {}", server_message(&body)))
}

/// The `error` field of a JSON error body, or the raw body.
fn server_message(body: &str) -> String {
  serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
    .unwrap_or_else(|| body.trim().to_owned())
}
