//! Severity-tagged alerts broadcast to staff.
//!
//! Severity is stored exactly as submitted. Only the presentation layer
//! interprets it, through [`AlertLevel`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size for `GET /alerts`.
pub const DEFAULT_ALERT_LIMIT: usize = 10;

/// Status recorded on every alert at ingestion.
pub const ALERT_STATUS_SENT: &str = "sent";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
  pub alert_id:   i64,
  pub zone:       String,
  pub severity:   String,
  #[serde(rename = "type")]
  pub alert_type: String,
  pub message:    String,
  pub recipients: Vec<String>,
  /// Server-assigned.
  pub timestamp:  DateTime<Utc>,
  pub status:     String,
}

impl Alert {
  pub fn level(&self) -> AlertLevel { AlertLevel::from_severity(&self.severity) }
}

/// Input to [`crate::store::TempleStore::record_alert`]; also the JSON body
/// of `POST /alerts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAlert {
  pub zone:       String,
  pub severity:   String,
  #[serde(rename = "type")]
  pub alert_type: String,
  pub message:    String,
  #[serde(default)]
  pub recipients: Vec<String>,
}

/// How prominently an alert is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
  /// `RED`
  Critical,
  /// `ORANGE`
  Warning,
  /// `YELLOW`
  Notice,
  /// Anything else.
  Info,
}

impl AlertLevel {
  /// Map a free-form severity onto a display level. Matching ignores case
  /// and surrounding whitespace; unrecognised values fall back to `Info`.
  pub fn from_severity(severity: &str) -> Self {
    match severity.trim().to_ascii_uppercase().as_str() {
      "RED" => Self::Critical,
      "ORANGE" => Self::Warning,
      "YELLOW" => Self::Notice,
      _ => Self::Info,
    }
  }
}
