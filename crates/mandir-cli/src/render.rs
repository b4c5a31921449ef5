//! Plain-terminal presentation of dashboard data.

use crossterm::style::{Color, StyledContent, Stylize};
use mandir_core::{
  alert::{Alert, AlertLevel},
  density::CrowdDensity,
  pilgrim::Pilgrim,
};

/// Zone value left behind by API explorers' example payloads.
const PLACEHOLDER_ZONE: &str = "string";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Alerts worth showing, in the order received.
pub fn visible_alerts(alerts: &[Alert]) -> impl Iterator<Item = &Alert> {
  alerts.iter().filter(|a| a.zone != PLACEHOLDER_ZONE)
}

pub fn level_color(level: AlertLevel) -> Color {
  match level {
    AlertLevel::Critical => Color::Red,
    AlertLevel::Warning => Color::DarkYellow,
    AlertLevel::Notice => Color::Yellow,
    AlertLevel::Info => Color::Blue,
  }
}

/// One uncoloured line per alert.
pub fn alert_line(alert: &Alert) -> String {
  let mut line = format!(
    "{}  {:<7} {}: {} [{}]",
    alert.timestamp.format(TIME_FORMAT),
    alert.severity.trim().to_uppercase(),
    alert.zone,
    alert.message,
    alert.alert_type,
  );
  if !alert.recipients.is_empty() {
    line.push_str(&format!(" → {}", alert.recipients.join(", ")));
  }
  line
}

/// [`alert_line`] coloured by severity; critical alerts are also bold.
pub fn styled_alert(alert: &Alert) -> StyledContent<String> {
  let level = alert.level();
  let styled = alert_line(alert).with(level_color(level));
  if level == AlertLevel::Critical { styled.bold() } else { styled }
}

pub fn density_line(reading: &CrowdDensity) -> String {
  format!(
    "{}  {:<20} {:>6}",
    reading.timestamp.format(TIME_FORMAT),
    reading.zone,
    reading.estimated_count,
  )
}

pub fn pilgrim_line(p: &Pilgrim) -> String {
  let mut flags = Vec::new();
  if p.registered {
    flags.push("registered");
  }
  if p.disability_status {
    flags.push("assistance");
  }
  format!(
    "{:>5}  {:<20} {:<10} {:<12} {}{}",
    p.pilgrim_id,
    p.name,
    p.zone,
    p.phone,
    p.email,
    if flags.is_empty() { String::new() } else { format!("  ({})", flags.join(", ")) },
  )
}
