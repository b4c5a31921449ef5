//! `mandir`: command-line dashboard for the Mandir server.
//!
//! # Usage
//!
//! ```
//! mandir alerts --limit 5
//! mandir --url http://temple.local:5000 record-density --zone "Main Hall" --count 340
//! mandir checkin "http://temple.local:5000/checkin?code=12"
//! ```

mod client;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client::{ApiClient, ApiConfig};
use mandir_core::{
  alert::{DEFAULT_ALERT_LIMIT, NewAlert},
  booking::BookingId,
  density::NewCrowdDensity,
  pilgrim::NewPilgrim,
};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:5000";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "mandir", about = "Dashboard client for the Mandir server")]
struct Args {
  /// Path to a TOML config file (url).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the mandir server (default: http://localhost:5000).
  #[arg(long, env = "MANDIR_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Show the most recent alerts, coloured by severity.
  Alerts {
    #[arg(short, long, default_value_t = DEFAULT_ALERT_LIMIT)]
    limit: usize,
  },
  /// Broadcast an alert.
  SendAlert {
    #[arg(long)]
    zone:       String,
    /// RED, ORANGE, YELLOW, or anything else for informational.
    #[arg(long)]
    severity:   String,
    #[arg(long = "type", value_name = "TYPE")]
    alert_type: String,
    #[arg(long)]
    message:    String,
    /// Repeat for each recipient group.
    #[arg(long = "recipient", value_name = "NAME")]
    recipients: Vec<String>,
  },
  /// Show the latest crowd-density readings.
  Density,
  /// Record a crowd-density reading for a zone.
  RecordDensity {
    #[arg(long)]
    zone:  String,
    #[arg(long)]
    count: u32,
  },
  /// List registered pilgrims.
  Pilgrims,
  /// Register a pilgrim.
  RegisterPilgrim {
    #[arg(long)]
    name:       String,
    #[arg(long)]
    phone:      String,
    #[arg(long)]
    email:      String,
    #[arg(long)]
    zone:       String,
    #[arg(long)]
    registered: bool,
    /// The pilgrim needs accessibility assistance.
    #[arg(long)]
    disability: bool,
  },
  /// Record a gate QR scan for a pilgrim's email.
  SimulateCheckin {
    #[arg(long)]
    email: String,
  },
  /// Show a darshan booking's status.
  Status { id: BookingId },
  /// Check in a booking by the text of its QR code.
  Checkin { code: String },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .init();

  if let Err(e) = run(Args::parse()).await {
    eprintln!("error: {e:#}");
    std::process::exit(1);
  }
}

async fn run(args: Args) -> Result<()> {
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flag / env override config file, which overrides the default.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  tracing::debug!(%base_url, "using server");

  let client = ApiClient::new(ApiConfig { base_url })?;

  match args.command {
    Command::Alerts { limit } => {
      let alerts = client.alerts(limit).await?;
      let mut shown = 0;
      for alert in render::visible_alerts(&alerts) {
        println!("{}", render::styled_alert(alert));
        shown += 1;
      }
      if shown == 0 {
        println!("No alerts.");
      }
    }
    Command::SendAlert { zone, severity, alert_type, message, recipients } => {
      let alert = client
        .send_alert(&NewAlert { zone, severity, alert_type, message, recipients })
        .await?;
      println!("Alert {} {}.", alert.alert_id, alert.status);
    }
    Command::Density => {
      let readings = client.density().await?;
      if readings.is_empty() {
        println!("No readings.");
      }
      for reading in &readings {
        println!("{}", render::density_line(reading));
      }
    }
    Command::RecordDensity { zone, count } => {
      let reading = client
        .record_density(&NewCrowdDensity { zone, estimated_count: count })
        .await?;
      println!("Recorded {} in {}.", reading.estimated_count, reading.zone);
    }
    Command::Pilgrims => {
      let pilgrims = client.pilgrims().await?;
      if pilgrims.is_empty() {
        println!("No pilgrims.");
      }
      for p in &pilgrims {
        println!("{}", render::pilgrim_line(p));
      }
    }
    Command::RegisterPilgrim { name, phone, email, zone, registered, disability } => {
      let pilgrim = client
        .register_pilgrim(&NewPilgrim {
          name,
          phone,
          email,
          registered,
          zone,
          disability_status: disability,
        })
        .await?;
      println!("Registered {} as pilgrim {}.", pilgrim.name, pilgrim.pilgrim_id);
    }
    Command::SimulateCheckin { email } => {
      let pilgrim = client.register_pilgrim(&NewPilgrim::qr_scan(email)).await?;
      println!(
        "QR check-in recorded for {} (pilgrim {}).",
        pilgrim.email, pilgrim.pilgrim_id
      );
    }
    Command::Status { id } => {
      println!("Booking {id}: {}", client.booking_status(id).await?);
    }
    Command::Checkin { code } => {
      println!("{}", client.check_in(&code).await?);
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn args_are_well_formed() { Args::command().debug_assert(); }

  #[test]
  fn send_alert_collects_recipients() {
    let args = Args::try_parse_from([
      "mandir", "send-alert", "--zone", "East Gate", "--severity", "RED", "--type", "crowd",
      "--message", "Close the gate", "--recipient", "security", "--recipient", "medical",
    ])
    .unwrap();
    let Command::SendAlert { alert_type, recipients, .. } = args.command else {
      panic!("wrong subcommand");
    };
    assert_eq!(alert_type, "crowd");
    assert_eq!(recipients, ["security", "medical"]);
  }

  #[test]
  fn alerts_limit_defaults() {
    let args = Args::try_parse_from(["mandir", "alerts"]).unwrap();
    assert!(matches!(args.command, Command::Alerts { limit } if limit == DEFAULT_ALERT_LIMIT));
  }
}
