//! Crowd-density readings posted by staff for each zone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many readings `GET /crowd_density` returns.
pub const RECENT_DENSITY_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdDensity {
  pub id:              i64,
  pub zone:            String,
  pub estimated_count: u32,
  /// Server-assigned.
  pub timestamp:       DateTime<Utc>,
}

/// Input to [`crate::store::TempleStore::record_density`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCrowdDensity {
  pub zone:            String,
  pub estimated_count: u32,
}
