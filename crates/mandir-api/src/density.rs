//! Handlers for `/crowd_density` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/crowd_density` | Last 20 readings, newest first |
//! | `POST` | `/crowd_density` | Body: `{"zone":"...","estimated_count":N}` |
//!
//! A negative `estimated_count` never reaches the handler: it does not fit
//! the `u32` field and the JSON extractor rejects the body.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use mandir_core::{
  density::{CrowdDensity, NewCrowdDensity, RECENT_DENSITY_LIMIT},
  store::TempleStore,
};

use crate::{error::ApiError, require};

/// `GET /crowd_density`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<CrowdDensity>>, ApiError>
where
  S: TempleStore,
{
  let readings = store
    .recent_density(RECENT_DENSITY_LIMIT)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(readings))
}

/// `POST /crowd_density`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewCrowdDensity>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TempleStore,
{
  require("zone", &body.zone)?;

  let reading = store.record_density(body).await.map_err(ApiError::store)?;
  tracing::debug!(zone = %reading.zone, count = reading.estimated_count, "density recorded");
  Ok((StatusCode::CREATED, Json(reading)))
}
