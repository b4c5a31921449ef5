//! Handlers for `/alerts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/alerts` | Optional `?limit=N` (default 10); newest first |
//! | `POST` | `/alerts` | Body: [`NewAlert`]; returns 201 + stored alert |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use mandir_core::{
  alert::{Alert, DEFAULT_ALERT_LIMIT, NewAlert},
  store::TempleStore,
};
use serde::Deserialize;

use crate::{error::ApiError, require};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub limit: Option<usize>,
}

/// `GET /alerts[?limit=N]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Alert>>, ApiError>
where
  S: TempleStore,
{
  let alerts = store
    .recent_alerts(params.limit.unwrap_or(DEFAULT_ALERT_LIMIT))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(alerts))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /alerts`: severity is stored verbatim, recognised or not.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewAlert>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TempleStore,
{
  require("zone", &body.zone)?;
  require("message", &body.message)?;

  let alert = store.record_alert(body).await.map_err(ApiError::store)?;
  tracing::info!(
    alert_id = alert.alert_id,
    zone = %alert.zone,
    severity = %alert.severity,
    "alert recorded"
  );
  Ok((StatusCode::CREATED, Json(alert)))
}
