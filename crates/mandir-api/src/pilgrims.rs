//! Handlers for `/pilgrims` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/pilgrims` | All pilgrims, ordered by name |
//! | `POST` | `/pilgrims` | Body: [`NewPilgrim`]; returns 201 + stored pilgrim |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use mandir_core::{
  pilgrim::{NewPilgrim, Pilgrim},
  store::TempleStore,
};

use crate::{error::ApiError, require};

/// `GET /pilgrims`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Pilgrim>>, ApiError>
where
  S: TempleStore,
{
  let pilgrims = store.list_pilgrims().await.map_err(ApiError::store)?;
  Ok(Json(pilgrims))
}

/// `POST /pilgrims`: `registered` and `disability_status` default to false.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewPilgrim>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TempleStore,
{
  require("name", &body.name)?;

  let pilgrim = store.add_pilgrim(body).await.map_err(ApiError::store)?;
  tracing::info!(pilgrim_id = pilgrim.pilgrim_id, zone = %pilgrim.zone, "pilgrim registered");
  Ok((StatusCode::CREATED, Json(pilgrim)))
}
