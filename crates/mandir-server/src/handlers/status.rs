//! `GET /status_check/{id}`: read-only status poll.

use axum::{
  Json,
  extract::{Path, State},
};
use mandir_core::{booking::BookingId, store::TempleStore};
use serde::Serialize;

use crate::{AppState, error::Error};

/// Returned in place of a status for unknown ids.
pub const NOT_FOUND: &str = "Not Found";

#[derive(Debug, Serialize)]
pub struct StatusBody {
  pub status: String,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<BookingId>,
) -> Result<Json<StatusBody>, Error>
where
  S: TempleStore + Clone + 'static,
{
  let status = state
    .store
    .get_booking(id)
    .await
    .map_err(Error::store)?
    .map(|b| b.status.to_string())
    .unwrap_or_else(|| NOT_FOUND.to_owned());
  Ok(Json(StatusBody { status }))
}
