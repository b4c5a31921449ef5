//! Gate check-in, from a scanned code or from an uploaded QR image.

use axum::extract::{Query, State};
use bytes::Bytes;
use chrono::Utc;
use mandir_core::{
  booking::{CheckIn, parse_checkin_code},
  store::TempleStore,
};
use serde::Deserialize;

use crate::{AppState, error::Error, qr};

/// Reply for unknown codes and bookings that are already `Present`.
pub const REJECTED: &str = "Invalid or already used QR!";

#[derive(Debug, Deserialize)]
pub struct CheckinParams {
  pub code: Option<String>,
}

/// `GET /checkin?code=<payload>`
pub async fn by_code<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<CheckinParams>,
) -> Result<String, Error>
where
  S: TempleStore + Clone + 'static,
{
  admit(&state, params.code.as_deref().unwrap_or_default()).await
}

/// `POST /checkin/scan`: body is a PNG or JPEG photo of the QR code.
pub async fn scan<S>(
  State(state): State<AppState<S>>,
  body: Bytes,
) -> Result<String, Error>
where
  S: TempleStore + Clone + 'static,
{
  let decoded = tokio::task::spawn_blocking(move || qr::decode(&body))
    .await
    .map_err(|e| Error::Qr(e.to_string()))?;

  let payload = match decoded {
    Ok(Some(payload)) => payload,
    Ok(None) => return Err(Error::Undecodable),
    Err(e) => {
      tracing::warn!(error = %e, "unreadable check-in upload");
      return Err(Error::Undecodable);
    }
  };

  admit(&state, &payload).await
}

async fn admit<S>(state: &AppState<S>, raw: &str) -> Result<String, Error>
where
  S: TempleStore + Clone + 'static,
{
  let Some(id) = parse_checkin_code(raw) else {
    tracing::warn!(code = raw, "check-in with unparsable code");
    return Ok(REJECTED.to_owned());
  };

  match state.store.check_in(id, Utc::now()).await.map_err(Error::store)? {
    CheckIn::Admitted { booking_id, qr_file, .. } => {
      if let Some(qr_file) = qr_file {
        state.qr.discard(&qr_file).await;
      }
      tracing::info!(booking_id, "checked in");
      Ok(format!("Booking {booking_id} marked Present!"))
    }
    CheckIn::Rejected => {
      tracing::warn!(booking_id = id, "check-in rejected");
      Ok(REJECTED.to_owned())
    }
  }
}
