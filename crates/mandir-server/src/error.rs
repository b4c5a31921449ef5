//! Error types and axum `IntoResponse` implementation.
//!
//! Form-flow failures render as a small HTML page that pops an `alert()` and
//! links back to the registration form; everything else is plain text.

use axum::{
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use chrono::NaiveDate;
use thiserror::Error;

use crate::pages;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Invalid(#[from] mandir_core::Error),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("the {slot_time} slot on {slot_date} is full")]
  SlotFull {
    slot_date: NaiveDate,
    slot_time: String,
  },
  #[error("Could not decode QR code.")]
  Undecodable,
  #[error("qr error: {0}")]
  Qr(String),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Invalid(e) => {
        (StatusCode::BAD_REQUEST, Html(pages::rejection(&e.to_string()))).into_response()
      }
      Error::BadRequest(msg) => {
        (StatusCode::BAD_REQUEST, Html(pages::rejection(&msg))).into_response()
      }
      e @ Error::SlotFull { .. } => {
        (StatusCode::CONFLICT, Html(pages::rejection(&e.to_string()))).into_response()
      }
      e @ Error::Undecodable => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
      e @ (Error::Qr(_) | Error::Io(_) | Error::Store(_)) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
      }
    }
  }
}
