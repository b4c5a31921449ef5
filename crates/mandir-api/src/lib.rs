//! JSON REST API for Mandir: alerts, pilgrims, and crowd density.
//!
//! Exposes an axum [`Router`] backed by any [`mandir_core::store::TempleStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(mandir_api::api_router(store.clone()))
//! ```

pub mod alerts;
pub mod density;
pub mod error;
pub mod pilgrims;

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use mandir_core::store::TempleStore;
use serde_json::{Value, json};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be merged into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: TempleStore + 'static,
{
  Router::new()
    .route("/alerts", get(alerts::list::<S>).post(alerts::create::<S>))
    .route("/pilgrims", get(pilgrims::list::<S>).post(pilgrims::create::<S>))
    .route("/crowd_density", get(density::list::<S>).post(density::create::<S>))
    .route("/health", get(health))
    .with_state(store)
}

/// `GET /health`
async fn health() -> Json<Value> {
  Json(json!({ "message": "Temple Alert API is running" }))
}

/// Reject blank required text fields.
pub(crate) fn require(field: &str, value: &str) -> Result<(), ApiError> {
  if value.trim().is_empty() {
    Err(ApiError::BadRequest(format!("{field} must not be empty")))
  } else {
    Ok(())
  }
}

// ─── Integration tests ────────────────────────────────────────────────────────
