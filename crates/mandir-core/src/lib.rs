//! Domain types for Mandir: darshan bookings, pilgrims, alerts, and crowd
//! density readings, plus the [`store::TempleStore`] trait every backend
//! implements.
//!
//! No HTTP or database code lives here.

pub mod alert;
pub mod booking;
pub mod density;
pub mod error;
pub mod pilgrim;
pub mod store;

pub use error::{Error, Result};
