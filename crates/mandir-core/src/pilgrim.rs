//! Pilgrims registered through the JSON API.

use serde::{Deserialize, Serialize};

pub type PilgrimId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pilgrim {
  pub pilgrim_id:        PilgrimId,
  pub name:              String,
  pub phone:             String,
  pub email:             String,
  pub registered:        bool,
  pub zone:              String,
  pub disability_status: bool,
}

/// Input to [`crate::store::TempleStore::add_pilgrim`]; also the JSON body of
/// `POST /pilgrims`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPilgrim {
  pub name:              String,
  pub phone:             String,
  pub email:             String,
  #[serde(default)]
  pub registered:        bool,
  pub zone:              String,
  #[serde(default)]
  pub disability_status: bool,
}

impl NewPilgrim {
  /// The registration a gate scanner submits when it simulates a QR
  /// check-in for `email`.
  pub fn qr_scan(email: impl Into<String>) -> Self {
    Self {
      name:              "QR_Scan".to_owned(),
      phone:             "0000000000".to_owned(),
      email:             email.into(),
      registered:        true,
      zone:              "Gate_1".to_owned(),
      disability_status: false,
    }
  }
}
