//! The two-step registration form: pick a date, then pick a slot and receive
//! a QR code.

use axum::{
  Form,
  extract::State,
  response::Html,
};
use mandir_core::{
  booking::{Booking, BookingId, NewBooking, Reservation, validate_slot_date},
  store::TempleStore,
};
use serde::Deserialize;

use crate::{AppState, error::Error, handlers::parse_form_date, pages, today};

/// `GET /`
pub async fn form() -> Html<String> { Html(pages::registration_form(today())) }

#[derive(Debug, Deserialize)]
pub struct DateForm {
  pub name:      String,
  #[serde(default)]
  pub family:    String,
  pub slot_date: String,
}

/// `POST /choose_slot`: show which slots on the chosen date still have room.
pub async fn choose_slot<S>(
  State(state): State<AppState<S>>,
  Form(form): Form<DateForm>,
) -> Result<Html<String>, Error>
where
  S: TempleStore + Clone + 'static,
{
  let slot_date = parse_form_date(&form.slot_date)?;
  validate_slot_date(slot_date, today())?;

  let counts = state
    .store
    .slot_counts(slot_date)
    .await
    .map_err(Error::store)?;
  let slots = state.config.schedule().availability(&counts);

  Ok(Html(pages::slot_choice(&form.name, &form.family, slot_date, &slots)))
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
  pub name:      String,
  #[serde(default)]
  pub family:    String,
  pub slot_date: String,
  pub slot_time: String,
}

/// `POST /register`: reserve the slot, issue the QR code, show it.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Form(form): Form<RegisterForm>,
) -> Result<Html<String>, Error>
where
  S: TempleStore + Clone + 'static,
{
  let input = NewBooking {
    name:           form.name.trim().to_owned(),
    family_members: form.family.trim().to_owned(),
    slot_date:      parse_form_date(&form.slot_date)?,
    slot_time:      form.slot_time,
  };
  input.validate(&state.config.schedule(), today())?;

  let reservation = state
    .store
    .reserve(input, state.config.slot_capacity)
    .await
    .map_err(Error::store)?;

  let booking = match reservation {
    Reservation::Booked(b) => b,
    Reservation::SlotFull { slot_date, slot_time } => {
      tracing::info!(%slot_date, %slot_time, "registration refused: slot full");
      return Err(Error::SlotFull { slot_date, slot_time });
    }
  };

  let qr_file = match issue_qr(&state, &booking).await {
    Ok(qr_file) => qr_file,
    Err(e) => {
      release(&state, booking.booking_id).await;
      return Err(e);
    }
  };

  tracing::info!(
    booking_id = booking.booking_id,
    slot_date = %booking.slot_date,
    slot_time = %booking.slot_time,
    "booking registered"
  );
  Ok(Html(pages::qr_issued(&booking, &qr_file)))
}

/// Write the booking's QR image and record its path on the row.
async fn issue_qr<S>(state: &AppState<S>, booking: &Booking) -> Result<String, Error>
where
  S: TempleStore + Clone + 'static,
{
  let payload = state.config.checkin_url(booking.booking_id);
  let qr_file = state
    .qr
    .issue(booking.booking_id, &booking.name, &payload)
    .await?;

  if let Err(e) = state
    .store
    .attach_qr_file(booking.booking_id, qr_file.clone())
    .await
  {
    state.qr.discard(&qr_file).await;
    return Err(Error::store(e));
  }
  Ok(qr_file)
}

/// Give back a place reserved by a registration that could not finish.
async fn release<S>(state: &AppState<S>, booking_id: BookingId)
where
  S: TempleStore + Clone + 'static,
{
  match state.store.cancel_reservation(booking_id).await {
    Ok(true) => tracing::warn!(booking_id, "reservation released after failed QR issue"),
    Ok(false) => tracing::warn!(booking_id, "reservation already issued or used; kept"),
    Err(e) => tracing::error!(booking_id, error = %e, "failed to release reservation"),
  }
}
