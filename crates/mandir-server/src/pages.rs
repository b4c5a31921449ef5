//! Minimal HTML pages for the booking flow.
//!
//! All user-supplied text is escaped before it is interpolated.

use std::borrow::Cow;

use chrono::NaiveDate;
use mandir_core::booking::{Booking, SlotAvailability};
use quick_xml::escape::escape;

fn layout(title: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n\
     <html lang=\"en\">\n\
     <head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
     <body>\n{body}\n</body>\n\
     </html>\n",
    title = escape(title),
  )
}

/// A JavaScript string literal that is safe inside a `<script>` element.
fn js_string(s: &str) -> String {
  serde_json::to_string(s)
    .unwrap_or_else(|_| "\"\"".to_owned())
    .replace("</", "<\\/")
}

fn hidden(name: &str, value: &str) -> String {
  format!("<input type=\"hidden\" name=\"{name}\" value=\"{}\">", escape(value))
}

/// `GET /`: name, family members, and a date no earlier than `today`.
pub fn registration_form(today: NaiveDate) -> String {
  let body = format!(
    "<h1>Darshan Registration</h1>\n\
     <form method=\"post\" action=\"/choose_slot\">\n\
     <label>Name <input type=\"text\" name=\"name\" required></label>\n\
     <label>Family members <input type=\"text\" name=\"family\"></label>\n\
     <label>Date <input type=\"date\" name=\"slot_date\" min=\"{today}\" required></label>\n\
     <button type=\"submit\">Choose slot</button>\n\
     </form>",
    today = today.format("%Y-%m-%d"),
  );
  layout("Darshan Registration", &body)
}

/// `POST /choose_slot`: one radio button per slot; full slots are disabled.
pub fn slot_choice(
  name:      &str,
  family:    &str,
  slot_date: NaiveDate,
  slots:     &[SlotAvailability],
) -> String {
  let date = slot_date.format("%Y-%m-%d").to_string();

  let options: String = slots
    .iter()
    .map(|slot| {
      let time: Cow<'_, str> = escape(&slot.slot_time);
      if slot.is_open() {
        format!(
          "<label><input type=\"radio\" name=\"slot_time\" value=\"{time}\" required> \
           {time} ({left} left)</label><br>\n",
          left = slot.capacity - slot.booked,
        )
      } else {
        format!(
          "<label><input type=\"radio\" name=\"slot_time\" value=\"{time}\" disabled> \
           {time} (Full)</label><br>\n"
        )
      }
    })
    .collect();

  let body = format!(
    "<h1>Choose a slot for {date}</h1>\n\
     <form method=\"post\" action=\"/register\">\n\
     {name}\n{family}\n{slot_date}\n\
     {options}\
     <button type=\"submit\">Register</button>\n\
     </form>",
    name = hidden("name", name),
    family = hidden("family", family),
    slot_date = hidden("slot_date", &date),
  );
  layout("Choose a slot", &body)
}

/// `POST /register`: the issued QR code, plus a poller that flips the page
/// once the booking is checked in.
pub fn qr_issued(booking: &Booking, qr_file: &str) -> String {
  let id = booking.booking_id;
  let body = format!(
    "<h1>Registration confirmed</h1>\n\
     <p id=\"booking-id\">Booking ID: <strong>{id}</strong></p>\n\
     <p>{name}, {slot_time} on {slot_date}</p>\n\
     <img src=\"/static/{src}\" alt=\"QR code for booking {id}\">\n\
     <p>Status: <span id=\"status\">{status}</span></p>\n\
     <script>\n\
     setInterval(function () {{\n\
       fetch('/status_check/{id}').then(function (r) {{ return r.json(); }})\n\
         .then(function (s) {{ document.getElementById('status').textContent = s.status; }});\n\
     }}, 3000);\n\
     </script>",
    name = escape(&booking.name),
    slot_time = escape(&booking.slot_time),
    slot_date = booking.slot_date.format("%Y-%m-%d"),
    src = escape(qr_file),
    status = booking.status,
  );
  layout("Registration confirmed", &body)
}

/// Any rejected form submission: alert, then back to the form.
pub fn rejection(message: &str) -> String {
  let body = format!(
    "<p>{text}</p>\n\
     <p><a href=\"/\">Back to registration</a></p>\n\
     <script>\n\
     alert({js});\n\
     window.location.href = \"/\";\n\
     </script>",
    text = escape(message),
    js = js_string(message),
  );
  layout("Registration rejected", &body)
}
