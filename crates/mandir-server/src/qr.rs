//! QR codes for bookings: rendering, the on-disk archive, and decoding of
//! scanned images.
//!
//! Each booking gets one PNG under `<static_dir>/qrcodes/`. The file is
//! deleted when the booking is checked in, but that deletion is only
//! housekeeping: reuse of a code is prevented by the booking status.

use std::{
  io::Cursor,
  path::{Component, Path, PathBuf},
};

use image::{GrayImage, ImageFormat, ImageReader, Limits, Luma};
use mandir_core::booking::BookingId;
use qrcode::{Color, QrCode};

use crate::error::Error;

/// Sub-directory of the static directory holding booking QR images.
pub const QR_SUBDIR: &str = "qrcodes";

/// Pixels per QR module in rendered images.
const MODULE_PX: u32 = 10;
/// Width of the light border, in modules.
const QUIET_ZONE: u32 = 4;

/// Largest accepted width or height of a scanned image, in pixels.
const MAX_SCAN_SIDE: u32 = 8192;
/// Largest buffer the decoder may allocate for a scan.
const MAX_SCAN_ALLOC: u64 = 256 * 1024 * 1024;

// ─── Rendering ───────────────────────────────────────────────────────────────

/// Encode `payload` as a black-on-white PNG.
pub fn render_png(payload: &str) -> Result<Vec<u8>, Error> {
  let code = QrCode::new(payload.as_bytes()).map_err(|e| Error::Qr(e.to_string()))?;
  let width = code.width();
  let colors = code.to_colors();

  let side = (width as u32 + 2 * QUIET_ZONE) * MODULE_PX;
  let img = GrayImage::from_fn(side, side, |x, y| {
    let mx = (x / MODULE_PX).checked_sub(QUIET_ZONE).map(|v| v as usize);
    let my = (y / MODULE_PX).checked_sub(QUIET_ZONE).map(|v| v as usize);
    let dark = match (mx, my) {
      (Some(mx), Some(my)) if mx < width && my < width => {
        colors[my * width + mx] == Color::Dark
      }
      _ => false,
    };
    Luma([if dark { 0 } else { 255 }])
  });

  let mut out = Cursor::new(Vec::new());
  img
    .write_to(&mut out, ImageFormat::Png)
    .map_err(|e| Error::Qr(e.to_string()))?;
  Ok(out.into_inner())
}

// ─── Decoding ────────────────────────────────────────────────────────────────

/// Decode the first readable QR code in an encoded image (PNG or JPEG).
///
/// Returns `Ok(None)` when the image loads but holds no readable code.
pub fn decode(image_bytes: &[u8]) -> Result<Option<String>, Error> {
  let mut reader = ImageReader::new(Cursor::new(image_bytes))
    .with_guessed_format()
    .map_err(|e| Error::BadRequest(format!("unreadable image: {e}")))?;
  reader.limits(scan_limits());
  let img = reader
    .decode()
    .map_err(|e| Error::BadRequest(format!("unreadable image: {e}")))?
    .to_luma8();
  let (w, h) = img.dimensions();

  let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
    w as usize,
    h as usize,
    |x, y| img.get_pixel(x as u32, y as u32).0[0],
  );

  for grid in prepared.detect_grids() {
    match grid.decode() {
      Ok((_meta, content)) => return Ok(Some(content)),
      Err(e) => tracing::debug!(error = ?e, "skipping unreadable QR grid"),
    }
  }
  Ok(None)
}

/// Bounds on uploaded scans: generous for a phone photo, small enough that a
/// tiny, highly compressed file cannot demand a huge decode buffer.
fn scan_limits() -> Limits {
  let mut limits = Limits::default();
  limits.max_image_width = Some(MAX_SCAN_SIDE);
  limits.max_image_height = Some(MAX_SCAN_SIDE);
  limits.max_alloc = Some(MAX_SCAN_ALLOC);
  limits
}

// ─── Archive ─────────────────────────────────────────────────────────────────

/// The directory tree where booking QR images live.
#[derive(Debug, Clone)]
pub struct QrArchive {
  static_dir: PathBuf,
}

impl QrArchive {
  pub fn new(static_dir: impl Into<PathBuf>) -> Self {
    Self { static_dir: static_dir.into() }
  }

  /// Path of a booking's image relative to the static directory, e.g.
  /// `qrcodes/booking_7_Asha.png`.
  pub fn relative_path(booking_id: BookingId, name: &str) -> String {
    format!("{QR_SUBDIR}/booking_{booking_id}_{}.png", file_safe(name))
  }

  /// Render `payload`, write it for `booking_id`, and return the relative
  /// path to record on the booking.
  pub async fn issue(
    &self,
    booking_id: BookingId,
    name:       &str,
    payload:    &str,
  ) -> Result<String, Error> {
    let payload = payload.to_owned();
    let png = tokio::task::spawn_blocking(move || render_png(&payload))
      .await
      .map_err(|e| Error::Qr(e.to_string()))??;

    let relative = Self::relative_path(booking_id, name);
    let path = self.static_dir.join(&relative);
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, png).await?;

    tracing::debug!(booking_id, path = %path.display(), "QR image written");
    Ok(relative)
  }

  /// Remove a previously issued image. Failures are logged, never returned.
  pub async fn discard(&self, relative: &str) {
    let Some(path) = self.resolve(relative) else {
      tracing::warn!(qr_file = relative, "refusing to delete path outside the QR archive");
      return;
    };
    match tokio::fs::remove_file(&path).await {
      Ok(()) => tracing::debug!(path = %path.display(), "QR image discarded"),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        tracing::debug!(path = %path.display(), "QR image already gone");
      }
      Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to discard QR image"),
    }
  }

  /// Absolute path for a relative reference, or `None` if the reference
  /// would escape the static directory.
  pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    rel
      .components()
      .all(|c| matches!(c, Component::Normal(_)))
      .then(|| self.static_dir.join(rel))
  }
}

/// Reduce a display name to characters that are safe in a file name.
fn file_safe(name: &str) -> String {
  let cleaned: String = name
    .trim()
    .chars()
    .take(40)
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
    .collect();
  if cleaned.is_empty() { "guest".to_owned() } else { cleaned }
}
