//! SQL schema for the Mandir SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- The only mutable table: status goes Pending -> Present once, and qr_file
-- is filled in right after the insert. Rows are never deleted.
CREATE TABLE IF NOT EXISTS bookings (
    booking_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    family_members TEXT NOT NULL DEFAULT '',
    slot_date      TEXT NOT NULL,   -- YYYY-MM-DD
    slot_time      TEXT NOT NULL,   -- slot label, e.g. '8-9 AM'
    status         TEXT NOT NULL DEFAULT 'Pending'
                   CHECK (status IN ('Pending', 'Present')),
    checkin_time   TEXT,            -- ISO 8601 UTC; set at check-in
    qr_file        TEXT,            -- relative to the static directory
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pilgrims (
    pilgrim_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT NOT NULL,
    phone             TEXT NOT NULL,
    email             TEXT NOT NULL,
    registered        INTEGER NOT NULL DEFAULT 0,
    zone              TEXT NOT NULL,
    disability_status INTEGER NOT NULL DEFAULT 0
);

-- Append-only.
CREATE TABLE IF NOT EXISTS alerts (
    alert_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    zone       TEXT NOT NULL,
    severity   TEXT NOT NULL,   -- free text; interpreted only for display
    type       TEXT NOT NULL,
    message    TEXT NOT NULL,
    recipients TEXT NOT NULL DEFAULT '[]',   -- JSON array of strings
    timestamp  TEXT NOT NULL,                -- ISO 8601 UTC; server-assigned
    status     TEXT NOT NULL DEFAULT 'sent'
);

-- Append-only.
CREATE TABLE IF NOT EXISTS crowd_density (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    zone            TEXT NOT NULL,
    estimated_count INTEGER NOT NULL CHECK (estimated_count >= 0),
    timestamp       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS bookings_slot_idx       ON bookings(slot_date, slot_time);
CREATE INDEX IF NOT EXISTS pilgrims_name_idx       ON pilgrims(name);
CREATE INDEX IF NOT EXISTS alerts_timestamp_idx    ON alerts(timestamp);
CREATE INDEX IF NOT EXISTS density_timestamp_idx   ON crowd_density(timestamp);

PRAGMA user_version = 1;
";
