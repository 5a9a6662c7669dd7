//! SQL schema for the Overseer SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS items (
    item_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Append-mostly. Rows are only edited through the correction path, and
-- the labels column is never updated.
CREATE TABLE IF NOT EXISTS observations (
    observation_id  TEXT PRIMARY KEY,
    registered_at   TEXT NOT NULL,   -- fixed-width local time, no zone
    item_id         TEXT NOT NULL REFERENCES items(item_id),
    price           TEXT NOT NULL,
    count           INTEGER NOT NULL CHECK (count >= 0),
    labels          TEXT NOT NULL DEFAULT '[]'   -- JSON list of tiers
);

-- Latest two observations per item.
CREATE TABLE IF NOT EXISTS realtime_overlays (
    item_id         TEXT PRIMARY KEY REFERENCES items(item_id),
    previous_price  TEXT,
    last_price      TEXT NOT NULL,
    previous_count  INTEGER,
    last_count      INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS observations_item_time_idx
    ON observations(item_id, registered_at);
CREATE INDEX IF NOT EXISTS items_name_idx ON items(name);

PRAGMA user_version = 1;
";
