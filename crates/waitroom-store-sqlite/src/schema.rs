//! SQL schema for the Waitroom SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS sessions (
    session_id  TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,
    closed_at   TEXT,
    message_cap INTEGER NOT NULL
);

-- Messages are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS messages (
    seq        INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL REFERENCES sessions(session_id),
    role       TEXT NOT NULL,   -- 'patient' | 'assistant'
    content    TEXT NOT NULL,
    created_at TEXT NOT NULL    -- fixed-width RFC 3339 UTC; never decreases per session
);

-- One live summary per session, upserted in place.
CREATE TABLE IF NOT EXISTS summaries (
    session_id TEXT PRIMARY KEY REFERENCES sessions(session_id),
    key_points TEXT NOT NULL DEFAULT '[]',
    structured TEXT NOT NULL DEFAULT '{}',
    free_text  TEXT NOT NULL DEFAULT '',
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS messages_session_idx ON messages(session_id, created_at, seq);

PRAGMA user_version = 1;
";
