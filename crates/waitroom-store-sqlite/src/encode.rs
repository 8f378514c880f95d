//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`
//! suffix) so that string order equals chronological order. Key points and
//! structured fields are stored as compact JSON.

use std::str::FromStr as _;

use chrono::{DateTime, SecondsFormat, Utc};
use waitroom_core::{
  message::{Message, Role},
  session::{Session, SessionId, SessionPreview},
  summary::{Structured, Summary},
};

use crate::{Error, Result};

// ─── SessionId ───────────────────────────────────────────────────────────────

pub fn encode_id(id: SessionId) -> String { id.to_string() }

pub fn decode_id(s: &str) -> Result<SessionId> { Ok(SessionId::from_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Summary payloads ────────────────────────────────────────────────────────

pub fn encode_key_points(points: &[String]) -> Result<String> {
  Ok(serde_json::to_string(points)?)
}

pub fn decode_key_points(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

pub fn encode_structured(structured: &Structured) -> Result<String> {
  Ok(serde_json::to_string(structured)?)
}

pub fn decode_structured(s: &str) -> Result<Structured> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `sessions` row.
pub struct RawSession {
  pub session_id:  String,
  pub created_at:  String,
  pub closed_at:   Option<String>,
  pub message_cap: i64,
}

impl RawSession {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id:  row.get(0)?,
      created_at:  row.get(1)?,
      closed_at:   row.get(2)?,
      message_cap: row.get(3)?,
    })
  }

  pub fn into_session(self) -> Result<Session> {
    Ok(Session {
      id:          decode_id(&self.session_id)?,
      created_at:  decode_dt(&self.created_at)?,
      closed_at:   self.closed_at.as_deref().map(decode_dt).transpose()?,
      message_cap: u32::try_from(self.message_cap).unwrap_or(0),
    })
  }
}

/// Raw strings read directly from a `messages` row.
pub struct RawMessage {
  pub seq:        i64,
  pub session_id: String,
  pub role:       String,
  pub content:    String,
  pub created_at: String,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      seq:        row.get(0)?,
      session_id: row.get(1)?,
      role:       row.get(2)?,
      content:    row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      seq:        self.seq,
      session_id: decode_id(&self.session_id)?,
      role:       Role::parse(&self.role)?,
      content:    self.content,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `summaries` row.
pub struct RawSummary {
  pub session_id: String,
  pub key_points: String,
  pub structured: String,
  pub free_text:  String,
  pub updated_at: String,
}

impl RawSummary {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      session_id: row.get(0)?,
      key_points: row.get(1)?,
      structured: row.get(2)?,
      free_text:  row.get(3)?,
      updated_at: row.get(4)?,
    })
  }

  pub fn into_summary(self) -> Result<Summary> {
    Ok(Summary {
      session_id: decode_id(&self.session_id)?,
      key_points: decode_key_points(&self.key_points)?,
      structured: decode_structured(&self.structured)?,
      free_text:  self.free_text,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings for one dashboard preview row.
pub struct RawPreview {
  pub session_id:         String,
  pub key_points:         Option<String>,
  pub summary_updated_at: Option<String>,
  pub last_message_at:    String,
}

impl RawPreview {
  pub fn into_preview(self) -> Result<SessionPreview> {
    Ok(SessionPreview {
      session_id:         decode_id(&self.session_id)?,
      key_points:         self
        .key_points
        .as_deref()
        .map(decode_key_points)
        .transpose()?
        .unwrap_or_default(),
      summary_updated_at: self.summary_updated_at.as_deref().map(decode_dt).transpose()?,
      last_message_at:    decode_dt(&self.last_message_at)?,
    })
  }
}
