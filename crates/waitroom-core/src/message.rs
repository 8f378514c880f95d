//! Transcript messages.
//!
//! A message is immutable once written. Within a session, messages are
//! ordered by `created_at` with ties broken by the store-assigned `seq`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, session::SessionId};

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Patient,
  Assistant,
}

impl Role {
  /// The string stored in the `role` column.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Patient => "patient",
      Self::Assistant => "assistant",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "patient" => Ok(Self::Patient),
      "assistant" => Ok(Self::Assistant),
      other => Err(Error::UnknownRole(other.to_owned())),
    }
  }
}

/// A persisted transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
  /// Monotonic insertion sequence; unique across the store.
  pub seq:        i64,
  pub session_id: SessionId,
  pub role:       Role,
  pub content:    String,
  /// Server-assigned; never earlier than the previous message in the session.
  pub created_at: DateTime<Utc>,
}

/// Reject message content that is empty after trimming.
pub fn validate_content(content: &str) -> Result<&str> {
  let trimmed = content.trim();
  if trimmed.is_empty() {
    return Err(Error::EmptyMessage);
  }
  Ok(trimmed)
}

/// Render a transcript as `role: content` lines for the extraction capability.
pub fn render_transcript(messages: &[Message]) -> String {
  messages
    .iter()
    .map(|m| format!("{}: {}", m.role.as_str(), m.content))
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;

  #[test]
  fn role_roundtrips_through_column_string() {
    for role in [Role::Patient, Role::Assistant] {
      assert_eq!(Role::parse(role.as_str()).unwrap(), role);
    }
    assert!(matches!(Role::parse("bot"), Err(Error::UnknownRole(_))));
  }

  #[test]
  fn blank_content_is_rejected() {
    assert!(matches!(validate_content(" \n\t "), Err(Error::EmptyMessage)));
    assert_eq!(validate_content("  fever now ").unwrap(), "fever now");
  }

  #[test]
  fn transcript_renders_one_line_per_message() {
    let session_id = SessionId::new();
    let at = Utc::now();
    let messages = vec![
      Message {
        seq: 1,
        session_id,
        role: Role::Patient,
        content: "headache".into(),
        created_at: at,
      },
      Message {
        seq: 2,
        session_id,
        role: Role::Assistant,
        content: "since when?".into(),
        created_at: at,
      },
    ];
    assert_eq!(
      render_transcript(&messages),
      "patient: headache\nassistant: since when?"
    );
  }
}
