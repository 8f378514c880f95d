//! Sessions: the conversation identity a transcript and summary hang off.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable key for one patient's ongoing conversation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
  pub fn new() -> Self { Self(Uuid::new_v4()) }

  pub fn as_uuid(&self) -> Uuid { self.0 }
}

impl Default for SessionId {
  fn default() -> Self { Self::new() }
}

impl From<Uuid> for SessionId {
  fn from(id: Uuid) -> Self { Self(id) }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.hyphenated().fmt(f)
  }
}

impl FromStr for SessionId {
  type Err = uuid::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> { Ok(Self(Uuid::parse_str(s)?)) }
}

/// A patient visit. Holds only identity metadata and the per-visit cap; the
/// conversation itself lives in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub id:          SessionId,
  pub created_at:  DateTime<Utc>,
  /// Set once the visit is over; closed sessions accept no further turns.
  pub closed_at:   Option<DateTime<Utc>>,
  /// Maximum number of patient messages admitted for this visit.
  pub message_cap: u32,
}

impl Session {
  pub fn is_open(&self) -> bool { self.closed_at.is_none() }
}

/// One row of the clinician dashboard list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPreview {
  pub session_id:         SessionId,
  /// Key points of the current summary; empty until the first summary lands.
  pub key_points:         Vec<String>,
  pub summary_updated_at: Option<DateTime<Utc>>,
  /// Timestamp of the latest message, or the session creation time.
  pub last_message_at:    DateTime<Utc>,
}
