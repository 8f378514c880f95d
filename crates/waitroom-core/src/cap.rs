//! Cap policy: whether another patient message may enter the conversation.

use serde::{Deserialize, Serialize};

/// Outcome of the cap policy for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Admission {
  Allow,
  /// Terminal for the turn: only the closing message is appended.
  Deny,
}

impl Admission {
  pub fn is_allowed(&self) -> bool { matches!(self, Self::Allow) }
}

/// Admit a new patient message given how many the session already holds.
///
/// `count` must be read from the store at decision time, never cached.
pub fn admit(count: u32, limit: u32) -> Admission {
  if count < limit { Admission::Allow } else { Admission::Deny }
}
