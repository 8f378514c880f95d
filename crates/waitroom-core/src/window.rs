//! Context window builder.
//!
//! Only the trailing slice of a transcript is sent to the reasoning
//! capability. The window bounds prompt size and cost at the price of
//! long-range memory: anything older than the window is forgotten.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  message::{Message, Role},
  prompts::SYSTEM_PROMPT,
};

/// The role vocabulary of the reasoning capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  System,
  User,
  Assistant,
}

impl From<Role> for ChatRole {
  fn from(role: Role) -> Self {
    match role {
      Role::Patient => Self::User,
      Role::Assistant => Self::Assistant,
    }
  }
}

/// One role-tagged entry of a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role:    ChatRole,
  pub content: String,
}

impl ChatMessage {
  pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
    Self { role, content: content.into() }
  }

  pub fn system(content: impl Into<String>) -> Self { Self::new(ChatRole::System, content) }

  pub fn user(content: impl Into<String>) -> Self { Self::new(ChatRole::User, content) }
}

/// Select the messages recorded at or after `now - window`, in transcript
/// order, mapped onto the capability's roles.
pub fn build_context(
  history: &[Message],
  now: DateTime<Utc>,
  window: Duration,
) -> Vec<ChatMessage> {
  let since = now - window;
  let mut recent: Vec<&Message> =
    history.iter().filter(|m| m.created_at >= since).collect();
  recent.sort_by_key(|m| (m.created_at, m.seq));

  recent
    .into_iter()
    .map(|m| ChatMessage::new(m.role.into(), m.content.clone()))
    .collect()
}

/// The full completion request: system instruction, windowed history, then
/// the new patient message as the final turn.
pub fn compose_request(context: Vec<ChatMessage>, new_message: &str) -> Vec<ChatMessage> {
  let mut messages = Vec::with_capacity(context.len() + 2);
  messages.push(ChatMessage::system(SYSTEM_PROMPT));
  messages.extend(context);
  messages.push(ChatMessage::user(new_message));
  messages
}
