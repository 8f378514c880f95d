//! Error types for `waitroom-core`.

use thiserror::Error;

use crate::session::SessionId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("message content is empty")]
  EmptyMessage,

  #[error("session not found: {0}")]
  SessionNotFound(SessionId),

  #[error("session {0} is closed")]
  SessionClosed(SessionId),

  #[error("unknown message role: {0:?}")]
  UnknownRole(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
