//! Error types for `waitroom-engine`.

use std::time::Duration;

use thiserror::Error;

use crate::TurnReply;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why the reasoning capability produced no usable reply.
#[derive(Debug, Error)]
pub enum UpstreamError {
  #[error("reasoning capability failed: {0}")]
  Capability(#[source] BoxError),

  #[error("reasoning capability timed out after {0:?}")]
  Timeout(Duration),

  #[error("reasoning call was cancelled")]
  Cancelled,

  #[error("reasoning capability returned an empty reply")]
  Empty,
}

/// Failure of a patient turn.
#[derive(Debug, Error)]
pub enum TurnError {
  /// Empty content, unknown or closed session. Nothing was persisted.
  #[error(transparent)]
  Rejected(#[from] waitroom_core::Error),

  /// The reasoning capability failed. The fallback reply has been persisted
  /// and should still be shown to the patient.
  #[error("upstream failure: {source}")]
  Upstream {
    reply:  TurnReply,
    #[source]
    source: UpstreamError,
  },

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl TurnError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}
