//! The reasoning capability consumed by the pipeline.

use std::future::Future;

use crate::{summary::Extraction, window::ChatMessage};

/// An external completion/extraction service.
///
/// Implemented over HTTP by `waitroom-llm`; tests substitute deterministic
/// fakes.
pub trait Reasoner: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Produce the assistant reply for an ordered, role-tagged conversation.
  fn complete(
    &self,
    messages: Vec<ChatMessage>,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  /// Turn a rendered transcript into key points, structured fields and a
  /// narrative.
  fn extract(
    &self,
    transcript: String,
  ) -> impl Future<Output = Result<Extraction, Self::Error>> + Send + '_;
}
