//! The `ConversationStore` trait.
//!
//! Implemented by storage backends (e.g. `waitroom-store-sqlite`). The
//! orchestrator, summary worker and HTTP layer depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  message::{Message, Role},
  session::{Session, SessionId, SessionPreview},
  summary::Summary,
};

/// Result of [`ConversationStore::admit_patient_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmitOutcome {
  /// The patient message was persisted.
  Admitted(Message),
  /// The cap was reached; only the closing assistant message was persisted.
  Capped(Message),
}

/// Abstraction over a transcript and summary backend.
///
/// Messages are append-only. Summaries are upserted by session, last writer
/// wins.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ConversationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sessions ──────────────────────────────────────────────────────────

  /// Create and persist a new open session.
  fn create_session(
    &self,
    message_cap: u32,
  ) -> impl Future<Output = Result<Session, Self::Error>> + Send + '_;

  /// Retrieve a session by id. Returns `None` if not found.
  fn get_session(
    &self,
    id: SessionId,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// Mark a session closed. Closing twice keeps the first `closed_at`.
  /// Returns `None` if the session does not exist.
  fn close_session(
    &self,
    id: SessionId,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + '_;

  /// Open sessions with their summary preview, most recent activity first.
  fn list_open_sessions(
    &self,
  ) -> impl Future<Output = Result<Vec<SessionPreview>, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Number of patient-authored messages in the session.
  fn count_patient_messages(
    &self,
    id: SessionId,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + '_;

  /// Count, apply [`crate::cap::admit`] against `limit`, and persist the
  /// outcome as a single unit, so concurrent turns cannot exceed the cap.
  ///
  /// On admission `content` is stored as a patient message; on denial
  /// `closing_message` is stored as an assistant message instead.
  fn admit_patient_message(
    &self,
    id: SessionId,
    content: String,
    limit: u32,
    closing_message: String,
  ) -> impl Future<Output = Result<AdmitOutcome, Self::Error>> + Send + '_;

  /// Append a message. `created_at` and `seq` are assigned by the store.
  fn append_message(
    &self,
    id: SessionId,
    role: Role,
    content: String,
  ) -> impl Future<Output = Result<Message, Self::Error>> + Send + '_;

  /// Messages recorded at or after `since`, in transcript order.
  fn messages_since(
    &self,
    id: SessionId,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  /// The full transcript, in transcript order.
  fn transcript(
    &self,
    id: SessionId,
  ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send + '_;

  // ── Summaries ─────────────────────────────────────────────────────────

  /// The current summary, or `None` before the first recomputation.
  fn get_summary(
    &self,
    id: SessionId,
  ) -> impl Future<Output = Result<Option<Summary>, Self::Error>> + Send + '_;

  /// Insert or replace the stored summary for `summary.session_id`.
  fn upsert_summary(
    &self,
    summary: Summary,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
