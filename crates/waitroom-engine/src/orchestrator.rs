//! The dialogue orchestrator.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use waitroom_core::{
  Error as CoreError,
  message::{Role, validate_content},
  prompts::{CAP_MESSAGE, FALLBACK_MESSAGE},
  reasoner::Reasoner,
  session::{Session, SessionId},
  store::{AdmitOutcome, ConversationStore},
  window::{build_context, compose_request},
};

use crate::{SummaryQueue, TurnError, UpstreamError};

/// Tunables for the turn pipeline.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Cap applied to sessions opened without an explicit one.
  pub default_message_cap: u32,
  /// How far back the transcript is sent as context.
  pub context_window:      chrono::Duration,
  /// Upper bound on one reasoning call.
  pub reasoning_timeout:   Duration,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      default_message_cap: 50,
      context_window:      chrono::Duration::days(7),
      reasoning_timeout:   Duration::from_secs(30),
    }
  }
}

/// What the patient sees after a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
  pub reply:  String,
  /// `true` when the turn was refused because the cap was reached.
  pub capped: bool,
}

/// Runs patient turns against a store and a reasoning capability.
pub struct Orchestrator<S, R> {
  store:    Arc<S>,
  reasoner: Arc<R>,
  queue:    SummaryQueue,
  config:   EngineConfig,
}

impl<S, R> Clone for Orchestrator<S, R> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      reasoner: Arc::clone(&self.reasoner),
      queue:    self.queue.clone(),
      config:   self.config.clone(),
    }
  }
}

impl<S, R> Orchestrator<S, R>
where
  S: ConversationStore,
  R: Reasoner,
{
  pub fn new(
    store: Arc<S>,
    reasoner: Arc<R>,
    queue: SummaryQueue,
    config: EngineConfig,
  ) -> Self {
    Self { store, reasoner, queue, config }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  pub fn config(&self) -> &EngineConfig { &self.config }

  /// Open a new session, using the configured cap unless one is given.
  pub async fn open_session(&self, message_cap: Option<u32>) -> Result<Session, TurnError> {
    let cap = message_cap.unwrap_or(self.config.default_message_cap);
    let session = self
      .store
      .create_session(cap)
      .await
      .map_err(TurnError::store)?;
    info!(session = %session.id, message_cap = cap, "session opened");
    Ok(session)
  }

  /// Run one turn. See [`Orchestrator::respond_cancellable`].
  pub async fn respond(&self, id: SessionId, text: &str) -> Result<TurnReply, TurnError> {
    self.respond_cancellable(id, text, CancellationToken::new()).await
  }

  /// Run one turn:
  ///
  /// 1. reject blank content and unknown or closed sessions;
  /// 2. gate on the cap, persisting the patient message or the closing notice;
  /// 3. ask the reasoning capability with the windowed context;
  /// 4. persist the reply, or the fallback if the call failed, timed out or
  ///    `cancel` fired;
  /// 5. queue summary recomputation.
  pub async fn respond_cancellable(
    &self,
    id: SessionId,
    text: &str,
    cancel: CancellationToken,
  ) -> Result<TurnReply, TurnError> {
    let content = validate_content(text)?;

    let session = self
      .store
      .get_session(id)
      .await
      .map_err(TurnError::store)?
      .ok_or(CoreError::SessionNotFound(id))?;
    if !session.is_open() {
      return Err(CoreError::SessionClosed(id).into());
    }

    let now = Utc::now();
    let outcome = self
      .store
      .admit_patient_message(
        id,
        content.to_owned(),
        session.message_cap,
        CAP_MESSAGE.to_owned(),
      )
      .await
      .map_err(TurnError::store)?;

    let patient = match outcome {
      AdmitOutcome::Admitted(message) => message,
      AdmitOutcome::Capped(notice) => {
        info!(session = %id, cap = session.message_cap, "message cap reached");
        return Ok(TurnReply { reply: notice.content, capped: true });
      }
    };

    let mut history = self
      .store
      .messages_since(id, now - self.config.context_window)
      .await
      .map_err(TurnError::store)?;
    // The new message goes last, exactly once.
    history.retain(|m| m.seq < patient.seq);
    let request = compose_request(
      build_context(&history, now, self.config.context_window),
      content,
    );
    debug!(session = %id, context = request.len(), "calling reasoning capability");

    let completion = tokio::select! {
      _ = cancel.cancelled() => Err(UpstreamError::Cancelled),
      res = tokio::time::timeout(self.config.reasoning_timeout, self.reasoner.complete(request)) => {
        match res {
          Ok(Ok(reply)) if !reply.trim().is_empty() => Ok(reply),
          Ok(Ok(_)) => Err(UpstreamError::Empty),
          Ok(Err(e)) => Err(UpstreamError::Capability(Box::new(e))),
          Err(_) => Err(UpstreamError::Timeout(self.config.reasoning_timeout)),
        }
      }
    };

    let result = match completion {
      Ok(reply) => {
        let message = self
          .store
          .append_message(id, Role::Assistant, reply)
          .await
          .map_err(TurnError::store)?;
        Ok(TurnReply { reply: message.content, capped: false })
      }
      Err(source) => {
        warn!(session = %id, error = %source, "reasoning failed; sending fallback reply");
        let message = self
          .store
          .append_message(id, Role::Assistant, FALLBACK_MESSAGE.to_owned())
          .await
          .map_err(TurnError::store)?;
        Err(TurnError::Upstream {
          reply: TurnReply { reply: message.content, capped: false },
          source,
        })
      }
    };

    self.queue.enqueue(id);
    result
  }
}
