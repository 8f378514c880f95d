//! Clinician dashboard handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/doctor/sessions` | Open sessions, most recent activity first |
//! | `GET`  | `/doctor/sessions/{id}` | Session, current summary, transcript |
//! | `POST` | `/doctor/sessions/{id}/close` | Idempotent |
//! | `GET`  | `/doctor/sessions/{id}/stream` | SSE `summary_update` events |

use std::convert::Infallible;

use axum::{
  Json,
  extract::{Path, State},
  response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt as _};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use waitroom_core::{
  message::Message,
  reasoner::Reasoner,
  session::{Session, SessionId, SessionPreview},
  store::ConversationStore,
  summary::Summary,
};
use waitroom_engine::summary_updates;

use crate::{AppState, error::ApiError, sessions::find_session};

/// SSE event name carrying a serialized [`Summary`].
pub const SUMMARY_EVENT: &str = "summary_update";

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /doctor/sessions`
pub async fn list<S, R>(
  State(state): State<AppState<S, R>>,
) -> Result<Json<Vec<SessionPreview>>, ApiError>
where
  S: ConversationStore,
  R: Reasoner,
{
  let previews = state
    .orchestrator
    .store()
    .list_open_sessions()
    .await
    .map_err(ApiError::store)?;
  Ok(Json(previews))
}

// ─── Detail ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionDetail {
  pub session:    Session,
  pub summary:    Option<Summary>,
  pub transcript: Vec<Message>,
}

/// `GET /doctor/sessions/{id}`
pub async fn detail<S, R>(
  State(state): State<AppState<S, R>>,
  Path(id): Path<SessionId>,
) -> Result<Json<SessionDetail>, ApiError>
where
  S: ConversationStore,
  R: Reasoner,
{
  let store = state.orchestrator.store();
  let session = find_session(&**store, id).await?;
  let summary = store.get_summary(id).await.map_err(ApiError::store)?;
  let transcript = store.transcript(id).await.map_err(ApiError::store)?;
  Ok(Json(SessionDetail { session, summary, transcript }))
}

// ─── Close ────────────────────────────────────────────────────────────────────

/// `POST /doctor/sessions/{id}/close`
pub async fn close<S, R>(
  State(state): State<AppState<S, R>>,
  Path(id): Path<SessionId>,
) -> Result<Json<Session>, ApiError>
where
  S: ConversationStore,
  R: Reasoner,
{
  let session = state
    .orchestrator
    .store()
    .close_session(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("session {id} not found")))?;
  info!(session = %id, "session closed");
  Ok(Json(session))
}

// ─── Stream ───────────────────────────────────────────────────────────────────

/// `GET /doctor/sessions/{id}/stream`
///
/// Sends the current summary (if any) on connect, then one event per
/// recomputation. The stream ends when the server shuts down.
pub async fn stream<S, R>(
  State(state): State<AppState<S, R>>,
  Path(id): Path<SessionId>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError>
where
  S: ConversationStore + 'static,
  R: Reasoner,
{
  let store = state.orchestrator.store().clone();
  find_session(&*store, id).await?;

  let events = summary_updates(store, &state.notifier, id)
    .take_until(state.shutdown.clone().cancelled_owned())
    .filter_map(move |summary| async move {
      match Event::default().event(SUMMARY_EVENT).json_data(&summary) {
        Ok(event) => Some(Ok(event)),
        Err(e) => {
          warn!(session = %id, error = %e, "failed to encode summary event");
          None
        }
      }
    });
  Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
