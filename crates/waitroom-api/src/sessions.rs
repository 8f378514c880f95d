//! Patient-facing handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sessions` | Optional body `{"message_cap":10}`; 201 with greeting |
//! | `GET`  | `/sessions/{id}` | 404 if not found |
//! | `GET`  | `/sessions/{id}/messages` | Full transcript |
//! | `POST` | `/sessions/{id}/messages` | Body `{"content":"..."}`; one turn |

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use waitroom_core::{
  message::Message,
  prompts::GREETING,
  reasoner::Reasoner,
  session::{Session, SessionId},
  store::ConversationStore,
};
use waitroom_engine::TurnReply;

use crate::{AppState, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateBody {
  pub message_cap: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
  pub session_id:  SessionId,
  pub message_cap: u32,
  pub greeting:    String,
}

/// `POST /sessions` with optional body `{"message_cap":10}`
pub async fn create<S, R>(
  State(state): State<AppState<S, R>>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: ConversationStore,
  R: Reasoner,
{
  let body: CreateBody = if body.iter().all(u8::is_ascii_whitespace) {
    CreateBody::default()
  } else {
    serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
  };
  if body.message_cap == Some(0) {
    return Err(ApiError::BadRequest("message_cap must be at least 1".into()));
  }

  let session = state.orchestrator.open_session(body.message_cap).await?;
  Ok((
    StatusCode::CREATED,
    Json(Created {
      session_id:  session.id,
      message_cap: session.message_cap,
      greeting:    GREETING.to_owned(),
    }),
  ))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

pub(crate) async fn find_session<S: ConversationStore>(
  store: &S,
  id: SessionId,
) -> Result<Session, ApiError> {
  store
    .get_session(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("session {id} not found")))
}

/// `GET /sessions/{id}`
pub async fn get_one<S, R>(
  State(state): State<AppState<S, R>>,
  Path(id): Path<SessionId>,
) -> Result<Json<Session>, ApiError>
where
  S: ConversationStore,
  R: Reasoner,
{
  let session = find_session(&**state.orchestrator.store(), id).await?;
  Ok(Json(session))
}

// ─── Transcript ───────────────────────────────────────────────────────────────

/// `GET /sessions/{id}/messages`
pub async fn transcript<S, R>(
  State(state): State<AppState<S, R>>,
  Path(id): Path<SessionId>,
) -> Result<Json<Vec<Message>>, ApiError>
where
  S: ConversationStore,
  R: Reasoner,
{
  let store = state.orchestrator.store();
  find_session(&**store, id).await?;
  let messages = store.transcript(id).await.map_err(ApiError::store)?;
  Ok(Json(messages))
}

// ─── Send ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SendBody {
  pub content: String,
}

/// `POST /sessions/{id}/messages` — body: `{"content":"..."}`
///
/// The turn runs on its own task. If the client goes away mid-turn the
/// reasoning call is cancelled, but the fallback reply is still persisted.
pub async fn send<S, R>(
  State(state): State<AppState<S, R>>,
  Path(id): Path<SessionId>,
  Json(body): Json<SendBody>,
) -> Result<Json<TurnReply>, ApiError>
where
  S: ConversationStore + 'static,
  R: Reasoner + 'static,
{
  let cancel = CancellationToken::new();
  let _disconnect = cancel.clone().drop_guard();

  let orchestrator = state.orchestrator.clone();
  let turn = tokio::spawn(async move {
    orchestrator.respond_cancellable(id, &body.content, cancel).await
  });

  let reply = turn.await.map_err(|e| ApiError::Internal(Box::new(e)))??;
  Ok(Json(reply))
}
