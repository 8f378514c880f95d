//! JSON REST API for Waitroom.
//!
//! Exposes an axum [`Router`] with the patient chat endpoints and the
//! clinician dashboard, backed by any [`ConversationStore`] and [`Reasoner`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", waitroom_api::api_router(orchestrator, notifier, shutdown.clone()))
//! ```

pub mod doctor;
pub mod error;
pub mod sessions;

use axum::{
  Router,
  routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use waitroom_core::{reasoner::Reasoner, store::ConversationStore};
use waitroom_engine::{Notifier, Orchestrator};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S, R> {
  pub orchestrator: Orchestrator<S, R>,
  pub notifier:     Notifier,
  /// Ends long-lived responses (the summary stream) so graceful shutdown can
  /// finish.
  pub shutdown:     CancellationToken,
}

impl<S, R> Clone for AppState<S, R> {
  fn clone(&self) -> Self {
    Self {
      orchestrator: self.orchestrator.clone(),
      notifier:     self.notifier.clone(),
      shutdown:     self.shutdown.clone(),
    }
  }
}

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type. Cancel `shutdown` when the server starts draining.
pub fn api_router<S, R>(
  orchestrator: Orchestrator<S, R>,
  notifier: Notifier,
  shutdown: CancellationToken,
) -> Router<()>
where
  S: ConversationStore + 'static,
  R: Reasoner + 'static,
{
  Router::new()
    // Patient
    .route("/sessions", post(sessions::create::<S, R>))
    .route("/sessions/{id}", get(sessions::get_one::<S, R>))
    .route(
      "/sessions/{id}/messages",
      get(sessions::transcript::<S, R>).post(sessions::send::<S, R>),
    )
    // Dashboard
    .route("/doctor/sessions", get(doctor::list::<S, R>))
    .route("/doctor/sessions/{id}", get(doctor::detail::<S, R>))
    .route("/doctor/sessions/{id}/close", post(doctor::close::<S, R>))
    .route("/doctor/sessions/{id}/stream", get(doctor::stream::<S, R>))
    .route("/health", get(health))
    .with_state(AppState { orchestrator, notifier, shutdown })
}

/// `GET /health`
async fn health() -> &'static str { "ok" }
