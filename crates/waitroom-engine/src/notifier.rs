//! Best-effort "summary changed" notifications.
//!
//! This is a latest-wins signal, not a queue. Observers always start from the
//! current stored summary, so a missed or lagged notification costs nothing.

use std::sync::Arc;

use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use waitroom_core::{session::SessionId, store::ConversationStore, summary::Summary};

const DEFAULT_CAPACITY: usize = 64;

/// Fan-out of session ids whose summary was just rewritten.
///
/// Cheap to clone; all clones share one channel.
#[derive(Clone)]
pub struct Notifier {
  tx: broadcast::Sender<SessionId>,
}

impl Notifier {
  pub fn new(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel(capacity.max(1));
    Self { tx }
  }

  /// Fire and forget. Publishing with nobody listening is fine.
  pub fn publish(&self, id: SessionId) { let _ = self.tx.send(id); }

  pub fn subscribe(&self) -> broadcast::Receiver<SessionId> { self.tx.subscribe() }
}

impl Default for Notifier {
  fn default() -> Self { Self::new(DEFAULT_CAPACITY) }
}

/// Stream of summaries for one session: the current one first (if any), then
/// a fresh read after every notification for that session.
///
/// Store errors are logged and skipped; the stream ends when the notifier is
/// dropped.
pub fn summary_updates<S>(
  store: Arc<S>,
  notifier: &Notifier,
  id: SessionId,
) -> impl Stream<Item = Summary> + Send + 'static + use<S>
where
  S: ConversationStore + 'static,
{
  // Subscribe before the initial read so nothing published in between is lost.
  let mut rx = notifier.subscribe();

  async_stream::stream! {
    if let Some(summary) = read(&*store, id).await {
      yield summary;
    }

    loop {
      match rx.recv().await {
        Ok(changed) if changed != id => continue,
        Ok(_) | Err(RecvError::Lagged(_)) => {
          if let Some(summary) = read(&*store, id).await {
            yield summary;
          }
        }
        Err(RecvError::Closed) => break,
      }
    }
  }
}

async fn read<S: ConversationStore>(store: &S, id: SessionId) -> Option<Summary> {
  match store.get_summary(id).await {
    Ok(summary) => summary,
    Err(e) => {
      warn!(session = %id, error = %e, "failed to read summary for observer");
      None
    }
  }
}
