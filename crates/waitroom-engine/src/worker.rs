//! Background summary recomputation.
//!
//! Turns hand session ids to a [`SummaryQueue`]; a single [`SummaryWorker`]
//! task drains it. The worker has its own cancellation scope, so a finished
//! or aborted request never cancels a recomputation it triggered.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use waitroom_core::{
  message::render_transcript,
  reasoner::Reasoner,
  session::SessionId,
  store::ConversationStore,
  summary::{Extraction, Summary, merge},
};

use crate::Notifier;

/// Producer side of the recomputation queue. Cheap to clone.
#[derive(Clone)]
pub struct SummaryQueue {
  tx: mpsc::UnboundedSender<SessionId>,
}

impl SummaryQueue {
  /// Ask for `id`'s summary to be recomputed. Never blocks, never fails the
  /// caller; a stopped worker only produces a warning.
  pub fn enqueue(&self, id: SessionId) {
    if self.tx.send(id).is_err() {
      warn!(session = %id, "summary worker is gone; recomputation dropped");
    }
  }
}

/// Consumer side: recomputes, persists and announces summaries.
pub struct SummaryWorker<S, R> {
  store:    Arc<S>,
  reasoner: Arc<R>,
  notifier: Notifier,
  rx:       mpsc::UnboundedReceiver<SessionId>,
}

/// Build a connected queue/worker pair.
pub fn summary_channel<S, R>(
  store: Arc<S>,
  reasoner: Arc<R>,
  notifier: Notifier,
) -> (SummaryQueue, SummaryWorker<S, R>) {
  let (tx, rx) = mpsc::unbounded_channel();
  (SummaryQueue { tx }, SummaryWorker { store, reasoner, notifier, rx })
}

impl<S, R> SummaryWorker<S, R>
where
  S: ConversationStore,
  R: Reasoner,
{
  /// Process queued sessions until `shutdown` fires or every queue handle is
  /// dropped. On shutdown, jobs already queued are still processed.
  pub async fn run(mut self, shutdown: CancellationToken) {
    info!("summary worker started");
    loop {
      tokio::select! {
        biased;
        _ = shutdown.cancelled() => break,
        next = self.rx.recv() => match next {
          Some(id) => self.process(id).await,
          None => {
            info!("summary queue closed; worker stopping");
            return;
          }
        },
      }
    }

    self.rx.close();
    while let Some(id) = self.rx.recv().await {
      self.process(id).await;
    }
    info!("summary worker stopped");
  }

  async fn process(&self, id: SessionId) {
    match self.recompute(id).await {
      Ok(summary) => debug!(
        session = %id,
        key_points = summary.key_points.len(),
        "summary updated"
      ),
      Err(e) => error!(session = %id, error = %e, "summary recomputation failed"),
    }
  }

  /// Extract from the full transcript, merge into the stored summary, persist
  /// and publish. Extraction failure records the degraded summary instead.
  pub async fn recompute(&self, id: SessionId) -> Result<Summary, S::Error> {
    let transcript = self.store.transcript(id).await?;

    let fresh = match self.reasoner.extract(render_transcript(&transcript)).await {
      Ok(extraction) => extraction,
      Err(e) => {
        warn!(session = %id, error = %e, "extraction failed; recording degraded summary");
        Extraction::degraded()
      }
    };

    let old = self.store.get_summary(id).await?;
    let summary = merge(id, old, fresh, Utc::now());
    self.store.upsert_summary(summary.clone()).await?;
    self.notifier.publish(id);
    Ok(summary)
  }
}
