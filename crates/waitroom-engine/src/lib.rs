//! Conversation orchestration for Waitroom.
//!
//! - [`Orchestrator`] runs one patient turn: cap gate, context window,
//!   reasoning call, fallback, persistence.
//! - [`SummaryWorker`] recomputes summaries off the request path.
//! - [`Notifier`] tells dashboard observers that a summary changed.

mod orchestrator;
mod worker;

pub mod error;
pub mod notifier;

pub use error::{TurnError, UpstreamError};
pub use notifier::{Notifier, summary_updates};
pub use orchestrator::{EngineConfig, Orchestrator, TurnReply};
pub use worker::{SummaryQueue, SummaryWorker, summary_channel};
