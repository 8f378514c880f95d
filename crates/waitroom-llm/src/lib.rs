//! HTTP reasoning capability for Waitroom.
//!
//! [`OpenAiClient`] implements [`waitroom_core::reasoner::Reasoner`] against
//! any server speaking the OpenAI chat-completions protocol.

mod client;
mod extract;

pub mod error;

pub use client::{LlmConfig, OpenAiClient};
pub use error::{Error, Result};
