//! Async HTTP client for OpenAI-compatible chat-completion endpoints.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use waitroom_core::{
  prompts::SUMMARY_INSTRUCTION,
  reasoner::Reasoner,
  summary::Extraction,
  window::ChatMessage,
};

use crate::{Error, Result, extract::parse_extraction};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Connection settings for the completion service.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
  #[serde(default = "default_base_url")]
  pub base_url:             String,
  #[serde(default)]
  pub api_key:              String,
  #[serde(default = "default_chat_model")]
  pub chat_model:           String,
  /// Model used for extraction; falls back to `chat_model`.
  #[serde(default)]
  pub summary_model:        Option<String>,
  #[serde(default = "default_temperature")]
  pub temperature:          f32,
  #[serde(default = "default_request_timeout_secs")]
  pub request_timeout_secs: u64,
}

fn default_base_url() -> String { "https://api.openai.com/v1".to_owned() }
fn default_chat_model() -> String { "gpt-4o-mini".to_owned() }
fn default_temperature() -> f32 { 0.2 }
fn default_request_timeout_secs() -> u64 { 60 }

impl Default for LlmConfig {
  fn default() -> Self {
    Self {
      base_url:             default_base_url(),
      api_key:              String::new(),
      chat_model:           default_chat_model(),
      summary_model:        None,
      temperature:          default_temperature(),
      request_timeout_secs: default_request_timeout_secs(),
    }
  }
}

impl LlmConfig {
  pub fn summary_model(&self) -> &str {
    self.summary_model.as_deref().unwrap_or(&self.chat_model)
  }
}

// ─── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
  model:           &'a str,
  messages:        &'a [ChatMessage],
  temperature:     f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
  #[serde(rename = "type")]
  kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
  message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
  #[serde(default)]
  content: Option<String>,
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiClient {
  client: Client,
  config: LlmConfig,
}

impl OpenAiClient {
  pub fn new(config: LlmConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }

  async fn chat(
    &self,
    model: &str,
    messages: &[ChatMessage],
    json_reply: bool,
  ) -> Result<String> {
    debug!(model, messages = messages.len(), "requesting completion");

    let body = CompletionRequest {
      model,
      messages,
      temperature: self.config.temperature,
      response_format: json_reply.then_some(ResponseFormat { kind: "json_object" }),
    };

    let mut req = self.client.post(self.url()).json(&body);
    if !self.config.api_key.is_empty() {
      req = req.bearer_auth(&self.config.api_key);
    }

    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { status, body });
    }

    let parsed: CompletionResponse = resp.json().await?;
    parsed
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .filter(|text| !text.trim().is_empty())
      .ok_or(Error::EmptyCompletion)
  }
}

impl Reasoner for OpenAiClient {
  type Error = Error;

  async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
    self.chat(&self.config.chat_model, &messages, false).await
  }

  async fn extract(&self, transcript: String) -> Result<Extraction> {
    let messages = [
      ChatMessage::system(SUMMARY_INSTRUCTION),
      ChatMessage::user(transcript),
    ];
    let text = self
      .chat(self.config.summary_model(), &messages, true)
      .await?;
    parse_extraction(&text)
  }
}
