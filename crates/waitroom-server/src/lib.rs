//! Configuration and wiring for the Waitroom server binary.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use serde::Deserialize;
use waitroom_engine::EngineConfig;
use waitroom_llm::LlmConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `WAITROOM_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  /// Patient messages allowed per session unless the client asks otherwise.
  #[serde(default = "default_message_cap")]
  pub message_cap:            u32,
  #[serde(default = "default_context_window_hours")]
  pub context_window_hours:   i64,
  #[serde(default = "default_reasoning_timeout_secs")]
  pub reasoning_timeout_secs: u64,
  #[serde(default)]
  pub llm:                    LlmConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("waitroom.sqlite3") }
fn default_message_cap() -> u32 { 50 }
fn default_context_window_hours() -> i64 { 168 }
fn default_reasoning_timeout_secs() -> u64 { 30 }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn engine_config(&self) -> EngineConfig {
    EngineConfig {
      default_message_cap: self.message_cap.max(1),
      context_window:      chrono::Duration::hours(self.context_window_hours.max(0)),
      reasoning_timeout:   Duration::from_secs(self.reasoning_timeout_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
