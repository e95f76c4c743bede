//! Server wiring for the exam-prep content service.
//!
//! Owns the deserialised configuration and assembles the HTTP application
//! around [`wace_api::api_router`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;

use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use wace_api::ApiState;
use wace_core::{content::ContentOptions, policy::VideoSigner, store::CourseStore};
use wace_signer::{FailureMode, SpacesSettings, presign::MAX_EXPIRY_SECS};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `WACE_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  #[serde(default)]
  pub content:    ContentConfig,
  /// Object storage credentials; any missing field disables signing.
  #[serde(default)]
  pub spaces:     SpacesSettings,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("wace.db") }

/// `[content]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
  pub video_url_ttl_secs:      u64,
  pub hide_unpublished_topics: bool,
  pub signing_failure:         FailureMode,
}

impl Default for ContentConfig {
  fn default() -> Self {
    Self {
      video_url_ttl_secs:      3600,
      hide_unpublished_topics: false,
      signing_failure:         FailureMode::Passthrough,
    }
  }
}

impl ContentConfig {
  pub fn options(&self) -> anyhow::Result<ContentOptions> {
    if self.video_url_ttl_secs == 0 || self.video_url_ttl_secs > MAX_EXPIRY_SECS {
      anyhow::bail!(
        "content.video_url_ttl_secs must be between 1 and {MAX_EXPIRY_SECS}, got {}",
        self.video_url_ttl_secs
      );
    }
    Ok(ContentOptions {
      video_ttl:               Duration::from_secs(self.video_url_ttl_secs),
      hide_unpublished_topics: self.hide_unpublished_topics,
    })
  }
}

/// Layer `WACE_*` environment variables over the optional TOML file at
/// `file`. Nested keys use `__`, so `WACE_SPACES__ACCESS_KEY` sets
/// `spaces.access_key`. `env` replaces the process environment when given.
pub fn load_config(
  file: &Path,
  env: Option<config::Map<String, String>>,
) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(file).required(false))
    .add_source(
      config::Environment::with_prefix("WACE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(env),
    )
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

// ─── Application ─────────────────────────────────────────────────────────────

/// The full HTTP application: the JSON API under `/api`, with request tracing.
pub fn app<S>(store: Arc<S>, signer: Arc<dyn VideoSigner>, content: ContentOptions) -> Router
where
  S: CourseStore + 'static,
{
  Router::new()
    .nest("/api", wace_api::api_router(ApiState::new(store, signer, content)))
    .layer(TraceLayer::new_for_http())
}
