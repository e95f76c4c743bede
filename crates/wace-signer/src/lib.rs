//! Time-limited signed URLs for lesson videos in S3-compatible storage
//! (DigitalOcean Spaces by default).
//!
//! Pure synchronous; no HTTP or database dependencies. [`Signer`] is the
//! [`VideoSigner`] the content serializer calls once per exposed lesson.
//!
//! # Quick start
//!
//! ```no_run
//! use std::time::Duration;
//! use wace_signer::{FailureMode, Signer, SigningConfig};
//!
//! let config = SigningConfig::new("AK", "SK", "sfo3", "media").unwrap();
//! let signer = Signer::new(Some(config), FailureMode::Passthrough);
//! let url = signer
//!   .presign("https://media.sfo3.digitaloceanspaces.com/videos/a.mp4", Duration::from_secs(3600))
//!   .expect("credentials configured")
//!   .unwrap();
//! println!("{}", url.url);
//! ```

pub mod config;
pub mod error;
pub mod presign;
pub mod resolve;
pub mod verify;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use wace_core::policy::VideoSigner;

pub use config::{SigningConfig, SpacesSettings};
pub use error::{Error, Result, VerifyError};
pub use presign::PresignedUrl;

/// What to expose when a URL cannot be signed (missing credentials or a
/// signing error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
  /// Hand out the stored URL unchanged.
  #[default]
  Passthrough,
  /// Withhold the video.
  Withhold,
}

/// Presigns lesson video URLs with a fixed bucket configuration.
#[derive(Debug, Clone)]
pub struct Signer {
  config:     Option<SigningConfig>,
  on_failure: FailureMode,
}

impl Signer {
  pub fn new(config: Option<SigningConfig>, on_failure: FailureMode) -> Self {
    Self { config, on_failure }
  }

  /// Build from raw settings, logging once if signing is unavailable.
  pub fn from_settings(settings: SpacesSettings, on_failure: FailureMode) -> Self {
    let missing = settings.missing();
    let config = match settings.into_config() {
      Ok(Some(config)) => Some(config),
      Ok(None) => {
        tracing::warn!(
          ?missing,
          ?on_failure,
          "object storage credentials not configured; video URLs will not be signed"
        );
        None
      }
      Err(e) => {
        tracing::warn!(error = %e, ?on_failure, "invalid object storage settings; video URLs will not be signed");
        None
      }
    };
    Self::new(config, on_failure)
  }

  pub fn is_configured(&self) -> bool { self.config.is_some() }

  pub fn failure_mode(&self) -> FailureMode { self.on_failure }

  /// Presign `video_url` for `expires_in` starting now.
  pub fn presign(&self, video_url: &str, expires_in: Duration) -> Option<Result<PresignedUrl>> {
    self.presign_at(video_url, expires_in, Utc::now())
  }

  /// Presign against an explicit clock. `None` when no credentials are
  /// configured.
  pub fn presign_at(
    &self,
    video_url: &str,
    expires_in: Duration,
    now: DateTime<Utc>,
  ) -> Option<Result<PresignedUrl>> {
    let config = self.config.as_ref()?;
    Some(
      resolve::object_key(video_url)
        .and_then(|key| presign::presign_get(config, &key, expires_in, now)),
    )
  }

  /// The URL to expose, applying the failure mode.
  pub fn sign_at(&self, video_url: &str, expires_in: Duration, now: DateTime<Utc>) -> Option<String> {
    match self.presign_at(video_url, expires_in, now) {
      Some(Ok(signed)) => Some(signed.url),
      Some(Err(e)) => {
        tracing::warn!(video_url, error = %e, "error generating signed URL");
        self.fallback(video_url)
      }
      None => {
        tracing::debug!(video_url, "signing unavailable");
        self.fallback(video_url)
      }
    }
  }

  fn fallback(&self, video_url: &str) -> Option<String> {
    match self.on_failure {
      FailureMode::Passthrough => Some(video_url.to_string()),
      FailureMode::Withhold => None,
    }
  }
}

impl VideoSigner for Signer {
  fn sign(&self, video_url: &str, expires_in: Duration) -> Option<String> {
    self.sign_at(video_url, expires_in, Utc::now())
  }
}
