//! Object-storage signing configuration.
//!
//! Built once at startup and shared by reference; nothing here re-reads the
//! environment.

use std::fmt;

use http::Uri;
use serde::Deserialize;

use crate::{Error, Result};

/// Raw `[spaces]` settings as they arrive from config/env. Every field is
/// optional so a missing credential is reported, not a deserialisation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpacesSettings {
  pub access_key: Option<String>,
  pub secret_key: Option<String>,
  pub region:     Option<String>,
  pub bucket:     Option<String>,
  /// Overrides `https://{region}.digitaloceanspaces.com`.
  pub endpoint:   Option<String>,
  #[serde(default)]
  pub path_style: bool,
}

impl SpacesSettings {
  /// Names of required settings that are absent or blank.
  pub fn missing(&self) -> Vec<&'static str> {
    let blank = |v: &Option<String>| v.as_deref().is_none_or(|s| s.trim().is_empty());
    [
      ("access_key", &self.access_key),
      ("secret_key", &self.secret_key),
      ("region", &self.region),
      ("bucket", &self.bucket),
    ]
    .into_iter()
    .filter(|(_, v)| blank(v))
    .map(|(name, _)| name)
    .collect()
  }

  /// Build a [`SigningConfig`], or `Ok(None)` if any credential is missing.
  pub fn into_config(self) -> Result<Option<SigningConfig>> {
    if !self.missing().is_empty() {
      return Ok(None);
    }
    let (Some(access_key), Some(secret_key), Some(region), Some(bucket)) =
      (self.access_key, self.secret_key, self.region, self.bucket)
    else {
      return Ok(None);
    };

    let mut config = SigningConfig::new(access_key, secret_key, region, bucket)?;
    if let Some(endpoint) = self.endpoint.filter(|e| !e.trim().is_empty()) {
      config = config.with_endpoint(&endpoint)?;
    }
    Ok(Some(config.with_path_style(self.path_style)))
  }
}

/// Scheme and authority of the storage endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Endpoint {
  pub scheme:    String,
  pub authority: String,
}

impl Endpoint {
  fn parse(url: &str) -> Result<Self> {
    let uri: Uri = url
      .trim()
      .parse()
      .map_err(|_| Error::InvalidEndpoint(url.to_string()))?;
    match (uri.scheme_str(), uri.authority()) {
      (Some(scheme), Some(authority)) => Ok(Self {
        scheme:    scheme.to_string(),
        authority: authority.as_str().to_ascii_lowercase(),
      }),
      _ => Err(Error::InvalidEndpoint(url.to_string())),
    }
  }
}

/// Credentials and addressing for one bucket.
#[derive(Clone)]
pub struct SigningConfig {
  pub(crate) access_key: String,
  pub(crate) secret_key: String,
  pub(crate) region:     String,
  pub(crate) bucket:     String,
  pub(crate) endpoint:   Endpoint,
  pub(crate) path_style: bool,
}

impl SigningConfig {
  pub fn new(
    access_key: impl Into<String>,
    secret_key: impl Into<String>,
    region: impl Into<String>,
    bucket: impl Into<String>,
  ) -> Result<Self> {
    let region   = region.into();
    let endpoint = Endpoint::parse(&format!("https://{region}.digitaloceanspaces.com"))?;
    Ok(Self {
      access_key: access_key.into(),
      secret_key: secret_key.into(),
      region,
      bucket: bucket.into(),
      endpoint,
      path_style: false,
    })
  }

  pub fn with_endpoint(mut self, url: &str) -> Result<Self> {
    self.endpoint = Endpoint::parse(url)?;
    Ok(self)
  }

  /// Address objects as `{endpoint}/{bucket}/{key}` instead of
  /// `{bucket}.{endpoint}/{key}`.
  pub fn with_path_style(mut self, path_style: bool) -> Self {
    self.path_style = path_style;
    self
  }

  pub fn bucket(&self) -> &str { &self.bucket }

  pub fn region(&self) -> &str { &self.region }

  /// The `Host` the presigned request is addressed to.
  pub(crate) fn host(&self) -> String {
    if self.path_style {
      self.endpoint.authority.clone()
    } else {
      format!("{}.{}", self.bucket, self.endpoint.authority)
    }
  }
}

impl fmt::Debug for SigningConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SigningConfig")
      .field("access_key", &self.access_key)
      .field("secret_key", &"<redacted>")
      .field("region", &self.region)
      .field("bucket", &self.bucket)
      .field("endpoint", &self.endpoint)
      .field("path_style", &self.path_style)
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn full() -> SpacesSettings {
    SpacesSettings {
      access_key: Some("AK".into()),
      secret_key: Some("SK".into()),
      region:     Some("sfo3".into()),
      bucket:     Some("media".into()),
      endpoint:   None,
      path_style: false,
    }
  }

  #[test]
  fn default_endpoint_is_virtual_hosted_spaces() {
    let config = full().into_config().unwrap().unwrap();
    assert_eq!(config.host(), "media.sfo3.digitaloceanspaces.com");
    assert_eq!(config.endpoint.scheme, "https");
  }

  #[test]
  fn path_style_keeps_endpoint_host() {
    let mut settings = full();
    settings.endpoint   = Some("http://localhost:9000".into());
    settings.path_style = true;
    let config = settings.into_config().unwrap().unwrap();
    assert_eq!(config.host(), "localhost:9000");
  }

  #[test]
  fn blank_credentials_are_missing() {
    let mut settings = full();
    settings.secret_key = Some("   ".into());
    settings.bucket     = None;
    assert_eq!(settings.missing(), vec!["secret_key", "bucket"]);
    assert!(settings.into_config().unwrap().is_none());
  }

  #[test]
  fn debug_redacts_secret() {
    let config = full().into_config().unwrap().unwrap();
    let shown = format!("{config:?}");
    assert!(!shown.contains("\"SK\""), "{shown}");
  }
}
