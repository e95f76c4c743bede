//! Object-key extraction from stored video URLs.

use http::Uri;

use crate::{Error, Result};

/// Extract the object key from an absolute URL: its path, without leading
/// slashes, percent-decoded. Whether the object exists is left to the
/// storage provider.
pub fn object_key(video_url: &str) -> Result<String> {
  let uri: Uri = video_url
    .trim()
    .parse()
    .map_err(|_| Error::InvalidUrl(video_url.to_string()))?;
  if uri.scheme().is_none() || uri.authority().is_none() {
    return Err(Error::InvalidUrl(video_url.to_string()));
  }

  let raw = uri.path().trim_start_matches('/');
  let key = urlencoding::decode(raw)
    .map_err(|_| Error::InvalidUrl(video_url.to_string()))?
    .into_owned();

  if key.is_empty() {
    return Err(Error::EmptyKey(video_url.to_string()));
  }
  Ok(key)
}
