//! Storage-side check of a presigned URL.
//!
//! Mirrors what the object store does on receipt: recompute the signature
//! from the URL's own parameters and reject it once `X-Amz-Date +
//! X-Amz-Expires` has passed. Used to exercise the signer end to end without
//! a live bucket.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use hmac::Mac;
use http::Uri;

use crate::{
  config::SigningConfig,
  error::VerifyError,
  presign::{ALGORITHM, canonical_query, canonical_request, credential_scope, signing_mac, string_to_sign},
};

/// Parameters pulled out of a presigned URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedParams {
  pub host:       String,
  /// Percent-encoded request path, as sent.
  pub path:       String,
  pub credential: String,
  pub issued_at:  DateTime<Utc>,
  pub expires:    u64,
  pub signature:  String,
  pairs:          Vec<(String, String)>,
}

impl PresignedParams {
  pub fn parse(url: &str) -> Result<Self, VerifyError> {
    let uri: Uri = url
      .parse()
      .map_err(|e: http::uri::InvalidUri| VerifyError::Malformed(e.to_string()))?;
    let host = uri
      .authority()
      .ok_or_else(|| VerifyError::Malformed("missing host".into()))?
      .as_str()
      .to_string();
    let query = uri
      .query()
      .ok_or_else(|| VerifyError::Malformed("missing query".into()))?;

    let mut pairs = Vec::new();
    for part in query.split('&').filter(|p| !p.is_empty()) {
      let (k, v) = part.split_once('=').unwrap_or((part, ""));
      let k = urlencoding::decode(k).map_err(|e| VerifyError::Malformed(e.to_string()))?;
      let v = urlencoding::decode(v).map_err(|e| VerifyError::Malformed(e.to_string()))?;
      pairs.push((k.into_owned(), v.into_owned()));
    }

    let get = |name: &'static str| {
      pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .ok_or(VerifyError::MissingParam(name))
    };

    if get("X-Amz-Algorithm")? != ALGORITHM {
      return Err(VerifyError::Malformed("unsupported algorithm".into()));
    }
    let credential = get("X-Amz-Credential")?;
    let amz_date   = get("X-Amz-Date")?;
    let issued_at  = NaiveDateTime::parse_from_str(&amz_date, "%Y%m%dT%H%M%SZ")
      .map_err(|e| VerifyError::Malformed(e.to_string()))?
      .and_utc();
    let expires = get("X-Amz-Expires")?
      .parse()
      .map_err(|_| VerifyError::Malformed("X-Amz-Expires is not a number".into()))?;
    let signature = get("X-Amz-Signature")?;

    pairs.retain(|(k, _)| k != "X-Amz-Signature");

    Ok(Self {
      host,
      path: uri.path().to_string(),
      credential,
      issued_at,
      expires,
      signature,
      pairs,
    })
  }

  pub fn expires_at(&self) -> DateTime<Utc> {
    self.issued_at + TimeDelta::seconds(self.expires as i64)
  }
}

/// Accept or reject `url` at time `now` for the bucket described by `config`.
pub fn verify(config: &SigningConfig, url: &str, now: DateTime<Utc>) -> Result<(), VerifyError> {
  let params     = PresignedParams::parse(url)?;
  let date_stamp = params.issued_at.format("%Y%m%d").to_string();
  let scope      = credential_scope(&date_stamp, &config.region);

  if params.credential != format!("{}/{scope}", config.access_key) {
    return Err(VerifyError::CredentialMismatch);
  }
  if now > params.expires_at() {
    return Err(VerifyError::Expired);
  }

  let pairs: Vec<(&str, &str)> =
    params.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
  let request = canonical_request(&params.host, &params.path, &canonical_query(&pairs));
  let amz_date = params.issued_at.format("%Y%m%dT%H%M%SZ").to_string();
  let to_sign = string_to_sign(&amz_date, &scope, &request);

  let expected = hex::decode(&params.signature).map_err(|_| VerifyError::SignatureMismatch)?;
  signing_mac(&config.secret_key, &date_stamp, &config.region)
    .map_err(|_| VerifyError::SignatureMismatch)?
    .chain_update(to_sign.as_bytes())
    .verify_slice(&expected)
    .map_err(|_| VerifyError::SignatureMismatch)
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use chrono::TimeZone;

  use super::*;
  use crate::presign::presign_get;

  fn config() -> SigningConfig {
    SigningConfig::new("AKTEST", "s3cr3t", "sfo3", "media").unwrap()
  }

  fn issued() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() }

  #[test]
  fn fresh_url_is_accepted_until_expiry() {
    let signed = presign_get(&config(), "videos/a.mp4", Duration::from_secs(3600), issued()).unwrap();
    assert_eq!(verify(&config(), &signed.url, issued()), Ok(()));
    assert_eq!(
      verify(&config(), &signed.url, issued() + TimeDelta::seconds(3600)),
      Ok(())
    );
  }

  #[test]
  fn url_is_rejected_once_expiry_elapses() {
    let signed = presign_get(&config(), "videos/a.mp4", Duration::from_secs(3600), issued()).unwrap();
    assert_eq!(
      verify(&config(), &signed.url, issued() + TimeDelta::seconds(3601)),
      Err(VerifyError::Expired)
    );
  }

  #[test]
  fn parsed_expiry_matches_request() {
    let signed = presign_get(&config(), "videos/a.mp4", Duration::from_secs(900), issued()).unwrap();
    let params = PresignedParams::parse(&signed.url).unwrap();
    assert_eq!(params.expires, 900);
    assert_eq!(params.issued_at, issued());
    assert_eq!(params.path, "/videos/a.mp4");
    assert_eq!(params.host, "media.sfo3.digitaloceanspaces.com");
  }

  #[test]
  fn tampered_expiry_breaks_signature() {
    let signed = presign_get(&config(), "videos/a.mp4", Duration::from_secs(60), issued()).unwrap();
    let tampered = signed.url.replace("X-Amz-Expires=60", "X-Amz-Expires=604800");
    assert_eq!(
      verify(&config(), &tampered, issued() + TimeDelta::seconds(120)),
      Err(VerifyError::SignatureMismatch)
    );
  }

  #[test]
  fn other_key_is_rejected() {
    let signed = presign_get(&config(), "videos/a.mp4", Duration::from_secs(60), issued()).unwrap();
    let other = signed.url.replace("/videos/a.mp4", "/videos/b.mp4");
    assert_eq!(verify(&config(), &other, issued()), Err(VerifyError::SignatureMismatch));
  }

  #[test]
  fn wrong_secret_is_rejected() {
    let signed = presign_get(&config(), "videos/a.mp4", Duration::from_secs(60), issued()).unwrap();
    let imposter = SigningConfig::new("AKTEST", "different", "sfo3", "media").unwrap();
    assert_eq!(verify(&imposter, &signed.url, issued()), Err(VerifyError::SignatureMismatch));
  }
}
