//! AWS Signature Version 4 query-string presigning for S3-compatible stores.
//!
//! Signing is computed locally from the secret key; no request is made to the
//! storage provider. The provider enforces `X-Amz-Date + X-Amz-Expires`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::{Error, Result, config::SigningConfig};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub(crate) const SERVICE: &str = "s3";
pub(crate) const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Longest lifetime SigV4 allows for a presigned URL (7 days).
pub const MAX_EXPIRY_SECS: u64 = 604_800;

/// A presigned GET URL and the window it is valid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedUrl {
  pub url:        String,
  pub issued_at:  DateTime<Utc>,
  pub expires_in: Duration,
}

impl PresignedUrl {
  pub fn expires_at(&self) -> DateTime<Utc> {
    self.issued_at + chrono::Duration::seconds(self.expires_in.as_secs() as i64)
  }
}

/// Presign a GET for `object_key`, valid for `expires_in` from `now`.
pub fn presign_get(
  config: &SigningConfig,
  object_key: &str,
  expires_in: Duration,
  now: DateTime<Utc>,
) -> Result<PresignedUrl> {
  let expires = expires_in.as_secs();
  if expires == 0 || expires > MAX_EXPIRY_SECS {
    return Err(Error::InvalidExpiry { got: expires, max: MAX_EXPIRY_SECS });
  }
  if object_key.is_empty() {
    return Err(Error::EmptyKey(object_key.to_string()));
  }

  let amz_date   = now.format("%Y%m%dT%H%M%SZ").to_string();
  let date_stamp = &amz_date[..8];
  let scope      = credential_scope(date_stamp, &config.region);
  let host       = config.host();

  let path = if config.path_style {
    format!("/{}/{}", encode_segment(&config.bucket), encode_path(object_key))
  } else {
    format!("/{}", encode_path(object_key))
  };

  let credential = format!("{}/{scope}", config.access_key);
  let expires    = expires.to_string();
  let params: Vec<(&str, &str)> = vec![
    ("X-Amz-Algorithm", ALGORITHM),
    ("X-Amz-Credential", &credential),
    ("X-Amz-Date", &amz_date),
    ("X-Amz-Expires", &expires),
    ("X-Amz-SignedHeaders", "host"),
  ];
  let query = canonical_query(&params);

  let request   = canonical_request(&host, &path, &query);
  let to_sign   = string_to_sign(&amz_date, &scope, &request);
  let signature = hex::encode(
    signing_mac(&config.secret_key, date_stamp, &config.region)?
      .chain_update(to_sign.as_bytes())
      .finalize()
      .into_bytes(),
  );

  Ok(PresignedUrl {
    url: format!(
      "{}://{host}{path}?{query}&X-Amz-Signature={signature}",
      config.endpoint.scheme
    ),
    issued_at: now,
    expires_in,
  })
}

// ─── Canonical forms ─────────────────────────────────────────────────────────

pub(crate) fn credential_scope(date_stamp: &str, region: &str) -> String {
  format!("{date_stamp}/{region}/{SERVICE}/aws4_request")
}

/// URI-encode one path segment (everything except unreserved characters).
fn encode_segment(segment: &str) -> String { urlencoding::encode(segment).into_owned() }

/// URI-encode an object key, keeping `/` separators.
fn encode_path(key: &str) -> String {
  key.split('/').map(encode_segment).collect::<Vec<_>>().join("/")
}

/// Encode and sort query parameters by key, then value.
pub(crate) fn canonical_query(params: &[(&str, &str)]) -> String {
  let mut encoded: Vec<(String, String)> = params
    .iter()
    .map(|(k, v)| (encode_segment(k), encode_segment(v)))
    .collect();
  encoded.sort();
  encoded
    .into_iter()
    .map(|(k, v)| format!("{k}={v}"))
    .collect::<Vec<_>>()
    .join("&")
}

pub(crate) fn canonical_request(host: &str, path: &str, query: &str) -> String {
  format!("GET\n{path}\n{query}\nhost:{host}\n\nhost\n{UNSIGNED_PAYLOAD}")
}

pub(crate) fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
  let digest = hex::encode(Sha256::digest(canonical_request.as_bytes()));
  format!("{ALGORITHM}\n{amz_date}\n{scope}\n{digest}")
}

/// A MAC keyed with the derived SigV4 signing key, ready for the
/// string-to-sign.
pub(crate) fn signing_mac(secret_key: &str, date_stamp: &str, region: &str) -> Result<HmacSha256> {
  let k_date    = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), date_stamp.as_bytes())?;
  let k_region  = hmac_sha256(&k_date, region.as_bytes())?;
  let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
  let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
  HmacSha256::new_from_slice(&k_signing).map_err(|_| Error::SigningKey)
}

fn hmac_sha256(key: &[u8], msg: &[u8]) -> Result<Vec<u8>> {
  let mac = HmacSha256::new_from_slice(key).map_err(|_| Error::SigningKey)?;
  Ok(mac.chain_update(msg).finalize().into_bytes().to_vec())
}
