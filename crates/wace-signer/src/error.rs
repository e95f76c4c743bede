//! Error types for `wace-signer`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not an absolute URL: {0:?}")]
  InvalidUrl(String),

  #[error("URL has an empty object key: {0:?}")]
  EmptyKey(String),

  #[error("invalid endpoint {0:?}")]
  InvalidEndpoint(String),

  #[error("expiry must be between 1 and {max} seconds, got {got}")]
  InvalidExpiry { got: u64, max: u64 },

  #[error("invalid signing key")]
  SigningKey,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a presigned URL was rejected by [`crate::verify::verify`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
  #[error("malformed presigned URL: {0}")]
  Malformed(String),

  #[error("missing query parameter {0}")]
  MissingParam(&'static str),

  #[error("credential scope does not match this bucket")]
  CredentialMismatch,

  #[error("presigned URL has expired")]
  Expired,

  #[error("signature does not match")]
  SignatureMismatch,
}
