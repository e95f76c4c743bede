//! Token authentication: request extractors, token issue, password hashing.
//!
//! Clients present `Authorization: Token <key>` (or `Bearer <key>`). Only the
//! SHA-256 digest of a key is ever stored or looked up.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::{self, SaltString},
};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use wace_core::{
  account::{Requester, User, UserId},
  store::CourseStore,
};

use crate::{ApiError, state::ApiState};

const TOKEN_BYTES: usize = 32;

// ─── Passwords ───────────────────────────────────────────────────────────────

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Check `password` against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    .unwrap_or(false)
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

/// Mint a fresh token for `user_id` and persist its digest. Returns the
/// plaintext token for the client.
pub async fn issue_token<S: CourseStore>(store: &S, user_id: UserId) -> Result<String, ApiError> {
  let mut bytes = [0u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut bytes);
  let token = hex::encode(bytes);

  store
    .issue_token(user_id, token_digest(&token))
    .await
    .map_err(ApiError::store)?;
  Ok(token)
}

/// The token in the `Authorization` header, if any.
pub fn presented_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, key) = value.trim().split_once(' ')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  (scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer")).then_some(key)
}

async fn resolve<S: CourseStore>(
  headers: &HeaderMap,
  store: &S,
) -> Result<Option<(User, String)>, ApiError> {
  let Some(token) = presented_token(headers) else {
    return Ok(None);
  };
  let digest = token_digest(token);
  let user = store
    .user_for_token(&digest)
    .await
    .map_err(ApiError::store)?;
  Ok(user.map(|u| (u, digest)))
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Whoever is asking. Never rejects; a missing or unknown token is anonymous.
pub struct Viewer(pub Option<User>);

impl Viewer {
  pub fn requester(&self) -> Requester {
    self.0.as_ref().map_or(Requester::Anonymous, |u| Requester::User(u.user_id))
  }
}

impl<S> FromRequestParts<ApiState<S>> for Viewer
where
  S: CourseStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = resolve(&parts.headers, state.store.as_ref()).await?;
    if user.is_none() && presented_token(&parts.headers).is_some() {
      tracing::debug!("unrecognised token; treating request as anonymous");
    }
    Ok(Self(user.map(|(u, _)| u)))
  }
}

/// An authenticated user; rejects with 401 otherwise.
pub struct AuthUser {
  pub user:   User,
  /// Digest of the token this request was made with.
  pub digest: String,
}

impl<S> FromRequestParts<ApiState<S>> for AuthUser
where
  S: CourseStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let (user, digest) = resolve(&parts.headers, state.store.as_ref())
      .await?
      .ok_or_else(ApiError::unauthenticated)?;
    Ok(Self { user, digest })
  }
}
