//! API error type and [`axum::response::IntoResponse`] implementation.

use std::collections::BTreeMap;

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  /// Per-field validation messages, keyed by request field name.
  #[error("validation failed on {} field(s)", .0.len())]
  Validation(BTreeMap<&'static str, String>),

  #[error("missing required fields: {0:?}")]
  MissingFields(Vec<&'static str>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  /// Box a backend error into [`ApiError::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn unauthenticated() -> Self { Self::Unauthorized("Authentication required".into()) }
}

impl From<wace_core::Error> for ApiError {
  fn from(e: wace_core::Error) -> Self {
    use wace_core::Error as E;
    match e {
      E::ProgrammeNotFound(_) => Self::NotFound("Programme not found".into()),
      E::SubjectNotFound(_) => Self::NotFound("Subject not found".into()),
      E::TopicNotFound(_) => Self::NotFound("Topic not found".into()),
      E::LessonNotFound(_) => Self::NotFound("Lesson not found".into()),
      E::StudentProfileNotFound(_) => Self::NotFound("Student profile not found".into()),
      E::PaperNotFound(_) => Self::NotFound("Paper not found".into()),
      other => Self::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "error": m })),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "error": m })),
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, json!({ "error": m })),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, json!({ "error": m })),
      ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, json!({ "errors": errors })),
      ApiError::MissingFields(fields) => (
        StatusCode::BAD_REQUEST,
        json!({ "error": "Missing required fields", "missing_fields": fields }),
      ),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": e.to_string() }))
      }
      ApiError::Internal(m) => {
        tracing::error!(error = %m, "internal error");
        (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": m }))
      }
    };
    (status, Json(body)).into_response()
  }
}
