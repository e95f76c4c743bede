//! Error types for `wace-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("programme not found: {0}")]
  ProgrammeNotFound(i64),

  #[error("subject not found: {0}")]
  SubjectNotFound(i64),

  #[error("topic not found: {0}")]
  TopicNotFound(i64),

  #[error("lesson not found: {0}")]
  LessonNotFound(i64),

  #[error("user {0} has no student profile")]
  StudentProfileNotFound(i64),

  #[error("past paper not found: {0}")]
  PaperNotFound(i64),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error into [`Error::Store`].
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::ProgrammeNotFound(_)
        | Self::SubjectNotFound(_)
        | Self::TopicNotFound(_)
        | Self::LessonNotFound(_)
        | Self::StudentProfileNotFound(_)
        | Self::PaperNotFound(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
