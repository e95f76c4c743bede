//! Handlers for lesson completion and topic progress. All require a token.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/lessons/{id}/complete` | Idempotent; reports whether the row was new |
//! | `DELETE` | `/lessons/{id}/uncomplete` | `success: false` when nothing to remove |
//! | `GET`    | `/topics/{id}/progress` | Per-lesson completion for the caller |

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use wace_core::{
  catalog::{LessonId, TopicId},
  progress::{self, MarkOutcome, TopicProgress, UnmarkOutcome},
  store::CourseStore,
};

use crate::{ApiError, auth::AuthUser, state::ApiState};

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
  pub success:      bool,
  pub message:      &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub completed_at: Option<DateTime<Utc>>,
}

/// `POST /lessons/{id}/complete`
pub async fn mark_complete<S>(
  State(state): State<ApiState<S>>,
  Path(lesson_id): Path<LessonId>,
  auth: AuthUser,
) -> Result<Json<CompletionResponse>, ApiError>
where
  S: CourseStore + 'static,
{
  let outcome = progress::mark_complete(state.store.as_ref(), auth.user.user_id, lesson_id).await?;
  let message = match outcome {
    MarkOutcome::Created(_) => "Lesson marked as complete",
    MarkOutcome::AlreadyCompleted(_) => "Lesson already completed",
  };
  Ok(Json(CompletionResponse {
    success: true,
    message,
    completed_at: Some(outcome.completion().completed_at),
  }))
}

/// `DELETE /lessons/{id}/uncomplete`
pub async fn unmark_complete<S>(
  State(state): State<ApiState<S>>,
  Path(lesson_id): Path<LessonId>,
  auth: AuthUser,
) -> Result<Json<CompletionResponse>, ApiError>
where
  S: CourseStore + 'static,
{
  let outcome =
    progress::unmark_complete(state.store.as_ref(), auth.user.user_id, lesson_id).await?;
  let (success, message) = match outcome {
    UnmarkOutcome::Removed => (true, "Lesson unmarked as complete"),
    UnmarkOutcome::WasNotComplete => (false, "Lesson was not marked as complete"),
  };
  Ok(Json(CompletionResponse { success, message, completed_at: None }))
}

/// `GET /topics/{id}/progress`
pub async fn topic_progress<S>(
  State(state): State<ApiState<S>>,
  Path(topic_id): Path<TopicId>,
  auth: AuthUser,
) -> Result<Json<TopicProgress>, ApiError>
where
  S: CourseStore + 'static,
{
  Ok(Json(
    progress::topic_progress(state.store.as_ref(), auth.user.user_id, topic_id).await?,
  ))
}
