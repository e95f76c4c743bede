//! Handlers for past WASSCE papers. Both require a token.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/past-questions/student` | Papers for the caller's programme; 404 without a student profile |
//! | `GET`  | `/past-questions/paper/{id}` | Published papers only; answers withheld |

use axum::{
  Json,
  extract::{Path, State},
};
use wace_core::{
  papers::{self, PaperDetail, PaperId, StudentPapers},
  store::CourseStore,
};

use crate::{ApiError, auth::AuthUser, state::ApiState};

/// `GET /past-questions/student`
pub async fn student_papers<S>(
  State(state): State<ApiState<S>>,
  auth: AuthUser,
) -> Result<Json<StudentPapers>, ApiError>
where
  S: CourseStore + 'static,
{
  Ok(Json(papers::student_papers(state.store.as_ref(), auth.user.user_id).await?))
}

/// `GET /past-questions/paper/{id}`
pub async fn paper<S>(
  State(state): State<ApiState<S>>,
  Path(paper_id): Path<PaperId>,
  _auth: AuthUser,
) -> Result<Json<PaperDetail>, ApiError>
where
  S: CourseStore + 'static,
{
  Ok(Json(papers::paper_detail(state.store.as_ref(), paper_id).await?))
}
