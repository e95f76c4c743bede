//! Handlers for the course catalog.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/programmes` | Every programme with core/elective subjects |
//! | `GET`  | `/programmes/{id}` | Subjects grouped by type, 5-topic preview; 404 if missing |
//! | `GET`  | `/subjects/{id}` | Full topic/lesson tree; video URLs gated per requester |

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use wace_core::{
  catalog::{ProgrammeId, SubjectId},
  content::{self, SubjectDetail},
  listing::{self, ProgrammeDetail, ProgrammeSummary},
  store::CourseStore,
};

use crate::{ApiError, auth::Viewer, state::ApiState};

#[derive(Debug, Serialize)]
pub struct ProgrammeList {
  pub programmes:  Vec<ProgrammeSummary>,
  pub total_count: usize,
}

/// `GET /programmes`
pub async fn list_programmes<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<ProgrammeList>, ApiError>
where
  S: CourseStore + 'static,
{
  let programmes = listing::programme_summaries(state.store.as_ref()).await?;
  Ok(Json(ProgrammeList { total_count: programmes.len(), programmes }))
}

/// `GET /programmes/{id}`
pub async fn programme<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<ProgrammeId>,
) -> Result<Json<ProgrammeDetail>, ApiError>
where
  S: CourseStore + 'static,
{
  Ok(Json(listing::programme_detail(state.store.as_ref(), id).await?))
}

/// `GET /subjects/{id}`
pub async fn subject<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<SubjectId>,
  viewer: Viewer,
) -> Result<Json<SubjectDetail>, ApiError>
where
  S: CourseStore + 'static,
{
  let requester = viewer.requester();
  tracing::debug!(subject_id = id, authenticated = requester.is_authenticated(), "subject detail");

  let detail = content::subject_detail(
    state.store.as_ref(),
    state.signer.as_ref(),
    &state.content,
    id,
    requester,
  )
  .await?;
  Ok(Json(detail))
}
