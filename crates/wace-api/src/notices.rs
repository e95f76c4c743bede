//! Handlers for `/announcements` and `/instructors`. Public.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use wace_core::{
  notice::{self, Instructor, Priority},
  store::CourseStore,
};

use crate::{ApiError, state::ApiState};

// ─── Announcements ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AnnouncementView {
  pub id:         i64,
  pub title:      String,
  pub message:    String,
  pub priority:   Priority,
  pub created_at: DateTime<Utc>,
  pub time_ago:   String,
}

#[derive(Debug, Serialize)]
pub struct AnnouncementList {
  pub announcements: Vec<AnnouncementView>,
  pub total_count:   usize,
}

/// `GET /announcements`
pub async fn announcements<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<AnnouncementList>, ApiError>
where
  S: CourseStore + 'static,
{
  let now = Utc::now();
  let mut items = state
    .store
    .visible_announcements(now)
    .await
    .map_err(ApiError::store)?;
  notice::sort_announcements(&mut items);

  let announcements: Vec<AnnouncementView> = items
    .into_iter()
    .map(|a| AnnouncementView {
      time_ago:   notice::time_ago(a.created_at, now),
      id:         a.announcement_id,
      title:      a.title,
      message:    a.message,
      priority:   a.priority,
      created_at: a.created_at,
    })
    .collect();

  Ok(Json(AnnouncementList { total_count: announcements.len(), announcements }))
}

// ─── Instructors ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct InstructorParams {
  #[serde(default, deserialize_with = "flag")]
  pub featured: bool,
}

/// `true`, `1`, `yes` and `on` in any case are set; anything else is unset.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
  let raw = String::deserialize(deserializer)?;
  Ok(matches!(raw.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"))
}

#[derive(Debug, Serialize)]
pub struct InstructorView {
  #[serde(flatten)]
  pub instructor:      Instructor,
  pub full_name:       String,
  pub experience_text: String,
}

#[derive(Debug, Serialize)]
pub struct InstructorList {
  pub instructors: Vec<InstructorView>,
  pub total_count: usize,
}

/// `GET /instructors[?featured=true]`
pub async fn instructors<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<InstructorParams>,
) -> Result<Json<InstructorList>, ApiError>
where
  S: CourseStore + 'static,
{
  let instructors: Vec<InstructorView> = state
    .store
    .list_instructors(params.featured)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|instructor| InstructorView {
      full_name: instructor.full_name(),
      experience_text: instructor.experience_text(),
      instructor,
    })
    .collect();

  Ok(Json(InstructorList { total_count: instructors.len(), instructors }))
}
