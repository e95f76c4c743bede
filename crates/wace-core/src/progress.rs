//! Lesson completion records and per-topic progress.
//!
//! At most one completion row exists per (user, lesson); the store enforces
//! this with a UNIQUE constraint so concurrent marks converge on one row.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  account::UserId,
  catalog::{LessonId, TopicId},
  store::CourseStore,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonCompletion {
  pub user_id:      UserId,
  pub lesson_id:    LessonId,
  pub completed_at: DateTime<Utc>,
}

/// Result of a get-or-create on the completion row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkOutcome {
  Created(LessonCompletion),
  AlreadyCompleted(LessonCompletion),
}

impl MarkOutcome {
  pub fn completion(&self) -> &LessonCompletion {
    match self {
      Self::Created(c) | Self::AlreadyCompleted(c) => c,
    }
  }

  pub fn was_created(&self) -> bool { matches!(self, Self::Created(_)) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmarkOutcome {
  Removed,
  WasNotComplete,
}

// ─── Topic progress ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LessonProgress {
  pub id:           LessonId,
  pub title:        String,
  pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicProgress {
  pub topic_id:            TopicId,
  pub topic_title:         String,
  pub total_lessons:       usize,
  pub completed_lessons:   usize,
  /// Rounded to one decimal place.
  pub progress_percentage: f64,
  pub lessons:             Vec<LessonProgress>,
}

/// Mark `lesson_id` complete for `user_id`, verifying the lesson exists first.
pub async fn mark_complete<S>(store: &S, user_id: UserId, lesson_id: LessonId) -> Result<MarkOutcome>
where
  S: CourseStore,
{
  store
    .get_lesson(lesson_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::LessonNotFound(lesson_id))?;
  store.mark_complete(user_id, lesson_id).await.map_err(Error::store)
}

/// Remove the completion row for (`user_id`, `lesson_id`) if present.
pub async fn unmark_complete<S>(
  store: &S,
  user_id: UserId,
  lesson_id: LessonId,
) -> Result<UnmarkOutcome>
where
  S: CourseStore,
{
  store
    .get_lesson(lesson_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::LessonNotFound(lesson_id))?;
  let removed = store
    .unmark_complete(user_id, lesson_id)
    .await
    .map_err(Error::store)?;
  Ok(if removed { UnmarkOutcome::Removed } else { UnmarkOutcome::WasNotComplete })
}

/// Completion summary for every lesson in a topic.
pub async fn topic_progress<S>(store: &S, user_id: UserId, topic_id: TopicId) -> Result<TopicProgress>
where
  S: CourseStore,
{
  let topic = store
    .get_topic(topic_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::TopicNotFound(topic_id))?;
  let lessons = store.list_lessons(topic_id).await.map_err(Error::store)?;
  let done: BTreeSet<LessonId> = store
    .completed_in_topic(user_id, topic_id)
    .await
    .map_err(Error::store)?;

  let lessons: Vec<LessonProgress> = lessons
    .into_iter()
    .map(|l| LessonProgress {
      is_completed: done.contains(&l.lesson_id),
      id:           l.lesson_id,
      title:        l.title,
    })
    .collect();

  let total_lessons     = lessons.len();
  let completed_lessons = lessons.iter().filter(|l| l.is_completed).count();

  Ok(TopicProgress {
    topic_id,
    topic_title: topic.title,
    total_lessons,
    completed_lessons,
    progress_percentage: percentage(completed_lessons, total_lessons),
    lessons,
  })
}

fn percentage(done: usize, total: usize) -> f64 {
  if total == 0 {
    return 0.0;
  }
  (done as f64 / total as f64 * 1000.0).round() / 10.0
}
