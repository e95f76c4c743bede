//! Content serializer — the subject → topic → lesson tree.
//!
//! Every lesson's stored video URL is replaced by the access policy's output
//! for the current requester, and annotated with whether that requester has
//! completed it.

use std::{
  collections::{BTreeMap, BTreeSet},
  time::Duration,
};

use serde::Serialize;

use crate::{
  Error, Result,
  account::Requester,
  catalog::{Lesson, LessonId, LessonType, SubjectId, SubjectType, TopicId},
  policy::{self, DEFAULT_VIDEO_TTL, VideoSigner},
  store::CourseStore,
};

/// Knobs for building the tree.
#[derive(Debug, Clone, Copy)]
pub struct ContentOptions {
  /// Lifetime of every signed video URL in the response.
  pub video_ttl:               Duration,
  /// Drop topics with `is_published = false` from the tree.
  pub hide_unpublished_topics: bool,
}

impl Default for ContentOptions {
  fn default() -> Self {
    Self { video_ttl: DEFAULT_VIDEO_TTL, hide_unpublished_topics: false }
  }
}

// ─── Response shape ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct LessonNode {
  pub id:                     LessonId,
  pub title:                  String,
  pub lesson_type:            LessonType,
  pub order:                  i64,
  pub is_free:                bool,
  pub video_duration_minutes: Option<i64>,
  /// Policy-applied; `null` when absent or withheld.
  pub video_url:              Option<String>,
  pub content:                String,
  pub notes:                  String,
  pub is_completed:           bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicNode {
  pub id:                       TopicId,
  pub title:                    String,
  pub description:              String,
  pub order:                    i64,
  pub estimated_duration_hours: i64,
  pub is_published:             bool,
  pub lessons_count:            usize,
  pub lessons:                  Vec<LessonNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectDetail {
  pub id:           SubjectId,
  pub name:         String,
  pub code:         String,
  pub description:  String,
  pub subject_type: SubjectType,
  pub topics:       Vec<TopicNode>,
  pub total_topics: usize,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Build the content tree for `subject_id` as seen by `requester`.
///
/// Issues one signing call per exposed lesson video. A failure to read the
/// requester's completions is logged and treated as "none completed".
pub async fn subject_detail<S, V>(
  store: &S,
  signer: &V,
  options: &ContentOptions,
  subject_id: SubjectId,
  requester: Requester,
) -> Result<SubjectDetail>
where
  S: CourseStore,
  V: VideoSigner + ?Sized,
{
  let subject = store
    .get_subject(subject_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::SubjectNotFound(subject_id))?;

  let topics  = store.list_topics(subject_id).await.map_err(Error::store)?;
  let lessons = store.subject_lessons(subject_id).await.map_err(Error::store)?;

  let completed = match requester.user_id() {
    Some(user_id) => match store.completed_in_subject(user_id, subject_id).await {
      Ok(ids) => ids,
      Err(e) => {
        tracing::warn!(subject_id, user_id, error = %e, "could not fetch lesson completions");
        BTreeSet::new()
      }
    },
    None => BTreeSet::new(),
  };

  let mut by_topic: BTreeMap<TopicId, Vec<Lesson>> = BTreeMap::new();
  for lesson in lessons {
    by_topic.entry(lesson.topic_id).or_default().push(lesson);
  }

  let topics: Vec<TopicNode> = topics
    .into_iter()
    .filter(|t| t.is_published || !options.hide_unpublished_topics)
    .map(|topic| {
      let mut lessons = by_topic.remove(&topic.topic_id).unwrap_or_default();
      lessons.sort_by_key(|l| l.order);
      let lessons: Vec<LessonNode> = lessons
        .into_iter()
        .map(|lesson| lesson_node(lesson, &requester, signer, options, &completed))
        .collect();

      TopicNode {
        id:                       topic.topic_id,
        title:                    topic.title,
        description:              topic.description,
        order:                    topic.order,
        estimated_duration_hours: topic.estimated_duration_hours,
        is_published:             topic.is_published,
        lessons_count:            lessons.len(),
        lessons,
      }
    })
    .collect();

  Ok(SubjectDetail {
    id:           subject.subject_id,
    name:         subject.name,
    code:         subject.code,
    description:  subject.description,
    subject_type: subject.subject_type,
    total_topics: topics.len(),
    topics,
  })
}

fn lesson_node<V>(
  lesson: Lesson,
  requester: &Requester,
  signer: &V,
  options: &ContentOptions,
  completed: &BTreeSet<LessonId>,
) -> LessonNode
where
  V: VideoSigner + ?Sized,
{
  let video_url = policy::expose(&lesson, requester, signer, options.video_ttl);
  LessonNode {
    is_completed:           completed.contains(&lesson.lesson_id),
    id:                     lesson.lesson_id,
    title:                  lesson.title,
    lesson_type:            lesson.lesson_type,
    order:                  lesson.order,
    is_free:                lesson.is_free,
    video_duration_minutes: lesson.video_duration_minutes,
    video_url,
    content:                lesson.content,
    notes:                  lesson.notes,
  }
}
