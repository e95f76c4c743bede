//! Programme listings: which subjects each programme offers.

use serde::Serialize;

use crate::{
  Error, Result,
  catalog::{Programme, ProgrammeId, ProgrammeName, SubjectId, SubjectType, TopicId},
  store::CourseStore,
};

/// Number of topics previewed per subject in [`ProgrammeDetail`].
const TOPIC_PREVIEW: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct SubjectSummary {
  pub id:           SubjectId,
  pub name:         String,
  pub code:         String,
  pub description:  String,
  pub topics_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgrammeSummary {
  pub id:                ProgrammeId,
  pub name:              ProgrammeName,
  pub display_name:      &'static str,
  pub description:       String,
  pub price:             f64,
  pub duration_months:   i64,
  pub core_subjects:     Vec<SubjectSummary>,
  pub elective_subjects: Vec<SubjectSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicPreview {
  pub id:                       TopicId,
  pub title:                    String,
  pub description:              String,
  pub order:                    i64,
  pub estimated_duration_hours: i64,
  pub lessons_count:            usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgrammeSubjectDetail {
  pub id:           SubjectId,
  pub name:         String,
  pub code:         String,
  pub description:  String,
  pub order:        i64,
  pub topics_count: usize,
  pub topics:       Vec<TopicPreview>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SubjectsByType {
  pub core:     Vec<ProgrammeSubjectDetail>,
  pub elective: Vec<ProgrammeSubjectDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgrammeDetail {
  pub id:              ProgrammeId,
  pub name:            ProgrammeName,
  pub display_name:    &'static str,
  pub description:     String,
  pub price:           f64,
  pub duration_months: i64,
  pub subjects:        SubjectsByType,
  pub total_subjects:  usize,
}

/// Every programme with its core and elective subjects.
pub async fn programme_summaries<S: CourseStore>(store: &S) -> Result<Vec<ProgrammeSummary>> {
  let programmes = store.list_programmes().await.map_err(Error::store)?;
  let mut out = Vec::with_capacity(programmes.len());

  for programme in programmes {
    let mut core_subjects     = Vec::new();
    let mut elective_subjects = Vec::new();

    for (_, subject) in store
      .programme_subjects(programme.programme_id)
      .await
      .map_err(Error::store)?
    {
      let topics_count = store
        .list_topics(subject.subject_id)
        .await
        .map_err(Error::store)?
        .len();
      let summary = SubjectSummary {
        id: subject.subject_id,
        name: subject.name,
        code: subject.code,
        description: subject.description,
        topics_count,
      };
      match subject.subject_type {
        SubjectType::Core => core_subjects.push(summary),
        SubjectType::Elective => elective_subjects.push(summary),
      }
    }

    out.push(ProgrammeSummary {
      id: programme.programme_id,
      name: programme.name,
      display_name: programme.name.display_name(),
      price: programme.price(),
      description: programme.description,
      duration_months: programme.duration_months,
      core_subjects,
      elective_subjects,
    });
  }

  Ok(out)
}

/// One programme, its subjects grouped by type, with a short topic preview.
pub async fn programme_detail<S: CourseStore>(store: &S, id: ProgrammeId) -> Result<ProgrammeDetail> {
  let programme: Programme = store
    .get_programme(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ProgrammeNotFound(id))?;

  let links = store.programme_subjects(id).await.map_err(Error::store)?;
  let total_subjects = links.len();
  let mut subjects = SubjectsByType::default();

  for (link, subject) in links {
    let topics = store
      .list_topics(subject.subject_id)
      .await
      .map_err(Error::store)?;
    let topics_count = topics.len();

    let mut preview = Vec::with_capacity(TOPIC_PREVIEW.min(topics_count));
    for topic in topics.into_iter().take(TOPIC_PREVIEW) {
      let lessons_count = store
        .list_lessons(topic.topic_id)
        .await
        .map_err(Error::store)?
        .len();
      preview.push(TopicPreview {
        id: topic.topic_id,
        title: topic.title,
        description: topic.description,
        order: topic.order,
        estimated_duration_hours: topic.estimated_duration_hours,
        lessons_count,
      });
    }

    let detail = ProgrammeSubjectDetail {
      id: subject.subject_id,
      name: subject.name,
      code: subject.code,
      description: subject.description,
      order: link.order,
      topics_count,
      topics: preview,
    };
    match subject.subject_type {
      SubjectType::Core => subjects.core.push(detail),
      SubjectType::Elective => subjects.elective.push(detail),
    }
  }

  Ok(ProgrammeDetail {
    id: programme.programme_id,
    name: programme.name,
    display_name: programme.name.display_name(),
    price: programme.price(),
    description: programme.description,
    duration_months: programme.duration_months,
    subjects,
    total_subjects,
  })
}
