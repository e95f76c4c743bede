//! Past WASSCE question papers and the student-facing views over them.
//!
//! Only published papers are served. Correct answers, explanations and
//! marking schemes are stored for admin use and never appear in a view.

use std::{
  collections::{BTreeMap, HashMap},
  ops::RangeInclusive,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::{
  Error, Result,
  account::UserId,
  catalog::{ProgrammeId, ProgrammeName, Subject, SubjectId, SubjectType},
  store::CourseStore,
};

pub type PaperId = i64;
pub type QuestionTopicId = i64;
pub type QuestionId = i64;

/// Exam years offered to students.
pub const PAPER_YEARS: RangeInclusive<i32> = 1990..=2025;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaperType {
  Objective,
  Essay,
  Practical,
  Mixed,
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

/// Answer letter of a multiple-choice question.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
pub enum AnswerOption {
  A,
  B,
  C,
  D,
  E,
}

// ─── Topics ──────────────────────────────────────────────────────────────────

/// Topic tag for questions. Distinct from the lesson `Topic` tree; names are
/// unique per subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionTopic {
  pub question_topic_id: QuestionTopicId,
  pub subject_id:        SubjectId,
  pub name:              String,
  pub description:       String,
  pub order:             i64,
  pub created_at:        DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewQuestionTopic {
  pub subject_id:  SubjectId,
  pub name:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub order:       i64,
}

// ─── Papers ──────────────────────────────────────────────────────────────────

/// One sitting of a subject's exam. Unique per (subject, year, paper number).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PastPaper {
  pub paper_id:         PaperId,
  pub subject_id:       SubjectId,
  pub year:             i32,
  pub paper_number:     i64,
  pub paper_type:       PaperType,
  pub title:            String,
  pub instructions:     String,
  pub duration_minutes: i64,
  pub total_marks:      i64,
  pub is_published:     bool,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPastPaper {
  pub subject_id:       SubjectId,
  pub year:             i32,
  #[serde(default = "default_paper_number")]
  pub paper_number:     i64,
  pub paper_type:       PaperType,
  pub title:            String,
  #[serde(default)]
  pub instructions:     String,
  #[serde(default = "default_duration_minutes")]
  pub duration_minutes: i64,
  #[serde(default = "default_total_marks")]
  pub total_marks:      i64,
  #[serde(default)]
  pub is_published:     bool,
}

fn default_paper_number() -> i64 { 1 }

fn default_duration_minutes() -> i64 { 180 }

fn default_total_marks() -> i64 { 100 }

// ─── Questions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McqQuestion {
  pub question_id:     QuestionId,
  pub paper_id:        PaperId,
  pub topic_id:        Option<QuestionTopicId>,
  pub question_number: i64,
  pub question_text:   String,
  pub option_a:        String,
  pub option_b:        String,
  pub option_c:        String,
  pub option_d:        String,
  /// Only some papers carry a fifth option.
  pub option_e:        Option<String>,
  pub correct_answer:  AnswerOption,
  pub explanation:     String,
  pub marks:           i64,
  pub difficulty:      Difficulty,
  pub created_at:      DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMcqQuestion {
  pub paper_id:        PaperId,
  #[serde(default)]
  pub topic_id:        Option<QuestionTopicId>,
  pub question_number: i64,
  pub question_text:   String,
  pub option_a:        String,
  pub option_b:        String,
  pub option_c:        String,
  pub option_d:        String,
  #[serde(default)]
  pub option_e:        Option<String>,
  pub correct_answer:  AnswerOption,
  #[serde(default)]
  pub explanation:     String,
  #[serde(default = "default_mcq_marks")]
  pub marks:           i64,
  #[serde(default)]
  pub difficulty:      Difficulty,
}

fn default_mcq_marks() -> i64 { 1 }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssaySubQuestion {
  /// `a`, `b`, `ii`, ...
  pub sub_number:     String,
  pub question_text:  String,
  pub marks:          i64,
  pub marking_scheme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EssayQuestion {
  pub question_id:            QuestionId,
  pub paper_id:               PaperId,
  pub topic_id:               Option<QuestionTopicId>,
  pub question_number:        i64,
  /// `A`, `B`, ... or empty for unsectioned papers.
  pub section:                String,
  pub question_text:          String,
  pub marks:                  i64,
  pub suggested_time_minutes: i64,
  pub marking_scheme:         String,
  pub sample_answer:          String,
  pub difficulty:             Difficulty,
  pub created_at:             DateTime<Utc>,
  /// Ordered by `sub_number`.
  pub sub_questions:          Vec<EssaySubQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEssayQuestion {
  pub paper_id:               PaperId,
  #[serde(default)]
  pub topic_id:               Option<QuestionTopicId>,
  pub question_number:        i64,
  #[serde(default)]
  pub section:                String,
  pub question_text:          String,
  #[serde(default = "default_essay_marks")]
  pub marks:                  i64,
  #[serde(default = "default_suggested_minutes")]
  pub suggested_time_minutes: i64,
  #[serde(default)]
  pub marking_scheme:         String,
  #[serde(default)]
  pub sample_answer:          String,
  #[serde(default)]
  pub difficulty:             Difficulty,
  #[serde(default)]
  pub sub_questions:          Vec<EssaySubQuestion>,
}

fn default_essay_marks() -> i64 { 10 }

fn default_suggested_minutes() -> i64 { 15 }

// ─── Student listing ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ProgrammeRef {
  pub id:           ProgrammeId,
  pub name:         ProgrammeName,
  pub display_name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaperSummary {
  pub id:               PaperId,
  pub year:             i32,
  pub paper_number:     i64,
  pub paper_type:       PaperType,
  pub title:            String,
  pub duration_minutes: i64,
  pub total_marks:      i64,
  pub question_count:   usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectPapers {
  pub id:           SubjectId,
  pub name:         String,
  pub code:         String,
  pub subject_type: SubjectType,
  pub papers:       Vec<PaperSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectRef {
  pub id:   SubjectId,
  pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicTag {
  pub id:          QuestionTopicId,
  pub name:        String,
  pub description: String,
  pub subject:     SubjectRef,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct YearRange {
  pub start: i32,
  pub end:   i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentPapers {
  pub programme:    ProgrammeRef,
  /// Subjects that have at least one published paper, in the order their
  /// newest paper appears.
  pub subjects:     Vec<SubjectPapers>,
  pub topics:       Vec<TopicTag>,
  pub year_range:   YearRange,
  pub total_papers: usize,
}

/// Published papers for every subject in the student's programme, grouped by
/// subject. Papers run newest year first, then subject name, then paper number.
pub async fn student_papers<S: CourseStore>(store: &S, user_id: UserId) -> Result<StudentPapers> {
  let student = store
    .get_student(user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::StudentProfileNotFound(user_id))?;
  let programme = store
    .get_programme(student.programme_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ProgrammeNotFound(student.programme_id))?;

  let subjects: BTreeMap<SubjectId, Subject> = store
    .programme_subjects(programme.programme_id)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|(_, subject)| (subject.subject_id, subject))
    .collect();
  let subject_ids: Vec<SubjectId> = subjects.keys().copied().collect();

  let papers = store
    .published_papers(subject_ids.clone(), PAPER_YEARS)
    .await
    .map_err(Error::store)?;
  let total_papers = papers.len();

  let mut grouped: Vec<SubjectPapers> = Vec::new();
  let mut slot: HashMap<SubjectId, usize> = HashMap::new();
  for (paper, question_count) in papers {
    let Some(subject) = subjects.get(&paper.subject_id) else {
      continue;
    };
    let index = *slot.entry(subject.subject_id).or_insert_with(|| {
      grouped.push(SubjectPapers {
        id:           subject.subject_id,
        name:         subject.name.clone(),
        code:         subject.code.clone(),
        subject_type: subject.subject_type,
        papers:       Vec::new(),
      });
      grouped.len() - 1
    });
    grouped[index].papers.push(PaperSummary {
      id: paper.paper_id,
      year: paper.year,
      paper_number: paper.paper_number,
      paper_type: paper.paper_type,
      title: paper.title,
      duration_minutes: paper.duration_minutes,
      total_marks: paper.total_marks,
      question_count,
    });
  }

  let topics = store
    .question_topics(subject_ids)
    .await
    .map_err(Error::store)?
    .into_iter()
    .filter_map(|topic| {
      let subject = subjects.get(&topic.subject_id)?;
      Some(TopicTag {
        id:          topic.question_topic_id,
        name:        topic.name,
        description: topic.description,
        subject:     SubjectRef { id: subject.subject_id, name: subject.name.clone() },
      })
    })
    .collect();

  Ok(StudentPapers {
    programme: ProgrammeRef {
      id:           programme.programme_id,
      name:         programme.name,
      display_name: programme.name.display_name(),
    },
    subjects: grouped,
    topics,
    year_range: YearRange { start: *PAPER_YEARS.start(), end: *PAPER_YEARS.end() },
    total_papers,
  })
}

// ─── Paper detail ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PaperHeader {
  pub id:               PaperId,
  /// Subject name.
  pub subject:          String,
  pub year:             i32,
  pub paper_number:     i64,
  pub paper_type:       PaperType,
  pub title:            String,
  pub instructions:     String,
  pub duration_minutes: i64,
  pub total_marks:      i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct McqOptions {
  #[serde(rename = "A")]
  pub a: String,
  #[serde(rename = "B")]
  pub b: String,
  #[serde(rename = "C")]
  pub c: String,
  #[serde(rename = "D")]
  pub d: String,
  #[serde(rename = "E")]
  pub e: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct McqView {
  pub id:              QuestionId,
  pub question_number: i64,
  pub question_text:   String,
  pub options:         McqOptions,
  pub marks:           i64,
  pub difficulty:      Difficulty,
  pub topic:           Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubQuestionView {
  pub sub_number:    String,
  pub question_text: String,
  pub marks:         i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EssayView {
  pub id:                     QuestionId,
  pub question_number:        i64,
  pub section:                String,
  pub question_text:          String,
  pub marks:                  i64,
  pub suggested_time_minutes: i64,
  pub difficulty:             Difficulty,
  pub topic:                  Option<String>,
  pub has_sub_questions:      bool,
  pub sub_questions:          Vec<SubQuestionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaperDetail {
  pub paper:           PaperHeader,
  pub mcq_questions:   Vec<McqView>,
  pub essay_questions: Vec<EssayView>,
  pub total_questions: usize,
}

/// A published paper with its questions, answers withheld. Multiple-choice
/// questions run by number; essays by section, then number.
pub async fn paper_detail<S: CourseStore>(store: &S, paper_id: PaperId) -> Result<PaperDetail> {
  let paper = store
    .get_paper(paper_id)
    .await
    .map_err(Error::store)?
    .filter(|p| p.is_published)
    .ok_or(Error::PaperNotFound(paper_id))?;
  let subject = store
    .get_subject(paper.subject_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::SubjectNotFound(paper.subject_id))?;

  let topic_names: HashMap<QuestionTopicId, String> = store
    .question_topics(vec![paper.subject_id])
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|t| (t.question_topic_id, t.name))
    .collect();
  let topic_of = |id: Option<QuestionTopicId>| id.and_then(|id| topic_names.get(&id).cloned());

  let mcq_questions: Vec<McqView> = store
    .paper_mcqs(paper_id)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|q| McqView {
      id:              q.question_id,
      question_number: q.question_number,
      question_text:   q.question_text,
      options:         McqOptions {
        a: q.option_a,
        b: q.option_b,
        c: q.option_c,
        d: q.option_d,
        e: q.option_e.filter(|e| !e.is_empty()),
      },
      marks:           q.marks,
      difficulty:      q.difficulty,
      topic:           topic_of(q.topic_id),
    })
    .collect();

  let essay_questions: Vec<EssayView> = store
    .paper_essays(paper_id)
    .await
    .map_err(Error::store)?
    .into_iter()
    .map(|q| EssayView {
      id:                     q.question_id,
      question_number:        q.question_number,
      section:                q.section,
      question_text:          q.question_text,
      marks:                  q.marks,
      suggested_time_minutes: q.suggested_time_minutes,
      difficulty:             q.difficulty,
      topic:                  topic_of(q.topic_id),
      has_sub_questions:      !q.sub_questions.is_empty(),
      sub_questions:          q
        .sub_questions
        .into_iter()
        .map(|s| SubQuestionView {
          sub_number:    s.sub_number,
          question_text: s.question_text,
          marks:         s.marks,
        })
        .collect(),
    })
    .collect();

  Ok(PaperDetail {
    total_questions: mcq_questions.len() + essay_questions.len(),
    paper: PaperHeader {
      id:               paper.paper_id,
      subject:          subject.name,
      year:             paper.year,
      paper_number:     paper.paper_number,
      paper_type:       paper.paper_type,
      title:            paper.title,
      instructions:     paper.instructions,
      duration_minutes: paper.duration_minutes,
      total_marks:      paper.total_marks,
    },
    mcq_questions,
    essay_questions,
  })
}
