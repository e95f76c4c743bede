//! Catalog types — programmes, subjects, topics and lessons.
//!
//! The catalog is read-only on the request path. Rows are created by admin
//! tooling and edited in place; nothing here is deleted by normal flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

pub type ProgrammeId = i64;
pub type SubjectId = i64;
pub type TopicId = i64;
pub type LessonId = i64;

// ─── Programme ───────────────────────────────────────────────────────────────

/// The fixed set of WASSCE programmes a student can enrol in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProgrammeName {
  GeneralScience,
  GeneralArts,
  Business,
  VisualArts,
  HomeEconomics,
  AgriculturalScience,
}

impl ProgrammeName {
  pub fn display_name(&self) -> &'static str {
    match self {
      Self::GeneralScience => "General Science",
      Self::GeneralArts => "General Arts",
      Self::Business => "Business",
      Self::VisualArts => "Visual Arts",
      Self::HomeEconomics => "Home Economics",
      Self::AgriculturalScience => "Agricultural Science",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Programme {
  pub programme_id:    ProgrammeId,
  pub name:            ProgrammeName,
  pub description:     String,
  /// Price in pesewas (GHS minor units).
  pub price_pesewas:   i64,
  pub duration_months: i64,
  pub created_at:      DateTime<Utc>,
}

impl Programme {
  /// Price in cedis, as exposed over the API.
  pub fn price(&self) -> f64 { self.price_pesewas as f64 / 100.0 }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProgramme {
  pub name:            ProgrammeName,
  pub description:     String,
  pub price_pesewas:   i64,
  #[serde(default = "default_duration_months")]
  pub duration_months: i64,
}

fn default_duration_months() -> i64 { 12 }

// ─── Subject ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize,
  Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubjectType {
  Core,
  #[default]
  Elective,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
  pub subject_id:   SubjectId,
  pub name:         String,
  /// Unique short code, e.g. `"MATH"`.
  pub code:         String,
  pub description:  String,
  pub subject_type: SubjectType,
  pub is_active:    bool,
  pub created_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
  pub name:         String,
  pub code:         String,
  pub description:  String,
  #[serde(default)]
  pub subject_type: SubjectType,
}

/// Join row placing a subject inside a programme.
/// Unique per (programme, subject).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgrammeSubject {
  pub programme_id: ProgrammeId,
  pub subject_id:   SubjectId,
  pub is_required:  bool,
  pub order:        i64,
}

// ─── Topic ───────────────────────────────────────────────────────────────────

/// A chapter within a subject. `order` is unique within its subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
  pub topic_id:                 TopicId,
  pub subject_id:               SubjectId,
  pub title:                    String,
  pub description:              String,
  pub order:                    i64,
  pub estimated_duration_hours: i64,
  pub is_published:             bool,
  pub created_at:               DateTime<Utc>,
  pub updated_at:               DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTopic {
  pub subject_id:               SubjectId,
  pub title:                    String,
  #[serde(default)]
  pub description:              String,
  pub order:                    i64,
  #[serde(default = "default_duration_hours")]
  pub estimated_duration_hours: i64,
  #[serde(default)]
  pub is_published:             bool,
}

fn default_duration_hours() -> i64 { 1 }

// ─── Lesson ──────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LessonType {
  Video,
  Reading,
  Quiz,
  Assignment,
  Exercise,
}

/// A single lesson within a topic. `order` is unique within its topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
  pub lesson_id:              LessonId,
  pub topic_id:               TopicId,
  pub title:                  String,
  pub lesson_type:            LessonType,
  pub content:                String,
  pub notes:                  String,
  /// Absolute URL of the video object in cloud storage. Never exposed raw.
  pub video_url:              Option<String>,
  pub video_duration_minutes: Option<i64>,
  pub order:                  i64,
  /// Free-preview lessons are playable without signing in.
  pub is_free:                bool,
  pub created_at:             DateTime<Utc>,
}

impl Lesson {
  pub fn has_video(&self) -> bool {
    self.video_url.as_deref().is_some_and(|u| !u.trim().is_empty())
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLesson {
  pub topic_id:               TopicId,
  pub title:                  String,
  pub lesson_type:            LessonType,
  #[serde(default)]
  pub content:                String,
  #[serde(default)]
  pub notes:                  String,
  pub video_url:              Option<String>,
  pub video_duration_minutes: Option<i64>,
  pub order:                  i64,
  #[serde(default)]
  pub is_free:                bool,
}
