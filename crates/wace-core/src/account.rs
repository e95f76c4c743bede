//! Accounts, student profiles and the requester identity.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ProgrammeId;

pub type UserId = i64;

/// A login account. Students additionally carry a [`StudentProfile`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:       UserId,
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub is_active:     bool,
  pub is_staff:      bool,
  pub created_at:    DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub password_hash: String,
  pub is_staff:      bool,
}

/// Email notification preferences. Every flag defaults to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
  pub course_updates:       bool,
  pub assignment_reminders: bool,
  pub announcements:        bool,
  pub weekly_summary:       bool,
}

impl Default for NotificationPreferences {
  fn default() -> Self {
    Self {
      course_updates:       true,
      assignment_reminders: true,
      announcements:        true,
      weekly_summary:       true,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentProfile {
  pub user_id:         UserId,
  pub programme_id:    ProgrammeId,
  pub phone_number:    String,
  pub date_of_birth:   NaiveDate,
  pub previous_school: String,
  pub wassce_year:     i32,
  /// Unique WASSCE index number.
  pub index_number:    String,
  pub enrolled_at:     DateTime<Utc>,
  pub is_active:       bool,
  pub notifications:   NotificationPreferences,
}

/// Profile half of a signup; the owning user is created alongside it.
#[derive(Debug, Clone)]
pub struct NewStudentProfile {
  pub programme_id:    ProgrammeId,
  pub phone_number:    String,
  pub date_of_birth:   NaiveDate,
  pub previous_school: String,
  pub wassce_year:     i32,
  pub index_number:    String,
}

// ─── Requester ───────────────────────────────────────────────────────────────

/// Who is asking. Resolved per request; never persisted by the access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Requester {
  #[default]
  Anonymous,
  User(UserId),
}

impl Requester {
  pub fn is_authenticated(&self) -> bool { matches!(self, Self::User(_)) }

  pub fn user_id(&self) -> Option<UserId> {
    match self {
      Self::User(id) => Some(*id),
      Self::Anonymous => None,
    }
  }
}
