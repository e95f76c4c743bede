//! Announcements and instructor listings.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

// ─── Announcements ───────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
  Low,
  #[default]
  Normal,
  High,
  Urgent,
}

impl Priority {
  /// Sort rank; higher is more pressing.
  pub fn rank(&self) -> u8 {
    match self {
      Self::Low => 0,
      Self::Normal => 1,
      Self::High => 2,
      Self::Urgent => 3,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
  pub announcement_id: i64,
  pub title:           String,
  pub message:         String,
  pub priority:        Priority,
  pub is_active:       bool,
  pub created_at:      DateTime<Utc>,
  pub expires_at:      Option<DateTime<Utc>>,
}

impl Announcement {
  /// Active and not yet past `expires_at`.
  pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
    self.is_active && self.expires_at.is_none_or(|exp| exp > now)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAnnouncement {
  pub title:      String,
  pub message:    String,
  #[serde(default)]
  pub priority:   Priority,
  pub expires_at: Option<DateTime<Utc>>,
}

/// Order announcements most pressing first, then newest first.
pub fn sort_announcements(items: &mut [Announcement]) {
  items.sort_by(|a, b| {
    b.priority
      .rank()
      .cmp(&a.priority.rank())
      .then_with(|| b.created_at.cmp(&a.created_at))
  });
}

/// Human-readable age, e.g. `"3 hours ago"`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let elapsed = (now - then).max(TimeDelta::zero());
  let plural = |n: i64, unit: &str| {
    format!("{n} {unit}{} ago", if n == 1 { "" } else { "s" })
  };

  if elapsed.num_days() > 0 {
    plural(elapsed.num_days(), "day")
  } else if elapsed.num_hours() > 0 {
    plural(elapsed.num_hours(), "hour")
  } else if elapsed.num_minutes() > 0 {
    plural(elapsed.num_minutes(), "minute")
  } else {
    "Just now".to_string()
  }
}

// ─── Instructors ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InstructorTitle {
  Dr,
  Prof,
  Mr,
  Mrs,
  Ms,
}

impl InstructorTitle {
  pub fn display_name(&self) -> &'static str {
    match self {
      Self::Dr => "Dr.",
      Self::Prof => "Prof.",
      Self::Mr => "Mr.",
      Self::Mrs => "Mrs.",
      Self::Ms => "Ms.",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InstructorRole {
  Principal,
  Director,
  Head,
  Coordinator,
  Lecturer,
  Tutor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
  pub instructor_id:    i64,
  pub title:            InstructorTitle,
  pub first_name:       String,
  pub last_name:        String,
  pub role:             InstructorRole,
  /// e.g. "Principal & Mathematics Specialist"
  pub position_title:   String,
  pub highest_degree:   String,
  pub institution:      String,
  pub years_experience: i64,
  pub bio:              String,
  pub photo:            String,
  pub email:            String,
  pub display_order:    i64,
  pub is_active:        bool,
  pub is_featured:      bool,
}

impl Instructor {
  pub fn full_name(&self) -> String {
    format!("{} {} {}", self.title.display_name(), self.first_name, self.last_name)
  }

  pub fn experience_text(&self) -> String { format!("{}+ years", self.years_experience) }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInstructor {
  pub title:            InstructorTitle,
  pub first_name:       String,
  pub last_name:        String,
  pub role:             InstructorRole,
  pub position_title:   String,
  pub highest_degree:   String,
  pub institution:      String,
  pub years_experience: i64,
  #[serde(default)]
  pub bio:              String,
  #[serde(default)]
  pub photo:            String,
  #[serde(default)]
  pub email:            String,
  #[serde(default)]
  pub display_order:    i64,
  #[serde(default)]
  pub is_featured:      bool,
}
