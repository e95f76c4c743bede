//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`.
//! Enum discriminants are stored as their lowercase/snake_case names.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use wace_core::{
  account::{NotificationPreferences, StudentProfile, User},
  catalog::{Lesson, Programme, ProgrammeSubject, Subject, Topic},
  notice::{Announcement, Instructor},
  papers::{EssayQuestion, EssaySubQuestion, McqQuestion, PastPaper, QuestionTopic},
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse a stored discriminant back into its enum.
pub fn decode_enum<T: FromStr>(kind: &'static str, s: String) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownValue { kind, value: s })
}

// ─── Column lists ────────────────────────────────────────────────────────────
//
// Each `raw_*` reader below expects exactly these columns, in this order.

pub const PROGRAMME_COLS: &str =
  "programme_id, name, description, price_pesewas, duration_months, created_at";

pub const SUBJECT_COLS: &str =
  "s.subject_id, s.name, s.code, s.description, s.subject_type, s.is_active, s.created_at";

pub const TOPIC_COLS: &str = "topic_id, subject_id, title, description, sort_order, \
                              estimated_duration_hours, is_published, created_at, updated_at";

pub const LESSON_COLS: &str = "l.lesson_id, l.topic_id, l.title, l.lesson_type, l.content, \
                               l.notes, l.video_url, l.video_duration_minutes, l.sort_order, \
                               l.is_free, l.created_at";

pub const USER_COLS: &str = "u.user_id, u.username, u.email, u.first_name, u.last_name, \
                             u.password_hash, u.is_active, u.is_staff, u.created_at";

pub const STUDENT_COLS: &str = "user_id, programme_id, phone_number, date_of_birth, \
                                previous_school, wassce_year, index_number, enrolled_at, \
                                is_active, notify_course_updates, notify_assignment_reminders, \
                                notify_announcements, notify_weekly_summary";

pub const ANNOUNCEMENT_COLS: &str =
  "announcement_id, title, message, priority, is_active, created_at, expires_at";

pub const INSTRUCTOR_COLS: &str = "instructor_id, title, first_name, last_name, role, \
                                   position_title, highest_degree, institution, \
                                   years_experience, bio, photo, email, display_order, \
                                   is_active, is_featured";

pub const QUESTION_TOPIC_COLS: &str =
  "q.question_topic_id, q.subject_id, q.name, q.description, q.sort_order, q.created_at";

pub const PAPER_COLS: &str = "p.paper_id, p.subject_id, p.year, p.paper_number, p.paper_type, \
                              p.title, p.instructions, p.duration_minutes, p.total_marks, \
                              p.is_published, p.created_at, p.updated_at";

pub const MCQ_COLS: &str = "question_id, paper_id, topic_id, question_number, question_text, \
                            option_a, option_b, option_c, option_d, option_e, correct_answer, \
                            explanation, marks, difficulty, created_at";

pub const ESSAY_COLS: &str = "question_id, paper_id, topic_id, question_number, section, \
                              question_text, marks, suggested_time_minutes, marking_scheme, \
                              sample_answer, difficulty, created_at";

pub const SUB_QUESTION_COLS: &str = "question_id, sub_number, question_text, marks, marking_scheme";

// ─── Programme ───────────────────────────────────────────────────────────────

pub struct RawProgramme {
  pub programme_id:    i64,
  pub name:            String,
  pub description:     String,
  pub price_pesewas:   i64,
  pub duration_months: i64,
  pub created_at:      String,
}

impl RawProgramme {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      programme_id:    row.get(0)?,
      name:            row.get(1)?,
      description:     row.get(2)?,
      price_pesewas:   row.get(3)?,
      duration_months: row.get(4)?,
      created_at:      row.get(5)?,
    })
  }

  pub fn into_programme(self) -> Result<Programme> {
    Ok(Programme {
      programme_id:    self.programme_id,
      name:            decode_enum("programme name", self.name)?,
      description:     self.description,
      price_pesewas:   self.price_pesewas,
      duration_months: self.duration_months,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

// ─── Subject ─────────────────────────────────────────────────────────────────

pub struct RawSubject {
  pub subject_id:   i64,
  pub name:         String,
  pub code:         String,
  pub description:  String,
  pub subject_type: String,
  pub is_active:    bool,
  pub created_at:   String,
}

impl RawSubject {
  /// Read the subject columns starting at `offset`.
  pub fn from_row_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:   row.get(offset)?,
      name:         row.get(offset + 1)?,
      code:         row.get(offset + 2)?,
      description:  row.get(offset + 3)?,
      subject_type: row.get(offset + 4)?,
      is_active:    row.get(offset + 5)?,
      created_at:   row.get(offset + 6)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      subject_id:   self.subject_id,
      name:         self.name,
      code:         self.code,
      description:  self.description,
      subject_type: decode_enum("subject type", self.subject_type)?,
      is_active:    self.is_active,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// A `programme_subjects` row joined with its subject.
pub struct RawProgrammeSubject {
  pub link:    ProgrammeSubject,
  pub subject: RawSubject,
}

impl RawProgrammeSubject {
  /// Expects `programme_id, subject_id, is_required, sort_order` followed by
  /// [`SUBJECT_COLS`].
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      link:    ProgrammeSubject {
        programme_id: row.get(0)?,
        subject_id:   row.get(1)?,
        is_required:  row.get(2)?,
        order:        row.get(3)?,
      },
      subject: RawSubject::from_row_at(row, 4)?,
    })
  }

  pub fn into_pair(self) -> Result<(ProgrammeSubject, Subject)> {
    Ok((self.link, self.subject.into_subject()?))
  }
}

// ─── Topic ───────────────────────────────────────────────────────────────────

pub struct RawTopic {
  pub topic_id:                 i64,
  pub subject_id:               i64,
  pub title:                    String,
  pub description:              String,
  pub order:                    i64,
  pub estimated_duration_hours: i64,
  pub is_published:             bool,
  pub created_at:               String,
  pub updated_at:               String,
}

impl RawTopic {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      topic_id:                 row.get(0)?,
      subject_id:               row.get(1)?,
      title:                    row.get(2)?,
      description:              row.get(3)?,
      order:                    row.get(4)?,
      estimated_duration_hours: row.get(5)?,
      is_published:             row.get(6)?,
      created_at:               row.get(7)?,
      updated_at:               row.get(8)?,
    })
  }

  pub fn into_topic(self) -> Result<Topic> {
    Ok(Topic {
      topic_id:                 self.topic_id,
      subject_id:               self.subject_id,
      title:                    self.title,
      description:              self.description,
      order:                    self.order,
      estimated_duration_hours: self.estimated_duration_hours,
      is_published:             self.is_published,
      created_at:               decode_dt(&self.created_at)?,
      updated_at:               decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Lesson ──────────────────────────────────────────────────────────────────

pub struct RawLesson {
  pub lesson_id:              i64,
  pub topic_id:               i64,
  pub title:                  String,
  pub lesson_type:            String,
  pub content:                String,
  pub notes:                  String,
  pub video_url:              Option<String>,
  pub video_duration_minutes: Option<i64>,
  pub order:                  i64,
  pub is_free:                bool,
  pub created_at:             String,
}

impl RawLesson {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      lesson_id:              row.get(0)?,
      topic_id:               row.get(1)?,
      title:                  row.get(2)?,
      lesson_type:            row.get(3)?,
      content:                row.get(4)?,
      notes:                  row.get(5)?,
      video_url:              row.get(6)?,
      video_duration_minutes: row.get(7)?,
      order:                  row.get(8)?,
      is_free:                row.get(9)?,
      created_at:             row.get(10)?,
    })
  }

  pub fn into_lesson(self) -> Result<Lesson> {
    Ok(Lesson {
      lesson_id:              self.lesson_id,
      topic_id:               self.topic_id,
      title:                  self.title,
      lesson_type:            decode_enum("lesson type", self.lesson_type)?,
      content:                self.content,
      notes:                  self.notes,
      video_url:              self.video_url,
      video_duration_minutes: self.video_duration_minutes,
      order:                  self.order,
      is_free:                self.is_free,
      created_at:             decode_dt(&self.created_at)?,
    })
  }
}

// ─── Accounts ────────────────────────────────────────────────────────────────

pub struct RawUser {
  pub user_id:       i64,
  pub username:      String,
  pub email:         String,
  pub first_name:    String,
  pub last_name:     String,
  pub password_hash: String,
  pub is_active:     bool,
  pub is_staff:      bool,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      username:      row.get(1)?,
      email:         row.get(2)?,
      first_name:    row.get(3)?,
      last_name:     row.get(4)?,
      password_hash: row.get(5)?,
      is_active:     row.get(6)?,
      is_staff:      row.get(7)?,
      created_at:    row.get(8)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       self.user_id,
      username:      self.username,
      email:         self.email,
      first_name:    self.first_name,
      last_name:     self.last_name,
      password_hash: self.password_hash,
      is_active:     self.is_active,
      is_staff:      self.is_staff,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawStudent {
  pub user_id:         i64,
  pub programme_id:    i64,
  pub phone_number:    String,
  pub date_of_birth:   String,
  pub previous_school: String,
  pub wassce_year:     i32,
  pub index_number:    String,
  pub enrolled_at:     String,
  pub is_active:       bool,
  pub notifications:   NotificationPreferences,
}

impl RawStudent {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:         row.get(0)?,
      programme_id:    row.get(1)?,
      phone_number:    row.get(2)?,
      date_of_birth:   row.get(3)?,
      previous_school: row.get(4)?,
      wassce_year:     row.get(5)?,
      index_number:    row.get(6)?,
      enrolled_at:     row.get(7)?,
      is_active:       row.get(8)?,
      notifications:   NotificationPreferences {
        course_updates:       row.get(9)?,
        assignment_reminders: row.get(10)?,
        announcements:        row.get(11)?,
        weekly_summary:       row.get(12)?,
      },
    })
  }

  pub fn into_student(self) -> Result<StudentProfile> {
    Ok(StudentProfile {
      user_id:         self.user_id,
      programme_id:    self.programme_id,
      phone_number:    self.phone_number,
      date_of_birth:   decode_date(&self.date_of_birth)?,
      previous_school: self.previous_school,
      wassce_year:     self.wassce_year,
      index_number:    self.index_number,
      enrolled_at:     decode_dt(&self.enrolled_at)?,
      is_active:       self.is_active,
      notifications:   self.notifications,
    })
  }
}

// ─── Notices ─────────────────────────────────────────────────────────────────

pub struct RawAnnouncement {
  pub announcement_id: i64,
  pub title:           String,
  pub message:         String,
  pub priority:        String,
  pub is_active:       bool,
  pub created_at:      String,
  pub expires_at:      Option<String>,
}

impl RawAnnouncement {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      announcement_id: row.get(0)?,
      title:           row.get(1)?,
      message:         row.get(2)?,
      priority:        row.get(3)?,
      is_active:       row.get(4)?,
      created_at:      row.get(5)?,
      expires_at:      row.get(6)?,
    })
  }

  pub fn into_announcement(self) -> Result<Announcement> {
    Ok(Announcement {
      announcement_id: self.announcement_id,
      title:           self.title,
      message:         self.message,
      priority:        decode_enum("priority", self.priority)?,
      is_active:       self.is_active,
      created_at:      decode_dt(&self.created_at)?,
      expires_at:      self.expires_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

pub struct RawInstructor {
  pub instructor_id:    i64,
  pub title:            String,
  pub first_name:       String,
  pub last_name:        String,
  pub role:             String,
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

impl RawInstructor {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      instructor_id:    row.get(0)?,
      title:            row.get(1)?,
      first_name:       row.get(2)?,
      last_name:        row.get(3)?,
      role:             row.get(4)?,
      position_title:   row.get(5)?,
      highest_degree:   row.get(6)?,
      institution:      row.get(7)?,
      years_experience: row.get(8)?,
      bio:              row.get(9)?,
      photo:            row.get(10)?,
      email:            row.get(11)?,
      display_order:    row.get(12)?,
      is_active:        row.get(13)?,
      is_featured:      row.get(14)?,
    })
  }

  pub fn into_instructor(self) -> Result<Instructor> {
    Ok(Instructor {
      instructor_id:    self.instructor_id,
      title:            decode_enum("instructor title", self.title)?,
      first_name:       self.first_name,
      last_name:        self.last_name,
      role:             decode_enum("instructor role", self.role)?,
      position_title:   self.position_title,
      highest_degree:   self.highest_degree,
      institution:      self.institution,
      years_experience: self.years_experience,
      bio:              self.bio,
      photo:            self.photo,
      email:            self.email,
      display_order:    self.display_order,
      is_active:        self.is_active,
      is_featured:      self.is_featured,
    })
  }
}

// ─── Past papers ─────────────────────────────────────────────────────────────

pub struct RawQuestionTopic {
  pub question_topic_id: i64,
  pub subject_id:        i64,
  pub name:              String,
  pub description:       String,
  pub sort_order:        i64,
  pub created_at:        String,
}

impl RawQuestionTopic {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question_topic_id: row.get(0)?,
      subject_id:        row.get(1)?,
      name:              row.get(2)?,
      description:       row.get(3)?,
      sort_order:        row.get(4)?,
      created_at:        row.get(5)?,
    })
  }

  pub fn into_topic(self) -> Result<QuestionTopic> {
    Ok(QuestionTopic {
      question_topic_id: self.question_topic_id,
      subject_id:        self.subject_id,
      name:              self.name,
      description:       self.description,
      order:             self.sort_order,
      created_at:        decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawPaper {
  pub paper_id:         i64,
  pub subject_id:       i64,
  pub year:             i32,
  pub paper_number:     i64,
  pub paper_type:       String,
  pub title:            String,
  pub instructions:     String,
  pub duration_minutes: i64,
  pub total_marks:      i64,
  pub is_published:     bool,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawPaper {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      paper_id:         row.get(0)?,
      subject_id:       row.get(1)?,
      year:             row.get(2)?,
      paper_number:     row.get(3)?,
      paper_type:       row.get(4)?,
      title:            row.get(5)?,
      instructions:     row.get(6)?,
      duration_minutes: row.get(7)?,
      total_marks:      row.get(8)?,
      is_published:     row.get(9)?,
      created_at:       row.get(10)?,
      updated_at:       row.get(11)?,
    })
  }

  /// [`PAPER_COLS`] followed by one count column.
  pub fn from_counted_row(row: &Row<'_>) -> rusqlite::Result<(Self, i64)> {
    Ok((Self::from_row(row)?, row.get(12)?))
  }

  pub fn into_paper(self) -> Result<PastPaper> {
    Ok(PastPaper {
      paper_id:         self.paper_id,
      subject_id:       self.subject_id,
      year:             self.year,
      paper_number:     self.paper_number,
      paper_type:       decode_enum("paper type", self.paper_type)?,
      title:            self.title,
      instructions:     self.instructions,
      duration_minutes: self.duration_minutes,
      total_marks:      self.total_marks,
      is_published:     self.is_published,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawMcq {
  pub question_id:     i64,
  pub paper_id:        i64,
  pub topic_id:        Option<i64>,
  pub question_number: i64,
  pub question_text:   String,
  pub options:         [String; 4],
  pub option_e:        Option<String>,
  pub correct_answer:  String,
  pub explanation:     String,
  pub marks:           i64,
  pub difficulty:      String,
  pub created_at:      String,
}

impl RawMcq {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question_id:     row.get(0)?,
      paper_id:        row.get(1)?,
      topic_id:        row.get(2)?,
      question_number: row.get(3)?,
      question_text:   row.get(4)?,
      options:         [row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?],
      option_e:        row.get(9)?,
      correct_answer:  row.get(10)?,
      explanation:     row.get(11)?,
      marks:           row.get(12)?,
      difficulty:      row.get(13)?,
      created_at:      row.get(14)?,
    })
  }

  pub fn into_mcq(self) -> Result<McqQuestion> {
    let [option_a, option_b, option_c, option_d] = self.options;
    Ok(McqQuestion {
      question_id: self.question_id,
      paper_id: self.paper_id,
      topic_id: self.topic_id,
      question_number: self.question_number,
      question_text: self.question_text,
      option_a,
      option_b,
      option_c,
      option_d,
      option_e: self.option_e,
      correct_answer: decode_enum("answer option", self.correct_answer)?,
      explanation: self.explanation,
      marks: self.marks,
      difficulty: decode_enum("difficulty", self.difficulty)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub struct RawEssay {
  pub question_id:            i64,
  pub paper_id:               i64,
  pub topic_id:               Option<i64>,
  pub question_number:        i64,
  pub section:                String,
  pub question_text:          String,
  pub marks:                  i64,
  pub suggested_time_minutes: i64,
  pub marking_scheme:         String,
  pub sample_answer:          String,
  pub difficulty:             String,
  pub created_at:             String,
}

impl RawEssay {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question_id:            row.get(0)?,
      paper_id:               row.get(1)?,
      topic_id:               row.get(2)?,
      question_number:        row.get(3)?,
      section:                row.get(4)?,
      question_text:          row.get(5)?,
      marks:                  row.get(6)?,
      suggested_time_minutes: row.get(7)?,
      marking_scheme:         row.get(8)?,
      sample_answer:          row.get(9)?,
      difficulty:             row.get(10)?,
      created_at:             row.get(11)?,
    })
  }

  pub fn into_essay(self, sub_questions: Vec<EssaySubQuestion>) -> Result<EssayQuestion> {
    Ok(EssayQuestion {
      question_id: self.question_id,
      paper_id: self.paper_id,
      topic_id: self.topic_id,
      question_number: self.question_number,
      section: self.section,
      question_text: self.question_text,
      marks: self.marks,
      suggested_time_minutes: self.suggested_time_minutes,
      marking_scheme: self.marking_scheme,
      sample_answer: self.sample_answer,
      difficulty: decode_enum("difficulty", self.difficulty)?,
      created_at: decode_dt(&self.created_at)?,
      sub_questions,
    })
  }
}

/// Sub-question row keyed by its parent essay's `question_id`.
pub fn sub_question_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, EssaySubQuestion)> {
  Ok((row.get(0)?, EssaySubQuestion {
    sub_number:     row.get(1)?,
    question_text:  row.get(2)?,
    marks:          row.get(3)?,
    marking_scheme: row.get(4)?,
  }))
}
