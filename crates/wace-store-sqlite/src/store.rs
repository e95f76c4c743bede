//! [`SqliteStore`], the SQLite implementation of [`CourseStore`].

use std::{
  collections::{BTreeSet, HashMap},
  ops::RangeInclusive,
  path::Path,
};

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, types::Value};
use wace_core::{
  account::{NewStudentProfile, NewUser, NotificationPreferences, StudentProfile, User, UserId},
  catalog::{
    Lesson, LessonId, NewLesson, NewProgramme, NewSubject, NewTopic, Programme, ProgrammeId,
    ProgrammeSubject, Subject, SubjectId, Topic, TopicId,
  },
  notice::{Announcement, Instructor, NewAnnouncement, NewInstructor},
  papers::{
    EssayQuestion, EssaySubQuestion, McqQuestion, NewEssayQuestion, NewMcqQuestion,
    NewPastPaper, NewQuestionTopic, PaperId, PastPaper, QuestionTopic,
  },
  progress::{LessonCompletion, MarkOutcome},
  store::CourseStore,
};

use crate::{
  Result,
  encode::{
    ANNOUNCEMENT_COLS, ESSAY_COLS, INSTRUCTOR_COLS, LESSON_COLS, MCQ_COLS, PAPER_COLS,
    PROGRAMME_COLS, QUESTION_TOPIC_COLS, RawAnnouncement, RawEssay, RawInstructor, RawLesson,
    RawMcq, RawPaper, RawProgramme, RawProgrammeSubject, RawQuestionTopic, RawStudent, RawSubject,
    RawTopic, RawUser, STUDENT_COLS, SUB_QUESTION_COLS, SUBJECT_COLS, TOPIC_COLS, USER_COLS,
    decode_dt, encode_date, encode_dt, sub_question_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A course store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection. Tests use this to break tables.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn exists(&self, sql: &'static str, param: String) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(sql, rusqlite::params![param], |_| Ok(()))
            .optional()?
            .is_some(),
        )
      })
      .await?;
    Ok(found)
  }

  async fn users_where(&self, clause: &'static str, params: Vec<Value>) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {USER_COLS} FROM users u {clause}");
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(params), RawUser::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn lesson_ids(
    &self,
    sql: &'static str,
    user_id: UserId,
    scope_id: i64,
  ) -> Result<BTreeSet<LessonId>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
          .query_map(rusqlite::params![user_id, scope_id], |r| r.get(0))?
          .collect::<rusqlite::Result<BTreeSet<LessonId>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }
}

// ─── Row writers ─────────────────────────────────────────────────────────────
//
// Shared by single inserts and multi-row transactions. Emails are stored
// lowercase.

fn insert_user(
  conn: &rusqlite::Connection,
  input: &NewUser,
  created_at: DateTime<Utc>,
) -> rusqlite::Result<UserId> {
  conn.execute(
    "INSERT INTO users
       (username, email, first_name, last_name, password_hash, is_active, is_staff, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)",
    rusqlite::params![
      input.username,
      input.email.to_lowercase(),
      input.first_name,
      input.last_name,
      input.password_hash,
      input.is_staff,
      encode_dt(created_at)
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

fn new_user(user_id: UserId, input: NewUser, created_at: DateTime<Utc>) -> User {
  User {
    user_id,
    email: input.email.to_lowercase(),
    username: input.username,
    first_name: input.first_name,
    last_name: input.last_name,
    password_hash: input.password_hash,
    is_active: true,
    is_staff: input.is_staff,
    created_at,
  }
}

fn insert_student(
  conn: &rusqlite::Connection,
  user_id: UserId,
  input: &NewStudentProfile,
  enrolled_at: DateTime<Utc>,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO students
       (user_id, programme_id, phone_number, date_of_birth, previous_school,
        wassce_year, index_number, enrolled_at, is_active)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1)",
    rusqlite::params![
      user_id,
      input.programme_id,
      input.phone_number,
      encode_date(input.date_of_birth),
      input.previous_school,
      input.wassce_year,
      input.index_number,
      encode_dt(enrolled_at)
    ],
  )?;
  Ok(())
}

/// `?, ?, ...` with `n` anonymous parameters, for `IN (...)` lists.
fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

// ─── CourseStore impl ────────────────────────────────────────────────────────

impl CourseStore for SqliteStore {
  type Error = crate::Error;

  // ── Programmes ────────────────────────────────────────────────────────

  async fn add_programme(&self, input: NewProgramme) -> Result<Programme> {
    let created_at = Utc::now();
    let name: &str = input.name.as_ref();
    let name_str = name.to_owned();
    let description = input.description.clone();
    let at_str = encode_dt(created_at);

    let programme_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO programmes (name, description, price_pesewas, duration_months, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            name_str,
            description,
            input.price_pesewas,
            input.duration_months,
            at_str
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Programme {
      programme_id,
      name: input.name,
      description: input.description,
      price_pesewas: input.price_pesewas,
      duration_months: input.duration_months,
      created_at,
    })
  }

  async fn list_programmes(&self) -> Result<Vec<Programme>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {PROGRAMME_COLS} FROM programmes ORDER BY name"))?;
        let rows = stmt
          .query_map([], RawProgramme::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawProgramme::into_programme).collect()
  }

  async fn get_programme(&self, id: ProgrammeId) -> Result<Option<Programme>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROGRAMME_COLS} FROM programmes WHERE programme_id = ?1"),
              rusqlite::params![id],
              RawProgramme::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawProgramme::into_programme).transpose()
  }

  async fn link_subject(&self, link: ProgrammeSubject) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO programme_subjects (programme_id, subject_id, is_required, sort_order)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT (programme_id, subject_id)
           DO UPDATE SET is_required = excluded.is_required, sort_order = excluded.sort_order",
          rusqlite::params![link.programme_id, link.subject_id, link.is_required, link.order],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn programme_subjects(&self, id: ProgrammeId) -> Result<Vec<(ProgrammeSubject, Subject)>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT ps.programme_id, ps.subject_id, ps.is_required, ps.sort_order, {SUBJECT_COLS}
           FROM programme_subjects ps
           JOIN subjects s ON s.subject_id = ps.subject_id
           WHERE ps.programme_id = ?1
           ORDER BY CASE s.subject_type WHEN 'core' THEN 0 ELSE 1 END, ps.sort_order"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id], RawProgrammeSubject::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawProgrammeSubject::into_pair).collect()
  }

  // ── Subjects / topics / lessons ───────────────────────────────────────

  async fn add_subject(&self, input: NewSubject) -> Result<Subject> {
    let created_at = Utc::now();
    let type_str: &str = input.subject_type.as_ref();
    let type_str = type_str.to_owned();
    let (name, code, description) =
      (input.name.clone(), input.code.clone(), input.description.clone());
    let at_str = encode_dt(created_at);

    let subject_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (name, code, description, subject_type, is_active, created_at)
           VALUES (?1, ?2, ?3, ?4, 1, ?5)",
          rusqlite::params![name, code, description, type_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Subject {
      subject_id,
      name: input.name,
      code: input.code,
      description: input.description,
      subject_type: input.subject_type,
      is_active: true,
      created_at,
    })
  }

  async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {SUBJECT_COLS} FROM subjects s WHERE s.subject_id = ?1"),
              rusqlite::params![id],
              |row| RawSubject::from_row_at(row, 0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawSubject::into_subject).transpose()
  }

  async fn add_topic(&self, input: NewTopic) -> Result<Topic> {
    let now = Utc::now();
    let (title, description) = (input.title.clone(), input.description.clone());
    let at_str = encode_dt(now);

    let topic_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO topics
             (subject_id, title, description, sort_order, estimated_duration_hours,
              is_published, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![
            input.subject_id,
            title,
            description,
            input.order,
            input.estimated_duration_hours,
            input.is_published,
            at_str
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Topic {
      topic_id,
      subject_id: input.subject_id,
      title: input.title,
      description: input.description,
      order: input.order,
      estimated_duration_hours: input.estimated_duration_hours,
      is_published: input.is_published,
      created_at: now,
      updated_at: now,
    })
  }

  async fn get_topic(&self, id: TopicId) -> Result<Option<Topic>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {TOPIC_COLS} FROM topics WHERE topic_id = ?1"),
              rusqlite::params![id],
              RawTopic::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawTopic::into_topic).transpose()
  }

  async fn list_topics(&self, subject_id: SubjectId) -> Result<Vec<Topic>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TOPIC_COLS} FROM topics WHERE subject_id = ?1 ORDER BY sort_order"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![subject_id], RawTopic::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawTopic::into_topic).collect()
  }

  async fn add_lesson(&self, input: NewLesson) -> Result<Lesson> {
    let created_at = Utc::now();
    let type_str: &str = input.lesson_type.as_ref();
    let type_str = type_str.to_owned();
    let (title, content, notes, video_url) = (
      input.title.clone(),
      input.content.clone(),
      input.notes.clone(),
      input.video_url.clone(),
    );
    let at_str = encode_dt(created_at);

    let lesson_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO lessons
             (topic_id, title, lesson_type, content, notes, video_url,
              video_duration_minutes, sort_order, is_free, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            input.topic_id,
            title,
            type_str,
            content,
            notes,
            video_url,
            input.video_duration_minutes,
            input.order,
            input.is_free,
            at_str
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Lesson {
      lesson_id,
      topic_id: input.topic_id,
      title: input.title,
      lesson_type: input.lesson_type,
      content: input.content,
      notes: input.notes,
      video_url: input.video_url,
      video_duration_minutes: input.video_duration_minutes,
      order: input.order,
      is_free: input.is_free,
      created_at,
    })
  }

  async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {LESSON_COLS} FROM lessons l WHERE l.lesson_id = ?1"),
              rusqlite::params![id],
              RawLesson::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawLesson::into_lesson).transpose()
  }

  async fn list_lessons(&self, topic_id: TopicId) -> Result<Vec<Lesson>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LESSON_COLS} FROM lessons l WHERE l.topic_id = ?1 ORDER BY l.sort_order"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![topic_id], RawLesson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawLesson::into_lesson).collect()
  }

  async fn subject_lessons(&self, subject_id: SubjectId) -> Result<Vec<Lesson>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {LESSON_COLS}
           FROM lessons l
           JOIN topics t ON t.topic_id = l.topic_id
           WHERE t.subject_id = ?1
           ORDER BY t.sort_order, l.sort_order"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![subject_id], RawLesson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawLesson::into_lesson).collect()
  }

  async fn set_lesson_video(&self, id: LessonId, video_url: Option<String>) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE lessons SET video_url = ?2 WHERE lesson_id = ?1",
          rusqlite::params![id, video_url],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Completions ───────────────────────────────────────────────────────

  async fn mark_complete(&self, user_id: UserId, lesson_id: LessonId) -> Result<MarkOutcome> {
    let at_str = encode_dt(Utc::now());

    let (inserted, stored_at): (bool, String) = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          "INSERT OR IGNORE INTO lesson_completions (user_id, lesson_id, completed_at)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, lesson_id, at_str],
        )? == 1;
        let stored_at = conn.query_row(
          "SELECT completed_at FROM lesson_completions WHERE user_id = ?1 AND lesson_id = ?2",
          rusqlite::params![user_id, lesson_id],
          |r| r.get(0),
        )?;
        Ok((inserted, stored_at))
      })
      .await?;

    let completion = LessonCompletion {
      user_id,
      lesson_id,
      completed_at: decode_dt(&stored_at)?,
    };
    Ok(if inserted {
      MarkOutcome::Created(completion)
    } else {
      MarkOutcome::AlreadyCompleted(completion)
    })
  }

  async fn unmark_complete(&self, user_id: UserId, lesson_id: LessonId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM lesson_completions WHERE user_id = ?1 AND lesson_id = ?2",
          rusqlite::params![user_id, lesson_id],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn completed_in_subject(
    &self,
    user_id: UserId,
    subject_id: SubjectId,
  ) -> Result<BTreeSet<LessonId>> {
    self
      .lesson_ids(
        "SELECT c.lesson_id
         FROM lesson_completions c
         JOIN lessons l ON l.lesson_id = c.lesson_id
         JOIN topics  t ON t.topic_id  = l.topic_id
         WHERE c.user_id = ?1 AND t.subject_id = ?2",
        user_id,
        subject_id,
      )
      .await
  }

  async fn completed_in_topic(
    &self,
    user_id: UserId,
    topic_id: TopicId,
  ) -> Result<BTreeSet<LessonId>> {
    self
      .lesson_ids(
        "SELECT c.lesson_id
         FROM lesson_completions c
         JOIN lessons l ON l.lesson_id = c.lesson_id
         WHERE c.user_id = ?1 AND l.topic_id = ?2",
        user_id,
        topic_id,
      )
      .await
  }

  // ── Accounts ──────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<User> {
    let created_at = Utc::now();
    let row = input.clone();
    let user_id = self
      .conn
      .call(move |conn| Ok(insert_user(conn, &row, created_at)?))
      .await?;
    Ok(new_user(user_id, input, created_at))
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    self
      .users_where("WHERE u.user_id = ?1", vec![Value::from(id)])
      .await
  }

  async fn find_user<'a>(&'a self, login: &'a str) -> Result<Option<User>> {
    self
      .users_where(
        "WHERE u.username = ?1 OR u.email = ?2 ORDER BY u.username = ?1 DESC LIMIT 1",
        vec![Value::from(login.to_owned()), Value::from(login.to_lowercase())],
      )
      .await
  }

  async fn username_taken<'a>(&'a self, username: &'a str) -> Result<bool> {
    self
      .exists("SELECT 1 FROM users WHERE username = ?1", username.to_owned())
      .await
  }

  async fn email_taken<'a>(&'a self, email: &'a str) -> Result<bool> {
    self
      .exists("SELECT 1 FROM users WHERE email = ?1", email.to_lowercase())
      .await
  }

  async fn set_password_hash(&self, id: UserId, password_hash: String) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET password_hash = ?2 WHERE user_id = ?1",
          rusqlite::params![id, password_hash],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn set_user_active(&self, id: UserId, active: bool) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET is_active = ?2 WHERE user_id = ?1",
          rusqlite::params![id, active],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn register_student(
    &self,
    user: NewUser,
    student: NewStudentProfile,
  ) -> Result<(User, StudentProfile)> {
    let created_at = Utc::now();
    let rows = (user.clone(), student.clone());
    let user_id = self
      .conn
      .call(move |conn| {
        let (user, student) = rows;
        let tx = conn.transaction()?;
        let user_id = insert_user(&tx, &user, created_at)?;
        insert_student(&tx, user_id, &student, created_at)?;
        tx.commit()?;
        Ok(user_id)
      })
      .await?;

    let profile = StudentProfile {
      user_id,
      programme_id: student.programme_id,
      phone_number: student.phone_number,
      date_of_birth: student.date_of_birth,
      previous_school: student.previous_school,
      wassce_year: student.wassce_year,
      index_number: student.index_number,
      enrolled_at: created_at,
      is_active: true,
      notifications: NotificationPreferences::default(),
    };
    Ok((new_user(user_id, user, created_at), profile))
  }

  async fn get_student(&self, user_id: UserId) -> Result<Option<StudentProfile>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {STUDENT_COLS} FROM students WHERE user_id = ?1"),
              rusqlite::params![user_id],
              RawStudent::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawStudent::into_student).transpose()
  }

  async fn index_number_taken<'a>(&'a self, index_number: &'a str) -> Result<bool> {
    self
      .exists("SELECT 1 FROM students WHERE index_number = ?1", index_number.to_owned())
      .await
  }

  async fn set_notifications(
    &self,
    user_id: UserId,
    prefs: NotificationPreferences,
  ) -> Result<Option<StudentProfile>> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE students SET
             notify_course_updates       = ?2,
             notify_assignment_reminders = ?3,
             notify_announcements        = ?4,
             notify_weekly_summary       = ?5
           WHERE user_id = ?1",
          rusqlite::params![
            user_id,
            prefs.course_updates,
            prefs.assignment_reminders,
            prefs.announcements,
            prefs.weekly_summary
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_student(user_id).await
  }

  // ── Tokens ────────────────────────────────────────────────────────────

  async fn issue_token(&self, user_id: UserId, digest: String) -> Result<()> {
    let at_str = encode_dt(Utc::now());
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO auth_tokens (digest, user_id, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![digest, user_id, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn user_for_token<'a>(&'a self, digest: &'a str) -> Result<Option<User>> {
    self
      .users_where(
        "JOIN auth_tokens t ON t.user_id = u.user_id WHERE t.digest = ?1 AND u.is_active = 1",
        vec![Value::from(digest.to_owned())],
      )
      .await
  }

  async fn revoke_token<'a>(&'a self, digest: &'a str) -> Result<bool> {
    let digest = digest.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM auth_tokens WHERE digest = ?1", rusqlite::params![digest])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn revoke_user_tokens(&self, user_id: UserId) -> Result<usize> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM auth_tokens WHERE user_id = ?1", rusqlite::params![user_id])?)
      })
      .await?;
    Ok(deleted)
  }

  // ── Past papers ───────────────────────────────────────────────────────

  async fn add_question_topic(&self, input: NewQuestionTopic) -> Result<QuestionTopic> {
    let created_at = Utc::now();
    let row = (input.name.clone(), input.description.clone(), encode_dt(created_at));

    let question_topic_id = self
      .conn
      .call(move |conn| {
        let (name, description, at_str) = row;
        conn.execute(
          "INSERT INTO question_topics (subject_id, name, description, sort_order, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![input.subject_id, name, description, input.order, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(QuestionTopic {
      question_topic_id,
      subject_id: input.subject_id,
      name: input.name,
      description: input.description,
      order: input.order,
      created_at,
    })
  }

  async fn question_topics(&self, subject_ids: Vec<SubjectId>) -> Result<Vec<QuestionTopic>> {
    if subject_ids.is_empty() {
      return Ok(Vec::new());
    }
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {QUESTION_TOPIC_COLS}
           FROM question_topics q
           JOIN subjects s ON s.subject_id = q.subject_id
           WHERE q.subject_id IN ({})
           ORDER BY s.name, q.sort_order, q.name",
          placeholders(subject_ids.len())
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(subject_ids), RawQuestionTopic::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawQuestionTopic::into_topic).collect()
  }

  async fn add_paper(&self, input: NewPastPaper) -> Result<PastPaper> {
    let now = Utc::now();
    let paper_type: &str = input.paper_type.as_ref();
    let row = (
      paper_type.to_owned(),
      input.title.clone(),
      input.instructions.clone(),
      encode_dt(now),
    );

    let paper_id = self
      .conn
      .call(move |conn| {
        let (paper_type, title, instructions, at_str) = row;
        conn.execute(
          "INSERT INTO past_papers
             (subject_id, year, paper_number, paper_type, title, instructions,
              duration_minutes, total_marks, is_published, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            input.subject_id,
            input.year,
            input.paper_number,
            paper_type,
            title,
            instructions,
            input.duration_minutes,
            input.total_marks,
            input.is_published,
            at_str
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(PastPaper {
      paper_id,
      subject_id: input.subject_id,
      year: input.year,
      paper_number: input.paper_number,
      paper_type: input.paper_type,
      title: input.title,
      instructions: input.instructions,
      duration_minutes: input.duration_minutes,
      total_marks: input.total_marks,
      is_published: input.is_published,
      created_at: now,
      updated_at: now,
    })
  }

  async fn get_paper(&self, id: PaperId) -> Result<Option<PastPaper>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PAPER_COLS} FROM past_papers p WHERE p.paper_id = ?1"),
              rusqlite::params![id],
              RawPaper::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawPaper::into_paper).transpose()
  }

  async fn set_paper_published(&self, id: PaperId, published: bool) -> Result<bool> {
    let at_str = encode_dt(Utc::now());
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE past_papers SET is_published = ?2, updated_at = ?3 WHERE paper_id = ?1",
          rusqlite::params![id, published, at_str],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn published_papers(
    &self,
    subject_ids: Vec<SubjectId>,
    years: RangeInclusive<i32>,
  ) -> Result<Vec<(PastPaper, usize)>> {
    if subject_ids.is_empty() {
      return Ok(Vec::new());
    }
    let mut params = vec![Value::from(*years.start()), Value::from(*years.end())];
    params.extend(subject_ids.iter().copied().map(Value::from));
    let ids = placeholders(subject_ids.len());

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PAPER_COLS},
             (SELECT COUNT(*) FROM mcq_questions m WHERE m.paper_id = p.paper_id)
             + (SELECT COUNT(*) FROM essay_questions e WHERE e.paper_id = p.paper_id)
           FROM past_papers p
           JOIN subjects s ON s.subject_id = p.subject_id
           WHERE p.is_published = 1 AND p.year BETWEEN ? AND ? AND p.subject_id IN ({ids})
           ORDER BY p.year DESC, s.name, p.paper_number"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawPaper::from_counted_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws
      .into_iter()
      .map(|(raw, count)| Ok((raw.into_paper()?, count as usize)))
      .collect()
  }

  async fn add_mcq(&self, input: NewMcqQuestion) -> Result<McqQuestion> {
    let created_at = Utc::now();
    let row = input.clone();
    let at_str = encode_dt(created_at);

    let question_id = self
      .conn
      .call(move |conn| {
        let answer: &str = row.correct_answer.as_ref();
        let difficulty: &str = row.difficulty.as_ref();
        conn.execute(
          "INSERT INTO mcq_questions
             (paper_id, topic_id, question_number, question_text, option_a, option_b,
              option_c, option_d, option_e, correct_answer, explanation, marks, difficulty,
              created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
          rusqlite::params![
            row.paper_id,
            row.topic_id,
            row.question_number,
            row.question_text,
            row.option_a,
            row.option_b,
            row.option_c,
            row.option_d,
            row.option_e.as_deref().filter(|e| !e.is_empty()),
            answer,
            row.explanation,
            row.marks,
            difficulty,
            at_str
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(McqQuestion {
      question_id,
      paper_id: input.paper_id,
      topic_id: input.topic_id,
      question_number: input.question_number,
      question_text: input.question_text,
      option_a: input.option_a,
      option_b: input.option_b,
      option_c: input.option_c,
      option_d: input.option_d,
      option_e: input.option_e.filter(|e| !e.is_empty()),
      correct_answer: input.correct_answer,
      explanation: input.explanation,
      marks: input.marks,
      difficulty: input.difficulty,
      created_at,
    })
  }

  async fn paper_mcqs(&self, paper_id: PaperId) -> Result<Vec<McqQuestion>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MCQ_COLS} FROM mcq_questions WHERE paper_id = ?1 ORDER BY question_number"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![paper_id], RawMcq::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawMcq::into_mcq).collect()
  }

  async fn add_essay(&self, input: NewEssayQuestion) -> Result<EssayQuestion> {
    let created_at = Utc::now();
    let row = input.clone();
    let at_str = encode_dt(created_at);

    let question_id = self
      .conn
      .call(move |conn| {
        let difficulty: &str = row.difficulty.as_ref();
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO essay_questions
             (paper_id, topic_id, question_number, section, question_text, marks,
              suggested_time_minutes, marking_scheme, sample_answer, difficulty, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            row.paper_id,
            row.topic_id,
            row.question_number,
            row.section,
            row.question_text,
            row.marks,
            row.suggested_time_minutes,
            row.marking_scheme,
            row.sample_answer,
            difficulty,
            at_str
          ],
        )?;
        let question_id = tx.last_insert_rowid();
        for sub in &row.sub_questions {
          tx.execute(
            "INSERT INTO essay_sub_questions
               (question_id, sub_number, question_text, marks, marking_scheme)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
              question_id,
              sub.sub_number,
              sub.question_text,
              sub.marks,
              sub.marking_scheme
            ],
          )?;
        }
        tx.commit()?;
        Ok(question_id)
      })
      .await?;

    let mut sub_questions = input.sub_questions;
    sub_questions.sort_by(|a, b| a.sub_number.cmp(&b.sub_number));
    Ok(EssayQuestion {
      question_id,
      paper_id: input.paper_id,
      topic_id: input.topic_id,
      question_number: input.question_number,
      section: input.section,
      question_text: input.question_text,
      marks: input.marks,
      suggested_time_minutes: input.suggested_time_minutes,
      marking_scheme: input.marking_scheme,
      sample_answer: input.sample_answer,
      difficulty: input.difficulty,
      created_at,
      sub_questions,
    })
  }

  async fn paper_essays(&self, paper_id: PaperId) -> Result<Vec<EssayQuestion>> {
    let (raws, subs) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ESSAY_COLS} FROM essay_questions WHERE paper_id = ?1
           ORDER BY section, question_number"
        ))?;
        let raws = stmt
          .query_map(rusqlite::params![paper_id], RawEssay::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {SUB_QUESTION_COLS} FROM essay_sub_questions
           WHERE question_id IN (SELECT question_id FROM essay_questions WHERE paper_id = ?1)
           ORDER BY question_id, sub_number"
        ))?;
        let subs = stmt
          .query_map(rusqlite::params![paper_id], sub_question_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((raws, subs))
      })
      .await?;

    let mut by_question: HashMap<i64, Vec<EssaySubQuestion>> = HashMap::new();
    for (question_id, sub) in subs {
      by_question.entry(question_id).or_default().push(sub);
    }
    raws
      .into_iter()
      .map(|raw| {
        let subs = by_question.remove(&raw.question_id).unwrap_or_default();
        raw.into_essay(subs)
      })
      .collect()
  }

  // ── Announcements / instructors ───────────────────────────────────────

  async fn add_announcement(&self, input: NewAnnouncement) -> Result<Announcement> {
    let created_at = Utc::now();
    let priority: &str = input.priority.as_ref();
    let row = (
      input.title.clone(),
      input.message.clone(),
      priority.to_owned(),
      encode_dt(created_at),
      input.expires_at.map(encode_dt),
    );

    let announcement_id = self
      .conn
      .call(move |conn| {
        let (title, message, priority, at_str, expires_str) = row;
        conn.execute(
          "INSERT INTO announcements (title, message, priority, is_active, created_at, expires_at)
           VALUES (?1, ?2, ?3, 1, ?4, ?5)",
          rusqlite::params![title, message, priority, at_str, expires_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Announcement {
      announcement_id,
      title: input.title,
      message: input.message,
      priority: input.priority,
      is_active: true,
      created_at,
      expires_at: input.expires_at,
    })
  }

  async fn visible_announcements(&self, now: DateTime<Utc>) -> Result<Vec<Announcement>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ANNOUNCEMENT_COLS} FROM announcements WHERE is_active = 1"
        ))?;
        let rows = stmt
          .query_map([], RawAnnouncement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut visible = Vec::with_capacity(raws.len());
    for raw in raws {
      let announcement = raw.into_announcement()?;
      if announcement.is_visible_at(now) {
        visible.push(announcement);
      }
    }
    Ok(visible)
  }

  async fn add_instructor(&self, input: NewInstructor) -> Result<Instructor> {
    let title: &str = input.title.as_ref();
    let role: &str = input.role.as_ref();
    let text = [
      title.to_owned(),
      input.first_name.clone(),
      input.last_name.clone(),
      role.to_owned(),
      input.position_title.clone(),
      input.highest_degree.clone(),
      input.institution.clone(),
      input.bio.clone(),
      input.photo.clone(),
      input.email.clone(),
    ];
    let (years, display_order, featured) =
      (input.years_experience, input.display_order, input.is_featured);

    let instructor_id = self
      .conn
      .call(move |conn| {
        let [title, first, last, role, position, degree, institution, bio, photo, email] = text;
        conn.execute(
          "INSERT INTO instructors
             (title, first_name, last_name, role, position_title, highest_degree, institution,
              years_experience, bio, photo, email, display_order, is_active, is_featured)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 1, ?13)",
          rusqlite::params![
            title,
            first,
            last,
            role,
            position,
            degree,
            institution,
            years,
            bio,
            photo,
            email,
            display_order,
            featured
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Instructor {
      instructor_id,
      title: input.title,
      first_name: input.first_name,
      last_name: input.last_name,
      role: input.role,
      position_title: input.position_title,
      highest_degree: input.highest_degree,
      institution: input.institution,
      years_experience: input.years_experience,
      bio: input.bio,
      photo: input.photo,
      email: input.email,
      display_order: input.display_order,
      is_active: true,
      is_featured: input.is_featured,
    })
  }

  async fn list_instructors(&self, featured_only: bool) -> Result<Vec<Instructor>> {
    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {INSTRUCTOR_COLS} FROM instructors
           WHERE is_active = 1 AND (?1 = 0 OR is_featured = 1)
           ORDER BY display_order, last_name"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![featured_only], RawInstructor::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawInstructor::into_instructor).collect()
  }
}
