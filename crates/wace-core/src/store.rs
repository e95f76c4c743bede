//! The `CourseStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `wace-store-sqlite`).
//! Higher layers (`wace-api`, `wace-server`) depend on this abstraction, not
//! on any concrete backend.

use std::{collections::BTreeSet, future::Future, ops::RangeInclusive};

use chrono::{DateTime, Utc};

use crate::{
  account::{NewStudentProfile, NewUser, NotificationPreferences, StudentProfile, User, UserId},
  catalog::{
    Lesson, LessonId, NewLesson, NewProgramme, NewSubject, NewTopic, Programme, ProgrammeId,
    ProgrammeSubject, Subject, SubjectId, Topic, TopicId,
  },
  notice::{Announcement, Instructor, NewAnnouncement, NewInstructor},
  papers::{
    EssayQuestion, McqQuestion, NewEssayQuestion, NewMcqQuestion, NewPastPaper,
    NewQuestionTopic, PaperId, PastPaper, QuestionTopic,
  },
  progress::MarkOutcome,
};

/// Abstraction over a course store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CourseStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Programmes ────────────────────────────────────────────────────────

  fn add_programme(
    &self,
    input: NewProgramme,
  ) -> impl Future<Output = Result<Programme, Self::Error>> + Send + '_;

  fn list_programmes(&self) -> impl Future<Output = Result<Vec<Programme>, Self::Error>> + Send + '_;

  fn get_programme(
    &self,
    id: ProgrammeId,
  ) -> impl Future<Output = Result<Option<Programme>, Self::Error>> + Send + '_;

  /// Place a subject inside a programme. Re-linking an existing pair updates
  /// `is_required` and `order`.
  fn link_subject(
    &self,
    link: ProgrammeSubject,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Subjects of a programme, ordered by subject type (core first) then by the
  /// join row's `order`.
  fn programme_subjects(
    &self,
    id: ProgrammeId,
  ) -> impl Future<Output = Result<Vec<(ProgrammeSubject, Subject)>, Self::Error>> + Send + '_;

  // ── Subjects / topics / lessons ───────────────────────────────────────

  fn add_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    id: SubjectId,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  fn add_topic(&self, input: NewTopic) -> impl Future<Output = Result<Topic, Self::Error>> + Send + '_;

  fn get_topic(
    &self,
    id: TopicId,
  ) -> impl Future<Output = Result<Option<Topic>, Self::Error>> + Send + '_;

  /// Topics of a subject ordered by `order`.
  fn list_topics(
    &self,
    subject_id: SubjectId,
  ) -> impl Future<Output = Result<Vec<Topic>, Self::Error>> + Send + '_;

  fn add_lesson(
    &self,
    input: NewLesson,
  ) -> impl Future<Output = Result<Lesson, Self::Error>> + Send + '_;

  fn get_lesson(
    &self,
    id: LessonId,
  ) -> impl Future<Output = Result<Option<Lesson>, Self::Error>> + Send + '_;

  /// Lessons of a topic ordered by `order`.
  fn list_lessons(
    &self,
    topic_id: TopicId,
  ) -> impl Future<Output = Result<Vec<Lesson>, Self::Error>> + Send + '_;

  /// Every lesson of every topic in a subject, in one pass, ordered by
  /// (topic order, lesson order).
  fn subject_lessons(
    &self,
    subject_id: SubjectId,
  ) -> impl Future<Output = Result<Vec<Lesson>, Self::Error>> + Send + '_;

  /// Admin edit: replace a lesson's stored video URL. Returns `false` if the
  /// lesson does not exist.
  fn set_lesson_video(
    &self,
    id: LessonId,
    video_url: Option<String>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Completions ───────────────────────────────────────────────────────

  /// Get-or-create the completion row for (user, lesson).
  fn mark_complete(
    &self,
    user_id: UserId,
    lesson_id: LessonId,
  ) -> impl Future<Output = Result<MarkOutcome, Self::Error>> + Send + '_;

  /// Delete the completion row. Returns `false` if there was none.
  fn unmark_complete(
    &self,
    user_id: UserId,
    lesson_id: LessonId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Lesson IDs the user has completed within a subject.
  fn completed_in_subject(
    &self,
    user_id: UserId,
    subject_id: SubjectId,
  ) -> impl Future<Output = Result<BTreeSet<LessonId>, Self::Error>> + Send + '_;

  /// Lesson IDs the user has completed within a topic.
  fn completed_in_topic(
    &self,
    user_id: UserId,
    topic_id: TopicId,
  ) -> impl Future<Output = Result<BTreeSet<LessonId>, Self::Error>> + Send + '_;

  // ── Accounts ──────────────────────────────────────────────────────────

  fn add_user(&self, input: NewUser) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(&self, id: UserId) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look a user up by username, falling back to email.
  fn find_user<'a>(
    &'a self,
    login: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn username_taken<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn email_taken<'a>(&'a self, email: &'a str) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn set_password_hash(
    &self,
    id: UserId,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Activate or deactivate an account. Tokens of an inactive user stop
  /// resolving. Returns `false` if the user does not exist.
  fn set_user_active(
    &self,
    id: UserId,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Create a user and their student profile together. Neither row is kept
  /// if either insert fails.
  fn register_student(
    &self,
    user: NewUser,
    student: NewStudentProfile,
  ) -> impl Future<Output = Result<(User, StudentProfile), Self::Error>> + Send + '_;

  fn get_student(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<Option<StudentProfile>, Self::Error>> + Send + '_;

  fn index_number_taken<'a>(
    &'a self,
    index_number: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Returns the updated profile, or `None` if the user has no profile.
  fn set_notifications(
    &self,
    user_id: UserId,
    prefs: NotificationPreferences,
  ) -> impl Future<Output = Result<Option<StudentProfile>, Self::Error>> + Send + '_;

  // ── Tokens ────────────────────────────────────────────────────────────
  //
  // Tokens are identified by the SHA-256 digest of the secret handed to the
  // client; the secret itself is never stored.

  fn issue_token(
    &self,
    user_id: UserId,
    digest: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The active user owning `digest`, if any.
  fn user_for_token<'a>(
    &'a self,
    digest: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn revoke_token<'a>(&'a self, digest: &'a str) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn revoke_user_tokens(
    &self,
    user_id: UserId,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Past papers ───────────────────────────────────────────────────────

  fn add_question_topic(
    &self,
    input: NewQuestionTopic,
  ) -> impl Future<Output = Result<QuestionTopic, Self::Error>> + Send + '_;

  /// Question topics of the given subjects, ordered by (subject name,
  /// `order`, name).
  fn question_topics(
    &self,
    subject_ids: Vec<SubjectId>,
  ) -> impl Future<Output = Result<Vec<QuestionTopic>, Self::Error>> + Send + '_;

  fn add_paper(
    &self,
    input: NewPastPaper,
  ) -> impl Future<Output = Result<PastPaper, Self::Error>> + Send + '_;

  /// A paper regardless of publication state.
  fn get_paper(
    &self,
    id: PaperId,
  ) -> impl Future<Output = Result<Option<PastPaper>, Self::Error>> + Send + '_;

  fn set_paper_published(
    &self,
    id: PaperId,
    published: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Published papers of the given subjects within `years`, each with its
  /// combined multiple-choice and essay question count. Ordered by year
  /// descending, then subject name, then paper number.
  fn published_papers(
    &self,
    subject_ids: Vec<SubjectId>,
    years: RangeInclusive<i32>,
  ) -> impl Future<Output = Result<Vec<(PastPaper, usize)>, Self::Error>> + Send + '_;

  fn add_mcq(
    &self,
    input: NewMcqQuestion,
  ) -> impl Future<Output = Result<McqQuestion, Self::Error>> + Send + '_;

  /// Multiple-choice questions of a paper ordered by question number.
  fn paper_mcqs(
    &self,
    paper_id: PaperId,
  ) -> impl Future<Output = Result<Vec<McqQuestion>, Self::Error>> + Send + '_;

  /// Insert an essay question and its sub-questions as one unit.
  fn add_essay(
    &self,
    input: NewEssayQuestion,
  ) -> impl Future<Output = Result<EssayQuestion, Self::Error>> + Send + '_;

  /// Essay questions of a paper ordered by (section, question number), each
  /// with its sub-questions.
  fn paper_essays(
    &self,
    paper_id: PaperId,
  ) -> impl Future<Output = Result<Vec<EssayQuestion>, Self::Error>> + Send + '_;

  // ── Announcements / instructors ───────────────────────────────────────

  fn add_announcement(
    &self,
    input: NewAnnouncement,
  ) -> impl Future<Output = Result<Announcement, Self::Error>> + Send + '_;

  /// Active announcements not expired as of `now`, in no particular order.
  fn visible_announcements(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Announcement>, Self::Error>> + Send + '_;

  fn add_instructor(
    &self,
    input: NewInstructor,
  ) -> impl Future<Output = Result<Instructor, Self::Error>> + Send + '_;

  /// Active instructors ordered by (`display_order`, `last_name`).
  fn list_instructors(
    &self,
    featured_only: bool,
  ) -> impl Future<Output = Result<Vec<Instructor>, Self::Error>> + Send + '_;
}
