//! Integration tests for `SqliteStore` against an in-memory database.

use std::{sync::Arc, time::Duration};

use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use wace_core::{
  account::{NewStudentProfile, NewUser, NotificationPreferences, Requester, UserId},
  catalog::{
    Lesson, LessonType, NewLesson, NewProgramme, NewSubject, NewTopic, ProgrammeName,
    ProgrammeSubject, Subject, SubjectType, Topic,
  },
  content::{ContentOptions, subject_detail},
  listing::{programme_detail, programme_summaries},
  notice::{InstructorRole, InstructorTitle, NewAnnouncement, NewInstructor, Priority},
  papers::{
    self, AnswerOption, Difficulty, EssaySubQuestion, NewEssayQuestion, NewMcqQuestion,
    NewPastPaper, NewQuestionTopic, PaperType, PastPaper,
  },
  policy::VideoSigner,
  progress::{self, UnmarkOutcome},
  store::CourseStore,
};
use wace_signer::{FailureMode, Signer, SigningConfig, verify};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn subject(s: &SqliteStore, code: &str, subject_type: SubjectType) -> Subject {
  s.add_subject(NewSubject {
    name: format!("Subject {code}"),
    code: code.into(),
    description: String::new(),
    subject_type,
  })
  .await
  .unwrap()
}

async fn topic(s: &SqliteStore, subject_id: i64, order: i64, is_published: bool) -> Topic {
  s.add_topic(NewTopic {
    subject_id,
    title: format!("Topic {order}"),
    description: String::new(),
    order,
    estimated_duration_hours: 2,
    is_published,
  })
  .await
  .unwrap()
}

async fn lesson(
  s: &SqliteStore,
  topic_id: i64,
  order: i64,
  video_url: Option<&str>,
  is_free: bool,
) -> Lesson {
  s.add_lesson(NewLesson {
    topic_id,
    title: format!("Lesson {order}"),
    lesson_type: if video_url.is_some() { LessonType::Video } else { LessonType::Reading },
    content: String::new(),
    notes: String::new(),
    video_url: video_url.map(str::to_owned),
    video_duration_minutes: video_url.map(|_| 12),
    order,
    is_free,
  })
  .await
  .unwrap()
}

fn new_user(username: &str) -> NewUser {
  NewUser {
    username:      username.into(),
    email:         format!("{username}@Example.com"),
    first_name:    "Ama".into(),
    last_name:     "Mensah".into(),
    password_hash: "$argon2id$stub".into(),
    is_staff:      false,
  }
}

async fn user(s: &SqliteStore, username: &str) -> UserId {
  s.add_user(new_user(username)).await.unwrap().user_id
}

fn new_student(programme_id: i64, index_number: &str) -> NewStudentProfile {
  NewStudentProfile {
    programme_id,
    phone_number: "+233 24 123 4567".into(),
    date_of_birth: NaiveDate::from_ymd_opt(2006, 5, 17).unwrap(),
    previous_school: "Wesley Girls".into(),
    wassce_year: 2025,
    index_number: index_number.into(),
  }
}

async fn programme(s: &SqliteStore, name: ProgrammeName) -> i64 {
  s.add_programme(NewProgramme {
    name,
    description: String::new(),
    price_pesewas: 40_000,
    duration_months: 12,
  })
  .await
  .unwrap()
  .programme_id
}

fn signer() -> Signer {
  let config = SigningConfig::new("AK", "SK", "sfo3", "media").unwrap();
  Signer::new(Some(config), FailureMode::Passthrough)
}

/// Runs a trait call on a spawned task, which needs the returned future to
/// be `Send` for any backend.
async fn count_programmes_on_task<S: CourseStore + 'static>(store: Arc<S>) -> usize {
  tokio::spawn(async move { store.list_programmes().await.map(|p| p.len()) })
    .await
    .unwrap()
    .unwrap()
}

#[tokio::test]
async fn trait_futures_run_on_spawned_tasks() {
  let s = Arc::new(store().await);
  programme(&s, ProgrammeName::VisualArts).await;
  assert_eq!(count_programmes_on_task(s).await, 1);
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_subject() {
  let s = store().await;
  let added = subject(&s, "MATH", SubjectType::Core).await;

  let fetched = s.get_subject(added.subject_id).await.unwrap().unwrap();
  assert_eq!(fetched.code, "MATH");
  assert_eq!(fetched.subject_type, SubjectType::Core);
  assert!(fetched.is_active);
}

#[tokio::test]
async fn missing_rows_return_none() {
  let s = store().await;
  assert!(s.get_subject(99).await.unwrap().is_none());
  assert!(s.get_topic(99).await.unwrap().is_none());
  assert!(s.get_lesson(99).await.unwrap().is_none());
  assert!(s.get_programme(99).await.unwrap().is_none());
}

#[tokio::test]
async fn topics_and_lessons_are_ordered() {
  let s = store().await;
  let subj = subject(&s, "PHY", SubjectType::Elective).await;
  let t2 = topic(&s, subj.subject_id, 2, true).await;
  let t1 = topic(&s, subj.subject_id, 1, true).await;
  lesson(&s, t2.topic_id, 1, None, false).await;
  lesson(&s, t1.topic_id, 2, None, false).await;
  lesson(&s, t1.topic_id, 1, None, false).await;

  let orders: Vec<i64> = s
    .list_topics(subj.subject_id)
    .await
    .unwrap()
    .iter()
    .map(|t| t.order)
    .collect();
  assert_eq!(orders, vec![1, 2]);

  let flat: Vec<(i64, i64)> = s
    .subject_lessons(subj.subject_id)
    .await
    .unwrap()
    .iter()
    .map(|l| (l.topic_id, l.order))
    .collect();
  assert_eq!(flat, vec![(t1.topic_id, 1), (t1.topic_id, 2), (t2.topic_id, 1)]);
}

#[tokio::test]
async fn duplicate_lesson_order_is_rejected() {
  let s = store().await;
  let subj = subject(&s, "CHEM", SubjectType::Elective).await;
  let t = topic(&s, subj.subject_id, 1, true).await;
  lesson(&s, t.topic_id, 1, None, false).await;

  let dup = s
    .add_lesson(NewLesson {
      topic_id: t.topic_id,
      title: "Again".into(),
      lesson_type: LessonType::Reading,
      content: String::new(),
      notes: String::new(),
      video_url: None,
      video_duration_minutes: None,
      order: 1,
      is_free: false,
    })
    .await;
  assert!(dup.is_err());
}

#[tokio::test]
async fn set_lesson_video_updates_row() {
  let s = store().await;
  let subj = subject(&s, "BIO", SubjectType::Elective).await;
  let t = topic(&s, subj.subject_id, 1, true).await;
  let l = lesson(&s, t.topic_id, 1, None, false).await;

  assert!(
    s.set_lesson_video(l.lesson_id, Some("https://cdn.example.com/v.mp4".into()))
      .await
      .unwrap()
  );
  let fetched = s.get_lesson(l.lesson_id).await.unwrap().unwrap();
  assert_eq!(fetched.video_url.as_deref(), Some("https://cdn.example.com/v.mp4"));
  assert!(!s.set_lesson_video(999, None).await.unwrap());
}

#[tokio::test]
async fn programme_subjects_are_core_first_then_order() {
  let s = store().await;
  let p = s
    .add_programme(NewProgramme {
      name:            ProgrammeName::GeneralScience,
      description:     "Science track".into(),
      price_pesewas:   50_000,
      duration_months: 12,
    })
    .await
    .unwrap();
  let elective = subject(&s, "ELEC", SubjectType::Elective).await;
  let core_b = subject(&s, "COREB", SubjectType::Core).await;
  let core_a = subject(&s, "COREA", SubjectType::Core).await;

  for (subject_id, order) in [(elective.subject_id, 0), (core_b.subject_id, 2), (core_a.subject_id, 1)] {
    s.link_subject(ProgrammeSubject { programme_id: p.programme_id, subject_id, is_required: true, order })
      .await
      .unwrap();
  }
  // Re-linking updates in place.
  s.link_subject(ProgrammeSubject {
    programme_id: p.programme_id,
    subject_id:   core_b.subject_id,
    is_required:  false,
    order:        0,
  })
  .await
  .unwrap();

  let links = s.programme_subjects(p.programme_id).await.unwrap();
  let codes: Vec<&str> = links.iter().map(|(_, subj)| subj.code.as_str()).collect();
  assert_eq!(codes, vec!["COREB", "COREA", "ELEC"]);
  assert!(!links[0].0.is_required);
}

#[tokio::test]
async fn programme_listing_groups_and_previews() {
  let s = store().await;
  let p = s
    .add_programme(NewProgramme {
      name:            ProgrammeName::Business,
      description:     String::new(),
      price_pesewas:   45_050,
      duration_months: 12,
    })
    .await
    .unwrap();
  let core = subject(&s, "ENG", SubjectType::Core).await;
  let elective = subject(&s, "ACC", SubjectType::Elective).await;
  for subj in [&core, &elective] {
    s.link_subject(ProgrammeSubject {
      programme_id: p.programme_id,
      subject_id:   subj.subject_id,
      is_required:  true,
      order:        0,
    })
    .await
    .unwrap();
  }
  for order in 1..=7 {
    topic(&s, core.subject_id, order, true).await;
  }

  let summaries = programme_summaries(&s).await.unwrap();
  assert_eq!(summaries.len(), 1);
  assert_eq!(summaries[0].display_name, "Business");
  assert_eq!(summaries[0].price, 450.5);
  assert_eq!(summaries[0].core_subjects[0].topics_count, 7);
  assert_eq!(summaries[0].elective_subjects[0].code, "ACC");

  let detail = programme_detail(&s, p.programme_id).await.unwrap();
  assert_eq!(detail.total_subjects, 2);
  assert_eq!(detail.subjects.core[0].topics_count, 7);
  assert_eq!(detail.subjects.core[0].topics.len(), 5);

  let missing = programme_detail(&s, 404).await.unwrap_err();
  assert!(missing.is_not_found());
}

// ─── Completions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn mark_complete_is_idempotent() {
  let s = store().await;
  let uid = user(&s, "kofi").await;
  let subj = subject(&s, "MATH", SubjectType::Core).await;
  let t = topic(&s, subj.subject_id, 1, true).await;
  let l = lesson(&s, t.topic_id, 1, None, false).await;

  let first = progress::mark_complete(&s, uid, l.lesson_id).await.unwrap();
  let second = progress::mark_complete(&s, uid, l.lesson_id).await.unwrap();
  assert!(first.was_created());
  assert!(!second.was_created());
  assert_eq!(first.completion().completed_at, second.completion().completed_at);
  assert_eq!(s.completed_in_topic(uid, t.topic_id).await.unwrap().len(), 1);

  assert_eq!(
    progress::unmark_complete(&s, uid, l.lesson_id).await.unwrap(),
    UnmarkOutcome::Removed
  );
  assert_eq!(
    progress::unmark_complete(&s, uid, l.lesson_id).await.unwrap(),
    UnmarkOutcome::WasNotComplete
  );
}

#[tokio::test]
async fn marking_missing_lesson_is_not_found() {
  let s = store().await;
  let uid = user(&s, "esi").await;
  let err = progress::mark_complete(&s, uid, 42).await.unwrap_err();
  assert!(matches!(err, wace_core::Error::LessonNotFound(42)));
}

#[tokio::test]
async fn completions_are_per_user() {
  let s = store().await;
  let a = user(&s, "abena").await;
  let b = user(&s, "yaw").await;
  let subj = subject(&s, "ICT", SubjectType::Elective).await;
  let t = topic(&s, subj.subject_id, 1, true).await;
  let l = lesson(&s, t.topic_id, 1, None, false).await;

  s.mark_complete(a, l.lesson_id).await.unwrap();
  assert!(s.completed_in_subject(a, subj.subject_id).await.unwrap().contains(&l.lesson_id));
  assert!(s.completed_in_subject(b, subj.subject_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn topic_progress_rounds_to_one_decimal() {
  let s = store().await;
  let uid = user(&s, "akua").await;
  let subj = subject(&s, "GEO", SubjectType::Elective).await;
  let t = topic(&s, subj.subject_id, 1, true).await;
  let l1 = lesson(&s, t.topic_id, 1, None, false).await;
  lesson(&s, t.topic_id, 2, None, false).await;
  lesson(&s, t.topic_id, 3, None, false).await;
  s.mark_complete(uid, l1.lesson_id).await.unwrap();

  let p = progress::topic_progress(&s, uid, t.topic_id).await.unwrap();
  assert_eq!(p.total_lessons, 3);
  assert_eq!(p.completed_lessons, 1);
  assert_eq!(p.progress_percentage, 33.3);
  assert!(p.lessons[0].is_completed);
}

// ─── Content serializer ──────────────────────────────────────────────────────

#[tokio::test]
async fn anonymous_sees_signed_free_video_and_no_paid_video() {
  let s = store().await;
  let subj = subject(&s, "MATH", SubjectType::Core).await;
  let t = topic(&s, subj.subject_id, 1, true).await;
  lesson(&s, t.topic_id, 1, Some("https://bucket.example.com/videos/a.mp4"), true).await;
  lesson(&s, t.topic_id, 2, Some("https://bucket.example.com/videos/b.mp4"), false).await;
  lesson(&s, t.topic_id, 3, None, true).await;

  let tree = subject_detail(
    &s,
    &signer(),
    &ContentOptions::default(),
    subj.subject_id,
    Requester::Anonymous,
  )
  .await
  .unwrap();

  let lessons = &tree.topics[0].lessons;
  assert_eq!(tree.total_topics, 1);
  assert_eq!(tree.topics[0].lessons_count, 3);

  let free = lessons[0].video_url.as_deref().unwrap();
  let params = verify::PresignedParams::parse(free).unwrap();
  assert_eq!(params.path, "/videos/a.mp4");
  assert_eq!(params.expires, 3600);

  assert_eq!(lessons[1].video_url, None);
  assert_eq!(lessons[2].video_url, None);
  assert!(lessons.iter().all(|l| !l.is_completed));
}

#[tokio::test]
async fn authenticated_user_sees_paid_video_and_completion() {
  let s = store().await;
  let uid = user(&s, "kwame").await;
  let subj = subject(&s, "MATH", SubjectType::Core).await;
  let t = topic(&s, subj.subject_id, 1, true).await;
  let paid = lesson(&s, t.topic_id, 1, Some("https://bucket.example.com/videos/b.mp4"), false).await;
  s.mark_complete(uid, paid.lesson_id).await.unwrap();

  let now = Utc::now();
  let tree = subject_detail(
    &s,
    &signer(),
    &ContentOptions::default(),
    subj.subject_id,
    Requester::User(uid),
  )
  .await
  .unwrap();

  let node = &tree.topics[0].lessons[0];
  assert!(node.is_completed);
  let url = node.video_url.as_deref().unwrap();
  assert_ne!(url, "https://bucket.example.com/videos/b.mp4");
  let config = SigningConfig::new("AK", "SK", "sfo3", "media").unwrap();
  assert_eq!(verify::verify(&config, url, now + TimeDelta::seconds(5)), Ok(()));
}

#[tokio::test]
async fn unconfigured_signer_passes_raw_url_through() {
  let s = store().await;
  let subj = subject(&s, "MATH", SubjectType::Core).await;
  let t = topic(&s, subj.subject_id, 1, true).await;
  lesson(&s, t.topic_id, 1, Some("https://bucket.example.com/videos/a.mp4"), true).await;

  let unsigned = Signer::new(None, FailureMode::Passthrough);
  let tree = subject_detail(
    &s,
    &unsigned,
    &ContentOptions::default(),
    subj.subject_id,
    Requester::Anonymous,
  )
  .await
  .unwrap();
  assert_eq!(
    tree.topics[0].lessons[0].video_url.as_deref(),
    Some("https://bucket.example.com/videos/a.mp4")
  );
}

#[tokio::test]
async fn every_exposed_video_uses_configured_ttl() {
  struct Ttls(std::sync::Mutex<Vec<Duration>>);
  impl VideoSigner for Ttls {
    fn sign(&self, url: &str, ttl: Duration) -> Option<String> {
      self.0.lock().unwrap().push(ttl);
      Some(url.to_owned())
    }
  }

  let s = store().await;
  let uid = user(&s, "efua").await;
  let subj = subject(&s, "LIT", SubjectType::Elective).await;
  for order in 1..=2 {
    let t = topic(&s, subj.subject_id, order, true).await;
    lesson(&s, t.topic_id, 1, Some("https://b.example.com/x.mp4"), false).await;
  }

  let recorder = Ttls(Default::default());
  let options = ContentOptions { video_ttl: Duration::from_secs(900), ..Default::default() };
  subject_detail(&s, &recorder, &options, subj.subject_id, Requester::User(uid))
    .await
    .unwrap();
  assert_eq!(*recorder.0.lock().unwrap(), vec![Duration::from_secs(900); 2]);
}

#[tokio::test]
async fn unpublished_topics_can_be_hidden() {
  let s = store().await;
  let subj = subject(&s, "ART", SubjectType::Elective).await;
  topic(&s, subj.subject_id, 1, true).await;
  topic(&s, subj.subject_id, 2, false).await;

  let shown = subject_detail(
    &s,
    &signer(),
    &ContentOptions::default(),
    subj.subject_id,
    Requester::Anonymous,
  )
  .await
  .unwrap();
  assert_eq!(shown.total_topics, 2);

  let hidden = subject_detail(
    &s,
    &signer(),
    &ContentOptions { hide_unpublished_topics: true, ..Default::default() },
    subj.subject_id,
    Requester::Anonymous,
  )
  .await
  .unwrap();
  assert_eq!(hidden.total_topics, 1);
  assert!(hidden.topics[0].is_published);
}

#[tokio::test]
async fn failed_completion_lookup_reads_as_not_completed() {
  let s = store().await;
  let uid = user(&s, "nana").await;
  let subj = subject(&s, "ECON", SubjectType::Elective).await;
  let t = topic(&s, subj.subject_id, 1, true).await;
  lesson(&s, t.topic_id, 1, None, false).await;

  s.execute_raw("DROP TABLE lesson_completions").await.unwrap();

  let tree = subject_detail(
    &s,
    &signer(),
    &ContentOptions::default(),
    subj.subject_id,
    Requester::User(uid),
  )
  .await
  .unwrap();
  assert!(!tree.topics[0].lessons[0].is_completed);
}

#[tokio::test]
async fn unknown_subject_is_not_found() {
  let s = store().await;
  let err = subject_detail(&s, &signer(), &ContentOptions::default(), 7, Requester::Anonymous)
    .await
    .unwrap_err();
  assert!(matches!(err, wace_core::Error::SubjectNotFound(7)));
}

// ─── Accounts & tokens ───────────────────────────────────────────────────────

#[tokio::test]
async fn find_user_by_username_or_email() {
  let s = store().await;
  let uid = user(&s, "adwoa").await;

  assert_eq!(s.find_user("adwoa").await.unwrap().unwrap().user_id, uid);
  assert_eq!(s.find_user("ADWOA@example.com").await.unwrap().unwrap().user_id, uid);
  assert!(s.find_user("nobody").await.unwrap().is_none());
  assert!(s.username_taken("adwoa").await.unwrap());
  assert!(s.email_taken("Adwoa@Example.COM").await.unwrap());
}

#[tokio::test]
async fn tokens_resolve_and_revoke() {
  let s = store().await;
  let uid = user(&s, "kojo").await;
  s.issue_token(uid, "digest-1".into()).await.unwrap();
  s.issue_token(uid, "digest-2".into()).await.unwrap();

  assert_eq!(s.user_for_token("digest-1").await.unwrap().unwrap().user_id, uid);
  assert!(s.revoke_token("digest-1").await.unwrap());
  assert!(s.user_for_token("digest-1").await.unwrap().is_none());
  assert!(!s.revoke_token("digest-1").await.unwrap());
  assert_eq!(s.revoke_user_tokens(uid).await.unwrap(), 1);
  assert!(s.user_for_token("digest-2").await.unwrap().is_none());
}

#[tokio::test]
async fn student_profile_and_notifications() {
  let s = store().await;
  let pid = programme(&s, ProgrammeName::GeneralArts).await;

  let (account, profile) = s
    .register_student(new_user("afia"), new_student(pid, "0123456789"))
    .await
    .unwrap();
  let uid = account.user_id;
  assert_eq!(profile.user_id, uid);
  assert_eq!(account.email, "afia@example.com");
  assert_eq!(profile.notifications, NotificationPreferences::default());
  assert!(s.index_number_taken("0123456789").await.unwrap());
  assert_eq!(s.get_student(uid).await.unwrap().unwrap().programme_id, pid);

  let prefs = NotificationPreferences { weekly_summary: false, ..Default::default() };
  let updated = s.set_notifications(uid, prefs).await.unwrap().unwrap();
  assert!(!updated.notifications.weekly_summary);
  assert!(updated.notifications.course_updates);
  assert_eq!(updated.date_of_birth, NaiveDate::from_ymd_opt(2006, 5, 17).unwrap());

  let stranger = user(&s, "no-profile").await;
  assert!(s.set_notifications(stranger, prefs).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_student_insert_leaves_no_user_behind() {
  let s = store().await;
  let pid = programme(&s, ProgrammeName::Business).await;
  s.register_student(new_user("first"), new_student(pid, "5550001111"))
    .await
    .unwrap();

  let err = s
    .register_student(new_user("second"), new_student(pid, "5550001111"))
    .await;
  assert!(err.is_err());
  assert!(!s.username_taken("second").await.unwrap());
  assert!(!s.email_taken("second@example.com").await.unwrap());

  let missing_programme = s
    .register_student(new_user("third"), new_student(pid + 100, "5550002222"))
    .await;
  assert!(missing_programme.is_err());
  assert!(!s.username_taken("third").await.unwrap());
}

#[tokio::test]
async fn deactivated_user_tokens_stop_resolving() {
  let s = store().await;
  let uid = user(&s, "esi").await;
  s.issue_token(uid, "digest-esi".into()).await.unwrap();

  assert!(s.set_user_active(uid, false).await.unwrap());
  assert!(!s.get_user(uid).await.unwrap().unwrap().is_active);
  assert!(s.user_for_token("digest-esi").await.unwrap().is_none());

  assert!(s.set_user_active(uid, true).await.unwrap());
  assert_eq!(s.user_for_token("digest-esi").await.unwrap().unwrap().user_id, uid);
  assert!(!s.set_user_active(uid + 100, false).await.unwrap());
}

#[tokio::test]
async fn set_password_hash_replaces_hash() {
  let s = store().await;
  let uid = user(&s, "yaa").await;
  assert!(s.set_password_hash(uid, "$argon2id$new".into()).await.unwrap());
  assert_eq!(s.get_user(uid).await.unwrap().unwrap().password_hash, "$argon2id$new");
}

// ─── Past papers ─────────────────────────────────────────────────────────────

async fn paper(
  s: &SqliteStore,
  subject_id: i64,
  year: i32,
  number: i64,
  published: bool,
) -> PastPaper {
  s.add_paper(NewPastPaper {
    subject_id,
    year,
    paper_number: number,
    paper_type: if number == 1 { PaperType::Objective } else { PaperType::Essay },
    title: format!("{year} Paper {number}"),
    instructions: "Answer all questions.".into(),
    duration_minutes: 90,
    total_marks: 50,
    is_published: published,
  })
  .await
  .unwrap()
}

fn mcq(paper_id: i64, number: i64, topic_id: Option<i64>) -> NewMcqQuestion {
  NewMcqQuestion {
    paper_id,
    topic_id,
    question_number: number,
    question_text: format!("Question {number}"),
    option_a: "2".into(),
    option_b: "3".into(),
    option_c: "4".into(),
    option_d: "5".into(),
    option_e: Some(String::new()),
    correct_answer: AnswerOption::C,
    explanation: "2 + 2".into(),
    marks: 1,
    difficulty: Difficulty::Easy,
  }
}

fn essay(paper_id: i64, number: i64, section: &str, subs: &[&str]) -> NewEssayQuestion {
  NewEssayQuestion {
    paper_id,
    topic_id: None,
    question_number: number,
    section: section.into(),
    question_text: format!("Essay {number}"),
    marks: 10,
    suggested_time_minutes: 15,
    marking_scheme: "secret scheme".into(),
    sample_answer: String::new(),
    difficulty: Difficulty::Hard,
    sub_questions: subs
      .iter()
      .map(|n| EssaySubQuestion {
        sub_number:     (*n).into(),
        question_text:  format!("Part {n}"),
        marks:          5,
        marking_scheme: String::new(),
      })
      .collect(),
  }
}

#[tokio::test]
async fn duplicate_paper_number_is_rejected() {
  let s = store().await;
  let subj = subject(&s, "MATH", SubjectType::Core).await;
  paper(&s, subj.subject_id, 2020, 1, true).await;

  let dup = s
    .add_paper(NewPastPaper {
      subject_id:       subj.subject_id,
      year:             2020,
      paper_number:     1,
      paper_type:       PaperType::Mixed,
      title:            "again".into(),
      instructions:     String::new(),
      duration_minutes: 180,
      total_marks:      100,
      is_published:     false,
    })
    .await;
  assert!(dup.is_err());
}

#[tokio::test]
async fn published_papers_are_filtered_ordered_and_counted() {
  let s = store().await;
  let math = subject(&s, "MATH", SubjectType::Core).await;
  let eng = subject(&s, "ENG", SubjectType::Core).await;
  let other = subject(&s, "ART", SubjectType::Elective).await;

  let m2019 = paper(&s, math.subject_id, 2019, 1, true).await;
  let m2021_2 = paper(&s, math.subject_id, 2021, 2, true).await;
  let m2021_1 = paper(&s, math.subject_id, 2021, 1, true).await;
  let e2021 = paper(&s, eng.subject_id, 2021, 1, true).await;
  paper(&s, math.subject_id, 2022, 1, false).await;
  paper(&s, math.subject_id, 1985, 1, true).await;
  paper(&s, other.subject_id, 2021, 1, true).await;

  s.add_mcq(mcq(m2021_1.paper_id, 1, None)).await.unwrap();
  s.add_mcq(mcq(m2021_1.paper_id, 2, None)).await.unwrap();
  s.add_essay(essay(m2021_1.paper_id, 3, "B", &[])).await.unwrap();

  let listed = s
    .published_papers(vec![math.subject_id, eng.subject_id], 1990..=2025)
    .await
    .unwrap();
  let ids: Vec<i64> = listed.iter().map(|(p, _)| p.paper_id).collect();
  // 2021 first; "Subject ENG" sorts before "Subject MATH".
  assert_eq!(ids, vec![e2021.paper_id, m2021_1.paper_id, m2021_2.paper_id, m2019.paper_id]);
  assert_eq!(listed[1].1, 3);
  assert_eq!(listed[0].1, 0);

  assert!(s.published_papers(Vec::new(), 1990..=2025).await.unwrap().is_empty());

  let finished = s.get_paper(m2019.paper_id).await.unwrap().unwrap();
  assert!(finished.is_published);
  assert!(s.set_paper_published(m2019.paper_id, false).await.unwrap());
  assert!(!s.get_paper(m2019.paper_id).await.unwrap().unwrap().is_published);
}

#[tokio::test]
async fn questions_come_back_in_paper_order() {
  let s = store().await;
  let subj = subject(&s, "BIO", SubjectType::Elective).await;
  let cells = s
    .add_question_topic(NewQuestionTopic {
      subject_id:  subj.subject_id,
      name:        "Cells".into(),
      description: String::new(),
      order:       1,
    })
    .await
    .unwrap();
  let p = paper(&s, subj.subject_id, 2023, 2, true).await;

  s.add_mcq(mcq(p.paper_id, 2, None)).await.unwrap();
  let first = s.add_mcq(mcq(p.paper_id, 1, Some(cells.question_topic_id))).await.unwrap();
  assert_eq!(first.option_e, None);
  assert!(s.add_mcq(mcq(p.paper_id, 1, None)).await.is_err());

  s.add_essay(essay(p.paper_id, 4, "B", &[])).await.unwrap();
  s.add_essay(essay(p.paper_id, 2, "B", &["b", "a"])).await.unwrap();
  s.add_essay(essay(p.paper_id, 5, "A", &[])).await.unwrap();

  let mcqs = s.paper_mcqs(p.paper_id).await.unwrap();
  let numbers: Vec<i64> = mcqs.iter().map(|q| q.question_number).collect();
  assert_eq!(numbers, vec![1, 2]);
  assert_eq!(mcqs[0].topic_id, Some(cells.question_topic_id));
  assert_eq!(mcqs[0].correct_answer, AnswerOption::C);

  let essays = s.paper_essays(p.paper_id).await.unwrap();
  let order: Vec<(&str, i64)> =
    essays.iter().map(|q| (q.section.as_str(), q.question_number)).collect();
  assert_eq!(order, vec![("A", 5), ("B", 2), ("B", 4)]);
  let subs: Vec<&str> = essays[1].sub_questions.iter().map(|q| q.sub_number.as_str()).collect();
  assert_eq!(subs, vec!["a", "b"]);
  assert!(essays[2].sub_questions.is_empty());

  let topics = s.question_topics(vec![subj.subject_id]).await.unwrap();
  assert_eq!(topics.len(), 1);
  assert_eq!(topics[0].name, "Cells");
}

#[tokio::test]
async fn student_papers_group_by_subject_and_hide_answers() {
  let s = store().await;
  let pid = programme(&s, ProgrammeName::GeneralScience).await;
  let math = subject(&s, "MATH", SubjectType::Core).await;
  let chem = subject(&s, "CHEM", SubjectType::Elective).await;
  for (order, subj) in [&math, &chem].into_iter().enumerate() {
    s.link_subject(ProgrammeSubject {
      programme_id: pid,
      subject_id:   subj.subject_id,
      is_required:  true,
      order:        order as i64,
    })
    .await
    .unwrap();
  }
  let (account, _) = s
    .register_student(new_user("kwame"), new_student(pid, "7770001111"))
    .await
    .unwrap();

  let chem_2024 = paper(&s, chem.subject_id, 2024, 1, true).await;
  paper(&s, math.subject_id, 2023, 1, true).await;
  paper(&s, math.subject_id, 2024, 2, true).await;
  s.add_mcq(mcq(chem_2024.paper_id, 1, None)).await.unwrap();
  s.add_question_topic(NewQuestionTopic {
    subject_id:  math.subject_id,
    name:        "Algebra".into(),
    description: "Equations".into(),
    order:       1,
  })
  .await
  .unwrap();

  let listing = papers::student_papers(&s, account.user_id).await.unwrap();
  assert_eq!(listing.programme.display_name, "General Science");
  assert_eq!(listing.total_papers, 3);
  let codes: Vec<&str> = listing.subjects.iter().map(|g| g.code.as_str()).collect();
  // 2024 CHEM sorts ahead of 2024 MATH by subject name.
  assert_eq!(codes, vec!["CHEM", "MATH"]);
  let math_years: Vec<i32> = listing.subjects[1].papers.iter().map(|p| p.year).collect();
  assert_eq!(math_years, vec![2024, 2023]);
  assert_eq!(listing.subjects[0].papers[0].question_count, 1);
  assert_eq!(listing.topics[0].subject.name, "Subject MATH");
  assert_eq!(listing.year_range.start, 1990);

  let stranger = user(&s, "visitor").await;
  let err = papers::student_papers(&s, stranger).await.unwrap_err();
  assert!(matches!(err, wace_core::Error::StudentProfileNotFound(id) if id == stranger));

  let detail = papers::paper_detail(&s, chem_2024.paper_id).await.unwrap();
  assert_eq!(detail.total_questions, 1);
  assert_eq!(detail.paper.subject, "Subject CHEM");
  let json = serde_json::to_string(&detail).unwrap();
  assert!(!json.contains("correct_answer"), "{json}");
  assert!(!json.contains("2 + 2"), "{json}");

  let draft = paper(&s, chem.subject_id, 2025, 1, false).await;
  let err = papers::paper_detail(&s, draft.paper_id).await.unwrap_err();
  assert!(matches!(err, wace_core::Error::PaperNotFound(_)));
}

#[tokio::test]
async fn paper_detail_hides_marking_schemes() {
  let s = store().await;
  let subj = subject(&s, "LIT", SubjectType::Elective).await;
  let p = paper(&s, subj.subject_id, 2018, 2, true).await;
  s.add_essay(essay(p.paper_id, 1, "A", &["a", "b"])).await.unwrap();
  s.add_essay(essay(p.paper_id, 2, "A", &[])).await.unwrap();

  let detail = papers::paper_detail(&s, p.paper_id).await.unwrap();
  assert!(detail.mcq_questions.is_empty());
  assert!(detail.essay_questions[0].has_sub_questions);
  assert_eq!(detail.essay_questions[0].sub_questions.len(), 2);
  assert!(!detail.essay_questions[1].has_sub_questions);
  let json = serde_json::to_string(&detail).unwrap();
  assert!(!json.contains("secret scheme"), "{json}");
  assert!(!json.contains("sample_answer"), "{json}");
}

// ─── Notices ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn expired_announcements_are_hidden() {
  let s = store().await;
  let now = Utc.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();
  s.add_announcement(NewAnnouncement {
    title:      "Mock exams".into(),
    message:    "Register by Friday".into(),
    priority:   Priority::High,
    expires_at: Some(now + TimeDelta::days(1)),
  })
  .await
  .unwrap();
  s.add_announcement(NewAnnouncement {
    title:      "Old".into(),
    message:    "Gone".into(),
    priority:   Priority::Urgent,
    expires_at: Some(now - TimeDelta::seconds(1)),
  })
  .await
  .unwrap();

  let visible = s.visible_announcements(now).await.unwrap();
  assert_eq!(visible.len(), 1);
  assert_eq!(visible[0].title, "Mock exams");
}

#[tokio::test]
async fn instructors_ordered_and_filtered() {
  let s = store().await;
  for (last, order, featured) in [("Owusu", 2, false), ("Asante", 1, true), ("Boateng", 1, false)] {
    s.add_instructor(NewInstructor {
      title:            InstructorTitle::Dr,
      first_name:       "Kwesi".into(),
      last_name:        last.into(),
      role:             InstructorRole::Lecturer,
      position_title:   "Senior Lecturer".into(),
      highest_degree:   "PhD".into(),
      institution:      "KNUST".into(),
      years_experience: 10,
      bio:              String::new(),
      photo:            String::new(),
      email:            String::new(),
      display_order:    order,
      is_featured:      featured,
    })
    .await
    .unwrap();
  }

  let all: Vec<String> = s
    .list_instructors(false)
    .await
    .unwrap()
    .into_iter()
    .map(|i| i.last_name)
    .collect();
  assert_eq!(all, vec!["Asante", "Boateng", "Owusu"]);

  let featured = s.list_instructors(true).await.unwrap();
  assert_eq!(featured.len(), 1);
  assert_eq!(featured[0].full_name(), "Dr. Kwesi Asante");
}
