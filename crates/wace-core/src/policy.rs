//! Video access policy.
//!
//! Decides, per lesson and per requester, whether a lesson's video is exposed
//! as a signed URL or withheld. The stored URL is only ever handed to a
//! [`VideoSigner`]; what the signer returns is what the client sees.
//!
//! | has video | authenticated | free | exposed        |
//! |-----------|---------------|------|----------------|
//! | no        | any           | any  | `null`         |
//! | yes       | yes           | any  | signed URL     |
//! | yes       | no            | yes  | signed URL     |
//! | yes       | no            | no   | `null`         |

use std::time::Duration;

use crate::{account::Requester, catalog::Lesson};

/// Default lifetime of an exposed video URL.
pub const DEFAULT_VIDEO_TTL: Duration = Duration::from_secs(3600);

/// Turns a stored object URL into a time-limited URL for the client.
///
/// Returning `None` withholds the video entirely.
pub trait VideoSigner: Send + Sync {
  fn sign(&self, video_url: &str, expires_in: Duration) -> Option<String>;
}

impl<T: VideoSigner + ?Sized> VideoSigner for std::sync::Arc<T> {
  fn sign(&self, video_url: &str, expires_in: Duration) -> Option<String> {
    (**self).sign(video_url, expires_in)
  }
}

/// Outcome of the decision table for one lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoAccess {
  /// The lesson has no video.
  NoVideo,
  /// Paid lesson, anonymous requester.
  Withheld,
  /// Expose a signed URL.
  Sign,
}

pub fn decide(lesson: &Lesson, requester: &Requester) -> VideoAccess {
  if !lesson.has_video() {
    VideoAccess::NoVideo
  } else if requester.is_authenticated() || lesson.is_free {
    VideoAccess::Sign
  } else {
    VideoAccess::Withheld
  }
}

/// The `video_url` value to put in the response for this requester.
pub fn expose<V>(lesson: &Lesson, requester: &Requester, signer: &V, ttl: Duration) -> Option<String>
where
  V: VideoSigner + ?Sized,
{
  match decide(lesson, requester) {
    VideoAccess::NoVideo | VideoAccess::Withheld => None,
    VideoAccess::Sign => lesson
      .video_url
      .as_deref()
      .and_then(|url| signer.sign(url, ttl)),
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::Utc;

  use super::*;
  use crate::catalog::LessonType;

  /// Records every call and returns `signed:<url>?ttl=<secs>`.
  #[derive(Default)]
  struct RecordingSigner {
    calls: Mutex<Vec<(String, u64)>>,
  }

  impl VideoSigner for RecordingSigner {
    fn sign(&self, video_url: &str, expires_in: Duration) -> Option<String> {
      self
        .calls
        .lock()
        .unwrap()
        .push((video_url.to_string(), expires_in.as_secs()));
      Some(format!("signed:{video_url}?ttl={}", expires_in.as_secs()))
    }
  }

  fn lesson(video_url: Option<&str>, is_free: bool) -> Lesson {
    Lesson {
      lesson_id:              1,
      topic_id:               1,
      title:                  "Quadratics".into(),
      lesson_type:            LessonType::Video,
      content:                String::new(),
      notes:                  String::new(),
      video_url:              video_url.map(str::to_string),
      video_duration_minutes: Some(12),
      order:                  1,
      is_free,
      created_at:             Utc::now(),
    }
  }

  const URL: &str = "https://bucket.example.com/videos/a.mp4";

  #[test]
  fn decision_table() {
    let anon = Requester::Anonymous;
    let user = Requester::User(3);

    for who in [anon, user] {
      for free in [true, false] {
        assert_eq!(decide(&lesson(None, free), &who), VideoAccess::NoVideo);
      }
    }
    assert_eq!(decide(&lesson(Some(URL), false), &user), VideoAccess::Sign);
    assert_eq!(decide(&lesson(Some(URL), true), &user), VideoAccess::Sign);
    assert_eq!(decide(&lesson(Some(URL), true), &anon), VideoAccess::Sign);
    assert_eq!(decide(&lesson(Some(URL), false), &anon), VideoAccess::Withheld);
  }

  #[test]
  fn withheld_lessons_never_reach_the_signer() {
    let signer = RecordingSigner::default();
    let out = expose(&lesson(Some(URL), false), &Requester::Anonymous, &signer, DEFAULT_VIDEO_TTL);
    assert!(out.is_none());
    assert!(signer.calls.lock().unwrap().is_empty());
  }

  #[test]
  fn exposed_url_is_signed_with_requested_ttl() {
    let signer = RecordingSigner::default();
    let ttl = Duration::from_secs(900);
    let out = expose(&lesson(Some(URL), true), &Requester::Anonymous, &signer, ttl).unwrap();
    assert_ne!(out, URL);
    assert_eq!(signer.calls.lock().unwrap().as_slice(), &[(URL.to_string(), 900)]);
  }

  #[test]
  fn signer_refusal_withholds_the_url() {
    struct Refuse;
    impl VideoSigner for Refuse {
      fn sign(&self, _: &str, _: Duration) -> Option<String> { None }
    }
    let out = expose(&lesson(Some(URL), false), &Requester::User(1), &Refuse, DEFAULT_VIDEO_TTL);
    assert!(out.is_none());
  }
}
