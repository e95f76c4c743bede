//! Handlers for `/auth/*`: registration, sign-in/out, profile, preferences.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup` | Creates user + student profile, returns a token (201) |
//! | `POST` | `/auth/signin` | Username or email + password |
//! | `POST` | `/auth/signout` | Revokes the presented token |
//! | `GET`  | `/auth/profile` | Current user + student profile |
//! | `PUT`  | `/auth/notifications` | Partial update of notification preferences |
//! | `GET`  | `/auth/check-availability` | `?username=` and/or `?email=` |

use std::{collections::BTreeMap, sync::LazyLock};

use axum::{
  Json,
  extract::{Query, State, rejection::JsonRejection},
  http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wace_core::{
  account::{NewStudentProfile, NewUser, NotificationPreferences, StudentProfile, User, UserId},
  catalog::{Programme, ProgrammeId},
  store::CourseStore,
};

use crate::{
  ApiError,
  auth::{self, AuthUser},
  state::ApiState,
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\+?[\d\s\-\(\)]{10,15}$").expect("valid phone regex"));

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const WASSCE_YEARS: std::ops::RangeInclusive<i32> = 2000..=2030;

fn invalid_json(e: JsonRejection) -> ApiError {
  tracing::debug!(error = %e, "rejected request body");
  ApiError::BadRequest("Invalid JSON data".into())
}

// ─── Response shapes ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProgrammeRef {
  pub id:    ProgrammeId,
  pub name:  &'static str,
  pub price: f64,
}

impl From<&Programme> for ProgrammeRef {
  fn from(p: &Programme) -> Self {
    Self { id: p.programme_id, name: p.name.display_name(), price: p.price() }
  }
}

#[derive(Debug, Serialize)]
pub struct StudentView {
  pub phone_number:    String,
  pub date_of_birth:   NaiveDate,
  pub programme:       Option<ProgrammeRef>,
  pub enrollment_date: DateTime<Utc>,
  pub is_active:       bool,
  pub previous_school: String,
  pub wassce_year:     i32,
  pub index_number:    String,
  pub notifications:   NotificationPreferences,
}

impl StudentView {
  fn new(student: StudentProfile, programme: Option<&Programme>) -> Self {
    Self {
      phone_number:    student.phone_number,
      date_of_birth:   student.date_of_birth,
      programme:       programme.map(ProgrammeRef::from),
      enrollment_date: student.enrolled_at,
      is_active:       student.is_active,
      previous_school: student.previous_school,
      wassce_year:     student.wassce_year,
      index_number:    student.index_number,
      notifications:   student.notifications,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct UserView {
  pub id:          UserId,
  pub username:    String,
  pub email:       String,
  pub first_name:  String,
  pub last_name:   String,
  pub is_staff:    bool,
  pub date_joined: DateTime<Utc>,
  pub student:     Option<StudentView>,
}

impl UserView {
  fn new(user: User, student: Option<StudentView>) -> Self {
    Self {
      id: user.user_id,
      username: user.username,
      email: user.email,
      first_name: user.first_name,
      last_name: user.last_name,
      is_staff: user.is_staff,
      date_joined: user.created_at,
      student,
    }
  }
}

async fn user_view<S: CourseStore>(store: &S, user: User) -> Result<UserView, ApiError> {
  let student = match store.get_student(user.user_id).await.map_err(ApiError::store)? {
    Some(profile) => {
      let programme = store
        .get_programme(profile.programme_id)
        .await
        .map_err(ApiError::store)?;
      Some(StudentView::new(profile, programme.as_ref()))
    }
    None => None,
  };
  Ok(UserView::new(user, student))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
  pub message: &'static str,
  pub token:   String,
  pub user:    UserView,
}

// ─── Sign up ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SignupBody {
  pub username:        Option<String>,
  pub email:           Option<String>,
  pub password:        Option<String>,
  pub first_name:      Option<String>,
  pub last_name:       Option<String>,
  pub phone_number:    Option<String>,
  pub date_of_birth:   Option<String>,
  /// Number or numeric string.
  pub programme_id:    Option<Value>,
  pub previous_school: Option<String>,
  /// Number or numeric string.
  pub wassce_year:     Option<Value>,
  pub index_number:    Option<String>,
}

fn text_missing(v: &Option<String>) -> bool { v.as_deref().is_none_or(str::is_empty) }

fn value_missing(v: &Option<Value>) -> bool {
  match v {
    None | Some(Value::Null) | Some(Value::Bool(false)) => true,
    Some(Value::String(s)) => s.is_empty(),
    Some(Value::Number(n)) => n.as_f64() == Some(0.0),
    Some(_) => false,
  }
}

fn as_integer(v: &Value) -> Option<i64> {
  match v {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

impl SignupBody {
  /// Required fields that are absent or empty, in request order.
  fn missing_fields(&self) -> Vec<&'static str> {
    [
      ("username", text_missing(&self.username)),
      ("email", text_missing(&self.email)),
      ("password", text_missing(&self.password)),
      ("first_name", text_missing(&self.first_name)),
      ("last_name", text_missing(&self.last_name)),
      ("phone_number", text_missing(&self.phone_number)),
      ("date_of_birth", text_missing(&self.date_of_birth)),
      ("programme_id", value_missing(&self.programme_id)),
      ("previous_school", text_missing(&self.previous_school)),
      ("wassce_year", value_missing(&self.wassce_year)),
      ("index_number", text_missing(&self.index_number)),
    ]
    .into_iter()
    .filter_map(|(field, missing)| missing.then_some(field))
    .collect()
  }
}

/// A signup request that passed every check.
struct ValidSignup {
  user:            NewUser,
  programme:       Programme,
  phone_number:    String,
  date_of_birth:   NaiveDate,
  previous_school: String,
  wassce_year:     i32,
  index_number:    String,
}

async fn validate_signup<S: CourseStore>(
  store: &S,
  body: SignupBody,
) -> Result<ValidSignup, ApiError> {
  let missing = body.missing_fields();
  if !missing.is_empty() {
    return Err(ApiError::MissingFields(missing));
  }

  let text = |v: Option<String>| v.unwrap_or_default().trim().to_owned();
  let username = text(body.username);
  let email = text(body.email).to_lowercase();
  let password = body.password.unwrap_or_default();
  let phone_number = text(body.phone_number);
  let index_number = text(body.index_number);
  let mut errors: BTreeMap<&'static str, String> = BTreeMap::new();

  if username.chars().count() < MIN_USERNAME_LEN {
    errors.insert("username", "Username must be at least 3 characters long".into());
  } else if store.username_taken(&username).await.map_err(ApiError::store)? {
    errors.insert("username", "Username already exists".into());
  }

  if !EMAIL_RE.is_match(&email) {
    errors.insert("email", "Invalid email format".into());
  } else if store.email_taken(&email).await.map_err(ApiError::store)? {
    errors.insert("email", "Email already registered".into());
  }

  if password.chars().count() < MIN_PASSWORD_LEN {
    errors.insert("password", "Password must be at least 8 characters long".into());
  } else if !password.chars().any(|c| c.is_ascii_alphabetic())
    || !password.chars().any(|c| c.is_ascii_digit())
  {
    errors.insert("password", "Password must contain both letters and numbers".into());
  }

  if !PHONE_RE.is_match(&phone_number) {
    errors.insert("phone_number", "Invalid phone number format".into());
  }

  let date_of_birth = NaiveDate::parse_from_str(
    body.date_of_birth.as_deref().unwrap_or_default().trim(),
    "%Y-%m-%d",
  );
  if date_of_birth.is_err() {
    errors.insert("date_of_birth", "Date of birth must be YYYY-MM-DD".into());
  }

  let programme = match body.programme_id.as_ref().and_then(as_integer) {
    Some(id) => store.get_programme(id).await.map_err(ApiError::store)?,
    None => None,
  };
  if programme.is_none() {
    errors.insert("programme_id", "Invalid programme selected".into());
  }

  let wassce_year = body
    .wassce_year
    .as_ref()
    .and_then(as_integer)
    .and_then(|y| i32::try_from(y).ok());
  match wassce_year {
    None => {
      errors.insert("wassce_year", "WASSCE year must be a valid number".into());
    }
    Some(y) if !WASSCE_YEARS.contains(&y) => {
      errors.insert("wassce_year", "Invalid WASSCE year".into());
    }
    Some(_) => {}
  }

  if store.index_number_taken(&index_number).await.map_err(ApiError::store)? {
    errors.insert("index_number", "Index number already registered".into());
  }

  let (Ok(date_of_birth), Some(programme), Some(wassce_year), true) =
    (date_of_birth, programme, wassce_year, errors.is_empty())
  else {
    return Err(ApiError::Validation(errors));
  };

  let password_hash =
    auth::hash_password(&password).map_err(|e| ApiError::Internal(e.to_string()))?;

  Ok(ValidSignup {
    user: NewUser {
      username,
      email,
      first_name: text(body.first_name),
      last_name: text(body.last_name),
      password_hash,
      is_staff: false,
    },
    programme,
    phone_number,
    date_of_birth,
    previous_school: text(body.previous_school),
    wassce_year,
    index_number,
  })
}

/// `POST /auth/signup`
pub async fn signup<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<SignupBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError>
where
  S: CourseStore + 'static,
{
  let Json(body) = body.map_err(invalid_json)?;
  let store = state.store.as_ref();
  let valid = validate_signup(store, body).await?;

  let (user, student) = store
    .register_student(valid.user, NewStudentProfile {
      programme_id:    valid.programme.programme_id,
      phone_number:    valid.phone_number,
      date_of_birth:   valid.date_of_birth,
      previous_school: valid.previous_school,
      wassce_year:     valid.wassce_year,
      index_number:    valid.index_number,
    })
    .await
    .map_err(ApiError::store)?;
  let token = auth::issue_token(store, user.user_id).await?;
  tracing::info!(user_id = user.user_id, username = %user.username, "student registered");

  let student = StudentView::new(student, Some(&valid.programme));
  Ok((
    StatusCode::CREATED,
    Json(SessionResponse {
      message: "Registration successful",
      token,
      user: UserView::new(user, Some(student)),
    }),
  ))
}

// ─── Sign in / out ───────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SigninBody {
  /// Username or email.
  pub username: String,
  pub password: String,
}

/// `POST /auth/signin`
pub async fn signin<S>(
  State(state): State<ApiState<S>>,
  body: Result<Json<SigninBody>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError>
where
  S: CourseStore + 'static,
{
  let Json(body) = body.map_err(invalid_json)?;
  let login = body.username.trim();
  if login.is_empty() || body.password.is_empty() {
    return Err(ApiError::BadRequest("Username and password are required".into()));
  }

  let store = state.store.as_ref();
  let user = store
    .find_user(login)
    .await
    .map_err(ApiError::store)?
    .filter(|u| auth::verify_password(&body.password, &u.password_hash))
    .ok_or_else(|| ApiError::Unauthorized("Invalid username/email or password".into()))?;
  if !user.is_active {
    return Err(ApiError::Forbidden("Account is deactivated".into()));
  }

  let token = auth::issue_token(store, user.user_id).await?;
  tracing::info!(user_id = user.user_id, "signed in");
  Ok(Json(SessionResponse {
    message: "Login successful",
    token,
    user: user_view(store, user).await?,
  }))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
  pub message: &'static str,
}

/// `POST /auth/signout`
pub async fn signout<S>(
  State(state): State<ApiState<S>>,
  auth: AuthUser,
) -> Result<Json<MessageResponse>, ApiError>
where
  S: CourseStore + 'static,
{
  state.store.revoke_token(&auth.digest).await.map_err(ApiError::store)?;
  Ok(Json(MessageResponse { message: "Logout successful" }))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
  pub user: UserView,
}

/// `GET /auth/profile`
pub async fn profile<S>(
  State(state): State<ApiState<S>>,
  auth: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError>
where
  S: CourseStore + 'static,
{
  Ok(Json(ProfileResponse { user: user_view(state.store.as_ref(), auth.user).await? }))
}

#[derive(Debug, Default, Deserialize)]
pub struct NotificationUpdate {
  pub course_updates:       Option<bool>,
  pub assignment_reminders: Option<bool>,
  pub announcements:        Option<bool>,
  pub weekly_summary:       Option<bool>,
}

impl NotificationUpdate {
  fn apply(self, mut prefs: NotificationPreferences) -> NotificationPreferences {
    if let Some(v) = self.course_updates {
      prefs.course_updates = v;
    }
    if let Some(v) = self.assignment_reminders {
      prefs.assignment_reminders = v;
    }
    if let Some(v) = self.announcements {
      prefs.announcements = v;
    }
    if let Some(v) = self.weekly_summary {
      prefs.weekly_summary = v;
    }
    prefs
  }
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
  pub message:       &'static str,
  pub notifications: NotificationPreferences,
}

/// `PUT /auth/notifications`
pub async fn update_notifications<S>(
  State(state): State<ApiState<S>>,
  auth: AuthUser,
  body: Result<Json<NotificationUpdate>, JsonRejection>,
) -> Result<Json<NotificationsResponse>, ApiError>
where
  S: CourseStore + 'static,
{
  let Json(update) = body.map_err(invalid_json)?;
  let store = state.store.as_ref();
  let user_id = auth.user.user_id;

  let current = store
    .get_student(user_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Student profile not found".into()))?;
  let updated = store
    .set_notifications(user_id, update.apply(current.notifications))
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("Student profile not found".into()))?;

  Ok(Json(NotificationsResponse {
    message:       "Notification preferences updated",
    notifications: updated.notifications,
  }))
}

// ─── Availability ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AvailabilityParams {
  pub username: Option<String>,
  pub email:    Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Availability {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub username_available: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email_available:    Option<bool>,
}

/// `GET /auth/check-availability`
pub async fn check_availability<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<AvailabilityParams>,
) -> Result<Json<Availability>, ApiError>
where
  S: CourseStore + 'static,
{
  let store = state.store.as_ref();
  let username_available = match params.username.as_deref().filter(|s| !s.is_empty()) {
    Some(u) => Some(!store.username_taken(u).await.map_err(ApiError::store)?),
    None => None,
  };
  let email_available = match params.email.as_deref().filter(|s| !s.is_empty()) {
    Some(e) => Some(!store.email_taken(e).await.map_err(ApiError::store)?),
    None => None,
  };
  Ok(Json(Availability { username_available, email_available }))
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn empty_and_absent_fields_are_missing() {
    let body: SignupBody = serde_json::from_value(json!({
      "username": "kofi",
      "email": "",
      "programme_id": 0,
      "wassce_year": "2025",
    }))
    .unwrap();
    assert_eq!(
      body.missing_fields(),
      vec![
        "email",
        "password",
        "first_name",
        "last_name",
        "phone_number",
        "date_of_birth",
        "programme_id",
        "previous_school",
        "index_number",
      ]
    );
  }

  #[test]
  fn numeric_fields_accept_strings() {
    assert_eq!(as_integer(&json!(3)), Some(3));
    assert_eq!(as_integer(&json!(" 2025 ")), Some(2025));
    assert_eq!(as_integer(&json!("twenty")), None);
    assert_eq!(as_integer(&json!(true)), None);
  }

  #[test]
  fn phone_pattern() {
    assert!(PHONE_RE.is_match("+233 24 123 4567"));
    assert!(PHONE_RE.is_match("(024) 123-4567"));
    assert!(!PHONE_RE.is_match("12345"));
    assert!(!PHONE_RE.is_match("024-CALL-NOW"));
  }

  #[test]
  fn partial_notification_update_keeps_other_flags() {
    let update = NotificationUpdate { weekly_summary: Some(false), ..Default::default() };
    let prefs = update.apply(NotificationPreferences::default());
    assert!(!prefs.weekly_summary);
    assert!(prefs.course_updates && prefs.assignment_reminders && prefs.announcements);
  }
}
