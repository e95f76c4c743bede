//! JSON REST API for the exam-prep content service.
//!
//! Exposes an axum [`Router`] backed by any [`wace_core::store::CourseStore`].
//! TLS and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", wace_api::api_router(state))
//! ```

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod notices;
pub mod papers;
pub mod progress;
pub mod state;

use axum::{
  Json, Router,
  routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use wace_core::store::CourseStore;

pub use error::ApiError;
pub use state::ApiState;

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: CourseStore + 'static,
{
  Router::new()
    .route("/health", get(health))
    // Catalog
    .route("/programmes", get(catalog::list_programmes::<S>))
    .route("/programmes/{id}", get(catalog::programme::<S>))
    .route("/subjects/{id}", get(catalog::subject::<S>))
    // Progress
    .route("/lessons/{id}/complete", post(progress::mark_complete::<S>))
    .route("/lessons/{id}/uncomplete", delete(progress::unmark_complete::<S>))
    .route("/topics/{id}/progress", get(progress::topic_progress::<S>))
    // Notices
    .route("/announcements", get(notices::announcements::<S>))
    .route("/instructors", get(notices::instructors::<S>))
    // Past papers
    .route("/past-questions/student", get(papers::student_papers::<S>))
    .route("/past-questions/paper/{id}", get(papers::paper::<S>))
    // Accounts
    .route("/auth/signup", post(accounts::signup::<S>))
    .route("/auth/signin", post(accounts::signin::<S>))
    .route("/auth/signout", post(accounts::signout::<S>))
    .route("/auth/profile", get(accounts::profile::<S>))
    .route("/auth/notifications", put(accounts::update_notifications::<S>))
    .route("/auth/check-availability", get(accounts::check_availability::<S>))
    .with_state(state)
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
