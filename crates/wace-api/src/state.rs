//! Shared state threaded through all handlers.

use std::sync::Arc;

use wace_core::{content::ContentOptions, policy::VideoSigner, store::CourseStore};

pub struct ApiState<S: CourseStore> {
  pub store:   Arc<S>,
  /// Applied to every lesson video the content tree exposes.
  pub signer:  Arc<dyn VideoSigner>,
  pub content: ContentOptions,
}

impl<S: CourseStore> ApiState<S> {
  pub fn new(store: Arc<S>, signer: Arc<dyn VideoSigner>, content: ContentOptions) -> Self {
    Self { store, signer, content }
  }
}

// Manual impl: `S` itself need not be `Clone`.
impl<S: CourseStore> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      signer:  Arc::clone(&self.signer),
      content: self.content,
    }
  }
}
