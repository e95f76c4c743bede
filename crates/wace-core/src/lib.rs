//! Core types and trait definitions for the WASSCE prep content service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! video access gate (policy + content tree) lives here so every front end
//! applies it identically.

pub mod account;
pub mod catalog;
pub mod content;
pub mod error;
pub mod listing;
pub mod notice;
pub mod papers;
pub mod policy;
pub mod progress;
pub mod store;

pub use error::{Error, Result};
