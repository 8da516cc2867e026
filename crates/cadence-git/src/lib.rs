//! Git abstraction layer for Cadence.
//!
//! This crate provides the Git operations the release pipeline depends on:
//! - [`GitClient`]: the minimal operation set, as a trait so tests can
//!   substitute an in-memory repository model
//! - [`Repository`]: the `git2`-backed implementation

mod client;
mod error;
mod repository;

pub use client::GitClient;
pub use error::{GitError, GitResult};
pub use repository::Repository;
