//! Core library for Cadence.
//!
//! This crate provides the release engine: branch expansion and
//! classification, tag and channel resolution, next-version computation,
//! and the release pipeline orchestrator.

mod branches;
mod error;
mod pipeline;
mod release;
mod tags;
mod version;

pub use branches::{ExpandedBranch, classify, expand_branches};
pub use error::{CoreError, CoreResult};
pub use pipeline::Pipeline;
pub use release::{ReleaseManager, ReleaseResult};
pub use tags::{
    NOTES_REF_LEGACY, NOTES_REF_PREFIX, ReleaseToAdd, last_release, make_tag, merge_json,
    note_ref_for, release_to_add, resolve_tags, tag_matcher, validate_tag_format,
};
pub use version::{dampen, increment, increment_prerelease, next_version};
