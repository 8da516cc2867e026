//! Commit types for Cadence.
//!
//! This crate provides [`RawCommit`], a commit as retrieved from Git. The
//! commit list is handed to lifecycle plugins unparsed: interpreting commit
//! messages is the business of an analyzer plugin, not of Cadence itself.

mod raw;

pub use raw::RawCommit;
