//! The minimal git operation set the release pipeline depends on.

use cadence_commit::RawCommit;
use serde_json::Value;

use crate::GitResult;

/// Git operations consumed by the release pipeline.
///
/// The trait exposes exactly what the pipeline needs, so a test double can
/// substitute an in-memory repository model for the real thing.
pub trait GitClient {
    /// Lists branch names advertised by the remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote cannot be reached.
    fn remote_branches(&self) -> GitResult<Vec<String>>;

    /// Lists tags reachable from the given branch tip, or from the
    /// working-tree HEAD when `branch` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be resolved.
    fn tags_reachable(&self, branch: Option<&str>) -> GitResult<Vec<String>>;

    /// Resolves a tag or ref to its commit hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the ref does not exist.
    fn rev_parse(&self, reference: &str) -> GitResult<String>;

    /// Returns the current HEAD commit hash.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be resolved.
    fn head_hash(&self) -> GitResult<String>;

    /// Returns whether HEAD is detached.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be read.
    fn is_head_detached(&self) -> GitResult<bool>;

    /// Reads the JSON note attached to `target` under `notes_ref`.
    ///
    /// A missing note yields an empty JSON object, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be resolved or an existing
    /// note does not hold valid JSON.
    fn read_note(&self, notes_ref: &str, target: &str) -> GitResult<Value>;

    /// Writes (or overwrites) the JSON note attached to `target` under
    /// `notes_ref`.
    ///
    /// # Errors
    ///
    /// Returns an error if the note cannot be written.
    fn write_note(&self, notes_ref: &str, target: &str, note: &Value) -> GitResult<()>;

    /// Creates a lightweight tag at the given commit.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be created.
    fn create_tag(&self, name: &str, target: &str) -> GitResult<()>;

    /// Pushes a tag ref to the remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails.
    fn push_tag(&self, name: &str) -> GitResult<()>;

    /// Pushes a notes ref to the remote.
    ///
    /// # Errors
    ///
    /// Returns an error if the push fails.
    fn push_notes(&self, notes_ref: &str) -> GitResult<()>;

    /// Probes for push permission without pushing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote refuses a push-mode connection.
    fn verify_push_permission(&self) -> GitResult<()>;

    /// Returns whether the local branch head matches the remote's
    /// advertised head. A branch the remote does not know is up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote cannot be reached.
    fn is_branch_up_to_date(&self, branch: &str) -> GitResult<bool>;

    /// Lists commits in `(from, to]`, newest first. `None` means the whole
    /// history of `to`.
    ///
    /// # Errors
    ///
    /// Returns an error if either end cannot be resolved.
    fn commits_between(&self, from: Option<&str>, to: &str) -> GitResult<Vec<RawCommit>>;
}
