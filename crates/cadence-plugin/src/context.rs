//! Shared release context.

use std::path::PathBuf;

use cadence_commit::RawCommit;
use cadence_config::Config;

use crate::{Branch, Release};

/// Facts about the environment that triggered the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    /// Whether a recognized CI environment is running the invocation.
    pub is_ci: bool,

    /// The branch (or pull-request head) that triggered the invocation.
    pub branch: String,

    /// Whether the trigger is a pull request.
    pub is_pr: bool,
}

impl CiEnvironment {
    /// Creates a CI environment description.
    #[must_use]
    pub fn new(is_ci: bool, branch: impl Into<String>, is_pr: bool) -> Self {
        Self {
            is_ci,
            branch: branch.into(),
            is_pr,
        }
    }
}

/// Shared state threaded through every pipeline stage.
///
/// Exactly one context exists per invocation. It is exclusively owned by the
/// orchestrator, which hands mutable access to one plugin step at a time.
/// `branch` is the authoritative record for the current branch; the copy in
/// `branches` is a positional snapshot and does not receive tag appends.
#[derive(Debug)]
pub struct Context {
    /// The working directory.
    pub cwd: PathBuf,

    /// Facts about the triggering environment.
    pub env: CiEnvironment,

    /// The resolved configuration.
    pub options: Config,

    /// The current branch.
    pub branch: Branch,

    /// All configured branches, in declaration order.
    pub branches: Vec<Branch>,

    /// Commits since the last release.
    pub commits: Vec<RawCommit>,

    /// The last release found in the branch history.
    pub last_release: Option<Release>,

    /// The release being assembled, once commit analysis decides one.
    pub next_release: Option<Release>,

    /// Releases collected from publish and add-channel steps.
    pub releases: Vec<Release>,
}

impl Context {
    /// Creates a new context.
    #[must_use]
    pub fn new(
        cwd: impl Into<PathBuf>,
        env: CiEnvironment,
        options: Config,
        branch: Branch,
        branches: Vec<Branch>,
    ) -> Self {
        Self {
            cwd: cwd.into(),
            env,
            options,
            branch,
            branches,
            commits: Vec::new(),
            last_release: None,
            next_release: None,
            releases: Vec::new(),
        }
    }
}
