//! Core error types.
//!
//! Every fatal error carries a stable code (see [`CoreError::code`]) and
//! enough context to render its message. Errors discovered together are
//! reported together through the `Aggregate` variant.

use cadence_plugin::{ErrorReport, PluginError};
use thiserror::Error;

/// Core-related errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A maintenance range does not parse as a semver range.
    #[error("branch '{branch}' declares invalid maintenance range '{range}'")]
    InvalidMaintenanceRange {
        /// The offending branch.
        branch: String,
        /// The range that failed to parse.
        range: String,
    },

    /// Two or more maintenance branches share a range.
    #[error("maintenance range '{range}' is declared by several branches: {}", .branches.join(", "))]
    DuplicateMaintenanceRange {
        /// The shared range.
        range: String,
        /// Every branch declaring it.
        branches: Vec<String>,
    },

    /// A prerelease identifier does not form a valid semver prerelease.
    #[error("branch '{branch}' declares invalid prerelease identifier '{identifier}'")]
    InvalidPrereleaseIdentifier {
        /// The offending branch.
        branch: String,
        /// The identifier that failed validation.
        identifier: String,
    },

    /// Two or more prerelease branches share an identifier.
    #[error("prerelease identifier '{identifier}' is declared by several branches: {}", .branches.join(", "))]
    DuplicatePrereleaseIdentifier {
        /// The shared identifier.
        identifier: String,
        /// Every branch declaring it.
        branches: Vec<String>,
    },

    /// The number of release branches is outside 1..=3.
    #[error("expected between 1 and 3 release branches, found {} ({})", .branches.len(), .branches.join(", "))]
    ReleaseBranchCount {
        /// Every release branch found.
        branches: Vec<String>,
    },

    /// The tag format does not carry the version placeholder exactly once.
    #[error("tag format '{tag_format}' must contain the {{version}} placeholder exactly once")]
    InvalidTagFormat {
        /// The offending template.
        tag_format: String,
    },

    /// The configured first-release version is not a semver version.
    #[error("first release '{value}' is not a valid version")]
    InvalidFirstRelease {
        /// The offending value.
        value: String,
    },

    /// The push-permission probe failed and the branch is not stale.
    #[error("cannot push to the remote repository from branch '{branch}'")]
    GitAuth {
        /// The branch the run was triggered on.
        branch: String,
    },

    /// A computed version falls outside a maintenance branch's range.
    #[error("version {version} is outside the range '{range}' of maintenance branch '{branch}'")]
    InvalidVersion {
        /// The computed version.
        version: String,
        /// The maintenance branch.
        branch: String,
        /// The declared range.
        range: String,
    },

    /// A declared plugin name does not match any registered plugin.
    #[error("unknown plugin '{name}'")]
    UnknownPlugin {
        /// The declared plugin name.
        name: String,
    },

    /// Plugin error.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Git error.
    #[error(transparent)]
    Git(#[from] cadence_git::GitError),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] cadence_config::ConfigError),

    /// Several errors discovered in the same run.
    #[error("{}", aggregate_message(.0))]
    Aggregate(Vec<CoreError>),
}

fn aggregate_message(errors: &[CoreError]) -> String {
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("{} errors occurred: {}", errors.len(), rendered.join("; "))
}

impl CoreError {
    /// Wraps a non-empty error list, unwrapping the singleton case.
    #[must_use]
    pub fn from_vec(mut errors: Vec<CoreError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Aggregate(errors)
        }
    }

    /// Returns the stable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidMaintenanceRange { .. } => "EINVALIDMAINTENANCERANGE",
            Self::DuplicateMaintenanceRange { .. } => "EDUPLICATEMAINTENANCERANGE",
            Self::InvalidPrereleaseIdentifier { .. } => "EINVALIDPRERELEASEIDENTIFIER",
            Self::DuplicatePrereleaseIdentifier { .. } => "EDUPLICATEPRERELEASEIDENTIFIER",
            Self::ReleaseBranchCount { .. } => "ERELEASEBRANCHCOUNT",
            Self::InvalidTagFormat { .. } => "EINVALIDTAGFORMAT",
            Self::InvalidFirstRelease { .. } => "EINVALIDFIRSTRELEASE",
            Self::GitAuth { .. } => "EGITNOPERMISSION",
            Self::InvalidVersion { .. } => "EINVALIDNEXTVERSION",
            Self::UnknownPlugin { .. } => "EUNKNOWNPLUGIN",
            Self::Plugin(_) => "EPLUGIN",
            Self::Git(_) => "EGIT",
            Self::Config(_) => "ECONFIG",
            Self::Aggregate(_) => "EAGGREGATE",
        }
    }

    /// Renders the error (flattening aggregates) for the fail step.
    #[must_use]
    pub fn reports(&self) -> Vec<ErrorReport> {
        match self {
            Self::Aggregate(errors) => errors.iter().flat_map(CoreError::reports).collect(),
            other => vec![ErrorReport::new(other.code(), other.to_string())],
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
