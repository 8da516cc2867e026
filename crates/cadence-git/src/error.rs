//! Git error types.

use thiserror::Error;

/// Git-related errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository.
    #[error("not a git repository: {0}")]
    NotARepo(std::path::PathBuf),

    /// A ref could not be resolved.
    #[error("ref not found: {0}")]
    RefNotFound(String),

    /// The remote refused a push-mode connection.
    #[error("push to remote '{remote}' denied")]
    PushDenied {
        /// The remote that refused.
        remote: String,
    },

    /// A note exists but does not hold valid JSON.
    #[error("note on '{target}' is not valid JSON: {source}")]
    InvalidNote {
        /// The annotated object.
        target: String,
        /// The JSON parse failure.
        source: serde_json::Error,
    },

    /// Git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_not_a_repo_display() {
        let err = GitError::NotARepo(PathBuf::from("/tmp/not-git"));
        assert_eq!(err.to_string(), "not a git repository: /tmp/not-git");
    }

    #[test]
    fn test_ref_not_found_display() {
        let err = GitError::RefNotFound("v1.0.0".to_string());
        assert_eq!(err.to_string(), "ref not found: v1.0.0");
    }

    #[test]
    fn test_push_denied_display() {
        let err = GitError::PushDenied {
            remote: "origin".to_string(),
        };
        assert_eq!(err.to_string(), "push to remote 'origin' denied");
    }

    #[test]
    fn test_error_is_debug() {
        let err = GitError::RefNotFound("main".to_string());
        let debug = format!("{err:?}");
        assert!(debug.contains("RefNotFound"));
    }
}
