//! Branch and tag records.

use semver::Version;
use serde::{Deserialize, Serialize};

/// The release policy assigned to a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchType {
    /// Publishes ordinary releases to the branch's channel.
    Release,
    /// Restricted to a semver range, for backporting fixes.
    Maintenance,
    /// Publishes versions suffixed with a prerelease identifier.
    Prerelease,
}

impl std::fmt::Display for BranchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Release => write!(f, "release"),
            Self::Maintenance => write!(f, "maintenance"),
            Self::Prerelease => write!(f, "prerelease"),
        }
    }
}

/// A classified branch.
///
/// Branches are computed once per invocation and are immutable afterwards,
/// except for `tags`, which the orchestrator appends to after a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    /// The concrete branch name.
    pub name: String,

    /// The release policy.
    pub branch_type: BranchType,

    /// The distribution channel (`None` is the default channel).
    pub channel: Option<String>,

    /// The maintenance range (maintenance branches only).
    pub range: Option<String>,

    /// The prerelease identifier (prerelease branches only).
    pub prerelease: Option<String>,

    /// Whether the branch was synthesized for a pull-request head ref.
    pub synthesized: bool,

    /// Tags reachable from the branch tip, with channel membership.
    pub tags: Vec<Tag>,
}

impl Branch {
    /// Creates a release branch with no tags.
    #[must_use]
    pub fn release(name: impl Into<String>, channel: Option<String>) -> Self {
        Self {
            name: name.into(),
            branch_type: BranchType::Release,
            channel,
            range: None,
            prerelease: None,
            synthesized: false,
            tags: Vec::new(),
        }
    }

    /// Creates a maintenance branch with no tags.
    #[must_use]
    pub fn maintenance(
        name: impl Into<String>,
        channel: Option<String>,
        range: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            branch_type: BranchType::Maintenance,
            channel,
            range: Some(range.into()),
            prerelease: None,
            synthesized: false,
            tags: Vec::new(),
        }
    }

    /// Creates a prerelease branch with no tags.
    #[must_use]
    pub fn prerelease(
        name: impl Into<String>,
        channel: Option<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            branch_type: BranchType::Prerelease,
            channel,
            range: None,
            prerelease: Some(identifier.into()),
            synthesized: false,
            tags: Vec::new(),
        }
    }
}

/// A resolved release tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// The tag name as it appears in the repository.
    pub git_tag: String,

    /// The version parsed from the tag name.
    pub version: Version,

    /// Channels the version has been published to (`None` is the default
    /// channel).
    pub channels: Vec<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branch_type_display() {
        assert_eq!(BranchType::Release.to_string(), "release");
        assert_eq!(BranchType::Maintenance.to_string(), "maintenance");
        assert_eq!(BranchType::Prerelease.to_string(), "prerelease");
    }

    #[test]
    fn test_release_branch() {
        let branch = Branch::release("main", None);
        assert_eq!(branch.name, "main");
        assert_eq!(branch.branch_type, BranchType::Release);
        assert!(branch.channel.is_none());
        assert!(branch.tags.is_empty());
        assert!(!branch.synthesized);
    }

    #[test]
    fn test_maintenance_branch() {
        let branch = Branch::maintenance("1.x", Some("1.x".to_string()), "1.x");
        assert_eq!(branch.branch_type, BranchType::Maintenance);
        assert_eq!(branch.range.as_deref(), Some("1.x"));
    }

    #[test]
    fn test_prerelease_branch() {
        let branch = Branch::prerelease("beta", Some("beta".to_string()), "beta");
        assert_eq!(branch.branch_type, BranchType::Prerelease);
        assert_eq!(branch.prerelease.as_deref(), Some("beta"));
    }

    #[test]
    fn test_tag_serialization_keeps_null_channel() {
        let tag = Tag {
            git_tag: "v1.0.0".to_string(),
            version: Version::new(1, 0, 0),
            channels: vec![None, Some("next".to_string())],
        };
        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["channels"], serde_json::json!([null, "next"]));
    }
}
