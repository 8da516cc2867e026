//! Release records.

use semver::Version;
use serde::{Deserialize, Serialize};

/// Version bump size, as decided by commit analysis.
///
/// Ordering follows severity: `Patch < Minor < Major`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BumpType {
    /// Patch version bump (bug fixes).
    Patch,
    /// Minor version bump (new features).
    Minor,
    /// Major version bump (breaking changes).
    Major,
}

impl std::fmt::Display for BumpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patch => write!(f, "patch"),
            Self::Minor => write!(f, "minor"),
            Self::Major => write!(f, "major"),
        }
    }
}

/// A release, either the last one found in history or the next one being
/// assembled.
///
/// The orchestrator fills fields in stages and never rewrites them: bump
/// size and head first, then version and tag name, then notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    /// The released version.
    pub version: Version,

    /// The tag name carrying the version.
    pub git_tag: String,

    /// The commit hash the tag points at.
    pub git_head: String,

    /// The channel this release targets (`None` is the default channel).
    pub channel: Option<String>,

    /// All channels the version has been published to.
    pub channels: Vec<Option<String>>,

    /// The bump size that produced this release, when known.
    pub bump: Option<BumpType>,

    /// Release notes, once generated.
    pub notes: Option<String>,
}

impl Release {
    /// Creates a release record with no channel history, bump, or notes.
    #[must_use]
    pub fn new(
        version: Version,
        git_tag: impl Into<String>,
        git_head: impl Into<String>,
        channel: Option<String>,
    ) -> Self {
        Self {
            version,
            git_tag: git_tag.into(),
            git_head: git_head.into(),
            channel,
            channels: Vec::new(),
            bump: None,
            notes: None,
        }
    }

    /// Sets the channel history.
    #[must_use]
    pub fn with_channels(mut self, channels: Vec<Option<String>>) -> Self {
        self.channels = channels;
        self
    }

    /// Sets the bump size.
    #[must_use]
    pub fn with_bump(mut self, bump: BumpType) -> Self {
        self.bump = Some(bump);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_type_display() {
        assert_eq!(BumpType::Major.to_string(), "major");
        assert_eq!(BumpType::Minor.to_string(), "minor");
        assert_eq!(BumpType::Patch.to_string(), "patch");
    }

    #[test]
    fn test_bump_type_ordering() {
        assert!(BumpType::Major > BumpType::Minor);
        assert!(BumpType::Minor > BumpType::Patch);
        assert_eq!(BumpType::Major.max(BumpType::Patch), BumpType::Major);
    }

    #[test]
    fn test_bump_type_serialization() {
        let json = serde_json::to_string(&BumpType::Minor).unwrap();
        assert_eq!(json, "\"minor\"");
        let parsed: BumpType = serde_json::from_str("\"major\"").unwrap();
        assert_eq!(parsed, BumpType::Major);
    }

    #[test]
    fn test_release_new() {
        let release = Release::new(Version::new(1, 2, 3), "v1.2.3", "abc123", None);
        assert_eq!(release.version, Version::new(1, 2, 3));
        assert_eq!(release.git_tag, "v1.2.3");
        assert_eq!(release.git_head, "abc123");
        assert!(release.channel.is_none());
        assert!(release.channels.is_empty());
        assert!(release.bump.is_none());
        assert!(release.notes.is_none());
    }

    #[test]
    fn test_release_builders() {
        let release = Release::new(
            Version::new(1, 0, 0),
            "v1.0.0",
            "abc123",
            Some("next".to_string()),
        )
        .with_channels(vec![None, Some("next".to_string())])
        .with_bump(BumpType::Minor);

        assert_eq!(release.channels.len(), 2);
        assert_eq!(release.bump, Some(BumpType::Minor));
    }
}
