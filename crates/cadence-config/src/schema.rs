//! Configuration schema.

use serde::{Deserialize, Serialize};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Remote repository URL, overriding the repository's `origin`.
    #[serde(default)]
    pub repository_url: Option<String>,

    /// Branch declarations, in matching order.
    #[serde(default = "default_branches")]
    pub branches: Vec<BranchSpec>,

    /// Template used to render a version into a tag name.
    ///
    /// Must contain the `{version}` placeholder exactly once.
    #[serde(default = "default_tag_format")]
    pub tag_format: String,

    /// Version used for the first release of a branch history.
    #[serde(default = "default_first_release")]
    pub first_release: String,

    /// Take the first-release version from the package manifest instead.
    #[serde(default)]
    pub first_release_from_manifest: bool,

    /// Starting counter for prerelease versions (`1.0.0-beta.<base>`).
    #[serde(default = "default_prerelease_base")]
    pub prerelease_base: u64,

    /// Allow publishing from a pull-request head ref.
    #[serde(default)]
    pub publish_on_pr: bool,

    /// Compute the release without mutating the repository.
    #[serde(default)]
    pub dry_run: bool,

    /// Run outside a recognized CI environment without forcing dry-run.
    #[serde(default)]
    pub no_ci: bool,

    /// Plugin names, in execution order.
    #[serde(default)]
    pub plugins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository_url: None,
            branches: default_branches(),
            tag_format: default_tag_format(),
            first_release: default_first_release(),
            first_release_from_manifest: false,
            prerelease_base: default_prerelease_base(),
            publish_on_pr: false,
            dry_run: false,
            no_ci: false,
            plugins: Vec::new(),
        }
    }
}

fn default_tag_format() -> String {
    "v{version}".to_string()
}

fn default_first_release() -> String {
    "1.0.0".to_string()
}

fn default_prerelease_base() -> u64 {
    1
}

fn default_branches() -> Vec<BranchSpec> {
    vec![
        BranchSpec::Name("[0-9]*.x".to_string()),
        BranchSpec::Name("main".to_string()),
        BranchSpec::Name("master".to_string()),
        BranchSpec::Name("next".to_string()),
        BranchSpec::Name("next-major".to_string()),
        BranchSpec::Detailed(BranchRule {
            name: "beta".to_string(),
            channel: None,
            range: None,
            prerelease: Some(PrereleaseSpec::FromName(true)),
        }),
        BranchSpec::Detailed(BranchRule {
            name: "alpha".to_string(),
            channel: None,
            range: None,
            prerelease: Some(PrereleaseSpec::FromName(true)),
        }),
    ]
}

/// A branch declaration: a bare pattern, or a detailed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BranchSpec {
    /// Branch name or glob pattern.
    Name(String),

    /// Detailed declaration.
    Detailed(BranchRule),
}

impl BranchSpec {
    /// Normalizes the declaration into a full rule.
    #[must_use]
    pub fn rule(&self) -> BranchRule {
        match self {
            Self::Name(name) => BranchRule {
                name: name.clone(),
                channel: None,
                range: None,
                prerelease: None,
            },
            Self::Detailed(rule) => rule.clone(),
        }
    }
}

/// A detailed branch declaration.
///
/// The `name` may be a glob pattern; the other string fields are `{name}`
/// templates re-rendered against each matched branch name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchRule {
    /// Branch name or glob pattern.
    pub name: String,

    /// Distribution channel; `false` forces the default channel.
    #[serde(default)]
    pub channel: Option<ChannelSpec>,

    /// Maintenance range (`1.x`, `1.2.x`).
    #[serde(default)]
    pub range: Option<String>,

    /// Prerelease identifier; `true` uses the branch name.
    #[serde(default)]
    pub prerelease: Option<PrereleaseSpec>,
}

/// A declared distribution channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelSpec {
    /// Channel name template.
    Named(String),

    /// `false` pins the branch to the default (unnamed) channel.
    Flag(bool),
}

/// A declared prerelease identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrereleaseSpec {
    /// Identifier template.
    Identifier(String),

    /// `true` uses the branch name as the identifier.
    FromName(bool),
}
