//! Branch expansion and classification.
//!
//! Branch patterns declared in the configuration are expanded against the
//! live remote branch list, then each concrete branch is assigned a release
//! policy and the cross-branch invariants are enforced.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use glob::Pattern;
use regex::Regex;
use semver::{Version, VersionReq};
use tracing::debug;

use cadence_config::{BranchRule, BranchSpec, ChannelSpec, PrereleaseSpec};
use cadence_plugin::{Branch, BranchType};

use crate::{CoreError, CoreResult};

/// Branch names shaped like `N.x` or `N.N.x` imply a maintenance range.
static MAINTENANCE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.(\d+\.)?x$").expect("maintenance name pattern"));

/// A branch pattern expanded against a concrete remote branch.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedBranch {
    /// The rule with its name replaced by the matched branch name and its
    /// string fields re-rendered.
    pub rule: BranchRule,

    /// Whether the branch was synthesized for a pull-request head ref.
    pub synthesized: bool,
}

enum BranchMatcher {
    Glob(Pattern),
    Literal(String),
}

impl BranchMatcher {
    fn new(pattern: &str) -> Self {
        match Pattern::new(pattern) {
            Ok(glob) => Self::Glob(glob),
            Err(_) => Self::Literal(pattern.to_string()),
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Glob(glob) => glob.matches(name),
            Self::Literal(literal) => literal == name,
        }
    }
}

/// Expands branch patterns against the remote branch list.
///
/// Patterns consume matching names from the pool in declaration order, so a
/// branch is claimed by at most one pattern. Patterns with no match
/// contribute nothing. When publishing from pull requests is enabled and
/// the CI branch is absent from the remote list (a PR head ref), it is
/// synthesized into the pool before matching.
#[must_use]
pub fn expand_branches(
    specs: &[BranchSpec],
    remote_branches: &[String],
    ci_branch: Option<&str>,
    publish_on_pr: bool,
) -> Vec<ExpandedBranch> {
    let mut pool: Vec<String> = remote_branches.to_vec();
    let mut synthesized: Option<String> = None;

    if publish_on_pr
        && let Some(ci) = ci_branch
        && !ci.is_empty()
        && !pool.iter().any(|name| name == ci)
    {
        debug!(branch = ci, "synthesizing pull-request head into branch pool");
        pool.push(ci.to_string());
        synthesized = Some(ci.to_string());
    }

    let mut expanded = Vec::new();
    for spec in specs {
        let rule = spec.rule();
        let matcher = BranchMatcher::new(&rule.name);

        let mut index = 0;
        while index < pool.len() {
            if matcher.matches(&pool[index]) {
                let name = pool.remove(index);
                let is_synthesized = synthesized.as_deref() == Some(name.as_str());
                expanded.push(render(&rule, name, is_synthesized));
            } else {
                index += 1;
            }
        }
    }

    expanded
}

/// Re-renders the rule's string fields against the matched branch name.
fn render(rule: &BranchRule, name: String, synthesized: bool) -> ExpandedBranch {
    let substitute = |text: &str| text.replace("{name}", &name);

    let channel = rule.channel.as_ref().map(|spec| match spec {
        ChannelSpec::Named(template) => ChannelSpec::Named(substitute(template)),
        ChannelSpec::Flag(flag) => ChannelSpec::Flag(*flag),
    });
    let range = rule.range.as_deref().map(substitute);
    let prerelease = rule.prerelease.as_ref().map(|spec| match spec {
        PrereleaseSpec::Identifier(template) => PrereleaseSpec::Identifier(substitute(template)),
        PrereleaseSpec::FromName(flag) => PrereleaseSpec::FromName(*flag),
    });

    ExpandedBranch {
        rule: BranchRule {
            name,
            channel,
            range,
            prerelease,
        },
        synthesized,
    }
}

fn partition(rule: &BranchRule) -> BranchType {
    let explicit_range = rule.range.as_deref().is_some_and(|range| !range.is_empty());
    if explicit_range || MAINTENANCE_NAME.is_match(&rule.name) {
        return BranchType::Maintenance;
    }
    match rule.prerelease {
        Some(PrereleaseSpec::Identifier(_)) | Some(PrereleaseSpec::FromName(true)) => {
            BranchType::Prerelease
        }
        Some(PrereleaseSpec::FromName(false)) | None => BranchType::Release,
    }
}

/// Classifies expanded branches and enforces the cross-branch invariants.
///
/// # Errors
///
/// Returns a configuration error enumerating every offending branch when a
/// maintenance range is invalid or duplicated, a prerelease identifier is
/// invalid or duplicated, or the release-branch count is outside 1..=3.
pub fn classify(
    expanded: &[ExpandedBranch],
    first_version: &Version,
    prerelease_base: u64,
) -> CoreResult<Vec<Branch>> {
    let mut branches = Vec::with_capacity(expanded.len());
    let mut seen_release = false;

    for entry in expanded {
        let rule = &entry.rule;
        let branch_type = partition(rule);

        let is_first_release = branch_type == BranchType::Release && !seen_release;
        seen_release = seen_release || branch_type == BranchType::Release;

        let channel = match &rule.channel {
            Some(ChannelSpec::Named(name)) => Some(name.clone()),
            Some(ChannelSpec::Flag(false)) => None,
            Some(ChannelSpec::Flag(true)) | None => {
                if is_first_release {
                    None
                } else {
                    Some(rule.name.clone())
                }
            }
        };

        let range = match branch_type {
            BranchType::Maintenance => {
                Some(rule.range.clone().unwrap_or_else(|| rule.name.clone()))
            }
            _ => None,
        };

        let prerelease = match branch_type {
            BranchType::Prerelease => Some(match &rule.prerelease {
                Some(PrereleaseSpec::Identifier(identifier)) => identifier.clone(),
                _ => rule.name.clone(),
            }),
            _ => None,
        };

        branches.push(Branch {
            name: rule.name.clone(),
            branch_type,
            channel,
            range,
            prerelease,
            synthesized: entry.synthesized,
            tags: Vec::new(),
        });
    }

    validate(&branches, first_version, prerelease_base)?;
    Ok(branches)
}

fn validate(
    branches: &[Branch],
    first_version: &Version,
    prerelease_base: u64,
) -> CoreResult<()> {
    let mut errors = Vec::new();

    let mut ranges: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for branch in branches
        .iter()
        .filter(|branch| branch.branch_type == BranchType::Maintenance)
    {
        let range = branch.range.clone().unwrap_or_default();
        if VersionReq::parse(&range).is_err() {
            errors.push(CoreError::InvalidMaintenanceRange {
                branch: branch.name.clone(),
                range: range.clone(),
            });
        }
        ranges.entry(range).or_default().push(branch.name.clone());
    }
    for (range, names) in ranges {
        if names.len() > 1 {
            errors.push(CoreError::DuplicateMaintenanceRange {
                range,
                branches: names,
            });
        }
    }

    let mut identifiers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for branch in branches
        .iter()
        .filter(|branch| branch.branch_type == BranchType::Prerelease)
    {
        let identifier = branch.prerelease.clone().unwrap_or_default();
        let candidate = format!(
            "{}.{}.{}-{identifier}.{prerelease_base}",
            first_version.major, first_version.minor, first_version.patch
        );
        if Version::parse(&candidate).is_err() {
            errors.push(CoreError::InvalidPrereleaseIdentifier {
                branch: branch.name.clone(),
                identifier: identifier.clone(),
            });
        }
        identifiers
            .entry(identifier)
            .or_default()
            .push(branch.name.clone());
    }
    for (identifier, names) in identifiers {
        if names.len() > 1 {
            errors.push(CoreError::DuplicatePrereleaseIdentifier {
                identifier,
                branches: names,
            });
        }
    }

    let release_names: Vec<String> = branches
        .iter()
        .filter(|branch| branch.branch_type == BranchType::Release)
        .map(|branch| branch.name.clone())
        .collect();
    if release_names.is_empty() || release_names.len() > 3 {
        errors.push(CoreError::ReleaseBranchCount {
            branches: release_names,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::from_vec(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn specs(list: &[&str]) -> Vec<BranchSpec> {
        list.iter()
            .map(|name| BranchSpec::Name((*name).to_string()))
            .collect()
    }

    fn detailed(
        name: &str,
        channel: Option<ChannelSpec>,
        range: Option<&str>,
        prerelease: Option<PrereleaseSpec>,
    ) -> BranchSpec {
        BranchSpec::Detailed(BranchRule {
            name: name.to_string(),
            channel,
            range: range.map(ToString::to_string),
            prerelease,
        })
    }

    fn classify_defaults(expanded: &[ExpandedBranch]) -> CoreResult<Vec<Branch>> {
        classify(expanded, &Version::new(1, 0, 0), 1)
    }

    #[test]
    fn test_expand_literal_match() {
        let expanded = expand_branches(
            &specs(&["main"]),
            &names(&["main", "next"]),
            None,
            false,
        );
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].rule.name, "main");
        assert!(!expanded[0].synthesized);
    }

    #[test]
    fn test_expand_no_match_is_silent() {
        let expanded = expand_branches(&specs(&["release"]), &names(&["main"]), None, false);
        assert!(expanded.is_empty());
    }

    #[test]
    fn test_expand_glob_match() {
        let expanded = expand_branches(
            &specs(&["[0-9]*.x"]),
            &names(&["1.x", "2.1.x", "main"]),
            None,
            false,
        );
        let matched: Vec<&str> = expanded
            .iter()
            .map(|entry| entry.rule.name.as_str())
            .collect();
        assert_eq!(matched, vec!["1.x", "2.1.x"]);
    }

    #[test]
    fn test_expand_claims_names_in_declaration_order() {
        // "main" is consumed by the literal pattern, so the glob only
        // claims what is left.
        let expanded = expand_branches(
            &specs(&["main", "ma*"]),
            &names(&["main", "master"]),
            None,
            false,
        );
        let matched: Vec<&str> = expanded
            .iter()
            .map(|entry| entry.rule.name.as_str())
            .collect();
        assert_eq!(matched, vec!["main", "master"]);

        let greedy = expand_branches(
            &specs(&["ma*", "main"]),
            &names(&["main", "master"]),
            None,
            false,
        );
        assert_eq!(greedy.len(), 2);
        // Both names were claimed by the glob; nothing is left for "main".
        let second_pass: Vec<&str> = greedy
            .iter()
            .map(|entry| entry.rule.name.as_str())
            .collect();
        assert_eq!(second_pass, vec!["main", "master"]);
    }

    #[test]
    fn test_expand_renders_templates() {
        let expanded = expand_branches(
            &[detailed(
                "*.x",
                Some(ChannelSpec::Named("legacy-{name}".to_string())),
                None,
                None,
            )],
            &names(&["1.x"]),
            None,
            false,
        );
        assert_eq!(
            expanded[0].rule.channel,
            Some(ChannelSpec::Named("legacy-1.x".to_string()))
        );
    }

    #[test]
    fn test_expand_synthesizes_pr_head() {
        let expanded = expand_branches(
            &specs(&["feature/*"]),
            &names(&["main"]),
            Some("feature/pr-42"),
            true,
        );
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].rule.name, "feature/pr-42");
        assert!(expanded[0].synthesized);
    }

    #[test]
    fn test_expand_no_synthesis_without_publish_on_pr() {
        let expanded = expand_branches(
            &specs(&["feature/*"]),
            &names(&["main"]),
            Some("feature/pr-42"),
            false,
        );
        assert!(expanded.is_empty());
    }

    #[test]
    fn test_expand_existing_branch_is_not_synthesized() {
        let expanded = expand_branches(&specs(&["main"]), &names(&["main"]), Some("main"), true);
        assert_eq!(expanded.len(), 1);
        assert!(!expanded[0].synthesized);
    }

    #[test]
    fn test_classify_partitions() {
        let expanded = expand_branches(
            &[
                BranchSpec::Name("main".to_string()),
                BranchSpec::Name("1.x".to_string()),
                detailed("beta", None, None, Some(PrereleaseSpec::FromName(true))),
            ],
            &names(&["main", "1.x", "beta"]),
            None,
            false,
        );
        let branches = classify_defaults(&expanded).unwrap();

        assert_eq!(branches[0].branch_type, BranchType::Release);
        assert_eq!(branches[1].branch_type, BranchType::Maintenance);
        assert_eq!(branches[1].range.as_deref(), Some("1.x"));
        assert_eq!(branches[2].branch_type, BranchType::Prerelease);
        assert_eq!(branches[2].prerelease.as_deref(), Some("beta"));
    }

    #[test]
    fn test_classify_explicit_range_wins_over_prerelease() {
        let expanded = expand_branches(
            &[
                BranchSpec::Name("main".to_string()),
                detailed(
                    "legacy",
                    None,
                    Some("1.x"),
                    Some(PrereleaseSpec::FromName(true)),
                ),
            ],
            &names(&["main", "legacy"]),
            None,
            false,
        );
        let branches = classify_defaults(&expanded).unwrap();
        assert_eq!(branches[1].branch_type, BranchType::Maintenance);
    }

    #[test]
    fn test_classify_channel_defaults() {
        let expanded = expand_branches(
            &specs(&["main", "next"]),
            &names(&["main", "next"]),
            None,
            false,
        );
        let branches = classify_defaults(&expanded).unwrap();
        assert_eq!(branches[0].channel, None);
        assert_eq!(branches[1].channel.as_deref(), Some("next"));
    }

    #[test]
    fn test_classify_channel_false_forces_default() {
        let expanded = expand_branches(
            &[
                BranchSpec::Name("main".to_string()),
                detailed("next", Some(ChannelSpec::Flag(false)), None, None),
            ],
            &names(&["main", "next"]),
            None,
            false,
        );
        let branches = classify_defaults(&expanded).unwrap();
        assert_eq!(branches[1].channel, None);
    }

    #[test]
    fn test_classify_rejects_duplicate_maintenance_ranges() {
        let expanded = expand_branches(
            &[
                BranchSpec::Name("main".to_string()),
                BranchSpec::Name("1.x".to_string()),
                detailed("one-x", None, Some("1.x"), None),
            ],
            &names(&["main", "1.x", "one-x"]),
            None,
            false,
        );
        let error = classify_defaults(&expanded).unwrap_err();
        match error {
            CoreError::DuplicateMaintenanceRange { range, branches } => {
                assert_eq!(range, "1.x");
                assert_eq!(branches, vec!["1.x".to_string(), "one-x".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_classify_rejects_invalid_maintenance_range() {
        let expanded = expand_branches(
            &[
                BranchSpec::Name("main".to_string()),
                detailed("legacy", None, Some("not a range"), None),
            ],
            &names(&["main", "legacy"]),
            None,
            false,
        );
        let error = classify_defaults(&expanded).unwrap_err();
        assert!(matches!(error, CoreError::InvalidMaintenanceRange { .. }));
    }

    #[test]
    fn test_classify_rejects_four_release_branches() {
        let expanded = expand_branches(
            &specs(&["a", "b", "c", "d"]),
            &names(&["a", "b", "c", "d"]),
            None,
            false,
        );
        let error = classify_defaults(&expanded).unwrap_err();
        match error {
            CoreError::ReleaseBranchCount { branches } => assert_eq!(branches.len(), 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_classify_rejects_zero_release_branches() {
        let expanded = expand_branches(&specs(&["1.x"]), &names(&["1.x"]), None, false);
        let error = classify_defaults(&expanded).unwrap_err();
        assert!(matches!(error, CoreError::ReleaseBranchCount { .. }));
    }

    #[test]
    fn test_classify_rejects_duplicate_prerelease_identifiers() {
        let expanded = expand_branches(
            &[
                BranchSpec::Name("main".to_string()),
                detailed("beta", None, None, Some(PrereleaseSpec::FromName(true))),
                detailed(
                    "testing",
                    None,
                    None,
                    Some(PrereleaseSpec::Identifier("beta".to_string())),
                ),
            ],
            &names(&["main", "beta", "testing"]),
            None,
            false,
        );
        let error = classify_defaults(&expanded).unwrap_err();
        assert!(matches!(
            error,
            CoreError::DuplicatePrereleaseIdentifier { .. }
        ));
    }

    #[test]
    fn test_classify_rejects_invalid_prerelease_identifier() {
        let expanded = expand_branches(
            &[
                BranchSpec::Name("main".to_string()),
                detailed(
                    "feature/shiny",
                    None,
                    None,
                    Some(PrereleaseSpec::FromName(true)),
                ),
            ],
            &names(&["main", "feature/shiny"]),
            None,
            false,
        );
        let error = classify_defaults(&expanded).unwrap_err();
        assert!(matches!(
            error,
            CoreError::InvalidPrereleaseIdentifier { .. }
        ));
    }

    #[test]
    fn test_classify_aggregates_multiple_failures() {
        let expanded = expand_branches(
            &[
                detailed("legacy", None, Some("not a range"), None),
                detailed(
                    "feature/shiny",
                    None,
                    None,
                    Some(PrereleaseSpec::FromName(true)),
                ),
            ],
            &names(&["legacy", "feature/shiny"]),
            None,
            false,
        );
        let error = classify_defaults(&expanded).unwrap_err();
        match error {
            // Invalid range, invalid identifier, and no release branch.
            CoreError::Aggregate(errors) => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
