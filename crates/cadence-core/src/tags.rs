//! Tag and channel resolution.
//!
//! Tags are recovered through the tag-format template, and each tag's
//! channel membership is read back from repository notes: a legacy shared
//! ref and a per-tag ref, deep-merged with the per-tag ref winning.

use regex::Regex;
use semver::Version;
use serde_json::Value;
use tracing::debug;

use cadence_git::GitClient;
use cadence_plugin::{Branch, BranchType, BumpType, Release, Tag};

use crate::{CoreError, CoreResult};

/// Shared notes ref read for backward compatibility.
pub const NOTES_REF_LEGACY: &str = "refs/notes/semantic-release";

/// Prefix of the per-tag notes ref.
pub const NOTES_REF_PREFIX: &str = "refs/notes/semantic-release-";

/// The version placeholder in the tag-format template.
const VERSION_PLACEHOLDER: &str = "{version}";

/// Returns the per-tag notes ref for a tag name.
#[must_use]
pub fn note_ref_for(tag: &str) -> String {
    format!("{NOTES_REF_PREFIX}{tag}")
}

/// Validates that the template carries the version placeholder exactly
/// once.
///
/// # Errors
///
/// Returns a configuration error otherwise.
pub fn validate_tag_format(tag_format: &str) -> CoreResult<()> {
    if tag_format.matches(VERSION_PLACEHOLDER).count() == 1 {
        Ok(())
    } else {
        Err(CoreError::InvalidTagFormat {
            tag_format: tag_format.to_string(),
        })
    }
}

/// Renders a version through the tag-format template.
#[must_use]
pub fn make_tag(tag_format: &str, version: &Version) -> String {
    tag_format.replace(VERSION_PLACEHOLDER, &version.to_string())
}

/// Inverts the tag-format template into a regex capturing the version
/// label, anchored at the template's start.
///
/// # Errors
///
/// Returns a configuration error if the template is invalid.
pub fn tag_matcher(tag_format: &str) -> CoreResult<Regex> {
    validate_tag_format(tag_format)?;

    let escaped = regex::escape(tag_format);
    let pattern = format!(
        "^{}",
        escaped.replace(&regex::escape(VERSION_PLACEHOLDER), "(.+)")
    );

    Regex::new(&pattern).map_err(|_| CoreError::InvalidTagFormat {
        tag_format: tag_format.to_string(),
    })
}

/// Deep-merges two JSON values; the overlay wins on key conflicts.
#[must_use]
pub fn merge_json(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

fn channels_from(note: &Value) -> Vec<Option<String>> {
    match note.get("channels").and_then(Value::as_array) {
        Some(channels) => channels
            .iter()
            .map(|channel| channel.as_str().map(String::from))
            .collect(),
        None => vec![None],
    }
}

/// Resolves each branch's reachable tags and their channel membership.
///
/// Branches are processed in input order. A branch synthesized for a
/// pull-request head resolves against the working-tree HEAD, since the ref
/// may not exist locally.
///
/// # Errors
///
/// Returns an error if the template is invalid or a git operation fails.
pub fn resolve_tags<G: GitClient>(
    git: &G,
    branches: &mut [Branch],
    tag_format: &str,
) -> CoreResult<()> {
    let matcher = tag_matcher(tag_format)?;

    for branch in branches.iter_mut() {
        let source = if branch.synthesized {
            None
        } else {
            Some(branch.name.as_str())
        };

        let mut tags = Vec::new();
        for name in git.tags_reachable(source)? {
            let Some(captures) = matcher.captures(&name) else {
                continue;
            };
            let Some(label) = captures.get(1) else {
                continue;
            };
            let Ok(version) = Version::parse(label.as_str()) else {
                debug!(tag = %name, "discarding tag with non-semver label");
                continue;
            };

            let legacy = git.read_note(NOTES_REF_LEGACY, &name)?;
            let current = git.read_note(&note_ref_for(&name), &name)?;
            let channels = channels_from(&merge_json(legacy, current));

            tags.push(Tag {
                git_tag: name,
                version,
                channels,
            });
        }

        tags.sort_by(|a, b| a.version.cmp(&b.version));
        debug!(branch = %branch.name, tags = tags.len(), "resolved tags");
        branch.tags = tags;
    }

    Ok(())
}

/// Derives the last release from a branch's resolved tags.
///
/// Considers tags that are not prereleases, plus (on a prerelease branch)
/// prereleases published on the branch's own channel. With `before`, only
/// versions strictly lower are considered.
#[must_use]
pub fn last_release(branch: &Branch, before: Option<&Version>) -> Option<Release> {
    branch
        .tags
        .iter()
        .filter(|tag| {
            (branch.branch_type == BranchType::Prerelease
                && tag.channels.iter().any(|channel| *channel == branch.channel))
                || tag.version.pre.is_empty()
        })
        .filter(|tag| before.is_none_or(|bound| tag.version < *bound))
        .max_by(|a, b| a.version.cmp(&b.version))
        .map(|tag| {
            Release::new(
                tag.version.clone(),
                tag.git_tag.clone(),
                // Resolved to a commit hash by the orchestrator.
                tag.git_tag.clone(),
                branch.channel.clone(),
            )
            .with_channels(tag.channels.clone())
        })
}

/// An already-released version pending promotion to this branch's channel.
#[derive(Debug, Clone)]
pub struct ReleaseToAdd {
    /// The release preceding the promoted version on this channel.
    pub last_release: Option<Release>,

    /// The promoted version as released on its original channel.
    pub current_release: Release,

    /// The promoted version, re-targeted at this branch's channel.
    pub next_release: Release,
}

fn bump_between(last: Option<&Version>, next: &Version) -> BumpType {
    match last {
        None => BumpType::Major,
        Some(last) if next.major != last.major => BumpType::Major,
        Some(last) if next.minor != last.minor => BumpType::Minor,
        Some(_) => BumpType::Patch,
    }
}

/// Finds a version released on a later-listed branch's channel but absent
/// from this branch's channel: the forward/back-merge scenario.
///
/// Returns the highest such version, or `None` when the channel membership
/// is already consistent.
#[must_use]
pub fn release_to_add(branch: &Branch, branches: &[Branch]) -> Option<ReleaseToAdd> {
    let position = branches
        .iter()
        .position(|candidate| candidate.name == branch.name)?;
    let higher_channels: Vec<&Option<String>> = branches[position + 1..]
        .iter()
        .map(|candidate| &candidate.channel)
        .collect();

    let tag = branch
        .tags
        .iter()
        .filter(|tag| {
            !tag.channels.iter().any(|channel| *channel == branch.channel)
                && tag
                    .channels
                    .iter()
                    .any(|channel| higher_channels.contains(&channel))
        })
        .max_by(|a, b| a.version.cmp(&b.version))?;

    let last = last_release(branch, Some(&tag.version));
    let bump = bump_between(last.as_ref().map(|release| &release.version), &tag.version);

    let current_release = Release::new(
        tag.version.clone(),
        tag.git_tag.clone(),
        tag.git_tag.clone(),
        tag.channels.first().cloned().flatten(),
    )
    .with_channels(tag.channels.clone())
    .with_bump(bump);

    let next_release = Release::new(
        tag.version.clone(),
        tag.git_tag.clone(),
        tag.git_tag.clone(),
        branch.channel.clone(),
    )
    .with_channels(tag.channels.clone())
    .with_bump(bump);

    Some(ReleaseToAdd {
        last_release: last,
        current_release,
        next_release,
    })
}
