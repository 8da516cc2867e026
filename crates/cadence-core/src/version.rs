//! Next-version computation.
//!
//! A pure function of the branch policy, the requested bump, the last
//! release, and the first-release configuration. Increments are
//! prerelease-aware: a version already carrying a prerelease suffix first
//! completes to its release triplet before the triplet advances.

use semver::{Prerelease, Version};

use cadence_plugin::{Branch, BranchType, BumpType, Release};

/// Applies the major-zero damper to a requested bump.
///
/// While the reference major version is 0, a major bump is treated as
/// minor and a minor bump as patch, so ordinary feature commits cannot
/// cause an unintentional jump to 1.0.0.
#[must_use]
pub fn dampen(bump: BumpType, major_is_zero: bool) -> BumpType {
    if !major_is_zero {
        return bump;
    }
    match bump {
        BumpType::Major => BumpType::Minor,
        BumpType::Minor | BumpType::Patch => BumpType::Patch,
    }
}

/// Increments a version by a bump size.
///
/// A version with a prerelease suffix completes to the triplet the suffix
/// was announcing when that triplet already satisfies the bump:
/// `1.2.3-beta.4` bumped by patch is `1.2.3`, not `1.2.4`.
#[must_use]
pub fn increment(version: &Version, bump: BumpType) -> Version {
    let mut next = Version::new(version.major, version.minor, version.patch);
    let pre = !version.pre.is_empty();

    match bump {
        BumpType::Major => {
            if !(pre && version.minor == 0 && version.patch == 0) {
                next.major += 1;
            }
            next.minor = 0;
            next.patch = 0;
        }
        BumpType::Minor => {
            if !(pre && version.patch == 0) {
                next.minor += 1;
            }
            next.patch = 0;
        }
        BumpType::Patch => {
            if !pre {
                next.patch += 1;
            }
        }
    }

    next
}

/// Increments the trailing numeric counter of a prerelease version.
///
/// `1.0.1-beta.1` becomes `1.0.1-beta.2`; a suffix with no trailing
/// counter gains one (`1.0.0-beta` becomes `1.0.0-beta.0`).
#[must_use]
pub fn increment_prerelease(version: &Version) -> Version {
    let mut next = Version::new(version.major, version.minor, version.patch);

    if version.pre.is_empty() {
        next.patch += 1;
        next.pre = Prerelease::new("0").unwrap_or_default();
        return next;
    }

    let mut identifiers: Vec<String> = version.pre.split('.').map(String::from).collect();
    match identifiers.last_mut().map(|last| (last.parse::<u64>(), last)) {
        Some((Ok(counter), last)) => *last = (counter + 1).to_string(),
        _ => identifiers.push("0".to_string()),
    }

    next.pre = Prerelease::new(&identifiers.join(".")).unwrap_or_default();
    next
}

/// Appends a prerelease identifier and counter to a release triplet.
fn with_prerelease(version: &Version, identifier: &str, counter: u64) -> Version {
    let mut next = Version::new(version.major, version.minor, version.patch);
    next.pre = Prerelease::new(&format!("{identifier}.{counter}")).unwrap_or_default();
    next
}

/// Computes the next version for a branch.
///
/// Rules, in order: major-zero dampening; the configured first release
/// when the branch history has none; a plain increment on non-prerelease
/// branches; on prerelease branches, the semver-greater of the
/// continuation candidate (resume the counter when the last release is a
/// prerelease on the same channel) and the fresh candidate (restart the
/// sequence from the branch's highest known version). Picking the greater
/// of the two is what resumes a sequence merged forward from a lower
/// channel, and fast-forwards past regular releases made elsewhere.
#[must_use]
pub fn next_version(
    branch: &Branch,
    bump: BumpType,
    last_release: Option<&Release>,
    first_version: &Version,
    prerelease_base: u64,
) -> Version {
    let identifier = branch
        .prerelease
        .clone()
        .unwrap_or_else(|| branch.name.clone());

    let Some(last) = last_release else {
        let initial = Version::new(
            first_version.major,
            first_version.minor,
            first_version.patch,
        );
        return match branch.branch_type {
            BranchType::Prerelease => with_prerelease(&initial, &identifier, prerelease_base),
            _ => initial,
        };
    };

    let bump = dampen(bump, last.version.major == 0);

    if branch.branch_type != BranchType::Prerelease {
        return increment(&last.version, bump);
    }

    let same_channel = !last.version.pre.is_empty()
        && last
            .channels
            .iter()
            .any(|channel| *channel == branch.channel);

    if same_channel {
        let continuation = increment_prerelease(&last.version);
        let reference = branch
            .tags
            .iter()
            .map(|tag| &tag.version)
            .max()
            .cloned()
            .unwrap_or_else(|| last.version.clone());
        let fresh = with_prerelease(&increment(&reference, bump), &identifier, prerelease_base);
        continuation.max(fresh)
    } else {
        let triplet = Version::new(last.version.major, last.version.minor, last.version.patch);
        with_prerelease(&increment(&triplet, bump), &identifier, prerelease_base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_plugin::Tag;

    fn version(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    fn release_on(raw: &str, channels: Vec<Option<&str>>) -> Release {
        Release::new(version(raw), format!("v{raw}"), format!("v{raw}"), None)
            .with_channels(channels.into_iter().map(|c| c.map(String::from)).collect())
    }

    fn with_tags(mut branch: Branch, versions: &[&str]) -> Branch {
        branch.tags = versions
            .iter()
            .map(|raw| Tag {
                git_tag: format!("v{raw}"),
                version: version(raw),
                channels: vec![None],
            })
            .collect();
        branch
    }

    fn first() -> Version {
        Version::new(1, 0, 0)
    }

    #[test]
    fn test_dampen_under_major_zero() {
        assert_eq!(dampen(BumpType::Major, true), BumpType::Minor);
        assert_eq!(dampen(BumpType::Minor, true), BumpType::Patch);
        assert_eq!(dampen(BumpType::Patch, true), BumpType::Patch);
    }

    #[test]
    fn test_dampen_noop_past_major_zero() {
        assert_eq!(dampen(BumpType::Major, false), BumpType::Major);
        assert_eq!(dampen(BumpType::Minor, false), BumpType::Minor);
        assert_eq!(dampen(BumpType::Patch, false), BumpType::Patch);
    }

    #[test]
    fn test_increment_clean_versions() {
        assert_eq!(increment(&version("1.2.3"), BumpType::Patch), version("1.2.4"));
        assert_eq!(increment(&version("1.2.3"), BumpType::Minor), version("1.3.0"));
        assert_eq!(increment(&version("1.2.3"), BumpType::Major), version("2.0.0"));
    }

    #[test]
    fn test_increment_completes_prerelease() {
        assert_eq!(
            increment(&version("1.2.3-beta.1"), BumpType::Patch),
            version("1.2.3")
        );
        assert_eq!(
            increment(&version("1.2.0-beta.1"), BumpType::Minor),
            version("1.2.0")
        );
        assert_eq!(
            increment(&version("2.0.0-beta.1"), BumpType::Major),
            version("2.0.0")
        );
    }

    #[test]
    fn test_increment_prerelease_not_announcing_the_bump() {
        assert_eq!(
            increment(&version("1.2.3-beta.1"), BumpType::Minor),
            version("1.3.0")
        );
        assert_eq!(
            increment(&version("1.2.3-beta.1"), BumpType::Major),
            version("2.0.0")
        );
    }

    #[test]
    fn test_increment_prerelease_counter() {
        assert_eq!(
            increment_prerelease(&version("1.0.1-beta.1")),
            version("1.0.1-beta.2")
        );
        assert_eq!(
            increment_prerelease(&version("1.0.0-beta")),
            version("1.0.0-beta.0")
        );
        assert_eq!(increment_prerelease(&version("1.0.0")), version("1.0.1-0"));
    }

    #[test]
    fn test_first_release_on_release_branch() {
        let branch = Branch::release("main", None);
        let next = next_version(&branch, BumpType::Minor, None, &first(), 1);
        assert_eq!(next, version("1.0.0"));
    }

    #[test]
    fn test_first_release_on_prerelease_branch() {
        let branch = Branch::prerelease("beta", Some("beta".to_string()), "beta");
        assert_eq!(
            next_version(&branch, BumpType::Minor, None, &first(), 1),
            version("1.0.0-beta.1")
        );
        assert_eq!(
            next_version(&branch, BumpType::Minor, None, &first(), 0),
            version("1.0.0-beta.0")
        );
    }

    #[test]
    fn test_increment_from_prior_release() {
        let branch = Branch::release("main", None);
        let last = release_on("1.0.0", vec![None]);

        assert_eq!(
            next_version(&branch, BumpType::Patch, Some(&last), &first(), 1),
            version("1.0.1")
        );
        assert_eq!(
            next_version(&branch, BumpType::Minor, Some(&last), &first(), 1),
            version("1.1.0")
        );
        assert_eq!(
            next_version(&branch, BumpType::Major, Some(&last), &first(), 1),
            version("2.0.0")
        );
    }

    #[test]
    fn test_major_zero_dampening() {
        let branch = Branch::release("main", None);
        let last = release_on("0.0.1", vec![None]);

        assert_eq!(
            next_version(&branch, BumpType::Patch, Some(&last), &first(), 1),
            version("0.0.2")
        );
        assert_eq!(
            next_version(&branch, BumpType::Minor, Some(&last), &first(), 1),
            version("0.0.2")
        );
        assert_eq!(
            next_version(&branch, BumpType::Major, Some(&last), &first(), 1),
            version("0.1.0")
        );
    }

    #[test]
    fn test_prerelease_continuation_on_same_channel() {
        let branch = with_tags(
            Branch::prerelease("beta", Some("beta".to_string()), "beta"),
            &["1.0.1-beta.1"],
        );
        let last = release_on("1.0.1-beta.1", vec![Some("beta")]);

        assert_eq!(
            next_version(&branch, BumpType::Patch, Some(&last), &first(), 1),
            version("1.0.1-beta.2")
        );
    }

    #[test]
    fn test_prerelease_switching_channel() {
        let branch = with_tags(
            Branch::prerelease("alpha", Some("alpha".to_string()), "alpha"),
            &["1.0.1-beta.1"],
        );
        let last = release_on("1.0.1-beta.1", vec![Some("beta")]);

        assert_eq!(
            next_version(&branch, BumpType::Patch, Some(&last), &first(), 1),
            version("1.0.2-alpha.1")
        );
        assert_eq!(
            next_version(&branch, BumpType::Patch, Some(&last), &first(), 0),
            version("1.0.2-alpha.0")
        );
    }

    #[test]
    fn test_prerelease_fast_forwards_past_regular_release() {
        // A regular 1.1.0 released elsewhere was merged into the beta
        // branch; the fresh candidate must win over the continuation.
        let branch = with_tags(
            Branch::prerelease("beta", Some("beta".to_string()), "beta"),
            &["1.0.1-beta.1", "1.1.0"],
        );
        let last = release_on("1.0.1-beta.1", vec![Some("beta")]);

        assert_eq!(
            next_version(&branch, BumpType::Patch, Some(&last), &first(), 1),
            version("1.1.1-beta.1")
        );
    }

    #[test]
    fn test_prerelease_after_regular_release() {
        // The last eligible release is a regular version: restart the
        // prerelease sequence above it.
        let branch = with_tags(
            Branch::prerelease("beta", Some("beta".to_string()), "beta"),
            &["1.1.0"],
        );
        let last = release_on("1.1.0", vec![None]);

        assert_eq!(
            next_version(&branch, BumpType::Minor, Some(&last), &first(), 1),
            version("1.2.0-beta.1")
        );
    }
}
