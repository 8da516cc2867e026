//! Release orchestration.
//!
//! The orchestrator owns the single [`Context`] of an invocation and walks
//! the release state machine: init and CI gating, the push-permission
//! probe, verify-conditions, the add-channel promotion path, then the
//! new-release path. Side effects are strictly ordered: nothing is mutated
//! before verify-conditions succeeds, the tag is created before it is
//! pushed, and both precede the publish step.

use std::path::{Path, PathBuf};

use semver::{Version, VersionReq};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use cadence_commit::RawCommit;
use cadence_config::Config;
use cadence_git::GitClient;
use cadence_plugin::{BranchType, CiEnvironment, Context, Release, Tag};

use crate::branches::{classify, expand_branches};
use crate::tags::{
    ReleaseToAdd, last_release, make_tag, note_ref_for, release_to_add, resolve_tags,
    validate_tag_format,
};
use crate::version::next_version;
use crate::{CoreError, CoreResult, Pipeline};

/// The result of an invocation that published something.
///
/// `next_release` is absent when only add-channel promotions happened.
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseResult {
    /// The last release found in the branch history.
    pub last_release: Option<Release>,

    /// Commits since the last release.
    pub commits: Vec<RawCommit>,

    /// The newly published release, if any.
    pub next_release: Option<Release>,

    /// Releases returned by publish and add-channel steps.
    pub releases: Vec<Release>,
}

/// Drives the release pipeline against a repository.
pub struct ReleaseManager<G> {
    git: G,
}

impl<G: GitClient> ReleaseManager<G> {
    /// Creates a new release manager.
    #[must_use]
    pub fn new(git: G) -> Self {
        Self { git }
    }

    /// Runs one release invocation.
    ///
    /// Returns `None` for the benign non-release outcomes: pull request
    /// without publish-on-pr, unconfigured branch, stale local branch, or
    /// no release-worthy commits.
    ///
    /// # Errors
    ///
    /// Returns a configuration error before any mutation, a git-auth error
    /// when the push probe fails on an up-to-date branch, an
    /// invalid-version error when a computed version leaves a maintenance
    /// range, or the failure of any plugin step. Fatal errors are handed
    /// to the fail step before being returned.
    pub fn run(
        &self,
        pipeline: &Pipeline,
        options: Config,
        env: CiEnvironment,
        cwd: impl Into<PathBuf>,
    ) -> CoreResult<Option<ReleaseResult>> {
        let mut options = options;
        let cwd = cwd.into();

        if !env.is_ci && !options.dry_run && !options.no_ci {
            warn!("not running in a known CI environment, falling back to dry-run mode");
            options.dry_run = true;
        }

        if env.is_pr && !options.publish_on_pr {
            info!("triggered by a pull request, no new version is published");
            return Ok(None);
        }

        validate_tag_format(&options.tag_format)?;
        let first_version = first_version(&options, &cwd)?;

        let remote_branches = self.git.remote_branches()?;
        let expanded = expand_branches(
            &options.branches,
            &remote_branches,
            Some(&env.branch),
            options.publish_on_pr,
        );
        let mut branches = classify(&expanded, &first_version, options.prerelease_base)?;
        resolve_tags(&self.git, &mut branches, &options.tag_format)?;

        let Some(branch) = branches
            .iter()
            .find(|branch| branch.name == env.branch)
            .cloned()
        else {
            info!(
                branch = %env.branch,
                "branch is not configured for releases, no new version is published"
            );
            return Ok(None);
        };
        debug!(branch = %branch.name, policy = %branch.branch_type, "classified current branch");

        let mut ctx = Context::new(cwd, env, options, branch, branches);

        match self.execute(pipeline, &mut ctx, &first_version) {
            Ok(result) => Ok(result),
            Err(error) => {
                pipeline.fail(&ctx, &error.reports());
                Err(error)
            }
        }
    }

    fn execute(
        &self,
        pipeline: &Pipeline,
        ctx: &mut Context,
        first_version: &Version,
    ) -> CoreResult<Option<ReleaseResult>> {
        if let Err(probe) = self.git.verify_push_permission() {
            if !self.git.is_branch_up_to_date(&ctx.branch.name)? {
                info!(
                    branch = %ctx.branch.name,
                    "local branch is behind the remote, no new version is published"
                );
                return Ok(None);
            }
            debug!(error = %probe, "push probe failed");
            return Err(CoreError::GitAuth {
                branch: ctx.branch.name.clone(),
            });
        }
        info!("allowed to push to the remote repository");

        pipeline.verify_conditions(ctx)?;

        self.add_channel_path(pipeline, ctx)?;
        self.new_release_path(pipeline, ctx, first_version)
    }

    /// Promotes an already-released version to this branch's channel, when
    /// a forward/back-merge left one pending.
    fn add_channel_path(&self, pipeline: &Pipeline, ctx: &mut Context) -> CoreResult<()> {
        let Some(to_add) = release_to_add(&ctx.branch, &ctx.branches) else {
            return Ok(());
        };
        let ReleaseToAdd {
            last_release: mut last,
            current_release: mut current,
            next_release: mut next,
        } = to_add;

        next.git_head = self.git.rev_parse(&next.git_tag)?;
        current.git_head = self.git.rev_parse(&current.git_tag)?;
        if let Some(release) = last.as_mut() {
            release.git_head = self.git.rev_parse(&release.git_tag)?;
        }

        if ctx.branch.branch_type == BranchType::Maintenance
            && let Some(range) = ctx.branch.range.as_deref()
            && !version_in_range(&next.version, range)
        {
            return Err(CoreError::InvalidVersion {
                version: next.version.to_string(),
                branch: ctx.branch.name.clone(),
                range: range.to_string(),
            });
        }

        let mut channels = current.channels.clone();
        if !channels.contains(&next.channel) {
            channels.push(next.channel.clone());
        }
        next.channels = channels.clone();

        let git_tag = next.git_tag.clone();
        let version = next.version.clone();
        let channel = next.channel.clone();

        // Regenerate notes from the commits the promotion covers.
        ctx.commits = self
            .git
            .commits_between(last.as_ref().map(|release| release.git_tag.as_str()), &git_tag)?;
        ctx.last_release = last;
        ctx.next_release = Some(next);
        pipeline.generate_notes(ctx)?;

        if ctx.options.dry_run {
            info!(
                tag = %git_tag,
                "skipping channel note update and add-channel steps in dry-run mode"
            );
            ctx.branch.tags.push(Tag {
                git_tag,
                version,
                channels,
            });
        } else {
            let notes_ref = note_ref_for(&git_tag);
            self.git
                .write_note(&notes_ref, &git_tag, &json!({ "channels": channels }))?;
            self.git.push_tag(&git_tag)?;
            self.git.push_notes(&notes_ref)?;
            info!(
                tag = %git_tag,
                channel = channel.as_deref().unwrap_or("default"),
                "added channel to existing release"
            );

            ctx.branch.tags.push(Tag {
                git_tag,
                version,
                channels,
            });

            let releases = pipeline.add_channel(ctx)?;
            ctx.releases.extend(releases);
            pipeline.success(ctx)?;
        }

        Ok(())
    }

    fn new_release_path(
        &self,
        pipeline: &Pipeline,
        ctx: &mut Context,
        first_version: &Version,
    ) -> CoreResult<Option<ReleaseResult>> {
        let mut last = last_release(&ctx.branch, None);
        if let Some(release) = last.as_mut() {
            release.git_head = self.git.rev_parse(&release.git_tag)?;
        }
        ctx.commits = self
            .git
            .commits_between(last.as_ref().map(|release| release.git_tag.as_str()), "HEAD")?;
        ctx.last_release = last;
        ctx.next_release = None;
        info!(count = ctx.commits.len(), "found commits since last release");

        let Some(bump) = pipeline.analyze_commits(ctx)? else {
            info!("no relevant changes, no new version is released");
            if ctx.releases.is_empty() {
                return Ok(None);
            }
            return Ok(Some(ReleaseResult {
                last_release: ctx.last_release.clone(),
                commits: ctx.commits.clone(),
                next_release: None,
                releases: ctx.releases.clone(),
            }));
        };
        info!(%bump, "commit analysis decided the bump size");

        let version = next_version(
            &ctx.branch,
            bump,
            ctx.last_release.as_ref(),
            first_version,
            ctx.options.prerelease_base,
        );

        if ctx.branch.branch_type == BranchType::Maintenance
            && let Some(range) = ctx.branch.range.as_deref()
            && !version_in_range(&version, range)
        {
            return Err(CoreError::InvalidVersion {
                version: version.to_string(),
                branch: ctx.branch.name.clone(),
                range: range.to_string(),
            });
        }

        let git_tag = make_tag(&ctx.options.tag_format, &version);
        let git_head = self.git.head_hash()?;
        info!(%version, tag = %git_tag, "computed next version");

        let channels = vec![ctx.branch.channel.clone()];
        ctx.next_release = Some(
            Release::new(
                version.clone(),
                git_tag.clone(),
                git_head.clone(),
                ctx.branch.channel.clone(),
            )
            .with_channels(channels.clone())
            .with_bump(bump),
        );

        pipeline.verify_release(ctx)?;
        pipeline.generate_notes(ctx)?;

        if ctx.options.dry_run {
            warn!(
                tag = %git_tag,
                "skipping prepare, tag creation, and publish steps in dry-run mode"
            );
            if let Some(notes) = ctx
                .next_release
                .as_ref()
                .and_then(|release| release.notes.as_deref())
            {
                info!(%version, notes, "release notes");
            }
            ctx.branch.tags.push(Tag {
                git_tag,
                version: version.clone(),
                channels,
            });
        } else {
            pipeline.prepare(ctx)?;

            // Publish plugins may assume the tag already exists upstream.
            let notes_ref = note_ref_for(&git_tag);
            self.git.create_tag(&git_tag, &git_head)?;
            self.git
                .write_note(&notes_ref, &git_tag, &json!({ "channels": channels }))?;
            self.git.push_tag(&git_tag)?;
            self.git.push_notes(&notes_ref)?;
            info!(tag = %git_tag, "created tag");

            ctx.branch.tags.push(Tag {
                git_tag,
                version: version.clone(),
                channels,
            });

            let releases = pipeline.publish(ctx)?;
            ctx.releases.extend(releases);
            pipeline.success(ctx)?;

            info!(
                %version,
                channel = ctx.branch.channel.as_deref().unwrap_or("default"),
                "published release"
            );
        }

        Ok(Some(ReleaseResult {
            last_release: ctx.last_release.clone(),
            commits: ctx.commits.clone(),
            next_release: ctx.next_release.clone(),
            releases: ctx.releases.clone(),
        }))
    }
}

fn first_version(options: &Config, cwd: &Path) -> CoreResult<Version> {
    if options.first_release_from_manifest
        && let Some(version) = cadence_config::manifest_version(cwd)
    {
        return Ok(version);
    }
    Version::parse(&options.first_release).map_err(|_| CoreError::InvalidFirstRelease {
        value: options.first_release.clone(),
    })
}

fn version_in_range(version: &Version, range: &str) -> bool {
    VersionReq::parse(range).is_ok_and(|requirement| requirement.matches(version))
}
