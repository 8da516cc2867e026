//! Release command.

use std::env;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use cadence_config::{Config, ConfigError, find_and_load_config};
use cadence_core::{CoreError, Pipeline, ReleaseManager};
use cadence_git::{GitClient as _, Repository};
use cadence_plugin::CiEnvironment;

/// Arguments for the release command.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Compute the release without mutating the repository
    #[arg(short, long)]
    pub dry_run: bool,

    /// Run outside a recognized CI environment
    #[arg(long)]
    pub no_ci: bool,
}

/// Runs the release command.
pub fn run(args: &ReleaseArgs) -> Result<()> {
    let mut config = match find_and_load_config() {
        Ok(config) => config,
        Err(ConfigError::NotFound(_)) => {
            info!("no configuration file found, using defaults");
            Config::default()
        }
        Err(error) => return Err(error).context("failed to load configuration"),
    };
    if args.dry_run {
        config.dry_run = true;
    }
    if args.no_ci {
        config.no_ci = true;
    }

    let repo = Repository::discover().context("failed to open git repository")?;
    let cwd = repo.path().to_path_buf();
    let ci = detect_environment(&repo)?;
    let pipeline = build_pipeline(&config)?;

    // Mirrors the orchestrator's CI gate, for reporting only.
    let dry_run = config.dry_run || (!ci.is_ci && !config.no_ci);

    let manager = ReleaseManager::new(repo);
    match manager.run(&pipeline, config, ci, cwd)? {
        Some(result) => match result.next_release {
            Some(next) if dry_run => println!(
                "Dry run: release {} ({}) would be published.",
                next.version, next.git_tag
            ),
            Some(next) => println!("Published release {} ({}).", next.version, next.git_tag),
            None => println!(
                "Added {} release(s) to new channels.",
                result.releases.len()
            ),
        },
        None => println!("No release published."),
    }

    Ok(())
}

/// Reads CI facts from the environment, falling back to the checked-out
/// branch.
fn detect_environment(repo: &Repository) -> Result<CiEnvironment> {
    let is_ci = env::var("CI").is_ok_and(|value| value == "true" || value == "1");
    let is_pr =
        env::var("CADENCE_PULL_REQUEST").is_ok_and(|value| value == "true" || value == "1");

    let branch = match env::var("CADENCE_BRANCH")
        .or_else(|_| env::var("GITHUB_REF_NAME"))
        .ok()
        .filter(|branch| !branch.is_empty())
    {
        Some(branch) => branch,
        None if repo.is_head_detached()? => {
            info!("HEAD is detached and no branch is set in the environment");
            String::new()
        }
        None => repo.current_branch()?.unwrap_or_default(),
    };

    Ok(CiEnvironment::new(is_ci, branch, is_pr))
}

/// Resolves declared plugin names against the built-in registry.
///
/// Plugins are registered through [`Pipeline::with_plugin`] by embedders;
/// the command-line build ships no built-ins yet, so any declared name is
/// a configuration error.
fn build_pipeline(config: &Config) -> Result<Pipeline> {
    if let Some(name) = config.plugins.first() {
        return Err(CoreError::UnknownPlugin { name: name.clone() }.into());
    }
    Ok(Pipeline::new())
}
