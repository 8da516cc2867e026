//! Initialize command.

use std::fs;
use std::path::Path;

use anyhow::{Result, bail};
use clap::Args;

use cadence_config::CONFIG_FILE_NAME;

const DEFAULT_CONFIG: &str = r#"# Cadence configuration.

# Remote branches eligible for releases, in matching order.
branches = [
    "[0-9]*.x",
    "main",
    "master",
    "next",
    "next-major",
    { name = "beta", prerelease = true },
    { name = "alpha", prerelease = true },
]

# Template used to render a version into a tag name.
tag_format = "v{version}"

# Version used for the first release of a branch history.
first_release = "1.0.0"

# Starting counter for prerelease versions.
prerelease_base = 1

# Plugin names, in execution order.
plugins = []
"#;

/// Arguments for the init command.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    pub force: bool,
}

/// Runs the init command.
pub fn run(args: &InitArgs) -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);
    if path.exists() && !args.force {
        bail!("{CONFIG_FILE_NAME} already exists (use --force to overwrite)");
    }

    fs::write(path, DEFAULT_CONFIG)?;
    println!("Wrote {CONFIG_FILE_NAME}");
    Ok(())
}
