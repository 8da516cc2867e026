//! Plugin pipeline execution.
//!
//! Plugins run sequentially, in declared order, one step at a time: a later
//! plugin may rely on mutations an earlier one made to the context.

use tracing::{debug, warn};

use cadence_plugin::{BumpType, Context, ErrorReport, Release, StepPlugin};

use crate::{CoreError, CoreResult};

/// The ordered plugin registry.
#[derive(Default)]
pub struct Pipeline {
    plugins: Vec<Box<dyn StepPlugin>>,
}

impl Pipeline {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self {
            plugins: Vec::new(),
        }
    }

    /// Appends a plugin.
    #[must_use]
    pub fn with_plugin(mut self, plugin: Box<dyn StepPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Returns the registered plugins.
    pub fn plugins(&self) -> &[Box<dyn StepPlugin>] {
        &self.plugins
    }

    /// Runs the verify-conditions step for every plugin.
    ///
    /// All plugins run even after a failure; failures are aggregated into
    /// one error.
    ///
    /// # Errors
    ///
    /// Returns the aggregated failures, if any.
    pub fn verify_conditions(&self, ctx: &mut Context) -> CoreResult<()> {
        let mut errors = Vec::new();
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running verify_conditions");
            if let Err(error) = plugin.verify_conditions(ctx) {
                errors.push(CoreError::Plugin(error));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::from_vec(errors))
        }
    }

    /// Runs commit analysis; the most severe answer wins.
    ///
    /// # Errors
    ///
    /// Returns the first analyzer failure.
    pub fn analyze_commits(&self, ctx: &Context) -> CoreResult<Option<BumpType>> {
        let mut bump: Option<BumpType> = None;
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running analyze_commits");
            if let Some(answer) = plugin.analyze_commits(ctx)? {
                bump = Some(bump.map_or(answer, |current| current.max(answer)));
            }
        }
        Ok(bump)
    }

    /// Runs the verify-release step for every plugin.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn verify_release(&self, ctx: &mut Context) -> CoreResult<()> {
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running verify_release");
            plugin.verify_release(ctx)?;
        }
        Ok(())
    }

    /// Runs note generation, concatenating each plugin's text onto
    /// `next_release.notes`.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn generate_notes(&self, ctx: &mut Context) -> CoreResult<()> {
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running generate_notes");
            let Some(text) = plugin.generate_notes(ctx)? else {
                continue;
            };
            if let Some(next_release) = ctx.next_release.as_mut() {
                next_release.notes = Some(match next_release.notes.take() {
                    Some(existing) => format!("{existing}\n\n{text}"),
                    None => text,
                });
            }
        }
        Ok(())
    }

    /// Runs the prepare step for every plugin.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn prepare(&self, ctx: &mut Context) -> CoreResult<()> {
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running prepare");
            plugin.prepare(ctx)?;
        }
        Ok(())
    }

    /// Runs the publish step, collecting the returned releases.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn publish(&self, ctx: &mut Context) -> CoreResult<Vec<Release>> {
        let mut releases = Vec::new();
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running publish");
            if let Some(release) = plugin.publish(ctx)? {
                releases.push(release);
            }
        }
        Ok(releases)
    }

    /// Runs the add-channel step, collecting the returned releases.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn add_channel(&self, ctx: &mut Context) -> CoreResult<Vec<Release>> {
        let mut releases = Vec::new();
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running add_channel");
            if let Some(release) = plugin.add_channel(ctx)? {
                releases.push(release);
            }
        }
        Ok(releases)
    }

    /// Runs the success step for every plugin.
    ///
    /// # Errors
    ///
    /// Returns the first failure.
    pub fn success(&self, ctx: &mut Context) -> CoreResult<()> {
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running success");
            plugin.success(ctx)?;
        }
        Ok(())
    }

    /// Runs the fail step with the aggregated error set.
    ///
    /// A failure inside a fail step is logged, never re-raised, so it
    /// cannot mask the original cause.
    pub fn fail(&self, ctx: &Context, errors: &[ErrorReport]) {
        for plugin in &self.plugins {
            debug!(plugin = plugin.name(), "running fail");
            if let Err(error) = plugin.fail(ctx, errors) {
                warn!(plugin = plugin.name(), %error, "fail step failed");
            }
        }
    }
}
