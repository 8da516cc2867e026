//! Lifecycle step trait.

use serde::{Deserialize, Serialize};

use super::Plugin;
use crate::{BumpType, Context, ErrorReport, PluginResult, Release};

/// A named lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Verify plugin preconditions.
    VerifyConditions,
    /// Decide the bump size from the commit list.
    AnalyzeCommits,
    /// Verify the computed release.
    VerifyRelease,
    /// Produce release-note text.
    GenerateNotes,
    /// Prepare artifacts ahead of publication.
    Prepare,
    /// Publish the release.
    Publish,
    /// Propagate an existing release to an additional channel.
    AddChannel,
    /// React to a successful run.
    Success,
    /// React to a failed run.
    Fail,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::VerifyConditions => "verify_conditions",
            Self::AnalyzeCommits => "analyze_commits",
            Self::VerifyRelease => "verify_release",
            Self::GenerateNotes => "generate_notes",
            Self::Prepare => "prepare",
            Self::Publish => "publish",
            Self::AddChannel => "add_channel",
            Self::Success => "success",
            Self::Fail => "fail",
        };
        write!(f, "{name}")
    }
}

/// The lifecycle-step contract.
///
/// A plugin implements any subset of the steps; unimplemented steps default
/// to no-ops. For a given step, every plugin implementing it is invoked
/// once, in declared order, against the shared [`Context`].
#[allow(unused_variables)]
pub trait StepPlugin: Plugin {
    /// Verifies that the plugin's preconditions hold.
    ///
    /// Failures across all plugins are aggregated before the run aborts.
    ///
    /// # Errors
    ///
    /// Returns an error if a precondition is not met.
    fn verify_conditions(&self, ctx: &mut Context) -> PluginResult<()> {
        Ok(())
    }

    /// Decides the bump size from the commit list.
    ///
    /// When several plugins implement this step, the most severe answer
    /// wins. `None` means "no release-worthy changes".
    ///
    /// # Errors
    ///
    /// Returns an error if analysis fails.
    fn analyze_commits(&self, ctx: &Context) -> PluginResult<Option<BumpType>> {
        Ok(None)
    }

    /// Verifies the computed release before any mutation.
    ///
    /// # Errors
    ///
    /// Returns an error to veto the release.
    fn verify_release(&self, ctx: &mut Context) -> PluginResult<()> {
        Ok(())
    }

    /// Produces release-note text.
    ///
    /// Text returned by successive plugins is concatenated onto
    /// `ctx.next_release.notes`, so a later plugin observes what earlier
    /// ones wrote.
    ///
    /// # Errors
    ///
    /// Returns an error if note generation fails.
    fn generate_notes(&self, ctx: &Context) -> PluginResult<Option<String>> {
        Ok(None)
    }

    /// Prepares artifacts ahead of publication.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation fails.
    fn prepare(&self, ctx: &mut Context) -> PluginResult<()> {
        Ok(())
    }

    /// Publishes the release. The tag already exists upstream.
    ///
    /// # Errors
    ///
    /// Returns an error if publication fails.
    fn publish(&self, ctx: &mut Context) -> PluginResult<Option<Release>> {
        Ok(None)
    }

    /// Propagates an existing release to an additional channel.
    ///
    /// # Errors
    ///
    /// Returns an error if the propagation fails.
    fn add_channel(&self, ctx: &mut Context) -> PluginResult<Option<Release>> {
        Ok(None)
    }

    /// Reacts to a successful run.
    ///
    /// # Errors
    ///
    /// Returns an error if the reaction fails.
    fn success(&self, ctx: &mut Context) -> PluginResult<()> {
        Ok(())
    }

    /// Reacts to a failed run with the aggregated error set.
    ///
    /// Errors raised here are logged by the pipeline, never re-raised.
    ///
    /// # Errors
    ///
    /// Returns an error if the reaction fails.
    fn fail(&self, ctx: &Context, errors: &[ErrorReport]) -> PluginResult<()> {
        Ok(())
    }
}
