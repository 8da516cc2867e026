//! Plugin error types.

use thiserror::Error;

use crate::Step;

/// Plugin-related errors.
#[derive(Debug, Error)]
pub enum PluginError {
    /// A lifecycle step implementation failed.
    #[error("plugin '{plugin}' failed at {step}: {message}")]
    StepFailed {
        /// The plugin that failed.
        plugin: String,
        /// The step it failed at.
        step: Step,
        /// What went wrong.
        message: String,
    },

    /// Plugin configuration error.
    #[error("plugin configuration error: {0}")]
    ConfigError(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    /// Creates a step-failure error.
    #[must_use]
    pub fn step_failed(plugin: impl Into<String>, step: Step, message: impl Into<String>) -> Self {
        Self::StepFailed {
            plugin: plugin.into(),
            step,
            message: message.into(),
        }
    }
}

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// A rendered error handed to the fail step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    /// Stable error code.
    pub code: String,

    /// Human-readable explanation.
    pub message: String,
}

impl ErrorReport {
    /// Creates a new report.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
