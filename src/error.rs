//! Semantic error types for the steptrack library.
//!
//! Conditions a caller might inspect (a step closed out of order, a run
//! finalised twice) are modelled as `thiserror` enums. Opaque reporting via
//! `eyre::Report` is reserved for the binary boundary.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::step::StepFailure;

/// Broad classification of a [`StepError`].
///
/// Harnesses use this to decide whether a failure is caller misuse of the
/// open/close protocol or a repeated publish of the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepErrorKind {
    /// The caller broke the open/close discipline or the tree is inconsistent.
    IllegalState,
    /// The step tree was already published for this test.
    AssertionFailure,
}

/// Errors raised by the step tracker.
#[derive(Debug, Clone, Error)]
pub enum StepError {
    /// `close` was called with a step that is not the innermost open one.
    #[error("unable to finish step {step} because it is not current; current step is {current}")]
    NotCurrent {
        /// Label of the step the caller tried to close.
        step: String,
        /// Label of the step that is actually open, or `none`.
        current: String,
    },

    /// An unfinished step has no failed child and no inherited error.
    #[error("unable to find an error to finish failed step {step}")]
    MissingFailureCause {
        /// Label of the step left open without a recorded cause.
        step: String,
    },

    /// `finalize` ran on a test whose steps were already published.
    #[error("steps already published for test '{test_name}'")]
    AlreadyPublished {
        /// Name of the test whose result was already populated.
        test_name: String,
    },
}

impl StepError {
    /// Returns the classification of this error.
    #[must_use]
    pub const fn kind(&self) -> StepErrorKind {
        match self {
            Self::NotCurrent { .. } | Self::MissingFailureCause { .. } => {
                StepErrorKind::IllegalState
            }
            Self::AlreadyPublished { .. } => StepErrorKind::AssertionFailure,
        }
    }
}

/// Error returned by a scoped step run through
/// [`StepProducer::run_step`](crate::StepProducer::run_step).
#[derive(Debug, Clone, Error)]
pub enum StepRunError {
    /// The step body failed; the step was closed with this failure.
    #[error("step failed: {0}")]
    Body(StepFailure),

    /// Closing the step broke the open/close discipline.
    #[error(transparent)]
    Protocol(#[from] StepError),
}

impl From<StepRunError> for StepFailure {
    fn from(error: StepRunError) -> Self {
        match error {
            StepRunError::Body(failure) => failure,
            StepRunError::Protocol(protocol) => Self::new(protocol),
        }
    }
}

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error while merging layers.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors that can occur while loading a step script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The script file could not be read.
    #[error("failed to read step script '{path}': {message}")]
    Read {
        /// The path to the script.
        path: PathBuf,
        /// A description of the read failure.
        message: String,
    },

    /// The script file is not valid TOML or has an unknown event shape.
    #[error("failed to parse step script '{path}': {message}")]
    Parse {
        /// The path to the script.
        path: PathBuf,
        /// A description of the parse failure.
        message: String,
    },

    /// An event is not exactly one of an open, a close, or a failure.
    #[error("event {index} in step script must set exactly one of open, close or fail")]
    AmbiguousEvent {
        /// 1-based position of the offending event.
        index: usize,
    },

    /// A `close` or `fail` event names a step that was never opened.
    #[error("event {index} in step script closes unknown step '{description}'")]
    UnknownStep {
        /// 1-based position of the offending event.
        index: usize,
        /// Description the event referred to.
        description: String,
    },

    /// An `open` event carries an empty description.
    #[error("event {index} in step script opens a step with an empty description")]
    EmptyDescription {
        /// 1-based position of the offending event.
        index: usize,
    },
}

/// Top-level error type for the steptrack library.
///
/// At the binary boundary these errors are converted to `eyre::Report`.
#[derive(Debug, Error)]
pub enum SteptrackError {
    /// The step tracker rejected an operation.
    #[error(transparent)]
    Step(#[from] StepError),

    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred while loading a step script.
    #[error(transparent)]
    Script(#[from] ScriptError),
}

/// A specialised `Result` type for steptrack operations.
pub type Result<T> = std::result::Result<T, SteptrackError>;
