//! Step scripts: recorded open/close sequences replayed through a tracker.
//!
//! A script is a TOML file describing what a test harness did, event by
//! event:
//!
//! ```toml
//! test_name = "checkout_flow"
//! run_error = "device disconnected"
//!
//! [[events]]
//! open = "open cart"
//!
//! [[events]]
//! open = "tap pay"
//!
//! [[events]]
//! fail = "tap pay"
//! error = "button not found"
//! ```
//!
//! `close` and `fail` name the step they finish by description; the most
//! recently opened step with that description is meant. A script may end with
//! steps still open, which models a harness that crashed mid-run.

mod replay;

pub use replay::{ReplayReport, ScriptedFailure, StepCounts, replay};

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use ortho_config::toml;
use serde::Deserialize;

use crate::error::{Result, ScriptError};

/// One recorded harness action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    /// A step with this description was opened.
    Open(String),
    /// The named step finished successfully.
    Close(String),
    /// The named step finished with an error message.
    Fail {
        /// Description of the step that failed.
        description: String,
        /// Message of the failure.
        message: String,
    },
}

/// A parsed step script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepScript {
    test_name: Option<String>,
    run_error: Option<String>,
    events: Vec<StepEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScript {
    test_name: Option<String>,
    run_error: Option<String>,
    #[serde(default)]
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEvent {
    open: Option<String>,
    close: Option<String>,
    fail: Option<String>,
    error: Option<String>,
}

/// Message used for `fail` events that omit `error`.
const DEFAULT_FAILURE_MESSAGE: &str = "step failed";

impl RawEvent {
    fn into_event(self, index: usize) -> std::result::Result<StepEvent, ScriptError> {
        let event = match (self.open, self.close, self.fail, self.error) {
            (Some(description), None, None, None) => {
                if description.trim().is_empty() {
                    return Err(ScriptError::EmptyDescription { index });
                }
                StepEvent::Open(description)
            }
            (None, Some(description), None, None) => StepEvent::Close(description),
            (None, None, Some(description), message) => StepEvent::Fail {
                description,
                message: message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_owned()),
            },
            _ => return Err(ScriptError::AmbiguousEvent { index }),
        };
        Ok(event)
    }
}

impl StepScript {
    /// Parses a script from TOML source. `path` is only used in error
    /// messages.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Parse` for malformed TOML or unknown keys, and
    /// `ScriptError::AmbiguousEvent` / `ScriptError::EmptyDescription` for
    /// events that do not describe a single action.
    pub fn parse(source: &str, path: &Utf8Path) -> Result<Self> {
        let raw = toml::from_str::<RawScript>(source).map_err(|e| ScriptError::Parse {
            path: path.as_std_path().to_path_buf(),
            message: e.to_string(),
        })?;

        let events = raw
            .events
            .into_iter()
            .enumerate()
            .map(|(position, event)| event.into_event(position + 1))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            test_name: raw.test_name,
            run_error: raw.run_error,
            events,
        })
    }

    /// Reads and parses a script file.
    ///
    /// # Errors
    ///
    /// Returns `ScriptError::Read` when the file cannot be read, plus every
    /// error [`parse`](Self::parse) can return.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let file_name = path.file_name().unwrap_or(path.as_str());
        let read_error = |e: std::io::Error| ScriptError::Read {
            path: path.as_std_path().to_path_buf(),
            message: e.to_string(),
        };

        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let source = dir.read_to_string(file_name).map_err(read_error)?;
        Self::parse(&source, path)
    }

    /// Test name declared by the script.
    #[must_use]
    pub fn test_name(&self) -> Option<&str> {
        self.test_name.as_deref()
    }

    /// Run-level error declared by the script.
    #[must_use]
    pub fn run_error(&self) -> Option<&str> {
        self.run_error.as_deref()
    }

    /// Recorded events in order.
    #[must_use]
    pub fn events(&self) -> &[StepEvent] {
        &self.events
    }
}
