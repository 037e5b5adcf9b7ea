//! Replaying a [`StepScript`] through a [`StepTracker`].

use thiserror::Error;
use tracing::debug;

use super::{StepEvent, StepScript};
use crate::error::{Result, ScriptError};
use crate::result::TestResult;
use crate::step::{StepFailure, StepId, StepStatus, StepTree};
use crate::tracker::{ReconciliationMode, StepTracker};

/// Error value recorded for `fail` events and the script's run error.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ScriptedFailure {
    message: String,
}

impl ScriptedFailure {
    /// Creates a failure carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Step totals of a replayed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepCounts {
    /// Steps opened during the run.
    pub total: usize,
    /// Steps that finished successfully.
    pub passed: usize,
    /// Steps that failed, including those forced to fail at the end.
    pub failed: usize,
}

/// Outcome of replaying a script.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    result: TestResult,
}

impl ReplayReport {
    /// The finished test result, including the published step tree.
    #[must_use]
    pub const fn result(&self) -> &TestResult {
        &self.result
    }

    /// The published step tree.
    #[must_use]
    pub const fn steps(&self) -> Option<&StepTree> {
        self.result.steps()
    }

    /// Counts steps by status.
    #[must_use]
    pub fn counts(&self) -> StepCounts {
        self.steps()
            .into_iter()
            .flat_map(StepTree::iter)
            .fold(StepCounts::default(), |mut counts, step| {
                counts.total += 1;
                match step.status() {
                    StepStatus::Success => counts.passed += 1,
                    StepStatus::Failed => counts.failed += 1,
                    StepStatus::Pending => {}
                }
                counts
            })
    }

    /// Returns whether every top-level step succeeded and no run error was
    /// recorded.
    #[must_use]
    pub fn passed(&self) -> bool {
        let steps_passed = self.steps().is_none_or(|tree| {
            tree.roots()
                .iter()
                .filter_map(|id| tree.get(*id))
                .all(|step| step.status() == StepStatus::Success)
        });
        steps_passed && self.result.run_error().is_none()
    }
}

/// Replays `script` into a fresh tracker for `test_name` and finalises it.
///
/// # Errors
///
/// Returns `ScriptError::UnknownStep` when an event closes a step that was
/// never opened, and any [`StepError`](crate::error::StepError) the tracker
/// raises: closing a step out of order, an unexplained open step in strict
/// mode.
pub fn replay(
    script: &StepScript,
    test_name: &str,
    mode: ReconciliationMode,
) -> Result<ReplayReport> {
    let mut tracker = StepTracker::with_mode(TestResult::new(test_name), mode);
    let mut opened: Vec<(&str, StepId)> = Vec::new();

    for (position, event) in script.events().iter().enumerate() {
        let index = position + 1;
        match event {
            StepEvent::Open(description) => {
                let id = tracker.open(description.as_str());
                opened.push((description.as_str(), id));
            }
            StepEvent::Close(description) => {
                let id = lookup(&opened, description, index)?;
                tracker.close(id, None)?;
            }
            StepEvent::Fail {
                description,
                message,
            } => {
                let id = lookup(&opened, description, index)?;
                let failure = StepFailure::new(ScriptedFailure::new(message.as_str()));
                tracker.close(id, Some(failure))?;
            }
        }
    }

    if let Some(message) = script.run_error() {
        debug!(%message, "recording run error");
        tracker.record_run_error(Some(StepFailure::new(ScriptedFailure::new(message))));
    }
    tracker.finalize()?;

    Ok(ReplayReport {
        result: tracker.into_store(),
    })
}

/// Most recently opened step with `description`.
fn lookup(
    opened: &[(&str, StepId)],
    description: &str,
    index: usize,
) -> std::result::Result<StepId, ScriptError> {
    opened
        .iter()
        .rev()
        .find(|(candidate, _)| *candidate == description)
        .map(|(_, id)| *id)
        .ok_or_else(|| ScriptError::UnknownStep {
            index,
            description: description.to_owned(),
        })
}
