//! Test-result collaborator.
//!
//! The tracker publishes its finished step tree into a [`TestResultStore`]
//! and forwards the run-level error to it. [`TestResult`] is the in-memory
//! store used by the binary and by library embedders that do not bring their
//! own reporting backend.

use crate::step::{StepFailure, StepTree};

/// Destination for the results of a single test run.
///
/// The published-steps slot is write-once: the tracker checks
/// [`has_published_steps`](Self::has_published_steps) before calling
/// [`publish_steps`](Self::publish_steps) and refuses to publish twice.
pub trait TestResultStore {
    /// Name of the test, stamped onto every step the tracker creates.
    fn test_name(&self) -> String;

    /// Returns whether a step tree was already published.
    fn has_published_steps(&self) -> bool;

    /// Stores the finished step tree.
    fn publish_steps(&mut self, steps: StepTree);

    /// Stores the final error of the run, independent of any step.
    fn set_run_error(&mut self, error: Option<StepFailure>);
}

/// In-memory result of one test run.
#[derive(Debug, Clone, Default)]
pub struct TestResult {
    test_name: String,
    steps: Option<StepTree>,
    run_error: Option<StepFailure>,
}

impl TestResult {
    /// Creates an empty result for the named test.
    #[must_use]
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            steps: None,
            run_error: None,
        }
    }

    /// Name of the test.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.test_name
    }

    /// Published step tree, present once the tracker has been finalised.
    #[must_use]
    pub const fn steps(&self) -> Option<&StepTree> {
        self.steps.as_ref()
    }

    /// Final error recorded for the run.
    #[must_use]
    pub const fn run_error(&self) -> Option<&StepFailure> {
        self.run_error.as_ref()
    }
}

impl TestResultStore for TestResult {
    fn test_name(&self) -> String {
        self.test_name.clone()
    }

    fn has_published_steps(&self) -> bool {
        self.steps.is_some()
    }

    fn publish_steps(&mut self, steps: StepTree) {
        self.steps = Some(steps);
    }

    fn set_run_error(&mut self, error: Option<StepFailure>) {
        self.run_error = error;
    }
}
