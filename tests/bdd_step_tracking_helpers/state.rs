//! Scenario state for step tracking behavioural tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;
use steptrack::error::StepError;
use steptrack::{StepId, StepTracker, TestResult};

/// Tracker shared between the steps of one scenario.
#[derive(Clone)]
pub(crate) struct SharedTracker(Arc<Mutex<StepTracker<TestResult>>>);

impl SharedTracker {
    pub(crate) fn new(tracker: StepTracker<TestResult>) -> Self {
        Self(Arc::new(Mutex::new(tracker)))
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StepTracker<TestResult>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Default, ScenarioState)]
pub(crate) struct TrackingState {
    /// Tracker under test.
    pub(crate) tracker: Slot<SharedTracker>,
    /// Steps opened so far, keyed by description.
    pub(crate) opened: Slot<Vec<(String, StepId)>>,
    /// Outcome of the most recent `close`.
    pub(crate) last_close: Slot<Result<(), StepError>>,
    /// Outcome of the most recent `finalize`.
    pub(crate) finalized: Slot<Result<(), StepError>>,
}

impl TrackingState {
    pub(crate) fn tracker(&self) -> Result<SharedTracker, String> {
        self.tracker
            .get()
            .ok_or_else(|| String::from("tracker should be created by a Given step"))
    }

    /// Most recently opened step with `description`.
    pub(crate) fn step_id(&self, description: &str) -> Result<StepId, String> {
        self.opened
            .get()
            .unwrap_or_default()
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == description)
            .map(|(_, id)| *id)
            .ok_or_else(|| format!("step '{description}' was never opened"))
    }
}

#[fixture]
pub(crate) fn tracking_state() -> TrackingState {
    let state = TrackingState::default();
    state.opened.set(Vec::new());
    state
}
