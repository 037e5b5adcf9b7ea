//! Given/when steps for step tracking scenarios.

use rstest_bdd_macros::{given, when};
use steptrack::script::ScriptedFailure;
use steptrack::{ReconciliationMode, StepFailure, StepTracker, TestResult};

use super::StepResult;
use super::state::{SharedTracker, TrackingState};

fn start_tracker(tracking_state: &TrackingState, name: &str, mode: ReconciliationMode) {
    let tracker = StepTracker::with_mode(TestResult::new(name), mode);
    tracking_state.tracker.set(SharedTracker::new(tracker));
}

fn close_step(
    tracking_state: &TrackingState,
    description: &str,
    error: Option<StepFailure>,
) -> StepResult<()> {
    let id = tracking_state.step_id(description)?;
    let outcome = tracking_state.tracker()?.lock().close(id, error);
    tracking_state.last_close.set(outcome);
    Ok(())
}

#[given("a step tracker for test {name}")]
fn strict_tracker(tracking_state: &TrackingState, name: String) {
    start_tracker(tracking_state, &name, ReconciliationMode::Strict);
}

#[given("a lenient step tracker for test {name}")]
fn lenient_tracker(tracking_state: &TrackingState, name: String) {
    start_tracker(tracking_state, &name, ReconciliationMode::Lenient);
}

#[when("step {description} is opened")]
fn step_is_opened(tracking_state: &TrackingState, description: String) -> StepResult<()> {
    let id = tracking_state.tracker()?.lock().open(description.as_str());
    let mut opened = tracking_state.opened.get().unwrap_or_default();
    opened.push((description, id));
    tracking_state.opened.set(opened);
    Ok(())
}

#[when("step {description} is closed")]
fn step_is_closed(tracking_state: &TrackingState, description: String) -> StepResult<()> {
    close_step(tracking_state, &description, None)
}

#[when("step {description} fails with {message}")]
fn step_fails(
    tracking_state: &TrackingState,
    description: String,
    message: String,
) -> StepResult<()> {
    let failure = StepFailure::new(ScriptedFailure::new(message));
    close_step(tracking_state, &description, Some(failure))
}

#[when("the run error is {message}")]
fn run_error_is(tracking_state: &TrackingState, message: String) -> StepResult<()> {
    let failure = StepFailure::new(ScriptedFailure::new(message));
    tracking_state
        .tracker()?
        .lock()
        .record_run_error(Some(failure));
    Ok(())
}

#[when("the run is finalized")]
fn run_is_finalized(tracking_state: &TrackingState) -> StepResult<()> {
    let outcome = tracking_state.tracker()?.lock().finalize();
    tracking_state.finalized.set(outcome);
    Ok(())
}
