//! Assertion helpers for step tracking behavioural tests.

use rstest_bdd_macros::then;
use steptrack::error::{StepError, StepErrorKind};
use steptrack::{StepNode, StepStatus};

use super::StepResult;
use super::state::TrackingState;

/// Runs `check` against the published step numbered `number`.
fn with_published_step<T>(
    tracking_state: &TrackingState,
    number: &str,
    check: impl FnOnce(&StepNode) -> StepResult<T>,
) -> StepResult<T> {
    let shared = tracking_state.tracker()?;
    let tracker = shared.lock();
    let tree = tracker
        .store()
        .steps()
        .ok_or_else(|| String::from("step tree should be published"))?;
    let step = tree
        .find(number)
        .ok_or_else(|| format!("no step numbered {number}"))?;
    check(step)
}

fn finalize_error(tracking_state: &TrackingState) -> StepResult<StepError> {
    match tracking_state.finalized.get() {
        Some(Err(error)) => Ok(error),
        Some(Ok(())) => Err(String::from("expected finalize to fail, but it succeeded")),
        None => Err(String::from("finalize should have run")),
    }
}

fn expect_kind(error: &StepError, expected: StepErrorKind) -> StepResult<()> {
    if error.kind() == expected {
        Ok(())
    } else {
        Err(format!("expected {expected:?}, got {:?}: {error}", error.kind()))
    }
}

#[then("finalizing succeeds")]
fn finalizing_succeeds(tracking_state: &TrackingState) -> StepResult<()> {
    match tracking_state.finalized.get() {
        Some(Ok(())) => Ok(()),
        Some(Err(error)) => Err(format!("expected finalize to succeed, got: {error}")),
        None => Err(String::from("finalize should have run")),
    }
}

#[then("finalizing fails as illegal state")]
fn finalizing_fails_as_illegal_state(tracking_state: &TrackingState) -> StepResult<()> {
    expect_kind(&finalize_error(tracking_state)?, StepErrorKind::IllegalState)
}

#[then("finalizing fails as assertion failure")]
fn finalizing_fails_as_assertion_failure(tracking_state: &TrackingState) -> StepResult<()> {
    expect_kind(
        &finalize_error(tracking_state)?,
        StepErrorKind::AssertionFailure,
    )
}

#[then("the finalize error mentions {text}")]
fn finalize_error_mentions(tracking_state: &TrackingState, text: String) -> StepResult<()> {
    let message = finalize_error(tracking_state)?.to_string();
    if message.contains(&text) {
        Ok(())
    } else {
        Err(format!("expected '{message}' to mention '{text}'"))
    }
}

#[then("the last close is rejected as illegal state")]
fn last_close_is_rejected(tracking_state: &TrackingState) -> StepResult<()> {
    match tracking_state.last_close.get() {
        Some(Err(error)) => expect_kind(&error, StepErrorKind::IllegalState),
        Some(Ok(())) => Err(String::from("expected the close to be rejected")),
        None => Err(String::from("no step was closed")),
    }
}

#[then("the current step is {description}")]
fn current_step_is(tracking_state: &TrackingState, description: String) -> StepResult<()> {
    let shared = tracking_state.tracker()?;
    let tracker = shared.lock();
    let current = tracker
        .current()
        .and_then(|id| tracker.step(id))
        .ok_or_else(|| String::from("no step is open"))?;
    if current.description() == description {
        Ok(())
    } else {
        Err(format!(
            "expected current step '{description}', got '{}'",
            current.description()
        ))
    }
}

#[then("step {number} is described as {description}")]
fn step_is_described_as(
    tracking_state: &TrackingState,
    number: String,
    description: String,
) -> StepResult<()> {
    with_published_step(tracking_state, &number, |step| {
        if step.description() == description {
            Ok(())
        } else {
            Err(format!(
                "expected step {number} to be '{description}', got '{}'",
                step.description()
            ))
        }
    })
}

#[then("step {number} has ordinal {ordinal}")]
fn step_has_ordinal(tracking_state: &TrackingState, number: String, ordinal: usize) -> StepResult<()> {
    with_published_step(tracking_state, &number, |step| {
        if step.ordinal() == ordinal {
            Ok(())
        } else {
            Err(format!(
                "expected step {number} to have ordinal {ordinal}, got {}",
                step.ordinal()
            ))
        }
    })
}

#[then("step {number} belongs to test {name}")]
fn step_belongs_to_test(
    tracking_state: &TrackingState,
    number: String,
    name: String,
) -> StepResult<()> {
    with_published_step(tracking_state, &number, |step| {
        if step.test_name() == name {
            Ok(())
        } else {
            Err(format!(
                "expected step {number} to belong to '{name}', got '{}'",
                step.test_name()
            ))
        }
    })
}

#[then("step {number} succeeded")]
fn step_succeeded(tracking_state: &TrackingState, number: String) -> StepResult<()> {
    with_published_step(tracking_state, &number, |step| {
        match (step.status(), step.error()) {
            (StepStatus::Success, None) => Ok(()),
            (status, error) => Err(format!(
                "expected step {number} to succeed, got {status:?} with {error:?}"
            )),
        }
    })
}

#[then("step {number} failed with {message}")]
fn step_failed_with(
    tracking_state: &TrackingState,
    number: String,
    message: String,
) -> StepResult<()> {
    with_published_step(tracking_state, &number, |step| {
        let actual = step.error().map(ToString::to_string);
        if step.status() == StepStatus::Failed && actual.as_deref() == Some(message.as_str()) {
            Ok(())
        } else {
            Err(format!(
                "expected step {number} to fail with '{message}', got {:?} with {actual:?}",
                step.status()
            ))
        }
    })
}

#[then("step {number} has an error mentioning {text}")]
fn step_error_mentions(
    tracking_state: &TrackingState,
    number: String,
    text: String,
) -> StepResult<()> {
    with_published_step(tracking_state, &number, |step| {
        let actual = step.error().map(ToString::to_string).unwrap_or_default();
        if actual.contains(&text) {
            Ok(())
        } else {
            Err(format!("expected step {number} error '{actual}' to mention '{text}'"))
        }
    })
}

#[then("the test result records run error {message}")]
fn run_error_recorded(tracking_state: &TrackingState, message: String) -> StepResult<()> {
    let shared = tracking_state.tracker()?;
    let tracker = shared.lock();
    let actual = tracker.store().run_error().map(ToString::to_string);
    if actual.as_deref() == Some(message.as_str()) {
        Ok(())
    } else {
        Err(format!("expected run error '{message}', got {actual:?}"))
    }
}
