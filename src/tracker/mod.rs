//! Step hierarchy tracking.
//!
//! [`StepTracker`] builds the step tree of one test run incrementally. Steps
//! are numbered by their position in the hierarchy:
//!
//! ```text
//! A          1
//! +-- B      1.1
//! +-- C      1.2
//!     +-- D  1.2.1
//! ```
//!
//! Callers open a step, optionally open nested steps inside it, and close
//! steps in exactly the reverse order they were opened. When the run ends,
//! [`StepTracker::finalize`] forces every step still open into
//! [`StepStatus::Failed`], hands each of them the error of the most recent
//! failed child, and publishes the tree into the [`TestResultStore`].

use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StepError, StepRunError};
use crate::result::TestResultStore;
use crate::step::{StepFailure, StepId, StepNode, StepNumber, StepStatus, StepTree};


/// Source of run identities stamped into every [`StepId`] a tracker issues.
static NEXT_RUN: AtomicU64 = AtomicU64::new(1);

/// What `finalize` does with an open step that has no failed child to blame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconciliationMode {
    /// Abort with [`StepError::MissingFailureCause`].
    #[default]
    Strict,
    /// Record a synthesised [`StepError::MissingFailureCause`] as the step's
    /// error and keep going.
    Lenient,
}

/// Seam between a test harness and the step bookkeeping.
pub trait StepProducer {
    /// Opens a step nested inside the current one, or at the top level.
    fn open(&mut self, description: &str) -> StepId;

    /// Closes the innermost open step.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::NotCurrent`] when `step` is not the innermost
    /// open step.
    fn close(&mut self, step: StepId, error: Option<StepFailure>) -> Result<(), StepError>;

    /// Runs `body` inside a new step and closes the step with the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`StepRunError::Body`] when the body fails and
    /// [`StepRunError::Protocol`] when the body left the open/close
    /// discipline broken so the step could not be closed.
    fn run_step<T, F>(&mut self, description: &str, body: F) -> Result<T, StepRunError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, StepFailure>,
    {
        let step = self.open(description);
        match body(self) {
            Ok(value) => {
                self.close(step, None)?;
                Ok(value)
            }
            Err(failure) => {
                self.close(step, Some(failure.clone()))?;
                Err(StepRunError::Body(failure))
            }
        }
    }
}

/// Tracks the steps of a single test run.
///
/// The tracker owns every node it creates in an arena; [`StepId`] handles
/// point into it. It is single-use: once [`finalize`](Self::finalize) has
/// published the tree the tracker must not be used for another run. Steps
/// opened after that are logged as a misuse, start a fresh arena numbered
/// from `1` with ordinals from `1`, and can never be published.
#[derive(Debug)]
pub struct StepTracker<S> {
    store: S,
    test_name: String,
    mode: ReconciliationMode,
    run: u64,
    nodes: Vec<StepNode>,
    top_level: Vec<StepId>,
    current: Option<StepId>,
    created: usize,
    published: bool,
}

impl<S: TestResultStore> StepTracker<S> {
    /// Creates a tracker that publishes into `store` and reconciles strictly.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_mode(store, ReconciliationMode::Strict)
    }

    /// Creates a tracker with an explicit reconciliation mode.
    #[must_use]
    pub fn with_mode(store: S, mode: ReconciliationMode) -> Self {
        let test_name = store.test_name();
        Self {
            store,
            test_name,
            mode,
            run: NEXT_RUN.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
            top_level: Vec::new(),
            current: None,
            created: 0,
            published: false,
        }
    }

    /// Opens a new step inside the current one, or at the top level when no
    /// step is open, and makes it current.
    pub fn open(&mut self, description: impl Into<String>) -> StepId {
        if self.published {
            warn!(test = %self.test_name, "step opened after the step tree was published");
        }
        self.created += 1;
        let id = StepId::new(self.run, self.nodes.len());

        let parent = self
            .current
            .and_then(|current| self.nodes.get(current.index()).map(|node| (current, node)));
        let (number, parent_id) = parent.map_or_else(
            || (StepNumber::top_level(self.top_level.len()), None),
            |(current, node)| (node.number().child(node.children().len()), Some(current)),
        );

        let node = StepNode::new(
            description.into(),
            self.test_name.clone(),
            number,
            self.created,
            parent_id,
        );
        debug!(
            number = %node.number(),
            ordinal = node.ordinal(),
            description = node.description(),
            "step opened"
        );
        self.nodes.push(node);

        let siblings = parent_id
            .and_then(|current| self.nodes.get_mut(current.index()))
            .map_or(&mut self.top_level, |parent_node| &mut parent_node.children);
        siblings.push(id);
        self.current = Some(id);
        id
    }

    /// Closes the current step, marking it successful when `error` is
    /// absent and failed otherwise. The parent becomes current.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::NotCurrent`] when `step` is not the innermost
    /// open step, including handles issued by another tracker. The tree is
    /// left untouched in that case.
    pub fn close(&mut self, step: StepId, error: Option<StepFailure>) -> Result<(), StepError> {
        if self.current != Some(step) || step.run() != self.run {
            return Err(self.not_current(step));
        }
        let Some(node) = self.nodes.get_mut(step.index()) else {
            return Err(self.not_current(step));
        };

        node.status = if error.is_some() {
            StepStatus::Failed
        } else {
            StepStatus::Success
        };
        node.error = error;
        debug!(number = %node.number(), status = ?node.status(), "step closed");

        self.current = node.parent();
        Ok(())
    }

    /// Reconciles steps left open and publishes the finished tree.
    ///
    /// Every step on the chain from the current step up to its top-level
    /// ancestor is marked failed. The innermost one takes the error of its
    /// most recently created failed child; all of its ancestors inherit that
    /// same error.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::MissingFailureCause`] in strict mode when the
    /// innermost open step has no failed child, and
    /// [`StepError::AlreadyPublished`] when the store already holds a tree.
    pub fn finalize(&mut self) -> Result<(), StepError> {
        let mut cursor = self.current;
        let mut representative: Option<StepFailure> = None;

        while let Some(id) = cursor {
            let Some(unfinished) = self.nodes.get_mut(id.index()) else {
                break;
            };
            unfinished.status = StepStatus::Failed;

            let cause = match representative {
                Some(cause) => cause,
                None => self.failure_cause(id)?,
            };
            let Some(node) = self.nodes.get_mut(id.index()) else {
                break;
            };
            warn!(number = %node.number(), error = %cause, "step left open; marked failed");
            node.error = Some(cause.clone());
            representative = Some(cause);
            cursor = node.parent();
        }
        self.current = None;

        if self.store.has_published_steps() {
            return Err(StepError::AlreadyPublished {
                test_name: self.test_name.clone(),
            });
        }
        let tree = StepTree::new(
            self.run,
            mem::take(&mut self.nodes),
            mem::take(&mut self.top_level),
        );
        self.created = 0;
        self.published = true;
        info!(
            test = %self.test_name,
            steps = tree.len(),
            top_level = tree.roots().len(),
            "step tree published"
        );
        self.store.publish_steps(tree);
        Ok(())
    }

    /// Records the final error of the run, outside any step.
    pub fn record_run_error(&mut self, error: Option<StepFailure>) {
        self.store.set_run_error(error);
    }

    /// Looks up a step that has not been published yet. Handles issued by
    /// another tracker resolve to nothing.
    #[must_use]
    pub fn step(&self, id: StepId) -> Option<&StepNode> {
        if id.run() != self.run {
            return None;
        }
        self.nodes.get(id.index())
    }

    /// The innermost open step.
    #[must_use]
    pub const fn current(&self) -> Option<StepId> {
        self.current
    }

    /// Top-level steps opened so far, in creation order.
    #[must_use]
    pub fn top_level(&self) -> &[StepId] {
        &self.top_level
    }

    /// Reconciliation mode used by [`finalize`](Self::finalize).
    #[must_use]
    pub const fn mode(&self) -> ReconciliationMode {
        self.mode
    }

    /// Borrows the result store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Consumes the tracker and returns the result store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Error of the most recently created failed child of `id`.
    fn failure_cause(&self, id: StepId) -> Result<StepFailure, StepError> {
        let Some(node) = self.nodes.get(id.index()) else {
            return Err(self.missing_cause(id));
        };
        let blamed = node
            .children()
            .iter()
            .rev()
            .filter_map(|child| self.nodes.get(child.index()))
            .find(|child| child.status() == StepStatus::Failed)
            .and_then(|child| child.error().cloned());

        match (blamed, self.mode) {
            (Some(cause), _) => Ok(cause),
            (None, ReconciliationMode::Strict) => Err(self.missing_cause(id)),
            (None, ReconciliationMode::Lenient) => {
                warn!(number = %node.number(), "no failed child found; synthesising a cause");
                Ok(StepFailure::new(self.missing_cause(id)))
            }
        }
    }

    fn missing_cause(&self, id: StepId) -> StepError {
        StepError::MissingFailureCause {
            step: self.label(id),
        }
    }

    fn not_current(&self, step: StepId) -> StepError {
        StepError::NotCurrent {
            step: self.label(step),
            current: self
                .current
                .map_or_else(|| String::from("none"), |current| self.label(current)),
        }
    }

    fn label(&self, id: StepId) -> String {
        self.step(id)
            .map_or_else(|| format!("#{}", id.index()), ToString::to_string)
    }
}

impl<S: TestResultStore> StepProducer for StepTracker<S> {
    fn open(&mut self, description: &str) -> StepId {
        Self::open(self, description)
    }

    fn close(&mut self, step: StepId, error: Option<StepFailure>) -> Result<(), StepError> {
        Self::close(self, step, error)
    }
}
