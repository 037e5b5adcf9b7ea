//! Hierarchical test step tracking.
//!
//! `steptrack` keeps the bookkeeping for the steps of a single test run.
//! Steps are opened and closed in strictly nested order and each one gets a
//! stable position number reflecting its nesting (`1`, `1.1`, `1.2.1`). When
//! the run ends, steps that were never closed are forced into a failed state
//! and given the error that most plausibly explains why, and the finished
//! tree is published to the test result.
//!
//! # Modules
//!
//! - [`step`]: Step data model and the published step tree
//! - [`tracker`]: The step tracker and end-of-run reconciliation
//! - [`result`]: The test-result collaborator the tree is published into
//! - [`script`]: Step scripts replayed through a tracker by the CLI
//! - [`config`]: Configuration system with layered precedence (CLI > env > file > defaults)
//! - [`logging`]: Log filter construction
//! - [`error`]: Semantic error types

pub mod config;
pub mod error;
pub mod logging;
pub mod result;
pub mod script;
pub mod step;
pub mod tracker;

pub use result::{TestResult, TestResultStore};
pub use step::{StepFailure, StepId, StepNode, StepNumber, StepStatus, StepTree};
pub use tracker::{ReconciliationMode, StepProducer, StepTracker};
