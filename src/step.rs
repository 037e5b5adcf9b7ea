//! Step data model.
//!
//! A [`StepNode`] is created by the tracker when a step is opened and is
//! never moved afterwards. Nodes live in a single arena owned by the tracker
//! (and later by the published [`StepTree`]); parents and children refer to
//! each other through [`StepId`] handles rather than owning pointers.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Handle to a step inside a tracker's arena.
///
/// A handle carries the identity of the run that issued it. The issuing
/// tracker and the tree it publishes resolve it; every other tracker or tree
/// treats it as unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepId {
    run: u64,
    index: usize,
}

impl StepId {
    pub(crate) const fn new(run: u64, index: usize) -> Self {
        Self { run, index }
    }

    pub(crate) const fn run(self) -> u64 {
        self.run
    }

    pub(crate) const fn index(self) -> usize {
        self.index
    }
}

/// Hierarchical position of a step, such as `1.2.1`.
///
/// Each component is the 1-based position of the step among its siblings,
/// starting from the top-level list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepNumber(Vec<usize>);

impl StepNumber {
    /// Number of a top-level step at the given 0-based position.
    pub(crate) fn top_level(index: usize) -> Self {
        Self(vec![index + 1])
    }

    /// Number of a child at the given 0-based position under `self`.
    pub(crate) fn child(&self, index: usize) -> Self {
        let mut components = Vec::with_capacity(self.0.len() + 1);
        components.extend_from_slice(&self.0);
        components.push(index + 1);
        Self(components)
    }

    /// Returns the 1-based position components from the root down.
    #[must_use]
    pub fn components(&self) -> &[usize] {
        &self.0
    }

    /// Returns the nesting depth, where top-level steps are at level 1.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for StepNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut components = self.0.iter();
        if let Some(first) = components.next() {
            write!(f, "{first}")?;
        }
        for component in components {
            write!(f, ".{component}")?;
        }
        Ok(())
    }
}

/// Result status of a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepStatus {
    /// The step is open, or was never closed.
    #[default]
    Pending,
    /// The step closed without an error.
    Success,
    /// The step closed with an error, or was left open when the run ended.
    Failed,
}

/// Opaque error value attached to a failed step.
///
/// The tracker never inspects the error; it only stores it and hands the same
/// value up to ancestors during reconciliation. Clones share the underlying
/// error, so [`StepFailure::ptr_eq`] tells whether two steps carry the very
/// same failure.
#[derive(Clone)]
pub struct StepFailure(Arc<dyn Error + Send + Sync + 'static>);

impl StepFailure {
    /// Wraps an error value.
    #[must_use]
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self(Arc::new(error))
    }

    /// Returns whether both values share the same underlying error.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Borrows the wrapped error.
    #[must_use]
    pub fn as_error(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Debug for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StepFailure").field(&self.0).finish()
    }
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A single step in a test run.
#[derive(Debug, Clone)]
pub struct StepNode {
    description: String,
    test_name: String,
    number: StepNumber,
    ordinal: usize,
    pub(crate) status: StepStatus,
    pub(crate) error: Option<StepFailure>,
    pub(crate) children: Vec<StepId>,
    parent: Option<StepId>,
}

impl StepNode {
    pub(crate) const fn new(
        description: String,
        test_name: String,
        number: StepNumber,
        ordinal: usize,
        parent: Option<StepId>,
    ) -> Self {
        Self {
            description,
            test_name,
            number,
            ordinal,
            status: StepStatus::Pending,
            error: None,
            children: Vec::new(),
            parent,
        }
    }

    /// Caller-supplied label of the step.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Name of the test this step belongs to.
    #[must_use]
    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Hierarchical position of the step.
    #[must_use]
    pub const fn number(&self) -> &StepNumber {
        &self.number
    }

    /// Nesting depth, equal to the number of components in [`Self::number`].
    #[must_use]
    pub const fn level(&self) -> usize {
        self.number.level()
    }

    /// Global creation order within the run, starting at 1.
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Current status of the step.
    #[must_use]
    pub const fn status(&self) -> StepStatus {
        self.status
    }

    /// Error the step failed with, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&StepFailure> {
        self.error.as_ref()
    }

    /// Children in creation order.
    #[must_use]
    pub fn children(&self) -> &[StepId] {
        &self.children
    }

    /// Enclosing step, absent for top-level steps.
    #[must_use]
    pub const fn parent(&self) -> Option<StepId> {
        self.parent
    }
}

impl fmt::Display for StepNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} \"{}\"", self.number, self.description)
    }
}

/// The finished step hierarchy of one test run.
///
/// Produced once by [`crate::StepTracker::finalize`] and read-only from then
/// on.
#[derive(Debug, Clone, Default)]
pub struct StepTree {
    run: u64,
    nodes: Vec<StepNode>,
    roots: Vec<StepId>,
}

impl StepTree {
    pub(crate) const fn new(run: u64, nodes: Vec<StepNode>, roots: Vec<StepId>) -> Self {
        Self { run, nodes, roots }
    }

    /// Top-level steps in creation order.
    #[must_use]
    pub fn roots(&self) -> &[StepId] {
        &self.roots
    }

    /// Looks up a step by handle. Handles from another run resolve to
    /// nothing.
    #[must_use]
    pub fn get(&self, id: StepId) -> Option<&StepNode> {
        if id.run() != self.run {
            return None;
        }
        self.nodes.get(id.index())
    }

    /// Children of a step in creation order; empty for unknown handles.
    pub fn children(&self, id: StepId) -> impl Iterator<Item = &StepNode> {
        self.get(id)
            .map(StepNode::children)
            .unwrap_or_default()
            .iter()
            .filter_map(|child| self.get(*child))
    }

    /// Finds a step by its dotted number, such as `"1.2.1"`.
    #[must_use]
    pub fn find(&self, number: &str) -> Option<&StepNode> {
        self.nodes
            .iter()
            .find(|node| node.number().to_string() == number)
    }

    /// Total number of steps in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether no step was ever opened.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first, pre-order walk over every step.
    #[must_use]
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            stack: self.roots.iter().rev().copied().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a StepTree {
    type Item = &'a StepNode;
    type IntoIter = PreOrder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-order iterator over a [`StepTree`].
#[derive(Debug)]
pub struct PreOrder<'a> {
    tree: &'a StepTree,
    stack: Vec<StepId>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a StepNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.tree.get(self.stack.pop()?)?;
        self.stack.extend(node.children().iter().rev().copied());
        Some(node)
    }
}
