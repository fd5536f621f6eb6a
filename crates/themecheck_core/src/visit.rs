//! Iterative depth first traversal over syntax trees.
//!
//! The traversal keeps an explicit work stack instead of recursing, so arbitrarily
//! deep trees can be walked without exhausting the call stack.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use themecheck_syntax::SyntaxNode;

/// A pre-order walk over a tree which tracks the lineage of every node.
///
/// The lineage of a node is the list of its ancestors, from the root down to its parent.
/// It is empty for the root. Each node is yielded exactly once and the children of a
/// node are always walked, in source order.
#[derive(Debug)]
pub struct Walk<'a, N> {
    stack: Vec<(&'a N, usize)>,
    lineage: Vec<&'a N>,
    // the last yielded node, it becomes part of the lineage once the walk moves on
    pending: Option<&'a N>,
}

impl<'a, N: SyntaxNode> Walk<'a, N> {
    pub fn new(root: &'a N) -> Self {
        Self {
            stack: vec![(root, 0)],
            lineage: vec![],
            pending: None,
        }
    }

    /// Advance the walk, yielding the next node and its lineage.
    pub fn step(&mut self) -> Option<(&'a N, &[&'a N])> {
        if let Some(prev) = self.pending.take() {
            self.lineage.push(prev);
        }

        let (node, depth) = self.stack.pop()?;
        self.lineage.truncate(depth);
        self.stack
            .extend(node.children().into_iter().rev().map(|child| (child, depth + 1)));
        self.pending = Some(node);
        Some((node, &self.lineage))
    }
}

/// A callback invoked with a node and its lineage, returning any number of results.
pub type Callback<'c, N, R> = Box<dyn FnMut(&N, &[&N]) -> Vec<R> + 'c>;

/// A table of callbacks keyed by node kind.
pub struct Callbacks<'c, N: SyntaxNode, R> {
    table: HashMap<N::Kind, Vec<Callback<'c, N, R>>>,
}

impl<'c, N: SyntaxNode, R> Callbacks<'c, N, R> {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Register a callback for nodes of a kind. Multiple callbacks may observe the same kind,
    /// they are invoked in registration order.
    pub fn on(&mut self, kind: N::Kind, callback: impl FnMut(&N, &[&N]) -> Vec<R> + 'c) -> &mut Self {
        self.table.entry(kind).or_default().push(Box::new(callback));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<N: SyntaxNode, R> Default for Callbacks<'_, N, R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk a tree once, invoking the callbacks registered for each node's kind and
/// collecting everything they return.
///
/// A callback which panics loses its results for that node only, the walk continues
/// with the remaining callbacks and nodes.
pub fn visit<N: SyntaxNode, R>(root: &N, callbacks: &mut Callbacks<'_, N, R>) -> Vec<R> {
    let mut results = vec![];
    let mut walk = Walk::new(root);

    while let Some((node, lineage)) = walk.step() {
        if let Some(handlers) = callbacks.table.get_mut(&node.kind()) {
            for handler in handlers {
                match catch_unwind(AssertUnwindSafe(|| handler(node, lineage))) {
                    Ok(found) => results.extend(found),
                    Err(_) => log::warn!("a callback panicked on {:?} at {:?}", node.kind(), node.span()),
                }
            }
        }
    }
    results
}

/// Every node of a tree in pre-order.
pub fn descendants<N: SyntaxNode>(root: &N) -> Vec<&N> {
    let mut nodes = vec![];
    let mut walk = Walk::new(root);
    while let Some((node, _)) = walk.step() {
        nodes.push(node);
    }
    nodes
}
