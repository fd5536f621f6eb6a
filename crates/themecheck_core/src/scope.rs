//! Position based definedness tracking for scope sensitive checks.
//!
//! Bindings are collected while walking a tree, each with the byte range it is visible
//! in, then frozen into a [`ScopeIndex`] which answers whether a name is defined at a
//! position. Collection and resolution are separate because a reference may legally
//! appear before the binding which covers it in source order.

use smol_str::SmolStr;
use std::collections::HashMap;

/// The byte range a binding is visible in.
///
/// Both bounds are exclusive: a binding is not visible at its own start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeRange {
    pub start: u32,
    pub end: u32,
}

impl ScopeRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A range visible from `start` to the end of the file.
    pub fn open(start: u32) -> Self {
        Self::new(start, u32::MAX)
    }

    pub fn contains(&self, pos: u32) -> bool {
        self.start < pos && pos < self.end
    }
}

/// A binding of a name, visible everywhere if `scope` is `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeEntry {
    pub variable_name: SmolStr,
    pub scope: Option<ScopeRange>,
}

/// Collects bindings while a tree is walked.
#[derive(Debug, Clone, Default)]
pub struct ScopeCollector {
    entries: HashMap<SmolStr, Vec<ScopeEntry>>,
}

impl ScopeCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<SmolStr>, scope: ScopeRange) {
        self.push(name.into(), Some(scope));
    }

    pub fn define_global(&mut self, name: impl Into<SmolStr>) {
        self.push(name.into(), None);
    }

    fn push(&mut self, variable_name: SmolStr, scope: Option<ScopeRange>) {
        self.entries
            .entry(variable_name.clone())
            .or_default()
            .push(ScopeEntry {
                variable_name,
                scope,
            });
    }

    pub fn entries(&self, name: &str) -> &[ScopeEntry] {
        self.entries.get(name).map_or(&[][..], Vec::as_slice)
    }

    /// Freeze the collected bindings into an index.
    pub fn finish(self) -> ScopeIndex {
        let names = self
            .entries
            .into_iter()
            .map(|(name, entries)| (name, NameScopes::new(entries)))
            .collect();
        ScopeIndex { names }
    }
}

#[derive(Debug, Clone, Default)]
struct NameScopes {
    global: bool,
    /// Range starts, sorted ascending.
    starts: Vec<u32>,
    /// The largest end of the ranges up to and including each index of `starts`.
    max_ends: Vec<u32>,
}

impl NameScopes {
    fn new(entries: Vec<ScopeEntry>) -> Self {
        let global = entries.iter().any(|entry| entry.scope.is_none());
        let mut ranges: Vec<ScopeRange> = entries.into_iter().filter_map(|entry| entry.scope).collect();
        ranges.sort_by_key(|range| range.start);

        let starts = ranges.iter().map(|range| range.start).collect();
        let max_ends = ranges
            .iter()
            .scan(0, |max, range| {
                *max = range.end.max(*max);
                Some(*max)
            })
            .collect();

        Self {
            global,
            starts,
            max_ends,
        }
    }

    fn is_defined(&self, pos: u32) -> bool {
        if self.global {
            return true;
        }
        // every range starting before `pos`, one of them covers it if the widest one does
        match self.starts.partition_point(|&start| start < pos) {
            0 => false,
            n => self.max_ends[n - 1] > pos,
        }
    }
}

/// A frozen set of bindings answering definedness queries with a binary search.
#[derive(Debug, Clone, Default)]
pub struct ScopeIndex {
    names: HashMap<SmolStr, NameScopes>,
}

impl ScopeIndex {
    /// Whether `name` is defined at byte offset `pos`.
    pub fn is_defined(&self, name: &str, pos: u32) -> bool {
        self.names
            .get(name)
            .map_or(false, |scopes| scopes.is_defined(pos))
    }

    pub fn is_global(&self, name: &str) -> bool {
        self.names.get(name).map_or(false, |scopes| scopes.global)
    }
}
