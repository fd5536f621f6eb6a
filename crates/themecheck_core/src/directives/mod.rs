//! Comment directives which suppress offenses in parts of a file.
//!
//! ```text
//! <!-- theme-check-disable UndefinedObject, UnusedAssign -- legacy markup -->
//!      |                   |                           |  |             |
//!      +-------------------+---------------------------+  +-------------+
//!          command               codes                        note
//! ```
//!
//! - `theme-check-disable` disables the listed checks (or every check) until a matching
//!   `theme-check-enable` or the end of the file.
//! - `theme-check-enable` enables the listed checks again. Without codes it closes every
//!   open range, including ranges of single checks.
//! - `theme-check-disable-next-line` disables the listed checks (or every check) for the
//!   next sibling of the comment only.
//!
//! Directives are read left to right and never act retroactively.

mod lexer;
mod parser;

pub use self::parser::{parse_directive, Command, Directive, DISABLE, DISABLE_NEXT_LINE, ENABLE};

use crate::visit::Walk;
use crate::Offense;
use smol_str::SmolStr;
use std::collections::{BTreeMap, HashSet};
use themecheck_syntax::{Span, SyntaxNode};

/// A range of the source in which offenses of a check, or of every check, are discarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SuppressionRange {
    /// The check this range applies to, every check if `None`.
    pub code: Option<SmolStr>,
    pub start: u32,
    pub end: u32,
}

impl SuppressionRange {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn applies_to(&self, code: &str) -> bool {
        self.code.as_deref().map_or(true, |c| c == code)
    }
}

/// The tracking state of directives while walking the comments of a file.
#[derive(Debug, Default)]
struct State {
    all: Option<u32>,
    codes: BTreeMap<SmolStr, u32>,
    ranges: Vec<SuppressionRange>,
}

impl State {
    fn push(&mut self, code: Option<SmolStr>, start: u32, end: u32) {
        if start < end {
            self.ranges.push(SuppressionRange { code, start, end });
        }
    }

    fn disable(&mut self, codes: &[SmolStr], at: u32) {
        if codes.is_empty() {
            self.all.get_or_insert(at);
        }
        for code in codes {
            self.codes.entry(code.clone()).or_insert(at);
        }
    }

    fn enable(&mut self, codes: &[SmolStr], at: u32) {
        if codes.is_empty() {
            if let Some(start) = self.all.take() {
                self.push(None, start, at);
            }
            for (code, start) in std::mem::take(&mut self.codes) {
                self.push(Some(code), start, at);
            }
            return;
        }

        for code in codes {
            if let Some(start) = self.codes.remove(code) {
                self.push(Some(code.clone()), start, at);
            }
        }
    }

    fn disable_next(&mut self, codes: &[SmolStr], next: Span) {
        if self.all.is_some() {
            return;
        }
        if codes.is_empty() {
            self.push(None, next.start, next.end);
        }
        for code in codes.iter().filter(|code| !self.codes.contains_key(*code)) {
            self.ranges.push(SuppressionRange {
                code: Some(code.clone()),
                start: next.start,
                end: next.end,
            });
        }
    }

    fn finish(mut self, eof: u32) -> Vec<SuppressionRange> {
        self.enable(&[], eof);
        normalize(self.ranges)
    }
}

/// Sort ranges and merge overlapping ranges of the same code so that the ranges of
/// each code are disjoint.
fn normalize(mut ranges: Vec<SuppressionRange>) -> Vec<SuppressionRange> {
    ranges.sort_by(|a, b| (&a.code, a.start, a.end).cmp(&(&b.code, b.start, b.end)));

    let mut merged: Vec<SuppressionRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if last.code == range.code && range.start <= last.end => {
                last.end = last.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }

    merged.sort_by_key(|range| (range.start, range.end));
    merged
}

/// The next sibling of a node, using the last node of its lineage as its parent.
fn next_sibling<'a, N: SyntaxNode>(node: &N, lineage: &[&'a N]) -> Option<&'a N> {
    let siblings = lineage.last()?.children();
    let idx = siblings.iter().position(|sibling| std::ptr::eq(*sibling, node))?;
    siblings.get(idx + 1).copied()
}

/// The suppression ranges of a single file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Suppressions {
    ranges: Vec<SuppressionRange>,
}

impl Suppressions {
    /// Compute the suppression ranges of a tree by reading the directives in its comments.
    ///
    /// Codes which are not in `known_codes` are ignored. A directive which names only
    /// unknown codes has no effect. If `known_codes` is `None` every code is accepted.
    pub fn compute<N: SyntaxNode>(root: &N, known_codes: Option<&HashSet<&str>>) -> Self {
        let mut state = State::default();
        let mut walk = Walk::new(root);

        while let Some((node, lineage)) = walk.step() {
            let directive = match node.comment_text().and_then(parse_directive) {
                Some(directive) => directive,
                None => continue,
            };

            let codes: Vec<SmolStr> = directive
                .codes
                .iter()
                .filter(|code| {
                    let known = known_codes.map_or(true, |known| known.contains(code.as_str()));
                    if !known {
                        log::debug!("ignoring unknown check `{}` in directive at {:?}", code, node.span());
                    }
                    known
                })
                .cloned()
                .collect();

            if !directive.codes.is_empty() && codes.is_empty() {
                continue;
            }

            let span = node.span();
            match directive.command {
                Command::Disable => state.disable(&codes, span.end),
                Command::Enable => state.enable(&codes, span.start),
                Command::DisableNextLine => {
                    if let Some(next) = next_sibling(node, lineage) {
                        state.disable_next(&codes, next.span());
                    }
                }
            }
        }

        let ranges = state.finish(root.span().end);
        log::debug!("computed {} suppression ranges", ranges.len());
        Self { ranges }
    }

    pub fn ranges(&self) -> &[SuppressionRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Whether an offense of `code` spanning `span` falls inside of a suppression range
    /// which applies to the code.
    pub fn suppresses(&self, code: &str, span: Span) -> bool {
        self.ranges
            .iter()
            .any(|range| range.applies_to(code) && range.span().intersects(span))
    }

    pub fn is_suppressed(&self, offense: &Offense) -> bool {
        self.suppresses(&offense.code, offense.span())
    }

    pub fn into_ranges(self) -> Vec<SuppressionRange> {
        self.ranges
    }
}
