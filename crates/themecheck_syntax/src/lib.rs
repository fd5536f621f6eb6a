//! Syntax trees consumed by the themecheck linter.
//!
//! Two kinds of trees exist: the markup tree of a templating source file (HTML with
//! embedded Liquid) and the tree of a JSON file. Both are closed sets of node variants
//! which carry a [`Span`] into the source text and expose their children in source
//! order through the [`SyntaxNode`] trait. The linter never parses text itself,
//! trees are produced by an external parser and are immutable for the duration of a run.

mod json;
mod markup;
mod span;

pub use self::{
    json::{JsonKind, JsonLiteral, JsonNode},
    markup::{MarkupKind, MarkupNode},
    span::Span,
};
pub use smol_str::SmolStr;

use std::fmt::Debug;
use std::hash::Hash;

/// The kind of tree a check runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TreeKind {
    /// HTML with embedded Liquid.
    Markup,
    Json,
}

/// Behavior shared by the nodes of every tree kind.
///
/// The generic traversal in the linter only relies on this trait, so every
/// tree is walked the same way.
pub trait SyntaxNode: Debug {
    /// The type tag of a node, used as the dispatch key for checks.
    type Kind: Copy + Eq + Hash + Debug;

    fn kind(&self) -> Self::Kind;

    fn span(&self) -> Span;

    /// All direct children of this node, in source order.
    fn children(&self) -> Vec<&Self>;

    /// The text of this node if it is a comment which may hold linter directives.
    fn comment_text(&self) -> Option<&str> {
        None
    }
}

/// A parsed file of either tree kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceTree {
    Markup(MarkupNode),
    Json(JsonNode),
}

impl SourceTree {
    pub fn tree_kind(&self) -> TreeKind {
        match self {
            SourceTree::Markup(_) => TreeKind::Markup,
            SourceTree::Json(_) => TreeKind::Json,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            SourceTree::Markup(node) => node.span(),
            SourceTree::Json(node) => node.span(),
        }
    }
}

impl From<MarkupNode> for SourceTree {
    fn from(node: MarkupNode) -> Self {
        SourceTree::Markup(node)
    }
}

impl From<JsonNode> for SourceTree {
    fn from(node: JsonNode) -> Self {
        SourceTree::Json(node)
    }
}
