//! Collaborators the engine consumes but does not implement: parsers, the file probe
//! and the docset of built in objects.

use async_trait::async_trait;
use smol_str::SmolStr;
use std::collections::HashMap;
use std::fmt;
use themecheck_syntax::SourceTree;
use thiserror::Error;

/// Turns source text into a syntax tree.
pub trait Parser {
    fn parse(&self, source: &str) -> Result<SourceTree, ParseError>;
}

/// An upstream failure to parse a file, the file is skipped entirely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    /// The byte offset the parser failed at, if it knows it.
    pub offset: Option<u32>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, offset: impl Into<Option<u32>>) -> Self {
        Self {
            message: message.into(),
            offset: offset.into(),
        }
    }
}

/// Queries about other files of the theme a file belongs to.
///
/// Paths are relative to the theme root, such as `snippets/card.liquid`.
#[async_trait(?Send)]
pub trait FileProbe {
    async fn exists(&self, relative_path: &str) -> bool;

    /// The size of a file in bytes, `None` if it does not exist or is unknown.
    async fn size(&self, relative_path: &str) -> Option<u64>;
}

/// The knowledge base of objects the templating language defines.
pub trait Docset {
    /// Names of objects which are defined everywhere.
    fn globals(&self) -> Vec<SmolStr>;
}

/// A probe which reports every file as existing with an unknown size.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

#[async_trait(?Send)]
impl FileProbe for NullProbe {
    async fn exists(&self, _relative_path: &str) -> bool {
        true
    }

    async fn size(&self, _relative_path: &str) -> Option<u64> {
        None
    }
}

/// A probe over a fixed set of files and their sizes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProbe {
    files: HashMap<String, u64>,
}

impl InMemoryProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, relative_path: impl Into<String>, size: u64) -> Self {
        self.files.insert(relative_path.into(), size);
        self
    }
}

#[async_trait(?Send)]
impl FileProbe for InMemoryProbe {
    async fn exists(&self, relative_path: &str) -> bool {
        self.files.contains_key(relative_path)
    }

    async fn size(&self, relative_path: &str) -> Option<u64> {
        self.files.get(relative_path).copied()
    }
}

/// A docset with no objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDocset;

impl Docset for EmptyDocset {
    fn globals(&self) -> Vec<SmolStr> {
        vec![]
    }
}

/// A docset over a fixed list of object names.
#[derive(Debug, Clone, Default)]
pub struct StaticDocset {
    globals: Vec<SmolStr>,
}

impl StaticDocset {
    pub fn new<I, S>(globals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        Self {
            globals: globals.into_iter().map(Into::into).collect(),
        }
    }
}

impl Docset for StaticDocset {
    fn globals(&self) -> Vec<SmolStr> {
        self.globals.clone()
    }
}

static NULL_PROBE: NullProbe = NullProbe;
static EMPTY_DOCSET: EmptyDocset = EmptyDocset;

/// The collaborators available to checks during a run.
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    pub probe: &'a dyn FileProbe,
    pub docset: &'a dyn Docset,
}

impl<'a> Environment<'a> {
    pub fn new(probe: &'a dyn FileProbe, docset: &'a dyn Docset) -> Self {
        Self { probe, docset }
    }
}

impl Default for Environment<'_> {
    fn default() -> Self {
        Self {
            probe: &NULL_PROBE,
            docset: &EMPTY_DOCSET,
        }
    }
}

impl fmt::Debug for Environment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment").finish_non_exhaustive()
    }
}
