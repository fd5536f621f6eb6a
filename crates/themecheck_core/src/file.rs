//! Representation of a file for the linter

use std::ops::Range;
use std::path::Path;
use themecheck_syntax::TreeKind;

/// A file of a theme, either read from disk or virtual.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct File {
    /// The uri offenses are reported with.
    pub uri: String,
    /// The path of the file relative to the theme root, such as `sections/header.liquid`.
    pub relative_path: String,
    pub source: String,
    /// The kind of tree this file parses into.
    pub tree_kind: TreeKind,
    /// The cached line start locations in this file.
    pub line_starts: Vec<usize>,
}

impl File {
    pub fn new(uri: impl Into<String>, relative_path: impl Into<String>, source: impl Into<String>) -> Self {
        let relative_path = relative_path.into().replace('\\', "/");
        let source = source.into();
        let line_starts = Self::line_starts(&source).collect();

        Self {
            uri: uri.into(),
            tree_kind: Self::tree_kind_of(&relative_path),
            relative_path,
            source,
            line_starts,
        }
    }

    /// Make a file whose uri is derived from its relative path.
    pub fn from_relative(relative_path: impl Into<String>, source: impl Into<String>) -> Self {
        let relative_path = relative_path.into();
        let uri = format!("file:///{}", relative_path.trim_start_matches('/'));
        Self::new(uri, relative_path, source)
    }

    /// `.json` files are JSON trees, anything else is markup.
    pub fn tree_kind_of(relative_path: &str) -> TreeKind {
        match Path::new(relative_path).extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => TreeKind::Json,
            _ => TreeKind::Markup,
        }
    }

    /// The name of the file without its directory or extension, `header` for `sections/header.liquid`.
    pub fn name(&self) -> &str {
        Path::new(&self.relative_path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
    }

    pub fn line_starts(source: &str) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(0).chain(source.match_indices('\n').map(|(i, _)| i + 1))
    }

    pub fn line_start(&self, line_index: usize) -> Option<usize> {
        use std::cmp::Ordering;

        match line_index.cmp(&self.line_starts.len()) {
            Ordering::Less => self.line_starts.get(line_index).cloned(),
            Ordering::Equal => Some(self.source.len()),
            Ordering::Greater => None,
        }
    }

    pub fn line_index(&self, byte_index: usize) -> usize {
        match self.line_starts.binary_search(&byte_index) {
            Ok(line) => line,
            Err(next_line) => next_line - 1,
        }
    }

    /// The zero based line and column (in bytes) of a byte offset.
    pub fn line_col(&self, byte_index: usize) -> (usize, usize) {
        let line = self.line_index(byte_index);
        (line, byte_index - self.line_starts[line])
    }

    pub fn line_range(&self, line_index: usize) -> Option<Range<usize>> {
        let line_start = self.line_start(line_index)?;
        let next_line_start = self.line_start(line_index + 1)?;

        Some(line_start..next_line_start)
    }
}
