//! A check store, which houses check groups as well as individual checks.

use crate::groups::*;
use crate::Check;
use std::collections::HashSet;

/// A utility structure for housing the checks of a run.
///
/// The store is built once and passed to every run explicitly, it is never mutated
/// while files are linted.
#[derive(Debug, Default, Clone)]
pub struct CheckStore {
    pub checks: Vec<Box<dyn Check>>,
}

impl CheckStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built in checks from every group.
    pub fn builtins(mut self) -> Self {
        self.checks.extend(liquid());
        self.checks.extend(html());
        self.checks.extend(performance());
        self.checks.extend(json());
        self
    }

    /// All recommended checks from every group.
    pub fn recommended(mut self) -> Self {
        self.checks.extend(
            [liquid(), html(), performance(), json()]
                .into_iter()
                .flatten()
                .filter(|check| check.recommended()),
        );
        self
    }

    /// Load a list of checks into this store.
    pub fn load_checks(&mut self, checks: impl IntoIterator<Item = Box<dyn Check>>) {
        self.checks.extend(checks);
    }

    /// Get a check using its code from this store.
    ///
    /// # Examples
    /// ```
    /// use themecheck_core::CheckStore;
    ///
    /// assert!(CheckStore::new().builtins().get("UndefinedObject").is_some())
    /// ```
    pub fn get(&self, code: impl AsRef<str>) -> Option<Box<dyn Check>> {
        self.checks
            .iter()
            .find(|check| check.code() == code.as_ref())
            .cloned()
    }

    /// The codes of every check in this store.
    pub fn codes(&self) -> HashSet<&'static str> {
        self.checks.iter().map(|check| check.code()).collect()
    }
}
