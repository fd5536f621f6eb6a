//! The core runner for themecheck responsible for the bulk of the linter's work.
//!
//! The runner takes a parsed file, a store of checks and a resolved configuration,
//! walks the tree of the file once and returns the offenses the checks reported.
//! It never parses text itself and never installs a logger, so it can be driven by a
//! CLI, a language server or a build tool alike.
//!
//! The structure at the core of the crate is the [`Check`] and [`Rule`] traits.
//! A check is static metadata plus a factory which creates a [`CheckVisitor`] for a
//! single file. Visitors declare the node kinds they are interested in and may keep
//! state across the whole walk, reporting aggregated results in
//! [`CheckVisitor::on_end`].
//!
//! ## Using the runner
//!
//! Create a [`CheckStore`] holding the checks to run, resolve a [`ResolvedConfig`]
//! for the file and call [`run_checks`] (or the blocking [`lint_file`]).
//!
//! ## Failures
//!
//! A check which returns an error or panics is isolated: the offenses it reported
//! before failing are kept, it receives no further callbacks for the file and the
//! failure is reported in [`LintResult::failures`]. Only a parse failure skips a file.

mod error;
mod file;
mod offense;
mod rule;
mod settings;
mod store;

pub mod directives;
pub mod external;
pub mod groups;
pub mod rule_prelude;
pub mod scope;
pub mod util;
pub mod visit;


pub use self::{
    directives::{SuppressionRange, Suppressions},
    error::{CheckError, CheckFailure, CheckResult, FailurePhase},
    external::{Docset, Environment, FileProbe, ParseError, Parser},
    file::File,
    offense::{Offense, Outcome, Severity},
    rule::{Check, CheckMeta, CheckTree, CheckVisitor, Handler, Rule, RunContext, Tag},
    settings::{CheckSettings, ConfigSchema, OptionType, ResolvedConfig, SchemaProp, SchemaType},
    store::CheckStore,
};
pub use themecheck_syntax::{SourceTree, Span, TreeKind};

#[doc(hidden)]
pub use serde_json as __serde_json;

use dyn_clone::clone_box;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use themecheck_syntax::SyntaxNode;
use visit::Walk;

/// The result of linting a file.
#[derive(Debug, Clone, Default)]
pub struct LintResult {
    pub uri: String,
    /// The offenses which survived suppression, sorted by position.
    pub offenses: Vec<Offense>,
    /// Checks which failed while running on the file.
    pub failures: Vec<CheckFailure>,
    /// The suppression ranges of the file.
    pub suppressions: Vec<SuppressionRange>,
    /// How many offenses were discarded by suppression ranges.
    pub suppressed: usize,
}

impl LintResult {
    /// The overall outcome of linting this file (failure, warning, success, etc)
    pub fn outcome(&self) -> Outcome {
        self.offenses.iter().into()
    }

    /// Whether every check ran to completion.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A check instantiated for the file being linted.
struct Instance<'a, N: SyntaxNode> {
    visitor: Box<dyn CheckVisitor<N>>,
    ctx: RunContext<'a>,
    failed: bool,
}

impl<N: SyntaxNode> Instance<'_, N> {
    fn settle(
        &mut self,
        result: Result<CheckResult, Box<dyn std::any::Any + Send>>,
        phase: FailurePhase,
        failures: &mut Vec<CheckFailure>,
    ) {
        let err = match result {
            Ok(Ok(())) => match self.ctx.take_invalid_report() {
                Some(err) => err,
                None => return,
            },
            Ok(Err(err)) => err,
            Err(payload) => CheckError::from_panic(payload),
        };

        log::warn!("check `{}` failed in {} on {}: {}", self.ctx.code, phase, self.ctx.file.uri, err);
        self.failed = true;
        failures.push(CheckFailure {
            code: self.ctx.code.into(),
            phase,
            message: err.to_string(),
        });
    }
}

/// Run a store of checks on a parsed file.
///
/// Only checks which are enabled by `config` and run on the kind of `tree` are created.
/// Offenses are tagged with the effective severity of their check and filtered by the
/// suppression directives of the file.
pub async fn run_checks(
    file: &File,
    tree: &SourceTree,
    store: &CheckStore,
    config: &ResolvedConfig,
    env: Environment<'_>,
) -> LintResult {
    match tree {
        SourceTree::Markup(root) => run_tree(file, root, TreeKind::Markup, store, config, env).await,
        SourceTree::Json(root) => run_tree(file, root, TreeKind::Json, store, config, env).await,
    }
}

async fn run_tree<'a, N: CheckTree>(
    file: &'a File,
    root: &N,
    tree_kind: TreeKind,
    store: &CheckStore,
    config: &ResolvedConfig,
    env: Environment<'a>,
) -> LintResult {
    let mut failures = vec![];
    let mut instances: Vec<Instance<'a, N>> = vec![];

    for check in store
        .checks
        .iter()
        .filter(|check| check.tree_kind() == tree_kind && config.is_enabled(&***check))
    {
        let ctx = RunContext::new(
            file,
            env,
            check.code(),
            config.settings_for(&**check),
            config.effective_severity(&**check),
        );
        let created = std::panic::catch_unwind(AssertUnwindSafe(|| check.create(&ctx)));
        let handler = match created {
            Ok(Ok(handler)) => handler,
            Ok(Err(err)) => {
                log::warn!("check `{}` could not be created for {}: {}", check.code(), file.uri, err);
                failures.push(CheckFailure {
                    code: check.code().into(),
                    phase: FailurePhase::Create,
                    message: err.to_string(),
                });
                continue;
            }
            Err(payload) => {
                let err = CheckError::from_panic(payload);
                log::warn!("check `{}` panicked while being created for {}: {}", check.code(), file.uri, err);
                failures.push(CheckFailure {
                    code: check.code().into(),
                    phase: FailurePhase::Create,
                    message: err.to_string(),
                });
                continue;
            }
        };

        if let Handler::Inapplicable = handler {
            log::trace!("check `{}` does not apply to {}", check.code(), file.relative_path);
            continue;
        }

        match N::visitor(handler) {
            Some(visitor) => instances.push(Instance {
                visitor,
                ctx,
                failed: false,
            }),
            None => failures.push(CheckFailure {
                code: check.code().into(),
                phase: FailurePhase::Create,
                message: format!("the check created a visitor for a tree other than {:?}", tree_kind),
            }),
        }
    }

    let mut dispatch: HashMap<N::Kind, Vec<usize>> = HashMap::new();
    for (idx, instance) in instances.iter().enumerate() {
        for kind in instance.visitor.interests() {
            let handlers = dispatch.entry(kind).or_default();
            if !handlers.contains(&idx) {
                handlers.push(idx);
            }
        }
    }
    log::debug!(
        "running {} checks on {} ({} node kinds)",
        instances.len(),
        file.relative_path,
        dispatch.len()
    );

    let mut walk = Walk::new(root);
    while let Some((node, lineage)) = walk.step() {
        let interested = match dispatch.get(&node.kind()) {
            Some(interested) => interested,
            None => continue,
        };

        for &idx in interested {
            let instance = &mut instances[idx];
            if instance.failed {
                continue;
            }
            let result = AssertUnwindSafe(instance.visitor.on_node(node, lineage, &mut instance.ctx))
                .catch_unwind()
                .await;
            instance.settle(result, FailurePhase::Node(format!("{:?}", node.kind())), &mut failures);
        }
    }

    for instance in instances.iter_mut().filter(|instance| !instance.failed) {
        let result = AssertUnwindSafe(instance.visitor.on_end(&mut instance.ctx))
            .catch_unwind()
            .await;
        instance.settle(result, FailurePhase::End, &mut failures);
    }

    let suppressions = Suppressions::compute(root, Some(&store.codes()));
    let raw: Vec<Offense> = instances
        .into_iter()
        .flat_map(|instance| instance.ctx.offenses)
        .collect();
    let total = raw.len();
    let mut offenses: Vec<Offense> = raw
        .into_iter()
        .filter(|offense| !suppressions.is_suppressed(offense))
        .collect();
    offenses.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    LintResult {
        uri: file.uri.clone(),
        suppressed: total - offenses.len(),
        offenses,
        failures,
        suppressions: suppressions.into_ranges(),
    }
}

/// Lint a parsed file, blocking until every check has finished.
pub fn lint_file(
    file: &File,
    tree: &SourceTree,
    store: &CheckStore,
    config: &ResolvedConfig,
    env: Environment<'_>,
) -> LintResult {
    futures::executor::block_on(run_checks(file, tree, store, config, env))
}

/// Parse a file and lint it. A parse failure skips the file and is returned as an error.
pub fn lint_source(
    file: &File,
    parser: &dyn Parser,
    store: &CheckStore,
    config: &ResolvedConfig,
    env: Environment<'_>,
) -> Result<LintResult, ParseError> {
    let tree = parser.parse(&file.source).map_err(|err| {
        log::error!("failed to parse {}: {}", file.uri, err);
        err
    })?;
    Ok(lint_file(file, &tree, store, config, env))
}

/// Get a check by its code.
pub fn get_check_by_code(code: &str) -> Option<Box<dyn Check>> {
    CheckStore::new()
        .builtins()
        .checks
        .iter()
        .find(|check| check.code() == code)
        .map(|check| clone_box(&**check))
}

/// Get a group's checks by the group name.
pub fn get_group_checks_by_name(group_name: &str) -> Option<Vec<Box<dyn Check>>> {
    use groups::*;

    Some(match group_name {
        "liquid" => liquid(),
        "html" => html(),
        "performance" => performance(),
        "json" => json(),
        _ => return None,
    })
}

/// Get a suggestion for an incorrect check code for things such as "did you mean ...?"
pub fn get_check_suggestion(incorrect_code: &str) -> Option<&'static str> {
    let checks = CheckStore::new().builtins().checks;
    util::find_best_match_for_name(checks.iter().map(|check| check.code()), incorrect_code, None)
}

/// Get the documentation of a check.
///
/// This will always be `Some` for valid check codes and it will be an empty string
/// if the check has no docs
pub fn get_check_docs(code: &str) -> Option<&'static str> {
    get_check_by_code(code).map(|check| check.docs())
}
