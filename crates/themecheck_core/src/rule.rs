//! Core traits for check definitions and the context checks run with.

use crate::error::{CheckError, CheckResult};
use crate::external::Environment;
use crate::settings::{CheckSettings, ConfigSchema};
use crate::{File, Offense, Severity};
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smol_str::SmolStr;
use std::fmt::Debug;
use themecheck_syntax::{JsonNode, MarkupNode, Span, SyntaxNode, TreeKind};

/// A tag describing properties present on a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// This check runs if the configuration does not mention it.
    Recommended,
}

/// Metadata common to every check regardless of the tree it runs on.
///
/// Checks must be [`Send`] + [`Sync`] so a store can be shared by runs on
/// different threads. All per-file state lives in the visitor a check creates.
pub trait Rule: Debug + DynClone + Send + Sync {
    /// A unique, PascalCase code for the check.
    fn code(&self) -> &'static str;
    /// The name of the group this check belongs to.
    fn group(&self) -> &'static str;
    /// Optional docs for the check, an empty string by default
    fn docs(&self) -> &'static str {
        ""
    }
    /// A list of tags present on this check. Empty by default.
    fn tags(&self) -> &'static [Tag] {
        &[]
    }
    /// The severity offenses are reported with unless the configuration overrides it.
    fn severity(&self) -> Severity;
    /// The kind of tree this check runs on.
    fn tree_kind(&self) -> TreeKind;
    /// The options this check accepts.
    fn config_schema(&self) -> ConfigSchema {
        ConfigSchema::new()
    }
    /// Whether this check is recommended, this is a simple helper around [`Self::tags`].
    fn recommended(&self) -> bool {
        self.tags().iter().any(|x| x == &Tag::Recommended)
    }

    fn meta(&self) -> CheckMeta {
        CheckMeta {
            code: self.code(),
            severity: self.severity(),
            tree_kind: self.tree_kind(),
            config_schema: self.config_schema(),
        }
    }

    #[cfg(feature = "schema")]
    fn schema(&self) -> Option<schemars::schema::RootSchema> {
        None
    }
}

/// The static description of a check.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckMeta {
    pub code: &'static str,
    pub severity: Severity,
    pub tree_kind: TreeKind,
    pub config_schema: ConfigSchema,
}

/// A check which can be run on a file.
///
/// Creating a check yields a [`Handler`], a visitor holding all of the state of the check
/// for a single file. A check which does not apply to a file (for example because of the
/// directory the file is in) returns [`Handler::Inapplicable`].
pub trait Check: Rule {
    fn create(&self, ctx: &RunContext<'_>) -> Result<Handler, CheckError>;
}

dyn_clone::clone_trait_object!(Rule);
dyn_clone::clone_trait_object!(Check);

/// The per-file visitor of a check.
///
/// Handlers may suspend, for example to query the file probe. The runner awaits every
/// handler to completion before it moves on to the next one, so a visitor never runs
/// concurrently with another visitor of the same file.
#[async_trait(?Send)]
pub trait CheckVisitor<N: SyntaxNode> {
    /// The kinds of nodes this visitor is called for.
    fn interests(&self) -> Vec<N::Kind>;

    async fn on_node(&mut self, node: &N, lineage: &[&N], ctx: &mut RunContext<'_>) -> CheckResult;

    /// Called once after the whole tree has been walked.
    async fn on_end(&mut self, _ctx: &mut RunContext<'_>) -> CheckResult {
        Ok(())
    }
}

/// The visitor a check created for a file.
pub enum Handler {
    Markup(Box<dyn CheckVisitor<MarkupNode>>),
    Json(Box<dyn CheckVisitor<JsonNode>>),
    /// The check does not apply to this file.
    Inapplicable,
}

impl Handler {
    pub fn markup(visitor: impl CheckVisitor<MarkupNode> + 'static) -> Self {
        Handler::Markup(Box::new(visitor))
    }

    pub fn json(visitor: impl CheckVisitor<JsonNode> + 'static) -> Self {
        Handler::Json(Box::new(visitor))
    }
}

impl Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Markup(_) => f.write_str("Handler::Markup"),
            Handler::Json(_) => f.write_str("Handler::Json"),
            Handler::Inapplicable => f.write_str("Handler::Inapplicable"),
        }
    }
}

/// Trees a check visitor can be extracted for.
pub trait CheckTree: SyntaxNode + Sized + 'static {
    fn visitor(handler: Handler) -> Option<Box<dyn CheckVisitor<Self>>>;
}

impl CheckTree for MarkupNode {
    fn visitor(handler: Handler) -> Option<Box<dyn CheckVisitor<Self>>> {
        match handler {
            Handler::Markup(visitor) => Some(visitor),
            _ => None,
        }
    }
}

impl CheckTree for JsonNode {
    fn visitor(handler: Handler) -> Option<Box<dyn CheckVisitor<Self>>> {
        match handler {
            Handler::Json(visitor) => Some(visitor),
            _ => None,
        }
    }
}

/// Context given to a check when running it on a file.
#[derive(Debug, Clone)]
pub struct RunContext<'a> {
    pub file: &'a File,
    pub env: Environment<'a>,
    /// The code of the check this context belongs to.
    pub code: &'static str,
    pub settings: CheckSettings,
    /// The effective severity of the check, offenses are reported with it.
    pub severity: Severity,
    /// The offenses reported so far.
    pub offenses: Vec<Offense>,
    invalid_report: Option<(u32, u32)>,
}

impl<'a> RunContext<'a> {
    pub fn new(
        file: &'a File,
        env: Environment<'a>,
        code: &'static str,
        settings: CheckSettings,
        severity: Severity,
    ) -> Self {
        Self {
            file,
            env,
            code,
            severity,
            settings,
            offenses: vec![],
            invalid_report: None,
        }
    }

    /// Report an offense spanning `start..end` of the file.
    ///
    /// A range whose start is past its end is not recorded, the runner treats it as a
    /// failure of the check once the current callback returns.
    pub fn report(&mut self, message: impl Into<String>, start: u32, end: u32) {
        if start > end {
            if self.invalid_report.is_none() {
                self.invalid_report = Some((start, end));
            }
            return;
        }
        self.offenses.push(Offense {
            code: SmolStr::new(self.code),
            severity: self.severity,
            message: message.into(),
            uri: self.file.uri.clone(),
            start_index: start,
            end_index: end,
        });
    }

    pub fn report_span(&mut self, message: impl Into<String>, span: Span) {
        self.report(message, span.start, span.end)
    }

    /// Deserialize the configured options of the check, missing options take their defaults.
    pub fn options<T: DeserializeOwned>(&self) -> Result<T, CheckError> {
        serde_json::from_value(Value::Object(self.settings.options.clone())).map_err(|source| {
            CheckError::InvalidOptions {
                code: SmolStr::new(self.code),
                source,
            }
        })
    }

    pub fn relative_path(&self) -> &'a str {
        &self.file.relative_path
    }

    pub fn source(&self) -> &'a str {
        &self.file.source
    }

    pub(crate) fn take_invalid_report(&mut self) -> Option<CheckError> {
        self.invalid_report
            .take()
            .map(|(start, end)| CheckError::InvalidRange { start, end })
    }
}

#[macro_export]
#[doc(hidden)]
macro_rules! __pre_parse_docs_from_meta {
    (
        @$cb:tt
        @[docs $($docs:tt)*]
        @$other:tt
        #[doc = $doc:expr]
        $($rest:tt)*
    ) => (
        $crate::__pre_parse_docs_from_meta! {
            @$cb
            @[docs $($docs)* $doc]
            @$other
            $($rest)*
        }
    );

    (
        @$cb:tt
        @$docs:tt
        @[others $($others:tt)*]
        #[$other:meta]
        $($rest:tt)*
    ) => (
        $crate::__pre_parse_docs_from_meta! {
            @$cb
            @$docs
            @[others $($others)* $other]
            $($rest)*
        }
    );

    (
        @[cb $($cb:tt)*]
        @[docs $($docs:tt)*]
        @[others $($others:tt)*]
        $($rest:tt)*
    ) => (
        $($cb)* ! {
            #[doc = concat!($(indoc::indoc!($docs), "\n"),*)]
            $(
                #[$others]
            )*
            $($rest)*
        }
    );

    (
        $(:: $(@ $colon:tt)?)? $($cb:ident)::+ ! {
            $($input:tt)*
        }
    ) => (
        $crate::__pre_parse_docs_from_meta! {
            @[cb $(:: $($colon)?)? $($cb)::+]
            @[docs ]
            @[others ]
            $($input)*
        }
    );
}

#[macro_export]
#[doc(hidden)]
macro_rules! __declare_check_inner {
    (
        #[doc = $doc:expr]
        $(#[$outer:meta])*
        // The check struct name
        $name:ident,
        $group:ident,
        $(
            tags($($tag:ident),* $(,)?),
        )?
        severity($severity:ident),
        tree($tree:ident),
        // A unique PascalCase code for the check
        $code:literal
        $(,
            // Options of the check, with their defaults
            $(
                $(#[doc = $field_doc:expr])*
                pub $key:ident : $ty:ty = $default:expr
            ),* $(,)?
        )?
    ) => {
        use $crate::Rule;
        use serde::{Deserialize, Serialize};

        #[doc = $doc]
        #[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
        #[derive(Debug, Clone, Deserialize, Serialize)]
        $(#[$outer])*
        #[serde(default)]
        pub struct $name {
            $(
                $(
                    $(#[doc = $field_doc])*
                    pub $key: $ty,
                )*
            )?
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $(
                        $(
                            $key: $default,
                        )*
                    )?
                }
            }
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }
        }

        impl Rule for $name {
            fn code(&self) -> &'static str {
                $code
            }

            fn group(&self) -> &'static str {
                stringify!($group)
            }

            fn docs(&self) -> &'static str {
                $doc
            }

            $(
                fn tags(&self) -> &'static [$crate::Tag] {
                    &[$($crate::Tag::$tag),*]
                }
            )?

            fn severity(&self) -> $crate::Severity {
                $crate::Severity::$severity
            }

            fn tree_kind(&self) -> $crate::TreeKind {
                $crate::TreeKind::$tree
            }

            fn config_schema(&self) -> $crate::ConfigSchema {
                #[allow(unused_mut)]
                let mut schema = $crate::ConfigSchema::new();
                $(
                    $(
                        let default: $ty = $default;
                        schema.insert(stringify!($key), $crate::SchemaProp {
                            kind: <$ty as $crate::OptionType>::schema_type(),
                            default: $crate::__serde_json::to_value(default).unwrap_or_default(),
                            description: concat!($($field_doc, "\n"),*).trim(),
                        });
                    )*
                )?
                schema
            }

            #[cfg(feature = "schema")]
            fn schema(&self) -> Option<schemars::schema::RootSchema> {
                Some(schemars::schema_for!($name))
            }
        }
    };
}

/// A macro to easily generate check boilerplate code.
///
/// ```ignore
/// declare_check! {
///     /// A description of the check here
///     /// This will be used as the doc for the check struct
///     CheckName,
///     // The name of the group this check belongs to.
///     groupname,
///     tags(Recommended),
///     // The default severity and the tree the check runs on.
///     severity(Warning),
///     tree(Markup),
///     // Make sure this is PascalCase and unique.
///     "CheckName",
///     /// A description of the option here, used for config docs.
///     pub threshold: u64 = 10,
/// }
/// ```
///
/// The first argument is an identifier for the check structure. The doc comments above
/// it become the docs of the check. Options follow the code, each with a type implementing
/// [`OptionType`](crate::OptionType) and a default. The generated struct deserializes
/// from the configured options with [`RunContext::options`], options which are missing
/// take their default.
#[macro_export]
macro_rules! declare_check {
    ($($input:tt)*) => {
        $crate::__pre_parse_docs_from_meta! {
            $crate::__declare_check_inner! { $($input)* }
        }
    };
}
