//! Commonly used items by checks. These include the tree definitions and utilities.

#[doc(no_inline)]
pub use crate::{
    declare_check, scope::ScopeCollector, scope::ScopeRange, util, Check, CheckError, CheckResult,
    CheckVisitor, Handler, RunContext, Severity,
};

#[doc(no_inline)]
pub use async_trait::async_trait;

#[doc(no_inline)]
pub use themecheck_syntax::{
    JsonKind, JsonLiteral, JsonNode, MarkupKind, MarkupNode, SmolStr, Span, SyntaxNode,
};
