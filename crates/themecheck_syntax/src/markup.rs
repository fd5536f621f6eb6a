//! The markup tree: HTML elements with embedded Liquid tags and outputs.

use crate::{Span, SyntaxNode};
use smol_str::SmolStr;

/// The type tag of a [`MarkupNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MarkupKind {
    Document,
    TextNode,
    HtmlElement,
    HtmlVoidElement,
    HtmlRawNode,
    HtmlComment,
    AttrEmpty,
    AttrDoubleQuoted,
    AttrSingleQuoted,
    AttrUnquoted,
    LiquidVariableOutput,
    LiquidTag,
    LiquidBranch,
    LiquidRawTag,
    LiquidVariable,
    LiquidFilter,
    NamedArgument,
    VariableLookup,
    String,
    Number,
    LiquidLiteral,
    Range,
    Comparison,
    LogicalExpression,
    AssignMarkup,
    ForMarkup,
    RenderMarkup,
    PaginateMarkup,
}

/// A single node of a markup tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode {
    /// The root of every markup tree.
    Document {
        span: Span,
        children: Vec<MarkupNode>,
    },
    /// Non blank text, the span excludes surrounding whitespace.
    TextNode { span: Span, value: SmolStr },
    HtmlElement {
        span: Span,
        name: SmolStr,
        attributes: Vec<MarkupNode>,
        children: Vec<MarkupNode>,
    },
    /// An element which never has a closing tag, such as `<img>` or `<meta>`.
    HtmlVoidElement {
        span: Span,
        name: SmolStr,
        attributes: Vec<MarkupNode>,
    },
    /// An element whose body is not markup, such as `<script>` or `<style>`.
    HtmlRawNode {
        span: Span,
        name: SmolStr,
        attributes: Vec<MarkupNode>,
        body: SmolStr,
    },
    /// `<!-- body -->`
    HtmlComment { span: Span, body: SmolStr },
    /// An attribute without a value, `<input disabled>`.
    AttrEmpty { span: Span, name: SmolStr },
    AttrDoubleQuoted {
        span: Span,
        name: SmolStr,
        value: Vec<MarkupNode>,
    },
    AttrSingleQuoted {
        span: Span,
        name: SmolStr,
        value: Vec<MarkupNode>,
    },
    AttrUnquoted {
        span: Span,
        name: SmolStr,
        value: Vec<MarkupNode>,
    },
    /// `{{ markup }}`, the markup is a [`MarkupNode::LiquidVariable`].
    LiquidVariableOutput { span: Span, markup: Box<MarkupNode> },
    /// `{% name markup %}`, optionally with a body closed by `{% endname %}`.
    ///
    /// Tags whose body is split into branches (`if`, `unless`, `case`, `for`, `tablerow`)
    /// have [`MarkupNode::LiquidBranch`] children. The `liquid` tag holds its statements
    /// as tags inside of `markup`.
    LiquidTag {
        span: Span,
        name: SmolStr,
        markup: Vec<MarkupNode>,
        /// The unparsed markup of the tag, without surrounding whitespace.
        markup_text: SmolStr,
        children: Option<Vec<MarkupNode>>,
        /// The span of the opening `{% name markup %}`.
        block_start: Span,
        /// The span of the closing `{% endname %}` for block tags.
        block_end: Option<Span>,
    },
    /// A branch of a block tag. The first branch has no name, later ones are named
    /// after the tag opening them (`elsif`, `else`, `when`).
    LiquidBranch {
        span: Span,
        name: Option<SmolStr>,
        markup: Vec<MarkupNode>,
        children: Vec<MarkupNode>,
    },
    /// A tag whose body is kept as text, such as `{% comment %}` or `{% schema %}`.
    LiquidRawTag {
        span: Span,
        name: SmolStr,
        body: SmolStr,
        body_span: Span,
    },
    /// An expression followed by zero or more filters.
    LiquidVariable {
        span: Span,
        expression: Box<MarkupNode>,
        filters: Vec<MarkupNode>,
    },
    LiquidFilter {
        span: Span,
        name: SmolStr,
        args: Vec<MarkupNode>,
    },
    /// `name: value`
    NamedArgument {
        span: Span,
        name: SmolStr,
        value: Box<MarkupNode>,
    },
    /// `product.title` or `collections['all']`. The name is absent for lookups
    /// starting with a bracket.
    VariableLookup {
        span: Span,
        name: Option<SmolStr>,
        lookups: Vec<MarkupNode>,
    },
    /// A string literal, the value excludes the quotes.
    String { span: Span, value: SmolStr },
    Number { span: Span, value: SmolStr },
    /// `true`, `false`, `nil`, `empty` or `blank`.
    LiquidLiteral { span: Span, keyword: SmolStr },
    /// `(start..end)`
    Range {
        span: Span,
        start: Box<MarkupNode>,
        end: Box<MarkupNode>,
    },
    Comparison {
        span: Span,
        comparator: SmolStr,
        left: Box<MarkupNode>,
        right: Box<MarkupNode>,
    },
    /// `left and right` or `left or right`
    LogicalExpression {
        span: Span,
        relation: SmolStr,
        left: Box<MarkupNode>,
        right: Box<MarkupNode>,
    },
    /// `name = value` of an `assign` tag, the span starts at the name.
    AssignMarkup {
        span: Span,
        name: SmolStr,
        value: Box<MarkupNode>,
    },
    /// `variable_name in collection reversed limit: 2`
    ForMarkup {
        span: Span,
        variable_name: SmolStr,
        collection: Box<MarkupNode>,
        reversed: bool,
        args: Vec<MarkupNode>,
    },
    /// `'snippet' with variable as alias, key: value`
    RenderMarkup {
        span: Span,
        snippet: Box<MarkupNode>,
        variable: Option<Box<MarkupNode>>,
        alias: Option<SmolStr>,
        args: Vec<MarkupNode>,
    },
    /// `collection by page_size`
    PaginateMarkup {
        span: Span,
        collection: Box<MarkupNode>,
        page_size: Box<MarkupNode>,
        args: Vec<MarkupNode>,
    },
}

impl MarkupNode {
    /// The name of a tag, element, attribute, filter or named argument.
    pub fn name(&self) -> Option<&str> {
        match self {
            MarkupNode::HtmlElement { name, .. }
            | MarkupNode::HtmlVoidElement { name, .. }
            | MarkupNode::HtmlRawNode { name, .. }
            | MarkupNode::AttrEmpty { name, .. }
            | MarkupNode::AttrDoubleQuoted { name, .. }
            | MarkupNode::AttrSingleQuoted { name, .. }
            | MarkupNode::AttrUnquoted { name, .. }
            | MarkupNode::LiquidTag { name, .. }
            | MarkupNode::LiquidRawTag { name, .. }
            | MarkupNode::LiquidFilter { name, .. }
            | MarkupNode::NamedArgument { name, .. } => Some(name),
            MarkupNode::LiquidBranch { name, .. } | MarkupNode::VariableLookup { name, .. } => {
                name.as_deref()
            }
            _ => None,
        }
    }

    /// The attributes of an HTML element, empty for every other node.
    pub fn attributes(&self) -> &[MarkupNode] {
        match self {
            MarkupNode::HtmlElement { attributes, .. }
            | MarkupNode::HtmlVoidElement { attributes, .. }
            | MarkupNode::HtmlRawNode { attributes, .. } => attributes,
            _ => &[],
        }
    }

    /// Find an attribute of an element by its case insensitive name.
    pub fn attribute(&self, name: &str) -> Option<&MarkupNode> {
        self.attributes()
            .iter()
            .find(|attr| attr.name().map_or(false, |n| n.eq_ignore_ascii_case(name)))
    }

    /// The static text of an attribute value, `None` if it holds Liquid or this is not an attribute.
    pub fn attribute_text(&self) -> Option<String> {
        let value = match self {
            MarkupNode::AttrEmpty { .. } => return Some(String::new()),
            MarkupNode::AttrDoubleQuoted { value, .. }
            | MarkupNode::AttrSingleQuoted { value, .. }
            | MarkupNode::AttrUnquoted { value, .. } => value,
            _ => return None,
        };

        value.iter().try_fold(String::new(), |mut text, node| match node {
            MarkupNode::TextNode { value, .. } => {
                text.push_str(value);
                Some(text)
            }
            _ => None,
        })
    }
}

fn boxed(node: &MarkupNode) -> Vec<&MarkupNode> {
    vec![node]
}

impl SyntaxNode for MarkupNode {
    type Kind = MarkupKind;

    fn kind(&self) -> MarkupKind {
        match self {
            MarkupNode::Document { .. } => MarkupKind::Document,
            MarkupNode::TextNode { .. } => MarkupKind::TextNode,
            MarkupNode::HtmlElement { .. } => MarkupKind::HtmlElement,
            MarkupNode::HtmlVoidElement { .. } => MarkupKind::HtmlVoidElement,
            MarkupNode::HtmlRawNode { .. } => MarkupKind::HtmlRawNode,
            MarkupNode::HtmlComment { .. } => MarkupKind::HtmlComment,
            MarkupNode::AttrEmpty { .. } => MarkupKind::AttrEmpty,
            MarkupNode::AttrDoubleQuoted { .. } => MarkupKind::AttrDoubleQuoted,
            MarkupNode::AttrSingleQuoted { .. } => MarkupKind::AttrSingleQuoted,
            MarkupNode::AttrUnquoted { .. } => MarkupKind::AttrUnquoted,
            MarkupNode::LiquidVariableOutput { .. } => MarkupKind::LiquidVariableOutput,
            MarkupNode::LiquidTag { .. } => MarkupKind::LiquidTag,
            MarkupNode::LiquidBranch { .. } => MarkupKind::LiquidBranch,
            MarkupNode::LiquidRawTag { .. } => MarkupKind::LiquidRawTag,
            MarkupNode::LiquidVariable { .. } => MarkupKind::LiquidVariable,
            MarkupNode::LiquidFilter { .. } => MarkupKind::LiquidFilter,
            MarkupNode::NamedArgument { .. } => MarkupKind::NamedArgument,
            MarkupNode::VariableLookup { .. } => MarkupKind::VariableLookup,
            MarkupNode::String { .. } => MarkupKind::String,
            MarkupNode::Number { .. } => MarkupKind::Number,
            MarkupNode::LiquidLiteral { .. } => MarkupKind::LiquidLiteral,
            MarkupNode::Range { .. } => MarkupKind::Range,
            MarkupNode::Comparison { .. } => MarkupKind::Comparison,
            MarkupNode::LogicalExpression { .. } => MarkupKind::LogicalExpression,
            MarkupNode::AssignMarkup { .. } => MarkupKind::AssignMarkup,
            MarkupNode::ForMarkup { .. } => MarkupKind::ForMarkup,
            MarkupNode::RenderMarkup { .. } => MarkupKind::RenderMarkup,
            MarkupNode::PaginateMarkup { .. } => MarkupKind::PaginateMarkup,
        }
    }

    fn span(&self) -> Span {
        match self {
            MarkupNode::Document { span, .. }
            | MarkupNode::TextNode { span, .. }
            | MarkupNode::HtmlElement { span, .. }
            | MarkupNode::HtmlVoidElement { span, .. }
            | MarkupNode::HtmlRawNode { span, .. }
            | MarkupNode::HtmlComment { span, .. }
            | MarkupNode::AttrEmpty { span, .. }
            | MarkupNode::AttrDoubleQuoted { span, .. }
            | MarkupNode::AttrSingleQuoted { span, .. }
            | MarkupNode::AttrUnquoted { span, .. }
            | MarkupNode::LiquidVariableOutput { span, .. }
            | MarkupNode::LiquidTag { span, .. }
            | MarkupNode::LiquidBranch { span, .. }
            | MarkupNode::LiquidRawTag { span, .. }
            | MarkupNode::LiquidVariable { span, .. }
            | MarkupNode::LiquidFilter { span, .. }
            | MarkupNode::NamedArgument { span, .. }
            | MarkupNode::VariableLookup { span, .. }
            | MarkupNode::String { span, .. }
            | MarkupNode::Number { span, .. }
            | MarkupNode::LiquidLiteral { span, .. }
            | MarkupNode::Range { span, .. }
            | MarkupNode::Comparison { span, .. }
            | MarkupNode::LogicalExpression { span, .. }
            | MarkupNode::AssignMarkup { span, .. }
            | MarkupNode::ForMarkup { span, .. }
            | MarkupNode::RenderMarkup { span, .. }
            | MarkupNode::PaginateMarkup { span, .. } => *span,
        }
    }

    fn children(&self) -> Vec<&MarkupNode> {
        match self {
            MarkupNode::Document { children, .. } => children.iter().collect(),
            MarkupNode::HtmlElement {
                attributes,
                children,
                ..
            } => attributes.iter().chain(children).collect(),
            MarkupNode::HtmlVoidElement { attributes, .. }
            | MarkupNode::HtmlRawNode { attributes, .. } => attributes.iter().collect(),
            MarkupNode::AttrDoubleQuoted { value, .. }
            | MarkupNode::AttrSingleQuoted { value, .. }
            | MarkupNode::AttrUnquoted { value, .. } => value.iter().collect(),
            MarkupNode::LiquidVariableOutput { markup, .. } => boxed(markup),
            MarkupNode::LiquidTag {
                markup, children, ..
            } => markup.iter().chain(children.iter().flatten()).collect(),
            MarkupNode::LiquidBranch {
                markup, children, ..
            } => markup.iter().chain(children).collect(),
            MarkupNode::LiquidVariable {
                expression,
                filters,
                ..
            } => std::iter::once(&**expression).chain(filters).collect(),
            MarkupNode::LiquidFilter { args, .. } => args.iter().collect(),
            MarkupNode::NamedArgument { value, .. } => boxed(value),
            MarkupNode::VariableLookup { lookups, .. } => lookups.iter().collect(),
            MarkupNode::Range { start, end, .. } => vec![&**start, &**end],
            MarkupNode::Comparison { left, right, .. }
            | MarkupNode::LogicalExpression { left, right, .. } => vec![&**left, &**right],
            MarkupNode::AssignMarkup { value, .. } => boxed(value),
            MarkupNode::ForMarkup {
                collection, args, ..
            } => std::iter::once(&**collection).chain(args).collect(),
            MarkupNode::RenderMarkup {
                snippet,
                variable,
                args,
                ..
            } => std::iter::once(&**snippet)
                .chain(variable.as_deref())
                .chain(args)
                .collect(),
            MarkupNode::PaginateMarkup {
                collection,
                page_size,
                args,
                ..
            } => vec![&**collection, &**page_size]
                .into_iter()
                .chain(args)
                .collect(),
            MarkupNode::TextNode { .. }
            | MarkupNode::HtmlComment { .. }
            | MarkupNode::AttrEmpty { .. }
            | MarkupNode::LiquidRawTag { .. }
            | MarkupNode::String { .. }
            | MarkupNode::Number { .. }
            | MarkupNode::LiquidLiteral { .. } => vec![],
        }
    }

    /// HTML comments, `{% comment %}` blocks and inline `{% # %}` comments.
    fn comment_text(&self) -> Option<&str> {
        match self {
            MarkupNode::HtmlComment { body, .. } => Some(body),
            MarkupNode::LiquidRawTag { name, body, .. } if name == "comment" => Some(body),
            MarkupNode::LiquidTag {
                name, markup_text, ..
            } if name == "#" => Some(markup_text),
            _ => None,
        }
    }
}
