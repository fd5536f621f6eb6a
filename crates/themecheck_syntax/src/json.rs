//! The tree of a JSON file.

use crate::{Span, SyntaxNode};
use smol_str::SmolStr;

/// The type tag of a [`JsonNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JsonKind {
    Object,
    Property,
    Identifier,
    Array,
    Literal,
}

/// The value of a scalar JSON node. Numbers keep their source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonLiteral {
    String(SmolStr),
    Number(SmolStr),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonNode {
    /// An object, the children are [`JsonNode::Property`] nodes in source order.
    Object { span: Span, children: Vec<JsonNode> },
    /// A `"key": value` pair, the key is a [`JsonNode::Identifier`].
    Property {
        span: Span,
        key: Box<JsonNode>,
        value: Box<JsonNode>,
    },
    /// The key of a property, the value excludes the quotes.
    Identifier { span: Span, value: SmolStr },
    Array { span: Span, children: Vec<JsonNode> },
    Literal { span: Span, value: JsonLiteral },
}

impl JsonNode {
    /// The key of a property node.
    pub fn key(&self) -> Option<&str> {
        match self {
            JsonNode::Property { key, .. } => match &**key {
                JsonNode::Identifier { value, .. } => Some(value),
                _ => None,
            },
            _ => None,
        }
    }

    /// Look up the value of a property of an object node.
    pub fn get(&self, key: &str) -> Option<&JsonNode> {
        match self {
            JsonNode::Object { children, .. } => children.iter().find_map(|prop| match prop {
                JsonNode::Property { value, .. } if prop.key() == Some(key) => Some(&**value),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonNode::Literal {
                value: JsonLiteral::String(s),
                ..
            } => Some(s),
            _ => None,
        }
    }
}

impl SyntaxNode for JsonNode {
    type Kind = JsonKind;

    fn kind(&self) -> JsonKind {
        match self {
            JsonNode::Object { .. } => JsonKind::Object,
            JsonNode::Property { .. } => JsonKind::Property,
            JsonNode::Identifier { .. } => JsonKind::Identifier,
            JsonNode::Array { .. } => JsonKind::Array,
            JsonNode::Literal { .. } => JsonKind::Literal,
        }
    }

    fn span(&self) -> Span {
        match self {
            JsonNode::Object { span, .. }
            | JsonNode::Property { span, .. }
            | JsonNode::Identifier { span, .. }
            | JsonNode::Array { span, .. }
            | JsonNode::Literal { span, .. } => *span,
        }
    }

    fn children(&self) -> Vec<&JsonNode> {
        match self {
            JsonNode::Object { children, .. } | JsonNode::Array { children, .. } => {
                children.iter().collect()
            }
            JsonNode::Property { key, value, .. } => vec![&**key, &**value],
            JsonNode::Identifier { .. } | JsonNode::Literal { .. } => vec![],
        }
    }
}
