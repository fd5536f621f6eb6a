//! A small parser building markup and JSON trees from source text for tests.
//!
//! It understands enough of HTML and Liquid for the checks of this crate: elements,
//! attributes, comments, outputs, tags with their markup, blocks with branches, raw tags
//! and the `liquid` tag. It is not a conforming parser.

use crate::external::{ParseError, Parser};
use std::mem;
use themecheck_syntax::{JsonLiteral, JsonNode, MarkupNode, SmolStr, SourceTree, Span, TreeKind};

type Result<T, E = ParseError> = std::result::Result<T, E>;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source", "track", "wbr",
];
const RAW_ELEMENTS: &[&str] = &["script", "style"];
const RAW_TAGS: &[&str] = &["comment", "raw", "javascript", "stylesheet", "schema"];
const BLOCK_TAGS: &[&str] = &["capture", "form", "paginate"];
const LITERALS: &[&str] = &["true", "false", "nil", "null", "empty", "blank"];

fn branch_names(tag: &str) -> Option<&'static [&'static str]> {
    Some(match tag {
        "if" | "unless" => &["elsif", "else"],
        "case" => &["when", "else"],
        "for" | "tablerow" => &["else"],
        _ => return None,
    })
}

fn err<T>(message: impl Into<String>, offset: usize) -> Result<T> {
    Err(ParseError::new(message, offset as u32))
}

/// Parse a markup source into a `Document` tree.
pub fn parse_markup(src: &str) -> Result<MarkupNode> {
    let mut parser = MarkupParser { src, pos: 0 };
    let children = parser.nodes(&Stop::Eof)?;
    Ok(MarkupNode::Document {
        span: Span::from_offsets(0, src.len()),
        children,
    })
}

/// Parse a JSON source.
pub fn parse_json(src: &str) -> Result<JsonNode> {
    let mut parser = JsonParser { src, pos: 0 };
    let value = parser.value()?;
    parser.skip_ws();
    if parser.pos < src.len() {
        return err("trailing characters after JSON value", parser.pos);
    }
    Ok(value)
}

/// A [`Parser`] over the fixture grammar of one tree kind.
#[derive(Debug, Clone, Copy)]
pub struct FixtureParser {
    kind: TreeKind,
}

impl FixtureParser {
    pub fn markup() -> Self {
        Self {
            kind: TreeKind::Markup,
        }
    }

    pub fn json() -> Self {
        Self { kind: TreeKind::Json }
    }

    pub fn for_kind(kind: TreeKind) -> Self {
        Self { kind }
    }
}

impl Parser for FixtureParser {
    fn parse(&self, source: &str) -> Result<SourceTree> {
        Ok(match self.kind {
            TreeKind::Markup => parse_markup(source)?.into(),
            TreeKind::Json => parse_json(source)?.into(),
        })
    }
}

/// The opening of a tag: `{% name markup %}`, or a statement of a `liquid` tag.
#[derive(Debug, Clone)]
struct TagHeader {
    span: Span,
    name: String,
    markup: String,
    markup_start: usize,
}

impl TagHeader {
    /// Split `body` (which starts at `offset`) into a tag name and its markup.
    fn new(span: Span, body: &str, offset: usize) -> Self {
        let lead = body.len() - body.trim_start().len();
        let trimmed = body.trim();
        let name_len = if trimmed.starts_with('#') {
            1
        } else {
            trimmed.find(char::is_whitespace).unwrap_or(trimmed.len())
        };
        let after = &trimmed[name_len..];
        let gap = after.len() - after.trim_start().len();

        Self {
            span,
            name: trimmed[..name_len].to_string(),
            markup: after.trim().to_string(),
            markup_start: offset + lead + name_len + gap,
        }
    }
}

/// Something tags can pull their bodies and closing tags from.
trait TagSource {
    /// Parse nodes up to one of the tags named in `stops`, leaving that tag unconsumed.
    fn body(&mut self, stops: &[String]) -> Result<Vec<MarkupNode>>;

    /// Consume the tag at the cursor.
    fn take_tag(&mut self) -> Result<TagHeader>;
}

/// Build a tag whose header was just consumed, including its body for block tags.
fn build_tag<S: TagSource>(source: &mut S, header: TagHeader) -> Result<MarkupNode> {
    let markup = tag_markup(&header.name, &header.markup, header.markup_start)?;
    let branches = branch_names(&header.name);

    if branches.is_none() && !BLOCK_TAGS.contains(&header.name.as_str()) {
        return Ok(MarkupNode::LiquidTag {
            span: header.span,
            name: header.name.into(),
            markup,
            markup_text: header.markup.into(),
            children: None,
            block_start: header.span,
            block_end: None,
        });
    }

    let end_name = format!("end{}", header.name);
    let mut stops: Vec<String> = branches.unwrap_or(&[]).iter().map(|s| s.to_string()).collect();
    stops.push(end_name.clone());

    let mut children = vec![];
    let mut branch_name = None;
    let mut branch_markup = vec![];
    let mut branch_start = header.span.end;

    let block_end = loop {
        let body = source.body(&stops)?;
        let next = source.take_tag()?;
        if branches.is_some() {
            children.push(MarkupNode::LiquidBranch {
                span: Span::new(branch_start, next.span.start),
                name: branch_name.take(),
                markup: mem::take(&mut branch_markup),
                children: body,
            });
        } else {
            children = body;
        }

        if next.name == end_name {
            break next.span;
        }
        branch_markup = tag_markup(&next.name, &next.markup, next.markup_start)?;
        branch_start = next.span.start;
        branch_name = Some(SmolStr::new(&next.name));
    };

    Ok(MarkupNode::LiquidTag {
        span: header.span.cover(block_end),
        name: header.name.into(),
        markup,
        markup_text: header.markup.into(),
        children: Some(children),
        block_start: header.span,
        block_end: Some(block_end),
    })
}

enum Stop {
    Eof,
    Element(String),
    Tags(Vec<String>),
}

struct MarkupParser<'s> {
    src: &'s str,
    pos: usize,
}

impl TagSource for MarkupParser<'_> {
    fn body(&mut self, stops: &[String]) -> Result<Vec<MarkupNode>> {
        self.nodes(&Stop::Tags(stops.to_vec()))
    }

    fn take_tag(&mut self) -> Result<TagHeader> {
        let header = self.read_tag(self.pos)?;
        self.pos = header.span.end as usize;
        Ok(header)
    }
}

fn is_element_start(rest: &str) -> bool {
    rest.starts_with("<!--")
        || rest.starts_with("</")
        || (rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()))
}

impl<'s> MarkupParser<'s> {
    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn nodes(&mut self, stop: &Stop) -> Result<Vec<MarkupNode>> {
        let mut nodes = vec![];
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return match stop {
                    Stop::Eof => Ok(nodes),
                    Stop::Element(name) => err(format!("unclosed element `{}`", name), self.pos),
                    Stop::Tags(tags) => err(format!("expected one of `{}`", tags.join("`, `")), self.pos),
                };
            }

            if rest.starts_with("{%") {
                let header = self.read_tag(self.pos)?;
                if let Stop::Tags(tags) = stop {
                    if tags.contains(&header.name) {
                        return Ok(nodes);
                    }
                }
                self.pos = header.span.end as usize;
                nodes.push(self.tag(header)?);
            } else if rest.starts_with("{{") {
                nodes.push(self.output()?);
            } else if rest.starts_with("<!--") {
                nodes.push(self.comment()?);
            } else if rest.starts_with("</") {
                let name: String = rest[2..]
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
                    .collect();
                return match stop {
                    Stop::Element(expected) if expected.eq_ignore_ascii_case(&name) => Ok(nodes),
                    _ => err(format!("unexpected closing tag `{}`", name), self.pos),
                };
            } else if is_element_start(rest) {
                nodes.push(self.element()?);
            } else if let Some(text) = self.text() {
                nodes.push(text);
            }
        }
    }

    fn read_tag(&self, at: usize) -> Result<TagHeader> {
        let mut inner_start = at + 2;
        if self.src[inner_start..].starts_with('-') {
            inner_start += 1;
        }
        let close = match self.src[inner_start..].find("%}") {
            Some(idx) => inner_start + idx,
            None => return err("unterminated tag", at),
        };
        let mut inner_end = close;
        if inner_end > inner_start && self.src[..inner_end].ends_with('-') {
            inner_end -= 1;
        }

        Ok(TagHeader::new(
            Span::from_offsets(at, close + 2),
            &self.src[inner_start..inner_end],
            inner_start,
        ))
    }

    fn tag(&mut self, header: TagHeader) -> Result<MarkupNode> {
        if RAW_TAGS.contains(&header.name.as_str()) {
            return self.raw_tag(header);
        }
        if header.name == "liquid" {
            let mut statements = Statements::new(&header.markup, header.markup_start);
            let markup = statements.body(&[])?;
            return Ok(MarkupNode::LiquidTag {
                span: header.span,
                name: header.name.into(),
                markup,
                markup_text: header.markup.into(),
                children: None,
                block_start: header.span,
                block_end: None,
            });
        }
        build_tag(self, header)
    }

    fn raw_tag(&mut self, header: TagHeader) -> Result<MarkupNode> {
        let end_name = format!("end{}", header.name);
        let body_start = self.pos;
        let mut search = self.pos;

        loop {
            let at = match self.src[search..].find("{%") {
                Some(idx) => search + idx,
                None => return err(format!("expected `{}`", end_name), self.src.len()),
            };
            let close = self.read_tag(at)?;
            if close.name == end_name {
                self.pos = close.span.end as usize;
                return Ok(MarkupNode::LiquidRawTag {
                    span: header.span.cover(close.span),
                    name: header.name.into(),
                    body: self.src[body_start..at].into(),
                    body_span: Span::from_offsets(body_start, at),
                });
            }
            search = close.span.end as usize;
        }
    }

    fn output(&mut self) -> Result<MarkupNode> {
        let start = self.pos;
        let mut inner_start = start + 2;
        if self.src[inner_start..].starts_with('-') {
            inner_start += 1;
        }
        let close = match self.src[inner_start..].find("}}") {
            Some(idx) => inner_start + idx,
            None => return err("unterminated output", start),
        };
        let mut inner_end = close;
        if inner_end > inner_start && self.src[..inner_end].ends_with('-') {
            inner_end -= 1;
        }
        self.pos = close + 2;

        let inner = &self.src[inner_start..inner_end];
        let mut exprs = ExprParser::new(inner, inner_start)?;
        let markup = exprs.variable()?;
        exprs.finish()?;

        Ok(MarkupNode::LiquidVariableOutput {
            span: Span::from_offsets(start, self.pos),
            markup: Box::new(markup),
        })
    }

    fn comment(&mut self) -> Result<MarkupNode> {
        let start = self.pos;
        let close = match self.src[start + 4..].find("-->") {
            Some(idx) => start + 4 + idx,
            None => return err("unterminated comment", start),
        };
        self.pos = close + 3;
        Ok(MarkupNode::HtmlComment {
            span: Span::from_offsets(start, self.pos),
            body: self.src[start + 4..close].into(),
        })
    }

    fn text(&mut self) -> Option<MarkupNode> {
        let start = self.pos;
        let mut end = start;
        while end < self.src.len() {
            let rest = &self.src[end..];
            if end > start && (rest.starts_with("{{") || rest.starts_with("{%") || is_element_start(rest)) {
                break;
            }
            end += rest.chars().next().map_or(1, char::len_utf8);
        }
        self.pos = end;

        let text = &self.src[start..end];
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lead = text.len() - text.trim_start().len();
        Some(MarkupNode::TextNode {
            span: Span::from_offsets(start + lead, start + lead + trimmed.len()),
            value: trimmed.into(),
        })
    }

    fn element(&mut self) -> Result<MarkupNode> {
        let start = self.pos;
        let name: String = self.src[start + 1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
            .collect();
        self.pos = start + 1 + name.len();
        let (attributes, self_closing) = self.attributes()?;
        let lower = name.to_ascii_lowercase();

        if RAW_ELEMENTS.contains(&lower.as_str()) {
            let body_start = self.pos;
            let close = match self.src[body_start..]
                .to_ascii_lowercase()
                .find(&format!("</{}", lower))
            {
                Some(idx) => body_start + idx,
                None => return err(format!("unclosed element `{}`", name), start),
            };
            let end = match self.src[close..].find('>') {
                Some(idx) => close + idx + 1,
                None => return err("unterminated closing tag", close),
            };
            self.pos = end;
            return Ok(MarkupNode::HtmlRawNode {
                span: Span::from_offsets(start, end),
                name: name.into(),
                attributes,
                body: self.src[body_start..close].into(),
            });
        }

        if self_closing || VOID_ELEMENTS.contains(&lower.as_str()) {
            return Ok(MarkupNode::HtmlVoidElement {
                span: Span::from_offsets(start, self.pos),
                name: name.into(),
                attributes,
            });
        }

        let children = self.nodes(&Stop::Element(name.clone()))?;
        self.pos = match self.rest().find('>') {
            Some(idx) => self.pos + idx + 1,
            None => return err("unterminated closing tag", self.pos),
        };
        Ok(MarkupNode::HtmlElement {
            span: Span::from_offsets(start, self.pos),
            name: name.into(),
            attributes,
            children,
        })
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn attributes(&mut self) -> Result<(Vec<MarkupNode>, bool)> {
        let mut attributes = vec![];
        loop {
            self.skip_ws();
            let rest = self.rest();
            if rest.is_empty() {
                return err("unterminated element", self.pos);
            } else if rest.starts_with("/>") {
                self.pos += 2;
                return Ok((attributes, true));
            } else if rest.starts_with('>') {
                self.pos += 1;
                return Ok((attributes, false));
            } else if rest.starts_with("{{") {
                attributes.push(self.output()?);
                continue;
            } else if rest.starts_with("{%") {
                let header = self.read_tag(self.pos)?;
                self.pos = header.span.end as usize;
                attributes.push(self.tag(header)?);
                continue;
            }

            let start = self.pos;
            let name: String = rest
                .chars()
                .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\''))
                .collect();
            if name.is_empty() {
                return err("expected an attribute name", start);
            }
            self.pos += name.len();

            if !self.rest().starts_with('=') {
                attributes.push(MarkupNode::AttrEmpty {
                    span: Span::from_offsets(start, self.pos),
                    name: name.into(),
                });
                continue;
            }
            self.pos += 1;

            let attr = match self.rest().chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    self.pos += 1;
                    let value = self.attr_value(|rest| rest.starts_with(quote))?;
                    self.pos += 1;
                    let span = Span::from_offsets(start, self.pos);
                    if quote == '"' {
                        MarkupNode::AttrDoubleQuoted {
                            span,
                            name: name.into(),
                            value,
                        }
                    } else {
                        MarkupNode::AttrSingleQuoted {
                            span,
                            name: name.into(),
                            value,
                        }
                    }
                }
                _ => {
                    let value = self.attr_value(|rest| rest.starts_with(|c: char| c.is_whitespace() || c == '>'))?;
                    MarkupNode::AttrUnquoted {
                        span: Span::from_offsets(start, self.pos),
                        name: name.into(),
                        value,
                    }
                }
            };
            attributes.push(attr);
        }
    }

    fn attr_value(&mut self, at_end: impl Fn(&str) -> bool) -> Result<Vec<MarkupNode>> {
        let mut value = vec![];
        loop {
            let rest = self.rest();
            if rest.is_empty() {
                return err("unterminated attribute value", self.pos);
            } else if at_end(rest) {
                return Ok(value);
            } else if rest.starts_with("{{") {
                value.push(self.output()?);
            } else if rest.starts_with("{%") {
                let header = self.read_tag(self.pos)?;
                self.pos = header.span.end as usize;
                value.push(self.tag(header)?);
            } else {
                let start = self.pos;
                let mut end = start;
                while end < self.src.len() {
                    let rest = &self.src[end..];
                    if rest.starts_with("{{") || rest.starts_with("{%") || at_end(rest) {
                        break;
                    }
                    end += rest.chars().next().map_or(1, char::len_utf8);
                }
                self.pos = end;
                value.push(MarkupNode::TextNode {
                    span: Span::from_offsets(start, end),
                    value: self.src[start..end].into(),
                });
            }
        }
    }
}

/// The statements of a `liquid` tag, one per line.
struct Statements {
    headers: Vec<TagHeader>,
    idx: usize,
}

impl Statements {
    fn new(markup: &str, offset: usize) -> Self {
        let mut headers = vec![];
        let mut line_start = offset;
        for line in markup.split('\n') {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                let start = line_start + (line.len() - line.trim_start().len());
                headers.push(TagHeader::new(
                    Span::from_offsets(start, start + trimmed.len()),
                    line,
                    line_start,
                ));
            }
            line_start += line.len() + 1;
        }
        Self { headers, idx: 0 }
    }
}

impl TagSource for Statements {
    fn body(&mut self, stops: &[String]) -> Result<Vec<MarkupNode>> {
        let mut nodes = vec![];
        while let Some(header) = self.headers.get(self.idx).cloned() {
            if stops.contains(&header.name) {
                return Ok(nodes);
            }
            self.idx += 1;
            nodes.push(build_tag(self, header)?);
        }

        match stops.last() {
            None => Ok(nodes),
            Some(end) => err(
                format!("expected `{}`", end),
                self.headers.last().map_or(0, |h| h.span.end as usize),
            ),
        }
    }

    fn take_tag(&mut self) -> Result<TagHeader> {
        let header = match self.headers.get(self.idx) {
            Some(header) => header.clone(),
            None => return err("expected a statement", 0),
        };
        self.idx += 1;
        Ok(header)
    }
}

/// Parse the markup of a tag into nodes.
fn tag_markup(name: &str, markup: &str, offset: usize) -> Result<Vec<MarkupNode>> {
    if markup.is_empty() {
        return Ok(vec![]);
    }
    let mut p = ExprParser::new(markup, offset)?;
    let nodes = match name {
        "assign" => vec![p.assign()?],
        "echo" => vec![p.variable()?],
        "if" | "elsif" | "unless" => vec![p.condition()?],
        "case" | "section" | "layout" => vec![p.expression()?],
        "when" => p.when_values()?,
        "for" | "tablerow" => vec![p.for_markup()?],
        "render" | "include" => vec![p.render()?],
        "paginate" => vec![p.paginate()?],
        "form" | "cycle" => p.arguments()?,
        _ => return Ok(vec![]),
    };
    p.finish()?;
    Ok(nodes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokKind {
    Ident,
    Str,
    Num,
    Dot,
    DotDot,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Pipe,
    Colon,
    Comma,
    Comparator,
    Assign,
}

#[derive(Debug, Clone)]
struct Tok {
    kind: TokKind,
    /// The text of the token, strings without their quotes.
    text: String,
    span: Span,
}

fn lex_expr(src: &str, offset: usize) -> Result<Vec<Tok>> {
    let bytes = src.as_bytes();
    let mut toks = vec![];
    let mut i = 0;

    while i < src.len() {
        let c = bytes[i] as char;
        let start = i;
        let kind = match c {
            _ if c.is_whitespace() => {
                i += 1;
                continue;
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                while i < src.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'-') {
                    i += 1;
                }
                if i < src.len() && bytes[i] == b'?' {
                    i += 1;
                }
                TokKind::Ident
            }
            '\'' | '"' => {
                let close = match src[i + 1..].find(c) {
                    Some(idx) => i + 1 + idx,
                    None => return err("unterminated string", offset + i),
                };
                i = close + 1;
                toks.push(Tok {
                    kind: TokKind::Str,
                    text: src[start + 1..close].to_string(),
                    span: Span::from_offsets(offset + start, offset + i),
                });
                continue;
            }
            '0'..='9' | '-' => {
                i += 1;
                while i < src.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                if i + 1 < src.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit() {
                    i += 1;
                    while i < src.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                TokKind::Num
            }
            '.' if src[i..].starts_with("..") => {
                i += 2;
                TokKind::DotDot
            }
            '.' => {
                i += 1;
                TokKind::Dot
            }
            '=' | '!' | '<' | '>' => {
                let two = &src[i..(i + 2).min(src.len())];
                if matches!(two, "==" | "!=" | "<>" | "<=" | ">=") {
                    i += 2;
                    TokKind::Comparator
                } else if c == '=' {
                    i += 1;
                    TokKind::Assign
                } else if c == '!' {
                    return err("unexpected `!`", offset + i);
                } else {
                    i += 1;
                    TokKind::Comparator
                }
            }
            '[' | ']' | '(' | ')' | '|' | ':' | ',' => {
                i += 1;
                match c {
                    '[' => TokKind::LBracket,
                    ']' => TokKind::RBracket,
                    '(' => TokKind::LParen,
                    ')' => TokKind::RParen,
                    '|' => TokKind::Pipe,
                    ':' => TokKind::Colon,
                    _ => TokKind::Comma,
                }
            }
            _ => return err(format!("unexpected character `{}`", c), offset + i),
        };

        toks.push(Tok {
            kind,
            text: src[start..i].to_string(),
            span: Span::from_offsets(offset + start, offset + i),
        });
    }
    Ok(toks)
}

struct ExprParser {
    toks: Vec<Tok>,
    pos: usize,
    end: u32,
}

impl ExprParser {
    fn new(src: &str, offset: usize) -> Result<Self> {
        Ok(Self {
            toks: lex_expr(src, offset)?,
            pos: 0,
            end: (offset + src.len()) as u32,
        })
    }

    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokKind> {
        self.peek().map(|tok| tok.kind)
    }

    fn peek_ident(&self, text: &str) -> bool {
        self.peek()
            .map_or(false, |tok| tok.kind == TokKind::Ident && tok.text == text)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |tok| tok.span.start) as usize
    }

    fn bump(&mut self) -> Result<Tok> {
        match self.toks.get(self.pos).cloned() {
            Some(tok) => {
                self.pos += 1;
                Ok(tok)
            }
            None => err("unexpected end of markup", self.end as usize),
        }
    }

    fn expect(&mut self, kind: TokKind) -> Result<Tok> {
        match self.peek_kind() {
            Some(found) if found == kind => self.bump(),
            _ => err(format!("expected {:?}", kind), self.offset()),
        }
    }

    fn eat(&mut self, kind: TokKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn last_end(&self) -> u32 {
        self.toks[..self.pos].last().map_or(0, |tok| tok.span.end)
    }

    fn finish(&self) -> Result<()> {
        match self.peek() {
            Some(tok) => err(format!("unexpected `{}`", tok.text), tok.span.start as usize),
            None => Ok(()),
        }
    }

    fn expression(&mut self) -> Result<MarkupNode> {
        let tok = match self.peek() {
            Some(tok) => tok.clone(),
            None => return err("expected an expression", self.end as usize),
        };

        match tok.kind {
            TokKind::Str => {
                self.pos += 1;
                Ok(MarkupNode::String {
                    span: tok.span,
                    value: tok.text.into(),
                })
            }
            TokKind::Num => {
                self.pos += 1;
                Ok(MarkupNode::Number {
                    span: tok.span,
                    value: tok.text.into(),
                })
            }
            TokKind::LParen => {
                self.pos += 1;
                let start = self.expression()?;
                self.expect(TokKind::DotDot)?;
                let end = self.expression()?;
                let close = self.expect(TokKind::RParen)?;
                Ok(MarkupNode::Range {
                    span: tok.span.cover(close.span),
                    start: Box::new(start),
                    end: Box::new(end),
                })
            }
            TokKind::Ident
                if LITERALS.contains(&tok.text.as_str())
                    && !matches!(
                        self.toks.get(self.pos + 1).map(|t| t.kind),
                        Some(TokKind::Dot) | Some(TokKind::LBracket)
                    ) =>
            {
                self.pos += 1;
                Ok(MarkupNode::LiquidLiteral {
                    span: tok.span,
                    keyword: tok.text.into(),
                })
            }
            TokKind::Ident | TokKind::LBracket => self.lookup(),
            _ => err(format!("unexpected `{}`", tok.text), tok.span.start as usize),
        }
    }

    fn lookup(&mut self) -> Result<MarkupNode> {
        let start = self.offset() as u32;
        let name = if self.peek_kind() == Some(TokKind::Ident) {
            Some(SmolStr::new(self.bump()?.text))
        } else {
            None
        };

        let mut lookups = vec![];
        loop {
            if self.eat(TokKind::Dot) {
                let key = self.expect(TokKind::Ident)?;
                lookups.push(MarkupNode::String {
                    span: key.span,
                    value: key.text.into(),
                });
            } else if self.eat(TokKind::LBracket) {
                lookups.push(self.expression()?);
                self.expect(TokKind::RBracket)?;
            } else {
                break;
            }
        }

        Ok(MarkupNode::VariableLookup {
            span: Span::new(start, self.last_end()),
            name,
            lookups,
        })
    }

    fn comparison(&mut self) -> Result<MarkupNode> {
        let left = self.expression()?;
        if self.peek_kind() == Some(TokKind::Comparator) || self.peek_ident("contains") {
            let comparator = self.bump()?.text;
            let right = self.expression()?;
            return Ok(MarkupNode::Comparison {
                span: left.span_cover(&right),
                comparator: comparator.into(),
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn condition(&mut self) -> Result<MarkupNode> {
        let left = self.comparison()?;
        if self.peek_ident("and") || self.peek_ident("or") {
            let relation = self.bump()?.text;
            let right = self.condition()?;
            return Ok(MarkupNode::LogicalExpression {
                span: left.span_cover(&right),
                relation: relation.into(),
                left: Box::new(left),
                right: Box::new(right),
            });
        }
        Ok(left)
    }

    fn argument(&mut self) -> Result<MarkupNode> {
        let named = self.peek_kind() == Some(TokKind::Ident)
            && self.toks.get(self.pos + 1).map(|t| t.kind) == Some(TokKind::Colon);
        if !named {
            return self.expression();
        }

        let name = self.bump()?;
        self.bump()?;
        let value = self.expression()?;
        Ok(MarkupNode::NamedArgument {
            span: name.span.cover(value.span_of()),
            name: name.text.into(),
            value: Box::new(value),
        })
    }

    /// Comma separated arguments up to a pipe or the end of the markup.
    fn arguments(&mut self) -> Result<Vec<MarkupNode>> {
        let mut args = vec![];
        while !matches!(self.peek_kind(), None | Some(TokKind::Pipe)) {
            args.push(self.argument()?);
            if !self.eat(TokKind::Comma) {
                break;
            }
        }
        Ok(args)
    }

    fn variable(&mut self) -> Result<MarkupNode> {
        let expression = self.expression()?;
        let start = expression.span_of().start;

        let mut filters = vec![];
        while self.eat(TokKind::Pipe) {
            let name = self.expect(TokKind::Ident)?;
            let args = if self.eat(TokKind::Colon) {
                self.arguments()?
            } else {
                vec![]
            };
            filters.push(MarkupNode::LiquidFilter {
                span: Span::new(name.span.start, self.last_end()),
                name: name.text.into(),
                args,
            });
        }

        Ok(MarkupNode::LiquidVariable {
            span: Span::new(start, self.last_end()),
            expression: Box::new(expression),
            filters,
        })
    }

    fn assign(&mut self) -> Result<MarkupNode> {
        let name = self.expect(TokKind::Ident)?;
        self.expect(TokKind::Assign)?;
        let value = self.variable()?;
        Ok(MarkupNode::AssignMarkup {
            span: Span::new(name.span.start, self.last_end()),
            name: name.text.into(),
            value: Box::new(value),
        })
    }

    fn when_values(&mut self) -> Result<Vec<MarkupNode>> {
        let mut values = vec![self.expression()?];
        while self.eat(TokKind::Comma) || (self.peek_ident("or") && self.bump().is_ok()) {
            values.push(self.expression()?);
        }
        Ok(values)
    }

    /// Named arguments separated by whitespace or commas, such as `limit: 2 offset: 1`.
    fn named_arguments(&mut self) -> Result<Vec<MarkupNode>> {
        let mut args = vec![];
        loop {
            self.eat(TokKind::Comma);
            if self.peek().is_none() {
                return Ok(args);
            }
            args.push(self.argument()?);
        }
    }

    fn for_markup(&mut self) -> Result<MarkupNode> {
        let variable = self.expect(TokKind::Ident)?;
        if !self.peek_ident("in") {
            return err("expected `in`", self.offset());
        }
        self.bump()?;
        let collection = self.expression()?;
        let reversed = self.peek_ident("reversed") && self.bump().is_ok();
        let args = self.named_arguments()?;

        Ok(MarkupNode::ForMarkup {
            span: Span::new(variable.span.start, self.last_end()),
            variable_name: variable.text.into(),
            collection: Box::new(collection),
            reversed,
            args,
        })
    }

    fn render(&mut self) -> Result<MarkupNode> {
        let snippet = self.expression()?;
        let start = snippet.span_of().start;

        let variable = if self.peek_ident("with") || self.peek_ident("for") {
            self.bump()?;
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        let alias = if self.peek_ident("as") {
            self.bump()?;
            Some(SmolStr::new(self.expect(TokKind::Ident)?.text))
        } else {
            None
        };
        let args = self.named_arguments()?;

        Ok(MarkupNode::RenderMarkup {
            span: Span::new(start, self.last_end()),
            snippet: Box::new(snippet),
            variable,
            alias,
            args,
        })
    }

    fn paginate(&mut self) -> Result<MarkupNode> {
        let collection = self.expression()?;
        let start = collection.span_of().start;
        if !self.peek_ident("by") {
            return err("expected `by`", self.offset());
        }
        self.bump()?;
        let page_size = self.expression()?;
        let args = self.named_arguments()?;

        Ok(MarkupNode::PaginateMarkup {
            span: Span::new(start, self.last_end()),
            collection: Box::new(collection),
            page_size: Box::new(page_size),
            args,
        })
    }
}

trait SpanExt {
    fn span_of(&self) -> Span;
    fn span_cover(&self, other: &MarkupNode) -> Span;
}

impl SpanExt for MarkupNode {
    fn span_of(&self) -> Span {
        themecheck_syntax::SyntaxNode::span(self)
    }

    fn span_cover(&self, other: &MarkupNode) -> Span {
        self.span_of().cover(other.span_of())
    }
}

struct JsonParser<'s> {
    src: &'s str,
    pos: usize,
}

impl JsonParser<'_> {
    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn expect(&mut self, c: char) -> Result<()> {
        match self.peek() {
            Some(found) if found == c => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => err(format!("expected `{}`, found `{}`", c, found), self.pos),
            None => err(format!("expected `{}`, found the end of the file", c), self.pos),
        }
    }

    fn value(&mut self) -> Result<JsonNode> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some('{') => self.object(),
            Some('[') => self.array(),
            Some('"') => {
                let value = self.string()?;
                Ok(JsonNode::Literal {
                    span: Span::from_offsets(start, self.pos),
                    value: JsonLiteral::String(value),
                })
            }
            Some(c) if c == '-' || c.is_ascii_digit() => {
                let len = self.src[start..]
                    .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
                    .unwrap_or(self.src.len() - start);
                self.pos += len;
                Ok(JsonNode::Literal {
                    span: Span::from_offsets(start, self.pos),
                    value: JsonLiteral::Number(self.src[start..self.pos].into()),
                })
            }
            Some(_) => {
                let rest = &self.src[start..];
                let (len, value) = if rest.starts_with("true") {
                    (4, JsonLiteral::Bool(true))
                } else if rest.starts_with("false") {
                    (5, JsonLiteral::Bool(false))
                } else if rest.starts_with("null") {
                    (4, JsonLiteral::Null)
                } else {
                    return err("expected a JSON value", start);
                };
                self.pos += len;
                Ok(JsonNode::Literal {
                    span: Span::from_offsets(start, self.pos),
                    value,
                })
            }
            None => err("expected a JSON value, found the end of the file", start),
        }
    }

    fn string(&mut self) -> Result<SmolStr> {
        let start = self.pos;
        self.expect('"')?;
        let mut value = String::new();
        let mut chars = self.src[self.pos..].char_indices();
        while let Some((idx, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += idx + 1;
                    return Ok(value.into());
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, 'r')) => value.push('\r'),
                    Some((_, 'u')) => {
                        let hex: String = chars.by_ref().take(4).map(|(_, c)| c).collect();
                        match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                            Some(c) => value.push(c),
                            None => return err("invalid unicode escape", start),
                        }
                    }
                    Some((_, c)) => value.push(c),
                    None => break,
                },
                c => value.push(c),
            }
        }
        err("unterminated string", start)
    }

    fn object(&mut self) -> Result<JsonNode> {
        let start = self.pos;
        self.expect('{')?;
        let mut children = vec![];
        self.skip_ws();
        if self.peek() == Some('}') {
            self.pos += 1;
            return Ok(JsonNode::Object {
                span: Span::from_offsets(start, self.pos),
                children,
            });
        }

        loop {
            self.skip_ws();
            let key_start = self.pos;
            let key = self.string()?;
            let key = JsonNode::Identifier {
                span: Span::from_offsets(key_start, self.pos),
                value: key,
            };
            self.skip_ws();
            self.expect(':')?;
            let value = self.value()?;
            children.push(JsonNode::Property {
                span: Span::from_offsets(key_start, self.pos),
                key: Box::new(key),
                value: Box::new(value),
            });

            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some('}') => {
                    self.pos += 1;
                    return Ok(JsonNode::Object {
                        span: Span::from_offsets(start, self.pos),
                        children,
                    });
                }
                _ => return err("expected `,` or `}`", self.pos),
            }
        }
    }

    fn array(&mut self) -> Result<JsonNode> {
        let start = self.pos;
        self.expect('[')?;
        let mut children = vec![];
        self.skip_ws();
        if self.peek() == Some(']') {
            self.pos += 1;
            return Ok(JsonNode::Array {
                span: Span::from_offsets(start, self.pos),
                children,
            });
        }

        loop {
            children.push(self.value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(JsonNode::Array {
                        span: Span::from_offsets(start, self.pos),
                        children,
                    });
                }
                _ => return err("expected `,` or `]`", self.pos),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use themecheck_syntax::{MarkupKind, SyntaxNode};

    fn kinds(node: &MarkupNode) -> Vec<MarkupKind> {
        crate::visit::descendants(node).iter().map(|n| n.kind()).collect()
    }

    #[test]
    fn spans_of_outputs_and_lookups() {
        let tree = parse_markup("a {{ product.title | upcase }}").unwrap();
        let output = tree.children()[1];
        assert_eq!(output.span(), Span::new(2, 30));

        let lookup = crate::visit::descendants(output)
            .into_iter()
            .find(|n| n.kind() == MarkupKind::VariableLookup)
            .unwrap();
        assert_eq!(lookup.span(), Span::new(5, 18));
        assert_eq!(lookup.name(), Some("product"));
    }

    #[test]
    fn branched_blocks() {
        let src = "{% if a %}x{% elsif b %}y{% else %}z{% endif %}";
        let tree = parse_markup(src).unwrap();
        let tag = tree.children()[0];

        match tag {
            MarkupNode::LiquidTag {
                children: Some(branches),
                block_end,
                span,
                ..
            } => {
                assert_eq!(*span, Span::from_offsets(0, src.len()));
                assert_eq!(*block_end, Some(Span::new(36, 47)));
                let names: Vec<_> = branches.iter().map(|b| b.name()).collect();
                assert_eq!(names, vec![None, Some("elsif"), Some("else")]);
            }
            other => panic!("expected a block tag, found {:?}", other),
        }
    }

    #[test]
    fn liquid_tag_statements() {
        let src = "{% liquid\n  assign x = 1\n  for i in (1..x)\n    echo i\n  endfor\n%}";
        let tree = parse_markup(src).unwrap();
        let tag = tree.children()[0];
        let statements: Vec<_> = tag.children().iter().filter_map(|n| n.name().map(str::to_string)).collect();
        assert_eq!(statements, vec!["assign", "for"]);
        assert!(kinds(&tree).contains(&MarkupKind::Range));
    }

    #[test]
    fn elements_and_attributes() {
        let tree = parse_markup("<img src=\"{{ a }}\" alt='x' hidden><script src=x>var a;</script>").unwrap();
        let kinds: Vec<_> = tree.children().iter().map(|n| n.kind()).collect();
        assert_eq!(kinds, vec![MarkupKind::HtmlVoidElement, MarkupKind::HtmlRawNode]);

        let img = tree.children()[0];
        assert_eq!(img.attribute("alt").and_then(|a| a.attribute_text()), Some("x".into()));
        assert_eq!(img.attribute("hidden").map(|a| a.kind()), Some(MarkupKind::AttrEmpty));
        assert_eq!(img.attribute("src").and_then(|a| a.attribute_text()), None);
    }

    #[test]
    fn raw_tags_keep_their_body() {
        let tree = parse_markup("{% comment %}{{ x }}{% endcomment %}").unwrap();
        assert_eq!(tree.children()[0].comment_text(), Some("{{ x }}"));
    }

    #[test]
    fn unclosed_blocks_fail() {
        assert!(parse_markup("{% if a %}").is_err());
        assert!(parse_markup("<div>").is_err());
        assert!(parse_markup("</div>").is_err());
    }

    #[test]
    fn json_keys_include_quotes() {
        let tree = parse_json(r#"{"a": [1, true], "b": {"c": null}}"#).unwrap();
        let key = tree.children()[1].children()[0];
        assert_eq!(key.span(), Span::new(17, 20));
        assert_eq!(parse_json("{").unwrap_err().offset, Some(1));
    }
}
