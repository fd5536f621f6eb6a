use super::lexer::{Lexer, TokenKind};
use smol_str::SmolStr;

pub const DISABLE: &str = "theme-check-disable";
pub const ENABLE: &str = "theme-check-enable";
pub const DISABLE_NEXT_LINE: &str = "theme-check-disable-next-line";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Disable,
    Enable,
    DisableNextLine,
}

impl Command {
    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            DISABLE => Command::Disable,
            ENABLE => Command::Enable,
            DISABLE_NEXT_LINE => Command::DisableNextLine,
            _ => return None,
        })
    }
}

/// A directive parsed out of the text of a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub command: Command,
    /// The codes the directive applies to, all checks if empty.
    pub codes: Vec<SmolStr>,
}

/// Parse the text of a comment into a directive.
///
/// The keyword must be the first word of the comment. It may be followed by check
/// codes separated by commas or whitespace, and then by `--` and a free form note.
/// Anything that is not a word ends the code list.
pub fn parse_directive(text: &str) -> Option<Directive> {
    let mut lexer = Lexer::new(text);
    let first = lexer.next().filter(|tok| tok.kind == TokenKind::Word)?;
    let command = Command::from_keyword(&text[first.range])?;

    let mut codes = vec![];
    for tok in lexer {
        match tok.kind {
            TokenKind::Word => codes.push(SmolStr::new(&text[tok.range])),
            TokenKind::Comma | TokenKind::Whitespace => {}
            TokenKind::Separator | TokenKind::Unknown => break,
        }
    }

    Some(Directive { command, codes })
}
