use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of letters, digits, `_` and single `-`. A word ends before `--`.
    Word,
    Comma,
    /// `--`, everything after it is a free form note.
    Separator,
    Whitespace,
    /// Any other character.
    Unknown,
}

/// A token of a directive comment, with a range relative to the comment text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: Range<usize>,
}

pub struct Lexer<'source> {
    src: &'source str,
    cur: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl<'source> Lexer<'source> {
    pub fn new(src: &'source str) -> Self {
        Self { src, cur: 0 }
    }

    pub fn source_of(&self, tok: &Token) -> &'source str {
        &self.src[tok.range.clone()]
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> usize {
        let rest = &self.src[self.cur..];
        let len = rest
            .char_indices()
            .find(|(_, c)| !pred(*c))
            .map_or(rest.len(), |(idx, _)| idx);
        self.cur += len;
        len
    }

    fn eat_word(&mut self) {
        while let Some(c) = self.src[self.cur..].chars().next() {
            if !is_word_char(c) || self.src[self.cur..].starts_with("--") {
                break;
            }
            self.cur += c.len_utf8();
        }
    }

    fn lex_token(&mut self) -> Option<Token> {
        let start = self.cur;
        let c = self.src[start..].chars().next()?;

        let kind = if self.src[start..].starts_with("--") {
            self.cur += 2;
            TokenKind::Separator
        } else if c.is_whitespace() {
            self.eat_while(char::is_whitespace);
            TokenKind::Whitespace
        } else if c == ',' {
            self.cur += 1;
            TokenKind::Comma
        } else if is_word_char(c) {
            self.eat_word();
            TokenKind::Word
        } else {
            self.cur += c.len_utf8();
            TokenKind::Unknown
        };

        Some(Token {
            kind,
            range: start..self.cur,
        })
    }
}

/// Yields every token except whitespace.
impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let tok = self.lex_token()?;
            if tok.kind != TokenKind::Whitespace {
                return Some(tok);
            }
        }
    }
}
