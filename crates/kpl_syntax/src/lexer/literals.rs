//! String and character literal scanning.
//!
//! Strings are double-quoted with backslash escapes. A character literal is exactly one ASCII letter between single
//! quotes (`'a'`).

use super::{Lexer, Token, TokenKind};
use crate::ast::Span;
use crate::diagnostics::Diagnostic;

impl Lexer<'_> {
    /// Scan a string whose opening `"` has already been consumed.
    pub(super) fn scan_string(&mut self, start: usize) -> Result<Token, Diagnostic> {
        let mut value = String::new();
        let mut bad_escape: Option<Diagnostic> = None;

        loop {
            let Some(c) = self.advance() else {
                return Err(Diagnostic::lexical("Unterminated string literal", Span::new(start, self.pos))
                    .with_hint("Close the string with '\"'"));
            };
            match c {
                '"' => break,
                '\\' => {
                    let escape_start = self.pos - 1;
                    match self.advance() {
                        Some(e) => match unescape(e) {
                            Some(ch) => value.push(ch),
                            None => {
                                bad_escape.get_or_insert_with(|| {
                                    Diagnostic::lexical(
                                        format!("Unknown escape sequence '\\{}'", e.escape_debug()),
                                        Span::new(escape_start, self.pos),
                                    )
                                    .with_hint("Supported escapes are \\n \\t \\r \\0 \\\\ \\\" \\'")
                                });
                            }
                        },
                        None => continue,
                    }
                }
                _ => value.push(c),
            }
        }

        match bad_escape {
            Some(error) => Err(error),
            None => Ok(self.token(TokenKind::String(value), start)),
        }
    }

    /// Scan a character literal whose opening `'` has already been consumed.
    pub(super) fn scan_char(&mut self, start: usize) -> Result<Token, Diagnostic> {
        let body_start = self.pos;
        while let Some(c) = self.peek() {
            if c == '\'' || c == '\n' {
                break;
            }
            self.advance();
        }
        let body = &self.source[body_start..self.pos];
        if self.peek() != Some('\'') {
            return Err(Diagnostic::lexical("Unterminated character literal", Span::new(start, self.pos)));
        }
        self.advance();

        let mut chars = body.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => Ok(self.token(TokenKind::Char(c), start)),
            _ => Err(Diagnostic::lexical(
                format!("Invalid character literal '{body}'"),
                Span::new(start, self.pos),
            )
            .with_note("a character literal is exactly one letter, e.g. 'a'")),
        }
    }
}

fn unescape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        '\\' => Some('\\'),
        '"' => Some('"'),
        '\'' => Some('\''),
        _ => None,
    }
}

/// Quote a string value so that [`Lexer`] reads it back unchanged.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
