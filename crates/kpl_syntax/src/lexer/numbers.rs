//! Numeric literal scanning: `\d+` integers and `\d+\.\d+` doubles.

use super::{Lexer, Token, TokenKind};
use crate::ast::Span;
use crate::diagnostics::Diagnostic;

impl Lexer<'_> {
    /// Scan a number whose first digit has already been consumed.
    pub(super) fn scan_number(&mut self, start: usize) -> Result<Token, Diagnostic> {
        self.eat_digits();

        // `1.5` is a double; `1.foo` is an integer followed by `.`
        let is_double = self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if is_double {
            self.advance();
            self.eat_digits();
        }

        let text = &self.source[start..self.pos];
        let span = Span::new(start, self.pos);
        if is_double {
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(self.token(TokenKind::Double(value), start)),
                _ => Err(Diagnostic::lexical(format!("Double literal '{text}' is out of range"), span)),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Ok(self.token(TokenKind::Int(value), start)),
                Err(_) => Err(Diagnostic::lexical(format!("Integer literal '{text}' is out of range"), span)
                    .with_note(format!("the largest integer literal is {}", i64::MAX))),
            }
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }
}
