//! Token types for the KPL lexer.
//!
//! The lexer uses **registry-backed IDs** for fixed vocabulary:
//! - `Keyword(KeywordId)` for reserved words
//! - `Punctuation(PunctuationId)` for delimiters, separators and `=`
//!
//! Operators keep their spelling because the operator set is open: any run of operator characters is one token.
//!
//! ## Notes
//! - Use `crate::token_helpers` for ergonomic token matching at call sites.

use std::fmt;

use crate::ast::Span;
use kpl_core::lang::keywords::{self, KeywordId};
use kpl_core::lang::punctuation::{self, PunctuationId};

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ========== Keyword / punctuation (ID-based) ==========
    Keyword(KeywordId),
    Punctuation(PunctuationId),
    Operator(String),

    // ========== Identifiers and Literals ==========
    Ident(String),
    Int(i64),
    Double(f64),
    Char(char),
    String(String),

    // ========== Special ==========
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(id) => write!(f, "keyword '{}'", keywords::as_str(*id)),
            TokenKind::Punctuation(id) => write!(f, "'{}'", punctuation::as_str(*id)),
            TokenKind::Operator(op) => write!(f, "operator '{op}'"),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Int(v) => write!(f, "integer {v}"),
            TokenKind::Double(v) => write!(f, "double {v}"),
            TokenKind::Char(c) => write!(f, "character '{c}'"),
            TokenKind::String(_) => write!(f, "string literal"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its kind, exact source slice, and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    /// Construct a new token.
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }
}

/// Resolve an identifier spelling to a keyword id, if reserved.
pub fn keyword_id(name: &str) -> Option<KeywordId> {
    keywords::from_str(name)
}
