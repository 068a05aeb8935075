//! Small helper APIs for working with `Token` / `TokenKind`.
//!
//! These helpers exist to reduce repetitive `matches!(...)` at call sites and to make it easy
//! to work with ID-based tokens.

use crate::lexer::{Token, TokenKind};
use kpl_core::lang::contextual::{self, ContextualId};
use kpl_core::lang::keywords::KeywordId;
use kpl_core::lang::operators::{self, OperatorId, Precedence};
use kpl_core::lang::punctuation::PunctuationId;

impl TokenKind {
    /// Return the keyword id, if this is a keyword token.
    pub fn keyword_id(&self) -> Option<KeywordId> {
        match self {
            TokenKind::Keyword(id) => Some(*id),
            _ => None,
        }
    }

    /// Return `true` if this is the given keyword.
    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    /// Return the punctuation id, if this is a punctuation token.
    pub fn punctuation_id(&self) -> Option<PunctuationId> {
        match self {
            TokenKind::Punctuation(id) => Some(*id),
            _ => None,
        }
    }

    /// Return `true` if this is the given punctuation.
    pub fn is_punctuation(&self, id: PunctuationId) -> bool {
        matches!(self, TokenKind::Punctuation(p) if *p == id)
    }

    /// Return the operator spelling, if this is an operator token.
    pub fn operator_spelling(&self) -> Option<&str> {
        match self {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    /// Return the registry id for operators with a dedicated tier.
    pub fn operator_id(&self) -> Option<OperatorId> {
        self.operator_spelling().and_then(operators::from_str)
    }

    /// Return `true` if this is an operator with the given spelling.
    pub fn is_operator(&self, spelling: &str) -> bool {
        self.operator_spelling() == Some(spelling)
    }

    /// The tier this token binds at when it appears between two operands.
    pub fn binary_precedence(&self) -> Option<Precedence> {
        self.operator_spelling().map(operators::binary_precedence)
    }

    /// Return the identifier spelling, if this is an identifier token.
    pub fn ident(&self) -> Option<&str> {
        match self {
            TokenKind::Ident(name) => Some(name),
            _ => None,
        }
    }

    /// Return `true` if this is an identifier spelled like the given contextual word.
    pub fn is_contextual(&self, id: ContextualId) -> bool {
        self.ident().is_some_and(|name| name == contextual::as_str(id))
    }
}

impl Token {
    /// Convenience wrapper for `self.kind.keyword_id()`.
    pub fn keyword_id(&self) -> Option<KeywordId> {
        self.kind.keyword_id()
    }

    /// Convenience wrapper for `self.kind.punctuation_id()`.
    pub fn punctuation_id(&self) -> Option<PunctuationId> {
        self.kind.punctuation_id()
    }

    /// Convenience wrapper for `self.kind.operator_id()`.
    pub fn operator_id(&self) -> Option<OperatorId> {
        self.kind.operator_id()
    }
}
