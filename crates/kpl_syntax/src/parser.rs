//! Parser for KPL
//!
//! Converts a token stream into a [`Unit`] by recursive descent: one function per grammar rule, with the thirteen
//! expression tiers handled by a single tier-indexed binary routine.
//!
//! ## Examples
//!
//! ```rust
//! use kpl_syntax::ast::Unit;
//!
//! let source = "code Foo function f() debug endFunction endCode";
//! let (unit, diagnostics) = kpl_syntax::parse(source);
//! assert!(diagnostics.is_empty());
//! assert!(matches!(unit, Unit::Code(_)));
//! assert_eq!(unit.declarations().len(), 1);
//! ```

use crate::ast::*;
use crate::diagnostics::Diagnostic;
use crate::lexer::{self, Token, TokenKind};
use kpl_core::lang::contextual::ContextualId;
use kpl_core::lang::keywords::{self, KeywordId};
use kpl_core::lang::operators::{self, Precedence};
use kpl_core::lang::punctuation::PunctuationId;

// NOTE: This module is split across multiple files using `include!` to keep all parser
// methods in the same Rust module (preserving privacy + call patterns) while avoiding
// a single large source file.

include!("parser/core.rs");
include!("parser/helpers.rs");
include!("parser/decl.rs");
include!("parser/types.rs");
include!("parser/stmts.rs");
include!("parser/expr.rs");
include!("parser/util.rs");
include!("parser/api.rs");
include!("parser/tests.rs");
