//! Syntactic front end for KPL: lexer, parser, AST, diagnostics.
//!
//! The crate turns one translation unit of KPL source text into a typed syntax tree. It is "syntax-only": no name
//! resolution, no type checking, no lowering.
//!
//! ## Notes
//! - Vocabulary identity (keywords/operators/punctuation) comes from `kpl_core::lang` registries.
//! - [`parse`] never fails for the caller: it always returns a (possibly partial) [`ast::Unit`] plus the ordered list
//!   of diagnostics produced while lexing and parsing.
//! - Each parse owns all of its state, so independent units can be parsed on independent threads.
//!
//! ## Examples
//! ```rust
//! use kpl_syntax::ast::Unit;
//!
//! let (unit, diagnostics) = kpl_syntax::parse("header Foo uses Bar endHeader");
//! assert!(diagnostics.is_empty());
//! let Unit::Header(header) = unit else { panic!("expected a header unit") };
//! assert_eq!(header.name.node, "Foo");
//! assert_eq!(header.imports.len(), 1);
//! ```

pub mod ast;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod token_helpers;

pub use parser::{ParserConfig, parse, parse_expression, parse_statements, parse_tokens, parse_with_config};
