#![forbid(unsafe_code)]
//! KPL syntactic front end
//!
//! This crate ties the front end together: the lexer and parser live in [`kpl_syntax`], the shared vocabulary in
//! [`kpl_core`], and this crate adds the pretty-printer and the `kpl` command-line driver.
//!
//! ## Panic Policy
//!
//! This codebase follows explicit error handling:
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **True invariants**: If a panic represents a front-end bug (logic error), use `.expect("INVARIANT: reason")` with
//!   a clear explanation.

pub mod cli;
pub mod format;

pub use kpl_syntax::{ast, diagnostics, lexer, parser};

pub use format::{
    FormatConfig, FormatError, check_formatted, format_diff, format_expr, format_source, format_source_with_config,
    format_unit,
};
