//! Canonical language vocabulary for the KPL front end.
//!
//! This crate is intentionally small and dependency-free. It holds the registries that the lexer, parser,
//! pretty-printer and diagnostics all agree on: reserved keywords, operator spellings with their precedence tiers,
//! punctuation, and the handful of contextual words that only carry meaning in one grammatical position.
//!
//! ## Notes
//!
//! - **No IO**, no global state, no AST types.
//! - Syntax rules live in `kpl_syntax`; this crate only answers "what is this spelling?".

pub mod lang;
