//! KPL language vocabulary registries.
//!
//! Callers work with **stable IDs** (e.g. `KeywordId`, `OperatorId`) and look up spellings/metadata via registry
//! tables instead of comparing strings throughout the parser.
//!
//! ## Examples
//! ```rust
//! use kpl_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("endWhile"), Some(KeywordId::EndWhile));
//! assert_eq!(keywords::as_str(KeywordId::EndWhile), "endWhile");
//! ```

pub mod contextual;
pub mod keywords;
pub mod operators;
pub mod punctuation;
