//! KPL Code Formatter
//!
//! This module provides code formatting functionality for KPL source files:
//! - 4-space indentation for block bodies and declaration groups
//! - Unit contents start at column 0, separated by blank lines
//! - Minimal parentheses, derived from the precedence tiers in the tree
//!
//! Formatting is structure-preserving: parsing the output yields a tree equal to the input tree.

mod config;
mod formatter;
mod writer;

pub use config::FormatConfig;
pub use formatter::Formatter;

use kpl_syntax::ast::{Expr, Spanned, Unit};
use kpl_syntax::diagnostics::Diagnostic;
use kpl_syntax::{ParserConfig, parse_with_config};
use thiserror::Error;

/// Why a source file could not be formatted.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum FormatError {
    /// The source has error-severity diagnostics; warnings do not block formatting.
    #[error("cannot format source with {} syntax error(s)", .errors.len())]
    #[diagnostic(code(kpl::format::syntax), help("fix the reported errors, then format again"))]
    Syntax {
        #[related]
        errors: Vec<Diagnostic>,
    },
}

/// Format a parsed unit with default settings.
pub fn format_unit(unit: &Unit) -> String {
    Formatter::new(FormatConfig::default()).format(unit)
}

/// Format a single expression.
///
/// ```rust
/// let expr = kpl_syntax::parse_expression("(a+b)*c").unwrap();
/// assert_eq!(kpl::format::format_expr(&expr), "(a + b) * c");
/// ```
pub fn format_expr(expr: &Spanned<Expr>) -> String {
    Formatter::new(FormatConfig::default()).format_expression(&expr.node)
}

/// Format KPL source code with default settings
pub fn format_source(source: &str) -> Result<String, FormatError> {
    format_source_with_config(source, FormatConfig::default())
}

/// Format KPL source code with custom configuration
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn format_source_with_config(source: &str, config: FormatConfig) -> Result<String, FormatError> {
    let (unit, diagnostics) = parse_with_config(source, &ParserConfig::default());
    let errors: Vec<Diagnostic> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "refusing to format");
        return Err(FormatError::Syntax { errors });
    }

    let formatter = Formatter::new(config);
    Ok(formatter.format(&unit))
}

/// Check if source code is already formatted
pub fn check_formatted(source: &str) -> Result<bool, FormatError> {
    let formatted = format_source(source)?;
    Ok(source == formatted)
}

/// Get the diff between original and formatted source
pub fn format_diff(source: &str) -> Result<Option<String>, FormatError> {
    let formatted = format_source(source)?;

    if source == formatted {
        return Ok(None);
    }

    // Simple line-by-line diff
    let mut diff = String::new();
    let original_lines: Vec<&str> = source.lines().collect();
    let formatted_lines: Vec<&str> = formatted.lines().collect();

    let max_lines = original_lines.len().max(formatted_lines.len());

    for i in 0..max_lines {
        let orig = original_lines.get(i).copied().unwrap_or("");
        let fmt = formatted_lines.get(i).copied().unwrap_or("");

        if orig != fmt {
            if !orig.is_empty() {
                diff.push_str(&format!("-{:4} | {}\n", i + 1, orig));
            }
            if !fmt.is_empty() {
                diff.push_str(&format!("+{:4} | {}\n", i + 1, fmt));
            }
        }
    }

    Ok(Some(diff))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSY: &str = "code Foo function f(a:int) returns int return a*(b+c) endFunction endCode";

    // ========================================
    // format_source tests
    // ========================================

    #[test]
    fn test_format_source_simple_function() {
        let formatted = format_source(MESSY).unwrap();
        assert_eq!(
            formatted,
            "code Foo\n\nfunction f(a: int) returns int\n    return a * (b + c)\nendFunction\n\nendCode\n"
        );
    }

    #[test]
    fn test_format_source_empty_unit() {
        assert_eq!(format_source("code Foo endCode").unwrap(), "code Foo\nendCode\n");
    }

    #[test]
    fn test_format_source_invalid_syntax() {
        let err = format_source("code Foo function f( endCode").unwrap_err();
        let FormatError::Syntax { errors } = &err;
        assert!(!errors.is_empty());
        assert!(err.to_string().starts_with("cannot format source with"));
    }

    #[test]
    fn test_format_source_allows_warnings() {
        let source = "header Foo uses Bar, Bar endHeader";
        assert_eq!(format_source(source).unwrap(), "header Foo\nuses Bar, Bar\nendHeader\n");
    }

    // ========================================
    // format_source_with_config tests
    // ========================================

    #[test]
    fn test_format_source_with_custom_config() {
        let config = FormatConfig::new().with_indent_width(2).with_blank_lines_top_level(0);
        let formatted = format_source_with_config(MESSY, config).unwrap();
        assert_eq!(
            formatted,
            "code Foo\nfunction f(a: int) returns int\n  return a * (b + c)\nendFunction\nendCode\n"
        );
    }

    // ========================================
    // check_formatted tests
    // ========================================

    #[test]
    fn test_check_formatted() {
        assert!(!check_formatted(MESSY).unwrap());
        let formatted = format_source(MESSY).unwrap();
        assert!(check_formatted(&formatted).unwrap());
    }

    #[test]
    fn test_check_formatted_invalid_syntax() {
        assert!(check_formatted("code").is_err());
    }

    // ========================================
    // format_diff tests
    // ========================================

    #[test]
    fn test_format_diff_no_changes() {
        assert_eq!(format_diff("code Foo\nendCode\n").unwrap(), None);
    }

    #[test]
    fn test_format_diff_returns_diff() {
        let diff = format_diff("code   Foo\nendCode\n").unwrap().unwrap();
        assert_eq!(diff, "-   1 | code   Foo\n+   1 | code Foo\n");
    }

    #[test]
    fn test_format_unit_matches_format_source() {
        let (unit, diagnostics) = kpl_syntax::parse(MESSY);
        assert!(diagnostics.is_empty());
        assert_eq!(format_unit(&unit), format_source(MESSY).unwrap());
    }
}
