//! Diagnostics produced by the KPL lexer and parser.
//!
//! A [`Diagnostic`] carries a severity, a taxonomy [`ErrorKind`], a message, and a source span, plus optional notes
//! and hints. The type implements [`miette::Diagnostic`], so callers that own the source text can render it with
//! labels and context:
//!
//! ```rust
//! use kpl_syntax::diagnostics::render;
//!
//! let source = "code Foo ? endCode";
//! let (_, diagnostics) = kpl_syntax::parse(source);
//! let report = render("foo.kpl", source, &diagnostics[0]);
//! assert!(report.contains("foo.kpl"));
//! ```

use std::fmt;

use miette::{GraphicalReportHandler, GraphicalTheme, LabeledSpan, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::ast::Span;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Warning,
    Error,
}

/// Which layer rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A character that starts no token, or a malformed literal.
    Lexical,
    /// An expected token or rule was not found (including a missing closing keyword).
    Syntax,
    /// A unit or declaration is missing a required clause, or appears where it is not allowed.
    Structural,
    /// The nesting ceiling was hit; the parse was aborted.
    DepthExceeded,
}

impl ErrorKind {
    /// Stable diagnostic code, e.g. `kpl::syntax`.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Lexical => "kpl::lexical",
            ErrorKind::Syntax => "kpl::syntax",
            ErrorKind::Structural => "kpl::structural",
            ErrorKind::DepthExceeded => "kpl::depth_exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Lexical => write!(f, "lexical error"),
            ErrorKind::Syntax => write!(f, "syntax error"),
            ErrorKind::Structural => write!(f, "structural error"),
            ErrorKind::DepthExceeded => write!(f, "nesting too deep"),
        }
    }
}

/// A located message from the front end.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: ErrorKind,
    pub message: String,
    pub span: Span,
    pub notes: Vec<String>,
    pub hints: Vec<String>,
    /// Secondary locations, e.g. the opener of a block whose closer is missing.
    pub related: Vec<(Span, String)>,
}

impl Diagnostic {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            message: message.into(),
            span,
            notes: Vec::new(),
            hints: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn lexical(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Lexical, message, span)
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Syntax, message, span)
    }

    pub fn structural(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Structural, message, span)
    }

    pub fn depth_exceeded(limit: usize, span: Span) -> Self {
        Self::new(
            ErrorKind::DepthExceeded,
            format!("Nesting exceeds the maximum depth of {limit}"),
            span,
        )
        .with_hint("Split deeply nested expressions or statements into smaller pieces")
    }

    /// Downgrade to a warning.
    pub fn warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    pub fn with_related(mut self, span: Span, label: impl Into<String>) -> Self {
        self.related.push((span, label.into()));
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

impl miette::Diagnostic for Diagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        if self.notes.is_empty() && self.hints.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .notes
            .iter()
            .map(|n| format!("note: {n}"))
            .chain(self.hints.iter().map(|h| format!("hint: {h}")))
            .collect();
        Some(Box::new(lines.join("\n")))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let primary = LabeledSpan::new_primary_with_span(Some(self.kind.to_string()), self.span);
        let related = self
            .related
            .iter()
            .map(|(span, label)| LabeledSpan::new_with_span(Some(label.clone()), *span));
        Some(Box::new(std::iter::once(primary).chain(related)))
    }
}

/// Whether any diagnostic in the list is error-severity.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Render one diagnostic against its source text using miette's graphical handler (no colors).
pub fn render(file_name: &str, source: &str, diagnostic: &Diagnostic) -> String {
    let report = Report::new(diagnostic.clone()).with_source_code(NamedSource::new(file_name, source.to_string()));
    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut out = String::new();
    if handler.render_report(&mut out, &*report).is_err() {
        return format!("{}: {}", diagnostic.kind, diagnostic.message);
    }
    out
}

/// Get 1-based line and column numbers for a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let mut line = 1;
    let mut line_start = 0;
    for (i, c) in source.char_indices() {
        if i >= offset {
            break;
        }
        if c == '\n' {
            line += 1;
            line_start = i + 1;
        }
    }
    (line, offset - line_start + 1)
}
