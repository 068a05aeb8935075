/// Parser core types and entrypoint.
///
/// This chunk defines [`ParserConfig`], the [`Parser`] type, and the top-level `parse_unit()` entrypoint.
///
/// ## Notes
/// - This file is `include!`'d into `crate::parser` to keep all parser methods in a
///   single module while avoiding a single “god file”.
/// Default nesting ceiling shared by expressions, types, and statements.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Knobs for a single parse.
///
/// ## Examples
/// ```rust
/// use kpl_syntax::ParserConfig;
///
/// let config = ParserConfig::default().with_max_depth(16);
/// let (_, diagnostics) = kpl_syntax::parse_with_config("code A endCode", &config);
/// assert!(diagnostics.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// How many nested expressions, types, and statements may be open at once before the parse is aborted.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// Parser state.
///
/// ## Notes
/// - Single pass. Recoverable errors are recorded and parsing resumes at the next statement or declaration
///   boundary, so one run reports as many problems as possible.
/// - Exceeding the nesting ceiling sets `aborted`; from then on every recovery point re-raises instead of
///   resuming, and the unit produced so far is returned.
/// - The token slice must end with [`TokenKind::Eof`] (as produced by the lexer); [`parse_tokens`] ensures this.
pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    config: ParserConfig,
    depth: usize,
    aborted: bool,
}

impl<'a> Parser<'a> {
    /// Create a new parser for a token stream.
    ///
    /// ## Parameters
    /// - `tokens`: Token stream produced by `kpl_syntax::lexer`.
    /// - `config`: Limits for this parse.
    pub fn new(tokens: &'a [Token], config: ParserConfig) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            config,
            depth: 0,
            aborted: false,
        }
    }

    /// Parse the entire token stream as one unit.
    ///
    /// Always yields a unit; it is partial when errors were reported.
    pub fn parse_unit(mut self) -> (Unit, Vec<Diagnostic>) {
        let unit = self.unit();
        tracing::debug!(
            diagnostics = self.diagnostics.len(),
            aborted = self.aborted,
            "parsed unit"
        );
        (unit, self.diagnostics)
    }
}
