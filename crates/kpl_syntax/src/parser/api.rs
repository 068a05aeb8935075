/// Parse a source string as one unit with the default [`ParserConfig`].
///
/// Never fails: the result is always a (possibly partial) unit together with every lexical and syntactic
/// diagnostic, in source order.
pub fn parse(source: &str) -> (Unit, Vec<Diagnostic>) {
    parse_with_config(source, &ParserConfig::default())
}

/// Parse a source string as one unit.
///
/// Lexical errors are reported and the parser continues on the recovered token stream.
#[tracing::instrument(skip_all, fields(source_len = source.len(), max_depth = config.max_depth))]
pub fn parse_with_config(source: &str, config: &ParserConfig) -> (Unit, Vec<Diagnostic>) {
    let (tokens, mut diagnostics) = lexer::tokenize(source);
    let (unit, parse_diagnostics) = parse_tokens(&tokens, config);
    diagnostics.extend(parse_diagnostics);
    diagnostics.sort_by_key(|d| d.span.start);
    (unit, diagnostics)
}

/// Parse an already-lexed token stream as one unit.
///
/// ## Parameters
/// - `tokens`: Token stream produced by `kpl_syntax::lexer`. An `Eof` token is supplied if the stream lacks one.
#[tracing::instrument(skip_all, fields(token_count = tokens.len()))]
pub fn parse_tokens(tokens: &[Token], config: &ParserConfig) -> (Unit, Vec<Diagnostic>) {
    if tokens.last().is_some_and(Token::is_eof) {
        return Parser::new(tokens, *config).parse_unit();
    }
    let end = tokens.last().map_or(0, |t| t.span.end);
    let mut terminated = tokens.to_vec();
    terminated.push(Token::new(TokenKind::Eof, "", Span::new(end, end)));
    Parser::new(&terminated, *config).parse_unit()
}

/// Parse a standalone expression (used by tools and tests).
///
/// ## Errors
/// Returns every diagnostic if the source is not exactly one well-formed expression.
pub fn parse_expression(source: &str) -> Result<Spanned<Expr>, Vec<Diagnostic>> {
    let tokens = lexer::lex(source)?;
    let mut parser = Parser::new(&tokens, ParserConfig::default());
    let result = parser.expression();
    parser.finish_fragment(result)
}

/// Parse a standalone statement list (used by tools and tests).
///
/// ## Errors
/// Returns every diagnostic if any statement is malformed or input remains after the list.
pub fn parse_statements(source: &str) -> Result<Block, Vec<Diagnostic>> {
    let tokens = lexer::lex(source)?;
    let mut parser = Parser::new(&tokens, ParserConfig::default());
    let result = parser.statement_list();
    parser.finish_fragment(result)
}

impl<'a> Parser<'a> {
    /// Require that a fragment parse consumed all input and reported nothing.
    fn finish_fragment<T>(mut self, result: Result<T, Diagnostic>) -> Result<T, Vec<Diagnostic>> {
        match result {
            Ok(value) => {
                if !self.is_at_end() {
                    let error = self.expected("end of input");
                    self.diagnostics.push(error);
                }
                if self.diagnostics.iter().any(Diagnostic::is_error) {
                    Err(self.diagnostics)
                } else {
                    Ok(value)
                }
            }
            Err(e) => {
                self.diagnostics.push(e);
                Err(self.diagnostics)
            }
        }
    }
}
