/// Small shared parsing utilities.
///
/// These helpers are used across multiple parser chunks and are kept separate to avoid
/// cluttering the main grammar rules.
impl<'a> Parser<'a> {
    /// Parse an identifier and return it with its span.
    fn identifier_spanned(&mut self) -> Result<Spanned<Ident>, Diagnostic> {
        let TokenKind::Ident(name) = &self.peek().kind else {
            return Err(self.expected("identifier"));
        };
        let span = self.advance().span;
        Ok(Spanned::new(name.clone(), span))
    }

    /// Parse `a, b, c`.
    fn identifier_list_spanned(&mut self) -> Result<Vec<Spanned<Ident>>, Diagnostic> {
        let mut names = vec![self.identifier_spanned()?];
        while self.match_punct(PunctuationId::Comma) {
            names.push(self.identifier_spanned()?);
        }
        Ok(names)
    }

    fn operator_spanned(&mut self) -> Result<Spanned<String>, Diagnostic> {
        let TokenKind::Operator(op) = &self.peek().kind else {
            return Err(self.expected("operator"));
        };
        let span = self.advance().span;
        Ok(Spanned::new(op.clone(), span))
    }

    /// Parse `e, e, ...` up to (not including) `close`; empty when `close` comes first.
    fn expression_list(&mut self, close: PunctuationId) -> Result<Vec<Spanned<Expr>>, Diagnostic> {
        let mut items = Vec::new();
        if self.check_punct(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if !self.match_punct(PunctuationId::Comma) {
                return Ok(items);
            }
        }
    }

    /// Parse a parenthesized argument list `( [e {, e}] )`.
    fn arguments(&mut self) -> Result<Vec<Spanned<Expr>>, Diagnostic> {
        self.expect_punct(PunctuationId::LParen, "'(' to open the argument list")?;
        let args = self.expression_list(PunctuationId::RParen)?;
        self.expect_punct(PunctuationId::RParen, "')' to close the argument list")?;
        Ok(args)
    }

    /// Parse `( [a, b: T {, c: U}] )`.
    fn parameter_list(&mut self) -> Result<Vec<Spanned<Param>>, Diagnostic> {
        self.expect_punct(PunctuationId::LParen, "'(' to open the parameter list")?;
        let mut params = Vec::new();
        if !self.check_punct(PunctuationId::RParen) {
            loop {
                let start = self.current_span();
                let names = self.identifier_list_spanned()?;
                self.expect_punct(PunctuationId::Colon, "':' after the parameter names")?;
                let ty = self.type_expr()?;
                params.push(Spanned::new(Param { names, ty }, self.span_from(start)));
                if !self.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(PunctuationId::RParen, "')' to close the parameter list")?;
        Ok(params)
    }
}
