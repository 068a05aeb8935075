/// Statement parsing.
///
/// A statement list runs until a token that closes or continues the enclosing construct (`endIf`, `elseIf`,
/// `case`, `until`, ...), a `;` or `)` of a C-style `for` header, the start of a declaration, or end of input.
/// Errors inside a list are recorded and the list resumes at the next statement boundary.
impl<'a> Parser<'a> {
    fn statement_list(&mut self) -> Result<Block, Diagnostic> {
        let mut statements = Vec::new();
        while !self.at_block_end() {
            let start = self.pos;
            match self.statement() {
                Ok(statement) => statements.push(statement),
                Err(e) => {
                    self.recover(e)?;
                    self.synchronize_statement(start);
                }
            }
        }
        Ok(statements)
    }

    fn statement(&mut self) -> Result<Spanned<Statement>, Diagnostic> {
        let start = self.current_span();
        let node = self.nested(Self::statement_inner)?;
        Ok(Spanned::new(node, self.span_from(start)))
    }

    fn statement_inner(&mut self) -> Result<Statement, Diagnostic> {
        match self.peek().keyword_id() {
            Some(KeywordId::If) => self.if_stmt(),
            Some(KeywordId::While) => self.while_stmt(),
            Some(KeywordId::Do) => self.until_stmt(),
            Some(KeywordId::For) => self.for_stmt(),
            Some(KeywordId::Switch) => self.switch_stmt(),
            Some(KeywordId::Try) => self.try_stmt(),
            Some(KeywordId::Throw) => self.throw_stmt(),
            Some(KeywordId::Free) => {
                self.advance();
                Ok(Statement::Free(self.expression()?))
            }
            Some(KeywordId::Return) => {
                self.advance();
                // A value is present if the next token can start one.
                let value = if self.at_expression_start() {
                    Some(self.expression()?)
                } else {
                    None
                };
                Ok(Statement::Return(value))
            }
            Some(KeywordId::Break) => {
                self.advance();
                Ok(Statement::Break)
            }
            Some(KeywordId::Continue) => {
                self.advance();
                Ok(Statement::Continue)
            }
            Some(KeywordId::Debug) => {
                self.advance();
                Ok(Statement::Debug)
            }
            _ => self.expression_stmt(),
        }
    }

    /// `if e stmts {elseIf e stmts} [else stmts] endIf`
    fn if_stmt(&mut self) -> Result<Statement, Diagnostic> {
        let opener = self.advance().span;
        let mut branches = vec![self.cond_branch(opener)?];
        while self.check_keyword(KeywordId::ElseIf) {
            let start = self.advance().span;
            branches.push(self.cond_branch(start)?);
        }
        let else_body = if self.match_keyword(KeywordId::Else) {
            Some(self.statement_list()?)
        } else {
            None
        };
        self.expect_closer(KeywordId::EndIf, opener, "'if' statement")?;
        Ok(Statement::If(IfStmt { branches, else_body }))
    }

    fn cond_branch(&mut self, start: Span) -> Result<Spanned<CondBranch>, Diagnostic> {
        let cond = self.expression()?;
        let body = self.statement_list()?;
        Ok(Spanned::new(CondBranch { cond, body }, self.span_from(start)))
    }

    fn while_stmt(&mut self) -> Result<Statement, Diagnostic> {
        let opener = self.advance().span;
        let cond = self.expression()?;
        let body = self.statement_list()?;
        self.expect_closer(KeywordId::EndWhile, opener, "'while' loop")?;
        Ok(Statement::While(WhileStmt { cond, body }))
    }

    /// `do stmts until e`
    fn until_stmt(&mut self) -> Result<Statement, Diagnostic> {
        let opener = self.advance().span;
        let body = self.statement_list()?;
        self.expect_closer(KeywordId::Until, opener, "'do' loop")?;
        let cond = self.expression()?;
        Ok(Statement::Until(UntilStmt { body, cond }))
    }

    /// `for ( stmts ; [e] ; stmts ) stmts endFor` or `for lvalue = e to e [by e] stmts endFor`
    fn for_stmt(&mut self) -> Result<Statement, Diagnostic> {
        let opener = self.advance().span;

        if self.match_punct(PunctuationId::LParen) {
            let init = self.statement_list()?;
            self.expect_punct(PunctuationId::Semicolon, "';' after the 'for' initializer")?;
            let cond = if self.check_punct(PunctuationId::Semicolon) {
                None
            } else {
                Some(self.expression()?)
            };
            self.expect_punct(PunctuationId::Semicolon, "';' after the 'for' condition")?;
            let update = self.statement_list()?;
            self.expect_punct(PunctuationId::RParen, "')' to close the 'for' header")?;
            let body = self.statement_list()?;
            self.expect_closer(KeywordId::EndFor, opener, "'for' loop")?;
            return Ok(Statement::For(ForLoop::CStyle(CFor {
                init,
                cond,
                update,
                body,
            })));
        }

        let var = self.expression()?;
        if !var.node.is_lvalue() {
            return Err(Diagnostic::syntax("Invalid 'for' loop variable", var.span)
                .with_hint("The loop variable must be an identifier, a member access, or an indexed access"));
        }
        self.expect_punct(PunctuationId::Assign, "'=' after the 'for' loop variable")?;
        let start = self.expression()?;
        self.expect_keyword(KeywordId::To, "'to' in the 'for' range")?;
        let end = self.expression()?;
        let step = if self.match_contextual(ContextualId::By) {
            Some(self.expression()?)
        } else {
            None
        };
        let body = self.statement_list()?;
        self.expect_closer(KeywordId::EndFor, opener, "'for' loop")?;
        Ok(Statement::For(ForLoop::Range(RangeFor {
            var,
            start,
            end,
            step,
            body,
        })))
    }

    /// `switch [e] {case e : stmts} [default : stmts] endSwitch`
    fn switch_stmt(&mut self) -> Result<Statement, Diagnostic> {
        let opener = self.advance().span;
        let subject = if self.check_keyword(KeywordId::Case)
            || self.check_keyword(KeywordId::Default)
            || self.check_keyword(KeywordId::EndSwitch)
        {
            None
        } else {
            Some(self.expression()?)
        };

        let mut cases = Vec::new();
        while self.check_keyword(KeywordId::Case) {
            let start = self.advance().span;
            let value = self.expression()?;
            self.expect_punct(PunctuationId::Colon, "':' after the 'case' value")?;
            let body = self.statement_list()?;
            cases.push(Spanned::new(SwitchCase { value, body }, self.span_from(start)));
        }

        let default = if self.match_keyword(KeywordId::Default) {
            self.expect_punct(PunctuationId::Colon, "':' after 'default'")?;
            Some(self.statement_list()?)
        } else {
            None
        };

        if cases.is_empty() && default.is_none() {
            self.diagnostics.push(
                Diagnostic::syntax("'switch' statement has no 'case' or 'default' arms", self.span_from(opener))
                    .warning(),
            );
        }

        self.expect_closer(KeywordId::EndSwitch, opener, "'switch' statement")?;
        Ok(Statement::Switch(SwitchStmt {
            subject,
            cases,
            default,
        }))
    }

    /// `try stmts {catch Id (params) : stmts} endTry`
    fn try_stmt(&mut self) -> Result<Statement, Diagnostic> {
        let opener = self.advance().span;
        let body = self.statement_list()?;

        let mut catches = Vec::new();
        while self.check_keyword(KeywordId::Catch) {
            let start = self.advance().span;
            let error = self.identifier_spanned()?;
            let params = self.parameter_list()?;
            self.expect_punct(PunctuationId::Colon, "':' after the 'catch' parameters")?;
            let body = self.statement_list()?;
            catches.push(Spanned::new(CatchClause { error, params, body }, self.span_from(start)));
        }

        self.expect_closer(KeywordId::EndTry, opener, "'try' statement")?;
        Ok(Statement::Try(TryStmt { body, catches }))
    }

    /// `throw Id (args)`
    fn throw_stmt(&mut self) -> Result<Statement, Diagnostic> {
        self.advance();
        let error = self.identifier_spanned()?;
        let args = self.arguments()?;
        Ok(Statement::Throw(ThrowStmt { error, args }))
    }

    /// Assignment, call, or message send.
    ///
    /// The expression is parsed first and then classified: `lvalue = e` assigns, `f(...)` and `a.m(...)` call,
    /// and `r label: ...` sends. Any other expression is not a statement.
    fn expression_stmt(&mut self) -> Result<Statement, Diagnostic> {
        let expr = self.expression()?;

        if self.match_punct(PunctuationId::Assign) {
            if !expr.node.is_lvalue() {
                return Err(Diagnostic::syntax("Invalid assignment target", expr.span)
                    .with_hint("Only identifiers, member accesses, and indexed accesses can be assigned"));
            }
            let value = self.expression()?;
            return Ok(Statement::Assign(AssignStmt { target: expr, value }));
        }

        let span = expr.span;
        match expr.node {
            Expr::Call(CallExpr { callee, args }) => {
                let callee = *callee;
                match callee.node {
                    Expr::Ident(name) => Ok(Statement::Call(CallStmt {
                        callee: Spanned::new(name, callee.span),
                        args,
                    })),
                    Expr::Member(MemberExpr { receiver, member }) => Ok(Statement::DottedCall(DottedCallStmt {
                        receiver: *receiver,
                        method: member,
                        args,
                    })),
                    _ => Err(Diagnostic::syntax("Expected a statement, found a call expression", span)),
                }
            }
            Expr::Send(send) => Ok(Statement::Send(send)),
            _ => Err(Diagnostic::syntax("Expected a statement, found an expression", span)
                .with_hint("Only assignments, calls, and message sends can stand alone as statements")),
        }
    }
}
