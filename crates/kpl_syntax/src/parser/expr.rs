/// Expression parsing.
///
/// Tiers from loosest to tightest:
/// 1. keyword message send (`receiver label: arg ...`)
/// 2. generic user-defined operators
/// 3. `||` through 12. `* / %`
/// 13. prefix operators
///
/// Postfix forms (`.member`, calls, `[...]`, `asPtrTo`, `asInteger`, `arraySize`, type tests) bind tighter still,
/// followed by primaries. Every binary tier is left-associative. Tiers 2 through 12 share one precedence-climbing
/// loop, and every folded binary or postfix node costs one nesting level.
impl<'a> Parser<'a> {
    /// Parse a full expression (tier 1).
    fn expression(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        self.nested(Self::keyword_message)
    }

    /// Parse an expression that may not be a bare keyword send (tier 2 and tighter).
    ///
    /// Used for keyword arguments and variable initializers.
    fn operator_expression(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        self.nested(|p| p.binary(Precedence::Generic))
    }

    /// Return `true` if the current token starts a `label:` pair.
    fn at_keyword_label(&self) -> bool {
        self.check_ident_then(PunctuationId::Colon)
    }

    fn keyword_message(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let receiver = self.binary(Precedence::Generic)?;
        if !self.at_keyword_label() {
            return Ok(receiver);
        }

        let mut parts = Vec::new();
        while self.at_keyword_label() {
            let label = self.identifier_spanned()?;
            self.advance(); // ':'
            let arg = self.binary(Precedence::Generic)?;
            parts.push(KeywordArg { label, arg });
        }
        let span = self.span_from(receiver.span);
        Ok(Spanned::new(
            Expr::Send(SendExpr {
                receiver: Box::new(receiver),
                parts,
            }),
            span,
        ))
    }

    /// Parse binary tiers `min` and tighter by precedence climbing, folding same-tier chains to the left.
    ///
    /// Each folded node costs one nesting level until the climb returns, so a long flat chain hits the depth
    /// ceiling the same way deep parentheses do.
    fn binary(&mut self, min: Precedence) -> Result<Spanned<Expr>, Diagnostic> {
        let mut left = self.prefix()?;
        let mut folded = 0;
        let result = loop {
            let Some((op, tier)) = self.binary_operator(min) else {
                break Ok(left);
            };
            if let Err(e) = self.enter_nesting() {
                break Err(e);
            }
            folded += 1;
            self.advance();
            let right = match self.binary_operand(tier) {
                Ok(right) => right,
                Err(e) => break Err(e),
            };
            let span = left.span.merge(right.span);
            left = Spanned::new(
                Expr::Binary(BinaryExpr {
                    op,
                    tier,
                    left: Box::new(left),
                    right: Box::new(right),
                }),
                span,
            );
        };
        self.release_nesting(folded);
        result
    }

    /// The right operand of a `tier` operator only takes operators that bind tighter.
    fn binary_operand(&mut self, tier: Precedence) -> Result<Spanned<Expr>, Diagnostic> {
        match tier.tighter() {
            Some(next) if next.is_binary() => self.binary(next),
            _ => self.prefix(),
        }
    }

    /// The current operator and its tier, if it binds at `min` or tighter.
    fn binary_operator(&self, min: Precedence) -> Option<(String, Precedence)> {
        match &self.peek().kind {
            TokenKind::Operator(op) => {
                let tier = operators::binary_precedence(op);
                (tier >= min).then(|| (op.clone(), tier))
            }
            _ => None,
        }
    }

    /// Parse prefix operators (tier 13). Any operator spelling may be used as a prefix.
    fn prefix(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let TokenKind::Operator(op) = &self.peek().kind else {
            return self.postfix();
        };
        let start = self.advance().span;
        let operand = self.nested(Self::prefix)?;
        let span = start.merge(operand.span);
        Ok(Spanned::new(
            Expr::Unary(UnaryExpr {
                op: op.clone(),
                tier: Precedence::Prefix,
                operand: Box::new(operand),
            }),
            span,
        ))
    }

    /// Parse a primary followed by any number of postfix forms, applied left to right.
    fn postfix(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let expr = self.primary()?;
        let mut folded = 0;
        let result = self.postfix_chain(expr, &mut folded);
        self.release_nesting(folded);
        result
    }

    /// Apply postfix forms to `expr`; each one applied costs a nesting level, counted in `folded`.
    fn postfix_chain(&mut self, mut expr: Spanned<Expr>, folded: &mut usize) -> Result<Spanned<Expr>, Diagnostic> {
        while self.at_postfix() {
            self.enter_nesting()?;
            *folded += 1;
            let start = expr.span;
            if self.match_punct(PunctuationId::Dot) {
                let member = self.identifier_spanned()?;
                let access = Spanned::new(
                    Expr::Member(MemberExpr {
                        receiver: Box::new(expr),
                        member,
                    }),
                    self.span_from(start),
                );
                expr = if self.check_punct(PunctuationId::LParen) {
                    let args = self.arguments()?;
                    Spanned::new(
                        Expr::Call(CallExpr {
                            callee: Box::new(access),
                            args,
                        }),
                        self.span_from(start),
                    )
                } else {
                    access
                };
            } else if self.match_keyword(KeywordId::AsPtrTo) {
                let ty = self.type_expr()?;
                expr = Spanned::new(Expr::AsPtrTo(Box::new(expr), ty), self.span_from(start));
            } else if self.match_keyword(KeywordId::AsInteger) {
                expr = Spanned::new(Expr::AsInteger(Box::new(expr)), self.span_from(start));
            } else if self.match_keyword(KeywordId::ArraySize) {
                expr = Spanned::new(Expr::ArraySize(Box::new(expr)), self.span_from(start));
            } else if self.check_keyword(KeywordId::IsInstanceOf) || self.check_keyword(KeywordId::IsKindOf) {
                let test = if self.match_keyword(KeywordId::IsInstanceOf) {
                    TypeTest::InstanceOf
                } else {
                    self.advance();
                    TypeTest::KindOf
                };
                let ty = self.type_expr()?;
                expr = Spanned::new(
                    Expr::TypeTest(TypeTestExpr {
                        receiver: Box::new(expr),
                        test,
                        ty,
                    }),
                    self.span_from(start),
                );
            } else {
                self.advance(); // '['
                let indices = self.expression_list(PunctuationId::RBracket)?;
                self.expect_punct(PunctuationId::RBracket, "']' to close the index list")?;
                expr = Spanned::new(
                    Expr::Index(IndexExpr {
                        receiver: Box::new(expr),
                        indices,
                    }),
                    self.span_from(start),
                );
            }
        }

        Ok(expr)
    }

    fn at_postfix(&self) -> bool {
        self.check_punct(PunctuationId::Dot)
            || self.check_punct(PunctuationId::LBracket)
            || self.check_keyword(KeywordId::AsPtrTo)
            || self.check_keyword(KeywordId::AsInteger)
            || self.check_keyword(KeywordId::ArraySize)
            || self.check_keyword(KeywordId::IsInstanceOf)
            || self.check_keyword(KeywordId::IsKindOf)
    }

    fn primary(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let token = self.peek();
        let start = token.span;

        let literal = match &token.kind {
            TokenKind::Int(v) => Some(Literal::Int(*v)),
            TokenKind::Double(v) => Some(Literal::Double(*v)),
            TokenKind::Char(c) => Some(Literal::Char(*c)),
            TokenKind::String(s) => Some(Literal::String(s.clone())),
            TokenKind::Keyword(KeywordId::True) => Some(Literal::Bool(true)),
            TokenKind::Keyword(KeywordId::False) => Some(Literal::Bool(false)),
            TokenKind::Keyword(KeywordId::Null) => Some(Literal::Null),
            TokenKind::Keyword(KeywordId::SelfKw) => Some(Literal::SelfRef),
            TokenKind::Keyword(KeywordId::Super) => Some(Literal::Super),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance();
            return Ok(Spanned::new(Expr::Literal(literal), start));
        }

        match &token.kind {
            TokenKind::Ident(name) => {
                self.advance();
                let ident = Spanned::new(Expr::Ident(name.clone()), start);
                if !self.check_punct(PunctuationId::LParen) {
                    return Ok(ident);
                }
                let args = self.arguments()?;
                Ok(Spanned::new(
                    Expr::Call(CallExpr {
                        callee: Box::new(ident),
                        args,
                    }),
                    self.span_from(start),
                ))
            }
            TokenKind::Punctuation(PunctuationId::LParen) => {
                self.advance();
                let inner = self.expression()?;
                self.expect_punct(PunctuationId::RParen, "')' to close the parenthesized expression")?;
                // Grouping leaves no node behind; the span grows to cover the parentheses.
                Ok(Spanned::new(inner.node, self.span_from(start)))
            }
            TokenKind::Keyword(KeywordId::New) | TokenKind::Keyword(KeywordId::Alloc) => self.new_expr(),
            TokenKind::Keyword(KeywordId::SizeOf) => {
                self.advance();
                let ty = self.type_expr()?;
                Ok(Spanned::new(Expr::SizeOf(ty), self.span_from(start)))
            }
            TokenKind::Keyword(KeywordId::Function) => self.function_literal(),
            _ => Err(self.expected("expression")),
        }
    }

    /// `new|alloc Type [{ name = e, ... } | { [count of] e, ... }]`
    fn new_expr(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let start = self.current_span();
        let allocation = if self.match_keyword(KeywordId::New) {
            Allocation::New
        } else {
            self.advance();
            Allocation::Alloc
        };
        let ty = self.type_expr()?;
        let init = if self.check_punct(PunctuationId::LBrace) {
            Some(self.initializer()?)
        } else {
            None
        };
        Ok(Spanned::new(
            Expr::New(NewExpr { allocation, ty, init }),
            self.span_from(start),
        ))
    }

    fn initializer(&mut self) -> Result<Initializer, Diagnostic> {
        let open = self.advance().span; // '{'
        if self.check_punct(PunctuationId::RBrace) {
            let span = open.merge(self.current_span());
            return Err(Diagnostic::syntax("Expected at least one initializer inside '{ }'", span));
        }

        let init = if self.check_ident_then(PunctuationId::Assign) {
            let mut fields = Vec::new();
            loop {
                let start = self.current_span();
                let name = self.identifier_spanned()?;
                self.expect_punct(PunctuationId::Assign, "'=' after the field name")?;
                let value = self.expression()?;
                fields.push(Spanned::new(FieldInit { name, value }, self.span_from(start)));
                if !self.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
            Initializer::Fields(fields)
        } else {
            let mut elements = Vec::new();
            loop {
                let start = self.current_span();
                let first = self.expression()?;
                let element = if self.match_keyword(KeywordId::Of) {
                    ArrayInit {
                        count: Some(first),
                        value: self.expression()?,
                    }
                } else {
                    ArrayInit {
                        count: None,
                        value: first,
                    }
                };
                elements.push(Spanned::new(element, self.span_from(start)));
                if !self.match_punct(PunctuationId::Comma) {
                    break;
                }
            }
            Initializer::Array(elements)
        };

        self.expect_punct(PunctuationId::RBrace, "'}' to close the initializer")?;
        Ok(init)
    }

    /// Nameless `function (params) [returns T] body endFunction`.
    fn function_literal(&mut self) -> Result<Spanned<Expr>, Diagnostic> {
        let start = self.advance().span;
        let params = self.parameter_list()?;
        let returns = self.returns_clause()?;
        let body = self.body()?;
        self.expect_closer(KeywordId::EndFunction, start, "nameless function")?;
        Ok(Spanned::new(
            Expr::Function(Box::new(FunctionLiteral { params, returns, body })),
            self.span_from(start),
        ))
    }
}
