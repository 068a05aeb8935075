/// Type parsing.
///
/// ```text
/// type := 'ptr' 'to' type
///       | 'array' ['[' dim {',' dim} ']'] 'of' type
///       | 'function' '(' [type {',' type}] ')' ['returns' type]
///       | Ident ['[' type {',' type} ']']
/// dim  := '*' | expression
/// ```
///
/// `ptr` and `array` are contextual: they only introduce a type constructor when followed by `to` / `[` / `of`,
/// otherwise they are ordinary type names.
impl<'a> Parser<'a> {
    fn type_expr(&mut self) -> Result<Spanned<Type>, Diagnostic> {
        self.nested(Self::type_inner)
    }

    fn type_inner(&mut self) -> Result<Spanned<Type>, Diagnostic> {
        let start = self.current_span();
        let next = &self.peek_next().kind;

        if self.check_contextual(ContextualId::Ptr) && next.is_keyword(KeywordId::To) {
            self.advance();
            self.advance();
            let pointee = self.type_expr()?;
            return Ok(Spanned::new(Type::Pointer(Box::new(pointee)), self.span_from(start)));
        }

        if self.check_contextual(ContextualId::Array)
            && (next.is_punctuation(PunctuationId::LBracket) || next.is_keyword(KeywordId::Of))
        {
            self.advance();
            let mut dims = Vec::new();
            if self.match_punct(PunctuationId::LBracket) {
                loop {
                    dims.push(self.dimension()?);
                    if !self.match_punct(PunctuationId::Comma) {
                        break;
                    }
                }
                self.expect_punct(PunctuationId::RBracket, "']' to close the array dimensions")?;
            }
            self.expect_keyword(KeywordId::Of, "'of' before the array element type")?;
            let element = self.type_expr()?;
            return Ok(Spanned::new(
                Type::Array {
                    dims,
                    element: Box::new(element),
                },
                self.span_from(start),
            ));
        }

        if self.match_keyword(KeywordId::Function) {
            self.expect_punct(PunctuationId::LParen, "'(' after 'function' in a function type")?;
            let mut params = Vec::new();
            if !self.check_punct(PunctuationId::RParen) {
                loop {
                    params.push(self.type_expr()?);
                    if !self.match_punct(PunctuationId::Comma) {
                        break;
                    }
                }
            }
            self.expect_punct(PunctuationId::RParen, "')' to close the function type parameters")?;
            let returns = self.returns_clause()?.map(Box::new);
            return Ok(Spanned::new(Type::Function { params, returns }, self.span_from(start)));
        }

        let TokenKind::Ident(name) = &self.peek().kind else {
            return Err(self.expected("type"));
        };
        self.advance();
        let args = if self.check_punct(PunctuationId::LBracket) {
            self.type_arguments()?
        } else {
            Vec::new()
        };
        Ok(Spanned::new(
            Type::Named {
                name: name.clone(),
                args,
            },
            self.span_from(start),
        ))
    }

    /// `[T, U]` after a type name, or the type parameters of a class or interface.
    fn type_arguments(&mut self) -> Result<Vec<Spanned<Type>>, Diagnostic> {
        self.expect_punct(PunctuationId::LBracket, "'[' to open type arguments")?;
        let mut args = Vec::new();
        loop {
            args.push(self.type_expr()?);
            if !self.match_punct(PunctuationId::Comma) {
                break;
            }
        }
        self.expect_punct(PunctuationId::RBracket, "']' to close type arguments")?;
        Ok(args)
    }

    /// One array dimension: `*` (sized at allocation) or a size expression.
    fn dimension(&mut self) -> Result<Spanned<Dimension>, Diagnostic> {
        let next = &self.peek_next().kind;
        if self.check_op("*")
            && (next.is_punctuation(PunctuationId::Comma) || next.is_punctuation(PunctuationId::RBracket))
        {
            let span = self.advance().span;
            return Ok(Spanned::new(Dimension::Dynamic, span));
        }
        let size = self.expression()?;
        Ok(size.map(Dimension::Fixed))
    }

    /// Optional `returns T`.
    fn returns_clause(&mut self) -> Result<Option<Spanned<Type>>, Diagnostic> {
        if self.match_keyword(KeywordId::Returns) {
            Ok(Some(self.type_expr()?))
        } else {
            Ok(None)
        }
    }
}
