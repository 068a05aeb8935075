/// Token-stream helpers, nesting accounting, and error recovery.
///
/// This chunk contains the low-level primitives used throughout parsing:
/// - Peeking/consuming tokens (`peek`, `advance`)
/// - Matching / expecting keywords, punctuation, and contextual words
/// - The nesting ceiling (`enter_nesting`, `leave_nesting`)
/// - Error recovery (`recover`, `synchronize_statement`, `synchronize_declaration`)
/// Remaining stack below which `nested` switches to a fresh segment.
const STACK_RED_ZONE: usize = 32 * 1024;
/// Size of each stack segment allocated by `nested`.
const STACK_GROWTH: usize = 256 * 1024;

static EOF_TOKEN: Token = Token {
    kind: TokenKind::Eof,
    lexeme: String::new(),
    span: Span { start: 0, end: 0 },
};

/// Keywords that end or continue an enclosing block; a statement list stops in front of them.
const BLOCK_END_KEYWORDS: &[KeywordId] = &[
    KeywordId::ElseIf,
    KeywordId::Else,
    KeywordId::EndIf,
    KeywordId::EndWhile,
    KeywordId::Until,
    KeywordId::EndFor,
    KeywordId::Case,
    KeywordId::Default,
    KeywordId::EndSwitch,
    KeywordId::Catch,
    KeywordId::EndTry,
    KeywordId::EndFunction,
    KeywordId::Method,
    KeywordId::EndMethod,
    KeywordId::Methods,
    KeywordId::Messages,
    KeywordId::EndBehavior,
    KeywordId::EndClass,
    KeywordId::EndInterface,
    KeywordId::EndHeader,
    KeywordId::EndCode,
];

const STATEMENT_KEYWORDS: &[KeywordId] = &[
    KeywordId::If,
    KeywordId::While,
    KeywordId::Do,
    KeywordId::For,
    KeywordId::Switch,
    KeywordId::Try,
    KeywordId::Throw,
    KeywordId::Free,
    KeywordId::Return,
    KeywordId::Break,
    KeywordId::Continue,
    KeywordId::Debug,
];

/// Keywords that always begin a declaration (`function` is handled separately).
const DECLARATION_KEYWORDS: &[KeywordId] = &[
    KeywordId::Const,
    KeywordId::Var,
    KeywordId::Type,
    KeywordId::Enum,
    KeywordId::Errors,
    KeywordId::External,
    KeywordId::Interface,
    KeywordId::Class,
    KeywordId::Behavior,
];

/// Closers that declaration recovery consumes before resuming.
const DECLARATION_CLOSERS: &[KeywordId] = &[
    KeywordId::EndFunction,
    KeywordId::EndClass,
    KeywordId::EndInterface,
    KeywordId::EndBehavior,
    KeywordId::EndMethod,
];

impl<'a> Parser<'a> {
    // ========================================================================
    // Helpers
    // ========================================================================

    /// Return `true` if the current token is [`TokenKind::Eof`].
    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    /// Return the token `offset` positions ahead without consuming anything.
    fn peek_at(&self, offset: usize) -> &'a Token {
        self.tokens.get(self.pos + offset).unwrap_or(&EOF_TOKEN)
    }

    /// Return the current token without consuming it.
    fn peek(&self) -> &'a Token {
        self.peek_at(0)
    }

    /// Return the token after the current token without consuming it.
    fn peek_next(&self) -> &'a Token {
        self.peek_at(1)
    }

    /// Advance to the next token and return the token we just consumed.
    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        if !self.is_at_end() {
            self.pos += 1;
        }
        token
    }

    fn check_keyword(&self, id: KeywordId) -> bool {
        self.peek().kind.is_keyword(id)
    }

    fn check_punct(&self, id: PunctuationId) -> bool {
        self.peek().kind.is_punctuation(id)
    }

    fn check_op(&self, spelling: &str) -> bool {
        self.peek().kind.is_operator(spelling)
    }

    fn check_contextual(&self, id: ContextualId) -> bool {
        self.peek().kind.is_contextual(id)
    }

    fn check_ident(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Ident(_))
    }

    /// Return `true` if the current token is an identifier and the next one is the given punctuation.
    fn check_ident_then(&self, id: PunctuationId) -> bool {
        self.check_ident() && self.peek_next().kind.is_punctuation(id)
    }

    fn match_keyword(&mut self, id: KeywordId) -> bool {
        if self.check_keyword(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_punct(&mut self, id: PunctuationId) -> bool {
        if self.check_punct(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_contextual(&mut self, id: ContextualId) -> bool {
        if self.check_contextual(id) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Build a "found X" syntax error at the current token.
    fn expected(&self, what: &str) -> Diagnostic {
        Diagnostic::syntax(format!("Expected {what}, found {}", self.peek().kind), self.current_span())
    }

    fn expect_keyword(&mut self, id: KeywordId, what: &str) -> Result<&'a Token, Diagnostic> {
        if self.check_keyword(id) {
            Ok(self.advance())
        } else {
            Err(self.expected(what))
        }
    }

    fn expect_punct(&mut self, id: PunctuationId, what: &str) -> Result<&'a Token, Diagnostic> {
        if self.check_punct(id) {
            Ok(self.advance())
        } else {
            Err(self.expected(what))
        }
    }

    /// Consume the closing keyword of a block construct.
    ///
    /// The error names the construct left open and points back at its opening keyword.
    fn expect_closer(&mut self, closer: KeywordId, opener: Span, construct: &str) -> Result<(), Diagnostic> {
        if self.match_keyword(closer) {
            return Ok(());
        }
        let closer = keywords::as_str(closer);
        Err(Diagnostic::syntax(
            format!("Expected '{closer}' to close {construct}, found {}", self.peek().kind),
            self.current_span(),
        )
        .with_related(opener, format!("{construct} starts here"))
        .with_hint(format!("Add '{closer}' at the end of the block")))
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Span of the most recently consumed token.
    fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => self.current_span(),
        }
    }

    /// Span from `start` through the most recently consumed token.
    fn span_from(&self, start: Span) -> Span {
        start.merge(self.previous_span())
    }

    // ========================================================================
    // Boundaries
    // ========================================================================

    /// Return `true` if the current token begins a declaration.
    fn at_declaration_start(&self) -> bool {
        let kind = &self.peek().kind;
        DECLARATION_KEYWORDS.iter().any(|id| kind.is_keyword(*id))
            || (kind.is_keyword(KeywordId::Function) && matches!(self.peek_next().kind, TokenKind::Ident(_)))
    }

    /// Return `true` if a statement list must stop here.
    fn at_block_end(&self) -> bool {
        let kind = &self.peek().kind;
        self.is_at_end()
            || BLOCK_END_KEYWORDS.iter().any(|id| kind.is_keyword(*id))
            || kind.is_punctuation(PunctuationId::Semicolon)
            || kind.is_punctuation(PunctuationId::RParen)
            || self.at_declaration_start()
    }

    fn at_statement_boundary(&self) -> bool {
        let kind = &self.peek().kind;
        STATEMENT_KEYWORDS.iter().any(|id| kind.is_keyword(*id)) || self.at_block_end()
    }

    /// Return `true` if the current token can start an expression.
    fn at_expression_start(&self) -> bool {
        match &self.peek().kind {
            TokenKind::Int(_)
            | TokenKind::Double(_)
            | TokenKind::Char(_)
            | TokenKind::String(_)
            | TokenKind::Ident(_)
            | TokenKind::Operator(_) => true,
            TokenKind::Punctuation(p) => *p == PunctuationId::LParen,
            TokenKind::Keyword(KeywordId::Function) => self.peek_next().kind.is_punctuation(PunctuationId::LParen),
            TokenKind::Keyword(k) => matches!(
                k,
                KeywordId::True
                    | KeywordId::False
                    | KeywordId::Null
                    | KeywordId::SelfKw
                    | KeywordId::Super
                    | KeywordId::New
                    | KeywordId::Alloc
                    | KeywordId::SizeOf
            ),
            _ => false,
        }
    }

    // ========================================================================
    // Nesting
    // ========================================================================

    /// Open one nesting level, failing once the configured ceiling is passed.
    ///
    /// On failure the parse is marked aborted and the counter is left unchanged.
    fn enter_nesting(&mut self) -> Result<(), Diagnostic> {
        if self.depth >= self.config.max_depth {
            self.aborted = true;
            return Err(Diagnostic::depth_exceeded(self.config.max_depth, self.current_span()));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave_nesting(&mut self) {
        debug_assert!(self.depth > 0, "leave_nesting without matching enter_nesting");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Close `levels` nesting levels opened by a folding loop.
    fn release_nesting(&mut self, levels: usize) {
        for _ in 0..levels {
            self.leave_nesting();
        }
    }

    /// Run `f` one nesting level deeper.
    ///
    /// The ceiling bounds the tree; the stack is also grown on the heap when little of it remains, so a small
    /// thread stack cannot overflow before the ceiling is reached.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Diagnostic>) -> Result<T, Diagnostic> {
        self.enter_nesting()?;
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || f(self));
        self.leave_nesting();
        result
    }

    // ========================================================================
    // Recovery
    // ========================================================================

    /// Record a recoverable error, or hand it back when the parse has been aborted.
    fn recover(&mut self, error: Diagnostic) -> Result<(), Diagnostic> {
        if self.aborted {
            return Err(error);
        }
        tracing::debug!(kind = %error.kind, message = %error.message, "recovering from parse error");
        self.diagnostics.push(error);
        Ok(())
    }

    /// Skip to the next statement boundary, consuming at least one token if `start_pos` made no progress.
    fn synchronize_statement(&mut self, start_pos: usize) {
        if self.pos == start_pos {
            self.advance();
        }
        while !self.is_at_end() && !self.at_statement_boundary() {
            self.advance();
        }
    }

    /// Skip to the next declaration or unit boundary.
    ///
    /// A stray declaration closer (`endFunction`, `endClass`, ...) is consumed so the rest of a broken
    /// declaration is not re-read as new declarations.
    fn synchronize_declaration(&mut self, start_pos: usize) {
        if self.pos == start_pos {
            self.advance();
        }
        while !self.is_at_end() {
            if self.at_declaration_start()
                || self.check_keyword(KeywordId::Uses)
                || self.check_keyword(KeywordId::EndHeader)
                || self.check_keyword(KeywordId::EndCode)
            {
                return;
            }
            let kind = &self.peek().kind;
            if DECLARATION_CLOSERS.iter().any(|id| kind.is_keyword(*id)) {
                self.advance();
                return;
            }
            self.advance();
        }
    }
}
