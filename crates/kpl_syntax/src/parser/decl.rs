/// Unit and declaration parsing.
///
/// This chunk contains:
/// - `header` / `code` unit framing and `uses` clauses
/// - Declaration groups (`const`, `var`, `type`, `enum`, `errors`)
/// - Functions, interfaces, classes, behaviors, and method prototypes
///
/// ## Notes
/// - A `function` in a header is a prototype; in a code unit it is a definition with a body.
/// - Class clauses `implements`, `superclass`, and `fields` are captured as raw token lexemes.
impl<'a> Parser<'a> {
    // ========================================================================
    // Units
    // ========================================================================

    fn unit(&mut self) -> Unit {
        let start = self.current_span();

        if self.match_keyword(KeywordId::Header) {
            let name = self.unit_name("header");
            let mut imports = Vec::new();
            let mut declarations = Vec::new();
            let outcome = self.header_contents(&mut imports, &mut declarations);
            self.finish_unit(outcome, KeywordId::EndHeader, start, &format!("header '{}'", name.node));
            return Unit::Header(HeaderUnit {
                name,
                imports,
                declarations,
            });
        }

        if self.match_keyword(KeywordId::Code) {
            let name = self.unit_name("code");
            let mut declarations = Vec::new();
            let outcome = self.declarations(UnitKind::Code, &mut declarations);
            self.finish_unit(outcome, KeywordId::EndCode, start, &format!("code '{}'", name.node));
            return Unit::Code(CodeUnit { name, declarations });
        }

        self.diagnostics.push(
            Diagnostic::structural(
                format!("Expected 'header' or 'code' to begin a unit, found {}", self.peek().kind),
                start,
            )
            .with_hint("A source file is a single 'header Name ... endHeader' or 'code Name ... endCode' unit"),
        );
        Unit::Code(CodeUnit {
            name: Spanned::new(String::new(), Span::new(start.start, start.start)),
            declarations: Vec::new(),
        })
    }

    /// The unit name; a missing name is reported and left empty so the rest of the unit still parses.
    fn unit_name(&mut self, introducer: &str) -> Spanned<Ident> {
        if let TokenKind::Ident(name) = &self.peek().kind {
            let span = self.advance().span;
            return Spanned::new(name.clone(), span);
        }
        let span = self.current_span();
        self.diagnostics.push(Diagnostic::structural(
            format!("Expected a unit name after '{introducer}', found {}", self.peek().kind),
            span,
        ));
        Spanned::new(String::new(), Span::new(span.start, span.start))
    }

    fn header_contents(
        &mut self,
        imports: &mut Vec<Spanned<Import>>,
        declarations: &mut Vec<Spanned<Declaration>>,
    ) -> Result<(), Diagnostic> {
        while self.check_keyword(KeywordId::Uses) {
            let start = self.pos;
            if let Err(e) = self.uses_clause(imports) {
                self.recover(e)?;
                self.synchronize_declaration(start);
            }
        }
        self.report_duplicate_imports(imports);
        self.declarations(UnitKind::Header, declarations)
    }

    /// Consume the unit closer and reject anything after it.
    fn finish_unit(&mut self, outcome: Result<(), Diagnostic>, closer: KeywordId, opener: Span, construct: &str) {
        if let Err(e) = outcome {
            self.diagnostics.push(e);
            return;
        }
        if let Err(e) = self.expect_closer(closer, opener, construct) {
            self.diagnostics.push(e);
            return;
        }
        if !self.is_at_end() {
            let start = self.current_span();
            let end = self.tokens.last().map_or(start, |t| t.span);
            self.diagnostics.push(Diagnostic::structural(
                format!("Unexpected {} after '{}'", self.peek().kind, keywords::as_str(closer)),
                start.merge(end),
            ));
        }
    }

    fn declarations(&mut self, kind: UnitKind, declarations: &mut Vec<Spanned<Declaration>>) -> Result<(), Diagnostic> {
        let closer = match kind {
            UnitKind::Header => KeywordId::EndHeader,
            UnitKind::Code => KeywordId::EndCode,
        };
        while !self.is_at_end() && !self.check_keyword(closer) {
            let start = self.pos;
            match self.declaration(kind) {
                Ok(Some(decl)) => declarations.push(decl),
                Ok(None) => {}
                Err(e) => {
                    self.recover(e)?;
                    self.synchronize_declaration(start);
                }
            }
        }
        Ok(())
    }

    /// Parse one declaration; `Ok(None)` means it was parsed but is not allowed in this unit.
    fn declaration(&mut self, kind: UnitKind) -> Result<Option<Spanned<Declaration>>, Diagnostic> {
        let start = self.current_span();
        let decl = match self.peek().keyword_id() {
            Some(KeywordId::Const) => Declaration::Const(self.const_group()?),
            Some(KeywordId::Var) => Declaration::Var(self.var_group()?.node),
            Some(KeywordId::Type) => Declaration::Type(self.type_group()?),
            Some(KeywordId::Enum) => Declaration::Enum(self.enum_decl()?),
            Some(KeywordId::Errors) => Declaration::Errors(self.errors_decl()?),
            Some(KeywordId::External) => {
                self.advance();
                self.expect_keyword(KeywordId::Function, "'function' after 'external'")?;
                Declaration::FunctionProto(self.function_proto(true)?)
            }
            Some(KeywordId::Function) => {
                let opener = self.advance().span;
                match kind {
                    UnitKind::Header => Declaration::FunctionProto(self.function_proto(false)?),
                    UnitKind::Code => Declaration::Function(self.function_decl(opener)?),
                }
            }
            Some(KeywordId::Interface) => Declaration::Interface(self.interface_decl()?),
            Some(KeywordId::Class) => Declaration::Class(self.class_decl()?),
            Some(KeywordId::Behavior) => {
                let behavior = self.behavior_decl()?;
                if kind == UnitKind::Header {
                    self.diagnostics.push(
                        Diagnostic::structural(
                            format!("Behavior '{}' is only allowed in a code unit", behavior.name.node),
                            self.span_from(start),
                        )
                        .with_hint("Move the behavior into the matching code unit"),
                    );
                    return Ok(None);
                }
                Declaration::Behavior(behavior)
            }
            Some(KeywordId::Uses) => {
                return Err(Diagnostic::structural(
                    "'uses' clauses must come before any declaration",
                    self.current_span(),
                ));
            }
            _ => return Err(self.expected("declaration")),
        };
        Ok(Some(Spanned::new(decl, self.span_from(start))))
    }

    // ========================================================================
    // Imports
    // ========================================================================

    /// `uses pkg [renaming a to b, ...] {, pkg ...}`
    fn uses_clause(&mut self, imports: &mut Vec<Spanned<Import>>) -> Result<(), Diagnostic> {
        self.advance(); // 'uses'
        loop {
            imports.push(self.import()?);
            if !self.match_punct(PunctuationId::Comma) {
                return Ok(());
            }
        }
    }

    fn import(&mut self) -> Result<Spanned<Import>, Diagnostic> {
        let start = self.current_span();
        let package = match &self.peek().kind {
            TokenKind::Ident(name) => PackageRef::Name(name.clone()),
            TokenKind::String(path) => PackageRef::Path(path.clone()),
            _ => return Err(self.expected("package name")),
        };
        let package = Spanned::new(package, self.advance().span);

        let mut renamings = Vec::new();
        if self.match_keyword(KeywordId::Renaming) {
            loop {
                let rename_start = self.current_span();
                let from = self.identifier_spanned()?;
                self.expect_keyword(KeywordId::To, "'to' in a renaming")?;
                let to = self.identifier_spanned()?;
                renamings.push(Spanned::new(Rename { from, to }, self.span_from(rename_start)));

                // `, a to b` continues the renaming list; `, Pkg` starts the next package.
                let continues = self.check_punct(PunctuationId::Comma)
                    && matches!(self.peek_at(1).kind, TokenKind::Ident(_))
                    && self.peek_at(2).kind.is_keyword(KeywordId::To);
                if !continues {
                    break;
                }
                self.advance();
            }
        }

        Ok(Spanned::new(Import { package, renamings }, self.span_from(start)))
    }

    fn report_duplicate_imports(&mut self, imports: &[Spanned<Import>]) {
        for (i, import) in imports.iter().enumerate() {
            let package = &import.node.package;
            if imports[..i].iter().any(|earlier| earlier.node.package == *package) {
                let name = match &package.node {
                    PackageRef::Name(name) => name.clone(),
                    PackageRef::Path(path) => lexer::quote_string(path),
                };
                self.diagnostics.push(
                    Diagnostic::structural(format!("Package {name} is imported more than once"), package.span)
                        .warning(),
                );
            }
        }
    }

    // ========================================================================
    // Declaration groups
    // ========================================================================

    /// Structural error for a group introducer with no entries.
    fn empty_group(&self, introducer: &str, entry: &str) -> Diagnostic {
        Diagnostic::structural(
            format!("'{introducer}' needs at least one {entry}, found {}", self.peek().kind),
            self.current_span(),
        )
    }

    fn const_group(&mut self) -> Result<ConstGroup, Diagnostic> {
        self.advance();
        if !self.check_ident_then(PunctuationId::Assign) {
            return Err(self.empty_group("const", "'name = value' entry"));
        }
        let mut consts = Vec::new();
        while self.check_ident_then(PunctuationId::Assign) {
            let start = self.current_span();
            let name = self.identifier_spanned()?;
            self.advance(); // '='
            let value = self.expression()?;
            consts.push(Spanned::new(ConstDecl { name, value }, self.span_from(start)));
        }
        Ok(ConstGroup { consts })
    }

    fn at_var_decl_start(&self) -> bool {
        self.check_ident_then(PunctuationId::Colon) || self.check_ident_then(PunctuationId::Comma)
    }

    /// `var a, b: T [= e] ...`; also the locals of a body.
    fn var_group(&mut self) -> Result<Spanned<VarGroup>, Diagnostic> {
        let start = self.advance().span;
        if !self.at_var_decl_start() {
            return Err(self.empty_group("var", "'name: type' declaration"));
        }
        let mut vars = Vec::new();
        while self.at_var_decl_start() {
            let decl_start = self.current_span();
            let names = self.identifier_list_spanned()?;
            self.expect_punct(PunctuationId::Colon, "':' after the variable names")?;
            let ty = self.type_expr()?;
            let init = if self.match_punct(PunctuationId::Assign) {
                Some(self.operator_expression()?)
            } else {
                None
            };
            vars.push(Spanned::new(VarDecl { names, ty, init }, self.span_from(decl_start)));
        }
        Ok(Spanned::new(VarGroup { vars }, self.span_from(start)))
    }

    fn type_group(&mut self) -> Result<TypeGroup, Diagnostic> {
        self.advance();
        if !self.check_ident_then(PunctuationId::Assign) {
            return Err(self.empty_group("type", "'Name = type' alias"));
        }
        let mut aliases = Vec::new();
        while self.check_ident_then(PunctuationId::Assign) {
            let start = self.current_span();
            let name = self.identifier_spanned()?;
            self.advance(); // '='
            let ty = self.type_expr()?;
            aliases.push(Spanned::new(TypeAlias { name, ty }, self.span_from(start)));
        }
        Ok(TypeGroup { aliases })
    }

    /// `enum A [= e] {, B}`
    fn enum_decl(&mut self) -> Result<EnumDecl, Diagnostic> {
        self.advance();
        if !self.check_ident() {
            return Err(self.empty_group("enum", "variant"));
        }
        let first = self.identifier_spanned()?;
        let start = if self.match_punct(PunctuationId::Assign) {
            Some(self.expression()?)
        } else {
            None
        };
        let mut variants = vec![first];
        while self.match_punct(PunctuationId::Comma) {
            variants.push(self.identifier_spanned()?);
        }
        Ok(EnumDecl { variants, start })
    }

    /// `errors Name (params) ...`
    fn errors_decl(&mut self) -> Result<ErrorsDecl, Diagnostic> {
        self.advance();
        if !self.check_ident_then(PunctuationId::LParen) {
            return Err(self.empty_group("errors", "'Name (params)' signature"));
        }
        let mut errors = Vec::new();
        while self.check_ident_then(PunctuationId::LParen) {
            let start = self.current_span();
            let name = self.identifier_spanned()?;
            let params = self.parameter_list()?;
            errors.push(Spanned::new(ErrorSig { name, params }, self.span_from(start)));
        }
        Ok(ErrorsDecl { errors })
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// `name (params) [returns T]`, after `function` has been consumed.
    fn function_proto(&mut self, is_external: bool) -> Result<FunctionProto, Diagnostic> {
        let name = self.identifier_spanned()?;
        let params = self.parameter_list()?;
        let returns = self.returns_clause()?;
        Ok(FunctionProto {
            is_external,
            name,
            params,
            returns,
        })
    }

    fn function_decl(&mut self, opener: Span) -> Result<FunctionDecl, Diagnostic> {
        let FunctionProto {
            name, params, returns, ..
        } = self.function_proto(false)?;
        let body = self.body()?;
        self.expect_closer(KeywordId::EndFunction, opener, &format!("function '{}'", name.node))?;
        Ok(FunctionDecl {
            name,
            params,
            returns,
            body,
        })
    }

    /// `[var group] stmts`
    fn body(&mut self) -> Result<Body, Diagnostic> {
        let locals = if self.check_keyword(KeywordId::Var) {
            Some(self.var_group()?)
        } else {
            None
        };
        let statements = self.statement_list()?;
        Ok(Body { locals, statements })
    }

    // ========================================================================
    // Interfaces, classes, behaviors
    // ========================================================================

    fn optional_type_params(&mut self) -> Result<Vec<Spanned<Type>>, Diagnostic> {
        if self.check_punct(PunctuationId::LBracket) {
            self.type_arguments()
        } else {
            Ok(Vec::new())
        }
    }

    /// `interface Name [params] [extends A, B] {messages protos} endInterface`
    fn interface_decl(&mut self) -> Result<InterfaceDecl, Diagnostic> {
        let opener = self.advance().span;
        let name = self.identifier_spanned()?;
        let type_params = self.optional_type_params()?;
        let extends = if self.match_contextual(ContextualId::Extends) {
            self.identifier_list_spanned()?
        } else {
            Vec::new()
        };
        let mut members = Vec::new();
        while self.check_keyword(KeywordId::Messages) {
            members.push(self.message_group(MessageGroupKind::Messages)?);
        }
        self.expect_closer(KeywordId::EndInterface, opener, &format!("interface '{}'", name.node))?;
        Ok(InterfaceDecl {
            name,
            type_params,
            extends,
            members,
        })
    }

    /// `class Name [params] {implements ... | superclass ... | fields ... | extends ... | methods protos} endClass`
    fn class_decl(&mut self) -> Result<ClassDecl, Diagnostic> {
        let opener = self.advance().span;
        let name = self.identifier_spanned()?;
        let type_params = self.optional_type_params()?;
        let mut extends: Option<Vec<Spanned<Ident>>> = None;
        let mut members = Vec::new();

        loop {
            if let Some(kind) = self.clause_kind() {
                members.push(self.opaque_clause(kind));
            } else if self.check_contextual(ContextualId::Extends) {
                if extends.is_some() {
                    return Err(Diagnostic::structural(
                        format!("Class '{}' has more than one 'extends' clause", name.node),
                        self.current_span(),
                    ));
                }
                self.advance();
                extends = Some(self.identifier_list_spanned()?);
            } else if self.check_keyword(KeywordId::Methods) {
                members.push(self.message_group(MessageGroupKind::Methods)?);
            } else {
                break;
            }
        }

        self.expect_closer(KeywordId::EndClass, opener, &format!("class '{}'", name.node))?;
        Ok(ClassDecl {
            name,
            type_params,
            extends: extends.unwrap_or_default(),
            members,
        })
    }

    fn clause_kind(&self) -> Option<ClauseKind> {
        if self.check_contextual(ContextualId::Implements) {
            Some(ClauseKind::Implements)
        } else if self.check_contextual(ContextualId::Superclass) {
            Some(ClauseKind::Superclass)
        } else if self.check_contextual(ContextualId::Fields) {
            Some(ClauseKind::Fields)
        } else {
            None
        }
    }

    /// Capture a class clause's tokens up to the next clause, `methods`, `endClass`, or declaration.
    fn opaque_clause(&mut self, kind: ClauseKind) -> Spanned<MemberDecl> {
        let start = self.advance().span;
        let mut tokens = Vec::new();
        while !self.is_at_end()
            && self.clause_kind().is_none()
            && !self.check_contextual(ContextualId::Extends)
            && !self.check_keyword(KeywordId::Methods)
            && !self.check_keyword(KeywordId::EndClass)
            && !self.at_declaration_start()
        {
            let token = self.advance();
            tokens.push(Spanned::new(token.lexeme.clone(), token.span));
        }
        Spanned::new(
            MemberDecl::Clause(OpaqueClause { kind, tokens }),
            self.span_from(start),
        )
    }

    /// `messages proto+` or `methods proto+`
    fn message_group(&mut self, kind: MessageGroupKind) -> Result<Spanned<MemberDecl>, Diagnostic> {
        let start = self.advance().span;
        if !self.at_proto_start() {
            let introducer = match kind {
                MessageGroupKind::Messages => "messages",
                MessageGroupKind::Methods => "methods",
            };
            return Err(self.empty_group(introducer, "method prototype"));
        }
        let mut protos = Vec::new();
        while self.at_proto_start() {
            protos.push(self.method_proto()?);
        }
        Ok(Spanned::new(
            MemberDecl::Messages(MessageGroup { kind, protos }),
            self.span_from(start),
        ))
    }

    /// `behavior Name {method proto body endMethod} endBehavior`
    fn behavior_decl(&mut self) -> Result<BehaviorDecl, Diagnostic> {
        let opener = self.advance().span;
        let name = self.identifier_spanned()?;
        let mut members = Vec::new();
        while self.check_keyword(KeywordId::Method) {
            let start = self.pos;
            match self.method_decl() {
                Ok(method) => members.push(method),
                Err(e) => {
                    self.recover(e)?;
                    self.synchronize_method(start);
                }
            }
        }
        self.expect_closer(KeywordId::EndBehavior, opener, &format!("behavior '{}'", name.node))?;
        Ok(BehaviorDecl { name, members })
    }

    fn method_decl(&mut self) -> Result<Spanned<MemberDecl>, Diagnostic> {
        let opener = self.advance().span;
        let proto = self.method_proto()?;
        let body = self.body()?;
        let construct = format!("method '{}'", proto.node.selector());
        self.expect_closer(KeywordId::EndMethod, opener, &construct)?;
        Ok(Spanned::new(
            MemberDecl::Method(MethodDecl { proto, body }),
            self.span_from(opener),
        ))
    }

    /// Skip the rest of a broken method: past its `endMethod`, or up to the next `method` or `endBehavior`.
    fn synchronize_method(&mut self, start_pos: usize) {
        if self.pos == start_pos {
            self.advance();
        }
        while !self.is_at_end()
            && !self.check_keyword(KeywordId::Method)
            && !self.check_keyword(KeywordId::EndBehavior)
            && !self.at_declaration_start()
        {
            if self.match_keyword(KeywordId::EndMethod) {
                return;
            }
            self.advance();
        }
    }

    // ========================================================================
    // Method prototypes
    // ========================================================================

    /// Return `true` if the current tokens begin any of the four prototype shapes.
    fn at_proto_start(&self) -> bool {
        let next = &self.peek_next().kind;
        self.check_ident_then(PunctuationId::LParen)
            || self.check_ident_then(PunctuationId::Colon)
            || ((self.check_contextual(ContextualId::Infix) || self.check_contextual(ContextualId::Prefix))
                && matches!(next, TokenKind::Operator(_)))
    }

    /// Prototype shapes are tried in a fixed order: `name (`, `infix OP`, `prefix OP`, `label:`.
    fn method_proto(&mut self) -> Result<Spanned<MethodProto>, Diagnostic> {
        let start = self.current_span();
        let next_is_operator = matches!(self.peek_next().kind, TokenKind::Operator(_));

        let proto = if self.check_ident_then(PunctuationId::LParen) {
            let name = self.identifier_spanned()?;
            let params = self.parameter_list()?;
            let returns = self.returns_clause()?;
            MethodProto::Params { name, params, returns }
        } else if self.check_contextual(ContextualId::Infix) && next_is_operator {
            self.advance();
            let op = self.operator_spanned()?;
            self.expect_punct(PunctuationId::LParen, "'(' before the infix operand")?;
            let param = self.identifier_spanned()?;
            self.expect_punct(PunctuationId::Colon, "':' after the infix operand name")?;
            let param_ty = self.type_expr()?;
            self.expect_punct(PunctuationId::RParen, "')' after the infix operand")?;
            self.expect_keyword(KeywordId::Returns, "'returns' in an infix operator prototype")?;
            let returns = self.type_expr()?;
            MethodProto::Infix {
                op,
                param,
                param_ty,
                returns,
            }
        } else if self.check_contextual(ContextualId::Prefix) && next_is_operator {
            self.advance();
            let op = self.operator_spanned()?;
            self.expect_punct(PunctuationId::LParen, "'(' after the prefix operator")?;
            self.expect_punct(PunctuationId::RParen, "')' (prefix operators take no parameters)")?;
            self.expect_keyword(KeywordId::Returns, "'returns' in a prefix operator prototype")?;
            let returns = self.type_expr()?;
            MethodProto::Prefix { op, returns }
        } else if self.check_ident_then(PunctuationId::Colon) {
            let mut parts = Vec::new();
            while self.check_ident_then(PunctuationId::Colon) {
                let part_start = self.current_span();
                let label = self.identifier_spanned()?;
                self.advance(); // ':'
                self.expect_punct(PunctuationId::LParen, "'(' before the keyword parameter")?;
                let name = self.identifier_spanned()?;
                self.expect_punct(PunctuationId::Colon, "':' after the keyword parameter name")?;
                let ty = self.type_expr()?;
                self.expect_punct(PunctuationId::RParen, "')' after the keyword parameter")?;
                parts.push(Spanned::new(KeywordParam { label, name, ty }, self.span_from(part_start)));
            }
            let returns = self.returns_clause()?;
            MethodProto::Keyword { parts, returns }
        } else {
            return Err(self.expected("method prototype"));
        };

        Ok(Spanned::new(proto, self.span_from(start)))
    }
}
