//! Core formatting logic for KPL source code
//!
//! Walks the AST and emits canonically laid out source code.
//!
//! ## Notes
//! - Parentheses are only emitted where the tree could not be read back otherwise, using the tier each
//!   binary/unary node carries.
//! - KPL has no statement terminators, so nested statement lists that must stay on one line (C-style `for`
//!   headers, nameless functions) are rendered with a fresh formatter and joined with spaces.

use kpl_core::lang::operators::Precedence;
use kpl_syntax::ast::*;
use kpl_syntax::lexer::quote_string;

use super::config::FormatConfig;
use super::writer::FormatWriter;

/// Formatter that transforms AST back to formatted source code
pub struct Formatter {
    writer: FormatWriter,
}

impl Formatter {
    /// Create a new formatter with the given config
    pub fn new(config: FormatConfig) -> Self {
        Self {
            writer: FormatWriter::new(config),
        }
    }

    /// Format a unit and return the formatted source
    pub fn format(mut self, unit: &Unit) -> String {
        self.format_unit(unit);
        self.writer.finish()
    }

    /// Format a single expression with no trailing newline.
    pub fn format_expression(mut self, expr: &Expr) -> String {
        self.format_expr(expr);
        self.writer.finish()
    }

    /// Render something with a fresh formatter and collapse the result onto one line.
    fn inline(&self, f: impl FnOnce(&mut Formatter)) -> String {
        let mut sub = Formatter::new(self.writer.config().clone());
        f(&mut sub);
        let text = sub.writer.finish();
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    // ========================================================================
    // Units
    // ========================================================================

    fn format_unit(&mut self, unit: &Unit) {
        let closer = match unit {
            Unit::Header(header) => {
                self.writer.write("header ");
                self.writer.writeln(&header.name.node);
                if !header.imports.is_empty() {
                    self.format_uses(&header.imports);
                }
                "endHeader"
            }
            Unit::Code(code) => {
                self.writer.write("code ");
                self.writer.writeln(&code.name.node);
                "endCode"
            }
        };

        let blank = self.writer.config().blank_lines_top_level;
        let declarations = unit.declarations();
        for decl in declarations {
            self.writer.blank_lines(blank);
            self.format_declaration(&decl.node);
        }
        if !declarations.is_empty() {
            self.writer.blank_lines(blank);
        }
        self.writer.writeln(closer);
    }

    /// All imports are printed as a single `uses` clause.
    fn format_uses(&mut self, imports: &[Spanned<Import>]) {
        self.writer.write("uses ");
        for (i, import) in imports.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            match &import.node.package.node {
                PackageRef::Name(name) => self.writer.write(name),
                PackageRef::Path(path) => self.writer.write(&quote_string(path)),
            }
            if !import.node.renamings.is_empty() {
                self.writer.write(" renaming ");
                for (j, rename) in import.node.renamings.iter().enumerate() {
                    if j > 0 {
                        self.writer.write(", ");
                    }
                    self.writer.write(&rename.node.from.node);
                    self.writer.write(" to ");
                    self.writer.write(&rename.node.to.node);
                }
            }
        }
        self.writer.newline();
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn format_declaration(&mut self, decl: &Declaration) {
        match decl {
            Declaration::Const(group) => {
                self.writer.writeln("const");
                self.writer.indent();
                for c in &group.consts {
                    self.writer.write(&c.node.name.node);
                    self.writer.write(" = ");
                    self.format_expr(&c.node.value.node);
                    self.writer.newline();
                }
                self.writer.dedent();
            }
            Declaration::Var(group) => self.format_var_group(group),
            Declaration::Type(group) => {
                self.writer.writeln("type");
                self.writer.indent();
                for alias in &group.aliases {
                    self.writer.write(&alias.node.name.node);
                    self.writer.write(" = ");
                    self.format_type(&alias.node.ty.node);
                    self.writer.newline();
                }
                self.writer.dedent();
            }
            Declaration::Enum(en) => self.format_enum(en),
            Declaration::Errors(errors) => {
                self.writer.writeln("errors");
                self.writer.indent();
                for sig in &errors.errors {
                    self.writer.write(&sig.node.name.node);
                    self.format_params(&sig.node.params);
                    self.writer.newline();
                }
                self.writer.dedent();
            }
            Declaration::FunctionProto(proto) => {
                if proto.is_external {
                    self.writer.write("external ");
                }
                self.writer.write("function ");
                self.writer.write(&proto.name.node);
                self.format_params(&proto.params);
                self.format_returns(proto.returns.as_ref());
                self.writer.newline();
            }
            Declaration::Function(func) => self.format_function(func),
            Declaration::Interface(interface) => self.format_interface(interface),
            Declaration::Class(class) => self.format_class(class),
            Declaration::Behavior(behavior) => self.format_behavior(behavior),
        }
    }

    fn format_var_group(&mut self, group: &VarGroup) {
        self.writer.writeln("var");
        self.writer.indent();
        for var in &group.vars {
            self.format_ident_list(&var.node.names);
            self.writer.write(": ");
            self.format_type(&var.node.ty.node);
            if let Some(init) = &var.node.init {
                self.writer.write(" = ");
                // A bare keyword send here would swallow the next declaration's `name:`.
                self.format_expr_at(&init.node, Precedence::Generic);
            }
            self.writer.newline();
        }
        self.writer.dedent();
    }

    fn format_enum(&mut self, en: &EnumDecl) {
        self.writer.write("enum ");
        for (i, variant) in en.variants.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            self.writer.write(&variant.node);
            if i > 0 {
                continue;
            }
            if let Some(start) = &en.start {
                self.writer.write(" = ");
                self.format_expr(&start.node);
            }
        }
        self.writer.newline();
    }

    fn format_function(&mut self, func: &FunctionDecl) {
        self.writer.write("function ");
        self.writer.write(&func.name.node);
        self.format_params(&func.params);
        self.format_returns(func.returns.as_ref());
        self.writer.newline();
        self.format_body(&func.body);
        self.writer.writeln("endFunction");
    }

    /// Locals and statements, one level deeper than the owner.
    fn format_body(&mut self, body: &Body) {
        self.writer.indent();
        if let Some(locals) = &body.locals {
            self.format_var_group(&locals.node);
        }
        for stmt in &body.statements {
            self.format_statement(&stmt.node);
        }
        self.writer.dedent();
    }

    fn format_interface(&mut self, interface: &InterfaceDecl) {
        self.writer.write("interface ");
        self.writer.write(&interface.name.node);
        self.format_type_args(&interface.type_params);
        self.format_extends(&interface.extends);
        self.writer.newline();
        self.writer.indent();
        for member in &interface.members {
            self.format_member(&member.node);
        }
        self.writer.dedent();
        self.writer.writeln("endInterface");
    }

    fn format_class(&mut self, class: &ClassDecl) {
        self.writer.write("class ");
        self.writer.write(&class.name.node);
        self.format_type_args(&class.type_params);
        self.format_extends(&class.extends);
        self.writer.newline();
        self.writer.indent();
        for member in &class.members {
            self.format_member(&member.node);
        }
        self.writer.dedent();
        self.writer.writeln("endClass");
    }

    fn format_behavior(&mut self, behavior: &BehaviorDecl) {
        self.writer.write("behavior ");
        self.writer.writeln(&behavior.name.node);
        self.writer.indent();
        let blank = self.writer.config().blank_lines_members;
        for (i, member) in behavior.members.iter().enumerate() {
            if i > 0 {
                self.writer.blank_lines(blank);
            }
            self.format_member(&member.node);
        }
        self.writer.dedent();
        self.writer.writeln("endBehavior");
    }

    fn format_extends(&mut self, extends: &[Spanned<Ident>]) {
        if !extends.is_empty() {
            self.writer.write(" extends ");
            self.format_ident_list(extends);
        }
    }

    fn format_member(&mut self, member: &MemberDecl) {
        match member {
            MemberDecl::Messages(group) => {
                self.writer.writeln(match group.kind {
                    MessageGroupKind::Messages => "messages",
                    MessageGroupKind::Methods => "methods",
                });
                self.writer.indent();
                for proto in &group.protos {
                    self.format_proto(&proto.node);
                    self.writer.newline();
                }
                self.writer.dedent();
            }
            MemberDecl::Method(method) => {
                self.writer.write("method ");
                self.format_proto(&method.proto.node);
                self.writer.newline();
                self.format_body(&method.body);
                self.writer.writeln("endMethod");
            }
            MemberDecl::Clause(clause) => {
                self.writer.write(match clause.kind {
                    ClauseKind::Implements => "implements",
                    ClauseKind::Superclass => "superclass",
                    ClauseKind::Fields => "fields",
                });
                for token in &clause.tokens {
                    self.writer.write(" ");
                    self.writer.write(&token.node);
                }
                self.writer.newline();
            }
        }
    }

    fn format_proto(&mut self, proto: &MethodProto) {
        match proto {
            MethodProto::Params { name, params, returns } => {
                self.writer.write(&name.node);
                self.format_params(params);
                self.format_returns(returns.as_ref());
            }
            MethodProto::Infix {
                op,
                param,
                param_ty,
                returns,
            } => {
                self.writer.write("infix ");
                self.writer.write(&op.node);
                self.writer.write(" (");
                self.writer.write(&param.node);
                self.writer.write(": ");
                self.format_type(&param_ty.node);
                self.writer.write(")");
                self.format_returns(Some(returns));
            }
            MethodProto::Prefix { op, returns } => {
                self.writer.write("prefix ");
                self.writer.write(&op.node);
                self.writer.write(" ()");
                self.format_returns(Some(returns));
            }
            MethodProto::Keyword { parts, returns } => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        self.writer.write(" ");
                    }
                    self.writer.write(&part.node.label.node);
                    self.writer.write(": (");
                    self.writer.write(&part.node.name.node);
                    self.writer.write(": ");
                    self.format_type(&part.node.ty.node);
                    self.writer.write(")");
                }
                self.format_returns(returns.as_ref());
            }
        }
    }

    fn format_params(&mut self, params: &[Spanned<Param>]) {
        self.writer.write("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            self.format_ident_list(&param.node.names);
            self.writer.write(": ");
            self.format_type(&param.node.ty.node);
        }
        self.writer.write(")");
    }

    fn format_returns(&mut self, returns: Option<&Spanned<Type>>) {
        if let Some(ty) = returns {
            self.writer.write(" returns ");
            self.format_type(&ty.node);
        }
    }

    fn format_ident_list(&mut self, names: &[Spanned<Ident>]) {
        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            self.writer.write(&name.node);
        }
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn format_type(&mut self, ty: &Type) {
        match ty {
            Type::Named { name, args } => {
                self.writer.write(name);
                self.format_type_args(args);
            }
            Type::Pointer(pointee) => {
                self.writer.write("ptr to ");
                self.format_type(&pointee.node);
            }
            Type::Array { dims, element } => {
                self.writer.write("array ");
                if !dims.is_empty() {
                    self.writer.write("[");
                    for (i, dim) in dims.iter().enumerate() {
                        if i > 0 {
                            self.writer.write(", ");
                        }
                        match &dim.node {
                            Dimension::Dynamic => self.writer.write("*"),
                            Dimension::Fixed(size) => self.format_expr(size),
                        }
                    }
                    self.writer.write("] ");
                }
                self.writer.write("of ");
                self.format_type(&element.node);
            }
            Type::Function { params, returns } => {
                self.writer.write("function (");
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.writer.write(", ");
                    }
                    self.format_type(&param.node);
                }
                self.writer.write(")");
                if let Some(ret) = returns {
                    self.writer.write(" returns ");
                    self.format_type(&ret.node);
                }
            }
        }
    }

    fn format_type_args(&mut self, args: &[Spanned<Type>]) {
        if args.is_empty() {
            return;
        }
        self.writer.write("[");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            self.format_type(&arg.node);
        }
        self.writer.write("]");
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn format_block(&mut self, block: &Block) {
        self.writer.indent();
        for stmt in block {
            self.format_statement(&stmt.node);
        }
        self.writer.dedent();
    }

    fn format_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::If(if_stmt) => self.format_if(if_stmt),
            Statement::Assign(assign) => {
                self.format_expr(&assign.target.node);
                self.writer.write(" = ");
                self.format_expr(&assign.value.node);
                self.writer.newline();
            }
            Statement::Call(call) => {
                self.writer.write(&call.callee.node);
                self.format_args(&call.args);
                self.writer.newline();
            }
            Statement::Send(send) => {
                self.format_send(send);
                self.writer.newline();
            }
            Statement::DottedCall(call) => {
                self.format_receiver(&call.receiver.node);
                self.writer.write(".");
                self.writer.write(&call.method.node);
                self.format_args(&call.args);
                self.writer.newline();
            }
            Statement::While(while_stmt) => {
                self.writer.write("while ");
                self.format_expr(&while_stmt.cond.node);
                self.writer.newline();
                self.format_block(&while_stmt.body);
                self.writer.writeln("endWhile");
            }
            Statement::Until(until) => {
                self.writer.writeln("do");
                self.format_block(&until.body);
                self.writer.write("until ");
                self.format_expr(&until.cond.node);
                self.writer.newline();
            }
            Statement::For(ForLoop::Range(range)) => {
                self.writer.write("for ");
                self.format_expr(&range.var.node);
                self.writer.write(" = ");
                self.format_expr(&range.start.node);
                self.writer.write(" to ");
                self.format_expr(&range.end.node);
                if let Some(step) = &range.step {
                    self.writer.write(" by ");
                    self.format_expr(&step.node);
                }
                self.writer.newline();
                self.format_block(&range.body);
                self.writer.writeln("endFor");
            }
            Statement::For(ForLoop::CStyle(cfor)) => self.format_cfor(cfor),
            Statement::Switch(switch) => self.format_switch(switch),
            Statement::Try(try_stmt) => {
                self.writer.writeln("try");
                self.format_block(&try_stmt.body);
                for catch in &try_stmt.catches {
                    self.writer.write("catch ");
                    self.writer.write(&catch.node.error.node);
                    self.format_params(&catch.node.params);
                    self.writer.writeln(":");
                    self.format_block(&catch.node.body);
                }
                self.writer.writeln("endTry");
            }
            Statement::Throw(throw) => {
                self.writer.write("throw ");
                self.writer.write(&throw.error.node);
                self.format_args(&throw.args);
                self.writer.newline();
            }
            Statement::Free(expr) => {
                self.writer.write("free ");
                self.format_expr(&expr.node);
                self.writer.newline();
            }
            Statement::Return(value) => {
                self.writer.write("return");
                if let Some(value) = value {
                    self.writer.write(" ");
                    self.format_expr(&value.node);
                }
                self.writer.newline();
            }
            Statement::Break => self.writer.writeln("break"),
            Statement::Continue => self.writer.writeln("continue"),
            Statement::Debug => self.writer.writeln("debug"),
        }
    }

    fn format_if(&mut self, if_stmt: &IfStmt) {
        for (i, branch) in if_stmt.branches.iter().enumerate() {
            self.writer.write(if i == 0 { "if " } else { "elseIf " });
            self.format_expr(&branch.node.cond.node);
            self.writer.newline();
            self.format_block(&branch.node.body);
        }
        if let Some(else_body) = &if_stmt.else_body {
            self.writer.writeln("else");
            self.format_block(else_body);
        }
        self.writer.writeln("endIf");
    }

    fn format_cfor(&mut self, cfor: &CFor) {
        let init = self.inline(|f| cfor.init.iter().for_each(|s| f.format_statement(&s.node)));
        let update = self.inline(|f| cfor.update.iter().for_each(|s| f.format_statement(&s.node)));

        self.writer.write("for (");
        if !init.is_empty() {
            self.writer.write(" ");
            self.writer.write(&init);
        }
        self.writer.write(" ;");
        if let Some(cond) = &cfor.cond {
            self.writer.write(" ");
            self.format_expr(&cond.node);
        }
        self.writer.write(" ;");
        if !update.is_empty() {
            self.writer.write(" ");
            self.writer.write(&update);
        }
        self.writer.writeln(" )");
        self.format_block(&cfor.body);
        self.writer.writeln("endFor");
    }

    fn format_switch(&mut self, switch: &SwitchStmt) {
        self.writer.write("switch");
        if let Some(subject) = &switch.subject {
            self.writer.write(" ");
            self.format_expr(&subject.node);
        }
        self.writer.newline();
        self.writer.indent();
        for case in &switch.cases {
            self.writer.write("case ");
            self.format_expr(&case.node.value.node);
            self.writer.writeln(":");
            self.format_block(&case.node.body);
        }
        if let Some(default) = &switch.default {
            self.writer.writeln("default:");
            self.format_block(default);
        }
        self.writer.dedent();
        self.writer.writeln("endSwitch");
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Format `expr`, parenthesized if it binds looser than `min`.
    fn format_expr_at(&mut self, expr: &Expr, min: Precedence) {
        if expr.precedence().is_some_and(|p| p < min) {
            self.writer.write("(");
            self.format_expr(expr);
            self.writer.write(")");
        } else {
            self.format_expr(expr);
        }
    }

    /// Operands of prefix and postfix forms must be postfix-level or tighter.
    fn format_receiver(&mut self, expr: &Expr) {
        if expr.precedence().is_some() {
            self.writer.write("(");
            self.format_expr(expr);
            self.writer.write(")");
        } else {
            self.format_expr(expr);
        }
    }

    fn format_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(lit) => self.format_literal(lit),
            Expr::Ident(name) => self.writer.write(name),
            Expr::Binary(binary) => {
                self.format_expr_at(&binary.left.node, binary.tier);
                self.writer.write(" ");
                self.writer.write(&binary.op);
                self.writer.write(" ");
                let right_min = binary.tier.tighter().unwrap_or(Precedence::Prefix);
                self.format_expr_at(&binary.right.node, right_min);
            }
            Expr::Unary(unary) => {
                self.writer.write(&unary.op);
                self.format_receiver(&unary.operand.node);
            }
            Expr::Call(call) => {
                self.format_receiver(&call.callee.node);
                self.format_args(&call.args);
            }
            Expr::Send(send) => self.format_send(send),
            Expr::Member(member) => {
                self.format_receiver(&member.receiver.node);
                self.writer.write(".");
                self.writer.write(&member.member.node);
            }
            Expr::Index(index) => {
                // `T [i]` after a trailing type would read as type arguments.
                if ends_with_type(&index.receiver.node) {
                    self.writer.write("(");
                    self.format_expr(&index.receiver.node);
                    self.writer.write(")");
                } else {
                    self.format_receiver(&index.receiver.node);
                }
                self.writer.write("[");
                self.format_expr_list(&index.indices);
                self.writer.write("]");
            }
            Expr::AsPtrTo(inner, ty) => {
                self.format_receiver(&inner.node);
                self.writer.write(" asPtrTo ");
                self.format_type(&ty.node);
            }
            Expr::AsInteger(inner) => {
                self.format_receiver(&inner.node);
                self.writer.write(" asInteger");
            }
            Expr::ArraySize(inner) => {
                self.format_receiver(&inner.node);
                self.writer.write(" arraySize");
            }
            Expr::TypeTest(test) => {
                self.format_receiver(&test.receiver.node);
                self.writer.write(match test.test {
                    TypeTest::InstanceOf => " isInstanceOf ",
                    TypeTest::KindOf => " isKindOf ",
                });
                self.format_type(&test.ty.node);
            }
            Expr::New(new) => self.format_new(new),
            Expr::SizeOf(ty) => {
                self.writer.write("sizeOf ");
                self.format_type(&ty.node);
            }
            Expr::Function(literal) => {
                let text = self.inline(|f| {
                    f.writer.write("function ");
                    f.format_params(&literal.params);
                    f.format_returns(literal.returns.as_ref());
                    f.writer.newline();
                    f.format_body(&literal.body);
                    f.writer.writeln("endFunction");
                });
                self.writer.write(&text);
            }
        }
    }

    fn format_send(&mut self, send: &SendExpr) {
        self.format_expr_at(&send.receiver.node, Precedence::Generic);
        for part in &send.parts {
            self.writer.write(" ");
            self.writer.write(&part.label.node);
            self.writer.write(": ");
            self.format_expr_at(&part.arg.node, Precedence::Generic);
        }
    }

    fn format_new(&mut self, new: &NewExpr) {
        self.writer.write(match new.allocation {
            Allocation::New => "new ",
            Allocation::Alloc => "alloc ",
        });
        self.format_type(&new.ty.node);
        match &new.init {
            None => {}
            Some(Initializer::Fields(fields)) => {
                self.writer.write(" { ");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        self.writer.write(", ");
                    }
                    self.writer.write(&field.node.name.node);
                    self.writer.write(" = ");
                    self.format_expr(&field.node.value.node);
                }
                self.writer.write(" }");
            }
            Some(Initializer::Array(elements)) => {
                self.writer.write(" { ");
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        self.writer.write(", ");
                    }
                    if let Some(count) = &element.node.count {
                        self.format_expr(&count.node);
                        self.writer.write(" of ");
                    }
                    self.format_expr(&element.node.value.node);
                }
                self.writer.write(" }");
            }
        }
    }

    fn format_args(&mut self, args: &[Spanned<Expr>]) {
        self.writer.write("(");
        self.format_expr_list(args);
        self.writer.write(")");
    }

    fn format_expr_list(&mut self, items: &[Spanned<Expr>]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.writer.write(", ");
            }
            self.format_expr(&item.node);
        }
    }

    fn format_literal(&mut self, lit: &Literal) {
        match lit {
            Literal::Int(n) => self.writer.write(&n.to_string()),
            Literal::Double(f) => {
                let mut text = f.to_string();
                if !text.contains('.') {
                    text.push_str(".0");
                }
                self.writer.write(&text);
            }
            Literal::Char(c) => self.writer.write(&format!("'{c}'")),
            Literal::String(s) => self.writer.write(&quote_string(s)),
            Literal::Bool(true) => self.writer.write("true"),
            Literal::Bool(false) => self.writer.write("false"),
            Literal::Null => self.writer.write("null"),
            Literal::SelfRef => self.writer.write("self"),
            Literal::Super => self.writer.write("super"),
        }
    }
}

/// Whether the printed form of `expr` ends with a type.
fn ends_with_type(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::AsPtrTo(..) | Expr::TypeTest(_) | Expr::SizeOf(_) | Expr::New(NewExpr { init: None, .. })
    )
}
