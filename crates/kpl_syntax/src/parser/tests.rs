#[cfg(test)]
/// Parser unit tests.
///
/// These tests focus on correctness of specific syntactic forms and on the parser’s
/// error recovery behavior (avoiding cascaded errors).
mod tests {
    use super::*;
    use crate::diagnostics::{ErrorKind, Severity};

    /// Render an expression as a compact prefix form: `+(1, *(2, 3))`.
    fn shape(expr: &Expr) -> String {
        match expr {
            Expr::Literal(Literal::Int(v)) => v.to_string(),
            Expr::Literal(other) => format!("{other:?}"),
            Expr::Ident(name) => name.clone(),
            Expr::Binary(b) => format!("{}({}, {})", b.op, shape(&b.left.node), shape(&b.right.node)),
            Expr::Unary(u) => format!("{}({})", u.op, shape(&u.operand.node)),
            Expr::Call(c) => {
                let args: Vec<String> = c.args.iter().map(|a| shape(&a.node)).collect();
                format!("call({}; {})", shape(&c.callee.node), args.join(", "))
            }
            Expr::Member(m) => format!("{}.{}", shape(&m.receiver.node), m.member.node),
            Expr::Index(i) => {
                let idx: Vec<String> = i.indices.iter().map(|a| shape(&a.node)).collect();
                format!("{}[{}]", shape(&i.receiver.node), idx.join(", "))
            }
            Expr::Send(s) => {
                let parts: Vec<String> = s
                    .parts
                    .iter()
                    .map(|p| format!("{}: {}", p.label.node, shape(&p.arg.node)))
                    .collect();
                format!("send({}; {})", shape(&s.receiver.node), parts.join(", "))
            }
            Expr::AsInteger(e) => format!("asInteger({})", shape(&e.node)),
            Expr::ArraySize(e) => format!("arraySize({})", shape(&e.node)),
            other => format!("{other:?}"),
        }
    }

    fn expr_shape(source: &str) -> String {
        let expr = parse_expression(source).unwrap_or_else(|e| panic!("{source:?} failed to parse: {e:?}"));
        shape(&expr.node)
    }

    fn parse_ok(source: &str) -> Unit {
        let (unit, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "unexpected diagnostics for {source:?}: {diagnostics:#?}");
        unit
    }

    fn single_statement(source: &str) -> Statement {
        let mut block = parse_statements(source).unwrap_or_else(|e| panic!("{source:?} failed to parse: {e:?}"));
        assert_eq!(block.len(), 1, "expected one statement in {source:?}");
        block.remove(0).node
    }

    fn code_function(unit: &Unit) -> &FunctionDecl {
        match &unit.declarations()[0].node {
            Declaration::Function(f) => f,
            other => panic!("Expected function, got {other:?}"),
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    #[test]
    fn test_multiplicative_binds_tighter_than_additive() {
        assert_eq!(expr_shape("1+2*3"), "+(1, *(2, 3))");
        assert_eq!(expr_shape("1*2+3"), "+(*(1, 2), 3)");
    }

    #[test]
    fn test_logical_and_binds_tighter_than_or() {
        assert_eq!(expr_shape("a || b && c"), "||(a, &&(b, c))");
    }

    #[test]
    fn test_binary_tiers_are_left_associative() {
        assert_eq!(expr_shape("1-2-3"), "-(-(1, 2), 3)");
        assert_eq!(expr_shape("a == b != c"), "!=(==(a, b), c)");
    }

    #[test]
    fn test_full_tier_ladder() {
        assert_eq!(
            expr_shape("a | b ^ c & d == e < f << g + h * i"),
            "|(a, ^(b, &(c, ==(d, <(e, <<(f, +(g, *(h, i))))))))"
        );
    }

    #[test]
    fn test_generic_operator_is_loosest_binary_tier() {
        assert_eq!(expr_shape("a +++ b || c"), "+++(a, ||(b, c))");
        assert_eq!(expr_shape("a @ b @ c"), "@(@(a, b), c)");
    }

    #[test]
    fn test_binary_node_records_resolved_tier() {
        let expr = parse_expression("a <= b").unwrap();
        let Expr::Binary(b) = expr.node else { panic!("Expected binary") };
        assert_eq!(b.tier, Precedence::Relational);
        assert_eq!(expr.span, Span::new(0, 6));
    }

    #[test]
    fn test_prefix_operators_bind_tightest() {
        assert_eq!(expr_shape("- a * b"), "*(-(a), b)");
        assert_eq!(expr_shape("- - a"), "-(-(a))");
        assert_eq!(expr_shape("~ x.y"), "~(x.y)");
    }

    #[test]
    fn test_parentheses_group_without_a_node() {
        assert_eq!(expr_shape("(1 + 2) * 3"), "*(+(1, 2), 3)");
        let expr = parse_expression("(x)").unwrap();
        assert_eq!(expr.node, Expr::Ident("x".into()));
        assert_eq!(expr.span, Span::new(0, 3));
    }

    #[test]
    fn test_postfix_chain_applies_left_to_right() {
        assert_eq!(expr_shape("a.b.c(1,2)"), "call(a.b.c; 1, 2)");
        assert_eq!(expr_shape("a.b(1)[2] asInteger"), "asInteger(call(a.b; 1)[2])");
        assert_eq!(expr_shape("m[i, j] arraySize"), "arraySize(m[i, j])");
    }

    #[test]
    fn test_plain_call_has_identifier_callee() {
        assert_eq!(expr_shape("f()"), "call(f; )");
        assert_eq!(expr_shape("f(g(1), 2)"), "call(f; call(g; 1), 2)");
    }

    #[test]
    fn test_keyword_send_is_loosest_tier() {
        assert_eq!(expr_shape("d at: i + 1 put: x"), "send(d; at: +(i, 1), put: x)");
        let expr = parse_expression("d at: 1 put: 2").unwrap();
        let Expr::Send(send) = expr.node else { panic!("Expected send") };
        assert_eq!(send.selector(), "at:put:");
    }

    #[test]
    fn test_nested_keyword_send_needs_parentheses() {
        assert_eq!(expr_shape("a foo: (b bar: c)"), "send(a; foo: send(b; bar: c))");
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_expression("42").unwrap().node, Expr::Literal(Literal::Int(42)));
        assert_eq!(parse_expression("2.5").unwrap().node, Expr::Literal(Literal::Double(2.5)));
        assert_eq!(parse_expression("'c'").unwrap().node, Expr::Literal(Literal::Char('c')));
        assert_eq!(
            parse_expression(r#""hi\n""#).unwrap().node,
            Expr::Literal(Literal::String("hi\n".into()))
        );
        assert_eq!(parse_expression("true").unwrap().node, Expr::Literal(Literal::Bool(true)));
        assert_eq!(parse_expression("null").unwrap().node, Expr::Literal(Literal::Null));
        assert_eq!(parse_expression("self").unwrap().node, Expr::Literal(Literal::SelfRef));
        assert_eq!(parse_expression("super").unwrap().node, Expr::Literal(Literal::Super));
    }

    #[test]
    fn test_casts_and_type_tests() {
        let expr = parse_expression("p asPtrTo ptr to int").unwrap();
        let Expr::AsPtrTo(_, ty) = expr.node else { panic!("Expected asPtrTo") };
        assert!(matches!(ty.node, Type::Pointer(_)));

        let expr = parse_expression("x isKindOf Shape && ok").unwrap();
        let Expr::Binary(b) = expr.node else { panic!("Expected binary") };
        let Expr::TypeTest(test) = &b.left.node else { panic!("Expected type test") };
        assert_eq!(test.test, TypeTest::KindOf);
        assert_eq!(test.ty.node, Type::named("Shape"));
    }

    #[test]
    fn test_new_with_field_initializers() {
        let expr = parse_expression("new Point { x = 1, y = 2 }").unwrap();
        let Expr::New(new) = expr.node else { panic!("Expected new") };
        assert_eq!(new.allocation, Allocation::New);
        assert_eq!(new.ty.node, Type::named("Point"));
        let Some(Initializer::Fields(fields)) = new.init else { panic!("Expected field initializers") };
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1].node.name.node, "y");
    }

    #[test]
    fn test_alloc_with_array_initializers() {
        let expr = parse_expression("alloc array [*] of int { 10 of 0, 7 }").unwrap();
        let Expr::New(new) = expr.node else { panic!("Expected alloc") };
        assert_eq!(new.allocation, Allocation::Alloc);
        let Type::Array { dims, element } = &new.ty.node else { panic!("Expected array type") };
        assert_eq!(dims[0].node, Dimension::Dynamic);
        assert_eq!(element.node, Type::named("int"));
        let Some(Initializer::Array(elements)) = new.init else { panic!("Expected array initializers") };
        assert_eq!(elements[0].node.count.as_ref().map(|c| &c.node), Some(&Expr::Literal(Literal::Int(10))));
        assert!(elements[1].node.count.is_none());
    }

    #[test]
    fn test_bare_new_and_size_of() {
        let expr = parse_expression("new List [int]").unwrap();
        let Expr::New(new) = expr.node else { panic!("Expected new") };
        assert!(new.init.is_none());
        let Type::Named { name, args } = new.ty.node else { panic!("Expected named type") };
        assert_eq!(name, "List");
        assert_eq!(args.len(), 1);

        let expr = parse_expression("sizeOf array [10] of char").unwrap();
        assert!(matches!(expr.node, Expr::SizeOf(_)));
    }

    #[test]
    fn test_empty_initializer_is_rejected() {
        let errors = parse_expression("new Point {}").unwrap_err();
        assert!(errors[0].message.contains("at least one initializer"));
    }

    #[test]
    fn test_function_literal() {
        let expr = parse_expression("function (a: int) returns int return a * 2 endFunction").unwrap();
        let Expr::Function(f) = expr.node else { panic!("Expected function literal") };
        assert_eq!(f.params.len(), 1);
        assert_eq!(f.returns.as_ref().map(|t| &t.node), Some(&Type::named("int")));
        assert_eq!(f.body.statements.len(), 1);
    }

    #[test]
    fn test_function_type() {
        let expr = parse_expression("sizeOf function (int, ptr to char) returns bool").unwrap();
        let Expr::SizeOf(ty) = expr.node else { panic!("Expected sizeOf") };
        let Type::Function { params, returns } = ty.node else { panic!("Expected function type") };
        assert_eq!(params.len(), 2);
        assert!(returns.is_some());
    }

    #[test]
    fn test_ptr_and_array_are_plain_names_otherwise() {
        assert_eq!(expr_shape("ptr + array"), "+(ptr, array)");
    }

    #[test]
    fn test_trailing_tokens_after_expression_are_rejected() {
        let errors = parse_expression("a b").unwrap_err();
        assert!(errors[0].message.contains("Expected end of input"));
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    #[test]
    fn test_range_for_with_step() {
        let Statement::For(ForLoop::Range(range)) = single_statement("for i = 1 to 10 by 2 debug endFor") else {
            panic!("Expected range for");
        };
        assert_eq!(range.var.node, Expr::Ident("i".into()));
        assert_eq!(range.end.node, Expr::Literal(Literal::Int(10)));
        assert_eq!(range.step.map(|s| s.node), Some(Expr::Literal(Literal::Int(2))));
        assert_eq!(range.body.len(), 1);
    }

    #[test]
    fn test_c_style_for_with_empty_init_and_update() {
        let Statement::For(ForLoop::CStyle(c)) = single_statement("for ( ; x < 10 ; ) debug endFor") else {
            panic!("Expected C-style for");
        };
        assert!(c.init.is_empty());
        assert!(c.update.is_empty());
        assert_eq!(c.cond.map(|e| shape(&e.node)).as_deref(), Some("<(x, 10)"));
        assert_eq!(c.body, vec![Spanned::synthetic(Statement::Debug)]);
    }

    #[test]
    fn test_c_style_for_with_statement_lists() {
        let Statement::For(ForLoop::CStyle(c)) =
            single_statement("for ( i = 0 j = 0 ; ; i = i + 1 ) free p endFor")
        else {
            panic!("Expected C-style for");
        };
        assert_eq!(c.init.len(), 2);
        assert!(c.cond.is_none());
        assert_eq!(c.update.len(), 1);
    }

    #[test]
    fn test_for_variable_must_be_lvalue() {
        let errors = parse_statements("for f() = 1 to 2 endFor").unwrap_err();
        assert!(errors[0].message.contains("Invalid 'for' loop variable"));
    }

    #[test]
    fn test_if_elseif_else() {
        let Statement::If(stmt) = single_statement("if a debug elseIf b break elseIf c continue else return endIf")
        else {
            panic!("Expected if");
        };
        assert_eq!(stmt.branches.len(), 3);
        assert_eq!(stmt.else_body.map(|b| b.len()), Some(1));
    }

    #[test]
    fn test_until_loop() {
        let Statement::Until(stmt) = single_statement("do x = x - 1 until x == 0") else {
            panic!("Expected do/until");
        };
        assert_eq!(stmt.body.len(), 1);
        assert_eq!(shape(&stmt.cond.node), "==(x, 0)");
    }

    #[test]
    fn test_switch_with_cases_and_default() {
        let Statement::Switch(stmt) = single_statement("switch k case 1: debug case 2: break default: free p endSwitch")
        else {
            panic!("Expected switch");
        };
        assert!(stmt.subject.is_some());
        assert_eq!(stmt.cases.len(), 2);
        assert!(stmt.default.is_some());
    }

    #[test]
    fn test_empty_switch_is_a_warning() {
        let (_, diagnostics) = parse("code A function f() switch k endSwitch endFunction endCode");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_try_catch_and_throw() {
        let Statement::Try(stmt) =
            single_statement("try throw Oops(1) catch Oops(code: int): debug catch Other(): break endTry")
        else {
            panic!("Expected try");
        };
        assert_eq!(stmt.catches.len(), 2);
        assert_eq!(stmt.catches[0].node.error.node, "Oops");
        assert_eq!(stmt.catches[0].node.params.len(), 1);
        let Statement::Throw(throw) = &stmt.body[0].node else { panic!("Expected throw") };
        assert_eq!(throw.args.len(), 1);
    }

    #[test]
    fn test_return_with_and_without_value() {
        assert_eq!(single_statement("return"), Statement::Return(None));
        let Statement::Return(Some(value)) = single_statement("return a + 1") else {
            panic!("Expected return with value");
        };
        assert_eq!(shape(&value.node), "+(a, 1)");
    }

    #[test]
    fn test_expression_statement_classification() {
        assert!(matches!(single_statement("x = 1"), Statement::Assign(_)));
        assert!(matches!(single_statement("a.b[1] = 1"), Statement::Assign(_)));
        assert!(matches!(single_statement("f(1)"), Statement::Call(_)));
        assert!(matches!(single_statement("d at: 1 put: 2"), Statement::Send(_)));

        let Statement::DottedCall(call) = single_statement("a.b.c(1, 2)") else {
            panic!("Expected dotted call");
        };
        assert_eq!(shape(&call.receiver.node), "a.b");
        assert_eq!(call.method.node, "c");
        assert_eq!(call.args.len(), 2);
    }

    #[test]
    fn test_bare_expression_is_not_a_statement() {
        let errors = parse_statements("a + b").unwrap_err();
        assert_eq!(errors[0].kind, ErrorKind::Syntax);
        assert!(errors[0].message.contains("Expected a statement"));
    }

    #[test]
    fn test_invalid_assignment_target() {
        let errors = parse_statements("f() = 1").unwrap_err();
        assert!(errors[0].message.contains("Invalid assignment target"));
    }

    // ------------------------------------------------------------------------
    // Units and declarations
    // ------------------------------------------------------------------------

    #[test]
    fn test_header_with_single_import() {
        let Unit::Header(header) = parse_ok("header Foo uses Bar endHeader") else {
            panic!("Expected header unit");
        };
        assert_eq!(header.name.node, "Foo");
        assert_eq!(header.imports.len(), 1);
        assert_eq!(header.imports[0].node.package.node, PackageRef::Name("Bar".into()));
        assert!(header.declarations.is_empty());
    }

    #[test]
    fn test_uses_with_renamings_and_paths() {
        let source = r#"header H uses A renaming x to y, z to w, B uses "lib/c" endHeader"#;
        let Unit::Header(header) = parse_ok(source) else { panic!("Expected header unit") };
        assert_eq!(header.imports.len(), 3);
        assert_eq!(header.imports[0].node.renamings.len(), 2);
        assert_eq!(header.imports[0].node.renamings[1].node.to.node, "w");
        assert_eq!(header.imports[1].node.package.node, PackageRef::Name("B".into()));
        assert_eq!(header.imports[2].node.package.node, PackageRef::Path("lib/c".into()));
    }

    #[test]
    fn test_broken_uses_clause_keeps_later_imports() {
        let (unit, diagnostics) = parse("header A uses , uses B endHeader");
        assert_eq!(diagnostics.len(), 1, "{diagnostics:#?}");
        assert_eq!(diagnostics[0].kind, ErrorKind::Syntax);
        let Unit::Header(header) = &unit else {
            panic!("expected a header unit");
        };
        assert_eq!(header.imports.len(), 1);
        assert_eq!(header.imports[0].node.package.node, PackageRef::Name("B".to_string()));
    }

    #[test]
    fn test_duplicate_import_is_a_warning() {
        let (_, diagnostics) = parse("header H uses A, B, A endHeader");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("more than once"));
    }

    #[test]
    fn test_code_unit_with_function() {
        let unit = parse_ok("code Foo function f() returns int var x:int = 1 return x endFunction endCode");
        let Unit::Code(code) = &unit else { panic!("Expected code unit") };
        assert_eq!(code.name.node, "Foo");
        let f = code_function(&unit);
        assert_eq!(f.name.node, "f");
        assert_eq!(f.returns.as_ref().map(|t| &t.node), Some(&Type::named("int")));
        let locals = f.body.locals.as_ref().expect("locals");
        assert_eq!(locals.node.vars[0].node.init.as_ref().map(|e| &e.node), Some(&Expr::Literal(Literal::Int(1))));
        assert_eq!(f.body.statements.len(), 1);
    }

    #[test]
    fn test_header_functions_are_prototypes() {
        let unit = parse_ok("header H function f(a, b: int, c: char) returns bool external function g() endHeader");
        let Declaration::FunctionProto(f) = &unit.declarations()[0].node else { panic!("Expected prototype") };
        assert!(!f.is_external);
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].node.names.len(), 2);
        let Declaration::FunctionProto(g) = &unit.declarations()[1].node else { panic!("Expected prototype") };
        assert!(g.is_external);
    }

    #[test]
    fn test_declaration_groups() {
        let source = "header H
            const A = 1 B = A + 1
            var x, y: int z: ptr to char = null
            type Name = ptr to array of char Pair = Tuple [int, int]
            enum Red = 1, Green, Blue
            errors Oops (code: int) Empty ()
        endHeader";
        let unit = parse_ok(source);
        let decls = unit.declarations();
        assert_eq!(decls.len(), 5);
        let Declaration::Const(c) = &decls[0].node else { panic!("Expected const") };
        assert_eq!(c.consts.len(), 2);
        let Declaration::Var(v) = &decls[1].node else { panic!("Expected var") };
        assert_eq!(v.vars.len(), 2);
        assert_eq!(v.vars[0].node.names.len(), 2);
        let Declaration::Type(t) = &decls[2].node else { panic!("Expected type") };
        assert_eq!(t.aliases.len(), 2);
        let Declaration::Enum(e) = &decls[3].node else { panic!("Expected enum") };
        assert_eq!(e.variants.len(), 3);
        assert!(e.start.is_some());
        let Declaration::Errors(errs) = &decls[4].node else { panic!("Expected errors") };
        assert_eq!(errs.errors.len(), 2);
    }

    #[test]
    fn test_interface_with_prototype_shapes() {
        let source = "header H
            interface Coll [T] extends Base, Other
                messages
                    size () returns int
                    infix + (other: Coll) returns Coll
                    prefix - () returns Coll
                    at: (i: int) put: (v: T)
            endInterface
        endHeader";
        let unit = parse_ok(source);
        let Declaration::Interface(i) = &unit.declarations()[0].node else { panic!("Expected interface") };
        assert_eq!(i.type_params.len(), 1);
        assert_eq!(i.extends.len(), 2);
        let MemberDecl::Messages(group) = &i.members[0].node else { panic!("Expected messages") };
        let selectors: Vec<String> = group.protos.iter().map(|p| p.node.selector()).collect();
        assert_eq!(selectors, vec!["size", "+", "-", "at:put:"]);
        assert!(matches!(group.protos[1].node, MethodProto::Infix { .. }));
        assert!(matches!(group.protos[2].node, MethodProto::Prefix { .. }));
    }

    #[test]
    fn test_method_named_infix_uses_parameter_shape() {
        let unit = parse_ok("header H interface I messages infix (a: int) endInterface endHeader");
        let Declaration::Interface(i) = &unit.declarations()[0].node else { panic!("Expected interface") };
        let MemberDecl::Messages(group) = &i.members[0].node else { panic!("Expected messages") };
        assert!(matches!(&group.protos[0].node, MethodProto::Params { name, .. } if name.node == "infix"));
    }

    #[test]
    fn test_class_clauses_are_opaque() {
        let source = "header H
            class Point superclass Object fields x, y: int extends Shape
                implements Printable
                methods
                    print ()
            endClass
        endHeader";
        let unit = parse_ok(source);
        let Declaration::Class(c) = &unit.declarations()[0].node else { panic!("Expected class") };
        assert_eq!(c.extends.len(), 1);
        assert_eq!(c.members.len(), 4);
        let MemberDecl::Clause(fields) = &c.members[1].node else { panic!("Expected fields clause") };
        assert_eq!(fields.kind, ClauseKind::Fields);
        let lexemes: Vec<&str> = fields.tokens.iter().map(|t| t.node.as_str()).collect();
        assert_eq!(lexemes, vec!["x", ",", "y", ":", "int"]);
    }

    #[test]
    fn test_duplicate_extends_is_structural() {
        let (_, diagnostics) = parse("header H class C extends A extends B endClass endHeader");
        assert_eq!(diagnostics[0].kind, ErrorKind::Structural);
    }

    #[test]
    fn test_behavior_in_code_unit() {
        let source = "code C
            behavior Point
                method size () return 1 endMethod
                method at: (i: int) var t: int t = i return t endMethod
            endBehavior
        endCode";
        let unit = parse_ok(source);
        let Declaration::Behavior(b) = &unit.declarations()[0].node else { panic!("Expected behavior") };
        assert_eq!(b.members.len(), 2);
        let MemberDecl::Method(m) = &b.members[1].node else { panic!("Expected method") };
        assert!(m.body.locals.is_some());
        assert_eq!(m.body.statements.len(), 2);
    }

    #[test]
    fn test_behavior_in_header_is_structural() {
        let (unit, diagnostics) = parse("header H behavior B endBehavior const K = 1 endHeader");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::Structural);
        assert_eq!(unit.declarations().len(), 1);
    }

    // ------------------------------------------------------------------------
    // Errors and recovery
    // ------------------------------------------------------------------------

    #[test]
    fn test_missing_closer_names_the_construct() {
        let source = "code A function f() while x debug endFunction endCode";
        let (_, diagnostics) = parse(source);
        assert_eq!(diagnostics.len(), 1, "{diagnostics:#?}");
        let d = &diagnostics[0];
        assert_eq!(d.kind, ErrorKind::Syntax);
        assert!(d.message.contains("'endWhile'") && d.message.contains("'while' loop"), "{}", d.message);
        assert_eq!(d.related.len(), 1);
        assert_eq!(d.related[0].0.start, source.find("while").unwrap());
    }

    #[test]
    fn test_missing_unit_closer() {
        let (unit, diagnostics) = parse("code A const K = 1");
        assert_eq!(unit.declarations().len(), 1);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("'endCode'"));
    }

    #[test]
    fn test_recovery_reports_each_broken_statement() {
        let source = "code A function f() x = debug y = 1 z + 1 free q endFunction endCode";
        let (unit, diagnostics) = parse(source);
        assert_eq!(diagnostics.len(), 2, "{diagnostics:#?}");
        let f = code_function(&unit);
        // `debug`, `y = 1`, and `free q` survive.
        assert_eq!(f.body.statements.len(), 3);
    }

    #[test]
    fn test_recovery_resumes_at_next_declaration() {
        let source = "code A const = 1 function f() debug endFunction endCode";
        let (unit, diagnostics) = parse(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::Structural);
        assert_eq!(unit.declarations().len(), 1);
    }

    #[test]
    fn test_missing_unit_keyword() {
        let (unit, diagnostics) = parse("function f() endFunction");
        assert_eq!(diagnostics[0].kind, ErrorKind::Structural);
        assert_eq!(unit.kind(), UnitKind::Code);
        assert!(unit.name().node.is_empty());
    }

    #[test]
    fn test_tokens_after_unit_are_structural() {
        let (_, diagnostics) = parse("code A endCode const K = 1");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::Structural);
    }

    #[test]
    fn test_lexical_errors_do_not_stop_parsing() {
        let (unit, diagnostics) = parse("code A const K = 1 \u{00e9} endCode");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::Lexical);
        assert_eq!(unit.declarations().len(), 1);
    }

    /// Run `f` on a thread with a 2 MiB stack, the size of a default spawned thread.
    fn on_small_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::Builder::new()
            .stack_size(2 << 20)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    /// `x = <parens>1` inside a function body, which holds `parens + 2` nesting levels.
    fn assignment_with_parens(parens: usize) -> String {
        format!(
            "code A function f() x = {}1{} endFunction endCode",
            "(".repeat(parens),
            ")".repeat(parens)
        )
    }

    fn depth_errors(diagnostics: &[Diagnostic]) -> usize {
        diagnostics.iter().filter(|d| d.kind == ErrorKind::DepthExceeded).count()
    }

    #[test]
    fn test_deep_parentheses_hit_the_ceiling() {
        let errors = on_small_stack(|| {
            let source = format!("{}1{}", "(".repeat(500), ")".repeat(500));
            parse_expression(&source).unwrap_err()
        });
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::DepthExceeded);
    }

    #[test]
    fn test_parentheses_up_to_the_ceiling_parse_cleanly() {
        let (unit, diagnostics) = on_small_stack(|| parse(&assignment_with_parens(DEFAULT_MAX_DEPTH - 2)));
        assert!(diagnostics.is_empty(), "{diagnostics:#?}");
        assert_eq!(unit.declarations().len(), 1);

        let (_, diagnostics) = on_small_stack(|| parse(&assignment_with_parens(DEFAULT_MAX_DEPTH - 1)));
        assert_eq!(depth_errors(&diagnostics), 1);
    }

    #[test]
    fn test_long_operator_chain_hits_the_ceiling() {
        let chain = |terms: usize| format!("code A function f() x = 1{} endFunction endCode", " + 1".repeat(terms - 1));

        let (_, diagnostics) = on_small_stack(move || parse(&chain(30)));
        assert!(diagnostics.is_empty(), "{diagnostics:#?}");

        let (_, diagnostics) = on_small_stack(move || parse(&chain(5000)));
        assert_eq!(depth_errors(&diagnostics), 1);
        assert_eq!(diagnostics.len(), 1, "abort must not cascade: {diagnostics:#?}");
    }

    #[test]
    fn test_long_operator_chain_stays_left_associative() {
        let expr = parse_expression("a - b + c * d - e").unwrap();
        let Expr::Binary(outer) = &expr.node else {
            panic!("expected a binary expression, got {:?}", expr.node);
        };
        assert_eq!(outer.op, "-");
        assert!(matches!(outer.right.node, Expr::Ident(ref name) if name == "e"));
        let Expr::Binary(middle) = &outer.left.node else {
            panic!("expected a nested binary expression");
        };
        assert_eq!(middle.op, "+");
        assert!(matches!(middle.right.node, Expr::Binary(ref product) if product.op == "*"));
    }

    #[test]
    fn test_long_postfix_chain_hits_the_ceiling() {
        let chain = |links: usize| format!("code A function f() x = a{} endFunction endCode", ".b".repeat(links));

        let (_, diagnostics) = on_small_stack(move || parse(&chain(20)));
        assert!(diagnostics.is_empty(), "{diagnostics:#?}");

        let (_, diagnostics) = on_small_stack(move || parse(&chain(5000)));
        assert_eq!(depth_errors(&diagnostics), 1);
    }

    #[test]
    fn test_depth_exceeded_aborts_and_returns_partial_unit() {
        let nested = format!("{}debug{}", "if x ".repeat(200), " endIf".repeat(200));
        let source = format!("code A const K = 1 function f() {nested} endFunction function g() endFunction endCode");
        let (unit, diagnostics) = parse(&source);
        let depth: Vec<_> = diagnostics.iter().filter(|d| d.kind == ErrorKind::DepthExceeded).collect();
        assert_eq!(depth.len(), 1);
        assert_eq!(diagnostics.len(), 1, "abort must not cascade: {diagnostics:#?}");
        // Only the declaration finished before the abort remains.
        assert_eq!(unit.declarations().len(), 1);
    }

    #[test]
    fn test_configured_depth_limit() {
        let config = ParserConfig::default().with_max_depth(4);
        let (_, diagnostics) = parse_with_config("code A const K = ((((1)))) endCode", &config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, ErrorKind::DepthExceeded);

        let (_, diagnostics) = parse_with_config("code A const K = ((1)) endCode", &config);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_parse_tokens_without_trailing_eof() {
        let tokens: Vec<Token> = lexer::lex("code A endCode")
            .unwrap()
            .into_iter()
            .filter(|t| !t.is_eof())
            .collect();
        let (unit, diagnostics) = parse_tokens(&tokens, &ParserConfig::default());
        assert!(diagnostics.is_empty());
        assert_eq!(unit.name().node, "A");
    }
}
