//! Abstract Syntax Tree for KPL.
//!
//! Every node is owned by its parent (a strict tree, no sharing) and every node the parser produces is wrapped in
//! [`Spanned`] so diagnostics and tooling can map it back to source text.
//!
//! ## Notes
//! - Equality on [`Spanned`] compares nodes only. Two trees are equal when they have the same *structure*, regardless
//!   of where in the source they came from; this is what the formatter round-trip relies on.
//! - Binary and unary nodes record the precedence tier the parser resolved, so a printer can decide parenthesization
//!   without re-deriving it.

use kpl_core::lang::operators::Precedence;

/// Source location span (byte offsets, end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A node with source location
#[derive(Debug, Clone)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    /// Wrap a node with an empty span (used by generators and synthesized trees).
    pub fn synthetic(node: T) -> Self {
        Self {
            node,
            span: Span::default(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned {
            node: f(self.node),
            span: self.span,
        }
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

pub type Ident = String;

/// Statement list; children are ordered as written.
pub type Block = Vec<Spanned<Statement>>;

// ============================================================================
// Units
// ============================================================================

/// One parsed translation unit.
#[derive(Debug, Clone, PartialEq)]
pub enum Unit {
    Header(HeaderUnit),
    Code(CodeUnit),
}

/// Which grammar a unit was parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Header,
    Code,
}

impl Unit {
    pub fn kind(&self) -> UnitKind {
        match self {
            Unit::Header(_) => UnitKind::Header,
            Unit::Code(_) => UnitKind::Code,
        }
    }

    pub fn name(&self) -> &Spanned<Ident> {
        match self {
            Unit::Header(h) => &h.name,
            Unit::Code(c) => &c.name,
        }
    }

    pub fn declarations(&self) -> &[Spanned<Declaration>] {
        match self {
            Unit::Header(h) => &h.declarations,
            Unit::Code(c) => &c.declarations,
        }
    }
}

/// `header Name uses ... <declarations> endHeader`
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderUnit {
    pub name: Spanned<Ident>,
    /// Packages from every `uses` clause, in source order.
    pub imports: Vec<Spanned<Import>>,
    pub declarations: Vec<Spanned<Declaration>>,
}

/// `code Name <declarations> endCode`
#[derive(Debug, Clone, PartialEq)]
pub struct CodeUnit {
    pub name: Spanned<Ident>,
    pub declarations: Vec<Spanned<Declaration>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub package: Spanned<PackageRef>,
    pub renamings: Vec<Spanned<Rename>>,
}

/// A package is named either by identifier or by a quoted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageRef {
    Name(Ident),
    Path(String),
}

/// `original to alias`
#[derive(Debug, Clone, PartialEq)]
pub struct Rename {
    pub from: Spanned<Ident>,
    pub to: Spanned<Ident>,
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Const(ConstGroup),
    Var(VarGroup),
    Type(TypeGroup),
    Enum(EnumDecl),
    Errors(ErrorsDecl),
    /// Signature only: any `function` in a header unit, or `external function` anywhere.
    FunctionProto(FunctionProto),
    Function(FunctionDecl),
    Interface(InterfaceDecl),
    Class(ClassDecl),
    Behavior(BehaviorDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstGroup {
    pub consts: Vec<Spanned<ConstDecl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstDecl {
    pub name: Spanned<Ident>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarGroup {
    pub vars: Vec<Spanned<VarDecl>>,
}

/// `a, b: T = init`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub names: Vec<Spanned<Ident>>,
    pub ty: Spanned<Type>,
    pub init: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeGroup {
    pub aliases: Vec<Spanned<TypeAlias>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAlias {
    pub name: Spanned<Ident>,
    pub ty: Spanned<Type>,
}

/// `enum A = 1, B, C`; `start` is the value of the first variant.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub variants: Vec<Spanned<Ident>>,
    pub start: Option<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorsDecl {
    pub errors: Vec<Spanned<ErrorSig>>,
}

/// One exception signature usable by `throw` and `catch`.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorSig {
    pub name: Spanned<Ident>,
    pub params: Vec<Spanned<Param>>,
}

/// A parameter group: `a, b: int`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub names: Vec<Spanned<Ident>>,
    pub ty: Spanned<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProto {
    pub is_external: bool,
    pub name: Spanned<Ident>,
    pub params: Vec<Spanned<Param>>,
    pub returns: Option<Spanned<Type>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Spanned<Ident>,
    pub params: Vec<Spanned<Param>>,
    pub returns: Option<Spanned<Type>>,
    pub body: Body,
}

/// Executable body of a function, nameless function, or method.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub locals: Option<Spanned<VarGroup>>,
    pub statements: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceDecl {
    pub name: Spanned<Ident>,
    pub type_params: Vec<Spanned<Type>>,
    pub extends: Vec<Spanned<Ident>>,
    pub members: Vec<Spanned<MemberDecl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: Spanned<Ident>,
    pub type_params: Vec<Spanned<Type>>,
    pub extends: Vec<Spanned<Ident>>,
    pub members: Vec<Spanned<MemberDecl>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorDecl {
    pub name: Spanned<Ident>,
    pub members: Vec<Spanned<MemberDecl>>,
}

/// Members owned by a class, interface, or behavior, in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberDecl {
    /// `messages proto+` (interfaces) or `methods proto+` (classes).
    Messages(MessageGroup),
    /// `method proto body endMethod` (behaviors).
    Method(MethodDecl),
    /// A class clause whose inner shape is not interpreted at the syntax level.
    Clause(OpaqueClause),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageGroupKind {
    Messages,
    Methods,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageGroup {
    pub kind: MessageGroupKind,
    pub protos: Vec<Spanned<MethodProto>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub proto: Spanned<MethodProto>,
    pub body: Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Implements,
    Superclass,
    Fields,
}

/// Raw token lexemes of an `implements`, `superclass`, or `fields` clause.
///
/// The enclosing `Spanned` covers the introducer and every captured token.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueClause {
    pub kind: ClauseKind,
    pub tokens: Vec<Spanned<String>>,
}

/// The four prototype shapes, in the order the parser tries them.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodProto {
    /// `name (params) [returns T]`
    Params {
        name: Spanned<Ident>,
        params: Vec<Spanned<Param>>,
        returns: Option<Spanned<Type>>,
    },
    /// `infix OP (name: T) returns T`
    Infix {
        op: Spanned<String>,
        param: Spanned<Ident>,
        param_ty: Spanned<Type>,
        returns: Spanned<Type>,
    },
    /// `prefix OP () returns T`
    Prefix {
        op: Spanned<String>,
        returns: Spanned<Type>,
    },
    /// `label: (name: T) label: (name: T) [returns T]`
    Keyword {
        parts: Vec<Spanned<KeywordParam>>,
        returns: Option<Spanned<Type>>,
    },
}

impl MethodProto {
    /// The selector this prototype defines (`at:put:` for keyword shapes).
    pub fn selector(&self) -> String {
        match self {
            MethodProto::Params { name, .. } => name.node.clone(),
            MethodProto::Infix { op, .. } | MethodProto::Prefix { op, .. } => op.node.clone(),
            MethodProto::Keyword { parts, .. } => parts.iter().map(|p| format!("{}:", p.node.label.node)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordParam {
    pub label: Spanned<Ident>,
    pub name: Spanned<Ident>,
    pub ty: Spanned<Type>,
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// `Name` or `Name [T, U]`
    Named { name: Ident, args: Vec<Spanned<Type>> },
    /// `ptr to T`
    Pointer(Box<Spanned<Type>>),
    /// `array [d, ...] of T`; `dims` is empty for `array of T`
    Array {
        dims: Vec<Spanned<Dimension>>,
        element: Box<Spanned<Type>>,
    },
    /// `function (T, ...) returns T`
    Function {
        params: Vec<Spanned<Type>>,
        returns: Option<Box<Spanned<Type>>>,
    },
}

impl Type {
    pub fn named(name: impl Into<Ident>) -> Self {
        Type::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dimension {
    /// `*`
    Dynamic,
    Fixed(Expr),
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    If(IfStmt),
    Assign(AssignStmt),
    /// `name(args)`
    Call(CallStmt),
    /// `receiver label: arg ...`
    Send(SendExpr),
    /// `receiver.method(args)`
    DottedCall(DottedCallStmt),
    While(WhileStmt),
    /// `do ... until cond`
    Until(UntilStmt),
    For(ForLoop),
    Switch(SwitchStmt),
    Try(TryStmt),
    Throw(ThrowStmt),
    Free(Spanned<Expr>),
    Return(Option<Spanned<Expr>>),
    Break,
    Continue,
    Debug,
}

/// `if`/`elseIf` branches in order (the first is the `if`), then the optional `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub branches: Vec<Spanned<CondBranch>>,
    pub else_body: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondBranch {
    pub cond: Spanned<Expr>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub target: Spanned<Expr>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallStmt {
    pub callee: Spanned<Ident>,
    pub args: Vec<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DottedCallStmt {
    pub receiver: Spanned<Expr>,
    pub method: Spanned<Ident>,
    pub args: Vec<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub cond: Spanned<Expr>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UntilStmt {
    pub body: Block,
    pub cond: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForLoop {
    /// `for lvalue = start to end [by step] body endFor`
    Range(RangeFor),
    /// `for ( init ; [cond] ; update ) body endFor`
    CStyle(CFor),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeFor {
    pub var: Spanned<Expr>,
    pub start: Spanned<Expr>,
    pub end: Spanned<Expr>,
    pub step: Option<Spanned<Expr>>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CFor {
    pub init: Block,
    pub cond: Option<Spanned<Expr>>,
    pub update: Block,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub subject: Option<Spanned<Expr>>,
    pub cases: Vec<Spanned<SwitchCase>>,
    pub default: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub value: Spanned<Expr>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: Block,
    pub catches: Vec<Spanned<CatchClause>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub error: Spanned<Ident>,
    pub params: Vec<Spanned<Param>>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThrowStmt {
    pub error: Spanned<Ident>,
    pub args: Vec<Spanned<Expr>>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Ident(Ident),
    Binary(BinaryExpr),
    Unary(UnaryExpr),
    /// `f(args)` or `a.b(args)`; the callee is an identifier or a member access.
    Call(CallExpr),
    Send(SendExpr),
    Member(MemberExpr),
    Index(IndexExpr),
    /// `e asPtrTo T`
    AsPtrTo(Box<Spanned<Expr>>, Spanned<Type>),
    /// `e asInteger`
    AsInteger(Box<Spanned<Expr>>),
    /// `e arraySize`
    ArraySize(Box<Spanned<Expr>>),
    TypeTest(TypeTestExpr),
    New(NewExpr),
    /// `sizeOf T`
    SizeOf(Spanned<Type>),
    /// Nameless `function (...) ... endFunction`
    Function(Box<FunctionLiteral>),
}

impl Expr {
    /// The tier this node binds at, or `None` for postfix and primary forms (which bind tighter than any operator).
    pub fn precedence(&self) -> Option<Precedence> {
        match self {
            Expr::Binary(b) => Some(b.tier),
            Expr::Unary(u) => Some(u.tier),
            Expr::Send(_) => Some(Precedence::KeywordMessage),
            _ => None,
        }
    }

    /// Whether the expression is addressable (identifier, member access, or indexed access).
    pub fn is_lvalue(&self) -> bool {
        matches!(self, Expr::Ident(_) | Expr::Member(_) | Expr::Index(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Double(f64),
    Char(char),
    String(String),
    Bool(bool),
    Null,
    SelfRef,
    Super,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: String,
    pub tier: Precedence,
    pub left: Box<Spanned<Expr>>,
    pub right: Box<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: String,
    pub tier: Precedence,
    pub operand: Box<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Box<Spanned<Expr>>,
    pub args: Vec<Spanned<Expr>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendExpr {
    pub receiver: Box<Spanned<Expr>>,
    pub parts: Vec<KeywordArg>,
}

impl SendExpr {
    /// `at:put:` for `a at: 1 put: 2`.
    pub fn selector(&self) -> String {
        self.parts.iter().map(|p| format!("{}:", p.label.node)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordArg {
    pub label: Spanned<Ident>,
    pub arg: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemberExpr {
    pub receiver: Box<Spanned<Expr>>,
    pub member: Spanned<Ident>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub receiver: Box<Spanned<Expr>>,
    pub indices: Vec<Spanned<Expr>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTest {
    InstanceOf,
    KindOf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeTestExpr {
    pub receiver: Box<Spanned<Expr>>,
    pub test: TypeTest,
    pub ty: Spanned<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    New,
    Alloc,
}

/// `new T`, `alloc T { x = 1, y = 2 }`, `new array of int { 10 of 0 }`
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpr {
    pub allocation: Allocation,
    pub ty: Spanned<Type>,
    pub init: Option<Initializer>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Initializer {
    Fields(Vec<Spanned<FieldInit>>),
    Array(Vec<Spanned<ArrayInit>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInit {
    pub name: Spanned<Ident>,
    pub value: Spanned<Expr>,
}

/// `[count of] value`
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayInit {
    pub count: Option<Spanned<Expr>>,
    pub value: Spanned<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub params: Vec<Spanned<Param>>,
    pub returns: Option<Spanned<Type>>,
    pub body: Body,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spanned_equality_ignores_spans() {
        let a = Spanned::new(Expr::Ident("x".into()), Span::new(0, 1));
        let b = Spanned::new(Expr::Ident("x".into()), Span::new(40, 41));
        assert_eq!(a, b);
        assert_ne!(a, Spanned::new(Expr::Ident("y".into()), Span::new(0, 1)));
    }

    #[test]
    fn span_merge_covers_both() {
        assert_eq!(Span::new(3, 5).merge(Span::new(1, 4)), Span::new(1, 5));
        assert_eq!(Span::new(2, 9).len(), 7);
    }

    #[test]
    fn keyword_selector_concatenates_labels() {
        let part = |label: &str| {
            Spanned::synthetic(KeywordParam {
                label: Spanned::synthetic(label.to_string()),
                name: Spanned::synthetic("v".to_string()),
                ty: Spanned::synthetic(Type::named("int")),
            })
        };
        let proto = MethodProto::Keyword {
            parts: vec![part("at"), part("put")],
            returns: None,
        };
        assert_eq!(proto.selector(), "at:put:");
    }
}
