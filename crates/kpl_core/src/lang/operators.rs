//! Operator vocabulary.
//!
//! KPL operators are *symbol runs*: any maximal sequence of operator characters is one operator token, and a program
//! may define new infix/prefix operators on its classes. This module pins down the spellings that have a dedicated
//! precedence tier, plus the [`Precedence`] ladder the expression parser climbs.
//!
//! ## Notes
//! - Lookup via [`from_str`] is exact (no normalization).
//! - Any spelling without a dedicated binary tier binds at [`Precedence::Generic`] when used infix.
//! - Every operator spelling, known or not, is accepted in prefix position at [`Precedence::Prefix`].
//!
//! ## Examples
//! ```rust
//! use kpl_core::lang::operators::{self, OperatorId, Precedence};
//!
//! assert_eq!(operators::from_str("<<"), Some(OperatorId::Shl));
//! assert_eq!(operators::binary_precedence("*"), Precedence::Multiplicative);
//! assert_eq!(operators::binary_precedence("+++"), Precedence::Generic);
//! ```

/// The thirteen binding tiers, loosest first.
///
/// The discriminant is the tier number; a larger value binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    /// `label: expr` pairs chained onto a receiver.
    KeywordMessage = 1,
    /// Any operator spelling not claimed by a tier below.
    Generic = 2,
    LogicalOr = 3,
    LogicalAnd = 4,
    BitOr = 5,
    BitXor = 6,
    BitAnd = 7,
    Equality = 8,
    Relational = 9,
    Shift = 10,
    Additive = 11,
    Multiplicative = 12,
    /// Unary prefix application of any operator.
    Prefix = 13,
}

impl Precedence {
    /// The tier number (1 = loosest, 13 = tightest).
    pub const fn tier(self) -> u8 {
        self as u8
    }

    /// The next tighter tier, or `None` at [`Precedence::Prefix`].
    pub const fn tighter(self) -> Option<Precedence> {
        match self {
            Precedence::KeywordMessage => Some(Precedence::Generic),
            Precedence::Generic => Some(Precedence::LogicalOr),
            Precedence::LogicalOr => Some(Precedence::LogicalAnd),
            Precedence::LogicalAnd => Some(Precedence::BitOr),
            Precedence::BitOr => Some(Precedence::BitXor),
            Precedence::BitXor => Some(Precedence::BitAnd),
            Precedence::BitAnd => Some(Precedence::Equality),
            Precedence::Equality => Some(Precedence::Relational),
            Precedence::Relational => Some(Precedence::Shift),
            Precedence::Shift => Some(Precedence::Additive),
            Precedence::Additive => Some(Precedence::Multiplicative),
            Precedence::Multiplicative => Some(Precedence::Prefix),
            Precedence::Prefix => None,
        }
    }

    /// Whether this tier is one of the binary tiers (2..=12).
    pub const fn is_binary(self) -> bool {
        !matches!(self, Precedence::KeywordMessage | Precedence::Prefix)
    }
}

/// Stable identifier for operator spellings with a dedicated tier (or a conventional prefix meaning).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Logical
    OrOr,
    AndAnd,

    // Bitwise
    Pipe,
    Caret,
    Amp,

    // Comparison
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Shifts
    Shl,
    Shr,
    UShr,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Prefix-only by convention
    Bang,
    Tilde,
}

/// Metadata for an operator.
///
/// ## Notes
/// - `binary` is `None` for spellings that have no dedicated binary tier. Used infix, they fall back to
///   [`Precedence::Generic`].
/// - All binary tiers associate to the left.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub spelling: &'static str,
    pub binary: Option<Precedence>,
}

/// Registry of all operators with a dedicated tier.
pub const OPERATORS: &[OperatorInfo] = &[
    op(OperatorId::OrOr, "||", Some(Precedence::LogicalOr)),
    op(OperatorId::AndAnd, "&&", Some(Precedence::LogicalAnd)),
    op(OperatorId::Pipe, "|", Some(Precedence::BitOr)),
    op(OperatorId::Caret, "^", Some(Precedence::BitXor)),
    op(OperatorId::Amp, "&", Some(Precedence::BitAnd)),
    op(OperatorId::EqEq, "==", Some(Precedence::Equality)),
    op(OperatorId::NotEq, "!=", Some(Precedence::Equality)),
    op(OperatorId::Lt, "<", Some(Precedence::Relational)),
    op(OperatorId::LtEq, "<=", Some(Precedence::Relational)),
    op(OperatorId::Gt, ">", Some(Precedence::Relational)),
    op(OperatorId::GtEq, ">=", Some(Precedence::Relational)),
    op(OperatorId::Shl, "<<", Some(Precedence::Shift)),
    op(OperatorId::Shr, ">>", Some(Precedence::Shift)),
    op(OperatorId::UShr, ">>>", Some(Precedence::Shift)),
    op(OperatorId::Plus, "+", Some(Precedence::Additive)),
    op(OperatorId::Minus, "-", Some(Precedence::Additive)),
    op(OperatorId::Star, "*", Some(Precedence::Multiplicative)),
    op(OperatorId::Slash, "/", Some(Precedence::Multiplicative)),
    op(OperatorId::Percent, "%", Some(Precedence::Multiplicative)),
    op(OperatorId::Bang, "!", None),
    op(OperatorId::Tilde, "~", None),
];

/// Characters that may appear in an operator token.
pub const OPERATOR_CHARS: &[char] = &[
    '+', '-', '*', '/', '\\', '!', '@', '#', '$', '%', '^', '&', '~', '`', '|', '?', '<', '>', '=',
];

/// Whether `c` can start or continue an operator token.
pub fn is_operator_char(c: char) -> bool {
    OPERATOR_CHARS.contains(&c)
}

/// Canonical spelling.
pub fn as_str(id: OperatorId) -> &'static str {
    info_for(id).spelling
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Lookup by spelling.
pub fn from_str(spelling: &str) -> Option<OperatorId> {
    OPERATORS.iter().find(|o| o.spelling == spelling).map(|o| o.id)
}

/// The tier an operator spelling binds at when used between two operands.
///
/// ## Returns
/// - The dedicated tier for `||`, `&&`, `|`, `^`, `&`, `==`, `!=`, `<`, `<=`, `>`, `>=`, `<<`, `>>`, `>>>`,
///   `+`, `-`, `*`, `/`, `%`.
/// - [`Precedence::Generic`] for every other spelling.
pub fn binary_precedence(spelling: &str) -> Precedence {
    from_str(spelling)
        .and_then(|id| info_for(id).binary)
        .unwrap_or(Precedence::Generic)
}

const fn op(id: OperatorId, spelling: &'static str, binary: Option<Precedence>) -> OperatorInfo {
    OperatorInfo { id, spelling, binary }
}
