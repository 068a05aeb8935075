//! Define the reserved keyword vocabulary for KPL.
//!
//! This module is the single source of truth for reserved words: a stable identifier ([`KeywordId`]) plus a const
//! metadata table ([`KEYWORDS`]) recording canonical spellings, categories, and which opener a closing keyword ends.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**: `endIf` is a keyword, `endif` is an identifier.
//! - Words such as `extends` or `ptr` are *not* reserved; see [`crate::lang::contextual`].
//!
//! ## Examples
//! ```rust
//! use kpl_core::lang::keywords::{self, KeywordId};
//!
//! assert_eq!(keywords::from_str("isKindOf"), Some(KeywordId::IsKindOf));
//! assert_eq!(keywords::closes(KeywordId::EndTry), Some(KeywordId::Try));
//! assert_eq!(keywords::from_str("extends"), None);
//! ```

/// Stable identifier for every reserved keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordId {
    // Control flow / statements
    If,
    ElseIf,
    Else,
    EndIf,
    While,
    EndWhile,
    Do,
    Until,
    For,
    EndFor,
    Switch,
    Case,
    Default,
    EndSwitch,
    Try,
    Catch,
    EndTry,
    Throw,
    Free,
    Return,
    Break,
    Continue,
    Debug,

    // Declarations
    Const,
    Var,
    Type,
    Enum,
    Errors,
    External,
    Function,
    EndFunction,
    Interface,
    EndInterface,
    Class,
    EndClass,
    Behavior,
    EndBehavior,
    Method,
    EndMethod,
    Methods,
    Messages,

    // Units / imports
    Header,
    EndHeader,
    Code,
    EndCode,
    Uses,
    Renaming,

    // Connectives
    To,
    Of,
    Returns,

    // Expression operators
    New,
    Alloc,
    SizeOf,
    AsPtrTo,
    AsInteger,
    ArraySize,
    IsInstanceOf,
    IsKindOf,

    // Literals / receivers
    Null,
    True,
    False,
    SelfKw,
    Super,
}

/// High-level grouping for documentation and tooling.
///
/// ## Notes
/// - Categories are metadata only; they do not enforce parsing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    ControlFlow,
    Declaration,
    Unit,
    Connective,
    Expression,
    Literal,
}

/// Metadata for a keyword.
///
/// ## Notes
/// - `closes` is set for block terminators (`endIf` closes `if`, `until` closes `do`). Diagnostics use it to name
///   the construct that was left open.
#[derive(Debug, Clone, Copy)]
pub struct KeywordInfo {
    pub id: KeywordId,
    pub canonical: &'static str,
    pub category: KeywordCategory,
    pub closes: Option<KeywordId>,
}

/// Registry of all keywords.
///
/// ## Notes
/// - The ordering is not semantically meaningful, but is grouped for readability.
pub const KEYWORDS: &[KeywordInfo] = &[
    // Control flow / statements
    info(KeywordId::If, "if", KeywordCategory::ControlFlow, None),
    info(KeywordId::ElseIf, "elseIf", KeywordCategory::ControlFlow, None),
    info(KeywordId::Else, "else", KeywordCategory::ControlFlow, None),
    info(KeywordId::EndIf, "endIf", KeywordCategory::ControlFlow, Some(KeywordId::If)),
    info(KeywordId::While, "while", KeywordCategory::ControlFlow, None),
    info(KeywordId::EndWhile, "endWhile", KeywordCategory::ControlFlow, Some(KeywordId::While)),
    info(KeywordId::Do, "do", KeywordCategory::ControlFlow, None),
    info(KeywordId::Until, "until", KeywordCategory::ControlFlow, Some(KeywordId::Do)),
    info(KeywordId::For, "for", KeywordCategory::ControlFlow, None),
    info(KeywordId::EndFor, "endFor", KeywordCategory::ControlFlow, Some(KeywordId::For)),
    info(KeywordId::Switch, "switch", KeywordCategory::ControlFlow, None),
    info(KeywordId::Case, "case", KeywordCategory::ControlFlow, None),
    info(KeywordId::Default, "default", KeywordCategory::ControlFlow, None),
    info(KeywordId::EndSwitch, "endSwitch", KeywordCategory::ControlFlow, Some(KeywordId::Switch)),
    info(KeywordId::Try, "try", KeywordCategory::ControlFlow, None),
    info(KeywordId::Catch, "catch", KeywordCategory::ControlFlow, None),
    info(KeywordId::EndTry, "endTry", KeywordCategory::ControlFlow, Some(KeywordId::Try)),
    info(KeywordId::Throw, "throw", KeywordCategory::ControlFlow, None),
    info(KeywordId::Free, "free", KeywordCategory::ControlFlow, None),
    info(KeywordId::Return, "return", KeywordCategory::ControlFlow, None),
    info(KeywordId::Break, "break", KeywordCategory::ControlFlow, None),
    info(KeywordId::Continue, "continue", KeywordCategory::ControlFlow, None),
    info(KeywordId::Debug, "debug", KeywordCategory::ControlFlow, None),

    // Declarations
    info(KeywordId::Const, "const", KeywordCategory::Declaration, None),
    info(KeywordId::Var, "var", KeywordCategory::Declaration, None),
    info(KeywordId::Type, "type", KeywordCategory::Declaration, None),
    info(KeywordId::Enum, "enum", KeywordCategory::Declaration, None),
    info(KeywordId::Errors, "errors", KeywordCategory::Declaration, None),
    info(KeywordId::External, "external", KeywordCategory::Declaration, None),
    info(KeywordId::Function, "function", KeywordCategory::Declaration, None),
    info(KeywordId::EndFunction, "endFunction", KeywordCategory::Declaration, Some(KeywordId::Function)),
    info(KeywordId::Interface, "interface", KeywordCategory::Declaration, None),
    info(KeywordId::EndInterface, "endInterface", KeywordCategory::Declaration, Some(KeywordId::Interface)),
    info(KeywordId::Class, "class", KeywordCategory::Declaration, None),
    info(KeywordId::EndClass, "endClass", KeywordCategory::Declaration, Some(KeywordId::Class)),
    info(KeywordId::Behavior, "behavior", KeywordCategory::Declaration, None),
    info(KeywordId::EndBehavior, "endBehavior", KeywordCategory::Declaration, Some(KeywordId::Behavior)),
    info(KeywordId::Method, "method", KeywordCategory::Declaration, None),
    info(KeywordId::EndMethod, "endMethod", KeywordCategory::Declaration, Some(KeywordId::Method)),
    info(KeywordId::Methods, "methods", KeywordCategory::Declaration, None),
    info(KeywordId::Messages, "messages", KeywordCategory::Declaration, None),

    // Units / imports
    info(KeywordId::Header, "header", KeywordCategory::Unit, None),
    info(KeywordId::EndHeader, "endHeader", KeywordCategory::Unit, Some(KeywordId::Header)),
    info(KeywordId::Code, "code", KeywordCategory::Unit, None),
    info(KeywordId::EndCode, "endCode", KeywordCategory::Unit, Some(KeywordId::Code)),
    info(KeywordId::Uses, "uses", KeywordCategory::Unit, None),
    info(KeywordId::Renaming, "renaming", KeywordCategory::Unit, None),

    // Connectives
    info(KeywordId::To, "to", KeywordCategory::Connective, None),
    info(KeywordId::Of, "of", KeywordCategory::Connective, None),
    info(KeywordId::Returns, "returns", KeywordCategory::Connective, None),

    // Expression operators
    info(KeywordId::New, "new", KeywordCategory::Expression, None),
    info(KeywordId::Alloc, "alloc", KeywordCategory::Expression, None),
    info(KeywordId::SizeOf, "sizeOf", KeywordCategory::Expression, None),
    info(KeywordId::AsPtrTo, "asPtrTo", KeywordCategory::Expression, None),
    info(KeywordId::AsInteger, "asInteger", KeywordCategory::Expression, None),
    info(KeywordId::ArraySize, "arraySize", KeywordCategory::Expression, None),
    info(KeywordId::IsInstanceOf, "isInstanceOf", KeywordCategory::Expression, None),
    info(KeywordId::IsKindOf, "isKindOf", KeywordCategory::Expression, None),

    // Literals / receivers
    info(KeywordId::Null, "null", KeywordCategory::Literal, None),
    info(KeywordId::True, "true", KeywordCategory::Literal, None),
    info(KeywordId::False, "false", KeywordCategory::Literal, None),
    info(KeywordId::SelfKw, "self", KeywordCategory::Literal, None),
    info(KeywordId::Super, "super", KeywordCategory::Literal, None),
];

/// Canonical spelling.
///
/// ## Parameters
/// - `id`: Keyword identifier.
///
/// ## Returns
/// - The canonical spelling for `id`.
pub fn as_str(id: KeywordId) -> &'static str {
    info_for(id).canonical
}

/// Category.
pub fn category(id: KeywordId) -> KeywordCategory {
    info_for(id).category
}

/// The opening keyword that `id` terminates, if `id` is a block terminator.
pub fn closes(id: KeywordId) -> Option<KeywordId> {
    info_for(id).closes
}

/// The terminator that closes the block opened by `id`, if any.
///
/// ## Examples
/// ```rust
/// use kpl_core::lang::keywords::{self, KeywordId};
///
/// assert_eq!(keywords::closer_of(KeywordId::Switch), Some(KeywordId::EndSwitch));
/// assert_eq!(keywords::closer_of(KeywordId::Return), None);
/// ```
pub fn closer_of(id: KeywordId) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.closes == Some(id)).map(|k| k.id)
}

/// Full metadata.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: KeywordId) -> &'static KeywordInfo {
    KEYWORDS.iter().find(|k| k.id == id).expect("keyword info missing")
}

/// Lookup by spelling.
///
/// ## Returns
/// - `Some(KeywordId)` if the spelling is reserved.
/// - `None` otherwise.
pub fn from_str(s: &str) -> Option<KeywordId> {
    KEYWORDS.iter().find(|k| k.canonical == s).map(|k| k.id)
}

// --- helpers -----------------------------------------------------------------

const fn info(
    id: KeywordId,
    canonical: &'static str,
    category: KeywordCategory,
    closes: Option<KeywordId>,
) -> KeywordInfo {
    KeywordInfo {
        id,
        canonical,
        category,
        closes,
    }
}
