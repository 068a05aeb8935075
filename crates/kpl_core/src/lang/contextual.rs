//! Contextual words.
//!
//! These spellings lex as ordinary identifiers and only take on meaning in one grammatical position (a class clause
//! introducer, a `for` step, an operator-prototype marker, a structured type). Outside that position they are plain
//! names, so `var by: int` stays legal.

/// Stable identifier for every contextual word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextualId {
    /// `interface I extends A, B` / `class C extends A`
    Extends,
    /// `class C implements ...`
    Implements,
    /// `class C superclass ...`
    Superclass,
    /// `class C fields ...`
    Fields,
    /// `infix + (x: T) returns T`
    Infix,
    /// `prefix - () returns T`
    Prefix,
    /// `for i = 1 to 10 by 2`
    By,
    /// `ptr to T`
    Ptr,
    /// `array [n] of T`
    Array,
}

pub const CONTEXTUAL_WORDS: &[(ContextualId, &str)] = &[
    (ContextualId::Extends, "extends"),
    (ContextualId::Implements, "implements"),
    (ContextualId::Superclass, "superclass"),
    (ContextualId::Fields, "fields"),
    (ContextualId::Infix, "infix"),
    (ContextualId::Prefix, "prefix"),
    (ContextualId::By, "by"),
    (ContextualId::Ptr, "ptr"),
    (ContextualId::Array, "array"),
];

pub fn as_str(id: ContextualId) -> &'static str {
    CONTEXTUAL_WORDS
        .iter()
        .find(|(word, _)| *word == id)
        .map(|(_, spelling)| *spelling)
        .unwrap_or_default()
}

pub fn from_str(s: &str) -> Option<ContextualId> {
    CONTEXTUAL_WORDS
        .iter()
        .find(|(_, spelling)| *spelling == s)
        .map(|(word, _)| *word)
}
