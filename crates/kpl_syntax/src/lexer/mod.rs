//! Lexer for KPL.
//!
//! Handles tokenization including:
//! - Keywords and identifiers (`[a-zA-Z_]+`)
//! - Integer, double, character and string literals
//! - Operator runs (`+`, `<=`, `>>>`, user-defined spellings like `+++`)
//! - Punctuation and the assignment marker `=`
//! - `--` line comments and `/* */` block comments
//!
//! The [`Lexer`] is an iterator and can be restarted at any offset it previously reported, which lets tools re-scan
//! a region without re-lexing the whole unit.
//!
//! ## Module Structure
//!
//! - `tokens` - Token types (TokenKind, Token)
//! - `literals` - String and character literal scanning
//! - `numbers` - Numeric literal scanning

mod literals;
mod numbers;
pub mod tokens;

pub use literals::quote_string;
pub use tokens::{Token, TokenKind, keyword_id};

use crate::ast::Span;
use crate::diagnostics::Diagnostic;
use kpl_core::lang::operators::is_operator_char;
use kpl_core::lang::punctuation::{self, PunctuationId};

/// Lazy tokenizer over KPL source text.
///
/// Yields `Ok(Token)` for every token and `Err(Diagnostic)` for every lexical error. After an error the lexer has
/// already moved past the offending text, so iteration can simply continue. The last item is always an `Eof` token.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    finished: bool,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self::resume_at(source, 0)
    }

    /// Create a lexer that starts scanning at byte `offset`.
    ///
    /// `offset` is normally the `span.start` of a token returned earlier. Offsets past the end yield only `Eof`;
    /// an offset inside a multi-byte character is moved forward to the next character boundary.
    pub fn resume_at(source: &'a str, offset: usize) -> Self {
        let mut pos = offset.min(source.len());
        while !source.is_char_boundary(pos) {
            pos += 1;
        }
        Self {
            source,
            pos,
            finished: false,
        }
    }

    /// Byte offset of the next character to scan.
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Tokenize the rest of the input with recovery.
    ///
    /// The token stream always ends with an `Eof` token; diagnostics are returned in source order.
    pub fn tokenize(self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        for item in self {
            match item {
                Ok(token) => tokens.push(token),
                Err(error) => errors.push(error),
            }
        }
        (tokens, errors)
    }

    // ========================================================================
    // Core character handling
    // ========================================================================

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.pos..].chars();
        iter.next();
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn starts_comment(&self) -> bool {
        matches!((self.peek(), self.peek_next()), (Some('-'), Some('-')) | (Some('/'), Some('*')))
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, &self.source[start..self.pos], Span::new(start, self.pos))
    }

    // ========================================================================
    // Trivia
    // ========================================================================

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), Diagnostic> {
        loop {
            match (self.peek(), self.peek_next()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.advance();
                }
                (Some('-'), Some('-')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match (self.peek(), self.peek_next()) {
                            (Some('*'), Some('/')) => {
                                self.pos += 2;
                                break;
                            }
                            (Some(_), _) => {
                                self.advance();
                            }
                            (None, _) => {
                                return Err(Diagnostic::lexical(
                                    "Unterminated block comment",
                                    Span::new(start, self.pos),
                                )
                                .with_hint("Close the comment with '*/'"));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    // ========================================================================
    // Main scanning dispatch
    // ========================================================================

    fn scan_token(&mut self) -> Result<Token, Diagnostic> {
        let start = self.pos;
        let Some(c) = self.advance() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        match c {
            '"' => self.scan_string(start),
            '\'' => self.scan_char(start),
            '0'..='9' => self.scan_number(start),
            _ if is_ident_char(c) => Ok(self.scan_identifier(start)),
            _ if is_operator_char(c) => Ok(self.scan_operator(start)),
            _ => match punctuation::from_char(c) {
                Some(id) => Ok(self.token(TokenKind::Punctuation(id), start)),
                None => Err(Diagnostic::lexical(
                    format!("Unexpected character '{}'", c.escape_debug()),
                    Span::new(start, self.pos),
                )),
            },
        }
    }

    // ========================================================================
    // Operators
    // ========================================================================

    /// Maximal munch over operator characters. A run never swallows the start of a comment, and a lone `=` is the
    /// assignment punctuation.
    fn scan_operator(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek() {
            if !is_operator_char(c) || self.starts_comment() {
                break;
            }
            self.advance();
        }
        let spelling = &self.source[start..self.pos];
        if spelling == punctuation::as_str(PunctuationId::Assign) {
            self.token(TokenKind::Punctuation(PunctuationId::Assign), start)
        } else {
            self.token(TokenKind::Operator(spelling.to_string()), start)
        }
    }

    // ========================================================================
    // Identifier scanning
    // ========================================================================

    fn scan_identifier(&mut self, start: usize) -> Token {
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                self.advance();
            } else {
                break;
            }
        }

        let spelling = &self.source[start..self.pos];
        if let Some(id) = keyword_id(spelling) {
            self.token(TokenKind::Keyword(id), start)
        } else {
            self.token(TokenKind::Ident(spelling.to_string()), start)
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, Diagnostic>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if let Err(error) = self.skip_trivia() {
            return Some(Err(error));
        }
        if self.is_at_end() {
            self.finished = true;
            return Some(Ok(Token::new(TokenKind::Eof, "", Span::new(self.pos, self.pos))));
        }
        Some(self.scan_token())
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Identifiers are ASCII letters and underscores only; digits never continue one.
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Tokenize a whole source string with recovery.
///
/// Lexical errors do not stop scanning: the offending text is skipped and reported.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let (tokens, errors) = Lexer::new(source).tokenize();
    if !errors.is_empty() {
        tracing::debug!(errors = errors.len(), "lexical errors while tokenizing");
    }
    (tokens, errors)
}

/// Convenience function to lex a source string, failing on any lexical error.
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<Diagnostic>> {
    let (tokens, errors) = tokenize(source);
    if errors.is_empty() { Ok(tokens) } else { Err(errors) }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::ErrorKind;
    use kpl_core::lang::keywords::{self, KeywordId};

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn op(s: &str) -> TokenKind {
        TokenKind::Operator(s.to_string())
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.to_string())
    }

    #[test]
    fn test_keyword_registry_parity() {
        for info in keywords::KEYWORDS {
            let tokens = lex(info.canonical).unwrap();
            assert_eq!(tokens[0].kind, TokenKind::Keyword(info.id), "{}", info.canonical);
        }
    }

    #[test]
    fn test_keywords_are_case_sensitive() {
        assert_eq!(
            kinds("endIf endif"),
            vec![TokenKind::Keyword(KeywordId::EndIf), ident("endif"), TokenKind::Eof]
        );
    }

    #[test]
    fn test_identifiers_never_contain_digits() {
        assert_eq!(kinds("x1"), vec![ident("x"), TokenKind::Int(1), TokenKind::Eof]);
        assert_eq!(kinds("_tmp"), vec![ident("_tmp"), TokenKind::Eof]);
    }

    #[test]
    fn test_operator_runs_use_maximal_munch() {
        assert_eq!(
            kinds("a <= b >>> c +++ d"),
            vec![
                ident("a"),
                op("<="),
                ident("b"),
                op(">>>"),
                ident("c"),
                op("+++"),
                ident("d"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_lone_equals_is_punctuation() {
        assert_eq!(
            kinds("x = y == z"),
            vec![
                ident("x"),
                TokenKind::Punctuation(PunctuationId::Assign),
                ident("y"),
                op("=="),
                ident("z"),
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_punctuation() {
        use PunctuationId::*;
        let expected: Vec<TokenKind> = [LParen, RParen, LBracket, RBracket, LBrace, RBrace, Comma, Colon, Semicolon, Dot]
            .into_iter()
            .map(TokenKind::Punctuation)
            .chain([TokenKind::Eof])
            .collect();
        assert_eq!(kinds("()[]{},:;."), expected);
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "a -- trailing comment\n/* block\ncomment */ b";
        assert_eq!(kinds(source), vec![ident("a"), ident("b"), TokenKind::Eof]);
    }

    #[test]
    fn test_operator_run_stops_before_comment() {
        assert_eq!(kinds("a +-- note\nb"), vec![ident("a"), op("+"), ident("b"), TokenKind::Eof]);
    }

    #[test]
    fn test_unterminated_block_comment() {
        let errors = lex("a /* never closed").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Lexical);
    }

    #[test]
    fn test_unknown_character_recovers() {
        let (tokens, errors) = tokenize("a § b");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Lexical);
        assert!(errors[0].message.contains('§'));
        let kinds: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![ident("a"), ident("b"), TokenKind::Eof]);
    }

    #[test]
    fn test_lexemes_and_spans_match_source() {
        let source = "while  count >= 10";
        for token in lex(source).unwrap() {
            assert_eq!(&source[token.span.start..token.span.end], token.lexeme);
        }
    }

    #[test]
    fn test_restart_from_returned_span() {
        let source = "if a < b debug endIf";
        let all = lex(source).unwrap();
        let restart_at = all[2].span.start;
        let resumed: Vec<_> = Lexer::resume_at(source, restart_at).map(|t| t.unwrap()).collect();
        assert_eq!(resumed, all[2..].to_vec());
    }

    #[test]
    fn test_resume_past_end_yields_eof() {
        let tokens: Vec<_> = Lexer::resume_at("abc", 99).collect();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].as_ref().unwrap().is_eof());
    }

    #[test]
    fn test_iterator_is_fused_after_eof() {
        let mut lexer = Lexer::new("x");
        assert!(lexer.next().is_some());
        assert!(lexer.next().unwrap().unwrap().is_eof());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_token_dump() {
        let dump: Vec<String> = lex("x = foo at: 1 put: 'c'")
            .unwrap()
            .iter()
            .map(|t| format!("{} {:?}", t.kind, t.lexeme))
            .collect();
        insta::assert_snapshot!(dump.join("\n"), @r#"
        identifier 'x' "x"
        '=' "="
        identifier 'foo' "foo"
        identifier 'at' "at"
        ':' ":"
        integer 1 "1"
        identifier 'put' "put"
        ':' ":"
        character 'c' "'c'"
        end of input ""
        "#);
    }
}
