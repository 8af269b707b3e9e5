use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// A lexical error with location information.
///
/// The lexer fails fast: the first lexical error aborts tokenization of the
/// file and is raised through the parse pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The specific kind of lexical error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexErrorKind {
    /// A byte that starts no token.
    UnexpectedCharacter(char),
    /// A string literal was not closed before end of input or end of line.
    UnterminatedString,
    /// A character literal was not closed by `'`.
    UnterminatedChar,
    /// `''` with no code point inside.
    EmptyChar,
    /// A malformed `\x` or `\u` escape sequence.
    InvalidEscape(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedCharacter(c) => write!(f, "unexpected character: {c:?}"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnterminatedChar => write!(f, "unterminated character literal"),
            Self::EmptyChar => write!(f, "empty character literal"),
            Self::InvalidEscape(s) => write!(f, "invalid escape sequence: \\{s}"),
        }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.kind, self.span.start.line, self.span.start.col
        )
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{Pos, Span};

    #[test]
    fn lex_error_display_includes_position() {
        let err = LexError::new(
            LexErrorKind::UnterminatedString,
            Span::point(Pos::new(4, 1, 5)),
        );
        assert_eq!(err.to_string(), "unterminated string literal at 1:5");
    }

    #[test]
    fn lex_error_kind_display_all_variants() {
        assert_eq!(
            LexErrorKind::UnexpectedCharacter('@').to_string(),
            "unexpected character: '@'"
        );
        assert_eq!(
            LexErrorKind::UnterminatedChar.to_string(),
            "unterminated character literal"
        );
        assert_eq!(
            LexErrorKind::EmptyChar.to_string(),
            "empty character literal"
        );
        assert_eq!(
            LexErrorKind::InvalidEscape("xG".into()).to_string(),
            "invalid escape sequence: \\xG"
        );
    }
}
