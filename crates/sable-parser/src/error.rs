//! Parse error types for the Sable parser.

use std::fmt;

use sable_common::span::Span;

/// A parse error: what the parser expected, where, and the message key of
/// the production that had already committed.
///
/// The parser uses a first-error strategy -- once a production has consumed
/// its committing token, any later mismatch is reported and the parse
/// unwinds. `errors` on a [`crate::Parse`] therefore holds at most one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Primary source location where the error was detected.
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.message, self.span.start.line, self.span.start.col
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_common::span::Pos;

    #[test]
    fn display_includes_position() {
        let err = ParseError::new("expected declaration", Span::point(Pos::new(3, 2, 1)));
        assert_eq!(err.to_string(), "expected declaration at 2:1");
    }
}
