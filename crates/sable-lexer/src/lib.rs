//! Sable lexer -- tokenizer for the Sable language.
//!
//! Character-by-character recognition of the fixed token vocabulary, with
//! code-point lookahead, escape decoding, and the disambiguation rules for
//! numeric signs and operator runs. The lexer is a lazy iterator of
//! `Result<Token, LexError>`; the first lexical error aborts tokenization.
//!
//! Two modes: the default drops whitespace and comment tokens (newlines are
//! always emitted -- they are statement terminators); trivia mode keeps
//! everything, so token spans partition the source byte-for-byte.

mod cursor;

use cursor::Cursor;
use sable_common::error::{LexError, LexErrorKind};
use sable_common::span::{Pos, Span};
use sable_common::token::{keyword_from_str, Token, TokenKind, TokenValue};

/// The Sable lexer. Converts source text into a stream of tokens.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Whether whitespace and comment tokens are dropped from the output.
    ignore_trivia: bool,
    /// Kind of the most recently produced token (trivia included), used to
    /// decide whether a `-` starts a numeric literal.
    last_kind: Option<TokenKind>,
    /// Whether we have already emitted the `Eof` token.
    emitted_eof: bool,
    /// Set after a lexical error; the iterator is fused afterwards.
    failed: bool,
}

impl<'src> Lexer<'src> {
    /// Create a lexer in the default mode: whitespace and comments dropped,
    /// newlines kept.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            ignore_trivia: true,
            last_kind: None,
            emitted_eof: false,
            failed: false,
        }
    }

    /// Create a lexer that keeps whitespace and comment tokens.
    pub fn with_trivia(source: &'src str) -> Self {
        Self {
            ignore_trivia: false,
            ..Self::new(source)
        }
    }

    /// Tokenize the entire source in default mode.
    ///
    /// The returned vector ends with the `Eof` token.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
        Lexer::new(source).collect()
    }

    /// Tokenize the entire source keeping trivia tokens.
    pub fn tokenize_with_trivia(source: &str) -> Result<Vec<Token>, LexError> {
        Lexer::with_trivia(source).collect()
    }

    // ── Token dispatch ─────────────────────────────────────────────────

    /// Produce the next raw token (trivia included).
    fn next_token(&mut self) -> Result<Token, LexError> {
        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Ok(Token::new(TokenKind::Eof, Span::point(start)));
        };

        let token = match c {
            c if is_whitespace_char(c) => self.lex_whitespace(start),
            '/' if matches!(self.cursor.peek_nth(1), Some('/') | Some('*')) => {
                self.lex_comment(start)
            }
            ':' => self.symbol(TokenKind::Colon, start),
            '{' => self.symbol(TokenKind::LBrace, start),
            '}' => self.symbol(TokenKind::RBrace, start),
            '(' => self.symbol(TokenKind::LParen, start),
            ')' => self.symbol(TokenKind::RParen, start),
            '[' => self.symbol(TokenKind::LBracket, start),
            ']' => self.symbol(TokenKind::RBracket, start),
            ',' => self.symbol(TokenKind::Comma, start),
            '.' => self.symbol(TokenKind::Dot, start),
            '`' => self.symbol(TokenKind::Backtick, start),
            '"' => self.lex_string(start)?,
            '\'' => self.lex_char(start)?,
            '0'..='9' => self.lex_number(start),
            '-' if self.minus_starts_number() => self.lex_number(start),
            c if is_operator_char(c) => self.lex_operator(start),
            c if is_ident_start(c) => self.lex_ident(start),
            c => {
                return Err(LexError::new(
                    LexErrorKind::UnexpectedCharacter(c),
                    Span::point(start),
                ));
            }
        };

        self.last_kind = Some(token.kind);
        Ok(token)
    }

    /// Whether a `-` at the current position is a numeric sign rather than
    /// an operator: it must be followed by a digit and sit at the start of
    /// input or after whitespace, an open delimiter, a separator, or another
    /// operator.
    fn minus_starts_number(&self) -> bool {
        if !matches!(self.cursor.peek_nth(1), Some('0'..='9')) {
            return false;
        }
        matches!(
            self.last_kind,
            None | Some(
                TokenKind::Whitespace
                    | TokenKind::Newline
                    | TokenKind::Comment
                    | TokenKind::LParen
                    | TokenKind::LBracket
                    | TokenKind::LBrace
                    | TokenKind::Comma
                    | TokenKind::Colon
                    | TokenKind::Assign
                    | TokenKind::FatArrow
                    | TokenKind::Backtick
                    | TokenKind::Operator
            )
        )
    }

    // ── Trivia ─────────────────────────────────────────────────────────

    /// A run of whitespace characters coalesces into one token. Any `;` or
    /// `\n` in the run makes it a `Newline` token, otherwise `Whitespace`.
    fn lex_whitespace(&mut self, start: Pos) -> Token {
        let mut saw_newline = false;
        while let Some(c) = self.cursor.peek() {
            if !is_whitespace_char(c) {
                break;
            }
            if c == '\n' || c == ';' {
                saw_newline = true;
            }
            self.cursor.advance();
        }
        let kind = if saw_newline {
            TokenKind::Newline
        } else {
            TokenKind::Whitespace
        };
        Token::new(kind, Span::new(start, self.cursor.pos()))
    }

    /// `// ...` to end of line (trailing `\n` included), or `/* ... */` to
    /// the matching terminator or end of input.
    fn lex_comment(&mut self, start: Pos) -> Token {
        self.cursor.advance(); // first /
        if self.cursor.peek() == Some('/') {
            self.cursor.eat_while(|c| c != '\n');
            self.cursor.advance(); // trailing \n, if any
        } else {
            self.cursor.advance(); // *
            while let Some(c) = self.cursor.advance() {
                if c == '*' && self.cursor.peek() == Some('/') {
                    self.cursor.advance();
                    break;
                }
            }
        }
        Token::new(TokenKind::Comment, Span::new(start, self.cursor.pos()))
    }

    // ── Names ──────────────────────────────────────────────────────────

    /// `[A-Za-z_][A-Za-z0-9_]*`, then a keyword-table lookup. A keyword
    /// followed by an identifier-continuation character is an identifier,
    /// which the scan-then-look-up order gives us for free.
    fn lex_ident(&mut self, start: Pos) -> Token {
        self.cursor.eat_while(is_ident_continue);
        let end = self.cursor.pos();
        let image = self.cursor.slice(start.offset, end.offset);
        let kind = keyword_from_str(image).unwrap_or(TokenKind::Ident);
        Token::new(kind, Span::new(start, end))
    }

    // ── Numbers ────────────────────────────────────────────────────────

    /// Numeric literal: optional `-` sign, then hex (`0x`), binary (`0b`)
    /// or decimal, the latter optionally extended to a float by `.digits`
    /// and/or `e digits`.
    ///
    /// A `0x`/`0b` prefix without a digit after it is just the literal `0`;
    /// a `.` or `e` that cannot extend the literal is left for the next
    /// token. A lone `0` is never extended by more digits.
    fn lex_number(&mut self, start: Pos) -> Token {
        let negative = self.cursor.peek() == Some('-');
        if negative {
            self.cursor.advance();
        }

        if self.cursor.peek() == Some('0') {
            match self.cursor.peek_nth(1) {
                Some('x') if matches!(self.cursor.peek_nth(2), Some(c) if c.is_ascii_hexdigit()) => {
                    self.cursor.advance(); // 0
                    self.cursor.advance(); // x
                    let digits_start = self.cursor.pos();
                    self.cursor.eat_while(|c| c.is_ascii_hexdigit());
                    return self.radix_token(start, digits_start, 16, negative);
                }
                Some('b') if matches!(self.cursor.peek_nth(2), Some('0') | Some('1')) => {
                    self.cursor.advance(); // 0
                    self.cursor.advance(); // b
                    let digits_start = self.cursor.pos();
                    self.cursor.eat_while(|c| matches!(c, '0' | '1'));
                    return self.radix_token(start, digits_start, 2, negative);
                }
                _ => {
                    self.cursor.advance(); // the lone 0
                }
            }
        } else {
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        // Float extensions: a fraction and/or an exponent, each only if a
        // digit actually follows.
        let mut is_float = false;
        if self.cursor.peek() == Some('.')
            && matches!(self.cursor.peek_nth(1), Some(c) if c.is_ascii_digit())
        {
            self.cursor.advance(); // .
            self.cursor.eat_while(|c| c.is_ascii_digit());
            is_float = true;
        }
        if self.cursor.peek() == Some('e')
            && matches!(self.cursor.peek_nth(1), Some(c) if c.is_ascii_digit())
        {
            self.cursor.advance(); // e
            self.cursor.eat_while(|c| c.is_ascii_digit());
            is_float = true;
        }

        let end = self.cursor.pos();
        let image = self.cursor.slice(start.offset, end.offset);
        let span = Span::new(start, end);
        if is_float {
            let value = image.parse::<f64>().expect("float image matches f64 grammar");
            Token::with_value(TokenKind::FloatLiteral, span, TokenValue::Float(value))
        } else {
            // Out-of-range literals saturate; range enforcement is not a
            // lexer concern.
            let value = image.parse::<i64>().unwrap_or(i64::MAX);
            Token::with_value(TokenKind::IntLiteral, span, TokenValue::Int(value))
        }
    }

    /// Finish a hex or binary integer literal from its digit run.
    fn radix_token(&mut self, start: Pos, digits_start: Pos, radix: u32, negative: bool) -> Token {
        let end = self.cursor.pos();
        let digits = self.cursor.slice(digits_start.offset, end.offset);
        let magnitude = i64::from_str_radix(digits, radix).unwrap_or(i64::MAX);
        let value = if negative { -magnitude } else { magnitude };
        Token::with_value(
            TokenKind::IntLiteral,
            Span::new(start, end),
            TokenValue::Int(value),
        )
    }

    // ── Strings and characters ─────────────────────────────────────────

    /// `"..."` with escape decoding. An unescaped newline or end of input
    /// before the closing quote is an error located at the last consumed
    /// character.
    fn lex_string(&mut self, start: Pos) -> Result<Token, LexError> {
        self.cursor.advance(); // opening "
        let mut decoded = String::new();
        let mut last = start;
        loop {
            let here = self.cursor.pos();
            match self.cursor.peek() {
                None => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::point(last),
                    ));
                }
                Some('\n') => {
                    return Err(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::point(here),
                    ));
                }
                Some('"') => {
                    self.cursor.advance();
                    break;
                }
                Some('\\') => {
                    self.cursor.advance();
                    decoded.push(self.lex_escape(here, LexErrorKind::UnterminatedString)?);
                }
                Some(c) => {
                    self.cursor.advance();
                    decoded.push(c);
                }
            }
            last = here;
        }
        Ok(Token::with_value(
            TokenKind::StringLiteral,
            Span::new(start, self.cursor.pos()),
            TokenValue::Str(decoded),
        ))
    }

    /// `'c'`: exactly one code point (escapes allowed) between the quotes.
    fn lex_char(&mut self, start: Pos) -> Result<Token, LexError> {
        self.cursor.advance(); // opening '
        let value = match self.cursor.peek() {
            None => {
                return Err(LexError::new(
                    LexErrorKind::UnterminatedChar,
                    Span::point(start),
                ));
            }
            Some('\'') => {
                return Err(LexError::new(LexErrorKind::EmptyChar, Span::point(start)));
            }
            Some('\\') => {
                let esc_start = self.cursor.pos();
                self.cursor.advance();
                self.lex_escape(esc_start, LexErrorKind::UnterminatedChar)?
            }
            Some(c) => {
                self.cursor.advance();
                c
            }
        };
        if self.cursor.peek() != Some('\'') {
            return Err(LexError::new(
                LexErrorKind::UnterminatedChar,
                Span::point(self.cursor.pos()),
            ));
        }
        self.cursor.advance(); // closing '
        Ok(Token::with_value(
            TokenKind::CharLiteral,
            Span::new(start, self.cursor.pos()),
            TokenValue::Char(value),
        ))
    }

    /// Decode one escape sequence; the backslash is already consumed.
    ///
    /// `esc_start` is the backslash position, used for error spans.
    /// `unterminated` is the error kind to report when input runs out,
    /// so the caller's literal kind shows in the message.
    fn lex_escape(
        &mut self,
        esc_start: Pos,
        unterminated: LexErrorKind,
    ) -> Result<char, LexError> {
        let Some(c) = self.cursor.advance() else {
            return Err(LexError::new(unterminated, Span::point(esc_start)));
        };
        match c {
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            'v' => Ok('\u{0B}'),
            'f' => Ok('\u{0C}'),
            'b' => Ok('\u{08}'),
            'x' => {
                let code = self.hex_digits(esc_start, 2, 2)?;
                self.code_point(esc_start, code)
            }
            'u' => {
                if self.cursor.peek() == Some('{') {
                    self.cursor.advance();
                    let code = self.hex_digits(esc_start, 1, 6)?;
                    if self.cursor.peek() != Some('}') {
                        return Err(self.invalid_escape(esc_start));
                    }
                    self.cursor.advance();
                    self.code_point(esc_start, code)
                } else {
                    let code = self.hex_digits(esc_start, 4, 4)?;
                    self.code_point(esc_start, code)
                }
            }
            // Any other escaped character stands for itself.
            other => Ok(other),
        }
    }

    /// Consume between `min` and `max` hex digits and return their value.
    fn hex_digits(&mut self, esc_start: Pos, min: usize, max: usize) -> Result<u32, LexError> {
        let mut value: u32 = 0;
        let mut count = 0;
        while count < max {
            match self.cursor.peek() {
                Some(c) if c.is_ascii_hexdigit() => {
                    self.cursor.advance();
                    value = value
                        .saturating_mul(16)
                        .saturating_add(c.to_digit(16).unwrap_or(0));
                    count += 1;
                }
                _ => break,
            }
        }
        if count < min {
            return Err(self.invalid_escape(esc_start));
        }
        Ok(value)
    }

    fn code_point(&mut self, esc_start: Pos, code: u32) -> Result<char, LexError> {
        char::from_u32(code).ok_or_else(|| self.invalid_escape(esc_start))
    }

    /// Build an `InvalidEscape` error covering the escape consumed so far.
    fn invalid_escape(&mut self, esc_start: Pos) -> LexError {
        let end = self.cursor.pos();
        let image = self
            .cursor
            .slice(esc_start.offset + 1, end.offset)
            .to_owned();
        LexError::new(
            LexErrorKind::InvalidEscape(image),
            Span::new(esc_start, end),
        )
    }

    // ── Operators and symbols ──────────────────────────────────────────

    /// A maximal run of operator characters, stopping before a comment
    /// opener. A lone `=` is the assignment symbol and `=>` the fat arrow;
    /// every other run is an `Operator` token.
    fn lex_operator(&mut self, start: Pos) -> Token {
        while let Some(c) = self.cursor.peek() {
            if !is_operator_char(c) {
                break;
            }
            if c == '/' && matches!(self.cursor.peek_nth(1), Some('/') | Some('*')) {
                break;
            }
            self.cursor.advance();
        }
        let end = self.cursor.pos();
        let kind = match self.cursor.slice(start.offset, end.offset) {
            "=" => TokenKind::Assign,
            "=>" => TokenKind::FatArrow,
            _ => TokenKind::Operator,
        };
        Token::new(kind, Span::new(start, end))
    }

    fn symbol(&mut self, kind: TokenKind, start: Pos) -> Token {
        self.cursor.advance();
        Token::new(kind, Span::new(start, self.cursor.pos()))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.emitted_eof {
            return None;
        }
        loop {
            match self.next_token() {
                Ok(token) => {
                    if token.kind == TokenKind::Eof {
                        self.emitted_eof = true;
                    } else if self.ignore_trivia && token.is_trivia() {
                        continue;
                    }
                    return Some(Ok(token));
                }
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }
}

fn is_whitespace_char(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n' | ';')
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_operator_char(c: char) -> bool {
    matches!(
        c,
        '~' | '!' | '$' | '%' | '^' | '&' | '*' | '+' | '-' | '=' | '|' | '<' | '>' | '?' | '/'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .expect("lexes cleanly")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn int_value(token: &Token) -> i64 {
        match token.value {
            Some(TokenValue::Int(v)) => v,
            ref other => panic!("expected int value, got {other:?}"),
        }
    }

    #[test]
    fn keyword_vs_identifier() {
        // `int` and `integer` are distinct keywords; `interrupt` is not one.
        assert_eq!(
            kinds("int integer interrupt"),
            vec![
                TokenKind::Int,
                TokenKind::Integer,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn hex_and_binary_literals() {
        let tokens = Lexer::tokenize("0xFF 0b101").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(int_value(&tokens[0]), 255);
        assert_eq!(int_value(&tokens[1]), 5);
    }

    #[test]
    fn bare_radix_prefix_is_zero_then_identifier() {
        assert_eq!(
            kinds("0x"),
            vec![TokenKind::IntLiteral, TokenKind::Ident, TokenKind::Eof]
        );
        assert_eq!(
            kinds("0b"),
            vec![TokenKind::IntLiteral, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        let tokens = Lexer::tokenize("123.").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
        assert_eq!(int_value(&tokens[0]), 123);
        assert_eq!(tokens[1].kind, TokenKind::Dot);
    }

    #[test]
    fn trailing_exponent_is_not_part_of_number() {
        let tokens = Lexer::tokenize("0.1e").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[0].value, Some(TokenValue::Float(0.1)));
        assert_eq!(tokens[1].kind, TokenKind::Ident);
    }

    #[test]
    fn float_with_exponent() {
        let tokens = Lexer::tokenize("1.5e3 1e2").unwrap();
        assert_eq!(tokens[0].value, Some(TokenValue::Float(1500.0)));
        assert_eq!(tokens[1].value, Some(TokenValue::Float(100.0)));
    }

    #[test]
    fn lone_zero_is_not_extended_by_digits() {
        assert_eq!(
            kinds("01"),
            vec![TokenKind::IntLiteral, TokenKind::IntLiteral, TokenKind::Eof]
        );
    }

    #[test]
    fn minus_after_value_is_an_operator() {
        let tokens = Lexer::tokenize("a -1").unwrap();
        // After whitespace the `-` is a numeric sign.
        assert_eq!(tokens[1].kind, TokenKind::IntLiteral);
        assert_eq!(int_value(&tokens[1]), -1);

        let tokens = Lexer::tokenize("a-1").unwrap();
        // Directly after an identifier it is subtraction.
        assert_eq!(tokens[1].kind, TokenKind::Operator);
        assert_eq!(tokens[2].kind, TokenKind::IntLiteral);
        assert_eq!(int_value(&tokens[2]), 1);
    }

    #[test]
    fn minus_after_open_delimiter_is_a_sign() {
        let tokens = Lexer::tokenize("f(-3)").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::IntLiteral);
        assert_eq!(int_value(&tokens[2]), -3);
    }

    #[test]
    fn string_escapes_decode() {
        let tokens = Lexer::tokenize(r#""a\n\x41B\u{43}\q""#).unwrap();
        assert_eq!(
            tokens[0].value,
            Some(TokenValue::Str("a\nABCq".to_owned()))
        );
    }

    #[test]
    fn unterminated_string_position() {
        let err = Lexer::tokenize("\"abcd").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!((err.span.start.line, err.span.start.col), (1, 5));
    }

    #[test]
    fn char_literals() {
        let tokens = Lexer::tokenize(r"'a' '\n' '\u{1F600}'").unwrap();
        assert_eq!(tokens[0].value, Some(TokenValue::Char('a')));
        assert_eq!(tokens[1].value, Some(TokenValue::Char('\n')));
        assert_eq!(tokens[2].value, Some(TokenValue::Char('\u{1F600}')));
    }

    #[test]
    fn empty_char_is_an_error() {
        let err = Lexer::tokenize("''").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::EmptyChar);
    }

    #[test]
    fn multi_codepoint_char_is_an_error() {
        let err = Lexer::tokenize("'ab'").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedChar);
    }

    #[test]
    fn invalid_hex_escape() {
        let err = Lexer::tokenize(r#""\xG1""#).unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::InvalidEscape(_)));
    }

    #[test]
    fn assignment_vs_operator_runs() {
        assert_eq!(
            kinds("= => == ==="),
            vec![
                TokenKind::Assign,
                TokenKind::FatArrow,
                TokenKind::Operator,
                TokenKind::Operator,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn semicolon_produces_newline_token() {
        assert_eq!(
            kinds("a; b"),
            vec![
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn whitespace_runs_coalesce() {
        let tokens = Lexer::tokenize_with_trivia("a \t b\n\n  c").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn comments() {
        let tokens = Lexer::tokenize_with_trivia("a // line\nb /* block */ c").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::Comment,
                TokenKind::Ident,
                TokenKind::Whitespace,
                TokenKind::Comment,
                TokenKind::Whitespace,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn unterminated_block_comment_is_not_an_error() {
        let tokens = Lexer::tokenize_with_trivia("a /* open").unwrap();
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn stray_byte_is_an_error() {
        let err = Lexer::tokenize("a @ b").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('@'));
    }

    #[test]
    fn default_mode_drops_whitespace_keeps_newlines() {
        assert_eq!(
            kinds("a\nb"),
            vec![
                TokenKind::Ident,
                TokenKind::Newline,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }
}
