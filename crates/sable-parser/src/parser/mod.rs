//! Event-based parser for Sable.
//!
//! The parser consumes a token stream and produces events (Open/Close/
//! Advance) that are later converted into a rowan green tree. Parse
//! functions are plain functions over a `Parser`; there is no registry of
//! rules, and parse failures are collected values rather than exceptions.
//!
//! # Architecture
//!
//! 1. Parse functions call `open()` to start a node, `advance()` to consume
//!    tokens, and `close()` to finish a node with its actual kind.
//! 2. Events are collected into a flat `Vec<Event>`.
//! 3. `build_tree()` converts events into a rowan `GreenNode`.
//!
//! `open_before()` wraps a previously completed node (e.g. turning a name
//! into `call_expr(name, arg_list)`) via the "forward parent" technique --
//! this is how every left-recursive production (application, field access,
//! array access, binary chains, type suffixes) folds to the left.
//!
//! # Newlines
//!
//! Newlines (which also stand in for `;`) are significant terminators
//! except inside `(...)` and `[...]`, where lookahead skips them. Brace
//! contexts (blocks, struct types, import/export lists) manage newlines
//! explicitly. `at_terminator()` answers the "must see newline" question:
//! did the trivia ahead of the current token contain a `\n` or `;`?
//!
//! # `<` / `>`
//!
//! Operator tokens are maximal runs, so `List<List<int>>` ends in a single
//! `>>` token. Type-argument lists split such runs: the whole token is
//! consumed into the tree on the first close and the remaining `>`s are
//! served as virtual tokens (`pending_gt`). In expression position a
//! multi-character operator containing `>` but no `<` is never accepted as
//! a binary operator.

pub(crate) mod expressions;
pub(crate) mod items;
pub(crate) mod statements;
pub(crate) mod types;

use sable_common::ops::OperatorTable;
use sable_common::span::{Pos, Span};
use sable_common::token::{Token, TokenKind};

use crate::error::ParseError;
use crate::syntax_kind::SyntaxKind;

/// A parser event. Events are collected during parsing and later converted
/// into a rowan green tree by [`Parser::build_tree`].
#[derive(Debug)]
enum Event {
    /// Start a new CST node. The `kind` is initially TOMBSTONE and gets
    /// patched by `close()` with the real node kind.
    Open {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },
    /// Finish the current CST node.
    Close,
    /// Consume the current token, advancing the token position.
    Advance,
}

/// An opaque marker for a started but not-yet-closed CST node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkOpened {
    index: usize,
}

/// An opaque marker for a completed CST node, usable with `open_before()`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkClosed {
    index: usize,
}

/// Event-based parser for Sable source code.
pub(crate) struct Parser<'a> {
    /// All tokens from the lexer, trivia included, ending with Eof.
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// Collected parser events.
    events: Vec<Event>,
    /// Original source text (for extracting token text via spans).
    source: &'a str,
    /// The operator table, threaded in from the caller. Used to decide
    /// prefix/postfix/infix-ness of operator tokens.
    operators: &'a OperatorTable,
    /// Parenthesis nesting depth for newline significance.
    paren_depth: u32,
    /// Bracket nesting depth for newline significance.
    bracket_depth: u32,
    /// Number of virtual `>` tokens still to serve from a split operator run.
    pending_gt: u32,
    /// Collected parse errors (first-error-only strategy).
    errors: Vec<ParseError>,
    has_error: bool,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'a str, operators: &'a OperatorTable) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            source,
            operators,
            paren_depth: 0,
            bracket_depth: 0,
            pending_gt: 0,
            errors: Vec::new(),
            has_error: false,
        }
    }

    pub(crate) fn operators(&self) -> &OperatorTable {
        self.operators
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    /// The kind of the current significant token.
    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// The kind of the Nth significant token ahead. Skips trivia and
    /// insignificant newlines. Virtual `>` tokens from a split run come
    /// first.
    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        if (n as u32) < self.pending_gt {
            return SyntaxKind::OPERATOR;
        }
        let n = n - self.pending_gt as usize;
        let mut pos = self.pos;
        let mut remaining = n;
        while pos < self.tokens.len() {
            let kind = self.tokens[pos].kind;
            if self.should_skip(kind) {
                pos += 1;
                continue;
            }
            if remaining == 0 {
                return SyntaxKind::from(kind);
            }
            remaining -= 1;
            pos += 1;
        }
        SyntaxKind::EOF
    }

    /// The text of the current significant token.
    pub(crate) fn current_text(&self) -> &str {
        if self.pending_gt > 0 {
            return ">";
        }
        let pos = self.skip_to_significant(self.pos);
        if pos < self.tokens.len() {
            let span = self.tokens[pos].span;
            &self.source[span.start.offset as usize..span.end.offset as usize]
        } else {
            ""
        }
    }

    /// The span of the current significant token.
    pub(crate) fn current_span(&self) -> Span {
        let pos = self.skip_to_significant(self.pos);
        if pos < self.tokens.len() {
            self.tokens[pos].span
        } else {
            let line = self.tokens.last().map_or(1, |t| t.span.end.line);
            let col = self.tokens.last().map_or(1, |t| t.span.end.col);
            Span::point(Pos::new(self.source.len() as u32, line, col))
        }
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Whether the current token is an operator with exactly this text.
    pub(crate) fn at_operator(&self, symbol: &str) -> bool {
        self.current() == SyntaxKind::OPERATOR && self.current_text() == symbol
    }

    /// Whether the current token is an operator run consisting only of `>`
    /// characters (`>`, `>>`, ...), the shape a type-argument list may
    /// close with.
    pub(crate) fn at_gt_run(&self) -> bool {
        if self.pending_gt > 0 {
            return true;
        }
        self.current() == SyntaxKind::OPERATOR
            && !self.current_text().is_empty()
            && self.current_text().chars().all(|c| c == '>')
    }

    // ── Node management ────────────────────────────────────────────────

    /// Start a new CST node. The kind is patched in by `close()`.
    pub(crate) fn open(&mut self) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        mark
    }

    /// Start a new CST node wrapping a previously completed one, using the
    /// forward-parent link so event indices stay stable.
    pub(crate) fn open_before(&mut self, completed: MarkClosed) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        if let Event::Open { forward_parent, .. } = &mut self.events[completed.index] {
            *forward_parent = Some(mark.index);
        }
        mark
    }

    /// Close a CST node, patching its Open event with the actual kind.
    pub(crate) fn close(&mut self, m: MarkOpened, kind: SyntaxKind) -> MarkClosed {
        if let Event::Open {
            kind: slot_kind, ..
        } = &mut self.events[m.index]
        {
            *slot_kind = kind;
        }
        self.events.push(Event::Close);
        MarkClosed { index: m.index }
    }

    // ── Token consumption ──────────────────────────────────────────────

    /// Consume the current significant token, emitting Advance events for
    /// all skipped trivia so they appear in the CST. Consuming a virtual
    /// `>` from a split run advances nothing (its token is already in the
    /// tree).
    pub(crate) fn advance(&mut self) {
        if self.pending_gt > 0 {
            self.pending_gt -= 1;
            return;
        }
        while self.pos < self.tokens.len() && self.should_skip(self.tokens[self.pos].kind) {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
        if self.pos < self.tokens.len() {
            self.update_delimiter_depth(self.tokens[self.pos].kind);
            self.events.push(Event::Advance);
            self.pos += 1;
        }
    }

    /// Consume an all-`>` operator run as a single type-argument closer.
    ///
    /// The first call consumes the whole token; the remaining `>`s are
    /// served as virtual tokens by subsequent calls. Returns false if the
    /// current token is not a `>` run.
    pub(crate) fn eat_gt(&mut self) -> bool {
        if self.pending_gt > 0 {
            self.pending_gt -= 1;
            return true;
        }
        if !self.at_gt_run() {
            return false;
        }
        let extra = self.current_text().len() as u32 - 1;
        self.advance();
        self.pending_gt = extra;
        true
    }

    /// Whether a `>` run has been split but not fully consumed. A dangling
    /// split at the end of a type is a syntax error the caller reports.
    pub(crate) fn has_pending_gt(&self) -> bool {
        self.pending_gt > 0
    }

    /// Consume the current token wrapped in an ERROR_NODE.
    pub(crate) fn advance_with_error(&mut self, message: &str) {
        let m = self.open();
        self.error(message);
        self.advance();
        self.close(m, SyntaxKind::ERROR_NODE);
    }

    /// If the current token matches, consume it; otherwise report an error
    /// keyed on the committed production.
    pub(crate) fn expect(&mut self, kind: SyntaxKind, context: &str) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            self.error(&format!("expected {context}"));
            false
        }
    }

    /// If the current token matches, consume it and return true.
    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume newline tokens (and trivia) at a point where newlines are
    /// separators, e.g. between declarations or block statements.
    pub(crate) fn eat_terminators(&mut self) {
        while self.pos < self.tokens.len() {
            let kind = self.tokens[self.pos].kind;
            if kind == TokenKind::Whitespace
                || kind == TokenKind::Comment
                || kind == TokenKind::Newline
            {
                self.events.push(Event::Advance);
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    // ── Terminators ────────────────────────────────────────────────────

    /// The "must see newline" predicate: does the trivia ahead of the
    /// current significant token contain a `\n` or `;`? A line comment
    /// swallows its trailing newline, so comment text is inspected too.
    pub(crate) fn at_terminator(&self) -> bool {
        let mut pos = self.pos;
        while pos < self.tokens.len() {
            let token = &self.tokens[pos];
            match token.kind {
                TokenKind::Newline => return true,
                TokenKind::Whitespace => pos += 1,
                TokenKind::Comment => {
                    let text = &self.source
                        [token.span.start.offset as usize..token.span.end.offset as usize];
                    if text.contains('\n') {
                        return true;
                    }
                    pos += 1;
                }
                _ => return false,
            }
        }
        false
    }

    /// The kind of the next significant token when newlines (and trivia)
    /// ahead are ignored. Lets a parser decide whether to consume
    /// terminators before a continuation keyword (`catch`, `finally`).
    pub(crate) fn peek_past_terminators(&self) -> SyntaxKind {
        let mut pos = self.pos;
        while pos < self.tokens.len() {
            match self.tokens[pos].kind {
                TokenKind::Whitespace | TokenKind::Comment | TokenKind::Newline => pos += 1,
                kind => return SyntaxKind::from(kind),
            }
        }
        SyntaxKind::EOF
    }

    /// Require a terminator after a declaration or statement: a newline,
    /// end of file, or a closing brace ending the surrounding context.
    pub(crate) fn expect_terminator(&mut self, context: &str) {
        if self.at_terminator() {
            self.eat_terminators();
            return;
        }
        if self.at(SyntaxKind::EOF) || self.at(SyntaxKind::R_BRACE) {
            return;
        }
        self.error(&format!("expected newline after {context}"));
    }

    // ── Error reporting ────────────────────────────────────────────────

    /// Record a parse error at the current position. Sets the error flag,
    /// which makes every parse loop unwind; only the first error is kept,
    /// so later cascade failures stay silent.
    pub(crate) fn error(&mut self, message: &str) {
        if self.has_error {
            return;
        }
        let span = self.current_span();
        self.errors.push(ParseError::new(message, span));
        self.has_error = true;
    }

    pub(crate) fn has_error(&self) -> bool {
        self.has_error
    }

    // ── Significance ───────────────────────────────────────────────────

    /// Whether a token is skipped by lookahead. Trivia always; newlines
    /// only inside parentheses or brackets.
    fn should_skip(&self, kind: TokenKind) -> bool {
        match kind {
            TokenKind::Whitespace | TokenKind::Comment => true,
            TokenKind::Newline => self.paren_depth > 0 || self.bracket_depth > 0,
            _ => false,
        }
    }

    fn skip_to_significant(&self, mut pos: usize) -> usize {
        while pos < self.tokens.len() && self.should_skip(self.tokens[pos].kind) {
            pos += 1;
        }
        pos
    }

    fn update_delimiter_depth(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::LParen => self.paren_depth += 1,
            TokenKind::RParen => self.paren_depth = self.paren_depth.saturating_sub(1),
            TokenKind::LBracket => self.bracket_depth += 1,
            TokenKind::RBracket => self.bracket_depth = self.bracket_depth.saturating_sub(1),
            _ => {}
        }
    }

    /// Raw-token scan from the current position: find the token index of
    /// the matching `)` for an `(` at the current significant position.
    /// Used by the lambda/tuple lookahead. Returns the index of the token
    /// after the matching `)`, significant-skipped, or None.
    pub(crate) fn kind_after_matching_paren(&self) -> Option<SyntaxKind> {
        let mut pos = self.skip_to_significant(self.pos);
        if pos >= self.tokens.len() || self.tokens[pos].kind != TokenKind::LParen {
            return None;
        }
        let mut depth = 0u32;
        while pos < self.tokens.len() {
            match self.tokens[pos].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        let next = self.skip_to_significant_nested(pos + 1);
                        return Some(
                            self.tokens
                                .get(next)
                                .map_or(SyntaxKind::EOF, |t| SyntaxKind::from(t.kind)),
                        );
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
            pos += 1;
        }
        None
    }

    /// Like `skip_to_significant` but also skips newlines, for raw scans
    /// that cross delimiter boundaries.
    fn skip_to_significant_nested(&self, mut pos: usize) -> usize {
        while pos < self.tokens.len()
            && matches!(
                self.tokens[pos].kind,
                TokenKind::Whitespace | TokenKind::Comment
            )
        {
            pos += 1;
        }
        pos
    }

    // ── Tree building ──────────────────────────────────────────────────

    /// Convert collected events into a rowan `GreenNode` and errors.
    ///
    /// Forward parents: when `open_before(completed)` was called, the
    /// completed node's Open event carries a link to the wrapping Open.
    /// When tree building reaches such an Open it follows the chain,
    /// starts the wrappers outermost-first, and tombstones them so they
    /// are skipped when reached directly.
    pub(crate) fn build_tree(mut self) -> (rowan::GreenNode, Vec<ParseError>) {
        let mut builder = rowan::GreenNodeBuilder::new();
        let mut token_pos = 0usize;
        let mut forward_parents: Vec<SyntaxKind> = Vec::new();

        for i in 0..self.events.len() {
            match std::mem::replace(
                &mut self.events[i],
                Event::Open {
                    kind: SyntaxKind::TOMBSTONE,
                    forward_parent: None,
                },
            ) {
                Event::Open {
                    kind,
                    forward_parent,
                } => {
                    if kind == SyntaxKind::TOMBSTONE && forward_parent.is_none() {
                        continue;
                    }
                    forward_parents.push(kind);
                    let mut link = forward_parent;
                    while let Some(idx) = link {
                        link = None;
                        if let Event::Open {
                            kind,
                            forward_parent,
                        } = std::mem::replace(
                            &mut self.events[idx],
                            Event::Open {
                                kind: SyntaxKind::TOMBSTONE,
                                forward_parent: None,
                            },
                        ) {
                            forward_parents.push(kind);
                            link = forward_parent;
                        }
                    }
                    for kind in forward_parents.drain(..).rev() {
                        if kind != SyntaxKind::TOMBSTONE {
                            builder.start_node(rowan::SyntaxKind(kind as u16));
                        }
                    }
                }
                Event::Close => builder.finish_node(),
                Event::Advance => {
                    let token = &self.tokens[token_pos];
                    let text = &self.source
                        [token.span.start.offset as usize..token.span.end.offset as usize];
                    builder.token(rowan::SyntaxKind(SyntaxKind::from(token.kind) as u16), text);
                    token_pos += 1;
                }
            }
        }

        (builder.finish(), self.errors)
    }
}
