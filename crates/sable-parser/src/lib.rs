//! Sable parser: recursive descent over the token stream, producing a
//! lossless rowan CST, plus the reducer to the owned AST and the post-parse
//! operator precedence resolver.
//!
//! The pipeline a caller drives:
//!
//! ```ignore
//! let operators = OperatorTable::default();
//! let parse = sable_parser::parse(source, &operators)?;
//! let mut program = sable_parser::lower::lower_program(&parse, source);
//! let precedence_errors = sable_parser::precedence::resolve_program(&mut program, &operators);
//! ```
//!
//! The operator table is an explicit value threaded in by the caller;
//! nothing in this crate holds global state.

pub mod ast;
pub mod cst;
pub mod error;
pub mod lower;
mod parser;
pub mod precedence;
pub mod syntax_kind;

use sable_common::error::LexError;
use sable_common::ops::OperatorTable;
use sable_lexer::Lexer;

pub use cst::{debug_tree, SyntaxElement, SyntaxNode, SyntaxToken};
pub use error::ParseError;
pub use syntax_kind::SyntaxKind;

/// Result of parsing a Sable source file.
///
/// Contains the green tree (the immutable, cheap-to-clone CST) and any
/// parse errors. With the first-error strategy, `errors` holds at most one.
pub struct Parse {
    green: rowan::GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Build the syntax tree root from the green node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Parse errors encountered during parsing.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a Sable source file into a CST.
///
/// Lexical errors abort and surface as `Err`; syntactic errors are
/// collected on the returned [`Parse`].
pub fn parse(source: &str, operators: &OperatorTable) -> Result<Parse, LexError> {
    let tokens = Lexer::tokenize_with_trivia(source)?;
    let mut p = parser::Parser::new(tokens, source, operators);
    parser::items::parse_program(&mut p);
    let (green, errors) = p.build_tree();
    Ok(Parse { green, errors })
}

/// Parse a standalone expression. Used by tests and tooling.
pub fn parse_expr(source: &str, operators: &OperatorTable) -> Result<Parse, LexError> {
    let tokens = Lexer::tokenize_with_trivia(source)?;
    let mut p = parser::Parser::new(tokens, source, operators);
    let m = p.open();
    parser::expressions::expr(&mut p);
    p.eat_terminators();
    if p.at(SyntaxKind::EOF) {
        p.advance();
    } else if !p.has_error() {
        p.error("expected end of expression");
    }
    p.close(m, SyntaxKind::PROGRAM);
    let (green, errors) = p.build_tree();
    Ok(Parse { green, errors })
}
