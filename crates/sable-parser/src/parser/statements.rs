//! Statement parsers.
//!
//! Statements live in block bodies. Newlines (or `;`) separate them; a
//! lone terminator contributes nothing and empty blocks reduce to Noop
//! during lowering.

use crate::syntax_kind::SyntaxKind;

use super::{expressions, types, Parser};

/// `{ stmt* }`
pub(crate) fn parse_block(p: &mut Parser) {
    let m = p.open();
    p.advance(); // {
    p.eat_terminators();
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        parse_stmt(p);
        if p.has_error() {
            break;
        }
        p.expect_terminator("statement");
        p.eat_terminators();
    }
    p.expect(SyntaxKind::R_BRACE, "`}` closing block");
    p.close(m, SyntaxKind::BLOCK_STMT);
}

fn parse_stmt(p: &mut Parser) {
    match p.current() {
        SyntaxKind::L_BRACE => parse_block(p),
        SyntaxKind::BREAK_KW => {
            let m = p.open();
            p.advance();
            p.close(m, SyntaxKind::BREAK_STMT);
        }
        SyntaxKind::CONTINUE_KW => {
            let m = p.open();
            p.advance();
            p.close(m, SyntaxKind::CONTINUE_STMT);
        }
        SyntaxKind::DO_KW => parse_do_while(p),
        SyntaxKind::FOR_KW => parse_for(p),
        SyntaxKind::RETURN_KW => parse_return(p),
        SyntaxKind::THROW_KW => {
            let m = p.open();
            p.advance();
            expressions::expr(p);
            p.close(m, SyntaxKind::THROW_STMT);
        }
        SyntaxKind::TRY_KW => parse_try(p),
        SyntaxKind::WHILE_KW => parse_while(p),
        _ => {
            let m = p.open();
            expressions::expr(p);
            p.close(m, SyntaxKind::EXPR_STMT);
        }
    }
}

/// `do <stmt> while (<expr>)`
fn parse_do_while(p: &mut Parser) {
    let m = p.open();
    p.advance(); // do
    parse_stmt(p);
    p.expect(SyntaxKind::WHILE_KW, "`while` after do body");
    p.expect(SyntaxKind::L_PAREN, "`(` after `while`");
    expressions::expr(p);
    p.expect(SyntaxKind::R_PAREN, "`)` after condition");
    p.close(m, SyntaxKind::DO_WHILE_STMT);
}

/// `for <name> in <expr> <stmt>`
fn parse_for(p: &mut Parser) {
    let m = p.open();
    p.advance(); // for
    p.expect(SyntaxKind::IDENT, "loop variable");
    p.expect(SyntaxKind::IN_KW, "`in` in for loop");
    expressions::expr(p);
    parse_stmt(p);
    p.close(m, SyntaxKind::FOR_STMT);
}

/// `return [<expr>]` -- the value is present unless a terminator or the
/// end of the block follows directly.
fn parse_return(p: &mut Parser) {
    let m = p.open();
    p.advance(); // return
    if !p.at_terminator() && !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) {
        expressions::expr(p);
    }
    p.close(m, SyntaxKind::RETURN_STMT);
}

/// `try <stmt> catch (<type> <name>) <stmt> [finally <stmt>]`
fn parse_try(p: &mut Parser) {
    let m = p.open();
    p.advance(); // try
    parse_stmt(p);
    if p.peek_past_terminators() == SyntaxKind::CATCH_KW {
        p.eat_terminators();
        let c = p.open();
        p.advance(); // catch
        p.expect(SyntaxKind::L_PAREN, "`(` after `catch`");
        types::parse_type(p);
        p.expect(SyntaxKind::IDENT, "catch binding");
        p.expect(SyntaxKind::R_PAREN, "`)` after catch binding");
        parse_stmt(p);
        p.close(c, SyntaxKind::CATCH_CLAUSE);
    } else {
        p.error("expected `catch` after try body");
    }
    if p.peek_past_terminators() == SyntaxKind::FINALLY_KW {
        p.eat_terminators();
        let f = p.open();
        p.advance(); // finally
        parse_stmt(p);
        p.close(f, SyntaxKind::FINALLY_CLAUSE);
    }
    p.close(m, SyntaxKind::TRY_STMT);
}

/// `while (<expr>) <stmt>`
fn parse_while(p: &mut Parser) {
    let m = p.open();
    p.advance(); // while
    p.expect(SyntaxKind::L_PAREN, "`(` after `while`");
    expressions::expr(p);
    p.expect(SyntaxKind::R_PAREN, "`)` after condition");
    parse_stmt(p);
    p.close(m, SyntaxKind::WHILE_STMT);
}
