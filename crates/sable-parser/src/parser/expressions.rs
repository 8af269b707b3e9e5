//! Expression parsers.
//!
//! Binary expressions are parsed as flat left-associative chains no matter
//! which operators are involved; the precedence resolver rebuilds the tree
//! after reduction. Prefix and postfix unary operators, application, field
//! access and array access all bind tighter than any binary operator and
//! are handled by the suffix loop here.

use crate::syntax_kind::SyntaxKind;

use super::{types, MarkClosed, Parser};

/// Parse an expression at the outermost level.
pub(crate) fn expr(p: &mut Parser) {
    let _ = expr_binary(p);
}

/// Left-associative binary chain: `operand (op operand)*`.
///
/// A multi-character operator token containing `>` but no `<` (e.g. the
/// `>>` that closes nested generics) is never accepted as a binary
/// operator. An operator registered postfix-only attaches as a postfix
/// unary instead of starting a binary tail.
fn expr_binary(p: &mut Parser) -> Option<MarkClosed> {
    let mut lhs = expr_unary(p)?;
    loop {
        if p.has_error() {
            break;
        }
        if p.at(SyntaxKind::ASSIGN) {
            let m = p.open_before(lhs);
            p.advance(); // =
            expr_unary(p);
            lhs = p.close(m, SyntaxKind::BINARY_EXPR);
            continue;
        }
        if p.at(SyntaxKind::OPERATOR) {
            let text = p.current_text();
            if text.len() > 1 && text.contains('>') && !text.contains('<') {
                break;
            }
            let postfix_only = p.operators().postfix(text).is_some()
                && p.operators().infix(text).is_none();
            let m = p.open_before(lhs);
            p.advance(); // the operator
            if postfix_only {
                lhs = p.close(m, SyntaxKind::POSTFIX_EXPR);
            } else {
                expr_unary(p);
                lhs = p.close(m, SyntaxKind::BINARY_EXPR);
            }
            continue;
        }
        break;
    }
    Some(lhs)
}

/// A prefix-operator chain in front of a postfix expression.
fn expr_unary(p: &mut Parser) -> Option<MarkClosed> {
    if p.at(SyntaxKind::OPERATOR) && p.operators().prefix(p.current_text()).is_some() {
        let m = p.open();
        p.advance(); // the operator
        expr_unary(p);
        return Some(p.close(m, SyntaxKind::PREFIX_EXPR));
    }
    expr_postfix(p)
}

/// A primary expression with its suffixes: application, array access and
/// field access, folded left.
fn expr_postfix(p: &mut Parser) -> Option<MarkClosed> {
    let mut lhs = expr_primary(p)?;
    loop {
        if p.has_error() {
            break;
        }
        match p.current() {
            SyntaxKind::L_PAREN => {
                let m = p.open_before(lhs);
                parse_arg_list(p);
                lhs = p.close(m, SyntaxKind::CALL_EXPR);
            }
            SyntaxKind::L_BRACKET => {
                let m = p.open_before(lhs);
                p.advance(); // [
                expr(p);
                p.expect(SyntaxKind::R_BRACKET, "`]` closing index");
                lhs = p.close(m, SyntaxKind::ARRAY_ACCESS);
            }
            SyntaxKind::DOT => {
                let m = p.open_before(lhs);
                p.advance(); // .
                p.expect(SyntaxKind::IDENT, "field name");
                lhs = p.close(m, SyntaxKind::FIELD_ACCESS);
            }
            _ => break,
        }
    }
    Some(lhs)
}

fn expr_primary(p: &mut Parser) -> Option<MarkClosed> {
    match p.current() {
        SyntaxKind::INT_LITERAL
        | SyntaxKind::FLOAT_LITERAL
        | SyntaxKind::CHAR_LITERAL
        | SyntaxKind::STRING_LITERAL
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::LITERAL))
        }
        SyntaxKind::IDENT => {
            if p.nth(1) == SyntaxKind::ASSIGN {
                // `name = expr` introduces a binding.
                let m = p.open();
                p.advance(); // name
                p.advance(); // =
                expr(p);
                return Some(p.close(m, SyntaxKind::VAR_DECL_EXPR));
            }
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::NAME_REF))
        }
        SyntaxKind::L_PAREN => {
            if p.kind_after_matching_paren() == Some(SyntaxKind::FAT_ARROW) {
                parse_lambda(p)
            } else {
                parse_paren_or_tuple(p)
            }
        }
        SyntaxKind::L_BRACKET => parse_array_literal(p),
        SyntaxKind::L_BRACE => parse_struct_literal(p),
        SyntaxKind::IF_KW => parse_if(p),
        _ => {
            p.error("expected expression");
            None
        }
    }
}

/// `(args)` of a function application.
fn parse_arg_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // (
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        expr(p);
        if p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_PAREN) {
                p.error("expected argument");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN, "`)` closing arguments");
    p.close(m, SyntaxKind::ARG_LIST);
}

/// `(expr)`, `(a, b)`, or `()` (the empty tuple).
fn parse_paren_or_tuple(p: &mut Parser) -> Option<MarkClosed> {
    let m = p.open();
    p.advance(); // (
    if p.eat(SyntaxKind::R_PAREN) {
        return Some(p.close(m, SyntaxKind::TUPLE_LITERAL));
    }
    let mut count = 0usize;
    let mut saw_comma = false;
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        expr(p);
        count += 1;
        if p.eat(SyntaxKind::COMMA) {
            saw_comma = true;
            if p.at(SyntaxKind::R_PAREN) {
                p.error("expected expression");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN, "`)` closing parenthesis");
    if count == 1 && !saw_comma {
        Some(p.close(m, SyntaxKind::PAREN_EXPR))
    } else {
        Some(p.close(m, SyntaxKind::TUPLE_LITERAL))
    }
}

/// `(params) => expr` -- parameters may be bare names or `type name`.
fn parse_lambda(p: &mut Parser) -> Option<MarkClosed> {
    let m = p.open();
    let pl = p.open();
    p.advance(); // (
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        let lp = p.open();
        if p.at(SyntaxKind::IDENT)
            && matches!(p.nth(1), SyntaxKind::COMMA | SyntaxKind::R_PAREN)
        {
            p.advance(); // bare name
        } else {
            types::parse_type(p);
            p.expect(SyntaxKind::IDENT, "parameter name");
        }
        p.close(lp, SyntaxKind::LAMBDA_PARAM);
        if p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_PAREN) {
                p.error("expected parameter");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN, "`)` closing parameters");
    p.close(pl, SyntaxKind::LAMBDA_PARAM_LIST);
    p.expect(SyntaxKind::FAT_ARROW, "`=>` in lambda");
    expr(p);
    Some(p.close(m, SyntaxKind::LAMBDA_EXPR))
}

/// `[a, b, c]`
fn parse_array_literal(p: &mut Parser) -> Option<MarkClosed> {
    let m = p.open();
    p.advance(); // [
    while !p.at(SyntaxKind::R_BRACKET) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        expr(p);
        if p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_BRACKET) {
                p.error("expected expression");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_BRACKET, "`]` closing array literal");
    Some(p.close(m, SyntaxKind::ARRAY_LITERAL))
}

/// `{ field: expr, ... }` -- newlines are soft separators alongside commas.
fn parse_struct_literal(p: &mut Parser) -> Option<MarkClosed> {
    let m = p.open();
    p.advance(); // {
    p.eat_terminators();
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        let f = p.open();
        p.expect(SyntaxKind::IDENT, "field name");
        p.expect(SyntaxKind::COLON, "`:` after field name");
        expr(p);
        p.close(f, SyntaxKind::STRUCT_LITERAL_FIELD);
        p.eat_terminators();
        if p.eat(SyntaxKind::COMMA) {
            p.eat_terminators();
            if p.at(SyntaxKind::R_BRACE) {
                p.error("expected field name");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_BRACE, "`}` closing struct literal");
    Some(p.close(m, SyntaxKind::STRUCT_LITERAL))
}

/// `if (cond) then-expr else else-expr` -- the else branch is mandatory,
/// this is an expression.
fn parse_if(p: &mut Parser) -> Option<MarkClosed> {
    let m = p.open();
    p.advance(); // if
    p.expect(SyntaxKind::L_PAREN, "`(` after `if`");
    expr(p);
    p.expect(SyntaxKind::R_PAREN, "`)` after condition");
    expr(p);
    p.expect(SyntaxKind::ELSE_KW, "`else` in if expression");
    expr(p);
    Some(p.close(m, SyntaxKind::IF_EXPR))
}
