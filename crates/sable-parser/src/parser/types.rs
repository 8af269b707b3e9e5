//! Type-expression parsers.
//!
//! The left-recursive type productions (array `T[]`, union `T | U`,
//! specific `Name<args>`, namespace access `ns.Name`) use the base-plus-
//! suffix loop, folding left with `open_before`. Union binds loosest;
//! the postfix suffixes bind tightest.

use crate::syntax_kind::SyntaxKind;

use super::{MarkClosed, Parser};

/// Parse a type. Entry point for every type position.
pub(crate) fn parse_type(p: &mut Parser) {
    let Some(mut lhs) = parse_suffixed_type(p) else {
        return;
    };
    // Union suffix: `T | U | V`, folded left.
    while p.at_operator("|") && !p.has_error() {
        let m = p.open_before(lhs);
        p.advance(); // |
        parse_suffixed_type(p);
        lhs = p.close(m, SyntaxKind::UNION_TYPE);
    }
}

/// A base type with its postfix suffixes: `[]`, `<args>`, `.Name`.
fn parse_suffixed_type(p: &mut Parser) -> Option<MarkClosed> {
    let mut lhs = parse_base_type(p)?;
    loop {
        if p.has_error() || p.has_pending_gt() {
            break;
        }
        if p.at(SyntaxKind::L_BRACKET) && p.nth(1) == SyntaxKind::R_BRACKET {
            let m = p.open_before(lhs);
            p.advance(); // [
            p.advance(); // ]
            lhs = p.close(m, SyntaxKind::ARRAY_TYPE);
        } else if p.at(SyntaxKind::DOT) {
            let m = p.open_before(lhs);
            p.advance(); // .
            p.expect(SyntaxKind::IDENT, "type name after `.`");
            lhs = p.close(m, SyntaxKind::NAMESPACE_TYPE);
        } else if p.at_operator("<") {
            lhs = parse_type_args(p, lhs);
        } else {
            break;
        }
    }
    Some(lhs)
}

fn parse_base_type(p: &mut Parser) -> Option<MarkClosed> {
    match p.current() {
        kind if is_primitive_type_kind(kind) => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::PRIMITIVE_TYPE))
        }
        SyntaxKind::IDENT => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::NAME_TYPE))
        }
        SyntaxKind::L_PAREN => parse_paren_type(p),
        SyntaxKind::L_BRACE => parse_struct_type(p),
        _ => {
            p.error("expected type");
            None
        }
    }
}

/// `(T)`, `(T, U)`, `()`, or a function type `(T, U) => R`.
fn parse_paren_type(p: &mut Parser) -> Option<MarkClosed> {
    let m = p.open();
    p.advance(); // (
    let mut count = 0usize;
    let mut saw_comma = false;
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        parse_type(p);
        count += 1;
        if p.eat(SyntaxKind::COMMA) {
            saw_comma = true;
            if p.at(SyntaxKind::R_PAREN) {
                p.error("expected type");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN, "`)` closing type list");

    if p.at(SyntaxKind::FAT_ARROW) {
        p.advance(); // =>
        parse_type(p);
        return Some(p.close(m, SyntaxKind::FUNCTION_TYPE));
    }
    if count == 1 && !saw_comma {
        Some(p.close(m, SyntaxKind::PAREN_TYPE))
    } else {
        Some(p.close(m, SyntaxKind::TUPLE_TYPE))
    }
}

/// `{ T name; U other }` -- fields terminated by newlines or `;`.
fn parse_struct_type(p: &mut Parser) -> Option<MarkClosed> {
    let m = p.open();
    p.advance(); // {
    p.eat_terminators();
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        let f = p.open();
        parse_type(p);
        p.expect(SyntaxKind::IDENT, "field name");
        p.close(f, SyntaxKind::STRUCT_TYPE_FIELD);
        if p.at_terminator() {
            p.eat_terminators();
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_BRACE, "`}` closing struct type");
    Some(p.close(m, SyntaxKind::STRUCT_TYPE))
}

/// `<T, U>` after a named type. The closing `>` may be the first character
/// of a longer `>`-run (nested generics), which `eat_gt` splits.
fn parse_type_args(p: &mut Parser, lhs: MarkClosed) -> MarkClosed {
    let m = p.open_before(lhs);
    let args = p.open();
    p.advance(); // <
    while !p.has_error() {
        parse_type(p);
        if p.eat(SyntaxKind::COMMA) {
            if p.at_gt_run() {
                p.error("expected type argument");
            }
            continue;
        }
        break;
    }
    if !p.has_error() && !p.eat_gt() {
        p.error("expected `>` closing type arguments");
    }
    p.close(args, SyntaxKind::TYPE_ARG_LIST);
    p.close(m, SyntaxKind::SPECIFIC_TYPE)
}

pub(super) fn is_primitive_type_kind(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::U8_KW
            | SyntaxKind::I8_KW
            | SyntaxKind::U16_KW
            | SyntaxKind::I16_KW
            | SyntaxKind::U32_KW
            | SyntaxKind::I32_KW
            | SyntaxKind::U64_KW
            | SyntaxKind::I64_KW
            | SyntaxKind::BYTE_KW
            | SyntaxKind::SHORT_KW
            | SyntaxKind::INTEGER_KW
            | SyntaxKind::LONG_KW
            | SyntaxKind::INT_KW
            | SyntaxKind::F32_KW
            | SyntaxKind::F64_KW
            | SyntaxKind::FLOAT_KW
            | SyntaxKind::DOUBLE_KW
            | SyntaxKind::CHAR_KW
            | SyntaxKind::STRING_KW
            | SyntaxKind::BOOL_KW
            | SyntaxKind::VOID_KW
            | SyntaxKind::ANY_KW
    )
}
