//! Declaration parsers: program, import, export, export-forward, type,
//! func and const declarations.
//!
//! Declarations are terminated by newlines (or `;`, which the lexer folds
//! into newline tokens). Import and export brace lists treat newlines as
//! soft separators alongside commas.

use crate::syntax_kind::SyntaxKind;

use super::{expressions, statements, types, Parser};

/// Parse a whole source file into a PROGRAM node.
pub(crate) fn parse_program(p: &mut Parser) {
    let m = p.open();
    p.eat_terminators();
    while !p.at(SyntaxKind::EOF) && !p.has_error() {
        parse_declaration(p);
        if p.has_error() {
            break;
        }
        p.expect_terminator("declaration");
        p.eat_terminators();
    }
    p.eat_terminators();
    if p.at(SyntaxKind::EOF) {
        p.advance();
    }
    p.close(m, SyntaxKind::PROGRAM);
}

fn parse_declaration(p: &mut Parser) {
    match p.current() {
        SyntaxKind::IMPORT_KW => parse_import(p),
        SyntaxKind::EXPORT_KW => parse_export(p),
        SyntaxKind::TYPE_KW => parse_type_decl(p),
        SyntaxKind::FUNC_KW => parse_func_decl(p),
        SyntaxKind::CONST_KW => parse_const_decl(p),
        _ => p.advance_with_error("expected declaration"),
    }
}

// ── Imports ──────────────────────────────────────────────────────────────

/// `import from "mod": default`, `import from "mod": { a, b as c }`,
/// `import from "mod": * as ns`, or a default binding followed by a comma
/// and one of the braced/wildcard forms.
fn parse_import(p: &mut Parser) {
    let m = p.open();
    p.advance(); // import
    p.expect(SyntaxKind::FROM_KW, "`from` in import");
    p.expect(SyntaxKind::STRING_LITERAL, "module name string");
    p.expect(SyntaxKind::COLON, "`:` in import");

    if p.at(SyntaxKind::L_BRACE) {
        parse_import_list(p);
    } else if p.at_operator("*") {
        parse_import_entry(p);
    } else if p.at(SyntaxKind::IDENT) {
        let d = p.open();
        p.advance();
        p.close(d, SyntaxKind::IMPORT_DEFAULT);
        if p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::L_BRACE) {
                parse_import_list(p);
            } else if p.at_operator("*") {
                parse_import_entry(p);
            } else {
                p.error("expected import list");
            }
        }
    } else {
        p.error("expected import name");
    }

    p.close(m, SyntaxKind::IMPORT_DECL);
}

/// `{ a, b as c, * as ns }` -- at least one entry; a separator with no
/// entry after it is an error.
fn parse_import_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // {
    p.eat_terminators();
    if p.at(SyntaxKind::R_BRACE) {
        p.error("expected import name");
    }
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        parse_import_entry(p);
        p.eat_terminators();
        if p.eat(SyntaxKind::COMMA) {
            p.eat_terminators();
            if p.at(SyntaxKind::R_BRACE) {
                p.error("expected import name");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_BRACE, "`}` closing import list");
    p.close(m, SyntaxKind::IMPORT_LIST);
}

/// `name`, `name as alias`, or `* as ns`.
fn parse_import_entry(p: &mut Parser) {
    let m = p.open();
    if p.at_operator("*") {
        p.advance();
        p.expect(SyntaxKind::AS_KW, "`as` after `*`");
        p.expect(SyntaxKind::IDENT, "namespace alias");
    } else if p.at(SyntaxKind::IDENT) || p.at(SyntaxKind::DEFAULT_KW) {
        p.advance();
        if p.eat(SyntaxKind::AS_KW) {
            p.expect(SyntaxKind::IDENT, "import alias");
        }
    } else {
        p.error("expected import name");
    }
    p.close(m, SyntaxKind::IMPORT_ENTRY);
}

// ── Exports ──────────────────────────────────────────────────────────────

/// `export default <decl-or-expr>`, `export { a, b as c }`,
/// `export <decl>`, or the forward forms
/// `export [default] from "mod" [: { ... }]`.
fn parse_export(p: &mut Parser) {
    let m = p.open();
    p.advance(); // export

    let forward = p.at(SyntaxKind::FROM_KW)
        || (p.at(SyntaxKind::DEFAULT_KW) && p.nth(1) == SyntaxKind::FROM_KW);
    if forward {
        p.eat(SyntaxKind::DEFAULT_KW);
        p.advance(); // from
        p.expect(SyntaxKind::STRING_LITERAL, "module name string");
        if p.eat(SyntaxKind::COLON) {
            parse_forward_list(p);
        }
        p.close(m, SyntaxKind::EXPORT_FORWARD_DECL);
        return;
    }

    if p.eat(SyntaxKind::DEFAULT_KW) {
        match p.current() {
            SyntaxKind::TYPE_KW => parse_type_decl(p),
            SyntaxKind::FUNC_KW => parse_func_decl(p),
            SyntaxKind::CONST_KW => parse_const_decl(p),
            _ => expressions::expr(p),
        }
    } else if p.at(SyntaxKind::L_BRACE) {
        parse_export_list(p);
    } else {
        match p.current() {
            SyntaxKind::TYPE_KW => parse_type_decl(p),
            SyntaxKind::FUNC_KW => parse_func_decl(p),
            SyntaxKind::CONST_KW => parse_const_decl(p),
            _ => p.error("expected export"),
        }
    }
    p.close(m, SyntaxKind::EXPORT_DECL);
}

/// `{ a, b as c }` -- names being exported from the local module.
fn parse_export_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // {
    p.eat_terminators();
    if p.at(SyntaxKind::R_BRACE) {
        p.error("expected export name");
    }
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        let e = p.open();
        if p.at(SyntaxKind::IDENT) || p.at(SyntaxKind::DEFAULT_KW) {
            p.advance();
            if p.eat(SyntaxKind::AS_KW) {
                if p.at(SyntaxKind::IDENT) || p.at(SyntaxKind::DEFAULT_KW) {
                    p.advance();
                } else {
                    p.error("expected export alias");
                }
            }
        } else {
            p.error("expected export name");
        }
        p.close(e, SyntaxKind::EXPORT_ENTRY);
        p.eat_terminators();
        if p.eat(SyntaxKind::COMMA) {
            p.eat_terminators();
            if p.at(SyntaxKind::R_BRACE) {
                p.error("expected export name");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_BRACE, "`}` closing export list");
    p.close(m, SyntaxKind::EXPORT_LIST);
}

/// `{ a, b as c, * }` after an export-forward colon.
fn parse_forward_list(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::L_BRACE, "`{` opening forward list");
    p.eat_terminators();
    if p.at(SyntaxKind::R_BRACE) {
        p.error("expected forwarded name");
    }
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        let e = p.open();
        if p.at_operator("*") {
            p.advance();
        } else if p.at(SyntaxKind::IDENT) || p.at(SyntaxKind::DEFAULT_KW) {
            p.advance();
            if p.eat(SyntaxKind::AS_KW) {
                if p.at(SyntaxKind::IDENT) || p.at(SyntaxKind::DEFAULT_KW) {
                    p.advance();
                } else {
                    p.error("expected export alias");
                }
            }
        } else {
            p.error("expected forwarded name");
        }
        p.close(e, SyntaxKind::FORWARD_ENTRY);
        p.eat_terminators();
        if p.eat(SyntaxKind::COMMA) {
            p.eat_terminators();
            if p.at(SyntaxKind::R_BRACE) {
                p.error("expected forwarded name");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_BRACE, "`}` closing forward list");
    p.close(m, SyntaxKind::FORWARD_LIST);
}

// ── Type declarations ────────────────────────────────────────────────────

/// `type Name<P>? = <type>`
fn parse_type_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // type
    p.expect(SyntaxKind::IDENT, "type name");
    if p.at_operator("<") {
        parse_type_param_list(p);
    }
    p.expect(SyntaxKind::ASSIGN, "`=` in type declaration");
    types::parse_type(p);
    if p.has_pending_gt() {
        p.error("unexpected `>`");
    }
    p.close(m, SyntaxKind::TYPE_DECL);
}

/// `<T, out U, in V : Bound>` -- `out` is contextual (covariant), `in` is
/// the keyword (contravariant).
pub(super) fn parse_type_param_list(p: &mut Parser) {
    let m = p.open();
    p.advance(); // <
    while !p.has_error() {
        parse_type_param(p);
        if p.eat(SyntaxKind::COMMA) {
            if p.at_gt_run() {
                p.error("expected type parameter");
            }
            continue;
        }
        break;
    }
    if !p.has_error() && !p.eat_gt() {
        p.error("expected `>` closing type parameters");
    }
    p.close(m, SyntaxKind::TYPE_PARAM_LIST);
}

fn parse_type_param(p: &mut Parser) {
    let m = p.open();
    if p.at(SyntaxKind::IN_KW) {
        p.advance();
    } else if p.at(SyntaxKind::IDENT)
        && p.current_text() == "out"
        && p.nth(1) == SyntaxKind::IDENT
    {
        p.advance();
    }
    p.expect(SyntaxKind::IDENT, "type parameter name");
    if p.eat(SyntaxKind::COLON) {
        types::parse_type(p);
    }
    p.close(m, SyntaxKind::TYPE_PARAM);
}

// ── Function declarations ────────────────────────────────────────────────

/// `func <ret-type> name<P>?(params) => body` -- the body is a block
/// statement when it opens with `{`, otherwise an expression.
fn parse_func_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // func
    types::parse_type(p);
    p.expect(SyntaxKind::IDENT, "function name");
    if p.at_operator("<") {
        parse_type_param_list(p);
    }
    let pl = p.open();
    p.expect(SyntaxKind::L_PAREN, "`(` opening parameters");
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        parse_param(p);
        if p.eat(SyntaxKind::COMMA) {
            if p.at(SyntaxKind::R_PAREN) {
                p.error("expected parameter");
            }
        } else {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN, "`)` closing parameters");
    p.close(pl, SyntaxKind::PARAM_LIST);
    p.expect(SyntaxKind::FAT_ARROW, "`=>` before function body");
    if p.at(SyntaxKind::L_BRACE) {
        statements::parse_block(p);
    } else {
        expressions::expr(p);
    }
    p.close(m, SyntaxKind::FUNC_DECL);
}

/// `type name` -- one parameter.
fn parse_param(p: &mut Parser) {
    let m = p.open();
    types::parse_type(p);
    p.expect(SyntaxKind::IDENT, "parameter name");
    p.close(m, SyntaxKind::PARAM);
}

// ── Constant declarations ────────────────────────────────────────────────

/// `const name = <expr>`
fn parse_const_decl(p: &mut Parser) {
    let m = p.open();
    p.advance(); // const
    p.expect(SyntaxKind::IDENT, "constant name");
    p.expect(SyntaxKind::ASSIGN, "`=` in constant declaration");
    expressions::expr(p);
    p.close(m, SyntaxKind::CONST_DECL);
}
