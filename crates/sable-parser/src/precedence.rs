//! Post-parse operator precedence resolution.
//!
//! The parser builds every binary chain left-associatively. This pass
//! flattens each chain's left spine into `operand op operand op ...` order
//! and rebuilds it with Dijkstra's shunting-yard algorithm, honouring the
//! precedence and associativity recorded in the operator table. Binary
//! sub-trees are rewritten exactly once; nothing else in the AST moves.

use std::fmt;

use sable_common::ops::{Assoc, OperatorTable};
use sable_common::span::Span;

use crate::ast::{
    Declaration, Expr, ExprKind, FunctionBody, Locations, Program, Stmt, StmtKind,
};

/// An error found while resolving precedence.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceError {
    pub kind: PrecedenceErrorKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrecedenceErrorKind {
    /// Two adjacent same-precedence operators declare `left` and `right`.
    AssociativityConflict { left: String, right: String },
    /// An operator token with no infix registration.
    UnknownOperator(String),
}

impl fmt::Display for PrecedenceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssociativityConflict { left, right } => write!(
                f,
                "operators `{left}` and `{right}` have the same precedence but conflicting associativity"
            ),
            Self::UnknownOperator(op) => write!(f, "unknown operator `{op}`"),
        }
    }
}

impl fmt::Display for PrecedenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.kind, self.span.start.line, self.span.start.col
        )
    }
}

/// Rewrite every binary chain in the program. Returns the errors found.
pub fn resolve_program(program: &mut Program, operators: &OperatorTable) -> Vec<PrecedenceError> {
    let mut errors = Vec::new();
    for decl in &mut program.decls {
        resolve_decl(decl, operators, &mut errors);
    }
    errors
}

/// Rewrite a single expression tree. Entry point for expression-level
/// callers (tests, tooling).
pub fn resolve_expr(expr: &mut Expr, operators: &OperatorTable) -> Vec<PrecedenceError> {
    let mut errors = Vec::new();
    walk_expr(expr, operators, &mut errors);
    errors
}

fn resolve_decl(decl: &mut Declaration, operators: &OperatorTable, errors: &mut Vec<PrecedenceError>) {
    match decl {
        Declaration::Function(func) => match &mut func.body {
            FunctionBody::Expr(expr) => walk_expr(expr, operators, errors),
            FunctionBody::Block(stmt) => walk_stmt(stmt, operators, errors),
        },
        Declaration::Constant(constant) => walk_expr(&mut constant.value, operators, errors),
        Declaration::Export(export) => {
            for entry in &mut export.entries {
                if let Some(value) = &mut entry.value {
                    resolve_decl(value, operators, errors);
                }
            }
        }
        _ => {}
    }
}

fn walk_stmt(stmt: &mut Stmt, operators: &OperatorTable, errors: &mut Vec<PrecedenceError>) {
    match &mut stmt.kind {
        StmtKind::Block(stmts) => {
            for s in stmts {
                walk_stmt(s, operators, errors);
            }
        }
        StmtKind::DoWhile { body, cond } => {
            walk_stmt(body, operators, errors);
            walk_expr(cond, operators, errors);
        }
        StmtKind::For { iterable, body, .. } => {
            walk_expr(iterable, operators, errors);
            walk_stmt(body, operators, errors);
        }
        StmtKind::Return(Some(expr)) | StmtKind::Throw(expr) | StmtKind::Expr(expr) => {
            walk_expr(expr, operators, errors);
        }
        StmtKind::TryCatch {
            body,
            catch_body,
            finally,
            ..
        } => {
            walk_stmt(body, operators, errors);
            walk_stmt(catch_body, operators, errors);
            if let Some(cleanup) = finally {
                walk_stmt(cleanup, operators, errors);
            }
        }
        StmtKind::While { cond, body } => {
            walk_expr(cond, operators, errors);
            walk_stmt(body, operators, errors);
        }
        _ => {}
    }
}

fn walk_expr(expr: &mut Expr, operators: &OperatorTable, errors: &mut Vec<PrecedenceError>) {
    if matches!(expr.kind, ExprKind::Binary { .. }) {
        rebuild_chain(expr, operators, errors);
        return;
    }
    match &mut expr.kind {
        ExprKind::ArrayAccess { target, index } => {
            walk_expr(target, operators, errors);
            walk_expr(index, operators, errors);
        }
        ExprKind::ArrayLiteral(items) | ExprKind::TupleLiteral(items) => {
            for item in items {
                walk_expr(item, operators, errors);
            }
        }
        ExprKind::FieldAccess { target, .. } => walk_expr(target, operators, errors),
        ExprKind::Call { callee, args } => {
            walk_expr(callee, operators, errors);
            for arg in args {
                walk_expr(arg, operators, errors);
            }
        }
        ExprKind::IfElse {
            cond,
            then_expr,
            else_expr,
        } => {
            walk_expr(cond, operators, errors);
            walk_expr(then_expr, operators, errors);
            walk_expr(else_expr, operators, errors);
        }
        ExprKind::Lambda { body, .. } => walk_expr(body, operators, errors),
        ExprKind::Paren(inner) => walk_expr(inner, operators, errors),
        ExprKind::StructLiteral(fields) => {
            for field in fields {
                walk_expr(&mut field.value, operators, errors);
            }
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, operators, errors),
        ExprKind::VarDecl { value, .. } => walk_expr(value, operators, errors),
        _ => {}
    }
}

/// One pending operator on the shunting-yard stack.
struct PendingOp {
    symbol: String,
    span: Span,
    precedence: u8,
    assoc: Assoc,
}

/// Flatten the left spine of a parser-built binary chain, resolve each
/// operand recursively, then rebuild by shunting-yard.
fn rebuild_chain(expr: &mut Expr, operators: &OperatorTable, errors: &mut Vec<PrecedenceError>) {
    let placeholder = Expr {
        kind: ExprKind::Error,
        locations: Locations::of(expr.locations.span()),
        ty: None,
    };
    let root = std::mem::replace(expr, placeholder);

    let mut operands: Vec<Expr> = Vec::new();
    let mut ops: Vec<(String, Span)> = Vec::new();
    flatten(root, &mut operands, &mut ops);
    for operand in &mut operands {
        walk_expr(operand, operators, errors);
    }

    *expr = shunt(operands, ops, operators, errors);
}

/// Left-to-right `operand, op, operand, op, ..., operand` order. The
/// parser folds left, so only left children continue the chain.
fn flatten(expr: Expr, operands: &mut Vec<Expr>, ops: &mut Vec<(String, Span)>) {
    match expr.kind {
        ExprKind::Binary { op, lhs, rhs } => {
            let op_span = expr
                .locations
                .get("op")
                .unwrap_or_else(|| expr.locations.span());
            flatten(*lhs, operands, ops);
            ops.push((op, op_span));
            operands.push(*rhs);
        }
        _ => operands.push(expr),
    }
}

fn shunt(
    operands: Vec<Expr>,
    ops: Vec<(String, Span)>,
    operators: &OperatorTable,
    errors: &mut Vec<PrecedenceError>,
) -> Expr {
    let mut operand_iter = operands.into_iter();
    let Some(first) = operand_iter.next() else {
        // Cannot happen for parser-built chains; keep a sane fallback.
        return Expr {
            kind: ExprKind::Error,
            locations: Locations::default(),
            ty: None,
        };
    };
    let mut operand_stack: Vec<Expr> = vec![first];
    let mut op_stack: Vec<PendingOp> = Vec::new();

    for (symbol, span) in ops {
        let (precedence, assoc) = match operators.infix(&symbol) {
            Some(def) => (def.precedence, def.assoc),
            None => {
                errors.push(PrecedenceError {
                    kind: PrecedenceErrorKind::UnknownOperator(symbol.clone()),
                    span,
                });
                (0, Assoc::Left)
            }
        };

        while let Some(top) = op_stack.last() {
            if top.precedence == precedence {
                let conflict = matches!(
                    (top.assoc, assoc),
                    (Assoc::Left, Assoc::Right) | (Assoc::Right, Assoc::Left)
                );
                if conflict {
                    errors.push(PrecedenceError {
                        kind: PrecedenceErrorKind::AssociativityConflict {
                            left: top.symbol.clone(),
                            right: symbol.clone(),
                        },
                        span,
                    });
                }
            }
            let pops = top.precedence > precedence
                || (top.precedence == precedence
                    && matches!(top.assoc, Assoc::Left | Assoc::None));
            if !pops {
                break;
            }
            fold(&mut operand_stack, op_stack.pop().map(|op| (op.symbol, op.span)));
        }

        op_stack.push(PendingOp {
            symbol,
            span,
            precedence,
            assoc,
        });
        match operand_iter.next() {
            Some(operand) => operand_stack.push(operand),
            None => break,
        }
    }

    while let Some(op) = op_stack.pop() {
        fold(&mut operand_stack, Some((op.symbol, op.span)));
    }

    operand_stack.pop().unwrap_or(Expr {
        kind: ExprKind::Error,
        locations: Locations::default(),
        ty: None,
    })
}

/// Pop two operands and fold them under the given operator.
fn fold(operand_stack: &mut Vec<Expr>, op: Option<(String, Span)>) {
    let Some((symbol, span)) = op else { return };
    let Some(rhs) = operand_stack.pop() else { return };
    let Some(lhs) = operand_stack.pop() else {
        operand_stack.push(rhs);
        return;
    };
    let mut locations = Locations::of(lhs.locations.span().merge(rhs.locations.span()));
    locations.insert("op", span);
    operand_stack.push(Expr {
        kind: ExprKind::Binary {
            op: symbol,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
        locations,
        ty: None,
    });
}
