//! Expression nodes.
//!
//! After construction an expression is mutated exactly twice: the
//! precedence resolver rewrites binary sub-trees once, and the type
//! resolver fills the `ty` slot once.

use sable_common::types::Type;

use super::{Locations, TypeExpr};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub locations: Locations,
    /// Resolved type, attached by the type resolver.
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, locations: Locations) -> Self {
        Self {
            kind,
            locations,
            ty: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Bool(bool),
    Char(char),
    Int(i64),
    Float(f64),
    Str(String),
    /// An identifier reference.
    Name(String),
    /// `target[index]`
    ArrayAccess {
        target: Box<Expr>,
        index: Box<Expr>,
    },
    /// `[a, b, c]`
    ArrayLiteral(Vec<Expr>),
    /// `lhs op rhs`. Left-associative out of the parser; rebuilt once by
    /// the precedence resolver.
    Binary {
        op: String,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `target.field`
    FieldAccess { target: Box<Expr>, field: String },
    /// `callee(args)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `if (cond) then-expr else else-expr`
    IfElse {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// `(params) => body`
    Lambda {
        params: Vec<LambdaParam>,
        body: Box<Expr>,
    },
    /// `(expr)`
    Paren(Box<Expr>),
    /// `{ field: expr, ... }`
    StructLiteral(Vec<StructLiteralField>),
    /// `(a, b)` -- also `()`.
    TupleLiteral(Vec<Expr>),
    /// `op operand` or `operand op`.
    Unary {
        op: String,
        prefix: bool,
        operand: Box<Expr>,
    },
    /// `name = expr` introducing a binding.
    VarDecl { name: String, value: Box<Expr> },
    /// Placeholder for unparseable expressions.
    Error,
}

/// One lambda parameter; the type is optional.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaParam {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub locations: Locations,
}

/// One `field: expr` entry of a struct literal.
#[derive(Debug, Clone, PartialEq)]
pub struct StructLiteralField {
    pub name: String,
    pub value: Expr,
    pub locations: Locations,
}
