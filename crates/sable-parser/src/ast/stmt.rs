//! Statement nodes.

use super::{Expr, Locations, TypeExpr};

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub locations: Locations,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `{ stmt* }` -- nested Noops are discarded during reduction and an
    /// empty block collapses to Noop.
    Block(Vec<Stmt>),
    Break,
    Continue,
    /// `do <body> while (<cond>)`
    DoWhile { body: Box<Stmt>, cond: Expr },
    /// `for <binding> in <iterable> <body>`
    For {
        binding: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    /// `return [<expr>]`
    Return(Option<Expr>),
    /// `throw <expr>`
    Throw(Expr),
    /// `try <body> catch (<type> <name>) <handler> [finally <cleanup>]`
    TryCatch {
        body: Box<Stmt>,
        catch_type: TypeExpr,
        catch_name: String,
        catch_body: Box<Stmt>,
        finally: Option<Box<Stmt>>,
    },
    /// `while (<cond>) <body>`
    While { cond: Expr, body: Box<Stmt> },
    /// A bare expression in statement position.
    Expr(Expr),
    Noop,
}
