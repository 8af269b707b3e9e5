//! The abstract syntax tree.
//!
//! The AST is the reduced, owned tree the reducer produces from the CST.
//! Only semantically significant children survive; surface detail lives in
//! the CST. Every node carries a [`Locations`] map for diagnostics (always
//! at least the `"self"` span) and expression nodes carry an `Option<Type>`
//! slot the resolver fills in exactly once.

pub mod decl;
pub mod expr;
pub mod stmt;
pub mod ty;

pub use decl::{
    ConstantDeclaration, Declaration, ExportDeclaration, ExportEntry, ExportForwardDeclaration,
    ForwardEntry, FunctionBody, FunctionDeclaration, ImportDeclaration, ImportEntry, ParamDecl,
    Program, TypeDeclaration, TypeParamDecl,
};
pub use expr::{Expr, ExprKind, LambdaParam, StructLiteralField};
pub use stmt::{Stmt, StmtKind};
pub use ty::{PrimitiveType, StructTypeField, TypeExpr, TypeExprKind};

use rustc_hash::FxHashMap;
use sable_common::span::Span;

/// Location key of a node's full span.
pub const SELF: &str = "self";

/// Per-node map of named source ranges.
///
/// Every AST node has at least the `"self"` entry; nodes with interesting
/// sub-structure add more (`"name"`, `"module"`, ...), so diagnostics can
/// point at the precise token that caused trouble.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Locations {
    map: FxHashMap<&'static str, Span>,
}

impl Locations {
    /// Create a map holding only the `self` span.
    pub fn of(span: Span) -> Self {
        let mut map = FxHashMap::default();
        map.insert(SELF, span);
        Self { map }
    }

    pub fn insert(&mut self, key: &'static str, span: Span) {
        self.map.insert(key, span);
    }

    pub fn get(&self, key: &str) -> Option<Span> {
        self.map.get(key).copied()
    }

    /// The node's full span. Every node records one at construction.
    pub fn span(&self) -> Span {
        self.map
            .get(SELF)
            .copied()
            .unwrap_or_else(|| Span::point(sable_common::span::Pos::start()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_common::span::Pos;

    #[test]
    fn locations_always_answer_self() {
        let span = Span::new(Pos::new(0, 1, 1), Pos::new(5, 1, 6));
        let mut locations = Locations::of(span);
        assert_eq!(locations.span(), span);

        let name = Span::new(Pos::new(2, 1, 3), Pos::new(4, 1, 5));
        locations.insert("name", name);
        assert_eq!(locations.get("name"), Some(name));
        assert_eq!(locations.get("missing"), None);
        assert_eq!(locations.span(), span);
    }
}
