//! Declaration nodes: the program root, imports, exports, export-forwards,
//! type, function and constant declarations.

use sable_common::types::Variance;

use super::{Expr, Locations, Stmt, TypeExpr};

/// Root of a module's AST.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub decls: Vec<Declaration>,
    pub locations: Locations,
}

/// Any top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Declaration {
    Import(ImportDeclaration),
    Type(TypeDeclaration),
    Function(FunctionDeclaration),
    Constant(ConstantDeclaration),
    Export(ExportDeclaration),
    ExportForward(ExportForwardDeclaration),
    /// Placeholder produced for unparseable declarations, and used as the
    /// swap-out value while a declaration is checked in place.
    Error,
}

/// `import from "mod": ...`
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDeclaration {
    pub module_name: String,
    pub entries: Vec<ImportEntry>,
    pub locations: Locations,
}

/// One imported binding. A wildcard import has `import_name == "*"`; a
/// default import has `import_name == "default"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportEntry {
    pub import_name: String,
    pub alias_name: String,
    pub locations: Locations,
}

/// `type Name<P>? = <type>`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDeclaration {
    pub name: String,
    pub type_params: Vec<TypeParamDecl>,
    pub body: TypeExpr,
    pub locations: Locations,
}

/// One declared type parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamDecl {
    pub name: String,
    pub variance: Variance,
    pub constraint: Option<TypeExpr>,
    pub locations: Locations,
}

/// `func <ret> name<P>?(params) => body`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub return_type: TypeExpr,
    pub type_params: Vec<TypeParamDecl>,
    pub params: Vec<ParamDecl>,
    pub body: FunctionBody,
    pub locations: Locations,
}

/// One `type name` function parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub locations: Locations,
}

/// A function body is either a bare expression or a block statement.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionBody {
    Expr(Expr),
    Block(Stmt),
}

/// `const name = <expr>`
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDeclaration {
    pub name: String,
    pub value: Expr,
    pub locations: Locations,
}

/// `export ...` in any of its non-forward forms.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDeclaration {
    pub entries: Vec<ExportEntry>,
    pub locations: Locations,
}

/// One exported name. `value` is the inline declaration for
/// `export <decl>` / `export default <decl>` forms; otherwise
/// `value_name` must resolve against the module's tables.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportEntry {
    pub export_name: String,
    pub value_name: String,
    pub value: Option<Box<Declaration>>,
    pub locations: Locations,
}

/// `export [default] from "mod" [: { ... }]`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportForwardDeclaration {
    pub module_name: String,
    pub entries: Vec<ForwardEntry>,
    pub locations: Locations,
}

/// One forwarded name. A wildcard forward has `import_name == "*"`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardEntry {
    pub import_name: String,
    pub export_name: String,
    pub locations: Locations,
}

impl Declaration {
    /// The declared name, for the declarations that have one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Declaration::Type(d) => Some(&d.name),
            Declaration::Function(d) => Some(&d.name),
            Declaration::Constant(d) => Some(&d.name),
            _ => None,
        }
    }

    pub fn locations(&self) -> Option<&Locations> {
        match self {
            Declaration::Import(d) => Some(&d.locations),
            Declaration::Type(d) => Some(&d.locations),
            Declaration::Function(d) => Some(&d.locations),
            Declaration::Constant(d) => Some(&d.locations),
            Declaration::Export(d) => Some(&d.locations),
            Declaration::ExportForward(d) => Some(&d.locations),
            Declaration::Error => None,
        }
    }
}
