//! Semantic error types.
//!
//! Every error carries the file path and a source range. Semantic errors
//! accumulate in the checker (with `unknown` substituted for the failed
//! type so one mistake cannot cascade); lexical and syntactic failures
//! abort the parse of that module and surface through the same type.

use std::fmt;
use std::path::PathBuf;

use sable_common::span::Span;
use sable_common::types::Type;

/// An error produced while loading or checking the module graph.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeckError {
    pub kind: TypeckErrorKind,
    pub path: PathBuf,
    pub span: Span,
}

impl TypeckError {
    pub fn new(kind: TypeckErrorKind, path: PathBuf, span: Span) -> Self {
        Self { kind, path, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeckErrorKind {
    /// A lexical or syntactic failure, forwarded from the parse pipeline.
    Syntax(String),
    /// An import specifier that resolves to no file.
    ModuleNotFound { specifier: String },
    /// The target module has no such export.
    ModuleDoesNotExport { module: String, name: String },
    /// Types, functions, constants and imports share one namespace.
    NameClash { name: String },
    /// Two exports with the same exported name.
    ExportClash { name: String },
    ValueNotDefined { name: String },
    TypeNotDefined { name: String },
    /// Type arguments applied to a non-generic type.
    NotGeneric { name: String },
    InvalidTypeArgumentCount {
        name: String,
        expected: usize,
        found: usize,
    },
    /// A type argument that is not assignable to its parameter's constraint.
    InvalidTypeArgument {
        param: String,
        argument: Type,
        constraint: Type,
    },
    /// A constant whose value depends on itself.
    CircularDependency { name: String },
    TypeMismatch { expected: Type, found: Type },
    /// An operator applied to operands it has no rule for.
    OperatorMismatch {
        op: String,
        lhs: Type,
        rhs: Option<Type>,
    },
    /// Two adjacent same-precedence operators with conflicting
    /// associativity, forwarded from the precedence resolver.
    AssociativityConflict { left: String, right: String },
    UnknownOperator { op: String },
    NotArray { found: Type },
    NotFunction { found: Type },
    NoSuchField { ty: Type, field: String },
    ArgumentCountMismatch { expected: usize, found: usize },
}

impl fmt::Display for TypeckErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(message) => write!(f, "{message}"),
            Self::ModuleNotFound { specifier } => {
                write!(f, "module not found: \"{specifier}\"")
            }
            Self::ModuleDoesNotExport { module, name } => {
                write!(f, "module \"{module}\" does not export `{name}`")
            }
            Self::NameClash { name } => write!(f, "the name `{name}` is already defined"),
            Self::ExportClash { name } => {
                write!(f, "the export `{name}` is already declared")
            }
            Self::ValueNotDefined { name } => write!(f, "value `{name}` is not defined"),
            Self::TypeNotDefined { name } => write!(f, "type `{name}` is not defined"),
            Self::NotGeneric { name } => write!(f, "type `{name}` is not generic"),
            Self::InvalidTypeArgumentCount {
                name,
                expected,
                found,
            } => write!(
                f,
                "`{name}` expects {expected} type argument(s), found {found}"
            ),
            Self::InvalidTypeArgument {
                param,
                argument,
                constraint,
            } => write!(
                f,
                "type argument `{argument}` does not satisfy the constraint `{constraint}` of parameter `{param}`"
            ),
            Self::CircularDependency { name } => {
                write!(f, "circular dependency while resolving `{name}`")
            }
            Self::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected `{expected}`, found `{found}`")
            }
            Self::OperatorMismatch { op, lhs, rhs } => match rhs {
                Some(rhs) => write!(
                    f,
                    "operator `{op}` cannot be applied to `{lhs}` and `{rhs}`"
                ),
                None => write!(f, "operator `{op}` cannot be applied to `{lhs}`"),
            },
            Self::AssociativityConflict { left, right } => write!(
                f,
                "operators `{left}` and `{right}` have the same precedence but conflicting associativity"
            ),
            Self::UnknownOperator { op } => write!(f, "unknown operator `{op}`"),
            Self::NotArray { found } => write!(f, "`{found}` is not an array"),
            Self::NotFunction { found } => write!(f, "`{found}` is not a function"),
            Self::NoSuchField { ty, field } => {
                write!(f, "type `{ty}` has no field `{field}`")
            }
            Self::ArgumentCountMismatch { expected, found } => {
                write!(f, "expected {expected} argument(s), found {found}")
            }
        }
    }
}

impl fmt::Display for TypeckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.path.display(),
            self.span.start.line,
            self.span.start.col,
            self.kind
        )
    }
}

impl std::error::Error for TypeckError {}

/// The combined failure surfaced at the end of `check()`: one line per
/// accumulated error.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckFailure {
    pub errors: Vec<TypeckError>,
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CheckFailure {}
