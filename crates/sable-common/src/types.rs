//! The semantic type algebra.
//!
//! Syntactic types (what the parser produces) and semantic types (what the
//! resolver computes) are separate worlds. This module is the semantic one:
//! a closed, structural algebra with no AST back-pointers. Cross-module
//! references are `ModuleId` plus name, so the module graph can be cyclic
//! while the types stay plain values.
//!
//! Two syntactic primitives have no variant of their own: `string` resolves
//! to `char[]` and `void` to the empty tuple.

use std::fmt;

/// A unique identifier for a module within a compilation unit.
///
/// Indexes into the type checker's module vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(pub u32);

/// Bit width of an integer type. `Unbounded` is the arbitrary-precision
/// `int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntSize {
    Size8,
    Size16,
    Size32,
    Size64,
    Unbounded,
}

impl IntSize {
    /// The next size up. `Size64` and `Unbounded` both widen to `Unbounded`.
    pub fn next_larger(self) -> IntSize {
        match self {
            IntSize::Size8 => IntSize::Size16,
            IntSize::Size16 => IntSize::Size32,
            IntSize::Size32 => IntSize::Size64,
            IntSize::Size64 | IntSize::Unbounded => IntSize::Unbounded,
        }
    }
}

/// Bit width of a floating-point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloatSize {
    Size32,
    Size64,
}

/// Direction in which subtyping of a generic argument propagates to
/// subtyping of instantiations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variance {
    Covariant,
    Contravariant,
    Invariant,
}

/// A declared type parameter of a generic type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: String,
    pub variance: Variance,
    /// Upper bound an argument must be assignable to, if declared.
    pub constraint: Option<Type>,
}

/// A Sable semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// A sized or unbounded integer.
    Int { size: IntSize, signed: bool },
    /// A 32- or 64-bit float.
    Float { size: FloatSize },
    Char,
    Bool,
    /// `T[]`. Covariant in the element.
    Array(Box<Type>),
    /// `(T, U, ...)`. The empty tuple is `void`.
    Tuple(Vec<Type>),
    /// `{ T name; ... }`, fields in declaration order.
    Struct(Vec<(String, Type)>),
    /// `(params) => ret`.
    Function { params: Vec<Type>, ret: Box<Type> },
    /// `T | U | ...`.
    Union(Vec<Type>),
    /// A parameterised type definition awaiting arguments.
    Generic {
        params: Vec<TypeParam>,
        body: Box<Type>,
    },
    /// An instantiation of a named generic. Keeps the declared variances so
    /// assignability between two instantiations of the same generic can
    /// compare arguments directionally instead of falling back to the
    /// substituted body.
    Instance {
        module: ModuleId,
        name: String,
        args: Vec<Type>,
        variances: Vec<Variance>,
        body: Box<Type>,
    },
    /// Back-edge to a type declaration currently being resolved.
    Recursive { module: ModuleId, name: String },
    /// The export table of another module, produced by a wildcard import.
    Namespace(ModuleId),
    /// A reference to an in-scope type parameter inside a generic body.
    Param(String),
    /// Error sentinel. Propagates without producing further diagnostics.
    Unknown,
    Any,
}

impl Type {
    pub fn int() -> Type {
        Type::Int {
            size: IntSize::Unbounded,
            signed: true,
        }
    }

    pub fn f64() -> Type {
        Type::Float {
            size: FloatSize::Size64,
        }
    }

    /// `string` is `char[]`.
    pub fn string() -> Type {
        Type::Array(Box::new(Type::Char))
    }

    /// `void` is the empty tuple.
    pub fn void() -> Type {
        Type::Tuple(Vec::new())
    }

    pub fn function(params: Vec<Type>, ret: Type) -> Type {
        Type::Function {
            params,
            ret: Box::new(ret),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float { .. })
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Replace every [`Type::Param`] reference with its binding, if any.
    ///
    /// Used by generic instantiation. Unbound parameter references are left
    /// alone so nested generics keep their own parameters.
    pub fn substitute(&self, bindings: &rustc_hash::FxHashMap<String, Type>) -> Type {
        match self {
            Type::Param(name) => bindings.get(name).cloned().unwrap_or_else(|| self.clone()),
            Type::Array(elem) => Type::Array(Box::new(elem.substitute(bindings))),
            Type::Tuple(elems) => {
                Type::Tuple(elems.iter().map(|t| t.substitute(bindings)).collect())
            }
            Type::Struct(fields) => Type::Struct(
                fields
                    .iter()
                    .map(|(name, t)| (name.clone(), t.substitute(bindings)))
                    .collect(),
            ),
            Type::Function { params, ret } => Type::Function {
                params: params.iter().map(|t| t.substitute(bindings)).collect(),
                ret: Box::new(ret.substitute(bindings)),
            },
            Type::Union(members) => {
                Type::Union(members.iter().map(|t| t.substitute(bindings)).collect())
            }
            Type::Generic { params, body } => {
                // Inner parameters shadow outer bindings of the same name.
                let mut inner = bindings.clone();
                for p in params {
                    inner.remove(&p.name);
                }
                Type::Generic {
                    params: params.clone(),
                    body: Box::new(body.substitute(&inner)),
                }
            }
            Type::Instance {
                module,
                name,
                args,
                variances,
                body,
            } => Type::Instance {
                module: *module,
                name: name.clone(),
                args: args.iter().map(|t| t.substitute(bindings)).collect(),
                variances: variances.clone(),
                body: Box::new(body.substitute(bindings)),
            },
            _ => self.clone(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int { size, signed } => match (size, signed) {
                (IntSize::Unbounded, true) => write!(f, "int"),
                (IntSize::Unbounded, false) => write!(f, "uint"),
                (IntSize::Size8, true) => write!(f, "i8"),
                (IntSize::Size8, false) => write!(f, "u8"),
                (IntSize::Size16, true) => write!(f, "i16"),
                (IntSize::Size16, false) => write!(f, "u16"),
                (IntSize::Size32, true) => write!(f, "i32"),
                (IntSize::Size32, false) => write!(f, "u32"),
                (IntSize::Size64, true) => write!(f, "i64"),
                (IntSize::Size64, false) => write!(f, "u64"),
            },
            Type::Float {
                size: FloatSize::Size32,
            } => write!(f, "f32"),
            Type::Float {
                size: FloatSize::Size64,
            } => write!(f, "f64"),
            Type::Char => write!(f, "char"),
            Type::Bool => write!(f, "bool"),
            Type::Array(elem) => {
                if **elem == Type::Char {
                    write!(f, "string")
                } else {
                    write!(f, "{elem}[]")
                }
            }
            Type::Tuple(elems) => {
                if elems.is_empty() {
                    return write!(f, "void");
                }
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Type::Struct(fields) => {
                write!(f, "{{ ")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{ty} {name};")?;
                }
                write!(f, " }}")
            }
            Type::Function { params, ret } => {
                write!(f, "(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") => {ret}")
            }
            Type::Union(members) => {
                for (i, m) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{m}")?;
                }
                Ok(())
            }
            Type::Generic { params, body } => {
                write!(f, "<")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match p.variance {
                        Variance::Covariant => write!(f, "+")?,
                        Variance::Contravariant => write!(f, "-")?,
                        Variance::Invariant => {}
                    }
                    write!(f, "{}", p.name)?;
                    if let Some(c) = &p.constraint {
                        write!(f, " : {c}")?;
                    }
                }
                write!(f, "> {body}")
            }
            Type::Instance { name, args, .. } => {
                write!(f, "{name}<")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{a}")?;
                }
                write!(f, ">")
            }
            Type::Recursive { name, .. } => write!(f, "{name}"),
            Type::Namespace(_) => write!(f, "namespace"),
            Type::Param(name) => write!(f, "{name}"),
            Type::Unknown => write!(f, "unknown"),
            Type::Any => write!(f, "any"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    #[test]
    fn int_size_next_larger() {
        assert_eq!(IntSize::Size8.next_larger(), IntSize::Size16);
        assert_eq!(IntSize::Size64.next_larger(), IntSize::Unbounded);
        assert_eq!(IntSize::Unbounded.next_larger(), IntSize::Unbounded);
    }

    #[test]
    fn display_primitives() {
        assert_eq!(Type::int().to_string(), "int");
        assert_eq!(Type::f64().to_string(), "f64");
        assert_eq!(Type::string().to_string(), "string");
        assert_eq!(Type::void().to_string(), "void");
        assert_eq!(
            Type::Int {
                size: IntSize::Size16,
                signed: false
            }
            .to_string(),
            "u16"
        );
    }

    #[test]
    fn display_compound() {
        let f = Type::function(vec![Type::int(), Type::Bool], Type::string());
        assert_eq!(f.to_string(), "(int, bool) => string");
        let u = Type::Union(vec![Type::int(), Type::Char]);
        assert_eq!(u.to_string(), "int | char");
        let a = Type::Array(Box::new(Type::int()));
        assert_eq!(a.to_string(), "int[]");
    }

    #[test]
    fn substitute_replaces_params() {
        let mut bindings = FxHashMap::default();
        bindings.insert("T".to_owned(), Type::int());
        let body = Type::Array(Box::new(Type::Param("T".into())));
        assert_eq!(
            body.substitute(&bindings),
            Type::Array(Box::new(Type::int()))
        );
    }

    #[test]
    fn substitute_respects_shadowing() {
        let mut bindings = FxHashMap::default();
        bindings.insert("T".to_owned(), Type::int());
        let inner = Type::Generic {
            params: vec![TypeParam {
                name: "T".into(),
                variance: Variance::Invariant,
                constraint: None,
            }],
            body: Box::new(Type::Param("T".into())),
        };
        // The inner generic re-binds T, so the outer binding must not leak in.
        assert_eq!(inner.substitute(&bindings), inner);
    }
}
