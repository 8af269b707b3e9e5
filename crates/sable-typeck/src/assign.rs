//! Assignability and upper bounds over the semantic type algebra.
//!
//! Structural throughout: structs use width subtyping, tuples and arrays
//! are covariant, functions are contravariant in parameters and covariant
//! in the return type, unions accept their members. `any` accepts and is
//! accepted by everything; `unknown` is the poisoned sentinel that never
//! errors twice. Instantiations of the same generic compare argument-wise
//! using the declared variance.

use sable_common::types::{Type, Variance};

/// Whether `source` can be used where `target` is expected.
pub fn is_assignable(target: &Type, source: &Type) -> bool {
    match (target, source) {
        (Type::Unknown, _) | (_, Type::Unknown) => true,
        (Type::Any, _) | (_, Type::Any) => true,

        (
            Type::Int {
                size: ts,
                signed: t_signed,
            },
            Type::Int {
                size: ss,
                signed: s_signed,
            },
        ) => match (t_signed, s_signed) {
            (true, true) | (false, false) => ss <= ts,
            // An unsigned value fits a strictly larger signed type.
            (true, false) => ss < ts,
            (false, true) => false,
        },
        (Type::Float { size: ts }, Type::Float { size: ss }) => ss <= ts,
        // Integers convert to floats.
        (Type::Float { .. }, Type::Int { .. }) => true,

        (Type::Char, Type::Char) | (Type::Bool, Type::Bool) => true,

        (Type::Array(t), Type::Array(s)) => is_assignable(t, s),
        (Type::Tuple(ts), Type::Tuple(ss)) => {
            ts.len() == ss.len() && ts.iter().zip(ss).all(|(t, s)| is_assignable(t, s))
        }
        (Type::Struct(t_fields), Type::Struct(s_fields)) => {
            t_fields.iter().all(|(name, t)| {
                s_fields
                    .iter()
                    .find(|(s_name, _)| s_name == name)
                    .is_some_and(|(_, s)| is_assignable(t, s))
            })
        }
        (
            Type::Function {
                params: t_params,
                ret: t_ret,
            },
            Type::Function {
                params: s_params,
                ret: s_ret,
            },
        ) => {
            t_params.len() == s_params.len()
                && t_params
                    .iter()
                    .zip(s_params)
                    .all(|(t, s)| is_assignable(s, t))
                && is_assignable(t_ret, s_ret)
        }

        // A union source fits only if every member fits.
        (_, Type::Union(members)) => members.iter().all(|m| is_assignable(target, m)),
        // A union target accepts any of its members.
        (Type::Union(members), _) => members.iter().any(|m| is_assignable(m, source)),

        (
            Type::Instance {
                module: t_module,
                name: t_name,
                args: t_args,
                variances,
                ..
            },
            Type::Instance {
                module: s_module,
                name: s_name,
                args: s_args,
                ..
            },
        ) if t_module == s_module && t_name == s_name && t_args.len() == s_args.len() => {
            t_args
                .iter()
                .zip(s_args)
                .zip(variances)
                .all(|((t, s), variance)| match variance {
                    Variance::Covariant => is_assignable(t, s),
                    Variance::Contravariant => is_assignable(s, t),
                    Variance::Invariant => is_assignable(t, s) && is_assignable(s, t),
                })
        }
        // Mismatched instantiations fall back to their structural bodies.
        (Type::Instance { body, .. }, _) => is_assignable(body, source),
        (_, Type::Instance { body, .. }) => is_assignable(target, body),

        (
            Type::Recursive {
                module: t_module,
                name: t_name,
            },
            Type::Recursive {
                module: s_module,
                name: s_name,
            },
        ) => t_module == s_module && t_name == s_name,

        (Type::Param(t), Type::Param(s)) => t == s,
        (Type::Namespace(t), Type::Namespace(s)) => t == s,
        (Type::Generic { .. }, Type::Generic { .. }) => target == source,

        _ => false,
    }
}

/// The promoted type of two numeric operands.
///
/// The larger size wins; mixed signedness prefers signed and widens once
/// more when the sizes are tied. Floats absorb integers; two floats take
/// the larger width.
pub fn numeric_promote(a: &Type, b: &Type) -> Option<Type> {
    match (a, b) {
        (
            Type::Int {
                size: a_size,
                signed: a_signed,
            },
            Type::Int {
                size: b_size,
                signed: b_signed,
            },
        ) => {
            if a_signed == b_signed {
                Some(Type::Int {
                    size: (*a_size).max(*b_size),
                    signed: *a_signed,
                })
            } else {
                let size = if a_size == b_size {
                    a_size.next_larger()
                } else {
                    (*a_size).max(*b_size)
                };
                Some(Type::Int { size, signed: true })
            }
        }
        (Type::Float { size: a }, Type::Float { size: b }) => Some(Type::Float {
            size: (*a).max(*b),
        }),
        (Type::Float { size }, Type::Int { .. }) | (Type::Int { .. }, Type::Float { size }) => {
            Some(Type::Float { size: *size })
        }
        _ => None,
    }
}

/// The least type both operands are assignable to, if one exists.
///
/// Used by equality, array concatenation, array literals and if-else
/// branches. Falls back through numeric promotion, mutual assignability,
/// and element-wise bounds for arrays.
pub fn upper_bound(a: &Type, b: &Type) -> Option<Type> {
    if a == b {
        return Some(a.clone());
    }
    match (a, b) {
        (Type::Unknown, _) | (_, Type::Unknown) => Some(Type::Unknown),
        (Type::Any, _) | (_, Type::Any) => Some(Type::Any),
        (Type::Int { .. }, Type::Int { .. })
        | (Type::Float { .. }, Type::Float { .. })
        | (Type::Int { .. }, Type::Float { .. })
        | (Type::Float { .. }, Type::Int { .. }) => numeric_promote(a, b),
        (Type::Array(ae), Type::Array(be)) => {
            Some(Type::Array(Box::new(upper_bound(ae, be)?)))
        }
        _ => {
            if is_assignable(a, b) {
                Some(a.clone())
            } else if is_assignable(b, a) {
                Some(b.clone())
            } else {
                None
            }
        }
    }
}
