//! Operator typing rules.
//!
//! Each operator resolves its result type from its operand types by a
//! small rule set: numeric promotion for arithmetic, equal-sized unsigned
//! integers for bitwise operators, booleans for logic, numbers or
//! characters for comparison, a shared upper bound (other than `any`) for
//! equality, array concatenation for `+`, and partial application for the
//! apply operator `$`. Unary `+`/`-` upgrade unsigned integers to the next
//! larger signed size, with 64-bit unsigned staying 64-bit signed.

use sable_common::types::{IntSize, Type};

use crate::assign::{is_assignable, numeric_promote, upper_bound};

/// Why a binary operator failed to type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpError {
    /// No rule covers these operand types.
    Mismatch,
    /// `$` applied to a non-function left-hand side.
    NotFunction,
}

/// The result type of `lhs op rhs`.
///
/// `unknown` operands poison the result silently. Operators with no rule
/// here (user registrations) type as `any`.
pub fn binary_result(op: &str, lhs: &Type, rhs: &Type) -> Result<Type, BinaryOpError> {
    if lhs.is_unknown() || rhs.is_unknown() {
        return Ok(Type::Unknown);
    }
    match op {
        "=" => {
            if is_assignable(lhs, rhs) {
                Ok(lhs.clone())
            } else {
                Err(BinaryOpError::Mismatch)
            }
        }
        "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "&&=" | "||=" => {
            let base = &op[..op.len() - 1];
            let combined = binary_result(base, lhs, rhs)?;
            if is_assignable(lhs, &combined) {
                Ok(lhs.clone())
            } else {
                Err(BinaryOpError::Mismatch)
            }
        }
        "+" => {
            if let Some(promoted) = numeric_promote(lhs, rhs) {
                return Ok(promoted);
            }
            // `+` also concatenates arrays whose element types share an
            // upper bound.
            if let (Type::Array(a), Type::Array(b)) = (lhs, rhs) {
                if let Some(elem) = upper_bound(a, b) {
                    return Ok(Type::Array(Box::new(elem)));
                }
            }
            Err(BinaryOpError::Mismatch)
        }
        "-" | "*" | "/" | "%" => numeric_promote(lhs, rhs).ok_or(BinaryOpError::Mismatch),
        "&" | "|" | "^" => match (lhs, rhs) {
            (
                Type::Int {
                    size: a,
                    signed: false,
                },
                Type::Int {
                    size: b,
                    signed: false,
                },
            ) if a == b => Ok(lhs.clone()),
            _ => Err(BinaryOpError::Mismatch),
        },
        "&&" | "||" => match (lhs, rhs) {
            (Type::Bool, Type::Bool) => Ok(Type::Bool),
            _ => Err(BinaryOpError::Mismatch),
        },
        "==" | "!=" => match upper_bound(lhs, rhs) {
            Some(Type::Any) | None => Err(BinaryOpError::Mismatch),
            Some(_) => Ok(Type::Bool),
        },
        "<" | ">" | "<=" | ">=" => {
            let comparable = (lhs.is_numeric() && rhs.is_numeric())
                || (*lhs == Type::Char && *rhs == Type::Char);
            if comparable {
                Ok(Type::Bool)
            } else {
                Err(BinaryOpError::Mismatch)
            }
        }
        "$" => apply(lhs, rhs),
        // User-registered operators carry no typing rules.
        _ => Ok(Type::Any),
    }
}

/// `f $ x`: the left-hand side must be a function accepting `x` as its
/// first argument. One remaining parameter yields the return type; more
/// yield the residual function.
fn apply(lhs: &Type, rhs: &Type) -> Result<Type, BinaryOpError> {
    let Type::Function { params, ret } = lhs else {
        return Err(BinaryOpError::NotFunction);
    };
    let Some(first) = params.first() else {
        return Err(BinaryOpError::Mismatch);
    };
    if !is_assignable(first, rhs) {
        return Err(BinaryOpError::Mismatch);
    }
    if params.len() == 1 {
        Ok((**ret).clone())
    } else {
        Ok(Type::Function {
            params: params[1..].to_vec(),
            ret: ret.clone(),
        })
    }
}

/// The result type of a unary operator.
pub fn unary_result(op: &str, operand: &Type) -> Option<Type> {
    if operand.is_unknown() {
        return Some(Type::Unknown);
    }
    match op {
        "-" | "+" => match operand {
            Type::Int {
                size,
                signed: false,
            } => Some(Type::Int {
                size: if *size == IntSize::Size64 {
                    IntSize::Size64
                } else {
                    size.next_larger()
                },
                signed: true,
            }),
            Type::Int { .. } | Type::Float { .. } => Some(operand.clone()),
            _ => None,
        },
        "!" => match operand {
            Type::Bool => Some(Type::Bool),
            _ => None,
        },
        "~" => match operand {
            Type::Int { .. } => Some(operand.clone()),
            _ => None,
        },
        // User-registered prefix/postfix operators carry no typing rules.
        _ => Some(Type::Any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uint(size: IntSize) -> Type {
        Type::Int {
            size,
            signed: false,
        }
    }

    fn sint(size: IntSize) -> Type {
        Type::Int { size, signed: true }
    }

    #[test]
    fn arithmetic_promotes() {
        assert_eq!(
            binary_result("+", &sint(IntSize::Size16), &sint(IntSize::Size32)),
            Ok(sint(IntSize::Size32))
        );
        assert_eq!(
            binary_result("*", &uint(IntSize::Size32), &sint(IntSize::Size32)),
            Ok(sint(IntSize::Size64))
        );
        assert_eq!(
            binary_result("-", &Type::int(), &Type::f64()),
            Ok(Type::f64())
        );
        assert_eq!(
            binary_result("+", &Type::Bool, &Type::int()),
            Err(BinaryOpError::Mismatch)
        );
    }

    #[test]
    fn plus_concatenates_arrays() {
        assert_eq!(
            binary_result("+", &Type::string(), &Type::string()),
            Ok(Type::string())
        );
        let ints = Type::Array(Box::new(Type::int()));
        assert_eq!(binary_result("+", &ints, &ints), Ok(ints.clone()));
        assert_eq!(
            binary_result("+", &ints, &Type::Array(Box::new(Type::Bool))),
            Err(BinaryOpError::Mismatch)
        );
    }

    #[test]
    fn bitwise_requires_equal_sized_unsigned() {
        assert_eq!(
            binary_result("&", &uint(IntSize::Size8), &uint(IntSize::Size8)),
            Ok(uint(IntSize::Size8))
        );
        assert_eq!(
            binary_result("&", &uint(IntSize::Size8), &uint(IntSize::Size16)),
            Err(BinaryOpError::Mismatch)
        );
        assert_eq!(
            binary_result("^", &sint(IntSize::Size8), &sint(IntSize::Size8)),
            Err(BinaryOpError::Mismatch)
        );
    }

    #[test]
    fn logic_requires_booleans() {
        assert_eq!(binary_result("&&", &Type::Bool, &Type::Bool), Ok(Type::Bool));
        assert_eq!(
            binary_result("||", &Type::Bool, &Type::int()),
            Err(BinaryOpError::Mismatch)
        );
    }

    #[test]
    fn comparison_requires_numbers_or_chars() {
        assert_eq!(binary_result("<", &Type::int(), &Type::f64()), Ok(Type::Bool));
        assert_eq!(binary_result("<=", &Type::Char, &Type::Char), Ok(Type::Bool));
        assert_eq!(
            binary_result(">", &Type::Bool, &Type::Bool),
            Err(BinaryOpError::Mismatch)
        );
    }

    #[test]
    fn equality_needs_an_upper_bound_other_than_any() {
        assert_eq!(binary_result("==", &Type::int(), &Type::int()), Ok(Type::Bool));
        assert_eq!(
            binary_result("==", &sint(IntSize::Size8), &sint(IntSize::Size32)),
            Ok(Type::Bool)
        );
        assert_eq!(
            binary_result("!=", &Type::Bool, &Type::Char),
            Err(BinaryOpError::Mismatch)
        );
        assert_eq!(
            binary_result("==", &Type::Any, &Type::int()),
            Err(BinaryOpError::Mismatch)
        );
    }

    #[test]
    fn apply_consumes_one_parameter() {
        let f = Type::function(vec![Type::int(), Type::Bool], Type::Char);
        assert_eq!(
            binary_result("$", &f, &Type::int()),
            Ok(Type::function(vec![Type::Bool], Type::Char))
        );
        let g = Type::function(vec![Type::Bool], Type::Char);
        assert_eq!(binary_result("$", &g, &Type::Bool), Ok(Type::Char));
        assert_eq!(
            binary_result("$", &g, &Type::int()),
            Err(BinaryOpError::Mismatch)
        );
        assert_eq!(
            binary_result("$", &Type::int(), &Type::int()),
            Err(BinaryOpError::NotFunction)
        );
    }

    #[test]
    fn assignment_family() {
        assert_eq!(
            binary_result("=", &Type::int(), &sint(IntSize::Size8)),
            Ok(Type::int())
        );
        assert_eq!(
            binary_result("=", &sint(IntSize::Size8), &Type::int()),
            Err(BinaryOpError::Mismatch)
        );
        assert_eq!(
            binary_result("+=", &Type::int(), &Type::int()),
            Ok(Type::int())
        );
        assert_eq!(
            binary_result("&&=", &Type::Bool, &Type::Bool),
            Ok(Type::Bool)
        );
        // i8 += int overflows the target type.
        assert_eq!(
            binary_result("+=", &sint(IntSize::Size8), &Type::int()),
            Err(BinaryOpError::Mismatch)
        );
    }

    #[test]
    fn unary_sign_upgrades_unsigned() {
        assert_eq!(
            unary_result("-", &uint(IntSize::Size8)),
            Some(sint(IntSize::Size16))
        );
        assert_eq!(
            unary_result("-", &uint(IntSize::Size32)),
            Some(sint(IntSize::Size64))
        );
        // 64-bit unsigned stays at 64-bit signed.
        assert_eq!(
            unary_result("-", &uint(IntSize::Size64)),
            Some(sint(IntSize::Size64))
        );
        assert_eq!(unary_result("-", &sint(IntSize::Size32)), Some(sint(IntSize::Size32)));
        assert_eq!(unary_result("+", &Type::f64()), Some(Type::f64()));
        assert_eq!(unary_result("-", &Type::Bool), None);
    }

    #[test]
    fn unary_logic_and_bitwise() {
        assert_eq!(unary_result("!", &Type::Bool), Some(Type::Bool));
        assert_eq!(unary_result("!", &Type::int()), None);
        assert_eq!(unary_result("~", &Type::int()), Some(Type::int()));
        assert_eq!(unary_result("~", &Type::f64()), None);
    }

    #[test]
    fn unknown_poisons_silently() {
        assert_eq!(
            binary_result("+", &Type::Unknown, &Type::Bool),
            Ok(Type::Unknown)
        );
        assert_eq!(unary_result("-", &Type::Unknown), Some(Type::Unknown));
    }
}
