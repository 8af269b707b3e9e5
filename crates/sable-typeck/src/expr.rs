//! Expression and statement checking.
//!
//! The checker walks an expression tree mutably, computing each node's
//! type by the rules of the type algebra and the operator rule set, and
//! attaches the result to the node's `ty` slot -- the one post-resolution
//! mutation expression nodes receive. Local bindings (parameters, var
//! declarations, catch and loop bindings) live in a scope stack.

use rustc_hash::FxHashMap;
use sable_common::fs::FileSystem;
use sable_common::span::Span;
use sable_common::types::{ModuleId, Type};
use sable_parser::ast::{Expr, ExprKind, Stmt, StmtKind, TypeExpr};

use crate::assign::{is_assignable, upper_bound};
use crate::error::TypeckErrorKind;
use crate::module::SymbolKind;
use crate::ops::{binary_result, unary_result, BinaryOpError};
use crate::TypeChecker;

pub(crate) struct ExprChecker<'a, F: FileSystem> {
    ck: &'a mut TypeChecker<F>,
    module: ModuleId,
    scopes: Vec<FxHashMap<String, Type>>,
    /// In-scope generic type parameter names (inside generic functions).
    type_params: Vec<String>,
    /// Declared return type of the enclosing function, if any.
    return_type: Option<Type>,
}

impl<'a, F: FileSystem> ExprChecker<'a, F> {
    pub(crate) fn new(ck: &'a mut TypeChecker<F>, module: ModuleId) -> Self {
        Self::with_context(ck, module, Vec::new(), None)
    }

    pub(crate) fn with_context(
        ck: &'a mut TypeChecker<F>,
        module: ModuleId,
        type_params: Vec<String>,
        return_type: Option<Type>,
    ) -> Self {
        Self {
            ck,
            module,
            scopes: vec![FxHashMap::default()],
            type_params,
            return_type,
        }
    }

    /// Bind a local name in the innermost scope.
    pub(crate) fn bind(&mut self, name: String, ty: Type) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, ty);
        }
    }

    fn lookup(&self, name: &str) -> Option<Type> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).cloned())
    }

    pub(crate) fn resolve_type(&mut self, expr: &TypeExpr) -> Type {
        self.ck
            .resolve_type_expr(self.module, expr, &self.type_params)
    }

    fn error(&mut self, kind: TypeckErrorKind, span: Span) {
        self.ck.push_error(self.module, kind, span);
    }

    // ── Expressions ────────────────────────────────────────────────────

    /// Compute and attach the type of an expression.
    pub(crate) fn check_expr(&mut self, expr: &mut Expr) -> Type {
        let span = expr.locations.span();
        let op_span = expr.locations.get("op").unwrap_or(span);
        let ty = match &mut expr.kind {
            ExprKind::Bool(_) => Type::Bool,
            ExprKind::Char(_) => Type::Char,
            ExprKind::Int(_) => Type::int(),
            ExprKind::Float(_) => Type::f64(),
            ExprKind::Str(_) => Type::string(),
            ExprKind::Name(name) => {
                let name = name.clone();
                match self.lookup(&name) {
                    Some(ty) => ty,
                    None => match self.ck.value_type(self.module, &name, span) {
                        Some(ty) => ty,
                        None => {
                            self.error(TypeckErrorKind::ValueNotDefined { name }, span);
                            Type::Unknown
                        }
                    },
                }
            }
            ExprKind::ArrayAccess { target, index } => {
                let target_ty = self.check_expr(target);
                let index_ty = self.check_expr(index);
                let index_span = index.locations.span();
                if !index_ty.is_unknown() && !is_assignable(&Type::int(), &index_ty) {
                    self.error(
                        TypeckErrorKind::TypeMismatch {
                            expected: Type::int(),
                            found: index_ty,
                        },
                        index_span,
                    );
                }
                match element_type(&target_ty) {
                    Some(elem) => elem,
                    None if target_ty.is_unknown() => Type::Unknown,
                    None => {
                        self.error(TypeckErrorKind::NotArray { found: target_ty }, span);
                        Type::Unknown
                    }
                }
            }
            ExprKind::ArrayLiteral(items) => {
                let mut elem = Type::Any;
                let mut first = true;
                for item in items.iter_mut() {
                    let item_span = item.locations.span();
                    let ty = self.check_expr(item);
                    if first {
                        elem = ty;
                        first = false;
                        continue;
                    }
                    match upper_bound(&elem, &ty) {
                        Some(bound) => elem = bound,
                        None => {
                            self.error(
                                TypeckErrorKind::TypeMismatch {
                                    expected: elem.clone(),
                                    found: ty,
                                },
                                item_span,
                            );
                            elem = Type::Unknown;
                        }
                    }
                }
                Type::Array(Box::new(elem))
            }
            ExprKind::Binary { op, lhs, rhs } => {
                let op = op.clone();
                let lhs_ty = self.check_expr(lhs);
                let rhs_ty = self.check_expr(rhs);
                match binary_result(&op, &lhs_ty, &rhs_ty) {
                    Ok(ty) => ty,
                    Err(BinaryOpError::NotFunction) => {
                        self.error(TypeckErrorKind::NotFunction { found: lhs_ty }, op_span);
                        Type::Unknown
                    }
                    Err(BinaryOpError::Mismatch) if op == "=" => {
                        self.error(
                            TypeckErrorKind::TypeMismatch {
                                expected: lhs_ty,
                                found: rhs_ty,
                            },
                            op_span,
                        );
                        Type::Unknown
                    }
                    Err(BinaryOpError::Mismatch) => {
                        self.error(
                            TypeckErrorKind::OperatorMismatch {
                                op,
                                lhs: lhs_ty,
                                rhs: Some(rhs_ty),
                            },
                            op_span,
                        );
                        Type::Unknown
                    }
                }
            }
            ExprKind::FieldAccess { target, field } => {
                let field = field.clone();
                let field_span = expr.locations.get("field").unwrap_or(span);
                let target_ty = self.check_expr(target);
                self.field_type(target_ty, &field, field_span)
            }
            ExprKind::Call { callee, args } => {
                let callee_ty = self.check_expr(callee);
                let callee_span = callee.locations.span();
                let mut arg_tys = Vec::with_capacity(args.len());
                let mut arg_spans = Vec::with_capacity(args.len());
                for arg in args.iter_mut() {
                    arg_spans.push(arg.locations.span());
                    let ty = self.check_expr(arg);
                    arg_tys.push(ty);
                }
                self.call_type(callee_ty, &arg_tys, &arg_spans, callee_span, span)
            }
            ExprKind::IfElse {
                cond,
                then_expr,
                else_expr,
            } => {
                let cond_ty = self.check_expr(cond);
                let cond_span = cond.locations.span();
                self.expect_bool(cond_ty, cond_span);
                let then_ty = self.check_expr(then_expr);
                let else_ty = self.check_expr(else_expr);
                upper_bound(&then_ty, &else_ty)
                    .unwrap_or_else(|| Type::Union(vec![then_ty, else_ty]))
            }
            ExprKind::Lambda { params, body } => {
                self.scopes.push(FxHashMap::default());
                let mut param_tys = Vec::with_capacity(params.len());
                for param in params.iter() {
                    let ty = match &param.ty {
                        Some(annotation) => {
                            self.ck.resolve_type_expr(self.module, annotation, &self.type_params)
                        }
                        None => Type::Any,
                    };
                    param_tys.push(ty.clone());
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.insert(param.name.clone(), ty);
                    }
                }
                let ret = self.check_expr(body);
                self.scopes.pop();
                Type::function(param_tys, ret)
            }
            ExprKind::Paren(inner) => self.check_expr(inner),
            ExprKind::StructLiteral(fields) => {
                let mut field_tys = Vec::with_capacity(fields.len());
                for field in fields.iter_mut() {
                    let ty = self.check_expr(&mut field.value);
                    field_tys.push((field.name.clone(), ty));
                }
                Type::Struct(field_tys)
            }
            ExprKind::TupleLiteral(items) => Type::Tuple(
                items
                    .iter_mut()
                    .map(|item| self.check_expr(item))
                    .collect(),
            ),
            ExprKind::Unary {
                op,
                operand,
                ..
            } => {
                let op = op.clone();
                let operand_ty = self.check_expr(operand);
                match unary_result(&op, &operand_ty) {
                    Some(ty) => ty,
                    None => {
                        self.error(
                            TypeckErrorKind::OperatorMismatch {
                                op,
                                lhs: operand_ty,
                                rhs: None,
                            },
                            op_span,
                        );
                        Type::Unknown
                    }
                }
            }
            ExprKind::VarDecl { name, value } => {
                let name = name.clone();
                let ty = self.check_expr(value);
                self.bind(name, ty.clone());
                ty
            }
            ExprKind::Error => Type::Unknown,
        };
        expr.ty = Some(ty.clone());
        ty
    }

    fn call_type(
        &mut self,
        callee_ty: Type,
        arg_tys: &[Type],
        arg_spans: &[Span],
        callee_span: Span,
        call_span: Span,
    ) -> Type {
        let fty = match callee_ty {
            Type::Function { .. } => callee_ty,
            // Calling a generic function erases its parameters to `any`.
            Type::Generic { params, body } => {
                let bindings: FxHashMap<String, Type> = params
                    .into_iter()
                    .map(|p| (p.name, Type::Any))
                    .collect();
                body.substitute(&bindings)
            }
            Type::Unknown => return Type::Unknown,
            other => {
                self.error(TypeckErrorKind::NotFunction { found: other }, callee_span);
                return Type::Unknown;
            }
        };
        let Type::Function { params, ret } = fty else {
            self.error(TypeckErrorKind::NotFunction { found: fty }, callee_span);
            return Type::Unknown;
        };
        if params.len() != arg_tys.len() {
            self.error(
                TypeckErrorKind::ArgumentCountMismatch {
                    expected: params.len(),
                    found: arg_tys.len(),
                },
                call_span,
            );
            return Type::Unknown;
        }
        for ((param, arg), arg_span) in params.iter().zip(arg_tys).zip(arg_spans) {
            if !is_assignable(param, arg) {
                self.error(
                    TypeckErrorKind::TypeMismatch {
                        expected: param.clone(),
                        found: arg.clone(),
                    },
                    *arg_span,
                );
            }
        }
        (*ret).clone()
    }

    fn field_type(&mut self, target_ty: Type, field: &str, span: Span) -> Type {
        match target_ty {
            Type::Namespace(target) => match self.ck.export_kind(target, field) {
                Some(SymbolKind::Function) | Some(SymbolKind::Constant) => {
                    self.ck.export_type(target, field, span)
                }
                _ => {
                    self.error(
                        TypeckErrorKind::ValueNotDefined {
                            name: field.to_owned(),
                        },
                        span,
                    );
                    Type::Unknown
                }
            },
            Type::Unknown => Type::Unknown,
            other => match struct_field(&other, field) {
                Some(ty) => ty,
                None => {
                    self.error(
                        TypeckErrorKind::NoSuchField {
                            ty: other,
                            field: field.to_owned(),
                        },
                        span,
                    );
                    Type::Unknown
                }
            },
        }
    }

    fn expect_bool(&mut self, ty: Type, span: Span) {
        if !ty.is_unknown() && ty != Type::Bool {
            self.error(
                TypeckErrorKind::TypeMismatch {
                    expected: Type::Bool,
                    found: ty,
                },
                span,
            );
        }
    }

    // ── Statements ─────────────────────────────────────────────────────

    pub(crate) fn check_stmt(&mut self, stmt: &mut Stmt) {
        let span = stmt.locations.span();
        match &mut stmt.kind {
            StmtKind::Block(stmts) => {
                self.scopes.push(FxHashMap::default());
                for s in stmts {
                    self.check_stmt(s);
                }
                self.scopes.pop();
            }
            StmtKind::Break | StmtKind::Continue | StmtKind::Noop => {}
            StmtKind::DoWhile { body, cond } => {
                self.check_stmt(body);
                let cond_span = cond.locations.span();
                let cond_ty = self.check_expr(cond);
                self.expect_bool(cond_ty, cond_span);
            }
            StmtKind::While { cond, body } => {
                let cond_span = cond.locations.span();
                let cond_ty = self.check_expr(cond);
                self.expect_bool(cond_ty, cond_span);
                self.check_stmt(body);
            }
            StmtKind::For {
                binding,
                iterable,
                body,
            } => {
                let binding = binding.clone();
                let iter_span = iterable.locations.span();
                let iter_ty = self.check_expr(iterable);
                let elem = match element_type(&iter_ty) {
                    Some(elem) => elem,
                    None if iter_ty.is_unknown() => Type::Unknown,
                    None => {
                        self.error(TypeckErrorKind::NotArray { found: iter_ty }, iter_span);
                        Type::Unknown
                    }
                };
                self.scopes.push(FxHashMap::default());
                self.bind(binding, elem);
                self.check_stmt(body);
                self.scopes.pop();
            }
            StmtKind::Return(value) => {
                let found = match value {
                    Some(expr) => self.check_expr(expr),
                    None => Type::void(),
                };
                if let Some(expected) = self.return_type.clone() {
                    if !is_assignable(&expected, &found) {
                        self.error(TypeckErrorKind::TypeMismatch { expected, found }, span);
                    }
                }
            }
            StmtKind::Throw(expr) => {
                let _ = self.check_expr(expr);
            }
            StmtKind::TryCatch {
                body,
                catch_type,
                catch_name,
                catch_body,
                finally,
            } => {
                self.check_stmt(body);
                let catch_name = catch_name.clone();
                let catch_ty = self
                    .ck
                    .resolve_type_expr(self.module, catch_type, &self.type_params);
                self.scopes.push(FxHashMap::default());
                self.bind(catch_name, catch_ty);
                self.check_stmt(catch_body);
                self.scopes.pop();
                if let Some(cleanup) = finally {
                    self.check_stmt(cleanup);
                }
            }
            StmtKind::Expr(expr) => {
                let _ = self.check_expr(expr);
            }
        }
    }
}

/// The element type behind an array, unwrapping instantiations.
fn element_type(ty: &Type) -> Option<Type> {
    match ty {
        Type::Array(elem) => Some((**elem).clone()),
        Type::Instance { body, .. } => element_type(body),
        _ => None,
    }
}

/// The type of a struct field, unwrapping instantiations.
fn struct_field(ty: &Type, field: &str) -> Option<Type> {
    match ty {
        Type::Struct(fields) => fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, ty)| ty.clone()),
        Type::Instance { body, .. } => struct_field(body, field),
        _ => None,
    }
}
