//! Type resolution: name lookup, syntactic-to-semantic type conversion,
//! generic instantiation, and the resolve-everything driver.
//!
//! Every declaration entry carries a `resolving` flag. Hitting a set flag
//! while resolving a *type* declaration produces a `Recursive` back-edge
//! (types may refer to themselves); hitting it for a *constant* is a
//! circular-dependency error. Function signatures come from their headers
//! alone, so functions recurse freely.
//!
//! Resolution works on the declaration taken out of the module's AST by
//! value and put back afterwards, so the checker can keep borrowing its
//! module arena while it fills the expression `ty` slots in place.

use sable_common::fs::FileSystem;
use sable_common::span::Span;
use sable_common::types::{FloatSize, IntSize, ModuleId, Type, TypeParam};
use sable_parser::ast::{
    Declaration, FunctionBody, PrimitiveType, TypeDeclaration, TypeExpr, TypeExprKind,
    TypeParamDecl,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::assign::is_assignable;
use crate::error::TypeckErrorKind;
use crate::expr::ExprChecker;
use crate::module::{ExportBinding, SymbolKind};
use crate::TypeChecker;

impl<F: FileSystem> TypeChecker<F> {
    /// Resolve every non-imported type, function and constant in every
    /// loaded module, then check function bodies. Idempotent: resolved
    /// entries are cached and never recomputed.
    pub(crate) fn resolve_all(&mut self) {
        for idx in 0..self.modules.len() {
            let module = ModuleId(idx as u32);
            for name in self.local_symbols(idx, SymbolKind::Type) {
                let span = self.entry_span(idx, SymbolKind::Type, &name);
                let _ = self.type_of(module, &name, span);
            }
            for name in self.local_symbols(idx, SymbolKind::Function) {
                let span = self.entry_span(idx, SymbolKind::Function, &name);
                let _ = self.function_type(module, &name, span);
            }
            for name in self.local_symbols(idx, SymbolKind::Constant) {
                let span = self.entry_span(idx, SymbolKind::Constant, &name);
                let _ = self.constant_type(module, &name, span);
            }
        }
        for idx in 0..self.modules.len() {
            let module = ModuleId(idx as u32);
            for name in self.local_symbols(idx, SymbolKind::Function) {
                self.check_function_body(module, &name);
            }
        }
    }

    fn local_symbols(&self, idx: usize, kind: SymbolKind) -> Vec<String> {
        let table = match kind {
            SymbolKind::Type => &self.modules[idx].types,
            SymbolKind::Function => &self.modules[idx].functions,
            SymbolKind::Constant => &self.modules[idx].constants,
            SymbolKind::Namespace => return Vec::new(),
        };
        let mut names: Vec<String> = table
            .iter()
            .filter(|(_, entry)| entry.imported.is_none())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    fn entry_span(&self, idx: usize, kind: SymbolKind, name: &str) -> Span {
        let table = match kind {
            SymbolKind::Type => &self.modules[idx].types,
            SymbolKind::Function => &self.modules[idx].functions,
            SymbolKind::Constant => &self.modules[idx].constants,
            SymbolKind::Namespace => return Span::point(sable_common::span::Pos::start()),
        };
        table
            .get(name)
            .map(|entry| entry.span)
            .unwrap_or_else(|| Span::point(sable_common::span::Pos::start()))
    }

    // ── Name lookup ────────────────────────────────────────────────────

    /// The type bound to `name` in the type namespace of `module`.
    ///
    /// Caches on the entry; a second call returns the same type without
    /// mutating state. While the entry is being resolved, returns a
    /// `Recursive` back-edge instead of recursing.
    pub(crate) fn type_of(&mut self, module: ModuleId, name: &str, use_span: Span) -> Type {
        let idx = module.0 as usize;
        let (cached, imported, resolving, decl) = {
            let Some(entry) = self.modules[idx].types.get(name) else {
                self.push_error(
                    module,
                    TypeckErrorKind::TypeNotDefined {
                        name: name.to_owned(),
                    },
                    use_span,
                );
                return Type::Unknown;
            };
            (
                entry.ty.clone(),
                entry.imported.clone(),
                entry.resolving,
                entry.decl,
            )
        };
        if let Some(ty) = cached {
            return ty;
        }
        if let Some((source, export)) = imported {
            let ty = self.export_type(source, &export, use_span);
            if let Some(entry) = self.modules[idx].types.get_mut(name) {
                entry.ty = Some(ty.clone());
            }
            return ty;
        }
        if resolving {
            return Type::Recursive {
                module,
                name: name.to_owned(),
            };
        }
        let Some(decl_idx) = decl else {
            return Type::Unknown;
        };

        if let Some(entry) = self.modules[idx].types.get_mut(name) {
            entry.resolving = true;
        }
        let taken = std::mem::replace(
            &mut self.modules[idx].ast.decls[decl_idx],
            Declaration::Error,
        );
        let ty = match &taken {
            Declaration::Type(decl) => self.resolve_type_declaration(module, decl),
            _ => Type::Unknown,
        };
        self.modules[idx].ast.decls[decl_idx] = taken;
        if let Some(entry) = self.modules[idx].types.get_mut(name) {
            entry.resolving = false;
            entry.ty = Some(ty.clone());
        }
        ty
    }

    /// The type of a value binding (function or constant), or a namespace
    /// handle. `None` when the name is not defined in the module.
    pub(crate) fn value_type(
        &mut self,
        module: ModuleId,
        name: &str,
        use_span: Span,
    ) -> Option<Type> {
        let idx = module.0 as usize;
        if let Some(&target) = self.modules[idx].namespaces.get(name) {
            return Some(Type::Namespace(target));
        }
        if self.modules[idx].functions.contains_key(name) {
            return Some(self.function_type(module, name, use_span));
        }
        if self.modules[idx].constants.contains_key(name) {
            return Some(self.constant_type(module, name, use_span));
        }
        None
    }

    /// A function's type, computed from its header alone.
    pub(crate) fn function_type(&mut self, module: ModuleId, name: &str, use_span: Span) -> Type {
        let idx = module.0 as usize;
        let (cached, imported, decl) = {
            let Some(entry) = self.modules[idx].functions.get(name) else {
                return Type::Unknown;
            };
            (entry.ty.clone(), entry.imported.clone(), entry.decl)
        };
        if let Some(ty) = cached {
            return ty;
        }
        if let Some((source, export)) = imported {
            let ty = self.export_type(source, &export, use_span);
            if let Some(entry) = self.modules[idx].functions.get_mut(name) {
                entry.ty = Some(ty.clone());
            }
            return ty;
        }
        let Some(decl_idx) = decl else {
            return Type::Unknown;
        };

        let taken = std::mem::replace(
            &mut self.modules[idx].ast.decls[decl_idx],
            Declaration::Error,
        );
        let ty = match &taken {
            Declaration::Function(decl) => {
                let scope: Vec<String> =
                    decl.type_params.iter().map(|p| p.name.clone()).collect();
                let params: Vec<Type> = decl
                    .params
                    .iter()
                    .map(|p| self.resolve_type_expr(module, &p.ty, &scope))
                    .collect();
                let ret = self.resolve_type_expr(module, &decl.return_type, &scope);
                let fty = Type::function(params, ret);
                if decl.type_params.is_empty() {
                    fty
                } else {
                    Type::Generic {
                        params: self.resolve_type_params(module, &decl.type_params, &scope),
                        body: Box::new(fty),
                    }
                }
            }
            _ => Type::Unknown,
        };
        self.modules[idx].ast.decls[decl_idx] = taken;
        if let Some(entry) = self.modules[idx].functions.get_mut(name) {
            entry.ty = Some(ty.clone());
        }
        ty
    }

    /// A constant's type: the type of its initial expression. Constants
    /// cannot be recursively defined.
    pub(crate) fn constant_type(&mut self, module: ModuleId, name: &str, use_span: Span) -> Type {
        let idx = module.0 as usize;
        let (cached, imported, resolving, decl) = {
            let Some(entry) = self.modules[idx].constants.get(name) else {
                return Type::Unknown;
            };
            (
                entry.ty.clone(),
                entry.imported.clone(),
                entry.resolving,
                entry.decl,
            )
        };
        if let Some(ty) = cached {
            return ty;
        }
        if let Some((source, export)) = imported {
            let ty = self.export_type(source, &export, use_span);
            if let Some(entry) = self.modules[idx].constants.get_mut(name) {
                entry.ty = Some(ty.clone());
            }
            return ty;
        }
        if resolving {
            self.push_error(
                module,
                TypeckErrorKind::CircularDependency {
                    name: name.to_owned(),
                },
                use_span,
            );
            return Type::Unknown;
        }
        let Some(decl_idx) = decl else {
            return Type::Unknown;
        };

        if let Some(entry) = self.modules[idx].constants.get_mut(name) {
            entry.resolving = true;
        }
        let mut taken = std::mem::replace(
            &mut self.modules[idx].ast.decls[decl_idx],
            Declaration::Error,
        );
        let ty = match &mut taken {
            Declaration::Constant(decl) => {
                let mut checker = ExprChecker::new(self, module);
                checker.check_expr(&mut decl.value)
            }
            _ => Type::Unknown,
        };
        self.modules[idx].ast.decls[decl_idx] = taken;
        if let Some(entry) = self.modules[idx].constants.get_mut(name) {
            entry.resolving = false;
            entry.ty = Some(ty.clone());
        }
        ty
    }

    /// Check a function body against its declared return type, filling
    /// the expression `ty` slots in place.
    fn check_function_body(&mut self, module: ModuleId, name: &str) {
        let idx = module.0 as usize;
        let Some(decl_idx) = self.modules[idx]
            .functions
            .get(name)
            .and_then(|entry| entry.decl)
        else {
            return;
        };

        let mut taken = std::mem::replace(
            &mut self.modules[idx].ast.decls[decl_idx],
            Declaration::Error,
        );
        if let Declaration::Function(decl) = &mut taken {
            let scope: Vec<String> = decl.type_params.iter().map(|p| p.name.clone()).collect();
            let ret = self.resolve_type_expr(module, &decl.return_type, &scope);
            let mut checker = ExprChecker::with_context(self, module, scope, Some(ret.clone()));
            for param in &decl.params {
                let ty = checker.resolve_type(&param.ty);
                checker.bind(param.name.clone(), ty);
            }
            match &mut decl.body {
                FunctionBody::Expr(expr) => {
                    let found = checker.check_expr(expr);
                    if !is_assignable(&ret, &found) {
                        let span = expr.locations.span();
                        self.push_error(
                            module,
                            TypeckErrorKind::TypeMismatch {
                                expected: ret,
                                found,
                            },
                            span,
                        );
                    }
                }
                FunctionBody::Block(stmt) => {
                    checker.check_stmt(stmt);
                }
            }
        }
        self.modules[idx].ast.decls[decl_idx] = taken;
    }

    // ── Exports ────────────────────────────────────────────────────────

    /// The type behind a module's export, chasing forward links.
    pub(crate) fn export_type(&mut self, module: ModuleId, name: &str, use_span: Span) -> Type {
        let mut visited: FxHashSet<(ModuleId, String)> = FxHashSet::default();
        let mut current = (module, name.to_owned());
        loop {
            if !visited.insert(current.clone()) {
                self.push_error(
                    module,
                    TypeckErrorKind::CircularDependency {
                        name: name.to_owned(),
                    },
                    use_span,
                );
                return Type::Unknown;
            }
            let binding = self.modules[current.0 .0 as usize]
                .exports
                .get(&current.1)
                .cloned();
            match binding {
                None => {
                    let path = self.modules[current.0 .0 as usize]
                        .path
                        .display()
                        .to_string();
                    self.push_error(
                        module,
                        TypeckErrorKind::ModuleDoesNotExport {
                            module: path,
                            name: current.1,
                        },
                        use_span,
                    );
                    return Type::Unknown;
                }
                Some(ExportBinding::Local {
                    kind, value_name, ..
                }) => {
                    return match kind {
                        SymbolKind::Type => self.type_of(current.0, &value_name, use_span),
                        SymbolKind::Function => {
                            self.function_type(current.0, &value_name, use_span)
                        }
                        SymbolKind::Constant => {
                            self.constant_type(current.0, &value_name, use_span)
                        }
                        SymbolKind::Namespace => Type::Unknown,
                    };
                }
                Some(ExportBinding::Forward {
                    module: target,
                    source_name,
                    ..
                }) => current = (target, source_name),
            }
        }
    }

    /// Follow import and forward links to the module and name where a
    /// type symbol is actually declared. Gives generic instantiations a
    /// stable identity across re-exports.
    fn canonical_type_symbol(&self, module: ModuleId, name: &str) -> (ModuleId, String) {
        let mut visited: FxHashSet<(ModuleId, String)> = FxHashSet::default();
        let mut current = (module, name.to_owned());
        loop {
            if !visited.insert(current.clone()) {
                return current;
            }
            let imported = self.modules[current.0 .0 as usize]
                .types
                .get(&current.1)
                .and_then(|entry| entry.imported.clone());
            let Some((source, export)) = imported else {
                return current;
            };
            // Resolve the export down to a local binding of some module.
            let mut export_pos = (source, export);
            loop {
                match self.modules[export_pos.0 .0 as usize]
                    .exports
                    .get(&export_pos.1)
                {
                    Some(ExportBinding::Local { value_name, .. }) => {
                        current = (export_pos.0, value_name.clone());
                        break;
                    }
                    Some(ExportBinding::Forward {
                        module: target,
                        source_name,
                        ..
                    }) => {
                        if !visited.insert((export_pos.0, export_pos.1.clone())) {
                            return current;
                        }
                        export_pos = (*target, source_name.clone());
                    }
                    None => return current,
                }
            }
        }
    }

    // ── Syntactic types to semantic types ──────────────────────────────

    /// Resolve a syntactic type in the given type-parameter scope.
    pub(crate) fn resolve_type_expr(
        &mut self,
        module: ModuleId,
        expr: &TypeExpr,
        scope: &[String],
    ) -> Type {
        let span = expr.locations.span();
        match &expr.kind {
            TypeExprKind::Primitive(p) => primitive_type(*p),
            TypeExprKind::Named(name) => {
                if scope.iter().any(|p| p == name) {
                    Type::Param(name.clone())
                } else {
                    self.type_of(module, name, span)
                }
            }
            TypeExprKind::Array(elem) => {
                Type::Array(Box::new(self.resolve_type_expr(module, elem, scope)))
            }
            TypeExprKind::Tuple(elems) => Type::Tuple(
                elems
                    .iter()
                    .map(|e| self.resolve_type_expr(module, e, scope))
                    .collect(),
            ),
            TypeExprKind::Struct(fields) => Type::Struct(
                fields
                    .iter()
                    .map(|f| (f.name.clone(), self.resolve_type_expr(module, &f.ty, scope)))
                    .collect(),
            ),
            TypeExprKind::Function { params, ret } => Type::Function {
                params: params
                    .iter()
                    .map(|p| self.resolve_type_expr(module, p, scope))
                    .collect(),
                ret: Box::new(self.resolve_type_expr(module, ret, scope)),
            },
            TypeExprKind::Paren(inner) => self.resolve_type_expr(module, inner, scope),
            TypeExprKind::Union(members) => Type::Union(
                members
                    .iter()
                    .map(|m| self.resolve_type_expr(module, m, scope))
                    .collect(),
            ),
            TypeExprKind::NamespaceAccess { namespace, name } => {
                self.namespace_type(module, namespace, name, span)
            }
            TypeExprKind::Specific { base, args } => {
                self.resolve_specific(module, base, args, scope, span)
            }
            TypeExprKind::Error => Type::Unknown,
        }
    }

    /// `ns.Name` in type position: the namespace's target module must
    /// export `Name` as a type.
    fn namespace_type(
        &mut self,
        module: ModuleId,
        namespace: &str,
        name: &str,
        span: Span,
    ) -> Type {
        let target = self.modules[module.0 as usize]
            .namespaces
            .get(namespace)
            .copied();
        let Some(target) = target else {
            self.push_error(
                module,
                TypeckErrorKind::TypeNotDefined {
                    name: format!("{namespace}.{name}"),
                },
                span,
            );
            return Type::Unknown;
        };
        match self.export_kind(target, name) {
            Some(SymbolKind::Type) => self.export_type(target, name, span),
            _ => {
                self.push_error(
                    module,
                    TypeckErrorKind::TypeNotDefined {
                        name: format!("{namespace}.{name}"),
                    },
                    span,
                );
                Type::Unknown
            }
        }
    }

    /// `Name<args>`: look up the generic, check arity and constraints,
    /// substitute, and keep the declared variances on the instantiation.
    fn resolve_specific(
        &mut self,
        module: ModuleId,
        base: &TypeExpr,
        args: &[TypeExpr],
        scope: &[String],
        span: Span,
    ) -> Type {
        let (generic, origin, display_name) = match &base.kind {
            TypeExprKind::Named(name) if !scope.iter().any(|p| p == name) => {
                let generic = self.type_of(module, name, base.locations.span());
                let origin = self.canonical_type_symbol(module, name);
                (generic, origin, name.clone())
            }
            TypeExprKind::NamespaceAccess { namespace, name } => {
                let generic =
                    self.namespace_type(module, namespace, name, base.locations.span());
                let target = self.modules[module.0 as usize]
                    .namespaces
                    .get(namespace)
                    .copied();
                let origin = match target {
                    Some(target) => self.canonical_export_symbol(target, name),
                    None => (module, name.clone()),
                };
                (generic, origin, format!("{namespace}.{name}"))
            }
            _ => {
                self.push_error(
                    module,
                    TypeckErrorKind::NotGeneric {
                        name: "<type>".to_owned(),
                    },
                    span,
                );
                return Type::Unknown;
            }
        };

        let resolved_args: Vec<Type> = args
            .iter()
            .map(|a| self.resolve_type_expr(module, a, scope))
            .collect();

        match generic {
            Type::Generic { params, body } => {
                if params.len() != resolved_args.len() {
                    self.push_error(
                        module,
                        TypeckErrorKind::InvalidTypeArgumentCount {
                            name: display_name,
                            expected: params.len(),
                            found: resolved_args.len(),
                        },
                        span,
                    );
                    return Type::Unknown;
                }
                let mut bindings: FxHashMap<String, Type> = FxHashMap::default();
                for (param, arg) in params.iter().zip(&resolved_args) {
                    if let Some(constraint) = &param.constraint {
                        if !is_assignable(constraint, arg) {
                            self.push_error(
                                module,
                                TypeckErrorKind::InvalidTypeArgument {
                                    param: param.name.clone(),
                                    argument: arg.clone(),
                                    constraint: constraint.clone(),
                                },
                                span,
                            );
                        }
                    }
                    bindings.insert(param.name.clone(), arg.clone());
                }
                let substituted = body.substitute(&bindings);
                Type::Instance {
                    module: origin.0,
                    name: origin.1,
                    args: resolved_args,
                    variances: params.iter().map(|p| p.variance).collect(),
                    body: Box::new(substituted),
                }
            }
            // Instantiating a type that is still being resolved: the
            // back-edge stands for the whole declaration.
            recursive @ Type::Recursive { .. } => recursive,
            Type::Unknown => Type::Unknown,
            _ => {
                self.push_error(
                    module,
                    TypeckErrorKind::NotGeneric { name: display_name },
                    span,
                );
                Type::Unknown
            }
        }
    }

    /// Canonical identity of an exported type symbol.
    fn canonical_export_symbol(&self, module: ModuleId, name: &str) -> (ModuleId, String) {
        let mut visited: FxHashSet<(ModuleId, String)> = FxHashSet::default();
        let mut current = (module, name.to_owned());
        loop {
            if !visited.insert(current.clone()) {
                return current;
            }
            match self.modules[current.0 .0 as usize].exports.get(&current.1) {
                Some(ExportBinding::Local { value_name, .. }) => {
                    return self.canonical_type_symbol(current.0, value_name);
                }
                Some(ExportBinding::Forward {
                    module: target,
                    source_name,
                    ..
                }) => current = (*target, source_name.clone()),
                None => return current,
            }
        }
    }

    fn resolve_type_declaration(&mut self, module: ModuleId, decl: &TypeDeclaration) -> Type {
        if decl.type_params.is_empty() {
            return self.resolve_type_expr(module, &decl.body, &[]);
        }
        let scope: Vec<String> = decl.type_params.iter().map(|p| p.name.clone()).collect();
        let params = self.resolve_type_params(module, &decl.type_params, &scope);
        let body = self.resolve_type_expr(module, &decl.body, &scope);
        Type::Generic {
            params,
            body: Box::new(body),
        }
    }

    fn resolve_type_params(
        &mut self,
        module: ModuleId,
        params: &[TypeParamDecl],
        scope: &[String],
    ) -> Vec<TypeParam> {
        params
            .iter()
            .map(|p| TypeParam {
                name: p.name.clone(),
                variance: p.variance,
                constraint: p
                    .constraint
                    .as_ref()
                    .map(|c| self.resolve_type_expr(module, c, scope)),
            })
            .collect()
    }
}

/// Map a primitive keyword to its semantic type. `string` is `char[]`,
/// `void` the empty tuple.
fn primitive_type(p: PrimitiveType) -> Type {
    match p {
        PrimitiveType::U8 => Type::Int {
            size: IntSize::Size8,
            signed: false,
        },
        PrimitiveType::I8 => Type::Int {
            size: IntSize::Size8,
            signed: true,
        },
        PrimitiveType::U16 => Type::Int {
            size: IntSize::Size16,
            signed: false,
        },
        PrimitiveType::I16 => Type::Int {
            size: IntSize::Size16,
            signed: true,
        },
        PrimitiveType::U32 => Type::Int {
            size: IntSize::Size32,
            signed: false,
        },
        PrimitiveType::I32 => Type::Int {
            size: IntSize::Size32,
            signed: true,
        },
        PrimitiveType::U64 => Type::Int {
            size: IntSize::Size64,
            signed: false,
        },
        PrimitiveType::I64 => Type::Int {
            size: IntSize::Size64,
            signed: true,
        },
        PrimitiveType::Int => Type::int(),
        PrimitiveType::F32 => Type::Float {
            size: FloatSize::Size32,
        },
        PrimitiveType::F64 => Type::f64(),
        PrimitiveType::Char => Type::Char,
        PrimitiveType::String => Type::string(),
        PrimitiveType::Bool => Type::Bool,
        PrimitiveType::Void => Type::void(),
        PrimitiveType::Any => Type::Any,
    }
}
