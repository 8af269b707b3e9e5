//! CST -> AST reduction.
//!
//! One lowering function per CST node kind, dispatched on the node's
//! syntax kind. Reduction is side-effect-free: it walks the rowan tree,
//! keeps only semantically significant children, and populates each AST
//! node's `locations` map (at minimum `"self"`). Literal values are
//! decoded by re-tokenizing the literal's image, so escape handling lives
//! in exactly one place (the lexer).

use sable_common::span::{LineIndex, Span};
use sable_common::token::TokenValue;
use sable_common::types::Variance;
use sable_lexer::Lexer;

use crate::ast::{
    ConstantDeclaration, Declaration, ExportDeclaration, ExportEntry, ExportForwardDeclaration,
    Expr, ExprKind, ForwardEntry, FunctionBody, FunctionDeclaration, ImportDeclaration,
    ImportEntry, LambdaParam, Locations, ParamDecl, PrimitiveType, Program, Stmt, StmtKind,
    StructLiteralField, StructTypeField, TypeDeclaration, TypeExpr, TypeExprKind, TypeParamDecl,
};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;
use crate::Parse;

/// Reduce a parsed file to its AST.
pub fn lower_program(parse: &Parse, source: &str) -> Program {
    let lowerer = Lowerer::new(source);
    lowerer.program(&parse.syntax())
}

/// Reduce the first expression under the root of a [`crate::parse_expr`]
/// result. Used by tests and tooling.
pub fn lower_first_expr(parse: &Parse, source: &str) -> Option<Expr> {
    let lowerer = Lowerer::new(source);
    let root = parse.syntax();
    root.children()
        .find(|n| is_expr_kind(n.kind()))
        .map(|n| lowerer.expr(&n))
}

struct Lowerer {
    line_index: LineIndex,
}

impl Lowerer {
    fn new(source: &str) -> Self {
        Self {
            line_index: LineIndex::new(source),
        }
    }

    fn span(&self, node: &SyntaxNode) -> Span {
        let range = node.text_range();
        self.line_index
            .span(u32::from(range.start()), u32::from(range.end()))
    }

    fn token_span(&self, token: &SyntaxToken) -> Span {
        let range = token.text_range();
        self.line_index
            .span(u32::from(range.start()), u32::from(range.end()))
    }

    // ── Program and declarations ───────────────────────────────────────

    fn program(&self, node: &SyntaxNode) -> Program {
        let decls = node.children().filter_map(|child| self.decl(&child)).collect();
        Program {
            decls,
            locations: Locations::of(self.span(node)),
        }
    }

    fn decl(&self, node: &SyntaxNode) -> Option<Declaration> {
        match node.kind() {
            SyntaxKind::IMPORT_DECL => Some(Declaration::Import(self.import_decl(node))),
            SyntaxKind::TYPE_DECL => Some(Declaration::Type(self.type_decl(node))),
            SyntaxKind::FUNC_DECL => Some(Declaration::Function(self.func_decl(node))),
            SyntaxKind::CONST_DECL => Some(Declaration::Constant(self.const_decl(node))),
            SyntaxKind::EXPORT_DECL => Some(Declaration::Export(self.export_decl(node))),
            SyntaxKind::EXPORT_FORWARD_DECL => {
                Some(Declaration::ExportForward(self.export_forward(node)))
            }
            SyntaxKind::ERROR_NODE => Some(Declaration::Error),
            _ => None,
        }
    }

    fn import_decl(&self, node: &SyntaxNode) -> ImportDeclaration {
        let mut locations = Locations::of(self.span(node));
        let module_name = self.module_name_of(node, &mut locations);

        let mut entries = Vec::new();
        for child in node.children() {
            match child.kind() {
                SyntaxKind::IMPORT_DEFAULT => {
                    if let Some(alias) = first_ident(&child) {
                        let mut entry_locations = Locations::of(self.span(&child));
                        entry_locations.insert("alias", self.token_span(&alias));
                        entries.push(ImportEntry {
                            import_name: "default".to_owned(),
                            alias_name: alias.text().to_owned(),
                            locations: entry_locations,
                        });
                    }
                }
                SyntaxKind::IMPORT_ENTRY => entries.push(self.import_entry(&child)),
                SyntaxKind::IMPORT_LIST => {
                    entries.extend(
                        child
                            .children()
                            .filter(|n| n.kind() == SyntaxKind::IMPORT_ENTRY)
                            .map(|n| self.import_entry(&n)),
                    );
                }
                _ => {}
            }
        }

        ImportDeclaration {
            module_name,
            entries,
            locations,
        }
    }

    fn import_entry(&self, node: &SyntaxNode) -> ImportEntry {
        let mut locations = Locations::of(self.span(node));
        let names: Vec<SyntaxToken> = name_tokens(node);
        let wildcard = tokens_of(node)
            .any(|t| t.kind() == SyntaxKind::OPERATOR && t.text() == "*");

        let (import_name, alias_name) = if wildcard {
            let alias = names.first().map_or(String::new(), |t| t.text().to_owned());
            ("*".to_owned(), alias)
        } else {
            let name = names.first().map_or(String::new(), |t| t.text().to_owned());
            let alias = names.get(1).map_or(name.clone(), |t| t.text().to_owned());
            (name, alias)
        };
        if let Some(alias) = names.last() {
            locations.insert("alias", self.token_span(alias));
        }
        ImportEntry {
            import_name,
            alias_name,
            locations,
        }
    }

    fn export_decl(&self, node: &SyntaxNode) -> ExportDeclaration {
        let locations = Locations::of(self.span(node));
        let is_default = tokens_of(node).any(|t| t.kind() == SyntaxKind::DEFAULT_KW);
        let mut entries = Vec::new();

        if let Some(list) = child_of_kind(node, SyntaxKind::EXPORT_LIST) {
            for entry in list
                .children()
                .filter(|n| n.kind() == SyntaxKind::EXPORT_ENTRY)
            {
                let mut entry_locations = Locations::of(self.span(&entry));
                let names = name_tokens(&entry);
                let value_name = names.first().map_or(String::new(), |t| t.text().to_owned());
                let export_name = names
                    .get(1)
                    .map_or(value_name.clone(), |t| t.text().to_owned());
                if let Some(t) = names.first() {
                    entry_locations.insert("value", self.token_span(t));
                }
                entries.push(ExportEntry {
                    export_name,
                    value_name,
                    value: None,
                    locations: entry_locations,
                });
            }
        } else if let Some(decl_node) = node.children().find(|n| is_inline_decl_kind(n.kind())) {
            if let Some(decl) = self.decl(&decl_node) {
                let value_name = decl.name().unwrap_or("default").to_owned();
                let export_name = if is_default {
                    "default".to_owned()
                } else {
                    value_name.clone()
                };
                entries.push(ExportEntry {
                    export_name,
                    value_name,
                    value: Some(Box::new(decl)),
                    locations: Locations::of(self.span(&decl_node)),
                });
            }
        } else if let Some(expr_node) = node.children().find(|n| is_expr_kind(n.kind())) {
            // `export default <expr>`: a bare name exports that binding,
            // anything else becomes an anonymous inline constant.
            let expr = self.expr(&expr_node);
            let entry_locations = Locations::of(self.span(&expr_node));
            match expr.kind {
                ExprKind::Name(ref name) => entries.push(ExportEntry {
                    export_name: "default".to_owned(),
                    value_name: name.clone(),
                    value: None,
                    locations: entry_locations,
                }),
                _ => entries.push(ExportEntry {
                    export_name: "default".to_owned(),
                    value_name: "default".to_owned(),
                    value: Some(Box::new(Declaration::Constant(ConstantDeclaration {
                        name: "default".to_owned(),
                        locations: Locations::of(expr.locations.span()),
                        value: expr,
                    }))),
                    locations: entry_locations,
                }),
            }
        }

        ExportDeclaration {
            entries,
            locations,
        }
    }

    fn export_forward(&self, node: &SyntaxNode) -> ExportForwardDeclaration {
        let mut locations = Locations::of(self.span(node));
        let module_name = self.module_name_of(node, &mut locations);
        let is_default = tokens_of(node).any(|t| t.kind() == SyntaxKind::DEFAULT_KW);

        let mut entries = Vec::new();
        if let Some(list) = child_of_kind(node, SyntaxKind::FORWARD_LIST) {
            for entry in list
                .children()
                .filter(|n| n.kind() == SyntaxKind::FORWARD_ENTRY)
            {
                let entry_locations = Locations::of(self.span(&entry));
                let wildcard = tokens_of(&entry)
                    .any(|t| t.kind() == SyntaxKind::OPERATOR && t.text() == "*");
                if wildcard {
                    entries.push(ForwardEntry {
                        import_name: "*".to_owned(),
                        export_name: "*".to_owned(),
                        locations: entry_locations,
                    });
                    continue;
                }
                let names = name_tokens(&entry);
                let import_name = names.first().map_or(String::new(), |t| t.text().to_owned());
                let export_name = names
                    .get(1)
                    .map_or(import_name.clone(), |t| t.text().to_owned());
                entries.push(ForwardEntry {
                    import_name,
                    export_name,
                    locations: entry_locations,
                });
            }
        } else if is_default {
            entries.push(ForwardEntry {
                import_name: "default".to_owned(),
                export_name: "default".to_owned(),
                locations: Locations::of(self.span(node)),
            });
        } else {
            // `export from "mod"` with no list forwards everything.
            entries.push(ForwardEntry {
                import_name: "*".to_owned(),
                export_name: "*".to_owned(),
                locations: Locations::of(self.span(node)),
            });
        }

        ExportForwardDeclaration {
            module_name,
            entries,
            locations,
        }
    }

    fn type_decl(&self, node: &SyntaxNode) -> TypeDeclaration {
        let mut locations = Locations::of(self.span(node));
        let name = self.named_ident(node, &mut locations);
        let type_params = self.type_params_of(node);
        let body = node
            .children()
            .find(|n| is_type_kind(n.kind()))
            .map(|n| self.ty(&n))
            .unwrap_or_else(|| self.error_type(node));
        TypeDeclaration {
            name,
            type_params,
            body,
            locations,
        }
    }

    fn func_decl(&self, node: &SyntaxNode) -> FunctionDeclaration {
        let mut locations = Locations::of(self.span(node));
        let name = self.named_ident(node, &mut locations);
        let type_params = self.type_params_of(node);
        let return_type = node
            .children()
            .find(|n| is_type_kind(n.kind()))
            .map(|n| self.ty(&n))
            .unwrap_or_else(|| self.error_type(node));

        let params = child_of_kind(node, SyntaxKind::PARAM_LIST)
            .map(|list| {
                list.children()
                    .filter(|n| n.kind() == SyntaxKind::PARAM)
                    .map(|n| self.param(&n))
                    .collect()
            })
            .unwrap_or_default();

        let body = if let Some(block) = child_of_kind(node, SyntaxKind::BLOCK_STMT) {
            FunctionBody::Block(self.stmt(&block))
        } else if let Some(expr_node) = node.children().find(|n| is_expr_kind(n.kind())) {
            FunctionBody::Expr(self.expr(&expr_node))
        } else {
            FunctionBody::Expr(self.error_expr(node))
        };

        FunctionDeclaration {
            name,
            return_type,
            type_params,
            params,
            body,
            locations,
        }
    }

    fn param(&self, node: &SyntaxNode) -> ParamDecl {
        let mut locations = Locations::of(self.span(node));
        let name = self.named_ident(node, &mut locations);
        let ty = node
            .children()
            .find(|n| is_type_kind(n.kind()))
            .map(|n| self.ty(&n))
            .unwrap_or_else(|| self.error_type(node));
        ParamDecl {
            name,
            ty,
            locations,
        }
    }

    fn const_decl(&self, node: &SyntaxNode) -> ConstantDeclaration {
        let mut locations = Locations::of(self.span(node));
        let name = self.named_ident(node, &mut locations);
        let value = node
            .children()
            .find(|n| is_expr_kind(n.kind()))
            .map(|n| self.expr(&n))
            .unwrap_or_else(|| self.error_expr(node));
        ConstantDeclaration {
            name,
            value,
            locations,
        }
    }

    fn type_params_of(&self, node: &SyntaxNode) -> Vec<TypeParamDecl> {
        let Some(list) = child_of_kind(node, SyntaxKind::TYPE_PARAM_LIST) else {
            return Vec::new();
        };
        list.children()
            .filter(|n| n.kind() == SyntaxKind::TYPE_PARAM)
            .map(|n| self.type_param(&n))
            .collect()
    }

    fn type_param(&self, node: &SyntaxNode) -> TypeParamDecl {
        let mut locations = Locations::of(self.span(node));
        let idents: Vec<SyntaxToken> = tokens_of(node)
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .collect();
        let contravariant = tokens_of(node).any(|t| t.kind() == SyntaxKind::IN_KW);

        let (variance, name_token) = if contravariant {
            (Variance::Contravariant, idents.first())
        } else if idents.len() >= 2 && idents[0].text() == "out" {
            (Variance::Covariant, idents.get(1))
        } else {
            (Variance::Invariant, idents.first())
        };
        let name = name_token.map_or(String::new(), |t| t.text().to_owned());
        if let Some(t) = name_token {
            locations.insert("name", self.token_span(t));
        }
        let constraint = node
            .children()
            .find(|n| is_type_kind(n.kind()))
            .map(|n| self.ty(&n));
        TypeParamDecl {
            name,
            variance,
            constraint,
            locations,
        }
    }

    // ── Types ──────────────────────────────────────────────────────────

    fn ty(&self, node: &SyntaxNode) -> TypeExpr {
        let locations = Locations::of(self.span(node));
        let kind = match node.kind() {
            SyntaxKind::PRIMITIVE_TYPE => {
                match tokens_of(node).find_map(|t| primitive_of(t.kind())) {
                    Some(p) => TypeExprKind::Primitive(p),
                    None => TypeExprKind::Error,
                }
            }
            SyntaxKind::NAME_TYPE => TypeExprKind::Named(
                first_ident(node).map_or(String::new(), |t| t.text().to_owned()),
            ),
            SyntaxKind::ARRAY_TYPE => match node.children().find(|n| is_type_kind(n.kind())) {
                Some(elem) => TypeExprKind::Array(Box::new(self.ty(&elem))),
                None => TypeExprKind::Error,
            },
            SyntaxKind::TUPLE_TYPE => TypeExprKind::Tuple(
                node.children()
                    .filter(|n| is_type_kind(n.kind()))
                    .map(|n| self.ty(&n))
                    .collect(),
            ),
            SyntaxKind::STRUCT_TYPE => TypeExprKind::Struct(
                node.children()
                    .filter(|n| n.kind() == SyntaxKind::STRUCT_TYPE_FIELD)
                    .map(|n| self.struct_type_field(&n))
                    .collect(),
            ),
            SyntaxKind::FUNCTION_TYPE => {
                let mut types: Vec<TypeExpr> = node
                    .children()
                    .filter(|n| is_type_kind(n.kind()))
                    .map(|n| self.ty(&n))
                    .collect();
                match types.pop() {
                    Some(ret) => TypeExprKind::Function {
                        params: types,
                        ret: Box::new(ret),
                    },
                    None => TypeExprKind::Error,
                }
            }
            SyntaxKind::PAREN_TYPE => match node.children().find(|n| is_type_kind(n.kind())) {
                Some(inner) => TypeExprKind::Paren(Box::new(self.ty(&inner))),
                None => TypeExprKind::Error,
            },
            SyntaxKind::SPECIFIC_TYPE => {
                let base = node
                    .children()
                    .find(|n| is_type_kind(n.kind()))
                    .map(|n| self.ty(&n));
                let args = child_of_kind(node, SyntaxKind::TYPE_ARG_LIST)
                    .map(|list| {
                        list.children()
                            .filter(|n| is_type_kind(n.kind()))
                            .map(|n| self.ty(&n))
                            .collect()
                    })
                    .unwrap_or_default();
                match base {
                    Some(base) => TypeExprKind::Specific {
                        base: Box::new(base),
                        args,
                    },
                    None => TypeExprKind::Error,
                }
            }
            SyntaxKind::UNION_TYPE => {
                let mut members = Vec::new();
                for child in node.children().filter(|n| is_type_kind(n.kind())) {
                    let lowered = self.ty(&child);
                    // A left-folded union chain flattens into one n-ary union.
                    if let TypeExprKind::Union(inner) = lowered.kind {
                        members.extend(inner);
                    } else {
                        members.push(lowered);
                    }
                }
                TypeExprKind::Union(members)
            }
            SyntaxKind::NAMESPACE_TYPE => {
                let base = node.children().find(|n| is_type_kind(n.kind()));
                let member = tokens_of(node)
                    .filter(|t| t.kind() == SyntaxKind::IDENT)
                    .last();
                match (base, member) {
                    (Some(base), Some(member))
                        if base.kind() == SyntaxKind::NAME_TYPE =>
                    {
                        TypeExprKind::NamespaceAccess {
                            namespace: first_ident(&base)
                                .map_or(String::new(), |t| t.text().to_owned()),
                            name: member.text().to_owned(),
                        }
                    }
                    _ => TypeExprKind::Error,
                }
            }
            _ => TypeExprKind::Error,
        };
        TypeExpr { kind, locations }
    }

    fn struct_type_field(&self, node: &SyntaxNode) -> StructTypeField {
        let mut locations = Locations::of(self.span(node));
        let name = self.named_ident(node, &mut locations);
        let ty = node
            .children()
            .find(|n| is_type_kind(n.kind()))
            .map(|n| self.ty(&n))
            .unwrap_or_else(|| self.error_type(node));
        StructTypeField {
            name,
            ty,
            locations,
        }
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn stmt(&self, node: &SyntaxNode) -> Stmt {
        let locations = Locations::of(self.span(node));
        let kind = match node.kind() {
            SyntaxKind::BLOCK_STMT => {
                let stmts: Vec<Stmt> = node
                    .children()
                    .filter(|n| is_stmt_kind(n.kind()))
                    .map(|n| self.stmt(&n))
                    .filter(|s| s.kind != StmtKind::Noop)
                    .collect();
                if stmts.is_empty() {
                    StmtKind::Noop
                } else {
                    StmtKind::Block(stmts)
                }
            }
            SyntaxKind::BREAK_STMT => StmtKind::Break,
            SyntaxKind::CONTINUE_STMT => StmtKind::Continue,
            SyntaxKind::DO_WHILE_STMT => {
                let body = self.first_stmt(node);
                let cond = self.first_expr(node);
                StmtKind::DoWhile {
                    body: Box::new(body),
                    cond,
                }
            }
            SyntaxKind::FOR_STMT => {
                let binding = first_ident(node).map_or(String::new(), |t| t.text().to_owned());
                StmtKind::For {
                    binding,
                    iterable: self.first_expr(node),
                    body: Box::new(self.first_stmt(node)),
                }
            }
            SyntaxKind::RETURN_STMT => StmtKind::Return(
                node.children()
                    .find(|n| is_expr_kind(n.kind()))
                    .map(|n| self.expr(&n)),
            ),
            SyntaxKind::THROW_STMT => StmtKind::Throw(self.first_expr(node)),
            SyntaxKind::TRY_STMT => {
                let body = self.first_stmt(node);
                let catch = child_of_kind(node, SyntaxKind::CATCH_CLAUSE);
                let (catch_type, catch_name, catch_body) = match catch {
                    Some(ref clause) => (
                        clause
                            .children()
                            .find(|n| is_type_kind(n.kind()))
                            .map(|n| self.ty(&n))
                            .unwrap_or_else(|| self.error_type(clause)),
                        first_ident(clause).map_or(String::new(), |t| t.text().to_owned()),
                        self.first_stmt(clause),
                    ),
                    None => (
                        self.error_type(node),
                        String::new(),
                        Stmt {
                            kind: StmtKind::Noop,
                            locations: Locations::of(self.span(node)),
                        },
                    ),
                };
                let finally = child_of_kind(node, SyntaxKind::FINALLY_CLAUSE)
                    .map(|clause| Box::new(self.first_stmt(&clause)));
                StmtKind::TryCatch {
                    body: Box::new(body),
                    catch_type,
                    catch_name,
                    catch_body: Box::new(catch_body),
                    finally,
                }
            }
            SyntaxKind::WHILE_STMT => StmtKind::While {
                cond: self.first_expr(node),
                body: Box::new(self.first_stmt(node)),
            },
            SyntaxKind::EXPR_STMT => StmtKind::Expr(self.first_expr(node)),
            _ => StmtKind::Noop,
        };
        Stmt { kind, locations }
    }

    fn first_stmt(&self, node: &SyntaxNode) -> Stmt {
        node.children()
            .find(|n| is_stmt_kind(n.kind()))
            .map(|n| self.stmt(&n))
            .unwrap_or(Stmt {
                kind: StmtKind::Noop,
                locations: Locations::of(self.span(node)),
            })
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn expr(&self, node: &SyntaxNode) -> Expr {
        let mut locations = Locations::of(self.span(node));
        let kind = match node.kind() {
            SyntaxKind::LITERAL => self.literal(node),
            SyntaxKind::NAME_REF => ExprKind::Name(
                first_ident(node).map_or(String::new(), |t| t.text().to_owned()),
            ),
            SyntaxKind::ARRAY_ACCESS => {
                let mut exprs = node.children().filter(|n| is_expr_kind(n.kind()));
                let target = exprs.next().map(|n| self.expr(&n));
                let index = exprs.next().map(|n| self.expr(&n));
                match (target, index) {
                    (Some(target), Some(index)) => ExprKind::ArrayAccess {
                        target: Box::new(target),
                        index: Box::new(index),
                    },
                    _ => ExprKind::Error,
                }
            }
            SyntaxKind::ARRAY_LITERAL => ExprKind::ArrayLiteral(
                node.children()
                    .filter(|n| is_expr_kind(n.kind()))
                    .map(|n| self.expr(&n))
                    .collect(),
            ),
            SyntaxKind::BINARY_EXPR => {
                let op_token = tokens_of(node).find(|t| {
                    t.kind() == SyntaxKind::OPERATOR || t.kind() == SyntaxKind::ASSIGN
                });
                let mut exprs = node.children().filter(|n| is_expr_kind(n.kind()));
                let lhs = exprs.next().map(|n| self.expr(&n));
                let rhs = exprs.next().map(|n| self.expr(&n));
                match (op_token, lhs, rhs) {
                    (Some(op), Some(lhs), Some(rhs)) => {
                        locations.insert("op", self.token_span(&op));
                        ExprKind::Binary {
                            op: op.text().to_owned(),
                            lhs: Box::new(lhs),
                            rhs: Box::new(rhs),
                        }
                    }
                    _ => ExprKind::Error,
                }
            }
            SyntaxKind::FIELD_ACCESS => {
                let target = node
                    .children()
                    .find(|n| is_expr_kind(n.kind()))
                    .map(|n| self.expr(&n));
                let field = tokens_of(node)
                    .filter(|t| t.kind() == SyntaxKind::IDENT)
                    .last();
                match (target, field) {
                    (Some(target), Some(field)) => {
                        locations.insert("field", self.token_span(&field));
                        ExprKind::FieldAccess {
                            target: Box::new(target),
                            field: field.text().to_owned(),
                        }
                    }
                    _ => ExprKind::Error,
                }
            }
            SyntaxKind::CALL_EXPR => {
                let callee = node
                    .children()
                    .find(|n| is_expr_kind(n.kind()))
                    .map(|n| self.expr(&n));
                let args = child_of_kind(node, SyntaxKind::ARG_LIST)
                    .map(|list| {
                        list.children()
                            .filter(|n| is_expr_kind(n.kind()))
                            .map(|n| self.expr(&n))
                            .collect()
                    })
                    .unwrap_or_default();
                match callee {
                    Some(callee) => ExprKind::Call {
                        callee: Box::new(callee),
                        args,
                    },
                    None => ExprKind::Error,
                }
            }
            SyntaxKind::IF_EXPR => {
                let mut exprs = node.children().filter(|n| is_expr_kind(n.kind()));
                let cond = exprs.next().map(|n| self.expr(&n));
                let then_expr = exprs.next().map(|n| self.expr(&n));
                let else_expr = exprs.next().map(|n| self.expr(&n));
                match (cond, then_expr, else_expr) {
                    (Some(cond), Some(then_expr), Some(else_expr)) => ExprKind::IfElse {
                        cond: Box::new(cond),
                        then_expr: Box::new(then_expr),
                        else_expr: Box::new(else_expr),
                    },
                    _ => ExprKind::Error,
                }
            }
            SyntaxKind::LAMBDA_EXPR => {
                let params = child_of_kind(node, SyntaxKind::LAMBDA_PARAM_LIST)
                    .map(|list| {
                        list.children()
                            .filter(|n| n.kind() == SyntaxKind::LAMBDA_PARAM)
                            .map(|n| self.lambda_param(&n))
                            .collect()
                    })
                    .unwrap_or_default();
                let body = node
                    .children()
                    .find(|n| is_expr_kind(n.kind()))
                    .map(|n| self.expr(&n));
                match body {
                    Some(body) => ExprKind::Lambda {
                        params,
                        body: Box::new(body),
                    },
                    None => ExprKind::Error,
                }
            }
            SyntaxKind::PAREN_EXPR => match node.children().find(|n| is_expr_kind(n.kind())) {
                Some(inner) => ExprKind::Paren(Box::new(self.expr(&inner))),
                None => ExprKind::Error,
            },
            SyntaxKind::STRUCT_LITERAL => ExprKind::StructLiteral(
                node.children()
                    .filter(|n| n.kind() == SyntaxKind::STRUCT_LITERAL_FIELD)
                    .map(|n| self.struct_literal_field(&n))
                    .collect(),
            ),
            SyntaxKind::TUPLE_LITERAL => ExprKind::TupleLiteral(
                node.children()
                    .filter(|n| is_expr_kind(n.kind()))
                    .map(|n| self.expr(&n))
                    .collect(),
            ),
            SyntaxKind::PREFIX_EXPR | SyntaxKind::POSTFIX_EXPR => {
                let prefix = node.kind() == SyntaxKind::PREFIX_EXPR;
                let op_token = tokens_of(node).find(|t| t.kind() == SyntaxKind::OPERATOR);
                let operand = node
                    .children()
                    .find(|n| is_expr_kind(n.kind()))
                    .map(|n| self.expr(&n));
                match (op_token, operand) {
                    (Some(op), Some(operand)) => {
                        locations.insert("op", self.token_span(&op));
                        ExprKind::Unary {
                            op: op.text().to_owned(),
                            prefix,
                            operand: Box::new(operand),
                        }
                    }
                    _ => ExprKind::Error,
                }
            }
            SyntaxKind::VAR_DECL_EXPR => {
                let name = first_ident(node);
                let value = node
                    .children()
                    .find(|n| is_expr_kind(n.kind()))
                    .map(|n| self.expr(&n));
                match (name, value) {
                    (Some(name), Some(value)) => {
                        locations.insert("name", self.token_span(&name));
                        ExprKind::VarDecl {
                            name: name.text().to_owned(),
                            value: Box::new(value),
                        }
                    }
                    _ => ExprKind::Error,
                }
            }
            _ => ExprKind::Error,
        };
        Expr {
            kind,
            locations,
            ty: None,
        }
    }

    fn literal(&self, node: &SyntaxNode) -> ExprKind {
        let Some(token) = tokens_of(node).next() else {
            return ExprKind::Error;
        };
        match token.kind() {
            SyntaxKind::TRUE_KW => ExprKind::Bool(true),
            SyntaxKind::FALSE_KW => ExprKind::Bool(false),
            SyntaxKind::INT_LITERAL => match decode_literal(token.text()) {
                Some(TokenValue::Int(v)) => ExprKind::Int(v),
                _ => ExprKind::Error,
            },
            SyntaxKind::FLOAT_LITERAL => match decode_literal(token.text()) {
                Some(TokenValue::Float(v)) => ExprKind::Float(v),
                _ => ExprKind::Error,
            },
            SyntaxKind::CHAR_LITERAL => match decode_literal(token.text()) {
                Some(TokenValue::Char(v)) => ExprKind::Char(v),
                _ => ExprKind::Error,
            },
            SyntaxKind::STRING_LITERAL => match decode_literal(token.text()) {
                Some(TokenValue::Str(v)) => ExprKind::Str(v),
                _ => ExprKind::Error,
            },
            _ => ExprKind::Error,
        }
    }

    fn lambda_param(&self, node: &SyntaxNode) -> LambdaParam {
        let mut locations = Locations::of(self.span(node));
        let ty = node
            .children()
            .find(|n| is_type_kind(n.kind()))
            .map(|n| self.ty(&n));
        let name = tokens_of(node)
            .filter(|t| t.kind() == SyntaxKind::IDENT)
            .last();
        if let Some(t) = &name {
            locations.insert("name", self.token_span(t));
        }
        LambdaParam {
            name: name.map_or(String::new(), |t| t.text().to_owned()),
            ty,
            locations,
        }
    }

    fn struct_literal_field(&self, node: &SyntaxNode) -> StructLiteralField {
        let mut locations = Locations::of(self.span(node));
        let name = self.named_ident(node, &mut locations);
        let value = node
            .children()
            .find(|n| is_expr_kind(n.kind()))
            .map(|n| self.expr(&n))
            .unwrap_or_else(|| self.error_expr(node));
        StructLiteralField {
            name,
            value,
            locations,
        }
    }

    fn first_expr(&self, node: &SyntaxNode) -> Expr {
        node.children()
            .find(|n| is_expr_kind(n.kind()))
            .map(|n| self.expr(&n))
            .unwrap_or_else(|| self.error_expr(node))
    }

    // ── Shared helpers ─────────────────────────────────────────────────

    /// The first IDENT token directly under `node`, recorded as `"name"`.
    fn named_ident(&self, node: &SyntaxNode, locations: &mut Locations) -> String {
        match first_ident(node) {
            Some(token) => {
                locations.insert("name", self.token_span(&token));
                token.text().to_owned()
            }
            None => String::new(),
        }
    }

    /// Decode the module-name string of an import/forward declaration and
    /// record its span under `"module"`.
    fn module_name_of(&self, node: &SyntaxNode, locations: &mut Locations) -> String {
        match tokens_of(node).find(|t| t.kind() == SyntaxKind::STRING_LITERAL) {
            Some(token) => {
                locations.insert("module", self.token_span(&token));
                match decode_literal(token.text()) {
                    Some(TokenValue::Str(s)) => s,
                    _ => String::new(),
                }
            }
            None => String::new(),
        }
    }

    fn error_type(&self, node: &SyntaxNode) -> TypeExpr {
        TypeExpr {
            kind: TypeExprKind::Error,
            locations: Locations::of(self.span(node)),
        }
    }

    fn error_expr(&self, node: &SyntaxNode) -> Expr {
        Expr {
            kind: ExprKind::Error,
            locations: Locations::of(self.span(node)),
            ty: None,
        }
    }
}

// ── Tree navigation ──────────────────────────────────────────────────────

fn child_of_kind(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxNode> {
    node.children().find(|n| n.kind() == kind)
}

/// Declarations that may appear inline in an export.
fn is_inline_decl_kind(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::TYPE_DECL | SyntaxKind::FUNC_DECL | SyntaxKind::CONST_DECL
    )
}

fn tokens_of(node: &SyntaxNode) -> impl Iterator<Item = SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|el| el.into_token())
}

fn first_ident(node: &SyntaxNode) -> Option<SyntaxToken> {
    tokens_of(node).find(|t| t.kind() == SyntaxKind::IDENT)
}

/// Name-position tokens: identifiers plus the `default` keyword, which is
/// legal as an export/import name.
fn name_tokens(node: &SyntaxNode) -> Vec<SyntaxToken> {
    tokens_of(node)
        .filter(|t| t.kind() == SyntaxKind::IDENT || t.kind() == SyntaxKind::DEFAULT_KW)
        .collect()
}

/// Decode a literal image by re-tokenizing it, so escape and radix logic
/// stays in the lexer.
fn decode_literal(text: &str) -> Option<TokenValue> {
    let tokens = Lexer::tokenize(text).ok()?;
    tokens.into_iter().next()?.value
}

fn primitive_of(kind: SyntaxKind) -> Option<PrimitiveType> {
    match kind {
        SyntaxKind::U8_KW | SyntaxKind::BYTE_KW => Some(PrimitiveType::U8),
        SyntaxKind::I8_KW => Some(PrimitiveType::I8),
        SyntaxKind::U16_KW => Some(PrimitiveType::U16),
        SyntaxKind::I16_KW | SyntaxKind::SHORT_KW => Some(PrimitiveType::I16),
        SyntaxKind::U32_KW => Some(PrimitiveType::U32),
        SyntaxKind::I32_KW => Some(PrimitiveType::I32),
        SyntaxKind::U64_KW => Some(PrimitiveType::U64),
        SyntaxKind::I64_KW | SyntaxKind::LONG_KW => Some(PrimitiveType::I64),
        SyntaxKind::INT_KW | SyntaxKind::INTEGER_KW => Some(PrimitiveType::Int),
        SyntaxKind::F32_KW | SyntaxKind::FLOAT_KW => Some(PrimitiveType::F32),
        SyntaxKind::F64_KW | SyntaxKind::DOUBLE_KW => Some(PrimitiveType::F64),
        SyntaxKind::CHAR_KW => Some(PrimitiveType::Char),
        SyntaxKind::STRING_KW => Some(PrimitiveType::String),
        SyntaxKind::BOOL_KW => Some(PrimitiveType::Bool),
        SyntaxKind::VOID_KW => Some(PrimitiveType::Void),
        SyntaxKind::ANY_KW => Some(PrimitiveType::Any),
        _ => None,
    }
}

pub(crate) fn is_type_kind(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::PRIMITIVE_TYPE
            | SyntaxKind::NAME_TYPE
            | SyntaxKind::ARRAY_TYPE
            | SyntaxKind::TUPLE_TYPE
            | SyntaxKind::STRUCT_TYPE
            | SyntaxKind::FUNCTION_TYPE
            | SyntaxKind::PAREN_TYPE
            | SyntaxKind::SPECIFIC_TYPE
            | SyntaxKind::UNION_TYPE
            | SyntaxKind::NAMESPACE_TYPE
    )
}

pub(crate) fn is_stmt_kind(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::BLOCK_STMT
            | SyntaxKind::BREAK_STMT
            | SyntaxKind::CONTINUE_STMT
            | SyntaxKind::DO_WHILE_STMT
            | SyntaxKind::FOR_STMT
            | SyntaxKind::RETURN_STMT
            | SyntaxKind::THROW_STMT
            | SyntaxKind::TRY_STMT
            | SyntaxKind::WHILE_STMT
            | SyntaxKind::EXPR_STMT
    )
}

pub(crate) fn is_expr_kind(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::LITERAL
            | SyntaxKind::NAME_REF
            | SyntaxKind::ARRAY_ACCESS
            | SyntaxKind::ARRAY_LITERAL
            | SyntaxKind::BINARY_EXPR
            | SyntaxKind::FIELD_ACCESS
            | SyntaxKind::CALL_EXPR
            | SyntaxKind::IF_EXPR
            | SyntaxKind::LAMBDA_EXPR
            | SyntaxKind::PAREN_EXPR
            | SyntaxKind::STRUCT_LITERAL
            | SyntaxKind::TUPLE_LITERAL
            | SyntaxKind::PREFIX_EXPR
            | SyntaxKind::POSTFIX_EXPR
            | SyntaxKind::VAR_DECL_EXPR
    )
}
