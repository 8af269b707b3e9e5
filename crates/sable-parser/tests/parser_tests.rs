//! Parser integration tests: CST losslessness, declaration/expression
//! shapes after reduction, and error behaviour.

use insta::assert_snapshot;
use sable_common::ops::OperatorTable;
use sable_parser::ast::{
    Declaration, ExprKind, FunctionBody, PrimitiveType, Program, StmtKind, TypeExprKind,
};
use sable_common::types::Variance;
use sable_parser::lower::lower_program;
use sable_parser::{debug_tree, parse, parse_expr};

fn table() -> OperatorTable {
    OperatorTable::default()
}

fn lower_ok(source: &str) -> Program {
    let parse = parse(source, &table()).expect("lexes cleanly");
    assert!(
        parse.ok(),
        "unexpected parse errors for {source:?}: {:?}",
        parse.errors()
    );
    lower_program(&parse, source)
}

fn parse_err(source: &str) -> String {
    let parse = parse(source, &table()).expect("lexes cleanly");
    assert!(!parse.ok(), "expected a parse error for {source:?}");
    parse.errors()[0].message.clone()
}

// ── CST ────────────────────────────────────────────────────────────────

#[test]
fn cst_is_lossless() {
    let sources = [
        "const x = 1\n",
        "func int add(int a, int b) => a + b\n",
        "type Pair<T> = { T first; T second }\n",
        "import from \"./m\": { vec as v, * as ns }\n\nconst y = v\n",
        "func void noisy() => {\n  // comment\n  x = 1\n  while (x < 10) { x += 1 }\n}\n",
    ];
    for source in sources {
        let parse = parse(source, &table()).unwrap();
        assert!(parse.ok(), "errors for {source:?}: {:?}", parse.errors());
        assert_eq!(parse.syntax().text().to_string(), source);
    }
}

#[test]
fn literal_expression_tree() {
    let parse = parse_expr("1", &table()).unwrap();
    assert_snapshot!(debug_tree(&parse.syntax()), @r#"
    PROGRAM
      LITERAL
        INT_LITERAL "1"
      EOF ""
    "#);
}

#[test]
fn binary_chain_is_left_associative_in_the_cst() {
    let parse = parse_expr("1 + 2", &table()).unwrap();
    assert_snapshot!(debug_tree(&parse.syntax()), @r#"
    PROGRAM
      BINARY_EXPR
        LITERAL
          INT_LITERAL "1"
        WHITESPACE
        OPERATOR "+"
        LITERAL
          WHITESPACE
          INT_LITERAL "2"
      EOF ""
    "#);
}

// ── Imports ────────────────────────────────────────────────────────────

#[test]
fn import_forms() {
    let program = lower_ok(
        "import from \"./util\": helpers\nimport from \"collections\": { vec, map as dict }\nimport from \"./sys\": * as sys\n",
    );
    assert_eq!(program.decls.len(), 3);

    let Declaration::Import(default_import) = &program.decls[0] else {
        panic!("expected import");
    };
    assert_eq!(default_import.module_name, "./util");
    assert_eq!(default_import.entries.len(), 1);
    assert_eq!(default_import.entries[0].import_name, "default");
    assert_eq!(default_import.entries[0].alias_name, "helpers");

    let Declaration::Import(named) = &program.decls[1] else {
        panic!("expected import");
    };
    assert_eq!(named.module_name, "collections");
    assert_eq!(named.entries.len(), 2);
    assert_eq!(named.entries[0].import_name, "vec");
    assert_eq!(named.entries[0].alias_name, "vec");
    assert_eq!(named.entries[1].import_name, "map");
    assert_eq!(named.entries[1].alias_name, "dict");

    let Declaration::Import(wildcard) = &program.decls[2] else {
        panic!("expected import");
    };
    assert_eq!(wildcard.entries[0].import_name, "*");
    assert_eq!(wildcard.entries[0].alias_name, "sys");
}

#[test]
fn import_default_then_named() {
    let program = lower_ok("import from \"./m\": main, { extra }\n");
    let Declaration::Import(import) = &program.decls[0] else {
        panic!("expected import");
    };
    assert_eq!(import.entries.len(), 2);
    assert_eq!(import.entries[0].import_name, "default");
    assert_eq!(import.entries[0].alias_name, "main");
    assert_eq!(import.entries[1].import_name, "extra");
}

// ── Exports ────────────────────────────────────────────────────────────

#[test]
fn export_named_list() {
    let program = lower_ok("const a = 1\nexport { a, a as b }\n");
    let Declaration::Export(export) = &program.decls[1] else {
        panic!("expected export");
    };
    assert_eq!(export.entries.len(), 2);
    assert_eq!(export.entries[0].export_name, "a");
    assert_eq!(export.entries[0].value_name, "a");
    assert!(export.entries[0].value.is_none());
    assert_eq!(export.entries[1].export_name, "b");
    assert_eq!(export.entries[1].value_name, "a");
}

#[test]
fn export_inline_declaration() {
    let program = lower_ok("export func int one() => 1\n");
    let Declaration::Export(export) = &program.decls[0] else {
        panic!("expected export");
    };
    assert_eq!(export.entries.len(), 1);
    assert_eq!(export.entries[0].export_name, "one");
    assert_eq!(export.entries[0].value_name, "one");
    assert!(matches!(
        export.entries[0].value.as_deref(),
        Some(Declaration::Function(_))
    ));
}

#[test]
fn export_default_forms() {
    // A bare name refers to an existing binding.
    let program = lower_ok("const a = 1\nexport default a\n");
    let Declaration::Export(export) = &program.decls[1] else {
        panic!("expected export");
    };
    assert_eq!(export.entries[0].export_name, "default");
    assert_eq!(export.entries[0].value_name, "a");
    assert!(export.entries[0].value.is_none());

    // Any other expression becomes an anonymous inline constant.
    let program = lower_ok("export default 1 + 2\n");
    let Declaration::Export(export) = &program.decls[0] else {
        panic!("expected export");
    };
    assert_eq!(export.entries[0].export_name, "default");
    assert!(matches!(
        export.entries[0].value.as_deref(),
        Some(Declaration::Constant(_))
    ));
}

#[test]
fn export_forward_forms() {
    let program = lower_ok(
        "export from \"./a\"\nexport from \"./b\": { x, y as z }\nexport default from \"./c\"\n",
    );

    let Declaration::ExportForward(wildcard) = &program.decls[0] else {
        panic!("expected forward");
    };
    assert_eq!(wildcard.module_name, "./a");
    assert_eq!(wildcard.entries[0].import_name, "*");

    let Declaration::ExportForward(named) = &program.decls[1] else {
        panic!("expected forward");
    };
    assert_eq!(named.entries.len(), 2);
    assert_eq!(named.entries[0].import_name, "x");
    assert_eq!(named.entries[0].export_name, "x");
    assert_eq!(named.entries[1].import_name, "y");
    assert_eq!(named.entries[1].export_name, "z");

    let Declaration::ExportForward(default) = &program.decls[2] else {
        panic!("expected forward");
    };
    assert_eq!(default.entries[0].import_name, "default");
    assert_eq!(default.entries[0].export_name, "default");
}

// ── Type declarations ──────────────────────────────────────────────────

#[test]
fn type_declaration_with_params() {
    let program = lower_ok("type Box<out T, in U, V : int> = T[]\n");
    let Declaration::Type(decl) = &program.decls[0] else {
        panic!("expected type declaration");
    };
    assert_eq!(decl.name, "Box");
    assert_eq!(decl.type_params.len(), 3);
    assert_eq!(decl.type_params[0].name, "T");
    assert_eq!(decl.type_params[0].variance, Variance::Covariant);
    assert_eq!(decl.type_params[1].name, "U");
    assert_eq!(decl.type_params[1].variance, Variance::Contravariant);
    assert_eq!(decl.type_params[2].name, "V");
    assert_eq!(decl.type_params[2].variance, Variance::Invariant);
    assert!(decl.type_params[2].constraint.is_some());
    assert!(matches!(decl.body.kind, TypeExprKind::Array(_)));
}

#[test]
fn nested_generic_closes_with_a_split_gt_run() {
    let program = lower_ok("type Index = Map<string, List<int>>\n");
    let Declaration::Type(decl) = &program.decls[0] else {
        panic!("expected type declaration");
    };
    let TypeExprKind::Specific { base, args } = &decl.body.kind else {
        panic!("expected specific type, got {:?}", decl.body.kind);
    };
    assert!(matches!(&base.kind, TypeExprKind::Named(n) if n == "Map"));
    assert_eq!(args.len(), 2);
    assert!(matches!(
        &args[0].kind,
        TypeExprKind::Primitive(PrimitiveType::String)
    ));
    let TypeExprKind::Specific { base, args } = &args[1].kind else {
        panic!("expected nested specific type");
    };
    assert!(matches!(&base.kind, TypeExprKind::Named(n) if n == "List"));
    assert!(matches!(
        &args[0].kind,
        TypeExprKind::Primitive(PrimitiveType::Int)
    ));
}

#[test]
fn union_types_flatten() {
    let program = lower_ok("type Value = int | string | bool\n");
    let Declaration::Type(decl) = &program.decls[0] else {
        panic!("expected type declaration");
    };
    let TypeExprKind::Union(members) = &decl.body.kind else {
        panic!("expected union");
    };
    assert_eq!(members.len(), 3);
}

#[test]
fn struct_and_function_types() {
    let program = lower_ok("type Handler = { string name; (int) => bool accept }\n");
    let Declaration::Type(decl) = &program.decls[0] else {
        panic!("expected type declaration");
    };
    let TypeExprKind::Struct(fields) = &decl.body.kind else {
        panic!("expected struct type");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "name");
    assert_eq!(fields[1].name, "accept");
    let TypeExprKind::Function { params, ret } = &fields[1].ty.kind else {
        panic!("expected function type");
    };
    assert_eq!(params.len(), 1);
    assert!(matches!(
        ret.kind,
        TypeExprKind::Primitive(PrimitiveType::Bool)
    ));
}

#[test]
fn namespace_access_type() {
    let program = lower_ok(
        "import from \"./geo\": * as geo\ntype P = geo.Point\n",
    );
    let Declaration::Type(decl) = &program.decls[1] else {
        panic!("expected type declaration");
    };
    assert!(matches!(
        &decl.body.kind,
        TypeExprKind::NamespaceAccess { namespace, name }
            if namespace == "geo" && name == "Point"
    ));
}

#[test]
fn primitive_width_aliases() {
    let program = lower_ok("type B = byte\ntype S = short\ntype L = long\ntype D = double\n");
    let kinds: Vec<_> = program
        .decls
        .iter()
        .map(|d| match d {
            Declaration::Type(t) => match t.body.kind {
                TypeExprKind::Primitive(p) => p,
                _ => panic!("expected primitive"),
            },
            _ => panic!("expected type declaration"),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            PrimitiveType::U8,
            PrimitiveType::I16,
            PrimitiveType::I64,
            PrimitiveType::F64
        ]
    );
}

// ── Functions, constants, statements ───────────────────────────────────

#[test]
fn function_declaration_shapes() {
    let program = lower_ok("func int add<T>(int a, int b) => a + b\n");
    let Declaration::Function(func) = &program.decls[0] else {
        panic!("expected function");
    };
    assert_eq!(func.name, "add");
    assert_eq!(func.type_params.len(), 1);
    assert_eq!(func.params.len(), 2);
    assert_eq!(func.params[0].name, "a");
    assert!(matches!(func.body, FunctionBody::Expr(_)));
}

#[test]
fn function_block_body_statements() {
    let program = lower_ok(
        "func int count(int limit) => {\n  total = 0\n  for x in [1, 2, 3] {\n    total += x\n  }\n  while (total < limit) {\n    total += 1\n  }\n  do { total += 1 } while (false)\n  return total\n}\n",
    );
    let Declaration::Function(func) = &program.decls[0] else {
        panic!("expected function");
    };
    let FunctionBody::Block(block) = &func.body else {
        panic!("expected block body");
    };
    let StmtKind::Block(stmts) = &block.kind else {
        panic!("expected block, got {:?}", block.kind);
    };
    assert_eq!(stmts.len(), 5);
    assert!(matches!(stmts[0].kind, StmtKind::Expr(_)));
    assert!(matches!(stmts[1].kind, StmtKind::For { .. }));
    assert!(matches!(stmts[2].kind, StmtKind::While { .. }));
    assert!(matches!(stmts[3].kind, StmtKind::DoWhile { .. }));
    assert!(matches!(stmts[4].kind, StmtKind::Return(Some(_))));
}

#[test]
fn try_catch_finally() {
    let program = lower_ok(
        "func void risky() => {\n  try {\n    throw \"boom\"\n  } catch (string e) {\n    x = e\n  } finally {\n    y = 1\n  }\n}\n",
    );
    let Declaration::Function(func) = &program.decls[0] else {
        panic!("expected function");
    };
    let FunctionBody::Block(block) = &func.body else {
        panic!("expected block body");
    };
    let StmtKind::Block(stmts) = &block.kind else {
        panic!("expected block");
    };
    let StmtKind::TryCatch {
        catch_name,
        finally,
        ..
    } = &stmts[0].kind
    else {
        panic!("expected try/catch, got {:?}", stmts[0].kind);
    };
    assert_eq!(catch_name, "e");
    assert!(finally.is_some());
}

#[test]
fn empty_block_collapses_to_noop() {
    let program = lower_ok("func void nothing() => {}\n");
    let Declaration::Function(func) = &program.decls[0] else {
        panic!("expected function");
    };
    assert!(matches!(
        &func.body,
        FunctionBody::Block(stmt) if stmt.kind == StmtKind::Noop
    ));

    // Nested empty blocks are Noops and get discarded by the outer block.
    let program = lower_ok("func void nested() => {\n  {}\n  {}\n}\n");
    let Declaration::Function(func) = &program.decls[0] else {
        panic!("expected function");
    };
    assert!(matches!(
        &func.body,
        FunctionBody::Block(stmt) if stmt.kind == StmtKind::Noop
    ));
}

#[test]
fn expression_shapes() {
    let program = lower_ok(
        "const v = { x: 1, y: \"two\\n\" }\nconst t = (1, true)\nconst l = [1, 2][0]\nconst f = (int a, b) => a\nconst c = if (true) 1 else 2\nconst n = obj.field(1).other\n",
    );
    let value = |i: usize| match &program.decls[i] {
        Declaration::Constant(c) => &c.value,
        _ => panic!("expected constant"),
    };

    let ExprKind::StructLiteral(fields) = &value(0).kind else {
        panic!("expected struct literal");
    };
    assert_eq!(fields.len(), 2);
    assert!(matches!(&fields[1].value.kind, ExprKind::Str(s) if s == "two\n"));

    assert!(matches!(&value(1).kind, ExprKind::TupleLiteral(items) if items.len() == 2));
    assert!(matches!(&value(2).kind, ExprKind::ArrayAccess { .. }));

    let ExprKind::Lambda { params, .. } = &value(3).kind else {
        panic!("expected lambda");
    };
    assert_eq!(params.len(), 2);
    assert!(params[0].ty.is_some());
    assert!(params[1].ty.is_none());

    assert!(matches!(&value(4).kind, ExprKind::IfElse { .. }));
    assert!(matches!(&value(5).kind, ExprKind::FieldAccess { .. }));
}

#[test]
fn var_decl_vs_assignment() {
    let program = lower_ok("func void go(any o) => {\n  x = 1\n  o.f = 2\n}\n");
    let Declaration::Function(func) = &program.decls[0] else {
        panic!("expected function");
    };
    let FunctionBody::Block(block) = &func.body else {
        panic!("expected block");
    };
    let StmtKind::Block(stmts) = &block.kind else {
        panic!("expected block");
    };
    let StmtKind::Expr(first) = &stmts[0].kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(&first.kind, ExprKind::VarDecl { name, .. } if name == "x"));
    let StmtKind::Expr(second) = &stmts[1].kind else {
        panic!("expected expression statement");
    };
    assert!(matches!(&second.kind, ExprKind::Binary { op, .. } if op == "="));
}

// ── Properties ─────────────────────────────────────────────────────────

#[test]
fn reducing_twice_yields_equal_asts() {
    let source = "func int f(int a) => a * 2\nconst k = f(21)\n";
    let parse = parse(source, &table()).unwrap();
    let first = lower_program(&parse, source);
    let second = lower_program(&parse, source);
    assert_eq!(first, second);
}

#[test]
fn self_span_covers_the_whole_declaration() {
    let source = "const answer = 40 + 2\n";
    let program = lower_ok(source);
    let Declaration::Constant(decl) = &program.decls[0] else {
        panic!("expected constant");
    };
    let span = decl.locations.span();
    assert_eq!(span.start.offset, 0);
    assert_eq!(span.end.offset as usize, source.trim_end().len());
    // The value's span is the union of its operand spans.
    let value_span = decl.value.locations.span();
    assert_eq!(&source[value_span.start.offset as usize..value_span.end.offset as usize], "40 + 2");
}

// ── Errors ─────────────────────────────────────────────────────────────

#[test]
fn missing_newline_between_declarations() {
    let message = parse_err("const x = 1 const y = 2\n");
    assert!(message.contains("expected newline"), "got: {message}");
}

#[test]
fn comment_swallowing_its_newline_still_terminates() {
    lower_ok("const x = 1 // trailing\nconst y = 2\n");
}

#[test]
fn empty_import_list_is_an_error() {
    let message = parse_err("import from \"./m\": { }\n");
    assert!(message.contains("expected import name"), "got: {message}");
}

#[test]
fn trailing_separator_is_an_error() {
    let message = parse_err("import from \"./m\": { a, }\n");
    assert!(message.contains("expected import name"), "got: {message}");
}

#[test]
fn gt_run_is_not_a_binary_operator() {
    let parse = parse_expr("a >> b", &table()).unwrap();
    assert!(!parse.ok());
}

#[test]
fn error_messages_carry_positions() {
    let parse = parse("const x =\n", &table()).unwrap();
    assert!(!parse.ok());
    let error = &parse.errors()[0];
    assert!(error.message.contains("expected expression"));
    assert_eq!(error.span.start.line, 1);
}
