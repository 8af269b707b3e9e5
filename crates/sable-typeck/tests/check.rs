//! Expression and function-body checking integration tests.

use std::path::Path;

use sable_common::fs::MemoryFs;
use sable_common::ops::OperatorTable;
use sable_typeck::{CheckFailure, TypeChecker, TypeckErrorKind};

fn run(source: &str) -> Result<TypeChecker<MemoryFs>, CheckFailure> {
    let mut fs = MemoryFs::new();
    fs.insert("/p/main.sab", source);
    let mut ck = TypeChecker::new(fs, OperatorTable::default());
    ck.check(Path::new("/p/main.sab")).map(|()| ck)
}

fn constant_display(ck: &TypeChecker<MemoryFs>, name: &str) -> String {
    ck.modules()[0]
        .constants
        .get(name)
        .and_then(|entry| entry.ty.as_ref())
        .map(ToString::to_string)
        .unwrap_or_else(|| panic!("constant `{name}` has no resolved type"))
}

// ── Literals and operators ─────────────────────────────────────────────

#[test]
fn literal_types() {
    let ck = run(
        "const i = 42\nconst f = 1.5\nconst c = 'x'\nconst s = \"hi\"\nconst b = true\n",
    )
    .unwrap();
    assert_eq!(constant_display(&ck, "i"), "int");
    assert_eq!(constant_display(&ck, "f"), "f64");
    assert_eq!(constant_display(&ck, "c"), "char");
    assert_eq!(constant_display(&ck, "s"), "string");
    assert_eq!(constant_display(&ck, "b"), "bool");
}

#[test]
fn arithmetic_and_precedence_type_together() {
    let ck = run("const n = 1 + 2 * 3 + 4\n").unwrap();
    assert_eq!(constant_display(&ck, "n"), "int");
}

#[test]
fn string_concatenation() {
    let ck = run("const s = \"foo\" + \"bar\"\n").unwrap();
    assert_eq!(constant_display(&ck, "s"), "string");
}

#[test]
fn chained_equality_checks_without_associativity_error() {
    // ((1 == 2) == true): the left sub-result is bool, bool == bool works.
    run("const e = 1 == 2 == true\n").unwrap();
}

#[test]
fn boolean_operator_rejects_numbers() {
    let failure = run("const x = 1 && true\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::OperatorMismatch { op, .. } if op == "&&"
    ));
}

#[test]
fn undefined_value_poisons_without_cascading() {
    let failure = run("const m = ghost + 1 * 2\n").unwrap_err();
    // One error for `ghost`; the surrounding arithmetic stays silent.
    assert_eq!(failure.errors.len(), 1);
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::ValueNotDefined { name } if name == "ghost"
    ));
}

#[test]
fn apply_operator_partially_applies() {
    let ck = run(
        "func int add(int a, int b) => a + b\nconst inc = add $ 1\nconst three = inc(2)\n",
    )
    .unwrap();
    assert_eq!(constant_display(&ck, "inc"), "(int) => int");
    assert_eq!(constant_display(&ck, "three"), "int");
}

// ── Compound expressions ───────────────────────────────────────────────

#[test]
fn array_and_tuple_literals() {
    let ck = run("const xs = [1, 2, 3]\nconst t = (1, \"two\")\nconst first = xs[0]\n")
        .unwrap();
    assert_eq!(constant_display(&ck, "xs"), "int[]");
    assert_eq!(constant_display(&ck, "t"), "(int, string)");
    assert_eq!(constant_display(&ck, "first"), "int");
}

#[test]
fn array_elements_need_an_upper_bound() {
    let failure = run("const xs = [1, true]\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn struct_literal_and_field_access() {
    let ck = run("const p = { x: 1, y: 2 }\nconst px = p.x\n").unwrap();
    assert_eq!(constant_display(&ck, "px"), "int");
}

#[test]
fn missing_field_is_reported() {
    let failure = run("const p = { x: 1 }\nconst bad = p.z\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::NoSuchField { field, .. } if field == "z"
    ));
}

#[test]
fn if_else_takes_the_branch_bound() {
    let ck = run("const v = if (true) 1 else 2\n").unwrap();
    assert_eq!(constant_display(&ck, "v"), "int");
}

#[test]
fn if_condition_must_be_boolean() {
    let failure = run("const v = if (1) 2 else 3\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn lambdas_type_as_functions() {
    let ck = run("const f = (int a, int b) => a + b\nconst r = f(1, 2)\n").unwrap();
    assert_eq!(constant_display(&ck, "f"), "(int, int) => int");
    assert_eq!(constant_display(&ck, "r"), "int");
}

#[test]
fn indexing_a_non_array() {
    let failure = run("const x = 5[0]\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::NotArray { .. }
    ));
}

#[test]
fn calling_a_non_function() {
    let failure = run("const x = 5(1)\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::NotFunction { .. }
    ));
}

#[test]
fn argument_count_and_types_are_checked() {
    let failure = run("func int id(int x) => x\nconst a = id(1, 2)\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::ArgumentCountMismatch {
            expected: 1,
            found: 2
        }
    ));

    let failure = run("func int id(int x) => x\nconst a = id(true)\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::TypeMismatch { .. }
    ));
}

// ── Function bodies ────────────────────────────────────────────────────

#[test]
fn expression_bodies_check_against_the_return_type() {
    run("func int double(int x) => x * 2\n").unwrap();
    let failure = run("func int bad() => true\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn return_statements_check_against_the_return_type() {
    run("func int f(int x) => {\n  return x\n}\n").unwrap();
    let failure = run("func int f() => {\n  return true\n}\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn functions_may_recurse() {
    run("func int fact(int n) => if (n < 1) 1 else n * fact(n - 1)\n").unwrap();
}

#[test]
fn locals_scope_through_blocks() {
    run(
        "func int sum(int[] xs) => {\n  total = 0\n  for x in xs {\n    total += x\n  }\n  return total\n}\n",
    )
    .unwrap();
}

#[test]
fn loop_conditions_must_be_boolean() {
    let failure = run("func void spin() => {\n  while (1) {\n    break\n  }\n}\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn for_loops_iterate_arrays_only() {
    let failure = run("func void go() => {\n  for x in 5 {\n    break\n  }\n}\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::NotArray { .. }
    ));
}

#[test]
fn try_catch_binds_the_caught_value() {
    run(
        "func int safe() => {\n  try {\n    throw \"boom\"\n  } catch (string e) {\n    msg = e + \"!\"\n  } finally {\n    cleanup = 1\n  }\n  return 0\n}\n",
    )
    .unwrap();
}

#[test]
fn expression_types_are_attached_to_the_ast() {
    use sable_parser::ast::Declaration;

    let ck = run("const n = 1 + 2\n").unwrap();
    let Declaration::Constant(decl) = &ck.modules()[0].ast.decls[0] else {
        panic!("expected a constant");
    };
    assert_eq!(decl.value.ty.as_ref().map(ToString::to_string), Some("int".to_owned()));
}
