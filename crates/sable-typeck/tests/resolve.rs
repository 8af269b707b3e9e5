//! Type resolution integration tests: primitives, recursive types,
//! generics with variance and constraints, and resolution idempotence.

use std::path::Path;

use sable_common::fs::MemoryFs;
use sable_common::ops::OperatorTable;
use sable_common::types::{Type, Variance};
use sable_typeck::{CheckFailure, TypeChecker, TypeckErrorKind};

fn run(source: &str) -> Result<TypeChecker<MemoryFs>, CheckFailure> {
    let mut fs = MemoryFs::new();
    fs.insert("/p/main.sab", source);
    let mut ck = TypeChecker::new(fs, OperatorTable::default());
    ck.check(Path::new("/p/main.sab")).map(|()| ck)
}

fn type_display(ck: &TypeChecker<MemoryFs>, name: &str) -> String {
    ck.modules()[0]
        .types
        .get(name)
        .and_then(|entry| entry.ty.as_ref())
        .map(ToString::to_string)
        .unwrap_or_else(|| panic!("type `{name}` has no resolved type"))
}

#[test]
fn primitives_resolve() {
    let ck = run(
        "type A = int\ntype B = u16\ntype C = string\ntype D = void\ntype E = f32\ntype F = byte\n",
    )
    .unwrap();
    assert_eq!(type_display(&ck, "A"), "int");
    assert_eq!(type_display(&ck, "B"), "u16");
    assert_eq!(type_display(&ck, "C"), "string");
    assert_eq!(type_display(&ck, "D"), "void");
    assert_eq!(type_display(&ck, "E"), "f32");
    assert_eq!(type_display(&ck, "F"), "u8");
}

#[test]
fn compound_types_resolve() {
    let ck = run(
        "type Row = int[]\ntype Pair = (int, string)\ntype Named = { string name; int age }\ntype Fn = (int, bool) => string\ntype Mix = int | string\n",
    )
    .unwrap();
    assert_eq!(type_display(&ck, "Row"), "int[]");
    assert_eq!(type_display(&ck, "Pair"), "(int, string)");
    assert_eq!(type_display(&ck, "Named"), "{ string name; int age; }");
    assert_eq!(type_display(&ck, "Fn"), "(int, bool) => string");
    assert_eq!(type_display(&ck, "Mix"), "int | string");
}

#[test]
fn mutually_recursive_types_are_legal() {
    // The inner use resolves to a recursive back-edge, not an error.
    let ck = run("type A = B[]\ntype B = A[]\n").unwrap();
    let a = ck.modules()[0].types.get("A").unwrap().ty.clone().unwrap();
    let Type::Array(inner) = a else {
        panic!("A should be an array");
    };
    let Type::Array(back_edge) = *inner else {
        panic!("A should be an array of B = A[]");
    };
    assert!(matches!(*back_edge, Type::Recursive { ref name, .. } if name == "A"));
}

#[test]
fn self_recursive_generic() {
    run("type Tree<T> = { T value; Tree[] children }\n").unwrap();
}

#[test]
fn circular_constants_are_an_error() {
    let failure = run("const a = b\nconst b = a\n").unwrap_err();
    assert_eq!(failure.errors.len(), 1);
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::CircularDependency { .. }
    ));
}

#[test]
fn generic_instantiation_substitutes() {
    let ck = run("type Box<T> = { T value }\ntype IntBox = Box<int>\n").unwrap();
    assert_eq!(type_display(&ck, "IntBox"), "Box<int>");
    let ty = ck.modules()[0]
        .types
        .get("IntBox")
        .unwrap()
        .ty
        .clone()
        .unwrap();
    let Type::Instance { args, variances, body, .. } = ty else {
        panic!("expected an instantiation");
    };
    assert_eq!(args, vec![Type::int()]);
    assert_eq!(variances, vec![Variance::Invariant]);
    assert_eq!(
        *body,
        Type::Struct(vec![("value".to_owned(), Type::int())])
    );
}

#[test]
fn nested_generic_instantiation() {
    let ck = run(
        "type List<T> = T[]\ntype Map<K, V> = { K[] keys; V[] values }\ntype Index = Map<string, List<int>>\n",
    )
    .unwrap();
    assert_eq!(type_display(&ck, "Index"), "Map<string, List<int>>");
}

#[test]
fn wrong_argument_count() {
    let failure = run("type Pair<T, U> = (T, U)\ntype Bad = Pair<int>\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::InvalidTypeArgumentCount {
            expected: 2,
            found: 1,
            ..
        }
    ));
}

#[test]
fn non_generic_instantiation_is_an_error() {
    let failure = run("type Y = int\ntype Z = Y<int>\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::NotGeneric { name } if name == "Y"
    ));
}

#[test]
fn constraint_violation_is_an_error() {
    let failure = run("type Num<T : int> = T[]\ntype Bad = Num<bool>\n").unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::InvalidTypeArgument { param, .. } if param == "T"
    ));
}

#[test]
fn constraint_satisfied() {
    run("type Num<T : int> = T[]\ntype Good = Num<i8>\n").unwrap();
}

#[test]
fn covariant_instances_accept_narrower_arguments() {
    // `take` accepts Box<int>; a Box<i8> argument is fine because T is
    // declared covariant (`out`).
    run(
        "type Box<out T> = { T value }\nfunc void take(Box<int> b) => {}\nfunc void go(Box<i8> small) => {\n  take(small)\n}\n",
    )
    .unwrap();
}

#[test]
fn invariant_instances_reject_narrower_arguments() {
    let failure = run(
        "type Box<T> = { T value }\nfunc void take(Box<int> b) => {}\nfunc void go(Box<i8> small) => {\n  take(small)\n}\n",
    )
    .unwrap_err();
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::TypeMismatch { .. }
    ));
}

#[test]
fn undefined_type_is_reported_once_and_poisons() {
    let failure = run("type A = Missing\ntype B = A[]\n").unwrap_err();
    // A resolves to unknown; B builds on it without a second error.
    assert_eq!(failure.errors.len(), 1);
    assert!(matches!(
        &failure.errors[0].kind,
        TypeckErrorKind::TypeNotDefined { name } if name == "Missing"
    ));
}

#[test]
fn resolution_is_idempotent() {
    let source = "type Box<T> = { T value }\ntype B = Box<int>\nconst x = 1 + 2\n";
    let mut fs = MemoryFs::new();
    fs.insert("/p/main.sab", source);
    let mut ck = TypeChecker::new(fs, OperatorTable::default());
    ck.check(Path::new("/p/main.sab")).unwrap();
    let first = ck.modules()[0].types.get("B").unwrap().ty.clone();
    let first_const = ck.modules()[0].constants.get("x").unwrap().ty.clone();

    // A second check hits the path cache and the resolved-type caches.
    ck.check(Path::new("/p/main.sab")).unwrap();
    assert_eq!(ck.modules()[0].types.get("B").unwrap().ty, first);
    assert_eq!(ck.modules()[0].constants.get("x").unwrap().ty, first_const);
}
