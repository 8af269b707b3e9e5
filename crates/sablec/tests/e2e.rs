//! End-to-end tests for the `sablec` CLI.
//!
//! Each test writes a small project into a temp directory, invokes the
//! real binary, and asserts on exit status and output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn write_project(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
    for (name, contents) in files {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create project dirs");
        }
        std::fs::write(&path, contents).expect("failed to write source file");
    }
    dir.join(files[0].0)
}

fn run_check(files: &[(&str, &str)]) -> Output {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let main = write_project(temp.path(), files);
    Command::new(env!("CARGO_BIN_EXE_sablec"))
        .args(["check"])
        .arg(&main)
        .output()
        .expect("failed to invoke sablec")
}

#[test]
fn clean_program_exits_zero() {
    let output = run_check(&[(
        "main.sab",
        "func int add(int a, int b) => a + b\nconst four = add(2, 2)\n",
    )]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("ok: 1 module(s) checked"));
}

#[test]
fn multi_module_project_checks() {
    let output = run_check(&[
        (
            "main.sab",
            "import from \"./lib\": { greeting }\nconst g = greeting\n",
        ),
        ("lib.sab", "export const greeting = \"hello\"\n"),
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(String::from_utf8_lossy(&output.stdout).contains("2 module(s)"));
}

#[test]
fn type_error_exits_nonzero_with_diagnostic() {
    let output = run_check(&[("main.sab", "const bad = 1 && true\n")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("operator `&&` cannot be applied"),
        "stderr: {stderr}"
    );
    assert!(stderr.contains("1 problem(s) found"), "stderr: {stderr}");
}

#[test]
fn syntax_error_exits_nonzero() {
    let output = run_check(&[("main.sab", "const = 1\n")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expected constant name"), "stderr: {stderr}");
}

#[test]
fn missing_module_is_reported() {
    let output = run_check(&[(
        "main.sab",
        "import from \"./nowhere\": { x }\n",
    )]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("module not found"), "stderr: {stderr}");
}
