//! End-to-end tests driving the `gentest` binary

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("tests")
        .join("fixtures")
        .join("go")
        .join(name)
}

fn gentest(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gentest"))
        .args(args)
        .current_dir(cwd)
        .env_remove("GENTEST_LOG")
        .output()
        .expect("failed to run gentest")
}

fn write_package(dir: &Path) -> PathBuf {
    let file = dir.join("calc.go");
    fs::write(
        &file,
        "package calc\n\n// offset_double\nfunc double(n int) int {\n\treturn n * 2\n}\n",
    )
    .unwrap();
    file
}

#[test]
fn test_generate_to_stdout() {
    let file = fixture_path("basic/basic.go");
    let out = gentest(
        &["generate", file.to_str().unwrap(), "--comment", "offset_returnInt"],
        Path::new(env!("CARGO_MANIFEST_DIR")),
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.starts_with("func TestReturnInt(t *testing.T) {\n"));
    assert!(stdout.contains("gotint := returnInt()"));
}

#[test]
fn test_flags_override_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_package(dir.path());
    fs::write(
        dir.path().join(".gentestrc.json"),
        r#"{"result_prefix": "actual", "parallel": false}"#,
    )
    .unwrap();

    let out = gentest(
        &["generate", file.to_str().unwrap(), "--comment", "offset_double", "--parallel"],
        dir.path(),
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("actualint := double(test.Input.n)"));
    assert_eq!(stdout.matches("t.Parallel()").count(), 2);
}

#[test]
fn test_output_file_and_camel_case() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_package(dir.path());
    let output = dir.path().join("calc_scaffold.go.txt");

    let out = gentest(
        &[
            "generate",
            file.to_str().unwrap(),
            "--comment",
            "offset_double",
            "--camel-case",
            "--output",
            output.to_str().unwrap(),
        ],
        dir.path(),
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(out.stdout.is_empty());
    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("gotInt := double(test.Input.n)"));
}

#[test]
fn test_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_package(dir.path());
    let output = dir.path().join("out.txt");

    let out = gentest(
        &[
            "generate",
            file.to_str().unwrap(),
            "--comment",
            "offset_missing",
            "--output",
            output.to_str().unwrap(),
        ],
        dir.path(),
    );
    assert!(!out.status.success());
    assert!(out.stdout.is_empty());
    assert!(!output.exists());
    assert!(String::from_utf8_lossy(&out.stderr).contains("offset_missing"));
}

#[test]
fn test_locator_flags_are_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_package(dir.path());

    let both = gentest(
        &["generate", file.to_str().unwrap(), "--offset", "1", "--comment", "x"],
        dir.path(),
    );
    assert!(!both.status.success());

    let neither = gentest(&["generate", file.to_str().unwrap()], dir.path());
    assert!(!neither.status.success());
}

#[test]
fn test_config_validate() {
    let dir = tempfile::tempdir().unwrap();
    let out = gentest(&["config", "validate"], dir.path());
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("No config file found"));

    fs::write(dir.path().join("gentest.config.json"), r#"{"unknown": 1}"#).unwrap();
    let out = gentest(&["config", "validate"], dir.path());
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Config validation failed"));
}

#[test]
fn test_config_show() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join(".gentestrc.json"),
        r#"{"match_mode": "body", "name_style": "camel_case"}"#,
    )
    .unwrap();

    let out = gentest(&["config", "show"], dir.path());
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    assert!(stdout.contains("match_mode: body"));
    assert!(stdout.contains("name_style: camel_case"));
    assert!(stdout.contains("exclude: **/*_test.go"));
}
