#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MANIFEST: &str = r#"[project]
name = "demo"
dependencies = [
    "click>=8",  # cli
]

[project.optional-dependencies]
dev = ["pytest"]
"#;

fn pypip_cmd(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("pypip"));
    cmd.env("PYPIP_CONFIG", temp.path().join("config").join("config.toml"))
        .env_remove("PYPIP_PYTHON")
        .env_remove("PYPIP_INDEX_URL")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn project(temp: &TempDir) -> PathBuf {
    let dir = temp.path().join("project");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("pyproject.toml"), MANIFEST).unwrap();
    dir
}

/// A stand-in interpreter: `-m pip install|uninstall` exits with `code`
/// (printing an error first when `code` is not 0), `-m pip show NAME`
/// reports version 2.31.0
#[cfg(unix)]
fn fake_python(temp: &TempDir, code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = temp.path().join(format!("fake-python-{}", code));
    let script = format!(
        "#!/bin/sh\ncase \"$3\" in\n  show) printf 'Name: %s\\nVersion: 2.31.0\\n' \"$4\" ;;\n  *) [ {code} -eq 0 ] || echo \"ERROR: No matching distribution found for $4\" >&2; exit {code} ;;\nesac\n",
        code = code
    );
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_show_lists_dependencies() {
    let temp = TempDir::new().unwrap();
    let dir = project(&temp);

    pypip_cmd(&temp)
        .current_dir(&dir)
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("dependencies:\n  click>=8\n"));

    // No subcommand behaves like show
    pypip_cmd(&temp)
        .current_dir(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("click>=8"));
}

#[test]
fn test_show_all_from_subdirectory() {
    let temp = TempDir::new().unwrap();
    let dir = project(&temp);
    let nested = dir.join("src").join("demo");
    fs::create_dir_all(&nested).unwrap();

    pypip_cmd(&temp)
        .current_dir(&nested)
        .args(["show", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("optional-dependencies.dev:\n  pytest\n"));
}

#[test]
fn test_install_dry_run_leaves_files_untouched() {
    let temp = TempDir::new().unwrap();
    let dir = project(&temp);

    pypip_cmd(&temp)
        .current_dir(&dir)
        .args(["install", "--dry-run", "requests>=2.31", "-g", "dev"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Would update"))
        .stdout(predicate::str::contains("+ requests>=2.31"));

    assert_eq!(read(&dir.join("pyproject.toml")), MANIFEST);
}

#[test]
fn test_invalid_specifier_fails_without_writing() {
    let temp = TempDir::new().unwrap();
    let dir = project(&temp);

    pypip_cmd(&temp)
        .current_dir(&dir)
        .args(["install", "requests~=2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));

    assert_eq!(read(&dir.join("pyproject.toml")), MANIFEST);
}

#[test]
fn test_install_without_packages_fails() {
    let temp = TempDir::new().unwrap();
    let dir = project(&temp);

    pypip_cmd(&temp)
        .current_dir(&dir)
        .arg("install")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to install"));
}

#[test]
fn test_missing_project_fails() {
    let temp = TempDir::new().unwrap();

    pypip_cmd(&temp)
        .arg("--project")
        .arg(temp.path())
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pyproject.toml"));
}

#[test]
fn test_hatch_env_without_hatch_table_fails() {
    let temp = TempDir::new().unwrap();
    let dir = project(&temp);

    pypip_cmd(&temp)
        .current_dir(&dir)
        .args(["--hatch-env", "test", "install", "--dry-run", "pytest-cov"])
        .assert()
        .failure();

    assert_eq!(read(&dir.join("pyproject.toml")), MANIFEST);
}

#[cfg(unix)]
#[test]
fn test_install_records_pinned_version() {
    let temp = TempDir::new().unwrap();
    let dir = project(&temp);
    fs::write(dir.join("requirements.txt"), "click==8.1.7\n").unwrap();
    let python = fake_python(&temp, 0);

    pypip_cmd(&temp)
        .current_dir(&dir)
        .arg("--python")
        .arg(&python)
        .args(["install", "requests"])
        .assert()
        .success()
        .stdout(predicate::str::contains("+ requests==2.31.0"));

    let manifest = read(&dir.join("pyproject.toml"));
    assert!(manifest.contains("\"requests==2.31.0\""));
    assert!(manifest.contains("\"click>=8\",  # cli"));
    assert!(manifest.contains("dev = [\"pytest\"]"));
    assert_eq!(read(&dir.join("requirements.txt")), "click==8.1.7\nrequests==2.31.0\n");

    pypip_cmd(&temp)
        .current_dir(&dir)
        .arg("--python")
        .arg(&python)
        .args(["uninstall", "requests"])
        .assert()
        .success();

    let manifest = read(&dir.join("pyproject.toml"));
    assert!(!manifest.contains("requests"));
    assert_eq!(read(&dir.join("requirements.txt")), "click==8.1.7\n");
}

#[cfg(unix)]
#[test]
fn test_pip_failure_propagates_exit_code() {
    let temp = TempDir::new().unwrap();
    let dir = project(&temp);
    let python = fake_python(&temp, 3);

    pypip_cmd(&temp)
        .current_dir(&dir)
        .arg("--python")
        .arg(&python)
        .args(["install", "requests"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("ERROR: No matching distribution found for requests"))
        .stderr(predicate::str::contains("Error:"));

    assert_eq!(read(&dir.join("pyproject.toml")), MANIFEST);
}

#[test]
fn test_install_from_requirements_file_alias() {
    let temp = TempDir::new().unwrap();
    let dir = project(&temp);
    fs::write(dir.join("extra.txt"), "rich>=13\n").unwrap();

    for flag in ["--requirement", "--requirements", "-r"] {
        pypip_cmd(&temp)
            .current_dir(&dir)
            .args(["install", "--dry-run", flag, "extra.txt"])
            .assert()
            .success()
            .stdout(predicate::str::contains("+ rich>=13"));
    }

    assert_eq!(read(&dir.join("pyproject.toml")), MANIFEST);
}

#[test]
fn test_config_path_honours_env() {
    let temp = TempDir::new().unwrap();
    let expected = temp.path().join("config").join("config.toml");

    pypip_cmd(&temp)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string_lossy().into_owned()));
}

#[test]
fn test_config_init_then_show() {
    let temp = TempDir::new().unwrap();

    pypip_cmd(&temp)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized config"));
    assert!(temp.path().join("config").join("config.toml").is_file());

    pypip_cmd(&temp)
        .env("PYPIP_PYTHON", "python3.12")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("python = \"python3.12\""));
}
