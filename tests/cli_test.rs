use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn docpipe() -> Command {
    Command::cargo_bin("docpipe").unwrap()
}

#[test]
fn test_help() {
    docpipe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--format"))
        .stdout(predicate::str::contains("--destination-dir"));
}

#[test]
fn test_version() {
    docpipe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("docpipe"));
}

#[test]
fn test_no_arguments() {
    docpipe().assert().failure().code(2);
}

#[test]
fn test_format_is_required() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.txt");
    fs::write(&input, "= Doc\n").unwrap();

    docpipe()
        .arg(&input)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--format"));
}

#[test]
fn test_unknown_format_is_rejected() {
    docpipe()
        .args(["-f", "papyrus", "doc.txt"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_missing_input_file() {
    docpipe()
        .args(["-f", "xhtml", "/no/such/doc.txt"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing file"));
}

#[test]
fn test_missing_destination_dir() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.txt");
    fs::write(&input, "= Doc\n").unwrap();

    docpipe()
        .args(["-f", "xhtml", "-D", "/no/such/dir"])
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing directory"));
}

#[test]
fn test_missing_resource_dir() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.txt");
    fs::write(&input, "= Doc\n").unwrap();

    docpipe()
        .args(["-f", "xhtml", "-r", "/no/such/resources"])
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing directory"));
}

#[test]
fn test_skip_asciidoc_without_docbook_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("doc.txt");
    fs::write(&input, "= Doc\n").unwrap();

    docpipe()
        .args(["-f", "docbook", "--skip-asciidoc"])
        .arg(&input)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing file"));
}
