use assert_cmd::prelude::*;
use std::io::Write;
use std::process::Command;

fn source_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".asm")
        .tempfile()
        .unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn runs_without_arguments() {
    let mut cmd = Command::cargo_bin("vesper").unwrap();
    cmd.assert().success();
}

#[test]
fn check_accepts_a_valid_program() {
    let file = source_file("mov $1234, r1\nadd $1, r1\nhlt\n");
    let mut cmd = Command::cargo_bin("vesper").unwrap();
    cmd.arg("check").arg(file.path());
    cmd.assert().success();
}

#[test]
fn check_rejects_a_syntax_error() {
    let file = source_file("mov $1234 r1\n");
    let mut cmd = Command::cargo_bin("vesper").unwrap();
    cmd.arg("check").arg(file.path());
    cmd.assert().failure();
}

#[test]
fn run_executes_and_dumps_registers() {
    let file = source_file("mov $1234, r1\nmov $ABCD, r2\nadd r1, r2\nhlt\n");
    let mut cmd = Command::cargo_bin("vesper").unwrap();
    cmd.arg("run").arg("--minimal").arg(file.path());
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("acc: 0xBE01"));
}

#[test]
fn run_reports_unresolved_symbols() {
    let file = source_file("mov [!missing], r1\nhlt\n");
    let mut cmd = Command::cargo_bin("vesper").unwrap();
    cmd.arg("run").arg("--minimal").arg(file.path());
    cmd.assert().failure();
}

#[test]
fn compile_then_run_the_binary() {
    let file = source_file("mov $5, r3\nhlt\n");
    let dir = tempfile::tempdir().unwrap();
    let bin = dir.path().join("out.bin");

    let mut cmd = Command::cargo_bin("vesper").unwrap();
    cmd.arg("compile").arg(file.path()).arg(&bin);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("vesper").unwrap();
    cmd.arg("run").arg("--minimal").arg(&bin);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("r3: 0x0005"));
}

#[test]
fn unknown_extension_is_rejected() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(b"hlt\n").unwrap();
    let mut cmd = Command::cargo_bin("vesper").unwrap();
    cmd.arg("run").arg(file.path());
    cmd.assert().failure();
}
