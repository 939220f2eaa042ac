//! Integration tests for the IPPcode20 CLI.
//!
//! These tests invoke the `ippcode` binary as a subprocess and check
//! exit codes, stdout, stderr and the stats file.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[allow(deprecated)]
fn ippcode() -> Command {
    Command::cargo_bin("ippcode").unwrap()
}

/// Write a program (header added) into `dir` and return its path.
fn write_program(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("prog.src");
    fs::write(&path, format!(".IPPcode20\n{body}")).unwrap();
    path
}

fn source_arg(path: &Path) -> String {
    format!("--source={}", path.display())
}

// ---- Options ----

#[test]
fn help_alone_exits_0() {
    ippcode()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source"));
}

#[test]
fn help_with_other_options_exits_10() {
    ippcode()
        .args(["--help", "--source=x"])
        .assert()
        .code(10);
}

#[test]
fn no_args_exits_10() {
    ippcode().assert().code(10);
}

#[test]
fn unknown_option_exits_10() {
    ippcode().args(["--source=x", "--turbo"]).assert().code(10);
}

#[test]
fn stat_flag_without_stats_file_exits_10() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(&dir, "");
    ippcode()
        .args([source_arg(&prog).as_str(), "--insts"])
        .assert()
        .code(10);
}

#[test]
fn missing_source_file_exits_11() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.src");
    ippcode()
        .arg(source_arg(&missing))
        .assert()
        .code(11)
        .stderr(predicate::str::contains("cannot read"));
}

// ---- Running programs ----

#[test]
fn hello_world() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(&dir, "WRITE string@Hello,\\032world!\n");
    ippcode()
        .arg(source_arg(&prog))
        .assert()
        .success()
        .stdout("Hello, world!");
}

#[test]
fn read_from_stdin() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(
        &dir,
        "DEFVAR GF@n\nREAD GF@n int\nMUL GF@n GF@n int@2\nWRITE GF@n\n",
    );
    ippcode()
        .arg(source_arg(&prog))
        .write_stdin("21\n")
        .assert()
        .success()
        .stdout("42");
}

#[test]
fn source_from_stdin_with_input_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.txt");
    fs::write(&input, "first\nsecond\n").unwrap();
    ippcode()
        .arg(format!("--input={}", input.display()))
        .write_stdin(".IPPcode20\nDEFVAR GF@s\nREAD GF@s string\nREAD GF@s string\nWRITE GF@s\n")
        .assert()
        .success()
        .stdout("second");
}

#[test]
fn exit_status_is_forwarded() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(&dir, "WRITE int@1\nEXIT int@7\nWRITE int@2\n");
    ippcode()
        .arg(source_arg(&prog))
        .assert()
        .code(7)
        .stdout("1");
}

#[test]
fn runtime_error_exits_with_its_code() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(
        &dir,
        "WRITE string@before\nDEFVAR GF@x\nIDIV GF@x int@1 int@0\n",
    );
    ippcode()
        .arg(source_arg(&prog))
        .assert()
        .code(57)
        .stdout("before")
        .stderr(predicate::str::contains("division by zero"));
}

#[test]
fn missing_header_exits_31() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.src");
    fs::write(&path, "WRITE int@1\n").unwrap();
    ippcode().arg(source_arg(&path)).assert().code(31);
}

#[test]
fn unknown_opcode_exits_32() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(&dir, "FROB GF@x\n");
    ippcode()
        .arg(source_arg(&prog))
        .assert()
        .code(32)
        .stderr(predicate::str::contains("unknown opcode"));
}

// ---- XML programs ----

fn write_xml(dir: &TempDir, text: &str) -> PathBuf {
    let path = dir.path().join("prog.xml");
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn xml_program_runs_in_order() {
    let dir = TempDir::new().unwrap();
    let prog = write_xml(
        &dir,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<program language="IPPcode20">
  <instruction order="20" opcode="WRITE"><arg1 type="var">GF@x</arg1></instruction>
  <instruction order="5" opcode="DEFVAR"><arg1 type="var">GF@x</arg1></instruction>
  <instruction order="7" opcode="MOVE">
    <arg2 type="string">hi\032there</arg2>
    <arg1 type="var">GF@x</arg1>
  </instruction>
</program>
"#,
    );
    ippcode()
        .arg(source_arg(&prog))
        .assert()
        .success()
        .stdout("hi there");
}

#[test]
fn malformed_xml_exits_31() {
    let dir = TempDir::new().unwrap();
    let prog = write_xml(&dir, "<program language=\"IPPcode20\"><instruction>");
    ippcode()
        .arg(source_arg(&prog))
        .assert()
        .code(31)
        .stderr(predicate::str::contains("malformed XML"));
}

#[test]
fn xml_duplicate_order_exits_32() {
    let dir = TempDir::new().unwrap();
    let prog = write_xml(
        &dir,
        r#"<program language="IPPcode20">
  <instruction order="1" opcode="BREAK"/>
  <instruction order="1" opcode="CLEARS"/>
</program>"#,
    );
    ippcode()
        .arg(source_arg(&prog))
        .assert()
        .code(32)
        .stderr(predicate::str::contains("duplicate order 1"));
}

#[test]
fn dprint_writes_stderr() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(&dir, "DPRINT int@5\n");
    ippcode()
        .arg(source_arg(&prog))
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("5"));
}

// ---- Stats ----

const COUNTED: &str = "DEFVAR GF@a\nMOVE GF@a int@1\nLABEL l\nWRITE GF@a\n";

#[test]
fn stats_in_flag_order() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(&dir, COUNTED);
    let stats = dir.path().join("stats.txt");
    ippcode()
        .args([
            source_arg(&prog),
            format!("--stats={}", stats.display()),
            "--vars".to_string(),
            "--insts".to_string(),
        ])
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&stats).unwrap(), "2\n3\n");
}

#[test]
fn stats_written_after_exit() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(&dir, "EXIT int@3\n");
    let stats = dir.path().join("stats.txt");
    ippcode()
        .args([
            source_arg(&prog),
            format!("--stats={}", stats.display()),
            "--insts".to_string(),
        ])
        .assert()
        .code(3);
    assert_eq!(fs::read_to_string(&stats).unwrap(), "1\n");
}

#[test]
fn stats_not_written_on_error() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(&dir, "POPFRAME\n");
    let stats = dir.path().join("stats.txt");
    ippcode()
        .args([
            source_arg(&prog),
            format!("--stats={}", stats.display()),
            "--insts".to_string(),
        ])
        .assert()
        .code(55);
    assert!(!stats.exists());
}

#[test]
fn unwritable_stats_file_exits_12() {
    let dir = TempDir::new().unwrap();
    let prog = write_program(&dir, COUNTED);
    let stats = dir.path().join("missing-dir").join("stats.txt");
    ippcode()
        .args([
            source_arg(&prog),
            format!("--stats={}", stats.display()),
            "--vars".to_string(),
        ])
        .assert()
        .code(12);
}
