use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::Command::from(Command::new(env!("CARGO_BIN_EXE_gotag-inject")))
}

const USER_PB: &str = r#"package api

type User struct {
	state         int
	sizeCache     int
	unknownFields []byte

	// @gotags: valid:"email"
	Email string `protobuf:"bytes,1,opt,name=email,proto3" json:"email,omitempty"`
	Id    int64  `protobuf:"varint,2,opt,name=id,proto3" json:"id,omitempty"` // @inject_tags: json:"user_id" db:"id"
	XXX_NoUnkeyedLiteral struct{} `json:"-"` // @gotags: xml:"-"
}
"#;

fn fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn rewrites_file_in_place() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "user.pb.go", USER_PB);

    cmd()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 3 fields in 1 of 1 files"));

    let after = fs::read_to_string(&path).unwrap();
    assert!(after.contains(
        r#"`protobuf:"bytes,1,opt,name=email,proto3" json:"email,omitempty" valid:"email"`"#
    ));
    assert!(after.contains(
        r#"`protobuf:"varint,2,opt,name=id,proto3" json:"user_id" db:"id"` // @inject_tags"#
    ));
    assert!(after.contains(r#"XXX_NoUnkeyedLiteral struct{} `json:"-" xml:"-"`"#));
}

#[test]
fn second_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "user.pb.go", USER_PB);

    cmd().arg(&path).assert().success();
    let once = fs::read_to_string(&path).unwrap();

    cmd()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 0 fields in 0 of 1 files"));
    assert_eq!(fs::read_to_string(&path).unwrap(), once);
}

#[test]
fn skip_field_and_dry_run() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "user.pb.go", USER_PB);

    cmd()
        .arg(&path)
        .args(["--skip-field", "XXX_*", "--dry-run", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""field":"Email""#))
        .stdout(predicate::str::contains("XXX_NoUnkeyedLiteral").not());

    assert_eq!(fs::read_to_string(&path).unwrap(), USER_PB);
}

#[test]
fn strip_directives_removes_comments() {
    let dir = TempDir::new().unwrap();
    let path = fixture(&dir, "user.pb.go", USER_PB);

    cmd().arg(&path).arg("--strip-directives").assert().success();

    let after = fs::read_to_string(&path).unwrap();
    assert!(!after.contains("@gotags"));
    assert!(!after.contains("@inject_tags"));
    assert!(after.contains("\tunknownFields []byte\n\n\tEmail string"));
}

#[test]
fn config_file_supplies_inputs() {
    let dir = TempDir::new().unwrap();
    fixture(&dir, "user.pb.go", USER_PB);
    let pattern = dir.path().join("*.pb.go");
    let config = fixture(
        &dir,
        "gotag.toml",
        &format!(
            "input = [{:?}]\nskip_fields = [\"XXX_*\"]\n",
            pattern.to_string_lossy()
        ),
    );

    cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated 2 fields"));
}

#[test]
fn parse_failure_exits_with_one() {
    let dir = TempDir::new().unwrap();
    let bad = fixture(&dir, "bad.go", "package p\ntype T struct {\n");

    cmd()
        .arg(&bad)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("bad.go"))
        .stdout(predicate::str::contains("parse"));

    assert_eq!(
        fs::read_to_string(&bad).unwrap(),
        "package p\ntype T struct {\n"
    );
}

#[test]
fn unmatched_glob_exits_with_two() {
    let dir = TempDir::new().unwrap();
    let pattern = dir.path().join("*.go");

    cmd()
        .arg(pattern.to_string_lossy().as_ref())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No files match"));
}

#[test]
fn missing_inputs_is_usage_error() {
    cmd()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no input files"));
}
