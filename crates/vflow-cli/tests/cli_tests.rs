use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const WELL_FORMED: &str = r"
function %main(v0: scalar) {
    obj @x
block0:
    v1 = addr_of @x
    v2 = assign v0
    store v1, v2
    v3 = load v1
    return v3
}
";

const PARTIALLY_MALFORMED: &str = r"
function %broken() {
block0:
    v1 = assign v9
    return v1
}

function %good(v2: scalar) {
block0:
    v3 = assign v2
    return v3
}
";

fn vflow() -> Command {
    Command::cargo_bin("vflow").unwrap()
}

#[test]
fn build_writes_graph_and_exits_zero() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.ir");
    let output = dir.path().join("out.vfg");
    fs::write(&input, WELL_FORMED).unwrap();

    vflow()
        .arg("build")
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let dump = fs::read_to_string(&output).unwrap();
    assert!(dump.starts_with("NODE "));
    assert!(dump.contains("EDGE "));
    assert!(dump.contains("indirect"));
}

#[test]
fn build_is_deterministic_across_runs() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.ir");
    let first = dir.path().join("first.vfg");
    let second = dir.path().join("second.vfg");
    fs::write(&input, WELL_FORMED).unwrap();

    vflow().arg("build").arg(&input).arg(&first).assert().success();
    vflow().arg("build").arg(&input).arg(&second).assert().success();

    assert_eq!(
        fs::read_to_string(&first).unwrap(),
        fs::read_to_string(&second).unwrap()
    );
}

#[test]
fn build_reports_skipped_function_and_exits_one() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.ir");
    let output = dir.path().join("out.vfg");
    fs::write(&input, PARTIALLY_MALFORMED).unwrap();

    vflow()
        .arg("build")
        .arg(&input)
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("broken"));

    // The well-formed function still produced output.
    let dump = fs::read_to_string(&output).unwrap();
    assert!(dump.contains("NODE "));
}

#[test]
fn build_rejects_unparsable_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.ir");
    let output = dir.path().join("out.vfg");
    fs::write(&input, "function oops {").unwrap();

    vflow()
        .arg("build")
        .arg(&input)
        .arg(&output)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn build_missing_input_exits_two() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.vfg");

    vflow()
        .arg("build")
        .arg(dir.path().join("nope.ir"))
        .arg(&output)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn build_unwritable_output_exits_two() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.ir");
    fs::write(&input, WELL_FORMED).unwrap();

    vflow()
        .arg("build")
        .arg(&input)
        .arg(dir.path().join("missing-dir").join("out.vfg"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot write"));
}

#[test]
fn validate_accepts_well_formed_ir() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.ir");
    fs::write(&input, WELL_FORMED).unwrap();

    vflow()
        .arg("validate")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("VALID"));
}

#[test]
fn validate_rejects_bad_ir() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.ir");
    fs::write(&input, "not ir at all").unwrap();

    vflow()
        .arg("validate")
        .arg(&input)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("INVALID"));
}

#[test]
fn slice_extracts_subgraph() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.ir");
    let full = dir.path().join("full.vfg");
    let sliced = dir.path().join("slice.vfg");
    fs::write(&input, WELL_FORMED).unwrap();

    vflow().arg("build").arg(&input).arg(&full).assert().success();

    vflow()
        .arg("slice")
        .arg(&full)
        .arg(&sliced)
        .arg("--nodes")
        .arg("0")
        .assert()
        .success();

    let dump = fs::read_to_string(&sliced).unwrap();
    assert!(dump.contains("NODE 0 "));
}

#[test]
fn slice_unknown_node_exits_one() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.ir");
    let full = dir.path().join("full.vfg");
    let sliced = dir.path().join("slice.vfg");
    fs::write(&input, WELL_FORMED).unwrap();

    vflow().arg("build").arg(&input).arg(&full).assert().success();

    vflow()
        .arg("slice")
        .arg(&full)
        .arg(&sliced)
        .arg("--nodes")
        .arg("4096")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown node"));
}
