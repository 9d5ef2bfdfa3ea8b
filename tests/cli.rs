use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy the fixture into `dir` so layout files land in a scratch location.
fn scratch_input(dir: &Path) -> PathBuf {
    let input = dir.join("family.ged");
    fs::copy(fixture_path("smith.ged"), &input).unwrap();
    input
}

#[test]
fn prints_columns_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let input = scratch_input(dir.path());

    let mut cmd = cargo_bin_cmd!("gedchart");
    cmd.current_dir(dir.path()).arg(&input);

    let output_pred = predicate::str::starts_with("Smith Family Tree")
        .and(predicate::str::contains("column 2"))
        .and(predicate::str::contains("0  Tom Smith @I5@"));

    cmd.assert().success().stdout(output_pred);
}

#[test]
fn prints_json_handoff() {
    let dir = tempfile::tempdir().unwrap();
    let input = scratch_input(dir.path());

    let mut cmd = cargo_bin_cmd!("gedchart");
    cmd.current_dir(dir.path()).arg(&input).arg("--format").arg("json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"title\": \"Smith Family Tree\""));
}

#[test]
fn writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = scratch_input(dir.path());
    let target = dir.path().join("chart.yaml");

    let mut cmd = cargo_bin_cmd!("gedchart");
    cmd.current_dir(dir.path())
        .arg(&input)
        .arg("-f")
        .arg("yaml")
        .arg("-o")
        .arg(&target);

    cmd.assert().success().stdout(predicate::str::is_empty());
    let written = fs::read_to_string(&target).unwrap();
    assert!(written.contains("title: Smith Family Tree"));
}

#[test]
fn missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = cargo_bin_cmd!("gedchart");
    cmd.current_dir(dir.path()).arg(dir.path().join("absent.ged"));

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("can't read"));
}

#[test]
fn unknown_format_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = scratch_input(dir.path());
    let target = dir.path().join("chart.pdf");

    let mut cmd = cargo_bin_cmd!("gedchart");
    cmd.current_dir(dir.path())
        .arg(&input)
        .arg("--format")
        .arg("pdf")
        .arg("--output")
        .arg(&target);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Format 'pdf' not found"));
    assert!(!target.exists());
}

#[test]
fn lists_formats() {
    let mut cmd = cargo_bin_cmd!("gedchart");
    cmd.arg("--list-formats");

    let output_pred = predicate::str::contains("columns")
        .and(predicate::str::contains("json"))
        .and(predicate::str::contains("yaml"));

    cmd.assert().success().stdout(output_pred);
}

#[test]
fn write_layout_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let input = scratch_input(dir.path());
    let layout = dir.path().join("smith.txt");

    cargo_bin_cmd!("gedchart")
        .current_dir(dir.path())
        .arg(&input)
        .arg("--write-layout")
        .assert()
        .success();
    let first = fs::read_to_string(&layout).unwrap();
    assert!(first.starts_with("   0  posn  suggested\n"));
    assert!(first.contains("   5  0  0      0      I5  Tom /Smith/"));

    fs::write(&layout, "   5  3  9\n").unwrap();
    cargo_bin_cmd!("gedchart")
        .current_dir(dir.path())
        .arg(&input)
        .arg("--write-layout")
        .assert()
        .success()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&layout).unwrap(), "   5  3  9\n");

    cargo_bin_cmd!("gedchart")
        .current_dir(dir.path())
        .arg(&input)
        .arg("--write-layout")
        .arg("--force")
        .assert()
        .success();
    assert_eq!(fs::read_to_string(&layout).unwrap(), first);
}

#[test]
fn applies_hand_edited_layout() {
    let dir = tempfile::tempdir().unwrap();
    let input = scratch_input(dir.path());
    let layout = dir.path().join("edited.txt");
    fs::write(&layout, "   5  3  9      0      I5  Tom /Smith/\n").unwrap();

    let mut cmd = cargo_bin_cmd!("gedchart");
    cmd.current_dir(dir.path())
        .arg(&input)
        .arg("--layout")
        .arg(&layout);

    let output_pred = predicate::str::contains("column 3\n   9  Tom Smith @I5@");
    cmd.assert().success().stdout(output_pred);
}
