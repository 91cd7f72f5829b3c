// Binary-level checks for the coldsign CLI: exit codes per error kind
// and the no-slot-mutation guarantees, all exercisable without a network.

use assert_cmd::Command;
use std::fs;
use std::path::Path;

fn coldsign() -> Command {
    Command::cargo_bin("coldsign").expect("binary builds")
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("coldsign.json");
    fs::write(
        &path,
        format!(
            r#"{{
                "network": "http://127.0.0.1:1/rpc",
                "public_key": "ab",
                "state_dir": "{}",
                "transfer": {{
                    "src_address": "0:01",
                    "dst_address": "0:02",
                    "value": 1000000000
                }}
            }}"#,
            dir.display()
        ),
    )
    .unwrap();
    path
}

fn slot_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("unsigned_"))
        .count()
}

#[test]
fn missing_signature_exits_one_with_usage_and_no_slot_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let output = coldsign()
        .current_dir(dir.path())
        .args(["submit", "transfer"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage"), "stderr was: {stderr}");
    assert_eq!(slot_files(dir.path()), 0);
}

#[test]
fn missing_config_is_a_builder_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = coldsign()
        .current_dir(dir.path())
        .args(["prepare", "transfer"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn malformed_signature_exits_with_its_own_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let output = coldsign()
        .args(["--config", config.to_str().unwrap(), "submit", "transfer", "zz-not-hex"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5));
    assert_eq!(slot_files(dir.path()), 0);
}

#[test]
fn empty_slot_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let sig = "ab".repeat(64);
    let output = coldsign()
        .args(["--config", config.to_str().unwrap(), "submit", "transfer", &sig])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn unreachable_builder_endpoint_fails_prepare_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let output = coldsign()
        .args(["--config", config.to_str().unwrap(), "prepare", "transfer"])
        .output()
        .unwrap();
    // the bridge at 127.0.0.1:1 refuses connections: builder error
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(slot_files(dir.path()), 0);
}

#[test]
fn help_lists_both_subcommands() {
    let output = coldsign().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("prepare") && stdout.contains("submit"));
}
